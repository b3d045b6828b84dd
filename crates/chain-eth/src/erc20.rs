use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::abi::encode_call;
use crate::address::Address;
use crate::error::EthError;
use crate::hexnum::big_int_to_minimal_bytes;

/// A contract method: its canonical signature and 4-byte selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Method {
    pub signature: &'static str,
    pub selector: [u8; 4],
}

pub const NAME: Method = Method {
    signature: "name()",
    selector: [0x06, 0xfd, 0xde, 0x03],
};

pub const SYMBOL: Method = Method {
    signature: "symbol()",
    selector: [0x95, 0xd8, 0x9b, 0x41],
};

pub const DECIMALS: Method = Method {
    signature: "decimals()",
    selector: [0x31, 0x3c, 0xe5, 0x67],
};

pub const TOTAL_SUPPLY: Method = Method {
    signature: "totalSupply()",
    selector: [0x18, 0x16, 0x0d, 0xdd],
};

pub const BALANCE_OF: Method = Method {
    signature: "balanceOf(address)",
    selector: [0x70, 0xa0, 0x82, 0x31],
};

pub const TRANSFER: Method = Method {
    signature: "transfer(address,uint256)",
    selector: [0xa9, 0x05, 0x9c, 0xbb],
};

pub const TRANSFER_FROM: Method = Method {
    signature: "transferFrom(address,address,uint256)",
    selector: [0x23, 0xb8, 0x72, 0xdd],
};

pub const APPROVE: Method = Method {
    signature: "approve(address,uint256)",
    selector: [0x09, 0x5e, 0xa7, 0xb3],
};

pub const ALLOWANCE: Method = Method {
    signature: "allowance(address,address)",
    selector: [0xdd, 0x62, 0xed, 0x3e],
};

/// Every ERC-20 method known to the wallet.
pub const ERC20_METHODS: &[Method] = &[
    NAME,
    SYMBOL,
    DECIMALS,
    TOTAL_SUPPLY,
    BALANCE_OF,
    TRANSFER,
    TRANSFER_FROM,
    APPROVE,
    ALLOWANCE,
];

/// Looks up an ERC-20 method by canonical signature.
pub fn method(signature: &str) -> Option<&'static Method> {
    ERC20_METHODS.iter().find(|m| m.signature == signature)
}

/// An ERC-20 token contract and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Token {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Erc20Token {
    /// Calldata transferring `amount` whole tokens to `to`.
    pub fn transfer_data(&self, to: &Address, amount: U256) -> Result<Vec<u8>, EthError> {
        let wei = token_to_wei(amount, self.decimals)?;
        Ok(encode_transfer(to, &wei))
    }
}

/// Calldata for a method that takes no arguments (`name()`, `decimals()`, ...).
pub fn encode_no_args(method: &Method) -> Vec<u8> {
    method.selector.to_vec()
}

/// Encodes `balanceOf(owner)`.
pub fn encode_balance_of(owner: &Address) -> Vec<u8> {
    encode_call(BALANCE_OF.selector, &[owner.as_bytes().as_slice()])
}

/// Encodes `transfer(to, amount)`; `amount` is in base units.
pub fn encode_transfer(to: &Address, amount: &U256) -> Vec<u8> {
    let amount = big_int_to_minimal_bytes(amount);
    encode_call(TRANSFER.selector, &[to.as_bytes().as_slice(), amount.as_slice()])
}

/// Encodes `transferFrom(from, to, amount)`.
pub fn encode_transfer_from(from: &Address, to: &Address, amount: &U256) -> Vec<u8> {
    let amount = big_int_to_minimal_bytes(amount);
    encode_call(
        TRANSFER_FROM.selector,
        &[from.as_bytes().as_slice(), to.as_bytes().as_slice(), amount.as_slice()],
    )
}

/// Encodes `approve(spender, amount)`.
pub fn encode_approve(spender: &Address, amount: &U256) -> Vec<u8> {
    let amount = big_int_to_minimal_bytes(amount);
    encode_call(APPROVE.selector, &[spender.as_bytes().as_slice(), amount.as_slice()])
}

/// Encodes `allowance(owner, spender)`.
pub fn encode_allowance(owner: &Address, spender: &Address) -> Vec<u8> {
    encode_call(
        ALLOWANCE.selector,
        &[owner.as_bytes().as_slice(), spender.as_bytes().as_slice()],
    )
}

/// `10^decimals`, or `None` when it does not fit in 256 bits.
fn unit(decimals: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(decimals))
}

/// Scales a whole-token amount to base units.
pub fn token_to_wei(amount: U256, decimals: u8) -> Result<U256, EthError> {
    unit(decimals)
        .and_then(|unit| amount.checked_mul(unit))
        .ok_or_else(|| {
            EthError::EncodingError(format!(
                "{amount} tokens with {decimals} decimals overflows uint256"
            ))
        })
}

/// Converts base units to whole tokens, truncating the fractional part.
pub fn wei_to_token(wei: U256, decimals: u8) -> U256 {
    match unit(decimals) {
        Some(unit) => wei / unit,
        // 10^decimals exceeds every uint256, so the whole part is zero.
        None => U256::ZERO,
    }
}

/// Renders base units as a decimal string with up to `decimals` fractional
/// digits, trailing zeros removed (`1500000000000000000, 18` -> `"1.5"`).
pub fn format_units(wei: U256, decimals: u8) -> String {
    let digits = wei.to_string();
    let decimals = decimals as usize;

    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{digits}", "0".repeat(decimals + 1 - digits.len()))
    } else {
        digits
    };

    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{frac}")
    }
}
