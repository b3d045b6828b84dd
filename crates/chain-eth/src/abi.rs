//! Minimal ABI encoding and decoding for EVM function calls.
//!
//! Enough to build ERC-20 style calldata and to decode the single return
//! value of a read call, without pulling in a full ABI parser.

use alloy_primitives::U256;
use sha3::{Digest, Keccak256};

use crate::address::Address;
use crate::error::EthError;
use crate::hexnum::{hex_to_bytes, pad_left_zeros};

/// Width of one ABI word.
pub const WORD: usize = 32;

/// Derives the 4-byte function selector for a canonical signature such as
/// `"balanceOf(address)"`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Encodes a function call as `selector || pad32(args[0]) || pad32(args[1]) ...`.
///
/// Arguments are taken in their natural big-endian form (20 address bytes,
/// minimal integer bytes) and left-padded to a 32-byte word; their types are
/// not interpreted.
pub fn encode_call<A: AsRef<[u8]>>(selector: [u8; 4], args: &[A]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector);

    for arg in args {
        data.extend_from_slice(&pad_left_zeros(arg.as_ref(), WORD));
    }

    data
}

/// ABI types supported by [`decode_single`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiType {
    Address,
    Bool,
    /// `uint<bits>`; plain `uint` is `uint256`.
    Uint(usize),
    /// `bytes<len>` with 1 <= len <= 32.
    FixedBytes(usize),
    Bytes,
    String,
}

impl AbiType {
    pub fn parse(name: &str) -> Result<Self, EthError> {
        let unsupported = || EthError::DecodeError(format!("unsupported abi type: {name}"));

        match name {
            "address" => Ok(AbiType::Address),
            "bool" => Ok(AbiType::Bool),
            "string" => Ok(AbiType::String),
            "bytes" => Ok(AbiType::Bytes),
            "uint" => Ok(AbiType::Uint(256)),
            _ => {
                if let Some(bits) = name.strip_prefix("uint") {
                    let bits: usize = bits.parse().map_err(|_| unsupported())?;
                    if bits == 0 || bits > 256 || bits % 8 != 0 {
                        return Err(unsupported());
                    }
                    Ok(AbiType::Uint(bits))
                } else if let Some(len) = name.strip_prefix("bytes") {
                    let len: usize = len.parse().map_err(|_| unsupported())?;
                    if len == 0 || len > WORD {
                        return Err(unsupported());
                    }
                    Ok(AbiType::FixedBytes(len))
                } else {
                    Err(unsupported())
                }
            }
        }
    }
}

/// A decoded ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Bool(bool),
    Uint(U256),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
}

impl AbiValue {
    pub fn into_string(self) -> Result<String, EthError> {
        match self {
            AbiValue::String(s) => Ok(s),
            other => Err(EthError::DecodeError(format!("expected string, got {other:?}"))),
        }
    }

    pub fn into_uint(self) -> Result<U256, EthError> {
        match self {
            AbiValue::Uint(v) => Ok(v),
            other => Err(EthError::DecodeError(format!("expected uint, got {other:?}"))),
        }
    }
}

/// Decodes the single return value of a read call.
///
/// `hex_result` is the `0x` payload returned by `eth_call`; `abi_type` is the
/// ABI type name of the one output (e.g. `"string"`, `"uint8"`).
pub fn decode_single(hex_result: &str, abi_type: &str) -> Result<AbiValue, EthError> {
    let ty = AbiType::parse(abi_type)?;
    let data = hex_to_bytes(hex_result)
        .map_err(|e| EthError::DecodeError(format!("return data is not hex: {e}")))?;

    match ty {
        AbiType::Address => {
            let w = word(&data, 0)?;
            if w[..12].iter().any(|&b| b != 0) {
                return Err(EthError::DecodeError("address word has dirty high bytes".into()));
            }
            let mut addr = [0u8; 20];
            addr.copy_from_slice(&w[12..]);
            Ok(AbiValue::Address(Address(addr)))
        }
        AbiType::Bool => {
            let w = word(&data, 0)?;
            match (w[..31].iter().all(|&b| b == 0), w[31]) {
                (true, 0) => Ok(AbiValue::Bool(false)),
                (true, 1) => Ok(AbiValue::Bool(true)),
                _ => Err(EthError::DecodeError("bool word is neither 0 nor 1".into())),
            }
        }
        AbiType::Uint(bits) => {
            let w = word(&data, 0)?;
            let unused = WORD - bits / 8;
            if w[..unused].iter().any(|&b| b != 0) {
                return Err(EthError::DecodeError(format!("value overflows uint{bits}")));
            }
            Ok(AbiValue::Uint(U256::from_be_slice(w)))
        }
        AbiType::FixedBytes(len) => {
            let w = word(&data, 0)?;
            Ok(AbiValue::FixedBytes(w[..len].to_vec()))
        }
        AbiType::Bytes => Ok(AbiValue::Bytes(dynamic_bytes(&data)?.to_vec())),
        AbiType::String => {
            let raw = dynamic_bytes(&data)?;
            let s = std::str::from_utf8(raw)
                .map_err(|e| EthError::DecodeError(format!("string is not utf-8: {e}")))?;
            Ok(AbiValue::String(s.to_string()))
        }
    }
}

/// The 32-byte word starting at `offset`.
fn word(data: &[u8], offset: usize) -> Result<&[u8], EthError> {
    let end = offset
        .checked_add(WORD)
        .ok_or_else(|| EthError::DecodeError("offset overflow".into()))?;
    data.get(offset..end).ok_or_else(|| {
        EthError::DecodeError(format!(
            "need {end} bytes of return data, got {}",
            data.len()
        ))
    })
}

/// Reads a word as a length or offset.
fn word_as_usize(data: &[u8], offset: usize) -> Result<usize, EthError> {
    let w = word(data, offset)?;
    if w[..WORD - 8].iter().any(|&b| b != 0) {
        return Err(EthError::DecodeError("length or offset does not fit in 64 bits".into()));
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&w[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(tail))
        .map_err(|_| EthError::DecodeError("length or offset too large".into()))
}

/// Resolves the head offset of a lone dynamic value and returns its payload.
fn dynamic_bytes(data: &[u8]) -> Result<&[u8], EthError> {
    let offset = word_as_usize(data, 0)?;
    let len = word_as_usize(data, offset)?;

    let start = offset + WORD;
    let end = start
        .checked_add(len)
        .ok_or_else(|| EthError::DecodeError("length overflow".into()))?;

    data.get(start..end).ok_or_else(|| {
        EthError::DecodeError(format!(
            "dynamic value needs {end} bytes, got {}",
            data.len()
        ))
    })
}
