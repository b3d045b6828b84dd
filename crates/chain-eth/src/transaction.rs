use alloy_primitives::U256;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use zeroize::Zeroize;

use crate::address::Address;
use crate::error::EthError;
use crate::hexnum::{
    big_int_to_hex, big_int_to_minimal_bytes, bytes_to_hex, trim_leading_zeros,
    u64_to_minimal_bytes,
};
use crate::network::Network;
use crate::rlp;

/// A legacy Ethereum transaction signed with EIP-155 replay protection.
///
/// Built unsigned (v, r and s zero), signed once with [`Transaction::sign`],
/// then serialized with [`Transaction::raw_hex`] for broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    /// Sender. Informational only; not part of either encoding.
    pub from: Option<Address>,
    /// Recipient. `None` creates a contract.
    pub to: Option<Address>,
    pub value: U256,
    /// Calldata, encoded as-is.
    pub data: Vec<u8>,
    pub v: U256,
    pub r: U256,
    pub s: U256,
}

/// The JSON object taken by `eth_call` and `eth_estimateGas`.
///
/// Every field is a hex string; empty fields are omitted from the JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionRequest {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub from: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub to: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub gas: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub gas_price: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub data: String,
}

impl Transaction {
    pub fn new(
        nonce: u64,
        gas_price: U256,
        gas_limit: u64,
        to: Option<Address>,
        value: U256,
        data: Vec<u8>,
    ) -> Self {
        Self {
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            data,
            ..Default::default()
        }
    }

    /// Keccak-256 of the EIP-155 signing payload
    /// `[nonce, gas_price, gas_limit, to, value, data, chain_id, "", ""]`.
    pub fn signing_hash(&self, network: Network) -> [u8; 32] {
        let mut fields = self.body_fields();
        fields.push(vec![network.chain_id()]);
        fields.push(Vec::new());
        fields.push(Vec::new());

        keccak256(&rlp::encode_list(&fields))
    }

    /// Signs the transaction for `network` and stores v, r and s.
    pub fn sign(&mut self, key: &SigningKey, network: Network) -> Result<(), EthError> {
        let hash = self.signing_hash(network);

        let (signature, recovery_id): (Signature, RecoveryId) = key
            .sign_prehash(&hash)
            .map_err(|e| EthError::SigningError(e.to_string()))?;

        self.r = U256::from_be_slice(&signature.r().to_bytes());
        self.s = U256::from_be_slice(&signature.s().to_bytes());
        self.v = derive_v(recovery_id.to_byte(), network.chain_id());
        Ok(())
    }

    /// Parses a raw 32-byte private key and signs with it.
    pub fn sign_with_private_key(
        &mut self,
        private_key: &[u8; 32],
        network: Network,
    ) -> Result<(), EthError> {
        let mut key_bytes = *private_key;
        let signing_key = SigningKey::from_bytes((&key_bytes).into())
            .map_err(|e| EthError::InvalidPrivateKey(e.to_string()));
        key_bytes.zeroize();

        self.sign(&signing_key?, network)
    }

    pub fn is_signed(&self) -> bool {
        !self.r.is_zero() && !self.s.is_zero()
    }

    /// Recovers the address that signed this transaction for `network`.
    pub fn recover_signer(&self, network: Network) -> Result<Address, EthError> {
        let v = u64::try_from(self.v)
            .map_err(|_| EthError::SigningError("v does not fit in 64 bits".into()))?;
        let base = 35 + 2 * u64::from(network.chain_id());
        let recovery_byte = v
            .checked_sub(base)
            .filter(|id| *id <= 1)
            .ok_or_else(|| {
                EthError::SigningError(format!("v = {v} is not valid for chain {network}"))
            })?;

        let recovery_id = RecoveryId::from_byte(recovery_byte as u8)
            .ok_or_else(|| EthError::SigningError("invalid recovery id".into()))?;
        let signature = Signature::from_scalars(
            self.r.to_be_bytes::<32>(),
            self.s.to_be_bytes::<32>(),
        )
        .map_err(|e| EthError::SigningError(e.to_string()))?;

        let key = VerifyingKey::recover_from_prehash(
            &self.signing_hash(network),
            &signature,
            recovery_id,
        )
        .map_err(|e| EthError::SigningError(e.to_string()))?;

        Ok(Address::from_verifying_key(&key))
    }

    /// RLP of `[nonce, gas_price, gas_limit, to, value, data, v, r, s]`.
    pub fn raw_bytes(&self) -> Vec<u8> {
        let mut fields = self.body_fields();
        fields.push(big_int_to_minimal_bytes(&self.v));
        fields.push(big_int_to_minimal_bytes(&self.r));
        fields.push(big_int_to_minimal_bytes(&self.s));

        rlp::encode_list(&fields)
    }

    /// `0x`-prefixed hex of [`Transaction::raw_bytes`], as taken by
    /// `eth_sendRawTransaction`.
    pub fn raw_hex(&self) -> String {
        bytes_to_hex(&self.raw_bytes())
    }

    /// Transaction id: Keccak-256 of the raw signed bytes.
    pub fn hash(&self) -> [u8; 32] {
        keccak256(&self.raw_bytes())
    }

    /// Projects the transaction onto the `eth_call` / `eth_estimateGas` shape.
    ///
    /// Gas fields are omitted when zero; value is always present, `"0x0"` for
    /// zero.
    pub fn to_transaction_request(&self) -> TransactionRequest {
        let quantity_or_empty = |value: U256| {
            if value.is_zero() {
                String::new()
            } else {
                big_int_to_hex(&value)
            }
        };

        TransactionRequest {
            from: self.from.map(|a| a.to_string()).unwrap_or_default(),
            to: self.to.map(|a| a.to_string()).unwrap_or_default(),
            gas: quantity_or_empty(U256::from(self.gas_limit)),
            gas_price: quantity_or_empty(self.gas_price),
            value: big_int_to_hex(&self.value),
            data: bytes_to_hex(&self.data),
        }
    }

    /// The six fields shared by both encodings.
    fn body_fields(&self) -> Vec<Vec<u8>> {
        vec![
            u64_field(self.nonce),
            big_int_to_minimal_bytes(&self.gas_price),
            u64_field(self.gas_limit),
            self.to.map(|a| a.0.to_vec()).unwrap_or_default(),
            big_int_to_minimal_bytes(&self.value),
            self.data.clone(),
        ]
    }
}

/// EIP-155 `v`: `recovery_id + 35 + 2 * chain_id`.
pub fn derive_v(recovery_id: u8, chain_id: u8) -> U256 {
    U256::from(recovery_id) + U256::from(35u64) + U256::from(2u64) * U256::from(chain_id)
}

/// Integer RLP field: minimal big-endian, zero as the empty string.
fn u64_field(value: u64) -> Vec<u8> {
    trim_leading_zeros(&u64_to_minimal_bytes(value)).to_vec()
}

fn keccak256(bytes: &[u8]) -> [u8; 32] {
    Keccak256::digest(bytes).into()
}
