use std::fmt;
use std::str::FromStr;

use k256::ecdsa::VerifyingKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// A 20-byte Ethereum account address.
///
/// Displays as an EIP-55 checksummed string and serializes the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Derives the address controlled by a secp256k1 verifying key.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let uncompressed = key.to_encoded_point(false);
        let mut key_65 = [0u8; 65];
        key_65.copy_from_slice(uncompressed.as_bytes());
        Self::from_uncompressed_pubkey(&key_65)
    }

    /// Last 20 bytes of the Keccak-256 of the 64-byte public key body.
    fn from_uncompressed_pubkey(uncompressed_pubkey: &[u8; 65]) -> Self {
        let hash = Keccak256::digest(&uncompressed_pubkey[1..]);
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&hash[12..]);
        Address(addr)
    }

    /// The EIP-55 mixed-case rendering of this address.
    pub fn to_checksum(&self) -> String {
        let hex_part = hex::encode(self.0);
        let hash = Keccak256::digest(hex_part.as_bytes());

        let mut checksummed = String::with_capacity(42);
        checksummed.push_str("0x");

        for (i, c) in hex_part.chars().enumerate() {
            // Nibble i of the hash decides the case of hex digit i.
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                checksummed.push(c.to_ascii_uppercase());
            } else {
                checksummed.push(c);
            }
        }

        checksummed
    }
}

impl FromStr for Address {
    type Err = EthError;

    /// Parses `0x` followed by exactly 40 hex digits. Case is not checked;
    /// use [`validate_address`] for checksum verification.
    fn from_str(address: &str) -> Result<Self, Self::Err> {
        let hex_str = address
            .strip_prefix("0x")
            .or_else(|| address.strip_prefix("0X"))
            .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))?;

        if hex_str.len() != 40 {
            return Err(EthError::InvalidAddress(format!(
                "expected 40 hex characters, got {}",
                hex_str.len()
            )));
        }

        let bytes = hex::decode(hex_str)
            .map_err(|e| EthError::InvalidAddress(format!("invalid hex: {e}")))?;

        let mut addr = [0u8; 20];
        addr.copy_from_slice(&bytes);
        Ok(Address(addr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Validates an Ethereum address string.
///
/// Checks the format (0x + 40 hex characters). If the address contains mixed
/// case, the EIP-55 checksum is verified and `Ok(false)` is returned on a
/// mismatch.
pub fn validate_address(address: &str) -> Result<bool, EthError> {
    let parsed: Address = address.parse()?;
    // `parse` has checked the two-byte prefix and 40 ASCII hex digits.
    let hex_part = &address[2..];

    let is_all_lower = hex_part.chars().all(|c| !c.is_ascii_uppercase());
    let is_all_upper = hex_part.chars().all(|c| !c.is_ascii_lowercase());

    if is_all_lower || is_all_upper {
        return Ok(true);
    }

    Ok(parsed.to_checksum()[2..] == *hex_part)
}
