use std::fmt;

use chain_eth::hexnum::bytes_to_hex;
use chain_eth::message::{recover_address, sign_message};
use chain_eth::{Address, EthError, Network, Transaction};
use k256::ecdsa::SigningKey;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::error::WalletError;

/// A secp256k1 key and the account it controls.
///
/// The key is wiped on drop.
pub struct Wallet {
    key: SigningKey,
    address: Address,
}

impl Wallet {
    /// Generates a fresh key from the OS random source.
    pub fn random() -> Self {
        let mut secret = [0u8; 32];
        loop {
            rand::rngs::OsRng.fill_bytes(&mut secret);
            // Rejects zero and values at or above the curve order.
            if let Ok(key) = SigningKey::from_bytes((&secret).into()) {
                secret.zeroize();
                return Self::from_key(key);
            }
        }
    }

    /// Imports a 32-byte private key.
    pub fn from_bytes(secret: &[u8; 32]) -> Result<Self, WalletError> {
        let key = SigningKey::from_bytes(secret.into())
            .map_err(|e| EthError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::from_key(key))
    }

    /// Imports a hex private key, with or without `0x`.
    pub fn from_hex(secret_hex: &str) -> Result<Self, WalletError> {
        let stripped = secret_hex.strip_prefix("0x").unwrap_or(secret_hex);
        let bytes = Zeroizing::new(
            hex::decode(stripped).map_err(|e| EthError::InvalidPrivateKey(e.to_string()))?,
        );
        let secret: Zeroizing<[u8; 32]> = Zeroizing::new(
            bytes.as_slice().try_into().map_err(|_| {
                EthError::InvalidPrivateKey(format!("expected 32 bytes, got {}", bytes.len()))
            })?,
        );
        Self::from_bytes(&secret)
    }

    fn from_key(key: SigningKey) -> Self {
        let address = Address::from_verifying_key(key.verifying_key());
        Self { key, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// The private key as `0x` hex. Wiped when the returned value drops.
    pub fn export_hex(&self) -> Zeroizing<String> {
        let mut bytes: [u8; 32] = self.key.to_bytes().into();
        let hex = Zeroizing::new(bytes_to_hex(&bytes));
        bytes.zeroize();
        hex
    }

    /// Signs `tx` in place for `network` and records this account as sender.
    pub fn sign_transaction(&self, tx: &mut Transaction, network: Network) -> Result<(), WalletError> {
        tx.sign(&self.key, network)?;
        tx.from = Some(self.address);
        Ok(())
    }

    /// Signs `tx` and returns the broadcastable `0x` raw transaction.
    pub fn sign_transaction_to_raw(
        &self,
        tx: &mut Transaction,
        network: Network,
    ) -> Result<String, WalletError> {
        self.sign_transaction(tx, network)?;
        Ok(tx.raw_hex())
    }

    /// EIP-191 signature over `message` as `0x` hex of `r || s || v`.
    pub fn sign_message(&self, message: &[u8]) -> Result<String, WalletError> {
        let signature = sign_message(&self.key, message)?;
        Ok(bytes_to_hex(&signature))
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// True when `signature` over `message` was produced by `address`.
///
/// Malformed signatures verify as false.
pub fn verify_message(address: &Address, signature: &[u8], message: &[u8]) -> bool {
    recover_address(message, signature).is_ok_and(|signer| signer == *address)
}
