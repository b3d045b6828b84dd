//! EIP-191 `personal_sign` message signatures.

use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};

use crate::address::Address;
use crate::error::EthError;

/// Length of an `r || s || v` signature.
pub const SIGNATURE_LEN: usize = 65;

/// keccak256("\x19Ethereum Signed Message:\n" + len(message) + message)
pub fn message_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut hasher = Keccak256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Signs `message`, returning `r || s || v` with v = 27 or 28.
pub fn sign_message(key: &SigningKey, message: &[u8]) -> Result<[u8; SIGNATURE_LEN], EthError> {
    let hash = message_hash(message);
    let (signature, recovery_id): (Signature, RecoveryId) = key
        .sign_prehash(&hash)
        .map_err(|e| EthError::SigningError(e.to_string()))?;

    let mut sig = [0u8; SIGNATURE_LEN];
    sig[..64].copy_from_slice(&signature.to_bytes());
    sig[64] = recovery_id.to_byte() + 27;
    Ok(sig)
}

/// Recovers the address that produced `signature` over `message`.
///
/// Accepts v as 0/1 or 27/28.
pub fn recover_address(message: &[u8], signature: &[u8]) -> Result<Address, EthError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(EthError::SigningError(format!(
            "expected {SIGNATURE_LEN}-byte signature, got {}",
            signature.len()
        )));
    }

    let v = signature[64];
    let recovery_byte = if v >= 27 { v - 27 } else { v };
    let recovery_id = RecoveryId::from_byte(recovery_byte)
        .filter(|_| recovery_byte <= 1)
        .ok_or_else(|| EthError::SigningError(format!("invalid v value {v}")))?;

    let sig = Signature::from_slice(&signature[..64])
        .map_err(|e| EthError::SigningError(e.to_string()))?;

    let key = VerifyingKey::recover_from_prehash(&message_hash(message), &sig, recovery_id)
        .map_err(|e| EthError::SigningError(e.to_string()))?;

    Ok(Address::from_verifying_key(&key))
}
