use thiserror::Error;

/// Ethereum codec and signing errors.
#[derive(Debug, Error)]
pub enum EthError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}
