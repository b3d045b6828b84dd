use alloy_primitives::U256;
use chain_eth::error::EthError;
use eth_client::error::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error(transparent)]
    Chain(#[from] EthError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("config error: {0}")]
    Config(String),

    #[error("insufficient funds: need {needed} wei, have {available} wei")]
    InsufficientFunds { needed: U256, available: U256 },

    #[error("unknown token: {0}")]
    UnknownToken(String),

    #[error("wallet holds no signing key")]
    NoSigner,
}
