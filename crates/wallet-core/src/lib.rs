//! Ethereum wallet: key holding, signing and account flows over a node and
//! a block explorer.

pub mod config;
pub mod error;
pub mod logging;
pub mod signer;
pub mod wallet;

pub use config::{NetworkUrls, WalletConfig};
pub use error::WalletError;
pub use logging::init_logging;
pub use signer::{verify_message, Wallet};
pub use wallet::{EthereumWallet, GasSettings};

pub use chain_eth::{Address, Network, Transaction, U256};
