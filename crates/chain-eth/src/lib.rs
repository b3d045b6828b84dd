//! Ethereum core for the wallet.
//!
//! This crate provides:
//! - Hex and big-integer conversions for the JSON-RPC wire format
//! - RLP encoding of byte-string lists
//! - Minimal ABI encoding/decoding and the ERC-20 method table
//! - Legacy transactions with EIP-155 signing and raw serialization
//! - EIP-191 message signatures
//! - Addresses (with EIP-55 checksums) and the supported networks

pub mod abi;
pub mod address;
pub mod erc20;
pub mod error;
pub mod hexnum;
pub mod message;
pub mod network;
pub mod rlp;
pub mod transaction;

pub use address::Address;
pub use alloy_primitives::U256;
pub use error::EthError;
pub use network::Network;
pub use transaction::{Transaction, TransactionRequest};
