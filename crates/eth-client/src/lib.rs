//! Remote access for the wallet: a JSON-RPC node client, an
//! Etherscan-compatible explorer client and concurrent ERC-20 queries.

pub mod erc20;
pub mod error;
pub mod explorer;
pub mod fanout;
pub mod node;
pub mod serde_helpers;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::ClientError;
pub use explorer::{ExplorerClient, HistoryRange, LogFilter, SortOrder};
pub use node::{BlockParam, NodeClient, NodeTransaction};
pub use transport::{HttpTransport, Transport, DEFAULT_TIMEOUT};
