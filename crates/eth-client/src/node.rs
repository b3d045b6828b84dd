use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use chain_eth::hexnum::{hex_to_big_int, hex_to_u64, u64_to_hex};
use chain_eth::{Address, EthError, TransactionRequest};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::ClientError;
use crate::serde_helpers::{hex_u256, hex_u64, hex_u64_opt};
use crate::transport::{HttpTransport, Transport};

/// Block selector for state queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockParam {
    #[default]
    Latest,
    Earliest,
    Pending,
    Number(u64),
}

impl FromStr for BlockParam {
    type Err = EthError;

    /// Accepts `latest`, `earliest`, `pending` or a `0x` block number.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "latest" => Ok(BlockParam::Latest),
            "earliest" => Ok(BlockParam::Earliest),
            "pending" => Ok(BlockParam::Pending),
            _ if input.starts_with("0x") && input.len() > 2 => {
                Ok(BlockParam::Number(hex_to_u64(input)?))
            }
            _ => Err(EthError::EncodingError(format!(
                "{input} is not a valid block parameter"
            ))),
        }
    }
}

impl fmt::Display for BlockParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockParam::Latest => f.write_str("latest"),
            BlockParam::Earliest => f.write_str("earliest"),
            BlockParam::Pending => f.write_str("pending"),
            BlockParam::Number(n) => f.write_str(&u64_to_hex(*n)),
        }
    }
}

impl Serialize for BlockParam {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A transaction as returned by `eth_getTransactionByHash`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTransaction {
    pub hash: String,
    #[serde(default, deserialize_with = "hex_u64_opt")]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default, deserialize_with = "hex_u64_opt")]
    pub transaction_index: Option<u64>,
    #[serde(deserialize_with = "hex_u64")]
    pub nonce: u64,
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(deserialize_with = "hex_u256")]
    pub value: U256,
    #[serde(deserialize_with = "hex_u64")]
    pub gas: u64,
    #[serde(deserialize_with = "hex_u256")]
    pub gas_price: U256,
    pub input: String,
}

/// Typed Ethereum JSON-RPC client over a shared [`Transport`].
pub struct NodeClient<T> {
    transport: Arc<T>,
}

impl<T> Clone for NodeClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl NodeClient<HttpTransport> {
    pub fn http(url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self::new(HttpTransport::new(url, timeout)?))
    }
}

impl<T: Transport + 'static> NodeClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn request<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<R, ClientError> {
        let value = self.transport.call(method, params).await?;
        serde_json::from_value(value)
            .map_err(|e| ClientError::InvalidResponse(format!("{method}: {e}")))
    }

    /// A `0x` quantity result that fits in a `u64`.
    async fn request_u64(&self, method: &str, params: Vec<Value>) -> Result<u64, ClientError> {
        let hex: String = self.request(method, params).await?;
        Ok(hex_to_u64(&hex)?)
    }

    /// A `0x` quantity result of up to 256 bits.
    async fn request_u256(&self, method: &str, params: Vec<Value>) -> Result<U256, ClientError> {
        let hex: String = self.request(method, params).await?;
        Ok(hex_to_big_int(&hex)?)
    }

    pub async fn block_number(&self) -> Result<u64, ClientError> {
        self.request_u64("eth_blockNumber", vec![]).await
    }

    pub async fn balance(&self, address: &Address, block: BlockParam) -> Result<U256, ClientError> {
        let params = vec![address_param(address), block_param(block)];
        self.request_u256("eth_getBalance", params).await
    }

    /// `None` when the node does not know the hash.
    pub async fn transaction_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<NodeTransaction>, ClientError> {
        self.request("eth_getTransactionByHash", vec![Value::String(hash.to_string())])
            .await
    }

    pub async fn estimate_gas(&self, request: &TransactionRequest) -> Result<u64, ClientError> {
        let params = vec![serde_json::to_value(request)?];
        self.request_u64("eth_estimateGas", params).await
    }

    pub async fn gas_price(&self) -> Result<U256, ClientError> {
        self.request_u256("eth_gasPrice", vec![]).await
    }

    /// The account nonce.
    pub async fn transaction_count(
        &self,
        address: &Address,
        block: BlockParam,
    ) -> Result<u64, ClientError> {
        let params = vec![address_param(address), block_param(block)];
        self.request_u64("eth_getTransactionCount", params).await
    }

    /// Executes a read-only call and returns the raw `0x` return data.
    pub async fn call(
        &self,
        request: &TransactionRequest,
        block: BlockParam,
    ) -> Result<String, ClientError> {
        let params = vec![serde_json::to_value(request)?, block_param(block)];
        self.request("eth_call", params).await
    }

    /// Calls `contract` with prebuilt calldata at the latest block.
    pub async fn call_contract(&self, contract: &Address, data: &[u8]) -> Result<String, ClientError> {
        let request = TransactionRequest {
            to: contract.to_string(),
            data: chain_eth::hexnum::bytes_to_hex(data),
            ..Default::default()
        };
        debug!("eth_call {contract} selector {}", hex::encode(data.get(..4).unwrap_or(data)));
        self.call(&request, BlockParam::Latest).await
    }

    /// Broadcasts a signed transaction and returns its hash.
    pub async fn send_raw_transaction(&self, raw_hex: &str) -> Result<String, ClientError> {
        let hash: String = self
            .request("eth_sendRawTransaction", vec![Value::String(raw_hex.to_string())])
            .await?;
        info!("broadcast transaction {hash}");
        Ok(hash)
    }
}

fn address_param(address: &Address) -> Value {
    Value::String(address.to_string())
}

fn block_param(block: BlockParam) -> Value {
    Value::String(block.to_string())
}
