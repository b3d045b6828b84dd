//! Etherscan-compatible block explorer client.
//!
//! Every endpoint is a GET with `module`, `action` and `apikey` plus
//! endpoint-specific query parameters. Responses wrap the payload in
//! `{status, message, result}`.

use std::time::Duration;

use alloy_primitives::U256;
use chain_eth::hexnum::{bytes_to_hex, pad_left_zeros};
use chain_eth::Address;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ClientError;
use crate::serde_helpers::{dec_flag, dec_u256, dec_u64};

/// Topic of the ERC-20 `Transfer(address,address,uint256)` event.
pub const TRANSFER_EVENT_TOPIC: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

/// Explorer message for an empty history, which is not an error.
const NO_TRANSACTIONS: &str = "No transactions found";

/// A query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Str(String),
    Int(u64),
    List(Vec<QueryValue>),
}

impl QueryValue {
    /// The query-string form; lists are comma-joined.
    pub fn format(&self) -> String {
        match self {
            QueryValue::Str(s) => s.clone(),
            QueryValue::Int(n) => n.to_string(),
            QueryValue::List(items) => items
                .iter()
                .map(QueryValue::format)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        QueryValue::Str(s.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        QueryValue::Str(s)
    }
}

impl From<u64> for QueryValue {
    fn from(n: u64) -> Self {
        QueryValue::Int(n)
    }
}

impl From<Address> for QueryValue {
    fn from(address: Address) -> Self {
        QueryValue::Str(address.to_string())
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(items: Vec<T>) -> Self {
        QueryValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// History ordering by block number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Block range and ordering for the account history endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRange {
    pub start_block: u64,
    pub end_block: u64,
    pub sort: SortOrder,
}

impl Default for HistoryRange {
    fn default() -> Self {
        Self {
            start_block: 0,
            end_block: 99_999_999,
            sort: SortOrder::Asc,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    message: String,
    #[serde(default)]
    result: Value,
}

/// A plain ether transfer or contract call (`account/txlist`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalTransaction {
    #[serde(deserialize_with = "dec_u64")]
    pub block_number: u64,
    #[serde(deserialize_with = "dec_u64")]
    pub time_stamp: u64,
    pub hash: String,
    #[serde(deserialize_with = "dec_u64")]
    pub nonce: u64,
    pub block_hash: String,
    #[serde(deserialize_with = "dec_u64")]
    pub transaction_index: u64,
    pub from: String,
    pub to: String,
    #[serde(deserialize_with = "dec_u256")]
    pub value: U256,
    #[serde(deserialize_with = "dec_u64")]
    pub gas: u64,
    #[serde(deserialize_with = "dec_u256")]
    pub gas_price: U256,
    #[serde(deserialize_with = "dec_flag")]
    pub is_error: bool,
    #[serde(rename = "txreceipt_status", default)]
    pub tx_receipt_status: String,
    pub input: String,
    #[serde(default)]
    pub contract_address: String,
    #[serde(deserialize_with = "dec_u64")]
    pub cumulative_gas_used: u64,
    #[serde(deserialize_with = "dec_u64")]
    pub gas_used: u64,
    #[serde(deserialize_with = "dec_u64")]
    pub confirmations: u64,
}

/// A value transfer made by contract execution (`account/txlistinternal`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalTransaction {
    pub hash: String,
    #[serde(default)]
    pub trace_id: String,
    #[serde(deserialize_with = "dec_u64")]
    pub block_number: u64,
    #[serde(deserialize_with = "dec_u64")]
    pub time_stamp: u64,
    pub from: String,
    pub to: String,
    #[serde(deserialize_with = "dec_u256")]
    pub value: U256,
    #[serde(default)]
    pub contract_address: String,
    #[serde(default)]
    pub input: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "dec_u64")]
    pub gas: u64,
    #[serde(deserialize_with = "dec_u64")]
    pub gas_used: u64,
    #[serde(deserialize_with = "dec_flag")]
    pub is_error: bool,
    #[serde(default)]
    pub err_code: String,
}

/// An ERC-20 `Transfer` involving the account (`account/tokentx`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransaction {
    #[serde(deserialize_with = "dec_u64")]
    pub block_number: u64,
    #[serde(deserialize_with = "dec_u64")]
    pub time_stamp: u64,
    pub hash: String,
    #[serde(deserialize_with = "dec_u64")]
    pub nonce: u64,
    pub block_hash: String,
    pub from: String,
    pub contract_address: String,
    pub to: String,
    #[serde(deserialize_with = "dec_u256")]
    pub value: U256,
    pub token_name: String,
    pub token_symbol: String,
    #[serde(deserialize_with = "dec_u64")]
    pub token_decimal: u64,
    #[serde(deserialize_with = "dec_u64")]
    pub transaction_index: u64,
    #[serde(deserialize_with = "dec_u64")]
    pub gas: u64,
    #[serde(deserialize_with = "dec_u256")]
    pub gas_price: U256,
    #[serde(deserialize_with = "dec_u64")]
    pub gas_used: u64,
    #[serde(deserialize_with = "dec_u64")]
    pub cumulative_gas_used: u64,
    pub input: String,
    #[serde(deserialize_with = "dec_u64")]
    pub confirmations: u64,
}

/// An event log (`logs/getLogs`). Numeric fields stay `0x` hex as sent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_number: String,
    pub time_stamp: String,
    pub gas_price: String,
    pub gas_used: String,
    pub log_index: String,
    pub transaction_hash: String,
    pub transaction_index: String,
}

/// Filter for [`ExplorerClient::logs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub from_block: u64,
    /// `None` means the latest block.
    pub to_block: Option<u64>,
    pub address: Address,
    /// `(name, value)` pairs such as `("topic0", "0xddf2...")`.
    pub topics: Vec<(String, String)>,
}

/// Explorer API client.
pub struct ExplorerClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ExplorerClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        if base_url.is_empty() {
            return Err(ClientError::MissingEndpoint("etherscan_api_url".into()));
        }

        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Issues one explorer query and decodes its `result`.
    pub async fn query<R: DeserializeOwned>(
        &self,
        module: &str,
        action: &str,
        params: Vec<(&str, QueryValue)>,
    ) -> Result<R, ClientError> {
        debug!("explorer {module}/{action}");
        let query = build_query(module, action, &self.api_key, params);

        let body = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await?
            .text()
            .await?;

        parse_response(&body)
    }

    pub async fn normal_transactions(
        &self,
        address: &Address,
        range: HistoryRange,
    ) -> Result<Vec<NormalTransaction>, ClientError> {
        self.query("account", "txlist", history_params(address, range))
            .await
    }

    pub async fn internal_transactions(
        &self,
        address: &Address,
        range: HistoryRange,
    ) -> Result<Vec<InternalTransaction>, ClientError> {
        self.query("account", "txlistinternal", history_params(address, range))
            .await
    }

    pub async fn erc20_token_transactions(
        &self,
        address: &Address,
        range: HistoryRange,
    ) -> Result<Vec<TokenTransaction>, ClientError> {
        self.query("account", "tokentx", history_params(address, range))
            .await
    }

    pub async fn logs(&self, filter: &LogFilter) -> Result<Vec<ExplorerLog>, ClientError> {
        self.query("logs", "getLogs", log_params(filter)).await
    }
}

/// Topics selecting ERC-20 transfers received by `address`.
pub fn erc20_transfer_topics(address: &Address) -> Vec<(String, String)> {
    vec![
        ("topic0".to_string(), TRANSFER_EVENT_TOPIC.to_string()),
        ("topic2".to_string(), address_topic(address)),
    ]
}

/// An address left-padded to a 32-byte topic.
fn address_topic(address: &Address) -> String {
    bytes_to_hex(&pad_left_zeros(address.as_bytes(), 32))
}

fn history_params(address: &Address, range: HistoryRange) -> Vec<(&'static str, QueryValue)> {
    vec![
        ("address", (*address).into()),
        ("startblock", range.start_block.into()),
        ("endblock", range.end_block.into()),
        ("sort", range.sort.as_str().into()),
    ]
}

fn log_params(filter: &LogFilter) -> Vec<(&str, QueryValue)> {
    let mut params = vec![
        ("fromBlock", filter.from_block.into()),
        (
            "toBlock",
            match filter.to_block {
                Some(block) => block.into(),
                None => "latest".into(),
            },
        ),
        ("address", filter.address.into()),
    ];
    for (name, value) in &filter.topics {
        params.push((name.as_str(), value.clone().into()));
    }
    params
}

fn build_query(
    module: &str,
    action: &str,
    api_key: &str,
    params: Vec<(&str, QueryValue)>,
) -> Vec<(String, String)> {
    let mut query = vec![
        ("module".to_string(), module.to_string()),
        ("action".to_string(), action.to_string()),
        ("apikey".to_string(), api_key.to_string()),
    ];
    query.extend(
        params
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.format())),
    );
    query
}

/// Unwraps an explorer envelope.
///
/// Status `"1"` is success. An empty history is reported with status `"0"`
/// and is still decoded. Anything else is [`ClientError::Explorer`].
pub fn parse_response<R: DeserializeOwned>(body: &str) -> Result<R, ClientError> {
    let response: ExplorerResponse = serde_json::from_str(body)?;

    if response.status != "1" && response.message != NO_TRANSACTIONS {
        let detail = match &response.result {
            Value::String(s) => s.clone(),
            _ => String::new(),
        };
        return Err(ClientError::Explorer(if detail.is_empty() {
            response.message
        } else {
            format!("{}: {detail}", response.message)
        }));
    }

    serde_json::from_value(response.result)
        .map_err(|e| ClientError::InvalidResponse(format!("explorer result: {e}")))
}
