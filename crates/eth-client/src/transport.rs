use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The remote-call primitive: one JSON-RPC method invocation.
///
/// Implementations are shared across concurrent tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, ClientError>;
}

/// JSON-RPC 2.0 over HTTP POST.
pub struct HttpTransport {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let url = url.into();
        if url.is_empty() {
            return Err(ClientError::MissingEndpoint("node_url".into()));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url,
            next_id: AtomicU64::new(0),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!("rpc request {id}: {method}");

        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let response: RpcResponse = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .json()
            .await?;

        response.into_result()
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl RpcResponse {
    /// An error object wins over any result; a missing result is JSON null.
    pub(crate) fn into_result(self) -> Result<Value, ClientError> {
        match self.error {
            Some(err) => Err(ClientError::Rpc {
                code: err.code,
                message: err.message,
            }),
            None => Ok(self.result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<Value, ClientError> {
        serde_json::from_str::<RpcResponse>(body).unwrap().into_result()
    }

    #[test]
    fn result_is_returned() {
        let value = parse(r#"{"jsonrpc":"2.0","id":1,"result":"0x5208"}"#).unwrap();
        assert_eq!(value, Value::String("0x5208".into()));
    }

    #[test]
    fn error_object_becomes_rpc_error() {
        let err = parse(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#,
        )
        .unwrap_err();
        match err {
            ClientError::Rpc { code, message } => {
                assert_eq!(code, -32601);
                assert_eq!(message, "method not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn null_result_is_null() {
        assert_eq!(parse(r#"{"jsonrpc":"2.0","id":1,"result":null}"#).unwrap(), Value::Null);
    }

    #[test]
    fn request_serializes_as_jsonrpc_2() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "eth_blockNumber",
            params: vec![],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"jsonrpc": "2.0", "id": 7, "method": "eth_blockNumber", "params": []})
        );
    }

    #[test]
    fn empty_url_is_missing_endpoint() {
        assert!(matches!(
            HttpTransport::new("", DEFAULT_TIMEOUT),
            Err(ClientError::MissingEndpoint(_))
        ));
    }
}
