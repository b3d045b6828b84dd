use chain_eth::EthError;
use thiserror::Error;

/// Errors from talking to a node or a block explorer.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("explorer error: {0}")]
    Explorer(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Chain(#[from] EthError),

    #[error("worker exited without reporting a result")]
    WorkerLost,

    #[error("{0} is not configured")]
    MissingEndpoint(String),
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::InvalidResponse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_rpc_error() {
        let err = ClientError::Rpc {
            code: -32000,
            message: "nonce too low".into(),
        };
        assert_eq!(err.to_string(), "rpc error -32000: nonce too low");
    }

    #[test]
    fn chain_error_is_transparent() {
        let err: ClientError = EthError::DecodeError("short".into()).into();
        assert_eq!(err.to_string(), "decode error: short");
    }

    #[test]
    fn json_error_maps_to_invalid_response() {
        let json_err = serde_json::from_str::<u64>("\"x\"").unwrap_err();
        let err: ClientError = json_err.into();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[test]
    fn display_missing_endpoint() {
        let err = ClientError::MissingEndpoint("rinkeby node_url".into());
        assert_eq!(err.to_string(), "rinkeby node_url is not configured");
    }
}
