//! `config.json` loading.
//!
//! The file is looked up at `$ETHEREUM_WALLET_CONFIG_PATH`, falling back to
//! `config.json` in the working directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chain_eth::erc20::Erc20Token;
use chain_eth::{Address, Network};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "ETHEREUM_WALLET_CONFIG_PATH";

const DEFAULT_CONFIG_FILE: &str = "config.json";

fn default_timeout_secs() -> u64 {
    eth_client::DEFAULT_TIMEOUT.as_secs()
}

/// Remote endpoints for one network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkUrls {
    #[serde(default)]
    pub node_url: String,
    #[serde(default)]
    pub etherscan_api_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    pub network: Network,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mainnet: Option<NetworkUrls>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ropsten: Option<NetworkUrls>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rinkeby: Option<NetworkUrls>,
    #[serde(rename = "etherscan_api_Key", default)]
    pub etherscan_api_key: String,
    /// Account to watch when no key is loaded.
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub erc20_list: Vec<Erc20Token>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl WalletConfig {
    /// Loads from the default location.
    pub fn load() -> Result<Self, WalletError> {
        let cwd = std::env::current_dir()
            .map_err(|e| WalletError::Config(format!("working directory: {e}")))?;
        let path = resolve_config_path(std::env::var_os(CONFIG_PATH_ENV), &cwd);
        Self::load_from(path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();
        debug!("loading config from {}", path.display());
        let json = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        serde_json::from_str(json).map_err(|e| WalletError::Config(e.to_string()))
    }

    /// Endpoints of the selected network.
    pub fn endpoints(&self) -> Result<&NetworkUrls, WalletError> {
        let urls = match self.network {
            Network::Mainnet => self.mainnet.as_ref(),
            Network::Ropsten => self.ropsten.as_ref(),
            Network::Rinkeby => self.rinkeby.as_ref(),
        };
        match urls {
            Some(urls) if !urls.node_url.is_empty() => Ok(urls),
            _ => Err(WalletError::Config(format!(
                "no node_url configured for {}",
                self.network
            ))),
        }
    }

    /// The configured watch address, if any.
    pub fn watch_address(&self) -> Result<Option<Address>, WalletError> {
        if self.address.is_empty() {
            return Ok(None);
        }
        self.address
            .parse()
            .map(Some)
            .map_err(|e| WalletError::Config(format!("address: {e}")))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn resolve_config_path(from_env: Option<OsString>, cwd: &Path) -> PathBuf {
    match from_env {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => cwd.join(DEFAULT_CONFIG_FILE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "network": "rinkeby",
        "rinkeby": {
            "node_url": "https://rinkeby.infura.io/v3/KEY",
            "etherscan_api_url": "https://api-rinkeby.etherscan.io/api"
        },
        "mainnet": {
            "node_url": "https://mainnet.infura.io/v3/KEY",
            "etherscan_api_url": "https://api.etherscan.io/api"
        },
        "server_url": "http://localhost:8545",
        "keyfile": "./keystore",
        "passphrase": "",
        "address": "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf",
        "etherscan_api_Key": "ABC123",
        "erc20_list": [
            {
                "address": "0x01BE23585060835E02B77ef475b0Cc51aA1e0709",
                "name": "ChainLink Token",
                "symbol": "LINK",
                "decimals": 18
            }
        ]
    }"#;

    #[test]
    fn parses_full_config_file() {
        let config = WalletConfig::from_json(SAMPLE).unwrap();

        assert_eq!(config.network, Network::Rinkeby);
        assert_eq!(config.etherscan_api_key, "ABC123");
        assert_eq!(config.erc20_list.len(), 1);
        assert_eq!(config.erc20_list[0].symbol, "LINK");
        assert_eq!(config.timeout(), eth_client::DEFAULT_TIMEOUT);
        assert!(config.ropsten.is_none());
    }

    #[test]
    fn endpoints_follow_selected_network() {
        let mut config = WalletConfig::from_json(SAMPLE).unwrap();
        assert_eq!(
            config.endpoints().unwrap().node_url,
            "https://rinkeby.infura.io/v3/KEY"
        );

        config.network = Network::Mainnet;
        assert_eq!(
            config.endpoints().unwrap().etherscan_api_url,
            "https://api.etherscan.io/api"
        );

        config.network = Network::Ropsten;
        assert!(matches!(config.endpoints(), Err(WalletError::Config(_))));
    }

    #[test]
    fn watch_address_is_optional() {
        let mut config = WalletConfig::from_json(SAMPLE).unwrap();
        assert_eq!(
            config.watch_address().unwrap().map(|a| a.to_string()),
            Some("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf".to_string())
        );

        config.address.clear();
        assert_eq!(config.watch_address().unwrap(), None);

        config.address = "0x1234".into();
        assert!(config.watch_address().is_err());
    }

    #[test]
    fn timeout_can_be_overridden() {
        let config = WalletConfig::from_json(r#"{"network":"mainnet","timeout_secs":5}"#).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn unknown_network_is_config_error() {
        assert!(matches!(
            WalletConfig::from_json(r#"{"network":"kovan"}"#),
            Err(WalletError::Config(_))
        ));
    }

    #[test]
    fn malformed_json_is_config_error() {
        assert!(matches!(
            WalletConfig::from_json("{not json"),
            Err(WalletError::Config(_))
        ));
    }

    #[test]
    fn config_path_prefers_environment() {
        let cwd = Path::new("/srv/wallet");
        assert_eq!(
            resolve_config_path(Some("/etc/wallet.json".into()), cwd),
            PathBuf::from("/etc/wallet.json")
        );
        assert_eq!(
            resolve_config_path(None, cwd),
            PathBuf::from("/srv/wallet/config.json")
        );
        assert_eq!(
            resolve_config_path(Some(OsString::new()), cwd),
            PathBuf::from("/srv/wallet/config.json")
        );
    }

    #[test]
    fn load_from_reads_file() {
        let path = std::env::temp_dir().join(format!("wallet-config-{}.json", std::process::id()));
        std::fs::write(&path, SAMPLE).unwrap();
        let loaded = WalletConfig::load_from(&path);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.unwrap().network, Network::Rinkeby);
    }

    #[test]
    fn missing_file_is_config_error() {
        assert!(matches!(
            WalletConfig::load_from("/nonexistent/wallet/config.json"),
            Err(WalletError::Config(_))
        ));
    }
}
