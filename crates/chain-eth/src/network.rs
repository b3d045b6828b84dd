use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EthError;

/// Networks a wallet can sign for.
///
/// The chain id is folded into every signature (EIP-155), so a transaction
/// signed for one network cannot be replayed on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Ropsten,
    Rinkeby,
}

/// All supported networks.
const ALL_NETWORKS: &[Network] = &[Network::Mainnet, Network::Ropsten, Network::Rinkeby];

impl Network {
    pub const fn chain_id(self) -> u8 {
        match self {
            Network::Mainnet => 1,
            Network::Ropsten => 3,
            Network::Rinkeby => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Ropsten => "ropsten",
            Network::Rinkeby => "rinkeby",
        }
    }

    /// Base URL of the block explorer web UI for this network.
    pub fn explorer_url(self) -> String {
        match self {
            Network::Mainnet => "https://etherscan.io".to_string(),
            other => format!("https://{}.etherscan.io", other.name()),
        }
    }

    /// Explorer page for a transaction hash.
    pub fn explorer_tx_url(self, tx_hash: &str) -> String {
        format!("{}/tx/{tx_hash}", self.explorer_url())
    }

    /// Explorer page for an account.
    pub fn explorer_address_url(self, address: &str) -> String {
        format!("{}/address/{address}", self.explorer_url())
    }
}

/// Returns the network for a chain id, or `None` if unsupported.
pub fn get_network(chain_id: u8) -> Option<Network> {
    ALL_NETWORKS.iter().find(|n| n.chain_id() == chain_id).copied()
}

/// Returns all supported networks.
pub fn supported_networks() -> Vec<Network> {
    ALL_NETWORKS.to_vec()
}

impl FromStr for Network {
    type Err = EthError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ALL_NETWORKS
            .iter()
            .find(|n| n.name() == name)
            .copied()
            .ok_or_else(|| EthError::UnknownNetwork(name.to_string()))
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Network {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_ids() {
        assert_eq!(Network::Mainnet.chain_id(), 1);
        assert_eq!(Network::Ropsten.chain_id(), 3);
        assert_eq!(Network::Rinkeby.chain_id(), 4);
    }

    #[test]
    fn lookup_by_chain_id() {
        assert_eq!(get_network(1), Some(Network::Mainnet));
        assert_eq!(get_network(4), Some(Network::Rinkeby));
        assert!(get_network(5).is_none());
    }

    #[test]
    fn parse_by_name() {
        assert_eq!("ropsten".parse::<Network>().unwrap(), Network::Ropsten);
        assert!(matches!(
            "goerli".parse::<Network>(),
            Err(EthError::UnknownNetwork(_))
        ));
    }

    #[test]
    fn supported_networks_includes_all() {
        assert_eq!(supported_networks().len(), 3);
    }

    #[test]
    fn mainnet_explorer_tx_url() {
        assert_eq!(
            Network::Mainnet.explorer_tx_url("0xabc"),
            "https://etherscan.io/tx/0xabc"
        );
    }

    #[test]
    fn testnet_explorer_tx_url_uses_subdomain() {
        assert_eq!(
            Network::Rinkeby.explorer_tx_url("0xabc"),
            "https://rinkeby.etherscan.io/tx/0xabc"
        );
        assert_eq!(
            Network::Ropsten.explorer_address_url("0x01"),
            "https://ropsten.etherscan.io/address/0x01"
        );
    }

    #[test]
    fn serde_round_trip_by_name() {
        let json = serde_json::to_string(&Network::Rinkeby).unwrap();
        assert_eq!(json, "\"rinkeby\"");
        let back: Network = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Network::Rinkeby);
    }
}
