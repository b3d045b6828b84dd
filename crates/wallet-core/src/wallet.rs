//! Account-level flows: balances, histories and signed transfers.

use std::collections::HashMap;

use alloy_primitives::U256;
use chain_eth::erc20::Erc20Token;
use chain_eth::{Address, Network, Transaction, TransactionRequest};
use eth_client::explorer::{
    erc20_transfer_topics, ExplorerLog, InternalTransaction, NormalTransaction, TokenTransaction,
};
use eth_client::{
    BlockParam, ClientError, ExplorerClient, HistoryRange, HttpTransport, LogFilter, NodeClient,
    Transport,
};
use log::{debug, info};

use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::signer::Wallet;

/// Fee and limit overrides for an outgoing transaction.
///
/// A zero gas price is filled from the node; a zero gas limit is estimated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GasSettings {
    pub gas_price: U256,
    pub gas_limit: u64,
}

/// One account on one network, with an optional signing key.
pub struct EthereumWallet<T> {
    node: NodeClient<T>,
    explorer: Option<ExplorerClient>,
    signer: Option<Wallet>,
    address: Address,
    network: Network,
    erc20_list: Vec<Erc20Token>,
}

impl EthereumWallet<HttpTransport> {
    /// Connects to the endpoints of the configured network.
    ///
    /// Without `signer` the wallet watches the configured `address`.
    pub fn from_config(config: &WalletConfig, signer: Option<Wallet>) -> Result<Self, WalletError> {
        let urls = config.endpoints()?;
        let node = NodeClient::http(urls.node_url.clone(), config.timeout())?;

        let address = match (&signer, config.watch_address()?) {
            (Some(signer), _) => signer.address(),
            (None, Some(address)) => address,
            (None, None) => {
                return Err(WalletError::Config(
                    "either a signing key or an address is required".into(),
                ))
            }
        };

        let mut wallet = Self::new(node, config.network, address)
            .with_tokens(config.erc20_list.clone());
        if let Some(signer) = signer {
            wallet = wallet.with_signer(signer);
        }
        if !urls.etherscan_api_url.is_empty() {
            wallet = wallet.with_explorer(ExplorerClient::new(
                urls.etherscan_api_url.clone(),
                config.etherscan_api_key.clone(),
                config.timeout(),
            )?);
        }
        Ok(wallet)
    }
}

impl<T: Transport + 'static> EthereumWallet<T> {
    /// A watch-only wallet for `address`.
    pub fn new(node: NodeClient<T>, network: Network, address: Address) -> Self {
        Self {
            node,
            explorer: None,
            signer: None,
            address,
            network,
            erc20_list: Vec::new(),
        }
    }

    /// Attaches a key; the wallet's address becomes the key's.
    pub fn with_signer(mut self, signer: Wallet) -> Self {
        self.address = signer.address();
        self.signer = Some(signer);
        self
    }

    pub fn with_explorer(mut self, explorer: ExplorerClient) -> Self {
        self.explorer = Some(explorer);
        self
    }

    pub fn with_tokens(mut self, tokens: Vec<Erc20Token>) -> Self {
        self.erc20_list = tokens;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn node(&self) -> &NodeClient<T> {
        &self.node
    }

    pub fn signer(&self) -> Option<&Wallet> {
        self.signer.as_ref()
    }

    pub fn tokens(&self) -> &[Erc20Token] {
        &self.erc20_list
    }

    /// Looks up a configured token by symbol.
    pub fn find_token(&self, symbol: &str) -> Result<&Erc20Token, WalletError> {
        self.erc20_list
            .iter()
            .find(|token| token.symbol == symbol)
            .ok_or_else(|| WalletError::UnknownToken(symbol.to_string()))
    }

    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        self.network.explorer_tx_url(tx_hash)
    }

    /// Ether balance in wei at the latest block.
    pub async fn balance(&self) -> Result<U256, WalletError> {
        Ok(self.node.balance(&self.address, BlockParam::Latest).await?)
    }

    pub async fn gas_price(&self) -> Result<U256, WalletError> {
        Ok(self.node.gas_price().await?)
    }

    pub async fn nonce(&self, block: BlockParam) -> Result<u64, WalletError> {
        Ok(self.node.transaction_count(&self.address, block).await?)
    }

    pub async fn estimate_gas(&self, request: &TransactionRequest) -> Result<u64, WalletError> {
        Ok(self.node.estimate_gas(request).await?)
    }

    /// Whole-token balances of every configured token, keyed by symbol.
    pub async fn erc20_balances(&self) -> Result<HashMap<String, U256>, WalletError> {
        Ok(self
            .node
            .erc20_list_balance(&self.erc20_list, &self.address)
            .await?)
    }

    pub async fn erc20_info(&self, contract: &Address) -> Result<Erc20Token, WalletError> {
        Ok(self.node.erc20_info(contract).await?)
    }

    fn explorer(&self) -> Result<&ExplorerClient, WalletError> {
        self.explorer
            .as_ref()
            .ok_or_else(|| ClientError::MissingEndpoint("etherscan_api_url".into()).into())
    }

    pub async fn normal_transaction_history(
        &self,
        range: HistoryRange,
    ) -> Result<Vec<NormalTransaction>, WalletError> {
        Ok(self
            .explorer()?
            .normal_transactions(&self.address, range)
            .await?)
    }

    pub async fn internal_transaction_history(
        &self,
        range: HistoryRange,
    ) -> Result<Vec<InternalTransaction>, WalletError> {
        Ok(self
            .explorer()?
            .internal_transactions(&self.address, range)
            .await?)
    }

    pub async fn erc20_token_transaction_history(
        &self,
        range: HistoryRange,
    ) -> Result<Vec<TokenTransaction>, WalletError> {
        Ok(self
            .explorer()?
            .erc20_token_transactions(&self.address, range)
            .await?)
    }

    /// ERC-20 `Transfer` events into this account emitted by `token`.
    pub async fn incoming_token_transfers(
        &self,
        token: &Erc20Token,
        from_block: u64,
    ) -> Result<Vec<ExplorerLog>, WalletError> {
        let filter = LogFilter {
            from_block,
            to_block: None,
            address: token.address,
            topics: erc20_transfer_topics(&self.address),
        };
        Ok(self.explorer()?.logs(&filter).await?)
    }

    pub async fn send_raw_transaction(&self, raw_hex: &str) -> Result<String, WalletError> {
        Ok(self.node.send_raw_transaction(raw_hex).await?)
    }

    /// Builds an unsigned transaction from this account.
    ///
    /// The nonce always comes from the node. Zero gas settings are filled
    /// in as described on [`GasSettings`].
    pub async fn create_transaction(
        &self,
        to: Option<Address>,
        value: U256,
        data: Vec<u8>,
        gas: GasSettings,
    ) -> Result<Transaction, WalletError> {
        let gas_price = if gas.gas_price.is_zero() {
            self.gas_price().await?
        } else {
            gas.gas_price
        };
        let nonce = self.nonce(BlockParam::Latest).await?;

        let mut tx = Transaction::new(nonce, gas_price, gas.gas_limit, to, value, data);
        tx.from = Some(self.address);

        if tx.gas_limit == 0 {
            tx.gas_limit = self.estimate_gas(&tx.to_transaction_request()).await?;
        }
        debug!(
            "built transaction nonce={} gas_price={} gas_limit={}",
            tx.nonce, tx.gas_price, tx.gas_limit
        );
        Ok(tx)
    }

    /// Sends `value` wei to `to` and returns the transaction hash.
    ///
    /// Fails with [`WalletError::InsufficientFunds`] when value plus the
    /// maximum fee exceeds the balance.
    pub async fn transfer_ether(
        &self,
        to: Address,
        value: U256,
        data: Vec<u8>,
        gas: GasSettings,
    ) -> Result<String, WalletError> {
        let signer = self.signer.as_ref().ok_or(WalletError::NoSigner)?;
        let balance = self.balance().await?;
        let mut tx = self.create_transaction(Some(to), value, data, gas).await?;

        let needed = transaction_cost(&tx);
        if needed > balance {
            return Err(WalletError::InsufficientFunds {
                needed,
                available: balance,
            });
        }

        self.sign_and_publish(signer, &mut tx).await
    }

    /// Sends `amount` whole tokens to `to` and returns the transaction hash.
    pub async fn transfer_erc20(
        &self,
        token: &Erc20Token,
        amount: U256,
        to: Address,
        gas: GasSettings,
    ) -> Result<String, WalletError> {
        let signer = self.signer.as_ref().ok_or(WalletError::NoSigner)?;
        let data = token.transfer_data(&to, amount)?;
        let mut tx = self
            .create_transaction(Some(token.address), U256::ZERO, data, gas)
            .await?;

        info!("transferring {amount} {} to {to}", token.symbol);
        self.sign_and_publish(signer, &mut tx).await
    }

    async fn sign_and_publish(
        &self,
        signer: &Wallet,
        tx: &mut Transaction,
    ) -> Result<String, WalletError> {
        let raw = signer.sign_transaction_to_raw(tx, self.network)?;
        self.send_raw_transaction(&raw).await
    }
}

/// `value + gas_price * gas_limit`, saturating.
fn transaction_cost(tx: &Transaction) -> U256 {
    tx.gas_price
        .saturating_mul(U256::from(tx.gas_limit))
        .saturating_add(tx.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eth_client::mock::{MockReply, MockTransport};
    use serde_json::{json, Value};

    fn recipient() -> Address {
        "0x3535353535353535353535353535353535353535".parse().unwrap()
    }

    /// A node with a fixed balance, nonce, gas price and estimate.
    fn node(balance: u64) -> NodeClient<MockTransport> {
        NodeClient::new(MockTransport::new(move |method, _| match method {
            "eth_getBalance" => MockReply::value(json!(format!("{balance:#x}"))),
            "eth_getTransactionCount" => MockReply::value(json!("0x9")),
            "eth_gasPrice" => MockReply::value(json!("0x4a817c800")),
            "eth_estimateGas" => MockReply::value(json!("0x5208")),
            "eth_sendRawTransaction" => MockReply::value(json!("0xfeed")),
            other => MockReply::error(ClientError::Rpc {
                code: -32601,
                message: format!("method {other} not found"),
            }),
        }))
    }

    fn signing_wallet(balance: u64) -> EthereumWallet<MockTransport> {
        EthereumWallet::new(node(balance), Network::Mainnet, Address::default())
            .with_signer(Wallet::from_bytes(&[0x46; 32]).unwrap())
    }

    fn sent_raw(wallet: &EthereumWallet<MockTransport>) -> Option<Value> {
        wallet
            .node()
            .transport()
            .calls()
            .into_iter()
            .find(|(method, _)| method == "eth_sendRawTransaction")
            .map(|(_, params)| params[0].clone())
    }

    #[tokio::test]
    async fn create_transaction_fills_from_node() {
        let wallet = signing_wallet(0);
        let tx = wallet
            .create_transaction(Some(recipient()), U256::from(1u64), Vec::new(), GasSettings::default())
            .await
            .unwrap();

        assert_eq!(tx.nonce, 9);
        assert_eq!(tx.gas_price, U256::from(20_000_000_000u64));
        assert_eq!(tx.gas_limit, 21_000);
        assert_eq!(tx.from, Some(wallet.address()));
        assert_eq!(wallet.node().transport().count("eth_estimateGas"), 1);
    }

    #[tokio::test]
    async fn create_transaction_keeps_explicit_gas() {
        let wallet = signing_wallet(0);
        let gas = GasSettings {
            gas_price: U256::from(7u64),
            gas_limit: 60_000,
        };
        let tx = wallet
            .create_transaction(Some(recipient()), U256::ZERO, Vec::new(), gas)
            .await
            .unwrap();

        assert_eq!(tx.gas_price, U256::from(7u64));
        assert_eq!(tx.gas_limit, 60_000);
        assert_eq!(wallet.node().transport().count("eth_gasPrice"), 0);
        assert_eq!(wallet.node().transport().count("eth_estimateGas"), 0);
        assert_eq!(wallet.node().transport().count("eth_getTransactionCount"), 1);
    }

    #[tokio::test]
    async fn transfer_ether_signs_and_broadcasts() {
        let wallet = signing_wallet(u64::MAX);
        let txid = wallet
            .transfer_ether(
                recipient(),
                U256::from(1_000_000_000_000_000_000u64),
                Vec::new(),
                GasSettings::default(),
            )
            .await
            .unwrap();

        assert_eq!(txid, "0xfeed");
        assert_eq!(
            sent_raw(&wallet),
            Some(json!("0xf86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"))
        );
    }

    #[tokio::test]
    async fn transfer_ether_rejects_cost_above_balance() {
        // 1 wei short of value + 21000 * 20 gwei
        let wallet = signing_wallet(100 + 21_000 * 20_000_000_000 - 1);
        let err = wallet
            .transfer_ether(recipient(), U256::from(100u64), Vec::new(), GasSettings::default())
            .await
            .unwrap_err();

        assert!(matches!(err, WalletError::InsufficientFunds { .. }));
        assert!(sent_raw(&wallet).is_none());
    }

    #[tokio::test]
    async fn transfer_ether_allows_exact_balance() {
        let wallet = signing_wallet(100 + 21_000 * 20_000_000_000);
        let result = wallet
            .transfer_ether(recipient(), U256::from(100u64), Vec::new(), GasSettings::default())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn watch_only_wallet_cannot_transfer() {
        let wallet = EthereumWallet::new(node(u64::MAX), Network::Mainnet, recipient());
        let err = wallet
            .transfer_ether(recipient(), U256::from(1u64), Vec::new(), GasSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::NoSigner));
        assert!(wallet.node().transport().calls().is_empty());
    }

    #[tokio::test]
    async fn transfer_erc20_calls_the_token_contract() {
        let token = Erc20Token {
            address: "0xdAC17F958D2ee523a2206206994597C13D831ec7".parse().unwrap(),
            name: "Tether USD".into(),
            symbol: "USDT".into(),
            decimals: 6,
        };
        let wallet = signing_wallet(0).with_tokens(vec![token.clone()]);

        let txid = wallet
            .transfer_erc20(wallet.find_token("USDT").unwrap(), U256::from(3u64), recipient(), GasSettings::default())
            .await
            .unwrap();
        assert_eq!(txid, "0xfeed");

        let calls = wallet.node().transport().calls();
        let (_, estimate) = calls
            .iter()
            .find(|(method, _)| method == "eth_estimateGas")
            .unwrap();
        assert_eq!(estimate[0]["to"], json!(token.address.to_string()));
        assert_eq!(estimate[0]["value"], json!("0x0"));
        assert_eq!(
            estimate[0]["data"],
            json!("0xa9059cbb000000000000000000000000353535353535353535353535353535353535353500000000000000000000000000000000000000000000000000000000002dc6c0")
        );
    }

    #[tokio::test]
    async fn histories_need_an_explorer() {
        let wallet = signing_wallet(0);
        assert!(matches!(
            wallet.normal_transaction_history(HistoryRange::default()).await,
            Err(WalletError::Client(ClientError::MissingEndpoint(_)))
        ));
    }

    #[test]
    fn find_token_by_symbol() {
        let wallet = signing_wallet(0).with_tokens(vec![Erc20Token {
            address: Address::default(),
            name: "ChainLink Token".into(),
            symbol: "LINK".into(),
            decimals: 18,
        }]);
        assert_eq!(wallet.find_token("LINK").unwrap().decimals, 18);
        assert!(matches!(
            wallet.find_token("DAI"),
            Err(WalletError::UnknownToken(s)) if s == "DAI"
        ));
    }

    #[test]
    fn explorer_urls_per_network() {
        let wallet = signing_wallet(0);
        assert_eq!(wallet.explorer_tx_url("0xabc"), "https://etherscan.io/tx/0xabc");

        let rinkeby = EthereumWallet::new(node(0), Network::Rinkeby, recipient());
        assert_eq!(
            rinkeby.explorer_tx_url("0xabc"),
            "https://rinkeby.etherscan.io/tx/0xabc"
        );
    }

    #[test]
    fn cost_saturates() {
        let mut tx = Transaction::default();
        tx.gas_price = U256::MAX;
        tx.gas_limit = 2;
        assert_eq!(transaction_cost(&tx), U256::MAX);
    }
}
