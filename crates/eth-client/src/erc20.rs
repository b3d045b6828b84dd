use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use alloy_primitives::U256;
use chain_eth::abi::decode_single;
use chain_eth::erc20::{self, encode_balance_of, encode_no_args, wei_to_token, Erc20Token};
use chain_eth::hexnum::hex_to_big_int;
use chain_eth::{Address, EthError};
use log::debug;

use crate::error::ClientError;
use crate::fanout::try_join_all;
use crate::node::NodeClient;
use crate::transport::Transport;

/// One metadata lookup result for [`NodeClient::erc20_info`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenField {
    Name(String),
    Symbol(String),
    Decimals(u8),
}

type FieldTask = Pin<Box<dyn Future<Output = Result<TokenField, ClientError>> + Send>>;

impl<T: Transport + 'static> NodeClient<T> {
    /// Raw `balanceOf(owner)` in base units.
    pub async fn erc20_balance(
        &self,
        token: &Erc20Token,
        owner: &Address,
    ) -> Result<U256, ClientError> {
        let ret = self.call_contract(&token.address, &encode_balance_of(owner)).await?;
        Ok(hex_to_big_int(&ret)?)
    }

    /// Balances of every token, in whole tokens, keyed by symbol.
    ///
    /// One remote call per token, all in flight at once. Any failure fails
    /// the whole query.
    pub async fn erc20_list_balance(
        &self,
        tokens: &[Erc20Token],
        owner: &Address,
    ) -> Result<HashMap<String, U256>, ClientError> {
        debug!("querying {} token balances for {owner}", tokens.len());

        let tasks: Vec<_> = tokens
            .iter()
            .cloned()
            .map(|token| {
                let client = self.clone();
                let owner = *owner;
                async move {
                    let wei = client.erc20_balance(&token, &owner).await?;
                    Ok::<_, ClientError>((token.symbol, wei_to_token(wei, token.decimals)))
                }
            })
            .collect();

        Ok(try_join_all(tasks).await?.into_iter().collect())
    }

    /// Fetches `name`, `symbol` and `decimals` concurrently.
    pub async fn erc20_info(&self, contract: &Address) -> Result<Erc20Token, ClientError> {
        let tasks: Vec<FieldTask> = vec![
            Box::pin(self.clone().string_field(*contract, &erc20::NAME, TokenField::Name)),
            Box::pin(self.clone().string_field(*contract, &erc20::SYMBOL, TokenField::Symbol)),
            Box::pin(self.clone().decimals_field(*contract)),
        ];

        let mut token = Erc20Token {
            address: *contract,
            name: String::new(),
            symbol: String::new(),
            decimals: 0,
        };

        for field in try_join_all(tasks).await? {
            match field {
                TokenField::Name(name) => token.name = name,
                TokenField::Symbol(symbol) => token.symbol = symbol,
                TokenField::Decimals(decimals) => token.decimals = decimals,
            }
        }

        Ok(token)
    }

    async fn string_field(
        self,
        contract: Address,
        method: &'static erc20::Method,
        wrap: fn(String) -> TokenField,
    ) -> Result<TokenField, ClientError> {
        let ret = self.call_contract(&contract, &encode_no_args(method)).await?;
        let value = decode_single(&ret, "string")?.into_string()?;
        Ok(wrap(value))
    }

    async fn decimals_field(self, contract: Address) -> Result<TokenField, ClientError> {
        let ret = self
            .call_contract(&contract, &encode_no_args(&erc20::DECIMALS))
            .await?;
        let decimals = decode_single(&ret, "uint8")?.into_uint()?;
        let decimals = u8::try_from(decimals)
            .map_err(|_| EthError::DecodeError(format!("decimals {decimals} out of range")))?;
        Ok(TokenField::Decimals(decimals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockReply, MockTransport};
    use chain_eth::hexnum::{bytes_to_hex, pad_left_zeros};
    use serde_json::{json, Value};
    use std::time::Duration;

    fn token(symbol: &str, last_byte: u8, decimals: u8) -> Erc20Token {
        let mut addr = [0u8; 20];
        addr[19] = last_byte;
        Erc20Token {
            address: Address(addr),
            name: format!("{symbol} token"),
            symbol: symbol.into(),
            decimals,
        }
    }

    fn owner() -> Address {
        "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf".parse().unwrap()
    }

    fn uint_word(value: u128) -> Value {
        json!(bytes_to_hex(&pad_left_zeros(&value.to_be_bytes(), 32)))
    }

    fn string_word(s: &str) -> Value {
        let mut data = pad_left_zeros(&[0x20], 32);
        data.extend_from_slice(&pad_left_zeros(&[s.len() as u8], 32));
        let mut body = s.as_bytes().to_vec();
        body.resize(32, 0);
        data.extend_from_slice(&body);
        json!(bytes_to_hex(&data))
    }

    /// Contract address of an `eth_call`.
    fn call_target(params: &[Value]) -> Address {
        params[0]["to"].as_str().unwrap().parse().unwrap()
    }

    /// Calldata selector of an `eth_call`.
    fn call_selector(params: &[Value]) -> String {
        params[0]["data"].as_str().unwrap()[..10].to_string()
    }

    #[tokio::test]
    async fn three_tokens_give_three_entries() {
        let tokens = vec![token("AAA", 1, 18), token("BBB", 2, 6), token("CCC", 3, 0)];
        let client = NodeClient::new(MockTransport::new(|_, params| {
            match call_target(params).0[19] {
                1 => MockReply::value(uint_word(5_000_000_000_000_000_000)),
                2 => MockReply::delayed(Duration::from_millis(20), MockReply::value(uint_word(2_500_000))),
                _ => MockReply::value(uint_word(7)),
            }
        }));

        let balances = client.erc20_list_balance(&tokens, &owner()).await.unwrap();

        assert_eq!(balances.len(), 3);
        assert_eq!(balances["AAA"], U256::from(5u64));
        assert_eq!(balances["BBB"], U256::from(2u64));
        assert_eq!(balances["CCC"], U256::from(7u64));
        assert_eq!(client.transport().count("eth_call"), 3);
    }

    #[tokio::test]
    async fn one_failing_token_fails_the_whole_query() {
        let tokens = vec![token("AAA", 1, 18), token("BBB", 2, 6), token("CCC", 3, 0)];
        let client = NodeClient::new(MockTransport::new(|_, params| {
            if call_target(params).0[19] == 2 {
                MockReply::error(ClientError::Rpc {
                    code: -32000,
                    message: "execution reverted".into(),
                })
            } else {
                MockReply::value(uint_word(1))
            }
        }));

        let result = client.erc20_list_balance(&tokens, &owner()).await;
        match result {
            Err(ClientError::Rpc { message, .. }) => assert_eq!(message, "execution reverted"),
            other => panic!("expected rpc error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failure_does_not_wait_for_slow_tokens() {
        let tokens = vec![token("SLOW", 1, 18), token("BAD", 2, 18)];
        let client = NodeClient::new(MockTransport::new(|_, params| {
            if call_target(params).0[19] == 1 {
                MockReply::Pending
            } else {
                MockReply::error(ClientError::InvalidResponse("garbage".into()))
            }
        }));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            client.erc20_list_balance(&tokens, &owner()),
        )
        .await
        .expect("aggregation hung on a pending worker");
        assert!(matches!(result, Err(ClientError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn empty_token_list_makes_no_calls() {
        let client = NodeClient::new(MockTransport::new(|_, _| MockReply::Pending));
        let balances = client.erc20_list_balance(&[], &owner()).await.unwrap();
        assert!(balances.is_empty());
        assert!(client.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn info_fills_every_field() {
        let contract = token("X", 9, 0).address;
        let client = NodeClient::new(MockTransport::new(|_, params| {
            match call_selector(params).as_str() {
                "0x06fdde03" => MockReply::value(string_word("Tether USD")),
                "0x95d89b41" => MockReply::delayed(Duration::from_millis(10), MockReply::value(string_word("USDT"))),
                "0x313ce567" => MockReply::value(uint_word(6)),
                other => panic!("unexpected selector {other}"),
            }
        }));

        let info = client.erc20_info(&contract).await.unwrap();
        assert_eq!(
            info,
            Erc20Token {
                address: contract,
                name: "Tether USD".into(),
                symbol: "USDT".into(),
                decimals: 6,
            }
        );
    }

    #[tokio::test]
    async fn info_fails_when_any_lookup_fails() {
        let contract = token("X", 9, 0).address;
        let client = NodeClient::new(MockTransport::new(|_, params| {
            match call_selector(params).as_str() {
                "0x95d89b41" => MockReply::value(json!("0x")),
                "0x06fdde03" => MockReply::value(string_word("Tether USD")),
                _ => MockReply::value(uint_word(6)),
            }
        }));

        assert!(matches!(
            client.erc20_info(&contract).await,
            Err(ClientError::Chain(EthError::DecodeError(_)))
        ));
    }

    #[tokio::test]
    async fn decimals_out_of_range_is_rejected() {
        let contract = token("X", 9, 0).address;
        let client = NodeClient::new(MockTransport::new(|_, params| {
            match call_selector(params).as_str() {
                "0x313ce567" => MockReply::value(uint_word(300)),
                _ => MockReply::value(string_word("X")),
            }
        }));
        assert!(client.erc20_info(&contract).await.is_err());
    }
}
