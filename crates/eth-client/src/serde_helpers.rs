//! Deserializers for numbers carried as strings.
//!
//! Nodes send `0x` quantities; the explorer sends base-10 strings.

use alloy_primitives::U256;
use chain_eth::hexnum::{hex_to_big_int, hex_to_u64};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

pub fn hex_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let s = String::deserialize(deserializer)?;
    hex_to_u64(&s).map_err(D::Error::custom)
}

pub fn hex_u64_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(s) => hex_to_u64(&s).map(Some).map_err(D::Error::custom),
        None => Ok(None),
    }
}

pub fn hex_u256<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    let s = String::deserialize(deserializer)?;
    hex_to_big_int(&s).map_err(D::Error::custom)
}

/// Base-10 string; the empty string is zero.
pub fn dec_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        return Ok(0);
    }
    s.parse().map_err(D::Error::custom)
}

/// Base-10 string; the empty string is zero.
pub fn dec_u256<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(&s, 10).map_err(D::Error::custom)
}

/// `"0"` / `"1"` flag.
pub fn dec_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(dec_u64(deserializer)? != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "hex_u64")]
        gas: u64,
        #[serde(deserialize_with = "hex_u64_opt")]
        block: Option<u64>,
        #[serde(deserialize_with = "hex_u256")]
        value: U256,
        #[serde(deserialize_with = "dec_u64")]
        nonce: u64,
        #[serde(deserialize_with = "dec_u256")]
        amount: U256,
        #[serde(deserialize_with = "dec_flag")]
        is_error: bool,
    }

    #[test]
    fn parses_mixed_encodings() {
        let sample: Sample = serde_json::from_str(
            r#"{"gas":"0x5208","block":null,"value":"0xde0b6b3a7640000","nonce":"12",
                "amount":"1000000000000000000000","is_error":"1"}"#,
        )
        .unwrap();

        assert_eq!(sample.gas, 21_000);
        assert_eq!(sample.block, None);
        assert_eq!(sample.value, U256::from(1_000_000_000_000_000_000u64));
        assert_eq!(sample.nonce, 12);
        assert_eq!(sample.amount, U256::from(1_000_000_000_000_000_000_000u128));
        assert!(sample.is_error);
    }

    #[test]
    fn rejects_garbage() {
        let result: Result<Sample, _> = serde_json::from_str(
            r#"{"gas":"0xzz","block":null,"value":"0x0","nonce":"0","amount":"0","is_error":"0"}"#,
        );
        assert!(result.is_err());

        let result: Result<Sample, _> = serde_json::from_str(
            r#"{"gas":"0x0","block":"0x1","value":"0x0","nonce":"-1","amount":"0","is_error":"0"}"#,
        );
        assert!(result.is_err());
    }
}
