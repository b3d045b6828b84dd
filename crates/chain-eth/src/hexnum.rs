//! Conversions between big integers, byte arrays and the `0x`-prefixed hex
//! strings used on the JSON-RPC wire.
//!
//! Two empty-value conventions coexist and are both load-bearing:
//! byte arrays render an empty input as `""` (field omitted), while integers
//! render zero as `"0x0"` (explicit numeric zero).

use alloy_primitives::U256;

use crate::error::EthError;

/// Hex-encodes `bytes` with a `0x` prefix. Empty input yields `""`.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }
    format!("0x{}", hex::encode(bytes))
}

/// Decodes a hex string with an optional `0x` prefix.
///
/// An odd number of digits is tolerated by left-padding one zero nibble
/// (`"0xabc"` decodes as `0x0abc`). Non-hex digits are rejected.
pub fn hex_to_bytes(hex_str: &str) -> Result<Vec<u8>, EthError> {
    let digits = strip_hex_prefix(hex_str);
    if digits.is_empty() {
        return Ok(Vec::new());
    }

    let decoded = if digits.len() % 2 == 1 {
        hex::decode(format!("0{digits}"))
    } else {
        hex::decode(digits)
    };

    decoded.map_err(|e| EthError::EncodingError(format!("invalid hex {hex_str:?}: {e}")))
}

/// Decodes a big-endian unsigned integer. The empty string maps to zero.
pub fn hex_to_big_int(hex_str: &str) -> Result<U256, EthError> {
    let bytes = hex_to_bytes(hex_str)?;
    let significant = trim_leading_zeros(&bytes);

    U256::try_from_be_slice(significant).ok_or_else(|| {
        EthError::EncodingError(format!(
            "integer {hex_str:?} does not fit in 256 bits ({} bytes)",
            significant.len()
        ))
    })
}

/// Decodes a big-endian `u64`. Both `""` and `"0x"` map to zero.
pub fn hex_to_u64(hex_str: &str) -> Result<u64, EthError> {
    if hex_str.is_empty() || hex_str == "0x" {
        return Ok(0);
    }

    let bytes = hex_to_bytes(hex_str)?;
    let significant = trim_leading_zeros(&bytes);
    if significant.len() > 8 {
        return Err(EthError::EncodingError(format!(
            "integer {hex_str:?} does not fit in 64 bits"
        )));
    }

    let padded = pad_left_zeros(significant, 8);
    let mut word = [0u8; 8];
    word.copy_from_slice(&padded);
    Ok(u64::from_be_bytes(word))
}

/// Renders an integer in quantity form: zero is `"0x0"`, otherwise the
/// minimal big-endian encoding with no leading zero nibble.
pub fn big_int_to_hex(value: &U256) -> String {
    if value.is_zero() {
        return "0x0".to_string();
    }
    quantity_hex(&big_int_to_minimal_bytes(value))
}

/// Renders a `u64` in quantity form, following [`big_int_to_hex`].
pub fn u64_to_hex(value: u64) -> String {
    if value == 0 {
        return "0x0".to_string();
    }
    quantity_hex(&u64_to_minimal_bytes(value))
}

/// Encodes `value` with the fewest big-endian bytes that represent it (1–8).
///
/// Zero is the single byte `0x00`; integer RLP fields go through
/// [`trim_leading_zeros`] to turn that into the empty string.
pub fn u64_to_minimal_bytes(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    bytes[start..].to_vec()
}

/// Minimal big-endian bytes of a big integer. Zero is the empty vector.
pub fn big_int_to_minimal_bytes(value: &U256) -> Vec<u8> {
    let bytes = value.to_be_bytes::<32>();
    trim_leading_zeros(&bytes).to_vec()
}

/// Left-pads `bytes` with zeros to exactly `width` bytes. Inputs already at or
/// beyond `width` are returned unchanged.
pub fn pad_left_zeros(bytes: &[u8], width: usize) -> Vec<u8> {
    if bytes.len() >= width {
        return bytes.to_vec();
    }
    let mut padded = vec![0u8; width - bytes.len()];
    padded.extend_from_slice(bytes);
    padded
}

/// Strips leading zero bytes. An all-zero input yields an empty slice.
pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Returns true if `input` (optionally `0x`-prefixed) is an even-length
/// sequence of hex digits.
pub fn is_hex(input: &str) -> bool {
    hex::decode(strip_hex_prefix(input)).is_ok()
}

fn strip_hex_prefix(input: &str) -> &str {
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input)
}

fn quantity_hex(minimal: &[u8]) -> String {
    let encoded = hex::encode(minimal);
    let digits = encoded.strip_prefix('0').unwrap_or(&encoded);
    format!("0x{digits}")
}
