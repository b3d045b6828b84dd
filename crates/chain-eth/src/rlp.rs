//! Recursive-length-prefix encoding for flat lists of byte strings.
//!
//! Only the encoding direction is needed: transactions are serialized for
//! hashing and broadcast, never parsed back.

/// Header offsets for one RLP item kind.
#[derive(Debug, Clone, Copy)]
struct Offset {
    short: u8,
    long: u8,
}

const STRING_OFFSET: Offset = Offset {
    short: 0x80,
    long: 0xb7,
};

const LIST_OFFSET: Offset = Offset {
    short: 0xc0,
    long: 0xf7,
};

/// Payloads shorter than this use the single-byte short header.
const SHORT_LIMIT: usize = 56;

/// Encodes a list of byte strings.
///
/// Every element is encoded as a string, the results are concatenated, and the
/// concatenation is wrapped with the list header. The wrap reuses the string
/// algorithm, so a concatenation that is one byte `<= 0x7f` is emitted bare.
pub fn encode_list<T: AsRef<[u8]>>(items: &[T]) -> Vec<u8> {
    let mut payload = Vec::new();
    for item in items {
        encode_item(item.as_ref(), STRING_OFFSET, &mut payload);
    }

    let mut out = Vec::with_capacity(payload.len() + 9);
    encode_item(&payload, LIST_OFFSET, &mut out);
    out
}

/// Encodes a single byte string.
pub fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 9);
    encode_item(bytes, STRING_OFFSET, &mut out);
    out
}

fn encode_item(bytes: &[u8], offset: Offset, out: &mut Vec<u8>) {
    if bytes.len() == 1 && bytes[0] <= 0x7f {
        out.push(bytes[0]);
        return;
    }
    encode_header(bytes.len(), offset, out);
    out.extend_from_slice(bytes);
}

fn encode_header(len: usize, offset: Offset, out: &mut Vec<u8>) {
    if len < SHORT_LIMIT {
        out.push(offset.short + len as u8);
        return;
    }

    let len_bytes = (len as u64).to_be_bytes();
    let start = len_bytes.iter().position(|&b| b != 0).unwrap_or(7);
    let width = &len_bytes[start..];

    out.push(offset.long + width.len() as u8);
    out.extend_from_slice(width);
}
