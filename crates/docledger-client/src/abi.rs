//! Minimal Solidity ABI encoding for the document registry contract.
//!
//! ```solidity
//! function storeDocument(string ownerId, string hash) external;
//! function verifyDocument(string hash) external view returns (bool);
//! ```
//!
//! Only dynamic `string` arguments and a single `bool` return are needed, so
//! the encoder is hand-written rather than pulling in a full ABI crate.

/// keccak256("storeDocument(string,string)")[..4]
pub const STORE_DOCUMENT_SELECTOR: &str = "f9c71f87";

/// keccak256("verifyDocument(string)")[..4]
pub const VERIFY_DOCUMENT_SELECTOR: &str = "beee5eb7";

const WORD: usize = 32;

/// Calldata for `storeDocument(owner_id, hash)`.
pub fn encode_store_document(owner_id: &str, hash: &str) -> String {
    let first = encode_string(owner_id);
    let second_offset = 2 * WORD + first.len();
    let mut out = Vec::with_capacity(2 * WORD + first.len() + padded_len(hash.len()) + WORD);
    out.extend_from_slice(&uint_word(2 * WORD as u64));
    out.extend_from_slice(&uint_word(second_offset as u64));
    out.extend_from_slice(&first);
    out.extend_from_slice(&encode_string(hash));
    format!("0x{STORE_DOCUMENT_SELECTOR}{}", to_hex(&out))
}

/// Calldata for `verifyDocument(hash)`.
pub fn encode_verify_document(hash: &str) -> String {
    let mut out = uint_word(WORD as u64).to_vec();
    out.extend_from_slice(&encode_string(hash));
    format!("0x{VERIFY_DOCUMENT_SELECTOR}{}", to_hex(&out))
}

/// Decode an ABI `bool` return value.
///
/// Returns `None` unless the payload is exactly one 32-byte word holding 0 or 1.
pub fn decode_bool(result: &str) -> Option<bool> {
    let hex = result.strip_prefix("0x").unwrap_or(result);
    if hex.len() != 2 * WORD || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let (high, last) = hex.split_at(2 * WORD - 2);
    if high.chars().any(|c| c != '0') {
        return None;
    }
    match last {
        "00" => Some(false),
        "01" => Some(true),
        _ => None,
    }
}

/// Parse a JSON-RPC hex quantity such as `"0x1a"`.
pub fn parse_quantity(value: &str) -> Option<u64> {
    let digits = value.strip_prefix("0x")?;
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Render a JSON-RPC hex quantity (no leading zeros).
pub fn to_quantity(value: u64) -> String {
    format!("0x{value:x}")
}

/// Validate that a string is a well-formed Ethereum address (0x + 40 hex chars).
pub fn is_valid_eth_address(addr: &str) -> bool {
    addr.len() == 42
        && addr.starts_with("0x")
        && addr[2..].chars().all(|c| c.is_ascii_hexdigit())
}

fn encode_string(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = uint_word(bytes.len() as u64).to_vec();
    out.extend_from_slice(bytes);
    out.resize(WORD + padded_len(bytes.len()), 0);
    out
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

fn uint_word(value: u64) -> [u8; WORD] {
    let mut w = [0u8; WORD];
    w[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    w
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
