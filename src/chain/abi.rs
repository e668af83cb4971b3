//! Minimal Solidity ABI encoding
//!
//! Covers exactly the parameter kinds the HyDRAULIC registry uses:
//! `bytes32`, `uint256`, and `string`. Selectors are the first four bytes
//! of the keccak-256 of the canonical signature.

use sha3::{Digest, Keccak256};

use crate::types::{IpsphereError, Result};

const WORD: usize = 32;

/// A single ABI parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Bytes32([u8; 32]),
    Uint(u128),
    Str(String),
}

/// Four-byte function selector for a canonical signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Right-pad a short string into a `bytes32`, matching the frontend's
/// `stringToBytes` helper. Longer values are rejected rather than
/// truncated.
pub fn bytes32_from_str(s: &str) -> Result<[u8; 32]> {
    let raw = s.as_bytes();
    if raw.len() > WORD {
        return Err(IpsphereError::Validation(format!(
            "value '{}' exceeds 32 bytes and cannot encode as bytes32",
            s
        )));
    }
    let mut out = [0u8; 32];
    out[..raw.len()].copy_from_slice(raw);
    Ok(out)
}

fn encode_uint(value: u128) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[WORD - 16..].copy_from_slice(&value.to_be_bytes());
    out
}

fn encode_string_tail(s: &str) -> Vec<u8> {
    let raw = s.as_bytes();
    let mut out = Vec::with_capacity(WORD + raw.len().div_ceil(WORD) * WORD);
    out.extend_from_slice(&encode_uint(raw.len() as u128));
    out.extend_from_slice(raw);
    // Pad the data area to a word boundary
    let rem = raw.len() % WORD;
    if rem != 0 {
        out.extend(std::iter::repeat(0u8).take(WORD - rem));
    }
    out
}

/// Encode a full call: selector followed by head/tail encoded parameters
pub fn encode_call(signature: &str, params: &[AbiValue]) -> Vec<u8> {
    let head_len = params.len() * WORD;

    let mut heads = Vec::with_capacity(head_len);
    let mut tails: Vec<u8> = Vec::new();

    for param in params {
        match param {
            AbiValue::Bytes32(b) => heads.extend_from_slice(b),
            AbiValue::Uint(v) => heads.extend_from_slice(&encode_uint(*v)),
            AbiValue::Str(s) => {
                let offset = head_len + tails.len();
                heads.extend_from_slice(&encode_uint(offset as u128));
                tails.extend_from_slice(&encode_string_tail(s));
            }
        }
    }

    let mut out = Vec::with_capacity(4 + heads.len() + tails.len());
    out.extend_from_slice(&selector(signature));
    out.extend_from_slice(&heads);
    out.extend_from_slice(&tails);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes32_pads_right() {
        let encoded = bytes32_from_str("IP-1").unwrap();
        assert_eq!(&encoded[..4], b"IP-1");
        assert!(encoded[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn bytes32_rejects_long_values() {
        let long = "x".repeat(33);
        assert!(bytes32_from_str(&long).is_err());
        assert!(bytes32_from_str(&"y".repeat(32)).is_ok());
    }

    #[test]
    fn uint_is_big_endian_in_the_low_bytes() {
        let word = encode_uint(0x0102);
        assert!(word[..30].iter().all(|b| *b == 0));
        assert_eq!(word[30], 0x01);
        assert_eq!(word[31], 0x02);
    }

    #[test]
    fn static_call_is_selector_plus_words() {
        let data = encode_call(
            "tokenizeIP(bytes32)",
            &[AbiValue::Bytes32(bytes32_from_str("IP-1").unwrap())],
        );
        assert_eq!(data.len(), 4 + 32);
    }

    #[test]
    fn dynamic_string_uses_offset_and_padded_tail() {
        // setIPDetails(bytes32,string) with a 6-byte string:
        // head = bytes32 word + offset word, tail = length word + 1 padded word
        let data = encode_call(
            "setIPDetails(bytes32,string)",
            &[
                AbiValue::Bytes32(bytes32_from_str("IP-1").unwrap()),
                AbiValue::Str("Patent".to_string()),
            ],
        );
        assert_eq!(data.len(), 4 + 32 * 4);

        // Offset points past the two head words
        let offset_word = &data[4 + 32..4 + 64];
        assert_eq!(offset_word[31], 64);

        // Tail starts with the byte length
        let len_word = &data[4 + 64..4 + 96];
        assert_eq!(len_word[31], 6);
        assert_eq!(&data[4 + 96..4 + 102], b"Patent");
        assert!(data[4 + 102..].iter().all(|b| *b == 0));
    }

    #[test]
    fn word_aligned_string_gets_no_extra_padding() {
        let s = "a".repeat(32);
        let tail = encode_string_tail(&s);
        assert_eq!(tail.len(), 64);
    }

    #[test]
    fn selectors_differ_by_signature() {
        assert_ne!(selector("mintIP(bytes32)"), selector("burnIP(bytes32)"));
        assert_ne!(selector("pause()"), selector("unpause()"));
    }

    #[test]
    fn four_param_update_layout() {
        // updateIPValuationDetails(bytes32,uint256,string,uint256)
        let data = encode_call(
            "updateIPValuationDetails(bytes32,uint256,string,uint256)",
            &[
                AbiValue::Bytes32(bytes32_from_str("IP-9").unwrap()),
                AbiValue::Uint(1_000_000),
                AbiValue::Str("AA".to_string()),
                AbiValue::Uint(500_000),
            ],
        );
        // 4 head words + length word + one padded data word
        assert_eq!(data.len(), 4 + 32 * 6);
        // String offset = 4 words of head area
        let offset_word = &data[4 + 64..4 + 96];
        assert_eq!(offset_word[31], 128);
    }
}
