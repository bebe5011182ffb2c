//! Low-level ABI word extraction shared by every `parse_*` function.
//!
//! Mirrors the original's offset arithmetic: topics are 32-byte words (64 hex
//! chars after the `0x`), and `data` is a flat sequence of 32-byte words.

use crate::error::DecodeError;

/// Strips a leading `0x`/`0X` if present.
fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

/// Extracts the lower 20 bytes (last 40 hex chars) of a 32-byte topic as a
/// lowercase `0x`-prefixed address.
#[must_use]
pub fn address_from_topic(topic: &str) -> String {
    let hex = strip_0x(topic);
    let tail = if hex.len() >= 40 { &hex[hex.len() - 40..] } else { hex };
    format!("0x{}", tail.to_ascii_lowercase())
}

/// Reads the `index`-th 32-byte word of `data` as a `0x`-prefixed 32-byte
/// hex string (used for `bytes32` fields such as condition/question ids).
///
/// # Errors
/// Returns `DataLength` if `data` does not have a word at `index`.
pub fn bytes32_word(event: &'static str, data: &str, index: usize) -> Result<String, DecodeError> {
    let word = nth_word(event, data, index)?;
    Ok(format!("0x{word}"))
}

/// Reads the `index`-th 32-byte word of `data` as a `uint256`, truncated to
/// `i64` (accounting amounts in this protocol never approach `i64::MAX`).
///
/// # Errors
/// Returns `DataLength` if `data` does not have a word at `index`, or
/// `DataLength` if the word does not fit in 16 hex chars worth of `u64`
/// (the low 8 bytes are taken; higher bytes must be zero).
pub fn uint256_word(event: &'static str, data: &str, index: usize) -> Result<i64, DecodeError> {
    let word = nth_word(event, data, index)?;
    let low16 = &word[48..64];
    let high = &word[0..48];
    if high.bytes().any(|b| b != b'0') {
        return Err(DecodeError::DataLength {
            event,
            detail: format!("word {index} exceeds i64 range"),
        });
    }
    i64::from_str_radix(low16, 16).map_err(|e| DecodeError::DataLength {
        event,
        detail: format!("word {index} not valid hex: {e}"),
    })
}

/// Reads a dynamic `uint256[]` or `bytes` field whose head word at
/// `head_index` is a byte offset into `data`. Returns the raw words that
/// make up the array (length-prefixed per Solidity ABI encoding).
///
/// # Errors
/// Returns `DataLength` if the offset or length point outside `data`.
pub fn dynamic_array(event: &'static str, data: &str, head_index: usize) -> Result<Vec<String>, DecodeError> {
    let offset_bytes = uint256_word(event, data, head_index)?;
    let offset_word = usize::try_from(offset_bytes).map_err(|_| DecodeError::DataLength {
        event,
        detail: "negative dynamic offset".into(),
    })? / 32;

    let length = uint256_word(event, data, offset_word)?;
    let length = usize::try_from(length).map_err(|_| DecodeError::DataLength {
        event,
        detail: "negative dynamic length".into(),
    })?;

    (0..length).map(|i| nth_word(event, data, offset_word + 1 + i)).collect()
}

/// Reads a dynamic `bytes` field and returns its raw byte content (not
/// word-padded), following the same offset/length header as
/// [`dynamic_array`] but measuring `length` in bytes rather than words.
///
/// # Errors
/// Returns `DataLength` if the offset, length, or trailing bytes run past
/// the end of `data`.
pub fn dynamic_bytes(event: &'static str, data: &str, head_index: usize) -> Result<Vec<u8>, DecodeError> {
    let offset_bytes = uint256_word(event, data, head_index)?;
    let offset_word = usize::try_from(offset_bytes).map_err(|_| DecodeError::DataLength {
        event,
        detail: "negative dynamic offset".into(),
    })? / 32;

    let length = uint256_word(event, data, offset_word)?;
    let length = usize::try_from(length).map_err(|_| DecodeError::DataLength {
        event,
        detail: "negative dynamic length".into(),
    })?;

    let hex = strip_0x(data);
    let start = (offset_word + 1) * 64;
    let end = start + length * 2;
    let slice = hex.get(start..end).ok_or_else(|| DecodeError::DataLength {
        event,
        detail: format!("dynamic bytes [{start}..{end}) out of range"),
    })?;
    hex::decode(slice).map_err(|e| DecodeError::DataLength { event, detail: e.to_string() })
}

/// Returns the `index`-th 64-char hex word of `data`, without the `0x`.
fn nth_word(event: &'static str, data: &str, index: usize) -> Result<String, DecodeError> {
    let hex = strip_0x(data);
    let start = index * 64;
    let end = start + 64;
    hex.get(start..end)
        .map(str::to_owned)
        .ok_or_else(|| DecodeError::DataLength { event, detail: format!("word {index} out of range") })
}

/// Address comparison matching the original's "NULL address" check for
/// mint/burn legs of a transfer.
#[must_use]
pub fn is_zero_address(address: &str) -> bool {
    strip_0x(address).chars().all(|c| c == '0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_from_topic_takes_last_40_chars() {
        let topic = "0x000000000000000000000000aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        assert_eq!(address_from_topic(topic), "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    }

    #[test]
    fn uint256_word_reads_low_bytes() {
        let data = format!("0x{}", "0".repeat(56) + "000003e8"); // 1000
        assert_eq!(uint256_word("Test", &data, 0).unwrap(), 1000);
    }

    #[test]
    fn uint256_word_rejects_overflow() {
        let data = format!("0x{}", "1".repeat(64));
        assert!(uint256_word("Test", &data, 0).is_err());
    }

    #[test]
    fn dynamic_array_reads_length_prefixed_words() {
        // word 0 (head): offset = 0x20 = 32 bytes = word 1.
        // word 1: length = 2. words 2,3: the two elements.
        let mut data = String::from("0x");
        data.push_str(&"0".repeat(62));
        data.push_str("20");
        data.push_str(&"0".repeat(63));
        data.push('2');
        data.push_str(&"0".repeat(63));
        data.push('5');
        data.push_str(&"0".repeat(63));
        data.push('7');
        let words = dynamic_array("Test", &data, 0).unwrap();
        assert_eq!(words.len(), 2);
        assert!(words[0].ends_with('5'));
        assert!(words[1].ends_with('7'));
    }

    #[test]
    fn is_zero_address_detects_mint_burn_leg() {
        assert!(is_zero_address("0x0000000000000000000000000000000000000000"));
        assert!(!is_zero_address("0x000000000000000000000000000000000000dead"));
    }
}
