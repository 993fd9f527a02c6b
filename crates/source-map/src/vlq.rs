//! Base64 variable-length quantity codec used by the `mappings` field.
//!
//! Each value is zig-zagged so the sign lives in the lowest bit, then emitted
//! five bits per digit, least significant group first. Bit 5 of a digit marks
//! that more digits follow.

use thiserror::Error;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const VLQ_BASE_SHIFT: u32 = 5;
const VLQ_BASE_MASK: u64 = (1 << VLQ_BASE_SHIFT) - 1;
const VLQ_CONTINUATION_BIT: u64 = 1 << VLQ_BASE_SHIFT;

/// An error raised while decoding a VLQ value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VlqError {
    /// A byte outside the base64 alphabet.
    #[error("invalid base64 VLQ digit {found:?} at offset {position}")]
    InvalidDigit {
        /// Offset of the offending byte.
        position: usize,
        /// The offending character.
        found: char,
    },

    /// The input ended while a continuation bit was set.
    #[error("unterminated VLQ value at offset {position}")]
    UnexpectedEnd {
        /// Offset where more input was expected.
        position: usize,
    },

    /// The value does not fit into 64 bits.
    #[error("VLQ value starting at offset {position} overflows")]
    Overflow {
        /// Offset where the value starts.
        position: usize,
    },
}

/// Appends the VLQ digits of `value` to `out`.
pub fn encode(value: i64, out: &mut String) {
    let mut vlq = if value < 0 {
        (value.unsigned_abs() << 1) | 1
    } else {
        (value as u64) << 1
    };

    loop {
        let mut digit = vlq & VLQ_BASE_MASK;
        vlq >>= VLQ_BASE_SHIFT;
        if vlq > 0 {
            digit |= VLQ_CONTINUATION_BIT;
        }
        out.push(ALPHABET[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Encodes a single value into a fresh string.
pub fn encode_to_string(value: i64) -> String {
    let mut out = String::new();
    encode(value, &mut out);
    out
}

/// Decodes one value starting at `*cursor` and advances the cursor past it.
pub fn decode(text: &[u8], cursor: &mut usize) -> Result<i64, VlqError> {
    let start = *cursor;
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let Some(&byte) = text.get(*cursor) else {
            return Err(VlqError::UnexpectedEnd { position: *cursor });
        };
        let digit = digit_value(byte).ok_or(VlqError::InvalidDigit {
            position: *cursor,
            found: byte as char,
        })?;
        *cursor += 1;

        if shift >= 64 {
            return Err(VlqError::Overflow { position: start });
        }
        let payload = digit & VLQ_BASE_MASK;
        // Bits pushed out of a u64 would be lost silently.
        if shift > 0 && payload >> (64 - shift) != 0 {
            return Err(VlqError::Overflow { position: start });
        }
        result |= payload << shift;

        if digit & VLQ_CONTINUATION_BIT == 0 {
            break;
        }
        shift += VLQ_BASE_SHIFT;
    }

    let magnitude = (result >> 1) as i64;
    Ok(if result & 1 == 1 { -magnitude } else { magnitude })
}

fn digit_value(byte: u8) -> Option<u64> {
    let value = match byte {
        b'A'..=b'Z' => byte - b'A',
        b'a'..=b'z' => byte - b'a' + 26,
        b'0'..=b'9' => byte - b'0' + 52,
        b'+' => 62,
        b'/' => 63,
        _ => return None,
    };
    Some(value as u64)
}
