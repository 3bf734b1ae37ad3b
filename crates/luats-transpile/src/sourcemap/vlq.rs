//! Base64 VLQ, the number encoding of the `mappings` field.
//!
//! Each value is split into 5-bit groups, least significant first; the sign
//! is stored in the lowest bit of the first group and bit 6 of every digit
//! marks a continuation.

use thiserror::Error;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const SHIFT: u32 = 5;
const CONTINUATION: u64 = 1 << SHIFT;
const MASK: u64 = CONTINUATION - 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VlqError {
    #[error("invalid base64 digit at offset {0}")]
    InvalidDigit(usize),
    #[error("VLQ value ends without a final digit")]
    Unterminated,
    #[error("VLQ value does not fit in 64 bits")]
    Overflow,
}

pub fn encode(value: i64) -> String {
    let mut out = String::new();
    encode_into(value, &mut out);
    out
}

/// Appends the encoding of `value` to `out`.
pub fn encode_into(value: i64, out: &mut String) {
    let mut vlq = if value < 0 {
        (value.unsigned_abs() << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = vlq & MASK;
        vlq >>= SHIFT;
        if vlq > 0 {
            digit |= CONTINUATION;
        }
        out.push(char::from(ALPHABET[digit as usize]));
        if vlq == 0 {
            break;
        }
    }
}

/// Decodes one value from the start of `input`, returning it with the
/// number of bytes consumed.
pub fn decode(input: &str) -> Result<(i64, usize), VlqError> {
    let mut accumulated: u64 = 0;
    let mut shift = 0;
    for (offset, byte) in input.bytes().enumerate() {
        let digit = digit_value(byte).ok_or(VlqError::InvalidDigit(offset))?;
        if shift > 60 {
            return Err(VlqError::Overflow);
        }
        accumulated |= (digit & MASK) << shift;
        if digit & CONTINUATION == 0 {
            let magnitude = (accumulated >> 1) as i64;
            let value = if accumulated & 1 == 1 {
                -magnitude
            } else {
                magnitude
            };
            return Ok((value, offset + 1));
        }
        shift += SHIFT;
    }
    Err(VlqError::Unterminated)
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
    Some(u64::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_positive() {
        assert_eq!(encode(0), "A");
        assert_eq!(encode(1), "C");
        assert_eq!(encode(15), "e");
        assert_eq!(encode(16), "gB");
    }

    #[test]
    fn test_encode_negative() {
        assert_eq!(encode(-1), "D");
        assert_eq!(encode(-15), "f");
    }

    #[test]
    fn test_decode_reports_consumed_bytes() {
        assert_eq!(decode("gBAAC"), Ok((16, 2)));
        assert_eq!(decode("D"), Ok((-1, 1)));
        for value in [-1000, -16, 0, 31, 32, 123_456] {
            let encoded = encode(value);
            assert_eq!(decode(&encoded), Ok((value, encoded.len())), "{value}");
        }
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode("g"), Err(VlqError::Unterminated));
        assert_eq!(decode("A*"), Ok((0, 1)));
        assert_eq!(decode("*"), Err(VlqError::InvalidDigit(0)));
        assert_eq!(decode("gggggggggggggggB"), Err(VlqError::Overflow));
        assert_eq!(decode(""), Err(VlqError::Unterminated));
    }
}
