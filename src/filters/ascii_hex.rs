//! ASCIIHexDecode implementation.
//!
//! Whitespace is ignored, `>` ends the data, and an odd final digit is
//! padded with an implicit '0'.

use crate::error::{Error, Result};
use crate::filters::{StreamFilter, ASCII_HEX_DECODE};

/// ASCIIHexDecode filter.
pub struct AsciiHexFilter;

impl StreamFilter for AsciiHexFilter {
    fn name(&self) -> &'static str {
        ASCII_HEX_DECODE
    }

    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len() / 2);
        let mut digits = input
            .iter()
            .copied()
            .take_while(|&c| c != b'>')
            .filter(|c| !c.is_ascii_whitespace());

        while let Some(high) = digits.next() {
            let low = digits.next().unwrap_or(b'0');
            output.push((hex_value(high)? << 4) | hex_value(low)?);
        }
        Ok(output)
    }

    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len() * 2 + 1);
        for byte in input {
            output.extend_from_slice(format!("{:02X}", byte).as_bytes());
        }
        output.push(b'>');
        Ok(output)
    }
}

fn hex_value(digit: u8) -> Result<u8> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        _ => Err(Error::Decode(format!(
            "ASCIIHexDecode: invalid hex digit '{}'",
            digit as char
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode() {
        assert_eq!(AsciiHexFilter.decode(b"48 65 6C\n6C 6F>").unwrap(), b"Hello");
    }

    #[test]
    fn test_odd_length_is_padded() {
        assert_eq!(AsciiHexFilter.decode(b"486").unwrap(), vec![0x48, 0x60]);
    }

    #[test]
    fn test_invalid_digit() {
        assert!(AsciiHexFilter.decode(b"4G").is_err());
    }

    #[test]
    fn test_encode() {
        assert_eq!(AsciiHexFilter.encode(&[0x00, 0xFF]).unwrap(), b"00FF>");
    }
}
