//! LZWDecode implementation.
//!
//! PDF's LZW uses MSB-first codes starting at 9 bits and switches code size
//! one code early (`/EarlyChange 1`, the default), which is the TIFF variant.

use crate::error::{Error, Result};
use crate::filters::{StreamFilter, LZW_DECODE};
use weezl::{decode::Decoder, encode::Encoder, BitOrder};

/// LZWDecode filter.
pub struct LzwFilter;

impl StreamFilter for LzwFilter {
    fn name(&self) -> &'static str {
        LZW_DECODE
    }

    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
            .decode(input)
            .map_err(|e| Error::Decode(format!("LZWDecode: {:?}", e)))
    }

    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        Encoder::with_tiff_size_switch(BitOrder::Msb, 8)
            .encode(input)
            .map_err(|e| Error::Decode(format!("LZW encode: {:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let data = b"TOBEORNOTTOBEORTOBEORNOT".repeat(20);
        let encoded = LzwFilter.encode(&data).unwrap();
        assert!(encoded.len() < data.len());
        assert_eq!(LzwFilter.decode(&encoded).unwrap(), data);
    }

    #[test]
    fn test_known_stream() {
        // Example from ISO 32000-1 Section 7.4.4.2: "-----A---B"
        let encoded = [0x80, 0x0B, 0x60, 0x50, 0x22, 0x0C, 0x0C, 0x85, 0x01];
        assert_eq!(LzwFilter.decode(&encoded).unwrap(), b"-----A---B");
    }
}
