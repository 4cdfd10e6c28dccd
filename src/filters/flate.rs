//! FlateDecode (zlib/deflate) implementation.

use crate::error::{Error, Result};
use crate::filters::{StreamFilter, FLATE_DECODE};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// FlateDecode filter.
///
/// Decoding falls back to raw deflate for streams with a damaged zlib
/// header, and keeps whatever was inflated before a corruption.
pub struct FlateFilter;

impl StreamFilter for FlateFilter {
    fn name(&self) -> &'static str {
        FLATE_DECODE
    }

    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let zlib_error = match ZlibDecoder::new(input).read_to_end(&mut output) {
            Ok(_) => return Ok(output),
            Err(e) => e,
        };
        if !output.is_empty() {
            log::warn!(
                "FlateDecode partial recovery: {} bytes before corruption: {}",
                output.len(),
                zlib_error
            );
            return Ok(output);
        }

        log::debug!("Zlib decode failed ({}), trying raw deflate", zlib_error);
        output.clear();
        match DeflateDecoder::new(input).read_to_end(&mut output) {
            Ok(_) => Ok(output),
            Err(_) if !output.is_empty() => {
                log::warn!("Raw deflate partial recovery: {} bytes", output.len());
                Ok(output)
            }
            Err(e) => Err(Error::Decode(format!("FlateDecode: {}", e))),
        }
    }

    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(input)?;
        Ok(encoder.finish()?)
    }
}
