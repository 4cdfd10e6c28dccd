//! Stream filters.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.4 - Filters.
//!
//! The object model stores stream bytes as they appear in the file and only
//! runs filters on request ([`PdfDictionary::unfiltered_stream`]) or when the
//! writer compresses a stream. Supported:
//! - FlateDecode (zlib/deflate)
//! - ASCIIHexDecode
//! - LZWDecode
//!
//! [`PdfDictionary::unfiltered_stream`]: crate::dictionary::PdfDictionary::unfiltered_stream

use crate::config::FilterOptions;
use crate::error::{Error, Result};

mod ascii_hex;
mod flate;
mod lzw;

pub use ascii_hex::AsciiHexFilter;
pub use flate::FlateFilter;
pub use lzw::LzwFilter;

/// `/FlateDecode`
pub const FLATE_DECODE: &str = "FlateDecode";
/// `/ASCIIHexDecode`
pub const ASCII_HEX_DECODE: &str = "ASCIIHexDecode";
/// `/LZWDecode`
pub const LZW_DECODE: &str = "LZWDecode";

/// A reversible byte transform named by a `/Filter` entry.
pub trait StreamFilter {
    /// Filter name without the leading `/` (e.g. "FlateDecode").
    fn name(&self) -> &'static str;

    /// Undo the filter.
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Apply the filter.
    fn encode(&self, input: &[u8]) -> Result<Vec<u8>>;
}

/// Look up a filter by name. Inline-image abbreviations are accepted.
pub fn filter_for(name: &str) -> Result<Box<dyn StreamFilter>> {
    match name.trim_start_matches('/') {
        FLATE_DECODE | "Fl" => Ok(Box::new(FlateFilter)),
        ASCII_HEX_DECODE | "AHx" => Ok(Box::new(AsciiHexFilter)),
        LZW_DECODE | "LZW" => Ok(Box::new(LzwFilter)),
        other => Err(Error::UnsupportedFilter(other.to_string())),
    }
}

/// Run a filter pipeline in decoding order.
///
/// # Security
///
/// The output of every stage is checked against
/// [`FilterOptions::max_decompressed_size`] (0 disables the check).
pub fn decode_stream(data: &[u8], filters: &[String], options: &FilterOptions) -> Result<Vec<u8>> {
    let mut current = data.to_vec();
    for name in filters {
        let filter = filter_for(name)?;
        current = filter.decode(&current)?;
        if options.max_decompressed_size > 0 && current.len() > options.max_decompressed_size {
            return Err(Error::Decode(format!(
                "{} output of {} bytes exceeds limit of {} bytes",
                filter.name(),
                current.len(),
                options.max_decompressed_size
            )));
        }
        log::trace!("{} decoded {} bytes", filter.name(), current.len());
    }
    Ok(current)
}

/// Encode data with one filter.
pub fn encode_stream(data: &[u8], filter: &str) -> Result<Vec<u8>> {
    filter_for(filter)?.encode(data)
}
