//! Configuration for documents, stream filters and the writer.

/// How a document may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Full read/write access (default for new documents)
    #[default]
    Modify,
    /// Source for page and object imports into other documents; cannot be saved
    Import,
    /// Inspection only; cannot be modified or saved
    ReadOnly,
}

/// Document configuration.
///
/// # Example
///
/// ```
/// use pdf_graph::config::{DocumentOptions, OpenMode};
///
/// let options = DocumentOptions::default()
///     .with_open_mode(OpenMode::Import)
///     .with_version(14);
/// assert_eq!(options.version, 14);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentOptions {
    /// What the document may be used for
    pub open_mode: OpenMode,

    /// PDF version as major*10+minor (17 = PDF 1.7)
    pub version: u8,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            open_mode: OpenMode::Modify,
            version: 17,
        }
    }
}

impl DocumentOptions {
    /// Set the open mode.
    pub fn with_open_mode(mut self, open_mode: OpenMode) -> Self {
        self.open_mode = open_mode;
        self
    }

    /// Set the PDF version (major*10+minor).
    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }
}

/// Limits applied when decoding stream data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    /// Maximum decoded stream size in bytes
    ///
    /// Protects against decompression bombs. Default: 100 MB.
    /// Set to 0 to disable the check.
    pub max_decompressed_size: usize,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            max_decompressed_size: 100 * 1024 * 1024,
        }
    }
}

impl FilterOptions {
    /// No size limit.
    pub fn unlimited() -> Self {
        Self {
            max_decompressed_size: 0,
        }
    }

    /// Set the maximum decoded size.
    pub fn with_max_decompressed_size(mut self, size: usize) -> Self {
        self.max_decompressed_size = size;
        self
    }
}

/// Writer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Remove objects unreachable from `/Root` and `/Info` before writing
    pub compact: bool,

    /// Flate-compress unfiltered streams when that makes them smaller
    pub compress_streams: bool,

    /// Limits used when a stream has to be decoded during the write
    pub filter: FilterOptions,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            compact: true,
            compress_streams: false,
            filter: FilterOptions::default(),
        }
    }
}

impl WriterOptions {
    /// Enable or disable compaction before writing.
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Enable or disable stream compression.
    pub fn with_compress_streams(mut self, compress: bool) -> Self {
        self.compress_streams = compress;
        self
    }

    /// Set the filter limits.
    pub fn with_filter(mut self, filter: FilterOptions) -> Self {
        self.filter = filter;
        self
    }
}
