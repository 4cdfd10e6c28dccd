//! Immutable PDF value types.
//!
//! Names, strings, rectangles, matrices and literals. They never change after
//! construction; "mutating" a dictionary entry replaces the value.

use std::fmt;

/// A PDF name. Always stored with its leading `/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PdfName(String);

impl PdfName {
    /// Create a name, adding the leading `/` when missing.
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        if name.starts_with('/') {
            PdfName(name.to_string())
        } else {
            PdfName(format!("/{}", name))
        }
    }

    /// The name including its leading `/`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name without its leading `/`.
    pub fn without_slash(&self) -> &str {
        &self.0[1..]
    }
}

impl fmt::Display for PdfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PdfName {
    fn from(s: &str) -> Self {
        PdfName::new(s)
    }
}

impl PartialEq<str> for PdfName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PdfName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A PDF string (byte sequence).
///
/// Text is stored as PDFDocEncoding (Latin-1 subset) when every character fits,
/// otherwise as UTF-16BE with a byte order mark.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PdfString(Vec<u8>);

impl PdfString {
    /// Create a string from raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        PdfString(bytes.into())
    }

    /// Encode text as a PDF text string.
    pub fn from_text(text: &str) -> Self {
        if text.chars().all(|c| (c as u32) < 0x80 || ((c as u32) >= 0xA0 && (c as u32) <= 0xFF)) {
            PdfString(text.chars().map(|c| c as u8).collect())
        } else {
            let mut bytes = vec![0xFE, 0xFF];
            for unit in text.encode_utf16() {
                bytes.extend_from_slice(&unit.to_be_bytes());
            }
            PdfString(bytes)
        }
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decode as a text string (UTF-16BE when a BOM is present, Latin-1 otherwise).
    pub fn to_text(&self) -> String {
        if self.0.len() >= 2 && self.0[0] == 0xFE && self.0[1] == 0xFF {
            let units: Vec<u16> = self.0[2..]
                .chunks(2)
                .map(|pair| u16::from_be_bytes([pair[0], *pair.get(1).unwrap_or(&0)]))
                .collect();
            String::from_utf16_lossy(&units)
        } else {
            self.0.iter().map(|&b| b as char).collect()
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for PdfString {
    fn from(s: &str) -> Self {
        PdfString::from_text(s)
    }
}

/// A rectangle given by two corners, `[x1 y1 x2 y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PdfRectangle {
    /// Lower-left x
    pub x1: f64,
    /// Lower-left y
    pub y1: f64,
    /// Upper-right x
    pub x2: f64,
    /// Upper-right y
    pub y2: f64,
}

impl PdfRectangle {
    /// Create a rectangle from its corners.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a rectangle from an origin and a size.
    pub fn from_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Horizontal extent.
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Vertical extent.
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Whether all coordinates are zero (the value returned for a missing key).
    pub fn is_empty(&self) -> bool {
        self.x1 == 0.0 && self.y1 == 0.0 && self.x2 == 0.0 && self.y2 == 0.0
    }

    /// Coordinates in PDF array order.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// A transformation matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfMatrix(pub [f64; 6]);

impl PdfMatrix {
    /// The identity matrix.
    pub const IDENTITY: PdfMatrix = PdfMatrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// Create a matrix from its six components.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        PdfMatrix([a, b, c, d, e, f])
    }

    /// Whether this is the identity matrix.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for PdfMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Raw PDF syntax written verbatim by the serializer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PdfLiteral(String);

impl PdfLiteral {
    /// Create a literal.
    pub fn new(text: impl Into<String>) -> Self {
        PdfLiteral(text.into())
    }

    /// The literal text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
