//! PDF object serialization.
//!
//! Serializes items to their byte representation according to
//! ISO 32000-1:2008, Section 7.3.

use crate::dictionary::PdfDictionary;
use crate::error::{Error, Result};
use crate::item::PdfItem;
use crate::object_id::ObjectId;
use crate::reference::PdfReference;
use crate::security::SecurityHandler;
use std::collections::HashSet;
use std::io::Write;

/// Serializer for PDF items.
///
/// Dictionaries are written as `<< /Key value ... >>` in insertion order,
/// arrays as `[ v1 v2 ... ]`. When a set of live references is given,
/// references outside of it (removed objects, foreign documents) are
/// written as `null`.
#[derive(Default)]
pub struct ObjectSerializer<'a> {
    security: Option<&'a dyn SecurityHandler>,
    live: Option<&'a HashSet<PdfReference>>,
}

impl<'a> ObjectSerializer<'a> {
    /// Create a serializer without encryption or reference checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encrypt strings and streams of indirect objects with `handler`.
    pub fn with_security(mut self, handler: &'a dyn SecurityHandler) -> Self {
        self.security = Some(handler);
        self
    }

    /// Only write references contained in `live`.
    pub fn with_live_references(mut self, live: &'a HashSet<PdfReference>) -> Self {
        self.live = Some(live);
        self
    }

    /// Serialize a direct value.
    pub fn serialize(&self, item: &PdfItem) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_item(&mut buf, item, None)?;
        Ok(buf)
    }

    /// Serialize a value to a string (for debugging).
    pub fn serialize_to_string(&self, item: &PdfItem) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.serialize(item)?).into_owned())
    }

    /// Serialize an indirect object definition.
    ///
    /// Format: `{num} {gen} obj\n{value}\nendobj\n`. Strings and streams are
    /// encrypted when a security handler is set and `encrypt` is true.
    pub fn serialize_indirect(&self, id: ObjectId, item: &PdfItem, encrypt: bool) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_indirect(&mut buf, id, item, encrypt)?;
        Ok(buf)
    }

    /// Write an indirect object definition.
    pub fn write_indirect<W: Write>(
        &self,
        w: &mut W,
        id: ObjectId,
        item: &PdfItem,
        encrypt: bool,
    ) -> Result<()> {
        writeln!(w, "{} {} obj", id.number, id.generation)?;
        let context = if encrypt && self.security.is_some() {
            Some(id)
        } else {
            None
        };
        match item {
            PdfItem::Dictionary(dict) if dict.has_stream() => {
                self.write_stream(w, dict, context)?
            },
            other => self.write_item(w, other, context)?,
        }
        write!(w, "\nendobj\n")?;
        Ok(())
    }

    /// Write a value. `context` is the enclosing object when encrypting.
    fn write_item<W: Write>(&self, w: &mut W, item: &PdfItem, context: Option<ObjectId>) -> Result<()> {
        match item {
            PdfItem::Null => write!(w, "null")?,
            PdfItem::Boolean(b) => write!(w, "{}", if *b { "true" } else { "false" })?,
            PdfItem::Integer(i) => write!(w, "{}", i)?,
            PdfItem::Real(r) => write_real(w, *r)?,
            PdfItem::String(s) => match (self.security, context) {
                (Some(handler), Some(id)) => {
                    write_string(w, &handler.encrypt_string(id, s.as_bytes()))?
                },
                _ => write_string(w, s.as_bytes())?,
            },
            PdfItem::Name(n) => write_name(w, n.without_slash())?,
            PdfItem::Rectangle(rect) => {
                write!(w, "[")?;
                for value in rect.to_array() {
                    write!(w, " ")?;
                    write_real(w, value)?;
                }
                write!(w, " ]")?;
            },
            PdfItem::Literal(literal) => w.write_all(literal.as_str().as_bytes())?,
            PdfItem::Array(array) => {
                write!(w, "[")?;
                for value in array.elements().iter() {
                    write!(w, " ")?;
                    self.write_item(w, value, context)?;
                }
                write!(w, " ]")?;
            },
            PdfItem::Dictionary(dict) => {
                if dict.has_stream() {
                    return Err(Error::Corrupt {
                        id: None,
                        reason: "stream in a direct dictionary".to_string(),
                    });
                }
                self.write_dictionary(w, dict, None, context)?;
            },
            PdfItem::Reference(reference) => self.write_reference(w, reference)?,
        }
        Ok(())
    }

    fn write_reference<W: Write>(&self, w: &mut W, reference: &PdfReference) -> Result<()> {
        if let Some(live) = self.live {
            if !live.contains(reference) {
                log::warn!("Reference {} is not part of the document, writing null", reference);
                write!(w, "null")?;
                return Ok(());
            }
        }
        let id = reference.object_id();
        write!(w, "{} {} R", id.number, id.generation)?;
        Ok(())
    }

    /// Write a dictionary, replacing `/Length` when `length` is given.
    fn write_dictionary<W: Write>(
        &self,
        w: &mut W,
        dict: &PdfDictionary,
        length: Option<usize>,
        context: Option<ObjectId>,
    ) -> Result<()> {
        write!(w, "<<")?;
        for (key, value) in dict.elements().iter() {
            if length.is_some() && key == "/Length" {
                continue;
            }
            write!(w, " ")?;
            write_name(w, key.strip_prefix('/').unwrap_or(key))?;
            write!(w, " ")?;
            self.write_item(w, value, context)?;
        }
        if let Some(length) = length {
            write!(w, " /Length {}", length)?;
        }
        write!(w, " >>")?;
        Ok(())
    }

    fn write_stream<W: Write>(&self, w: &mut W, dict: &PdfDictionary, context: Option<ObjectId>) -> Result<()> {
        let data = dict.stream().map(|s| s.value().as_ref()).unwrap_or_default();
        let encrypted = match (self.security, context) {
            (Some(handler), Some(id)) if handler.encrypt_metadata() || !is_metadata(dict) => {
                Some(handler.encrypt_stream(id, data))
            },
            _ => None,
        };
        let data = encrypted.as_deref().unwrap_or(data);

        self.write_dictionary(w, dict, Some(data.len()), context)?;
        write!(w, "\nstream\n")?;
        w.write_all(data)?;
        write!(w, "\nendstream")?;
        Ok(())
    }
}

fn is_metadata(dict: &PdfDictionary) -> bool {
    dict.elements()
        .get("/Type")
        .and_then(PdfItem::as_name)
        .is_some_and(|name| name.without_slash() == "Metadata")
}

/// Write a real number, trimming trailing zeros.
fn write_real<W: Write>(w: &mut W, value: f64) -> std::io::Result<()> {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        write!(w, "{}", value as i64)
    } else {
        let formatted = format!("{:.5}", value);
        let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
        write!(w, "{}", trimmed)
    }
}

/// Write a string as a literal `(...)` when printable, else as hex `<...>`.
fn write_string<W: Write>(w: &mut W, data: &[u8]) -> std::io::Result<()> {
    let is_printable = data
        .iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..=0x7E).contains(&b));

    if is_printable {
        write!(w, "(")?;
        for &byte in data {
            match byte {
                b'(' => write!(w, "\\(")?,
                b')' => write!(w, "\\)")?,
                b'\\' => write!(w, "\\\\")?,
                b'\n' => write!(w, "\\n")?,
                b'\r' => write!(w, "\\r")?,
                b'\t' => write!(w, "\\t")?,
                _ => w.write_all(&[byte])?,
            }
        }
        write!(w, ")")
    } else {
        write!(w, "<")?;
        for byte in data {
            write!(w, "{:02X}", byte)?;
        }
        write!(w, ">")
    }
}

/// Write a name with a leading `/`, escaping delimiters and non-printables as `#xx`.
fn write_name<W: Write>(w: &mut W, name: &str) -> std::io::Result<()> {
    write!(w, "/")?;
    for byte in name.bytes() {
        match byte {
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#' => {
                write!(w, "#{:02X}", byte)?
            },
            0x21..=0x7E => w.write_all(&[byte])?,
            _ => write!(w, "#{:02X}", byte)?,
        }
    }
    Ok(())
}
