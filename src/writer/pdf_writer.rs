//! Whole-document writer.
//!
//! Layout of the output (ISO 32000-1:2008, Section 7.5):
//!
//! ```text
//! %PDF-1.7
//! %âãÏÓ
//! 1 0 obj
//! ...
//! endobj
//! xref
//! 0 N
//! 0000000000 65535 f
//! ...
//! trailer
//! << /Root 1 0 R /Size N >>
//! startxref
//! 1234
//! %%EOF
//! ```

use crate::config::WriterOptions;
use crate::document::PdfDocument;
use crate::error::Result;
use crate::item::PdfItem;
use crate::object_id::ObjectId;
use crate::reference::PdfReference;
use crate::security::SecurityHandler;
use crate::writer::ObjectSerializer;
use std::collections::HashSet;
use std::io::Write;

/// Serializes a [`PdfDocument`] into PDF bytes.
///
/// Writing prepares the document first (compaction, renumbering, `/Size`),
/// so the document must be in [`OpenMode::Modify`](crate::config::OpenMode::Modify).
/// The byte offset of every written object is recorded in its reference.
pub struct PdfWriter {
    options: WriterOptions,
    security: Option<Box<dyn SecurityHandler>>,
}

impl PdfWriter {
    /// Create a writer.
    pub fn new(options: WriterOptions) -> Self {
        Self {
            options,
            security: None,
        }
    }

    /// Encrypt strings and streams with `handler` while writing.
    pub fn with_security(mut self, handler: Box<dyn SecurityHandler>) -> Self {
        self.security = Some(handler);
        self
    }

    /// The writer options.
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Write the document.
    pub fn write(&self, document: &PdfDocument) -> Result<Vec<u8>> {
        document.prepare_for_save(self.options.compact)?;

        let mut references = document.all_references();
        references.sort_by_key(PdfReference::object_id);
        let live: HashSet<PdfReference> = references.iter().cloned().collect();
        let encrypt_dict = document.trailer()?.elements().get_reference("/Encrypt");

        let mut serializer = ObjectSerializer::new().with_live_references(&live);
        if let Some(handler) = self.security.as_deref() {
            serializer = serializer.with_security(handler);
        }

        let mut out = Vec::new();
        let version = document.version();
        writeln!(out, "%PDF-{}.{}", version / 10, version % 10)?;
        // Binary marker so transfer tools treat the file as binary
        out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        let mut entries: Vec<(ObjectId, u64)> = Vec::with_capacity(references.len());
        let mut compressed = 0usize;
        for reference in &references {
            let id = reference.object_id();
            let offset = out.len() as u64;
            reference.set_offset(Some(offset));
            entries.push((id, offset));

            let encrypt = encrypt_dict.as_ref() != Some(reference);
            let value = match reference.value() {
                Ok(value) => value,
                Err(_) => {
                    log::warn!("Object {} has no value, writing null", id);
                    serializer.write_indirect(&mut out, id, &PdfItem::Null, encrypt)?;
                    continue;
                },
            };

            match &*value {
                PdfItem::Dictionary(dict) if self.options.compress_streams && dict.has_stream() => {
                    let mut copy = dict.clone();
                    if copy.try_compress_stream()? {
                        compressed += 1;
                    }
                    serializer.write_indirect(&mut out, id, &copy.into(), encrypt)?;
                },
                item => serializer.write_indirect(&mut out, id, item, encrypt)?,
            }
        }

        let size = document.xref()?.max_object_number() + 1;
        let xref_offset = out.len() as u64;
        write_xref_section(&mut out, size, &entries)?;

        writeln!(out, "trailer")?;
        let trailer = PdfItem::Dictionary(document.trailer()?.clone());
        out.extend_from_slice(&serializer.serialize(&trailer)?);
        write!(out, "\nstartxref\n{}\n%%EOF\n", xref_offset)?;

        log::debug!(
            "Wrote {} objects ({} streams compressed), {} bytes, xref at {}",
            entries.len(),
            compressed,
            out.len(),
            xref_offset
        );
        Ok(out)
    }
}

impl std::fmt::Debug for PdfWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfWriter")
            .field("options", &self.options)
            .field("security", &self.security.is_some())
            .finish()
    }
}

/// Classic cross-reference section covering object numbers `0..size`.
/// Numbers without an entry are written as free.
fn write_xref_section<W: Write>(w: &mut W, size: u32, entries: &[(ObjectId, u64)]) -> Result<()> {
    writeln!(w, "xref")?;
    writeln!(w, "0 {}", size)?;
    write!(w, "0000000000 65535 f \n")?;

    let mut entries = entries.iter().peekable();
    for number in 1..size {
        match entries.peek() {
            Some((id, offset)) if id.number == number => {
                write!(w, "{:010} {:05} n \n", offset, id.generation)?;
                entries.next();
            },
            _ => write!(w, "0000000000 00000 f \n")?,
        }
    }
    Ok(())
}
