//! PDF writing.
//!
//! [`PdfWriter`] turns a document into a complete PDF file: header, one
//! `N G obj ... endobj` block per indirect object, a classic cross-reference
//! section and the trailer. [`ObjectSerializer`] produces the byte form of
//! single values.

mod object_serializer;
mod pdf_writer;

pub use object_serializer::ObjectSerializer;
pub use pdf_writer::PdfWriter;
