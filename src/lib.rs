// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::write_with_newline)]
#![allow(clippy::new_without_default)]

//! # PDF Graph
//!
//! In-memory PDF document object model: the indirect-object graph, the
//! cross-reference table that gives objects their identity, cross-document
//! import, and a writer that turns the graph back into PDF bytes.
//!
//! ## Core Concepts
//!
//! - **Items**: [`PdfItem`] is every value a PDF file can hold. Dictionaries
//!   and arrays are *objects*: they belong to at most one document and may be
//!   made indirect.
//! - **References**: an indirect object lives in a shared cell
//!   ([`PdfReference`]). Containers store the reference, never the value, so
//!   every holder sees the same object and renumbering is visible everywhere.
//! - **Typed views**: a dictionary carries a kind (`Page`, `Font`, ...) whose
//!   schema drives creation of missing entries; changing the kind keeps the
//!   storage and identity.
//! - **Import**: [`PdfDocument::import_object`] copies a value and everything
//!   it references from another document, cloning each foreign object once
//!   per source document.
//! - **Saving**: compaction drops objects unreachable from `/Root` and
//!   `/Info`, renumbering makes object numbers contiguous, and
//!   [`writer::PdfWriter`] emits header, objects, xref and trailer.
//!
//! ## Quick Start
//!
//! ```
//! use pdf_graph::{PdfDocument, PdfDictionary};
//!
//! # fn main() -> pdf_graph::Result<()> {
//! let doc = PdfDocument::new();
//! let page = doc.pages().add_new_page()?;
//! page.add_content(&b"BT /F1 12 Tf (Hello) Tj ET"[..])?;
//! doc.info()?.set_title("Hello")?;
//!
//! let bytes = doc.save_to_vec()?;
//! assert!(bytes.starts_with(b"%PDF-1.7"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Importing pages
//!
//! ```
//! use pdf_graph::PdfDocument;
//! use pdf_graph::config::{DocumentOptions, OpenMode};
//!
//! # fn main() -> pdf_graph::Result<()> {
//! let source = PdfDocument::with_options(DocumentOptions::default().with_open_mode(OpenMode::Import));
//! let page = source.pages().add_new_page()?;
//!
//! let target = PdfDocument::new();
//! target.pages().add(&page)?;
//! assert_eq!(target.pages().count()?, 1);
//! # Ok(())
//! # }
//! ```

// Error handling
pub mod error;

// Identities and values
pub mod date;
pub mod object_id;
pub mod primitives;

// Object model
pub mod array;
pub mod dictionary;
pub mod item;
pub mod meta;
pub mod reference;

// Cross-reference table and import engine
pub mod import;
pub mod xref;

// Documents
pub mod config;
pub mod document;
pub mod pages;

// Stream filters
pub mod filters;

// Writing
pub mod security;
pub mod writer;

// Re-exports
pub use array::{ArrayElements, PdfArray};
pub use dictionary::{CreateOptions, DictionaryElements, PdfDictionary, PdfStream};
pub use document::{DocumentInformation, DocumentLoader, PdfDocument};
pub use error::{Error, Result};
pub use import::{ImportContext, ImportedObjectTable};
pub use item::{ItemMut, ItemRef, PdfItem};
pub use meta::{ArrayKind, DictionaryKind, ValueType};
pub use object_id::{DocumentId, ObjectId};
pub use pages::{PdfPage, PdfPages};
pub use primitives::{PdfLiteral, PdfMatrix, PdfName, PdfRectangle, PdfString};
pub use reference::PdfReference;
pub use security::SecurityHandler;
pub use xref::{transitive_closure, CrossReferenceTable};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
