//! PDF document model.
//!
//! A [`PdfDocument`] ties together the cross-reference table, the trailer
//! (whose `/Root` is the catalog), the import bookkeeping for foreign
//! documents and the save pipeline. Values inside the document refer back to
//! it through a [`DocumentHandle`], a weak pointer, so the document can be
//! dropped while handles are still around.

use crate::array::PdfArray;
use crate::config::{DocumentOptions, OpenMode, WriterOptions};
use crate::date::parse_pdf_date;
use crate::dictionary::{CreateOptions, PdfDictionary};
use crate::error::{Error, Result};
use crate::import::{deep_copy_closure, import_closure, ImportContext};
use crate::item::PdfItem;
use crate::meta::{ArrayKind, DictionaryKind, ValueType};
use crate::object_id::{DocumentId, ObjectId};
use crate::pages::PdfPages;
use crate::reference::PdfReference;
use crate::writer::PdfWriter;
use crate::xref::CrossReferenceTable;
use chrono::{DateTime, FixedOffset};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::path::Path;
use std::rc::{Rc, Weak};

pub(crate) struct DocumentInner {
    id: DocumentId,
    options: Cell<DocumentOptions>,
    xref: RefCell<CrossReferenceTable>,
    trailer: RefCell<PdfDictionary>,
    imports: RefCell<ImportContext>,
}

impl Drop for DocumentInner {
    fn drop(&mut self) {
        // Objects may reference each other in cycles (page <-> parent).
        self.xref.get_mut().clear();
    }
}

/// Weak link from a value to the document that owns it.
#[derive(Clone)]
pub(crate) struct DocumentHandle {
    id: DocumentId,
    inner: Weak<DocumentInner>,
}

impl DocumentHandle {
    pub(crate) fn id(&self) -> DocumentId {
        self.id
    }

    /// The document, unless it has been dropped.
    pub(crate) fn upgrade(&self) -> Option<PdfDocument> {
        self.inner.upgrade().map(|inner| PdfDocument { inner })
    }
}

impl fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentHandle({})", self.id)
    }
}

/// An in-memory PDF document.
///
/// # Example
///
/// ```
/// use pdf_graph::{PdfDictionary, PdfDocument};
///
/// let doc = PdfDocument::new();
/// doc.pages().add_new_page()?;
///
/// let mut font = PdfDictionary::new();
/// font.elements_mut().set_name("/BaseFont", "Helvetica");
/// let font = doc.add_object(font)?;
/// assert_eq!(font.document_id(), doc.id());
///
/// let bytes = doc.save_to_vec()?;
/// assert!(bytes.starts_with(b"%PDF-1.7"));
/// # Ok::<(), pdf_graph::Error>(())
/// ```
pub struct PdfDocument {
    inner: Rc<DocumentInner>,
}

impl PdfDocument {
    /// Create a document with an empty page tree.
    pub fn new() -> Self {
        Self::with_options(DocumentOptions::default())
    }

    /// Create a document with an empty page tree and the given options.
    pub fn with_options(options: DocumentOptions) -> Self {
        let document = Self::empty(options);
        document.build_skeleton();
        log::debug!("Created {} ({:?})", document.id(), options.open_mode);
        document
    }

    /// A document without catalog, to be filled by a loader.
    fn empty(options: DocumentOptions) -> Self {
        let id = DocumentId::next();
        let inner = Rc::new_cyclic(|weak: &Weak<DocumentInner>| {
            let handle = DocumentHandle {
                id,
                inner: weak.clone(),
            };
            DocumentInner {
                id,
                options: Cell::new(options),
                xref: RefCell::new(CrossReferenceTable::new(handle)),
                trailer: RefCell::new(PdfDictionary::with_kind(DictionaryKind::Trailer)),
                imports: RefCell::new(ImportContext::new()),
            }
        });
        Self { inner }
    }

    fn build_skeleton(&self) {
        let handle = self.handle();
        let mut xref = self.inner.xref.borrow_mut();

        let mut pages = PdfDictionary::with_kind(DictionaryKind::Pages);
        pages
            .elements_mut()
            .insert_direct("/Kids", PdfItem::Array(PdfArray::with_kind(ArrayKind::Kids)));
        pages.elements_mut().set_integer("/Count", 0);
        pages.adopt(&handle);
        let pages = xref.insert_new(PdfItem::Dictionary(pages));

        let mut catalog = PdfDictionary::with_kind(DictionaryKind::Catalog);
        catalog
            .elements_mut()
            .insert_direct("/Pages", PdfItem::Reference(pages));
        catalog.adopt(&handle);
        let catalog = xref.insert_new(PdfItem::Dictionary(catalog));

        let mut trailer = self.inner.trailer.borrow_mut();
        trailer
            .elements_mut()
            .insert_direct("/Root", PdfItem::Reference(catalog));
        trailer.adopt(&handle);
    }

    /// Process-unique id of this document.
    pub fn id(&self) -> DocumentId {
        self.inner.id
    }

    /// Options the document was created with.
    pub fn options(&self) -> DocumentOptions {
        self.inner.options.get()
    }

    /// How the document may be used.
    pub fn open_mode(&self) -> OpenMode {
        self.options().open_mode
    }

    /// PDF version as major*10+minor.
    pub fn version(&self) -> u8 {
        self.options().version
    }

    /// Change the PDF version written to the header.
    pub fn set_version(&self, version: u8) {
        let options = self.options().with_version(version);
        self.inner.options.set(options);
    }

    pub(crate) fn handle(&self) -> DocumentHandle {
        DocumentHandle {
            id: self.inner.id,
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// The cross-reference table.
    pub fn xref(&self) -> Result<Ref<'_, CrossReferenceTable>> {
        self.inner
            .xref
            .try_borrow()
            .map_err(|_| Error::invalid_operation("cross-reference table is being modified"))
    }

    pub(crate) fn xref_mut(&self) -> Result<RefMut<'_, CrossReferenceTable>> {
        self.inner
            .xref
            .try_borrow_mut()
            .map_err(|_| Error::invalid_operation("cross-reference table is in use"))
    }

    pub(crate) fn imports_mut(&self) -> Result<RefMut<'_, ImportContext>> {
        self.inner
            .imports
            .try_borrow_mut()
            .map_err(|_| Error::invalid_operation("an import is already in progress"))
    }

    /// Slot for `id`, empty until defined.
    pub(crate) fn placeholder(&self, id: ObjectId) -> Result<PdfReference> {
        Ok(self.xref_mut()?.placeholder(id))
    }

    pub(crate) fn ensure_modifiable(&self) -> Result<()> {
        match self.open_mode() {
            OpenMode::ReadOnly => Err(Error::invalid_operation(format!(
                "{} is read-only",
                self.id()
            ))),
            OpenMode::Modify | OpenMode::Import => Ok(()),
        }
    }

    fn ensure_savable(&self) -> Result<()> {
        match self.open_mode() {
            OpenMode::Modify => Ok(()),
            mode => Err(Error::invalid_operation(format!(
                "{} was opened in {:?} mode and cannot be saved",
                self.id(),
                mode
            ))),
        }
    }

    /// Make a value an indirect object of this document.
    ///
    /// Direct composites nested in the value are attached to the document;
    /// references inside it must already belong to this document.
    pub fn add_object(&self, value: impl Into<PdfItem>) -> Result<PdfReference> {
        self.ensure_modifiable()?;
        self.xref_mut()?.add(value.into())
    }

    /// Indirect object with the given id.
    pub fn object(&self, id: ObjectId) -> Option<PdfReference> {
        self.inner.xref.borrow().get(id)
    }

    /// Whether an object with this id is registered.
    pub fn contains_object(&self, id: ObjectId) -> bool {
        self.inner.xref.borrow().contains(id)
    }

    /// Number of indirect objects.
    pub fn object_count(&self) -> usize {
        self.inner.xref.borrow().len()
    }

    /// All indirect objects, in ascending id order.
    pub fn all_references(&self) -> Vec<PdfReference> {
        self.inner.xref.borrow().all_references()
    }

    /// Remove an indirect object. Holders of its reference keep it dangling
    /// in memory; it is no longer written.
    pub fn remove_object(&self, reference: &PdfReference) -> Result<bool> {
        self.ensure_modifiable()?;
        Ok(self.xref_mut()?.remove(reference))
    }

    /// The trailer dictionary.
    pub fn trailer(&self) -> Result<Ref<'_, PdfDictionary>> {
        self.inner
            .trailer
            .try_borrow()
            .map_err(|_| Error::invalid_operation("trailer is being modified"))
    }

    /// The trailer dictionary, mutably.
    pub fn trailer_mut(&self) -> Result<RefMut<'_, PdfDictionary>> {
        self.ensure_modifiable()?;
        self.inner
            .trailer
            .try_borrow_mut()
            .map_err(|_| Error::invalid_operation("trailer is in use"))
    }

    /// The document catalog (`/Root`).
    pub fn catalog(&self) -> Result<PdfReference> {
        self.trailer()?
            .elements()
            .get_reference("/Root")
            .ok_or_else(|| Error::corrupt("trailer has no /Root reference"))
    }

    /// The document information dictionary, created on first use.
    pub fn info(&self) -> Result<DocumentInformation> {
        let existing = self.trailer()?.elements().get_reference("/Info");
        let reference = match existing {
            Some(reference) => reference,
            None => {
                let mut trailer = self.trailer_mut()?;
                trailer
                    .elements_mut()
                    .get_value("/Info", CreateOptions::CreateIndirect)?;
                trailer
                    .elements()
                    .get_reference("/Info")
                    .ok_or_else(|| Error::invalid_operation("failed to create /Info"))?
            }
        };
        reference
            .value_mut()?
            .transform_to(ValueType::Dictionary(DictionaryKind::Info));
        Ok(DocumentInformation { reference })
    }

    /// The page tree.
    pub fn pages(&self) -> PdfPages<'_> {
        PdfPages::new(self)
    }

    /// Objects that must survive compaction: the catalog, `/Info` and `/Encrypt`.
    fn roots(&self) -> Result<Vec<PdfReference>> {
        let trailer = self.trailer()?;
        Ok(["/Root", "/Info", "/Encrypt"]
            .iter()
            .filter_map(|key| trailer.elements().get_reference(key))
            .collect())
    }

    /// Remove every indirect object unreachable from the trailer's `/Root`,
    /// `/Info` and `/Encrypt`.
    /// Returns the number removed.
    pub fn compact(&self) -> Result<usize> {
        self.ensure_modifiable()?;
        let roots = self.roots()?;
        self.xref_mut()?.compact(&roots)
    }

    /// Renumber objects `1..=N`, catalog first.
    pub fn renumber(&self) -> Result<()> {
        self.ensure_modifiable()?;
        let catalog = self.catalog().ok();
        self.xref_mut()?.renumber(catalog.as_ref());
        Ok(())
    }

    /// Compact (optionally), renumber and update `/Size` before writing.
    pub fn prepare_for_save(&self, compact: bool) -> Result<()> {
        self.ensure_savable()?;
        if compact {
            let removed = self.compact()?;
            if removed > 0 {
                log::debug!("Dropped {} unreachable objects before save", removed);
            }
        }
        self.renumber()?;
        let size = self.xref()?.max_object_number() as i64 + 1;
        self.trailer_mut()?.elements_mut().set_integer("/Size", size);
        Ok(())
    }

    /// Import a value from another document, with its closure.
    ///
    /// Objects already imported from `source` are reused, so importing many
    /// pages that share a font clones the font once.
    pub fn import_object(&self, source: &PdfDocument, item: &PdfItem) -> Result<PdfItem> {
        self.ensure_modifiable()?;
        let mut imports = self.imports_mut()?;
        let table = imports.table_for(self, source)?;
        import_closure(table, self, item)
    }

    /// Copy a value from another document with a fresh clone of its closure.
    pub fn deep_copy_object(&self, item: &PdfItem) -> Result<PdfItem> {
        self.ensure_modifiable()?;
        deep_copy_closure(self, item)
    }

    /// Number of objects imported from `source` so far.
    pub fn imported_object_count(&self, source: DocumentId) -> usize {
        self.inner
            .imports
            .borrow()
            .get(source)
            .map_or(0, |table| table.len())
    }

    /// Serialize with default writer options.
    pub fn save_to_vec(&self) -> Result<Vec<u8>> {
        self.save_to_vec_with_options(WriterOptions::default())
    }

    /// Serialize with the given writer options.
    pub fn save_to_vec_with_options(&self, options: WriterOptions) -> Result<Vec<u8>> {
        PdfWriter::new(options).write(self)
    }

    /// Write to a file with default writer options.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save_with_options(path, WriterOptions::default())
    }

    /// Write to a file.
    pub fn save_with_options(&self, path: impl AsRef<Path>, options: WriterOptions) -> Result<()> {
        let bytes = self.save_to_vec_with_options(options)?;
        std::fs::write(path.as_ref(), &bytes)?;
        log::debug!("Saved {} bytes to {}", bytes.len(), path.as_ref().display());
        Ok(())
    }
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfDocument")
            .field("id", &self.inner.id)
            .field("options", &self.inner.options.get())
            .field("objects", &self.inner.xref.try_borrow().map(|x| x.len()).ok())
            .finish_non_exhaustive()
    }
}

/// Typed view of the `/Info` dictionary.
#[derive(Debug, Clone)]
pub struct DocumentInformation {
    reference: PdfReference,
}

impl DocumentInformation {
    /// The indirect `/Info` object.
    pub fn reference(&self) -> &PdfReference {
        &self.reference
    }

    fn text(&self, key: &str) -> Result<String> {
        self.reference.dictionary()?.elements().get_string(key)
    }

    fn set_text(&self, key: &str, value: &str) -> Result<()> {
        self.reference
            .dictionary_mut()?
            .elements_mut()
            .set_string(key, value);
        Ok(())
    }

    fn date(&self, key: &str) -> Result<Option<DateTime<FixedOffset>>> {
        let text = self.reference.dictionary()?.elements().get_string(key)?;
        if text.is_empty() {
            return Ok(None);
        }
        parse_pdf_date(&text).map(Some)
    }

    fn set_date(&self, key: &str, value: &DateTime<FixedOffset>) -> Result<()> {
        self.reference
            .dictionary_mut()?
            .elements_mut()
            .set_date_time(key, value);
        Ok(())
    }

    /// `/Title`, empty when absent.
    pub fn title(&self) -> Result<String> {
        self.text("/Title")
    }

    /// Set `/Title`.
    pub fn set_title(&self, value: &str) -> Result<()> {
        self.set_text("/Title", value)
    }

    /// `/Author`, empty when absent.
    pub fn author(&self) -> Result<String> {
        self.text("/Author")
    }

    /// Set `/Author`.
    pub fn set_author(&self, value: &str) -> Result<()> {
        self.set_text("/Author", value)
    }

    /// `/Subject`, empty when absent.
    pub fn subject(&self) -> Result<String> {
        self.text("/Subject")
    }

    /// Set `/Subject`.
    pub fn set_subject(&self, value: &str) -> Result<()> {
        self.set_text("/Subject", value)
    }

    /// `/Keywords`, empty when absent.
    pub fn keywords(&self) -> Result<String> {
        self.text("/Keywords")
    }

    /// Set `/Keywords`.
    pub fn set_keywords(&self, value: &str) -> Result<()> {
        self.set_text("/Keywords", value)
    }

    /// `/Creator`, empty when absent.
    pub fn creator(&self) -> Result<String> {
        self.text("/Creator")
    }

    /// Set `/Creator`.
    pub fn set_creator(&self, value: &str) -> Result<()> {
        self.set_text("/Creator", value)
    }

    /// `/Producer`, empty when absent.
    pub fn producer(&self) -> Result<String> {
        self.text("/Producer")
    }

    /// Set `/Producer`.
    pub fn set_producer(&self, value: &str) -> Result<()> {
        self.set_text("/Producer", value)
    }

    /// `/CreationDate`, if present.
    pub fn creation_date(&self) -> Result<Option<DateTime<FixedOffset>>> {
        self.date("/CreationDate")
    }

    /// Set `/CreationDate`.
    pub fn set_creation_date(&self, value: &DateTime<FixedOffset>) -> Result<()> {
        self.set_date("/CreationDate", value)
    }

    /// `/ModDate`, if present.
    pub fn modification_date(&self) -> Result<Option<DateTime<FixedOffset>>> {
        self.date("/ModDate")
    }

    /// Set `/ModDate`.
    pub fn set_modification_date(&self, value: &DateTime<FixedOffset>) -> Result<()> {
        self.set_date("/ModDate", value)
    }
}

/// Builds a document from objects produced by a parser.
///
/// The parser hands out [`reference`](Self::reference) handles for ids it
/// meets in the file (possibly before their definition) and registers each
/// object body with [`define`](Self::define). Ids never defined stay
/// dangling and fail with [`Error::DanglingReference`] when dereferenced.
///
/// # Example
///
/// ```
/// use pdf_graph::{DocumentLoader, ObjectId, PdfDictionary, PdfItem};
/// use pdf_graph::config::DocumentOptions;
///
/// let loader = DocumentLoader::new(DocumentOptions::default());
/// let pages = loader.reference(ObjectId::new(2, 0))?;
///
/// let mut catalog = PdfDictionary::new();
/// catalog.elements_mut().set_name("/Type", "Catalog");
/// catalog.elements_mut().set_reference("/Pages", &pages)?;
/// let catalog = loader.define(ObjectId::new(1, 0), Some(15), catalog.into())?;
///
/// let mut kids = PdfDictionary::new();
/// kids.elements_mut().set_name("/Type", "Pages");
/// kids.elements_mut().set_value("/Kids", pdf_graph::PdfArray::new())?;
/// kids.elements_mut().set_integer("/Count", 0);
/// loader.define(ObjectId::new(2, 0), Some(80), kids.into())?;
///
/// let mut trailer = PdfDictionary::new();
/// trailer.elements_mut().set_reference("/Root", &catalog)?;
/// let doc = loader.finish(trailer)?;
/// assert_eq!(doc.pages().count()?, 0);
/// # Ok::<(), pdf_graph::Error>(())
/// ```
pub struct DocumentLoader {
    document: PdfDocument,
}

impl DocumentLoader {
    /// Start loading a document.
    pub fn new(options: DocumentOptions) -> Self {
        Self {
            document: PdfDocument::empty(options),
        }
    }

    /// Id of the document being loaded.
    pub fn document_id(&self) -> DocumentId {
        self.document.id()
    }

    /// Handle for object `id`, defined now or later.
    pub fn reference(&self, id: ObjectId) -> Result<PdfReference> {
        if id.is_empty() {
            return Err(Error::corrupt("object number 0 is reserved"));
        }
        self.document.placeholder(id)
    }

    /// Register the body of object `id`, read at byte `offset`.
    pub fn define(&self, id: ObjectId, offset: Option<u64>, mut item: PdfItem) -> Result<PdfReference> {
        item.attach(&self.document.handle())?;
        self.document.xref_mut()?.register(id, offset, item)
    }

    /// Install the trailer and hand out the document.
    ///
    /// `/Root` must reference a dictionary; the catalog and the page tree
    /// root are upgraded to their typed views.
    pub fn finish(self, trailer: PdfDictionary) -> Result<PdfDocument> {
        let mut trailer = trailer.transform(DictionaryKind::Trailer);
        trailer.attach(&self.document.handle())?;

        let root = trailer
            .elements()
            .get_reference("/Root")
            .ok_or_else(|| Error::corrupt("trailer has no /Root reference"))?;
        if root.value()?.as_dictionary().is_none() {
            return Err(Error::Corrupt {
                id: Some(root.object_id()),
                reason: "/Root is not a dictionary".to_string(),
            });
        }
        trailer.elements_mut().get_value("/Root", CreateOptions::None)?;
        root.dictionary_mut()?
            .elements_mut()
            .get_value("/Pages", CreateOptions::None)?;

        *self.document.inner.trailer.borrow_mut() = trailer;
        log::debug!(
            "Loaded {} with {} objects",
            self.document.id(),
            self.document.object_count()
        );
        Ok(self.document)
    }
}

impl fmt::Debug for DocumentLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentLoader")
            .field("document", &self.document.id())
            .finish()
    }
}
