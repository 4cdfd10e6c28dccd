//! Page tree.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.7.3 - Page Tree.
//!
//! Intermediate `/Pages` nodes are followed when counting and locating
//! pages; new pages are linked next to their neighbour so nested trees keep
//! their shape. `/Count` is maintained on every ancestor.

use crate::array::{ArrayElements, PdfArray};
use crate::config::OpenMode;
use crate::dictionary::{CreateOptions, PdfDictionary};
use crate::document::PdfDocument;
use crate::error::{Error, Result};
use crate::import::import_closure;
use crate::item::PdfItem;
use crate::meta::{DictionaryKind, ValueType};
use crate::object_id::{DocumentId, ObjectId};
use crate::primitives::PdfRectangle;
use crate::reference::PdfReference;
use bytes::Bytes;
use std::cell::{Ref, RefMut};
use std::collections::HashSet;

/// Default page size (A4 in points).
const A4: PdfRectangle = PdfRectangle {
    x1: 0.0,
    y1: 0.0,
    x2: 595.0,
    y2: 842.0,
};

/// Attributes a page inherits from its ancestors.
const INHERITABLE_KEYS: [&str; 4] = ["/Resources", "/MediaBox", "/CropBox", "/Rotate"];

/// The page tree of a document.
#[derive(Debug)]
pub struct PdfPages<'a> {
    document: &'a PdfDocument,
}

impl<'a> PdfPages<'a> {
    pub(crate) fn new(document: &'a PdfDocument) -> Self {
        Self { document }
    }

    fn root(&self) -> Result<PdfReference> {
        let catalog = self.document.catalog()?;
        let root = catalog
            .dictionary()?
            .elements()
            .get_reference("/Pages")
            .ok_or_else(|| Error::Corrupt {
                id: Some(catalog.object_id()),
                reason: "catalog has no /Pages reference".to_string(),
            })?;
        Ok(root)
    }

    /// `(page, parent node)` for every leaf, in document order.
    fn leaves(&self) -> Result<Vec<(PdfReference, PdfReference)>> {
        let mut leaves = Vec::new();
        let mut visited = HashSet::new();
        collect_leaves(&self.root()?, &mut visited, &mut leaves)?;
        Ok(leaves)
    }

    /// Number of pages, as recorded in the root's `/Count`.
    pub fn count(&self) -> Result<usize> {
        let count = self.root()?.dictionary()?.elements().get_integer("/Count")?;
        Ok(count.max(0) as usize)
    }

    /// Page at `index`.
    pub fn page(&self, index: usize) -> Result<PdfPage> {
        let leaves = self.leaves()?;
        let len = leaves.len();
        let (page, _) = leaves
            .into_iter()
            .nth(index)
            .ok_or(Error::IndexOutOfRange { index, len })?;
        PdfPage::from_reference(page)
    }

    /// All pages in document order.
    pub fn all(&self) -> Result<Vec<PdfPage>> {
        self.leaves()?
            .into_iter()
            .map(|(page, _)| PdfPage::from_reference(page))
            .collect()
    }

    /// Append an empty A4 page.
    pub fn add_new_page(&self) -> Result<PdfPage> {
        self.document.ensure_modifiable()?;
        let mut page = PdfDictionary::with_kind(DictionaryKind::Page);
        page.elements_mut().set_rectangle("/MediaBox", A4);
        page.elements_mut()
            .set_value("/Resources", PdfDictionary::with_kind(DictionaryKind::Resources))?;
        let page = self.document.add_object(page)?;
        self.add(&PdfPage { reference: page })
    }

    /// Append a page. See [`insert`](Self::insert).
    pub fn add(&self, page: &PdfPage) -> Result<PdfPage> {
        let len = self.leaves()?.len();
        self.insert(len, page)
    }

    /// Insert a page before position `index` (`index == len` appends).
    ///
    /// A page of this document is linked as is and must not already be in the
    /// tree. A page of another document is imported: that document must be
    /// open in [`OpenMode::Import`]; the page is copied without `/Parent`,
    /// with inherited attributes made explicit, and its resources and
    /// contents are imported through this document's import table for the
    /// source, so objects shared between imported pages are copied once.
    /// Returns the page as linked into this document.
    pub fn insert(&self, index: usize, page: &PdfPage) -> Result<PdfPage> {
        self.document.ensure_modifiable()?;
        let leaves = self.leaves()?;
        if index > leaves.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: leaves.len(),
            });
        }

        let (parent, position) = match (leaves.get(index), leaves.last()) {
            (Some((leaf, parent)), _) => (parent.clone(), kid_position(parent, leaf)?),
            (None, Some((leaf, parent))) => (parent.clone(), kid_position(parent, leaf)? + 1),
            (None, None) => (self.root()?, 0),
        };
        // Linking must not fail once a foreign page has been imported.
        counted_ancestors(&parent)?;

        let (local, previous) = if page.document_id() == self.document.id() {
            if leaves.iter().any(|(leaf, _)| leaf == page.reference()) {
                return Err(Error::invalid_operation(format!(
                    "page {} is already in the page tree",
                    page.reference()
                )));
            }
            (page.reference().clone(), None)
        } else {
            let (local, previous) = self.import_page(page)?;
            (local, Some(previous))
        };

        let linked = local
            .dictionary_mut()
            .and_then(|mut dictionary| dictionary.elements_mut().set_reference("/Parent", &parent))
            .and_then(|()| with_kids(&parent, |kids| kids.insert(position, local.clone())))
            .and_then(|()| adjust_counts(&parent, 1));
        if let Err(e) = linked {
            if let Some(previous) = previous {
                self.forget_imported_page(page.reference(), &local, previous)?;
            }
            return Err(e);
        }
        log::debug!("Inserted page {} at index {}", local, index);
        PdfPage::from_reference(local)
    }

    /// Unlink the page at `index` and return it.
    ///
    /// The page object stays in the cross-reference table until the next
    /// compaction.
    pub fn remove_at(&self, index: usize) -> Result<PdfPage> {
        self.document.ensure_modifiable()?;
        let leaves = self.leaves()?;
        let len = leaves.len();
        let (page, parent) = leaves
            .into_iter()
            .nth(index)
            .ok_or(Error::IndexOutOfRange { index, len })?;

        let position = kid_position(&parent, &page)?;
        with_kids(&parent, |kids| kids.remove_at(position).map(|_| ()))?;
        adjust_counts(&parent, -1)?;
        page.dictionary_mut()?.elements_mut().remove("/Parent");
        log::debug!("Removed page {} at index {}", page, index);
        PdfPage::from_reference(page)
    }

    /// Returns the local page and the import entry it replaced.
    fn import_page(&self, page: &PdfPage) -> Result<(PdfReference, Option<PdfReference>)> {
        let foreign = page.reference();
        let source = foreign.document().upgrade().ok_or_else(|| {
            Error::invalid_operation(format!("document of page {} has been dropped", foreign))
        })?;
        if source.open_mode() != OpenMode::Import {
            return Err(Error::invalid_operation(format!(
                "pages can only be imported from documents opened in Import mode ({} is {:?})",
                source.id(),
                source.open_mode()
            )));
        }

        let mut copy = foreign.dictionary()?.clone();
        copy.elements_mut().remove("/Parent");
        for key in INHERITABLE_KEYS {
            if !copy.elements().contains_key(key) {
                if let Some(value) = page.inherited(key)? {
                    copy.elements_mut().insert_direct(key, value);
                }
            }
        }

        // The local page exists before its closure is imported, so back links
        // to the page (annotation /P) resolve to it instead of pulling in the
        // source's page tree.
        let (local, previous, imported) = {
            let mut imports = self.document.imports_mut()?;
            let table = imports.table_for(self.document, &source)?;
            table.retain_live(self.document)?;
            let local = self.document.xref_mut()?.insert_new(PdfItem::Null);
            let previous = table.insert(foreign.clone(), local.clone());
            let imported = import_closure(table, self.document, &PdfItem::Dictionary(copy));
            (local, previous, imported)
        };
        let dictionary = match imported {
            Ok(PdfItem::Dictionary(dictionary)) => dictionary,
            outcome => {
                self.forget_imported_page(foreign, &local, previous)?;
                return Err(outcome.err().unwrap_or_else(|| {
                    Error::invalid_operation("imported page is not a dictionary")
                }));
            }
        };
        local.replace_value(Some(PdfItem::Dictionary(
            dictionary.transform(DictionaryKind::Page),
        )))?;
        log::debug!(
            "Imported page {} of {} as {} ({} objects imported from that document so far)",
            foreign,
            source.id(),
            local,
            self.document.imported_object_count(source.id())
        );
        Ok((local, previous))
    }

    /// Undo the registration of an imported page: unregister `local` and
    /// restore the import entry the foreign page had before.
    fn forget_imported_page(
        &self,
        foreign: &PdfReference,
        local: &PdfReference,
        previous: Option<PdfReference>,
    ) -> Result<()> {
        let source = foreign.document_id();
        {
            let mut imports = self.document.imports_mut()?;
            if let Some(table) = imports.get_mut(source) {
                match previous {
                    Some(previous) => {
                        table.insert(foreign.clone(), previous);
                    }
                    None => {
                        table.remove(foreign);
                    }
                }
            }
        }
        self.document.xref_mut()?.remove(local);
        log::debug!("Dropped imported page {} after a failed insert", local);
        Ok(())
    }
}

fn is_tree_node(node: &PdfReference) -> Result<bool> {
    let dictionary = node.dictionary()?;
    Ok(dictionary.elements().get_name("/Type")? == "/Pages"
        || dictionary.elements().contains_key("/Kids"))
}

fn kid_references(node: &PdfReference) -> Result<Vec<PdfReference>> {
    let dictionary = node.dictionary()?;
    let Some(kids) = dictionary.elements().get("/Kids") else {
        return Ok(Vec::new());
    };
    let kids = kids.resolve()?;
    let array = kids.as_array().ok_or_else(|| Error::Corrupt {
        id: Some(node.object_id()),
        reason: format!("/Kids is {}, not an array", kids.type_name()),
    })?;
    let mut references = Vec::with_capacity(array.len());
    for kid in array.elements().iter() {
        match kid.as_reference() {
            Some(reference) => references.push(reference.clone()),
            None => log::warn!("Skipping direct {} in /Kids of {}", kid.type_name(), node),
        }
    }
    Ok(references)
}

fn collect_leaves(
    node: &PdfReference,
    visited: &mut HashSet<ObjectId>,
    leaves: &mut Vec<(PdfReference, PdfReference)>,
) -> Result<()> {
    if !visited.insert(node.object_id()) {
        return Err(Error::Corrupt {
            id: Some(node.object_id()),
            reason: "page tree contains a cycle".to_string(),
        });
    }
    for kid in kid_references(node)? {
        if is_tree_node(&kid)? {
            collect_leaves(&kid, visited, leaves)?;
        } else {
            leaves.push((kid, node.clone()));
        }
    }
    Ok(())
}

fn kid_position(parent: &PdfReference, kid: &PdfReference) -> Result<usize> {
    kid_references(parent)?
        .iter()
        .position(|r| r == kid)
        .ok_or_else(|| Error::Corrupt {
            id: Some(kid.object_id()),
            reason: format!("page is missing from /Kids of {}", parent),
        })
}

/// Run `f` on the `/Kids` of a tree node, created if missing.
fn with_kids<R>(
    node: &PdfReference,
    f: impl FnOnce(&mut ArrayElements) -> Result<R>,
) -> Result<R> {
    node.value_mut()?
        .transform_to(ValueType::Dictionary(DictionaryKind::Pages));
    let mut dictionary = node.dictionary_mut()?;
    let mut kids = dictionary
        .elements_mut()
        .get_value("/Kids", CreateOptions::Create)?
        .ok_or_else(|| Error::invalid_operation("failed to create /Kids"))?;
    let array = kids.as_array_mut().ok_or_else(|| Error::Corrupt {
        id: Some(node.object_id()),
        reason: "/Kids is not an array".to_string(),
    })?;
    f(array.elements_mut())
}

/// `node` and its ancestors with their `/Count`, each checked to be writable.
fn counted_ancestors(node: &PdfReference) -> Result<Vec<(PdfReference, i64)>> {
    let mut visited = HashSet::new();
    let mut chain = Vec::new();
    let mut current = Some(node.clone());
    while let Some(node) = current {
        if !visited.insert(node.object_id()) {
            return Err(Error::Corrupt {
                id: Some(node.object_id()),
                reason: "page tree /Parent chain contains a cycle".to_string(),
            });
        }
        let (count, parent) = {
            let dictionary = node.dictionary_mut()?;
            let count = dictionary.elements().get_integer("/Count")?;
            (count, dictionary.elements().get_reference("/Parent"))
        };
        chain.push((node, count));
        current = parent;
    }
    Ok(chain)
}

/// Add `delta` to `/Count` of `node` and all its ancestors.
fn adjust_counts(node: &PdfReference, delta: i64) -> Result<()> {
    for (node, count) in counted_ancestors(node)? {
        node.dictionary_mut()?
            .elements_mut()
            .set_integer("/Count", (count + delta).max(0));
    }
    Ok(())
}

/// A page object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPage {
    reference: PdfReference,
}

impl PdfPage {
    /// View an indirect dictionary as a page, upgrading it to the page kind.
    pub fn from_reference(reference: PdfReference) -> Result<Self> {
        {
            let mut value = reference.value_mut()?;
            if value.as_dictionary().is_none() {
                return Err(Error::invalid_cast(
                    reference.to_string(),
                    "Dictionary",
                    value.type_name(),
                ));
            }
            value.transform_to(ValueType::Dictionary(DictionaryKind::Page));
        }
        Ok(Self { reference })
    }

    /// The indirect page object.
    pub fn reference(&self) -> &PdfReference {
        &self.reference
    }

    /// Object id of the page.
    pub fn object_id(&self) -> ObjectId {
        self.reference.object_id()
    }

    /// Document holding the page.
    pub fn document_id(&self) -> DocumentId {
        self.reference.document_id()
    }

    /// The page dictionary.
    pub fn dictionary(&self) -> Result<Ref<'_, PdfDictionary>> {
        self.reference.dictionary()
    }

    /// The page dictionary, mutably.
    pub fn dictionary_mut(&self) -> Result<RefMut<'_, PdfDictionary>> {
        self.reference.dictionary_mut()
    }

    /// Value of `key` on the page or the nearest ancestor defining it.
    pub fn inherited(&self, key: &str) -> Result<Option<PdfItem>> {
        let mut visited = HashSet::new();
        let mut current = Some(self.reference.clone());
        while let Some(node) = current {
            if !visited.insert(node.object_id()) {
                break;
            }
            let dictionary = node.dictionary()?;
            if let Some(value) = dictionary.elements().get(key) {
                if !value.resolve()?.is_null() {
                    return Ok(Some(value.clone()));
                }
            }
            current = dictionary.elements().get_reference("/Parent");
        }
        Ok(None)
    }

    /// Page boundaries, possibly inherited.
    pub fn media_box(&self) -> Result<PdfRectangle> {
        let value = self.inherited("/MediaBox")?.ok_or_else(|| Error::Corrupt {
            id: Some(self.object_id()),
            reason: "page has no /MediaBox".to_string(),
        })?;
        let value = value.resolve()?;
        match &*value {
            PdfItem::Rectangle(rect) => Ok(*rect),
            PdfItem::Array(array) => array.to_rectangle(),
            other => Err(Error::invalid_cast("/MediaBox", "Rectangle", other.type_name())),
        }
    }

    /// Set the page boundaries on the page itself.
    pub fn set_media_box(&self, rect: PdfRectangle) -> Result<()> {
        self.dictionary_mut()?
            .elements_mut()
            .set_rectangle("/MediaBox", rect);
        Ok(())
    }

    /// Rotation in degrees, possibly inherited.
    pub fn rotate(&self) -> Result<i64> {
        match self.inherited("/Rotate")? {
            None => Ok(0),
            Some(value) => {
                let value = value.resolve()?;
                value
                    .as_integer()
                    .ok_or_else(|| Error::invalid_cast("/Rotate", "Integer", value.type_name()))
            }
        }
    }

    /// Set the rotation; must be a multiple of 90.
    pub fn set_rotate(&self, degrees: i64) -> Result<()> {
        if degrees % 90 != 0 {
            return Err(Error::invalid_operation(format!(
                "page rotation must be a multiple of 90, got {}",
                degrees
            )));
        }
        self.dictionary_mut()?
            .elements_mut()
            .set_integer("/Rotate", degrees.rem_euclid(360));
        Ok(())
    }

    /// Resource dictionary (or reference to it), possibly inherited.
    pub fn resources(&self) -> Result<Option<PdfItem>> {
        self.inherited("/Resources")
    }

    /// Content streams in painting order.
    pub fn contents(&self) -> Result<Vec<PdfReference>> {
        let dictionary = self.dictionary()?;
        let Some(contents) = dictionary.elements().get("/Contents") else {
            return Ok(Vec::new());
        };
        let resolved = contents.resolve()?;
        match &*resolved {
            PdfItem::Array(array) => Ok(array
                .elements()
                .iter()
                .filter_map(PdfItem::as_reference)
                .cloned()
                .collect()),
            PdfItem::Dictionary(_) => Ok(contents.as_reference().cloned().into_iter().collect()),
            PdfItem::Null => Ok(Vec::new()),
            other => Err(Error::invalid_cast("/Contents", "Stream", other.type_name())),
        }
    }

    /// Append a content stream holding `data`.
    pub fn add_content(&self, data: impl Into<Bytes>) -> Result<PdfReference> {
        let document = self.reference.document().upgrade().ok_or_else(|| {
            Error::invalid_operation(format!("document of page {} has been dropped", self.reference))
        })?;
        let mut stream = PdfDictionary::with_kind(DictionaryKind::Content);
        stream.set_stream(data);
        let stream = document.add_object(stream)?;

        let mut contents = self.contents()?;
        let mut page = self.dictionary_mut()?;
        if contents.is_empty() {
            page.elements_mut().set_reference("/Contents", &stream)?;
        } else {
            contents.push(stream.clone());
            let array = PdfArray::from_items(contents.into_iter().map(PdfItem::Reference).collect());
            page.elements_mut().set_value("/Contents", array)?;
        }
        Ok(stream)
    }
}
