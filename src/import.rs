//! Copying object graphs between documents.
//!
//! Importing a value from a foreign document clones the value together with
//! every indirect object reachable from it, registers the clones in the
//! destination's cross-reference table and rewrites all references so that
//! none of them points back into the foreign document.
//!
//! The work happens in three passes over the closure of the root:
//!
//! 1. enumerate the closure (the root plus every reachable indirect object);
//! 2. clone each object and register the clone under a new local id,
//!    remembering `foreign id -> local reference`;
//! 3. fix up every clone: foreign references are replaced by their local
//!    counterparts and direct children are attached to the destination.
//!
//! [`import_closure`] keeps the `foreign id -> local reference` map in a
//! persistent [`ImportedObjectTable`] so overlapping imports (many pages
//! sharing one font) clone each object only once. [`deep_copy_closure`]
//! always clones afresh.

use crate::document::{DocumentHandle, PdfDocument};
use crate::error::{Error, Result};
use crate::item::PdfItem;
use crate::object_id::{DocumentId, ObjectId};
use crate::reference::PdfReference;
use crate::xref::ClosureWalker;
use std::collections::HashMap;

/// Objects already imported from one foreign document into one destination.
///
/// Entries are keyed by the foreign slot, so renumbering or removing objects
/// in the source never redirects a lookup to another object's clone.
#[derive(Debug)]
pub struct ImportedObjectTable {
    owner: DocumentId,
    external: DocumentId,
    map: HashMap<PdfReference, PdfReference>,
}

impl ImportedObjectTable {
    /// Create an empty table for imports from `external` into `owner`.
    pub fn new(owner: &PdfDocument, external: &PdfDocument) -> Self {
        Self {
            owner: owner.id(),
            external: external.id(),
            map: HashMap::new(),
        }
    }

    /// Destination document.
    pub fn owner_id(&self) -> DocumentId {
        self.owner
    }

    /// Source document.
    pub fn external_id(&self) -> DocumentId {
        self.external
    }

    /// Local counterpart of the foreign object currently numbered `external`.
    pub fn get(&self, external: ObjectId) -> Option<PdfReference> {
        self.map
            .iter()
            .find(|(foreign, _)| foreign.object_id() == external)
            .map(|(_, local)| local.clone())
    }

    /// Local counterpart of a foreign object, if already imported.
    pub fn get_reference(&self, external: &PdfReference) -> Option<PdfReference> {
        self.map.get(external).cloned()
    }

    /// Whether a foreign object has already been imported.
    pub fn contains(&self, external: &PdfReference) -> bool {
        self.map.contains_key(external)
    }

    /// Record the local counterpart of a foreign object.
    pub fn insert(&mut self, external: PdfReference, local: PdfReference) -> Option<PdfReference> {
        self.map.insert(external, local)
    }

    /// Forget the local counterpart of a foreign object.
    pub fn remove(&mut self, external: &PdfReference) -> Option<PdfReference> {
        self.map.remove(external)
    }

    /// Drop entries whose local object is no longer registered in `owner`
    /// (removed, or compacted away). Returns the number dropped.
    pub fn retain_live(&mut self, owner: &PdfDocument) -> Result<usize> {
        let xref = owner.xref()?;
        let before = self.map.len();
        self.map.retain(|_, local| {
            xref.get(local.object_id())
                .is_some_and(|registered| PdfReference::ptr_eq(&registered, local))
        });
        let dropped = before - self.map.len();
        if dropped > 0 {
            log::debug!(
                "Forgot {} imports from {} no longer present in {}",
                dropped,
                self.external,
                self.owner
            );
        }
        Ok(dropped)
    }

    /// Number of imported objects.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether nothing has been imported yet.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Import tables of one destination, one per source document.
#[derive(Debug, Default)]
pub struct ImportContext {
    tables: HashMap<DocumentId, ImportedObjectTable>,
}

impl ImportContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table for imports from `external` into `owner`, created on first use.
    pub fn table_for(
        &mut self,
        owner: &PdfDocument,
        external: &PdfDocument,
    ) -> Result<&mut ImportedObjectTable> {
        let table = self
            .tables
            .entry(external.id())
            .or_insert_with(|| ImportedObjectTable::new(owner, external));
        if table.owner != owner.id() {
            return Err(Error::invalid_operation(format!(
                "import context belongs to {}, not {}",
                table.owner,
                owner.id()
            )));
        }
        Ok(table)
    }

    /// Existing table for a source document.
    pub fn get(&self, external: DocumentId) -> Option<&ImportedObjectTable> {
        self.tables.get(&external)
    }

    /// Existing table for a source document, mutably.
    pub fn get_mut(&mut self, external: DocumentId) -> Option<&mut ImportedObjectTable> {
        self.tables.get_mut(&external)
    }

    /// Forget the table of a source document.
    pub fn remove(&mut self, external: DocumentId) -> Option<ImportedObjectTable> {
        self.tables.remove(&external)
    }
}

/// Clone `root` and its closure into `owner`, always creating fresh copies.
///
/// Returns the local root: a reference when `root` is a reference, otherwise
/// the attached direct copy.
pub fn deep_copy_closure(owner: &PdfDocument, root: &PdfItem) -> Result<PdfItem> {
    let external = external_document(owner, root)?;
    let mut scratch = ImportedObjectTable {
        owner: owner.id(),
        external,
        map: HashMap::new(),
    };
    copy_closure(&mut scratch, owner, root, false)
}

/// Clone `root` and its closure into `owner`, reusing objects recorded in `table`.
///
/// Importing the same foreign root twice returns the same local reference
/// without cloning anything.
pub fn import_closure(
    table: &mut ImportedObjectTable,
    owner: &PdfDocument,
    root: &PdfItem,
) -> Result<PdfItem> {
    if table.owner != owner.id() {
        return Err(Error::invalid_operation(format!(
            "import table belongs to {}, not {}",
            table.owner,
            owner.id()
        )));
    }
    if let Some(external) = foreign_document_of(root) {
        if external != table.external {
            return Err(Error::invalid_operation(format!(
                "import table is for {}, root belongs to {}",
                table.external, external
            )));
        }
    }
    copy_closure(table, owner, root, true)
}

/// Document a root value comes from, judged by the first reference it holds.
fn foreign_document_of(item: &PdfItem) -> Option<DocumentId> {
    match item {
        PdfItem::Reference(r) => Some(r.document_id()),
        PdfItem::Dictionary(d) => d.elements().values().find_map(foreign_document_of),
        PdfItem::Array(a) => a.elements().values().find_map(foreign_document_of),
        _ => None,
    }
}

fn external_document(owner: &PdfDocument, root: &PdfItem) -> Result<DocumentId> {
    match foreign_document_of(root) {
        Some(external) if external == owner.id() => Err(Error::invalid_operation(format!(
            "{} already belongs to the destination document",
            root.type_name()
        ))),
        Some(external) => Ok(external),
        // Nothing indirect: the copy is self-contained.
        None => Ok(owner.id()),
    }
}

fn copy_closure(
    table: &mut ImportedObjectTable,
    owner: &PdfDocument,
    root: &PdfItem,
    dedup: bool,
) -> Result<PdfItem> {
    if table.external == owner.id() && foreign_document_of(root).is_some() {
        return Err(Error::invalid_operation(
            "cannot import an object into its own document",
        ));
    }
    if dedup {
        table.retain_live(owner)?;
        if let PdfItem::Reference(r) = root {
            if let Some(local) = table.get_reference(r) {
                log::debug!("{} R already imported as {}", r.object_id(), local);
                return Ok(PdfItem::Reference(local));
            }
        }
    }

    // Pass 1: closure. Already imported objects are not followed.
    let closure = {
        let known = &*table;
        let mut walker = ClosureWalker::new(|r: &PdfReference| dedup && known.contains(r));
        walker.visit(root);
        walker.run()?
    };

    let handle = owner.handle();
    let mut cloned: Vec<(PdfReference, PdfReference)> = Vec::with_capacity(closure.len());
    let outcome = clone_closure(&closure, table, owner, &mut cloned).and_then(|()| {
        // Pass 3: fix up references and ownership.
        for (_, local) in &cloned {
            let mut value = local.value_mut()?;
            fix_up(&mut value, table, &handle)?;
        }
        match root {
            PdfItem::Reference(r) => table
                .get_reference(r)
                .map(PdfItem::Reference)
                .ok_or_else(|| Error::invalid_operation(format!("root {} was not imported", r))),
            direct => {
                let mut copy = direct.clone();
                fix_up(&mut copy, table, &handle)?;
                Ok(copy)
            }
        }
    });

    if outcome.is_err() && !cloned.is_empty() {
        log::debug!("Import into {} failed, dropping {} clones", owner.id(), cloned.len());
        let mut xref = owner.xref_mut()?;
        for (external, local) in &cloned {
            xref.remove(local);
            table.map.remove(external);
        }
    }
    outcome
}

/// Pass 2: clone every closure member and register the clone locally.
fn clone_closure(
    closure: &[PdfReference],
    table: &mut ImportedObjectTable,
    owner: &PdfDocument,
    cloned: &mut Vec<(PdfReference, PdfReference)>,
) -> Result<()> {
    let mut xref = owner.xref_mut()?;
    for external in closure {
        if external.document_id() != table.external {
            return Err(Error::invalid_operation(format!(
                "object {} of {} reached while importing from {}",
                external,
                external.document_id(),
                table.external
            )));
        }
        let value = external.value()?;
        if value.is_indirect() && owner_of(&value).is_none() {
            return Err(Error::invalid_operation(format!(
                "foreign object {} has no owning document",
                external
            )));
        }
        let local = xref.add_detached((*value).clone())?;
        table.insert(external.clone(), local.clone());
        cloned.push((external.clone(), local));
    }
    log::debug!(
        "Import into {}: cloned {} objects from {}",
        owner.id(),
        cloned.len(),
        table.external
    );
    Ok(())
}

fn owner_of(item: &PdfItem) -> Option<DocumentId> {
    match item {
        PdfItem::Dictionary(d) => d.owner_id(),
        PdfItem::Array(a) => a.owner_id(),
        _ => None,
    }
}

/// Replace foreign references by local ones and attach direct composites.
fn fix_up(item: &mut PdfItem, table: &ImportedObjectTable, owner: &DocumentHandle) -> Result<()> {
    match item {
        PdfItem::Reference(r) if r.document_id() == owner.id() => Ok(()),
        PdfItem::Reference(r) if r.document_id() == table.external => {
            let local = table.get_reference(r).ok_or_else(|| {
                Error::invalid_operation(format!("{} missing from the import closure", r))
            })?;
            *item = PdfItem::Reference(local);
            Ok(())
        }
        PdfItem::Reference(r) => Err(Error::invalid_operation(format!(
            "{} belongs to {}, expected {}",
            r,
            r.document_id(),
            table.external
        ))),
        PdfItem::Dictionary(d) => {
            d.elements_mut().set_owner(owner)?;
            for value in d.elements_mut().values_mut() {
                fix_up(value, table, owner)?;
            }
            Ok(())
        }
        PdfItem::Array(a) => {
            a.elements_mut().set_owner(owner)?;
            for value in a.elements_mut().values_mut() {
                fix_up(value, table, owner)?;
            }
            Ok(())
        }
        PdfItem::Null
        | PdfItem::Boolean(_)
        | PdfItem::Integer(_)
        | PdfItem::Real(_)
        | PdfItem::String(_)
        | PdfItem::Name(_)
        | PdfItem::Rectangle(_)
        | PdfItem::Literal(_) => Ok(()),
    }
}
