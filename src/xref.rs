//! Cross-reference table.
//!
//! The table is the sole authority for object identity inside a document: it
//! maps every [`ObjectId`] to the one [`PdfReference`] slot holding that
//! object, allocates numbers for new indirect objects, and implements
//! compaction (mark and sweep from the document roots) and renumbering.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.5.4 - Cross-Reference Table.

use crate::document::DocumentHandle;
use crate::error::{Error, Result};
use crate::item::PdfItem;
use crate::object_id::{DocumentId, ObjectId};
use crate::reference::PdfReference;
use std::collections::{BTreeMap, HashSet};

/// Registry of the indirect objects of one document.
pub struct CrossReferenceTable {
    document: DocumentHandle,
    entries: BTreeMap<ObjectId, PdfReference>,
    max_object_number: u32,
    // Removed slots still held elsewhere; emptied on teardown so reference
    // cycles among unreachable objects do not outlive the document.
    detached: Vec<PdfReference>,
}

impl CrossReferenceTable {
    pub(crate) fn new(document: DocumentHandle) -> Self {
        Self {
            document,
            entries: BTreeMap::new(),
            max_object_number: 0,
            detached: Vec::new(),
        }
    }

    /// Id of the owning document.
    pub fn document_id(&self) -> DocumentId {
        self.document.id()
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no object is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest object number ever allocated or registered.
    pub fn max_object_number(&self) -> u32 {
        self.max_object_number
    }

    /// Look up an object by id.
    pub fn get(&self, id: ObjectId) -> Option<PdfReference> {
        self.entries.get(&id).cloned()
    }

    /// Whether an object with this id is registered.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.entries.contains_key(&id)
    }

    /// All registered ids in ascending order.
    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.entries.keys().copied().collect()
    }

    /// Snapshot of all references, in ascending id order.
    pub fn all_references(&self) -> Vec<PdfReference> {
        self.entries.values().cloned().collect()
    }

    /// Make a value indirect: attach it to the document and assign the next
    /// free object number.
    pub(crate) fn add(&mut self, mut item: PdfItem) -> Result<PdfReference> {
        Self::check_addable(&item)?;
        item.attach(&self.document)?;
        Ok(self.insert_new(item))
    }

    /// Like [`add`](Self::add) but without attaching. The import engine
    /// registers clones that still hold foreign references and fixes them up
    /// afterwards.
    pub(crate) fn add_detached(&mut self, item: PdfItem) -> Result<PdfReference> {
        Self::check_addable(&item)?;
        Ok(self.insert_new(item))
    }

    fn check_addable(item: &PdfItem) -> Result<()> {
        match item {
            PdfItem::Reference(r) => Err(Error::invalid_operation(format!(
                "{} is already a reference",
                r
            ))),
            item if item.is_indirect() => Err(Error::invalid_operation(
                "object is already indirect",
            )),
            _ => Ok(()),
        }
    }

    pub(crate) fn insert_new(&mut self, item: PdfItem) -> PdfReference {
        self.max_object_number += 1;
        let id = ObjectId::new(self.max_object_number, 0);
        let reference = PdfReference::new(id, self.document.clone(), Some(item));
        self.entries.insert(id, reference.clone());
        log::debug!("Registered {} as object {} R in {}", reference_kind(&reference), id, self.document.id());
        reference
    }

    /// Slot for `id`, created empty when unknown. Lets a loader hand out
    /// references to objects it has not read yet.
    pub(crate) fn placeholder(&mut self, id: ObjectId) -> PdfReference {
        if let Some(existing) = self.entries.get(&id) {
            return existing.clone();
        }
        let reference = PdfReference::new(id, self.document.clone(), None);
        self.max_object_number = self.max_object_number.max(id.number);
        self.entries.insert(id, reference.clone());
        reference
    }

    /// Register a value under a known id (parser path).
    ///
    /// Fills a placeholder created by [`placeholder`](Self::placeholder);
    /// defining an id twice is a corrupt source.
    pub(crate) fn register(
        &mut self,
        id: ObjectId,
        offset: Option<u64>,
        item: PdfItem,
    ) -> Result<PdfReference> {
        if id.is_empty() {
            return Err(Error::corrupt("object number 0 is reserved"));
        }
        Self::check_addable(&item)?;
        let reference = self.placeholder(id);
        if reference.is_resolved() {
            return Err(Error::Corrupt {
                id: Some(id),
                reason: "object defined twice".to_string(),
            });
        }
        reference.replace_value(Some(item))?;
        reference.set_offset(offset);
        log::trace!("Loaded object {} R at offset {:?}", id, offset);
        Ok(reference)
    }

    /// Remove an object from the table. Returns whether it was registered.
    pub fn remove(&mut self, reference: &PdfReference) -> bool {
        let id = reference.object_id();
        match self.entries.get(&id) {
            Some(existing) if PdfReference::ptr_eq(existing, reference) => {
                if let Some(removed) = self.entries.remove(&id) {
                    self.detached.push(removed);
                }
                self.release_detached();
                log::debug!("Removed object {} R", id);
                true
            }
            _ => false,
        }
    }

    /// Remove every object not reachable from `roots`. Returns the number removed.
    ///
    /// Reachability follows references through dictionary values, array
    /// elements and nested direct composites; stream dictionaries are
    /// dictionaries, so their cross links are covered too.
    pub fn compact(&mut self, roots: &[PdfReference]) -> Result<usize> {
        let document = self.document.id();
        let mut walker = ClosureWalker::new(|_: &PdfReference| false);
        for root in roots {
            walker.push(root);
        }
        let reachable: HashSet<ObjectId> = walker
            .run()?
            .iter()
            .filter(|r| r.document_id() == document)
            .map(PdfReference::object_id)
            .collect();

        let before = self.entries.len();
        let detached = &mut self.detached;
        self.entries.retain(|id, reference| {
            if reachable.contains(id) {
                true
            } else {
                detached.push(reference.clone());
                false
            }
        });
        let removed = before - self.entries.len();
        let released = self.release_detached();
        log::debug!(
            "Compacted {}: removed {} of {} objects, released {}",
            document,
            removed,
            before,
            released
        );
        Ok(removed)
    }

    /// Drop detached slots that nothing outside the table holds. Releasing a
    /// value can leave the slots it referenced unheld, so this repeats until
    /// nothing more is released. Returns the number released.
    fn release_detached(&mut self) -> usize {
        let mut released = 0;
        loop {
            let (unheld, held): (Vec<_>, Vec<_>) = std::mem::take(&mut self.detached)
                .into_iter()
                .partition(|reference| reference.handle_count() == 1);
            self.detached = held;
            if unheld.is_empty() {
                return released;
            }
            released += unheld.len();
            for reference in unheld {
                reference.clear();
            }
        }
    }

    /// Renumber all objects `1..=N`, generation 0.
    ///
    /// `first` (conventionally the catalog) gets number 1; the rest keep
    /// their relative order. Every holder of a reference sees the new id.
    pub fn renumber(&mut self, first: Option<&PdfReference>) {
        let mut order = Vec::with_capacity(self.entries.len());
        if let Some(first) = first {
            let registered = self
                .entries
                .get(&first.object_id())
                .is_some_and(|r| PdfReference::ptr_eq(r, first));
            if registered {
                order.push(first.clone());
            }
        }
        for reference in self.entries.values() {
            if order.first() != Some(reference) {
                order.push(reference.clone());
            }
        }

        self.entries.clear();
        for (index, reference) in order.into_iter().enumerate() {
            let id = ObjectId::new(index as u32 + 1, 0);
            reference.set_object_id(id);
            self.entries.insert(id, reference);
        }
        self.max_object_number = self.entries.len() as u32;
        log::debug!(
            "Renumbered {} objects in {}",
            self.max_object_number,
            self.document.id()
        );
    }

    /// Drop every held value so reference cycles are broken.
    pub(crate) fn clear(&mut self) {
        for reference in self.entries.values().chain(self.detached.iter()) {
            reference.clear();
        }
        self.entries.clear();
        self.detached.clear();
    }
}

impl std::fmt::Debug for CrossReferenceTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossReferenceTable")
            .field("document", &self.document.id())
            .field("len", &self.entries.len())
            .field("max_object_number", &self.max_object_number)
            .finish()
    }
}

fn reference_kind(reference: &PdfReference) -> &'static str {
    reference.value().map(|v| v.type_name()).unwrap_or("Null")
}

/// Every indirect object reachable from `root`.
///
/// When `root` is itself a reference it comes first. Direct children are
/// walked but not listed: they travel with their parent. Cycles terminate
/// through a visited set keyed by document and object id.
pub fn transitive_closure(root: &PdfItem) -> Result<Vec<PdfReference>> {
    let mut walker = ClosureWalker::new(|_: &PdfReference| false);
    walker.visit(root);
    walker.run()
}

/// Worklist traversal over the reference graph.
///
/// References for which `stop` returns true are neither listed nor followed.
pub(crate) struct ClosureWalker<F> {
    visited: HashSet<(DocumentId, ObjectId)>,
    order: Vec<PdfReference>,
    pending: Vec<PdfReference>,
    stop: F,
}

impl<F: Fn(&PdfReference) -> bool> ClosureWalker<F> {
    pub(crate) fn new(stop: F) -> Self {
        Self {
            visited: HashSet::new(),
            order: Vec::new(),
            pending: Vec::new(),
            stop,
        }
    }

    pub(crate) fn push(&mut self, reference: &PdfReference) {
        if (self.stop)(reference) {
            return;
        }
        if self
            .visited
            .insert((reference.document_id(), reference.object_id()))
        {
            self.order.push(reference.clone());
            self.pending.push(reference.clone());
        }
    }

    pub(crate) fn visit(&mut self, item: &PdfItem) {
        match item {
            PdfItem::Reference(r) => self.push(r),
            PdfItem::Dictionary(d) => {
                for value in d.elements().values() {
                    self.visit(value);
                }
            }
            PdfItem::Array(a) => {
                for value in a.elements().values() {
                    self.visit(value);
                }
            }
            _ => {}
        }
    }

    /// Follow pending references until the closure is complete.
    ///
    /// Dangling references are listed but have nothing to follow.
    pub(crate) fn run(mut self) -> Result<Vec<PdfReference>> {
        while let Some(reference) = self.pending.pop() {
            match reference.value() {
                Ok(value) => self.visit(&value),
                Err(Error::DanglingReference(id)) => {
                    log::warn!("Dangling reference {} R reached while walking the object graph", id);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(self.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::PdfArray;
    use crate::dictionary::PdfDictionary;
    use crate::document::PdfDocument;

    fn table(doc: &PdfDocument) -> CrossReferenceTable {
        CrossReferenceTable::new(doc.handle())
    }

    #[test]
    fn test_add_allocates_unique_ids() {
        let doc = PdfDocument::new();
        let mut xref = table(&doc);
        let a = xref.add(PdfItem::Integer(1)).unwrap();
        let b = xref.add(PdfItem::Integer(1)).unwrap();
        assert_eq!(a.object_id(), ObjectId::new(1, 0));
        assert_eq!(b.object_id(), ObjectId::new(2, 0));
        assert_eq!(xref.len(), 2);
        assert_eq!(xref.get(a.object_id()), Some(a.clone()));
        assert_eq!(xref.get(a.object_id()), Some(a));
        assert!(xref.get(ObjectId::new(3, 0)).is_none());
    }

    #[test]
    fn test_add_rejects_references() {
        let doc = PdfDocument::new();
        let mut xref = table(&doc);
        let a = xref.add(PdfItem::Integer(1)).unwrap();
        assert!(matches!(
            xref.add(PdfItem::Reference(a)),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_register_fills_placeholder() {
        let doc = PdfDocument::new();
        let mut xref = table(&doc);
        let forward = xref.placeholder(ObjectId::new(5, 0));
        assert!(!forward.is_resolved());
        assert_eq!(xref.max_object_number(), 5);

        let defined = xref
            .register(ObjectId::new(5, 0), Some(120), PdfItem::Integer(9))
            .unwrap();
        assert!(PdfReference::ptr_eq(&forward, &defined));
        assert_eq!(forward.value().unwrap().as_integer(), Some(9));
        assert_eq!(forward.offset(), Some(120));

        assert!(matches!(
            xref.register(ObjectId::new(5, 0), None, PdfItem::Null),
            Err(Error::Corrupt { .. })
        ));
    }

    #[test]
    fn test_remove_requires_same_slot() {
        let doc = PdfDocument::new();
        let other = PdfDocument::new();
        let mut xref = table(&doc);
        let mut foreign = table(&other);
        let a = xref.add(PdfItem::Integer(1)).unwrap();
        let lookalike = foreign.add(PdfItem::Integer(1)).unwrap();
        assert!(!xref.remove(&lookalike));
        assert!(xref.remove(&a));
        assert!(xref.is_empty());
    }

    #[test]
    fn test_compact_removes_unreachable() {
        let doc = PdfDocument::new();
        let mut xref = table(&doc);
        let leaf = xref.add(PdfItem::Integer(1)).unwrap();
        let mut root = PdfDictionary::new();
        root.elements_mut().set_reference("/Leaf", &leaf).unwrap();
        let root = xref.add(PdfItem::Dictionary(root)).unwrap();
        let garbage = xref.add(PdfItem::Integer(2)).unwrap();

        assert_eq!(xref.compact(&[root.clone()]).unwrap(), 1);
        assert!(!xref.contains(garbage.object_id()));
        assert!(xref.contains(leaf.object_id()));
        assert!(xref.contains(root.object_id()));
        assert_eq!(xref.compact(&[root]).unwrap(), 0);
    }

    #[test]
    fn test_compact_releases_unheld_slots() {
        let doc = PdfDocument::new();
        let mut xref = table(&doc);
        let root = xref.add(PdfItem::Dictionary(PdfDictionary::new())).unwrap();
        let kept = xref.add(PdfItem::Integer(1)).unwrap();
        let inner = xref.add(PdfItem::Integer(2)).unwrap();
        let mut outer = PdfDictionary::new();
        outer.elements_mut().set_reference("/Inner", &inner).unwrap();
        xref.add(PdfItem::Dictionary(outer)).unwrap();
        drop(inner);

        assert_eq!(xref.compact(&[root]).unwrap(), 3);
        // outer and then inner are released; kept is still held here
        assert_eq!(xref.detached.len(), 1);
        assert_eq!(kept.value().unwrap().as_integer(), Some(1));
    }

    #[test]
    fn test_compact_terminates_on_cycles() {
        let doc = PdfDocument::new();
        let mut xref = table(&doc);
        let parent = xref.add(PdfItem::Dictionary(PdfDictionary::new())).unwrap();
        let mut child = PdfDictionary::new();
        child.elements_mut().set_reference("/Parent", &parent).unwrap();
        let child = xref.add(PdfItem::Dictionary(child)).unwrap();
        let mut kids = PdfArray::new();
        kids.elements_mut().add(child.clone()).unwrap();
        parent
            .dictionary_mut()
            .unwrap()
            .elements_mut()
            .set_value("/Kids", kids)
            .unwrap();

        assert_eq!(xref.compact(&[parent]).unwrap(), 0);
        assert_eq!(xref.len(), 2);
    }

    #[test]
    fn test_renumber_puts_first_in_front() {
        let doc = PdfDocument::new();
        let mut xref = table(&doc);
        let a = xref.add(PdfItem::Integer(1)).unwrap();
        let b = xref.add(PdfItem::Integer(2)).unwrap();
        let c = xref.add(PdfItem::Integer(3)).unwrap();
        xref.remove(&a);

        xref.renumber(Some(&c));
        assert_eq!(c.object_id(), ObjectId::new(1, 0));
        assert_eq!(b.object_id(), ObjectId::new(2, 0));
        assert_eq!(xref.max_object_number(), 2);
        assert_eq!(xref.object_ids(), vec![ObjectId::new(1, 0), ObjectId::new(2, 0)]);
    }

    #[test]
    fn test_transitive_closure() {
        let doc = PdfDocument::new();
        let mut xref = table(&doc);
        let font = xref.add(PdfItem::Dictionary(PdfDictionary::new())).unwrap();
        let mut fonts = PdfDictionary::new();
        fonts.elements_mut().set_reference("/F1", &font).unwrap();
        let mut resources = PdfDictionary::new();
        resources.elements_mut().set_value("/Font", fonts).unwrap();
        let page = xref.add(PdfItem::Dictionary(resources)).unwrap();
        let _unrelated = xref.add(PdfItem::Integer(0)).unwrap();

        let closure = transitive_closure(&PdfItem::Reference(page.clone())).unwrap();
        assert_eq!(closure, vec![page, font]);
    }
}
