//! Indirect references.
//!
//! A [`PdfReference`] is a shared handle to one indirect object slot of a
//! document. The slot holds the object's id, its byte offset in the source
//! file (if parsed), the owning document and the value itself. All holders of
//! the same handle see renumbering and value replacement, so identity is the
//! slot, not the id: two handles are equal exactly when they point to the
//! same slot.

use crate::array::PdfArray;
use crate::dictionary::PdfDictionary;
use crate::document::DocumentHandle;
use crate::error::{Error, Result};
use crate::item::PdfItem;
use crate::object_id::{DocumentId, ObjectId};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

pub(crate) struct ReferenceCell {
    id: Cell<ObjectId>,
    offset: Cell<Option<u64>>,
    document: DocumentHandle,
    value: RefCell<Option<PdfItem>>,
}

/// Handle to an indirect object.
#[derive(Clone)]
pub struct PdfReference(Rc<ReferenceCell>);

impl PdfReference {
    pub(crate) fn new(id: ObjectId, document: DocumentHandle, value: Option<PdfItem>) -> Self {
        let reference = PdfReference(Rc::new(ReferenceCell {
            id: Cell::new(id),
            offset: Cell::new(None),
            document,
            value: RefCell::new(None),
        }));
        if let Some(mut value) = value {
            value.set_back_reference(Some(reference.downgrade()));
            *reference.0.value.borrow_mut() = Some(value);
        }
        reference
    }

    /// Id of the referenced object. Changes when the owning table is renumbered.
    pub fn object_id(&self) -> ObjectId {
        self.0.id.get()
    }

    pub(crate) fn set_object_id(&self, id: ObjectId) {
        self.0.id.set(id);
    }

    /// Id of the document whose table holds this slot.
    pub fn document_id(&self) -> DocumentId {
        self.0.document.id()
    }

    pub(crate) fn document(&self) -> &DocumentHandle {
        &self.0.document
    }

    /// Byte offset of the object in its source file, or of its last write.
    pub fn offset(&self) -> Option<u64> {
        self.0.offset.get()
    }

    pub(crate) fn set_offset(&self, offset: Option<u64>) {
        self.0.offset.set(offset);
    }

    /// Whether the slot holds a value.
    pub fn is_resolved(&self) -> bool {
        self.0.value.try_borrow().map(|v| v.is_some()).unwrap_or(true)
    }

    /// Whether the referenced value is `null` (or missing).
    pub fn is_null_target(&self) -> bool {
        match self.0.value.try_borrow() {
            Ok(value) => matches!(&*value, None | Some(PdfItem::Null)),
            Err(_) => false,
        }
    }

    /// Borrow the referenced value.
    pub fn value(&self) -> Result<Ref<'_, PdfItem>> {
        let id = self.object_id();
        let value = self
            .0
            .value
            .try_borrow()
            .map_err(|_| Error::ObjectBorrowed(id))?;
        Ref::filter_map(value, Option::as_ref).map_err(|_| Error::DanglingReference(id))
    }

    /// Mutably borrow the referenced value.
    pub fn value_mut(&self) -> Result<RefMut<'_, PdfItem>> {
        let id = self.object_id();
        let value = self
            .0
            .value
            .try_borrow_mut()
            .map_err(|_| Error::ObjectBorrowed(id))?;
        RefMut::filter_map(value, Option::as_mut).map_err(|_| Error::DanglingReference(id))
    }

    /// Borrow the referenced value as a dictionary.
    pub fn dictionary(&self) -> Result<Ref<'_, PdfDictionary>> {
        let key = self.to_string();
        Ref::filter_map(self.value()?, PdfItem::as_dictionary)
            .map_err(|item| cast_error(key, "Dictionary", &item))
    }

    /// Mutably borrow the referenced value as a dictionary.
    pub fn dictionary_mut(&self) -> Result<RefMut<'_, PdfDictionary>> {
        let key = self.to_string();
        RefMut::filter_map(self.value_mut()?, PdfItem::as_dictionary_mut)
            .map_err(|item| cast_error(key, "Dictionary", &item))
    }

    /// Borrow the referenced value as an array.
    pub fn array(&self) -> Result<Ref<'_, PdfArray>> {
        let key = self.to_string();
        Ref::filter_map(self.value()?, PdfItem::as_array)
            .map_err(|item| cast_error(key, "Array", &item))
    }

    /// Mutably borrow the referenced value as an array.
    pub fn array_mut(&self) -> Result<RefMut<'_, PdfArray>> {
        let key = self.to_string();
        RefMut::filter_map(self.value_mut()?, PdfItem::as_array_mut)
            .map_err(|item| cast_error(key, "Array", &item))
    }

    /// Replace the value held by the slot. Returns the previous value.
    pub(crate) fn replace_value(&self, value: Option<PdfItem>) -> Result<Option<PdfItem>> {
        let mut slot = self
            .0
            .value
            .try_borrow_mut()
            .map_err(|_| Error::ObjectBorrowed(self.object_id()))?;
        let value = value.map(|mut v| {
            v.set_back_reference(Some(self.downgrade()));
            v
        });
        let mut previous = std::mem::replace(&mut *slot, value);
        if let Some(previous) = previous.as_mut() {
            previous.set_back_reference(None);
        }
        Ok(previous)
    }

    /// Drop the value without touching back references. Used on document teardown.
    pub(crate) fn clear(&self) {
        if let Ok(mut slot) = self.0.value.try_borrow_mut() {
            slot.take();
        }
    }

    /// Whether both handles point to the same slot.
    pub fn ptr_eq(a: &PdfReference, b: &PdfReference) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Number of handles to this slot.
    pub(crate) fn handle_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub(crate) fn downgrade(&self) -> WeakReference {
        WeakReference(Rc::downgrade(&self.0))
    }
}

fn cast_error(key: String, expected: &'static str, found: &PdfItem) -> Error {
    Error::invalid_cast(key, expected, found.type_name())
}

impl PartialEq for PdfReference {
    fn eq(&self, other: &Self) -> bool {
        PdfReference::ptr_eq(self, other)
    }
}

impl Eq for PdfReference {}

impl Hash for PdfReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0), state);
    }
}

impl fmt::Display for PdfReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} R", self.object_id())
    }
}

impl fmt::Debug for PdfReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PdfReference({} R, {})", self.object_id(), self.document_id())
    }
}

/// Back pointer from an indirect composite to its slot.
#[derive(Clone)]
pub(crate) struct WeakReference(Weak<ReferenceCell>);

impl WeakReference {
    pub(crate) fn upgrade(&self) -> Option<PdfReference> {
        self.0.upgrade().map(PdfReference)
    }
}

impl fmt::Debug for WeakReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(reference) => write!(f, "WeakReference({})", reference),
            None => f.write_str("WeakReference(<gone>)"),
        }
    }
}
