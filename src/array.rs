//! Arrays and their element access layer.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.3.6 - Array Objects.

use crate::dictionary::CreateOptions;
use crate::document::DocumentHandle;
use crate::error::{Error, Result};
use crate::item::{ItemMut, ItemRef, PdfItem};
use crate::meta::{ArrayKind, ArrayMeta};
use crate::object_id::{DocumentId, ObjectId};
use crate::primitives::{PdfMatrix, PdfRectangle};
use crate::reference::{PdfReference, WeakReference};
use std::fmt;

/// Ordered element store of an array.
pub struct ArrayElements {
    items: Vec<PdfItem>,
    meta: &'static ArrayMeta,
    owner: Option<DocumentHandle>,
}

impl ArrayElements {
    /// Schema of the owning array.
    pub fn meta(&self) -> &'static ArrayMeta {
        self.meta
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the array is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Elements in order, unresolved.
    pub fn iter(&self) -> std::slice::Iter<'_, PdfItem> {
        self.items.iter()
    }

    /// Raw element, without following references.
    pub fn get(&self, index: usize) -> Option<&PdfItem> {
        self.items.get(index)
    }

    /// Element with references followed.
    pub fn get_object(&self, index: usize) -> Result<ItemRef<'_>> {
        self.checked(index)?.resolve()
    }

    /// The reference at `index`, if the element is indirect.
    pub fn get_reference(&self, index: usize) -> Option<PdfReference> {
        self.get(index).and_then(PdfItem::as_reference).cloned()
    }

    /// Id of the owning document, if attached.
    pub fn owner_id(&self) -> Option<DocumentId> {
        self.owner.as_ref().map(DocumentHandle::id)
    }

    fn checked(&self, index: usize) -> Result<&PdfItem> {
        self.items.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    fn storable(&self, item: impl Into<PdfItem>) -> Result<PdfItem> {
        let mut item = item.into().into_storable();
        if let Some(owner) = &self.owner {
            item.attach(owner)?;
        }
        Ok(item)
    }

    /// Append an element. Indirect composites are stored as their reference.
    pub fn add(&mut self, item: impl Into<PdfItem>) -> Result<()> {
        let item = self.storable(item)?;
        self.items.push(item);
        Ok(())
    }

    /// Insert an element at `index` (`index == len` appends).
    pub fn insert(&mut self, index: usize, item: impl Into<PdfItem>) -> Result<()> {
        if index > self.items.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        let item = self.storable(item)?;
        self.items.insert(index, item);
        Ok(())
    }

    /// Replace the element at `index`.
    pub fn set(&mut self, index: usize, item: impl Into<PdfItem>) -> Result<()> {
        self.checked(index)?;
        let item = self.storable(item)?;
        self.items[index] = item;
        Ok(())
    }

    /// Remove and return the element at `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<PdfItem> {
        self.checked(index)?;
        Ok(self.items.remove(index))
    }

    /// Position of the first element equal to `item`. References compare by identity.
    pub fn index_of(&self, item: &PdfItem) -> Option<usize> {
        self.items.iter().position(|i| i == item)
    }

    /// Whether an element equal to `item` is present.
    pub fn contains(&self, item: &PdfItem) -> bool {
        self.index_of(item).is_some()
    }

    /// Remove all elements.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn present(&self, index: usize) -> Result<Option<ItemRef<'_>>> {
        let item = self.checked(index)?.resolve()?;
        if item.is_null() {
            Ok(None)
        } else {
            Ok(Some(item))
        }
    }

    /// Get a boolean element, `false` when `null`.
    pub fn get_boolean(&self, index: usize) -> Result<bool> {
        match self.present(index)? {
            None => Ok(false),
            Some(item) => item
                .as_bool()
                .ok_or_else(|| Error::invalid_cast(format!("[{}]", index), "Boolean", item.type_name())),
        }
    }

    /// Get an integer element, `0` when `null`.
    pub fn get_integer(&self, index: usize) -> Result<i64> {
        match self.present(index)? {
            None => Ok(0),
            Some(item) => item
                .as_integer()
                .ok_or_else(|| Error::invalid_cast(format!("[{}]", index), "Integer", item.type_name())),
        }
    }

    /// Get a numeric element, `0.0` when `null`. Integers are widened.
    pub fn get_real(&self, index: usize) -> Result<f64> {
        match self.present(index)? {
            None => Ok(0.0),
            Some(item) => item
                .as_real()
                .ok_or_else(|| Error::invalid_cast(format!("[{}]", index), "Real", item.type_name())),
        }
    }

    /// Get a name element (with leading `/`), empty when `null`.
    pub fn get_name(&self, index: usize) -> Result<String> {
        match self.present(index)? {
            None => Ok(String::new()),
            Some(item) => item
                .as_name()
                .map(|n| n.as_str().to_string())
                .ok_or_else(|| Error::invalid_cast(format!("[{}]", index), "Name", item.type_name())),
        }
    }

    /// Get a string element decoded as text, empty when `null`.
    pub fn get_string(&self, index: usize) -> Result<String> {
        match self.present(index)? {
            None => Ok(String::new()),
            Some(item) => item
                .as_string()
                .map(|s| s.to_text())
                .ok_or_else(|| Error::invalid_cast(format!("[{}]", index), "String", item.type_name())),
        }
    }

    /// Get an element, optionally creating it, upgraded to the declared element kind.
    ///
    /// `index` must be in range. A `null` element is replaced by an empty
    /// value of the declared element type when creation is requested.
    pub fn get_value(&mut self, index: usize, options: CreateOptions) -> Result<Option<ItemMut<'_>>> {
        let declared = self.meta.element_type();
        let null_equivalent = match self.checked(index)? {
            PdfItem::Null => true,
            PdfItem::Reference(r) => r.value()?.is_null(),
            _ => false,
        };

        if null_equivalent {
            if options == CreateOptions::None {
                return Ok(None);
            }
            let key = format!("[{}]", index);
            let value_type = declared.ok_or_else(|| {
                Error::NotImplemented(format!("cannot create element {} of {:?} array", key, self.meta.kind()))
            })?;
            let mut value = PdfItem::create_empty(value_type, &key)?;
            let stored = if options == CreateOptions::CreateIndirect {
                let document = self
                    .owner
                    .as_ref()
                    .and_then(DocumentHandle::upgrade)
                    .ok_or_else(|| {
                        Error::invalid_operation(format!(
                            "cannot create indirect {}: array is not attached to a document",
                            key
                        ))
                    })?;
                PdfItem::Reference(document.add_object(value)?)
            } else {
                if let Some(owner) = &self.owner {
                    value.attach(owner)?;
                }
                value
            };
            self.items[index] = stored;
        } else if let Some(value_type) = declared {
            match &mut self.items[index] {
                PdfItem::Reference(r) => r.value_mut()?.transform_to(value_type),
                item => item.transform_to(value_type),
            }
        }

        Ok(Some(match &mut self.items[index] {
            PdfItem::Reference(r) => ItemMut::Indirect(r.value_mut()?),
            item => ItemMut::Direct(item),
        }))
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &PdfItem> {
        self.items.iter()
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut PdfItem> {
        self.items.iter_mut()
    }

    pub(crate) fn attach(&mut self, document: &DocumentHandle) -> Result<()> {
        match &self.owner {
            Some(owner) if owner.id() == document.id() => return Ok(()),
            Some(_) => return Err(Error::AlreadyAttached),
            None => {}
        }
        for item in self.items.iter_mut() {
            item.attach(document)?;
        }
        self.owner = Some(document.clone());
        Ok(())
    }

    pub(crate) fn set_owner(&mut self, document: &DocumentHandle) -> Result<()> {
        match &self.owner {
            Some(owner) if owner.id() != document.id() => Err(Error::AlreadyAttached),
            _ => {
                self.owner = Some(document.clone());
                Ok(())
            }
        }
    }
}

impl Clone for ArrayElements {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            meta: self.meta,
            owner: None,
        }
    }
}

impl PartialEq for ArrayElements {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl fmt::Debug for ArrayElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

/// A PDF array.
pub struct PdfArray {
    elements: ArrayElements,
    reference: Option<WeakReference>,
}

impl PdfArray {
    /// Create an empty generic array.
    pub fn new() -> Self {
        Self::with_kind(ArrayKind::Generic)
    }

    /// Create an empty array of a kind.
    pub fn with_kind(kind: ArrayKind) -> Self {
        Self {
            elements: ArrayElements {
                items: Vec::new(),
                meta: kind.meta(),
                owner: None,
            },
            reference: None,
        }
    }

    /// Create a generic array from items.
    pub fn from_items(items: Vec<PdfItem>) -> Self {
        let mut array = Self::new();
        array.elements.items = items.into_iter().map(PdfItem::into_storable).collect();
        array
    }

    /// Kind this array is viewed as.
    pub fn kind(&self) -> ArrayKind {
        self.elements.meta.kind()
    }

    /// The element store.
    pub fn elements(&self) -> &ArrayElements {
        &self.elements
    }

    /// The mutable element store.
    pub fn elements_mut(&mut self) -> &mut ArrayElements {
        &mut self.elements
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the array is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Id of the owning document, if attached.
    pub fn owner_id(&self) -> Option<DocumentId> {
        self.elements.owner_id()
    }

    /// Whether this array is an indirect object.
    pub fn is_indirect(&self) -> bool {
        self.reference.is_some()
    }

    /// The slot holding this array, if indirect.
    pub fn reference(&self) -> Option<PdfReference> {
        self.reference.as_ref().and_then(WeakReference::upgrade)
    }

    /// Object id, or [`ObjectId::EMPTY`] for direct arrays.
    pub fn object_id(&self) -> ObjectId {
        self.reference()
            .map(|r| r.object_id())
            .unwrap_or(ObjectId::EMPTY)
    }

    /// View the same storage as another kind. Nothing is copied.
    pub fn transform(self, kind: ArrayKind) -> PdfArray {
        if self.kind() == kind {
            return self;
        }
        log::debug!(
            "Transforming {:?} array {} to {:?}",
            self.kind(),
            self.object_id(),
            kind
        );
        let PdfArray {
            mut elements,
            reference,
        } = self;
        elements.meta = kind.meta();
        PdfArray {
            elements,
            reference,
        }
    }

    /// Read a four-number array as a rectangle.
    pub fn to_rectangle(&self) -> Result<PdfRectangle> {
        let [x1, y1, x2, y2] = self.numbers::<4>("rectangle")?;
        Ok(PdfRectangle::new(x1, y1, x2, y2))
    }

    /// Read a six-number array as a matrix.
    pub fn to_matrix(&self) -> Result<PdfMatrix> {
        Ok(PdfMatrix(self.numbers::<6>("matrix")?))
    }

    fn numbers<const N: usize>(&self, what: &str) -> Result<[f64; N]> {
        let corrupt = |reason: String| Error::Corrupt {
            id: Some(self.object_id()).filter(|id| !id.is_empty()),
            reason,
        };
        if self.len() != N {
            return Err(corrupt(format!(
                "{} needs {} numbers, array has {} elements",
                what,
                N,
                self.len()
            )));
        }
        let mut values = [0.0; N];
        for (i, item) in self.elements.iter().enumerate() {
            let item = item.resolve()?;
            values[i] = item.as_real().ok_or_else(|| {
                corrupt(format!("{} element {} is a {}", what, i, item.type_name()))
            })?;
        }
        Ok(values)
    }

    /// Attach to a document unless already owned. Only for freshly built arrays.
    pub(crate) fn adopt(&mut self, owner: Option<&DocumentHandle>) {
        if self.elements.owner.is_none() {
            self.elements.owner = owner.cloned();
        }
    }

    pub(crate) fn attach(&mut self, document: &DocumentHandle) -> Result<()> {
        self.elements.attach(document)
    }

    pub(crate) fn set_back_reference(&mut self, reference: Option<WeakReference>) {
        self.reference = reference;
    }
}

impl Default for PdfArray {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PdfArray {
    /// A detached copy; references stay shared.
    fn clone(&self) -> Self {
        Self {
            elements: self.elements.clone(),
            reference: None,
        }
    }
}

impl PartialEq for PdfArray {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl fmt::Debug for PdfArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(reference) = self.reference() {
            write!(f, "PdfArray<{:?}, {}>", self.kind(), reference)?;
        } else {
            write!(f, "PdfArray<{:?}>", self.kind())?;
        }
        fmt::Debug::fmt(&self.elements, f)
    }
}

impl From<PdfRectangle> for PdfArray {
    fn from(rect: PdfRectangle) -> Self {
        PdfArray::from_items(rect.to_array().iter().map(|&v| PdfItem::Real(v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::PdfDictionary;
    use crate::document::PdfDocument;
    use crate::meta::DictionaryKind;
    use crate::primitives::PdfName;

    #[test]
    fn test_list_operations() {
        let mut array = PdfArray::new();
        array.elements_mut().add(1).unwrap();
        array.elements_mut().add(3).unwrap();
        array.elements_mut().insert(1, 2).unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array.elements().get_integer(1).unwrap(), 2);
        assert_eq!(array.elements().index_of(&PdfItem::Integer(3)), Some(2));
        assert!(array.elements().contains(&PdfItem::Integer(1)));

        assert_eq!(array.elements_mut().remove_at(0).unwrap(), PdfItem::Integer(1));
        assert_eq!(array.elements().index_of(&PdfItem::Integer(1)), None);
        assert!(matches!(
            array.elements_mut().remove_at(5),
            Err(Error::IndexOutOfRange { index: 5, len: 2 })
        ));
        assert!(array.elements_mut().insert(3, 0).is_err());
        array.elements_mut().insert(2, 0).unwrap();
    }

    #[test]
    fn test_typed_getters() {
        let array = PdfArray::from_items(vec![
            true.into(),
            PdfItem::Null,
            2.5.into(),
            PdfName::new("F1").into(),
        ]);
        assert!(array.elements().get_boolean(0).unwrap());
        assert_eq!(array.elements().get_integer(1).unwrap(), 0);
        assert_eq!(array.elements().get_real(2).unwrap(), 2.5);
        assert_eq!(array.elements().get_name(3).unwrap(), "/F1");
        assert!(matches!(
            array.elements().get_integer(3),
            Err(Error::InvalidCast { expected: "Integer", found: "Name", .. })
        ));
        assert!(matches!(
            array.elements().get_integer(4),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_index_of_compares_references_by_identity() {
        let doc = PdfDocument::new();
        let a = doc.add_object(PdfItem::Integer(1)).unwrap();
        let b = doc.add_object(PdfItem::Integer(1)).unwrap();
        let mut array = PdfArray::new();
        array.elements_mut().add(a.clone()).unwrap();
        array.elements_mut().add(b.clone()).unwrap();
        assert_eq!(array.elements().index_of(&PdfItem::Reference(b)), Some(1));
        assert_eq!(array.elements().get_reference(0), Some(a));
    }

    #[test]
    fn test_get_value_upgrades_elements() {
        let doc = PdfDocument::new();
        let annotation = doc.add_object(PdfDictionary::new()).unwrap();
        let mut annots = PdfArray::with_kind(ArrayKind::Annotations);
        annots.elements_mut().add(annotation.clone()).unwrap();
        annots.elements_mut().add(PdfItem::Null).unwrap();

        annots.elements_mut().get_value(0, CreateOptions::None).unwrap();
        assert_eq!(annotation.dictionary().unwrap().kind(), DictionaryKind::Annotation);

        assert!(annots.elements_mut().get_value(1, CreateOptions::None).unwrap().is_none());
        let created = annots
            .elements_mut()
            .get_value(1, CreateOptions::Create)
            .unwrap()
            .unwrap();
        assert_eq!(created.as_dictionary().unwrap().kind(), DictionaryKind::Annotation);
    }

    #[test]
    fn test_get_value_generic_cannot_create() {
        let mut array = PdfArray::from_items(vec![PdfItem::Null]);
        assert!(matches!(
            array.elements_mut().get_value(0, CreateOptions::Create),
            Err(Error::NotImplemented(_))
        ));
        assert!(matches!(
            array.elements_mut().get_value(1, CreateOptions::Create),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_rectangle_and_matrix() {
        let array = PdfArray::from(PdfRectangle::new(0.0, 0.0, 595.0, 842.0));
        assert_eq!(array.to_rectangle().unwrap().height(), 842.0);
        assert!(matches!(array.to_matrix(), Err(Error::Corrupt { .. })));

        let bad = PdfArray::from_items(vec![0.into(), 0.into(), PdfName::new("X").into(), 1.into()]);
        assert!(matches!(bad.to_rectangle(), Err(Error::Corrupt { .. })));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut inner = PdfArray::new();
        inner.elements_mut().add(1).unwrap();
        let mut array = PdfArray::new();
        array.elements_mut().add(inner).unwrap();

        let mut copy = array.clone();
        assert_eq!(copy, array);
        copy.elements_mut().add(2).unwrap();
        assert_eq!(array.len(), 1);
    }

    #[test]
    fn test_transform_keeps_elements() {
        let array = PdfArray::from_items(vec![1.into(), 2.into()]);
        let kids = array.transform(ArrayKind::Kids);
        assert_eq!(kids.kind(), ArrayKind::Kids);
        assert_eq!(kids.len(), 2);
        let same = kids.transform(ArrayKind::Kids);
        assert_eq!(same.kind(), ArrayKind::Kids);
    }
}
