//! The PDF value type.
//!
//! [`PdfItem`] is the sum of every value that can appear in a PDF object
//! graph. Scalars are stored inline; dictionaries and arrays are composites
//! that may be direct (owned by their container) or indirect (held by a
//! document's cross-reference table and reached through a [`PdfReference`]).

use crate::array::PdfArray;
use crate::dictionary::PdfDictionary;
use crate::document::DocumentHandle;
use crate::error::{Error, Result};
use crate::meta::ValueType;
use crate::primitives::{PdfLiteral, PdfName, PdfRectangle, PdfString};
use crate::reference::{PdfReference, WeakReference};
use std::cell::{Ref, RefMut};
use std::ops::{Deref, DerefMut};

/// A PDF value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PdfItem {
    /// The `null` object
    #[default]
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real value
    Real(f64),
    /// String value
    String(PdfString),
    /// Name value
    Name(PdfName),
    /// Rectangle, written as a four element array
    Rectangle(PdfRectangle),
    /// Raw PDF syntax, written verbatim
    Literal(PdfLiteral),
    /// Array
    Array(PdfArray),
    /// Dictionary, possibly with a stream
    Dictionary(PdfDictionary),
    /// Indirect reference
    Reference(PdfReference),
}

impl PdfItem {
    /// Name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PdfItem::Null => "Null",
            PdfItem::Boolean(_) => "Boolean",
            PdfItem::Integer(_) => "Integer",
            PdfItem::Real(_) => "Real",
            PdfItem::String(_) => "String",
            PdfItem::Name(_) => "Name",
            PdfItem::Rectangle(_) => "Rectangle",
            PdfItem::Literal(_) => "Literal",
            PdfItem::Array(_) => "Array",
            PdfItem::Dictionary(d) if d.has_stream() => "Stream",
            PdfItem::Dictionary(_) => "Dictionary",
            PdfItem::Reference(_) => "Reference",
        }
    }

    /// Whether this is `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, PdfItem::Null)
    }

    /// Whether this is a composite held by a document table.
    pub fn is_indirect(&self) -> bool {
        match self {
            PdfItem::Dictionary(d) => d.is_indirect(),
            PdfItem::Array(a) => a.is_indirect(),
            _ => false,
        }
    }

    /// Get as boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PdfItem::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PdfItem::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a number, widening integers.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            PdfItem::Integer(i) => Some(*i as f64),
            PdfItem::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Get as name.
    pub fn as_name(&self) -> Option<&PdfName> {
        match self {
            PdfItem::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Get as string.
    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            PdfItem::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as dictionary.
    pub fn as_dictionary(&self) -> Option<&PdfDictionary> {
        match self {
            PdfItem::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Get as mutable dictionary.
    pub fn as_dictionary_mut(&mut self) -> Option<&mut PdfDictionary> {
        match self {
            PdfItem::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Get as array.
    pub fn as_array(&self) -> Option<&PdfArray> {
        match self {
            PdfItem::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get as mutable array.
    pub fn as_array_mut(&mut self) -> Option<&mut PdfArray> {
        match self {
            PdfItem::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get as reference.
    pub fn as_reference(&self) -> Option<&PdfReference> {
        match self {
            PdfItem::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// Follow a reference to its value; other values resolve to themselves.
    pub fn resolve(&self) -> Result<ItemRef<'_>> {
        match self {
            PdfItem::Reference(r) => Ok(ItemRef::Indirect(r.value()?)),
            item => Ok(ItemRef::Direct(item)),
        }
    }

    /// The value to store when this item is placed into a container:
    /// indirect composites are replaced by their reference.
    pub(crate) fn into_storable(self) -> PdfItem {
        let reference = match &self {
            PdfItem::Dictionary(d) => d.reference(),
            PdfItem::Array(a) => a.reference(),
            _ => None,
        };
        match reference {
            Some(reference) => PdfItem::Reference(reference),
            None => self,
        }
    }

    /// Upgrade a generic composite to the declared kind, in place.
    ///
    /// Values of another category (e.g. an array where a dictionary is
    /// declared) and declarations of the generic kind leave the value alone.
    pub(crate) fn transform_to(&mut self, value_type: ValueType) {
        match (self, value_type) {
            (PdfItem::Dictionary(d), ValueType::Dictionary(kind))
                if kind != Default::default() && d.kind() != kind =>
            {
                let generic = std::mem::take(d);
                *d = generic.transform(kind);
            }
            (PdfItem::Array(a), ValueType::Array(kind))
                if kind != Default::default() && a.kind() != kind =>
            {
                let generic = std::mem::take(a);
                *a = generic.transform(kind);
            }
            _ => {}
        }
    }

    pub(crate) fn set_back_reference(&mut self, reference: Option<WeakReference>) {
        match self {
            PdfItem::Dictionary(d) => d.set_back_reference(reference),
            PdfItem::Array(a) => a.set_back_reference(reference),
            _ => {}
        }
    }

    /// Attach direct composites to a document, recursively.
    ///
    /// References are not followed, but must point into the same document.
    pub(crate) fn attach(&mut self, document: &DocumentHandle) -> Result<()> {
        match self {
            PdfItem::Dictionary(d) => d.attach(document),
            PdfItem::Array(a) => a.attach(document),
            PdfItem::Reference(r) if r.document_id() != document.id() => {
                Err(Error::invalid_operation(format!(
                    "reference {} belongs to {}, not {}",
                    r,
                    r.document_id(),
                    document.id()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Create an empty value of a declared type.
    pub(crate) fn create_empty(value_type: ValueType, key: &str) -> Result<PdfItem> {
        match value_type {
            ValueType::Dictionary(kind) => Ok(PdfItem::Dictionary(PdfDictionary::with_kind(kind))),
            ValueType::Array(kind) => Ok(PdfItem::Array(PdfArray::with_kind(kind))),
            ValueType::Other(name) => Err(Error::NotImplemented(format!(
                "cannot create a {} value for {} (only arrays and dictionaries)",
                name, key
            ))),
        }
    }
}

impl From<bool> for PdfItem {
    fn from(b: bool) -> Self {
        PdfItem::Boolean(b)
    }
}

impl From<i64> for PdfItem {
    fn from(i: i64) -> Self {
        PdfItem::Integer(i)
    }
}

impl From<i32> for PdfItem {
    fn from(i: i32) -> Self {
        PdfItem::Integer(i as i64)
    }
}

impl From<f64> for PdfItem {
    fn from(r: f64) -> Self {
        PdfItem::Real(r)
    }
}

impl From<PdfName> for PdfItem {
    fn from(n: PdfName) -> Self {
        PdfItem::Name(n)
    }
}

impl From<PdfString> for PdfItem {
    fn from(s: PdfString) -> Self {
        PdfItem::String(s)
    }
}

impl From<PdfRectangle> for PdfItem {
    fn from(r: PdfRectangle) -> Self {
        PdfItem::Rectangle(r)
    }
}

impl From<PdfLiteral> for PdfItem {
    fn from(l: PdfLiteral) -> Self {
        PdfItem::Literal(l)
    }
}

impl From<PdfArray> for PdfItem {
    fn from(a: PdfArray) -> Self {
        PdfItem::Array(a)
    }
}

impl From<PdfDictionary> for PdfItem {
    fn from(d: PdfDictionary) -> Self {
        PdfItem::Dictionary(d)
    }
}

impl From<PdfReference> for PdfItem {
    fn from(r: PdfReference) -> Self {
        PdfItem::Reference(r)
    }
}

/// A resolved value: either borrowed directly from its container or from an
/// indirect object's slot.
pub enum ItemRef<'a> {
    /// Value stored directly in the container
    Direct(&'a PdfItem),
    /// Value held by an indirect object
    Indirect(Ref<'a, PdfItem>),
}

impl Deref for ItemRef<'_> {
    type Target = PdfItem;

    fn deref(&self) -> &PdfItem {
        match self {
            ItemRef::Direct(item) => item,
            ItemRef::Indirect(item) => item,
        }
    }
}

impl std::fmt::Debug for ItemRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        (**self).fmt(f)
    }
}

/// Mutable counterpart of [`ItemRef`].
pub enum ItemMut<'a> {
    /// Value stored directly in the container
    Direct(&'a mut PdfItem),
    /// Value held by an indirect object
    Indirect(RefMut<'a, PdfItem>),
}

impl Deref for ItemMut<'_> {
    type Target = PdfItem;

    fn deref(&self) -> &PdfItem {
        match self {
            ItemMut::Direct(item) => item,
            ItemMut::Indirect(item) => item,
        }
    }
}

impl DerefMut for ItemMut<'_> {
    fn deref_mut(&mut self) -> &mut PdfItem {
        match self {
            ItemMut::Direct(item) => item,
            ItemMut::Indirect(item) => item,
        }
    }
}

impl std::fmt::Debug for ItemMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        (**self).fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PdfDocument;
    use crate::meta::{ArrayKind, DictionaryKind};

    #[test]
    fn test_type_names() {
        assert_eq!(PdfItem::Null.type_name(), "Null");
        assert_eq!(PdfItem::from(3).type_name(), "Integer");
        assert_eq!(PdfItem::from(PdfName::new("A")).type_name(), "Name");
        assert_eq!(PdfItem::from(PdfDictionary::new()).type_name(), "Dictionary");
    }

    #[test]
    fn test_real_widens_integer() {
        assert_eq!(PdfItem::Integer(3).as_real(), Some(3.0));
        assert_eq!(PdfItem::Real(2.5).as_real(), Some(2.5));
        assert_eq!(PdfItem::Real(2.5).as_integer(), None);
    }

    #[test]
    fn test_resolve_follows_reference() {
        let doc = PdfDocument::new();
        let r = doc.add_object(PdfItem::Integer(12)).unwrap();
        let item = PdfItem::Reference(r);
        assert_eq!(item.resolve().unwrap().as_integer(), Some(12));
        assert_eq!(PdfItem::Boolean(true).resolve().unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_into_storable_keeps_direct_values() {
        let direct = PdfItem::Dictionary(PdfDictionary::new());
        assert!(matches!(direct.into_storable(), PdfItem::Dictionary(_)));
        assert_eq!(PdfItem::Integer(1).into_storable(), PdfItem::Integer(1));
    }

    #[test]
    fn test_into_storable_replaces_indirect_value() {
        let doc = PdfDocument::new();
        let target = doc.add_object(PdfDictionary::new()).unwrap();
        // a by-value dictionary that still knows its slot
        let mut by_value = PdfDictionary::new();
        by_value.set_back_reference(Some(target.downgrade()));

        match PdfItem::Dictionary(by_value).into_storable() {
            PdfItem::Reference(stored) => assert!(PdfReference::ptr_eq(&stored, &target)),
            other => panic!("Expected a reference, got {:?}", other),
        }
    }

    #[test]
    fn test_transform_to_declared_kind() {
        let mut item = PdfItem::Dictionary(PdfDictionary::new());
        item.transform_to(ValueType::Dictionary(DictionaryKind::Page));
        assert_eq!(item.as_dictionary().unwrap().kind(), DictionaryKind::Page);

        // generic declarations never downgrade
        item.transform_to(ValueType::Dictionary(DictionaryKind::Generic));
        assert_eq!(item.as_dictionary().unwrap().kind(), DictionaryKind::Page);

        // category mismatch is left alone
        item.transform_to(ValueType::Array(ArrayKind::Kids));
        assert!(item.as_dictionary().is_some());
    }

    #[test]
    fn test_create_empty() {
        let item = PdfItem::create_empty(ValueType::Array(ArrayKind::Kids), "/Kids").unwrap();
        assert_eq!(item.as_array().unwrap().kind(), ArrayKind::Kids);
        assert!(matches!(
            PdfItem::create_empty(ValueType::Other("NameTree"), "/Dests"),
            Err(Error::NotImplemented(_))
        ));
    }
}
