//! Dictionaries and their element access layer.
//!
//! A [`PdfDictionary`] owns a [`DictionaryElements`] map from name to value
//! and, optionally, one stream payload. The elements carry the schema
//! ([`DictionaryMeta`]) of the dictionary's kind, which drives on-demand
//! construction in [`DictionaryElements::get_value`] and the upgrade of
//! generic values to their declared kind.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.3.7 (Dictionary Objects) and
//! Section 7.3.8 (Stream Objects).

use crate::array::PdfArray;
use crate::config::FilterOptions;
use crate::date::{format_pdf_date, parse_pdf_date};
use crate::document::DocumentHandle;
use crate::error::{Error, Result};
use crate::filters;
use crate::item::{ItemMut, ItemRef, PdfItem};
use crate::meta::{DictionaryKind, DictionaryMeta, KeyDescriptor};
use crate::object_id::{DocumentId, ObjectId};
use crate::primitives::{PdfMatrix, PdfName, PdfRectangle, PdfString};
use crate::reference::{PdfReference, WeakReference};
use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use std::borrow::Cow;
use std::fmt;

/// Creation policy for [`DictionaryElements::get_value`] and
/// [`ArrayElements::get_value`](crate::array::ArrayElements::get_value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreateOptions {
    /// Return `None` when the value is missing
    #[default]
    None,
    /// Create a direct value of the declared type when missing
    Create,
    /// Create an indirect value of the declared type when missing
    CreateIndirect,
}

/// Raw stream payload of a dictionary, as stored (possibly encoded).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfStream {
    value: Bytes,
}

impl PdfStream {
    /// Create a stream from its stored bytes.
    pub fn new(value: impl Into<Bytes>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// The stored (possibly encoded) bytes.
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// Length of the stored bytes.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Key names are always stored with their leading `/`.
pub(crate) fn normalize_key(key: &str) -> Cow<'_, str> {
    if key.starts_with('/') {
        Cow::Borrowed(key)
    } else {
        Cow::Owned(format!("/{}", key))
    }
}

/// Key/value store of a dictionary.
pub struct DictionaryElements {
    map: IndexMap<String, PdfItem>,
    meta: &'static DictionaryMeta,
    owner: Option<DocumentHandle>,
}

impl DictionaryElements {
    fn new(meta: &'static DictionaryMeta) -> Self {
        Self {
            map: IndexMap::new(),
            meta,
            owner: None,
        }
    }

    /// Schema of the owning dictionary.
    pub fn meta(&self) -> &'static DictionaryMeta {
        self.meta
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// Entries in insertion order, unresolved.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PdfItem)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether an entry exists for the key (even if `null`).
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(normalize_key(key).as_ref())
    }

    /// Raw stored value, without following references.
    pub fn get(&self, key: &str) -> Option<&PdfItem> {
        self.map.get(normalize_key(key).as_ref())
    }

    /// Stored value with references followed.
    pub fn get_object(&self, key: &str) -> Result<Option<ItemRef<'_>>> {
        match self.map.get(normalize_key(key).as_ref()) {
            Some(item) => item.resolve().map(Some),
            None => Ok(None),
        }
    }

    /// The reference stored under the key, if the value is indirect.
    pub fn get_reference(&self, key: &str) -> Option<PdfReference> {
        self.get(key).and_then(PdfItem::as_reference).cloned()
    }

    /// Remove an entry.
    pub fn remove(&mut self, key: &str) -> Option<PdfItem> {
        self.map.shift_remove(normalize_key(key).as_ref())
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Id of the owning document, if attached.
    pub fn owner_id(&self) -> Option<DocumentId> {
        self.owner.as_ref().map(DocumentHandle::id)
    }

    pub(crate) fn owner(&self) -> Option<&DocumentHandle> {
        self.owner.as_ref()
    }

    /// Resolved value, with `null` (direct or referenced) treated as absent.
    fn present(&self, key: &str) -> Result<Option<ItemRef<'_>>> {
        let Some(item) = self.map.get(key) else {
            return Ok(None);
        };
        let item = item.resolve()?;
        if item.is_null() {
            Ok(None)
        } else {
            Ok(Some(item))
        }
    }

    fn insert_if_absent(&mut self, key: &str, value: PdfItem) -> Result<()> {
        let absent = self.present(key)?.is_none();
        if absent {
            self.map.insert(key.to_string(), value);
        }
        Ok(())
    }

    pub(crate) fn insert_direct(&mut self, key: &str, value: PdfItem) {
        self.map.insert(normalize_key(key).into_owned(), value);
    }

    /// Get a boolean, `false` when absent.
    pub fn get_boolean(&self, key: &str) -> Result<bool> {
        let key = normalize_key(key);
        match self.present(&key)? {
            None => Ok(false),
            Some(item) => item
                .as_bool()
                .ok_or_else(|| Error::invalid_cast(key.as_ref(), "Boolean", item.type_name())),
        }
    }

    /// Get a boolean, storing `false` when absent.
    pub fn get_boolean_or_create(&mut self, key: &str) -> Result<bool> {
        let value = self.get_boolean(key)?;
        self.insert_if_absent(&normalize_key(key), PdfItem::Boolean(value))?;
        Ok(value)
    }

    /// Get an integer, `0` when absent.
    pub fn get_integer(&self, key: &str) -> Result<i64> {
        let key = normalize_key(key);
        match self.present(&key)? {
            None => Ok(0),
            Some(item) => item
                .as_integer()
                .ok_or_else(|| Error::invalid_cast(key.as_ref(), "Integer", item.type_name())),
        }
    }

    /// Get an integer, storing `0` when absent.
    pub fn get_integer_or_create(&mut self, key: &str) -> Result<i64> {
        let value = self.get_integer(key)?;
        self.insert_if_absent(&normalize_key(key), PdfItem::Integer(value))?;
        Ok(value)
    }

    /// Get a number, `0.0` when absent. Integers are widened.
    pub fn get_real(&self, key: &str) -> Result<f64> {
        let key = normalize_key(key);
        match self.present(&key)? {
            None => Ok(0.0),
            Some(item) => item
                .as_real()
                .ok_or_else(|| Error::invalid_cast(key.as_ref(), "Real", item.type_name())),
        }
    }

    /// Get a number, storing `0.0` when absent.
    pub fn get_real_or_create(&mut self, key: &str) -> Result<f64> {
        let value = self.get_real(key)?;
        self.insert_if_absent(&normalize_key(key), PdfItem::Real(value))?;
        Ok(value)
    }

    /// Get a string decoded as text, empty when absent.
    pub fn get_string(&self, key: &str) -> Result<String> {
        let key = normalize_key(key);
        match self.present(&key)? {
            None => Ok(String::new()),
            Some(item) => item
                .as_string()
                .map(PdfString::to_text)
                .ok_or_else(|| Error::invalid_cast(key.as_ref(), "String", item.type_name())),
        }
    }

    /// Get a string, storing an empty one when absent.
    pub fn get_string_or_create(&mut self, key: &str) -> Result<String> {
        let value = self.get_string(key)?;
        self.insert_if_absent(&normalize_key(key), PdfItem::String(PdfString::default()))?;
        Ok(value)
    }

    /// Get a name (with leading `/`), empty when absent.
    pub fn get_name(&self, key: &str) -> Result<String> {
        let key = normalize_key(key);
        match self.present(&key)? {
            None => Ok(String::new()),
            Some(item) => item
                .as_name()
                .map(|n| n.as_str().to_string())
                .ok_or_else(|| Error::invalid_cast(key.as_ref(), "Name", item.type_name())),
        }
    }

    /// Get a name, storing `/` when absent.
    pub fn get_name_or_create(&mut self, key: &str) -> Result<String> {
        let value = self.get_name(key)?;
        self.insert_if_absent(&normalize_key(key), PdfItem::Name(PdfName::new("")))?;
        Ok(value)
    }

    /// Get a rectangle, all zeros when absent.
    ///
    /// Accepts a rectangle value or an array of four numbers; an array of
    /// another shape is corrupt.
    pub fn get_rectangle(&self, key: &str) -> Result<PdfRectangle> {
        let key = normalize_key(key);
        match self.present(&key)? {
            None => Ok(PdfRectangle::default()),
            Some(item) => match &*item {
                PdfItem::Rectangle(rect) => Ok(*rect),
                PdfItem::Array(array) => array.to_rectangle(),
                other => Err(Error::invalid_cast(key.as_ref(), "Rectangle", other.type_name())),
            },
        }
    }

    /// Get a rectangle, storing an empty one when absent.
    pub fn get_rectangle_or_create(&mut self, key: &str) -> Result<PdfRectangle> {
        let value = self.get_rectangle(key)?;
        self.insert_if_absent(&normalize_key(key), PdfItem::Rectangle(value))?;
        Ok(value)
    }

    /// Get a matrix, identity when absent. Requires an array of six numbers.
    pub fn get_matrix(&self, key: &str) -> Result<PdfMatrix> {
        let key = normalize_key(key);
        match self.present(&key)? {
            None => Ok(PdfMatrix::IDENTITY),
            Some(item) => match &*item {
                PdfItem::Array(array) => array.to_matrix(),
                other => Err(Error::invalid_cast(key.as_ref(), "Matrix", other.type_name())),
            },
        }
    }

    /// Get a matrix, storing the identity when absent.
    pub fn get_matrix_or_create(&mut self, key: &str) -> Result<PdfMatrix> {
        let value = self.get_matrix(key)?;
        if self.present(&normalize_key(key))?.is_none() {
            self.set_matrix(key, value);
        }
        Ok(value)
    }

    /// Get a date, `default` when absent.
    pub fn get_date_time(
        &self,
        key: &str,
        default: DateTime<FixedOffset>,
    ) -> Result<DateTime<FixedOffset>> {
        let key = normalize_key(key);
        match self.present(&key)? {
            None => Ok(default),
            Some(item) => match &*item {
                PdfItem::String(s) => parse_pdf_date(&s.to_text()),
                other => Err(Error::invalid_cast(key.as_ref(), "Date", other.type_name())),
            },
        }
    }

    /// Get a date, storing `default` when absent.
    pub fn get_date_time_or_create(
        &mut self,
        key: &str,
        default: DateTime<FixedOffset>,
    ) -> Result<DateTime<FixedOffset>> {
        let value = self.get_date_time(key, default)?;
        if self.present(&normalize_key(key))?.is_none() {
            self.set_date_time(key, &value);
        }
        Ok(value)
    }

    /// Store a boolean.
    pub fn set_boolean(&mut self, key: &str, value: bool) {
        self.insert_direct(key, PdfItem::Boolean(value));
    }

    /// Store an integer.
    pub fn set_integer(&mut self, key: &str, value: i64) {
        self.insert_direct(key, PdfItem::Integer(value));
    }

    /// Store a real.
    pub fn set_real(&mut self, key: &str, value: f64) {
        self.insert_direct(key, PdfItem::Real(value));
    }

    /// Store a text string.
    pub fn set_string(&mut self, key: &str, value: &str) {
        self.insert_direct(key, PdfItem::String(PdfString::from_text(value)));
    }

    /// Store a name. The leading `/` is added when missing.
    pub fn set_name(&mut self, key: &str, value: &str) {
        self.insert_direct(key, PdfItem::Name(PdfName::new(value)));
    }

    /// Store a rectangle.
    pub fn set_rectangle(&mut self, key: &str, value: PdfRectangle) {
        self.insert_direct(key, PdfItem::Rectangle(value));
    }

    /// Store a matrix as an array of six reals.
    pub fn set_matrix(&mut self, key: &str, value: PdfMatrix) {
        let mut array = PdfArray::from_items(value.0.iter().map(|&c| PdfItem::Real(c)).collect());
        array.adopt(self.owner.as_ref());
        self.insert_direct(key, PdfItem::Array(array));
    }

    /// Store a date as a PDF date string.
    pub fn set_date_time(&mut self, key: &str, value: &DateTime<FixedOffset>) {
        self.insert_direct(key, PdfItem::String(PdfString::from_text(&format_pdf_date(value))));
    }

    /// Store any value.
    ///
    /// An indirect composite is stored as its reference. Direct composites are
    /// attached to this dictionary's document, which fails for references into
    /// another document.
    pub fn set_value(&mut self, key: &str, value: impl Into<PdfItem>) -> Result<()> {
        let mut value = value.into().into_storable();
        if let Some(owner) = &self.owner {
            value.attach(owner)?;
        }
        self.insert_direct(key, value);
        Ok(())
    }

    /// Store a direct object. References and indirect objects are rejected.
    pub fn set_object(&mut self, key: &str, value: impl Into<PdfItem>) -> Result<()> {
        let value = value.into();
        if matches!(value, PdfItem::Reference(_)) || value.is_indirect() {
            return Err(Error::invalid_operation(format!(
                "{} requires a direct object, got an indirect {}",
                normalize_key(key),
                value.type_name()
            )));
        }
        self.set_value(key, value)
    }

    /// Store a reference to an indirect object of the same document.
    pub fn set_reference(&mut self, key: &str, reference: &PdfReference) -> Result<()> {
        if let Some(owner) = &self.owner {
            if owner.id() != reference.document_id() {
                return Err(Error::invalid_operation(format!(
                    "cannot store {} from {} in a dictionary of {}",
                    reference,
                    reference.document_id(),
                    owner.id()
                )));
            }
        }
        self.insert_direct(key, PdfItem::Reference(reference.clone()));
        Ok(())
    }

    /// Get a value, optionally creating it, upgraded to its declared kind.
    ///
    /// * Missing or `null` (directly or through a reference): returns `None`
    ///   for [`CreateOptions::None`]. Otherwise constructs an empty value of
    ///   the type declared for `key`, direct or indirect as requested. Keys
    ///   declared `MUST_BE_INDIRECT` are always created indirect when the
    ///   dictionary is attached to a document.
    /// * Present: a generic dictionary or array whose declared kind differs
    ///   is transformed to that kind, in its reference slot when indirect and
    ///   in place otherwise. Anything else is returned unchanged.
    pub fn get_value(&mut self, key: &str, options: CreateOptions) -> Result<Option<ItemMut<'_>>> {
        let key = normalize_key(key).into_owned();
        let meta = self.meta;
        let descriptor = meta.descriptor(&key);
        let declared = descriptor.map(KeyDescriptor::value_type);

        let null_equivalent = match self.map.get(&key) {
            None | Some(PdfItem::Null) => true,
            Some(PdfItem::Reference(r)) => r.value()?.is_null(),
            Some(_) => false,
        };

        if null_equivalent {
            if options == CreateOptions::None {
                return Ok(None);
            }
            let value_type = declared
                .ok_or_else(|| Error::NotImplemented(format!("cannot create value for key {}", key)))?;
            let value = PdfItem::create_empty(value_type, &key)?;
            let indirect = options == CreateOptions::CreateIndirect
                || (descriptor.is_some_and(KeyDescriptor::must_be_indirect) && self.owner.is_some());
            let stored = if indirect {
                let document = self
                    .owner
                    .as_ref()
                    .and_then(DocumentHandle::upgrade)
                    .ok_or_else(|| {
                        Error::invalid_operation(format!(
                            "cannot create indirect {}: dictionary is not attached to a document",
                            key
                        ))
                    })?;
                PdfItem::Reference(document.add_object(value)?)
            } else {
                let mut value = value;
                if let Some(owner) = &self.owner {
                    value.attach(owner)?;
                }
                value
            };
            log::trace!("Created {} value for {}", stored.type_name(), key);
            self.map.insert(key.clone(), stored);
        } else if let Some(value_type) = declared {
            match self.map.get_mut(&key) {
                Some(PdfItem::Reference(r)) => r.value_mut()?.transform_to(value_type),
                Some(item) => item.transform_to(value_type),
                None => {}
            }
        }

        self.item_mut(&key)
    }

    fn item_mut(&mut self, key: &str) -> Result<Option<ItemMut<'_>>> {
        match self.map.get_mut(key) {
            None => Ok(None),
            Some(PdfItem::Reference(r)) => Ok(Some(ItemMut::Indirect(r.value_mut()?))),
            Some(item) => Ok(Some(ItemMut::Direct(item))),
        }
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &PdfItem> {
        self.map.values()
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut PdfItem> {
        self.map.values_mut()
    }

    pub(crate) fn attach(&mut self, document: &DocumentHandle) -> Result<()> {
        match &self.owner {
            Some(owner) if owner.id() == document.id() => return Ok(()),
            Some(_) => return Err(Error::AlreadyAttached),
            None => {}
        }
        for value in self.map.values_mut() {
            value.attach(document)?;
        }
        self.owner = Some(document.clone());
        Ok(())
    }

    /// Attach a freshly built tree, recursively. Only for values that hold no
    /// references, so nothing can conflict.
    pub(crate) fn adopt(&mut self, document: &DocumentHandle) {
        if self.owner.is_none() {
            self.owner = Some(document.clone());
        }
        for value in self.map.values_mut() {
            match value {
                PdfItem::Dictionary(d) => d.elements.adopt(document),
                PdfItem::Array(a) => a.adopt(Some(document)),
                _ => {}
            }
        }
    }

    /// Set the owner without touching children. Used by the import fix-up,
    /// which rewrites the children itself.
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

impl Clone for DictionaryElements {
    /// Deep-copies direct children; references stay shared. The copy is
    /// detached from any document.
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
            meta: self.meta,
            owner: None,
        }
    }
}

impl PartialEq for DictionaryElements {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl fmt::Debug for DictionaryElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.map.iter()).finish()
    }
}

/// A PDF dictionary, optionally carrying a stream.
pub struct PdfDictionary {
    elements: DictionaryElements,
    stream: Option<PdfStream>,
    reference: Option<WeakReference>,
}

impl PdfDictionary {
    /// Create an empty generic dictionary.
    pub fn new() -> Self {
        Self::with_kind(DictionaryKind::Generic)
    }

    /// Create an empty dictionary of a kind, with its fixed values set
    /// (e.g. `/Type /Page`).
    pub fn with_kind(kind: DictionaryKind) -> Self {
        let meta = kind.meta();
        let mut elements = DictionaryElements::new(meta);
        for (key, value) in meta.fixed_values() {
            elements.insert_direct(key, PdfItem::Name(PdfName::new(value)));
        }
        Self {
            elements,
            stream: None,
            reference: None,
        }
    }

    /// Kind this dictionary is viewed as.
    pub fn kind(&self) -> DictionaryKind {
        self.elements.meta.kind()
    }

    /// Schema of this dictionary's kind.
    pub fn meta(&self) -> &'static DictionaryMeta {
        self.elements.meta
    }

    /// The key/value store.
    pub fn elements(&self) -> &DictionaryElements {
        &self.elements
    }

    /// The mutable key/value store.
    pub fn elements_mut(&mut self) -> &mut DictionaryElements {
        &mut self.elements
    }

    /// Id of the owning document, if attached.
    pub fn owner_id(&self) -> Option<DocumentId> {
        self.elements.owner_id()
    }

    /// Whether this dictionary is an indirect object.
    pub fn is_indirect(&self) -> bool {
        self.reference.is_some()
    }

    /// The slot holding this dictionary, if indirect.
    pub fn reference(&self) -> Option<PdfReference> {
        self.reference.as_ref().and_then(WeakReference::upgrade)
    }

    /// Object id, or [`ObjectId::EMPTY`] for direct dictionaries.
    pub fn object_id(&self) -> ObjectId {
        self.reference()
            .map(|r| r.object_id())
            .unwrap_or(ObjectId::EMPTY)
    }

    /// View the same storage as another kind.
    ///
    /// Entries, stream and identity move into the result; nothing is copied.
    /// Transforming to the current kind returns `self` unchanged.
    pub fn transform(self, kind: DictionaryKind) -> PdfDictionary {
        if self.kind() == kind {
            return self;
        }
        log::debug!(
            "Transforming {:?} dictionary {} to {:?}",
            self.kind(),
            self.object_id(),
            kind
        );
        let PdfDictionary {
            mut elements,
            stream,
            reference,
        } = self;
        elements.meta = kind.meta();
        PdfDictionary {
            elements,
            stream,
            reference,
        }
    }

    pub(crate) fn attach(&mut self, document: &DocumentHandle) -> Result<()> {
        self.elements.attach(document)
    }

    pub(crate) fn adopt(&mut self, document: &DocumentHandle) {
        self.elements.adopt(document);
    }

    pub(crate) fn set_back_reference(&mut self, reference: Option<WeakReference>) {
        self.reference = reference;
    }

    /// Whether a stream is present.
    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// The stream, if present.
    pub fn stream(&self) -> Option<&PdfStream> {
        self.stream.as_ref()
    }

    /// Add a stream. A dictionary has at most one.
    pub fn create_stream(&mut self, data: impl Into<Bytes>) -> Result<()> {
        if self.stream.is_some() {
            return Err(Error::invalid_operation(format!(
                "dictionary {} already has a stream",
                self.object_id()
            )));
        }
        self.set_stream(data);
        Ok(())
    }

    /// Replace the stream with unencoded data, dropping any filter entries.
    pub fn set_stream(&mut self, data: impl Into<Bytes>) {
        let stream = PdfStream::new(data);
        self.elements.remove("/Filter");
        self.elements.remove("/DecodeParms");
        self.elements.set_integer("/Length", stream.len() as i64);
        self.stream = Some(stream);
    }

    /// Store already-encoded stream data as is. Filter entries are left to the caller.
    pub fn set_raw_stream(&mut self, data: impl Into<Bytes>) {
        let stream = PdfStream::new(data);
        self.elements.set_integer("/Length", stream.len() as i64);
        self.stream = Some(stream);
    }

    /// Remove the stream and its filter entries.
    pub fn remove_stream(&mut self) -> Option<PdfStream> {
        self.elements.remove("/Filter");
        self.elements.remove("/DecodeParms");
        self.elements.remove("/Length");
        self.stream.take()
    }

    /// Names of the filters applied to the stream, in decoding order.
    pub fn stream_filters(&self) -> Result<Vec<String>> {
        let Some(filter) = self.elements.present("/Filter")? else {
            return Ok(Vec::new());
        };
        match &*filter {
            PdfItem::Name(name) => Ok(vec![name.without_slash().to_string()]),
            PdfItem::Array(array) => array
                .elements()
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let item = item.resolve()?;
                    item.as_name()
                        .map(|n| n.without_slash().to_string())
                        .ok_or_else(|| {
                            Error::invalid_cast(format!("/Filter[{}]", i), "Name", item.type_name())
                        })
                })
                .collect(),
            other => Err(Error::invalid_cast("/Filter", "Name", other.type_name())),
        }
    }

    /// Decoded stream data, running every filter listed in `/Filter`.
    pub fn unfiltered_stream(&self, options: &FilterOptions) -> Result<Vec<u8>> {
        let stream = self.stream.as_ref().ok_or_else(|| {
            Error::invalid_operation(format!("dictionary {} has no stream", self.object_id()))
        })?;
        let filters = self.stream_filters()?;
        filters::decode_stream(stream.value(), &filters, options)
    }

    /// Flate-compress an unfiltered stream when that makes it smaller.
    ///
    /// Returns whether the stream was compressed.
    pub fn try_compress_stream(&mut self) -> Result<bool> {
        let Some(stream) = &self.stream else {
            return Ok(false);
        };
        if !self.stream_filters()?.is_empty() {
            return Ok(false);
        }
        let encoded = filters::encode_stream(stream.value(), filters::FLATE_DECODE)?;
        if encoded.len() >= stream.len() {
            log::debug!(
                "Stream of {} left uncompressed ({} >= {} bytes)",
                self.object_id(),
                encoded.len(),
                stream.len()
            );
            return Ok(false);
        }
        self.set_raw_stream(encoded);
        self.elements.set_name("/Filter", filters::FLATE_DECODE);
        Ok(true)
    }
}

impl Default for PdfDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PdfDictionary {
    /// A detached copy: not indirect, not owned, direct children deep-copied,
    /// references shared.
    fn clone(&self) -> Self {
        Self {
            elements: self.elements.clone(),
            stream: self.stream.clone(),
            reference: None,
        }
    }
}

impl PartialEq for PdfDictionary {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements && self.stream == other.stream
    }
}

impl fmt::Debug for PdfDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("PdfDictionary");
        s.field("kind", &self.kind());
        if let Some(reference) = self.reference() {
            s.field("reference", &reference.to_string());
        }
        s.field("elements", &self.elements);
        if let Some(stream) = &self.stream {
            s.field("stream_len", &stream.len());
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PdfDocument;
    use crate::meta::ArrayKind;
    use chrono::TimeZone;

    #[test]
    fn test_keys_are_normalized() {
        let mut dict = PdfDictionary::new();
        dict.elements_mut().set_integer("Count", 3);
        assert!(dict.elements().contains_key("/Count"));
        assert!(dict.elements().contains_key("Count"));
        assert_eq!(dict.elements().keys().collect::<Vec<_>>(), vec!["/Count"]);
    }

    #[test]
    fn test_get_integer_default_and_create() {
        let mut dict = PdfDictionary::new();
        assert_eq!(dict.elements().get_integer("/Count").unwrap(), 0);
        assert!(!dict.elements().contains_key("/Count"));

        assert_eq!(dict.elements_mut().get_integer_or_create("/Count").unwrap(), 0);
        assert!(dict.elements().contains_key("/Count"));
        assert_eq!(dict.elements().get("/Count"), Some(&PdfItem::Integer(0)));
    }

    #[test]
    fn test_get_wrong_type_is_invalid_cast() {
        let mut dict = PdfDictionary::new();
        dict.elements_mut().set_name("/Count", "Three");
        let err = dict.elements().get_integer("/Count").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidCast { ref key, expected: "Integer", found: "Name" } if key == "/Count"
        ));
    }

    #[test]
    fn test_null_is_absent() {
        let mut dict = PdfDictionary::new();
        dict.elements_mut().set_value("/Flag", PdfItem::Null).unwrap();
        assert!(!dict.elements().get_boolean("/Flag").unwrap());
        assert!(!dict.elements_mut().get_boolean_or_create("/Flag").unwrap());
        assert_eq!(dict.elements().get("/Flag"), Some(&PdfItem::Boolean(false)));
    }

    #[test]
    fn test_get_real_widens_integer() {
        let mut dict = PdfDictionary::new();
        dict.elements_mut().set_integer("/W", 12);
        assert_eq!(dict.elements().get_real("/W").unwrap(), 12.0);
        dict.elements_mut().set_real("/W", 1.5);
        assert!(dict.elements().get_integer("/W").is_err());
    }

    #[test]
    fn test_rectangle_round_trip() {
        let mut dict = PdfDictionary::new();
        dict.elements_mut()
            .set_rectangle("/MediaBox", PdfRectangle::new(0.0, 0.0, 595.0, 842.0));
        let rect = dict.elements().get_rectangle("/MediaBox").unwrap();
        assert_eq!(rect.width(), 595.0);
        assert_eq!(rect.height(), 842.0);
    }

    #[test]
    fn test_rectangle_from_array() {
        let mut dict = PdfDictionary::new();
        let array = PdfArray::from_items(vec![0.into(), 0.into(), 612.into(), 792.5.into()]);
        dict.elements_mut().set_value("/MediaBox", array).unwrap();
        let rect = dict.elements().get_rectangle("/MediaBox").unwrap();
        assert_eq!(rect, PdfRectangle::new(0.0, 0.0, 612.0, 792.5));
    }

    #[test]
    fn test_malformed_rectangle_is_corrupt() {
        let mut dict = PdfDictionary::new();
        let array = PdfArray::from_items(vec![0.into(), 0.into(), 612.into()]);
        dict.elements_mut().set_value("/MediaBox", array).unwrap();
        assert!(matches!(
            dict.elements().get_rectangle("/MediaBox"),
            Err(Error::Corrupt { .. })
        ));
    }

    #[test]
    fn test_matrix() {
        let mut dict = PdfDictionary::new();
        assert!(dict.elements().get_matrix("/Matrix").unwrap().is_identity());

        let m = PdfMatrix::new(2.0, 0.0, 0.0, 2.0, 10.0, 20.0);
        dict.elements_mut().set_matrix("/Matrix", m);
        assert_eq!(dict.elements().get_matrix("/Matrix").unwrap(), m);

        let short = PdfArray::from_items(vec![1.into(), 0.into()]);
        dict.elements_mut().set_value("/Matrix", short).unwrap();
        assert!(matches!(dict.elements().get_matrix("/Matrix"), Err(Error::Corrupt { .. })));
    }

    #[test]
    fn test_date_time() {
        let mut dict = PdfDictionary::new();
        let default = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
            .unwrap();
        assert_eq!(dict.elements().get_date_time("/M", default).unwrap(), default);

        let date = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 15, 14, 30, 0)
            .unwrap();
        dict.elements_mut().set_date_time("/M", &date);
        assert_eq!(dict.elements().get_string("/M").unwrap(), "D:20240315143000+01'00'");
        assert_eq!(dict.elements().get_date_time("/M", default).unwrap(), date);

        dict.elements_mut().set_string("/M", "not a date");
        assert!(matches!(
            dict.elements().get_date_time("/M", default),
            Err(Error::Corrupt { .. })
        ));
    }

    #[test]
    fn test_typed_getter_follows_reference() {
        let doc = PdfDocument::new();
        let count = doc.add_object(PdfItem::Integer(5)).unwrap();
        let mut dict = PdfDictionary::new();
        dict.elements_mut().set_reference("/Count", &count).unwrap();
        assert_eq!(dict.elements().get_integer("/Count").unwrap(), 5);
    }

    #[test]
    fn test_setter_overwrites_reference() {
        let doc = PdfDocument::new();
        let count = doc.add_object(PdfItem::Integer(5)).unwrap();
        let mut dict = PdfDictionary::new();
        dict.elements_mut().set_reference("/Count", &count).unwrap();
        dict.elements_mut().set_integer("/Count", 6);
        assert_eq!(dict.elements().get("/Count"), Some(&PdfItem::Integer(6)));
        assert_eq!(*count.value().unwrap(), PdfItem::Integer(5));
    }

    #[test]
    fn test_set_object_rejects_references() {
        let doc = PdfDocument::new();
        let r = doc.add_object(PdfDictionary::new()).unwrap();
        let mut dict = PdfDictionary::new();
        assert!(matches!(
            dict.elements_mut().set_object("/X", r.clone()),
            Err(Error::InvalidOperation(_))
        ));
        dict.elements_mut().set_object("/X", PdfDictionary::new()).unwrap();
    }

    #[test]
    fn test_set_reference_from_other_document_rejected() {
        let a = PdfDocument::new();
        let b = PdfDocument::new();
        let foreign = b.add_object(PdfItem::Integer(1)).unwrap();
        let holder = a.add_object(PdfDictionary::new()).unwrap();
        let mut dict = holder.dictionary_mut().unwrap();
        assert!(matches!(
            dict.elements_mut().set_reference("/X", &foreign),
            Err(Error::InvalidOperation(_))
        ));
        assert!(dict.elements_mut().set_value("/X", foreign).is_err());
        assert!(!dict.elements().contains_key("/X"));
    }

    #[test]
    fn test_get_value_without_create() {
        let mut dict = PdfDictionary::with_kind(DictionaryKind::Page);
        assert!(dict
            .elements_mut()
            .get_value("/Resources", CreateOptions::None)
            .unwrap()
            .is_none());
        assert!(!dict.elements().contains_key("/Resources"));
    }

    #[test]
    fn test_get_value_creates_declared_kind() {
        let mut dict = PdfDictionary::with_kind(DictionaryKind::Page);
        {
            let value = dict
                .elements_mut()
                .get_value("/Resources", CreateOptions::Create)
                .unwrap()
                .unwrap();
            assert_eq!(value.as_dictionary().unwrap().kind(), DictionaryKind::Resources);
            assert!(!value.is_indirect());
        }
        let annots = dict
            .elements_mut()
            .get_value("/Annots", CreateOptions::Create)
            .unwrap()
            .unwrap();
        assert_eq!(annots.as_array().unwrap().kind(), ArrayKind::Annotations);
    }

    #[test]
    fn test_get_value_unknown_key_not_implemented() {
        let mut dict = PdfDictionary::new();
        assert!(matches!(
            dict.elements_mut().get_value("/Whatever", CreateOptions::Create),
            Err(Error::NotImplemented(_))
        ));
        let mut catalog = PdfDictionary::with_kind(DictionaryKind::Catalog);
        assert!(matches!(
            catalog.elements_mut().get_value("/PageLabels", CreateOptions::Create),
            Err(Error::NotImplemented(_))
        ));
        assert!(!catalog.elements().contains_key("/PageLabels"));
    }

    #[test]
    fn test_get_value_create_indirect_requires_document() {
        let mut dict = PdfDictionary::with_kind(DictionaryKind::Page);
        assert!(matches!(
            dict.elements_mut().get_value("/Resources", CreateOptions::CreateIndirect),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_get_value_create_indirect() {
        let doc = PdfDocument::new();
        let page = doc.add_object(PdfDictionary::with_kind(DictionaryKind::Page)).unwrap();
        let mut dict = page.dictionary_mut().unwrap();
        let is_indirect = dict
            .elements_mut()
            .get_value("/Resources", CreateOptions::CreateIndirect)
            .unwrap()
            .unwrap()
            .is_indirect();
        assert!(is_indirect);
        let reference = dict.elements().get_reference("/Resources").unwrap();
        assert_eq!(reference.document_id(), doc.id());
        assert_eq!(reference.dictionary().unwrap().kind(), DictionaryKind::Resources);
    }

    #[test]
    fn test_get_value_transforms_direct_in_place() {
        let mut dict = PdfDictionary::with_kind(DictionaryKind::Page);
        let mut generic = PdfDictionary::new();
        generic.elements_mut().set_name("/ProcSet", "PDF");
        dict.elements_mut().set_value("/Resources", generic).unwrap();

        let value = dict
            .elements_mut()
            .get_value("/Resources", CreateOptions::None)
            .unwrap()
            .unwrap();
        let resources = value.as_dictionary().unwrap();
        assert_eq!(resources.kind(), DictionaryKind::Resources);
        assert_eq!(resources.elements().get_name("/ProcSet").unwrap(), "/PDF");
    }

    #[test]
    fn test_get_value_transforms_in_slot() {
        let doc = PdfDocument::new();
        let resources = doc.add_object(PdfDictionary::new()).unwrap();
        let mut page = PdfDictionary::with_kind(DictionaryKind::Page);
        page.elements_mut().set_reference("/Resources", &resources).unwrap();

        page.elements_mut()
            .get_value("/Resources", CreateOptions::None)
            .unwrap();
        let upgraded = resources.dictionary().unwrap();
        assert_eq!(upgraded.kind(), DictionaryKind::Resources);
        assert_eq!(upgraded.reference(), Some(resources.clone()));
    }

    #[test]
    fn test_transform_is_idempotent() {
        let doc = PdfDocument::new();
        let r = doc.add_object(PdfDictionary::new()).unwrap();
        let mut holder = PdfDictionary::with_kind(DictionaryKind::Page);
        holder.elements_mut().set_reference("/Resources", &r).unwrap();

        let first = {
            let value = holder
                .elements_mut()
                .get_value("/Resources", CreateOptions::None)
                .unwrap()
                .unwrap();
            &*value as *const PdfItem
        };
        let id = r.object_id();
        let second = {
            let value = holder
                .elements_mut()
                .get_value("/Resources", CreateOptions::None)
                .unwrap()
                .unwrap();
            &*value as *const PdfItem
        };
        assert_eq!(first, second);
        assert_eq!(r.object_id(), id);
    }

    #[test]
    fn test_clone_is_detached_deep_copy() {
        let mut dict = PdfDictionary::new();
        dict.elements_mut().set_integer("/A", 1);
        dict.elements_mut().set_name("/B", "Two");
        let mut inner = PdfDictionary::new();
        inner.elements_mut().set_real("/C", 3.0);
        dict.elements_mut().set_value("/Inner", inner).unwrap();

        let mut copy = dict.clone();
        assert_eq!(copy, dict);

        copy.elements_mut().set_integer("/A", 10);
        {
            let mut copied_inner = copy
                .elements_mut()
                .get_value("/Inner", CreateOptions::None)
                .unwrap()
                .unwrap();
            copied_inner
                .as_dictionary_mut()
                .unwrap()
                .elements_mut()
                .set_real("/C", 30.0);
        }
        assert_eq!(dict.elements().get_integer("/A").unwrap(), 1);
        let original_inner = dict.elements().get_object("/Inner").unwrap().unwrap();
        assert_eq!(
            original_inner.as_dictionary().unwrap().elements().get_real("/C").unwrap(),
            3.0
        );
    }

    #[test]
    fn test_with_kind_sets_fixed_values() {
        let page = PdfDictionary::with_kind(DictionaryKind::Page);
        assert_eq!(page.elements().get_name("/Type").unwrap(), "/Page");
        assert_eq!(page.kind(), DictionaryKind::Page);
        assert!(PdfDictionary::new().elements().is_empty());
    }

    #[test]
    fn test_stream_lifecycle() {
        let mut dict = PdfDictionary::with_kind(DictionaryKind::Content);
        dict.create_stream(b"BT /F1 12 Tf ET".to_vec()).unwrap();
        assert!(dict.create_stream(Vec::new()).is_err());
        assert_eq!(dict.elements().get_integer("/Length").unwrap(), 15);
        assert_eq!(
            dict.unfiltered_stream(&FilterOptions::default()).unwrap(),
            b"BT /F1 12 Tf ET"
        );
        assert!(dict.remove_stream().is_some());
        assert!(!dict.elements().contains_key("/Length"));
    }

    #[test]
    fn test_try_compress_stream() {
        let mut dict = PdfDictionary::new();
        let data = b"0 0 m 100 100 l S\n".repeat(50);
        dict.create_stream(data.clone()).unwrap();
        assert!(dict.try_compress_stream().unwrap());
        assert_eq!(dict.stream_filters().unwrap(), vec!["FlateDecode"]);
        assert!(dict.stream().unwrap().len() < data.len());
        assert_eq!(dict.unfiltered_stream(&FilterOptions::default()).unwrap(), data);
        // already filtered
        assert!(!dict.try_compress_stream().unwrap());
    }
}
