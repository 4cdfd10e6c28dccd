//! Dictionary and array schemas.
//!
//! Every dictionary kind has a static [`DictionaryMeta`] listing the keys it
//! declares: expected value type, the concrete kind to construct on demand,
//! fixed values (such as `/Type /Page`), the PDF version that introduced the
//! key, and requiredness/indirectness constraints. The tables are built once,
//! on first use, and shared by every instance of the kind.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.7 (Document Structure) and
//! Section 12.5 (Annotations), 12.7 (Interactive Forms).

use bitflags::bitflags;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use std::collections::HashMap;

bitflags! {
    /// Declared type and constraints of a dictionary key.
    ///
    /// The low bits describe the value type, the high bits carry
    /// requiredness, inheritance and indirectness constraints.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KeyType: u32 {
        /// Name value
        const NAME = 1 << 0;
        /// Byte string value
        const STRING = 1 << 1;
        /// Boolean value
        const BOOLEAN = 1 << 2;
        /// Integer value
        const INTEGER = 1 << 3;
        /// Real value
        const REAL = 1 << 4;
        /// Date string
        const DATE = 1 << 5;
        /// Rectangle array
        const RECTANGLE = 1 << 6;
        /// Array value
        const ARRAY = 1 << 7;
        /// Dictionary value
        const DICTIONARY = 1 << 8;
        /// Stream value
        const STREAM = 1 << 9;
        /// Number tree
        const NUMBER_TREE = 1 << 10;
        /// Name tree
        const NAME_TREE = 1 << 11;
        /// File specification (string or dictionary)
        const FILE_SPEC = 1 << 12;
        /// Function (dictionary or stream)
        const FUNCTION = 1 << 13;
        /// Text string (PDFDocEncoding or UTF-16BE)
        const TEXT_STRING = 1 << 14;
        /// Transformation matrix
        const MATRIX = 1 << 15;
        /// Any value
        const ANY = 1 << 16;

        /// Mask selecting the value type bits
        const TYPE_MASK = (1 << 17) - 1;

        /// Key is optional
        const OPTIONAL = 1 << 24;
        /// Key is required
        const REQUIRED = 1 << 25;
        /// Value is inherited through the page tree
        const INHERITABLE = 1 << 26;
        /// Value must be an indirect reference
        const MUST_BE_INDIRECT = 1 << 27;
        /// Value must be a direct object
        const MUST_NOT_BE_INDIRECT = 1 << 28;
    }
}

/// Kinds of dictionaries the library can view a generic dictionary as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DictionaryKind {
    /// Plain dictionary without a schema
    #[default]
    Generic,
    /// File trailer
    Trailer,
    /// Document catalog
    Catalog,
    /// Document information dictionary
    Info,
    /// Page tree node
    Pages,
    /// Page object
    Page,
    /// Resource dictionary
    Resources,
    /// Font dictionary
    Font,
    /// Font descriptor
    FontDescriptor,
    /// External object (image or form)
    XObject,
    /// Content stream dictionary
    Content,
    /// Annotation
    Annotation,
    /// Outline root
    Outlines,
    /// Outline entry
    OutlineItem,
    /// Interactive form dictionary
    AcroForm,
    /// Form field
    Field,
}

/// Kinds of arrays the library can view a generic array as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArrayKind {
    /// Plain array without element schema
    #[default]
    Generic,
    /// `/Kids` of a page tree node
    Kids,
    /// `/Annots` of a page
    Annotations,
    /// `/Contents` of a page given as an array of streams
    Contents,
    /// `/Fields` of an interactive form
    Fields,
}

/// The concrete type a key's value is constructed as, or upgraded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// A dictionary of the given kind
    Dictionary(DictionaryKind),
    /// An array of the given kind
    Array(ArrayKind),
    /// Any other declared type; cannot be constructed automatically
    Other(&'static str),
}

/// Schema entry for one dictionary key.
#[derive(Debug, Clone)]
pub struct KeyDescriptor {
    /// Key name including the leading `/`
    pub key: &'static str,
    /// Declared type and constraint flags
    pub key_type: KeyType,
    /// Concrete type to construct, when it differs from the default for `key_type`
    pub object_type: Option<ValueType>,
    /// Fixed name value (e.g. `/Type /Page`)
    pub fixed_value: Option<&'static str>,
    /// PDF version that introduced the key, as major*10+minor
    pub version: u8,
}

impl KeyDescriptor {
    fn new(key: &'static str, key_type: KeyType) -> Self {
        Self {
            key,
            key_type,
            object_type: None,
            fixed_value: None,
            version: 10,
        }
    }

    fn of(mut self, object_type: ValueType) -> Self {
        self.object_type = Some(object_type);
        self
    }

    fn fixed(mut self, value: &'static str) -> Self {
        self.fixed_value = Some(value);
        self
    }

    fn since(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Whether the key is declared required.
    pub fn is_required(&self) -> bool {
        self.key_type.contains(KeyType::REQUIRED)
    }

    /// Whether the value must be stored as an indirect reference.
    pub fn must_be_indirect(&self) -> bool {
        self.key_type.contains(KeyType::MUST_BE_INDIRECT)
    }

    /// Whether the value must be stored directly.
    pub fn must_not_be_indirect(&self) -> bool {
        self.key_type.contains(KeyType::MUST_NOT_BE_INDIRECT)
    }

    /// The type a value for this key is constructed as.
    ///
    /// Uses the explicit object type when one is declared, otherwise derives
    /// it from the value type bits. Stream keys construct dictionaries.
    pub fn value_type(&self) -> ValueType {
        if let Some(object_type) = self.object_type {
            return object_type;
        }
        let ty = self.key_type & KeyType::TYPE_MASK;
        if ty.contains(KeyType::DICTIONARY) || ty.contains(KeyType::STREAM) {
            ValueType::Dictionary(DictionaryKind::Generic)
        } else if ty.contains(KeyType::ARRAY) {
            ValueType::Array(ArrayKind::Generic)
        } else if ty.contains(KeyType::NAME) {
            ValueType::Other("Name")
        } else if ty.contains(KeyType::STRING) || ty.contains(KeyType::TEXT_STRING) {
            ValueType::Other("String")
        } else if ty.contains(KeyType::BOOLEAN) {
            ValueType::Other("Boolean")
        } else if ty.contains(KeyType::INTEGER) {
            ValueType::Other("Integer")
        } else if ty.contains(KeyType::REAL) {
            ValueType::Other("Real")
        } else if ty.contains(KeyType::DATE) {
            ValueType::Other("Date")
        } else if ty.contains(KeyType::RECTANGLE) {
            ValueType::Other("Rectangle")
        } else if ty.contains(KeyType::NUMBER_TREE) {
            ValueType::Other("NumberTree")
        } else if ty.contains(KeyType::NAME_TREE) {
            ValueType::Other("NameTree")
        } else if ty.contains(KeyType::FILE_SPEC) {
            ValueType::Other("FileSpecification")
        } else if ty.contains(KeyType::FUNCTION) {
            ValueType::Other("Function")
        } else if ty.contains(KeyType::MATRIX) {
            ValueType::Other("Matrix")
        } else {
            ValueType::Other("Any")
        }
    }
}

/// Schema of one dictionary kind.
#[derive(Debug)]
pub struct DictionaryMeta {
    kind: DictionaryKind,
    keys: IndexMap<&'static str, KeyDescriptor>,
}

impl DictionaryMeta {
    fn new(kind: DictionaryKind, keys: Vec<KeyDescriptor>) -> Self {
        Self {
            kind,
            keys: keys.into_iter().map(|d| (d.key, d)).collect(),
        }
    }

    /// Kind this schema describes.
    pub fn kind(&self) -> DictionaryKind {
        self.kind
    }

    /// Descriptor for a key (with leading `/`), if declared.
    pub fn descriptor(&self, key: &str) -> Option<&KeyDescriptor> {
        self.keys.get(key)
    }

    /// Declared value type for a key, if declared.
    pub fn value_type(&self, key: &str) -> Option<ValueType> {
        self.descriptor(key).map(KeyDescriptor::value_type)
    }

    /// All declared descriptors, in declaration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &KeyDescriptor> {
        self.keys.values()
    }

    /// Keys that carry a fixed name value.
    pub fn fixed_values(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.keys
            .values()
            .filter_map(|d| d.fixed_value.map(|value| (d.key, value)))
    }
}

/// Schema of one array kind.
#[derive(Debug)]
pub struct ArrayMeta {
    kind: ArrayKind,
    element_type: Option<ValueType>,
}

impl ArrayMeta {
    /// Kind this schema describes.
    pub fn kind(&self) -> ArrayKind {
        self.kind
    }

    /// Declared element type, if any.
    pub fn element_type(&self) -> Option<ValueType> {
        self.element_type
    }
}

impl DictionaryKind {
    /// The shared schema of this kind.
    pub fn meta(self) -> &'static DictionaryMeta {
        DICTIONARY_METAS.get(&self).unwrap_or(&GENERIC_DICTIONARY_META)
    }
}

impl ArrayKind {
    /// The shared schema of this kind.
    pub fn meta(self) -> &'static ArrayMeta {
        match self {
            ArrayKind::Generic => &GENERIC_ARRAY_META,
            ArrayKind::Kids => &KIDS_META,
            ArrayKind::Annotations => &ANNOTATIONS_META,
            ArrayKind::Contents => &CONTENTS_META,
            ArrayKind::Fields => &FIELDS_META,
        }
    }
}

static GENERIC_ARRAY_META: ArrayMeta = ArrayMeta {
    kind: ArrayKind::Generic,
    element_type: None,
};
// Kids mix intermediate /Pages nodes and /Page leaves, so no element type.
static KIDS_META: ArrayMeta = ArrayMeta {
    kind: ArrayKind::Kids,
    element_type: None,
};
static ANNOTATIONS_META: ArrayMeta = ArrayMeta {
    kind: ArrayKind::Annotations,
    element_type: Some(ValueType::Dictionary(DictionaryKind::Annotation)),
};
static CONTENTS_META: ArrayMeta = ArrayMeta {
    kind: ArrayKind::Contents,
    element_type: Some(ValueType::Dictionary(DictionaryKind::Content)),
};
static FIELDS_META: ArrayMeta = ArrayMeta {
    kind: ArrayKind::Fields,
    element_type: Some(ValueType::Dictionary(DictionaryKind::Field)),
};

lazy_static! {
    static ref GENERIC_DICTIONARY_META: DictionaryMeta =
        DictionaryMeta::new(DictionaryKind::Generic, Vec::new());
    static ref DICTIONARY_METAS: HashMap<DictionaryKind, DictionaryMeta> = build_registry();
}

fn build_registry() -> HashMap<DictionaryKind, DictionaryMeta> {
    use DictionaryKind as K;
    use KeyDescriptor as D;
    use KeyType as T;

    let dict = |kind| ValueType::Dictionary(kind);
    let array = |kind| ValueType::Array(kind);
    let stream_keys = || {
        vec![
            D::new("/Length", T::INTEGER | T::REQUIRED),
            D::new("/Filter", T::NAME | T::ARRAY | T::OPTIONAL),
            D::new("/DecodeParms", T::DICTIONARY | T::ARRAY | T::OPTIONAL),
            D::new("/DL", T::INTEGER | T::OPTIONAL).since(15),
        ]
    };

    let metas = vec![
        DictionaryMeta::new(
            K::Trailer,
            vec![
                D::new("/Size", T::INTEGER | T::REQUIRED),
                D::new("/Prev", T::INTEGER | T::OPTIONAL),
                D::new("/Root", T::DICTIONARY | T::REQUIRED | T::MUST_BE_INDIRECT)
                    .of(dict(K::Catalog)),
                D::new("/Encrypt", T::DICTIONARY | T::OPTIONAL),
                D::new("/Info", T::DICTIONARY | T::OPTIONAL | T::MUST_BE_INDIRECT)
                    .of(dict(K::Info)),
                D::new("/ID", T::ARRAY | T::OPTIONAL).since(11),
                D::new("/XRefStm", T::INTEGER | T::OPTIONAL).since(15),
            ],
        ),
        DictionaryMeta::new(
            K::Catalog,
            vec![
                D::new("/Type", T::NAME | T::REQUIRED).fixed("/Catalog"),
                D::new("/Version", T::NAME | T::OPTIONAL).since(14),
                D::new("/Pages", T::DICTIONARY | T::REQUIRED | T::MUST_BE_INDIRECT)
                    .of(dict(K::Pages)),
                D::new("/PageLabels", T::NUMBER_TREE | T::OPTIONAL).since(13),
                D::new("/Names", T::DICTIONARY | T::OPTIONAL).since(12),
                D::new("/Dests", T::DICTIONARY | T::OPTIONAL | T::MUST_BE_INDIRECT).since(11),
                D::new("/ViewerPreferences", T::DICTIONARY | T::OPTIONAL).since(12),
                D::new("/PageLayout", T::NAME | T::OPTIONAL),
                D::new("/PageMode", T::NAME | T::OPTIONAL),
                D::new("/Outlines", T::DICTIONARY | T::OPTIONAL | T::MUST_BE_INDIRECT)
                    .of(dict(K::Outlines)),
                D::new("/AcroForm", T::DICTIONARY | T::OPTIONAL)
                    .of(dict(K::AcroForm))
                    .since(12),
                D::new("/Metadata", T::STREAM | T::OPTIONAL | T::MUST_BE_INDIRECT).since(14),
                D::new("/Lang", T::TEXT_STRING | T::OPTIONAL).since(14),
            ],
        ),
        DictionaryMeta::new(
            K::Info,
            vec![
                D::new("/Title", T::TEXT_STRING | T::OPTIONAL).since(11),
                D::new("/Author", T::TEXT_STRING | T::OPTIONAL),
                D::new("/Subject", T::TEXT_STRING | T::OPTIONAL).since(11),
                D::new("/Keywords", T::TEXT_STRING | T::OPTIONAL).since(11),
                D::new("/Creator", T::TEXT_STRING | T::OPTIONAL),
                D::new("/Producer", T::TEXT_STRING | T::OPTIONAL),
                D::new("/CreationDate", T::DATE | T::OPTIONAL),
                D::new("/ModDate", T::DATE | T::OPTIONAL).since(11),
                D::new("/Trapped", T::NAME | T::OPTIONAL).since(13),
            ],
        ),
        DictionaryMeta::new(
            K::Pages,
            vec![
                D::new("/Type", T::NAME | T::REQUIRED).fixed("/Pages"),
                D::new("/Parent", T::DICTIONARY | T::REQUIRED | T::MUST_BE_INDIRECT)
                    .of(dict(K::Pages)),
                D::new("/Kids", T::ARRAY | T::REQUIRED | T::MUST_NOT_BE_INDIRECT)
                    .of(array(ArrayKind::Kids)),
                D::new("/Count", T::INTEGER | T::REQUIRED),
            ],
        ),
        DictionaryMeta::new(
            K::Page,
            vec![
                D::new("/Type", T::NAME | T::REQUIRED).fixed("/Page"),
                D::new("/Parent", T::DICTIONARY | T::REQUIRED | T::MUST_BE_INDIRECT)
                    .of(dict(K::Pages)),
                D::new("/LastModified", T::DATE | T::OPTIONAL).since(13),
                D::new("/Resources", T::DICTIONARY | T::REQUIRED | T::INHERITABLE)
                    .of(dict(K::Resources)),
                D::new("/MediaBox", T::RECTANGLE | T::REQUIRED | T::INHERITABLE),
                D::new("/CropBox", T::RECTANGLE | T::OPTIONAL | T::INHERITABLE),
                D::new("/BleedBox", T::RECTANGLE | T::OPTIONAL).since(13),
                D::new("/TrimBox", T::RECTANGLE | T::OPTIONAL).since(13),
                D::new("/ArtBox", T::RECTANGLE | T::OPTIONAL).since(13),
                D::new("/Contents", T::STREAM | T::ARRAY | T::OPTIONAL)
                    .of(array(ArrayKind::Contents)),
                D::new("/Rotate", T::INTEGER | T::OPTIONAL | T::INHERITABLE),
                D::new("/Group", T::DICTIONARY | T::OPTIONAL).since(14),
                D::new("/Thumb", T::STREAM | T::OPTIONAL),
                D::new("/Annots", T::ARRAY | T::OPTIONAL).of(array(ArrayKind::Annotations)),
                D::new("/UserUnit", T::REAL | T::OPTIONAL).since(16),
                D::new("/Tabs", T::NAME | T::OPTIONAL).since(15),
            ],
        ),
        DictionaryMeta::new(
            K::Resources,
            vec![
                D::new("/ExtGState", T::DICTIONARY | T::OPTIONAL),
                D::new("/ColorSpace", T::DICTIONARY | T::OPTIONAL),
                D::new("/Pattern", T::DICTIONARY | T::OPTIONAL),
                D::new("/Shading", T::DICTIONARY | T::OPTIONAL).since(13),
                D::new("/XObject", T::DICTIONARY | T::OPTIONAL),
                D::new("/Font", T::DICTIONARY | T::OPTIONAL),
                D::new("/ProcSet", T::ARRAY | T::OPTIONAL),
                D::new("/Properties", T::DICTIONARY | T::OPTIONAL).since(12),
            ],
        ),
        DictionaryMeta::new(
            K::Font,
            vec![
                D::new("/Type", T::NAME | T::REQUIRED).fixed("/Font"),
                D::new("/Subtype", T::NAME | T::REQUIRED),
                D::new("/BaseFont", T::NAME | T::REQUIRED),
                D::new("/FirstChar", T::INTEGER | T::OPTIONAL),
                D::new("/LastChar", T::INTEGER | T::OPTIONAL),
                D::new("/Widths", T::ARRAY | T::OPTIONAL),
                D::new("/FontDescriptor", T::DICTIONARY | T::OPTIONAL | T::MUST_BE_INDIRECT)
                    .of(dict(K::FontDescriptor)),
                D::new("/Encoding", T::NAME | T::DICTIONARY | T::OPTIONAL),
                D::new("/ToUnicode", T::STREAM | T::OPTIONAL).since(12),
            ],
        ),
        DictionaryMeta::new(
            K::FontDescriptor,
            vec![
                D::new("/Type", T::NAME | T::REQUIRED).fixed("/FontDescriptor"),
                D::new("/FontName", T::NAME | T::REQUIRED),
                D::new("/Flags", T::INTEGER | T::REQUIRED),
                D::new("/FontBBox", T::RECTANGLE | T::REQUIRED),
                D::new("/ItalicAngle", T::REAL | T::REQUIRED),
                D::new("/Ascent", T::REAL | T::REQUIRED),
                D::new("/Descent", T::REAL | T::REQUIRED),
                D::new("/CapHeight", T::REAL | T::OPTIONAL),
                D::new("/StemV", T::REAL | T::REQUIRED),
                D::new("/FontFile", T::STREAM | T::OPTIONAL),
                D::new("/FontFile2", T::STREAM | T::OPTIONAL).since(11),
                D::new("/FontFile3", T::STREAM | T::OPTIONAL).since(12),
            ],
        ),
        DictionaryMeta::new(K::XObject, {
            let mut keys = stream_keys();
            keys.extend(vec![
                D::new("/Type", T::NAME | T::OPTIONAL).fixed("/XObject"),
                D::new("/Subtype", T::NAME | T::REQUIRED),
                D::new("/BBox", T::RECTANGLE | T::OPTIONAL),
                D::new("/Matrix", T::MATRIX | T::OPTIONAL),
                D::new("/Resources", T::DICTIONARY | T::OPTIONAL)
                    .of(dict(K::Resources))
                    .since(12),
                D::new("/Width", T::INTEGER | T::OPTIONAL),
                D::new("/Height", T::INTEGER | T::OPTIONAL),
                D::new("/ColorSpace", T::NAME | T::ARRAY | T::OPTIONAL),
                D::new("/BitsPerComponent", T::INTEGER | T::OPTIONAL),
                D::new("/SMask", T::STREAM | T::OPTIONAL | T::MUST_BE_INDIRECT).since(14),
            ]);
            keys
        }),
        DictionaryMeta::new(K::Content, stream_keys()),
        DictionaryMeta::new(
            K::Annotation,
            vec![
                D::new("/Type", T::NAME | T::OPTIONAL).fixed("/Annot"),
                D::new("/Subtype", T::NAME | T::REQUIRED),
                D::new("/Rect", T::RECTANGLE | T::REQUIRED),
                D::new("/Contents", T::TEXT_STRING | T::OPTIONAL),
                D::new("/P", T::DICTIONARY | T::OPTIONAL | T::MUST_BE_INDIRECT)
                    .of(dict(K::Page))
                    .since(13),
                D::new("/NM", T::TEXT_STRING | T::OPTIONAL).since(14),
                D::new("/M", T::DATE | T::OPTIONAL).since(11),
                D::new("/F", T::INTEGER | T::OPTIONAL).since(11),
                D::new("/AP", T::DICTIONARY | T::OPTIONAL).since(12),
                D::new("/AS", T::NAME | T::OPTIONAL).since(12),
                D::new("/Border", T::ARRAY | T::OPTIONAL),
                D::new("/C", T::ARRAY | T::OPTIONAL).since(11),
            ],
        ),
        DictionaryMeta::new(
            K::Outlines,
            vec![
                D::new("/Type", T::NAME | T::OPTIONAL).fixed("/Outlines"),
                D::new("/First", T::DICTIONARY | T::OPTIONAL | T::MUST_BE_INDIRECT)
                    .of(dict(K::OutlineItem)),
                D::new("/Last", T::DICTIONARY | T::OPTIONAL | T::MUST_BE_INDIRECT)
                    .of(dict(K::OutlineItem)),
                D::new("/Count", T::INTEGER | T::OPTIONAL),
            ],
        ),
        DictionaryMeta::new(
            K::OutlineItem,
            vec![
                D::new("/Title", T::TEXT_STRING | T::REQUIRED),
                D::new("/Parent", T::DICTIONARY | T::REQUIRED | T::MUST_BE_INDIRECT),
                D::new("/Prev", T::DICTIONARY | T::OPTIONAL | T::MUST_BE_INDIRECT)
                    .of(dict(K::OutlineItem)),
                D::new("/Next", T::DICTIONARY | T::OPTIONAL | T::MUST_BE_INDIRECT)
                    .of(dict(K::OutlineItem)),
                D::new("/First", T::DICTIONARY | T::OPTIONAL | T::MUST_BE_INDIRECT)
                    .of(dict(K::OutlineItem)),
                D::new("/Last", T::DICTIONARY | T::OPTIONAL | T::MUST_BE_INDIRECT)
                    .of(dict(K::OutlineItem)),
                D::new("/Count", T::INTEGER | T::OPTIONAL),
                D::new("/Dest", T::NAME | T::STRING | T::ARRAY | T::OPTIONAL),
                D::new("/A", T::DICTIONARY | T::OPTIONAL).since(11),
                D::new("/C", T::ARRAY | T::OPTIONAL).since(14),
                D::new("/F", T::INTEGER | T::OPTIONAL).since(14),
            ],
        ),
        DictionaryMeta::new(
            K::AcroForm,
            vec![
                D::new("/Fields", T::ARRAY | T::REQUIRED).of(array(ArrayKind::Fields)),
                D::new("/NeedAppearances", T::BOOLEAN | T::OPTIONAL),
                D::new("/SigFlags", T::INTEGER | T::OPTIONAL).since(13),
                D::new("/CO", T::ARRAY | T::OPTIONAL | T::MUST_BE_INDIRECT).since(13),
                D::new("/DR", T::DICTIONARY | T::OPTIONAL).of(dict(K::Resources)),
                D::new("/DA", T::STRING | T::OPTIONAL),
                D::new("/Q", T::INTEGER | T::OPTIONAL),
            ],
        ),
        DictionaryMeta::new(
            K::Field,
            vec![
                D::new("/FT", T::NAME | T::OPTIONAL),
                D::new("/Parent", T::DICTIONARY | T::OPTIONAL | T::MUST_BE_INDIRECT)
                    .of(dict(K::Field)),
                D::new("/Kids", T::ARRAY | T::OPTIONAL).of(array(ArrayKind::Fields)),
                D::new("/T", T::TEXT_STRING | T::OPTIONAL),
                D::new("/TU", T::TEXT_STRING | T::OPTIONAL).since(13),
                D::new("/TM", T::TEXT_STRING | T::OPTIONAL).since(13),
                D::new("/Ff", T::INTEGER | T::OPTIONAL),
                D::new("/V", T::ANY | T::OPTIONAL),
                D::new("/DV", T::ANY | T::OPTIONAL),
                D::new("/DA", T::STRING | T::OPTIONAL),
                D::new("/Rect", T::RECTANGLE | T::OPTIONAL),
                D::new("/P", T::DICTIONARY | T::OPTIONAL | T::MUST_BE_INDIRECT)
                    .of(dict(K::Page)),
            ],
        ),
    ];

    metas.into_iter().map(|meta| (meta.kind, meta)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_is_shared_per_kind() {
        let a = DictionaryKind::Page.meta();
        let b = DictionaryKind::Page.meta();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.kind(), DictionaryKind::Page);
    }

    #[test]
    fn test_generic_meta_has_no_keys() {
        let meta = DictionaryKind::Generic.meta();
        assert_eq!(meta.descriptors().count(), 0);
        assert!(meta.value_type("/Anything").is_none());
    }

    #[test]
    fn test_declared_object_type() {
        let meta = DictionaryKind::Page.meta();
        assert_eq!(
            meta.value_type("/Resources"),
            Some(ValueType::Dictionary(DictionaryKind::Resources))
        );
        assert_eq!(meta.value_type("/Annots"), Some(ValueType::Array(ArrayKind::Annotations)));
        assert!(meta.descriptor("/Parent").unwrap().must_be_indirect());
        assert!(meta.descriptor("/MediaBox").unwrap().is_required());
    }

    #[test]
    fn test_value_type_derived_from_key_type() {
        let meta = DictionaryKind::Resources.meta();
        assert_eq!(
            meta.value_type("/Font"),
            Some(ValueType::Dictionary(DictionaryKind::Generic))
        );
        assert_eq!(meta.value_type("/ProcSet"), Some(ValueType::Array(ArrayKind::Generic)));

        let meta = DictionaryKind::Catalog.meta();
        assert_eq!(meta.value_type("/PageLabels"), Some(ValueType::Other("NumberTree")));
        assert_eq!(meta.value_type("/PageMode"), Some(ValueType::Other("Name")));
    }

    #[test]
    fn test_fixed_values() {
        let fixed: Vec<_> = DictionaryKind::Pages.meta().fixed_values().collect();
        assert_eq!(fixed, vec![("/Type", "/Pages")]);
        assert_eq!(DictionaryKind::Info.meta().fixed_values().count(), 0);
    }

    #[test]
    fn test_version_recorded() {
        let meta = DictionaryKind::Page.meta();
        assert_eq!(meta.descriptor("/UserUnit").unwrap().version, 16);
        assert_eq!(meta.descriptor("/MediaBox").unwrap().version, 10);
    }

    #[test]
    fn test_array_meta_element_type() {
        assert_eq!(
            ArrayKind::Annotations.meta().element_type(),
            Some(ValueType::Dictionary(DictionaryKind::Annotation))
        );
        assert!(ArrayKind::Kids.meta().element_type().is_none());
        assert_eq!(ArrayKind::Fields.meta().kind(), ArrayKind::Fields);
    }
}
