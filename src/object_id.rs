//! Object and document identities.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of an indirect object: object number plus generation number.
///
/// Object number 0 is reserved for [`ObjectId::EMPTY`], meaning "not an indirect object".
/// Equality and ordering are structural (number first, then generation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId {
    /// Object number
    pub number: u32,
    /// Generation number
    pub generation: u16,
}

impl ObjectId {
    /// The empty id, used by objects that are not indirect.
    pub const EMPTY: ObjectId = ObjectId {
        number: 0,
        generation: 0,
    };

    /// Create a new object id.
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    /// Whether this is the empty id.
    pub fn is_empty(&self) -> bool {
        self.number == 0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.number, self.generation)
    }
}

impl From<(u32, u16)> for ObjectId {
    fn from((number, generation): (u32, u16)) -> Self {
        Self::new(number, generation)
    }
}

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`PdfDocument`](crate::document::PdfDocument).
///
/// References and objects record the id of the document that owns them so that
/// cross-document links can be detected without holding the document itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    pub(crate) fn next() -> Self {
        DocumentId(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}
