//! Error types for the PDF object graph.
//!
//! Errors fall into three groups:
//! - corruption of the source document (dangling references, malformed values),
//! - misuse of the API (wrong-type access, bad indices, indirectness violations),
//! - schema entries the library cannot construct automatically.
//!
//! None of them are retried. A failed call leaves the graph as it was before the call.

use crate::object_id::ObjectId;

/// Result type alias for object graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building, importing or writing a PDF object graph.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Indirect reference whose target does not exist
    #[error("Dangling reference: object {0} R has no value (corrupt source document)")]
    DanglingReference(ObjectId),

    /// Value present but structurally invalid (e.g. rectangle array with 3 elements)
    #[error("Corrupt object{}: {reason}", .id.map(|id| format!(" {}", id)).unwrap_or_default())]
    Corrupt {
        /// Object the value belongs to, when known
        id: Option<ObjectId>,
        /// What was wrong
        reason: String,
    },

    /// Value stored under a key has a different type than the one requested
    #[error("Invalid cast for {key}: expected {expected}, found {found}")]
    InvalidCast {
        /// Dictionary key or array index the value was read from
        key: String,
        /// Requested type
        expected: &'static str,
        /// Actual type found
        found: &'static str,
    },

    /// Array index outside of the valid range
    #[error("Index {index} out of range for array of length {len}")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Array length
        len: usize,
    },

    /// Operation not permitted in the current state of the object or document
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Object is already owned by another document
    #[error("Object is already attached to another document")]
    AlreadyAttached,

    /// Indirect object is currently borrowed (e.g. a dictionary referring to itself)
    #[error("Object {0} R is already borrowed")]
    ObjectBorrowed(ObjectId),

    /// Declared schema type the library cannot construct automatically
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Unsupported stream filter
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Stream encoding or decoding error
    #[error("Stream filter error: {0}")]
    Decode(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a corruption error without a known object id.
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Error::Corrupt {
            id: None,
            reason: reason.into(),
        }
    }

    /// Shorthand for an invalid operation error.
    pub(crate) fn invalid_operation(reason: impl Into<String>) -> Self {
        Error::InvalidOperation(reason.into())
    }

    /// Shorthand for a wrong-type access.
    pub(crate) fn invalid_cast(
        key: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Error::InvalidCast {
            key: key.into(),
            expected,
            found,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_reference_error() {
        let err = Error::DanglingReference(ObjectId::new(10, 0));
        let msg = format!("{}", err);
        assert!(msg.contains("10 0 R"));
        assert!(msg.contains("corrupt"));
    }

    #[test]
    fn test_corrupt_error_with_and_without_id() {
        let err = Error::Corrupt {
            id: Some(ObjectId::new(3, 0)),
            reason: "bad rectangle".to_string(),
        };
        assert_eq!(format!("{}", err), "Corrupt object 3 0: bad rectangle");

        let err = Error::corrupt("bad matrix");
        assert_eq!(format!("{}", err), "Corrupt object: bad matrix");
    }

    #[test]
    fn test_invalid_cast_error() {
        let err = Error::InvalidCast {
            key: "/Count".to_string(),
            expected: "Integer",
            found: "Name",
        };
        let msg = format!("{}", err);
        assert!(msg.contains("/Count"));
        assert!(msg.contains("Integer"));
        assert!(msg.contains("Name"));
    }

    #[test]
    fn test_index_out_of_range_error() {
        let err = Error::IndexOutOfRange { index: 5, len: 2 };
        let msg = format!("{}", err);
        assert!(msg.contains('5'));
        assert!(msg.contains('2'));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
