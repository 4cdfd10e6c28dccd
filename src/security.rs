//! Write-time encryption hook.
//!
//! PDF Spec: ISO 32000-1:2008, Section 7.6 - Encryption.
//!
//! The object model never stores encrypted bytes. When a document is saved
//! with a [`SecurityHandler`], the writer passes every string and stream
//! payload through it together with the id of the indirect object that
//! contains the value, which is what the standard security handler needs
//! to derive per-object keys. Key derivation and the `/Encrypt` dictionary
//! itself are the handler's business.

use crate::object_id::ObjectId;

/// Encrypts string and stream bytes for one indirect object.
pub trait SecurityHandler {
    /// Encrypt a string found inside object `id`.
    fn encrypt_string(&self, id: ObjectId, data: &[u8]) -> Vec<u8>;

    /// Encrypt the stream data of object `id`.
    fn encrypt_stream(&self, id: ObjectId, data: &[u8]) -> Vec<u8>;

    /// Whether `/Type /Metadata` streams are encrypted (`/EncryptMetadata`).
    fn encrypt_metadata(&self) -> bool {
        true
    }
}
