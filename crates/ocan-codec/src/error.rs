// SPDX-License-Identifier: MIT OR Apache-2.0
use thiserror::Error;

/// Everything that can go wrong turning a [`crate::Value`] into JSON text,
/// or JSON text back into one.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A value the encoder has no wire representation for (functions,
    /// symbols, and other host objects are excluded from this domain by
    /// design). Per §4.A's `UnsupportedType { path, constructorName }`.
    #[error("unsupported type {constructor_name:?} at {path}")]
    UnsupportedType {
        /// A dotted/bracketed path from the document root to the offending
        /// value (e.g. `"root.items[2]"`).
        path: String,
        /// The value's runtime constructor name, for diagnostics.
        constructor_name: String,
    },

    /// The document's top-level JSON shape (`root`/`index`) was malformed.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// An index entry carried a `tag` this decoder doesn't recognize. Per
    /// §4.A's `UnknownTag { tag, id }`.
    #[error("unknown tag {tag:?} at index {id}")]
    UnknownTag {
        /// The unrecognized tag text.
        tag: String,
        /// The `index` position (or, for a tag nested inside an entry's own
        /// payload such as a typed array's element kind, the position of
        /// the enclosing entry) where the tag was found.
        id: usize,
    },

    /// A `$ref` pointed outside the bounds of the `index` table.
    #[error("dangling reference to index {0}")]
    DanglingReference(usize),

    /// The underlying `serde_json` parse or serialize step failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 payload for an `ArrayBuffer` failed to decode.
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}
