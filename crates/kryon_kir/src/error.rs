//! Error types for KIR encode/decode.

use thiserror::Error;

/// Errors surfaced by the serializer and deserializer.
#[derive(Error, Debug)]
pub enum KirError {
    /// Malformed JSON at the top level.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent.
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// A field holds a value of the wrong shape.
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    /// KIR numbers are finite-float only.
    #[error("non-finite number in field '{0}'")]
    NonFinite(&'static str),

    /// The binary header magic did not match `KRY\0`.
    #[error("bad binary magic")]
    BadMagic,

    /// The binary header is shorter than magic + version.
    #[error("truncated binary header")]
    TruncatedHeader,
}

/// Result type for KIR operations.
pub type Result<T> = std::result::Result<T, KirError>;
