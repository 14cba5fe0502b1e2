//! Error types for kryon_core.

use thiserror::Error;

/// Errors surfaced by core tree and document operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A component id was not found in the document.
    #[error("unknown component id {0}")]
    UnknownComponent(u32),

    /// A growth request would overflow the capacity guard.
    #[error("capacity overflow growing {0}")]
    CapacityOverflow(&'static str),

    /// Variant-specific validation failed.
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Result type for kryon_core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
