//! KIR: the canonical JSON serialization of the Kryon IR.
//!
//! The wrapper object carries the component tree (`root`), the reactive
//! manifest, the stylesheet, the bytecode logic block, and document
//! metadata. A source → IR → KIR → IR path reproduces the originally
//! observable structure and properties.
//!
//! # Example
//!
//! ```rust
//! use kryon_core::ComponentKind;
//! use kryon_kir::{from_str, to_string, KirDocument};
//!
//! let mut doc = KirDocument::new();
//! doc.context.create_root(ComponentKind::Container);
//! let text = to_string(&doc).unwrap();
//! let back = from_str(&text).unwrap();
//! assert!(back.context.root().is_some());
//! ```

pub mod binary;
mod de;
mod document;
mod error;
mod logic_json;
mod payload_json;
mod ser;
mod style_json;

pub use binary::{
    is_binary, read_header, write_header, HEADER_LEN, KRY_MAGIC, KRY_VERSION_MAJOR,
    KRY_VERSION_MINOR,
};
pub use de::{component_from_json, document_from_json, from_str};
pub use document::KirDocument;
pub use error::{KirError, Result};
pub use ser::{component_to_json, document_to_json, to_string, to_string_pretty};
