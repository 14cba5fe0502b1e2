//! Kryon HTML/CSS backend
//!
//! Emits a web page from the IR: one element per component with
//! `id="kryon-<id>"` and a canonical per-variant class, semantic
//! overrides for headings, lists, code blocks, links, and table cells,
//! inline event wiring, and CSS rules derived from style and layout
//! records.

mod css;
mod html;
mod page;

pub use css::emit_css;
pub use html::{css_class, emit_component};
pub use page::emit_page;
