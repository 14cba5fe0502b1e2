//! Kryon runtime
//!
//! Everything that happens after parsing:
//!
//! - **ForEach expansion**: template instances materialized from inline
//!   or runtime data sources
//! - **Runtime orchestration**: the state manager's updates applied to
//!   the manifest, the VM, and the tree
//! - **File watching**: the polled notify wrapper behind hot reload

pub mod foreach;
mod runtime;
pub mod watcher;

pub use foreach::{expand_all, expand_foreach, expand_with_elements, RUNTIME_SOURCE};
pub use runtime::Runtime;
pub use watcher::{FileWatcher, FsEvent, FsEventKind};
