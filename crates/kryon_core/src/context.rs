//! The IR context: the component tree plus document-level metadata.
//!
//! The context is passed explicitly to every public entry point; there is
//! no process-wide singleton. Lifecycle is create → populate → use → drop.

use crate::component::{ComponentId, ComponentKind};
use crate::stylesheet::Stylesheet;
use crate::tree::{ComponentTree, NodeKey};

/// Document-level metadata carried through serialization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentMetadata {
    pub source_language: Option<String>,
    pub module_name: Option<String>,
    /// Any further metadata fields, preserved verbatim.
    pub extra: Option<serde_json::Value>,
}

/// Application window metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct AppMetadata {
    pub window_title: String,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            window_title: String::new(),
            window_width: 800.0,
            window_height: 600.0,
        }
    }
}

/// Everything a document owns besides its reactive manifest: the tree, the
/// stylesheet, and round-trip metadata blocks.
#[derive(Default)]
pub struct IrContext {
    pub tree: ComponentTree,
    pub stylesheet: Stylesheet,
    pub metadata: DocumentMetadata,
    pub app: AppMetadata,
    /// Preserved verbatim when the source language was C.
    pub c_metadata: Option<serde_json::Value>,
    /// Authoring-time constructs preserved for round-trip.
    pub source_structures: Option<serde_json::Value>,
}

impl IrContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a component and make it the document root.
    pub fn create_root(&mut self, kind: ComponentKind) -> NodeKey {
        let key = self.tree.create(kind);
        self.tree.set_root(key);
        key
    }

    pub fn root(&self) -> Option<NodeKey> {
        self.tree.root()
    }

    pub fn find_by_id(&self, id: ComponentId) -> Option<NodeKey> {
        self.tree.find_by_id(id)
    }

    /// Tear down the document: drops the tree, id map, and stylesheet.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_lifecycle() {
        let mut ctx = IrContext::new();
        assert!(ctx.root().is_none());
        let root = ctx.create_root(ComponentKind::Container);
        assert_eq!(ctx.root(), Some(root));
        ctx.clear();
        assert!(ctx.root().is_none());
        assert!(ctx.tree.is_empty());
    }
}
