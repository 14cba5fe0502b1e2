//! Arena-backed component tree.
//!
//! Nodes live in a slotmap; parents and children refer to each other by
//! stable [`NodeKey`] handles, with an auxiliary id→key map for lookups by
//! serialized [`ComponentId`]. Destruction detaches a subtree and drops it
//! wholesale.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::component::{Component, ComponentId, ComponentKind, DirtyFlags};

slotmap::new_key_type! {
    /// Stable handle to a component in the tree arena.
    pub struct NodeKey;
}

/// The component tree: arena, id map, and root.
pub struct ComponentTree {
    nodes: SlotMap<NodeKey, Component>,
    ids: FxHashMap<ComponentId, NodeKey>,
    root: Option<NodeKey>,
    next_id: u32,
}

impl Default for ComponentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentTree {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            ids: FxHashMap::default(),
            root: None,
            next_id: 1,
        }
    }

    /// Number of live components.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeKey> {
        self.root
    }

    pub fn set_root(&mut self, key: NodeKey) -> bool {
        if !self.nodes.contains_key(key) {
            tracing::warn!("set_root on a key not in this tree");
            return false;
        }
        self.root = Some(key);
        true
    }

    pub fn get(&self, key: NodeKey) -> Option<&Component> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut Component> {
        self.nodes.get_mut(key)
    }

    /// Create a component with the next monotonic id.
    pub fn create(&mut self, kind: ComponentKind) -> NodeKey {
        let id = ComponentId(self.next_id);
        self.next_id += 1;
        let key = self.nodes.insert(Component::new(id, kind));
        self.ids.insert(id, key);
        key
    }

    /// Create a component with an explicit id (deserialization path).
    /// Fails when the id is already taken.
    pub fn create_with_id(&mut self, kind: ComponentKind, id: ComponentId) -> Option<NodeKey> {
        if self.ids.contains_key(&id) {
            tracing::warn!(id = id.0, "duplicate component id rejected");
            return None;
        }
        let key = self.nodes.insert(Component::new(id, kind));
        self.ids.insert(id, key);
        if id.0 >= self.next_id {
            self.next_id = id.0 + 1;
        }
        Some(key)
    }

    /// Look up a component by its serialized id.
    pub fn find_by_id(&self, id: ComponentId) -> Option<NodeKey> {
        self.ids.get(&id).copied()
    }

    /// Attach `child` as the last child of `parent`, updating both
    /// directions and invalidating the parent's layout cache. Invalid
    /// relationships (missing nodes, self-attachment, cycles, an already
    /// attached child) are rejected as no-ops.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) -> bool {
        if parent == child
            || !self.nodes.contains_key(parent)
            || !self.nodes.contains_key(child)
        {
            tracing::warn!("add_child rejected: invalid parent/child pair");
            return false;
        }
        if self.nodes[child].parent.is_some() {
            tracing::warn!("add_child rejected: child already attached");
            return false;
        }
        // Attaching an ancestor under its own descendant would form a cycle.
        if self.is_ancestor(child, parent) {
            tracing::warn!("add_child rejected: would create a cycle");
            return false;
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        // Propagate from the child so the new parent chain picks up
        // SUBTREE and loses its cached intrinsics.
        self.mark_dirty(child);
        true
    }

    /// Detach `child` from `parent`. The child stays in the arena.
    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> bool {
        let Some(parent_node) = self.nodes.get_mut(parent) else {
            return false;
        };
        let Some(pos) = parent_node.children.iter().position(|&k| k == child) else {
            return false;
        };
        parent_node.children.remove(pos);
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = None;
        }
        self.mark_dirty(parent);
        true
    }

    /// Destroy a component and its whole subtree, detaching it from its
    /// parent first. Frees arena slots and id-map entries depth-first.
    pub fn destroy(&mut self, key: NodeKey) {
        if !self.nodes.contains_key(key) {
            return;
        }
        if let Some(parent) = self.nodes[key].parent {
            self.remove_child(parent, key);
        }
        if self.root == Some(key) {
            self.root = None;
        }
        let mut stack = vec![key];
        let mut order = Vec::new();
        while let Some(k) = stack.pop() {
            order.push(k);
            if let Some(node) = self.nodes.get(k) {
                stack.extend(node.children.iter().copied());
            }
        }
        // Children drop before their parents.
        for k in order.into_iter().rev() {
            if let Some(node) = self.nodes.remove(k) {
                self.ids.remove(&node.id);
            }
        }
    }

    /// Deep-copy a subtree. Copies receive fresh ids and reset layout
    /// state: not yet laid out, cache invalid, marked for layout.
    pub fn deep_copy(&mut self, key: NodeKey) -> Option<NodeKey> {
        if !self.nodes.contains_key(key) {
            return None;
        }
        let copy = self.copy_node(key);
        Some(copy)
    }

    fn copy_node(&mut self, key: NodeKey) -> NodeKey {
        let mut cloned = self.nodes[key].clone();
        let id = ComponentId(self.next_id);
        self.next_id += 1;
        cloned.id = id;
        cloned.parent = None;
        cloned.children = Vec::new();
        cloned.bounds = Default::default();
        cloned.layout_cache = Default::default();
        cloned.dirty = DirtyFlags::LAYOUT;
        let copy_key = self.nodes.insert(cloned);
        self.ids.insert(id, copy_key);

        let child_keys: Vec<NodeKey> = self.nodes[key].children.clone();
        for child in child_keys {
            let child_copy = self.copy_node(child);
            self.nodes[child_copy].parent = Some(copy_key);
            self.nodes[copy_key].children.push(child_copy);
        }
        copy_key
    }

    /// Replace `old_child` in `parent.children` with `new_children`,
    /// preserving sibling order around the splice point. The new children
    /// are re-parented; `old_child` is detached but not destroyed.
    pub fn replace_child_with(
        &mut self,
        parent: NodeKey,
        old_child: NodeKey,
        new_children: &[NodeKey],
    ) -> bool {
        let Some(parent_node) = self.nodes.get(parent) else {
            return false;
        };
        let Some(pos) = parent_node.children.iter().position(|&k| k == old_child) else {
            return false;
        };
        let mut rebuilt = Vec::with_capacity(parent_node.children.len() + new_children.len());
        rebuilt.extend_from_slice(&parent_node.children[..pos]);
        rebuilt.extend_from_slice(new_children);
        rebuilt.extend_from_slice(&parent_node.children[pos + 1..]);
        self.nodes[parent].children = rebuilt;
        self.nodes[old_child].parent = None;
        for &k in new_children {
            if let Some(node) = self.nodes.get_mut(k) {
                node.parent = Some(parent);
            }
        }
        self.mark_dirty(parent);
        true
    }

    /// True when `ancestor` lies on the parent chain of `node`.
    pub fn is_ancestor(&self, node: NodeKey, ancestor: NodeKey) -> bool {
        let mut cur = self.nodes.get(node).and_then(|n| n.parent);
        while let Some(k) = cur {
            if k == ancestor {
                return true;
            }
            cur = self.nodes.get(k).and_then(|n| n.parent);
        }
        false
    }

    /// Keys of the subtree rooted at `key`, pre-order.
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(node) = self.nodes.get(k) {
                out.push(k);
                // Reverse keeps pre-order with a LIFO stack.
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Dirty propagation
    // ------------------------------------------------------------------

    /// Mark `key` as needing layout and walk its ancestors, setting
    /// SUBTREE and invalidating each ancestor's intrinsic cache.
    pub fn mark_dirty(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        node.dirty |= DirtyFlags::LAYOUT;
        node.layout_cache.invalidate();
        let mut cur = node.parent;
        while let Some(k) = cur {
            let ancestor = &mut self.nodes[k];
            ancestor.dirty |= DirtyFlags::SUBTREE;
            ancestor.layout_cache.invalidate();
            cur = ancestor.parent;
        }
    }

    /// Mark a visual-only change. Does not propagate: render dirt never
    /// invalidates parent geometry.
    pub fn mark_render_dirty(&mut self, key: NodeKey) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.dirty |= DirtyFlags::RENDER;
        }
    }

    /// Mark every node of a subtree for layout, then restore the ancestor
    /// invariant above `key`.
    pub fn invalidate_subtree(&mut self, key: NodeKey) {
        for k in self.descendants(key) {
            let node = &mut self.nodes[k];
            node.dirty |= DirtyFlags::LAYOUT | DirtyFlags::SUBTREE;
            node.layout_cache.invalidate();
        }
        self.mark_dirty(key);
    }

    /// Invalidate one node's intrinsic cache, bump its generation, and
    /// propagate dirt upward.
    pub fn invalidate_cache(&mut self, key: NodeKey) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.layout_cache.invalidate();
            node.layout_cache.generation = node.layout_cache.generation.wrapping_add(1);
        }
        self.mark_dirty(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::INTRINSIC_UNCACHED;

    fn tree_with_row(children: usize) -> (ComponentTree, NodeKey, Vec<NodeKey>) {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Row);
        tree.set_root(root);
        let mut keys = Vec::new();
        for _ in 0..children {
            let c = tree.create(ComponentKind::Button);
            assert!(tree.add_child(root, c));
            keys.push(c);
        }
        (tree, root, keys)
    }

    #[test]
    fn ids_are_monotonic() {
        let (tree, root, keys) = tree_with_row(3);
        assert_eq!(tree.get(root).unwrap().id, ComponentId(1));
        assert_eq!(tree.get(keys[2]).unwrap().id, ComponentId(4));
    }

    #[test]
    fn parent_contains_child_exactly_once() {
        let (tree, root, keys) = tree_with_row(3);
        for &k in &keys {
            let count = tree
                .get(root)
                .unwrap()
                .children
                .iter()
                .filter(|&&c| c == k)
                .count();
            assert_eq!(count, 1);
            assert_eq!(tree.get(k).unwrap().parent, Some(root));
        }
    }

    #[test]
    fn add_child_rejects_cycles_and_reattachment() {
        let mut tree = ComponentTree::new();
        let a = tree.create(ComponentKind::Container);
        let b = tree.create(ComponentKind::Container);
        let c = tree.create(ComponentKind::Container);
        assert!(tree.add_child(a, b));
        assert!(tree.add_child(b, c));
        // Self, cycle, and double-attach are all silent no-ops.
        assert!(!tree.add_child(a, a));
        assert!(!tree.add_child(c, a));
        assert!(!tree.add_child(a, c));
        assert_eq!(tree.get(a).unwrap().children, vec![b]);
    }

    #[test]
    fn destroy_frees_whole_subtree() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Container);
        let mid = tree.create(ComponentKind::Column);
        let leaf = tree.create(ComponentKind::Text);
        tree.add_child(root, mid);
        tree.add_child(mid, leaf);
        let leaf_id = tree.get(leaf).unwrap().id;

        tree.destroy(mid);
        assert_eq!(tree.len(), 1);
        assert!(tree.get(root).unwrap().children.is_empty());
        assert!(tree.find_by_id(leaf_id).is_none());
    }

    #[test]
    fn mark_dirty_propagates_subtree_to_ancestors() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Container);
        let mid = tree.create(ComponentKind::Column);
        let leaf = tree.create(ComponentKind::Text);
        tree.add_child(root, mid);
        tree.add_child(mid, leaf);

        // Simulate a clean tree.
        for k in [root, mid, leaf] {
            let node = tree.get_mut(k).unwrap();
            node.dirty = DirtyFlags::empty();
            node.layout_cache.dirty = false;
            node.layout_cache.intrinsic_width = 10.0;
            node.layout_cache.intrinsic_height = 10.0;
        }

        tree.mark_dirty(leaf);
        assert!(tree.get(leaf).unwrap().dirty.contains(DirtyFlags::LAYOUT));
        for k in [root, mid] {
            let node = tree.get(k).unwrap();
            assert!(node.dirty.contains(DirtyFlags::SUBTREE));
            assert!(node.layout_cache.dirty);
            assert_eq!(node.layout_cache.intrinsic_height, INTRINSIC_UNCACHED);
        }
    }

    #[test]
    fn render_dirty_does_not_propagate() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Container);
        let leaf = tree.create(ComponentKind::Text);
        tree.add_child(root, leaf);
        tree.get_mut(root).unwrap().dirty = DirtyFlags::empty();

        tree.mark_render_dirty(leaf);
        assert!(tree.get(leaf).unwrap().dirty.contains(DirtyFlags::RENDER));
        assert_eq!(tree.get(root).unwrap().dirty, DirtyFlags::empty());
    }

    #[test]
    fn invalidate_cache_bumps_generation() {
        let mut tree = ComponentTree::new();
        let n = tree.create(ComponentKind::Text);
        let before = tree.get(n).unwrap().layout_cache.generation;
        tree.invalidate_cache(n);
        assert_eq!(tree.get(n).unwrap().layout_cache.generation, before + 1);
    }

    #[test]
    fn deep_copy_resets_layout_state_and_ids() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Container);
        let child = tree.create(ComponentKind::Button);
        tree.add_child(root, child);
        tree.get_mut(child).unwrap().text_content = Some("hi".into());
        tree.get_mut(root).unwrap().bounds.valid = true;

        let copy = tree.deep_copy(root).unwrap();
        let copy_node = tree.get(copy).unwrap();
        assert_ne!(copy_node.id, tree.get(root).unwrap().id);
        assert!(!copy_node.bounds.valid);
        assert!(copy_node.layout_cache.dirty);
        assert_eq!(copy_node.children.len(), 1);
        let copy_child = tree.get(copy_node.children[0]).unwrap();
        assert_eq!(copy_child.text_content.as_deref(), Some("hi"));
        assert_eq!(copy_child.parent, Some(copy));
    }

    #[test]
    fn replace_child_with_splices_in_order() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Container);
        let a = tree.create(ComponentKind::Text);
        let b = tree.create(ComponentKind::ForEach);
        let c = tree.create(ComponentKind::Text);
        for k in [a, b, c] {
            tree.add_child(root, k);
        }
        let x = tree.create(ComponentKind::Button);
        let y = tree.create(ComponentKind::Button);
        assert!(tree.replace_child_with(root, b, &[x, y]));
        assert_eq!(tree.get(root).unwrap().children, vec![a, x, y, c]);
        assert_eq!(tree.get(x).unwrap().parent, Some(root));
        assert!(tree.get(b).unwrap().parent.is_none());
    }

    #[test]
    fn create_with_id_rejects_duplicates() {
        let mut tree = ComponentTree::new();
        assert!(tree
            .create_with_id(ComponentKind::Container, ComponentId(7))
            .is_some());
        assert!(tree
            .create_with_id(ComponentKind::Text, ComponentId(7))
            .is_none());
        // Monotonic allocation continues past explicit ids.
        let next = tree.create(ComponentKind::Text);
        assert_eq!(tree.get(next).unwrap().id, ComponentId(8));
    }
}
