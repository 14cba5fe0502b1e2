//! Kryon layout engine
//!
//! Annotates a component tree with pixel geometry:
//!
//! - **Intrinsic sizing**: content-driven measurement with per-node
//!   caching and dirty-driven invalidation
//! - **Flex solver**: two-pass row/column layout with grow distribution
//! - **Grid solver**: track sizing, cursor auto-placement, cell alignment
//!
//! # Example
//!
//! ```rust
//! use kryon_core::{ComponentKind, ComponentTree, Size};
//! use kryon_layout::LayoutEngine;
//!
//! let mut tree = ComponentTree::new();
//! let root = tree.create(ComponentKind::Column);
//! tree.set_root(root);
//! let engine = LayoutEngine::new(Size::new(800.0, 600.0));
//! engine.compute_root(&mut tree);
//! assert!(tree.get(root).unwrap().bounds.valid);
//! ```

mod engine;
mod flex;
mod grid;
mod intrinsic;

pub use engine::LayoutEngine;

#[cfg(test)]
mod tests {
    use super::*;
    use kryon_core::{
        ComponentKind, ComponentTree, Dimension, DirtyFlags, NodeKey, PositionMode, Size, Spacing,
    };

    fn engine() -> LayoutEngine {
        LayoutEngine::new(Size::new(800.0, 600.0))
    }

    fn assert_subtree_clean_and_valid(tree: &ComponentTree, key: NodeKey) {
        let node = tree.get(key).unwrap();
        assert!(node.bounds.valid, "bounds invalid for {}", node.id);
        assert!(
            !node
                .dirty
                .intersects(DirtyFlags::LAYOUT | DirtyFlags::SUBTREE),
            "layout dirt left on {}",
            node.id
        );
        for &child in &node.children {
            assert_subtree_clean_and_valid(tree, child);
        }
    }

    #[test]
    fn compute_clears_flags_and_validates_bounds() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Container);
        tree.set_root(root);
        let mid = tree.create(ComponentKind::Column);
        tree.add_child(root, mid);
        for _ in 0..3 {
            let t = tree.create(ComponentKind::Text);
            tree.get_mut(t).unwrap().text_content = Some("hello".into());
            tree.add_child(mid, t);
        }
        engine().compute_root(&mut tree);
        assert_subtree_clean_and_valid(&tree, root);
    }

    #[test]
    fn clean_subtree_is_skipped() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Container);
        tree.set_root(root);
        let child = tree.create(ComponentKind::Text);
        tree.add_child(root, child);
        let engine = engine();
        engine.compute_root(&mut tree);

        // Tamper with bounds; a clean recompute must not touch them.
        tree.get_mut(child).unwrap().bounds.x = 123.0;
        engine.compute_root(&mut tree);
        assert_eq!(tree.get(child).unwrap().bounds.x, 123.0);

        // After dirtying, the pass reruns and repositions.
        tree.mark_dirty(child);
        engine.compute_root(&mut tree);
        assert_eq!(tree.get(child).unwrap().bounds.x, 0.0);
    }

    #[test]
    fn absolute_positioning_uses_absolute_coords() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Container);
        tree.set_root(root);
        let float = tree.create(ComponentKind::Container);
        {
            let style = tree.get_mut(float).unwrap().style_mut();
            style.position = PositionMode::Absolute;
            style.absolute_x = 50.0;
            style.absolute_y = 60.0;
            style.width = Dimension::Px(10.0);
            style.height = Dimension::Px(10.0);
        }
        tree.add_child(root, float);
        engine().compute_root(&mut tree);
        let b = tree.get(float).unwrap().bounds;
        assert_eq!((b.x, b.y), (50.0, 60.0));
    }

    #[test]
    fn percent_dimensions_resolve_against_availability() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Container);
        tree.set_root(root);
        {
            let style = tree.get_mut(root).unwrap().style_mut();
            style.width = Dimension::Percent(50.0);
            style.height = Dimension::Px(100.0);
        }
        engine().compute_root(&mut tree);
        assert_eq!(tree.get(root).unwrap().bounds.width, 400.0);
    }

    #[test]
    fn aspect_ratio_fills_the_auto_axis() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Container);
        tree.set_root(root);
        let image = tree.create(ComponentKind::Image);
        {
            let node = tree.get_mut(image).unwrap();
            node.style_mut().width = Dimension::Px(200.0);
            node.layout_mut().aspect_ratio = 2.0;
        }
        tree.add_child(root, image);
        engine().compute_root(&mut tree);
        let b = tree.get(image).unwrap().bounds;
        assert_eq!((b.width, b.height), (200.0, 100.0));
    }

    #[test]
    fn padding_insets_children() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Column);
        tree.set_root(root);
        tree.get_mut(root).unwrap().layout_mut().padding = Spacing::all(12.0);
        let child = tree.create(ComponentKind::Text);
        tree.get_mut(child).unwrap().text_content = Some("x".into());
        tree.add_child(root, child);
        engine().compute_root(&mut tree);
        let b = tree.get(child).unwrap().bounds;
        assert_eq!((b.x, b.y), (12.0, 12.0));
    }

    #[test]
    fn min_max_constraints_clamp_resolution() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Container);
        tree.set_root(root);
        let boxed = tree.create(ComponentKind::Container);
        {
            let node = tree.get_mut(boxed).unwrap();
            node.style_mut().width = Dimension::Px(900.0);
            node.style_mut().height = Dimension::Px(10.0);
            let layout = node.layout_mut();
            layout.max_width = Dimension::Px(500.0);
            layout.min_height = Dimension::Px(40.0);
        }
        tree.add_child(root, boxed);
        engine().compute_root(&mut tree);
        let b = tree.get(boxed).unwrap().bounds;
        assert_eq!((b.width, b.height), (500.0, 40.0));
    }

    #[test]
    fn viewport_units_resolve_against_engine_viewport() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Container);
        tree.set_root(root);
        let band = tree.create(ComponentKind::Container);
        {
            let style = tree.get_mut(band).unwrap().style_mut();
            style.width = Dimension::Vw(50.0);
            style.height = Dimension::Vh(10.0);
        }
        tree.add_child(root, band);
        engine().compute_root(&mut tree);
        let b = tree.get(band).unwrap().bounds;
        assert_eq!((b.width, b.height), (400.0, 60.0));
    }
}
