//! Intrinsic (content-driven) measurement with per-node caching.
//!
//! Both dimensions are computed and cached together, so a clean cache
//! always holds two non-negative values. Recursive measurement goes
//! through the cached getters, which keeps a full-tree measurement pass
//! linear.

use kryon_core::{ComponentKind, ComponentTree, NodeKey, Size};

use crate::engine::{effective_padding, flex_direction_of, LayoutEngine};

/// Width estimate for a run of text: half an em per character.
fn text_width_estimate(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.5
}

impl LayoutEngine {
    /// Cached intrinsic width of a component.
    pub fn intrinsic_width(&self, tree: &mut ComponentTree, key: NodeKey) -> f32 {
        self.intrinsic_size(tree, key).width
    }

    /// Cached intrinsic height of a component.
    pub fn intrinsic_height(&self, tree: &mut ComponentTree, key: NodeKey) -> f32 {
        self.intrinsic_size(tree, key).height
    }

    /// Measure a component, consulting the cache first.
    pub fn intrinsic_size(&self, tree: &mut ComponentTree, key: NodeKey) -> Size {
        let Some(node) = tree.get(key) else {
            return Size::ZERO;
        };
        let cache = node.layout_cache;
        if !cache.dirty && cache.intrinsic_width >= 0.0 && cache.intrinsic_height >= 0.0 {
            return Size::new(cache.intrinsic_width, cache.intrinsic_height);
        }

        let size = self.measure(tree, key);

        if let Some(node) = tree.get_mut(key) {
            node.layout_cache.intrinsic_width = size.width;
            node.layout_cache.intrinsic_height = size.height;
            node.layout_cache.dirty = false;
        }
        size
    }

    fn measure(&self, tree: &mut ComponentTree, key: NodeKey) -> Size {
        let node = match tree.get(key) {
            Some(n) => n,
            None => return Size::ZERO,
        };

        // Registered handlers override the variant defaults.
        if let Some(size) = self.registry.measure(node) {
            return size;
        }

        let font_size = node.font_size();
        let has_font = node.style.is_some();
        match node.kind {
            ComponentKind::Text => {
                let text = node.text_content.as_deref().unwrap_or("");
                let width = text_width_estimate(text, font_size);
                let height = if has_font { font_size + 4.0 } else { 20.0 };
                Size::new(width, height)
            }
            ComponentKind::Button => {
                let text = node.text_content.as_deref().unwrap_or("");
                let padding = effective_padding(node);
                Size::new(
                    text_width_estimate(text, font_size) + padding.horizontal() + 20.0,
                    font_size + padding.vertical() + 12.0,
                )
            }
            ComponentKind::Input => Size::new(200.0, 30.0),
            ComponentKind::Container | ComponentKind::Row | ComponentKind::Column => {
                self.measure_container(tree, key)
            }
            _ => Size::new(100.0, 50.0),
        }
    }

    /// Containers sum child extents along the main axis (plus gaps and
    /// padding) and take the maximum along the cross axis.
    fn measure_container(&self, tree: &mut ComponentTree, key: NodeKey) -> Size {
        let node = match tree.get(key) {
            Some(n) => n,
            None => return Size::ZERO,
        };
        let row = flex_direction_of(node).is_row();
        let gap = node.layout.as_deref().map_or(0.0, |l| l.flex.gap);
        let padding = effective_padding(node);
        let children: Vec<NodeKey> = node.children.clone();

        let mut main_sum = 0.0f32;
        let mut cross_max = 0.0f32;
        let mut visible = 0usize;
        for child in children {
            let is_visible = tree.get(child).map_or(false, |c| c.is_visible());
            if !is_visible {
                continue;
            }
            visible += 1;
            // Memoized recursion keeps the pass linear.
            let child_size = self.intrinsic_size(tree, child);
            let (child_main, child_cross) = if row {
                (child_size.width, child_size.height)
            } else {
                (child_size.height, child_size.width)
            };
            main_sum += child_main;
            cross_max = cross_max.max(child_cross);
        }
        if visible > 1 {
            main_sum += (visible - 1) as f32 * gap;
        }
        main_sum += if row {
            padding.horizontal()
        } else {
            padding.vertical()
        };

        if row {
            Size::new(main_sum, cross_max)
        } else {
            Size::new(cross_max, main_sum)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kryon_core::{ComponentKind, ComponentTree, FlexDirection, Size, INTRINSIC_UNCACHED};

    fn engine() -> LayoutEngine {
        LayoutEngine::new(Size::new(800.0, 600.0))
    }

    fn text_node(tree: &mut ComponentTree, text: &str, font_size: f32) -> NodeKey {
        let key = tree.create(ComponentKind::Text);
        let node = tree.get_mut(key).unwrap();
        node.text_content = Some(text.to_string());
        node.style_mut().typography.size = font_size;
        key
    }

    #[test]
    fn text_measurement_estimates() {
        let mut tree = ComponentTree::new();
        let key = text_node(&mut tree, "hello", 16.0);
        let engine = engine();
        assert_eq!(engine.intrinsic_width(&mut tree, key), 5.0 * 16.0 * 0.5);
        assert_eq!(engine.intrinsic_height(&mut tree, key), 20.0);
    }

    #[test]
    fn unstyled_text_gets_default_height() {
        let mut tree = ComponentTree::new();
        let key = tree.create(ComponentKind::Text);
        tree.get_mut(key).unwrap().text_content = Some("abc".into());
        assert_eq!(engine().intrinsic_height(&mut tree, key), 20.0);
    }

    #[test]
    fn column_of_text_sums_heights() {
        // Three 16px texts of length 10: (16+4)*3, no gap, no padding.
        let mut tree = ComponentTree::new();
        let column = tree.create(ComponentKind::Column);
        for _ in 0..3 {
            let t = text_node(&mut tree, "0123456789", 16.0);
            tree.add_child(column, t);
        }
        let engine = engine();
        assert_eq!(engine.intrinsic_height(&mut tree, column), 60.0);
        // Cross axis is the widest child.
        assert_eq!(engine.intrinsic_width(&mut tree, column), 80.0);
    }

    #[test]
    fn second_call_hits_cache() {
        let mut tree = ComponentTree::new();
        let column = tree.create(ComponentKind::Column);
        for _ in 0..3 {
            let t = text_node(&mut tree, "0123456789", 16.0);
            tree.add_child(column, t);
        }
        let engine = engine();
        let first = engine.intrinsic_height(&mut tree, column);
        let second = engine.intrinsic_height(&mut tree, column);
        assert_eq!(first, second);
        let cache = tree.get(column).unwrap().layout_cache;
        assert!(!cache.dirty);
        assert_eq!(cache.intrinsic_height, 60.0);
    }

    #[test]
    fn mark_dirty_on_descendant_invalidates_parent_cache() {
        let mut tree = ComponentTree::new();
        let column = tree.create(ComponentKind::Column);
        let child = text_node(&mut tree, "0123456789", 16.0);
        tree.add_child(column, child);
        let engine = engine();
        let _ = engine.intrinsic_height(&mut tree, column);
        assert!(!tree.get(column).unwrap().layout_cache.dirty);

        tree.mark_dirty(child);
        let cache = tree.get(column).unwrap().layout_cache;
        assert!(cache.dirty);
        assert_eq!(cache.intrinsic_height, INTRINSIC_UNCACHED);
    }

    #[test]
    fn row_direction_swaps_axes() {
        let mut tree = ComponentTree::new();
        let row = tree.create(ComponentKind::Row);
        {
            let node = tree.get_mut(row).unwrap();
            node.layout_mut().flex.direction = FlexDirection::Row;
            node.layout_mut().flex.gap = 10.0;
        }
        for _ in 0..2 {
            let t = text_node(&mut tree, "abcd", 16.0);
            tree.add_child(row, t);
        }
        let engine = engine();
        // Width: two 32px texts plus one gap.
        assert_eq!(engine.intrinsic_width(&mut tree, row), 32.0 + 10.0 + 32.0);
        assert_eq!(engine.intrinsic_height(&mut tree, row), 20.0);
    }

    #[test]
    fn hidden_children_are_skipped() {
        let mut tree = ComponentTree::new();
        let column = tree.create(ComponentKind::Column);
        let visible = text_node(&mut tree, "abcd", 16.0);
        let hidden = text_node(&mut tree, "abcd", 16.0);
        tree.get_mut(hidden).unwrap().style_mut().visible = false;
        tree.add_child(column, visible);
        tree.add_child(column, hidden);
        assert_eq!(engine().intrinsic_height(&mut tree, column), 20.0);
    }

    #[test]
    fn button_adds_chrome() {
        let mut tree = ComponentTree::new();
        let key = tree.create(ComponentKind::Button);
        let node = tree.get_mut(key).unwrap();
        node.text_content = Some("OK".into());
        node.style_mut().typography.size = 16.0;
        let engine = engine();
        assert_eq!(engine.intrinsic_width(&mut tree, key), 2.0 * 8.0 + 20.0);
        assert_eq!(engine.intrinsic_height(&mut tree, key), 16.0 + 12.0);
    }

    #[test]
    fn fallback_variants_measure_100_by_50() {
        let mut tree = ComponentTree::new();
        let key = tree.create(ComponentKind::Canvas);
        assert_eq!(
            engine().intrinsic_size(&mut tree, key),
            Size::new(100.0, 50.0)
        );
    }
}
