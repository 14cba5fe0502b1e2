//! The layout pass: dimension resolution, positioning, and dispatch to
//! the flex and grid solvers.

use kryon_core::{
    Component, ComponentKind, ComponentTree, Dimension, DirtyFlags, FlexDirection,
    HandlerRegistry, LayoutMode, NodeKey, PositionMode, ResolveContext, Size, Spacing,
};

/// The layout engine. Carries the ambient quantities dimension resolution
/// needs plus the handler registry for per-variant measurement overrides.
pub struct LayoutEngine {
    pub viewport: Size,
    pub root_font_size: f32,
    pub registry: HandlerRegistry,
}

impl LayoutEngine {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            root_font_size: 16.0,
            registry: HandlerRegistry::with_defaults(),
        }
    }

    pub fn with_registry(viewport: Size, registry: HandlerRegistry) -> Self {
        Self {
            viewport,
            root_font_size: 16.0,
            registry,
        }
    }

    /// Lay out the whole document into the viewport.
    pub fn compute_root(&self, tree: &mut ComponentTree) {
        if let Some(root) = tree.root() {
            self.compute(tree, root, self.viewport.width, self.viewport.height);
        }
    }

    /// Lay out the subtree rooted at `key` into the given availability.
    /// Clean subtrees (no LAYOUT or SUBTREE dirt) are skipped whole.
    pub fn compute(&self, tree: &mut ComponentTree, key: NodeKey, avail_w: f32, avail_h: f32) {
        let Some(node) = tree.get(key) else {
            return;
        };
        if !node
            .dirty
            .intersects(DirtyFlags::LAYOUT | DirtyFlags::SUBTREE)
        {
            return;
        }

        // A missing style means "unset" sizing below; record that before
        // default-constructing the records the pass assumes exist.
        let had_style = node.style.is_some();
        {
            let node = tree.get_mut(key).expect("checked above");
            node.style_mut();
            node.layout_mut();
        }

        let node = tree.get(key).expect("checked above");
        let style = node.style.as_deref().expect("ensured above");
        let font_size = style.typography.size;

        let mut width = style.width.resolve(&self.resolve_ctx(avail_w, font_size));
        let mut height = style.height.resolve(&self.resolve_ctx(avail_h, font_size));
        let width_auto = style.width.is_auto();
        let height_auto = style.height.is_auto();
        let position = style.position;
        let absolute_x = style.absolute_x;
        let absolute_y = style.absolute_y;
        let layout_spec = node.layout.as_deref().expect("ensured above");
        let aspect_ratio = layout_spec.aspect_ratio;
        let mode = layout_spec.mode;
        let min_width = layout_spec.min_width;
        let max_width = layout_spec.max_width;
        let min_height = layout_spec.min_height;
        let max_height = layout_spec.max_height;

        if width == 0.0 {
            width = if avail_w > 0.0 {
                avail_w
            } else {
                self.intrinsic_width(tree, key)
            };
        }
        // An authored AUTO height always tracks content so that
        // content-driven sizing survives a larger availability. An unset
        // height (no style record at all) fills what is available.
        if had_style && height_auto {
            height = self.intrinsic_height(tree, key);
        } else if height == 0.0 {
            height = if avail_h > 0.0 {
                avail_h
            } else {
                self.intrinsic_height(tree, key)
            };
        }

        // Aspect ratio fills in the one unconstrained axis.
        if aspect_ratio > 0.0 {
            if width_auto && !height_auto {
                width = height * aspect_ratio;
            } else if height_auto && !width_auto {
                height = width / aspect_ratio;
            }
        }

        // Min/max constraints clamp whatever the resolution produced;
        // AUTO bounds resolve to zero and constrain nothing.
        width = clamp_extent(width, min_width, max_width, &self.resolve_ctx(avail_w, font_size));
        height = clamp_extent(
            height,
            min_height,
            max_height,
            &self.resolve_ctx(avail_h, font_size),
        );

        let node = tree.get_mut(key).expect("checked above");
        if position == PositionMode::Absolute {
            node.bounds.x = absolute_x;
            node.bounds.y = absolute_y;
        }
        // Relative nodes keep the origin their parent's solver assigned;
        // the root starts at (0, 0).
        node.bounds.width = width;
        node.bounds.height = height;
        node.bounds.valid = true;

        let padding = effective_padding(node);
        let origin_x = node.bounds.x + padding.left;
        let origin_y = node.bounds.y + padding.top;
        let inner_w = (width - padding.horizontal()).max(0.0);
        let inner_h = (height - padding.vertical()).max(0.0);

        match mode {
            LayoutMode::Grid => {
                self.solve_grid(tree, key, origin_x, origin_y, inner_w, inner_h);
            }
            LayoutMode::Flex | LayoutMode::Block => {
                self.solve_flex(tree, key, origin_x, origin_y, inner_w, inner_h);
            }
        }

        let children: Vec<NodeKey> = tree.get(key).expect("checked above").children.clone();
        for child in children {
            let (child_w, child_h) = match tree.get(child) {
                Some(c) if c.is_visible() => (c.bounds.width, c.bounds.height),
                _ => continue,
            };
            self.compute(tree, child, child_w, child_h);
        }

        let node = tree.get_mut(key).expect("checked above");
        node.dirty.remove(DirtyFlags::LAYOUT | DirtyFlags::SUBTREE);
        // The cache only counts as clean once both dimensions are filled.
        if node.layout_cache.intrinsic_width >= 0.0 && node.layout_cache.intrinsic_height >= 0.0 {
            node.layout_cache.dirty = false;
        }
    }

    pub(crate) fn resolve_ctx(&self, parent: f32, font_size: f32) -> ResolveContext {
        ResolveContext {
            parent,
            viewport: self.viewport,
            root_font_size: self.root_font_size,
            font_size,
        }
    }

    /// A child's extent along one axis: the styled dimension when it
    /// resolves to something, the intrinsic measurement otherwise.
    pub(crate) fn resolved_or_intrinsic(
        &self,
        tree: &mut ComponentTree,
        key: NodeKey,
        horizontal: bool,
        parent_extent: f32,
    ) -> f32 {
        let Some(node) = tree.get(key) else {
            return 0.0;
        };
        let font_size = node.font_size();
        let dim = match node.style.as_deref() {
            Some(style) => {
                if horizontal {
                    style.width
                } else {
                    style.height
                }
            }
            None => Dimension::Auto,
        };
        let resolved = dim.resolve(&self.resolve_ctx(parent_extent, font_size));
        if resolved > 0.0 {
            return resolved;
        }
        if horizontal {
            self.intrinsic_width(tree, key)
        } else {
            self.intrinsic_height(tree, key)
        }
    }
}

/// Clamp a resolved extent between min/max dimensions. A bound that
/// resolves to zero (AUTO included) is treated as absent.
fn clamp_extent(value: f32, min: Dimension, max: Dimension, ctx: &ResolveContext) -> f32 {
    let mut value = value;
    let min = min.resolve(ctx);
    if min > 0.0 {
        value = value.max(min);
    }
    let max = max.resolve(ctx);
    if max > 0.0 {
        value = value.min(max);
    }
    value
}

/// Padding in effect for a node: the layout spec's when it declares any,
/// the style's otherwise.
pub(crate) fn effective_padding(node: &Component) -> Spacing {
    if let Some(layout) = node.layout.as_deref() {
        if layout.padding != Spacing::ZERO {
            return layout.padding;
        }
    }
    node.style.as_deref().map_or(Spacing::ZERO, |s| s.padding)
}

/// Margin in effect for a node, same precedence as padding.
pub(crate) fn effective_margin(node: &Component) -> Spacing {
    if let Some(layout) = node.layout.as_deref() {
        if layout.margin != Spacing::ZERO {
            return layout.margin;
        }
    }
    node.style.as_deref().map_or(Spacing::ZERO, |s| s.margin)
}

/// Main-axis direction of a container: the layout spec's when present,
/// otherwise the variant default (Row lays out horizontally, everything
/// else stacks vertically).
pub(crate) fn flex_direction_of(node: &Component) -> FlexDirection {
    match node.layout.as_deref() {
        Some(layout) => layout.flex.direction,
        None => match node.kind {
            ComponentKind::Row => FlexDirection::Row,
            _ => FlexDirection::Column,
        },
    }
}
