//! The flexbox solver. Row and column are one algorithm parameterized by
//! the main axis.

use kryon_core::{ComponentTree, CrossAxisAlignment, NodeKey};

use crate::engine::{effective_margin, flex_direction_of, LayoutEngine};

impl LayoutEngine {
    /// Place the visible children of `parent` into the content box
    /// starting at `(origin_x, origin_y)` with `inner_w` × `inner_h`
    /// available.
    pub(crate) fn solve_flex(
        &self,
        tree: &mut ComponentTree,
        parent: NodeKey,
        origin_x: f32,
        origin_y: f32,
        inner_w: f32,
        inner_h: f32,
    ) {
        let Some(node) = tree.get(parent) else {
            return;
        };
        let row = flex_direction_of(node).is_row();
        let (gap, cross_align) = match node.layout.as_deref() {
            Some(layout) => (layout.flex.gap, layout.flex.cross_axis),
            None => (0.0, CrossAxisAlignment::Start),
        };
        let children: Vec<NodeKey> = node.children.clone();

        let (avail_main, avail_cross) = if row {
            (inner_w, inner_h)
        } else {
            (inner_h, inner_w)
        };

        // Pass 1: total the resolved-or-intrinsic extents, margins, and
        // grow weights of the visible children.
        let mut visible = 0usize;
        let mut total_main = 0.0f32;
        let mut total_grow = 0.0f32;
        for &child in &children {
            let Some(c) = tree.get(child) else { continue };
            if !c.is_visible() {
                continue;
            }
            visible += 1;
            let margin = effective_margin(c);
            let grow = c.layout.as_deref().map_or(0.0, |l| l.flex.grow);
            total_grow += grow;
            let main = self.resolved_or_intrinsic(tree, child, row, avail_main);
            let main_margins = if row {
                margin.horizontal()
            } else {
                margin.vertical()
            };
            total_main += main + main_margins;
        }
        if visible > 1 {
            total_main += (visible - 1) as f32 * gap;
        }

        // Pass 2: distribute leftover space to growers and position each
        // child along the axes.
        let remaining = avail_main - total_main;
        let mut current_main = if row { origin_x } else { origin_y };
        for &child in &children {
            let visible_child = tree.get(child).map_or(false, |c| c.is_visible());
            if !visible_child {
                continue;
            }
            let margin = tree.get(child).map(effective_margin).unwrap_or_default();
            let grow = tree
                .get(child)
                .and_then(|c| c.layout.as_deref())
                .map_or(0.0, |l| l.flex.grow);

            let mut main = self.resolved_or_intrinsic(tree, child, row, avail_main);
            if remaining > 0.0 && grow > 0.0 && total_grow > 0.0 {
                main += remaining * grow / total_grow;
            }

            let mut cross = self.resolved_or_intrinsic(tree, child, !row, avail_cross);
            let (cross_margin_start, cross_margins) = if row {
                (margin.top, margin.vertical())
            } else {
                (margin.left, margin.horizontal())
            };
            let cross_origin = if row { origin_y } else { origin_x };
            let cross_pos = match cross_align {
                CrossAxisAlignment::Start => cross_origin + cross_margin_start,
                CrossAxisAlignment::Center => cross_origin + (avail_cross - cross) / 2.0,
                CrossAxisAlignment::End => cross_origin + avail_cross - cross,
                CrossAxisAlignment::Stretch => {
                    cross = (avail_cross - cross_margins).max(0.0);
                    cross_origin + cross_margin_start
                }
            };

            let main_margin_start = if row { margin.left } else { margin.top };
            let main_margins = if row {
                margin.horizontal()
            } else {
                margin.vertical()
            };
            let main_pos = current_main + main_margin_start;

            if let Some(c) = tree.get_mut(child) {
                if row {
                    c.bounds.x = main_pos;
                    c.bounds.y = cross_pos;
                    c.bounds.width = main;
                    c.bounds.height = cross;
                } else {
                    c.bounds.x = cross_pos;
                    c.bounds.y = main_pos;
                    c.bounds.width = cross;
                    c.bounds.height = main;
                }
                c.bounds.valid = true;
            }

            current_main += main + main_margins + gap;
        }
    }
}
