//! The CSS-Grid solver: track sizing, cursor auto-placement, and cell
//! alignment.
//!
//! AUTO, MIN_CONTENT, and MAX_CONTENT tracks are approximated as `1fr`;
//! content-measured track sizing is a known gap kept as-is. Dense packing
//! is declared in the layout spec but the auto-placement cursor does not
//! backfill.

use kryon_core::{
    ComponentTree, GridAutoFlow, GridItem, GridLayout, GridTrack, ItemAlignment, NodeKey,
};

use crate::engine::{effective_margin, LayoutEngine};

/// Resolved track extents for one axis.
fn size_tracks(tracks: &[GridTrack], avail: f32) -> Vec<f32> {
    let mut sizes = vec![0.0f32; tracks.len()];
    let mut fixed_sum = 0.0f32;
    let mut fr_total = 0.0f32;

    // First sweep: fixed and percentage tracks; everything content-like
    // joins the fr pool with weight 1.
    for (i, track) in tracks.iter().enumerate() {
        match *track {
            GridTrack::Px(v) => {
                sizes[i] = v;
                fixed_sum += v;
            }
            GridTrack::Percent(v) => {
                sizes[i] = avail * v / 100.0;
                fixed_sum += sizes[i];
            }
            GridTrack::Fr(v) => fr_total += v,
            GridTrack::Auto | GridTrack::MinContent | GridTrack::MaxContent => fr_total += 1.0,
        }
    }

    // Second sweep: split the remainder over the fr pool.
    let remainder = (avail - fixed_sum).max(0.0);
    if fr_total > 0.0 {
        for (i, track) in tracks.iter().enumerate() {
            let weight = match *track {
                GridTrack::Fr(v) => v,
                GridTrack::Auto | GridTrack::MinContent | GridTrack::MaxContent => 1.0,
                _ => continue,
            };
            sizes[i] = remainder * weight / fr_total;
        }
    }
    sizes
}

/// Cumulative start positions, one extra entry past the last track. The
/// cell-rect formula subtracts the trailing gap back out.
fn track_positions(sizes: &[f32], origin: f32, gap: f32) -> Vec<f32> {
    let mut positions = Vec::with_capacity(sizes.len() + 1);
    let mut cursor = origin;
    positions.push(cursor);
    for &size in sizes {
        cursor += size + gap;
        positions.push(cursor);
    }
    positions
}

fn clamp_span(start: i32, end: i32, count: usize) -> (usize, usize) {
    let count = count as i32;
    let start = start.clamp(0, count - 1);
    let end = if end > start { end } else { start + 1 };
    let end = end.clamp(start + 1, count);
    (start as usize, end as usize)
}

impl LayoutEngine {
    /// Place the visible children of `parent` into grid cells within the
    /// content box at `(origin_x, origin_y)`.
    pub(crate) fn solve_grid(
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
        let Some(layout) = node.layout.as_deref() else {
            return;
        };
        let grid: GridLayout = layout.grid.clone();
        let children: Vec<NodeKey> = node.children.clone();

        if grid.auto_flow_dense {
            tracing::debug!("grid dense packing declared but not implemented; using sparse cursor");
        }

        // An axis with no explicit tracks behaves as a single stretchy one.
        let columns: Vec<GridTrack> = if grid.columns.is_empty() {
            vec![GridTrack::Auto]
        } else {
            grid.columns.to_vec()
        };
        let rows: Vec<GridTrack> = if grid.rows.is_empty() {
            vec![GridTrack::Auto]
        } else {
            grid.rows.to_vec()
        };
        let ncols = columns.len();
        let nrows = rows.len();

        let col_avail = (inner_w - (ncols - 1) as f32 * grid.column_gap).max(0.0);
        let row_avail = (inner_h - (nrows - 1) as f32 * grid.row_gap).max(0.0);
        let col_sizes = size_tracks(&columns, col_avail);
        let row_sizes = size_tracks(&rows, row_avail);
        let col_pos = track_positions(&col_sizes, origin_x, grid.column_gap);
        let row_pos = track_positions(&row_sizes, origin_y, grid.row_gap);

        let mut cursor_row = 0usize;
        let mut cursor_col = 0usize;

        for child in children {
            let Some(c) = tree.get(child) else { continue };
            if !c.is_visible() {
                continue;
            }
            let item: GridItem = c
                .layout
                .as_deref()
                .map(|l| l.grid_item)
                .unwrap_or_default();
            let justify_self = c.layout.as_deref().and_then(|l| l.justify_self);
            let align_self = c.layout.as_deref().and_then(|l| l.align_self);
            let margin = effective_margin(c);

            let (rs, re, cs, ce) = if item.row_start >= 0 && item.column_start >= 0 {
                let (rs, re) = clamp_span(item.row_start, item.row_end, nrows);
                let (cs, ce) = clamp_span(item.column_start, item.column_end, ncols);
                (rs, re, cs, ce)
            } else {
                // Cursor auto-placement; wraps at the explicit bound.
                let (rs, cs) = (cursor_row, cursor_col);
                match grid.auto_flow {
                    GridAutoFlow::Row => {
                        cursor_col += 1;
                        if cursor_col >= ncols {
                            cursor_col = 0;
                            cursor_row += 1;
                        }
                    }
                    GridAutoFlow::Column => {
                        cursor_row += 1;
                        if cursor_row >= nrows {
                            cursor_row = 0;
                            cursor_col += 1;
                        }
                    }
                }
                let (rs, re) = clamp_span(rs as i32, rs as i32 + 1, nrows);
                let (cs, ce) = clamp_span(cs as i32, cs as i32 + 1, ncols);
                (rs, re, cs, ce)
            };

            let mut cell_x = col_pos[cs];
            let mut cell_y = row_pos[rs];
            // The position array bakes one gap after every track,
            // including the last; the formula subtracts it back out.
            let mut cell_w = col_pos[ce] - col_pos[cs] - grid.column_gap;
            let mut cell_h = row_pos[re] - row_pos[rs] - grid.row_gap;

            cell_x += margin.left;
            cell_y += margin.top;
            cell_w = (cell_w - margin.horizontal()).max(0.0);
            cell_h = (cell_h - margin.vertical()).max(0.0);

            let justify = justify_self.unwrap_or(grid.justify_items);
            let align = align_self.unwrap_or(grid.align_items);

            let (x, w) = match justify {
                ItemAlignment::Stretch => (cell_x, cell_w),
                policy => {
                    let measured = self
                        .resolved_or_intrinsic(tree, child, true, cell_w)
                        .min(cell_w);
                    match policy {
                        ItemAlignment::Start => (cell_x, measured),
                        ItemAlignment::Center => (cell_x + (cell_w - measured) / 2.0, measured),
                        ItemAlignment::End => (cell_x + cell_w - measured, measured),
                        ItemAlignment::Stretch => unreachable!(),
                    }
                }
            };
            let (y, h) = match align {
                ItemAlignment::Stretch => (cell_y, cell_h),
                policy => {
                    let measured = self
                        .resolved_or_intrinsic(tree, child, false, cell_h)
                        .min(cell_h);
                    match policy {
                        ItemAlignment::Start => (cell_y, measured),
                        ItemAlignment::Center => (cell_y + (cell_h - measured) / 2.0, measured),
                        ItemAlignment::End => (cell_y + cell_h - measured, measured),
                        ItemAlignment::Stretch => unreachable!(),
                    }
                }
            };

            if let Some(c) = tree.get_mut(child) {
                c.bounds.x = x;
                c.bounds.y = y;
                c.bounds.width = w;
                c.bounds.height = h;
                c.bounds.valid = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kryon_core::{ComponentKind, LayoutMode, Size};

    fn grid_parent(
        columns: Vec<GridTrack>,
        rows: Vec<GridTrack>,
        column_gap: f32,
        row_gap: f32,
    ) -> (ComponentTree, NodeKey) {
        let mut tree = ComponentTree::new();
        let parent = tree.create(ComponentKind::Container);
        tree.set_root(parent);
        {
            let node = tree.get_mut(parent).unwrap();
            node.style_mut().width = kryon_core::Dimension::Px(400.0);
            node.style_mut().height = kryon_core::Dimension::Px(200.0);
            let layout = node.layout_mut();
            layout.mode = LayoutMode::Grid;
            for c in columns {
                layout.grid.push_column(c);
            }
            for r in rows {
                layout.grid.push_row(r);
            }
            layout.grid.column_gap = column_gap;
            layout.grid.row_gap = row_gap;
        }
        (tree, parent)
    }

    fn add_cells(tree: &mut ComponentTree, parent: NodeKey, count: usize) -> Vec<NodeKey> {
        (0..count)
            .map(|_| {
                let c = tree.create(ComponentKind::Container);
                tree.add_child(parent, c);
                c
            })
            .collect()
    }

    fn engine() -> LayoutEngine {
        LayoutEngine::new(Size::new(800.0, 600.0))
    }

    #[test]
    fn auto_placement_row_major() {
        let (mut tree, parent) = grid_parent(
            vec![GridTrack::Px(100.0), GridTrack::Px(100.0)],
            vec![GridTrack::Px(50.0), GridTrack::Px(50.0)],
            0.0,
            0.0,
        );
        let cells = add_cells(&mut tree, parent, 4);
        engine().compute(&mut tree, parent, 400.0, 200.0);

        let expected = [
            (0.0, 0.0),
            (100.0, 0.0),
            (0.0, 50.0),
            (100.0, 50.0),
        ];
        for (i, &cell) in cells.iter().enumerate() {
            let b = tree.get(cell).unwrap().bounds;
            assert!(b.valid);
            assert_eq!((b.x, b.y), expected[i], "cell {i}");
            assert_eq!((b.width, b.height), (100.0, 50.0));
        }
    }

    #[test]
    fn auto_placement_column_major() {
        let (mut tree, parent) = grid_parent(
            vec![GridTrack::Px(100.0), GridTrack::Px(100.0)],
            vec![GridTrack::Px(50.0), GridTrack::Px(50.0)],
            0.0,
            0.0,
        );
        tree.get_mut(parent).unwrap().layout_mut().grid.auto_flow = GridAutoFlow::Column;
        let cells = add_cells(&mut tree, parent, 3);
        engine().compute(&mut tree, parent, 400.0, 200.0);

        assert_eq!(tree.get(cells[0]).unwrap().bounds.y, 0.0);
        assert_eq!(tree.get(cells[1]).unwrap().bounds.y, 50.0);
        // Third wraps to the second column.
        let third = tree.get(cells[2]).unwrap().bounds;
        assert_eq!((third.x, third.y), (100.0, 0.0));
    }

    #[test]
    fn fr_tracks_share_remainder() {
        let (mut tree, parent) = grid_parent(
            vec![GridTrack::Px(100.0), GridTrack::Fr(1.0), GridTrack::Fr(2.0)],
            vec![GridTrack::Fr(1.0)],
            0.0,
            0.0,
        );
        let cells = add_cells(&mut tree, parent, 3);
        engine().compute(&mut tree, parent, 400.0, 200.0);

        assert_eq!(tree.get(cells[0]).unwrap().bounds.width, 100.0);
        assert_eq!(tree.get(cells[1]).unwrap().bounds.width, 100.0);
        assert_eq!(tree.get(cells[2]).unwrap().bounds.width, 200.0);
    }

    #[test]
    fn percent_tracks_use_track_available() {
        let (mut tree, parent) = grid_parent(
            vec![GridTrack::Percent(25.0), GridTrack::Percent(75.0)],
            vec![GridTrack::Fr(1.0)],
            0.0,
            0.0,
        );
        let cells = add_cells(&mut tree, parent, 2);
        engine().compute(&mut tree, parent, 400.0, 200.0);
        assert_eq!(tree.get(cells[0]).unwrap().bounds.width, 100.0);
        assert_eq!(tree.get(cells[1]).unwrap().bounds.width, 300.0);
    }

    #[test]
    fn gaps_offset_cells() {
        let (mut tree, parent) = grid_parent(
            vec![GridTrack::Px(100.0), GridTrack::Px(100.0)],
            vec![GridTrack::Px(50.0)],
            10.0,
            0.0,
        );
        let cells = add_cells(&mut tree, parent, 2);
        engine().compute(&mut tree, parent, 400.0, 200.0);
        assert_eq!(tree.get(cells[0]).unwrap().bounds.x, 0.0);
        assert_eq!(tree.get(cells[0]).unwrap().bounds.width, 100.0);
        assert_eq!(tree.get(cells[1]).unwrap().bounds.x, 110.0);
    }

    #[test]
    fn explicit_placement_and_span() {
        let (mut tree, parent) = grid_parent(
            vec![GridTrack::Px(100.0), GridTrack::Px(100.0), GridTrack::Px(100.0)],
            vec![GridTrack::Px(50.0), GridTrack::Px(50.0)],
            0.0,
            0.0,
        );
        let cells = add_cells(&mut tree, parent, 1);
        {
            let item = &mut tree.get_mut(cells[0]).unwrap().layout_mut().grid_item;
            item.row_start = 1;
            item.column_start = 0;
            item.column_end = 2;
        }
        engine().compute(&mut tree, parent, 400.0, 200.0);
        let b = tree.get(cells[0]).unwrap().bounds;
        assert_eq!((b.x, b.y), (0.0, 50.0));
        assert_eq!(b.width, 200.0);
        assert_eq!(b.height, 50.0);
    }

    #[test]
    fn out_of_range_placement_clamped() {
        let (mut tree, parent) = grid_parent(
            vec![GridTrack::Px(100.0), GridTrack::Px(100.0)],
            vec![GridTrack::Px(50.0)],
            0.0,
            0.0,
        );
        let cells = add_cells(&mut tree, parent, 1);
        {
            let item = &mut tree.get_mut(cells[0]).unwrap().layout_mut().grid_item;
            item.row_start = 5;
            item.column_start = 9;
            item.column_end = 20;
        }
        engine().compute(&mut tree, parent, 400.0, 200.0);
        let b = tree.get(cells[0]).unwrap().bounds;
        // Clamped into the last column and row.
        assert_eq!((b.x, b.y), (100.0, 0.0));
        assert_eq!(b.width, 100.0);
    }

    #[test]
    fn self_alignment_overrides_items() {
        let (mut tree, parent) = grid_parent(
            vec![GridTrack::Px(200.0)],
            vec![GridTrack::Px(100.0)],
            0.0,
            0.0,
        );
        let cells = add_cells(&mut tree, parent, 1);
        {
            let node = tree.get_mut(cells[0]).unwrap();
            node.style_mut().width = kryon_core::Dimension::Px(50.0);
            node.style_mut().height = kryon_core::Dimension::Px(20.0);
            node.layout_mut().justify_self = Some(ItemAlignment::Center);
            node.layout_mut().align_self = Some(ItemAlignment::End);
        }
        engine().compute(&mut tree, parent, 400.0, 200.0);
        let b = tree.get(cells[0]).unwrap().bounds;
        assert_eq!(b.x, 75.0);
        assert_eq!(b.y, 80.0);
        assert_eq!((b.width, b.height), (50.0, 20.0));
    }

    #[test]
    fn stretch_fills_cell_by_default() {
        let (mut tree, parent) = grid_parent(
            vec![GridTrack::Fr(1.0)],
            vec![GridTrack::Fr(1.0)],
            0.0,
            0.0,
        );
        let cells = add_cells(&mut tree, parent, 1);
        engine().compute(&mut tree, parent, 400.0, 200.0);
        let b = tree.get(cells[0]).unwrap().bounds;
        assert_eq!((b.width, b.height), (400.0, 200.0));
    }
}
