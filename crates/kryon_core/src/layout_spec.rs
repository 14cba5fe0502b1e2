//! Flex, grid, and block layout parameters attached to components.

use smallvec::SmallVec;

use crate::dimension::Dimension;
use crate::geometry::Spacing;

/// Maximum explicit tracks per grid axis.
pub const MAX_GRID_TRACKS: usize = 12;

/// Layout algorithm selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutMode {
    #[default]
    Flex,
    Grid,
    Block,
}

impl LayoutMode {
    pub fn name(&self) -> &'static str {
        match self {
            LayoutMode::Flex => "flex",
            LayoutMode::Grid => "grid",
            LayoutMode::Block => "block",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "flex" => LayoutMode::Flex,
            "grid" => LayoutMode::Grid,
            "block" => LayoutMode::Block,
            _ => return None,
        })
    }
}

/// Flex main-axis direction. Column is the default for all containers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlexDirection {
    #[default]
    Column,
    Row,
}

impl FlexDirection {
    pub fn is_row(&self) -> bool {
        matches!(self, FlexDirection::Row)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FlexDirection::Column => "column",
            FlexDirection::Row => "row",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "column" => FlexDirection::Column,
            "row" => FlexDirection::Row,
            _ => return None,
        })
    }
}

/// Distribution of children along the main axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MainAxisAlignment {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

impl MainAxisAlignment {
    pub fn name(&self) -> &'static str {
        match self {
            MainAxisAlignment::Start => "start",
            MainAxisAlignment::Center => "center",
            MainAxisAlignment::End => "end",
            MainAxisAlignment::SpaceBetween => "space-between",
            MainAxisAlignment::SpaceAround => "space-around",
            MainAxisAlignment::SpaceEvenly => "space-evenly",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "start" => MainAxisAlignment::Start,
            "center" => MainAxisAlignment::Center,
            "end" => MainAxisAlignment::End,
            "space-between" => MainAxisAlignment::SpaceBetween,
            "space-around" => MainAxisAlignment::SpaceAround,
            "space-evenly" => MainAxisAlignment::SpaceEvenly,
            _ => return None,
        })
    }
}

/// Placement of a child along the cross axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CrossAxisAlignment {
    #[default]
    Start,
    Center,
    End,
    Stretch,
}

impl CrossAxisAlignment {
    pub fn name(&self) -> &'static str {
        match self {
            CrossAxisAlignment::Start => "start",
            CrossAxisAlignment::Center => "center",
            CrossAxisAlignment::End => "end",
            CrossAxisAlignment::Stretch => "stretch",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "start" => CrossAxisAlignment::Start,
            "center" => CrossAxisAlignment::Center,
            "end" => CrossAxisAlignment::End,
            "stretch" => CrossAxisAlignment::Stretch,
            _ => return None,
        })
    }
}

/// Flexbox parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct FlexLayout {
    pub direction: FlexDirection,
    pub wrap: bool,
    /// Gap between adjacent children, in pixels.
    pub gap: f32,
    pub main_axis: MainAxisAlignment,
    pub cross_axis: CrossAxisAlignment,
    pub justify_content: MainAxisAlignment,
    /// Share of leftover main-axis space this component takes in its parent.
    pub grow: f32,
    pub shrink: f32,
}

impl Default for FlexLayout {
    fn default() -> Self {
        Self {
            direction: FlexDirection::Column,
            wrap: false,
            gap: 0.0,
            main_axis: MainAxisAlignment::Start,
            cross_axis: CrossAxisAlignment::Start,
            justify_content: MainAxisAlignment::Start,
            grow: 0.0,
            shrink: 1.0,
        }
    }
}

/// Grid track sizing function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GridTrack {
    Px(f32),
    Percent(f32),
    Fr(f32),
    Auto,
    MinContent,
    MaxContent,
}

impl GridTrack {
    pub fn unit_name(&self) -> &'static str {
        match self {
            GridTrack::Px(_) => "px",
            GridTrack::Percent(_) => "percent",
            GridTrack::Fr(_) => "fr",
            GridTrack::Auto => "auto",
            GridTrack::MinContent => "min-content",
            GridTrack::MaxContent => "max-content",
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            GridTrack::Px(v) | GridTrack::Percent(v) | GridTrack::Fr(v) => v,
            GridTrack::Auto | GridTrack::MinContent | GridTrack::MaxContent => 0.0,
        }
    }

    pub fn from_unit(unit: &str, value: f32) -> Option<Self> {
        Some(match unit {
            "px" => GridTrack::Px(value),
            "percent" => GridTrack::Percent(value),
            "fr" => GridTrack::Fr(value),
            "auto" => GridTrack::Auto,
            "min-content" => GridTrack::MinContent,
            "max-content" => GridTrack::MaxContent,
            _ => return None,
        })
    }
}

/// Alignment of items within their grid cell (and self overrides).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ItemAlignment {
    Start,
    Center,
    End,
    #[default]
    Stretch,
}

impl ItemAlignment {
    pub fn name(&self) -> &'static str {
        match self {
            ItemAlignment::Start => "start",
            ItemAlignment::Center => "center",
            ItemAlignment::End => "end",
            ItemAlignment::Stretch => "stretch",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "start" => ItemAlignment::Start,
            "center" => ItemAlignment::Center,
            "end" => ItemAlignment::End,
            "stretch" => ItemAlignment::Stretch,
            _ => return None,
        })
    }
}

/// Auto-placement direction for items without explicit positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GridAutoFlow {
    #[default]
    Row,
    Column,
}

impl GridAutoFlow {
    pub fn name(&self) -> &'static str {
        match self {
            GridAutoFlow::Row => "row",
            GridAutoFlow::Column => "column",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "row" => GridAutoFlow::Row,
            "column" => GridAutoFlow::Column,
            _ => return None,
        })
    }
}

/// CSS-Grid parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct GridLayout {
    pub rows: SmallVec<[GridTrack; MAX_GRID_TRACKS]>,
    pub columns: SmallVec<[GridTrack; MAX_GRID_TRACKS]>,
    pub row_gap: f32,
    pub column_gap: f32,
    pub justify_items: ItemAlignment,
    pub align_items: ItemAlignment,
    pub justify_content: MainAxisAlignment,
    pub align_content: MainAxisAlignment,
    pub auto_flow: GridAutoFlow,
    /// Declared but not implemented by the auto-placement cursor.
    pub auto_flow_dense: bool,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            rows: SmallVec::new(),
            columns: SmallVec::new(),
            row_gap: 0.0,
            column_gap: 0.0,
            justify_items: ItemAlignment::Stretch,
            align_items: ItemAlignment::Stretch,
            justify_content: MainAxisAlignment::Start,
            align_content: MainAxisAlignment::Start,
            auto_flow: GridAutoFlow::Row,
            auto_flow_dense: false,
        }
    }
}

impl GridLayout {
    /// Add a row track; tracks past the fixed capacity are refused.
    pub fn push_row(&mut self, track: GridTrack) -> bool {
        if self.rows.len() >= MAX_GRID_TRACKS {
            tracing::warn!("grid row track limit ({MAX_GRID_TRACKS}) reached, track dropped");
            return false;
        }
        self.rows.push(track);
        true
    }

    /// Add a column track; tracks past the fixed capacity are refused.
    pub fn push_column(&mut self, track: GridTrack) -> bool {
        if self.columns.len() >= MAX_GRID_TRACKS {
            tracing::warn!("grid column track limit ({MAX_GRID_TRACKS}) reached, track dropped");
            return false;
        }
        self.columns.push(track);
        true
    }
}

/// Grid placement for a single child. `-1` on a start index means
/// auto-placement; an end of `-1` defaults to `start + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridItem {
    pub row_start: i32,
    pub row_end: i32,
    pub column_start: i32,
    pub column_end: i32,
}

impl Default for GridItem {
    fn default() -> Self {
        Self {
            row_start: -1,
            row_end: -1,
            column_start: -1,
            column_end: -1,
        }
    }
}

impl GridItem {
    pub fn is_auto_placed(&self) -> bool {
        self.row_start < 0 || self.column_start < 0
    }
}

/// Layout parameters attached to a component. Absent means
/// "flex column, no constraints".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutSpec {
    pub mode: LayoutMode,
    pub min_width: Dimension,
    pub max_width: Dimension,
    pub min_height: Dimension,
    pub max_height: Dimension,
    pub margin: Spacing,
    pub padding: Spacing,
    /// Width / height; 0 means unconstrained.
    pub aspect_ratio: f32,
    pub flex: FlexLayout,
    pub grid: GridLayout,
    pub grid_item: GridItem,
    pub justify_self: Option<ItemAlignment>,
    pub align_self: Option<ItemAlignment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_flex_column() {
        let l = LayoutSpec::default();
        assert_eq!(l.mode, LayoutMode::Flex);
        assert_eq!(l.flex.direction, FlexDirection::Column);
        assert_eq!(l.aspect_ratio, 0.0);
    }

    #[test]
    fn grid_item_auto_detection() {
        assert!(GridItem::default().is_auto_placed());
        let placed = GridItem {
            row_start: 0,
            row_end: 1,
            column_start: 2,
            column_end: 3,
        };
        assert!(!placed.is_auto_placed());
    }

    #[test]
    fn track_capacity_enforced() {
        let mut g = GridLayout::default();
        for _ in 0..MAX_GRID_TRACKS {
            assert!(g.push_column(GridTrack::Fr(1.0)));
        }
        assert!(!g.push_column(GridTrack::Auto));
        assert_eq!(g.columns.len(), MAX_GRID_TRACKS);
    }

    #[test]
    fn track_unit_round_trip() {
        for t in [
            GridTrack::Px(40.0),
            GridTrack::Percent(25.0),
            GridTrack::Fr(2.0),
            GridTrack::Auto,
            GridTrack::MinContent,
            GridTrack::MaxContent,
        ] {
            assert_eq!(GridTrack::from_unit(t.unit_name(), t.value()), Some(t));
        }
    }
}
