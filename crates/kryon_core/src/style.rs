//! The per-component style record.

use smallvec::SmallVec;

use crate::color::ColorValue;
use crate::dimension::Dimension;
use crate::effects::{BoxShadow, Filter, Transform, MAX_FILTERS};
use crate::geometry::Spacing;
use crate::typography::Typography;

/// Maximum number of pseudo-class overrides per style.
pub const MAX_PSEUDO_STYLES: usize = 8;
/// Maximum number of responsive breakpoints per style.
pub const MAX_BREAKPOINTS: usize = 4;

/// Positioning scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PositionMode {
    #[default]
    Relative,
    Absolute,
    Fixed,
}

impl PositionMode {
    pub fn css_name(&self) -> &'static str {
        match self {
            PositionMode::Relative => "relative",
            PositionMode::Absolute => "absolute",
            PositionMode::Fixed => "fixed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "relative" => PositionMode::Relative,
            "absolute" => PositionMode::Absolute,
            "fixed" => PositionMode::Fixed,
            _ => return None,
        })
    }
}

/// Per-axis overflow behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Scroll,
    Auto,
}

impl Overflow {
    pub fn css_name(&self) -> &'static str {
        match self {
            Overflow::Visible => "visible",
            Overflow::Hidden => "hidden",
            Overflow::Scroll => "scroll",
            Overflow::Auto => "auto",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "visible" => Overflow::Visible,
            "hidden" => Overflow::Hidden,
            "scroll" => Overflow::Scroll,
            "auto" => Overflow::Auto,
            _ => return None,
        })
    }
}

/// Pseudo-class selectors a style may override for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PseudoClass {
    Hover,
    Active,
    Focus,
    Disabled,
    Checked,
    FirstChild,
    LastChild,
    Visited,
}

impl PseudoClass {
    pub fn css_name(&self) -> &'static str {
        match self {
            PseudoClass::Hover => "hover",
            PseudoClass::Active => "active",
            PseudoClass::Focus => "focus",
            PseudoClass::Disabled => "disabled",
            PseudoClass::Checked => "checked",
            PseudoClass::FirstChild => "first-child",
            PseudoClass::LastChild => "last-child",
            PseudoClass::Visited => "visited",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "hover" => PseudoClass::Hover,
            "active" => PseudoClass::Active,
            "focus" => PseudoClass::Focus,
            "disabled" => PseudoClass::Disabled,
            "checked" => PseudoClass::Checked,
            "first-child" => PseudoClass::FirstChild,
            "last-child" => PseudoClass::LastChild,
            "visited" => PseudoClass::Visited,
            _ => return None,
        })
    }
}

/// Style overrides applied while a pseudo-class is active.
#[derive(Clone, Debug, PartialEq)]
pub struct PseudoStyle {
    pub class: PseudoClass,
    pub background: Option<ColorValue>,
    pub border_color: Option<ColorValue>,
    pub text_color: Option<ColorValue>,
    pub opacity: Option<f32>,
    pub transform: Option<Transform>,
}

impl PseudoStyle {
    pub fn new(class: PseudoClass) -> Self {
        Self {
            class,
            background: None,
            border_color: None,
            text_color: None,
            opacity: None,
            transform: None,
        }
    }
}

/// Responsive override condition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Breakpoint {
    pub min_width: Option<f32>,
    pub max_width: Option<f32>,
    pub min_height: Option<f32>,
    pub max_height: Option<f32>,
    /// Style overrides serialized as declarations, resolved at cascade time.
    pub declarations: Vec<(String, String)>,
}

impl Breakpoint {
    /// True when the viewport satisfies every declared bound.
    pub fn matches(&self, viewport_width: f32, viewport_height: f32) -> bool {
        self.min_width.map_or(true, |v| viewport_width >= v)
            && self.max_width.map_or(true, |v| viewport_width <= v)
            && self.min_height.map_or(true, |v| viewport_height >= v)
            && self.max_height.map_or(true, |v| viewport_height <= v)
    }
}

/// Container-query context declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerContext {
    pub name: Option<String>,
    /// Which axes the container exposes for queries.
    pub inline_size: bool,
    pub block_size: bool,
}

/// Full style record. Absent on a component means "all defaults".
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    pub width: Dimension,
    pub height: Dimension,
    pub background: ColorValue,
    pub border_color: ColorValue,
    pub border_width: f32,
    pub border_radius: f32,
    pub margin: Spacing,
    pub padding: Spacing,
    pub typography: Typography,
    pub transform: Option<Transform>,
    pub opacity: f32,
    pub visible: bool,
    pub z_index: i32,
    pub position: PositionMode,
    pub absolute_x: f32,
    pub absolute_y: f32,
    pub overflow_x: Overflow,
    pub overflow_y: Overflow,
    pub shadow: Option<BoxShadow>,
    pub filters: SmallVec<[Filter; MAX_FILTERS]>,
    pub pseudo: SmallVec<[PseudoStyle; MAX_PSEUDO_STYLES]>,
    pub breakpoints: SmallVec<[Breakpoint; MAX_BREAKPOINTS]>,
    pub container: Option<ContainerContext>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            width: Dimension::Auto,
            height: Dimension::Auto,
            background: ColorValue::Transparent,
            border_color: ColorValue::Transparent,
            border_width: 0.0,
            border_radius: 0.0,
            margin: Spacing::ZERO,
            padding: Spacing::ZERO,
            typography: Typography::default(),
            transform: None,
            opacity: 1.0,
            visible: true,
            z_index: 0,
            position: PositionMode::Relative,
            absolute_x: 0.0,
            absolute_y: 0.0,
            overflow_x: Overflow::Visible,
            overflow_y: Overflow::Visible,
            shadow: None,
            filters: SmallVec::new(),
            pseudo: SmallVec::new(),
            breakpoints: SmallVec::new(),
            container: None,
        }
    }
}

impl Style {
    /// Add a filter; filters past the fixed capacity are refused.
    pub fn push_filter(&mut self, filter: Filter) -> bool {
        if self.filters.len() >= MAX_FILTERS {
            tracing::warn!("filter limit ({MAX_FILTERS}) reached, filter dropped");
            return false;
        }
        self.filters.push(filter);
        true
    }

    /// Add a pseudo-class override; at most one per class, replacing any
    /// existing entry for the same class.
    pub fn push_pseudo(&mut self, pseudo: PseudoStyle) -> bool {
        if let Some(existing) = self.pseudo.iter_mut().find(|p| p.class == pseudo.class) {
            *existing = pseudo;
            return true;
        }
        if self.pseudo.len() >= MAX_PSEUDO_STYLES {
            tracing::warn!("pseudo-style limit ({MAX_PSEUDO_STYLES}) reached, entry dropped");
            return false;
        }
        self.pseudo.push(pseudo);
        true
    }

    /// Add a breakpoint; entries past the fixed capacity are refused.
    pub fn push_breakpoint(&mut self, bp: Breakpoint) -> bool {
        if self.breakpoints.len() >= MAX_BREAKPOINTS {
            tracing::warn!("breakpoint limit ({MAX_BREAKPOINTS}) reached, entry dropped");
            return false;
        }
        self.breakpoints.push(bp);
        true
    }

    /// The pseudo override for a class, if declared.
    pub fn pseudo_for(&self, class: PseudoClass) -> Option<&PseudoStyle> {
        self.pseudo.iter().find(|p| p.class == class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_neutral() {
        let s = Style::default();
        assert!(s.width.is_auto());
        assert!(s.visible);
        assert_eq!(s.opacity, 1.0);
        assert!(s.background.is_transparent());
        assert_eq!(s.position, PositionMode::Relative);
    }

    #[test]
    fn pseudo_replaces_same_class() {
        let mut s = Style::default();
        let mut hover = PseudoStyle::new(PseudoClass::Hover);
        hover.opacity = Some(0.5);
        assert!(s.push_pseudo(hover));
        let mut hover2 = PseudoStyle::new(PseudoClass::Hover);
        hover2.opacity = Some(0.8);
        assert!(s.push_pseudo(hover2));
        assert_eq!(s.pseudo.len(), 1);
        assert_eq!(s.pseudo_for(PseudoClass::Hover).unwrap().opacity, Some(0.8));
    }

    #[test]
    fn pseudo_limit_enforced() {
        let mut s = Style::default();
        let classes = [
            PseudoClass::Hover,
            PseudoClass::Active,
            PseudoClass::Focus,
            PseudoClass::Disabled,
            PseudoClass::Checked,
            PseudoClass::FirstChild,
            PseudoClass::LastChild,
            PseudoClass::Visited,
        ];
        for c in classes {
            assert!(s.push_pseudo(PseudoStyle::new(c)));
        }
        assert_eq!(s.pseudo.len(), MAX_PSEUDO_STYLES);
    }

    #[test]
    fn breakpoint_matching() {
        let bp = Breakpoint {
            min_width: Some(600.0),
            max_width: Some(1200.0),
            ..Breakpoint::default()
        };
        assert!(bp.matches(800.0, 600.0));
        assert!(!bp.matches(599.0, 600.0));
        assert!(!bp.matches(1201.0, 600.0));
    }

    #[test]
    fn filter_capacity() {
        let mut s = Style::default();
        for _ in 0..MAX_FILTERS {
            assert!(s.push_filter(Filter::Blur(1.0)));
        }
        assert!(!s.push_filter(Filter::Sepia(0.2)));
    }
}
