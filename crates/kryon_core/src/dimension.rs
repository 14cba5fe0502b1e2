//! Tagged dimension values and their resolution against a containing context.

use crate::geometry::Size;

/// A sizing value in one of the supported CSS-like units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Dimension {
    /// Absolute pixels.
    Px(f32),
    /// Percentage of the parent extent (0-100).
    Percent(f32),
    /// Content-driven sizing.
    #[default]
    Auto,
    /// Flex factor; the extent is assigned by the flex solver.
    Flex(f32),
    /// Percentage of viewport width.
    Vw(f32),
    /// Percentage of viewport height.
    Vh(f32),
    /// Percentage of the smaller viewport extent.
    Vmin(f32),
    /// Percentage of the larger viewport extent.
    Vmax(f32),
    /// Multiples of the root font size.
    Rem(f32),
    /// Multiples of the component font size.
    Em(f32),
}

/// Ambient quantities a dimension may refer to.
#[derive(Clone, Copy, Debug)]
pub struct ResolveContext {
    /// Extent of the parent along the axis being resolved.
    pub parent: f32,
    pub viewport: Size,
    /// Root font size in pixels.
    pub root_font_size: f32,
    /// Font size of the component being resolved.
    pub font_size: f32,
}

impl ResolveContext {
    pub fn new(parent: f32, viewport: Size) -> Self {
        Self {
            parent,
            viewport,
            root_font_size: 16.0,
            font_size: 16.0,
        }
    }
}

impl Dimension {
    /// Resolve to pixels. `Auto` and `Flex` resolve to 0; the layout pass
    /// fills those in from availability or intrinsic measurement.
    pub fn resolve(&self, ctx: &ResolveContext) -> f32 {
        match *self {
            Dimension::Px(v) => v,
            Dimension::Percent(v) => ctx.parent * v / 100.0,
            Dimension::Auto | Dimension::Flex(_) => 0.0,
            Dimension::Vw(v) => ctx.viewport.width * v / 100.0,
            Dimension::Vh(v) => ctx.viewport.height * v / 100.0,
            Dimension::Vmin(v) => ctx.viewport.width.min(ctx.viewport.height) * v / 100.0,
            Dimension::Vmax(v) => ctx.viewport.width.max(ctx.viewport.height) * v / 100.0,
            Dimension::Rem(v) => ctx.root_font_size * v,
            Dimension::Em(v) => ctx.font_size * v,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Dimension::Auto)
    }

    /// The raw tagged value, unit-independent.
    pub fn value(&self) -> f32 {
        match *self {
            Dimension::Auto => 0.0,
            Dimension::Px(v)
            | Dimension::Percent(v)
            | Dimension::Flex(v)
            | Dimension::Vw(v)
            | Dimension::Vh(v)
            | Dimension::Vmin(v)
            | Dimension::Vmax(v)
            | Dimension::Rem(v)
            | Dimension::Em(v) => v,
        }
    }

    /// Unit name as serialized in KIR.
    pub fn unit_name(&self) -> &'static str {
        match self {
            Dimension::Px(_) => "px",
            Dimension::Percent(_) => "percent",
            Dimension::Auto => "auto",
            Dimension::Flex(_) => "flex",
            Dimension::Vw(_) => "vw",
            Dimension::Vh(_) => "vh",
            Dimension::Vmin(_) => "vmin",
            Dimension::Vmax(_) => "vmax",
            Dimension::Rem(_) => "rem",
            Dimension::Em(_) => "em",
        }
    }

    /// Reconstruct from a KIR unit name and value.
    pub fn from_unit(unit: &str, value: f32) -> Option<Self> {
        Some(match unit {
            "px" => Dimension::Px(value),
            "percent" => Dimension::Percent(value),
            "auto" => Dimension::Auto,
            "flex" => Dimension::Flex(value),
            "vw" => Dimension::Vw(value),
            "vh" => Dimension::Vh(value),
            "vmin" => Dimension::Vmin(value),
            "vmax" => Dimension::Vmax(value),
            "rem" => Dimension::Rem(value),
            "em" => Dimension::Em(value),
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ResolveContext {
        ResolveContext {
            parent: 400.0,
            viewport: Size::new(800.0, 600.0),
            root_font_size: 16.0,
            font_size: 20.0,
        }
    }

    #[test]
    fn pixel_passthrough() {
        assert_eq!(Dimension::Px(120.0).resolve(&ctx()), 120.0);
    }

    #[test]
    fn percent_of_parent() {
        assert_eq!(Dimension::Percent(50.0).resolve(&ctx()), 200.0);
    }

    #[test]
    fn viewport_units() {
        assert_eq!(Dimension::Vw(10.0).resolve(&ctx()), 80.0);
        assert_eq!(Dimension::Vh(10.0).resolve(&ctx()), 60.0);
        assert_eq!(Dimension::Vmin(10.0).resolve(&ctx()), 60.0);
        assert_eq!(Dimension::Vmax(10.0).resolve(&ctx()), 80.0);
    }

    #[test]
    fn font_relative_units() {
        assert_eq!(Dimension::Rem(2.0).resolve(&ctx()), 32.0);
        assert_eq!(Dimension::Em(2.0).resolve(&ctx()), 40.0);
    }

    #[test]
    fn auto_resolves_to_zero() {
        assert_eq!(Dimension::Auto.resolve(&ctx()), 0.0);
        assert_eq!(Dimension::Flex(1.0).resolve(&ctx()), 0.0);
    }

    #[test]
    fn unit_name_round_trip() {
        for d in [
            Dimension::Px(5.0),
            Dimension::Percent(50.0),
            Dimension::Auto,
            Dimension::Vmin(1.0),
            Dimension::Em(1.5),
        ] {
            let back = Dimension::from_unit(d.unit_name(), d.value()).unwrap();
            assert_eq!(back, d);
        }
        assert!(Dimension::from_unit("furlong", 1.0).is_none());
    }
}
