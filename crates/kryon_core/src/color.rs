//! Color values: solid RGBA, gradients, and stylesheet variable references.
//!
//! Gradients are value-typed with a bounded stop list, so no heap cycles are
//! possible. A variable reference is a bare 16-bit id resolved against the
//! active stylesheet at render time, never a pointer.

use smallvec::SmallVec;

/// Maximum number of stops a gradient may carry.
pub const MAX_GRADIENT_STOPS: usize = 8;

/// RGBA color, one byte per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB`, or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
                Some(Self::rgb(r * 17, g * 17, b * 17))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::rgb(r, g, b))
            }
            8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
                Some(Self::rgba(r, g, b, a))
            }
            _ => None,
        }
    }

    /// Format as `#RRGGBB` when opaque, `#RRGGBBAA` otherwise.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.a = alpha;
        self
    }
}

/// A single gradient color stop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient (0.0 to 1.0).
    pub offset: f32,
    pub color: Color,
}

impl GradientStop {
    pub fn new(offset: f32, color: Color) -> Self {
        Self {
            offset: offset.clamp(0.0, 1.0),
            color,
        }
    }
}

/// Gradient shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GradientKind {
    #[default]
    Linear,
    Radial,
    Conic,
}

/// A gradient fill with a bounded stop list.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    pub kind: GradientKind,
    pub stops: SmallVec<[GradientStop; MAX_GRADIENT_STOPS]>,
    /// Angle in degrees (linear and conic).
    pub angle: f32,
    /// Center in normalized coordinates (radial and conic).
    pub center_x: f32,
    pub center_y: f32,
}

impl Gradient {
    /// Two-color linear gradient at the given angle.
    pub fn linear(angle: f32, from: Color, to: Color) -> Self {
        let mut stops = SmallVec::new();
        stops.push(GradientStop::new(0.0, from));
        stops.push(GradientStop::new(1.0, to));
        Self {
            kind: GradientKind::Linear,
            stops,
            angle,
            center_x: 0.5,
            center_y: 0.5,
        }
    }

    /// Append a stop; stops past the fixed capacity are refused.
    pub fn push_stop(&mut self, stop: GradientStop) -> bool {
        if self.stops.len() >= MAX_GRADIENT_STOPS {
            tracing::warn!(
                "gradient stop limit ({MAX_GRADIENT_STOPS}) reached, stop dropped"
            );
            return false;
        }
        self.stops.push(stop);
        true
    }

    pub fn first_color(&self) -> Color {
        self.stops.first().map(|s| s.color).unwrap_or(Color::BLACK)
    }
}

/// A paintable color value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ColorValue {
    #[default]
    Transparent,
    Solid(Color),
    Gradient(Box<Gradient>),
    /// Stylesheet variable id, resolved lazily at render time.
    Variable(u16),
}

impl ColorValue {
    /// The solid color, if this value is one.
    pub fn as_solid(&self) -> Option<Color> {
        match self {
            ColorValue::Solid(c) => Some(*c),
            _ => None,
        }
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, ColorValue::Transparent)
            || matches!(self, ColorValue::Solid(c) if c.a == 0)
    }
}

impl From<Color> for ColorValue {
    fn from(color: Color) -> Self {
        ColorValue::Solid(color)
    }
}
