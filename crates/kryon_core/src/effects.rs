//! Visual effects: transforms, filters, and box shadows.

use crate::color::Color;

/// Maximum number of filters a style may stack.
pub const MAX_FILTERS: usize = 8;

/// 2D transform applied at render time; does not affect layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Rotation in degrees.
    pub rotate: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotate: 0.0,
        }
    }
}

impl Transform {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// A single CSS-style filter function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Filter {
    /// Blur radius in pixels.
    Blur(f32),
    Brightness(f32),
    Contrast(f32),
    Grayscale(f32),
    /// Hue rotation in degrees.
    HueRotate(f32),
    Invert(f32),
    Opacity(f32),
    Saturate(f32),
    Sepia(f32),
}

impl Filter {
    pub fn css_name(&self) -> &'static str {
        match self {
            Filter::Blur(_) => "blur",
            Filter::Brightness(_) => "brightness",
            Filter::Contrast(_) => "contrast",
            Filter::Grayscale(_) => "grayscale",
            Filter::HueRotate(_) => "hue-rotate",
            Filter::Invert(_) => "invert",
            Filter::Opacity(_) => "opacity",
            Filter::Saturate(_) => "saturate",
            Filter::Sepia(_) => "sepia",
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            Filter::Blur(v)
            | Filter::Brightness(v)
            | Filter::Contrast(v)
            | Filter::Grayscale(v)
            | Filter::HueRotate(v)
            | Filter::Invert(v)
            | Filter::Opacity(v)
            | Filter::Saturate(v)
            | Filter::Sepia(v) => v,
        }
    }

    pub fn from_name(name: &str, value: f32) -> Option<Self> {
        Some(match name {
            "blur" => Filter::Blur(value),
            "brightness" => Filter::Brightness(value),
            "contrast" => Filter::Contrast(value),
            "grayscale" => Filter::Grayscale(value),
            "hue-rotate" => Filter::HueRotate(value),
            "invert" => Filter::Invert(value),
            "opacity" => Filter::Opacity(value),
            "saturate" => Filter::Saturate(value),
            "sepia" => Filter::Sepia(value),
            _ => return None,
        })
    }
}

/// Box shadow parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxShadow {
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
    pub spread: f32,
    pub color: Color,
    pub inset: bool,
}
