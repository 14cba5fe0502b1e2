//! Document stylesheet: authored CSS rules, style variables, and media
//! queries, preserved for round-trip and consulted for variable resolution.

use crate::color::Color;

/// A single authored rule, stored as written.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CssRule {
    pub selector: String,
    /// Property/value pairs in authored order.
    pub declarations: Vec<(String, String)>,
}

/// A named style variable addressable from [`ColorValue::Variable`].
///
/// [`ColorValue::Variable`]: crate::color::ColorValue::Variable
#[derive(Clone, Debug, PartialEq)]
pub struct StyleVariable {
    pub id: u16,
    pub name: String,
    pub color: Color,
}

/// An authored media query block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MediaQuery {
    pub condition: String,
    pub rules: Vec<CssRule>,
}

/// The document stylesheet.
#[derive(Clone, Debug, Default)]
pub struct Stylesheet {
    pub rules: Vec<CssRule>,
    pub variables: Vec<StyleVariable>,
    pub media_queries: Vec<MediaQuery>,
    next_variable_id: u16,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable, returning its id. Re-registering a name
    /// updates the color in place and returns the existing id.
    pub fn add_variable(&mut self, name: &str, color: Color) -> u16 {
        if let Some(var) = self.variables.iter_mut().find(|v| v.name == name) {
            var.color = color;
            return var.id;
        }
        let id = self.next_variable_id;
        self.next_variable_id = self.next_variable_id.wrapping_add(1);
        self.variables.push(StyleVariable {
            id,
            name: name.to_string(),
            color,
        });
        id
    }

    /// Reinstate a variable with its serialized id (deserialization
    /// path), keeping the id allocator ahead of it.
    pub fn restore_variable(&mut self, var: StyleVariable) {
        if var.id >= self.next_variable_id {
            self.next_variable_id = var.id.wrapping_add(1);
        }
        self.variables.push(var);
    }

    /// Resolve a variable reference. Unknown ids resolve to `None`; the
    /// renderer falls back to transparent.
    pub fn resolve_variable(&self, id: u16) -> Option<Color> {
        self.variables.iter().find(|v| v.id == id).map(|v| v.color)
    }

    pub fn find_variable(&self, name: &str) -> Option<&StyleVariable> {
        self.variables.iter().find(|v| v.name == name)
    }
}
