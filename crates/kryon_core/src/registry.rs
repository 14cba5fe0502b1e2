//! Handler registry: per-variant behavior overrides.
//!
//! Each entry is a value of optional function pointers; variants need not
//! implement every capability, and absence of an entry is a valid state —
//! callers fall back to variant-generic behavior.

use rustc_hash::FxHashMap;

use crate::component::{Component, ComponentKind, CustomData};
use crate::geometry::{Rect, Size};
use crate::style::Style;

/// Per-variant capability set.
#[derive(Clone, Copy, Default)]
pub struct ComponentHandler {
    /// Extend the component's KIR object with variant-specific fields.
    pub serialize:
        Option<fn(&Component, &mut serde_json::Map<String, serde_json::Value>) -> bool>,
    /// Consume variant-specific fields from a KIR object.
    pub deserialize: Option<fn(&serde_json::Value, &mut Component) -> bool>,
    /// Intrinsic measurement override.
    pub measure: Option<fn(&Component) -> Size>,
    /// Style applied when the component carries none.
    pub default_style: Option<fn() -> Style>,
    /// Post-style hook, e.g. variant-mandated overrides.
    pub apply_style: Option<fn(&mut Component) -> bool>,
    /// Structural validation; the error string reaches the caller.
    pub validate: Option<fn(&Component) -> Result<(), String>>,
    /// Debug rendering of the component.
    pub to_string: Option<fn(&Component) -> String>,
    /// Full layout override within the given constraints.
    pub layout: Option<fn(&mut Component, Rect)>,
}

/// Dispatch table indexed by component variant, populated once during
/// core initialization.
pub struct HandlerRegistry {
    handlers: FxHashMap<ComponentKind, ComponentHandler>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            handlers: FxHashMap::default(),
        }
    }

    /// The standard registry with built-in validators and measurers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            ComponentKind::Heading,
            ComponentHandler {
                validate: Some(validate_heading),
                ..Default::default()
            },
        );
        registry.register(
            ComponentKind::List,
            ComponentHandler {
                validate: Some(validate_list),
                ..Default::default()
            },
        );
        registry.register(
            ComponentKind::Input,
            ComponentHandler {
                measure: Some(measure_input),
                ..Default::default()
            },
        );
        registry.register(
            ComponentKind::Checkbox,
            ComponentHandler {
                measure: Some(measure_checkbox),
                ..Default::default()
            },
        );
        registry.register(
            ComponentKind::HorizontalRule,
            ComponentHandler {
                measure: Some(measure_hr),
                ..Default::default()
            },
        );
        registry
    }

    pub fn register(&mut self, kind: ComponentKind, handler: ComponentHandler) {
        self.handlers.insert(kind, handler);
    }

    pub fn get(&self, kind: ComponentKind) -> Option<&ComponentHandler> {
        self.handlers.get(&kind)
    }

    /// Run the variant's validator, if registered.
    pub fn validate(&self, component: &Component) -> Result<(), String> {
        match self.get(component.kind).and_then(|h| h.validate) {
            Some(validate) => validate(component),
            None => Ok(()),
        }
    }

    /// Run the variant's measurer, if registered.
    pub fn measure(&self, component: &Component) -> Option<Size> {
        self.get(component.kind)
            .and_then(|h| h.measure)
            .map(|measure| measure(component))
    }

    /// Validate a whole tree, collecting every failure with the id of
    /// the offending component.
    pub fn validate_tree(
        &self,
        tree: &crate::tree::ComponentTree,
    ) -> Vec<(crate::component::ComponentId, String)> {
        let mut failures = Vec::new();
        let Some(root) = tree.root() else {
            return failures;
        };
        for key in tree.descendants(root) {
            let Some(node) = tree.get(key) else { continue };
            if let Err(message) = self.validate(node) {
                failures.push((node.id, message));
            }
        }
        failures
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn validate_heading(component: &Component) -> Result<(), String> {
    match &component.custom_data {
        Some(CustomData::Heading { level, .. }) if (1..=6).contains(level) => Ok(()),
        Some(CustomData::Heading { level, .. }) => {
            Err(format!("heading level {level} outside 1-6"))
        }
        _ => Err("heading without level data".to_string()),
    }
}

fn validate_list(component: &Component) -> Result<(), String> {
    match &component.custom_data {
        Some(CustomData::List { .. }) => Ok(()),
        _ => Err("list without list data".to_string()),
    }
}

fn measure_input(_component: &Component) -> Size {
    Size::new(200.0, 30.0)
}

fn measure_checkbox(_component: &Component) -> Size {
    Size::new(18.0, 18.0)
}

fn measure_hr(_component: &Component) -> Size {
    Size::new(0.0, 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentId;

    #[test]
    fn missing_entry_is_valid_state() {
        let registry = HandlerRegistry::with_defaults();
        assert!(registry.get(ComponentKind::Canvas).is_none());
        let c = Component::new(ComponentId(1), ComponentKind::Canvas);
        assert!(registry.validate(&c).is_ok());
        assert!(registry.measure(&c).is_none());
    }

    #[test]
    fn heading_level_validated() {
        let registry = HandlerRegistry::with_defaults();
        let mut c = Component::new(ComponentId(1), ComponentKind::Heading);
        assert!(registry.validate(&c).is_err());
        c.custom_data = Some(CustomData::Heading {
            level: 3,
            anchor: None,
        });
        assert!(registry.validate(&c).is_ok());
        c.custom_data = Some(CustomData::Heading {
            level: 7,
            anchor: None,
        });
        assert!(registry.validate(&c).is_err());
    }

    #[test]
    fn input_measurement_defaults() {
        let registry = HandlerRegistry::with_defaults();
        let c = Component::new(ComponentId(1), ComponentKind::Input);
        assert_eq!(registry.measure(&c), Some(Size::new(200.0, 30.0)));
    }

    #[test]
    fn tree_validation_collects_failures() {
        use crate::tree::ComponentTree;

        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Container);
        tree.set_root(root);
        let good = tree.create(ComponentKind::Heading);
        tree.get_mut(good).unwrap().custom_data = Some(CustomData::Heading {
            level: 2,
            anchor: None,
        });
        let bad = tree.create(ComponentKind::Heading);
        tree.add_child(root, good);
        tree.add_child(root, bad);

        let registry = HandlerRegistry::with_defaults();
        let failures = registry.validate_tree(&tree);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, tree.get(bad).unwrap().id);
    }
}
