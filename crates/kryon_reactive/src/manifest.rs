//! The reactive manifest: variables, bindings, conditionals, for-loops,
//! component definitions, and the source archive.
//!
//! The manifest is created empty, populated by a frontend while it walks
//! its AST, mutated at runtime by the state manager, and serialized
//! alongside the component tree.

use indexmap::IndexMap;

use kryon_core::{ComponentId, NodeKey};

use crate::value::Value;

/// Declared type of a reactive variable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VarType {
    #[default]
    Int,
    Float,
    Str,
    Bool,
    Custom,
}

impl VarType {
    pub fn name(&self) -> &'static str {
        match self {
            VarType::Int => "int",
            VarType::Float => "float",
            VarType::Str => "string",
            VarType::Bool => "bool",
            VarType::Custom => "custom",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "int" => VarType::Int,
            "float" => VarType::Float,
            "string" => VarType::Str,
            "bool" => VarType::Bool,
            "custom" => VarType::Custom,
            _ => return None,
        })
    }
}

/// A reactive variable.
#[derive(Clone, Debug, PartialEq)]
pub struct ReactiveVariable {
    /// Monotonic, starting at 1.
    pub id: u32,
    pub name: String,
    pub ty: VarType,
    pub value: Value,
    /// Bumped on every successful update.
    pub version: u64,
    pub type_string: Option<String>,
    pub initial_value_json: Option<String>,
    pub scope: Option<String>,
}

/// What a binding drives on its component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BindingType {
    #[default]
    Text,
    Conditional,
    Attribute,
    ForLoop,
    Custom,
}

impl BindingType {
    pub fn name(&self) -> &'static str {
        match self {
            BindingType::Text => "text",
            BindingType::Conditional => "conditional",
            BindingType::Attribute => "attribute",
            BindingType::ForLoop => "for_loop",
            BindingType::Custom => "custom",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "text" => BindingType::Text,
            "conditional" => BindingType::Conditional,
            "attribute" => BindingType::Attribute,
            "for_loop" => BindingType::ForLoop,
            "custom" => BindingType::Custom,
            _ => return None,
        })
    }
}

/// A declared link from a reactive variable to a component property.
#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub component_id: ComponentId,
    pub var_id: u32,
    pub binding_type: BindingType,
    pub expression: String,
}

/// A conditional block controlling then/else branches of a component.
#[derive(Clone, Debug, PartialEq)]
pub struct Conditional {
    pub component_id: ComponentId,
    pub condition: String,
    pub dependent_var_ids: Vec<u32>,
    pub last_eval_result: bool,
    pub suspended: bool,
    pub then_children: Vec<ComponentId>,
    pub else_children: Vec<ComponentId>,
}

/// A registered for-loop over a collection expression.
#[derive(Clone, Debug, PartialEq)]
pub struct ForLoop {
    pub parent_component_id: ComponentId,
    pub collection_expr: String,
    pub collection_var_id: u32,
    /// Detached template subtree in the tree arena.
    pub item_template: Option<NodeKey>,
    pub child_component_ids: Vec<ComponentId>,
}

/// A component definition prop.
#[derive(Clone, Debug, PartialEq)]
pub struct PropDef {
    pub name: String,
    pub ty: String,
    pub default: Option<String>,
}

/// A component definition state variable.
#[derive(Clone, Debug, PartialEq)]
pub struct StateVarDef {
    pub name: String,
    pub ty: String,
    pub initial_expr: Option<String>,
}

/// A named component template, expanded on deserialization.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentDef {
    pub name: String,
    pub props: Vec<PropDef>,
    pub state_vars: Vec<StateVarDef>,
    /// Detached template root in the tree arena.
    pub template: Option<NodeKey>,
}

/// Refuse growth once a vector's capacity passes the halfway point of the
/// address space; doubling beyond it would overflow.
fn can_grow<T>(vec: &Vec<T>, what: &'static str) -> bool {
    if vec.len() == vec.capacity() && vec.capacity() > usize::MAX / 2 {
        tracing::warn!("refusing to grow {what}: capacity overflow");
        return false;
    }
    true
}

/// The reactive manifest.
#[derive(Default)]
pub struct ReactiveManifest {
    pub variables: Vec<ReactiveVariable>,
    pub bindings: Vec<Binding>,
    pub conditionals: Vec<Conditional>,
    pub for_loops: Vec<ForLoop>,
    pub component_defs: Vec<ComponentDef>,
    /// language → original source text, insertion-ordered, upserted.
    pub sources: IndexMap<String, String>,
    next_var_id: u32,
}

impl ReactiveManifest {
    pub fn new() -> Self {
        Self {
            next_var_id: 1,
            ..Default::default()
        }
    }

    /// Register a variable and return its id. Ids are monotonic from 1.
    pub fn add_var(&mut self, name: &str, ty: VarType, value: Value) -> u32 {
        if !can_grow(&self.variables, "variables") {
            return 0;
        }
        // Default::default() leaves next_var_id at 0 on a deserialized
        // manifest; normalize before first use.
        if self.next_var_id == 0 {
            self.next_var_id = 1;
        }
        let id = self.next_var_id;
        self.next_var_id += 1;
        self.variables.push(ReactiveVariable {
            id,
            name: name.to_string(),
            ty,
            value,
            version: 0,
            type_string: None,
            initial_value_json: None,
            scope: None,
        });
        id
    }

    /// Reinstate a fully populated variable (deserialization path),
    /// keeping the id allocator ahead of the restored id.
    pub fn restore_var(&mut self, var: ReactiveVariable) {
        if var.id >= self.next_var_id {
            self.next_var_id = var.id + 1;
        }
        if self.next_var_id == 0 {
            self.next_var_id = 1;
        }
        self.variables.push(var);
    }

    /// Replace the optional metadata strings on a variable.
    pub fn set_var_metadata(
        &mut self,
        var_id: u32,
        type_string: Option<&str>,
        initial_value_json: Option<&str>,
        scope: Option<&str>,
    ) -> bool {
        let Some(var) = self.variables.iter_mut().find(|v| v.id == var_id) else {
            return false;
        };
        var.type_string = type_string.map(str::to_string);
        var.initial_value_json = initial_value_json.map(str::to_string);
        var.scope = scope.map(str::to_string);
        true
    }

    pub fn add_binding(
        &mut self,
        component_id: ComponentId,
        var_id: u32,
        binding_type: BindingType,
        expression: &str,
    ) -> bool {
        if !can_grow(&self.bindings, "bindings") {
            return false;
        }
        self.bindings.push(Binding {
            component_id,
            var_id,
            binding_type,
            expression: expression.to_string(),
        });
        true
    }

    pub fn add_conditional(
        &mut self,
        component_id: ComponentId,
        condition: &str,
        dependent_var_ids: Vec<u32>,
    ) -> bool {
        if !can_grow(&self.conditionals, "conditionals") {
            return false;
        }
        self.conditionals.push(Conditional {
            component_id,
            condition: condition.to_string(),
            dependent_var_ids,
            last_eval_result: false,
            suspended: false,
            then_children: Vec::new(),
            else_children: Vec::new(),
        });
        true
    }

    /// Set then/else branch ids on the first conditional registered for a
    /// component.
    pub fn set_conditional_branches(
        &mut self,
        component_id: ComponentId,
        then_children: Vec<ComponentId>,
        else_children: Vec<ComponentId>,
    ) -> bool {
        let Some(cond) = self
            .conditionals
            .iter_mut()
            .find(|c| c.component_id == component_id)
        else {
            return false;
        };
        cond.then_children = then_children;
        cond.else_children = else_children;
        true
    }

    pub fn add_for_loop(
        &mut self,
        parent_component_id: ComponentId,
        collection_expr: &str,
        collection_var_id: u32,
    ) -> bool {
        if !can_grow(&self.for_loops, "for_loops") {
            return false;
        }
        self.for_loops.push(ForLoop {
            parent_component_id,
            collection_expr: collection_expr.to_string(),
            collection_var_id,
            item_template: None,
            child_component_ids: Vec::new(),
        });
        true
    }

    /// Register a component definition, or update the template of an
    /// existing definition with the same name.
    pub fn add_component_def(&mut self, def: ComponentDef) -> bool {
        if let Some(existing) = self
            .component_defs
            .iter_mut()
            .find(|d| d.name == def.name)
        {
            existing.template = def.template;
            return true;
        }
        if !can_grow(&self.component_defs, "component_defs") {
            return false;
        }
        self.component_defs.push(def);
        true
    }

    pub fn find_var(&self, name: &str) -> Option<&ReactiveVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn get_var(&self, id: u32) -> Option<&ReactiveVariable> {
        self.variables.iter().find(|v| v.id == id)
    }

    pub fn find_component_def(&self, name: &str) -> Option<&ComponentDef> {
        self.component_defs.iter().find(|d| d.name == name)
    }

    /// Assign a new value and bump the version. Returns false when the id
    /// is unknown.
    pub fn update_var(&mut self, id: u32, new_value: Value) -> bool {
        let Some(var) = self.variables.iter_mut().find(|v| v.id == id) else {
            tracing::warn!(var_id = id, "update_var on unknown variable");
            return false;
        };
        var.value = new_value;
        var.version += 1;
        true
    }

    /// Update a variable by name, resolving its id first.
    pub fn update_var_by_name(&mut self, name: &str, new_value: Value) -> bool {
        match self.find_var(name).map(|v| v.id) {
            Some(id) => self.update_var(id, new_value),
            None => false,
        }
    }

    /// Archive source text for a language, replacing any prior entry.
    pub fn add_source(&mut self, lang: &str, code: &str) {
        self.sources.insert(lang.to_string(), code.to_string());
    }

    /// Bindings registered for one component.
    pub fn bindings_for(&self, component_id: ComponentId) -> impl Iterator<Item = &Binding> {
        self.bindings
            .iter()
            .filter(move |b| b.component_id == component_id)
    }
}
