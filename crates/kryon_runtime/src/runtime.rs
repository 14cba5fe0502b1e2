//! Runtime orchestration: wires the tree context, reactive manifest,
//! bytecode VM, and state manager together and applies queued updates.

use rustc_hash::FxHashMap;
use serde_json::Value as Json;

use kryon_core::{ComponentId, DirtyFlags, IrContext};
use kryon_kir::KirDocument;
use kryon_reactive::{
    evaluate, BindingType, BytecodeMetadata, FlushHost, FlushResult, ReactiveManifest,
    StateManager, Value, VarType, Vm,
};

use crate::foreach;

/// The live runtime for one document.
pub struct Runtime {
    pub context: IrContext,
    pub manifest: ReactiveManifest,
    pub logic: BytecodeMetadata,
    pub vm: Vm,
    pub state: StateManager,
    /// Handler overrides per (component, handler name); falls back to a
    /// by-name lookup in the logic block.
    handlers: FxHashMap<(ComponentId, String), u32>,
}

impl Runtime {
    /// Build a runtime from a deserialized document. VM states and host
    /// declarations come from the logic block.
    pub fn from_document(doc: KirDocument) -> Self {
        let mut vm = Vm::new();
        vm.load_metadata(&doc.logic);
        Self {
            context: doc.context,
            manifest: doc.manifest,
            logic: doc.logic,
            vm,
            state: StateManager::new(),
            handlers: FxHashMap::default(),
        }
    }

    /// Bind a specific compiled function to `(component, handler_name)`.
    pub fn register_handler(&mut self, component_id: ComponentId, name: &str, function_id: u32) {
        self.handlers
            .insert((component_id, name.to_string()), function_id);
    }

    /// Expand every build-time ForEach in the document.
    pub fn expand_templates(&mut self) {
        if let Some(root) = self.context.tree.root() {
            foreach::expand_all(&mut self.context.tree, root);
        }
    }

    /// Drain the update queue, applying each change in FIFO order.
    pub fn tick(&mut self) -> FlushResult {
        let mut host = RuntimeHost {
            context: &mut self.context,
            manifest: &mut self.manifest,
            logic: &self.logic,
            vm: &mut self.vm,
            handlers: &self.handlers,
        };
        self.state.flush(&mut host)
    }
}

/// Value coercion for variables created on first assignment.
fn var_type_of(value: &Value) -> VarType {
    match value {
        Value::Int(_) => VarType::Int,
        Value::Float(_) => VarType::Float,
        Value::Str(_) => VarType::Str,
        Value::Bool(_) => VarType::Bool,
    }
}

struct RuntimeHost<'a> {
    context: &'a mut IrContext,
    manifest: &'a mut ReactiveManifest,
    logic: &'a BytecodeMetadata,
    vm: &'a mut Vm,
    handlers: &'a FxHashMap<(ComponentId, String), u32>,
}

impl RuntimeHost<'_> {
    /// Mirror VM state slots back into same-named manifest variables
    /// after a handler runs.
    fn sync_states_to_manifest(&mut self) {
        for state in &self.logic.states {
            let Some(value) = self.vm.state(state.id).cloned() else {
                continue;
            };
            if self.manifest.find_var(&state.name).is_some() {
                self.manifest.update_var_by_name(&state.name, value);
            }
        }
    }

    /// Re-evaluate every non-suspended conditional that depends on a
    /// variable and toggle its branches when the result flipped. The
    /// variable's new value is already in place, so consequences follow
    /// the assignment.
    fn reevaluate_conditionals(&mut self, var_id: u32) {
        let affected: Vec<ComponentId> = self
            .manifest
            .conditionals
            .iter()
            .filter(|c| !c.suspended && c.dependent_var_ids.contains(&var_id))
            .map(|c| c.component_id)
            .collect();
        for component_id in affected {
            let Some(cond) = self
                .manifest
                .conditionals
                .iter()
                .find(|c| c.component_id == component_id)
            else {
                continue;
            };
            let condition = cond.condition.clone();
            let previous = cond.last_eval_result;
            match evaluate(&condition, self.manifest) {
                Ok(value) => {
                    let show = value.is_truthy();
                    if show != previous {
                        self.set_conditional(component_id, show);
                    }
                }
                Err(e) => {
                    tracing::warn!(condition = %condition, "conditional re-evaluation failed: {e}");
                }
            }
        }
    }
}

impl FlushHost for RuntimeHost<'_> {
    fn set_var(&mut self, name: &str, value: &Value, scope: Option<&str>) -> bool {
        if self.manifest.update_var_by_name(name, value.clone()) {
            if let Some(id) = self.manifest.find_var(name).map(|v| v.id) {
                self.reevaluate_conditionals(id);
            }
            return true;
        }
        // First assignment declares the variable in the scope table.
        let id = self
            .manifest
            .add_var(name, var_type_of(value), value.clone());
        if id == 0 {
            return false;
        }
        if let Some(scope) = scope {
            self.manifest.set_var_metadata(id, None, None, Some(scope));
        }
        true
    }

    fn eval_expression(&mut self, expression: &str, target_var: &str, scope: Option<&str>) -> bool {
        match evaluate(expression, self.manifest) {
            Ok(value) => self.set_var(target_var, &value, scope),
            Err(e) => {
                tracing::warn!(expression, "expression evaluation failed: {e}");
                false
            }
        }
    }

    fn call_handler(
        &mut self,
        component_id: ComponentId,
        handler_name: &str,
        _instance_id: Option<u32>,
    ) -> bool {
        let function = self
            .handlers
            .get(&(component_id, handler_name.to_string()))
            .and_then(|&id| self.logic.get_function(id))
            .or_else(|| self.logic.find_function(handler_name));
        let Some(function) = function else {
            tracing::warn!(
                component = component_id.0,
                handler = handler_name,
                "no compiled handler found"
            );
            return false;
        };
        let code = function.code.clone();
        let ok = self.vm.execute(&code);
        if !ok {
            tracing::warn!(
                handler = handler_name,
                error = self.vm.error().unwrap_or("unknown"),
                "handler aborted"
            );
        }
        self.sync_states_to_manifest();
        ok
    }

    fn mark_dirty(&mut self, component_id: ComponentId, flags: DirtyFlags, recursive: bool) -> bool {
        let Some(key) = self.context.find_by_id(component_id) else {
            tracing::warn!(component = component_id.0, "MARK_DIRTY on unknown component");
            return false;
        };
        if recursive {
            self.context.tree.invalidate_subtree(key);
        }
        if flags.contains(DirtyFlags::LAYOUT) {
            self.context.tree.mark_dirty(key);
        }
        if flags.contains(DirtyFlags::RENDER) {
            self.context.tree.mark_render_dirty(key);
        }
        if let Some(node) = self.context.tree.get_mut(key) {
            node.dirty |= flags;
        }
        true
    }

    fn sync_input(&mut self, component_id: ComponentId) -> bool {
        let Some(key) = self.context.find_by_id(component_id) else {
            return false;
        };
        let text = match self.context.tree.get(key) {
            Some(node) => node.text_content.clone().unwrap_or_default(),
            None => return false,
        };
        let var_id = self
            .manifest
            .bindings_for(component_id)
            .find(|b| matches!(b.binding_type, BindingType::Text | BindingType::Attribute))
            .map(|b| b.var_id);
        match var_id {
            Some(var_id) => self.manifest.update_var(var_id, Value::Str(text)),
            None => {
                tracing::warn!(component = component_id.0, "input has no bound variable");
                false
            }
        }
    }

    fn render_loop(&mut self, for_loop_index: usize) -> bool {
        let Some(for_loop) = self.manifest.for_loops.get(for_loop_index).cloned() else {
            tracing::warn!(for_loop_index, "RENDER_LOOP on unknown loop");
            return false;
        };
        let Some(parent_key) = self.context.find_by_id(for_loop.parent_component_id) else {
            return false;
        };
        let Some(template) = for_loop.item_template else {
            tracing::warn!(for_loop_index, "loop has no template");
            return false;
        };
        // The collection variable holds a JSON array (as text).
        let elements: Vec<Json> = self
            .manifest
            .get_var(for_loop.collection_var_id)
            .and_then(|var| var.value.as_str().map(str::to_string))
            .and_then(|text| serde_json::from_str::<Json>(&text).ok())
            .and_then(|json| json.as_array().cloned())
            .unwrap_or_default();

        // Drop the previous instances, then re-materialize.
        let previous = self
            .manifest
            .for_loops
            .get_mut(for_loop_index)
            .map(|fl| std::mem::take(&mut fl.child_component_ids))
            .unwrap_or_default();
        for id in previous {
            if let Some(key) = self.context.find_by_id(id) {
                self.context.tree.destroy(key);
            }
        }

        let mut new_ids = Vec::with_capacity(elements.len());
        for (index, _element) in elements.iter().enumerate() {
            let Some(copy) = self.context.tree.deep_copy(template) else {
                continue;
            };
            if let Some(node) = self.context.tree.get_mut(copy) {
                node.iteration_index = Some(index as u32);
            }
            if self.context.tree.add_child(parent_key, copy) {
                if let Some(node) = self.context.tree.get(copy) {
                    new_ids.push(node.id);
                }
            }
        }
        if let Some(fl) = self.manifest.for_loops.get_mut(for_loop_index) {
            fl.child_component_ids = new_ids;
        }
        self.context.tree.invalidate_subtree(parent_key);
        true
    }

    fn set_conditional(&mut self, component_id: ComponentId, show: bool) -> bool {
        let Some(index) = self
            .manifest
            .conditionals
            .iter()
            .position(|c| c.component_id == component_id)
        else {
            tracing::warn!(component = component_id.0, "CONDITIONAL on unknown component");
            return false;
        };
        self.manifest.conditionals[index].last_eval_result = show;
        let (then_children, else_children) = {
            let cond = &self.manifest.conditionals[index];
            (cond.then_children.clone(), cond.else_children.clone())
        };
        for (ids, visible) in [(then_children, show), (else_children, !show)] {
            for id in ids {
                let Some(key) = self.context.find_by_id(id) else {
                    continue;
                };
                if let Some(node) = self.context.tree.get_mut(key) {
                    node.style_mut().visible = visible;
                }
                self.context.tree.mark_dirty(key);
            }
        }
        if let Some(key) = self.context.find_by_id(component_id) {
            self.context.tree.mark_dirty(key);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kryon_core::ComponentKind;
    use kryon_reactive::{Arg, Function, Instruction, OpCode, StateDef};

    fn counter_runtime() -> (Runtime, ComponentId) {
        let mut doc = KirDocument::new();
        let root = doc.context.create_root(ComponentKind::Container);
        let button = doc.context.tree.create(ComponentKind::Button);
        doc.context.tree.add_child(root, button);
        let button_id = doc.context.tree.get(button).unwrap().id;

        doc.manifest.add_var("counter", VarType::Int, Value::Int(0));
        doc.logic.states.push(StateDef {
            id: 1,
            name: "counter".into(),
            initial: Value::Int(0),
        });
        doc.logic.functions.push(Function {
            id: 1,
            name: "increment".into(),
            code: vec![
                Instruction::with_arg(OpCode::GetState, Arg::Id(1)),
                Instruction::with_arg(OpCode::PushInt, Arg::Int(1)),
                Instruction::new(OpCode::Add),
                Instruction::with_arg(OpCode::SetState, Arg::Id(1)),
                Instruction::new(OpCode::Halt),
            ],
        });
        (Runtime::from_document(doc), button_id)
    }

    #[test]
    fn handler_updates_vm_state_and_manifest() {
        let (mut runtime, button_id) = counter_runtime();
        runtime.state.queue_call_handler(button_id, "increment", None);
        runtime.state.queue_call_handler(button_id, "increment", None);
        let result = runtime.tick();
        assert_eq!(result.updates_processed, 2);
        assert!(!result.had_errors);
        assert_eq!(runtime.vm.state(1), Some(&Value::Int(2)));
        let var = runtime.manifest.find_var("counter").unwrap();
        assert_eq!(var.value, Value::Int(2));
        assert_eq!(var.version, 2);
    }

    #[test]
    fn set_var_before_dirty_consequences() {
        let (mut runtime, button_id) = counter_runtime();
        runtime
            .state
            .queue_set_var("counter", Value::Int(41), None);
        runtime
            .state
            .queue_mark_dirty(button_id, DirtyFlags::LAYOUT, false);
        let result = runtime.tick();
        assert!(!result.had_errors);
        assert_eq!(
            runtime.manifest.find_var("counter").unwrap().value,
            Value::Int(41)
        );
        let key = runtime.context.find_by_id(button_id).unwrap();
        assert!(runtime
            .context
            .tree
            .get(key)
            .unwrap()
            .dirty
            .contains(DirtyFlags::LAYOUT));
    }

    #[test]
    fn eval_expression_assigns_target() {
        let (mut runtime, _) = counter_runtime();
        runtime
            .state
            .queue_set_var("counter", Value::Int(20), None);
        runtime
            .state
            .queue_eval_expression("counter * 2 + 2", "doubled", None);
        let result = runtime.tick();
        assert!(!result.had_errors);
        assert_eq!(result.expression_evaluations, 1);
        assert_eq!(
            runtime.manifest.find_var("doubled").unwrap().value,
            Value::Int(42)
        );
    }

    #[test]
    fn unknown_handler_is_an_error_but_flush_continues() {
        let (mut runtime, button_id) = counter_runtime();
        runtime.state.queue_call_handler(button_id, "missing", None);
        runtime.state.queue_set_var("counter", Value::Int(1), None);
        let result = runtime.tick();
        assert!(result.had_errors);
        assert_eq!(
            runtime.manifest.find_var("counter").unwrap().value,
            Value::Int(1)
        );
    }

    #[test]
    fn conditional_toggles_branch_visibility() {
        let (mut runtime, _) = counter_runtime();
        let root = runtime.context.root().unwrap();
        let then_node = runtime.context.tree.create(ComponentKind::Text);
        let else_node = runtime.context.tree.create(ComponentKind::Text);
        runtime.context.tree.add_child(root, then_node);
        runtime.context.tree.add_child(root, else_node);
        let then_id = runtime.context.tree.get(then_node).unwrap().id;
        let else_id = runtime.context.tree.get(else_node).unwrap().id;
        let root_id = runtime.context.tree.get(root).unwrap().id;

        runtime.manifest.add_conditional(root_id, "counter > 0", vec![1]);
        runtime
            .manifest
            .set_conditional_branches(root_id, vec![then_id], vec![else_id]);

        runtime.state.queue_conditional(root_id, false);
        runtime.tick();
        assert!(!runtime.context.tree.get(then_node).unwrap().is_visible());
        assert!(runtime.context.tree.get(else_node).unwrap().is_visible());

        runtime.state.queue_conditional(root_id, true);
        runtime.tick();
        assert!(runtime.context.tree.get(then_node).unwrap().is_visible());
        assert!(!runtime.context.tree.get(else_node).unwrap().is_visible());
        assert!(runtime.manifest.conditionals[0].last_eval_result);
    }

    #[test]
    fn set_var_reevaluates_dependent_conditionals() {
        let (mut runtime, _) = counter_runtime();
        let root = runtime.context.root().unwrap();
        let then_node = runtime.context.tree.create(ComponentKind::Text);
        runtime.context.tree.add_child(root, then_node);
        let then_id = runtime.context.tree.get(then_node).unwrap().id;
        let root_id = runtime.context.tree.get(root).unwrap().id;

        let counter_id = runtime.manifest.find_var("counter").unwrap().id;
        runtime
            .manifest
            .add_conditional(root_id, "counter > 0", vec![counter_id]);
        runtime
            .manifest
            .set_conditional_branches(root_id, vec![then_id], Vec::new());

        runtime.state.queue_set_var("counter", Value::Int(5), None);
        runtime.tick();
        assert!(runtime.manifest.conditionals[0].last_eval_result);
        assert!(runtime.context.tree.get(then_node).unwrap().is_visible());

        runtime.state.queue_set_var("counter", Value::Int(0), None);
        runtime.tick();
        assert!(!runtime.manifest.conditionals[0].last_eval_result);
        assert!(!runtime.context.tree.get(then_node).unwrap().is_visible());
    }

    #[test]
    fn render_loop_rebuilds_instances() {
        let mut doc = KirDocument::new();
        let root = doc.context.create_root(ComponentKind::Container);
        let root_id = doc.context.tree.get(root).unwrap().id;
        let template = doc.context.tree.create(ComponentKind::Text);
        doc.context.tree.get_mut(template).unwrap().text_content = Some("item".into());

        let var_id = doc
            .manifest
            .add_var("items", VarType::Str, Value::Str("[1,2,3]".into()));
        doc.manifest.add_for_loop(root_id, "items", var_id);
        doc.manifest.for_loops[0].item_template = Some(template);

        let mut runtime = Runtime::from_document(doc);
        runtime.state.queue_render_loop(0);
        let result = runtime.tick();
        assert!(!result.had_errors);

        let root_key = runtime.context.root().unwrap();
        assert_eq!(runtime.context.tree.get(root_key).unwrap().children.len(), 3);
        assert_eq!(runtime.manifest.for_loops[0].child_component_ids.len(), 3);

        // Shrinking the collection replaces the instances.
        runtime
            .state
            .queue_set_var("items", Value::Str("[9]".into()), None);
        runtime.state.queue_render_loop(0);
        runtime.tick();
        let root_children = runtime.context.tree.get(root_key).unwrap().children.len();
        assert_eq!(root_children, 1);
    }
}
