//! The state manager: a FIFO queue of updates, batched flushing, and
//! change-notification fanout.
//!
//! Queueing is non-blocking and single-producer/single-consumer by
//! construction: one event tick produces updates, the subsequent flush
//! consumes them. Applying an update requires collaborators that live
//! above this crate (the tree, the evaluator, compiled handlers), so
//! `flush` drives a caller-supplied [`FlushHost`].

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use kryon_core::{ComponentId, DirtyFlags};

use crate::value::Value;

/// A queued state mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum StateUpdate {
    /// Assign a variable by name, optionally scoped.
    SetVar {
        name: String,
        value: Value,
        scope: Option<String>,
    },
    /// Apply dirty flags to a component, optionally over its subtree.
    MarkDirty {
        component_id: ComponentId,
        flags: DirtyFlags,
        recursive: bool,
    },
    /// Run a compiled handler on the VM.
    CallHandler {
        component_id: ComponentId,
        handler_name: String,
        instance_id: Option<u32>,
    },
    /// Copy an input component's text into its bound variable.
    SyncInput { component_id: ComponentId },
    /// Evaluate an expression and assign the result to a variable.
    EvalExpression {
        expression: String,
        target_var: String,
        scope: Option<String>,
    },
    /// Re-expand a registered for-loop.
    RenderLoop { for_loop_index: usize },
    /// Toggle a conditional component's visibility.
    Conditional { component_id: ComponentId, show: bool },
}

/// Collaborator interface driven by [`StateManager::flush`].
pub trait FlushHost {
    fn set_var(&mut self, name: &str, value: &Value, scope: Option<&str>) -> bool;
    fn eval_expression(&mut self, expression: &str, target_var: &str, scope: Option<&str>)
        -> bool;
    fn call_handler(
        &mut self,
        component_id: ComponentId,
        handler_name: &str,
        instance_id: Option<u32>,
    ) -> bool;
    fn mark_dirty(&mut self, component_id: ComponentId, flags: DirtyFlags, recursive: bool)
        -> bool;
    fn sync_input(&mut self, component_id: ComponentId) -> bool;
    fn render_loop(&mut self, for_loop_index: usize) -> bool;
    fn set_conditional(&mut self, component_id: ComponentId, show: bool) -> bool;
}

/// Outcome of one flush.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlushResult {
    pub updates_processed: usize,
    pub components_affected: usize,
    pub layout_recomputations: usize,
    pub expression_evaluations: usize,
    pub elapsed_ms: f64,
    pub had_errors: bool,
}

/// Counters accumulated over a session.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProfileStats {
    pub flushes: u64,
    pub updates: u64,
    pub errors: u64,
    pub expression_evaluations: u64,
    pub total_elapsed_ms: f64,
}

/// Default flush timeout: one 60 Hz frame.
pub const DEFAULT_FLUSH_TIMEOUT_MS: u64 = 16;

/// The update queue and its flush machinery.
pub struct StateManager {
    queue: VecDeque<StateUpdate>,
    flush_timeout: Duration,
    last_flush: Instant,
    generation: u64,
    stats: ProfileStats,
    callbacks: Vec<Box<dyn FnMut(ComponentId)>>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            flush_timeout: Duration::from_millis(DEFAULT_FLUSH_TIMEOUT_MS),
            last_flush: Instant::now(),
            generation: 0,
            stats: ProfileStats::default(),
            callbacks: Vec::new(),
        }
    }

    pub fn with_flush_timeout(timeout: Duration) -> Self {
        Self {
            flush_timeout: timeout,
            ..Self::new()
        }
    }

    /// Number of pending updates.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Flush generation counter, incremented once per flush.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> ProfileStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = ProfileStats::default();
    }

    /// Register a change callback invoked once per affected component
    /// after each flush.
    pub fn on_change<F>(&mut self, callback: F)
    where
        F: FnMut(ComponentId) + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Queue an update. Non-blocking; takes ownership of its payloads.
    pub fn queue_update(&mut self, update: StateUpdate) {
        self.queue.push_back(update);
    }

    pub fn queue_set_var(&mut self, name: &str, value: Value, scope: Option<&str>) {
        self.queue_update(StateUpdate::SetVar {
            name: name.to_string(),
            value,
            scope: scope.map(str::to_string),
        });
    }

    pub fn queue_mark_dirty(&mut self, component_id: ComponentId, flags: DirtyFlags, recursive: bool) {
        self.queue_update(StateUpdate::MarkDirty {
            component_id,
            flags,
            recursive,
        });
    }

    pub fn queue_call_handler(
        &mut self,
        component_id: ComponentId,
        handler_name: &str,
        instance_id: Option<u32>,
    ) {
        self.queue_update(StateUpdate::CallHandler {
            component_id,
            handler_name: handler_name.to_string(),
            instance_id,
        });
    }

    pub fn queue_sync_input(&mut self, component_id: ComponentId) {
        self.queue_update(StateUpdate::SyncInput { component_id });
    }

    pub fn queue_eval_expression(&mut self, expression: &str, target_var: &str, scope: Option<&str>) {
        self.queue_update(StateUpdate::EvalExpression {
            expression: expression.to_string(),
            target_var: target_var.to_string(),
            scope: scope.map(str::to_string),
        });
    }

    pub fn queue_render_loop(&mut self, for_loop_index: usize) {
        self.queue_update(StateUpdate::RenderLoop { for_loop_index });
    }

    pub fn queue_conditional(&mut self, component_id: ComponentId, show: bool) {
        self.queue_update(StateUpdate::Conditional { component_id, show });
    }

    /// True when there is pending work or the flush timeout has elapsed
    /// since the last flush.
    pub fn flush_needed(&self) -> bool {
        !self.queue.is_empty() || self.last_flush.elapsed() >= self.flush_timeout
    }

    /// Drain the queue in FIFO order, applying each update through the
    /// host, then fan out change notifications.
    pub fn flush(&mut self, host: &mut dyn FlushHost) -> FlushResult {
        let started = Instant::now();
        // Snapshot: updates queued by callbacks or handlers during this
        // flush land in the next one.
        let updates: Vec<StateUpdate> = self.queue.drain(..).collect();

        let mut result = FlushResult {
            updates_processed: updates.len(),
            ..Default::default()
        };
        let mut affected: Vec<ComponentId> = Vec::new();
        let mut touch = |id: ComponentId, affected: &mut Vec<ComponentId>| {
            if !affected.contains(&id) {
                affected.push(id);
            }
        };

        for update in updates {
            let ok = match update {
                StateUpdate::SetVar { name, value, scope } => {
                    host.set_var(&name, &value, scope.as_deref())
                }
                StateUpdate::EvalExpression {
                    expression,
                    target_var,
                    scope,
                } => {
                    result.expression_evaluations += 1;
                    host.eval_expression(&expression, &target_var, scope.as_deref())
                }
                StateUpdate::CallHandler {
                    component_id,
                    handler_name,
                    instance_id,
                } => {
                    touch(component_id, &mut affected);
                    host.call_handler(component_id, &handler_name, instance_id)
                }
                StateUpdate::MarkDirty {
                    component_id,
                    flags,
                    recursive,
                } => {
                    touch(component_id, &mut affected);
                    if flags.contains(DirtyFlags::LAYOUT) || recursive {
                        result.layout_recomputations += 1;
                    }
                    host.mark_dirty(component_id, flags, recursive)
                }
                StateUpdate::SyncInput { component_id } => {
                    touch(component_id, &mut affected);
                    host.sync_input(component_id)
                }
                StateUpdate::RenderLoop { for_loop_index } => host.render_loop(for_loop_index),
                StateUpdate::Conditional { component_id, show } => {
                    touch(component_id, &mut affected);
                    host.set_conditional(component_id, show)
                }
            };
            if !ok {
                result.had_errors = true;
            }
        }

        self.generation += 1;
        result.components_affected = affected.len();
        for id in &affected {
            for callback in &mut self.callbacks {
                callback(*id);
            }
        }

        result.elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.last_flush = Instant::now();
        self.stats.flushes += 1;
        self.stats.updates += result.updates_processed as u64;
        self.stats.expression_evaluations += result.expression_evaluations as u64;
        if result.had_errors {
            self.stats.errors += 1;
        }
        self.stats.total_elapsed_ms += result.elapsed_ms;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records calls in arrival order.
    #[derive(Default)]
    struct RecordingHost {
        log: Vec<String>,
        fail_on: Option<String>,
    }

    impl FlushHost for RecordingHost {
        fn set_var(&mut self, name: &str, value: &Value, _scope: Option<&str>) -> bool {
            self.log.push(format!("set {name}={value}"));
            self.fail_on.as_deref() != Some(name)
        }

        fn eval_expression(&mut self, expression: &str, target_var: &str, _scope: Option<&str>) -> bool {
            self.log.push(format!("eval {target_var}<-{expression}"));
            true
        }

        fn call_handler(
            &mut self,
            component_id: ComponentId,
            handler_name: &str,
            _instance_id: Option<u32>,
        ) -> bool {
            self.log.push(format!("call {component_id}:{handler_name}"));
            true
        }

        fn mark_dirty(&mut self, component_id: ComponentId, _flags: DirtyFlags, recursive: bool) -> bool {
            self.log.push(format!("dirty {component_id} r={recursive}"));
            true
        }

        fn sync_input(&mut self, component_id: ComponentId) -> bool {
            self.log.push(format!("sync {component_id}"));
            true
        }

        fn render_loop(&mut self, for_loop_index: usize) -> bool {
            self.log.push(format!("loop {for_loop_index}"));
            true
        }

        fn set_conditional(&mut self, component_id: ComponentId, show: bool) -> bool {
            self.log.push(format!("cond {component_id}={show}"));
            true
        }
    }

    #[test]
    fn fifo_order_preserved() {
        let mut mgr = StateManager::new();
        let mut host = RecordingHost::default();
        mgr.queue_set_var("a", Value::Int(1), None);
        mgr.queue_mark_dirty(ComponentId(2), DirtyFlags::LAYOUT, false);
        mgr.queue_set_var("b", Value::Int(2), None);

        let result = mgr.flush(&mut host);
        assert_eq!(result.updates_processed, 3);
        assert_eq!(
            host.log,
            vec!["set a=1", "dirty 2 r=false", "set b=2"]
        );
        assert_eq!(mgr.pending(), 0);
    }

    #[test]
    fn flush_needed_when_queued() {
        let mut mgr = StateManager::with_flush_timeout(Duration::from_secs(3600));
        assert!(!mgr.flush_needed());
        mgr.queue_conditional(ComponentId(1), true);
        assert!(mgr.flush_needed());
        mgr.flush(&mut RecordingHost::default());
        assert!(!mgr.flush_needed());
    }

    #[test]
    fn flush_needed_after_timeout() {
        let mgr = StateManager::with_flush_timeout(Duration::ZERO);
        assert!(mgr.flush_needed());
    }

    #[test]
    fn affected_components_deduplicated() {
        let mut mgr = StateManager::new();
        let mut host = RecordingHost::default();
        mgr.queue_mark_dirty(ComponentId(7), DirtyFlags::LAYOUT, false);
        mgr.queue_mark_dirty(ComponentId(7), DirtyFlags::RENDER, false);
        mgr.queue_sync_input(ComponentId(8));
        let result = mgr.flush(&mut host);
        assert_eq!(result.components_affected, 2);
        assert_eq!(result.layout_recomputations, 1);
    }

    #[test]
    fn change_callbacks_fan_out() {
        let seen: Rc<RefCell<Vec<ComponentId>>> = Rc::default();
        let seen2 = Rc::clone(&seen);
        let mut mgr = StateManager::new();
        mgr.on_change(move |id| seen2.borrow_mut().push(id));
        mgr.queue_conditional(ComponentId(3), false);
        mgr.queue_mark_dirty(ComponentId(4), DirtyFlags::LAYOUT, true);
        mgr.flush(&mut RecordingHost::default());
        assert_eq!(*seen.borrow(), vec![ComponentId(3), ComponentId(4)]);
    }

    #[test]
    fn errors_recorded_and_flush_continues() {
        let mut mgr = StateManager::new();
        let mut host = RecordingHost {
            fail_on: Some("bad".into()),
            ..Default::default()
        };
        mgr.queue_set_var("bad", Value::Int(1), None);
        mgr.queue_set_var("good", Value::Int(2), None);
        let result = mgr.flush(&mut host);
        assert!(result.had_errors);
        assert_eq!(host.log.len(), 2);
        assert_eq!(mgr.stats().errors, 1);
    }

    #[test]
    fn generation_increments_per_flush() {
        let mut mgr = StateManager::new();
        assert_eq!(mgr.generation(), 0);
        mgr.flush(&mut RecordingHost::default());
        mgr.flush(&mut RecordingHost::default());
        assert_eq!(mgr.generation(), 2);
    }

    #[test]
    fn stats_accumulate_and_reset() {
        let mut mgr = StateManager::new();
        mgr.queue_eval_expression("a + 1", "a", None);
        mgr.flush(&mut RecordingHost::default());
        assert_eq!(mgr.stats().flushes, 1);
        assert_eq!(mgr.stats().expression_evaluations, 1);
        mgr.reset_stats();
        assert_eq!(mgr.stats(), ProfileStats::default());
    }
}
