//! The stack VM that runs compiled handler functions.
//!
//! A machine is a value stack, a state table keyed by u32 id, a program
//! counter, a halted flag, and an error buffer. Execution starts at pc 0
//! and proceeds one instruction at a time until HALT, RETURN, running off
//! the end of the code, or an error.

use rustc_hash::FxHashMap;

use crate::bytecode::{Arg, BytecodeMetadata, HostFnDecl, Instruction, OpCode};
use crate::value::Value;

/// A registered host function: fixed arity, tagged-value in/out.
struct HostEntry {
    arity: usize,
    func: Box<dyn FnMut(&[Value]) -> Option<Value>>,
}

/// The stack interpreter.
#[derive(Default)]
pub struct Vm {
    stack: Vec<Value>,
    states: FxHashMap<u32, Value>,
    pc: usize,
    halted: bool,
    error: Option<String>,
    hosts: FxHashMap<u32, HostEntry>,
    host_decls: FxHashMap<u32, HostFnDecl>,
}

impl Vm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed states and host declarations from bytecode metadata.
    pub fn load_metadata(&mut self, meta: &BytecodeMetadata) {
        for state in &meta.states {
            self.states.insert(state.id, state.initial.clone());
        }
        for decl in &meta.host_functions {
            self.host_decls.insert(decl.id, decl.clone());
        }
    }

    /// Register an external function callable via CALL_HOST.
    pub fn register_host<F>(&mut self, id: u32, arity: usize, func: F)
    where
        F: FnMut(&[Value]) -> Option<Value> + 'static,
    {
        self.hosts.insert(
            id,
            HostEntry {
                arity,
                func: Box::new(func),
            },
        );
    }

    pub fn set_state(&mut self, id: u32, value: Value) {
        self.states.insert(id, value);
    }

    pub fn state(&self, id: u32) -> Option<&Value> {
        self.states.get(&id)
    }

    pub fn stack_top(&self) -> Option<&Value> {
        self.stack.last()
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn fail(&mut self, message: impl Into<String>) -> bool {
        let message = message.into();
        tracing::warn!(pc = self.pc, "vm error: {message}");
        self.error = Some(message);
        self.halted = true;
        false
    }

    fn pop(&mut self) -> Result<Value, String> {
        self.stack.pop().ok_or_else(|| "stack underflow".to_string())
    }

    /// Run a code sequence to completion. Returns false on any runtime
    /// error, with `halted` set and the error buffer populated.
    pub fn execute(&mut self, code: &[Instruction]) -> bool {
        self.stack.clear();
        self.pc = 0;
        self.halted = false;
        self.error = None;

        while self.pc < code.len() && !self.halted {
            let instr = &code[self.pc];
            self.pc += 1;
            if !self.step(instr) {
                return false;
            }
        }
        self.halted = true;
        true
    }

    fn step(&mut self, instr: &Instruction) -> bool {
        match instr.op {
            OpCode::PushInt => match &instr.arg {
                Some(Arg::Int(v)) => {
                    self.stack.push(Value::Int(*v));
                    true
                }
                _ => self.fail("PUSH_INT without int argument"),
            },
            OpCode::PushFloat => match &instr.arg {
                Some(Arg::Float(v)) => {
                    self.stack.push(Value::Float(*v));
                    true
                }
                _ => self.fail("PUSH_FLOAT without float argument"),
            },
            OpCode::PushString => match &instr.arg {
                Some(Arg::Str(v)) => {
                    self.stack.push(Value::Str(v.clone()));
                    true
                }
                _ => self.fail("PUSH_STRING without string argument"),
            },
            OpCode::PushBool => match &instr.arg {
                Some(Arg::Bool(v)) => {
                    self.stack.push(Value::Bool(*v));
                    true
                }
                _ => self.fail("PUSH_BOOL without bool argument"),
            },
            OpCode::GetState => {
                let Some(Arg::Id(id)) = instr.arg else {
                    return self.fail("GET_STATE without id argument");
                };
                match self.states.get(&id) {
                    Some(value) => {
                        self.stack.push(value.clone());
                        true
                    }
                    None => self.fail(format!("GET_STATE on unknown state {id}")),
                }
            }
            OpCode::SetState => {
                let Some(Arg::Id(id)) = instr.arg else {
                    return self.fail("SET_STATE without id argument");
                };
                match self.pop() {
                    Ok(value) => {
                        self.states.insert(id, value);
                        true
                    }
                    Err(e) => self.fail(e),
                }
            }
            OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div => self.binary_arith(instr.op),
            OpCode::Gt | OpCode::Lt | OpCode::Ge | OpCode::Le => self.binary_compare(instr.op),
            OpCode::Eq | OpCode::Ne => {
                let (b, a) = match (self.pop(), self.pop()) {
                    (Ok(b), Ok(a)) => (b, a),
                    _ => return self.fail("stack underflow"),
                };
                let eq = a.loose_eq(&b);
                self.stack
                    .push(Value::Bool(if instr.op == OpCode::Eq { eq } else { !eq }));
                true
            }
            OpCode::Jump => {
                let Some(Arg::Offset(offset)) = instr.arg else {
                    return self.fail("JUMP without offset argument");
                };
                self.apply_offset(offset)
            }
            OpCode::JumpIfFalse => {
                let Some(Arg::Offset(offset)) = instr.arg else {
                    return self.fail("JUMP_IF_FALSE without offset argument");
                };
                match self.pop() {
                    Ok(cond) if !cond.is_truthy() => self.apply_offset(offset),
                    Ok(_) => true,
                    Err(e) => self.fail(e),
                }
            }
            OpCode::CallHost => {
                let Some(Arg::Id(id)) = instr.arg else {
                    return self.fail("CALL_HOST without id argument");
                };
                self.call_host(id)
            }
            OpCode::Return | OpCode::Halt => {
                self.halted = true;
                true
            }
        }
    }

    fn binary_arith(&mut self, op: OpCode) -> bool {
        let (b, a) = match (self.pop(), self.pop()) {
            (Ok(b), Ok(a)) => (b, a),
            _ => return self.fail("stack underflow"),
        };
        let result = match op {
            OpCode::Add => a.add(&b),
            OpCode::Sub => a.sub(&b),
            OpCode::Mul => a.mul(&b),
            OpCode::Div => a.div(&b),
            _ => unreachable!(),
        };
        match result {
            Ok(value) => {
                self.stack.push(value);
                true
            }
            Err(e) => self.fail(e.to_string()),
        }
    }

    fn binary_compare(&mut self, op: OpCode) -> bool {
        use std::cmp::Ordering;
        let (b, a) = match (self.pop(), self.pop()) {
            (Ok(b), Ok(a)) => (b, a),
            _ => return self.fail("stack underflow"),
        };
        let ordering = match a.compare(&b, op.mnemonic()) {
            Ok(o) => o,
            Err(e) => return self.fail(e.to_string()),
        };
        let result = match op {
            OpCode::Gt => ordering == Ordering::Greater,
            OpCode::Lt => ordering == Ordering::Less,
            OpCode::Ge => ordering != Ordering::Less,
            OpCode::Le => ordering != Ordering::Greater,
            _ => unreachable!(),
        };
        self.stack.push(Value::Bool(result));
        true
    }

    /// Offsets are relative to the instruction after the jump; the pc has
    /// already advanced when this runs.
    fn apply_offset(&mut self, offset: i32) -> bool {
        let target = self.pc as i64 + offset as i64;
        if target < 0 {
            return self.fail(format!("jump target {target} out of range"));
        }
        self.pc = target as usize;
        true
    }

    fn call_host(&mut self, id: u32) -> bool {
        if let Some(entry) = self.hosts.get_mut(&id) {
            if self.stack.len() < entry.arity {
                return self.fail(format!("CALL_HOST {id}: stack underflow"));
            }
            let args = self.stack.split_off(self.stack.len() - entry.arity);
            if let Some(result) = (entry.func)(&args) {
                self.stack.push(result);
            }
            return true;
        }
        match self.host_decls.get(&id) {
            Some(decl) if decl.required => {
                let name = decl.name.clone();
                self.fail(format!("required host function {name} ({id}) not registered"))
            }
            Some(decl) => {
                tracing::warn!(
                    id,
                    name = %decl.name,
                    "optional host function not registered, call skipped"
                );
                true
            }
            None => self.fail(format!("CALL_HOST on unknown id {id}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::StateDef;

    fn push_int(v: i64) -> Instruction {
        Instruction::with_arg(OpCode::PushInt, Arg::Int(v))
    }

    #[test]
    fn arithmetic_leaves_result_on_stack() {
        // PUSH_INT 5; PUSH_INT 3; ADD; HALT => int 8
        let code = vec![
            push_int(5),
            push_int(3),
            Instruction::new(OpCode::Add),
            Instruction::new(OpCode::Halt),
        ];
        let mut vm = Vm::new();
        assert!(vm.execute(&code));
        assert_eq!(vm.stack_top(), Some(&Value::Int(8)));
        assert!(vm.halted());
        assert!(vm.error().is_none());
    }

    #[test]
    fn state_increment() {
        let code = vec![
            Instruction::with_arg(OpCode::GetState, Arg::Id(1)),
            push_int(1),
            Instruction::new(OpCode::Add),
            Instruction::with_arg(OpCode::SetState, Arg::Id(1)),
            Instruction::new(OpCode::Halt),
        ];
        let mut vm = Vm::new();
        vm.set_state(1, Value::Int(0));
        assert!(vm.execute(&code));
        assert_eq!(vm.state(1), Some(&Value::Int(1)));
    }

    #[test]
    fn repeated_increments_accumulate() {
        let code = vec![
            Instruction::with_arg(OpCode::GetState, Arg::Id(1)),
            push_int(5),
            Instruction::new(OpCode::Add),
            Instruction::with_arg(OpCode::SetState, Arg::Id(1)),
            Instruction::new(OpCode::Halt),
        ];
        let mut vm = Vm::new();
        vm.set_state(1, Value::Int(10));
        for _ in 0..3 {
            assert!(vm.execute(&code));
        }
        assert_eq!(vm.state(1), Some(&Value::Int(25)));
    }

    #[test]
    fn stack_underflow_halts_with_error() {
        let code = vec![
            Instruction::new(OpCode::Add),
            Instruction::new(OpCode::Halt),
        ];
        let mut vm = Vm::new();
        assert!(!vm.execute(&code));
        assert!(vm.halted());
        assert!(!vm.error().unwrap_or("").is_empty());
    }

    #[test]
    fn division_by_zero_halts() {
        let code = vec![
            push_int(1),
            push_int(0),
            Instruction::new(OpCode::Div),
            Instruction::new(OpCode::Halt),
        ];
        let mut vm = Vm::new();
        assert!(!vm.execute(&code));
        assert_eq!(vm.error(), Some("division by zero"));
    }

    #[test]
    fn jump_if_false_skips_branch() {
        // if (2 > 3) push 111 else fall through; push 222
        let code = vec![
            push_int(2),
            push_int(3),
            Instruction::new(OpCode::Gt),
            Instruction::with_arg(OpCode::JumpIfFalse, Arg::Offset(1)),
            push_int(111),
            push_int(222),
            Instruction::new(OpCode::Halt),
        ];
        let mut vm = Vm::new();
        assert!(vm.execute(&code));
        assert_eq!(vm.stack_top(), Some(&Value::Int(222)));
        // 111 was never pushed
        assert_eq!(vm.stack_top(), Some(&Value::Int(222)));
    }

    #[test]
    fn backward_jump_counts_down() {
        // state 1 counts down from 3 to 0
        let code = vec![
            Instruction::with_arg(OpCode::GetState, Arg::Id(1)),
            push_int(0),
            Instruction::new(OpCode::Gt),
            Instruction::with_arg(OpCode::JumpIfFalse, Arg::Offset(5)),
            Instruction::with_arg(OpCode::GetState, Arg::Id(1)),
            push_int(1),
            Instruction::new(OpCode::Sub),
            Instruction::with_arg(OpCode::SetState, Arg::Id(1)),
            Instruction::with_arg(OpCode::Jump, Arg::Offset(-9)),
            Instruction::new(OpCode::Halt),
        ];
        let mut vm = Vm::new();
        vm.set_state(1, Value::Int(3));
        assert!(vm.execute(&code));
        assert_eq!(vm.state(1), Some(&Value::Int(0)));
    }

    #[test]
    fn host_call_with_result() {
        let code = vec![
            push_int(6),
            push_int(7),
            Instruction::with_arg(OpCode::CallHost, Arg::Id(1)),
            Instruction::new(OpCode::Halt),
        ];
        let mut vm = Vm::new();
        vm.register_host(1, 2, |args| {
            let a = args[0].as_int()?;
            let b = args[1].as_int()?;
            Some(Value::Int(a * b))
        });
        assert!(vm.execute(&code));
        assert_eq!(vm.stack_top(), Some(&Value::Int(42)));
    }

    #[test]
    fn missing_required_host_fails() {
        let mut meta = BytecodeMetadata::new();
        meta.host_functions.push(HostFnDecl {
            id: 9,
            name: "navigate".into(),
            signature: "(s)v".into(),
            required: true,
        });
        meta.states.push(StateDef {
            id: 1,
            name: "count".into(),
            initial: Value::Int(0),
        });
        let code = vec![
            Instruction::with_arg(OpCode::CallHost, Arg::Id(9)),
            Instruction::new(OpCode::Halt),
        ];
        let mut vm = Vm::new();
        vm.load_metadata(&meta);
        assert!(!vm.execute(&code));
        assert!(vm.error().unwrap().contains("navigate"));
        // Optional declarations are skipped instead.
        let mut vm2 = Vm::new();
        let mut meta2 = meta.clone();
        meta2.host_functions[0].required = false;
        vm2.load_metadata(&meta2);
        assert!(vm2.execute(&code));
    }

    #[test]
    fn type_mismatch_comparison_fails() {
        let code = vec![
            Instruction::with_arg(OpCode::PushString, Arg::Str("a".into())),
            push_int(1),
            Instruction::new(OpCode::Gt),
            Instruction::new(OpCode::Halt),
        ];
        let mut vm = Vm::new();
        assert!(!vm.execute(&code));
        assert!(vm.error().unwrap().contains("type mismatch"));
    }

    #[test]
    fn return_stops_execution() {
        let code = vec![
            push_int(1),
            Instruction::new(OpCode::Return),
            push_int(2),
        ];
        let mut vm = Vm::new();
        assert!(vm.execute(&code));
        assert_eq!(vm.stack_top(), Some(&Value::Int(1)));
    }
}
