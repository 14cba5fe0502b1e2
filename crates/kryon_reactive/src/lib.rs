//! Kryon reactive core
//!
//! The runtime state side of the IR:
//!
//! - **Reactive manifest**: variables, bindings, conditionals, for-loops,
//!   component definitions, and the source archive
//! - **Bytecode + VM**: compiled handler functions and the stack
//!   interpreter that runs them
//! - **Expression evaluator**: the small grammar used by conditionals and
//!   EVAL_EXPRESSION updates
//! - **State manager**: the FIFO update queue with batched flushing
//!
//! # Example
//!
//! ```rust
//! use kryon_reactive::{ReactiveManifest, Value, VarType};
//!
//! let mut manifest = ReactiveManifest::new();
//! let counter = manifest.add_var("counter", VarType::Int, Value::Int(0));
//! manifest.update_var(counter, Value::Int(1));
//! assert_eq!(manifest.get_var(counter).unwrap().version, 1);
//! ```

pub mod bytecode;
pub mod expr;
pub mod manifest;
pub mod state_manager;
pub mod value;
pub mod vm;

pub use bytecode::{Arg, BytecodeMetadata, Function, HostFnDecl, Instruction, OpCode, StateDef};
pub use expr::{evaluate, BinOp, Expr, ExprError, UnaryOp, VarResolver};
pub use manifest::{
    Binding, BindingType, ComponentDef, Conditional, ForLoop, PropDef, ReactiveManifest,
    ReactiveVariable, StateVarDef, VarType,
};
pub use state_manager::{
    FlushHost, FlushResult, ProfileStats, StateManager, StateUpdate, DEFAULT_FLUSH_TIMEOUT_MS,
};
pub use value::{Value, ValueError};
pub use vm::Vm;
