//! Bytecode metadata: function tables, state slots, and host-function
//! declarations carried alongside the IR.

use crate::value::Value;

/// VM opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpCode {
    PushInt,
    PushFloat,
    PushString,
    PushBool,
    GetState,
    SetState,
    Add,
    Sub,
    Mul,
    Div,
    Gt,
    Lt,
    Eq,
    Ne,
    Ge,
    Le,
    Jump,
    JumpIfFalse,
    CallHost,
    Return,
    Halt,
}

impl OpCode {
    /// Canonical mnemonic used in KIR logic blocks.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpCode::PushInt => "PUSH_INT",
            OpCode::PushFloat => "PUSH_FLOAT",
            OpCode::PushString => "PUSH_STRING",
            OpCode::PushBool => "PUSH_BOOL",
            OpCode::GetState => "GET_STATE",
            OpCode::SetState => "SET_STATE",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::Gt => "GT",
            OpCode::Lt => "LT",
            OpCode::Eq => "EQ",
            OpCode::Ne => "NE",
            OpCode::Ge => "GE",
            OpCode::Le => "LE",
            OpCode::Jump => "JUMP",
            OpCode::JumpIfFalse => "JUMP_IF_FALSE",
            OpCode::CallHost => "CALL_HOST",
            OpCode::Return => "RETURN",
            OpCode::Halt => "HALT",
        }
    }

    pub fn from_mnemonic(name: &str) -> Option<Self> {
        Some(match name {
            "PUSH_INT" => OpCode::PushInt,
            "PUSH_FLOAT" => OpCode::PushFloat,
            "PUSH_STRING" => OpCode::PushString,
            "PUSH_BOOL" => OpCode::PushBool,
            "GET_STATE" => OpCode::GetState,
            "SET_STATE" => OpCode::SetState,
            "ADD" => OpCode::Add,
            "SUB" => OpCode::Sub,
            "MUL" => OpCode::Mul,
            "DIV" => OpCode::Div,
            "GT" => OpCode::Gt,
            "LT" => OpCode::Lt,
            "EQ" => OpCode::Eq,
            "NE" => OpCode::Ne,
            "GE" => OpCode::Ge,
            "LE" => OpCode::Le,
            "JUMP" => OpCode::Jump,
            "JUMP_IF_FALSE" => OpCode::JumpIfFalse,
            "CALL_HOST" => OpCode::CallHost,
            "RETURN" => OpCode::Return,
            "HALT" => OpCode::Halt,
            _ => return None,
        })
    }
}

/// Tagged instruction argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    /// State or host-function id.
    Id(u32),
    /// Signed jump offset.
    Offset(i32),
}

/// One VM instruction.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub op: OpCode,
    pub arg: Option<Arg>,
}

impl Instruction {
    pub fn new(op: OpCode) -> Self {
        Self { op, arg: None }
    }

    pub fn with_arg(op: OpCode, arg: Arg) -> Self {
        Self { op, arg: Some(arg) }
    }
}

/// A compiled handler function.
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub id: u32,
    pub name: String,
    pub code: Vec<Instruction>,
}

/// A declared state slot with its initial value.
#[derive(Clone, Debug, PartialEq)]
pub struct StateDef {
    pub id: u32,
    pub name: String,
    pub initial: Value,
}

/// A declared external call.
#[derive(Clone, Debug, PartialEq)]
pub struct HostFnDecl {
    pub id: u32,
    pub name: String,
    pub signature: String,
    pub required: bool,
}

/// The bytecode sidecar serialized in the KIR logic block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BytecodeMetadata {
    pub functions: Vec<Function>,
    pub states: Vec<StateDef>,
    pub host_functions: Vec<HostFnDecl>,
}

impl BytecodeMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn get_function(&self, id: u32) -> Option<&Function> {
        self.functions.iter().find(|f| f.id == id)
    }

    pub fn host_decl(&self, id: u32) -> Option<&HostFnDecl> {
        self.host_functions.iter().find(|h| h.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonics_round_trip() {
        let ops = [
            OpCode::PushInt,
            OpCode::GetState,
            OpCode::JumpIfFalse,
            OpCode::CallHost,
            OpCode::Halt,
        ];
        for op in ops {
            assert_eq!(OpCode::from_mnemonic(op.mnemonic()), Some(op));
        }
        assert!(OpCode::from_mnemonic("NOP").is_none());
    }

    #[test]
    fn function_lookup() {
        let meta = BytecodeMetadata {
            functions: vec![Function {
                id: 1,
                name: "increment".into(),
                code: vec![Instruction::new(OpCode::Halt)],
            }],
            ..Default::default()
        };
        assert!(meta.find_function("increment").is_some());
        assert!(meta.get_function(1).is_some());
        assert!(meta.get_function(2).is_none());
    }
}
