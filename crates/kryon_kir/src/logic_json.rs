//! JSON encoding of the bytecode logic block and tagged runtime values.

use serde_json::{json, Map, Value as Json};

use kryon_reactive::{
    Arg, BytecodeMetadata, Function, HostFnDecl, Instruction, OpCode, StateDef, Value, VarType,
};

use crate::error::{KirError, Result};

/// Encode a tagged runtime value with its type name.
pub fn value_to_json(value: &Value) -> Result<Json> {
    Ok(match value {
        Value::Int(v) => json!({ "type": "int", "value": v }),
        Value::Float(v) => {
            if !v.is_finite() {
                return Err(KirError::NonFinite("value"));
            }
            json!({ "type": "float", "value": v })
        }
        Value::Str(v) => json!({ "type": "string", "value": v }),
        Value::Bool(v) => json!({ "type": "bool", "value": v }),
    })
}

pub fn value_from_json(value: &Json) -> Result<Value> {
    let ty = value
        .get("type")
        .and_then(Json::as_str)
        .ok_or(KirError::MissingField("value.type"))?;
    let raw = value.get("value").ok_or(KirError::MissingField("value.value"))?;
    Ok(match ty {
        "int" => Value::Int(raw.as_i64().ok_or(KirError::InvalidField {
            field: "value",
            reason: "expected int".into(),
        })?),
        "float" => Value::Float(raw.as_f64().ok_or(KirError::InvalidField {
            field: "value",
            reason: "expected float".into(),
        })?),
        "string" => Value::Str(
            raw.as_str()
                .ok_or(KirError::InvalidField {
                    field: "value",
                    reason: "expected string".into(),
                })?
                .to_string(),
        ),
        "bool" => Value::Bool(raw.as_bool().ok_or(KirError::InvalidField {
            field: "value",
            reason: "expected bool".into(),
        })?),
        other => {
            return Err(KirError::InvalidField {
                field: "value.type",
                reason: format!("unknown type '{other}'"),
            })
        }
    })
}

/// The manifest's tagged value form: the declared variable type plus a
/// bare JSON scalar.
pub fn var_value_to_json(value: &Value) -> Result<Json> {
    Ok(match value {
        Value::Int(v) => json!(v),
        Value::Float(v) => {
            if !v.is_finite() {
                return Err(KirError::NonFinite("variable value"));
            }
            json!(v)
        }
        Value::Str(v) => json!(v),
        Value::Bool(v) => json!(v),
    })
}

pub fn var_value_from_json(ty: VarType, raw: &Json) -> Value {
    match ty {
        VarType::Int => Value::Int(raw.as_i64().unwrap_or(0)),
        VarType::Float => Value::Float(raw.as_f64().unwrap_or(0.0)),
        VarType::Bool => Value::Bool(raw.as_bool().unwrap_or(false)),
        VarType::Str | VarType::Custom => {
            Value::Str(raw.as_str().unwrap_or_default().to_string())
        }
    }
}

fn instruction_to_json(instr: &Instruction) -> Result<Json> {
    let mut map = Map::new();
    map.insert("op".into(), json!(instr.op.mnemonic()));
    if let Some(arg) = &instr.arg {
        let encoded = match arg {
            Arg::Int(v) => json!(v),
            Arg::Float(v) => {
                if !v.is_finite() {
                    return Err(KirError::NonFinite("instruction arg"));
                }
                json!(v)
            }
            Arg::Str(v) => json!(v),
            Arg::Bool(v) => json!(v),
            Arg::Id(v) => json!(v),
            Arg::Offset(v) => json!(v),
        };
        map.insert("arg".into(), encoded);
    }
    Ok(Json::Object(map))
}

fn instruction_from_json(value: &Json) -> Result<Option<Instruction>> {
    let mnemonic = value
        .get("op")
        .and_then(Json::as_str)
        .ok_or(KirError::MissingField("instruction.op"))?;
    let Some(op) = OpCode::from_mnemonic(mnemonic) else {
        // Unknown opcodes are a recoverable decode failure; the function
        // is kept with the instruction dropped and the VM will surface
        // the gap when run.
        tracing::warn!(op = mnemonic, "unknown opcode skipped during deserialization");
        return Ok(None);
    };
    let raw = value.get("arg");
    let arg = match op {
        OpCode::PushInt => Some(Arg::Int(
            raw.and_then(Json::as_i64)
                .ok_or(KirError::MissingField("instruction.arg"))?,
        )),
        OpCode::PushFloat => Some(Arg::Float(
            raw.and_then(Json::as_f64)
                .ok_or(KirError::MissingField("instruction.arg"))?,
        )),
        OpCode::PushString => Some(Arg::Str(
            raw.and_then(Json::as_str)
                .ok_or(KirError::MissingField("instruction.arg"))?
                .to_string(),
        )),
        OpCode::PushBool => Some(Arg::Bool(
            raw.and_then(Json::as_bool)
                .ok_or(KirError::MissingField("instruction.arg"))?,
        )),
        OpCode::GetState | OpCode::SetState | OpCode::CallHost => Some(Arg::Id(
            raw.and_then(Json::as_u64)
                .ok_or(KirError::MissingField("instruction.arg"))? as u32,
        )),
        OpCode::Jump | OpCode::JumpIfFalse => Some(Arg::Offset(
            raw.and_then(Json::as_i64)
                .ok_or(KirError::MissingField("instruction.arg"))? as i32,
        )),
        _ => None,
    };
    Ok(Some(Instruction { op, arg }))
}

pub fn logic_to_json(meta: &BytecodeMetadata) -> Result<Json> {
    let functions: Vec<Json> = meta
        .functions
        .iter()
        .map(|f| {
            let instructions: Vec<Json> = f
                .code
                .iter()
                .map(instruction_to_json)
                .collect::<Result<_>>()?;
            Ok(json!({
                "id": f.id,
                "name": f.name,
                "instructions": instructions,
            }))
        })
        .collect::<Result<_>>()?;

    let states: Vec<Json> = meta
        .states
        .iter()
        .map(|s| {
            Ok(json!({
                "id": s.id,
                "name": s.name,
                "initial": value_to_json(&s.initial)?,
            }))
        })
        .collect::<Result<_>>()?;

    let host_functions: Vec<Json> = meta
        .host_functions
        .iter()
        .map(|h| {
            json!({
                "id": h.id,
                "name": h.name,
                "signature": h.signature,
                "required": h.required,
            })
        })
        .collect();

    Ok(json!({
        "functions": functions,
        "states": states,
        "host_functions": host_functions,
    }))
}

pub fn logic_from_json(value: &Json) -> Result<BytecodeMetadata> {
    let mut meta = BytecodeMetadata::new();

    for f in value
        .get("functions")
        .and_then(Json::as_array)
        .into_iter()
        .flatten()
    {
        let id = f.get("id").and_then(Json::as_u64).unwrap_or(0) as u32;
        let name = f
            .get("name")
            .and_then(Json::as_str)
            .unwrap_or_default()
            .to_string();
        let mut code = Vec::new();
        for instr in f
            .get("instructions")
            .and_then(Json::as_array)
            .into_iter()
            .flatten()
        {
            if let Some(decoded) = instruction_from_json(instr)? {
                code.push(decoded);
            }
        }
        meta.functions.push(Function { id, name, code });
    }

    for s in value
        .get("states")
        .and_then(Json::as_array)
        .into_iter()
        .flatten()
    {
        let initial = s
            .get("initial")
            .map(value_from_json)
            .transpose()?
            .unwrap_or(Value::Int(0));
        meta.states.push(StateDef {
            id: s.get("id").and_then(Json::as_u64).unwrap_or(0) as u32,
            name: s
                .get("name")
                .and_then(Json::as_str)
                .unwrap_or_default()
                .to_string(),
            initial,
        });
    }

    for h in value
        .get("host_functions")
        .and_then(Json::as_array)
        .into_iter()
        .flatten()
    {
        meta.host_functions.push(HostFnDecl {
            id: h.get("id").and_then(Json::as_u64).unwrap_or(0) as u32,
            name: h
                .get("name")
                .and_then(Json::as_str)
                .unwrap_or_default()
                .to_string(),
            signature: h
                .get("signature")
                .and_then(Json::as_str)
                .unwrap_or_default()
                .to_string(),
            required: h.get("required").and_then(Json::as_bool).unwrap_or(false),
        });
    }

    Ok(meta)
}
