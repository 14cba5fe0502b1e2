//! Tagged runtime values shared by the manifest, the VM, and the
//! expression evaluator.

use std::fmt;

use thiserror::Error;

/// Errors produced by value arithmetic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("type mismatch: {op} on {lhs} and {rhs}")]
    TypeMismatch {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,
}

/// A tagged runtime value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Truthiness for conditional evaluation: false, 0, 0.0, and the
    /// empty string are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(v) => *v,
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Str(v) => !v.is_empty(),
        }
    }

    fn numeric_pair(&self, other: &Value, op: &'static str) -> Result<(f64, f64, bool), ValueError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok((*a as f64, *b as f64, true)),
            (Value::Int(a), Value::Float(b)) => Ok((*a as f64, *b, false)),
            (Value::Float(a), Value::Int(b)) => Ok((*a, *b as f64, false)),
            (Value::Float(a), Value::Float(b)) => Ok((*a, *b, false)),
            _ => Err(ValueError::TypeMismatch {
                op,
                lhs: self.type_name(),
                rhs: other.type_name(),
            }),
        }
    }

    /// Addition with numeric promotion: int+int stays int, any float
    /// promotes to float.
    pub fn add(&self, other: &Value) -> Result<Value, ValueError> {
        let (a, b, both_int) = self.numeric_pair(other, "add")?;
        if both_int {
            Ok(Value::Int(a as i64 + b as i64))
        } else {
            Ok(Value::Float(a + b))
        }
    }

    pub fn sub(&self, other: &Value) -> Result<Value, ValueError> {
        let (a, b, both_int) = self.numeric_pair(other, "sub")?;
        if both_int {
            Ok(Value::Int(a as i64 - b as i64))
        } else {
            Ok(Value::Float(a - b))
        }
    }

    pub fn mul(&self, other: &Value) -> Result<Value, ValueError> {
        let (a, b, both_int) = self.numeric_pair(other, "mul")?;
        if both_int {
            Ok(Value::Int(a as i64 * b as i64))
        } else {
            Ok(Value::Float(a * b))
        }
    }

    pub fn div(&self, other: &Value) -> Result<Value, ValueError> {
        let (a, b, both_int) = self.numeric_pair(other, "div")?;
        if b == 0.0 {
            return Err(ValueError::DivisionByZero);
        }
        if both_int {
            Ok(Value::Int(a as i64 / b as i64))
        } else {
            Ok(Value::Float(a / b))
        }
    }

    /// Ordered comparison. Numbers compare numerically; strings
    /// lexicographically. Mixed non-numeric types mismatch.
    pub fn compare(&self, other: &Value, op: &'static str) -> Result<std::cmp::Ordering, ValueError> {
        use std::cmp::Ordering;
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            _ => {
                let (a, b, _) = self.numeric_pair(other, op)?;
                Ok(a.partial_cmp(&b).unwrap_or(Ordering::Equal))
            }
        }
    }

    /// Equality across tags: numeric values compare numerically, other
    /// mixed-type pairs are unequal.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_float() == other.as_float()
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => {
                // Integer-exact floats print without a fractional part.
                if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e15 {
                    write!(f, "{}", *v as i64)
                } else {
                    write!(f, "{v}")
                }
            }
            Value::Str(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}
