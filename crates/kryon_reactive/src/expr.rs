//! The binding/condition expression grammar and evaluator.
//!
//! Expressions appear in conditionals (`count > 0 && enabled`), bindings,
//! and EVAL_EXPRESSION updates. The grammar covers literals, dotted
//! variable paths, unary `!`/`-`, the usual binary operators, and
//! parentheses. Evaluation resolves variables through a caller-supplied
//! resolver and follows the VM's promotion rules.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, multispace0},
    combinator::{map, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};
use thiserror::Error;

use crate::value::{Value, ValueError};

/// Errors from parsing or evaluating an expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("parse error in expression: {0}")]
    Parse(String),

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Variable lookup used during evaluation.
pub trait VarResolver {
    fn resolve(&self, name: &str) -> Option<Value>;
}

impl VarResolver for crate::manifest::ReactiveManifest {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.find_var(name).map(|v| v.value.clone())
    }
}

/// Binary operators, loosest first in the grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// Parsed expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Dotted variable path, stored joined (`item.field`).
    Var(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Parse an expression, requiring the whole input to be consumed.
    pub fn parse(input: &str) -> Result<Self, ExprError> {
        match or_expr(input) {
            Ok((rest, expr)) if rest.trim().is_empty() => Ok(expr),
            Ok((rest, _)) => Err(ExprError::Parse(format!("trailing input: '{rest}'"))),
            Err(e) => Err(ExprError::Parse(e.to_string())),
        }
    }

    /// Evaluate against a variable resolver.
    pub fn eval(&self, vars: &dyn VarResolver) -> Result<Value, ExprError> {
        match self {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Var(name) => vars
                .resolve(name)
                .ok_or_else(|| ExprError::UnknownVariable(name.clone())),
            Expr::Unary(op, inner) => {
                let v = inner.eval(vars)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
                    UnaryOp::Neg => match v {
                        Value::Int(i) => Ok(Value::Int(-i)),
                        Value::Float(f) => Ok(Value::Float(-f)),
                        other => Err(ValueError::TypeMismatch {
                            op: "neg",
                            lhs: other.type_name(),
                            rhs: "-",
                        }
                        .into()),
                    },
                }
            }
            Expr::Binary(op, lhs, rhs) => {
                // Logical operators short-circuit.
                match op {
                    BinOp::And => {
                        let l = lhs.eval(vars)?;
                        if !l.is_truthy() {
                            return Ok(Value::Bool(false));
                        }
                        return Ok(Value::Bool(rhs.eval(vars)?.is_truthy()));
                    }
                    BinOp::Or => {
                        let l = lhs.eval(vars)?;
                        if l.is_truthy() {
                            return Ok(Value::Bool(true));
                        }
                        return Ok(Value::Bool(rhs.eval(vars)?.is_truthy()));
                    }
                    _ => {}
                }
                let l = lhs.eval(vars)?;
                let r = rhs.eval(vars)?;
                use std::cmp::Ordering;
                Ok(match op {
                    BinOp::Add => l.add(&r)?,
                    BinOp::Sub => l.sub(&r)?,
                    BinOp::Mul => l.mul(&r)?,
                    BinOp::Div => l.div(&r)?,
                    BinOp::Eq => Value::Bool(l.loose_eq(&r)),
                    BinOp::Ne => Value::Bool(!l.loose_eq(&r)),
                    BinOp::Lt => Value::Bool(l.compare(&r, "<")? == Ordering::Less),
                    BinOp::Gt => Value::Bool(l.compare(&r, ">")? == Ordering::Greater),
                    BinOp::Le => Value::Bool(l.compare(&r, "<=")? != Ordering::Greater),
                    BinOp::Ge => Value::Bool(l.compare(&r, ">=")? != Ordering::Less),
                    BinOp::And | BinOp::Or => unreachable!(),
                })
            }
        }
    }

    /// Names of all variables the expression reads.
    pub fn variable_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars(&self, out: &mut Vec<String>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Var(name) => {
                if !out.iter().any(|n| n == name) {
                    out.push(name.clone());
                }
            }
            Expr::Unary(_, inner) => inner.collect_vars(out),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_vars(out);
                rhs.collect_vars(out);
            }
        }
    }
}

/// Parse and evaluate in one step.
pub fn evaluate(input: &str, vars: &dyn VarResolver) -> Result<Value, ExprError> {
    Expr::parse(input)?.eval(vars)
}

// ---------------------------------------------------------------------
// Grammar
// ---------------------------------------------------------------------

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn fold_binary(first: Expr, rest: Vec<(BinOp, Expr)>) -> Expr {
    rest.into_iter().fold(first, |acc, (op, rhs)| {
        Expr::Binary(op, Box::new(acc), Box::new(rhs))
    })
}

fn or_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(pair(
        map(ws(tag("||")), |_| BinOp::Or),
        and_expr,
    ))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn and_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = equality(input)?;
    let (input, rest) = many0(pair(
        map(ws(tag("&&")), |_| BinOp::And),
        equality,
    ))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn equality(input: &str) -> IResult<&str, Expr> {
    let (input, first) = relational(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            map(tag("=="), |_| BinOp::Eq),
            map(tag("!="), |_| BinOp::Ne),
        ))),
        relational,
    ))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn relational(input: &str) -> IResult<&str, Expr> {
    let (input, first) = additive(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            map(tag("<="), |_| BinOp::Le),
            map(tag(">="), |_| BinOp::Ge),
            map(tag("<"), |_| BinOp::Lt),
            map(tag(">"), |_| BinOp::Gt),
        ))),
        additive,
    ))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn additive(input: &str) -> IResult<&str, Expr> {
    let (input, first) = term(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            map(tag("+"), |_| BinOp::Add),
            map(tag("-"), |_| BinOp::Sub),
        ))),
        term,
    ))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn term(input: &str) -> IResult<&str, Expr> {
    let (input, first) = unary(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            map(tag("*"), |_| BinOp::Mul),
            map(tag("/"), |_| BinOp::Div),
        ))),
        unary,
    ))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn unary(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(ws(char('!')), unary), |e| {
            Expr::Unary(UnaryOp::Not, Box::new(e))
        }),
        map(preceded(ws(char('-')), unary), |e| {
            Expr::Unary(UnaryOp::Neg, Box::new(e))
        }),
        primary,
    ))(input)
}

fn primary(input: &str) -> IResult<&str, Expr> {
    ws(alt((
        parens,
        number,
        string_literal,
        ident_path,
    )))(input)
}

fn parens(input: &str) -> IResult<&str, Expr> {
    delimited(ws(char('(')), or_expr, ws(char(')')))(input)
}

fn number(input: &str) -> IResult<&str, Expr> {
    let (rest, text) = recognize(tuple((digit1, opt(preceded(char('.'), digit1)))))(input)?;
    let expr = if text.contains('.') {
        match text.parse::<f64>() {
            Ok(v) => Expr::Literal(Value::Float(v)),
            Err(_) => return Err(nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Float,
            ))),
        }
    } else {
        match text.parse::<i64>() {
            Ok(v) => Expr::Literal(Value::Int(v)),
            Err(_) => return Err(nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Digit,
            ))),
        }
    };
    Ok((rest, expr))
}

fn string_literal(input: &str) -> IResult<&str, Expr> {
    let double = delimited(char('"'), take_while(|c| c != '"'), char('"'));
    let single = delimited(char('\''), take_while(|c| c != '\''), char('\''));
    map(alt((double, single)), |s: &str| {
        Expr::Literal(Value::Str(s.to_string()))
    })(input)
}

fn ident(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1_alpha,
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

fn take_while1_alpha(input: &str) -> IResult<&str, &str> {
    match input.chars().next() {
        Some(c) if c.is_alphabetic() || c == '_' => {
            let len = c.len_utf8();
            Ok((&input[len..], &input[..len]))
        }
        _ => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Alpha,
        ))),
    }
}

fn ident_path(input: &str) -> IResult<&str, Expr> {
    let (rest, path) = recognize(pair(ident, many0(preceded(char('.'), ident))))(input)?;
    let expr = match path {
        "true" => Expr::Literal(Value::Bool(true)),
        "false" => Expr::Literal(Value::Bool(false)),
        name => Expr::Var(name.to_string()),
    };
    Ok((rest, expr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ReactiveManifest, VarType};

    fn manifest() -> ReactiveManifest {
        let mut m = ReactiveManifest::new();
        m.add_var("count", VarType::Int, Value::Int(5));
        m.add_var("ratio", VarType::Float, Value::Float(0.5));
        m.add_var("name", VarType::Str, Value::Str("kryon".into()));
        m.add_var("enabled", VarType::Bool, Value::Bool(true));
        m
    }

    #[test]
    fn literal_arithmetic_with_precedence() {
        let m = manifest();
        assert_eq!(evaluate("1 + 2 * 3", &m).unwrap(), Value::Int(7));
        assert_eq!(evaluate("(1 + 2) * 3", &m).unwrap(), Value::Int(9));
    }

    #[test]
    fn variable_lookup_and_promotion() {
        let m = manifest();
        assert_eq!(evaluate("count + 1", &m).unwrap(), Value::Int(6));
        assert_eq!(evaluate("count + ratio", &m).unwrap(), Value::Float(5.5));
    }

    #[test]
    fn comparisons_and_logic() {
        let m = manifest();
        assert_eq!(evaluate("count > 3 && enabled", &m).unwrap(), Value::Bool(true));
        assert_eq!(evaluate("count < 3 || !enabled", &m).unwrap(), Value::Bool(false));
        assert_eq!(evaluate("name == \"kryon\"", &m).unwrap(), Value::Bool(true));
        assert_eq!(evaluate("count >= 5", &m).unwrap(), Value::Bool(true));
        assert_eq!(evaluate("count != 5", &m).unwrap(), Value::Bool(false));
    }

    #[test]
    fn unary_operators() {
        let m = manifest();
        assert_eq!(evaluate("-count", &m).unwrap(), Value::Int(-5));
        assert_eq!(evaluate("!enabled", &m).unwrap(), Value::Bool(false));
    }

    #[test]
    fn short_circuit_avoids_unknown_variable() {
        let m = manifest();
        // rhs would fail if evaluated
        assert_eq!(
            evaluate("enabled || missing_var", &m).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            evaluate("!enabled && missing_var", &m).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn unknown_variable_reported() {
        let m = manifest();
        let err = evaluate("missing + 1", &m).unwrap_err();
        assert_eq!(err, ExprError::UnknownVariable("missing".into()));
    }

    #[test]
    fn trailing_garbage_rejected() {
        assert!(matches!(Expr::parse("1 + "), Err(ExprError::Parse(_))));
        assert!(matches!(Expr::parse("1 1"), Err(ExprError::Parse(_))));
    }

    #[test]
    fn dotted_paths_and_dependencies() {
        let e = Expr::parse("item.price * qty + item.tax").unwrap();
        assert_eq!(
            e.variable_names(),
            vec!["item.price".to_string(), "qty".to_string(), "item.tax".to_string()]
        );
    }

    #[test]
    fn string_literals_single_and_double() {
        let m = manifest();
        assert_eq!(
            evaluate("'a' == \"a\"", &m).unwrap(),
            Value::Bool(true)
        );
    }
}
