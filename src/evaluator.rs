use std::cmp::Ordering;

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use thiserror::Error;

use crate::{
    ast::{BinOp, Builtin, Expr, UnaryOp},
    record::{FieldDescriptor, FieldKind, Message},
    value::{Type, Value},
};

/// Evaluation context: the value an expression is evaluated against plus the
/// options that steer property lookups.
///
/// Contexts are small and `Copy`; the `with_*` methods return a derived
/// context and leave the original untouched.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// The current value (`@name` reads a field of it)
    pub this: &'a Value,
    /// Read an unset field as its declared default instead of failing
    pub use_default: bool,
    /// Evaluate properties as presence tests
    pub enforce_bool: bool,
    /// Position of `this` within the list being filtered
    pub index: Option<usize>,
}

impl<'a> EvalContext<'a> {
    pub fn new(this: &'a Value) -> Self {
        EvalContext {
            this,
            use_default: false,
            enforce_bool: false,
            index: None,
        }
    }

    pub fn with_use_default(&self, use_default: bool) -> Self {
        EvalContext {
            use_default,
            ..*self
        }
    }

    pub fn with_enforce_bool(&self, enforce_bool: bool) -> Self {
        EvalContext {
            enforce_bool,
            ..*self
        }
    }

    /// Context for one element of a filtered list.
    pub fn with_index(&self, this: &'a Value, index: usize) -> Self {
        EvalContext {
            this,
            index: Some(index),
            ..*self
        }
    }
}

/// Errors that can occur during expression evaluation.
///
/// These never escape a query run: the branch of the search that raised one is
/// dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("property '{name}' is not set")]
    PropertyNotSet { name: String },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("operator '{0}' cannot be applied here")]
    UnknownOperator(String),

    #[error("value cannot be used as a key of this map")]
    InvalidCastForMapKey,

    #[error("index out of range")]
    IndexOutOfRange,

    #[error("properties can only be read from a record")]
    NotARecord,

    #[error("function '{name}' is not available in this context")]
    InvalidFunctionContext { name: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,
}

fn mismatch(op: BinOp, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeMismatch(format!(
        "cannot apply '{}' to {} and {}",
        op,
        left.kind_name(),
        right.kind_name()
    ))
}

impl Expr {
    /// Evaluates the expression against `ctx.this`.
    pub fn eval(&self, ctx: &EvalContext) -> Result<Value, EvalError> {
        match self {
            Expr::Literal(lit) => Ok(lit.to_value()),
            Expr::Property(name) => eval_property(name, ctx),
            Expr::FunctionCall { function, .. } => eval_builtin(*function, ctx),
            Expr::Unary { op, operand } => {
                let value = operand.eval(ctx)?;
                apply_unary(*op, value)
            }
            Expr::Binary { op, left, right } => eval_binary(*op, left, right, ctx),
        }
    }

    /// Type the expression would evaluate to, worked out from field
    /// declarations without reading any field value.
    pub fn static_type(&self, ctx: &EvalContext) -> Result<Type, EvalError> {
        match self {
            Expr::Literal(lit) => Ok(lit.type_of()),
            Expr::Property(name) => property_type(name, ctx),
            Expr::FunctionCall { function, .. } => Ok(function.return_type()),
            Expr::Unary { op, operand } => {
                let operand_type = operand.static_type(ctx)?;
                match (op, operand_type) {
                    (UnaryOp::Not, Type::Bool) => Ok(Type::Bool),
                    (UnaryOp::Plus | UnaryOp::Minus, Type::Int) => Ok(Type::Int),
                    (op, t) => Err(EvalError::TypeMismatch(format!(
                        "cannot apply '{}' to {}",
                        op, t
                    ))),
                }
            }
            Expr::Binary { op, .. } if op.is_comparison() || op.is_logical() => Ok(Type::Bool),
            Expr::Binary { op, left, right } => {
                let l = left.static_type(ctx)?;
                let r = right.static_type(ctx)?;
                match l.promote(r) {
                    Some(Type::Bool) | None => Err(EvalError::TypeMismatch(format!(
                        "cannot apply '{}' to {} and {}",
                        op, l, r
                    ))),
                    Some(Type::String) if *op != BinOp::Add => Err(EvalError::TypeMismatch(
                        format!("cannot apply '{}' to strings", op),
                    )),
                    Some(t) => Ok(t),
                }
            }
        }
    }
}

/// Expression type of a singular scalar field.
fn field_type(fd: &FieldDescriptor) -> Result<Type, EvalError> {
    if !fd.is_scalar() {
        return Err(EvalError::TypeMismatch(format!(
            "field '{}' is not a scalar",
            fd.name()
        )));
    }
    let t = match fd.kind() {
        FieldKind::Bool => Type::Bool,
        FieldKind::String | FieldKind::Bytes | FieldKind::Enum(_) => Type::String,
        FieldKind::Int | FieldKind::Uint => Type::Int,
        FieldKind::Float => Type::Float,
        FieldKind::Message(_) => {
            return Err(EvalError::TypeMismatch(format!(
                "field '{}' is a message",
                fd.name()
            )));
        }
    };
    Ok(t)
}

fn property_type(name: &str, ctx: &EvalContext) -> Result<Type, EvalError> {
    let record = match ctx.this {
        Value::Message(m) => m,
        // A filter over a list is typed by its first record
        Value::List(list) => list
            .iter()
            .find_map(Value::as_message)
            .ok_or(EvalError::NotARecord)?,
        _ => return Err(EvalError::NotARecord),
    };

    if name == "*" || ctx.enforce_bool {
        if name != "*" && record.descriptor().field(name).is_none() {
            return Err(EvalError::PropertyNotSet {
                name: name.to_string(),
            });
        }
        return Ok(Type::Bool);
    }

    let fd = record
        .descriptor()
        .field(name)
        .ok_or_else(|| EvalError::PropertyNotSet {
            name: name.to_string(),
        })?;
    field_type(fd)
}

fn eval_property(name: &str, ctx: &EvalContext) -> Result<Value, EvalError> {
    let record = ctx.this.as_message().ok_or(EvalError::NotARecord)?;

    if name == "*" {
        return Ok(Value::Bool(record.has_any()));
    }

    let fd = record
        .descriptor()
        .field(name)
        .ok_or_else(|| EvalError::PropertyNotSet {
            name: name.to_string(),
        })?;

    if ctx.enforce_bool {
        return Ok(Value::Bool(record.has(fd)));
    }

    field_type(fd)?;
    if !record.has(fd) && !ctx.use_default {
        return Err(EvalError::PropertyNotSet {
            name: name.to_string(),
        });
    }
    read_scalar(record, fd)
}

/// Reads a scalar field in expression form: enums by name, bytes as text.
fn read_scalar(record: &Message, fd: &FieldDescriptor) -> Result<Value, EvalError> {
    let value = record.get(fd).ok_or_else(|| EvalError::PropertyNotSet {
        name: fd.name().to_string(),
    })?;

    if let (FieldKind::Enum(e), Value::Int(ordinal)) = (fd.kind(), &value) {
        return Ok(match e.name_of(*ordinal) {
            Some(symbol) => Value::String(symbol.to_string()),
            None => Value::Int(*ordinal),
        });
    }

    value.to_scalar().ok_or_else(|| {
        EvalError::TypeMismatch(format!(
            "field '{}' holds {} which has no scalar form",
            fd.name(),
            value.kind_name()
        ))
    })
}

fn eval_builtin(function: Builtin, ctx: &EvalContext) -> Result<Value, EvalError> {
    let invalid = || EvalError::InvalidFunctionContext {
        name: function.name().to_string(),
    };

    match function {
        Builtin::Length => {
            let len = match ctx.this {
                Value::List(list) => list.len(),
                Value::Map(map) => map.len(),
                Value::Bytes(bytes) => bytes.len(),
                _ => return Err(invalid()),
            };
            i64::try_from(len)
                .map(Value::Int)
                .map_err(|_| EvalError::Overflow)
        }
        Builtin::Position => {
            let index = ctx.index.ok_or_else(invalid)?;
            i64::try_from(index)
                .map(Value::Int)
                .map_err(|_| EvalError::Overflow)
        }
    }
}

fn apply_unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Plus, Value::Int(n)) => Ok(Value::Int(n)),
        (UnaryOp::Minus, Value::Int(n)) => n.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
        (op, value) => Err(EvalError::TypeMismatch(format!(
            "cannot apply '{}' to {}",
            op,
            value.kind_name()
        ))),
    }
}

fn eval_binary(op: BinOp, left: &Expr, right: &Expr, ctx: &EvalContext) -> Result<Value, EvalError> {
    if op.is_logical() {
        let as_bool = |value: Value| match value {
            Value::Bool(b) => Ok(b),
            other => Err(EvalError::TypeMismatch(format!(
                "'{}' needs bool operands, got {}",
                op,
                other.kind_name()
            ))),
        };
        let l = as_bool(left.eval(ctx)?)?;
        // Short-circuit: the right operand is only evaluated when it matters
        return match (op, l) {
            (BinOp::And, false) => Ok(Value::Bool(false)),
            (BinOp::Or, true) => Ok(Value::Bool(true)),
            _ => Ok(Value::Bool(as_bool(right.eval(ctx)?)?)),
        };
    }

    if op.is_equality() {
        let ctx = ctx.with_use_default(true);
        let l = left.eval(&ctx)?;
        let r = right.eval(&ctx)?;
        return compare(op, &l, &r).map(Value::Bool);
    }

    let l = left.eval(ctx)?;
    let r = right.eval(ctx)?;
    if op.is_comparison() {
        compare(op, &l, &r).map(Value::Bool)
    } else {
        arithmetic(op, &l, &r)
    }
}

fn compare(op: BinOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) if op.is_equality() => Some(a.cmp(b)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            match (left.as_float(), right.as_float()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => return Err(mismatch(op, left, right)),
            }
        }
        _ => return Err(mismatch(op, left, right)),
    };

    let result = match op {
        BinOp::Equal => ordering == Some(Ordering::Equal),
        BinOp::NotEqual => ordering != Some(Ordering::Equal),
        BinOp::LessThan => ordering == Some(Ordering::Less),
        BinOp::GreaterThan => ordering == Some(Ordering::Greater),
        BinOp::LessEqual => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        BinOp::GreaterEqual => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        _ => return Err(EvalError::UnknownOperator(op.to_string())),
    };
    Ok(result)
}

fn arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::String(a), Value::String(b)) if op == BinOp::Add => {
            Ok(Value::String(format!("{}{}", a, b)))
        }
        (Value::Int(a), Value::Int(b)) => {
            let result = match op {
                BinOp::Add => a.checked_add(*b),
                BinOp::Subtract => a.checked_sub(*b),
                BinOp::Multiply => a.checked_mul(*b),
                BinOp::Divide => {
                    if *b == 0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    a.checked_div(*b)
                }
                _ => return Err(EvalError::UnknownOperator(op.to_string())),
            };
            result.map(Value::Int).ok_or(EvalError::Overflow)
        }
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            match (left.as_float(), right.as_float()) {
                (Some(a), Some(b)) => float_arithmetic(op, a, b),
                _ => Err(mismatch(op, left, right)),
            }
        }
        _ => Err(mismatch(op, left, right)),
    }
}

/// Float arithmetic in `f64`. When both operands survive a round trip
/// through `Decimal` unchanged, the decimal result is used instead as long as
/// it stays within a few ulps of the binary one, so `0.1 + 0.2 = 0.3` holds.
fn float_arithmetic(op: BinOp, a: f64, b: f64) -> Result<Value, EvalError> {
    let binary = match op {
        BinOp::Add => a + b,
        BinOp::Subtract => a - b,
        BinOp::Multiply => a * b,
        BinOp::Divide if b == 0.0 => return Err(EvalError::DivisionByZero),
        BinOp::Divide => a / b,
        _ => return Err(EvalError::UnknownOperator(op.to_string())),
    };

    Ok(Value::Float(
        decimal_arithmetic(op, a, b)
            .filter(|d| (d - binary).abs() <= 4.0 * f64::EPSILON * binary.abs())
            .unwrap_or(binary),
    ))
}

/// Decimal form of `a op b`, or `None` when an operand or the result does not
/// fit a `Decimal` exactly.
fn decimal_arithmetic(op: BinOp, a: f64, b: f64) -> Option<f64> {
    let exact = |x: f64| Decimal::from_f64(x).filter(|d| d.to_f64() == Some(x));
    let (ad, bd) = (exact(a)?, exact(b)?);
    let result = match op {
        BinOp::Add => ad.checked_add(bd),
        BinOp::Subtract => ad.checked_sub(bd),
        BinOp::Multiply => ad.checked_mul(bd),
        BinOp::Divide => ad.checked_div(bd),
        _ => None,
    }?;
    result.to_f64()
}
