use std::fmt;

use crate::record::{List, Map, Message, ValueId};

/// Scalar type of an expression.
///
/// Expressions only ever produce one of these four kinds; record-shaped values
/// are visible to the traversal engine but never to the expression language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    String,
    Int,
    Float,
}

impl Type {
    /// The type both operands are brought to before a binary operator runs.
    pub fn promote(self, other: Type) -> Option<Type> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (Type::Int, Type::Float) | (Type::Float, Type::Int) => Some(Type::Float),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Bool => "bool",
            Type::String => "string",
            Type::Int => "int",
            Type::Float => "float",
        };
        f.write_str(name)
    }
}

/// A dynamic value read out of a record tree or produced by an expression.
///
/// # Examples
///
/// ```
/// use protoquery::Value;
///
/// let title = Value::from("Dune");
/// assert_eq!(title.as_str(), Some("Dune"));
/// assert_eq!(Value::from(42i64).scalar_type(), Some(protoquery::Type::Int));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),

    /// Signed integer (all signed protobuf widths and enum ordinals)
    Int(i64),

    /// Unsigned integer (unsigned protobuf widths and single bytes)
    Uint(u64),

    Float(f64),

    String(String),

    Bytes(Vec<u8>),

    Message(Message),

    List(List),

    Map(Map),
}

impl Value {
    /// The expression type of a scalar value, `None` for anything record-shaped.
    ///
    /// Unsigned values are reported as `Int`; [`Value::to_scalar`] performs the
    /// matching conversion.
    pub fn scalar_type(&self) -> Option<Type> {
        match self {
            Value::Bool(_) => Some(Type::Bool),
            Value::Int(_) | Value::Uint(_) => Some(Type::Int),
            Value::Float(_) => Some(Type::Float),
            Value::String(_) | Value::Bytes(_) => Some(Type::String),
            Value::Message(_) | Value::List(_) | Value::Map(_) => None,
        }
    }

    /// Normalizes a value into the four expression kinds.
    ///
    /// Unsigned integers that do not fit in `i64` and record-shaped values have
    /// no scalar form.
    pub fn to_scalar(&self) -> Option<Value> {
        match self {
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_) => {
                Some(self.clone())
            }
            Value::Uint(n) => i64::try_from(*n).ok().map(Value::Int),
            Value::Bytes(b) => Some(Value::String(String::from_utf8_lossy(b).into_owned())),
            Value::Message(_) | Value::List(_) | Value::Map(_) => None,
        }
    }

    /// Stable identity of record-shaped values; primitives have none.
    pub fn identity(&self) -> Option<ValueId> {
        match self {
            Value::Message(m) => Some(m.id()),
            Value::List(l) => Some(l.id()),
            Value::Map(m) => Some(m.id()),
            _ => None,
        }
    }

    /// Whether the traversal engine can descend into this value.
    pub fn is_recursable(&self) -> bool {
        matches!(self, Value::Message(_) | Value::List(_) | Value::Map(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Uint(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Get as float, promoting integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Uint(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Human-readable kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Message(_) => "message",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Uint(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Message> for Value {
    fn from(m: Message) -> Self {
        Value::Message(m)
    }
}

impl From<List> for Value {
    fn from(l: List) -> Self {
        Value::List(l)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}
