use std::fmt;

use crate::{
    ast::{BinOp, UnaryOp},
    value::{Type, Value},
};

/// A literal constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    String(String),
    Int(i64),
    Float(f64),
}

impl Literal {
    pub fn type_of(&self) -> Type {
        match self {
            Literal::Bool(_) => Type::Bool,
            Literal::String(_) => Type::String,
            Literal::Int(_) => Type::Int,
            Literal::Float(_) => Type::Float,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Int(n) => Value::Int(*n),
            Literal::Float(n) => Value::Float(*n),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(n) => {
                // Float literals must keep their `.` to lex back as floats
                let text = n.to_string();
                if text.contains('.') {
                    f.write_str(&text)
                } else {
                    write!(f, "{}.0", text)
                }
            }
            Literal::String(s) if s.contains('\'') => write!(f, "\"{}\"", s),
            Literal::String(s) => write!(f, "'{}'", s),
        }
    }
}

/// Functions callable from expressions.
///
/// Both builtins take no arguments and return an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `length()` - number of elements of the list being filtered
    Length,
    /// `position()` - 0-based index of the element being tested
    Position,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Builtin> {
        match name {
            "length" => Some(Builtin::Length),
            "position" => Some(Builtin::Position),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Length => "length",
            Builtin::Position => "position",
        }
    }

    pub fn arity(self) -> usize {
        0
    }

    pub fn return_type(self) -> Type {
        Type::Int
    }
}

/// Abstract Syntax Tree node of a scalar expression.
///
/// Expressions appear between the brackets of a key step and are evaluated
/// against the value the step is applied to.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal constant
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.5
    /// 'B'
    /// true
    /// ```
    Literal(Literal),

    /// Field of the current record
    ///
    /// `*` matches any field and is only meaningful as a presence test.
    ///
    /// # Examples
    /// ```text
    /// @price
    /// price
    /// @*
    /// ```
    Property(String),

    /// Builtin function call
    ///
    /// # Examples
    /// ```text
    /// length()
    /// position()
    /// ```
    FunctionCall { function: Builtin, args: Vec<Expr> },

    /// Prefix operation
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Binary operation (arithmetic, comparison, logical)
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn property(name: impl Into<String>) -> Self {
        Expr::Property(name.into())
    }

    pub fn int(n: i64) -> Self {
        Expr::Literal(Literal::Int(n))
    }

    pub fn float(n: f64) -> Self {
        Expr::Literal(Literal::Float(n))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(s.into()))
    }

    pub fn bool(b: bool) -> Self {
        Expr::Literal(Literal::Bool(b))
    }

    pub fn call(function: Builtin) -> Self {
        Expr::FunctionCall {
            function,
            args: Vec::new(),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// True for a property, or properties joined by `&&`/`||`.
    ///
    /// Such an expression only asks which fields exist, so it can be answered
    /// from field presence alone without reading or defaulting values.
    pub fn is_pure_boolean_property_expression(&self) -> bool {
        match self {
            Expr::Property(_) => true,
            Expr::Binary { op, left, right } if op.is_logical() => {
                left.is_pure_boolean_property_expression()
                    && right.is_pure_boolean_property_expression()
            }
            _ => false,
        }
    }
}

/// Writes an operand, parenthesized when it is itself a binary operation.
fn fmt_operand(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
    match expr {
        Expr::Binary { .. } => write!(f, "({})", expr),
        _ => write!(f, "{}", expr),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::Property(name) => write!(f, "@{}", name),
            Expr::FunctionCall { function, args } => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expr::Unary { op, operand } => {
                write!(f, "{}", op)?;
                fmt_operand(f, operand)
            }
            Expr::Binary { op, left, right } => {
                fmt_operand(f, left)?;
                write!(f, " {} ", op)?;
                fmt_operand(f, right)
            }
        }
    }
}
