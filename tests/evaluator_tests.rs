// tests/evaluator_tests.rs

use std::sync::Arc;

use protoquery::ast::{Expr, Precedence};
use protoquery::evaluator::{EvalContext, EvalError};
use protoquery::lexer::Lexer;
use protoquery::parser::Parser;
use protoquery::record::{EnumDescriptor, FieldKind, List, Message, MessageDescriptor};
use protoquery::{Type, Value};

fn expr(input: &str) -> Expr {
    Parser::new(Lexer::new(input))
        .unwrap()
        .parse_expression(Precedence::Lowest)
        .unwrap()
}

fn item_descriptor() -> Arc<MessageDescriptor> {
    let color = EnumDescriptor::new("Color", [("RED", 0), ("GREEN", 1)]);
    MessageDescriptor::builder("Item")
        .field("a", FieldKind::Int)
        .field("b", FieldKind::Float)
        .field("name", FieldKind::String)
        .field("flag", FieldKind::Bool)
        .field("color", FieldKind::Enum(color))
        .field("data", FieldKind::Bytes)
        .field("count", FieldKind::Uint)
        .field("unset", FieldKind::Int)
        .repeated("tags", FieldKind::String)
        .field("child", FieldKind::Message("Item".into()))
        .build()
        .unwrap()
}

fn item() -> Value {
    let desc = item_descriptor();
    let message = Message::builder(&desc)
        .set("a", 1i64)
        .set("b", 1.5)
        .set("name", "widget")
        .set("flag", true)
        .set("color", "GREEN")
        .set("data", vec![104u8, 105])
        .set("count", 7u64)
        .set("tags", List::new(vec!["x".into(), "y".into()]))
        .build()
        .unwrap();
    Value::Message(message)
}

fn eval(input: &str, this: &Value) -> Result<Value, EvalError> {
    expr(input).eval(&EvalContext::new(this))
}

// ============================================================================
// Literals and Operators
// ============================================================================

#[test]
fn test_literal_arithmetic() {
    let this = item();
    assert_eq!(eval("1 + 2 * 3", &this), Ok(Value::Int(7)));
    assert_eq!(eval("7 / 2", &this), Ok(Value::Int(3)));
    assert_eq!(eval("7.0 / 2", &this), Ok(Value::Float(3.5)));
    assert_eq!(eval("0.1 + 0.2", &this), Ok(Value::Float(0.3)));
    assert_eq!(eval("'ab' + 'c'", &this), Ok(Value::from("abc")));
}

#[test]
fn test_float_arithmetic_keeps_tiny_and_huge_magnitudes() {
    let this = item();
    let tiny = "0.000000000000000000000000000001";
    let huge = "100000000000000000000000000000.0";

    assert_eq!(eval(&format!("{} * 1.0", tiny), &this), Ok(Value::Float(1e-30)));
    assert_eq!(eval(&format!("{} + 0.0 > 0.0", tiny), &this), Ok(Value::Bool(true)));
    assert_eq!(eval(&format!("{} * 2.0", huge), &this), Ok(Value::Float(2e29)));
    assert_eq!(eval(&format!("{} / 1.0", huge), &this), Ok(Value::Float(1e29)));
    // Both operands fit a decimal but their sum does not
    assert_eq!(
        eval("50000000000000000000000000000.0 + 50000000000000000000000000000.0", &this),
        Ok(Value::Float(1e29))
    );
    assert_eq!(eval("1.5 * 4", &this), Ok(Value::Float(6.0)));
}

#[test]
fn test_arithmetic_errors() {
    let this = item();
    assert_eq!(eval("7 / 0", &this), Err(EvalError::DivisionByZero));
    assert_eq!(eval("1.5 / 0", &this), Err(EvalError::DivisionByZero));
    assert_eq!(eval("9223372036854775807 + 1", &this), Err(EvalError::Overflow));
    assert!(matches!(eval("'a' - 'b'", &this), Err(EvalError::TypeMismatch(_))));
    assert!(matches!(eval("true + 1", &this), Err(EvalError::TypeMismatch(_))));
}

#[test]
fn test_comparisons() {
    let this = item();
    assert_eq!(eval("'a' < 'b'", &this), Ok(Value::Bool(true)));
    assert_eq!(eval("2 >= 2.0", &this), Ok(Value::Bool(true)));
    assert_eq!(eval("true = TRUE", &this), Ok(Value::Bool(true)));
    assert_eq!(eval("true != false", &this), Ok(Value::Bool(true)));
    assert!(matches!(eval("true < false", &this), Err(EvalError::TypeMismatch(_))));
    assert!(matches!(eval("1 = '1'", &this), Err(EvalError::TypeMismatch(_))));
}

#[test]
fn test_unary_operators() {
    let this = item();
    assert_eq!(eval("-@a", &this), Ok(Value::Int(-1)));
    assert_eq!(eval("!@flag", &this), Ok(Value::Bool(false)));
    // Unary minus is defined on integers only
    assert!(matches!(eval("-@b", &this), Err(EvalError::TypeMismatch(_))));
    assert!(matches!(eval("!1", &this), Err(EvalError::TypeMismatch(_))));
}

#[test]
fn test_numeric_promotion() {
    let this = item();
    assert_eq!(eval("@a < @b", &this), Ok(Value::Bool(true)));
    assert_eq!(eval("@a + @b", &this), Ok(Value::Float(2.5)));
    assert!(matches!(eval("@a < @name", &this), Err(EvalError::TypeMismatch(_))));
}

#[test]
fn test_short_circuit() {
    let this = item();
    assert_eq!(eval("false && (@nosuch = 1)", &this), Ok(Value::Bool(false)));
    assert_eq!(eval("true || (1 / 0 = 1)", &this), Ok(Value::Bool(true)));
    assert_eq!(
        eval("true && (@nosuch = 1)", &this),
        Err(EvalError::PropertyNotSet {
            name: "nosuch".into()
        })
    );
    assert!(matches!(eval("1 && true", &this), Err(EvalError::TypeMismatch(_))));
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_property_kinds() {
    let this = item();
    assert_eq!(eval("@name", &this), Ok(Value::from("widget")));
    assert_eq!(eval("@color", &this), Ok(Value::from("GREEN")));
    assert_eq!(eval("@data", &this), Ok(Value::from("hi")));
    assert_eq!(eval("@count", &this), Ok(Value::Int(7)));
    assert_eq!(eval("@count * 2", &this), Ok(Value::Int(14)));
    assert!(matches!(eval("@tags", &this), Err(EvalError::TypeMismatch(_))));
    assert!(matches!(eval("@child", &this), Err(EvalError::TypeMismatch(_))));
}

#[test]
fn test_unset_property() {
    let this = item();
    assert_eq!(
        eval("@unset", &this),
        Err(EvalError::PropertyNotSet {
            name: "unset".into()
        })
    );
    // Equality reads unset fields as their default
    assert_eq!(eval("@unset = 0", &this), Ok(Value::Bool(true)));
    assert_eq!(eval("@unset != 0", &this), Ok(Value::Bool(false)));

    let ctx = EvalContext::new(&this).with_use_default(true);
    assert_eq!(expr("@unset").eval(&ctx), Ok(Value::Int(0)));
}

#[test]
fn test_unknown_property() {
    let this = item();
    assert_eq!(
        eval("@nosuch = 1", &this),
        Err(EvalError::PropertyNotSet {
            name: "nosuch".into()
        })
    );
}

#[test]
fn test_presence() {
    let this = item();
    let ctx = EvalContext::new(&this).with_enforce_bool(true);
    assert_eq!(expr("@name").eval(&ctx), Ok(Value::Bool(true)));
    assert_eq!(expr("@unset").eval(&ctx), Ok(Value::Bool(false)));
    assert_eq!(expr("@tags").eval(&ctx), Ok(Value::Bool(true)));
    assert_eq!(expr("@child").eval(&ctx), Ok(Value::Bool(false)));
    assert_eq!(expr("@unset || @name").eval(&ctx), Ok(Value::Bool(true)));
    assert_eq!(expr("@unset && @name").eval(&ctx), Ok(Value::Bool(false)));
}

#[test]
fn test_wildcard_property() {
    let this = item();
    assert_eq!(eval("@*", &this), Ok(Value::Bool(true)));

    let empty = Value::Message(Message::empty(&item_descriptor()));
    assert_eq!(eval("@*", &empty), Ok(Value::Bool(false)));
}

#[test]
fn test_property_on_non_record() {
    assert_eq!(eval("@a", &Value::Int(3)), Err(EvalError::NotARecord));
}

// ============================================================================
// Builtins
// ============================================================================

#[test]
fn test_length() {
    let list = Value::List(List::new(vec![item(), item(), item()]));
    assert_eq!(eval("length()", &list), Ok(Value::Int(3)));
    assert_eq!(eval("length() - 1", &list), Ok(Value::Int(2)));
    assert_eq!(eval("length()", &Value::Bytes(vec![1, 2])), Ok(Value::Int(2)));
    assert_eq!(
        eval("length()", &item()),
        Err(EvalError::InvalidFunctionContext {
            name: "length".into()
        })
    );
}

#[test]
fn test_position() {
    let list = Value::List(List::new(vec![item()]));
    let element = item();
    let ctx = EvalContext::new(&list).with_index(&element, 2);
    assert_eq!(expr("position()").eval(&ctx), Ok(Value::Int(2)));
    assert_eq!(
        eval("position()", &list),
        Err(EvalError::InvalidFunctionContext {
            name: "position".into()
        })
    );
}

// ============================================================================
// Static Types
// ============================================================================

#[test]
fn test_static_types() {
    let this = item();
    let ctx = EvalContext::new(&this);
    let cases = vec![
        ("@a + @b", Type::Float),
        ("@a + 1", Type::Int),
        ("@name + 'x'", Type::String),
        ("@color", Type::String),
        ("@count", Type::Int),
        ("length()", Type::Int),
        // Comparison and logical operators are never inspected further
        ("@name > 1", Type::Bool),
        ("position() > true", Type::Bool),
        ("!@flag", Type::Bool),
    ];
    for (input, expected) in cases {
        assert_eq!(expr(input).static_type(&ctx), Ok(expected), "Failed for: {}", input);
    }
}

#[test]
fn test_static_type_errors() {
    let this = item();
    let ctx = EvalContext::new(&this);
    assert!(matches!(
        expr("@name - 'x'").static_type(&ctx),
        Err(EvalError::TypeMismatch(_))
    ));
    assert!(matches!(
        expr("@flag + 1").static_type(&ctx),
        Err(EvalError::TypeMismatch(_))
    ));
    assert!(matches!(
        expr("@tags").static_type(&ctx),
        Err(EvalError::TypeMismatch(_))
    ));
    assert_eq!(
        expr("@nosuch").static_type(&ctx),
        Err(EvalError::PropertyNotSet {
            name: "nosuch".into()
        })
    );
}

#[test]
fn test_static_type_over_list_uses_first_record() {
    let list = Value::List(List::new(vec![item(), item()]));
    let ctx = EvalContext::new(&list);
    assert_eq!(expr("@b").static_type(&ctx), Ok(Type::Float));
    assert_eq!(
        expr("@b").static_type(&ctx.with_enforce_bool(true)),
        Ok(Type::Bool)
    );

    let empty = Value::List(List::new(Vec::new()));
    assert_eq!(
        expr("@b").static_type(&EvalContext::new(&empty)),
        Err(EvalError::NotARecord)
    );
}

#[test]
fn test_context_is_copied() {
    let this = item();
    let ctx = EvalContext::new(&this);
    let derived = ctx.with_use_default(true).with_enforce_bool(true);
    assert!(!ctx.use_default);
    assert!(!ctx.enforce_bool);
    assert!(derived.use_default && derived.enforce_bool);
    assert_eq!(derived.index, None);
}
