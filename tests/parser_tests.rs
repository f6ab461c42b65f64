// tests/parser_tests.rs

use protoquery::ast::{BinOp, Builtin, Expr, Precedence, QueryStep, UnaryOp};
use protoquery::lexer::Lexer;
use protoquery::parser::{CompileError, Parser};
use protoquery::{LexError, compile};

fn parse_expr(input: &str) -> Result<Expr, CompileError> {
    let mut parser = Parser::new(Lexer::new(input))?;
    parser.parse_expression(Precedence::Lowest)
}

fn steps(query: &str) -> Vec<QueryStep> {
    let compiled = compile(query).unwrap();
    assert_eq!(compiled.branches().len(), 1);
    compiled.branches()[0].steps().to_vec()
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_comparison() {
    let expr = parse_expr("@price > 35").unwrap();
    assert_eq!(
        expr,
        Expr::binary(Expr::property("price"), BinOp::GreaterThan, Expr::int(35))
    );
}

#[test]
fn test_arithmetic_precedence() {
    // Should be: Add(1, Multiply(2, 3))
    assert_eq!(
        parse_expr("1 + 2 * 3").unwrap(),
        Expr::binary(
            Expr::int(1),
            BinOp::Add,
            Expr::binary(Expr::int(2), BinOp::Multiply, Expr::int(3)),
        )
    );
}

#[test]
fn test_parentheses() {
    // Should be: Multiply(Add(1, 2), 3)
    assert_eq!(
        parse_expr("(1 + 2) * 3").unwrap(),
        Expr::binary(
            Expr::binary(Expr::int(1), BinOp::Add, Expr::int(2)),
            BinOp::Multiply,
            Expr::int(3),
        )
    );
}

#[test]
fn test_left_associative() {
    assert_eq!(
        parse_expr("10 - 4 - 3").unwrap(),
        Expr::binary(
            Expr::binary(Expr::int(10), BinOp::Subtract, Expr::int(4)),
            BinOp::Subtract,
            Expr::int(3),
        )
    );
}

#[test]
fn test_division_uses_slash() {
    assert_eq!(
        parse_expr("@total / 2").unwrap(),
        Expr::binary(Expr::property("total"), BinOp::Divide, Expr::int(2))
    );
}

#[test]
fn test_equality_binds_loosest() {
    // `a < b = c` groups as `(a < b) = c`
    assert_eq!(
        parse_expr("@a < @b = true").unwrap(),
        Expr::binary(
            Expr::binary(Expr::property("a"), BinOp::LessThan, Expr::property("b")),
            BinOp::Equal,
            Expr::bool(true),
        )
    );
}

#[test]
fn test_logical_needs_parentheses_around_comparisons() {
    assert_eq!(
        parse_expr("(@a > 1) && (@b < 2)").unwrap(),
        Expr::binary(
            Expr::binary(Expr::property("a"), BinOp::GreaterThan, Expr::int(1)),
            BinOp::And,
            Expr::binary(Expr::property("b"), BinOp::LessThan, Expr::int(2)),
        )
    );
}

#[test]
fn test_unary_operators() {
    assert_eq!(
        parse_expr("!@flag").unwrap(),
        Expr::unary(UnaryOp::Not, Expr::property("flag"))
    );
    assert_eq!(
        parse_expr("--1").unwrap(),
        Expr::unary(UnaryOp::Minus, Expr::unary(UnaryOp::Minus, Expr::int(1)))
    );
    assert_eq!(
        parse_expr("+@n").unwrap(),
        Expr::unary(UnaryOp::Plus, Expr::property("n"))
    );
}

#[test]
fn test_properties() {
    assert_eq!(parse_expr("@name").unwrap(), Expr::property("name"));
    assert_eq!(parse_expr("name").unwrap(), Expr::property("name"));
    assert_eq!(parse_expr("@*").unwrap(), Expr::property("*"));
}

#[test]
fn test_literals() {
    assert_eq!(parse_expr("'B'").unwrap(), Expr::string("B"));
    assert_eq!(parse_expr("2.5").unwrap(), Expr::float(2.5));
    assert_eq!(parse_expr("FALSE").unwrap(), Expr::bool(false));
}

#[test]
fn test_function_calls() {
    assert_eq!(parse_expr("length()").unwrap(), Expr::call(Builtin::Length));
    assert_eq!(
        parse_expr("length() - 1").unwrap(),
        Expr::binary(Expr::call(Builtin::Length), BinOp::Subtract, Expr::int(1))
    );
    assert_eq!(parse_expr("position()").unwrap(), Expr::call(Builtin::Position));
}

// ============================================================================
// Expression Errors
// ============================================================================

#[test]
fn test_unknown_function() {
    assert_eq!(
        parse_expr("count()"),
        Err(CompileError::UnknownFunction {
            name: "count".into(),
            position: 0
        })
    );
}

#[test]
fn test_arity_mismatch() {
    assert_eq!(
        parse_expr("length(1, 2)"),
        Err(CompileError::ArityMismatch {
            name: "length".into(),
            expected: 0,
            found: 2,
            position: 0
        })
    );
}

#[test]
fn test_missing_closing_paren() {
    assert_eq!(
        parse_expr("(1 + 2"),
        Err(CompileError::MissingClosingParen { position: 6 })
    );
    assert!(matches!(
        parse_expr("length("),
        Err(CompileError::UnexpectedToken { .. })
    ));
}

#[test]
fn test_missing_operand() {
    assert_eq!(
        parse_expr("1 +"),
        Err(CompileError::MissingOperand {
            operator: "+".into(),
            position: 2
        })
    );
    assert!(matches!(
        parse_expr("-"),
        Err(CompileError::MissingOperand { .. })
    ));
}

#[test]
fn test_unexpected_prefix_token() {
    assert!(matches!(
        parse_expr("]"),
        Err(CompileError::UnexpectedToken { position: 0, .. })
    ));
    assert!(matches!(
        parse_expr("@5"),
        Err(CompileError::UnexpectedToken { position: 1, .. })
    ));
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_simple_path() {
    assert_eq!(
        steps("/books/title"),
        vec![
            QueryStep::Root,
            QueryStep::Node("books".into()),
            QueryStep::Node("title".into()),
        ]
    );
}

#[test]
fn test_path_without_root() {
    assert_eq!(
        steps("books/title"),
        vec![
            QueryStep::Node("books".into()),
            QueryStep::Node("title".into()),
        ]
    );
}

#[test]
fn test_filter_step() {
    assert_eq!(
        steps("/books[@price>35]/title"),
        vec![
            QueryStep::Root,
            QueryStep::Node("books".into()),
            QueryStep::Key(Expr::binary(
                Expr::property("price"),
                BinOp::GreaterThan,
                Expr::int(35)
            )),
            QueryStep::Node("title".into()),
        ]
    );
}

#[test]
fn test_recursive_descent() {
    assert_eq!(
        steps("//children[@string_val='B']/int_val"),
        vec![
            QueryStep::RecursiveDescent,
            QueryStep::Node("children".into()),
            QueryStep::Key(Expr::binary(
                Expr::property("string_val"),
                BinOp::Equal,
                Expr::string("B")
            )),
            QueryStep::Node("int_val".into()),
        ]
    );
}

#[test]
fn test_adjacent_brackets_are_sequential_keys() {
    assert_eq!(
        steps("books[@price > 10][0]"),
        vec![
            QueryStep::Node("books".into()),
            QueryStep::Key(Expr::binary(
                Expr::property("price"),
                BinOp::GreaterThan,
                Expr::int(10)
            )),
            QueryStep::Key(Expr::int(0)),
        ]
    );
}

#[test]
fn test_wildcard_and_self() {
    assert_eq!(
        steps("/*/."),
        vec![QueryStep::Root, QueryStep::Node("*".into()), QueryStep::SelfStep]
    );
}

#[test]
fn test_union() {
    let compiled = compile("/a | b//c").unwrap();
    assert_eq!(compiled.branches().len(), 2);
    assert_eq!(
        compiled.branches()[1].steps(),
        &[
            QueryStep::Node("b".into()),
            QueryStep::RecursiveDescent,
            QueryStep::Node("c".into()),
        ]
    );
}

// ============================================================================
// Query Errors
// ============================================================================

#[test]
fn test_missing_operand_in_filter() {
    assert_eq!(
        compile("books[@price="),
        Err(CompileError::MissingOperand {
            operator: "=".into(),
            position: 12
        })
    );
}

#[test]
fn test_missing_closing_bracket() {
    assert_eq!(
        compile("books[0"),
        Err(CompileError::MissingClosingBracket { position: 7 })
    );
}

#[test]
fn test_empty_queries() {
    assert_eq!(compile(""), Err(CompileError::EmptyQuery { position: 0 }));
    assert_eq!(compile("a |"), Err(CompileError::EmptyQuery { position: 3 }));
    assert_eq!(compile("| a"), Err(CompileError::EmptyQuery { position: 0 }));
}

#[test]
fn test_unexpected_step_tokens() {
    assert!(matches!(
        compile("books/.."),
        Err(CompileError::UnexpectedToken { position: 6, .. })
    ));
    assert!(matches!(
        compile("@books"),
        Err(CompileError::UnexpectedToken { position: 0, .. })
    ));
    assert!(matches!(
        compile("books]"),
        Err(CompileError::UnexpectedToken { position: 5, .. })
    ));
}

#[test]
fn test_lex_errors_surface() {
    assert_eq!(
        compile("books['x"),
        Err(CompileError::Lex(LexError::UnterminatedString { position: 6 }))
    );
}

#[test]
fn test_error_display_names_position() {
    let err = compile("books[@price=").unwrap_err();
    assert_eq!(err.position(), 12);
    assert!(err.to_string().contains("position 12"));
}

// ============================================================================
// Round Trip
// ============================================================================

#[test]
fn test_display_round_trip() {
    let queries = [
        "/books[@price>35]/title",
        "//children[@string_val='B']/int_val",
        "/books[length()-1]",
        "books[(@a > 1) && (@b < 2)][0]",
        "/ //name",
        "a//b/*/.",
        "x[-1 * -2 + 3 / 4.5]",
        "m[\"it's\"]",
        "books[!@isbn || @*] | /other",
        "/[true]",
    ];

    for query in queries {
        let compiled = compile(query).unwrap();
        let rendered = compiled.to_string();
        let recompiled = compile(&rendered)
            .unwrap_or_else(|e| panic!("'{}' rendered as '{}': {}", query, rendered, e));
        assert_eq!(compiled, recompiled, "Failed for query: {}", query);
    }
}

#[test]
fn test_display_canonical_form() {
    assert_eq!(
        compile("/books[@price>35]/title").unwrap().to_string(),
        "/books[@price > 35]/title"
    );
    assert_eq!(
        compile("a[x = 1 + 2 * 3]").unwrap().to_string(),
        "a[@x = (1 + (2 * 3))]"
    );
}
