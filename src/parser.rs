use thiserror::Error;

use crate::{
    ast::{BinOp, Builtin, Expr, Literal, Precedence, Query, QueryStep, Spanned, Token, UnaryOp},
    lexer::{LexError, Lexer},
};

/// Errors raised while compiling a query. Every variant carries the byte
/// offset the problem was detected at.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("unexpected token '{found}' at position {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("unknown function '{name}' at position {position}")]
    UnknownFunction { name: String, position: usize },

    #[error(
        "function '{name}' takes {expected} argument(s) but {found} were given at position {position}"
    )]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        position: usize,
    },

    #[error("missing ']' at position {position}")]
    MissingClosingBracket { position: usize },

    #[error("missing ')' at position {position}")]
    MissingClosingParen { position: usize },

    #[error("operator '{operator}' at position {position} is missing its right operand")]
    MissingOperand { operator: String, position: usize },

    #[error("empty query at position {position}")]
    EmptyQuery { position: usize },
}

impl CompileError {
    pub fn position(&self) -> usize {
        match self {
            CompileError::Lex(e) => e.position(),
            CompileError::UnexpectedToken { position, .. }
            | CompileError::UnknownFunction { position, .. }
            | CompileError::ArityMismatch { position, .. }
            | CompileError::MissingClosingBracket { position }
            | CompileError::MissingClosingParen { position }
            | CompileError::MissingOperand { position, .. }
            | CompileError::EmptyQuery { position } => *position,
        }
    }
}

pub struct Parser {
    tokens: Vec<Spanned>,
    cursor: usize,
}

impl Parser {
    /// Drains the lexer. Lexical errors surface here, before any parsing.
    pub fn new(mut lexer: Lexer) -> Result<Self, CompileError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = lexer.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                break;
            }
        }
        Ok(Parser { tokens, cursor: 0 })
    }

    /// Builds a parser over already lexed tokens; an end-of-input token is
    /// appended when missing.
    pub fn from_tokens(mut tokens: Vec<Spanned>) -> Self {
        if tokens.last().map(|t| &t.token) != Some(&Token::Eof) {
            let end = tokens.last().map(|t| t.position + 1).unwrap_or(0);
            tokens.push(Spanned::new(Token::Eof, end));
        }
        Parser { tokens, cursor: 0 }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.cursor].token
    }

    fn position(&self) -> usize {
        self.tokens[self.cursor].position
    }

    fn advance(&mut self) {
        if self.cursor + 1 < self.tokens.len() {
            self.cursor += 1;
        }
    }

    fn check(&self, token: &Token) -> bool {
        self.current() == token
    }

    fn unexpected(&self) -> CompileError {
        CompileError::UnexpectedToken {
            found: self.current().to_string(),
            position: self.position(),
        }
    }

    /// Tokens that cannot start an operand.
    fn ends_operand(&self) -> bool {
        matches!(
            self.current(),
            Token::Eof | Token::RBracket | Token::RParen | Token::Comma
        )
    }

    /// Parses a query made of one or more `|`-separated branches.
    pub fn parse_query(&mut self) -> Result<Vec<Query>, CompileError> {
        let mut branches = vec![self.parse_branch()?];
        while self.check(&Token::Pipe) {
            self.advance();
            branches.push(self.parse_branch()?);
        }
        if !self.check(&Token::Eof) {
            return Err(self.unexpected());
        }
        Ok(branches)
    }

    fn parse_branch(&mut self) -> Result<Query, CompileError> {
        let start = self.position();
        let mut steps = Vec::new();

        loop {
            match self.current() {
                Token::Eof | Token::Pipe => break,
                Token::Slash => {
                    // Only a leading slash anchors; later ones separate steps
                    if steps.is_empty() {
                        steps.push(QueryStep::Root);
                    }
                    self.advance();
                }
                Token::SlashSlash => {
                    steps.push(QueryStep::RecursiveDescent);
                    self.advance();
                }
                Token::Node(name) => {
                    steps.push(QueryStep::Node(name.clone()));
                    self.advance();
                }
                Token::Star => {
                    steps.push(QueryStep::Node("*".to_string()));
                    self.advance();
                }
                Token::Dot => {
                    steps.push(QueryStep::SelfStep);
                    self.advance();
                }
                Token::LBracket => {
                    self.advance(); // Consume '['
                    let expr = self.parse_expression(Precedence::Lowest)?;
                    if !self.check(&Token::RBracket) {
                        return Err(CompileError::MissingClosingBracket {
                            position: self.position(),
                        });
                    }
                    self.advance();
                    steps.push(QueryStep::Key(expr));
                }
                _ => return Err(self.unexpected()),
            }
        }

        if steps.is_empty() {
            return Err(CompileError::EmptyQuery { position: start });
        }
        Ok(Query::new(steps))
    }

    /// Precedence climbing: parse a prefix operand, then fold in every binary
    /// operator that binds tighter than `min_precedence`.
    pub fn parse_expression(&mut self, min_precedence: Precedence) -> Result<Expr, CompileError> {
        let mut left = self.parse_prefix()?;

        while let Some(op) = BinOp::from_token(self.current()) {
            let precedence = op.precedence();
            if precedence <= min_precedence {
                break;
            }
            let position = self.position();
            self.advance();

            if self.ends_operand() {
                return Err(CompileError::MissingOperand {
                    operator: op.symbol().to_string(),
                    position,
                });
            }
            let right = self.parse_expression(precedence)?;
            left = Expr::binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr, CompileError> {
        let position = self.position();

        let expr = match self.current().clone() {
            Token::Integer(n) => {
                self.advance();
                Expr::Literal(Literal::Int(n))
            }
            Token::Float(n) => {
                self.advance();
                Expr::Literal(Literal::Float(n))
            }
            Token::String(s) => {
                self.advance();
                Expr::Literal(Literal::String(s))
            }
            Token::Boolean(b) => {
                self.advance();
                Expr::Literal(Literal::Bool(b))
            }

            Token::At => {
                self.advance();
                match self.current().clone() {
                    Token::Node(name) => {
                        self.advance();
                        Expr::Property(name)
                    }
                    Token::Star => {
                        self.advance();
                        Expr::property("*")
                    }
                    _ => return Err(self.unexpected()),
                }
            }

            Token::Node(name) => {
                self.advance();
                if self.check(&Token::LParen) {
                    self.parse_call(name, position)?
                } else {
                    Expr::Property(name)
                }
            }

            token @ (Token::Bang | Token::Plus | Token::Minus) => {
                self.advance();
                if self.ends_operand() {
                    return Err(CompileError::MissingOperand {
                        operator: token.to_string(),
                        position,
                    });
                }
                let operand = self.parse_expression(Precedence::Prefix)?;
                match UnaryOp::from_token(&token) {
                    Some(op) => Expr::unary(op, operand),
                    None => return Err(self.unexpected()),
                }
            }

            Token::LParen => {
                self.advance();
                let expr = self.parse_expression(Precedence::Lowest)?;
                if !self.check(&Token::RParen) {
                    return Err(CompileError::MissingClosingParen {
                        position: self.position(),
                    });
                }
                self.advance();
                expr
            }

            _ => return Err(self.unexpected()),
        };

        Ok(expr)
    }

    /// Parses `name(args...)`; the current token is the opening parenthesis.
    fn parse_call(&mut self, name: String, position: usize) -> Result<Expr, CompileError> {
        let function = Builtin::lookup(&name)
            .ok_or_else(|| CompileError::UnknownFunction {
                name: name.clone(),
                position,
            })?;
        self.advance(); // Consume '('

        let mut args = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                args.push(self.parse_expression(Precedence::Lowest)?);
                if self.check(&Token::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        if !self.check(&Token::RParen) {
            return Err(CompileError::MissingClosingParen {
                position: self.position(),
            });
        }
        self.advance();

        if args.len() != function.arity() {
            return Err(CompileError::ArityMismatch {
                name,
                expected: function.arity(),
                found: args.len(),
                position,
            });
        }

        Ok(Expr::FunctionCall { function, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expr(input: &str) -> Result<Expr, CompileError> {
        let mut parser = Parser::new(Lexer::new(input))?;
        parser.parse_expression(Precedence::Lowest)
    }

    #[test]
    fn test_logical_operators_share_sum_tier() {
        // `a > 1 && b` groups as `a > (1 && b)`
        let expr = parse_expr("@a > 1 && @b").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                Expr::property("a"),
                BinOp::GreaterThan,
                Expr::binary(Expr::int(1), BinOp::And, Expr::property("b")),
            )
        );
    }

    #[test]
    fn test_unary_binds_tightest() {
        let expr = parse_expr("-1 * 2").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                Expr::unary(UnaryOp::Minus, Expr::int(1)),
                BinOp::Multiply,
                Expr::int(2),
            )
        );
    }

    #[test]
    fn test_from_tokens_appends_eof() {
        let tokens = crate::lexer::tokenize("a").unwrap();
        let mut parser = Parser::from_tokens(tokens);
        let branches = parser.parse_query().unwrap();
        assert_eq!(branches[0].steps(), &[QueryStep::Node("a".into())]);
    }
}
