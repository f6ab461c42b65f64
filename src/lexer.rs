use thiserror::Error;

use crate::ast::{Spanned, Token};

/// Errors raised while splitting a query into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("unterminated string starting at position {position}")]
    UnterminatedString { position: usize },

    #[error("invalid number '{literal}' at position {position}")]
    InvalidNumber { literal: String, position: usize },
}

impl LexError {
    pub fn position(&self) -> usize {
        match self {
            LexError::UnexpectedCharacter { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::InvalidNumber { position, .. } => *position,
        }
    }
}

pub struct Lexer {
    /// Characters paired with their byte offsets
    input: Vec<(usize, char)>,
    len: usize,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.char_indices().collect(),
            len: input.len(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).map(|&(_, c)| c)
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).map(|&(_, c)| c)
    }

    /// Byte offset of the current character.
    fn offset(&self) -> usize {
        self.input
            .get(self.position)
            .map(|&(o, _)| o)
            .unwrap_or(self.len)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.offset();
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == quote {
                return Ok(result);
            }
            result.push(ch);
        }

        Err(LexError::UnterminatedString { position: start })
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.offset();
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
            } else if ch == '.' {
                is_float = true;
                number.push(ch);
            } else {
                break;
            }
            self.advance();
        }

        let invalid = || LexError::InvalidNumber {
            literal: number.clone(),
            position: start,
        };
        if is_float {
            number.parse::<f64>().map(Token::Float).map_err(|_| invalid())
        } else {
            number.parse::<i64>().map(Token::Integer).map_err(|_| invalid())
        }
    }

    /// Consumes one character, or two when the second one is `second`.
    fn one_or_two(&mut self, second: char, single: Token, double: Token) -> Token {
        if self.peek_char(1) == Some(second) {
            self.advance();
            self.advance();
            double
        } else {
            self.advance();
            single
        }
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    pub fn next_token(&mut self) -> Result<Spanned, LexError> {
        self.skip_whitespace();
        let position = self.offset();

        let token = match self.current_char() {
            None => Token::Eof,
            Some('/') => self.one_or_two('/', Token::Slash, Token::SlashSlash),
            Some('.') => self.one_or_two('.', Token::Dot, Token::DotDot),
            Some('!') => self.one_or_two('=', Token::Bang, Token::NotEqual),
            Some('<') => self.one_or_two('=', Token::Less, Token::LessEqual),
            Some('>') => self.one_or_two('=', Token::Greater, Token::GreaterEqual),
            Some('|') => self.one_or_two('|', Token::Pipe, Token::Or),
            Some('&') => {
                if self.peek_char(1) == Some('&') {
                    self.advance();
                    self.advance();
                    Token::And
                } else {
                    return Err(LexError::UnexpectedCharacter { ch: '&', position });
                }
            }
            Some('[') => self.single(Token::LBracket),
            Some(']') => self.single(Token::RBracket),
            Some('(') => self.single(Token::LParen),
            Some(')') => self.single(Token::RParen),
            Some('@') => self.single(Token::At),
            Some(',') => self.single(Token::Comma),
            Some('=') => self.single(Token::Equal),
            Some('+') => self.single(Token::Plus),
            Some('-') => self.single(Token::Minus),
            Some('*') => self.single(Token::Star),
            Some(quote @ ('"' | '\'')) => Token::String(self.read_string(quote)?),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();

                match ident.to_ascii_lowercase().as_str() {
                    "true" => Token::Boolean(true),
                    "false" => Token::Boolean(false),
                    _ => Token::Node(ident),
                }
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) => return Err(LexError::UnexpectedCharacter { ch, position }),
        };

        Ok(Spanned::new(token, position))
    }
}

/// Splits a query into tokens, without the trailing [`Token::Eof`].
///
/// # Examples
///
/// ```
/// use protoquery::ast::Token;
/// use protoquery::lexer::tokenize;
///
/// let tokens: Vec<Token> = tokenize("/books[0]")
///     .unwrap()
///     .into_iter()
///     .map(|t| t.token)
///     .collect();
/// assert_eq!(
///     tokens,
///     vec![
///         Token::Slash,
///         Token::Node("books".into()),
///         Token::LBracket,
///         Token::Integer(0),
///         Token::RBracket,
///     ]
/// );
/// ```
pub fn tokenize(query: &str) -> Result<Vec<Spanned>, LexError> {
    let mut lexer = Lexer::new(query);
    let mut tokens = Vec::new();
    loop {
        let spanned = lexer.next_token()?;
        if spanned.token == Token::Eof {
            return Ok(tokens);
        }
        tokens.push(spanned);
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("true FALSE True node");
    assert_eq!(lexer.next_token().unwrap().token, Token::Boolean(true));
    assert_eq!(lexer.next_token().unwrap().token, Token::Boolean(false));
    assert_eq!(lexer.next_token().unwrap().token, Token::Boolean(true));
    assert_eq!(lexer.next_token().unwrap().token, Token::Node("node".into()));
    assert_eq!(lexer.next_token().unwrap().token, Token::Eof);
}

#[test]
fn test_filter_path() {
    let mut lexer = Lexer::new("/books[@price>35]/title");
    assert_eq!(lexer.next_token().unwrap().token, Token::Slash);
    assert_eq!(lexer.next_token().unwrap().token, Token::Node("books".into()));
    assert_eq!(lexer.next_token().unwrap().token, Token::LBracket);
    assert_eq!(lexer.next_token().unwrap().token, Token::At);
    assert_eq!(lexer.next_token().unwrap().token, Token::Node("price".into()));
    assert_eq!(lexer.next_token().unwrap().token, Token::Greater);
    assert_eq!(lexer.next_token().unwrap().token, Token::Integer(35));
    assert_eq!(lexer.next_token().unwrap().token, Token::RBracket);
    assert_eq!(lexer.next_token().unwrap().token, Token::Slash);
    assert_eq!(lexer.next_token().unwrap().token, Token::Node("title".into()));
}

#[test]
fn test_positions_are_byte_offsets() {
    let tokens = tokenize("a  [ 'é' ]").unwrap();
    let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![0, 3, 5, 10]);
}
