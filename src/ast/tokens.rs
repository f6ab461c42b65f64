use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Field name or function name
    ///
    /// Must start with a letter or underscore, followed by letters, digits, or
    /// underscores.
    ///
    /// # Examples
    /// ```text
    /// books
    /// int_val
    /// length
    /// ```
    Node(String),

    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 0
    /// 42
    /// ```
    Integer(i64),

    /// Floating point number, any number containing a `.`
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 35.
    /// ```
    Float(f64),

    /// Boolean values, case-insensitive
    ///
    /// # Examples
    /// ```text
    /// true
    /// FALSE
    /// ```
    Boolean(bool),

    /// String literal enclosed in single or double quotes, no escapes
    ///
    /// # Examples
    /// ```text
    /// 'B'
    /// "hello world"
    /// ```
    String(String),

    // Structural
    /// Root anchor, step separator or division
    Slash,

    /// Recursive descent
    SlashSlash,

    LBracket,
    RBracket,
    LParen,
    RParen,

    /// Property prefix
    ///
    /// # Examples
    /// ```text
    /// @price
    /// @*
    /// ```
    At,

    /// Current value
    Dot,

    /// Parent (lexed, but not part of the query grammar)
    DotDot,

    Comma,

    /// Union of two queries
    Pipe,

    // Comparison
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Logical
    And,
    Or,
    Bang,

    // Arithmetic
    Plus,
    Minus,

    /// Multiplication or wildcard
    Star,

    /// End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Node(name) => f.write_str(name),
            Token::Integer(n) => write!(f, "{}", n),
            Token::Float(n) => write!(f, "{}", n),
            Token::Boolean(b) => write!(f, "{}", b),
            Token::String(s) => write!(f, "'{}'", s),
            Token::Slash => f.write_str("/"),
            Token::SlashSlash => f.write_str("//"),
            Token::LBracket => f.write_str("["),
            Token::RBracket => f.write_str("]"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::At => f.write_str("@"),
            Token::Dot => f.write_str("."),
            Token::DotDot => f.write_str(".."),
            Token::Comma => f.write_str(","),
            Token::Pipe => f.write_str("|"),
            Token::Equal => f.write_str("="),
            Token::NotEqual => f.write_str("!="),
            Token::Less => f.write_str("<"),
            Token::LessEqual => f.write_str("<="),
            Token::Greater => f.write_str(">"),
            Token::GreaterEqual => f.write_str(">="),
            Token::And => f.write_str("&&"),
            Token::Or => f.write_str("||"),
            Token::Bang => f.write_str("!"),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// A token together with the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

impl Spanned {
    pub fn new(token: Token, position: usize) -> Self {
        Spanned { token, position }
    }
}
