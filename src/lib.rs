pub mod ast;
pub mod cli;
pub mod engine;
pub mod evaluator;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod queue;
pub mod record;
pub mod value;

pub use ast::{BinOp, Builtin, Expr, Literal, Query, QueryStep, Token, UnaryOp};
pub use engine::{CompiledQuery, compile};
pub use evaluator::{EvalContext, EvalError};
pub use lexer::{LexError, Lexer, tokenize};
pub use output::{to_json, to_json_pretty};
pub use parser::{CompileError, Parser};
pub use record::{Message, MessageDescriptor, RecordError};
pub use value::{Type, Value};
