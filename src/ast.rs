//! # Query Language - Abstract Syntax Tree
//!
//! This module defines the syntax tree of the path query language, an XPath-like
//! notation for selecting values out of a tree of typed records.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[operators]** - Unary and binary operators and their precedence tiers
//! - **[expressions]** - Scalar expressions used inside `[...]`
//! - **[query]** - Query steps and the compiled step sequence
//!
//! ## Quick Start
//!
//! ```text
//! /books[@price > 35]/title
//! ```
//!
//! Starting at the root record, take the `books` field, keep the books whose
//! `price` is above 35 and return their titles.
//!
//! ## Core Concepts
//!
//! ### Steps
//!
//! - `/` at the start anchors the query at the root record; later it only
//!   separates steps
//! - `name` selects the field called `name` (`*` selects every field)
//! - `//` descends into the current record and every record below it
//! - `[expr]` filters or indexes, depending on the type of `expr`
//! - `.` keeps the current value
//!
//! ### Filter or Index
//!
//! The same bracket syntax serves two purposes, decided when the query runs:
//!
//! - a **boolean** expression keeps the list elements it holds for
//!   (`books[@price > 35]`)
//! - an **integer** expression picks one element by 0-based position
//!   (`books[0]`, `books[length() - 1]`)
//! - on a map field the expression is a key (`labels['env']`)
//!
//! ### Precedence
//!
//! From loosest to tightest: `= !=`, then `< <= > >=`, then `+ - && ||`, then
//! `* /`, then the prefix operators `! + -`. Logical operators bind tighter than
//! comparisons, so comparisons joined by `&&` or `||` need parentheses:
//!
//! ```text
//! books[(@price > 10) && (@price < 40)]
//! ```
pub mod expressions;
pub mod operators;
pub mod query;
pub mod tokens;

pub use expressions::{Builtin, Expr, Literal};
pub use operators::{BinOp, Precedence, UnaryOp};
pub use query::{Query, QueryStep};
pub use tokens::{Spanned, Token};
