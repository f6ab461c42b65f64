//! CLI support for protoquery
//!
//! Provides programmatic access to the CLI functionality so it can be embedded
//! in other tools.

mod check;
mod convert;
mod docs;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use convert::json_to_record;
pub use docs::{DocCategory, get_doc_category, get_docs_overview};

use std::io;

use thiserror::Error;

use crate::{CompileError, record::RecordError};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,

    #[error("Unknown category: '{0}'\nRun 'protoquery docs' to see available categories.")]
    UnknownCategory(String),

    /// The JSON document has no record form
    #[error("Unsupported JSON: {0}")]
    UnsupportedJson(String),
}
