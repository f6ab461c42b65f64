//! Run queries against JSON input

use super::{CliError, json_to_record};
use crate::{compile, output::to_json_value};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The query to execute
    pub query: String,
    /// JSON input string
    pub input: Option<String>,
    /// Pretty-print the output
    pub pretty: bool,
    /// Only validate syntax, don't execute
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Query executed; the matches as a JSON array
    Success(serde_json::Value),
}

/// Compiles the query and, unless only the syntax is checked, runs it against
/// the input document.
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let query = compile(&options.query)?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let json_value: serde_json::Value = serde_json::from_str(json_str)?;
    let root = json_to_record(json_value)?;

    let matches = query.find_all(&root);
    Ok(CheckResult::Success(serde_json::Value::Array(
        matches.iter().map(to_json_value).collect(),
    )))
}
