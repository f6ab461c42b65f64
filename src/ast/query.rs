use std::fmt;

use crate::ast::Expr;

/// One traversal instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStep {
    /// Leading `/`: continue from the record the query runs against
    Root,

    /// Field selection by exact name, or every field for `*`
    ///
    /// # Examples
    /// ```text
    /// books
    /// *
    /// ```
    Node(String),

    /// `//`: the current record and, at any depth, every record below it
    RecursiveDescent,

    /// `[expr]`: a filter when `expr` is boolean, an index or map key otherwise
    ///
    /// # Examples
    /// ```text
    /// [@price > 35]
    /// [length() - 1]
    /// ['env']
    /// ```
    Key(Expr),

    /// `.`: the current value, unchanged
    SelfStep,
}

/// A compiled query path: an ordered, non-empty sequence of steps.
///
/// Displaying a query produces a path that compiles back to an equal query.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    steps: Vec<QueryStep>,
}

impl Query {
    pub(crate) fn new(steps: Vec<QueryStep>) -> Self {
        Query { steps }
    }

    pub fn steps(&self) -> &[QueryStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut prev: Option<&QueryStep> = None;
        for step in &self.steps {
            // A name after a name needs a separator; after `/` or `//` it must not get one
            let needs_separator = matches!(
                prev,
                Some(QueryStep::Node(_) | QueryStep::Key(_) | QueryStep::SelfStep)
            );
            match step {
                QueryStep::Root => f.write_str("/")?,
                QueryStep::RecursiveDescent => {
                    // `///` would lex as `//` followed by a separator
                    if matches!(prev, Some(QueryStep::Root)) {
                        f.write_str(" ")?;
                    }
                    f.write_str("//")?
                }
                QueryStep::Node(name) => {
                    if needs_separator {
                        f.write_str("/")?;
                    }
                    f.write_str(name)?
                }
                QueryStep::Key(expr) => write!(f, "[{}]", expr)?,
                QueryStep::SelfStep => {
                    if needs_separator {
                        f.write_str("/")?;
                    }
                    f.write_str(".")?
                }
            }
            prev = Some(step);
        }
        Ok(())
    }
}
