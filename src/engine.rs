//! Query compilation entry point and the traversal engine.
//!
//! A compiled query is run against a root message with a FIFO work queue.
//! Each queue item pairs a step index with the value that step applies to; an
//! item whose index is past the last step is a match. Every push goes through
//! a `(step, identity)` memo so a record reachable along several paths, or
//! revisited by recursive descent, is expanded once per step.

use std::{fmt, str::FromStr, sync::Arc};

use log::{debug, trace};

use crate::{
    ast::{Expr, Query, QueryStep},
    evaluator::{EvalContext, EvalError},
    lexer::Lexer,
    parser::{CompileError, Parser},
    queue::{Memoize, QueueOnce},
    record::{FieldDescriptor, FieldKind, List, Map, MapKey, Message, ValueId},
    value::{Type, Value},
};

/// Compiles a query string.
///
/// # Examples
///
/// ```
/// use protoquery::compile;
///
/// let query = compile("/books[@price > 35]/title").unwrap();
/// assert_eq!(query.to_string(), "/books[@price > 35]/title");
///
/// assert!(compile("books[@price=").is_err());
/// ```
pub fn compile(query: &str) -> Result<CompiledQuery, CompileError> {
    let mut parser = Parser::new(Lexer::new(query))?;
    let branches = parser.parse_query()?;
    let compiled = CompiledQuery { branches };
    debug!("compiled query '{}' as '{}'", query, compiled);
    Ok(compiled)
}

/// A compiled, reusable query: one or more `|`-separated paths.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    branches: Vec<Query>,
}

impl CompiledQuery {
    pub fn branches(&self) -> &[Query] {
        &self.branches
    }

    /// Returns every value the query selects under `root`, branch by branch
    /// and in discovery order within a branch.
    ///
    /// Evaluation errors never surface: the search path that raised one is
    /// dropped and the rest of the search continues.
    pub fn find_all(&self, root: &Message) -> Vec<Value> {
        let mut results = Vec::new();
        for branch in &self.branches {
            run(branch, root, &mut results);
        }
        debug!(
            "query '{}' on {} matched {} value(s)",
            self,
            root.type_name(),
            results.len()
        );
        results
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, branch) in self.branches.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{}", branch)?;
        }
        Ok(())
    }
}

impl FromStr for CompiledQuery {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        compile(s)
    }
}

/// A pending step application.
struct WorkItem {
    step: usize,
    value: Value,
    /// Field the value was read from, when it came from a node step
    field: Option<Arc<FieldDescriptor>>,
}

impl WorkItem {
    fn new(step: usize, value: Value, field: Option<Arc<FieldDescriptor>>) -> Self {
        WorkItem { step, value, field }
    }

    fn field_name(&self) -> &str {
        self.field.as_ref().map(|fd| fd.name()).unwrap_or("-")
    }
}

impl Memoize for WorkItem {
    type Key = (usize, ValueId);

    fn memo_key(&self) -> Option<Self::Key> {
        self.value.identity().map(|id| (self.step, id))
    }
}

fn run(query: &Query, root: &Message, results: &mut Vec<Value>) {
    let steps = query.steps();
    let mut queue = QueueOnce::new();
    queue.push(WorkItem::new(0, Value::Message(root.clone()), None));

    while let Some(item) = queue.pop() {
        let Some(step) = steps.get(item.step) else {
            match item.value {
                Value::List(list) => results.extend(list.iter().cloned()),
                value => results.push(value),
            }
            continue;
        };
        let next = item.step + 1;

        match step {
            QueryStep::Root | QueryStep::SelfStep => {
                queue.push(WorkItem::new(next, item.value, item.field));
            }
            QueryStep::Node(name) => select_fields(name, &item.value, next, &mut queue),
            QueryStep::Key(expr) => apply_key(expr, &item, next, &mut queue),
            QueryStep::RecursiveDescent => descend(&item, &mut queue),
        }
    }
}

/// Node step: for every record (a list is flattened first), push the value
/// of each field matching `name`.
fn select_fields(name: &str, value: &Value, next: usize, queue: &mut QueueOnce<WorkItem>) {
    let records: Vec<&Message> = match value {
        Value::Message(m) => vec![m],
        Value::List(list) => list.iter().filter_map(Value::as_message).collect(),
        _ => Vec::new(),
    };

    for record in records {
        for fd in record.fields_by_name(name) {
            // Unset singular message fields have no value and are skipped
            if let Some(value) = record.get(fd) {
                queue.push(WorkItem::new(next, name_enums(fd, value), Some(Arc::clone(fd))));
            }
        }
    }
}

/// Replaces enum ordinals read from `fd` with their symbolic names.
fn name_enums(fd: &FieldDescriptor, value: Value) -> Value {
    if !matches!(fd.kind(), FieldKind::Enum(_)) {
        return value;
    }
    let rename = |v: &Value| match v {
        Value::Int(n) => fd
            .enum_name(*n)
            .map(|s| Value::String(s.to_string()))
            .unwrap_or(Value::Int(*n)),
        other => other.clone(),
    };

    match &value {
        Value::Int(_) => rename(&value),
        Value::List(list) => Value::List(list.iter().map(rename).collect()),
        Value::Map(map) => Value::Map(Map::from_parts(
            map.key_kind(),
            map.iter().map(|(k, v)| (k.clone(), rename(v))).collect(),
        )),
        _ => value,
    }
}

fn apply_key(expr: &Expr, item: &WorkItem, next: usize, queue: &mut QueueOnce<WorkItem>) {
    match &item.value {
        Value::List(list) => key_list(expr, item, list, next, queue),
        Value::Map(map) => {
            let ctx = EvalContext::new(&item.value);
            let key = expr.eval(&ctx).and_then(|v| {
                MapKey::cast(&v, map.key_kind()).ok_or(EvalError::InvalidCastForMapKey)
            });
            match key {
                Ok(key) => match map.get(&key) {
                    Some(value) => {
                        queue.push(WorkItem::new(next, value.clone(), item.field.clone()));
                    }
                    None => trace!("map {} has no key {}", item.field_name(), key),
                },
                Err(e) => trace!("skipping [{}] on map {}: {}", expr, item.field_name(), e),
            }
        }
        Value::Bytes(bytes) => {
            let ctx = EvalContext::new(&item.value);
            let offset = match expr.static_type(&ctx) {
                Ok(Type::Int) => expr.eval(&ctx).and_then(|v| index_of(&v, bytes.len())),
                Ok(t) => Err(EvalError::TypeMismatch(format!("bytes index must be int, got {}", t))),
                Err(e) => Err(e),
            };
            match offset {
                Ok(i) => {
                    queue.push(WorkItem::new(next, Value::Uint(bytes[i].into()), None));
                }
                Err(e) => trace!("skipping [{}] on bytes {}: {}", expr, item.field_name(), e),
            }
        }
        // A single record is only ever tested for field presence
        value => {
            let ctx = EvalContext::new(value).with_enforce_bool(true);
            match expr.eval(&ctx) {
                Ok(Value::Bool(true)) => {
                    queue.push(WorkItem::new(next, value.clone(), item.field.clone()));
                }
                Ok(Value::Bool(false)) => {}
                Ok(other) => trace!(
                    "skipping [{}] on {}: predicate yielded {}",
                    expr,
                    value.kind_name(),
                    other.kind_name()
                ),
                Err(e) => trace!("skipping [{}] on {}: {}", expr, value.kind_name(), e),
            }
        }
    }
}

/// Key step over a list: a boolean expression filters the elements, an
/// integer one picks a single element.
fn key_list(expr: &Expr, item: &WorkItem, list: &List, next: usize, queue: &mut QueueOnce<WorkItem>) {
    let ctx = EvalContext::new(&item.value)
        .with_enforce_bool(expr.is_pure_boolean_property_expression());

    match expr.static_type(&ctx) {
        Ok(Type::Bool) => {
            let mut kept = Vec::new();
            for (i, element) in list.iter().enumerate() {
                match expr.eval(&ctx.with_index(element, i)) {
                    Ok(Value::Bool(true)) => kept.push(element.clone()),
                    Ok(_) => {}
                    Err(e) => trace!("element {} of {} dropped: {}", i, item.field_name(), e),
                }
            }
            if !kept.is_empty() {
                queue.push(WorkItem::new(next, Value::List(List::new(kept)), item.field.clone()));
            }
        }
        Ok(Type::Int) => match expr.eval(&ctx).and_then(|v| index_of(&v, list.len())) {
            Ok(i) => {
                if let Some(element) = list.get(i) {
                    queue.push(WorkItem::new(next, element.clone(), item.field.clone()));
                }
            }
            Err(e) => trace!("skipping [{}] on {}: {}", expr, item.field_name(), e),
        },
        Ok(t) => trace!("skipping [{}] on {}: {} key", expr, item.field_name(), t),
        Err(e) => trace!("skipping [{}] on {}: {}", expr, item.field_name(), e),
    }
}

/// Checks an evaluated index against a collection length.
fn index_of(value: &Value, len: usize) -> Result<usize, EvalError> {
    let n = value
        .as_int()
        .ok_or_else(|| EvalError::TypeMismatch(format!("index must be int, got {}", value.kind_name())))?;
    usize::try_from(n)
        .ok()
        .filter(|i| *i < len)
        .ok_or(EvalError::IndexOutOfRange)
}

/// Recursive descent: a record continues to the next step itself, and every
/// record-shaped value below it is revisited at the same step.
fn descend(item: &WorkItem, queue: &mut QueueOnce<WorkItem>) {
    let here = item.step;
    match &item.value {
        Value::Message(record) => {
            queue.push(WorkItem::new(here + 1, item.value.clone(), item.field.clone()));
            for fd in record.descriptor().fields() {
                if !record.has(fd) {
                    continue;
                }
                if let Some(value) = record.get(fd) {
                    if value.is_recursable() {
                        queue.push(WorkItem::new(here, value, Some(Arc::clone(fd))));
                    }
                }
            }
        }
        Value::List(list) => {
            for element in list.iter().filter(|v| v.is_recursable()) {
                queue.push(WorkItem::new(here, element.clone(), item.field.clone()));
            }
        }
        Value::Map(map) => {
            for value in map.values().filter(|v| v.is_recursable()) {
                queue.push(WorkItem::new(here, value.clone(), item.field.clone()));
            }
        }
        _ => {}
    }
}
