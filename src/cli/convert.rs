//! JSON to record conversion
//!
//! A JSON document carries no schema, so one is inferred first: every object
//! becomes a message type named after its path (`Root`, `Root.books`, ...),
//! with the fields of all objects seen at that path merged together.

use std::{collections::HashMap, sync::Arc};

use serde_json::{Map as JsonMap, Value as Json};

use super::CliError;
use crate::{
    record::{FieldDescriptor, FieldKind, List, Message, MessageDescriptor},
    value::Value,
};

const ROOT_TYPE: &str = "Root";

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Bool,
    String,
    Int,
    Uint,
    Float,
    Object(ObjectShape),
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ObjectShape {
    /// Fields in order of first appearance
    fields: Vec<(String, FieldShape)>,
}

#[derive(Debug, Clone, PartialEq)]
struct FieldShape {
    repeated: bool,
    /// `None` while only empty arrays have been seen
    element: Option<Shape>,
}

impl ObjectShape {
    fn infer(obj: &JsonMap<String, Json>, path: &str) -> Result<Self, CliError> {
        let mut shape = ObjectShape::default();
        for (name, json) in obj {
            let field_path = format!("{}.{}", path, name);
            let field = match json {
                Json::Null => continue,
                Json::Array(items) => {
                    let mut element = None;
                    for item in items {
                        element = merge(element, infer(item, &field_path)?, &field_path)?;
                    }
                    FieldShape {
                        repeated: true,
                        element,
                    }
                }
                other => FieldShape {
                    repeated: false,
                    element: infer(other, &field_path)?,
                },
            };
            shape.add(name, field, &field_path)?;
        }
        Ok(shape)
    }

    fn add(&mut self, name: &str, field: FieldShape, path: &str) -> Result<(), CliError> {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => {
                if existing.repeated != field.repeated {
                    return Err(CliError::UnsupportedJson(format!(
                        "'{}' is both a list and a single value",
                        path
                    )));
                }
                existing.element = merge(existing.element.take(), field.element, path)?;
            }
            None => self.fields.push((name.to_string(), field)),
        }
        Ok(())
    }
}

/// Shape of a non-array value; `None` for null.
fn infer(json: &Json, path: &str) -> Result<Option<Shape>, CliError> {
    let shape = match json {
        Json::Null => return Ok(None),
        Json::Bool(_) => Shape::Bool,
        Json::String(_) => Shape::String,
        Json::Number(n) if n.is_i64() => Shape::Int,
        Json::Number(n) if n.is_u64() => Shape::Uint,
        Json::Number(_) => Shape::Float,
        Json::Object(obj) => Shape::Object(ObjectShape::infer(obj, path)?),
        Json::Array(_) => {
            return Err(CliError::UnsupportedJson(format!(
                "nested array at '{}'",
                path
            )));
        }
    };
    Ok(Some(shape))
}

fn merge(a: Option<Shape>, b: Option<Shape>, path: &str) -> Result<Option<Shape>, CliError> {
    let merged = match (a, b) {
        (None, s) | (s, None) => return Ok(s),
        (Some(Shape::Object(mut a)), Some(Shape::Object(b))) => {
            for (name, field) in b.fields {
                let field_path = format!("{}.{}", path, name);
                a.add(&name, field, &field_path)?;
            }
            Shape::Object(a)
        }
        (Some(a), Some(b)) if a == b => a,
        // Mixed numbers widen to float
        (
            Some(Shape::Int | Shape::Uint | Shape::Float),
            Some(Shape::Int | Shape::Uint | Shape::Float),
        ) => Shape::Float,
        (Some(_), Some(_)) => {
            return Err(CliError::UnsupportedJson(format!(
                "'{}' holds values of different kinds",
                path
            )));
        }
    };
    Ok(Some(merged))
}

/// Declares the message type for `shape` and, first, every type nested in it.
fn declare(
    shape: &ObjectShape,
    type_name: &str,
    types: &mut HashMap<String, Arc<MessageDescriptor>>,
) -> Result<Arc<MessageDescriptor>, CliError> {
    let mut builder = MessageDescriptor::builder(type_name);
    for (name, field) in &shape.fields {
        let kind = match &field.element {
            None | Some(Shape::String) => FieldKind::String,
            Some(Shape::Bool) => FieldKind::Bool,
            Some(Shape::Int) => FieldKind::Int,
            Some(Shape::Uint) => FieldKind::Uint,
            Some(Shape::Float) => FieldKind::Float,
            Some(Shape::Object(nested)) => {
                let nested_name = format!("{}.{}", type_name, name);
                declare(nested, &nested_name, types)?;
                FieldKind::Message(nested_name)
            }
        };
        builder = if field.repeated {
            builder.repeated(name.clone(), kind)
        } else {
            builder.field(name.clone(), kind)
        };
    }

    let descriptor = builder.build()?;
    types.insert(type_name.to_string(), Arc::clone(&descriptor));
    Ok(descriptor)
}

fn build(
    obj: &JsonMap<String, Json>,
    descriptor: &Arc<MessageDescriptor>,
    types: &HashMap<String, Arc<MessageDescriptor>>,
) -> Result<Message, CliError> {
    let mut builder = Message::builder(descriptor);
    for (name, json) in obj {
        let Some(fd) = descriptor.field(name) else {
            continue;
        };
        let value = match json {
            Json::Null => continue,
            Json::Array(items) => Value::List(
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| element(item, fd, types))
                    .collect::<Result<List, _>>()?,
            ),
            other => element(other, fd, types)?,
        };
        builder = builder.set(name, value);
    }
    Ok(builder.build()?)
}

fn element(
    json: &Json,
    fd: &FieldDescriptor,
    types: &HashMap<String, Arc<MessageDescriptor>>,
) -> Result<Value, CliError> {
    let unsupported = || {
        CliError::UnsupportedJson(format!("{} does not fit field '{}'", json, fd.name()))
    };

    match (fd.kind(), json) {
        (FieldKind::Message(type_name), Json::Object(obj)) => {
            let descriptor = types.get(type_name).ok_or_else(unsupported)?;
            Ok(Value::Message(build(obj, descriptor, types)?))
        }
        (FieldKind::Float, Json::Number(n)) => n.as_f64().map(Value::Float).ok_or_else(unsupported),
        (FieldKind::Int, Json::Number(n)) => n.as_i64().map(Value::Int).ok_or_else(unsupported),
        (FieldKind::Uint, Json::Number(n)) => n.as_u64().map(Value::Uint).ok_or_else(unsupported),
        (FieldKind::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
        (FieldKind::String, Json::String(s)) => Ok(Value::String(s.clone())),
        _ => Err(unsupported()),
    }
}

/// Converts a JSON object into a message, inferring its schema.
///
/// # Examples
///
/// ```
/// use protoquery::cli::json_to_record;
///
/// let json = serde_json::json!({"books": [{"title": "A", "price": 30}]});
/// let root = json_to_record(json).unwrap();
/// assert_eq!(root.type_name(), "Root");
/// ```
pub fn json_to_record(json: Json) -> Result<Message, CliError> {
    let Json::Object(obj) = json else {
        return Err(CliError::UnsupportedJson(
            "the document root must be an object".to_string(),
        ));
    };

    let shape = ObjectShape::infer(&obj, ROOT_TYPE)?;
    let mut types = HashMap::new();
    let root = declare(&shape, ROOT_TYPE, &mut types)?;
    build(&obj, &root, &types)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_fields_merge_across_elements() {
        let root = json_to_record(json!({
            "books": [
                {"title": "A", "price": 30},
                {"title": "B", "price": 40.5, "isbn": "x"}
            ]
        }))
        .unwrap();

        let books = root.get_by_name("books").unwrap();
        let books = books.as_list().unwrap();
        assert_eq!(books.len(), 2);

        let first = books.get(0).and_then(Value::as_message).unwrap();
        assert_eq!(first.type_name(), "Root.books");
        // Int and Float prices widen to Float
        assert_eq!(first.get_by_name("price"), Some(Value::Float(30.0)));
        assert_eq!(first.get_by_name("isbn"), Some(Value::String(String::new())));
    }

    #[test]
    fn test_unsupported_documents() {
        assert!(matches!(
            json_to_record(json!([1, 2])),
            Err(CliError::UnsupportedJson(_))
        ));
        assert!(matches!(
            json_to_record(json!({"grid": [[1], [2]]})),
            Err(CliError::UnsupportedJson(_))
        ));
        assert!(matches!(
            json_to_record(json!({"mixed": [1, "one"]})),
            Err(CliError::UnsupportedJson(_))
        ));
    }

    #[test]
    fn test_nulls_are_skipped() {
        let root = json_to_record(json!({"name": "x", "gone": null})).unwrap();
        assert!(root.descriptor().field("gone").is_none());
        assert_eq!(root.get_by_name("name"), Some(Value::from("x")));
    }
}
