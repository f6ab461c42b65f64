//! JSON rendering of query results.
//!
//! Values are converted into [`serde_json::Value`] and printed either compact
//! or pretty. Output is deterministic: object keys come out sorted.
//!
//! - Messages become objects holding their present fields
//! - Enum fields render by symbolic name (unknown ordinals stay numbers)
//! - Bytes become arrays of numbers
//! - Map keys render as their text
//! - Non-finite floats become `null`
//!
//! # Examples
//!
//! ```
//! use protoquery::Value;
//! use protoquery::output::{to_json, to_json_pretty};
//!
//! let value = Value::Int(42);
//!
//! assert_eq!(to_json(&value), "42");
//! assert_eq!(to_json_pretty(&value), "42");
//! ```

use serde_json::{Map as JsonMap, Number, Value as Json};

use crate::{
    record::{FieldDescriptor, FieldKind},
    value::Value,
};

/// Converts a value into its JSON form.
pub fn to_json_value(value: &Value) -> Json {
    match value {
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(n) => Json::from(*n),
        Value::Uint(n) => Json::from(*n),
        Value::Float(n) => Number::from_f64(*n).map(Json::Number).unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(bytes) => Json::Array(bytes.iter().map(|b| Json::from(*b)).collect()),
        Value::List(list) => Json::Array(list.iter().map(to_json_value).collect()),
        Value::Map(map) => Json::Object(
            map.iter()
                .map(|(k, v)| (k.to_string(), to_json_value(v)))
                .collect(),
        ),
        Value::Message(record) => {
            let mut object = JsonMap::new();
            for fd in record.descriptor().fields() {
                if !record.has(fd) {
                    continue;
                }
                if let Some(v) = record.get(fd) {
                    object.insert(fd.name().to_string(), field_json(fd, &v));
                }
            }
            Json::Object(object)
        }
    }
}

/// Like [`to_json_value`], with enum ordinals read from `fd` replaced by names.
fn field_json(fd: &FieldDescriptor, value: &Value) -> Json {
    if !matches!(fd.kind(), FieldKind::Enum(_)) {
        return to_json_value(value);
    }
    let name = |v: &Value| match v {
        Value::Int(n) => fd
            .enum_name(*n)
            .map(|s| Json::String(s.to_string()))
            .unwrap_or_else(|| Json::from(*n)),
        other => to_json_value(other),
    };

    match value {
        Value::List(list) => Json::Array(list.iter().map(name).collect()),
        Value::Map(map) => Json::Object(map.iter().map(|(k, v)| (k.to_string(), name(v))).collect()),
        other => name(other),
    }
}

/// Converts a Value to compact JSON.
pub fn to_json(value: &Value) -> String {
    to_json_value(value).to_string()
}

/// Converts a Value to JSON with 2-space indentation.
pub fn to_json_pretty(value: &Value) -> String {
    format!("{:#}", to_json_value(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{EnumDescriptor, Message, MessageDescriptor};

    #[test]
    fn test_message_renders_present_fields() {
        let color = EnumDescriptor::new("Color", [("RED", 0), ("BLUE", 1)]);
        let desc = MessageDescriptor::builder("Item")
            .field("name", FieldKind::String)
            .field("count", FieldKind::Int)
            .field("color", FieldKind::Enum(color))
            .build()
            .unwrap();
        let item = Message::builder(&desc)
            .set("name", "pen")
            .set("color", "BLUE")
            .build()
            .unwrap();

        assert_eq!(
            to_json(&Value::Message(item)),
            r#"{"color":"BLUE","name":"pen"}"#
        );
    }

    #[test]
    fn test_bytes_and_floats() {
        assert_eq!(to_json(&Value::Bytes(vec![1, 2])), "[1,2]");
        assert_eq!(to_json(&Value::Float(f64::NAN)), "null");
        assert_eq!(to_json(&Value::Uint(7)), "7");
    }
}
