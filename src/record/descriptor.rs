use std::{collections::HashMap, fmt, sync::Arc};

use crate::{record::RecordError, value::Value};

/// Kind of map keys. Protobuf only allows integral, boolean and string keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKeyKind {
    Bool,
    String,
    Int,
    Uint,
}

impl fmt::Display for MapKeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MapKeyKind::Bool => "bool",
            MapKeyKind::String => "string",
            MapKeyKind::Int => "int",
            MapKeyKind::Uint => "uint",
        };
        f.write_str(name)
    }
}

/// Kind of a single field value (or of each element, for repeated and map fields).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Bool,
    String,
    Int,
    Uint,
    Float,
    Bytes,
    Enum(Arc<EnumDescriptor>),
    /// A nested message, referenced by type name so that types may be recursive
    Message(String),
}

impl FieldKind {
    pub fn is_message(&self) -> bool {
        matches!(self, FieldKind::Message(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, FieldKind::Enum(_))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Bool => f.write_str("bool"),
            FieldKind::String => f.write_str("string"),
            FieldKind::Int => f.write_str("int"),
            FieldKind::Uint => f.write_str("uint"),
            FieldKind::Float => f.write_str("float"),
            FieldKind::Bytes => f.write_str("bytes"),
            FieldKind::Enum(e) => write!(f, "enum {}", e.name()),
            FieldKind::Message(name) => write!(f, "message {}", name),
        }
    }
}

/// How many values a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Singular,
    Repeated,
    Map(MapKeyKind),
}

/// A named enumeration: symbolic names mapped to ordinals.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDescriptor {
    name: String,
    values: Vec<(String, i32)>,
}

impl EnumDescriptor {
    pub fn new<N, V, S>(name: N, values: V) -> Arc<Self>
    where
        N: Into<String>,
        V: IntoIterator<Item = (S, i32)>,
        S: Into<String>,
    {
        Arc::new(EnumDescriptor {
            name: name.into(),
            values: values.into_iter().map(|(s, n)| (s.into(), n)).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Symbolic name of an ordinal, if one is declared.
    pub fn name_of(&self, ordinal: i64) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, n)| i64::from(*n) == ordinal)
            .map(|(s, _)| s.as_str())
    }

    pub fn ordinal_of(&self, name: &str) -> Option<i32> {
        self.values.iter().find(|(s, _)| s == name).map(|(_, n)| *n)
    }

    /// The first declared value is the default, as in proto3.
    pub fn default_ordinal(&self) -> i32 {
        self.values.first().map(|(_, n)| *n).unwrap_or(0)
    }
}

/// Description of one field of a message type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    index: usize,
    kind: FieldKind,
    cardinality: Cardinality,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the field in its message's declaration order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Kind of the value, or of each element for repeated and map fields.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn is_list(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }

    pub fn is_map(&self) -> bool {
        matches!(self.cardinality, Cardinality::Map(_))
    }

    /// Singular, non-message field.
    pub fn is_scalar(&self) -> bool {
        self.cardinality == Cardinality::Singular && !self.kind.is_message()
    }

    /// The proto3 zero value of a singular scalar field.
    ///
    /// Messages, repeated and map fields have no scalar default.
    pub fn default_value(&self) -> Option<Value> {
        if !self.is_scalar() {
            return None;
        }
        let value = match &self.kind {
            FieldKind::Bool => Value::Bool(false),
            FieldKind::String => Value::String(String::new()),
            FieldKind::Int => Value::Int(0),
            FieldKind::Uint => Value::Uint(0),
            FieldKind::Float => Value::Float(0.0),
            FieldKind::Bytes => Value::Bytes(Vec::new()),
            FieldKind::Enum(e) => Value::Int(e.default_ordinal().into()),
            FieldKind::Message(_) => return None,
        };
        Some(value)
    }

    /// Symbolic name of an enum ordinal stored in this field.
    pub fn enum_name(&self, ordinal: i64) -> Option<&str> {
        match &self.kind {
            FieldKind::Enum(e) => e.name_of(ordinal),
            _ => None,
        }
    }
}

/// Description of a message type: its name and ordered fields.
#[derive(Debug, PartialEq)]
pub struct MessageDescriptor {
    name: String,
    fields: Vec<Arc<FieldDescriptor>>,
    by_name: HashMap<String, usize>,
}

impl MessageDescriptor {
    pub fn builder(name: impl Into<String>) -> MessageDescriptorBuilder {
        MessageDescriptorBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[Arc<FieldDescriptor>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Arc<FieldDescriptor>> {
        self.by_name.get(name).map(|&ix| &self.fields[ix])
    }

    /// Fields matching a step name: an exact name, or every field for `*`.
    pub fn fields_by_name(&self, name: &str) -> Vec<&Arc<FieldDescriptor>> {
        if name == "*" {
            self.fields.iter().collect()
        } else {
            self.field(name).into_iter().collect()
        }
    }
}

/// Builder for [`MessageDescriptor`].
///
/// Declarations are collected in order; duplicates are reported by
/// [`MessageDescriptorBuilder::build`].
pub struct MessageDescriptorBuilder {
    name: String,
    fields: Vec<(String, FieldKind, Cardinality)>,
}

impl MessageDescriptorBuilder {
    /// Declare a singular field.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push((name.into(), kind, Cardinality::Singular));
        self
    }

    /// Declare a repeated field.
    pub fn repeated(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push((name.into(), kind, Cardinality::Repeated));
        self
    }

    /// Declare a map field.
    pub fn map(mut self, name: impl Into<String>, key: MapKeyKind, value: FieldKind) -> Self {
        self.fields.push((name.into(), value, Cardinality::Map(key)));
        self
    }

    pub fn build(self) -> Result<Arc<MessageDescriptor>, RecordError> {
        let mut by_name = HashMap::new();
        let mut fields = Vec::with_capacity(self.fields.len());

        for (index, (name, kind, cardinality)) in self.fields.into_iter().enumerate() {
            if by_name.insert(name.clone(), index).is_some() {
                return Err(RecordError::DuplicateField {
                    message: self.name,
                    field: name,
                });
            }
            fields.push(Arc::new(FieldDescriptor {
                name,
                index,
                kind,
                cardinality,
            }));
        }

        Ok(Arc::new(MessageDescriptor {
            name: self.name,
            fields,
            by_name,
        }))
    }
}
