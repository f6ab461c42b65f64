use std::{fmt, sync::Arc};

use crate::{
    record::{
        Cardinality, FieldDescriptor, FieldKind, List, Map, MessageDescriptor, RecordError,
        ValueId,
    },
    value::Value,
};

/// An immutable message: a descriptor plus one optional value per field.
#[derive(Clone)]
pub struct Message(Arc<MessageData>);

struct MessageData {
    id: ValueId,
    descriptor: Arc<MessageDescriptor>,
    values: Vec<Option<Value>>,
}

impl Message {
    pub fn builder(descriptor: &Arc<MessageDescriptor>) -> MessageBuilder {
        MessageBuilder {
            descriptor: Arc::clone(descriptor),
            values: vec![None; descriptor.fields().len()],
            error: None,
        }
    }

    /// A message with no field set.
    pub fn empty(descriptor: &Arc<MessageDescriptor>) -> Self {
        Message(Arc::new(MessageData {
            id: ValueId::next(),
            descriptor: Arc::clone(descriptor),
            values: vec![None; descriptor.fields().len()],
        }))
    }

    pub fn id(&self) -> ValueId {
        self.0.id
    }

    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.0.descriptor
    }

    pub fn type_name(&self) -> &str {
        self.0.descriptor.name()
    }

    /// Fields matching a name, or all fields for `*`.
    pub fn fields_by_name(&self, name: &str) -> Vec<&Arc<FieldDescriptor>> {
        self.0.descriptor.fields_by_name(name)
    }

    fn stored(&self, fd: &FieldDescriptor) -> Option<&Value> {
        let own = self.0.descriptor.fields().get(fd.index())?;
        if own.name() != fd.name() {
            return None;
        }
        self.0.values[fd.index()].as_ref()
    }

    /// Field presence with proto3 semantics: scalars are present when they
    /// differ from their zero value, repeated and map fields when non-empty,
    /// messages when set.
    pub fn has(&self, fd: &FieldDescriptor) -> bool {
        match self.stored(fd) {
            None => false,
            Some(Value::List(l)) => !l.is_empty(),
            Some(Value::Map(m)) => !m.is_empty(),
            Some(Value::Message(_)) => true,
            Some(v) => fd.default_value().as_ref() != Some(v),
        }
    }

    /// Whether any declared field is present.
    pub fn has_any(&self) -> bool {
        self.0.descriptor.fields().iter().any(|fd| self.has(fd))
    }

    /// Reads a field the way a generated getter would: unset scalars read as
    /// their default and unset repeated/map fields as empty collections. An
    /// unset message field has no value.
    pub fn get(&self, fd: &FieldDescriptor) -> Option<Value> {
        if let Some(value) = self.stored(fd) {
            return Some(value.clone());
        }
        match fd.cardinality() {
            Cardinality::Repeated => Some(Value::List(List::new(Vec::new()))),
            Cardinality::Map(key_kind) => Some(Value::Map(Map::from_parts(
                key_kind,
                Default::default(),
            ))),
            Cardinality::Singular => fd.default_value(),
        }
    }

    pub fn get_by_name(&self, name: &str) -> Option<Value> {
        let fd = self.0.descriptor.field(name)?;
        self.get(fd)
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.descriptor.name() == other.0.descriptor.name()
                && self.0.values == other.0.values)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.type_name());
        for (fd, value) in self.0.descriptor.fields().iter().zip(&self.0.values) {
            if let Some(value) = value {
                s.field(fd.name(), value);
            }
        }
        s.finish()
    }
}

/// Builder for [`Message`].
///
/// Values are checked against the field declarations as they are set; the
/// first problem is reported by [`MessageBuilder::build`].
pub struct MessageBuilder {
    descriptor: Arc<MessageDescriptor>,
    values: Vec<Option<Value>>,
    error: Option<RecordError>,
}

impl MessageBuilder {
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        if self.error.is_some() {
            return self;
        }
        let Some(fd) = self.descriptor.field(name) else {
            self.error = Some(RecordError::UnknownField {
                message: self.descriptor.name().to_string(),
                field: name.to_string(),
            });
            return self;
        };
        match check_field(fd, value.into()) {
            Ok(value) => self.values[fd.index()] = Some(value),
            Err(e) => self.error = Some(e),
        }
        self
    }

    pub fn build(self) -> Result<Message, RecordError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        Ok(Message(Arc::new(MessageData {
            id: ValueId::next(),
            descriptor: self.descriptor,
            values: self.values,
        })))
    }
}

fn check_field(fd: &FieldDescriptor, value: Value) -> Result<Value, RecordError> {
    match fd.cardinality() {
        Cardinality::Singular => check_element(fd, value),
        Cardinality::Repeated => match value {
            Value::List(list) => {
                let items = list
                    .iter()
                    .cloned()
                    .map(|v| check_element(fd, v))
                    .collect::<Result<Vec<_>, _>>()?;
                if items == list.as_slice() {
                    Ok(Value::List(list))
                } else {
                    Ok(Value::List(List::new(items)))
                }
            }
            other => Err(mismatch(fd, "list", &other)),
        },
        Cardinality::Map(key_kind) => match value {
            Value::Map(map) if map.key_kind() == key_kind => {
                for v in map.values() {
                    check_element(fd, v.clone())?;
                }
                Ok(Value::Map(map))
            }
            other => Err(mismatch(fd, &format!("map<{}, {}>", key_kind, fd.kind()), &other)),
        },
    }
}

/// Checks one value against the field's element kind, normalizing the
/// conversions that lose nothing (enum names to ordinals, ints between widths).
fn check_element(fd: &FieldDescriptor, value: Value) -> Result<Value, RecordError> {
    let expected = fd.kind().to_string();
    match (fd.kind(), value) {
        (FieldKind::Bool, v @ Value::Bool(_)) => Ok(v),
        (FieldKind::String, v @ Value::String(_)) => Ok(v),
        (FieldKind::Bytes, v @ Value::Bytes(_)) => Ok(v),
        (FieldKind::Int, v @ Value::Int(_)) => Ok(v),
        (FieldKind::Int, Value::Uint(n)) => i64::try_from(n)
            .map(Value::Int)
            .map_err(|_| mismatch(fd, &expected, &Value::Uint(n))),
        (FieldKind::Uint, v @ Value::Uint(_)) => Ok(v),
        (FieldKind::Uint, Value::Int(n)) => u64::try_from(n)
            .map(Value::Uint)
            .map_err(|_| mismatch(fd, &expected, &Value::Int(n))),
        (FieldKind::Float, v @ Value::Float(_)) => Ok(v),
        (FieldKind::Float, Value::Int(n)) => Ok(Value::Float(n as f64)),
        (FieldKind::Enum(_), v @ Value::Int(_)) => Ok(v),
        (FieldKind::Enum(e), Value::String(name)) => match e.ordinal_of(&name) {
            Some(n) => Ok(Value::Int(n.into())),
            None => Err(mismatch(fd, &expected, &Value::String(name))),
        },
        (FieldKind::Message(type_name), Value::Message(m)) if m.type_name() == type_name => {
            Ok(Value::Message(m))
        }
        (_, other) => Err(mismatch(fd, &expected, &other)),
    }
}

fn mismatch(fd: &FieldDescriptor, expected: &str, found: &Value) -> RecordError {
    RecordError::KindMismatch {
        field: fd.name().to_string(),
        expected: expected.to_string(),
        found: found.kind_name(),
    }
}
