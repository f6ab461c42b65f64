use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    record::{MapKeyKind, RecordError},
    value::Value,
};

static NEXT_VALUE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a message, list or map.
///
/// Allocated once when the value is constructed and shared by every clone of
/// it, so two paths reaching the same subtree observe the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(u64);

impl ValueId {
    pub(crate) fn next() -> Self {
        ValueId(NEXT_VALUE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The values of a repeated field.
#[derive(Clone)]
pub struct List(Arc<ListData>);

struct ListData {
    id: ValueId,
    items: Vec<Value>,
}

impl List {
    pub fn new(items: Vec<Value>) -> Self {
        List(Arc::new(ListData {
            id: ValueId::next(),
            items,
        }))
    }

    pub fn id(&self) -> ValueId {
        self.0.id
    }

    pub fn len(&self) -> usize {
        self.0.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.items.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0.items
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        List::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.items == other.0.items
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.items.iter()).finish()
    }
}

/// A map key. Ordered so that map traversal is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    Uint(u64),
    String(String),
}

impl MapKey {
    pub fn kind(&self) -> MapKeyKind {
        match self {
            MapKey::Bool(_) => MapKeyKind::Bool,
            MapKey::Int(_) => MapKeyKind::Int,
            MapKey::Uint(_) => MapKeyKind::Uint,
            MapKey::String(_) => MapKeyKind::String,
        }
    }

    /// Converts an evaluated expression value into a key of the given kind.
    ///
    /// Integers cross between signed and unsigned when the value fits; every
    /// other combination has no key form.
    pub fn cast(value: &Value, kind: MapKeyKind) -> Option<MapKey> {
        match (value, kind) {
            (Value::Bool(b), MapKeyKind::Bool) => Some(MapKey::Bool(*b)),
            (Value::String(s), MapKeyKind::String) => Some(MapKey::String(s.clone())),
            (Value::Int(n), MapKeyKind::Int) => Some(MapKey::Int(*n)),
            (Value::Int(n), MapKeyKind::Uint) => u64::try_from(*n).ok().map(MapKey::Uint),
            (Value::Uint(n), MapKeyKind::Uint) => Some(MapKey::Uint(*n)),
            (Value::Uint(n), MapKeyKind::Int) => i64::try_from(*n).ok().map(MapKey::Int),
            _ => None,
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Bool(b) => write!(f, "{}", b),
            MapKey::Int(n) => write!(f, "{}", n),
            MapKey::Uint(n) => write!(f, "{}", n),
            MapKey::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        MapKey::String(s.to_string())
    }
}

impl From<String> for MapKey {
    fn from(s: String) -> Self {
        MapKey::String(s)
    }
}

impl From<i64> for MapKey {
    fn from(n: i64) -> Self {
        MapKey::Int(n)
    }
}

impl From<u64> for MapKey {
    fn from(n: u64) -> Self {
        MapKey::Uint(n)
    }
}

impl From<bool> for MapKey {
    fn from(b: bool) -> Self {
        MapKey::Bool(b)
    }
}

/// The entries of a map field.
#[derive(Clone)]
pub struct Map(Arc<MapData>);

struct MapData {
    id: ValueId,
    key_kind: MapKeyKind,
    entries: BTreeMap<MapKey, Value>,
}

impl Map {
    /// Builds a map, checking every key against the declared key kind.
    pub fn new<I, K>(key_kind: MapKeyKind, entries: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<MapKey>,
    {
        let mut map = BTreeMap::new();
        for (key, value) in entries {
            let key = key.into();
            if key.kind() != key_kind {
                return Err(RecordError::KindMismatch {
                    field: key.to_string(),
                    expected: format!("{} map key", key_kind),
                    found: map_key_kind_name(key.kind()),
                });
            }
            map.insert(key, value);
        }
        Ok(Self::from_parts(key_kind, map))
    }

    pub(crate) fn from_parts(key_kind: MapKeyKind, entries: BTreeMap<MapKey, Value>) -> Self {
        Map(Arc::new(MapData {
            id: ValueId::next(),
            key_kind,
            entries,
        }))
    }

    pub fn id(&self) -> ValueId {
        self.0.id
    }

    pub fn key_kind(&self) -> MapKeyKind {
        self.0.key_kind
    }

    pub fn len(&self) -> usize {
        self.0.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.entries.is_empty()
    }

    pub fn get(&self, key: &MapKey) -> Option<&Value> {
        self.0.entries.get(key)
    }

    pub fn contains_key(&self, key: &MapKey) -> bool {
        self.0.entries.contains_key(key)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&MapKey, &Value)> {
        self.0.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.entries.values()
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.key_kind == other.0.key_kind && self.0.entries == other.0.entries)
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.entries.iter()).finish()
    }
}

fn map_key_kind_name(kind: MapKeyKind) -> &'static str {
    match kind {
        MapKeyKind::Bool => "bool",
        MapKeyKind::String => "string",
        MapKeyKind::Int => "int",
        MapKeyKind::Uint => "uint",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_identity() {
        let list = List::new(vec![Value::Int(1)]);
        let copy = list.clone();
        assert_eq!(list.id(), copy.id());

        let other = List::new(vec![Value::Int(1)]);
        assert_ne!(list.id(), other.id());
        assert_eq!(list, other);
    }

    #[test]
    fn test_map_key_cast() {
        assert_eq!(
            MapKey::cast(&Value::Int(3), MapKeyKind::Uint),
            Some(MapKey::Uint(3))
        );
        assert_eq!(MapKey::cast(&Value::Int(-3), MapKeyKind::Uint), None);
        assert_eq!(MapKey::cast(&Value::Float(1.0), MapKeyKind::Int), None);
        assert_eq!(
            MapKey::cast(&Value::String("k".into()), MapKeyKind::String),
            Some(MapKey::String("k".into()))
        );
        assert_eq!(MapKey::cast(&Value::String("1".into()), MapKeyKind::Int), None);
    }

    #[test]
    fn test_map_rejects_wrong_key_kind() {
        let result = Map::new(MapKeyKind::Int, vec![("a", Value::Int(1))]);
        assert!(matches!(result, Err(RecordError::KindMismatch { .. })));
    }

    #[test]
    fn test_map_iterates_in_key_order() {
        let map = Map::new(
            MapKeyKind::String,
            vec![("b", Value::Int(2)), ("a", Value::Int(1))],
        )
        .unwrap();
        let keys: Vec<String> = map.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
