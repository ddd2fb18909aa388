use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::ConfigError;

/// A single node in the config value tree.
///
/// Mirrors the handful of shapes a JSON or YAML document can hold, plus
/// `Map` for nesting. There is exactly one integer and one floating-point
/// variant — width-specific accessors on [`Bag`] narrow from these rather
/// than the tree carrying a variant per Rust integer type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Seq(Vec<Value>),
    Map(Bag),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Seq(v)
    }
}

impl From<Bag> for Value {
    fn from(v: Bag) -> Self {
        Value::Map(v)
    }
}

/// A case-insensitive, string-keyed tree of [`Value`]s.
///
/// Backed by a `BTreeMap` rather than a `HashMap` so that `entries()` and any
/// future `Display` impl iterate deterministically; the data model does not
/// promise sibling order, a `BTreeMap` just happens to give that for free.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bag(BTreeMap<String, Value>);

impl Bag {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn from_map(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }

    /// Top-level key names, lowercased (keys are always stored lowercased).
    pub fn entries(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Inserts a top-level entry, lowercasing the key. Does not traverse
    /// dotted paths — see [`Bag::set`] for that.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into().to_lowercase(), value);
    }

    pub fn has(&self, path: &str) -> bool {
        !matches!(self.get(path), Value::Null)
    }

    /// Resolves a dotted path, returning `Value::Null` if any segment is
    /// missing or traverses a non-mapping value. `""` returns the whole
    /// tree as a `Value::Map`.
    pub fn get(&self, path: &str) -> Value {
        if path.is_empty() {
            return Value::Map(self.clone());
        }
        self.lookup_ref(path).cloned().unwrap_or(Value::Null)
    }

    pub fn get_or(&self, path: &str, default: Value) -> Value {
        if path.is_empty() {
            return Value::Map(self.clone());
        }
        self.lookup_ref(path).cloned().unwrap_or(default)
    }

    fn lookup_ref(&self, path: &str) -> Option<&Value> {
        let segments: Vec<String> = path.split('.').map(|s| s.to_lowercase()).collect();
        let mut current = self;
        for (i, segment) in segments.iter().enumerate() {
            let value = current.0.get(segment)?;
            if i == segments.len() - 1 {
                return Some(value);
            }
            match value {
                Value::Map(nested) => current = nested,
                _ => return None,
            }
        }
        None
    }

    /// Writes a value at a dotted path, creating intermediate maps as
    /// needed. Fails with [`ConfigError::InvalidPath`] if `path` is empty or
    /// any intermediate segment already holds a non-mapping value.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), ConfigError> {
        if path.is_empty() {
            return Err(ConfigError::InvalidPath { path: path.to_string() });
        }
        let segments: Vec<String> = path.split('.').map(|s| s.to_lowercase()).collect();
        let mut current = &mut self.0;
        for (i, segment) in segments.iter().enumerate() {
            if i == segments.len() - 1 {
                current.insert(segment.clone(), value);
                return Ok(());
            }
            let entry = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Map(Bag::new()));
            match entry {
                Value::Map(nested) => current = &mut nested.0,
                _ => return Err(ConfigError::InvalidPath { path: path.to_string() }),
            }
        }
        unreachable!("segments is non-empty for a non-empty path")
    }

    /// Deep-merges `overlay` on top of `self`: nested maps merge
    /// recursively, any other pairing is replaced wholesale by the overlay's
    /// value (sequences and scalars are never spliced).
    pub fn merge(&mut self, overlay: &Bag) {
        for (key, value) in overlay.0.iter() {
            match (self.0.get_mut(key), value) {
                (Some(Value::Map(base)), Value::Map(overlay_map)) => {
                    base.merge(overlay_map);
                }
                _ => {
                    self.0.insert(key.clone(), value.clone());
                }
            }
        }
    }

    pub fn bool(&self, path: &str, default: bool) -> bool {
        match self.get(path) {
            Value::Bool(b) => b,
            _ => default,
        }
    }

    pub fn int64(&self, path: &str, default: i64) -> i64 {
        self.int(path, default)
    }

    pub fn int(&self, path: &str, default: i64) -> i64 {
        match self.get(path) {
            Value::Int(i) => i,
            _ => default,
        }
    }

    pub fn int8(&self, path: &str, default: i8) -> i8 {
        self.narrow_int(path, default)
    }

    pub fn int16(&self, path: &str, default: i16) -> i16 {
        self.narrow_int(path, default)
    }

    pub fn int32(&self, path: &str, default: i32) -> i32 {
        self.narrow_int(path, default)
    }

    pub fn uint(&self, path: &str, default: u64) -> u64 {
        self.narrow_int(path, default)
    }

    pub fn uint8(&self, path: &str, default: u8) -> u8 {
        self.narrow_int(path, default)
    }

    pub fn uint16(&self, path: &str, default: u16) -> u16 {
        self.narrow_int(path, default)
    }

    pub fn uint32(&self, path: &str, default: u32) -> u32 {
        self.narrow_int(path, default)
    }

    pub fn uint64(&self, path: &str, default: u64) -> u64 {
        self.narrow_int(path, default)
    }

    fn narrow_int<T: TryFrom<i64>>(&self, path: &str, default: T) -> T {
        match self.get(path) {
            Value::Int(i) => T::try_from(i).unwrap_or(default),
            _ => default,
        }
    }

    pub fn float64(&self, path: &str, default: f64) -> f64 {
        match self.get(path) {
            Value::Float(f) => f,
            _ => default,
        }
    }

    pub fn float32(&self, path: &str, default: f32) -> f32 {
        match self.get(path) {
            #[allow(clippy::cast_possible_truncation)]
            Value::Float(f) => f as f32,
            _ => default,
        }
    }

    pub fn string(&self, path: &str, default: &str) -> String {
        match self.get(path) {
            Value::String(s) => s,
            _ => default.to_string(),
        }
    }

    /// `string -> Value` sub-mapping accessor (the Go model's `StringMap`).
    pub fn map_any(&self, path: &str, default: BTreeMap<String, Value>) -> BTreeMap<String, Value> {
        match self.get(path) {
            Value::Map(bag) => bag.0,
            _ => default,
        }
    }

    /// `string -> string` sub-mapping accessor. Entries whose value is not a
    /// string are dropped rather than failing the whole accessor.
    pub fn map_string(
        &self,
        path: &str,
        default: BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        match self.get(path) {
            Value::Map(bag) => bag
                .0
                .into_iter()
                .filter_map(|(k, v)| match v {
                    Value::String(s) => Some((k, s)),
                    _ => None,
                })
                .collect(),
            _ => default,
        }
    }

    pub fn seq(&self, path: &str, default: Vec<Value>) -> Vec<Value> {
        match self.get(path) {
            Value::Seq(items) => items,
            _ => default,
        }
    }

    /// Entries that are not strings are dropped, matching [`Bag::map_string`].
    pub fn string_seq(&self, path: &str, default: Vec<String>) -> Vec<String> {
        match self.get(path) {
            Value::Seq(items) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => default,
        }
    }

    /// A duration accessor is the one typed accessor that does not require
    /// an exact stored type: an integer value is read as milliseconds.
    pub fn duration(&self, path: &str, default: Duration) -> Duration {
        match self.get(path) {
            Value::Int(ms) if ms >= 0 => Duration::from_millis(ms as u64),
            _ => default,
        }
    }

    /// Sub-tree accessor: returns a nested mapping as a [`Bag`] rather than
    /// an untyped `string -> Value` map, for callers that want to keep
    /// operating in the typed API (see [`Bag::map_any`] for the untyped
    /// form).
    pub fn bag(&self, path: &str, default: Bag) -> Bag {
        match self.get(path) {
            Value::Map(bag) => bag,
            _ => default,
        }
    }

    /// Deserializes the value at `path` (or the whole tree, for `""`) into
    /// `T` via `serde`, the idiomatic substitute for the original's
    /// reflection-based struct population.
    pub fn populate<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConfigError> {
        let value = if path.is_empty() {
            Value::Map(self.clone())
        } else {
            self.lookup_ref(path)
                .cloned()
                .ok_or_else(|| ConfigError::InvalidPath { path: path.to_string() })?
        };
        let json = to_json(&value);
        serde_json::from_value(json).map_err(|e| ConfigError::Parser {
            context: format!("populating from path {path:?}"),
            detail: e.to_string(),
        })
    }
}

fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Seq(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Map(bag) => {
            serde_json::Value::Object(bag.0.iter().map(|(k, v)| (k.clone(), to_json(v))).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_is_case_insensitive_and_dotted() {
        let mut bag = Bag::new();
        bag.set("Db.Host", Value::String("localhost".into())).unwrap();
        assert_eq!(bag.get("db.host"), Value::String("localhost".into()));
        assert_eq!(bag.get("DB.HOST"), Value::String("localhost".into()));
    }

    #[test]
    fn set_rejects_empty_path() {
        let mut bag = Bag::new();
        assert!(matches!(
            bag.set("", Value::Bool(true)),
            Err(ConfigError::InvalidPath { .. })
        ));
    }

    #[test]
    fn set_rejects_write_through_non_map() {
        let mut bag = Bag::new();
        bag.set("db", Value::Int(1)).unwrap();
        assert!(matches!(
            bag.set("db.host", Value::String("x".into())),
            Err(ConfigError::InvalidPath { .. })
        ));
    }

    #[test]
    fn merge_overlay_wins_on_scalars_and_recurses_into_maps() {
        let mut base = Bag::new();
        base.set("db.host", Value::String("base".into())).unwrap();
        base.set("db.port", Value::Int(1)).unwrap();
        base.set("list", Value::Seq(vec![Value::Int(1)])).unwrap();

        let mut overlay = Bag::new();
        overlay.set("db.host", Value::String("overlay".into())).unwrap();
        overlay.set("list", Value::Seq(vec![Value::Int(2)])).unwrap();

        base.merge(&overlay);
        assert_eq!(base.get("db.host"), Value::String("overlay".into()));
        assert_eq!(base.get("db.port"), Value::Int(1));
        assert_eq!(base.get("list"), Value::Seq(vec![Value::Int(2)]));
    }

    #[test]
    fn missing_path_returns_default() {
        let bag = Bag::new();
        assert_eq!(bag.int("missing", 7), 7);
        assert!(!bag.has("missing"));
    }

    #[test]
    fn duration_reads_milliseconds_from_int() {
        let mut bag = Bag::new();
        bag.set("timeout", Value::Int(1500)).unwrap();
        assert_eq!(bag.duration("timeout", Duration::ZERO), Duration::from_millis(1500));
    }
}
