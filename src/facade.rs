use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use layerconf_core::manager::ObserverCallback;
use layerconf_core::{Bag, ConfigError, Manager, Value};
use layerconf_drivers::{Parser, Registry};
use serde::de::DeserializeOwned;

/// The public entry point applications build against.
///
/// `Facade` is a thin pass-through over [`Manager`] and the parser
/// registry: every method here either forwards directly to one of them or,
/// for the typed accessors, takes a snapshot of the current aggregate and
/// delegates to [`Bag`]'s accessor of the same name. It exists so
/// application code depends on one small, stable surface instead of
/// reaching into the manager and the parser registry separately, and
/// contains no logic of its own.
#[derive(Clone)]
pub struct Facade {
    manager: Arc<Manager>,
    parsers: Arc<Mutex<Registry<Box<dyn Parser>>>>,
}

impl Facade {
    pub fn new(manager: Arc<Manager>, parsers: Arc<Mutex<Registry<Box<dyn Parser>>>>) -> Self {
        Self { manager, parsers }
    }

    pub fn has(&self, path: &str) -> bool {
        !matches!(self.manager.get(path), Value::Null)
    }

    pub fn get(&self, path: &str) -> Value {
        self.manager.get(path)
    }

    pub fn bool(&self, path: &str, default: bool) -> bool {
        self.manager.snapshot().bool(path, default)
    }

    pub fn int(&self, path: &str, default: i64) -> i64 {
        self.manager.snapshot().int(path, default)
    }

    pub fn int8(&self, path: &str, default: i8) -> i8 {
        self.manager.snapshot().int8(path, default)
    }

    pub fn int16(&self, path: &str, default: i16) -> i16 {
        self.manager.snapshot().int16(path, default)
    }

    pub fn int32(&self, path: &str, default: i32) -> i32 {
        self.manager.snapshot().int32(path, default)
    }

    pub fn int64(&self, path: &str, default: i64) -> i64 {
        self.manager.snapshot().int64(path, default)
    }

    pub fn uint(&self, path: &str, default: u64) -> u64 {
        self.manager.snapshot().uint(path, default)
    }

    pub fn uint8(&self, path: &str, default: u8) -> u8 {
        self.manager.snapshot().uint8(path, default)
    }

    pub fn uint16(&self, path: &str, default: u16) -> u16 {
        self.manager.snapshot().uint16(path, default)
    }

    pub fn uint32(&self, path: &str, default: u32) -> u32 {
        self.manager.snapshot().uint32(path, default)
    }

    pub fn uint64(&self, path: &str, default: u64) -> u64 {
        self.manager.snapshot().uint64(path, default)
    }

    pub fn float32(&self, path: &str, default: f32) -> f32 {
        self.manager.snapshot().float32(path, default)
    }

    pub fn float64(&self, path: &str, default: f64) -> f64 {
        self.manager.snapshot().float64(path, default)
    }

    pub fn string(&self, path: &str, default: &str) -> String {
        self.manager.snapshot().string(path, default)
    }

    pub fn map_any(&self, path: &str, default: BTreeMap<String, Value>) -> BTreeMap<String, Value> {
        self.manager.snapshot().map_any(path, default)
    }

    pub fn map_string(&self, path: &str, default: BTreeMap<String, String>) -> BTreeMap<String, String> {
        self.manager.snapshot().map_string(path, default)
    }

    pub fn seq(&self, path: &str, default: Vec<Value>) -> Vec<Value> {
        self.manager.snapshot().seq(path, default)
    }

    pub fn string_seq(&self, path: &str, default: Vec<String>) -> Vec<String> {
        self.manager.snapshot().string_seq(path, default)
    }

    pub fn duration(&self, path: &str, default: Duration) -> Duration {
        self.manager.snapshot().duration(path, default)
    }

    pub fn bag(&self, path: &str, default: Bag) -> Bag {
        self.manager.snapshot().bag(path, default)
    }

    pub fn populate<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConfigError> {
        self.manager.snapshot().populate(path)
    }

    pub fn set(&self, path: &str, value: Value) -> Result<(), ConfigError> {
        self.manager.set(path, value)
    }

    pub fn has_source(&self, id: &str) -> bool {
        self.manager.has_source(id)
    }

    pub fn list_sources(&self) -> Vec<String> {
        self.manager.list_sources()
    }

    pub fn source_priority(&self, id: &str) -> Result<i64, ConfigError> {
        self.manager.source_priority(id)
    }

    pub fn add_source(&self, id: impl Into<String>, source: Box<dyn layerconf_core::Source>) -> Result<(), ConfigError> {
        self.manager.add_source(id, source)
    }

    pub fn set_source_priority(&self, id: &str, priority: i64) -> Result<(), ConfigError> {
        self.manager.set_source_priority(id, priority)
    }

    pub fn remove_source(&self, id: &str) -> Result<(), ConfigError> {
        self.manager.remove_source(id)
    }

    pub fn remove_all_sources(&self) -> Result<(), ConfigError> {
        self.manager.remove_all_sources()
    }

    pub fn reload_sources(&self) -> Result<(), ConfigError> {
        self.manager.reload_sources()
    }

    pub fn has_observer(&self, id: &str, path: &str) -> bool {
        self.manager.has_observer(id, path)
    }

    pub fn add_observer(
        &self,
        id: impl Into<String>,
        path: impl Into<String>,
        callback: ObserverCallback,
    ) -> Result<(), ConfigError> {
        self.manager.add_observer(id, path, callback)
    }

    pub fn remove_observer(&self, id: &str) {
        self.manager.remove_observer(id);
    }

    pub fn has_parser(&self, id: &str) -> bool {
        self.parsers.lock().expect("parser registry mutex poisoned").has(id)
    }

    pub fn list_parsers(&self) -> Vec<String> {
        self.parsers.lock().expect("parser registry mutex poisoned").list()
    }

    pub fn add_parser(&self, id: impl Into<String>, parser: Box<dyn Parser>) -> Result<(), ConfigError> {
        self.parsers.lock().expect("parser registry mutex poisoned").add(id, parser)
    }

    /// Resolves the parser registered or declared for `id` and runs `f`
    /// against it under the registry lock. Stands in for a bare `get` pass-
    /// through: `Registry::get` returns `&Box<dyn Parser>` borrowed from a
    /// `MutexGuard`, which can't escape this method, so the callback takes
    /// the reference instead of trying to return it.
    pub fn with_parser<R>(&self, id: &str, f: impl FnOnce(&dyn Parser) -> R) -> Result<R, ConfigError> {
        let mut parsers = self.parsers.lock().expect("parser registry mutex poisoned");
        let parser = parsers.get(id)?;
        Ok(f(parser.as_ref()))
    }
}
