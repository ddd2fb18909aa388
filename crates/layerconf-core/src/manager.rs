use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::source::Source;
use crate::value::{Bag, Value};

/// An observer callback: invoked with `(old, new)` whenever its watched path
/// changes to a non-null value different from what was last observed.
pub type ObserverCallback = Box<dyn Fn(&Value, &Value) + Send>;

struct SourceRecord {
    id: String,
    source: Box<dyn Source>,
}

struct ObserverRecord {
    current: Value,
    callbacks: HashMap<String, ObserverCallback>,
}

struct ManagerState {
    sources: Vec<SourceRecord>,
    observers: HashMap<String, ObserverRecord>,
    aggregate: Bag,
    local: Bag,
}

impl ManagerState {
    fn new() -> Self {
        Self {
            sources: Vec::new(),
            observers: HashMap::new(),
            aggregate: Bag::new(),
            local: Bag::new(),
        }
    }

    /// Recomputes the aggregate from every source (ascending priority, ties
    /// broken by insertion order) with the local overlay applied last, then
    /// fires any observer whose watched path changed to a new, non-null
    /// value.
    fn rebuild(&mut self) {
        let mut updated = Bag::new();
        for record in &self.sources {
            updated.merge(&record.source.tree());
        }
        updated.merge(&self.local);
        self.aggregate = updated;

        let ManagerState { aggregate, observers, .. } = self;
        for (path, record) in observers.iter_mut() {
            let new_value = aggregate.get(path);
            if matches!(new_value, Value::Null) || new_value == record.current {
                continue;
            }
            let old_value = std::mem::replace(&mut record.current, new_value.clone());
            for callback in record.callbacks.values() {
                callback(&old_value, &new_value);
            }
        }
    }
}

/// Aggregates a prioritized list of [`Source`]s plus a local mutation
/// overlay into one logical config tree, and notifies observers of the
/// paths they watch as that tree changes.
///
/// All state — the source list, the local overlay, the computed aggregate
/// and the observer table — lives behind a single [`Mutex`]. Observer
/// callbacks run synchronously, on whatever thread triggered the rebuild,
/// while that lock is held; a callback that calls back into the manager
/// will deadlock. This mirrors the single-lock discipline of the reference
/// implementation rather than introducing channels or async dispatch for a
/// component whose whole job is a cheap in-memory merge.
pub struct Manager {
    state: Mutex<ManagerState>,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager {
    pub fn new() -> Self {
        Self { state: Mutex::new(ManagerState::new()) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManagerState> {
        self.state.lock().expect("config manager mutex poisoned")
    }

    /// Reads a value from the current aggregate.
    pub fn get(&self, path: &str) -> Value {
        self.lock().aggregate.get(path)
    }

    pub fn get_or(&self, path: &str, default: Value) -> Value {
        self.lock().aggregate.get_or(path, default)
    }

    /// A full clone of the current aggregate, for callers (the facade's
    /// typed accessors, `populate`) that need `Bag`'s richer accessor set
    /// rather than single-path reads.
    pub fn snapshot(&self) -> Bag {
        self.lock().aggregate.clone()
    }

    /// Writes into the local overlay, which always wins over every
    /// registered source, and recomputes the aggregate.
    pub fn set(&self, path: &str, value: Value) -> Result<(), ConfigError> {
        let mut state = self.lock();
        state.local.set(path, value)?;
        state.rebuild();
        debug!(path, "config: local value set");
        Ok(())
    }

    pub fn has_source(&self, id: &str) -> bool {
        self.lock().sources.iter().any(|r| r.id == id)
    }

    /// Registered source ids, sorted alphabetically (this is a lookup
    /// convenience, not the merge order — merge order is by priority).
    pub fn list_sources(&self) -> Vec<String> {
        let state = self.lock();
        let mut ids: Vec<String> = state.sources.iter().map(|r| r.id.clone()).collect();
        ids.sort();
        ids
    }

    pub fn source_priority(&self, id: &str) -> Result<i64, ConfigError> {
        self.lock()
            .sources
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.source.priority())
            .ok_or_else(|| ConfigError::SourceNotFound { id: id.to_string() })
    }

    /// A snapshot of a source's own tree, independent of the aggregate.
    pub fn source_tree(&self, id: &str) -> Result<Bag, ConfigError> {
        self.lock()
            .sources
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.source.tree())
            .ok_or_else(|| ConfigError::SourceNotFound { id: id.to_string() })
    }

    /// Registers a new source and recomputes the aggregate. Fails with
    /// [`ConfigError::DuplicateSource`] if `id` is already registered.
    pub fn add_source(&self, id: impl Into<String>, source: Box<dyn Source>) -> Result<(), ConfigError> {
        let id = id.into();
        let mut state = self.lock();
        if state.sources.iter().any(|r| r.id == id) {
            return Err(ConfigError::DuplicateSource { id });
        }
        state.sources.push(SourceRecord { id: id.clone(), source });
        state.sources.sort_by_key(|r| r.source.priority());
        state.rebuild();
        debug!(id, "config: source added");
        Ok(())
    }

    /// Changes a registered source's priority and recomputes merge order and
    /// the aggregate.
    pub fn set_source_priority(&self, id: &str, priority: i64) -> Result<(), ConfigError> {
        let mut state = self.lock();
        let position = state
            .sources
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ConfigError::SourceNotFound { id: id.to_string() })?;
        state.sources[position].source.set_priority(priority);
        state.sources.sort_by_key(|r| r.source.priority());
        state.rebuild();
        debug!(id, priority, "config: source priority changed");
        Ok(())
    }

    /// Closes and removes a single source. If `close` fails, the source
    /// stays registered and the aggregate is left untouched.
    pub fn remove_source(&self, id: &str) -> Result<(), ConfigError> {
        let mut state = self.lock();
        let position = state
            .sources
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ConfigError::SourceNotFound { id: id.to_string() })?;
        state.sources[position].source.close()?;
        state.sources.remove(position);
        state.rebuild();
        debug!(id, "config: source removed");
        Ok(())
    }

    /// Closes and removes every registered source. Aborts on the first
    /// close error, leaving every source — including ones already
    /// successfully closed — registered; callers that need best-effort
    /// cleanup should call `remove_source` in a loop instead.
    pub fn remove_all_sources(&self) -> Result<(), ConfigError> {
        let mut state = self.lock();
        for record in state.sources.iter_mut() {
            record.source.close()?;
        }
        state.sources.clear();
        state.rebuild();
        debug!("config: all sources removed");
        Ok(())
    }

    /// Asks every source capable of reloading whether its data changed,
    /// recomputing the aggregate once if any of them did.
    pub fn reload_sources(&self) -> Result<(), ConfigError> {
        let mut state = self.lock();
        let mut any_changed = false;
        for record in state.sources.iter_mut() {
            if let Some(result) = record.source.reload() {
                match result {
                    Ok(changed) => any_changed = any_changed || changed,
                    Err(err) => {
                        warn!(id = record.id, error = %err, "config: source reload failed");
                        return Err(err);
                    }
                }
            }
        }
        if any_changed {
            state.rebuild();
            debug!("config: sources reloaded, aggregate rebuilt");
        }
        Ok(())
    }

    pub fn has_observer(&self, id: &str, path: &str) -> bool {
        self.lock()
            .observers
            .get(path)
            .is_some_and(|r| r.callbacks.contains_key(id))
    }

    /// Registers a callback under `(path, id)`. The callback's cached value
    /// for comparison purposes starts at the path's current aggregate value
    /// (which may be `Value::Null` if nothing supplies it yet).
    pub fn add_observer(
        &self,
        id: impl Into<String>,
        path: impl Into<String>,
        callback: ObserverCallback,
    ) -> Result<(), ConfigError> {
        let id = id.into();
        let path = path.into();
        let mut state = self.lock();
        if let Some(record) = state.observers.get(&path) {
            if record.callbacks.contains_key(&id) {
                return Err(ConfigError::DuplicateObserver { path, id });
            }
        } else {
            let current = state.aggregate.get(&path);
            state
                .observers
                .insert(path.clone(), ObserverRecord { current, callbacks: HashMap::new() });
        }
        state
            .observers
            .get_mut(&path)
            .expect("just inserted above")
            .callbacks
            .insert(id, callback);
        Ok(())
    }

    /// Removes a callback from every path it was registered under. Unlike
    /// most manager operations this never fails — removing an observer that
    /// was never registered is a no-op.
    pub fn remove_observer(&self, id: &str) {
        let mut state = self.lock();
        for record in state.observers.values_mut() {
            record.callbacks.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubSource {
        priority: i64,
        tree: Bag,
    }

    impl Source for StubSource {
        fn priority(&self) -> i64 {
            self.priority
        }
        fn set_priority(&mut self, priority: i64) {
            self.priority = priority;
        }
        fn tree(&self) -> Bag {
            self.tree.clone()
        }
    }

    fn stub(priority: i64, path: &str, value: Value) -> Box<dyn Source> {
        let mut tree = Bag::new();
        tree.set(path, value).unwrap();
        Box::new(StubSource { priority, tree })
    }

    #[test]
    fn higher_priority_source_wins_merge() {
        let manager = Manager::new();
        manager.add_source("low", stub(0, "x", Value::Int(1))).unwrap();
        manager.add_source("high", stub(10, "x", Value::Int(2))).unwrap();
        assert_eq!(manager.get("x"), Value::Int(2));
    }

    #[test]
    fn local_overlay_always_wins() {
        let manager = Manager::new();
        manager.add_source("only", stub(100, "x", Value::Int(1))).unwrap();
        manager.set("x", Value::Int(9)).unwrap();
        assert_eq!(manager.get("x"), Value::Int(9));
    }

    #[test]
    fn duplicate_source_id_rejected() {
        let manager = Manager::new();
        manager.add_source("a", stub(0, "x", Value::Int(1))).unwrap();
        assert!(matches!(
            manager.add_source("a", stub(0, "y", Value::Int(2))),
            Err(ConfigError::DuplicateSource { .. })
        ));
    }

    #[test]
    fn observer_fires_on_non_null_change_only() {
        let manager = Manager::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        manager
            .add_observer("watcher", "x", Box::new(move |_old, _new| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        // Installing a source with no value at the watched path: no fire.
        manager.add_source("empty", stub(0, "other", Value::Int(1))).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Installing a source that supplies the path: fires once.
        manager.add_source("supplier", stub(1, "x", Value::Int(5))).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Re-adding the same value via another equal write: no fire.
        manager.set("x", Value::Int(5)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        manager.set("x", Value::Int(6)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn duplicate_observer_rejected() {
        let manager = Manager::new();
        manager.add_observer("a", "x", Box::new(|_, _| {})).unwrap();
        assert!(matches!(
            manager.add_observer("a", "x", Box::new(|_, _| {})),
            Err(ConfigError::DuplicateObserver { .. })
        ));
    }

    #[test]
    fn remove_all_sources_aborts_on_first_close_error() {
        struct FailingClose(Bag);
        impl Source for FailingClose {
            fn priority(&self) -> i64 {
                0
            }
            fn set_priority(&mut self, _priority: i64) {}
            fn tree(&self) -> Bag {
                self.0.clone()
            }
            fn close(&mut self) -> Result<(), ConfigError> {
                Err(ConfigError::SourceNotFound { id: "boom".into() })
            }
        }

        let manager = Manager::new();
        manager.add_source("bad", Box::new(FailingClose(Bag::new()))).unwrap();
        assert!(manager.remove_all_sources().is_err());
        assert!(manager.has_source("bad"));
    }
}
