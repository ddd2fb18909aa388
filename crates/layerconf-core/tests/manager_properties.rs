use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use layerconf_core::{Bag, ConfigError, Manager, Source, Value};

struct StaticSource {
    priority: i64,
    tree: Bag,
}

impl Source for StaticSource {
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

fn source(priority: i64, entries: &[(&str, Value)]) -> Box<dyn Source> {
    let mut tree = Bag::new();
    for (path, value) in entries {
        tree.set(path, value.clone()).unwrap();
    }
    Box::new(StaticSource { priority, tree })
}

/// S1: with no sources and no local overrides, every read returns the
/// caller's own default.
#[test]
fn s1_empty_manager_returns_defaults() {
    let manager = Manager::new();
    assert_eq!(manager.get("anything"), Value::Null);
    assert_eq!(manager.get_or("anything", Value::Int(42)), Value::Int(42));
    assert!(manager.list_sources().is_empty());
}

/// S4: an observer installed before any source supplies its path caches a
/// null baseline, then fires exactly once when a later-added source first
/// supplies a non-null value.
#[test]
fn s4_observer_installed_before_source_fires_on_first_supply() {
    let manager = Manager::new();
    let fired = Arc::new(AtomicUsize::new(0));
    let fired_clone = fired.clone();
    manager
        .add_observer(
            "watcher",
            "feature.enabled",
            Box::new(move |old, new| {
                assert_eq!(*old, Value::Null);
                assert_eq!(*new, Value::Bool(true));
                fired_clone.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    manager.add_source("unrelated", source(0, &[("other", Value::Int(1))])).unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    manager
        .add_source("feature-flags", source(1, &[("feature.enabled", Value::Bool(true))]))
        .unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

/// S6: removing every source falls back to whatever the local overlay
/// still holds, and `remove_all_sources` aborts without dropping anything
/// if any source fails to close.
#[test]
fn s6_remove_all_sources_falls_back_to_local_overlay() {
    let manager = Manager::new();
    manager.add_source("a", source(0, &[("x", Value::Int(1))])).unwrap();
    manager.set("x", Value::Int(99)).unwrap();
    manager.remove_all_sources().unwrap();
    assert_eq!(manager.get("x"), Value::Int(99));
    assert!(manager.list_sources().is_empty());
}

#[test]
fn priority_ties_keep_insertion_order() {
    let manager = Manager::new();
    manager.add_source("first", source(0, &[("x", Value::Int(1))])).unwrap();
    manager.add_source("second", source(0, &[("x", Value::Int(2))])).unwrap();
    // Equal priority: the later-inserted source still wins the merge, since
    // ties are broken by insertion order and merge folds low-to-high with
    // the overlay always winning wholesale on conflicting scalars.
    assert_eq!(manager.get("x"), Value::Int(2));
}

#[test]
fn reprioritizing_a_source_changes_merge_order() {
    let manager = Manager::new();
    manager.add_source("low", source(0, &[("x", Value::Int(1))])).unwrap();
    manager.add_source("high", source(10, &[("x", Value::Int(2))])).unwrap();
    assert_eq!(manager.get("x"), Value::Int(2));

    manager.set_source_priority("low", 100).unwrap();
    assert_eq!(manager.get("x"), Value::Int(1));
}

#[test]
fn unknown_source_operations_fail_with_source_not_found() {
    let manager = Manager::new();
    assert!(matches!(
        manager.remove_source("missing"),
        Err(ConfigError::SourceNotFound { .. })
    ));
    assert!(matches!(
        manager.set_source_priority("missing", 1),
        Err(ConfigError::SourceNotFound { .. })
    ));
}
