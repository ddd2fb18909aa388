use crate::error::ConfigError;
use crate::value::{Bag, Value};

/// A single contributor to the aggregated config tree.
///
/// A source owns its own tree and its own synchronization; the manager never
/// reaches inside one, it only ever asks for a consistent snapshot via
/// [`Source::tree`] and folds that into the aggregate under its own lock.
///
/// `reload` is a capability test rather than a marker trait: most sources
/// are static once loaded (env, plain file, plain dir) and simply accept the
/// default `None`. Sources backed by something that can change underneath
/// them (a file's mtime, a REST endpoint's timestamp) override it. This
/// keeps the driver side flat — no `Box<dyn Source>` vs.
/// `Box<dyn ObservableSource>` split, no downcasting to find out which one a
/// caller is holding.
///
/// # Invariants
/// - `tree()` never blocks on the manager's lock; a source's own
///   synchronization is independent of it.
/// - `close()` is idempotent: closing an already-closed source must not
///   error.
/// - `reload()` returning `Some(Ok(true))` means the source's tree actually
///   changed since the last call; `Some(Ok(false))` means it was checked and
///   found unchanged.
pub trait Source: Send {
    fn priority(&self) -> i64;

    fn set_priority(&mut self, priority: i64);

    /// A full snapshot of this source's own tree, independent of any other
    /// source or the manager's aggregate.
    fn tree(&self) -> Bag;

    /// Convenience accessor built on [`Source::tree`]; `""` returns the
    /// whole tree as a `Value::Map`.
    fn lookup(&self, path: &str, default: Value) -> Value {
        if path.is_empty() {
            Value::Map(self.tree())
        } else {
            self.tree().get_or(path, default)
        }
    }

    /// Releases any resource the source holds (file handles, background
    /// watchers). The default no-op covers sources with nothing to release.
    fn close(&mut self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Checks whether the source's underlying data changed and, if so,
    /// reloads its tree. Returns `None` for sources with no notion of
    /// reload.
    fn reload(&mut self) -> Option<Result<bool, ConfigError>> {
        None
    }
}
