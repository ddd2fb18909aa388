use std::collections::HashMap;

use layerconf_core::{Bag, ConfigError, Value};

/// Something that can decide whether it handles a declarative config
/// (usually by checking a `driver` or `format` field) and, if so, build the
/// `T` it describes.
///
/// Deliberately not a class hierarchy: a registry just holds an ordered list
/// of these and asks each in turn "is this yours?" until one says yes. Order
/// matters only in that the first acceptor wins — factories are expected not
/// to overlap.
pub trait DriverFactory<T>: Send + Sync {
    fn accept(&self, config: &Bag) -> bool;
    fn create(&self, config: &Bag) -> Result<T, ConfigError>;
}

/// A resource kind a [`Registry`] can close on teardown. Parsers have
/// nothing to release; sources forward to [`layerconf_core::Source::close`].
pub trait Closeable {
    fn close_instance(&mut self) -> Result<(), ConfigError>;
}

impl Closeable for Box<dyn layerconf_core::Source> {
    fn close_instance(&mut self) -> Result<(), ConfigError> {
        self.as_mut().close()
    }
}

impl Closeable for Box<dyn crate::parser::Parser> {
    fn close_instance(&mut self) -> Result<(), ConfigError> {
        self.as_mut().close().map_err(ConfigError::from)
    }
}

/// Resolves declaratively-configured resources (sources, parsers) by id,
/// preferring an explicitly-added instance and otherwise building one from
/// declared config via an ordered list of [`DriverFactory`]s.
///
/// `has`/`list` report the union of explicitly-added ids and ids declared in
/// the config this registry was last told about; `get` resolves lazily and
/// caches the config-built instance so a second `get` for the same id
/// doesn't rebuild it. The same shape serves both resource kinds in this
/// crate (parsers stay resident for the lifetime of the registry; sources
/// are additionally [`Registry::take`]n once, transferring ownership to the
/// manager — `take` has no counterpart in the declarative contract itself,
/// it exists only because Rust ownership requires an explicit
/// relinquish-ownership step the original's shared references don't).
pub struct Registry<T> {
    factories: Vec<Box<dyn DriverFactory<T>>>,
    explicit: HashMap<String, T>,
    resolved: HashMap<String, T>,
    declared: Bag,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
            explicit: HashMap::new(),
            resolved: HashMap::new(),
            declared: Bag::new(),
        }
    }

    pub fn register(&mut self, factory: Box<dyn DriverFactory<T>>) {
        self.factories.push(factory);
    }

    /// Replaces the declarative-config provider: a tree whose top-level keys
    /// are resource ids and whose values are that resource's config.
    pub fn set_declared(&mut self, declared: Bag) {
        self.declared = declared;
    }

    /// Adds an explicit instance under `id`. Fails with
    /// [`ConfigError::DuplicateResource`] if `id` is already explicit or has
    /// already been resolved from declared config.
    pub fn add(&mut self, id: impl Into<String>, instance: T) -> Result<(), ConfigError> {
        let id = id.into();
        if self.explicit.contains_key(&id) || self.resolved.contains_key(&id) {
            return Err(ConfigError::DuplicateResource { id });
        }
        self.explicit.insert(id, instance);
        Ok(())
    }

    pub fn has(&self, id: &str) -> bool {
        self.explicit.contains_key(id) || self.resolved.contains_key(id) || self.declared.has(id)
    }

    /// Sorted union of explicit and declared ids.
    pub fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .explicit
            .keys()
            .cloned()
            .chain(self.resolved.keys().cloned())
            .chain(self.declared.entries())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Resolves `id`: an explicit instance if one was added, else the
    /// already-resolved instance from a previous call, else a fresh one
    /// built from declared config (cached for subsequent calls).
    ///
    /// Fails with [`ConfigError::UnknownResource`] if `id` has no explicit
    /// instance and no declared config at all, or
    /// [`ConfigError::InvalidResourceConfig`] if config exists but no
    /// registered factory accepts it; a factory's own construction error is
    /// propagated as-is.
    pub fn get(&mut self, id: &str) -> Result<&T, ConfigError> {
        if self.explicit.contains_key(id) {
            return Ok(self.explicit.get(id).expect("just checked"));
        }
        if !self.resolved.contains_key(id) {
            let config = match self.declared.get(id) {
                Value::Map(config) => config,
                _ => return Err(ConfigError::UnknownResource { id: id.to_string() }),
            };
            let factory = self.factories.iter().find(|f| f.accept(&config)).ok_or_else(|| {
                ConfigError::InvalidResourceConfig {
                    id: id.to_string(),
                    reason: "no registered driver accepts this resource config".to_string(),
                }
            })?;
            let built = factory.create(&config)?;
            self.resolved.insert(id.to_string(), built);
        }
        Ok(self.resolved.get(id).expect("just resolved"))
    }

    /// Resolves `id` (as [`Registry::get`]) then removes and returns it,
    /// transferring ownership to the caller. Explicit instances are
    /// preferred over resolved ones when both somehow exist (they can't,
    /// `add` and `get` refuse to create that overlap).
    pub fn take(&mut self, id: &str) -> Result<T, ConfigError> {
        self.get(id)?;
        if let Some(instance) = self.explicit.remove(id) {
            return Ok(instance);
        }
        self.resolved.remove(id).ok_or_else(|| ConfigError::UnknownResource { id: id.to_string() })
    }
}

impl<T: Closeable> Registry<T> {
    /// Closes every explicit and resolved instance, aborting on the first
    /// failure and leaving everything — including instances already closed
    /// this pass — in place, mirroring
    /// [`layerconf_core::Manager::remove_all_sources`]. Clears the registry
    /// only once every instance closed successfully.
    pub fn close(&mut self) -> Result<(), ConfigError> {
        for instance in self.explicit.values_mut().chain(self.resolved.values_mut()) {
            instance.close_instance()?;
        }
        self.explicit.clear();
        self.resolved.clear();
        self.declared = Bag::new();
        Ok(())
    }
}
