use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use layerconf_core::{ConfigError, Manager, Source, Value};
use layerconf_drivers::factories::{default_parser_registry, default_source_registry};
use layerconf_drivers::sources::FileSource;
use layerconf_drivers::{Disk, Parser, Registry, ReqwestRequesterFactory, RestRequesterFactory, Trigger};
use tracing::{info, warn};

const DEFAULTS_SOURCE_ID: &str = "defaults";
const DEFAULTS_PRIORITY: i64 = -1;
const BOOT_SOURCES_PATH: &str = "config.boot";
const DECLARED_SOURCES_PATH: &str = "config.sources";
const DEFAULT_FILE_PARSER_PATH: &str = "config.defaults.fileParser";
const DEFAULT_FILE_DISK_PATH: &str = "config.defaults.fileDisk";
const DEFAULT_REST_PARSER_PATH: &str = "config.defaults.restParser";
const RELOAD_FREQUENCY_PATH: &str = "config.observable.frequency";

/// Wires together a [`Manager`], a parser registry, a source registry and
/// the recurring reload trigger, and drives them through the three phases
/// an application cares about: `boot`, `run`, `close`. There is no DI
/// container behind this — every collaborator is a plain field, constructed
/// and wired by hand, which is the idiomatic Rust substitute for the
/// original's dependency-injection wiring.
pub struct Lifecycle {
    manager: Arc<Manager>,
    disk: Arc<dyn Disk>,
    requesters: Arc<dyn RestRequesterFactory>,
    parsers: Arc<Mutex<Registry<Box<dyn Parser>>>>,
    sources: Registry<Box<dyn Source>>,
    trigger: Arc<Mutex<Option<Trigger>>>,
}

impl Lifecycle {
    pub fn new(manager: Arc<Manager>, disk: Arc<dyn Disk>) -> Self {
        Self::with_requester_factory(manager, disk, Arc::new(ReqwestRequesterFactory))
    }

    /// The parser registry handle, for building a [`crate::Facade`] that can
    /// pass through to it.
    pub fn parsers(&self) -> Arc<Mutex<Registry<Box<dyn Parser>>>> {
        self.parsers.clone()
    }

    pub fn with_requester_factory(
        manager: Arc<Manager>,
        disk: Arc<dyn Disk>,
        requesters: Arc<dyn RestRequesterFactory>,
    ) -> Self {
        let parsers = Arc::new(Mutex::new(default_parser_registry()));
        let sources = default_source_registry(disk.clone(), parsers.clone(), requesters.clone(), None);
        Self { manager, disk, requesters, parsers, sources, trigger: Arc::new(Mutex::new(None)) }
    }

    /// Installs the `"defaults"` source at priority `-1` from
    /// `defaults_path`, if present. Then reads three well-known globals off
    /// the resulting aggregate — the default file-parser id, the default
    /// file-disk id, and the default REST-parser id — and, if
    /// `config.boot` is true, builds and registers every source declared
    /// under `config.sources` (a map keyed by source id).
    ///
    /// A missing defaults file is not an error: defaults are optional, and
    /// a deployment with every value supplied by other sources is valid.
    ///
    /// This crate carries a single `Disk` handle rather than a disk
    /// registry (the virtual filesystem abstraction is explicitly out of
    /// scope), so `config.defaults.fileDisk` is read for parity with the
    /// other two globals but has no effect beyond being logged.
    pub fn boot(&mut self, defaults_path: Option<&Path>) -> Result<(), ConfigError> {
        if let Some(path) = defaults_path {
            match FileSource::new(DEFAULTS_PRIORITY, path, self.disk.as_ref(), &self.parsers, None) {
                Ok(source) => {
                    self.manager.add_source(DEFAULTS_SOURCE_ID, Box::new(source))?;
                    info!(path = %path.display(), "config: defaults source loaded");
                }
                Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                    info!(path = %path.display(), "config: no defaults file present, skipping");
                }
                Err(err) => return Err(err),
            }
        }

        let snapshot = self.manager.snapshot();
        let default_file_parser = snapshot.string(DEFAULT_FILE_PARSER_PATH, "");
        let default_file_disk = snapshot.string(DEFAULT_FILE_DISK_PATH, "");
        let default_rest_parser = snapshot.string(DEFAULT_REST_PARSER_PATH, "");
        if !default_file_disk.is_empty() {
            info!(disk = %default_file_disk, "config: default file disk id has no effect, single-disk only");
        }
        let _ = default_rest_parser; // REST sources decode JSON structurally, no byte-level parser to select.
        let default_file_parser = (!default_file_parser.is_empty()).then_some(default_file_parser);

        self.sources = default_source_registry(
            self.disk.clone(),
            self.parsers.clone(),
            self.requesters.clone(),
            default_file_parser,
        );

        if !snapshot.bool(BOOT_SOURCES_PATH, false) {
            return Ok(());
        }

        if let Value::Map(declared) = self.manager.get(DECLARED_SOURCES_PATH) {
            self.sources.set_declared(declared);
            for id in self.sources.list() {
                if id.is_empty() {
                    warn!("config: skipping declared source with no id");
                    continue;
                }
                let source = self.sources.take(&id)?;
                self.manager.add_source(id, source)?;
            }
        }
        Ok(())
    }

    /// Starts the recurring reload trigger at `default_interval`, then
    /// installs an observer on `config.observable.frequency` that swaps the
    /// trigger for a new one whenever that path changes to a positive
    /// millisecond count.
    ///
    /// The replaced trigger is stopped (joined) from inside the observer
    /// callback. If the frequency change itself was detected by the very
    /// trigger being replaced — i.e. this observer fires on that trigger's
    /// own background thread — stopping it joins the current thread and
    /// deadlocks. This is the same single-lock reentrancy hazard the
    /// manager's observer contract already carries; it is not special-cased
    /// here.
    pub fn run(&mut self, default_interval: Duration) -> Result<(), ConfigError> {
        let initial = self.manager.snapshot().duration(RELOAD_FREQUENCY_PATH, default_interval);
        *self.trigger.lock().expect("trigger slot poisoned") =
            Some(Trigger::start(initial, self.manager.clone()));

        let manager = self.manager.clone();
        let slot = self.trigger.clone();
        self.manager.add_observer(
            "lifecycle-trigger",
            RELOAD_FREQUENCY_PATH,
            Box::new(move |_old, new| {
                let Value::Int(ms) = new else { return };
                if *ms <= 0 {
                    return;
                }
                #[allow(clippy::cast_sign_loss)]
                let interval = Duration::from_millis(*ms as u64);
                let replacement = Trigger::start(interval, manager.clone());
                let previous = slot.lock().expect("trigger slot poisoned").replace(replacement);
                if let Some(previous) = previous {
                    previous.stop();
                }
            }),
        )
    }

    /// Stops the recurring trigger (if running), closes and removes every
    /// registered source, and drops every resource the registries built.
    pub fn close(&mut self) -> Result<(), ConfigError> {
        if let Some(trigger) = self.trigger.lock().expect("trigger slot poisoned").take() {
            trigger.stop();
        }
        self.manager.remove_all_sources()?;
        self.sources.close()?;
        self.parsers.lock().expect("parser registry mutex poisoned").close()?;
        Ok(())
    }
}
