use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use layerconf_core::{Bag, ConfigError, Source};

use crate::disk::Disk;
use crate::parser::Parser;
use crate::registry::Registry;

use super::file::load_file;

/// A config file that re-parses itself when its modification time advances.
///
/// `reload` is a cheap `stat`, not a re-read: the file's content is only
/// re-parsed once its mtime is strictly newer than the one observed at
/// construction or the last successful reload. Holds its own `Disk` and
/// parser registry handles so the manager's generic reload loop (which only
/// ever calls `Source::reload()`, no extra arguments) can drive it.
pub struct ObservableFileSource {
    priority: i64,
    path: PathBuf,
    disk: Arc<dyn Disk>,
    parsers: Arc<Mutex<Registry<Box<dyn Parser>>>>,
    parser_id: Option<String>,
    tree: Bag,
    last_modified: SystemTime,
}

impl ObservableFileSource {
    pub fn new(
        priority: i64,
        path: PathBuf,
        disk: Arc<dyn Disk>,
        parsers: Arc<Mutex<Registry<Box<dyn Parser>>>>,
        parser_id: Option<String>,
    ) -> Result<Self, ConfigError> {
        let tree = load_file(&path, disk.as_ref(), &parsers, parser_id.as_deref())?;
        let last_modified = disk.modified(&path).map_err(|e| ConfigError::Io {
            context: format!("stat-ing config file {}", path.display()),
            source: e,
        })?;
        Ok(Self { priority, path, disk, parsers, parser_id, tree, last_modified })
    }
}

impl Source for ObservableFileSource {
    fn priority(&self) -> i64 {
        self.priority
    }

    fn set_priority(&mut self, priority: i64) {
        self.priority = priority;
    }

    fn tree(&self) -> Bag {
        self.tree.clone()
    }

    fn reload(&mut self) -> Option<Result<bool, ConfigError>> {
        Some((|| {
            let modified = self.disk.modified(&self.path).map_err(|e| ConfigError::Io {
                context: format!("stat-ing config file {}", self.path.display()),
                source: e,
            })?;
            if modified <= self.last_modified {
                return Ok(false);
            }
            self.tree = load_file(&self.path, self.disk.as_ref(), &self.parsers, self.parser_id.as_deref())?;
            self.last_modified = modified;
            Ok(true)
        })())
    }
}
