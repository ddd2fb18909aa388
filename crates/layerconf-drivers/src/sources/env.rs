use std::collections::BTreeMap;
use std::path::Path;

use layerconf_core::{Bag, ConfigError, Source, Value};

use crate::disk::Disk;

/// Parses `KEY=VALUE` lines from a dotenv-style file. Blank lines and lines
/// starting with `#` are skipped; values are taken verbatim, no quote
/// stripping or variable expansion — matches what the sources that preload
/// these files actually need, not a general dotenv parser.
fn parse_dotenv(bytes: &[u8]) -> BTreeMap<String, String> {
    let text = String::from_utf8_lossy(bytes);
    let mut vars = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            vars.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    vars
}

/// Maps a configured set of environment variable names onto dotted config
/// paths. Variables not present in the environment are simply absent from
/// the tree rather than erroring — an env source describes what it *would*
/// read, not a required set.
pub struct EnvSource {
    priority: i64,
    tree: Bag,
}

impl EnvSource {
    /// Builds from the real process environment, with no files preloaded.
    pub fn new(priority: i64, mappings: &BTreeMap<String, String>) -> Self {
        let vars: BTreeMap<String, String> = std::env::vars().collect();
        Self::from_vars(priority, mappings, &vars)
    }

    /// Builds from the real process environment, first preloading `files`
    /// (dotenv-style) as defaults: a variable already set in the file is
    /// never overwritten by a later file, and the real process environment
    /// always wins over anything loaded from a file — mirrors `godotenv`'s
    /// "never overwrite an already-set variable" behavior.
    pub fn with_files(
        priority: i64,
        mappings: &BTreeMap<String, String>,
        files: &[impl AsRef<Path>],
        disk: &dyn Disk,
    ) -> Result<Self, ConfigError> {
        let mut vars = BTreeMap::new();
        for file in files {
            let bytes = disk.read(file.as_ref()).map_err(|e| ConfigError::Io {
                context: format!("reading env file {}", file.as_ref().display()),
                source: e,
            })?;
            for (key, value) in parse_dotenv(&bytes) {
                vars.entry(key).or_insert(value);
            }
        }
        vars.extend(std::env::vars());
        Ok(Self::from_vars(priority, mappings, &vars))
    }

    /// Builds from an explicit variable map, so tests never depend on the
    /// process's actual environment.
    pub fn from_vars(
        priority: i64,
        mappings: &BTreeMap<String, String>,
        vars: &BTreeMap<String, String>,
    ) -> Self {
        let mut tree = Bag::new();
        for (var_name, path) in mappings {
            if let Some(value) = vars.get(var_name) {
                tree.set(path, Value::String(value.clone()))
                    .expect("mapping path is never empty");
            }
        }
        Self { priority, tree }
    }
}

impl Source for EnvSource {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemoryDisk;
    use std::path::PathBuf;
    use std::time::SystemTime;

    #[test]
    fn maps_present_variables_and_skips_absent_ones() {
        let mut mappings = BTreeMap::new();
        mappings.insert("APP_DB_HOST".to_string(), "db.host".to_string());
        mappings.insert("APP_MISSING".to_string(), "missing".to_string());

        let mut vars = BTreeMap::new();
        vars.insert("APP_DB_HOST".to_string(), "localhost".to_string());

        let source = EnvSource::from_vars(0, &mappings, &vars);
        assert_eq!(source.tree().get("db.host"), Value::String("localhost".into()));
        assert!(!source.tree().has("missing"));
    }

    #[test]
    fn parse_dotenv_skips_blank_lines_and_comments() {
        let vars = parse_dotenv(b"# comment\nKEY=value\n\nOTHER = spaced \n");
        assert_eq!(vars.get("KEY"), Some(&"value".to_string()));
        assert_eq!(vars.get("OTHER"), Some(&"spaced".to_string()));
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn file_values_are_defaults_a_later_file_cannot_override() {
        let disk = MemoryDisk::new();
        disk.set_file(PathBuf::from("/cfg/a.env"), b"APP_DB_HOST=from-a\n".to_vec(), SystemTime::now());
        disk.set_file(PathBuf::from("/cfg/b.env"), b"APP_DB_HOST=from-b\n".to_vec(), SystemTime::now());

        let mut mappings = BTreeMap::new();
        mappings.insert("APP_DB_HOST".to_string(), "db.host".to_string());

        let files = [PathBuf::from("/cfg/a.env"), PathBuf::from("/cfg/b.env")];
        let source = EnvSource::with_files(0, &mappings, &files, &disk).unwrap();
        assert_eq!(source.tree().get("db.host"), Value::String("from-a".into()));
    }
}
