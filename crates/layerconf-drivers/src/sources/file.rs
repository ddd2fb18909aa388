use std::path::Path;
use std::sync::Mutex;

use layerconf_core::{Bag, ConfigError, Source, Value};

use crate::disk::Disk;
use crate::parser::Parser;
use crate::registry::Registry;

/// Reads a file's bytes from `disk` and parses them with `parser_id` if
/// given, else whatever parser in `parsers` is registered for the file's
/// extension.
///
/// Shared by [`FileSource`], [`super::dir::DirSource`] and
/// [`super::observable_file::ObservableFileSource`] — they differ only in
/// how many files they read and whether they watch for changes, not in how
/// a single file becomes a `Bag`.
pub(crate) fn load_file(
    path: &Path,
    disk: &dyn Disk,
    parsers: &Mutex<Registry<Box<dyn Parser>>>,
    parser_id: Option<&str>,
) -> Result<Bag, ConfigError> {
    let format = match parser_id {
        Some(id) => id.to_string(),
        None => path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ConfigError::InvalidResourceConfig {
                id: path.display().to_string(),
                reason: "file has no extension to infer a parser format from".to_string(),
            })?,
    };
    let bytes = disk.read(path).map_err(|e| ConfigError::Io {
        context: format!("reading config file {}", path.display()),
        source: e,
    })?;
    let mut parsers = parsers.lock().expect("parser registry mutex poisoned");
    let parser = parsers.get(&format)?;
    match parser.parse(&bytes)? {
        Value::Map(bag) => Ok(bag),
        Value::Null => Ok(Bag::new()),
        other => Err(ConfigError::Parser {
            context: format!("parsing config file {}", path.display()),
            detail: format!("expected a mapping at the document root, got {other:?}"),
        }),
    }
}

/// A single config file, parsed once at construction and never re-read.
pub struct FileSource {
    priority: i64,
    tree: Bag,
}

impl FileSource {
    pub fn new(
        priority: i64,
        path: &Path,
        disk: &dyn Disk,
        parsers: &Mutex<Registry<Box<dyn Parser>>>,
        parser_id: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let tree = load_file(path, disk, parsers, parser_id)?;
        Ok(Self { priority, tree })
    }
}

impl Source for FileSource {
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

    fn json_parsers() -> Mutex<Registry<Box<dyn Parser>>> {
        let mut registry: Registry<Box<dyn Parser>> = Registry::new();
        registry.add("json", Box::new(crate::json_parser::JsonParser) as Box<dyn Parser>).unwrap();
        Mutex::new(registry)
    }

    #[test]
    fn loads_and_normalizes_a_json_file() {
        let disk = MemoryDisk::new();
        disk.set_file(
            PathBuf::from("/cfg/app.json"),
            br#"{"Db":{"Host":"x"}}"#.to_vec(),
            SystemTime::now(),
        );
        let parsers = json_parsers();

        let source = FileSource::new(0, Path::new("/cfg/app.json"), &disk, &parsers, None).unwrap();
        assert_eq!(source.tree().get("db.host"), Value::String("x".into()));
    }

    #[test]
    fn honors_an_explicit_parser_id_over_the_extension() {
        let disk = MemoryDisk::new();
        disk.set_file(PathBuf::from("/cfg/app.conf"), br#"{"x":1}"#.to_vec(), SystemTime::now());
        let parsers = json_parsers();

        let source =
            FileSource::new(0, Path::new("/cfg/app.conf"), &disk, &parsers, Some("json")).unwrap();
        assert_eq!(source.tree().get("x"), Value::Int(1));
    }
}
