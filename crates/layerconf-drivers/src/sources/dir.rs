use std::path::{Path, PathBuf};
use std::sync::Mutex;

use layerconf_core::{Bag, ConfigError, Source};

use crate::disk::Disk;
use crate::parser::Parser;
use crate::registry::Registry;

use super::file::load_file;

/// Merges every file in a directory (sorted by name, ascending) into one
/// tree, each parsed by whatever parser its extension selects (or
/// `parser_id`, if given). Later files win on conflicting paths, same as
/// any other deep merge. When `recursive` is set, subdirectories are walked
/// depth-first in the same sorted order and merged in alongside the files
/// at each level.
pub struct DirSource {
    priority: i64,
    tree: Bag,
}

fn load_dir(
    path: &Path,
    disk: &dyn Disk,
    parsers: &Mutex<Registry<Box<dyn Parser>>>,
    parser_id: Option<&str>,
    recursive: bool,
) -> Result<Bag, ConfigError> {
    let files: Vec<PathBuf> = disk.read_dir(path).map_err(|e| ConfigError::Io {
        context: format!("listing config directory {}", path.display()),
        source: e,
    })?;
    let mut tree = Bag::new();
    for file in files {
        let file_tree = load_file(&file, disk, parsers, parser_id)?;
        tree.merge(&file_tree);
    }
    if recursive {
        let subdirs: Vec<PathBuf> = disk.subdirs(path).map_err(|e| ConfigError::Io {
            context: format!("listing config directory {}", path.display()),
            source: e,
        })?;
        for subdir in subdirs {
            let subtree = load_dir(&subdir, disk, parsers, parser_id, recursive)?;
            tree.merge(&subtree);
        }
    }
    Ok(tree)
}

impl DirSource {
    pub fn new(
        priority: i64,
        path: &Path,
        disk: &dyn Disk,
        parsers: &Mutex<Registry<Box<dyn Parser>>>,
        parser_id: Option<&str>,
        recursive: bool,
    ) -> Result<Self, ConfigError> {
        let tree = load_dir(path, disk, parsers, parser_id, recursive)?;
        Ok(Self { priority, tree })
    }
}

impl Source for DirSource {
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
    use layerconf_core::Value;
    use std::time::SystemTime;

    fn json_parsers() -> Mutex<Registry<Box<dyn Parser>>> {
        let mut registry: Registry<Box<dyn Parser>> = Registry::new();
        registry.add("json", Box::new(crate::json_parser::JsonParser) as Box<dyn Parser>).unwrap();
        Mutex::new(registry)
    }

    #[test]
    fn merges_files_in_sorted_order() {
        let disk = MemoryDisk::new();
        disk.set_file(PathBuf::from("/cfg/a.json"), br#"{"x":1}"#.to_vec(), SystemTime::now());
        disk.set_file(PathBuf::from("/cfg/b.json"), br#"{"x":2}"#.to_vec(), SystemTime::now());
        let parsers = json_parsers();
        let source =
            DirSource::new(0, Path::new("/cfg"), &disk, &parsers, None, false).unwrap();
        assert_eq!(source.tree().get("x"), Value::Int(2));
    }

    /// Directory recursion: a non-recursive source only sees the top level,
    /// a recursive one also pulls in nested subdirectories.
    #[test]
    fn recursive_flag_controls_whether_subdirectories_are_merged() {
        let disk = MemoryDisk::new();
        disk.set_file(PathBuf::from("/cfg/a.json"), br#"{"k1":"v1"}"#.to_vec(), SystemTime::now());
        disk.set_file(PathBuf::from("/cfg/sub/b.json"), br#"{"k2":"v2"}"#.to_vec(), SystemTime::now());
        let parsers = json_parsers();

        let flat = DirSource::new(0, Path::new("/cfg"), &disk, &parsers, None, false).unwrap();
        assert_eq!(flat.tree().get("k1"), Value::String("v1".into()));
        assert!(!flat.tree().has("k2"));

        let deep = DirSource::new(0, Path::new("/cfg"), &disk, &parsers, None, true).unwrap();
        assert_eq!(deep.tree().get("k1"), Value::String("v1".into()));
        assert_eq!(deep.tree().get("k2"), Value::String("v2".into()));
    }
}
