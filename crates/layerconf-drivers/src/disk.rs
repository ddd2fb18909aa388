use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

/// The narrow filesystem surface `FileSource`/`DirSource`/
/// `ObservableFileSource` need, so tests can swap in an in-memory
/// implementation instead of touching real disk state.
pub trait Disk: Send + Sync {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
    fn modified(&self, path: &Path) -> std::io::Result<SystemTime>;
    /// Immediate children of a directory, files only, sorted by name.
    fn read_dir(&self, path: &Path) -> std::io::Result<Vec<PathBuf>>;
    /// Immediate subdirectories of a directory, sorted by name. Used by
    /// `DirSource` when `recursive` is set.
    fn subdirs(&self, path: &Path) -> std::io::Result<Vec<PathBuf>>;
}

/// The real filesystem, via `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsDisk;

impl Disk for OsDisk {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn modified(&self, path: &Path) -> std::io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    fn read_dir(&self, path: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .collect();
        entries.sort();
        Ok(entries)
    }

    fn subdirs(&self, path: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|entry| entry.path())
            .collect();
        entries.sort();
        Ok(entries)
    }
}

/// An in-memory `Disk`, for driver tests that need to control file content
/// and modification times precisely without touching the real filesystem.
#[derive(Default)]
pub struct MemoryDisk {
    files: Mutex<BTreeMap<PathBuf, (Vec<u8>, SystemTime)>>,
}

impl MemoryDisk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_file(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>, modified: SystemTime) {
        self.files
            .lock()
            .expect("memory disk mutex poisoned")
            .insert(path.into(), (content.into(), modified));
    }
}

impl Disk for MemoryDisk {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        self.files
            .lock()
            .expect("memory disk mutex poisoned")
            .get(path)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn modified(&self, path: &Path) -> std::io::Result<SystemTime> {
        self.files
            .lock()
            .expect("memory disk mutex poisoned")
            .get(path)
            .map(|(_, modified)| *modified)
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn read_dir(&self, path: &Path) -> std::io::Result<Vec<PathBuf>> {
        Ok(self
            .files
            .lock()
            .expect("memory disk mutex poisoned")
            .keys()
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect())
    }

    /// Infers subdirectories from stored file paths nested more than one
    /// level below `path`, since this fake has no directory entries of its
    /// own — only flat file paths.
    fn subdirs(&self, path: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut dirs: Vec<PathBuf> = self
            .files
            .lock()
            .expect("memory disk mutex poisoned")
            .keys()
            .filter_map(|p| p.strip_prefix(path).ok())
            .filter(|rel| rel.components().count() > 1)
            .filter_map(|rel| rel.components().next())
            .map(|first| path.join(first.as_os_str()))
            .collect();
        dirs.sort();
        dirs.dedup();
        Ok(dirs)
    }
}
