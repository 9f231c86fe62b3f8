//! File system abstraction for testability.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Read access to the files a document refers to.
///
/// Relative paths are resolved against the implementation's base directory.
pub trait FileCache: Send + Sync + std::fmt::Debug {
    /// Reads the contents of a file.
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Checks if a file exists.
    fn exists(&self, path: &Path) -> bool;
}

/// Real file system implementation.
#[derive(Debug, Clone, Default)]
pub struct RealFileCache {
    /// Base directory for relative paths.
    pub base_dir: PathBuf,
}

impl RealFileCache {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Resolves a path relative to the base directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl FileCache for RealFileCache {
    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(self.resolve(path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }
}

/// In-memory file system for tests.
#[derive(Debug, Clone, Default)]
pub struct VirtualFS {
    files: HashMap<PathBuf, String>,
}

impl VirtualFS {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file to the virtual file system.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    /// Builder-style variant of [`VirtualFS::add_file`].
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.add_file(path, content);
        self
    }
}

impl FileCache for VirtualFS {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "File not found"))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_virtual_fs_basic() {
        let mut vfs = VirtualFS::new();
        vfs.add_file("data/table.csv", "a,b\n1,2\n");

        assert!(vfs.exists(Path::new("data/table.csv")));
        assert!(!vfs.exists(Path::new("table.csv")));
        assert_eq!(vfs.read(Path::new("data/table.csv")).unwrap(), "a,b\n1,2\n");

        let err = vfs.read(Path::new("missing.txt")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_real_file_cache() {
        let dir = tempdir().unwrap();
        let cache = RealFileCache::new(dir.path().to_path_buf());

        let mut file = fs::File::create(dir.path().join("snippet.py")).unwrap();
        file.write_all(b"print(1)\n").unwrap();

        assert!(cache.exists(Path::new("snippet.py")));
        assert_eq!(cache.read(Path::new("snippet.py")).unwrap(), "print(1)\n");
        assert!(!cache.exists(Path::new("other.py")));
    }

    #[test]
    fn test_real_file_cache_absolute_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abs.txt");
        fs::write(&path, "x").unwrap();

        let cache = RealFileCache::new(PathBuf::from("/nonexistent"));
        assert_eq!(cache.read(&path).unwrap(), "x");
    }
}
