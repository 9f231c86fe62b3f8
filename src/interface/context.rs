//! Execution context for weave operations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backends::{BackendRegistry, RenderBackend};
use crate::config::Config;
use crate::errors::Result;
use crate::io::{FileCache, RealFileCache};
use crate::readers::DirectiveKind;

/// Context for weave operations.
///
/// Holds the configuration, the render backends and file system access.
pub struct Context {
    /// Configuration.
    pub config: Config,
    /// Figure backends by directive kind.
    pub backends: BackendRegistry,
    /// File cache for includes and figure sources.
    pub file_cache: Arc<dyn FileCache>,
    /// Base directory for operations.
    pub base_dir: PathBuf,
}

impl Context {
    /// Creates a new context with the default backends.
    pub fn new(config: Config, base_dir: PathBuf) -> Self {
        let backends = BackendRegistry::with_defaults(&config, &base_dir);
        let file_cache = Arc::new(RealFileCache::new(base_dir.clone()));
        Self {
            config,
            backends,
            file_cache,
            base_dir,
        }
    }

    /// Creates a context with default configuration.
    pub fn default_for_dir(base_dir: PathBuf) -> Self {
        Self::new(Config::default(), base_dir)
    }

    /// Creates a context from the current directory, reading its config file.
    pub fn from_current_dir() -> Result<Self> {
        let base_dir = std::env::current_dir()?;
        let config = crate::config::read_config(&base_dir)?;
        Ok(Self::new(config, base_dir))
    }

    /// Replaces the file cache.
    pub fn with_file_cache(mut self, file_cache: Arc<dyn FileCache>) -> Self {
        self.file_cache = file_cache;
        self
    }

    /// Registers a backend for a figure kind.
    pub fn add_backend<B: RenderBackend + 'static>(&mut self, kind: DirectiveKind, backend: B) {
        self.backends.register(kind, backend);
    }

    /// Resolves a path relative to the base directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Expresses a path relative to the base directory when it lies inside it.
    pub fn relative_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.base_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("backends", &self.backends)
            .field("file_cache", &self.file_cache)
            .field("base_dir", &self.base_dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeBackend;
    use tempfile::tempdir;

    #[test]
    fn test_context_new() {
        let dir = tempdir().unwrap();
        let ctx = Context::default_for_dir(dir.path().to_path_buf());

        assert_eq!(ctx.base_dir, dir.path());
        assert_eq!(ctx.backends.len(), 4);
        assert_eq!(ctx.config.host_language, "python");
    }

    #[test]
    fn test_resolve_and_relative_path() {
        let dir = tempdir().unwrap();
        let ctx = Context::default_for_dir(dir.path().to_path_buf());

        let resolved = ctx.resolve_path(Path::new("docs/report.py"));
        assert_eq!(resolved, dir.path().join("docs/report.py"));
        assert_eq!(ctx.relative_path(&resolved), PathBuf::from("docs/report.py"));

        let absolute = Path::new("/absolute/path");
        assert_eq!(ctx.resolve_path(absolute), PathBuf::from("/absolute/path"));
        assert_eq!(ctx.relative_path(absolute), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_add_backend_replaces_default() {
        let dir = tempdir().unwrap();
        let mut ctx = Context::default_for_dir(dir.path().to_path_buf());
        ctx.add_backend(DirectiveKind::Diagram, FakeBackend::ok("fake-dot"));
        assert_eq!(ctx.backends.len(), 4);
        assert_eq!(ctx.backends.get(DirectiveKind::Diagram).unwrap().name(), "fake-dot");
    }
}
