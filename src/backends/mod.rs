//! Figure render backends.
//!
//! Rendering is an injected capability: the pipeline hands each figure
//! segment to the backend registered for its directive kind and records
//! the returned artifact paths, or a render error.

mod command;
mod local_image;
mod passthrough;

pub use command::CommandBackend;
pub use local_image::LocalImageBackend;
pub use passthrough::PassthroughBackend;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::config::Config;
use crate::io::FileCache;
use crate::readers::DirectiveKind;

/// A figure to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureRequest {
    pub kind: DirectiveKind,
    /// Line of the figure directive.
    pub line: usize,
    /// Source file named by the directive, relative to the base directory.
    pub source: Option<PathBuf>,
    /// Artifacts already produced while executing the directive.
    pub artifacts: Vec<PathBuf>,
}

impl FigureRequest {
    /// The path to name in diagnostics.
    pub fn display_path(&self) -> String {
        self.source
            .as_ref()
            .or(self.artifacts.first())
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<no path>".to_string())
    }
}

/// Turns figure requests into displayable artifacts.
pub trait RenderBackend: Send + Sync {
    /// Returns the name of this backend.
    fn name(&self) -> &str;

    /// Renders a figure, returning the artifact paths on success.
    fn render(&self, request: &FigureRequest, files: &dyn FileCache) -> Result<Vec<PathBuf>, String>;
}

/// Registry of backends keyed by figure kind.
#[derive(Default)]
pub struct BackendRegistry {
    backends: IndexMap<DirectiveKind, Box<dyn RenderBackend>>,
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<(DirectiveKind, &str)> =
            self.backends.iter().map(|(k, b)| (*k, b.name())).collect();
        f.debug_struct("BackendRegistry")
            .field("backends", &names)
            .finish()
    }
}

impl BackendRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            backends: IndexMap::new(),
        }
    }

    /// The standard backends: local images, plot passthrough, and the
    /// configured external commands for diagrams and schematics.
    pub fn with_defaults(config: &Config, base_dir: &Path) -> Self {
        let mut registry = Self::new();
        registry.register(DirectiveKind::Image, LocalImageBackend::new());
        registry.register(DirectiveKind::Plot, PassthroughBackend::new());
        registry.register(
            DirectiveKind::Diagram,
            CommandBackend::new(
                "diagram",
                config.backends.diagram.clone(),
                base_dir.to_path_buf(),
                config.figure_dir.clone(),
            ),
        );
        registry.register(
            DirectiveKind::Schematic,
            CommandBackend::new(
                "schematic",
                config.backends.schematic.clone(),
                base_dir.to_path_buf(),
                config.figure_dir.clone(),
            ),
        );
        registry
    }

    /// Registers a backend, replacing any previous one for the kind.
    pub fn register<B: RenderBackend + 'static>(&mut self, kind: DirectiveKind, backend: B) {
        self.backends.insert(kind, Box::new(backend));
    }

    pub fn get(&self, kind: DirectiveKind) -> Option<&dyn RenderBackend> {
        self.backends.get(&kind).map(|b| b.as_ref())
    }

    /// Returns the number of registered backends.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Returns true if no backends are registered.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::VirtualFS;
    use crate::test_utils::FakeBackend;

    #[test]
    fn test_registry() {
        let mut registry = BackendRegistry::new();
        assert!(registry.is_empty());

        registry.register(DirectiveKind::Diagram, FakeBackend::ok("fake"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(DirectiveKind::Diagram).unwrap().name(), "fake");
        assert!(registry.get(DirectiveKind::Image).is_none());

        registry.register(DirectiveKind::Diagram, FakeBackend::failing("other", "boom"));
        assert_eq!(registry.len(), 1);
        let request = FigureRequest {
            kind: DirectiveKind::Diagram,
            line: 1,
            source: Some(PathBuf::from("a.dot")),
            artifacts: vec![],
        };
        let err = registry
            .get(DirectiveKind::Diagram)
            .unwrap()
            .render(&request, &VirtualFS::new())
            .unwrap_err();
        assert_eq!(err, "boom");
    }

    #[test]
    fn test_defaults_cover_figure_kinds() {
        let registry = BackendRegistry::with_defaults(&Config::default(), Path::new("."));
        for kind in DirectiveKind::ALL.into_iter().filter(|k| k.is_figure()) {
            assert!(registry.get(kind).is_some(), "no backend for {}", kind);
        }
        let debug = format!("{:?}", registry);
        assert!(debug.contains("local-image"));
    }

    #[test]
    fn test_display_path() {
        let request = FigureRequest {
            kind: DirectiveKind::Plot,
            line: 1,
            source: None,
            artifacts: vec![PathBuf::from("out.png")],
        };
        assert_eq!(request.display_path(), "out.png");
    }
}
