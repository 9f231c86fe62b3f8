//! Backend for image files already on disk.

use std::path::PathBuf;

use crate::io::FileCache;

use super::{FigureRequest, RenderBackend};

/// Checks that the referenced image exists and displays it as-is.
#[derive(Debug, Clone, Default)]
pub struct LocalImageBackend;

impl LocalImageBackend {
    pub fn new() -> Self {
        Self
    }
}

impl RenderBackend for LocalImageBackend {
    fn name(&self) -> &str {
        "local-image"
    }

    fn render(&self, request: &FigureRequest, files: &dyn FileCache) -> Result<Vec<PathBuf>, String> {
        let source = request
            .source
            .as_ref()
            .ok_or_else(|| "image directive names no file".to_string())?;
        if files.exists(source) {
            Ok(vec![source.clone()])
        } else {
            Err(format!("image not found: {}", source.display()))
        }
    }
}
