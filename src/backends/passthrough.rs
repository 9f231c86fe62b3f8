//! Backend for figures produced while executing the document.

use std::path::PathBuf;

use crate::io::FileCache;

use super::{FigureRequest, RenderBackend};

/// Trusts the artifacts the directive's code already saved.
#[derive(Debug, Clone, Default)]
pub struct PassthroughBackend;

impl PassthroughBackend {
    pub fn new() -> Self {
        Self
    }
}

impl RenderBackend for PassthroughBackend {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn render(&self, request: &FigureRequest, _files: &dyn FileCache) -> Result<Vec<PathBuf>, String> {
        if request.artifacts.is_empty() {
            return Err("no figure was saved".to_string());
        }
        Ok(request.artifacts.clone())
    }
}
