//! Shared test utilities.

use std::path::PathBuf;

use crate::backends::{FigureRequest, RenderBackend};
use crate::io::FileCache;

/// A small document exercising code, hidden code, substitution and output.
pub const FIXTURE_SOURCE: &str = "\
foo = 1
#% hidden value = 123 * 3
#' The value is {{ value }}.
print(foo)
#>
";

/// A render backend that never runs anything.
///
/// On success it reports `figures/<source stem>.svg`.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    name: String,
    failure: Option<String>,
}

impl FakeBackend {
    pub fn ok(name: &str) -> Self {
        Self {
            name: name.to_string(),
            failure: None,
        }
    }

    pub fn failing(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            failure: Some(message.to_string()),
        }
    }
}

impl RenderBackend for FakeBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, request: &FigureRequest, _files: &dyn FileCache) -> Result<Vec<PathBuf>, String> {
        if let Some(message) = &self.failure {
            return Err(message.clone());
        }
        let stem = request
            .source
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "figure".to_string());
        Ok(vec![PathBuf::from("figures").join(format!("{}.svg", stem))])
    }
}
