//! Source positions for diagnostics.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// A line within a woven source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TextLocation {
    /// The source file, when weaving from disk.
    pub filename: Option<PathBuf>,
    /// Line number (1-indexed).
    pub line: usize,
}

impl TextLocation {
    /// Creates a location with only line information.
    pub fn line_only(line: usize) -> Self {
        Self {
            filename: None,
            line,
        }
    }

    /// Returns a new location with updated filename.
    pub fn with_filename(mut self, filename: PathBuf) -> Self {
        self.filename = Some(filename);
        self
    }
}

impl Default for TextLocation {
    fn default() -> Self {
        Self::line_only(1)
    }
}

impl fmt::Display for TextLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filename {
            Some(path) => write!(f, "{}:{}", path.display(), self.line),
            None => write!(f, "line {}", self.line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_filename() {
        let loc = TextLocation::line_only(10).with_filename(PathBuf::from("report.py"));
        assert_eq!(format!("{}", loc), "report.py:10");
    }

    #[test]
    fn test_display_without_filename() {
        let loc = TextLocation::line_only(7);
        assert_eq!(format!("{}", loc), "line 7");
    }

    #[test]
    fn test_with_filename() {
        let loc = TextLocation::line_only(42).with_filename(PathBuf::from("a.py"));
        assert_eq!(loc.line, 42);
        assert_eq!(loc.filename, Some(PathBuf::from("a.py")));
    }
}
