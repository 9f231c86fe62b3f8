//! The woven document.

use std::path::PathBuf;

use serde::Serialize;

use crate::errors::{Result, WeaveError};
use crate::io::hexdigest_str;

use super::segment::Segment;

/// A directive that execution never reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedDirective {
    pub line: usize,
    pub kind: String,
}

/// Result of weaving one source.
///
/// Segments are in source order. Every directive is accounted for: it
/// produced segments, an entry in `errors`, or an entry in `unresolved`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WovenDocument {
    /// Source file, when woven from disk.
    pub source: Option<PathBuf>,
    /// Language tag for echoed code fences.
    pub host_language: String,
    pub segments: Vec<Segment>,
    /// Every error of the run, sorted by line.
    pub errors: Vec<WeaveError>,
    pub unresolved: Vec<UnresolvedDirective>,
}

impl WovenDocument {
    pub fn new(source: Option<PathBuf>, host_language: impl Into<String>) -> Self {
        Self {
            source,
            host_language: host_language.into(),
            segments: Vec::new(),
            errors: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    /// True when there are no errors and every directive was resolved.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.unresolved.is_empty()
    }

    /// Number of problems: errors plus unresolved directives.
    pub fn problem_count(&self) -> usize {
        self.errors.len() + self.unresolved.len()
    }

    /// Renders the document as Markdown, segments separated by blank lines.
    pub fn to_markdown(&self) -> String {
        let mut out = self
            .segments
            .iter()
            .map(|s| s.to_markdown(&self.host_language))
            .collect::<Vec<_>>()
            .join("\n\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// SHA-256 of the Markdown rendering, hex encoded.
    pub fn digest(&self) -> String {
        hexdigest_str(&self.to_markdown())
    }

    /// One line per error and per unresolved directive.
    pub fn error_report(&self) -> String {
        let mut lines: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        for entry in &self.unresolved {
            let location = match &self.source {
                Some(path) => format!("{}:{}", path.display(), entry.line),
                None => format!("line {}", entry.line),
            };
            lines.push(format!(
                "{}: {} directive unresolved, execution stopped earlier",
                location, entry.kind
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::DirectiveKind;
    use crate::text_location::TextLocation;

    fn document() -> WovenDocument {
        let mut doc = WovenDocument::new(None, "python");
        doc.segments.push(Segment::prose(1, DirectiveKind::Text, "Intro"));
        doc.segments.push(Segment::literal(3, DirectiveKind::Output, "1\n"));
        doc
    }

    #[test]
    fn test_markdown() {
        assert_eq!(document().to_markdown(), "Intro\n\n```\n1\n```\n");
        assert_eq!(WovenDocument::new(None, "python").to_markdown(), "");
    }

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(document().digest(), document().digest());
        let mut other = document();
        other.segments.pop();
        assert_ne!(document().digest(), other.digest());
    }

    #[test]
    fn test_error_report() {
        let mut doc = document();
        assert!(doc.is_clean());
        doc.errors.push(WeaveError::Resolution {
            kind: "chart".to_string(),
            location: TextLocation::line_only(4),
            message: "unknown directive tag".to_string(),
        });
        doc.unresolved.push(UnresolvedDirective {
            line: 9,
            kind: "output".to_string(),
        });
        assert!(!doc.is_clean());
        assert_eq!(doc.problem_count(), 2);
        assert_eq!(
            doc.error_report(),
            "line 4: cannot resolve chart directive: unknown directive tag\n\
             line 9: output directive unresolved, execution stopped earlier"
        );
    }

    #[test]
    fn test_json() {
        let json = document().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["segments"][0]["role"], "prose");
        assert_eq!(value["segments"][0]["kind"], "text");
        assert_eq!(value["segments"][1]["content"]["type"], "text");
        assert_eq!(value["segments"][1]["content"]["text"], "1\n");
    }
}
