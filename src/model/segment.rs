//! Output fragments of a woven document.

use std::path::PathBuf;

use serde::Serialize;

use crate::errors::WeaveError;
use crate::readers::DirectiveKind;

/// How a segment's content is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Prose awaiting (or having failed) template substitution.
    Prose,
    /// Verbatim text: captured output or an included file.
    Literal,
    /// Prose whose template expressions were all substituted.
    Substituted,
    /// A reference to a rendered figure.
    Figure,
    /// Source code shown ahead of a directive.
    CodeEcho,
}

/// A reference to a figure and the artifacts rendered for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FigureRef {
    /// Name of the backend that handles the figure.
    pub backend: String,
    /// Source path from the directive payload; plots have none.
    pub source: Option<PathBuf>,
    /// Files the figure is displayed from.
    pub artifacts: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentContent {
    Text {
        text: String,
    },
    Listing {
        language: Option<String>,
        text: String,
    },
    Figure(FigureRef),
}

/// One fragment of the woven document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// Line of the directive the segment came from.
    pub line: usize,
    /// Directive kind; `None` for code echoes.
    pub kind: Option<DirectiveKind>,
    pub role: Role,
    pub content: SegmentContent,
    /// Substitution or render failure; the segment is kept regardless.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WeaveError>,
}

impl Segment {
    fn new(line: usize, kind: Option<DirectiveKind>, role: Role, content: SegmentContent) -> Self {
        Self {
            line,
            kind,
            role,
            content,
            error: None,
        }
    }

    pub fn prose(line: usize, kind: DirectiveKind, text: impl Into<String>) -> Self {
        Self::new(line, Some(kind), Role::Prose, SegmentContent::Text { text: text.into() })
    }

    /// Prose whose template expressions have been replaced.
    pub fn substituted(line: usize, kind: DirectiveKind, text: impl Into<String>) -> Self {
        Self::new(line, Some(kind), Role::Substituted, SegmentContent::Text { text: text.into() })
    }

    pub fn literal(line: usize, kind: DirectiveKind, text: impl Into<String>) -> Self {
        Self::new(line, Some(kind), Role::Literal, SegmentContent::Text { text: text.into() })
    }

    pub fn listing(
        line: usize,
        kind: DirectiveKind,
        language: Option<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::new(
            line,
            Some(kind),
            Role::Literal,
            SegmentContent::Listing {
                language,
                text: text.into(),
            },
        )
    }

    pub fn figure(line: usize, kind: DirectiveKind, figure: FigureRef) -> Self {
        Self::new(line, Some(kind), Role::Figure, SegmentContent::Figure(figure))
    }

    /// Code that ran before the directive on `line`.
    pub fn code_echo(line: usize, code: impl Into<String>) -> Self {
        Self::new(line, None, Role::CodeEcho, SegmentContent::Text { text: code.into() })
    }

    pub fn with_error(mut self, error: WeaveError) -> Self {
        self.error = Some(error);
        self
    }

    /// Text content, for text and listing segments.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            SegmentContent::Text { text } | SegmentContent::Listing { text, .. } => Some(text),
            SegmentContent::Figure(_) => None,
        }
    }

    pub fn figure_ref(&self) -> Option<&FigureRef> {
        match &self.content {
            SegmentContent::Figure(figure) => Some(figure),
            _ => None,
        }
    }

    /// Renders the segment as Markdown.
    pub fn to_markdown(&self, host_language: &str) -> String {
        match (&self.role, &self.content) {
            (Role::CodeEcho, SegmentContent::Text { text }) => fence(host_language, text),
            (Role::Literal, SegmentContent::Text { text }) => fence("", text),
            (_, SegmentContent::Listing { language, text }) => {
                fence(language.as_deref().unwrap_or(""), text)
            }
            (_, SegmentContent::Text { text }) => text.clone(),
            (_, SegmentContent::Figure(figure)) => {
                let paths: Vec<&PathBuf> = if figure.artifacts.is_empty() {
                    figure.source.iter().collect()
                } else {
                    figure.artifacts.iter().collect()
                };
                paths
                    .iter()
                    .map(|p| format!("![]({})", p.display()))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
    }
}

fn fence(info: &str, text: &str) -> String {
    let body = text.trim_end_matches('\n');
    let ticks = if body.contains("```") { "````" } else { "```" };
    if body.is_empty() {
        format!("{ticks}{info}\n{ticks}")
    } else {
        format!("{ticks}{info}\n{body}\n{ticks}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_markdown_by_role() {
        let prose = Segment::prose(1, DirectiveKind::Text, "The answer is 369.");
        assert_eq!(prose.to_markdown("python"), "The answer is 369.");

        let output = Segment::literal(2, DirectiveKind::Output, "1\n");
        assert_eq!(output.to_markdown("python"), "```\n1\n```");

        let empty = Segment::literal(2, DirectiveKind::Output, "");
        assert_eq!(empty.to_markdown("python"), "```\n```");

        let listing = Segment::listing(3, DirectiveKind::Listing, Some("rust".into()), "fn main() {}\n");
        assert_eq!(listing.to_markdown("python"), "```rust\nfn main() {}\n```");

        let echo = Segment::code_echo(4, "foo = 1");
        assert_eq!(echo.to_markdown("python"), "```python\nfoo = 1\n```");
    }

    #[test]
    fn test_figure_markdown() {
        let figure = |artifacts: Vec<PathBuf>| {
            Segment::figure(
                5,
                DirectiveKind::Diagram,
                FigureRef {
                    backend: "diagram".into(),
                    source: Some(PathBuf::from("flow.dot")),
                    artifacts,
                },
            )
        };
        assert_eq!(figure(vec![]).to_markdown("python"), "![](flow.dot)");

        let rendered = figure(vec![PathBuf::from("figures/flow.svg")]);
        assert_eq!(rendered.to_markdown("python"), "![](figures/flow.svg)");
        assert_eq!(rendered.text(), None);
        assert_eq!(rendered.figure_ref().map(|f| f.backend.as_str()), Some("diagram"));
    }

    #[test]
    fn test_nested_fence() {
        let listing = Segment::listing(1, DirectiveKind::Include, None, "```\ninner\n```");
        assert_eq!(listing.to_markdown("python"), "````\n```\ninner\n```\n````");
    }
}
