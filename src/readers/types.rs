//! Type definitions for scanned sources.

use std::fmt;

use serde::Serialize;

use crate::text_location::TextLocation;

/// The closed set of directive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    /// Passthrough prose, substituted at weave time.
    Text,
    /// Captured standard output.
    Output,
    /// Code executed but never shown.
    Hidden,
    /// File included as a typed code listing.
    Listing,
    /// File included as plain text.
    Include,
    /// Local image file.
    Image,
    /// Code that saves a plot.
    Plot,
    /// Source for an external diagram compiler.
    Diagram,
    /// Source for an external schematic/vector renderer.
    Schematic,
}

impl DirectiveKind {
    /// All kinds, in keyword order.
    pub const ALL: [DirectiveKind; 9] = [
        Self::Text,
        Self::Output,
        Self::Hidden,
        Self::Listing,
        Self::Include,
        Self::Image,
        Self::Plot,
        Self::Diagram,
        Self::Schematic,
    ];

    /// The keyword used after the keyword marker (`#% hidden`).
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Output => "output",
            Self::Hidden => "hidden",
            Self::Listing => "listing",
            Self::Include => "include",
            Self::Image => "image",
            Self::Plot => "plot",
            Self::Diagram => "diagram",
            Self::Schematic => "schematic",
        }
    }

    /// Looks a kind up by keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.keyword() == keyword)
    }

    /// Returns true if the payload is host code run by the engine.
    pub fn executes_payload(self) -> bool {
        matches!(self, Self::Hidden | Self::Plot)
    }

    /// Returns true if consecutive single-line forms merge into one directive.
    pub fn coalesces(self) -> bool {
        matches!(self, Self::Text | Self::Hidden)
    }

    /// Returns true for the figure family.
    pub fn is_figure(self) -> bool {
        matches!(
            self,
            Self::Image | Self::Plot | Self::Diagram | Self::Schematic
        )
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A directive tag as written in the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Tag {
    Known(DirectiveKind),
    /// A keyword outside the closed set; fails at resolution.
    Unknown(String),
}

impl Tag {
    /// Parses a keyword into a tag.
    pub fn from_keyword(keyword: &str) -> Self {
        match DirectiveKind::from_keyword(keyword) {
            Some(kind) => Tag::Known(kind),
            None => Tag::Unknown(keyword.to_string()),
        }
    }

    /// Returns the tag's keyword.
    pub fn name(&self) -> &str {
        match self {
            Tag::Known(kind) => kind.keyword(),
            Tag::Unknown(name) => name,
        }
    }

    /// Returns the kind for known tags.
    pub fn kind(&self) -> Option<DirectiveKind> {
        match self {
            Tag::Known(kind) => Some(*kind),
            Tag::Unknown(_) => None,
        }
    }
}

/// A scanned directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    /// The tag.
    pub tag: Tag,
    /// Marker-stripped payload; multi-line payloads keep their line breaks.
    pub payload: String,
    /// First source line (1-indexed).
    pub line: usize,
    /// Last source line covered by the directive.
    pub end_line: usize,
}

impl Directive {
    /// Creates a single-line directive.
    pub fn new(tag: Tag, payload: impl Into<String>, line: usize) -> Self {
        Self {
            tag,
            payload: payload.into(),
            line,
            end_line: line,
        }
    }

    /// Returns the kind for known tags.
    pub fn kind(&self) -> Option<DirectiveKind> {
        self.tag.kind()
    }

    /// Returns the tag name, used in diagnostics.
    pub fn name(&self) -> &str {
        self.tag.name()
    }

    /// Returns the directive's location.
    pub fn location(&self) -> TextLocation {
        TextLocation::line_only(self.line)
    }

    /// Payload lines paired with their source line numbers.
    ///
    /// Block payloads start on the line after the opener; single-line and
    /// coalesced payloads start on the directive's first line.
    pub fn payload_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        let count = self.payload.split('\n').count();
        let span = self.end_line + 1 - self.line;
        let first = if span == count { self.line } else { self.line + 1 };
        self.payload
            .split('\n')
            .enumerate()
            .map(move |(i, text)| (first + i, text))
    }
}

/// Classification of one source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "directive", rename_all = "lowercase")]
pub enum LineKind {
    /// Host code (including blank lines).
    Code,
    /// Part of the directive with the given index.
    Directive(usize),
    /// An inert comment.
    Comment,
    /// A line that failed to scan.
    Invalid,
}

/// One line of the source, classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLine {
    /// Line number (1-indexed).
    pub line: usize,
    /// Raw text.
    pub text: String,
    /// Classification.
    pub kind: LineKind,
}
