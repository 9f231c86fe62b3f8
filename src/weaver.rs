//! Template substitution and final assembly.
//!
//! The weaver never touches the filesystem and never runs source code: it
//! only evaluates template expressions against already-captured snapshots.

use tracing::debug;

use crate::config::Markers;
use crate::engine::Snapshot;
use crate::errors::WeaveError;
use crate::model::{Role, Segment, SegmentContent};
use crate::text_location::TextLocation;

/// Substitutes template expressions in prose segments.
#[derive(Debug, Clone, Copy)]
pub struct Weaver<'m> {
    markers: &'m Markers,
}

impl<'m> Weaver<'m> {
    pub fn new(markers: &'m Markers) -> Self {
        Self { markers }
    }

    /// Replaces every template expression in `text` with its value.
    ///
    /// Fails on the first expression that cannot be evaluated, or on an
    /// opening delimiter without a closing one.
    pub fn substitute(
        &self,
        text: &str,
        snapshot: &Snapshot,
        kind: &str,
        line: usize,
    ) -> Result<String, WeaveError> {
        let open = self.markers.template_open.as_str();
        let close = self.markers.template_close.as_str();
        let error = |expression: &str, message: String| WeaveError::Substitution {
            kind: kind.to_string(),
            location: TextLocation::line_only(line),
            expression: expression.to_string(),
            message,
        };

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find(open) {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + open.len()..];
            let Some(end) = find_close(after_open, close) else {
                return Err(error(
                    after_open.trim(),
                    format!("unterminated template expression (missing `{}`)", close),
                ));
            };
            let expression = after_open[..end].trim();
            if expression.is_empty() {
                return Err(error(expression, "empty template expression".to_string()));
            }
            let value = snapshot
                .evaluate(expression)
                .map_err(|e| error(expression, e.to_string()))?;
            out.push_str(&value.to_string());
            rest = &after_open[end + close.len()..];
        }
        out.push_str(rest);
        Ok(out)
    }

    /// Weaves a resolved segment into its final form.
    ///
    /// Prose becomes a new `Substituted` segment. When substitution fails the
    /// replacement keeps the raw text and `Prose` role, with the error
    /// attached. Other segments are returned unchanged.
    pub fn weave_segment(&self, segment: Segment, snapshot: &Snapshot) -> Segment {
        let prose = match (&segment.content, segment.kind) {
            (SegmentContent::Text { text }, Some(kind)) if segment.role == Role::Prose => {
                Some((kind, text.clone()))
            }
            _ => None,
        };
        let Some((kind, text)) = prose else {
            return segment;
        };

        match self.substitute(&text, snapshot, kind.keyword(), segment.line) {
            Ok(woven) => Segment::substituted(segment.line, kind, woven),
            Err(err) => {
                debug!("substitution failed: {}", err);
                Segment::prose(segment.line, kind, text).with_error(err)
            }
        }
    }
}

/// Finds the closing delimiter, skipping over quoted string literals.
fn find_close(text: &str, close: &str) -> Option<usize> {
    let mut quote = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if text[i..].starts_with(close) => return Some(i),
            None if c == '\'' || c == '"' => quote = Some(c),
            None => {}
        }
    }
    None
}
