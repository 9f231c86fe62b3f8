//! Directive scanner.
//!
//! Classifies every source line as code, directive or inert comment, and
//! coalesces multi-line directives. Scanning is best-effort: a malformed
//! directive is reported and skipped, and scanning resumes on the next line.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Markers;
use crate::errors::WeaveError;
use crate::text_location::TextLocation;

use super::types::{Directive, DirectiveKind, LineKind, SourceLine, Tag};

/// Keyword followed by an optional payload, separated by one whitespace character.
static KEYWORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?P<keyword>[A-Za-z][\w-]*)(?:\s(?P<payload>.*))?$").unwrap());

/// Result of scanning a source file.
#[derive(Debug, Clone, Default)]
pub struct ScannedSource {
    /// Every line of the source, in order.
    pub lines: Vec<SourceLine>,
    /// Directives in source order; `LineKind::Directive` indexes into this.
    pub directives: Vec<Directive>,
    /// Scan errors, in source order.
    pub errors: Vec<WeaveError>,
}

impl ScannedSource {
    /// Returns true if no scan errors were found.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Re-renders the scanned lines in canonical marker syntax.
    ///
    /// Code, comments and invalid lines are kept verbatim. Each directive is
    /// written once, as a single keyword line when its payload fits on one
    /// line and cannot merge with a neighbour, and as a block otherwise.
    pub fn to_source(&self, markers: &Markers) -> String {
        let mut out = Vec::with_capacity(self.lines.len());
        let mut last_directive = None;

        for line in &self.lines {
            match line.kind {
                LineKind::Directive(index) => {
                    if last_directive == Some(index) {
                        continue;
                    }
                    last_directive = Some(index);
                    render_directive(&self.directives[index], markers, &mut out);
                }
                _ => {
                    last_directive = None;
                    out.push(line.text.clone());
                }
            }
        }

        let mut source = out.join("\n");
        source.push('\n');
        source
    }
}

fn render_directive(directive: &Directive, markers: &Markers, out: &mut Vec<String>) {
    let coalesces = directive.kind().is_some_and(DirectiveKind::coalesces);
    if coalesces || directive.payload.contains('\n') {
        out.push(markers.format_block_open(directive.name()));
        for line in directive.payload.split('\n') {
            out.push(markers.format_block_line(line));
        }
        out.push(markers.block_close.clone());
    } else {
        out.push(markers.format_keyword(directive.name(), &directive.payload));
    }
}

/// How a single line reads, before coalescing.
#[derive(Debug, PartialEq, Eq)]
enum Marker<'a> {
    BlockOpen(&'a str),
    BlockClose,
    Text(&'a str),
    Output(&'a str),
    Keyword(&'a str),
    Comment,
    Code,
}

/// Line classifier bound to a marker set.
pub struct Scanner<'m> {
    markers: &'m Markers,
}

impl<'m> Scanner<'m> {
    /// Creates a scanner for the given markers.
    pub fn new(markers: &'m Markers) -> Self {
        Self { markers }
    }

    fn classify<'a>(&self, text: &'a str) -> Marker<'a> {
        let m = self.markers;
        if let Some(rest) = text.strip_prefix(m.block_open.as_str()) {
            Marker::BlockOpen(rest)
        } else if text.starts_with(m.block_close.as_str()) {
            Marker::BlockClose
        } else if let Some(rest) = text.strip_prefix(m.text.as_str()) {
            Marker::Text(strip_separator(rest))
        } else if let Some(rest) = text.strip_prefix(m.output.as_str()) {
            Marker::Output(strip_separator(rest))
        } else if let Some(rest) = text.strip_prefix(m.keyword.as_str()) {
            Marker::Keyword(rest)
        } else if text.trim_start().starts_with(m.comment.as_str()) {
            Marker::Comment
        } else {
            Marker::Code
        }
    }

    /// Scans a whole source text.
    pub fn scan(&self, source: &str) -> ScannedSource {
        let raw: Vec<&str> = source.lines().collect();
        let mut result = ScannedSource::default();
        let mut i = 0;

        while i < raw.len() {
            let text = raw[i];
            let line_no = i + 1;

            let consumed = match self.classify(text) {
                Marker::BlockOpen(rest) => match self.scan_block(&raw, i, rest) {
                    Ok((directive, end)) => {
                        push_directive(&mut result, &raw, i, end, directive);
                        end - i + 1
                    }
                    Err(err) => {
                        result.errors.push(err);
                        push_line(&mut result, line_no, text, LineKind::Invalid);
                        1
                    }
                },
                Marker::BlockClose => {
                    result.errors.push(scan_error(
                        "block",
                        line_no,
                        format!("'{}' without an open block", self.markers.block_close),
                    ));
                    push_line(&mut result, line_no, text, LineKind::Invalid);
                    1
                }
                Marker::Text(payload) => {
                    let (payload, end) =
                        self.coalesce(&raw, i, payload, |m| match m {
                            Marker::Text(p) => Some(p),
                            _ => None,
                        });
                    let directive = Directive {
                        tag: Tag::Known(DirectiveKind::Text),
                        payload,
                        line: line_no,
                        end_line: end + 1,
                    };
                    push_directive(&mut result, &raw, i, end, directive);
                    end - i + 1
                }
                Marker::Output(payload) => {
                    let directive =
                        Directive::new(Tag::Known(DirectiveKind::Output), payload, line_no);
                    push_directive(&mut result, &raw, i, i, directive);
                    1
                }
                Marker::Keyword(rest) => match parse_keyword(rest) {
                    Some((keyword, payload)) => {
                        let tag = Tag::from_keyword(keyword);
                        let (payload, end) = if tag.kind().is_some_and(DirectiveKind::coalesces) {
                            self.coalesce(&raw, i, payload, |m| match m {
                                Marker::Keyword(r) => match parse_keyword(r) {
                                    Some((k, p)) if k == keyword => Some(p),
                                    _ => None,
                                },
                                _ => None,
                            })
                        } else {
                            (payload.to_string(), i)
                        };
                        let directive = Directive {
                            tag,
                            payload,
                            line: line_no,
                            end_line: end + 1,
                        };
                        push_directive(&mut result, &raw, i, end, directive);
                        end - i + 1
                    }
                    None => {
                        let message = if rest.trim().is_empty() {
                            format!("'{}' without a keyword", self.markers.keyword)
                        } else {
                            format!("malformed keyword '{}'", rest.trim())
                        };
                        result.errors.push(scan_error("directive", line_no, message));
                        push_line(&mut result, line_no, text, LineKind::Invalid);
                        1
                    }
                },
                Marker::Comment => {
                    self.warn_if_indented_marker(text, line_no);
                    push_line(&mut result, line_no, text, LineKind::Comment);
                    1
                }
                Marker::Code => {
                    push_line(&mut result, line_no, text, LineKind::Code);
                    1
                }
            };

            i += consumed;
        }

        tracing::debug!(
            "Scanned {} lines: {} directives, {} errors",
            result.lines.len(),
            result.directives.len(),
            result.errors.len()
        );
        result
    }

    /// Collects consecutive lines that `continues` accepts, starting at `start`.
    ///
    /// Returns the joined payload and the index of the last line used.
    fn coalesce<'a, F>(
        &self,
        raw: &[&'a str],
        start: usize,
        first: &'a str,
        continues: F,
    ) -> (String, usize)
    where
        F: Fn(Marker<'a>) -> Option<&'a str>,
    {
        let mut parts = vec![first];
        let mut end = start;
        while let Some(&next) = raw.get(end + 1) {
            match continues(self.classify(next)) {
                Some(part) => {
                    parts.push(part);
                    end += 1;
                }
                None => break,
            }
        }
        (parts.join("\n"), end)
    }

    /// Scans a block directive whose opener is at `start`.
    fn scan_block(
        &self,
        raw: &[&str],
        start: usize,
        opener_rest: &str,
    ) -> Result<(Directive, usize), WeaveError> {
        let line_no = start + 1;
        let keyword = match parse_keyword(opener_rest) {
            Some((keyword, payload)) if payload.trim().is_empty() => keyword,
            Some((keyword, _)) => {
                return Err(scan_error(
                    keyword,
                    line_no,
                    "unexpected text after block keyword".to_string(),
                ))
            }
            None => {
                return Err(scan_error(
                    "block",
                    line_no,
                    format!("'{}' without a keyword", self.markers.block_open),
                ))
            }
        };

        let mut body = Vec::new();
        for (offset, text) in raw[start + 1..].iter().enumerate() {
            let index = start + 1 + offset;
            match self.classify(text) {
                Marker::BlockClose => {
                    let directive = Directive {
                        tag: Tag::from_keyword(keyword),
                        payload: body.join("\n"),
                        line: line_no,
                        end_line: index + 1,
                    };
                    return Ok((directive, index));
                }
                Marker::BlockOpen(_) => {
                    return Err(scan_error(
                        keyword,
                        line_no,
                        format!("nested block opened at line {}", index + 1),
                    ))
                }
                _ => {
                    if text.trim().is_empty() {
                        body.push("");
                    } else if let Some(rest) = text.strip_prefix(self.markers.comment.as_str()) {
                        body.push(strip_separator(rest));
                    } else {
                        return Err(scan_error(
                            keyword,
                            line_no,
                            format!("block interrupted by code at line {}", index + 1),
                        ));
                    }
                }
            }
        }

        Err(scan_error(
            keyword,
            line_no,
            format!("block is never closed with '{}'", self.markers.block_close),
        ))
    }

    fn warn_if_indented_marker(&self, text: &str, line_no: usize) {
        if !text.starts_with(char::is_whitespace) {
            return;
        }
        let trimmed = text.trim_start();
        let m = self.markers;
        let looks_like_directive = [&m.text, &m.output, &m.keyword]
            .iter()
            .any(|marker| trimmed.starts_with(marker.as_str()));
        if looks_like_directive {
            tracing::warn!(
                "Indented directive marker at line {} is treated as a comment",
                line_no
            );
        }
    }
}

/// Scans source text with the given markers.
pub fn scan(source: &str, markers: &Markers) -> ScannedSource {
    Scanner::new(markers).scan(source)
}

fn parse_keyword(rest: &str) -> Option<(&str, &str)> {
    let caps = KEYWORD_PATTERN.captures(rest)?;
    let keyword = caps.name("keyword")?.as_str();
    let payload = caps.name("payload").map_or("", |m| m.as_str());
    Some((keyword, payload))
}

/// Drops the single space that conventionally follows a marker.
fn strip_separator(rest: &str) -> &str {
    rest.strip_prefix(' ').unwrap_or(rest)
}

fn scan_error(kind: &str, line: usize, message: String) -> WeaveError {
    WeaveError::Scan {
        kind: kind.to_string(),
        location: TextLocation::line_only(line),
        message,
    }
}

fn push_line(result: &mut ScannedSource, line: usize, text: &str, kind: LineKind) {
    result.lines.push(SourceLine {
        line,
        text: text.to_string(),
        kind,
    });
}

fn push_directive(
    result: &mut ScannedSource,
    raw: &[&str],
    start: usize,
    end: usize,
    directive: Directive,
) {
    let index = result.directives.len();
    result.directives.push(directive);
    for (i, text) in raw.iter().enumerate().take(end + 1).skip(start) {
        push_line(result, i + 1, text, LineKind::Directive(index));
    }
}
