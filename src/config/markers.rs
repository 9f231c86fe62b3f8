//! Directive and template markers.

use serde::{Deserialize, Serialize};

/// Marker strings recognized in woven sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markers {
    /// Host comment prefix; block bodies and inert comments start with it.
    #[serde(default = "default_comment")]
    pub comment: String,

    /// Passthrough text line marker.
    #[serde(default = "default_text")]
    pub text: String,

    /// Output capture line marker.
    #[serde(default = "default_output")]
    pub output: String,

    /// Prefix of single-line keyword directives (`#% hidden x = 1`).
    #[serde(default = "default_keyword")]
    pub keyword: String,

    /// Opens a multi-line keyword directive.
    #[serde(default = "default_block_open")]
    pub block_open: String,

    /// Closes a multi-line keyword directive.
    #[serde(default = "default_block_close")]
    pub block_close: String,

    /// Opens an inline template expression in prose.
    #[serde(default = "default_template_open")]
    pub template_open: String,

    /// Closes an inline template expression in prose. Occurrences inside
    /// quoted strings in the expression do not count.
    #[serde(default = "default_template_close")]
    pub template_close: String,
}

fn default_comment() -> String {
    "#".to_string()
}

fn default_text() -> String {
    "#'".to_string()
}

fn default_output() -> String {
    "#>".to_string()
}

fn default_keyword() -> String {
    "#%".to_string()
}

fn default_block_open() -> String {
    "#%{".to_string()
}

fn default_block_close() -> String {
    "#%}".to_string()
}

fn default_template_open() -> String {
    "{{".to_string()
}

fn default_template_close() -> String {
    "}}".to_string()
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            comment: default_comment(),
            text: default_text(),
            output: default_output(),
            keyword: default_keyword(),
            block_open: default_block_open(),
            block_close: default_block_close(),
            template_open: default_template_open(),
            template_close: default_template_close(),
        }
    }
}

impl Markers {
    /// Checks that the markers can be told apart.
    pub fn validate(&self) -> Result<(), String> {
        let line_markers = [
            ("text", &self.text),
            ("output", &self.output),
            ("keyword", &self.keyword),
            ("block_open", &self.block_open),
            ("block_close", &self.block_close),
        ];
        for (name, marker) in &line_markers {
            if marker.is_empty() {
                return Err(format!("marker '{}' must not be empty", name));
            }
            if !marker.starts_with(&self.comment) {
                return Err(format!(
                    "marker '{}' ({}) must start with the comment prefix '{}'",
                    name, marker, self.comment
                ));
            }
        }
        for (i, (a_name, a)) in line_markers.iter().enumerate() {
            for (b_name, b) in &line_markers[i + 1..] {
                if a == b {
                    return Err(format!(
                        "markers '{}' and '{}' are both '{}'",
                        a_name, b_name, a
                    ));
                }
            }
        }
        if self.template_open.is_empty() || self.template_close.is_empty() {
            return Err("template markers must not be empty".to_string());
        }
        Ok(())
    }

    /// Formats a single-line keyword directive.
    pub fn format_keyword(&self, keyword: &str, payload: &str) -> String {
        if payload.is_empty() {
            format!("{} {}", self.keyword, keyword)
        } else {
            format!("{} {} {}", self.keyword, keyword, payload)
        }
    }

    /// Formats a block opener.
    pub fn format_block_open(&self, keyword: &str) -> String {
        format!("{} {}", self.block_open, keyword)
    }

    /// Formats one body line of a block directive.
    pub fn format_block_line(&self, line: &str) -> String {
        if line.is_empty() {
            self.comment.clone()
        } else {
            format!("{} {}", self.comment, line)
        }
    }
}
