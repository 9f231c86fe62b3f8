//! Error types for litweave.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::text_location::TextLocation;

/// Crate-level error for operations outside a single weave run.
#[derive(Error, Debug)]
pub enum LitweaveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Woven document has {0} error(s)")]
    DocumentErrors(usize),

    #[error("Watch error: {0}")]
    Watch(String),
}

/// Result type alias for litweave operations.
pub type Result<T> = std::result::Result<T, LitweaveError>;

/// A problem tied to one directive (or to the execution trace) of a weave run.
///
/// These never abort the whole run by themselves; they are collected in the
/// woven document so that one pass reports every issue.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WeaveError {
    /// Malformed directive syntax.
    #[error("{location}: scan error in {kind} directive: {message}")]
    Scan {
        kind: String,
        location: TextLocation,
        message: String,
    },

    /// Runtime fault while executing the source or a directive payload.
    #[error("{location}: execution fault in {kind}: {message}")]
    Execution {
        kind: String,
        location: TextLocation,
        message: String,
    },

    /// Unknown directive tag, bad payload, or missing include file.
    #[error("{location}: cannot resolve {kind} directive: {message}")]
    Resolution {
        kind: String,
        location: TextLocation,
        message: String,
    },

    /// A template expression failed to evaluate.
    #[error("{location}: cannot substitute `{expression}` in {kind} directive: {message}")]
    Substitution {
        kind: String,
        location: TextLocation,
        expression: String,
        message: String,
    },

    /// A figure backend failed to produce its artifact.
    #[error("{location}: {backend} backend failed to render {path}: {message}")]
    Render {
        kind: String,
        location: TextLocation,
        backend: String,
        path: String,
        message: String,
    },
}

impl WeaveError {
    /// Returns the location the error refers to.
    pub fn location(&self) -> &TextLocation {
        match self {
            Self::Scan { location, .. }
            | Self::Execution { location, .. }
            | Self::Resolution { location, .. }
            | Self::Substitution { location, .. }
            | Self::Render { location, .. } => location,
        }
    }

    /// Returns the directive kind (or `code` for plain source lines).
    pub fn kind(&self) -> &str {
        match self {
            Self::Scan { kind, .. }
            | Self::Execution { kind, .. }
            | Self::Resolution { kind, .. }
            | Self::Substitution { kind, .. }
            | Self::Render { kind, .. } => kind,
        }
    }

    /// Attaches a filename to the error location.
    pub fn with_filename(mut self, filename: PathBuf) -> Self {
        let location = match &mut self {
            Self::Scan { location, .. }
            | Self::Execution { location, .. }
            | Self::Resolution { location, .. }
            | Self::Substitution { location, .. }
            | Self::Render { location, .. } => location,
        };
        location.filename = Some(filename);
        self
    }
}
