//! Host-language errors.

use std::fmt;

use thiserror::Error;

/// Python-style exception class of a host error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostErrorKind {
    SyntaxError,
    NameError,
    TypeError,
    ValueError,
    ZeroDivisionError,
    IndexError,
    OverflowError,
    RecursionError,
}

impl fmt::Display for HostErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An error raised while parsing or running host code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct HostError {
    pub kind: HostErrorKind,
    pub message: String,
    /// Source line, when known.
    pub line: Option<usize>,
}

impl HostError {
    pub fn new(kind: HostErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
        }
    }

    pub fn syntax(message: impl Into<String>, line: usize) -> Self {
        Self::new(HostErrorKind::SyntaxError, message).at_line(line)
    }

    pub fn name(name: &str) -> Self {
        Self::new(
            HostErrorKind::NameError,
            format!("name '{}' is not defined", name),
        )
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(HostErrorKind::TypeError, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(HostErrorKind::ValueError, message)
    }

    pub fn zero_division() -> Self {
        Self::new(HostErrorKind::ZeroDivisionError, "division by zero")
    }

    pub fn overflow() -> Self {
        Self::new(HostErrorKind::OverflowError, "integer overflow")
    }

    /// Records the line, keeping the innermost one if already set.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line.get_or_insert(line);
        self
    }
}

pub type HostResult<T> = std::result::Result<T, HostError>;
