//! Error types for the formatter.

use thiserror::Error;

/// Errors produced while applying text changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// A change range runs past the end of the text (or is reversed).
    #[error("edit range {start}..{end} is out of bounds (text length {len})")]
    OutOfBounds {
        /// Range start offset.
        start: usize,
        /// Range end offset.
        end: usize,
        /// Character count of the text.
        len: usize,
    },

    /// Two changes overlap.
    #[error("edits overlap at offset {0}")]
    Overlapping(usize),
}

/// Request-boundary errors: the caller violated the API contract.
///
/// Recoverable situations (an unmapped line, an embedded formatter without an opinion) never
/// surface here; they degrade to "no edit".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The formatting options are unusable.
    #[error("invalid formatting options: {0}")]
    InvalidOptions(&'static str),

    /// A range or position lies outside the document.
    #[error("position {line}:{column} is outside the document")]
    InvalidPosition {
        /// Zero-based line.
        line: usize,
        /// Zero-based column.
        column: usize,
    },

    /// A character offset lies outside the document.
    #[error("offset {0} is outside the document")]
    InvalidOffset(usize),

    /// Caller-supplied edits could not be applied.
    #[error("invalid edits: {0}")]
    InvalidEdits(#[from] EditError),
}

/// Errors reported by an [`EmbeddedFormatter`](crate::EmbeddedFormatter) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbeddedFormatterError {
    /// The formatter (or the process hosting it) is not reachable.
    #[error("embedded formatter unavailable: {0}")]
    Unavailable(String),

    /// The formatter ran but failed.
    #[error("embedded formatter failed: {0}")]
    Failed(String),
}

/// Non-error early exit from the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// The request's cancellation token fired.
    Cancelled,
}
