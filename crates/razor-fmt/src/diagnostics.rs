//! Parser diagnostics data model.
//!
//! Diagnostics only matter to the formatter as a soundness signal: re-parsing formatted text must
//! yield the same multiset of `(severity, id)` pairs as the original. Locations are carried for
//! callers but ignored by the comparison.

use std::ops::Range;

/// Diagnostic severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticSeverity {
    /// Error diagnostics.
    Error,
    /// Warning diagnostics.
    Warning,
    /// Informational diagnostics.
    Information,
    /// Hint diagnostics.
    Hint,
}

/// A single diagnostic item reported by a [`DocumentParser`](crate::DocumentParser).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Diagnostic range in character offsets.
    pub range: Range<usize>,
    /// Diagnostic severity.
    pub severity: DiagnosticSeverity,
    /// Stable diagnostic id (e.g. `"RZ1006"`).
    pub id: String,
    /// Diagnostic message.
    pub message: String,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(range: Range<usize>, id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            range,
            severity: DiagnosticSeverity::Error,
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(range: Range<usize>, id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            range,
            severity: DiagnosticSeverity::Warning,
            id: id.into(),
            message: message.into(),
        }
    }
}

/// The location-free multiset of `(severity, id)` pairs, as a sorted vector.
pub fn diagnostic_signature(diagnostics: &[Diagnostic]) -> Vec<(DiagnosticSeverity, &str)> {
    let mut signature = diagnostics
        .iter()
        .map(|d| (d.severity, d.id.as_str()))
        .collect::<Vec<_>>();
    signature.sort_unstable();
    signature
}
