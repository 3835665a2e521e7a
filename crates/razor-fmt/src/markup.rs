//! The markup formatter seam.

use crate::edit::Edit;
use crate::options::FormattingOptions;
use crate::source_text::SourceText;

/// Formats the markup portion of a host document.
///
/// Edits are in host coordinates and must not overlap. They should only touch whitespace; the
/// pipeline validates the final result either way.
pub trait MarkupFormatter: Send + Sync {
    /// Returns `false` to skip the markup pass entirely.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Compute markup edits for `text`.
    fn format(&self, text: &SourceText, options: &FormattingOptions) -> Vec<Edit>;
}

/// A markup formatter that never runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMarkupFormatter;

impl MarkupFormatter for NoMarkupFormatter {
    fn is_enabled(&self) -> bool {
        false
    }

    fn format(&self, _text: &SourceText, _options: &FormattingOptions) -> Vec<Edit> {
        Vec::new()
    }
}
