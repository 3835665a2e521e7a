//! Validation passes.

use crate::context::FormattingContext;
use crate::merge::{preserves_content, preserves_diagnostics};

/// The formatted text differs from the input in whitespace only.
pub(crate) fn content(input: &FormattingContext, current: &FormattingContext) -> bool {
    preserves_content(input.text().as_str(), current.text().as_str())
}

/// Re-parsing the formatted text yields the input's diagnostics, ignoring locations.
pub(crate) fn diagnostics(input: &FormattingContext, current: &FormattingContext) -> bool {
    preserves_diagnostics(input.diagnostics(), current.diagnostics())
}
