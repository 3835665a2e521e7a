//! Markup formatter pass.

use super::PassOutput;
use crate::context::FormattingContext;
use crate::edit::changes_from_edits;
use crate::markup::MarkupFormatter;

/// Apply the markup formatter's edits. Overlapping edits discard the whole output.
pub(crate) fn run<M: MarkupFormatter>(context: &FormattingContext, formatter: &M) -> PassOutput {
    let edits = formatter.format(context.text(), context.options());
    let changes = changes_from_edits(context.text(), &edits);
    if changes
        .windows(2)
        .any(|pair| pair[1].span.start < pair[0].span.end)
    {
        tracing::warn!(
            edits = edits.len(),
            "markup formatter returned overlapping edits; ignoring them"
        );
        return PassOutput::empty();
    }
    PassOutput::host(changes)
}
