//! Raw embedded formatting pass.
//!
//! Formats the whole embedded document once, without annotations, and reports the textual
//! difference in embedded coordinates. The pipeline keeps only the in-line parts (spacing inside a
//! line, trailing whitespace) that map back into the host document.

use super::PassOutput;
use crate::bridge::{EmbeddedFormatRequest, EmbeddedFormatter};
use crate::cancel::CancellationToken;
use crate::context::FormattingContext;
use crate::diff::diff_texts;
use crate::edit::TextChange;
use crate::error::Interrupt;
use crate::source_text::SourceText;

pub(crate) async fn run<E: EmbeddedFormatter>(
    context: &FormattingContext,
    formatter: &E,
    cancel: &CancellationToken,
) -> Result<PassOutput, Interrupt> {
    let embedded = context.embedded();
    if embedded.mappings.is_empty() {
        return Ok(PassOutput::embedded(Vec::new()));
    }

    cancel.check()?;
    let request = EmbeddedFormatRequest {
        text: embedded.text.as_str().to_string(),
        annotations: Vec::new(),
        options: *context.options(),
    };
    let outcome = formatter.format(request).await;
    cancel.check()?;

    match outcome {
        Ok(result) => Ok(PassOutput::embedded(
            diff_texts(embedded.text.as_str(), &result.text)
                .into_iter()
                .flat_map(|change| split_at_line_breaks(&embedded.text, change))
                .collect(),
        )),
        Err(err) => {
            tracing::warn!(error = %err, "embedded formatter failed; skipping raw formatting");
            Ok(PassOutput::embedded(Vec::new()))
        }
    }
}

/// Split a change whose old and new text hold the same number of line breaks into one change per
/// line segment.
///
/// A diff hunk like `"   \n    "` -> `"\n        "` mixes trailing whitespace with the next line's
/// indentation; split up, the trailing part can still map back into the host document.
fn split_at_line_breaks(original: &SourceText, change: TextChange) -> Vec<TextChange> {
    let old = original.slice(change.span.clone());
    let breaks = old.matches('\n').count();
    if breaks == 0 || breaks != change.new_text.matches('\n').count() {
        return vec![change];
    }

    let mut changes = Vec::new();
    let mut start = change.span.start;
    for (old_segment, new_segment) in old.split('\n').zip(change.new_text.split('\n')) {
        let len = old_segment.chars().count();
        if old_segment != new_segment {
            changes.push(TextChange::new(start..start + len, new_segment));
        }
        start += len + 1;
    }
    changes
}
