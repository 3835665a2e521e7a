//! Embedded formatter bridge.
//!
//! The embedded formatter is the expensive collaborator: it may live in another process. The
//! bridge asks it about a whole batch of embedded-document offsets in one call and turns its
//! answer into one [`EmbeddedIndentation`] per offset.
//!
//! Each offset is turned into an annotation on a scratch copy of the embedded text:
//!
//! - A non-whitespace character is annotated in place.
//! - Whitespace (or the end of the text) does not survive reformatting, so a `/**/` marker is
//!   inserted there and the marker is annotated instead.
//!
//! After formatting, the indentation of the line holding each annotation is the formatter's
//! opinion for that offset, unless the annotation sits inside a construct whose indentation the
//! formatter does not decide reliably (multi-line strings, non-empty initializers).

use crate::cancel::CancellationToken;
use crate::context::FormattingContext;
use crate::error::{EmbeddedFormatterError, Interrupt};
use crate::options::FormattingOptions;
use crate::source_text::{SourceText, indentation_columns};
use crate::workspace::WorkspacePool;
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::ops::Range;
use std::sync::Arc;

/// Marker inserted at whitespace offsets.
pub const MARKER: &str = "/**/";

/// One formatting request for the embedded formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedFormatRequest {
    /// Embedded-language source text.
    pub text: String,
    /// Character positions to track; each points at a non-whitespace character.
    pub annotations: Vec<usize>,
    /// Indentation settings.
    pub options: FormattingOptions,
}

/// The embedded formatter's answer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmbeddedFormatResult {
    /// Formatted text.
    pub text: String,
    /// For each request annotation (same order), its new position in `text`.
    pub annotations: Vec<Option<usize>>,
    /// Syntax nodes of interest, in `text` coordinates.
    pub nodes: Vec<EmbeddedNode>,
}

/// Node kinds reported by the embedded formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbeddedNodeKind {
    /// A string literal, including its quotes.
    StringLiteral,
    /// The text part of an interpolated string.
    InterpolatedStringText,
    /// `{ ... }` of an array initializer.
    ArrayInitializer,
    /// `{ ... }` of an object initializer.
    ObjectInitializer,
    /// `{ ... }` of a collection initializer.
    CollectionInitializer,
    /// `new T(...)`.
    ObjectCreation,
    /// `new[] { ... }`.
    ImplicitArrayCreation,
    /// `new() { ... }`.
    ImplicitObjectCreation,
}

impl EmbeddedNodeKind {
    fn is_string(self) -> bool {
        matches!(self, Self::StringLiteral | Self::InterpolatedStringText)
    }

    fn is_initializer(self) -> bool {
        matches!(
            self,
            Self::ArrayInitializer | Self::ObjectInitializer | Self::CollectionInitializer
        )
    }

    fn is_implicit_creation(self) -> bool {
        matches!(self, Self::ImplicitArrayCreation | Self::ImplicitObjectCreation)
    }
}

/// A node in the formatted embedded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedNode {
    /// Node kind.
    pub kind: EmbeddedNodeKind,
    /// Character range in [`EmbeddedFormatResult::text`].
    pub span: Range<usize>,
    /// Index of the parent node in [`EmbeddedFormatResult::nodes`].
    pub parent: Option<usize>,
}

/// Formats embedded-language text while tracking annotated positions.
pub trait EmbeddedFormatter: Send + Sync {
    /// Format `request.text`.
    fn format(
        &self,
        request: EmbeddedFormatRequest,
    ) -> impl Future<Output = Result<EmbeddedFormatResult, EmbeddedFormatterError>> + Send;
}

impl<E: EmbeddedFormatter> EmbeddedFormatter for Arc<E> {
    fn format(
        &self,
        request: EmbeddedFormatRequest,
    ) -> impl Future<Output = Result<EmbeddedFormatResult, EmbeddedFormatterError>> + Send {
        (**self).format(request)
    }
}

impl<E: EmbeddedFormatter> EmbeddedFormatter for &E {
    fn format(
        &self,
        request: EmbeddedFormatRequest,
    ) -> impl Future<Output = Result<EmbeddedFormatResult, EmbeddedFormatterError>> + Send {
        (**self).format(request)
    }
}

/// The embedded formatter's opinion about one offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbeddedIndentation {
    /// Desired indentation column of the offset's line.
    Column(usize),
    /// No usable opinion: leave the line as it is.
    Unchanged,
}

/// Ask the embedded formatter for the indentation of every offset in `offsets`.
///
/// Offsets are embedded-document positions. The formatter is invoked at most once; an empty offset
/// set returns an empty map without invoking it.
pub async fn get_indentations<E: EmbeddedFormatter>(
    context: &FormattingContext,
    formatter: &E,
    offsets: &BTreeSet<usize>,
    pool: &WorkspacePool,
    cancel: &CancellationToken,
) -> Result<BTreeMap<usize, EmbeddedIndentation>, Interrupt> {
    if offsets.is_empty() {
        return Ok(BTreeMap::new());
    }
    cancel.check()?;

    let mut lease = pool.acquire();
    let workspace = &mut *lease;
    let slots = annotate(
        &context.embedded().text,
        offsets,
        &mut workspace.text,
        &mut workspace.annotations,
    );
    tracing::trace!(
        offsets = offsets.len(),
        annotations = lease.annotations.len(),
        "invoking embedded formatter"
    );

    let request = EmbeddedFormatRequest {
        text: lease.text.clone(),
        annotations: lease.annotations.clone(),
        options: *context.options(),
    };
    let outcome = formatter.format(request).await;
    drop(lease);
    cancel.check()?;

    let result = match outcome {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!(error = %err, "embedded formatter failed; leaving lines unchanged");
            return Ok(offsets
                .iter()
                .map(|&offset| (offset, EmbeddedIndentation::Unchanged))
                .collect());
        }
    };

    let formatted = SourceText::new(&result.text);
    let tab_size = context.options().tab_size;
    Ok(slots
        .into_iter()
        .map(|(offset, slot)| {
            let indentation = result
                .annotations
                .get(slot)
                .copied()
                .flatten()
                .filter(|&position| !is_excluded(&formatted, &result.nodes, position))
                .map_or(EmbeddedIndentation::Unchanged, |position| {
                    let leading = formatted.leading_whitespace(formatted.line_of(position));
                    EmbeddedIndentation::Column(indentation_columns(
                        formatted.chars_in(leading),
                        tab_size,
                    ))
                });
            (offset, indentation)
        })
        .collect())
}

/// Build the annotated copy of `source` into `out`. Returns `(offset, annotation index)` pairs.
fn annotate(
    source: &SourceText,
    offsets: &BTreeSet<usize>,
    out: &mut String,
    annotations: &mut Vec<usize>,
) -> Vec<(usize, usize)> {
    let mut slots = Vec::with_capacity(offsets.len());
    let mut pending = offsets.iter().copied().peekable();
    let mut written = 0usize;

    for (index, ch) in source.as_str().chars().enumerate() {
        if pending.peek() == Some(&index) {
            pending.next();
            slots.push((index, annotations.len()));
            annotations.push(written);
            if ch.is_whitespace() {
                out.push_str(MARKER);
                written += MARKER.len();
            }
        }
        out.push(ch);
        written += 1;
    }

    // Offsets at or past the end share one marker.
    let trailing = pending.collect::<Vec<_>>();
    if !trailing.is_empty() {
        let slot = annotations.len();
        annotations.push(written);
        out.push_str(MARKER);
        slots.extend(trailing.into_iter().map(|offset| (offset, slot)));
    }
    slots
}

fn is_excluded(text: &SourceText, nodes: &[EmbeddedNode], position: usize) -> bool {
    nodes.iter().any(|node| {
        let span = &node.span;
        if node.kind.is_string() {
            return span.start < position
                && position < span.end
                && text.chars_in(span.clone()).any(|ch| ch == '\n');
        }
        if !node.kind.is_initializer() || !(span.start <= position && position < span.end) {
            return false;
        }
        if !is_non_empty_initializer(text, span) {
            return false;
        }
        let on_brace = position == span.start || position + 1 == span.end;
        let exempt = node.kind == EmbeddedNodeKind::ArrayInitializer
            && on_brace
            && node
                .parent
                .and_then(|parent| nodes.get(parent))
                .is_some_and(|parent| parent.kind.is_implicit_creation());
        !exempt
    })
}

fn is_non_empty_initializer(text: &SourceText, span: &Range<usize>) -> bool {
    if span.end <= span.start + 2 {
        return false;
    }
    text.chars_in(span.start + 1..span.end - 1)
        .any(|ch| !ch.is_whitespace())
}
