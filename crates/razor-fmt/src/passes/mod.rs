//! The formatting pass pipeline.
//!
//! Passes run in a fixed order. Each edit pass reads the current [`FormattingContext`] and returns
//! a [`PassOutput`]; when it changes the text, the pipeline re-parses and continues with a fresh
//! context. Validation passes compare the final context against the pipeline input and reject the
//! whole result when it is unsound.
//!
//! | pass | order | on-type | snippet |
//! |---|---|---|---|
//! | [`PassId::Markup`] | 10 | no | no |
//! | [`PassId::EmbeddedRaw`] | 20 | yes | yes |
//! | [`PassId::Cleanup`] | 30 | yes | yes |
//! | [`PassId::Indentation`] | 40 | yes | yes |
//! | [`PassId::ContentValidation`] | 1000 | yes | no |
//! | [`PassId::DiagnosticValidation`] | 1010 | yes | no |

mod cleanup;
mod embedded;
mod indentation;
mod markup;
mod validation;

use crate::bridge::EmbeddedFormatter;
use crate::cancel::CancellationToken;
use crate::context::FormattingContext;
use crate::document::DocumentParser;
use crate::edit::TextChange;
use crate::error::Interrupt;
use crate::markup::MarkupFormatter;
use crate::workspace::WorkspacePool;

/// Identifies a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassId {
    /// Applies the markup formatter's edits.
    Markup,
    /// Keeps the embedded formatter's in-line spacing changes.
    EmbeddedRaw,
    /// Normalizes whitespace around block delimiters and in directive lines.
    Cleanup,
    /// Reconciles line indentation.
    Indentation,
    /// Rejects results that change non-whitespace content.
    ContentValidation,
    /// Rejects results that change parser diagnostics.
    DiagnosticValidation,
}

/// What a pass does with the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Produces edits.
    Edit,
    /// Accepts or rejects the accumulated result.
    Validation,
}

/// Static description of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassDescriptor {
    /// Pass identity.
    pub id: PassId,
    /// Execution order; lower runs first.
    pub order: u32,
    /// Edit or validation pass.
    pub kind: PassKind,
    /// Runs for on-type requests.
    pub on_type: bool,
    /// Runs for trusted snippet requests.
    pub snippet: bool,
}

impl PassDescriptor {
    const fn new(id: PassId, order: u32, kind: PassKind, on_type: bool, snippet: bool) -> Self {
        Self {
            id,
            order,
            kind,
            on_type,
            snippet,
        }
    }

    /// Returns `true` if the pass runs for `request`.
    pub fn applies_to(&self, request: RequestKind) -> bool {
        match request {
            RequestKind::Document | RequestKind::Range => true,
            RequestKind::OnType => self.on_type,
            RequestKind::Snippet => self.snippet,
        }
    }
}

/// Built-in passes in execution order.
pub const DEFAULT_PASSES: [PassDescriptor; 6] = [
    PassDescriptor::new(PassId::Markup, 10, PassKind::Edit, false, false),
    PassDescriptor::new(PassId::EmbeddedRaw, 20, PassKind::Edit, true, true),
    PassDescriptor::new(PassId::Cleanup, 30, PassKind::Edit, true, true),
    PassDescriptor::new(PassId::Indentation, 40, PassKind::Edit, true, true),
    PassDescriptor::new(PassId::ContentValidation, 1000, PassKind::Validation, true, false),
    PassDescriptor::new(PassId::DiagnosticValidation, 1010, PassKind::Validation, true, false),
];

/// The request flavor a pipeline run serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Whole-document formatting.
    Document,
    /// Range formatting.
    Range,
    /// Keystroke-triggered formatting.
    OnType,
    /// Formatting of caller-applied edits from a trusted caller.
    Snippet,
}

/// Coordinate space of a pass's changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordinateSpace {
    /// Host document offsets.
    Host,
    /// Embedded document offsets.
    Embedded,
}

/// Changes produced by one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutput {
    /// Non-overlapping changes.
    pub changes: Vec<TextChange>,
    /// Coordinate space of `changes`.
    pub space: CoordinateSpace,
}

impl PassOutput {
    /// Host-space changes.
    pub fn host(changes: Vec<TextChange>) -> Self {
        Self {
            changes,
            space: CoordinateSpace::Host,
        }
    }

    /// Embedded-space changes.
    pub fn embedded(changes: Vec<TextChange>) -> Self {
        Self {
            changes,
            space: CoordinateSpace::Embedded,
        }
    }

    /// No changes.
    pub fn empty() -> Self {
        Self::host(Vec::new())
    }

    /// Express the changes in host coordinates.
    ///
    /// An embedded change survives only when it lies inside a single mapping, neither removes nor
    /// inserts a line break, and starts past the leading whitespace of its line in both documents
    /// (line indentation belongs to the reconciler).
    pub fn into_host_changes(self, context: &FormattingContext) -> Vec<TextChange> {
        match self.space {
            CoordinateSpace::Host => self.changes,
            CoordinateSpace::Embedded => {
                let text = context.text();
                let embedded = context.embedded();
                let generated = &embedded.text;
                self.changes
                    .into_iter()
                    .filter(|change| !change.new_text.contains('\n'))
                    .filter(|change| {
                        let start = change.span.start;
                        start > generated.leading_whitespace(generated.line_of(start)).end
                    })
                    .filter_map(|change| {
                        let host = embedded.map_to_original(change.span.clone())?;
                        if text.chars_in(host.clone()).any(|ch| ch == '\n') {
                            return None;
                        }
                        let leading = text.leading_whitespace(text.line_of(host.start));
                        (host.start > leading.end).then(|| TextChange::new(host, change.new_text))
                    })
                    .collect()
            }
        }
    }
}

/// The collaborators a pipeline run needs.
pub(crate) struct Collaborators<'a, P, E, M> {
    pub parser: &'a P,
    pub embedded: &'a E,
    pub markup: &'a M,
    pub pool: &'a WorkspacePool,
    pub cancel: &'a CancellationToken,
}

/// How a pipeline run ended.
#[derive(Debug)]
pub(crate) enum PipelineOutcome {
    /// All applicable passes ran; this is the final context.
    Formatted(FormattingContext),
    /// A validation pass rejected the result.
    Rejected(PassId),
}

/// An ordered list of passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    passes: Vec<PassDescriptor>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            passes: DEFAULT_PASSES.to_vec(),
        }
    }
}

impl Pipeline {
    /// Passes in execution order.
    pub fn passes(&self) -> &[PassDescriptor] {
        &self.passes
    }

    /// Drop a pass from the pipeline.
    pub fn without(mut self, id: PassId) -> Self {
        self.passes.retain(|pass| pass.id != id);
        self
    }

    /// Passes that run for `request`, in order.
    pub fn applicable(&self, request: RequestKind) -> impl Iterator<Item = &PassDescriptor> {
        self.passes.iter().filter(move |pass| pass.applies_to(request))
    }

    pub(crate) async fn run<P, E, M>(
        &self,
        env: &Collaborators<'_, P, E, M>,
        input: FormattingContext,
        request: RequestKind,
    ) -> Result<PipelineOutcome, Interrupt>
    where
        P: DocumentParser,
        E: EmbeddedFormatter,
        M: MarkupFormatter,
    {
        let mut current = input.clone();
        for pass in self.applicable(request) {
            env.cancel.check()?;

            if pass.kind == PassKind::Validation {
                let valid = match pass.id {
                    PassId::ContentValidation => validation::content(&input, &current),
                    PassId::DiagnosticValidation => validation::diagnostics(&input, &current),
                    _ => true,
                };
                if !valid {
                    tracing::warn!(pass = ?pass.id, "formatting result failed validation; discarding it");
                    return Ok(PipelineOutcome::Rejected(pass.id));
                }
                continue;
            }

            let output = match pass.id {
                PassId::Markup => {
                    if !env.markup.is_enabled() {
                        continue;
                    }
                    current = current.with_markup_formatted(true);
                    markup::run(&current, env.markup)
                }
                PassId::EmbeddedRaw => embedded::run(&current, env.embedded, env.cancel).await?,
                PassId::Cleanup => cleanup::run(&current),
                PassId::Indentation => {
                    indentation::run(&current, env.embedded, env.pool, env.cancel).await?
                }
                PassId::ContentValidation | PassId::DiagnosticValidation => PassOutput::empty(),
            };

            let changes = output.into_host_changes(&current);
            if changes.is_empty() {
                tracing::debug!(pass = ?pass.id, "pass produced no changes");
                continue;
            }
            match current.text().apply_changes(&changes) {
                Ok(text) => {
                    tracing::debug!(pass = ?pass.id, changes = changes.len(), "applied pass changes");
                    current = current.with_text(env.parser, text);
                }
                Err(err) => {
                    tracing::warn!(pass = ?pass.id, error = %err, "pass produced unusable changes; skipping it");
                }
            }
        }
        Ok(PipelineOutcome::Formatted(current))
    }
}
