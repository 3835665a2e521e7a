//! Request-level entry points.

use crate::bridge::EmbeddedFormatter;
use crate::cancel::CancellationToken;
use crate::context::FormattingContext;
use crate::document::DocumentParser;
use crate::edit::{Edit, TextChange, TextRange, changes_from_edits, edits_from_changes};
use crate::error::{FormatError, Interrupt};
use crate::markup::{MarkupFormatter, NoMarkupFormatter};
use crate::merge::merge;
use crate::options::FormattingOptions;
use crate::passes::{Collaborators, Pipeline, PipelineOutcome, RequestKind};
use crate::source_text::SourceText;
use crate::syntax::NodeKind;
use crate::workspace::WorkspacePool;
use razor_fmt_lang::is_on_type_trigger;

/// Result of a formatting request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    /// Non-overlapping edits against the request text, in document order.
    Edits(Vec<Edit>),
    /// The trigger is in markup; the host editor's markup formatter should handle it.
    DelegateToHost,
    /// The request was cancelled before its result was committed.
    Cancelled,
}

impl FormatOutcome {
    /// The edits, or an empty slice for the other outcomes.
    pub fn edits(&self) -> &[Edit] {
        match self {
            FormatOutcome::Edits(edits) => edits,
            FormatOutcome::DelegateToHost | FormatOutcome::Cancelled => &[],
        }
    }
}

/// Formats Razor documents.
///
/// The formatter owns its collaborators: a [`DocumentParser`] for the host document, an
/// [`EmbeddedFormatter`] for the generated code, and optionally a [`MarkupFormatter`].
/// Requests may run concurrently; they share only the embedded workspace pool.
#[derive(Debug)]
pub struct RazorFormatter<P, E, M = NoMarkupFormatter> {
    parser: P,
    embedded: E,
    markup: M,
    pipeline: Pipeline,
    pool: WorkspacePool,
}

impl<P, E> RazorFormatter<P, E> {
    /// Create a formatter without a markup formatter.
    pub fn new(parser: P, embedded: E) -> Self {
        Self {
            parser,
            embedded,
            markup: NoMarkupFormatter,
            pipeline: Pipeline::default(),
            pool: WorkspacePool::default(),
        }
    }
}

impl<P, E, M> RazorFormatter<P, E, M> {
    /// Use `markup` for the markup pass.
    pub fn with_markup_formatter<N>(self, markup: N) -> RazorFormatter<P, E, N> {
        RazorFormatter {
            parser: self.parser,
            embedded: self.embedded,
            markup,
            pipeline: self.pipeline,
            pool: self.pool,
        }
    }

    /// Replace the pass pipeline.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Replace the embedded workspace pool.
    pub fn with_pool(mut self, pool: WorkspacePool) -> Self {
        self.pool = pool;
        self
    }

    /// The document parser.
    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// The pass pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

impl<P, E, M> RazorFormatter<P, E, M>
where
    P: DocumentParser,
    E: EmbeddedFormatter,
    M: MarkupFormatter,
{
    /// Format the whole document.
    #[tracing::instrument(skip_all)]
    pub async fn format_document(
        &self,
        text: &str,
        options: &FormattingOptions,
        cancel: &CancellationToken,
    ) -> Result<FormatOutcome, FormatError> {
        options.validate()?;
        let source = SourceText::new(text);
        let input = FormattingContext::parse(&self.parser, source.clone(), *options);
        let result = self.run(input, RequestKind::Document, cancel).await;
        Ok(outcome(&source, result, |_| true))
    }

    /// Format the document and keep the edits touching the lines of `range`.
    #[tracing::instrument(skip_all)]
    pub async fn format_range(
        &self,
        text: &str,
        range: TextRange,
        options: &FormattingOptions,
        cancel: &CancellationToken,
    ) -> Result<FormatOutcome, FormatError> {
        options.validate()?;
        let source = SourceText::new(text);
        let line_count = source.line_count();
        for position in [range.start, range.end] {
            if position.line >= line_count {
                return Err(FormatError::InvalidPosition {
                    line: position.line,
                    column: position.column,
                });
            }
        }
        if range.start > range.end {
            return Err(FormatError::InvalidPosition {
                line: range.start.line,
                column: range.start.column,
            });
        }

        let input = FormattingContext::parse(&self.parser, source.clone(), *options);
        let result = self.run(input, RequestKind::Range, cancel).await;
        Ok(outcome(&source, result, |edit| {
            edit.range.overlaps_lines(range.start.line, range.end.line)
        }))
    }

    /// Format after `trigger_char` was typed; `trigger_offset` is the offset just past it.
    #[tracing::instrument(skip_all, fields(trigger = ?trigger_char))]
    pub async fn format_on_type(
        &self,
        text: &str,
        trigger_offset: usize,
        trigger_char: char,
        options: &FormattingOptions,
        cancel: &CancellationToken,
    ) -> Result<FormatOutcome, FormatError> {
        options.validate()?;
        let source = SourceText::new(text);
        if trigger_offset > source.len_chars() {
            return Err(FormatError::InvalidOffset(trigger_offset));
        }
        if !is_on_type_trigger(trigger_char) || trigger_offset == 0 {
            return Ok(FormatOutcome::Edits(Vec::new()));
        }
        let typed = trigger_offset - 1;
        if source.char_at(typed) != Some(trigger_char) {
            tracing::debug!(offset = typed, "trigger character is not at the trigger offset");
            return Ok(FormatOutcome::Edits(Vec::new()));
        }

        let input = FormattingContext::parse(&self.parser, source.clone(), *options);
        let in_markup = input
            .tree()
            .locate_owner(typed)
            .is_some_and(|node| *node.kind() == NodeKind::MarkupText);
        if in_markup {
            return Ok(FormatOutcome::DelegateToHost);
        }

        let (first, last) = affected_lines(&source, typed, trigger_char);
        let result = self.run(input, RequestKind::OnType, cancel).await;
        Ok(outcome(&source, result, |edit| {
            edit.range.overlaps_lines(first, last)
        }))
    }

    /// Apply `edits` and format the result without validation.
    ///
    /// Returns one minimal diff against `text`, limited to the lines the edits touch. Meant for
    /// trusted callers such as code actions.
    #[tracing::instrument(skip_all, fields(edits = edits.len()))]
    pub async fn format_snippet(
        &self,
        text: &str,
        edits: &[Edit],
        options: &FormattingOptions,
        cancel: &CancellationToken,
    ) -> Result<FormatOutcome, FormatError> {
        options.validate()?;
        let source = SourceText::new(text);
        let changes = changes_from_edits(&source, edits);
        let applied = source.apply_changes(&changes)?;

        let touched = changes
            .iter()
            .map(|change| {
                (
                    source.line_of(change.span.start),
                    source.line_of(change.span.end),
                )
            })
            .collect::<Vec<_>>();

        let input = FormattingContext::parse(&self.parser, applied, *options);
        let result = self.run(input, RequestKind::Snippet, cancel).await;
        Ok(outcome(&source, result, |edit| {
            touched
                .iter()
                .any(|&(first, last)| edit.range.overlaps_lines(first, last))
        }))
    }

    /// Run the pipeline and return the formatted text.
    ///
    /// `Ok(None)` means a validation pass rejected the result.
    async fn run(
        &self,
        input: FormattingContext,
        request: RequestKind,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, Interrupt> {
        cancel.check()?;
        let env = Collaborators {
            parser: &self.parser,
            embedded: &self.embedded,
            markup: &self.markup,
            pool: &self.pool,
            cancel,
        };
        let formatted = match self.pipeline.run(&env, input, request).await? {
            PipelineOutcome::Formatted(context) => context,
            PipelineOutcome::Rejected(pass) => {
                tracing::debug!(?pass, "returning no edits");
                return Ok(None);
            }
        };
        cancel.check()?;
        Ok(Some(formatted.text().as_str().to_string()))
    }
}

fn outcome(
    original: &SourceText,
    result: Result<Option<String>, Interrupt>,
    keep: impl Fn(&Edit) -> bool,
) -> FormatOutcome {
    match result {
        Err(Interrupt::Cancelled) => FormatOutcome::Cancelled,
        Ok(None) => FormatOutcome::Edits(Vec::new()),
        Ok(Some(formatted)) => {
            let replacement = TextChange::new(0..original.len_chars(), formatted);
            let changes = match merge(original, &[replacement]) {
                Ok(changes) => changes,
                Err(err) => {
                    tracing::warn!(error = %err, "could not merge the formatted text; returning no edits");
                    return FormatOutcome::Edits(Vec::new());
                }
            };
            let edits = edits_from_changes(original, &changes)
                .into_iter()
                .filter(|edit| keep(edit))
                .collect();
            FormatOutcome::Edits(edits)
        }
    }
}

/// Lines an on-type request may touch, inclusive.
fn affected_lines(text: &SourceText, typed: usize, trigger: char) -> (usize, usize) {
    let line = text.line_of(typed);
    match trigger {
        '\n' => (line, (line + 1).min(text.line_count().saturating_sub(1))),
        '}' => (matching_open_brace(text, typed).map_or(line, |open| text.line_of(open)), line),
        _ => (line, line),
    }
}

/// The `{` that `}` at `close` closes, scanning backwards.
fn matching_open_brace(text: &SourceText, close: usize) -> Option<usize> {
    let mut depth = 0usize;
    for offset in (0..close).rev() {
        match text.char_at(offset)? {
            '}' => depth += 1,
            '{' if depth == 0 => return Some(offset),
            '{' => depth -= 1,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{EmbeddedFormatRequest, EmbeddedFormatResult};
    use crate::document::ParsedDocument;
    use crate::edit::Position;
    use crate::embedded::{EmbeddedDocument, SourceMapping};
    use crate::error::EmbeddedFormatterError;
    use crate::syntax::TreeBuilder;
    use pretty_assertions::assert_eq;

    const PREFIX: &str = "namespace N\n{\nclass C\n{\nvoid M()\n{\n";

    /// `@{...}` becomes a statement block mapped into a method; anything else is plain markup.
    struct BlockParser;

    impl DocumentParser for BlockParser {
        fn parse(&self, text: &SourceText) -> ParsedDocument {
            let len = text.len_chars();
            let host = text.as_str();
            let mut b = TreeBuilder::new();
            if !(host.starts_with("@{") && host.ends_with('}') && len >= 3) {
                b.start_node(NodeKind::MarkupBlock);
                b.leaf(NodeKind::MarkupText, 0..len);
                b.finish_node();
                return ParsedDocument::new(b.finish(), Vec::new(), EmbeddedDocument::empty());
            }

            b.start_node(NodeKind::StatementBlock);
            b.leaf(NodeKind::Transition, 0..1);
            b.leaf(NodeKind::MetaCode, 1..2);
            b.start_node(NodeKind::CodeBlock);
            b.leaf(NodeKind::CodeText, 2..len - 1);
            b.finish_node();
            b.leaf(NodeKind::MetaCode, len - 1..len);
            b.finish_node();

            let body = text.slice(2..len - 1);
            let start = PREFIX.chars().count();
            let body_len = body.chars().count();
            let generated = format!("{PREFIX}{body}}}\n}}\n}}\n");
            let mapping = SourceMapping::new(2..2 + body_len, start..start + body_len);
            ParsedDocument::new(
                b.finish(),
                Vec::new(),
                EmbeddedDocument::new(SourceText::new(&generated), vec![mapping], true),
            )
        }
    }

    /// Leaves unannotated requests alone and puts annotated characters at method-body depth.
    struct MethodDepth;

    impl EmbeddedFormatter for MethodDepth {
        async fn format(
            &self,
            request: EmbeddedFormatRequest,
        ) -> Result<EmbeddedFormatResult, EmbeddedFormatterError> {
            if request.annotations.is_empty() {
                return Ok(EmbeddedFormatResult {
                    text: request.text,
                    ..EmbeddedFormatResult::default()
                });
            }
            let chars = request.text.chars().collect::<Vec<_>>();
            let mut text = String::new();
            let mut annotations = Vec::new();
            for &position in &request.annotations {
                text.push_str(&" ".repeat(12));
                annotations.push(Some(text.chars().count()));
                text.push(chars.get(position).copied().unwrap_or(' '));
                text.push('\n');
            }
            Ok(EmbeddedFormatResult {
                text,
                annotations,
                nodes: Vec::new(),
            })
        }
    }

    /// Inserts a stray character, which validation must reject.
    struct Vandal;

    impl MarkupFormatter for Vandal {
        fn format(&self, _text: &SourceText, _options: &FormattingOptions) -> Vec<Edit> {
            vec![Edit::new(
                TextRange::new(Position::new(0, 0), Position::new(0, 0)),
                "z",
            )]
        }
    }

    fn formatter() -> RazorFormatter<BlockParser, MethodDepth> {
        RazorFormatter::new(BlockParser, MethodDepth)
    }

    fn apply(text: &str, outcome: &FormatOutcome) -> String {
        let source = SourceText::new(text);
        let changes = changes_from_edits(&source, outcome.edits());
        source.apply_changes(&changes).unwrap().as_str().to_string()
    }

    const BLOCK: &str = "@{\n x;\n}";

    #[tokio::test]
    async fn test_document_formatting() {
        let outcome = formatter()
            .format_document(BLOCK, &FormattingOptions::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            FormatOutcome::Edits(vec![Edit::new(
                TextRange::new(Position::new(1, 1), Position::new(1, 1)),
                "   "
            )])
        );
        assert_eq!(apply(BLOCK, &outcome), "@{\n    x;\n}");
    }

    #[tokio::test]
    async fn test_invalid_options_are_rejected() {
        let err = formatter()
            .format_document(
                BLOCK,
                &FormattingOptions::default().with_tab_size(0),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FormatError::InvalidOptions(_)));
    }

    #[tokio::test]
    async fn test_cancelled_request() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = formatter()
            .format_document(BLOCK, &FormattingOptions::default(), &cancel)
            .await
            .unwrap();
        assert_eq!(outcome, FormatOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_range_filters_by_line() {
        let options = FormattingOptions::default();
        let cancel = CancellationToken::new();
        let formatter = formatter();

        let first = formatter
            .format_range(BLOCK, TextRange::lines(0, 0), &options, &cancel)
            .await
            .unwrap();
        assert_eq!(first, FormatOutcome::Edits(Vec::new()));

        let second = formatter
            .format_range(BLOCK, TextRange::lines(1, 1), &options, &cancel)
            .await
            .unwrap();
        assert_eq!(second.edits().len(), 1);

        let err = formatter
            .format_range(BLOCK, TextRange::lines(5, 6), &options, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, FormatError::InvalidPosition { line: 5, column: 0 });
    }

    #[tokio::test]
    async fn test_on_type_semicolon() {
        let outcome = formatter()
            .format_on_type(BLOCK, 6, ';', &FormattingOptions::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(apply(BLOCK, &outcome), "@{\n    x;\n}");
    }

    #[tokio::test]
    async fn test_on_type_trigger_checks() {
        let options = FormattingOptions::default();
        let cancel = CancellationToken::new();
        let formatter = formatter();

        let unknown = formatter
            .format_on_type(BLOCK, 5, 'x', &options, &cancel)
            .await
            .unwrap();
        assert_eq!(unknown, FormatOutcome::Edits(Vec::new()));

        let mismatch = formatter
            .format_on_type(BLOCK, 5, ';', &options, &cancel)
            .await
            .unwrap();
        assert_eq!(mismatch, FormatOutcome::Edits(Vec::new()));

        let err = formatter
            .format_on_type(BLOCK, 99, ';', &options, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, FormatError::InvalidOffset(99));
    }

    #[tokio::test]
    async fn test_on_type_in_markup_delegates() {
        let outcome = formatter()
            .format_on_type(
                "<p>;</p>",
                4,
                ';',
                &FormattingOptions::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(outcome, FormatOutcome::DelegateToHost);
    }

    #[tokio::test]
    async fn test_snippet_is_formatted_against_original() {
        let insert = Edit::new(
            TextRange::new(Position::new(1, 3), Position::new(1, 3)),
            "\n y;",
        );
        let outcome = formatter()
            .format_snippet(
                BLOCK,
                &[insert],
                &FormattingOptions::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(apply(BLOCK, &outcome), "@{\n    x;\n    y;\n}");
    }

    #[tokio::test]
    async fn test_overlapping_snippet_edits_are_rejected() {
        let edits = [
            Edit::new(TextRange::new(Position::new(1, 0), Position::new(1, 2)), ""),
            Edit::new(TextRange::new(Position::new(1, 1), Position::new(1, 3)), ""),
        ];
        let err = formatter()
            .format_snippet(
                BLOCK,
                &edits,
                &FormattingOptions::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FormatError::InvalidEdits(_)));
    }

    #[tokio::test]
    async fn test_content_changes_are_discarded() {
        let outcome = formatter()
            .with_markup_formatter(Vandal)
            .format_document("<p></p>", &FormattingOptions::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, FormatOutcome::Edits(Vec::new()));
    }

    #[test]
    fn test_affected_lines() {
        let text = SourceText::new("@{\n if (a) {\n  b;\n }\n}");
        assert_eq!(affected_lines(&text, 19, '}'), (1, 3));
        assert_eq!(affected_lines(&text, 2, '\n'), (0, 1));
        assert_eq!(affected_lines(&text, 16, ';'), (2, 2));
    }
}
