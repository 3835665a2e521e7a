//! The immutable per-revision formatting context.

use crate::classifier::{SyntaxSpan, classify};
use crate::diagnostics::Diagnostic;
use crate::document::{DocumentParser, ParsedDocument};
use crate::embedded::EmbeddedDocument;
use crate::line_table::{LineIndentationInfo, LineTable};
use crate::options::FormattingOptions;
use crate::source_text::SourceText;
use crate::syntax::SyntaxTree;
use std::sync::Arc;

/// Text, tree, spans, and line table of one document revision.
///
/// A context is never mutated. Applying edits produces a fresh context through
/// [`with_text`](Self::with_text), which re-parses and re-classifies the new text.
#[derive(Debug, Clone)]
pub struct FormattingContext {
    text: SourceText,
    document: ParsedDocument,
    spans: Arc<[SyntaxSpan]>,
    line_table: Arc<LineTable>,
    options: FormattingOptions,
    markup_formatted: bool,
}

impl FormattingContext {
    /// Build a context from already parsed output.
    pub fn new(text: SourceText, document: ParsedDocument, options: FormattingOptions) -> Self {
        let spans = classify(&document.tree);
        let line_table = LineTable::build(
            &text,
            &spans,
            document.embedded.namespace_scoped,
            options.tab_size,
        );
        Self {
            text,
            document,
            spans: spans.into(),
            line_table: Arc::new(line_table),
            options,
            markup_formatted: false,
        }
    }

    /// Parse `text` and build a context.
    pub fn parse<P: DocumentParser + ?Sized>(
        parser: &P,
        text: SourceText,
        options: FormattingOptions,
    ) -> Self {
        let document = parser.parse(&text);
        Self::new(text, document, options)
    }

    /// A context for `text`, keeping this context's options and flags.
    pub fn with_text<P: DocumentParser + ?Sized>(&self, parser: &P, text: SourceText) -> Self {
        let mut next = Self::parse(parser, text, self.options);
        next.markup_formatted = self.markup_formatted;
        next
    }

    /// Mark that a markup formatter has already adjusted host indentation.
    pub fn with_markup_formatted(mut self, markup_formatted: bool) -> Self {
        self.markup_formatted = markup_formatted;
        self
    }

    /// Current text.
    pub fn text(&self) -> &SourceText {
        &self.text
    }

    /// Parser output for the current text.
    pub fn document(&self) -> &ParsedDocument {
        &self.document
    }

    /// Syntax tree of the current text.
    pub fn tree(&self) -> &SyntaxTree {
        &self.document.tree
    }

    /// Embedded document of the current text.
    pub fn embedded(&self) -> &EmbeddedDocument {
        &self.document.embedded
    }

    /// Parser diagnostics of the current text.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.document.diagnostics
    }

    /// Classified spans in document order.
    pub fn spans(&self) -> &[SyntaxSpan] {
        &self.spans
    }

    /// Per-line indentation facts.
    pub fn line_table(&self) -> &LineTable {
        &self.line_table
    }

    /// Line info for `line`.
    pub fn line(&self, line: usize) -> Option<&LineIndentationInfo> {
        self.line_table.get(line)
    }

    /// Request options.
    pub fn options(&self) -> &FormattingOptions {
        &self.options
    }

    /// Whether the markup formatter ran for this request.
    pub fn markup_formatted(&self) -> bool {
        self.markup_formatted
    }
}
