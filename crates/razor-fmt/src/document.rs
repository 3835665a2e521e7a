//! The parser seam: host text in, tree plus embedded document out.

use crate::diagnostics::Diagnostic;
use crate::embedded::EmbeddedDocument;
use crate::source_text::SourceText;
use crate::syntax::SyntaxTree;
use std::sync::Arc;

/// Everything the formatter needs to know about one revision of the host document.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// The syntax tree.
    pub tree: Arc<SyntaxTree>,
    /// Parser diagnostics.
    pub diagnostics: Vec<Diagnostic>,
    /// The generated embedded document.
    pub embedded: Arc<EmbeddedDocument>,
}

impl ParsedDocument {
    /// Bundle parser output.
    pub fn new(tree: SyntaxTree, diagnostics: Vec<Diagnostic>, embedded: EmbeddedDocument) -> Self {
        Self {
            tree: Arc::new(tree),
            diagnostics,
            embedded: Arc::new(embedded),
        }
    }
}

/// Produces a [`ParsedDocument`] for a host text.
///
/// Parsing never fails: syntax errors surface as diagnostics and missing nodes.
pub trait DocumentParser: Send + Sync {
    /// Parse `text`.
    fn parse(&self, text: &SourceText) -> ParsedDocument;
}

impl<P: DocumentParser + ?Sized> DocumentParser for Arc<P> {
    fn parse(&self, text: &SourceText) -> ParsedDocument {
        (**self).parse(text)
    }
}

impl<P: DocumentParser + ?Sized> DocumentParser for &P {
    fn parse(&self, text: &SourceText) -> ParsedDocument {
        (**self).parse(text)
    }
}
