//! Per-line indentation facts derived from classified spans.

use crate::classifier::{SpanKind, SyntaxSpan};
use crate::source_text::{SourceText, indentation_columns};
use std::ops::Range;

/// What the formatter knows about one line before computing its target indentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndentationInfo {
    /// Zero-based line index.
    pub line: usize,
    /// The span owning the line's first non-whitespace character (or its start when blank).
    pub governing_span: SyntaxSpan,
    /// The line's leading whitespace range.
    pub leading_whitespace: Range<usize>,
    /// Leading whitespace length in characters.
    pub existing_indentation_chars: usize,
    /// Leading whitespace width in columns.
    pub existing_indentation_columns: usize,
    /// The line is empty or whitespace only.
    pub is_empty_or_whitespace: bool,
    /// The governing span is embedded code.
    pub starts_in_embedded_context: bool,
    /// The governing span is markup.
    pub starts_in_host_context: bool,
    /// The lowest embedded level at which the generated code can place this line.
    pub min_embedded_indent_level: usize,
}

impl LineIndentationInfo {
    /// Offset of the first non-whitespace character, if the line has one.
    pub fn first_non_whitespace(&self) -> Option<usize> {
        (!self.is_empty_or_whitespace).then_some(self.leading_whitespace.end)
    }
}

/// One [`LineIndentationInfo`] per line of a text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineTable {
    lines: Vec<LineIndentationInfo>,
}

impl LineTable {
    /// Build the table for `text` from its classified spans.
    pub fn build(
        text: &SourceText,
        spans: &[SyntaxSpan],
        namespace_scoped: bool,
        tab_size: usize,
    ) -> Self {
        let lines = (0..text.line_count())
            .map(|line| {
                let leading = text.leading_whitespace(line);
                let first = text.first_non_whitespace(line);
                let anchor = first.unwrap_or(leading.start);
                let governing_span = governing_span(spans, anchor)
                    .cloned()
                    .unwrap_or_else(|| SyntaxSpan::placeholder(anchor));

                LineIndentationInfo {
                    line,
                    existing_indentation_chars: leading.len(),
                    existing_indentation_columns: indentation_columns(
                        text.chars_in(leading.clone()),
                        tab_size,
                    ),
                    leading_whitespace: leading,
                    is_empty_or_whitespace: first.is_none(),
                    starts_in_embedded_context: governing_span.kind == SpanKind::Code,
                    starts_in_host_context: governing_span.kind == SpanKind::Markup,
                    min_embedded_indent_level: min_embedded_indent_level(
                        &governing_span,
                        namespace_scoped,
                    ),
                    governing_span,
                }
            })
            .collect();
        Self { lines }
    }

    /// Info for `line`.
    pub fn get(&self, line: usize) -> Option<&LineIndentationInfo> {
        self.lines.get(line)
    }

    /// All lines in order.
    pub fn iter(&self) -> impl Iterator<Item = &LineIndentationInfo> {
        self.lines.iter()
    }

    /// Line count.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if the table has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// The span owning `offset`.
///
/// Spans own `start..end` half-open, and zero-length spans own their single boundary offset. When
/// several spans qualify, the one earliest in document order wins.
pub fn governing_span(spans: &[SyntaxSpan], offset: usize) -> Option<&SyntaxSpan> {
    let idx = spans.partition_point(|s| s.span.start <= offset);
    let mut owner = None;
    for span in spans[..idx].iter().rev() {
        if span.span.end < offset {
            break;
        }
        let owns = if span.span.is_empty() {
            span.span.start == offset
        } else {
            offset < span.span.end
        };
        if owns {
            owner = Some(span);
        }
    }
    owner
}

/// `1` for the method body, `+1` inside a namespace, `+1` outside a class body, plus one per
/// type inference lambda.
pub fn min_embedded_indent_level(span: &SyntaxSpan, namespace_scoped: bool) -> usize {
    1 + usize::from(namespace_scoped)
        + usize::from(!span.is_in_class_body)
        + span.embedded_lambda_nesting
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::BlockKind;

    fn span(range: Range<usize>, kind: SpanKind) -> SyntaxSpan {
        SyntaxSpan {
            span: range.clone(),
            block_span: range,
            kind,
            block_kind: BlockKind::Statement,
            host_indent_level: 0,
            embedded_indent_level: 1,
            is_in_class_body: false,
            embedded_lambda_nesting: 0,
        }
    }

    #[test]
    fn test_boundary_ownership() {
        let spans = vec![
            span(0..5, SpanKind::Code),
            span(5..5, SpanKind::MetaCode),
            span(5..9, SpanKind::Markup),
        ];
        assert_eq!(governing_span(&spans, 0).unwrap().span, 0..5);
        assert_eq!(governing_span(&spans, 4).unwrap().span, 0..5);
        assert_eq!(governing_span(&spans, 5).unwrap().span, 5..5);
        assert_eq!(governing_span(&spans, 6).unwrap().span, 5..9);
        assert!(governing_span(&spans, 9).is_none());
    }

    #[test]
    fn test_non_empty_span_does_not_own_its_end() {
        let spans = vec![span(0..3, SpanKind::Code), span(3..6, SpanKind::Markup)];
        assert_eq!(governing_span(&spans, 3).unwrap().kind, SpanKind::Markup);
    }

    #[test]
    fn test_build_table() {
        let text = SourceText::new("a\n\tb\n   \n");
        let spans = vec![span(0..2, SpanKind::Markup), span(2..9, SpanKind::Code)];
        let table = LineTable::build(&text, &spans, true, 4);
        assert_eq!(table.len(), 4);

        let first = table.get(0).unwrap();
        assert!(first.starts_in_host_context);
        assert_eq!(first.first_non_whitespace(), Some(0));

        let second = table.get(1).unwrap();
        assert!(second.starts_in_embedded_context);
        assert_eq!(second.existing_indentation_chars, 1);
        assert_eq!(second.existing_indentation_columns, 4);
        assert_eq!(second.min_embedded_indent_level, 3);

        let blank = table.get(2).unwrap();
        assert!(blank.is_empty_or_whitespace);
        assert_eq!(blank.leading_whitespace, 5..8);

        let last = table.get(3).unwrap();
        assert_eq!(last.governing_span, SyntaxSpan::placeholder(9));
        assert!(last.starts_in_host_context);
    }

    #[test]
    fn test_min_level() {
        let mut s = span(0..1, SpanKind::Code);
        assert_eq!(min_embedded_indent_level(&s, true), 3);
        assert_eq!(min_embedded_indent_level(&s, false), 2);
        s.is_in_class_body = true;
        assert_eq!(min_embedded_indent_level(&s, true), 2);
        s.embedded_lambda_nesting = 2;
        assert_eq!(min_embedded_indent_level(&s, true), 4);
    }
}
