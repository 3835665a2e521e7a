//! Indentation reconciliation.
//!
//! Every line's target indentation is the sum of two opinions:
//!
//! - the *host* opinion, derived from the line's governing span: `(host + embedded levels) * unit`,
//!   or the markup formatter's existing indentation plus the embedded levels when one already ran;
//! - the *embedded* opinion: how far past the generated code's minimum nesting the embedded
//!   formatter puts the line's content.
//!
//! Lines the embedded formatter has no usable opinion about are left exactly as typed.

use crate::bridge::{EmbeddedFormatter, EmbeddedIndentation, get_indentations};
use crate::cancel::CancellationToken;
use crate::classifier::{BlockKind, SpanKind};
use crate::context::FormattingContext;
use crate::edit::TextChange;
use crate::error::Interrupt;
use crate::line_table::{LineIndentationInfo, governing_span, min_embedded_indent_level};
use crate::workspace::WorkspacePool;
use std::collections::{BTreeMap, BTreeSet};

/// An embedded-document offset to ask about, with the minimum level that applies to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Query {
    offset: usize,
    min_level: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LinePlan {
    /// Whitespace-only line: drop its whitespace.
    Clear(usize),
    /// Compute a target indentation, optionally from an embedded opinion.
    Indent { line: usize, query: Option<Query> },
}

/// Compute the leading-whitespace changes for every line of `context`.
///
/// The embedded formatter is consulted once for all lines.
pub async fn reconcile<E: EmbeddedFormatter>(
    context: &FormattingContext,
    formatter: &E,
    pool: &WorkspacePool,
    cancel: &CancellationToken,
) -> Result<Vec<TextChange>, Interrupt> {
    let plans = context
        .line_table()
        .iter()
        .filter_map(|info| plan_line(context, info))
        .collect::<Vec<_>>();

    let offsets = plans
        .iter()
        .filter_map(|plan| match plan {
            LinePlan::Indent {
                query: Some(query), ..
            } => Some(query.offset),
            _ => None,
        })
        .collect::<BTreeSet<_>>();
    let opinions = get_indentations(context, formatter, &offsets, pool, cancel).await?;

    Ok(plans
        .into_iter()
        .filter_map(|plan| resolve(context, plan, &opinions))
        .collect())
}

fn plan_line(context: &FormattingContext, info: &LineIndentationInfo) -> Option<LinePlan> {
    if is_preserved(context, info) {
        return None;
    }
    let Some(first) = info.first_non_whitespace() else {
        return (info.existing_indentation_chars > 0).then_some(LinePlan::Clear(info.line));
    };

    let embedded = context.embedded();
    let query = if let Some(offset) = embedded.map_to_generated_or_transition(first, context.text())
    {
        Some(Query {
            offset,
            min_level: info.min_embedded_indent_level,
        })
    } else {
        embedded.preceding_mapping(first).map(|mapping| {
            let anchor = mapping.original.end.saturating_sub(1);
            let min_level = governing_span(context.spans(), anchor).map_or(
                info.min_embedded_indent_level,
                |span| min_embedded_indent_level(span, embedded.namespace_scoped),
            );
            Query {
                offset: mapping.generated.end,
                min_level,
            }
        })
    };

    Some(LinePlan::Indent {
        line: info.line,
        query,
    })
}

/// Lines whose content must not move: Razor comment bodies, and continuation lines of host
/// comments and (without a markup formatter) of multi-line start tags.
fn is_preserved(context: &FormattingContext, info: &LineIndentationInfo) -> bool {
    let span = &info.governing_span;
    if span.kind == SpanKind::None {
        return true;
    }
    let line_start = context.text().line_start(info.line);
    let continues = span.block_span.start < line_start;
    match span.block_kind {
        BlockKind::HostComment => continues,
        BlockKind::Tag => continues && !context.markup_formatted(),
        _ => false,
    }
}

fn resolve(
    context: &FormattingContext,
    plan: LinePlan,
    opinions: &BTreeMap<usize, EmbeddedIndentation>,
) -> Option<TextChange> {
    let text = context.text();
    let options = context.options();
    let (line, query) = match plan {
        LinePlan::Clear(line) => {
            let info = context.line(line)?;
            return Some(TextChange::new(info.leading_whitespace.clone(), ""));
        }
        LinePlan::Indent { line, query } => (line, query),
    };
    let info = context.line(line)?;
    let unit = options.indent_unit();

    let effective = match query {
        None => 0,
        Some(query) => {
            let floor = query.min_level * unit;
            match opinions.get(&query.offset) {
                Some(EmbeddedIndentation::Column(column)) if *column >= floor => column - floor,
                _ => return None,
            }
        }
    };

    let span = &info.governing_span;
    let host = if context.markup_formatted() && info.starts_in_host_context {
        info.existing_indentation_columns + span.embedded_indent_level * unit
    } else {
        (span.host_indent_level + span.embedded_indent_level) * unit
    };

    let desired = options.indentation_string(host + effective);
    let change = TextChange::new(info.leading_whitespace.clone(), desired);
    (!change.is_noop(text)).then_some(change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{EmbeddedFormatRequest, EmbeddedFormatResult};
    use crate::document::ParsedDocument;
    use crate::embedded::{EmbeddedDocument, SourceMapping};
    use crate::error::EmbeddedFormatterError;
    use crate::options::FormattingOptions;
    use crate::source_text::SourceText;
    use crate::syntax::{ElementInfo, NodeKind, TreeBuilder};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Puts every annotated character on its own line at a column chosen by `column`.
    struct StubFormatter {
        column: fn(char) -> usize,
        calls: AtomicUsize,
    }

    impl StubFormatter {
        fn new(column: fn(char) -> usize) -> Self {
            Self {
                column,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl EmbeddedFormatter for StubFormatter {
        async fn format(
            &self,
            request: EmbeddedFormatRequest,
        ) -> Result<EmbeddedFormatResult, EmbeddedFormatterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let chars = request.text.chars().collect::<Vec<_>>();
            let mut text = String::new();
            let mut annotations = Vec::new();
            for &position in &request.annotations {
                let ch = chars.get(position).copied().unwrap_or(' ');
                text.push_str(&" ".repeat((self.column)(ch)));
                annotations.push(Some(text.chars().count()));
                text.push(ch);
                text.push('\n');
            }
            Ok(EmbeddedFormatResult {
                text,
                annotations,
                nodes: Vec::new(),
            })
        }
    }

    const PREFIX: &str = "namespace N\n{\nclass C\n{\nvoid M()\n{\n";

    /// `@{\nx;\n}` with its code body mapped into a method.
    fn statement_block(host: &str) -> FormattingContext {
        let text = SourceText::new(host);
        let mut b = TreeBuilder::new();
        b.start_node(NodeKind::StatementBlock);
        b.leaf(NodeKind::Transition, 0..1);
        b.leaf(NodeKind::MetaCode, 1..2);
        b.start_node(NodeKind::CodeBlock);
        b.leaf(NodeKind::CodeText, 2..host.chars().count() - 1);
        b.finish_node();
        b.leaf(
            NodeKind::MetaCode,
            host.chars().count() - 1..host.chars().count(),
        );
        b.finish_node();

        let body = &host[2..host.len() - 1];
        let start = PREFIX.chars().count();
        let generated = format!("{PREFIX}{body}}}\n}}\n}}\n");
        let mapping = SourceMapping::new(
            2..2 + body.chars().count(),
            start..start + body.chars().count(),
        );
        let parsed = ParsedDocument::new(
            b.finish(),
            Vec::new(),
            EmbeddedDocument::new(SourceText::new(&generated), vec![mapping], true),
        );
        FormattingContext::new(text, parsed, FormattingOptions::default())
    }

    fn method_depth(_: char) -> usize {
        12
    }

    #[tokio::test]
    async fn test_statement_body_gets_one_level() {
        let ctx = statement_block("@{\nx;\n}");
        let formatter = StubFormatter::new(method_depth);
        let changes = reconcile(
            &ctx,
            &formatter,
            &WorkspacePool::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(changes, vec![TextChange::new(3..3, "    ")]);
        assert_eq!(formatter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_nested_code_adds_effective_indentation() {
        fn nested(ch: char) -> usize {
            if ch == 'y' { 16 } else { 12 }
        }
        let ctx = statement_block("@{\nx;\ny;\n}");
        let changes = reconcile(
            &ctx,
            &StubFormatter::new(nested),
            &WorkspacePool::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            changes,
            vec![
                TextChange::new(3..3, "    "),
                TextChange::new(6..6, "        "),
            ]
        );
    }

    #[tokio::test]
    async fn test_opinion_below_floor_leaves_line() {
        fn shallow(ch: char) -> usize {
            if ch == 'x' { 4 } else { 12 }
        }
        let ctx = statement_block("@{\n  x;\n}");
        let changes = reconcile(
            &ctx,
            &StubFormatter::new(shallow),
            &WorkspacePool::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert!(changes.is_empty());
    }

    #[tokio::test]
    async fn test_markup_lines_and_comment_bodies() {
        // "<p>\n   \n</p>\n@* a\n      b *@"
        let text = SourceText::new("<p>\n   \n</p>\n@* a\n      b *@");
        let mut b = TreeBuilder::new();
        b.start_node(NodeKind::MarkupBlock);
        b.start_node(NodeKind::MarkupElement(ElementInfo::new("p")));
        b.start_node(NodeKind::MarkupStartTag);
        b.leaf(NodeKind::MarkupText, 0..3);
        b.finish_node();
        b.leaf(NodeKind::MarkupText, 3..8);
        b.start_node(NodeKind::MarkupEndTag);
        b.leaf(NodeKind::MarkupText, 8..12);
        b.finish_node();
        b.finish_node();
        b.leaf(NodeKind::MarkupText, 12..13);
        b.finish_node();
        b.start_node(NodeKind::Comment);
        b.leaf(NodeKind::Transition, 13..14);
        b.leaf(NodeKind::MetaCode, 14..15);
        b.leaf(NodeKind::CommentText, 15..26);
        b.leaf(NodeKind::MetaCode, 26..27);
        b.leaf(NodeKind::Transition, 27..28);
        b.finish_node();
        let parsed = ParsedDocument::new(b.finish(), Vec::new(), EmbeddedDocument::empty());
        let ctx = FormattingContext::new(text, parsed, FormattingOptions::default());

        let formatter = StubFormatter::new(method_depth);
        let changes = reconcile(
            &ctx,
            &formatter,
            &WorkspacePool::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(changes, vec![TextChange::new(4..7, "")]);
        assert_eq!(formatter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tabs_follow_options() {
        let text = SourceText::new("@{\nx;\n}");
        let ctx = statement_block(text.as_str());
        let ctx = FormattingContext::new(
            ctx.text().clone(),
            ctx.document().clone(),
            FormattingOptions::default().with_tabs(),
        );
        let changes = reconcile(
            &ctx,
            &StubFormatter::new(method_depth),
            &WorkspacePool::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(changes, vec![TextChange::new(3..3, "\t")]);
    }
}
