//! Span classification.
//!
//! One walk over the syntax tree turns every leaf into a [`SyntaxSpan`] that records where the
//! text came from and how deeply it is nested. Two nesting counters are tracked independently:
//! host (markup) nesting and embedded (code) nesting. A line's structural indentation is their sum.
//!
//! The walk is a single `match` over [`NodeKind`] that threads a [`VisitorState`] by value: every
//! node visits its children with a copy of the state adjusted for that node, so leaving a node
//! restores the outer counters automatically.

use crate::syntax::{NodeKind, SyntaxNode, SyntaxTree};
use std::ops::Range;

/// Origin of a span's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    /// Not formatted (Razor comment bodies).
    None,
    /// Markup text.
    Markup,
    /// Embedded code.
    Code,
    /// Razor punctuation and keywords.
    MetaCode,
    /// The `@` transition.
    Transition,
}

/// The innermost structural construct around a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// `@{ }` blocks and code statements.
    Statement,
    /// Directives.
    Directive,
    /// Explicit and implicit expressions.
    Expression,
    /// Plain markup.
    Markup,
    /// `@<tag>` templates.
    Template,
    /// Razor comments.
    Comment,
    /// Markup start and end tags.
    Tag,
    /// `<!-- -->` comments.
    HostComment,
}

/// A classified unit of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxSpan {
    /// Covered text.
    pub span: Range<usize>,
    /// Span of the innermost node that set `block_kind`. Always contains `span`.
    pub block_span: Range<usize>,
    /// Text origin.
    pub kind: SpanKind,
    /// Enclosing construct.
    pub block_kind: BlockKind,
    /// Markup nesting depth.
    pub host_indent_level: usize,
    /// Code nesting depth.
    pub embedded_indent_level: usize,
    /// Inside `@code` / `@functions`.
    pub is_in_class_body: bool,
    /// Type inference lambdas the generated code wraps around this span.
    pub embedded_lambda_nesting: usize,
}

impl SyntaxSpan {
    /// A zero-length markup span at `offset` with no nesting.
    pub fn placeholder(offset: usize) -> Self {
        Self {
            span: offset..offset,
            block_span: offset..offset,
            kind: SpanKind::Markup,
            block_kind: BlockKind::Markup,
            host_indent_level: 0,
            embedded_indent_level: 0,
            is_in_class_body: false,
            embedded_lambda_nesting: 0,
        }
    }

    /// Returns `true` for zero-length marker spans.
    pub fn is_marker(&self) -> bool {
        self.span.is_empty()
    }
}

/// Counters accumulated while descending the tree.
#[derive(Debug, Clone)]
pub struct VisitorState {
    block_kind: BlockKind,
    block_span: Range<usize>,
    host_indent_level: usize,
    embedded_indent_level: usize,
    is_in_class_body: bool,
    embedded_lambda_nesting: usize,
}

impl VisitorState {
    fn root(span: Range<usize>) -> Self {
        Self {
            block_kind: BlockKind::Markup,
            block_span: span,
            host_indent_level: 0,
            embedded_indent_level: 0,
            is_in_class_body: false,
            embedded_lambda_nesting: 0,
        }
    }

    fn with_block(&self, kind: BlockKind, span: Range<usize>) -> Self {
        Self {
            block_kind: kind,
            block_span: span,
            ..self.clone()
        }
    }

    fn span(&self, span: Range<usize>, kind: SpanKind) -> SyntaxSpan {
        SyntaxSpan {
            span,
            block_span: self.block_span.clone(),
            kind,
            block_kind: self.block_kind,
            host_indent_level: self.host_indent_level,
            embedded_indent_level: self.embedded_indent_level,
            is_in_class_body: self.is_in_class_body,
            embedded_lambda_nesting: self.embedded_lambda_nesting,
        }
    }
}

/// Classify every leaf of `tree`, in document order.
pub fn classify(tree: &SyntaxTree) -> Vec<SyntaxSpan> {
    let root = tree.root();
    let mut spans = Vec::with_capacity(tree.len());
    visit(root, VisitorState::root(root.span()), &mut spans);
    spans
}

fn visit(node: SyntaxNode<'_>, state: VisitorState, out: &mut Vec<SyntaxSpan>) {
    if node.is_missing() {
        return;
    }

    let span = node.span();
    match node.kind() {
        NodeKind::Document | NodeKind::DirectiveBody => visit_children(node, &state, out),
        NodeKind::MarkupBlock => {
            visit_children(node, &state.with_block(BlockKind::Markup, span), out);
        }
        NodeKind::MarkupElement(info) => {
            let mut body = state.with_block(BlockKind::Markup, span);
            if info.has_body() {
                body.host_indent_level += 1;
            }
            if info.needs_type_inference() {
                body.embedded_lambda_nesting += 1;
            }
            for child in node.children() {
                match child.kind() {
                    NodeKind::MarkupStartTag | NodeKind::MarkupEndTag => {
                        visit(child, state.clone(), out);
                    }
                    _ => visit(child, body.clone(), out),
                }
            }
        }
        NodeKind::MarkupStartTag | NodeKind::MarkupEndTag => {
            visit_children(node, &state.with_block(BlockKind::Tag, span), out);
        }
        NodeKind::HostComment => {
            visit_children(node, &state.with_block(BlockKind::HostComment, span), out);
        }
        NodeKind::StatementBlock | NodeKind::CodeStatement => {
            visit_children(node, &state.with_block(BlockKind::Statement, span), out);
        }
        NodeKind::ExplicitExpression | NodeKind::ImplicitExpression => {
            visit_children(node, &state.with_block(BlockKind::Expression, span), out);
        }
        NodeKind::Directive(_) => {
            visit_children(node, &state.with_block(BlockKind::Directive, span), out);
        }
        NodeKind::Template => {
            visit_children(node, &state.with_block(BlockKind::Template, span), out);
        }
        NodeKind::Comment => {
            let comment = state.with_block(BlockKind::Comment, span.clone());
            let open_end = (span.start + 2).min(span.end);
            out.push(comment.span(span.start..open_end, SpanKind::MetaCode));
            if open_end < span.end {
                out.push(comment.span(open_end..span.end, SpanKind::None));
            }
        }
        NodeKind::CodeBlock | NodeKind::SectionBlock => {
            let mut inner = state;
            inner.embedded_indent_level += 1;
            visit_children(node, &inner, out);
        }
        NodeKind::MemberBlock => {
            let mut inner = state;
            inner.embedded_indent_level += 1;
            inner.is_in_class_body = true;
            visit_children(node, &inner, out);
        }
        NodeKind::Transition => out.push(state.span(span, SpanKind::Transition)),
        NodeKind::MetaCode => out.push(state.span(span, SpanKind::MetaCode)),
        NodeKind::CodeText => out.push(state.span(span, SpanKind::Code)),
        NodeKind::MarkupText => out.push(state.span(span, SpanKind::Markup)),
        NodeKind::CommentText => out.push(state.span(span, SpanKind::None)),
    }
}

fn visit_children(node: SyntaxNode<'_>, state: &VisitorState, out: &mut Vec<SyntaxSpan>) {
    for child in node.children() {
        visit(child, state.clone(), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{ComponentBinding, DirectiveInfo, ElementInfo, TreeBuilder};
    use razor_fmt_lang::DirectiveKind;

    fn levels(spans: &[SyntaxSpan]) -> Vec<(SpanKind, usize, usize)> {
        spans
            .iter()
            .map(|s| (s.kind, s.host_indent_level, s.embedded_indent_level))
            .collect()
    }

    #[test]
    fn test_statement_block_body_is_nested() {
        // "@{\n var x = 1;\n}"
        let mut b = TreeBuilder::new();
        b.start_node(NodeKind::StatementBlock);
        b.leaf(NodeKind::Transition, 0..1);
        b.leaf(NodeKind::MetaCode, 1..2);
        b.start_node(NodeKind::CodeBlock);
        b.leaf(NodeKind::CodeText, 2..15);
        b.finish_node();
        b.leaf(NodeKind::MetaCode, 15..16);
        b.finish_node();
        let spans = classify(&b.finish());

        assert_eq!(
            levels(&spans),
            vec![
                (SpanKind::Transition, 0, 0),
                (SpanKind::MetaCode, 0, 0),
                (SpanKind::Code, 0, 1),
                (SpanKind::MetaCode, 0, 0),
            ]
        );
        assert!(spans.iter().all(|s| s.block_kind == BlockKind::Statement));
        assert!(spans.iter().all(|s| s.block_span == (0..16)));
        assert!(!spans[2].is_in_class_body);
    }

    #[test]
    fn test_elements_nest_host_level_except_void() {
        // "<div><br><p>x</p></div>"
        let mut b = TreeBuilder::new();
        b.start_node(NodeKind::MarkupBlock);
        b.start_node(NodeKind::MarkupElement(ElementInfo::new("div")));
        b.start_node(NodeKind::MarkupStartTag);
        b.leaf(NodeKind::MarkupText, 0..5);
        b.finish_node();
        let mut br = ElementInfo::new("br");
        br.is_void = true;
        b.start_node(NodeKind::MarkupElement(br));
        b.start_node(NodeKind::MarkupStartTag);
        b.leaf(NodeKind::MarkupText, 5..9);
        b.finish_node();
        b.finish_node();
        b.start_node(NodeKind::MarkupElement(ElementInfo::new("p")));
        b.start_node(NodeKind::MarkupStartTag);
        b.leaf(NodeKind::MarkupText, 9..12);
        b.finish_node();
        b.leaf(NodeKind::MarkupText, 12..13);
        b.start_node(NodeKind::MarkupEndTag);
        b.leaf(NodeKind::MarkupText, 13..17);
        b.finish_node();
        b.finish_node();
        b.start_node(NodeKind::MarkupEndTag);
        b.leaf(NodeKind::MarkupText, 17..23);
        b.finish_node();
        b.finish_node();
        b.finish_node();
        let spans = classify(&b.finish());

        let hosts = spans.iter().map(|s| s.host_indent_level).collect::<Vec<_>>();
        assert_eq!(hosts, vec![0, 1, 1, 2, 1, 0]);
        assert_eq!(spans[0].block_kind, BlockKind::Tag);
        assert_eq!(spans[3].block_kind, BlockKind::Markup);
        assert_eq!(spans[3].block_span, 9..17);
    }

    #[test]
    fn test_member_block_sets_class_body() {
        // "@code {\n int x;\n}"
        let mut b = TreeBuilder::new();
        b.start_node(NodeKind::Directive(DirectiveInfo::new(
            "code",
            DirectiveKind::CodeBlock,
        )));
        b.leaf(NodeKind::Transition, 0..1);
        b.leaf(NodeKind::MetaCode, 1..5);
        b.start_node(NodeKind::DirectiveBody);
        b.leaf(NodeKind::CodeText, 5..6);
        b.leaf(NodeKind::MetaCode, 6..7);
        b.start_node(NodeKind::MemberBlock);
        b.leaf(NodeKind::CodeText, 7..16);
        b.finish_node();
        b.leaf(NodeKind::MetaCode, 16..17);
        b.finish_node();
        b.finish_node();
        let spans = classify(&b.finish());

        let body = &spans[4];
        assert_eq!(body.kind, SpanKind::Code);
        assert_eq!(body.embedded_indent_level, 1);
        assert!(body.is_in_class_body);
        assert_eq!(body.block_kind, BlockKind::Directive);
        assert!(!spans[5].is_in_class_body);
        assert_eq!(spans[5].embedded_indent_level, 0);
    }

    #[test]
    fn test_comment_and_missing_nodes() {
        // "@* hi *@@{" with a missing close brace
        let mut b = TreeBuilder::new();
        b.start_node(NodeKind::Comment);
        b.leaf(NodeKind::Transition, 0..1);
        b.leaf(NodeKind::MetaCode, 1..2);
        b.leaf(NodeKind::CommentText, 2..6);
        b.leaf(NodeKind::MetaCode, 6..7);
        b.leaf(NodeKind::Transition, 7..8);
        b.finish_node();
        b.start_node(NodeKind::StatementBlock);
        b.leaf(NodeKind::Transition, 8..9);
        b.leaf(NodeKind::MetaCode, 9..10);
        b.missing(NodeKind::MetaCode);
        b.finish_node();
        let spans = classify(&b.finish());

        assert_eq!(spans.len(), 4);
        assert_eq!((spans[0].kind, spans[0].span.clone()), (SpanKind::MetaCode, 0..2));
        assert_eq!((spans[1].kind, spans[1].span.clone()), (SpanKind::None, 2..8));
        assert_eq!(spans[1].block_kind, BlockKind::Comment);
        assert_eq!(spans[3].span, 9..10);
    }

    #[test]
    fn test_type_inference_lambda_compounds() {
        let generic = |attrs: &[&str]| {
            let mut info = ElementInfo::new("Grid");
            info.attributes = attrs.iter().map(|a| a.to_string()).collect();
            info.component = Some(ComponentBinding {
                type_parameters: vec!["TItem".to_string()],
                infers_type_parameters: true,
            });
            NodeKind::MarkupElement(info)
        };

        let mut b = TreeBuilder::new();
        b.start_node(generic(&["Items"]));
        b.start_node(NodeKind::MarkupStartTag);
        b.leaf(NodeKind::MarkupText, 0..6);
        b.finish_node();
        b.start_node(generic(&[]));
        b.start_node(NodeKind::MarkupStartTag);
        b.leaf(NodeKind::MarkupText, 6..12);
        b.finish_node();
        b.leaf(NodeKind::MarkupText, 12..13);
        b.finish_node();
        b.start_node(generic(&["TItem"]));
        b.start_node(NodeKind::MarkupStartTag);
        b.leaf(NodeKind::MarkupText, 13..19);
        b.finish_node();
        b.leaf(NodeKind::MarkupText, 19..20);
        b.finish_node();
        b.finish_node();
        let spans = classify(&b.finish());

        let nesting = spans
            .iter()
            .map(|s| s.embedded_lambda_nesting)
            .collect::<Vec<_>>();
        assert_eq!(nesting, vec![0, 1, 2, 1, 1]);
    }
}
