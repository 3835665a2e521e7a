//! Structural whitespace cleanup.
//!
//! Puts the content of braced blocks on its own lines, normalizes the space between a block
//! directive keyword and its opening brace, and collapses the interior whitespace of single-line
//! directives. Indentation itself is left to the reconciler.

use super::PassOutput;
use crate::context::FormattingContext;
use crate::edit::TextChange;
use crate::source_text::SourceText;
use crate::syntax::{NodeKind, SyntaxNode};
use razor_fmt_lang::DirectiveKind;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// A quoted string (kept as is) or a run of horizontal whitespace.
static DIRECTIVE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"\\\n]|\\.)*"|[ \t]+"#).expect("valid directive regex")
});

pub(crate) fn run(context: &FormattingContext) -> PassOutput {
    let text = context.text();
    let brace_on_next_line = context.options().brace_on_next_line;
    let mut changes = Vec::new();

    for node in context.tree().root().descendants() {
        if node.is_missing() {
            continue;
        }
        match node.kind() {
            NodeKind::StatementBlock => {
                if let Some(braces) = braces(text, node) {
                    body_changes(text, &braces, &mut changes);
                }
            }
            NodeKind::Directive(info) => match info.kind {
                DirectiveKind::SingleLine => {
                    if let Some(body) = directive_body(node) {
                        single_line_changes(text, body, &mut changes);
                    }
                }
                DirectiveKind::CodeBlock | DirectiveKind::RazorBlock => {
                    let Some(body) = directive_body(node) else {
                        continue;
                    };
                    let Some(braces) = braces(text, body) else {
                        continue;
                    };
                    if let Some(keyword) = keyword(node) {
                        let header = keyword.end..braces.open.start;
                        if info.kind == DirectiveKind::CodeBlock {
                            code_header_change(text, header, brace_on_next_line, &mut changes);
                        } else {
                            razor_header_change(text, header, &mut changes);
                        }
                    }
                    body_changes(text, &braces, &mut changes);
                }
            },
            _ => {}
        }
    }

    changes.sort_by_key(|change| (change.span.start, change.span.end));
    let mut kept: Vec<TextChange> = Vec::with_capacity(changes.len());
    for change in changes {
        if kept
            .last()
            .is_some_and(|last| change.span.start < last.span.end || change.span == last.span)
        {
            tracing::debug!(span = ?change.span, "dropping overlapping cleanup change");
            continue;
        }
        if !change.is_noop(text) {
            kept.push(change);
        }
    }
    PassOutput::host(kept)
}

struct Braces {
    open: Range<usize>,
    close: Range<usize>,
}

/// The first `{` meta token and the last present `}` meta token among `node`'s children.
fn braces(text: &SourceText, node: SyntaxNode<'_>) -> Option<Braces> {
    let mut open = None;
    let mut close = None;
    for child in node.present_children() {
        if *child.kind() != NodeKind::MetaCode {
            continue;
        }
        let span = child.span();
        if span.len() != 1 {
            continue;
        }
        match text.char_at(span.start) {
            Some('{') if open.is_none() => open = Some(span),
            Some('}') if open.is_some() => close = Some(span),
            _ => {}
        }
    }
    Some(Braces {
        open: open?,
        close: close?,
    })
}

fn directive_body(node: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    node.present_children()
        .find(|child| *child.kind() == NodeKind::DirectiveBody)
}

/// The directive keyword meta token.
fn keyword(node: SyntaxNode<'_>) -> Option<Range<usize>> {
    node.present_children()
        .find(|child| *child.kind() == NodeKind::MetaCode)
        .map(|child| child.span())
}

/// Content between the braces starts and ends on its own line.
fn body_changes(text: &SourceText, braces: &Braces, out: &mut Vec<TextChange>) {
    let body = braces.open.end..braces.close.start;
    let chars = text.chars_in(body.clone()).collect::<Vec<_>>();
    let Some(first) = chars.iter().position(|ch| !ch.is_whitespace()) else {
        return;
    };
    let last = chars
        .iter()
        .rposition(|ch| !ch.is_whitespace())
        .unwrap_or(first);

    if !chars[..first].contains(&'\n') {
        out.push(TextChange::new(body.start..body.start + first, "\n"));
    }
    if !chars[last + 1..].contains(&'\n') {
        out.push(TextChange::new(body.start + last + 1..body.end, "\n"));
    }
}

/// `@code {`: a whitespace-only header becomes one space, or a line break with brace-on-next-line.
fn code_header_change(
    text: &SourceText,
    header: Range<usize>,
    brace_on_next_line: bool,
    out: &mut Vec<TextChange>,
) {
    if header.start > header.end || text.chars_in(header.clone()).any(|ch| !ch.is_whitespace()) {
        return;
    }
    let replacement = if brace_on_next_line { "\n" } else { " " };
    out.push(TextChange::new(header, replacement));
}

/// `@section Name {`: single spaces around the directive tokens.
fn razor_header_change(text: &SourceText, header: Range<usize>, out: &mut Vec<TextChange>) {
    if header.start > header.end {
        return;
    }
    let words = text.slice(header.clone());
    let words = words.split_whitespace().collect::<Vec<_>>();
    let normalized = if words.is_empty() {
        " ".to_string()
    } else {
        format!(" {} ", words.join(" "))
    };
    out.push(TextChange::new(header, normalized));
}

/// `@inject   IFoo   Foo`: one space between tokens, nothing at the end of the line.
fn single_line_changes(text: &SourceText, body: SyntaxNode<'_>, out: &mut Vec<TextChange>) {
    let leaves = body
        .present_children()
        .filter(|leaf| *leaf.kind() == NodeKind::CodeText)
        .collect::<Vec<_>>();
    for (index, leaf) in leaves.iter().enumerate() {
        let span = leaf.span();
        let leaf_text = text.slice(span.clone());
        if leaf_text.contains('\n') {
            continue;
        }
        let at_line_end = index + 1 == leaves.len()
            && matches!(text.char_at(span.end), None | Some('\r' | '\n'));
        let leaf_len = leaf_text.chars().count();
        for found in DIRECTIVE_TOKEN_RE.find_iter(&leaf_text) {
            if found.as_str().starts_with('"') {
                continue;
            }
            let start = leaf_text[..found.start()].chars().count();
            let end = start + found.as_str().chars().count();
            let range = span.start + start..span.start + end;
            if at_line_end && end == leaf_len {
                out.push(TextChange::new(range, ""));
            } else if found.as_str() != " " {
                out.push(TextChange::new(range, " "));
            }
        }
    }
}
