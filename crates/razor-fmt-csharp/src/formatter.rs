//! Brace-depth C# layout.

use crate::lexer::{StringStyle, Token, TokenKind, tokenize};
use razor_fmt::{
    EmbeddedFormatRequest, EmbeddedFormatResult, EmbeddedFormatter, EmbeddedFormatterError,
    EmbeddedNode, EmbeddedNodeKind, FormattingOptions,
};

/// A lightweight C# formatter.
///
/// Layout rules:
///
/// - A line is indented one level per open `{`, plus one when the innermost open delimiter is a
///   `(` or `[` (continuation lines of an argument list) and the line does not open a block.
/// - Closing delimiters at the start of a line are popped before the line is indented. A line
///   that starts with a comment keeps the depth it had.
/// - Runs of spaces between tokens become one space; trailing whitespace is removed; blank lines
///   become empty.
/// - Lines that start inside a multi-line string or comment are copied verbatim.
///
/// Line breaks are never added or removed, so the output has the same lines as the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct CSharpFormatter;

impl CSharpFormatter {
    /// Create a formatter.
    pub fn new() -> Self {
        Self
    }
}

impl EmbeddedFormatter for CSharpFormatter {
    async fn format(
        &self,
        request: EmbeddedFormatRequest,
    ) -> Result<EmbeddedFormatResult, EmbeddedFormatterError> {
        request
            .options
            .validate()
            .map_err(|err| EmbeddedFormatterError::Failed(err.to_string()))?;
        Ok(format_text(&request.text, &request.annotations, &request.options))
    }
}

/// Format `text`, tracking the non-whitespace characters at `annotations`.
///
/// # Example
///
/// ```rust
/// use razor_fmt::FormattingOptions;
/// use razor_fmt_csharp::format_text;
///
/// let result = format_text("{\nx  =  1;   \n}", &[2], &FormattingOptions::default());
/// assert_eq!(result.text, "{\n    x = 1;\n}");
/// assert_eq!(result.annotations, vec![Some(6)]);
/// ```
pub fn format_text(
    text: &str,
    annotations: &[usize],
    options: &FormattingOptions,
) -> EmbeddedFormatResult {
    let chars = text.chars().collect::<Vec<_>>();
    let tokens = tokenize(&chars);
    let formatted = layout(&chars, &tokens, options);

    let out_chars = formatted.chars().collect::<Vec<_>>();
    let annotations = track_annotations(&chars, &out_chars, annotations);
    let nodes = collect_nodes(&out_chars, &tokenize(&out_chars));
    tracing::trace!(
        lines = formatted.matches('\n').count() + 1,
        nodes = nodes.len(),
        "formatted embedded text"
    );

    EmbeddedFormatResult {
        text: formatted,
        annotations,
        nodes,
    }
}

fn layout(chars: &[char], tokens: &[Token], options: &FormattingOptions) -> String {
    let mut out = String::with_capacity(chars.len());
    let mut stack: Vec<char> = Vec::new();
    let mut next_token = 0usize;
    let mut line_start = 0usize;

    loop {
        let line_end = (line_start..chars.len())
            .find(|&i| chars[i] == '\n')
            .unwrap_or(chars.len());
        let has_cr = line_end > line_start && chars[line_end - 1] == '\r';
        let content_end = if has_cr { line_end - 1 } else { line_end };

        while next_token < tokens.len() && tokens[next_token].range.end <= line_start {
            next_token += 1;
        }
        let continues_token =
            next_token < tokens.len() && tokens[next_token].range.start < line_start;
        let first_on_line = (next_token + usize::from(continues_token)).min(tokens.len());
        let line_tokens = tokens[first_on_line..]
            .iter()
            .take_while(|token| token.range.start < line_end)
            .collect::<Vec<_>>();

        if continues_token {
            out.extend(&chars[line_start..line_end]);
        } else if !line_tokens.is_empty() {
            out.push_str(&options.indentation_string(
                indent_level(&stack, &line_tokens) * options.indent_unit(),
            ));

            let mut previous_end = None;
            let mut carried_over = false;
            for token in &line_tokens {
                if previous_end.is_some_and(|end| end < token.range.start) {
                    out.push(' ');
                }
                if token.range.end > line_end {
                    out.extend(&chars[token.range.start..line_end]);
                    carried_over = true;
                    break;
                }
                let end = token.range.end.min(content_end).max(token.range.start);
                out.extend(&chars[token.range.start..end]);
                previous_end = Some(token.range.end);
            }
            if has_cr && !carried_over {
                out.push('\r');
            }
        } else if has_cr {
            out.push('\r');
        }

        for token in &line_tokens {
            match token.kind {
                TokenKind::Punct(c @ ('{' | '(' | '[')) => stack.push(c),
                TokenKind::Punct('}' | ')' | ']') => {
                    stack.pop();
                }
                _ => {}
            }
        }

        if line_end >= chars.len() {
            break;
        }
        out.push('\n');
        line_start = line_end + 1;
    }
    out
}

fn indent_level(stack: &[char], line_tokens: &[&Token]) -> usize {
    let leading_closers = line_tokens
        .iter()
        .take_while(|token| matches!(token.kind, TokenKind::Punct('}' | ')' | ']')))
        .count();
    let open = &stack[..stack.len().saturating_sub(leading_closers)];
    let opens_block = line_tokens.first().is_some_and(|token| token.is_punct('{'));
    open.iter().filter(|&&c| c == '{').count()
        + usize::from(!opens_block && matches!(open.last(), Some('(' | '[')))
}

/// New positions of the annotated characters, matched by their non-whitespace ordinal.
fn track_annotations(before: &[char], after: &[char], annotations: &[usize]) -> Vec<Option<usize>> {
    let after_positions = after
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| i)
        .collect::<Vec<_>>();

    let mut ordinals = Vec::with_capacity(before.len());
    let mut count = 0usize;
    for ch in before {
        ordinals.push(count);
        if !ch.is_whitespace() {
            count += 1;
        }
    }

    annotations
        .iter()
        .map(|&offset| {
            let ch = before.get(offset)?;
            if ch.is_whitespace() {
                return None;
            }
            after_positions.get(ordinals[offset]).copied()
        })
        .collect()
}

/// Multi-line string literals and initializer braces in the formatted text.
fn collect_nodes(chars: &[char], tokens: &[Token]) -> Vec<EmbeddedNode> {
    let mut nodes = Vec::new();
    for token in tokens {
        if let TokenKind::String(style) = token.kind
            && chars[token.range.clone()].contains(&'\n')
        {
            let kind = if style == StringStyle::Interpolated {
                EmbeddedNodeKind::InterpolatedStringText
            } else {
                EmbeddedNodeKind::StringLiteral
            };
            nodes.push(EmbeddedNode {
                kind,
                span: token.range.clone(),
                parent: None,
            });
        }
    }

    // Open braces; initializer braces carry their node and their creation node.
    let mut open: Vec<Option<(usize, Option<usize>)>> = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Punct('{') => {
                let enclosing = open.last().copied().flatten().map(|(node, _)| node);
                let entry = classify_brace(chars, tokens, index, enclosing).map(|shape| {
                    let creation = shape.creation.map(|(kind, start)| {
                        nodes.push(EmbeddedNode {
                            kind,
                            span: start..chars.len(),
                            parent: shape.parent,
                        });
                        nodes.len() - 1
                    });
                    nodes.push(EmbeddedNode {
                        kind: shape.initializer,
                        span: token.range.start..chars.len(),
                        parent: creation.or(shape.parent),
                    });
                    (nodes.len() - 1, creation)
                });
                open.push(entry);
            }
            TokenKind::Punct('}') => {
                if let Some(Some((initializer, creation))) = open.pop() {
                    nodes[initializer].span.end = token.range.end;
                    if let Some(creation) = creation {
                        nodes[creation].span.end = token.range.end;
                    }
                }
            }
            _ => {}
        }
    }
    nodes
}

struct BraceShape {
    initializer: EmbeddedNodeKind,
    /// Creation expression kind and start offset.
    creation: Option<(EmbeddedNodeKind, usize)>,
    parent: Option<usize>,
}

/// Decide whether the `{` at `index` opens an initializer.
fn classify_brace(
    chars: &[char],
    tokens: &[Token],
    index: usize,
    enclosing: Option<usize>,
) -> Option<BraceShape> {
    let is_word = |i: usize, word: &str| {
        tokens[i].kind == TokenKind::Identifier
            && chars[tokens[i].range.clone()].iter().copied().eq(word.chars())
    };
    let prev = previous_significant(tokens, index)?;
    let before = previous_significant(tokens, prev);
    let before_that = before.and_then(|b| previous_significant(tokens, b));

    if let (Some(b), Some(new)) = (before, before_that)
        && is_word(new, "new")
    {
        let implicit = if tokens[prev].is_punct(']') && tokens[b].is_punct('[') {
            Some((EmbeddedNodeKind::ImplicitArrayCreation, EmbeddedNodeKind::ArrayInitializer))
        } else if tokens[prev].is_punct(')') && tokens[b].is_punct('(') {
            Some((EmbeddedNodeKind::ImplicitObjectCreation, EmbeddedNodeKind::ObjectInitializer))
        } else {
            None
        };
        if let Some((creation, initializer)) = implicit {
            return Some(BraceShape {
                initializer,
                creation: Some((creation, tokens[new].range.start)),
                parent: enclosing,
            });
        }
    }

    if let Some(new) = creation_keyword(tokens, index, is_word) {
        return Some(BraceShape {
            initializer: EmbeddedNodeKind::ObjectInitializer,
            creation: Some((EmbeddedNodeKind::ObjectCreation, tokens[new].range.start)),
            parent: enclosing,
        });
    }

    if enclosing.is_some() && (tokens[prev].is_punct(',') || tokens[prev].is_punct('{')) {
        return Some(BraceShape {
            initializer: EmbeddedNodeKind::CollectionInitializer,
            creation: None,
            parent: enclosing,
        });
    }

    let compound = before.is_some_and(|b| {
        matches!(tokens[b].kind, TokenKind::Punct('=' | '!' | '<' | '>'))
            && tokens[b].range.end == tokens[prev].range.start
    });
    (tokens[prev].is_punct('=') && !compound).then_some(BraceShape {
        initializer: EmbeddedNodeKind::ArrayInitializer,
        creation: None,
        parent: enclosing,
    })
}

fn previous_significant(tokens: &[Token], index: usize) -> Option<usize> {
    (0..index).rev().find(|&j| !tokens[j].is_comment())
}

/// The `new` keyword of the creation expression whose initializer opens at `index`.
///
/// Scans back within the current expression: the search ends at statement and argument
/// boundaries and at lambda arrows.
fn creation_keyword(
    tokens: &[Token],
    index: usize,
    is_word: impl Fn(usize, &str) -> bool,
) -> Option<usize> {
    let mut depth = 0usize;
    for j in (0..index).rev() {
        let token = &tokens[j];
        match token.kind {
            TokenKind::Punct('>')
                if j > 0
                    && tokens[j - 1].is_punct('=')
                    && tokens[j - 1].range.end == token.range.start =>
            {
                return None;
            }
            TokenKind::Punct(')' | ']' | '>') => depth += 1,
            TokenKind::Punct('(' | '[' | '<') => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
            }
            TokenKind::Punct(';') => return None,
            TokenKind::Punct('{' | '}' | ',' | '=') if depth == 0 => return None,
            TokenKind::Identifier if depth == 0 && is_word(j, "new") => return Some(j),
            _ => {}
        }
    }
    None
}
