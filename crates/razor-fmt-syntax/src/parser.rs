//! Razor parser.
//!
//! A hand-written recursive descent parser over the document's characters. It alternates between
//! a markup scanner and a code scanner:
//!
//! - Markup is split into text runs, elements, `<!-- -->` comments and `@` transitions.
//! - Code is scanned for its braces, string literals and comments only; it is never parsed as C#.
//!   Markup that starts a code line (`<tag`, `@:`, `@<tag>`) switches back to the markup scanner.
//!
//! Every character of the input ends up in exactly one leaf, so the spans of the tree tile the
//! document. Recoverable errors become [`Diagnostic`]s plus missing nodes; parsing never fails.

use crate::generator::generate_embedded_document;
use razor_fmt::{
    ComponentBinding, Diagnostic, DirectiveInfo, DocumentParser, ElementInfo, NodeKind,
    ParsedDocument, SourceText, SyntaxTree, TreeBuilder,
};
use razor_fmt_lang::{
    ComponentCatalog, DirectiveDescriptor, DirectiveKind, directive, is_code_keyword,
    is_void_element,
};

/// Diagnostic ids reported by [`RazorParser`].
pub mod codes {
    /// A `{` has no matching `}`.
    pub const MISSING_CLOSE_BRACE: &str = "RZ1006";
    /// `@*` without `*@`.
    pub const UNTERMINATED_COMMENT: &str = "RZ1028";
    /// `@` followed by something that starts no Razor construct.
    pub const INVALID_TRANSITION: &str = "RZ1005";
    /// An element has no end tag.
    pub const UNCLOSED_ELEMENT: &str = "RZ1025";
    /// An end tag has no matching start tag.
    pub const STRAY_END_TAG: &str = "RZ1026";
    /// `@(` without `)`.
    pub const MISSING_CLOSE_PAREN: &str = "RZ1035";
}

/// Elements whose content is not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Razor document parser.
///
/// # Example
///
/// ```rust
/// use razor_fmt::NodeKind;
/// use razor_fmt_syntax::RazorParser;
///
/// let (tree, diagnostics) = RazorParser::new().parse_tree("@{\n    var x = 1;\n}");
/// assert!(diagnostics.is_empty());
/// let block = tree.root().children().next().unwrap();
/// assert_eq!(block.kind(), &NodeKind::StatementBlock);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RazorParser {
    components: ComponentCatalog,
}

impl RazorParser {
    /// Create a parser that knows no components.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind element tags to the components in `components`.
    pub fn with_components(mut self, components: ComponentCatalog) -> Self {
        self.components = components;
        self
    }

    /// The component catalog.
    pub fn components(&self) -> &ComponentCatalog {
        &self.components
    }

    /// Parse `text` into a syntax tree and its diagnostics.
    pub fn parse_tree(&self, text: &str) -> (SyntaxTree, Vec<Diagnostic>) {
        let mut parser = Parser::new(text, &self.components);
        parser.document();
        (parser.builder.finish(), parser.diagnostics)
    }
}

impl DocumentParser for RazorParser {
    fn parse(&self, text: &SourceText) -> ParsedDocument {
        let (tree, diagnostics) = self.parse_tree(text.as_str());
        let embedded = generate_embedded_document(&tree, text);
        tracing::trace!(
            nodes = tree.len(),
            diagnostics = diagnostics.len(),
            mappings = embedded.mappings.len(),
            "parsed razor document"
        );
        ParsedDocument::new(tree, diagnostics, embedded)
    }
}

/// Where a markup run stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// End of the document.
    Eof,
    /// A `}` closing the enclosing block.
    Brace,
    /// The end of the line (`@:` lines).
    LineEnd,
    /// An end tag matching an open element.
    EndTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeMode {
    /// Block body; stops before the `}` that closes it.
    Block,
    /// `@if (...) { ... }`; stops after the last `}` of the statement.
    Statement,
}

/// What an `@` in markup starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    /// `@@`.
    Escape,
    /// An `@` inside a word, e.g. an email address.
    Literal,
    /// `@` followed by nothing usable.
    Invalid,
    /// `@*`.
    Comment,
    /// `@{`.
    Block,
    /// `@(`.
    Explicit,
    /// `@name`; holds the end of the name.
    Keyword(usize),
}

#[derive(Debug)]
struct StartTag {
    name: String,
    attributes: Vec<String>,
    self_closing: bool,
    end: usize,
    closed: bool,
}

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    builder: TreeBuilder,
    diagnostics: Vec<Diagnostic>,
    components: &'a ComponentCatalog,
}

impl<'a> Parser<'a> {
    fn new(text: &str, components: &'a ComponentCatalog) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            builder: TreeBuilder::new(),
            diagnostics: Vec::new(),
            components,
        }
    }

    fn document(&mut self) {
        self.markup_content(Stop::Eof, &mut Vec::new());
    }

    // ---- markup ----

    /// Parse markup until `stop`. Returns the lowercased name of the end tag it stopped at, if
    /// that tag closes one of the `open` elements.
    fn markup_content(&mut self, stop: Stop, open: &mut Vec<String>) -> Option<String> {
        let mut run = self.pos;
        while let Some(ch) = self.at(self.pos) {
            match ch {
                '\n' if stop == Stop::LineEnd => break,
                '}' if stop == Stop::Brace => break,
                '<' if self.starts_with(self.pos, "<!--") => {
                    self.markup_text(run, self.pos);
                    self.host_comment();
                    run = self.pos;
                }
                '<' if self.at(self.pos + 1) == Some('/') => {
                    let name_end = self.tag_name_end(self.pos + 2);
                    let name = self.collect(self.pos + 2, name_end);
                    let lower = name.to_ascii_lowercase();
                    if !name.is_empty() && open.contains(&lower) {
                        self.markup_text(run, self.pos);
                        return Some(lower);
                    }
                    let end = self.tag_end(self.pos);
                    self.diagnostics.push(Diagnostic::error(
                        self.pos..end,
                        codes::STRAY_END_TAG,
                        format!("end tag `</{name}>` has no matching start tag"),
                    ));
                    self.pos = end;
                }
                '<' if self.at(self.pos + 1).is_some_and(|c| c.is_ascii_alphabetic()) => {
                    self.markup_text(run, self.pos);
                    self.element(open);
                    run = self.pos;
                }
                '@' => match self.transition() {
                    Transition::Escape => self.pos += 2,
                    Transition::Literal => self.pos += 1,
                    Transition::Invalid => {
                        self.diagnostics.push(Diagnostic::error(
                            self.pos..self.pos + 1,
                            codes::INVALID_TRANSITION,
                            "expected a Razor construct after `@`",
                        ));
                        self.pos += 1;
                    }
                    transition => {
                        self.markup_text(run, self.pos);
                        self.construct(transition);
                        run = self.pos;
                    }
                },
                _ => self.pos += 1,
            }
        }
        self.markup_text(run, self.pos);
        None
    }

    fn transition(&self) -> Transition {
        let at = self.pos;
        if at > 0 && self.chars[at - 1].is_alphanumeric() {
            return Transition::Literal;
        }
        match self.at(at + 1) {
            Some('@') => Transition::Escape,
            Some('*') => Transition::Comment,
            Some('{') => Transition::Block,
            Some('(') => Transition::Explicit,
            Some(c) if is_ident_start(c) => Transition::Keyword(self.ident_end(at + 1)),
            _ => Transition::Invalid,
        }
    }

    fn construct(&mut self, transition: Transition) {
        match transition {
            Transition::Comment => self.comment(),
            Transition::Block => self.statement_block(),
            Transition::Explicit => self.explicit_expression(),
            Transition::Keyword(name_end) => {
                let at = self.pos;
                let name = self.collect(at + 1, name_end);
                let descriptor = directive(&name).filter(|_| {
                    if name == "using" {
                        self.next_non_whitespace(name_end) != Some('(')
                    } else {
                        self.starts_line(at)
                    }
                });
                match descriptor {
                    Some(descriptor) => self.directive(descriptor, name_end),
                    None if is_code_keyword(&name) => self.code_statement(),
                    None => self.implicit_expression(),
                }
            }
            Transition::Escape | Transition::Literal | Transition::Invalid => {}
        }
    }

    fn host_comment(&mut self) {
        let end = self
            .find(self.pos + 4, "-->")
            .map_or(self.chars.len(), |close| close + 3);
        self.builder.start_node(NodeKind::HostComment);
        self.markup_text(self.pos, end);
        self.builder.finish_node();
        self.pos = end;
    }

    fn element(&mut self, open: &mut Vec<String>) {
        let start = self.pos;
        let tag = self.scan_start_tag(start);
        let lower = tag.name.to_ascii_lowercase();
        let component = self
            .components
            .get(&tag.name)
            .map(|descriptor| ComponentBinding {
                type_parameters: descriptor.type_parameters.clone(),
                infers_type_parameters: descriptor.supports_type_inference,
            });
        let info = ElementInfo {
            is_void: is_void_element(&tag.name),
            self_closing: tag.self_closing,
            attributes: tag.attributes,
            component,
            name: tag.name,
        };
        let has_body = info.has_body();

        self.builder.start_node(NodeKind::MarkupElement(info));
        self.builder.start_node(NodeKind::MarkupStartTag);
        self.start_tag_content(start, tag.end);
        self.builder.finish_node();
        self.pos = tag.end;

        if has_body {
            if !tag.closed {
                self.unclosed_element(start, &lower);
            } else if RAW_TEXT_ELEMENTS.contains(&lower.as_str()) {
                self.raw_text_body(start, &lower);
            } else {
                open.push(lower.clone());
                let closed_by = self.markup_content(Stop::EndTag, open);
                open.pop();
                if closed_by.as_deref() == Some(lower.as_str()) {
                    self.end_tag();
                } else {
                    self.unclosed_element(start, &lower);
                }
            }
        }
        self.builder.finish_node();
    }

    fn unclosed_element(&mut self, start: usize, name: &str) {
        let end = self.tag_name_end(start + 1);
        self.diagnostics.push(Diagnostic::error(
            start..end,
            codes::UNCLOSED_ELEMENT,
            format!("element `<{name}>` is missing its end tag"),
        ));
        self.builder.missing(NodeKind::MarkupEndTag);
    }

    fn raw_text_body(&mut self, start: usize, name: &str) {
        let close = (self.pos..self.chars.len()).find(|&i| {
            self.starts_with(i, "</")
                && self.collect(i + 2, self.tag_name_end(i + 2)).to_ascii_lowercase() == name
        });
        match close {
            Some(close) => {
                self.markup_text(self.pos, close);
                self.pos = close;
                self.end_tag();
            }
            None => {
                self.markup_text(self.pos, self.chars.len());
                self.pos = self.chars.len();
                self.unclosed_element(start, name);
            }
        }
    }

    fn end_tag(&mut self) {
        let end = self.tag_end(self.pos);
        self.builder.start_node(NodeKind::MarkupEndTag);
        self.markup_text(self.pos, end);
        self.builder.finish_node();
        self.pos = end;
    }

    fn scan_start_tag(&self, start: usize) -> StartTag {
        let name_end = self.tag_name_end(start + 1);
        let mut tag = StartTag {
            name: self.collect(start + 1, name_end),
            attributes: Vec::new(),
            self_closing: false,
            end: self.chars.len(),
            closed: false,
        };

        let mut i = name_end;
        loop {
            while self.at(i).is_some_and(char::is_whitespace) {
                i += 1;
            }
            match self.at(i) {
                None => return tag,
                Some('>') => {
                    tag.end = i + 1;
                    tag.closed = true;
                    return tag;
                }
                Some('/') if self.at(i + 1) == Some('>') => {
                    tag.end = i + 2;
                    tag.closed = true;
                    tag.self_closing = true;
                    return tag;
                }
                Some(_) => {
                    let name_start = i;
                    while self.at(i).is_some_and(|c| {
                        !c.is_whitespace() && c != '=' && c != '>' && c != '/'
                    }) {
                        i += 1;
                    }
                    if i == name_start {
                        i += 1;
                        continue;
                    }
                    tag.attributes.push(self.collect(name_start, i));

                    let mut j = i;
                    while self.at(j).is_some_and(char::is_whitespace) {
                        j += 1;
                    }
                    if self.at(j) != Some('=') {
                        continue;
                    }
                    j += 1;
                    while self.at(j).is_some_and(char::is_whitespace) {
                        j += 1;
                    }
                    i = match self.at(j) {
                        Some(quote @ ('"' | '\'')) => self
                            .find_char(j + 1, quote)
                            .map_or(self.chars.len(), |close| close + 1),
                        _ => {
                            let mut k = j;
                            while self.at(k).is_some_and(|c| !c.is_whitespace() && c != '>') {
                                k += 1;
                            }
                            k
                        }
                    };
                }
            }
        }
    }

    /// Start tag leaves: markup text, with `@x` / `@(x)` inside quoted values as expressions.
    fn start_tag_content(&mut self, start: usize, end: usize) {
        let mut run = start;
        let mut quote = None;
        let mut i = start;
        while i < end {
            let ch = self.chars[i];
            match quote {
                Some(q) if ch == q => quote = None,
                None if ch == '"' || ch == '\'' => quote = Some(ch),
                Some(_) if ch == '@' => {
                    if let Some(expression_end) = self.attribute_expression_end(i, end) {
                        self.markup_text(run, i);
                        self.pos = i;
                        if self.at(i + 1) == Some('(') {
                            self.explicit_expression();
                        } else {
                            self.implicit_expression();
                        }
                        i = expression_end;
                        run = i;
                        continue;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        self.markup_text(run, end);
    }

    fn attribute_expression_end(&self, at: usize, limit: usize) -> Option<usize> {
        if at > 0 && self.chars[at - 1].is_alphanumeric() {
            return None;
        }
        let end = match self.at(at + 1)? {
            '(' => self.matching_close(at + 1, '(', ')')? + 1,
            c if is_ident_start(c) => self.implicit_end(at + 1),
            _ => return None,
        };
        (end <= limit).then_some(end)
    }

    fn markup_text(&mut self, start: usize, end: usize) {
        if end > start {
            self.builder.leaf(NodeKind::MarkupText, start..end);
        }
    }

    // ---- razor constructs ----

    fn comment(&mut self) {
        let at = self.pos;
        self.builder.start_node(NodeKind::Comment);
        self.builder.leaf(NodeKind::Transition, at..at + 1);
        self.builder.leaf(NodeKind::MetaCode, at + 1..at + 2);
        match self.find(at + 2, "*@") {
            Some(close) => {
                self.leaf_if_any(NodeKind::CommentText, at + 2, close);
                self.builder.leaf(NodeKind::MetaCode, close..close + 1);
                self.builder.leaf(NodeKind::Transition, close + 1..close + 2);
                self.pos = close + 2;
            }
            None => {
                let len = self.chars.len();
                self.diagnostics.push(Diagnostic::error(
                    at..len,
                    codes::UNTERMINATED_COMMENT,
                    "the Razor comment is not terminated with `*@`",
                ));
                self.leaf_if_any(NodeKind::CommentText, at + 2, len);
                self.builder.missing(NodeKind::MetaCode);
                self.builder.missing(NodeKind::Transition);
                self.pos = len;
            }
        }
        self.builder.finish_node();
    }

    fn statement_block(&mut self) {
        let at = self.pos;
        self.builder.start_node(NodeKind::StatementBlock);
        self.builder.leaf(NodeKind::Transition, at..at + 1);
        self.builder.leaf(NodeKind::MetaCode, at + 1..at + 2);
        self.pos = at + 2;
        self.builder.start_node(NodeKind::CodeBlock);
        self.code(CodeMode::Block);
        self.builder.finish_node();
        self.close_brace(at);
        self.builder.finish_node();
    }

    fn close_brace(&mut self, opened_at: usize) {
        if self.at(self.pos) == Some('}') {
            self.builder.leaf(NodeKind::MetaCode, self.pos..self.pos + 1);
            self.pos += 1;
        } else {
            self.diagnostics.push(Diagnostic::error(
                opened_at..self.chars.len(),
                codes::MISSING_CLOSE_BRACE,
                "the code block is missing a closing `}`",
            ));
            self.builder.missing(NodeKind::MetaCode);
        }
    }

    fn explicit_expression(&mut self) {
        let at = self.pos;
        self.builder.start_node(NodeKind::ExplicitExpression);
        self.builder.leaf(NodeKind::Transition, at..at + 1);
        self.builder.leaf(NodeKind::MetaCode, at + 1..at + 2);
        match self.matching_close(at + 1, '(', ')') {
            Some(close) => {
                self.leaf_if_any(NodeKind::CodeText, at + 2, close);
                self.builder.leaf(NodeKind::MetaCode, close..close + 1);
                self.pos = close + 1;
            }
            None => {
                let len = self.chars.len();
                self.diagnostics.push(Diagnostic::error(
                    at..len,
                    codes::MISSING_CLOSE_PAREN,
                    "the explicit expression is missing a closing `)`",
                ));
                self.leaf_if_any(NodeKind::CodeText, at + 2, len);
                self.builder.missing(NodeKind::MetaCode);
                self.pos = len;
            }
        }
        self.builder.finish_node();
    }

    fn implicit_expression(&mut self) {
        let at = self.pos;
        let end = self.implicit_end(at + 1);
        self.builder.start_node(NodeKind::ImplicitExpression);
        self.builder.leaf(NodeKind::Transition, at..at + 1);
        self.leaf_if_any(NodeKind::CodeText, at + 1, end);
        self.builder.finish_node();
        self.pos = end;
    }

    fn code_statement(&mut self) {
        let at = self.pos;
        self.builder.start_node(NodeKind::CodeStatement);
        self.builder.leaf(NodeKind::Transition, at..at + 1);
        self.pos = at + 1;
        self.code(CodeMode::Statement);
        self.builder.finish_node();
    }

    fn directive(&mut self, descriptor: &DirectiveDescriptor, name_end: usize) {
        let at = self.pos;
        self.builder
            .start_node(NodeKind::Directive(DirectiveInfo::new(descriptor.name, descriptor.kind)));
        self.builder.leaf(NodeKind::Transition, at..at + 1);
        self.builder.leaf(NodeKind::MetaCode, at + 1..name_end);
        self.pos = name_end;

        match descriptor.kind {
            DirectiveKind::SingleLine => {
                let mut end = self.find_char(self.pos, '\n').unwrap_or(self.chars.len());
                if end > self.pos && self.at(end - 1) == Some('\r') {
                    end -= 1;
                }
                self.builder.start_node(NodeKind::DirectiveBody);
                self.leaf_if_any(NodeKind::CodeText, self.pos, end);
                self.builder.finish_node();
                self.pos = end;
            }
            DirectiveKind::CodeBlock => {
                let open = self.next_non_whitespace_at(self.pos);
                if let Some(open) = open.filter(|&i| self.chars[i] == '{') {
                    self.builder.start_node(NodeKind::DirectiveBody);
                    self.leaf_if_any(NodeKind::CodeText, self.pos, open);
                    self.builder.leaf(NodeKind::MetaCode, open..open + 1);
                    self.pos = open + 1;
                    self.builder.start_node(NodeKind::MemberBlock);
                    self.code(CodeMode::Block);
                    self.builder.finish_node();
                    self.close_brace(open);
                    self.builder.finish_node();
                }
            }
            DirectiveKind::RazorBlock => {
                let open = (self.pos..self.chars.len())
                    .find(|&i| matches!(self.chars[i], '{' | '<' | '@'))
                    .filter(|&i| self.chars[i] == '{');
                if let Some(open) = open {
                    self.builder.start_node(NodeKind::DirectiveBody);
                    self.leaf_if_any(NodeKind::CodeText, self.pos, open);
                    self.builder.leaf(NodeKind::MetaCode, open..open + 1);
                    self.pos = open + 1;
                    self.builder.start_node(NodeKind::SectionBlock);
                    self.markup_content(Stop::Brace, &mut Vec::new());
                    self.builder.finish_node();
                    self.close_brace(open);
                    self.builder.finish_node();
                }
            }
        }
        self.builder.finish_node();
    }

    // ---- code ----

    fn code(&mut self, mode: CodeMode) {
        let start = self.pos;
        let is_do = mode == CodeMode::Statement && self.word_at(self.pos) == "do";
        let mut run = self.pos;
        let mut depth = 0usize;
        let mut parens = 0usize;
        let mut body_opened = false;
        let mut until_semicolon = false;
        let mut markup_allowed = mode == CodeMode::Block;
        let mut ended = false;

        while let Some(ch) = self.at(self.pos) {
            if let Some(end) = self.literal_end(self.pos) {
                if ch != '/' {
                    markup_allowed = false;
                }
                self.pos = end;
                continue;
            }
            let next = self.at(self.pos + 1);
            let markup_here = markup_allowed && (mode == CodeMode::Block || depth > 0);
            match ch {
                '@' if next == Some(':') => {
                    let text_end = self.trim_back(run, self.pos);
                    self.leaf_if_any(NodeKind::CodeText, run, text_end);
                    self.markup_line(text_end);
                    run = self.pos;
                    markup_allowed = true;
                    continue;
                }
                '@' if next == Some('<') => {
                    self.leaf_if_any(NodeKind::CodeText, run, self.pos);
                    self.template();
                    run = self.pos;
                    continue;
                }
                '@' if next == Some('*') => {
                    self.leaf_if_any(NodeKind::CodeText, run, self.pos);
                    self.comment();
                    run = self.pos;
                    continue;
                }
                '<' if markup_here && next.is_some_and(|c| c.is_ascii_alphabetic()) => {
                    let text_end = self.trim_back(run, self.pos);
                    self.leaf_if_any(NodeKind::CodeText, run, text_end);
                    self.markup_in_code(text_end);
                    run = self.pos;
                    markup_allowed = true;
                    continue;
                }
                '(' | '[' => {
                    parens += 1;
                    markup_allowed = false;
                }
                ')' | ']' => {
                    parens = parens.saturating_sub(1);
                    markup_allowed = false;
                }
                '{' => {
                    depth += 1;
                    if mode == CodeMode::Statement && parens == 0 {
                        body_opened = true;
                    }
                    markup_allowed = true;
                }
                '}' => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    self.pos += 1;
                    markup_allowed = true;
                    if mode == CodeMode::Statement && depth == 0 && body_opened && !until_semicolon
                    {
                        match self.continuation_keyword(self.pos).as_deref() {
                            Some("while") if is_do => until_semicolon = true,
                            Some("else" | "catch" | "finally") => {}
                            _ => {
                                ended = true;
                                break;
                            }
                        }
                    }
                    continue;
                }
                ';' => {
                    markup_allowed = true;
                    if until_semicolon && depth == 0 {
                        self.pos += 1;
                        ended = true;
                        break;
                    }
                }
                ':' if parens == 0 => markup_allowed = true,
                c if c.is_whitespace() => {}
                _ => markup_allowed = false,
            }
            self.pos += 1;
        }
        self.leaf_if_any(NodeKind::CodeText, run, self.pos);

        if mode == CodeMode::Statement && !ended && self.pos >= self.chars.len() {
            self.diagnostics.push(Diagnostic::error(
                start..self.chars.len(),
                codes::MISSING_CLOSE_BRACE,
                "the code statement is missing a closing `}`",
            ));
        }
    }

    /// `@:text` up to the end of the line.
    fn markup_line(&mut self, whitespace_start: usize) {
        let at = self.pos;
        self.builder.start_node(NodeKind::MarkupBlock);
        self.markup_text(whitespace_start, at);
        self.builder.leaf(NodeKind::Transition, at..at + 1);
        self.builder.leaf(NodeKind::MetaCode, at + 1..at + 2);
        self.pos = at + 2;
        self.markup_content(Stop::LineEnd, &mut Vec::new());
        self.builder.finish_node();
    }

    /// An element that starts a code line.
    fn markup_in_code(&mut self, whitespace_start: usize) {
        self.builder.start_node(NodeKind::MarkupBlock);
        self.markup_text(whitespace_start, self.pos);
        self.element(&mut Vec::new());
        self.builder.finish_node();
    }

    /// `@<tag>...</tag>` inside an expression.
    fn template(&mut self) {
        let at = self.pos;
        self.builder.start_node(NodeKind::Template);
        self.builder.leaf(NodeKind::Transition, at..at + 1);
        self.pos = at + 1;
        self.element(&mut Vec::new());
        self.builder.finish_node();
    }

    /// End of the string, char literal or comment starting at `i`.
    fn literal_end(&self, i: usize) -> Option<usize> {
        let len = self.chars.len();
        match (self.at(i)?, self.at(i + 1), self.at(i + 2)) {
            ('/', Some('/'), _) => Some(self.find_char(i, '\n').unwrap_or(len)),
            ('/', Some('*'), _) => Some(self.find(i + 2, "*/").map_or(len, |close| close + 2)),
            ('"', Some('"'), Some('"')) => {
                Some(self.find(i + 3, "\"\"\"").map_or(len, |close| close + 3))
            }
            ('"', _, _) => Some(self.quoted_end(i, '"', false)),
            ('\'', _, _) => Some(self.quoted_end(i, '\'', false)),
            ('@', Some('"'), _) => Some(self.quoted_end(i + 1, '"', true)),
            ('@' | '$', Some('$' | '@'), Some('"')) => Some(self.quoted_end(i + 2, '"', true)),
            ('$', Some('"'), _) => Some(self.quoted_end(i + 1, '"', false)),
            _ => None,
        }
    }

    fn quoted_end(&self, open: usize, quote: char, verbatim: bool) -> usize {
        let mut i = open + 1;
        while let Some(ch) = self.at(i) {
            if verbatim {
                if ch == quote {
                    if self.at(i + 1) == Some(quote) {
                        i += 2;
                        continue;
                    }
                    return i + 1;
                }
            } else if ch == '\\' {
                i += 2;
                continue;
            } else if ch == quote {
                return i + 1;
            } else if ch == '\n' {
                return i;
            }
            i += 1;
        }
        self.chars.len()
    }

    /// Index of the closer matching the opener at `open`, skipping literals.
    fn matching_close(&self, open: usize, opener: char, closer: char) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = open;
        while let Some(ch) = self.at(i) {
            if let Some(end) = self.literal_end(i) {
                i = end;
                continue;
            }
            if ch == opener {
                depth += 1;
            } else if ch == closer {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            i += 1;
        }
        None
    }

    /// End of `name.member?.other(args)[index]` starting at `start`.
    fn implicit_end(&self, start: usize) -> usize {
        let mut i = self.ident_end(start);
        if self.collect(start, i) == "await" {
            let next = self.next_non_whitespace_at(i);
            if let Some(next) =
                next.filter(|&n| !self.chars[i..n].contains(&'\n') && is_ident_start(self.chars[n]))
            {
                i = self.ident_end(next);
            }
        }
        loop {
            match (self.at(i), self.at(i + 1), self.at(i + 2)) {
                (Some('.'), Some(c), _) if is_ident_start(c) => i = self.ident_end(i + 1),
                (Some('?'), Some('.'), Some(c)) if is_ident_start(c) => i = self.ident_end(i + 2),
                (Some('('), _, _) => match self.matching_close(i, '(', ')') {
                    Some(close) => i = close + 1,
                    None => break,
                },
                (Some('['), _, _) => match self.matching_close(i, '[', ']') {
                    Some(close) => i = close + 1,
                    None => break,
                },
                _ => break,
            }
        }
        i
    }

    /// The identifier after the whitespace at `i`, if any.
    fn continuation_keyword(&self, i: usize) -> Option<String> {
        let start = self.next_non_whitespace_at(i)?;
        let word = self.word_at(start);
        (!word.is_empty()).then_some(word)
    }

    // ---- character helpers ----

    fn at(&self, i: usize) -> Option<char> {
        self.chars.get(i).copied()
    }

    fn collect(&self, start: usize, end: usize) -> String {
        self.chars[start.min(self.chars.len())..end.min(self.chars.len())]
            .iter()
            .collect()
    }

    fn starts_with(&self, i: usize, pattern: &str) -> bool {
        pattern
            .chars()
            .enumerate()
            .all(|(k, ch)| self.at(i + k) == Some(ch))
    }

    fn find(&self, from: usize, pattern: &str) -> Option<usize> {
        (from..self.chars.len()).find(|&i| self.starts_with(i, pattern))
    }

    fn find_char(&self, from: usize, ch: char) -> Option<usize> {
        (from..self.chars.len()).find(|&i| self.chars[i] == ch)
    }

    fn ident_end(&self, start: usize) -> usize {
        let mut i = start;
        while self.at(i).is_some_and(is_ident_char) {
            i += 1;
        }
        i
    }

    fn word_at(&self, start: usize) -> String {
        self.collect(start, self.ident_end(start))
    }

    fn tag_name_end(&self, start: usize) -> usize {
        let mut i = start;
        while self
            .at(i)
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '-' | ':' | '.' | '_'))
        {
            i += 1;
        }
        i
    }

    /// End of the tag starting at `start` (after its `>`), skipping quoted values.
    fn tag_end(&self, start: usize) -> usize {
        let mut quote = None;
        for i in start..self.chars.len() {
            let ch = self.chars[i];
            match quote {
                Some(q) if ch == q => quote = None,
                Some(_) => {}
                None if ch == '"' || ch == '\'' => quote = Some(ch),
                None if ch == '>' => return i + 1,
                None => {}
            }
        }
        self.chars.len()
    }

    fn next_non_whitespace_at(&self, from: usize) -> Option<usize> {
        (from..self.chars.len()).find(|&i| !self.chars[i].is_whitespace())
    }

    fn next_non_whitespace(&self, from: usize) -> Option<char> {
        self.next_non_whitespace_at(from).map(|i| self.chars[i])
    }

    /// Only spaces and tabs precede `at` on its line.
    fn starts_line(&self, at: usize) -> bool {
        self.chars[..at]
            .iter()
            .rev()
            .take_while(|&&c| c != '\n')
            .all(|&c| c == ' ' || c == '\t')
    }

    /// Move `end` back over spaces and tabs, not past `start`.
    fn trim_back(&self, start: usize, mut end: usize) -> usize {
        while end > start && matches!(self.chars[end - 1], ' ' | '\t') {
            end -= 1;
        }
        end
    }

    fn leaf_if_any(&mut self, kind: NodeKind, start: usize, end: usize) {
        if end > start {
            self.builder.leaf(kind, start..end);
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use razor_fmt::SyntaxNode;

    fn leaves(tree: &SyntaxTree) -> Vec<(NodeKind, std::ops::Range<usize>)> {
        tree.root()
            .descendants()
            .filter(|node| node.kind().is_leaf() && !node.is_missing())
            .map(|node| (node.kind().clone(), node.span()))
            .collect()
    }

    fn first_child(tree: &SyntaxTree) -> SyntaxNode<'_> {
        tree.root().children().next().unwrap()
    }

    fn ids(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_leaves_tile_the_document() {
        let text = "<div class=\"a @cls\">\n    @if (x) {\n        <p>@(y + 1)</p>\n    }\n</div>\n@* note *@\n";
        let (tree, diagnostics) = RazorParser::new().parse_tree(text);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");

        let mut cursor = 0;
        for (_, span) in leaves(&tree) {
            assert_eq!(span.start, cursor);
            cursor = span.end;
        }
        assert_eq!(cursor, text.chars().count());
    }

    #[test]
    fn test_statement_block_shape() {
        let (tree, diagnostics) = RazorParser::new().parse_tree("@{\n    var x = 1;\n}");
        assert!(diagnostics.is_empty());
        let block = first_child(&tree);
        let kinds = block.children().map(|c| c.kind().clone()).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Transition,
                NodeKind::MetaCode,
                NodeKind::CodeBlock,
                NodeKind::MetaCode,
            ]
        );
        assert_eq!(block.children().nth(2).unwrap().span(), 2..18);
    }

    #[test]
    fn test_markup_inside_code_splits_runs() {
        let text = "@{\n    <p>hi</p>\n}";
        let (tree, _) = RazorParser::new().parse_tree(text);
        let code_block = first_child(&tree).children().nth(2).unwrap();
        let kinds = code_block
            .children()
            .map(|c| (c.kind().clone(), c.span()))
            .collect::<Vec<_>>();
        assert_eq!(kinds[0], (NodeKind::CodeText, 2..3));
        assert_eq!(kinds[1].0, NodeKind::MarkupBlock);
        assert_eq!(kinds[1].1, 3..16);
        assert_eq!(kinds[2], (NodeKind::CodeText, 16..17));
    }

    #[test]
    fn test_code_statement_with_continuations() {
        let text = "@if (a) {\n    x();\n} else {\n    y();\n}\n<p></p>";
        let (tree, diagnostics) = RazorParser::new().parse_tree(text);
        assert!(diagnostics.is_empty());
        let statement = first_child(&tree);
        assert_eq!(statement.kind(), &NodeKind::CodeStatement);
        assert_eq!(statement.span(), 0..38);
    }

    #[test]
    fn test_do_while_runs_to_semicolon() {
        let (tree, diagnostics) = RazorParser::new().parse_tree("@do {\n    i++;\n} while (i < 3);\nend");
        assert!(diagnostics.is_empty());
        assert_eq!(first_child(&tree).span(), 0..31);
    }

    #[test]
    fn test_directives() {
        let (tree, _) = RazorParser::new().parse_tree("@inject IFoo Foo\n@code {\n    int x;\n}");
        let kinds = tree
            .root()
            .children()
            .filter_map(|c| match c.kind() {
                NodeKind::Directive(info) => Some((info.name.clone(), info.kind)),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                ("inject".to_string(), DirectiveKind::SingleLine),
                ("code".to_string(), DirectiveKind::CodeBlock),
            ]
        );

        let member = tree
            .root()
            .descendants()
            .find(|n| n.kind() == &NodeKind::MemberBlock)
            .unwrap();
        assert_eq!(member.span(), 24..36);
    }

    #[test]
    fn test_using_with_paren_is_a_statement() {
        let (tree, _) = RazorParser::new().parse_tree("@using (var s = Open()) {\n}");
        assert_eq!(first_child(&tree).kind(), &NodeKind::CodeStatement);
        let (tree, _) = RazorParser::new().parse_tree("@using System.Linq");
        assert!(matches!(first_child(&tree).kind(), NodeKind::Directive(_)));
    }

    #[test]
    fn test_directive_name_mid_line_is_an_expression() {
        let (tree, diagnostics) = RazorParser::new().parse_tree("<p>@page</p>");
        assert!(diagnostics.is_empty());
        assert!(
            tree.root()
                .descendants()
                .any(|n| n.kind() == &NodeKind::ImplicitExpression)
        );
    }

    #[test]
    fn test_implicit_expression_extent() {
        let (tree, _) = RazorParser::new().parse_tree("<p>@user.Name.ToUpper(). Done</p>");
        let expression = tree
            .root()
            .descendants()
            .find(|n| n.kind() == &NodeKind::ImplicitExpression)
            .unwrap();
        assert_eq!(expression.span(), 3..23);
    }

    #[test]
    fn test_email_and_escape_are_text() {
        let (tree, diagnostics) = RazorParser::new().parse_tree("mail me@host.com or @@home");
        assert!(diagnostics.is_empty());
        assert_eq!(leaves(&tree), vec![(NodeKind::MarkupText, 0..26)]);
    }

    #[test]
    fn test_section_body_is_markup() {
        let (tree, diagnostics) = RazorParser::new().parse_tree("@section Scripts {\n    <script>if (a) { }</script>\n}");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let section = tree
            .root()
            .descendants()
            .find(|n| n.kind() == &NodeKind::SectionBlock)
            .unwrap();
        assert!(
            section
                .descendants()
                .any(|n| matches!(n.kind(), NodeKind::MarkupElement(info) if info.name == "script"))
        );
    }

    #[test]
    fn test_component_binding() {
        let catalog = ComponentCatalog::new().with(razor_fmt_lang::ComponentDescriptor::generic(
            "Grid",
            ["TItem"],
        ));
        let parser = RazorParser::new().with_components(catalog);
        let (tree, _) = parser.parse_tree("<Grid Items=\"@items\">\n</Grid>");
        let NodeKind::MarkupElement(info) = first_child(&tree).kind() else {
            panic!("expected an element");
        };
        assert_eq!(info.attributes, vec!["Items".to_string()]);
        assert!(info.needs_type_inference());
    }

    #[test]
    fn test_error_recovery_diagnostics() {
        let parser = RazorParser::new();
        assert_eq!(ids(&parser.parse_tree("@{ var x = 1;").1), vec![codes::MISSING_CLOSE_BRACE]);
        assert_eq!(ids(&parser.parse_tree("@* open").1), vec![codes::UNTERMINATED_COMMENT]);
        assert_eq!(ids(&parser.parse_tree("a @ b").1), vec![codes::INVALID_TRANSITION]);
        assert_eq!(ids(&parser.parse_tree("<div><p></div>").1), vec![codes::UNCLOSED_ELEMENT]);
        assert_eq!(ids(&parser.parse_tree("</p>").1), vec![codes::STRAY_END_TAG]);
        assert_eq!(ids(&parser.parse_tree("@(a + b").1), vec![codes::MISSING_CLOSE_PAREN]);
        assert_eq!(ids(&parser.parse_tree("@if (a) {").1), vec![codes::MISSING_CLOSE_BRACE]);
    }

    #[test]
    fn test_missing_brace_leaves_missing_node() {
        let (tree, _) = RazorParser::new().parse_tree("@{ x;");
        let block = first_child(&tree);
        let last = block.children().last().unwrap();
        assert!(last.is_missing());
        assert_eq!(last.kind(), &NodeKind::MetaCode);
    }

    #[test]
    fn test_braces_in_strings_do_not_count() {
        let (tree, diagnostics) = RazorParser::new().parse_tree("@{\n    var s = \"}\";\n    // }\n}");
        assert!(diagnostics.is_empty());
        assert_eq!(first_child(&tree).span(), 0..30);
    }
}
