//! Embedded C# document generation.
//!
//! The generated document wraps the document's C# in a namespace and a partial class:
//!
//! ```text
//! namespace __RazorGenerated
//! {
//!     public partial class __Document
//!     {
//!         <@code / @functions members>
//!         public void __Render0()
//!         {
//!             <statements, `__o = expression;` and `__o = (expression);` lines>
//!         }
//!     }
//! }
//! ```
//!
//! Host C# text is copied verbatim and recorded as a [`SourceMapping`]. Markup that interrupts a
//! code run becomes an empty line, so statements around it keep their own lines. Render methods are
//! opened lazily and closed before class-level members.

use razor_fmt::{EmbeddedDocument, NodeKind, SourceMapping, SourceText, SyntaxNode, SyntaxTree};
use std::ops::Range;

const PROLOGUE: &str = "namespace __RazorGenerated\n{\n    public partial class __Document\n    {\n";
const EPILOGUE: &str = "    }\n}\n";

/// Generate the embedded C# document for `tree`.
pub fn generate_embedded_document(tree: &SyntaxTree, text: &SourceText) -> EmbeddedDocument {
    let mut generator = Generator {
        text,
        out: String::from(PROLOGUE),
        len: PROLOGUE.chars().count(),
        mappings: Vec::new(),
        method_open: false,
        methods: 0,
        code_depth: 0,
    };
    generator.visit(tree.root(), false);
    generator.close_method();
    generator.push(EPILOGUE);
    EmbeddedDocument::new(SourceText::new(&generator.out), generator.mappings, true)
}

struct Generator<'a> {
    text: &'a SourceText,
    out: String,
    len: usize,
    mappings: Vec<SourceMapping>,
    method_open: bool,
    methods: usize,
    /// Number of enclosing code regions; expressions at depth 0 need a render method.
    code_depth: usize,
}

impl Generator<'_> {
    fn visit(&mut self, node: SyntaxNode<'_>, in_code: bool) {
        if node.is_missing() {
            return;
        }
        match node.kind() {
            NodeKind::Document
            | NodeKind::MarkupStartTag
            | NodeKind::MarkupEndTag
            | NodeKind::StatementBlock
            | NodeKind::DirectiveBody
            | NodeKind::SectionBlock => self.children(node, in_code),
            NodeKind::Directive(_) => self.children(node, false),
            NodeKind::MarkupBlock => {
                if in_code {
                    self.line_break();
                    self.push("\n");
                }
                self.children(node, false);
            }
            NodeKind::MarkupElement(info) if info.needs_type_inference() => {
                self.enter_render_method();
                let mut children = node.children();
                if let Some(start_tag) = children.next() {
                    self.visit(start_tag, false);
                }
                self.line_break();
                self.push("{\n");
                for child in children {
                    self.visit(child, false);
                }
                self.line_break();
                self.push("}\n");
            }
            NodeKind::MarkupElement(_) => self.children(node, false),
            NodeKind::CodeBlock | NodeKind::CodeStatement => {
                self.enter_render_method();
                self.code_region(node);
            }
            NodeKind::MemberBlock => {
                if self.code_depth == 0 {
                    self.close_method();
                }
                self.code_region(node);
                self.line_break();
            }
            NodeKind::ExplicitExpression | NodeKind::ImplicitExpression => {
                let explicit = *node.kind() == NodeKind::ExplicitExpression;
                self.enter_render_method();
                self.line_break();
                self.push(if explicit { "__o = (" } else { "__o = " });
                for child in node.present_children() {
                    if *child.kind() == NodeKind::CodeText {
                        self.map(child.span());
                    }
                }
                self.push(if explicit { ");\n" } else { ";\n" });
            }
            NodeKind::Template => {
                if in_code {
                    self.push("__template");
                }
            }
            NodeKind::CodeText => {
                if in_code {
                    self.map(node.span());
                }
            }
            NodeKind::HostComment
            | NodeKind::Comment
            | NodeKind::Transition
            | NodeKind::MetaCode
            | NodeKind::MarkupText
            | NodeKind::CommentText => {}
        }
    }

    fn children(&mut self, node: SyntaxNode<'_>, in_code: bool) {
        for child in node.children() {
            self.visit(child, in_code);
        }
    }

    fn code_region(&mut self, node: SyntaxNode<'_>) {
        self.code_depth += 1;
        self.children(node, true);
        self.code_depth -= 1;
    }

    fn enter_render_method(&mut self) {
        if self.code_depth > 0 || self.method_open {
            return;
        }
        self.line_break();
        let header = format!(
            "        public void __Render{}()\n        {{\n",
            self.methods
        );
        self.push(&header);
        self.methods += 1;
        self.method_open = true;
    }

    fn close_method(&mut self) {
        if self.method_open {
            self.line_break();
            self.push("        }\n");
            self.method_open = false;
        }
    }

    fn line_break(&mut self) {
        if !self.out.ends_with('\n') {
            self.push("\n");
        }
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
        self.len += text.chars().count();
    }

    fn map(&mut self, original: Range<usize>) {
        if original.is_empty() {
            return;
        }
        let start = self.len;
        let code = self.text.slice(original.clone());
        self.push(&code);
        self.mappings
            .push(SourceMapping::new(original, start..self.len));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RazorParser;
    use pretty_assertions::assert_eq;

    fn generate(text: &str) -> EmbeddedDocument {
        let (tree, _) = RazorParser::new().parse_tree(text);
        generate_embedded_document(&tree, &SourceText::new(text))
    }

    #[test]
    fn test_markup_only_has_no_mappings() {
        let document = generate("<p>hello</p>\n@inject IFoo Foo\n");
        assert!(document.mappings.is_empty());
        assert_eq!(document.text.as_str(), format!("{PROLOGUE}{EPILOGUE}"));
        assert!(document.namespace_scoped);
    }

    #[test]
    fn test_statement_block_goes_into_render_method() {
        let document = generate("@{\n    var x = 1;\n}");
        assert_eq!(
            document.text.as_str(),
            format!(
                "{PROLOGUE}        public void __Render0()\n        {{\n\n    var x = 1;\n        }}\n{EPILOGUE}"
            )
        );
        assert_eq!(document.mappings.len(), 1);
        assert_eq!(document.mappings[0].original, 2..18);
    }

    #[test]
    fn test_members_stay_at_class_level() {
        let document = generate("<p>@a</p>\n@code {\n    int a;\n}");
        let text = document.text.as_str();
        let render = text.find("__Render0").unwrap();
        let member = text.find("int a;").unwrap();
        let close = text[render..].find("        }\n").unwrap() + render;
        assert!(close < member, "{text}");
        assert!(text.contains("__o = a;\n"));
    }

    #[test]
    fn test_markup_in_code_becomes_blank_line() {
        let text = "@if (a) {\n    <p>@b</p>\n}";
        let document = generate(text);
        let generated = document.text.as_str();
        assert!(generated.contains("if (a) {\n\n__o = b;\n\n}"), "{generated}");
        assert!(document.is_monotonic());
        assert_eq!(document.mappings.len(), 3);
    }

    #[test]
    fn test_type_inference_wraps_component_body() {
        use razor_fmt_lang::{ComponentCatalog, ComponentDescriptor};

        let catalog = ComponentCatalog::new().with(ComponentDescriptor::generic("Grid", ["TItem"]));
        let text = "<Grid Items=\"@items\">\n    @row\n</Grid>";
        let (tree, _) = RazorParser::new()
            .with_components(catalog)
            .parse_tree(text);
        let document = generate_embedded_document(&tree, &SourceText::new(text));
        assert!(
            document
                .text
                .as_str()
                .contains("__o = items;\n{\n__o = row;\n}\n"),
            "{}",
            document.text.as_str()
        );
    }

    #[test]
    fn test_explicit_expression_keeps_its_parentheses() {
        let document = generate("<p>@(a +\n b)</p>");
        let generated = document.text.as_str();
        assert!(generated.contains("__o = (a +\n b);\n"), "{generated}");
        assert_eq!(document.mappings.len(), 1);
        assert_eq!(document.mappings[0].original, 5..11);
    }

    #[test]
    fn test_mappings_copy_host_text() {
        let text = "@{\n    var s = \"ü\";\n}\n<p>@(s + 1)</p>";
        let document = generate(text);
        let host = SourceText::new(text);
        for mapping in &document.mappings {
            assert_eq!(
                host.slice(mapping.original.clone()),
                document.text.slice(mapping.generated.clone())
            );
        }
        assert!(document.is_monotonic());
    }
}
