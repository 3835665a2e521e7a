#![warn(missing_docs)]
//! `razor-fmt-lang` - data-driven Razor language tables for `razor-fmt`.
//!
//! This crate intentionally stays lightweight and does **not** depend on any parser or formatter.
//! It provides the small lookup tables that the parser, the span classifier, and the cleanup pass
//! share: directive descriptors, HTML void elements, C# statement keywords that start a code
//! statement after `@`, on-type trigger characters, and component descriptors used for generic
//! type inference.

/// How a directive's body is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// The body runs to the end of the line (`@inject IFoo Foo`, `@using System`).
    SingleLine,
    /// The body is a braced block of class members (`@code { ... }`).
    CodeBlock,
    /// The body is a braced block of markup (`@section Scripts { ... }`).
    RazorBlock,
}

/// A known Razor directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectiveDescriptor {
    /// Directive keyword without the leading `@`.
    pub name: &'static str,
    /// Body shape.
    pub kind: DirectiveKind,
}

impl DirectiveDescriptor {
    const fn new(name: &'static str, kind: DirectiveKind) -> Self {
        Self { name, kind }
    }
}

/// Built-in directives understood by the parser.
pub const BUILTIN_DIRECTIVES: &[DirectiveDescriptor] = &[
    DirectiveDescriptor::new("code", DirectiveKind::CodeBlock),
    DirectiveDescriptor::new("functions", DirectiveKind::CodeBlock),
    DirectiveDescriptor::new("section", DirectiveKind::RazorBlock),
    DirectiveDescriptor::new("attribute", DirectiveKind::SingleLine),
    DirectiveDescriptor::new("implements", DirectiveKind::SingleLine),
    DirectiveDescriptor::new("inherits", DirectiveKind::SingleLine),
    DirectiveDescriptor::new("inject", DirectiveKind::SingleLine),
    DirectiveDescriptor::new("layout", DirectiveKind::SingleLine),
    DirectiveDescriptor::new("model", DirectiveKind::SingleLine),
    DirectiveDescriptor::new("namespace", DirectiveKind::SingleLine),
    DirectiveDescriptor::new("page", DirectiveKind::SingleLine),
    DirectiveDescriptor::new("preservewhitespace", DirectiveKind::SingleLine),
    DirectiveDescriptor::new("rendermode", DirectiveKind::SingleLine),
    DirectiveDescriptor::new("typeparam", DirectiveKind::SingleLine),
    DirectiveDescriptor::new("using", DirectiveKind::SingleLine),
];

/// Look up a built-in directive by keyword.
pub fn directive(name: &str) -> Option<&'static DirectiveDescriptor> {
    BUILTIN_DIRECTIVES.iter().find(|d| d.name == name)
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Returns `true` for HTML void elements (no content, no end tag).
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(name))
}

const CODE_KEYWORDS: &[&str] = &[
    "if", "for", "foreach", "while", "do", "switch", "try", "lock", "using",
];

/// Returns `true` if `@keyword` starts a C# code statement rather than an expression.
///
/// `using` is ambiguous: it is a statement only when followed by `(`. Callers resolve that case.
pub fn is_code_keyword(name: &str) -> bool {
    CODE_KEYWORDS.contains(&name)
}

/// Keywords that continue a code statement after its closing brace.
pub const CONTINUATION_KEYWORDS: &[&str] = &["else", "catch", "finally", "while"];

/// Characters that trigger on-type formatting.
pub const ON_TYPE_TRIGGER_CHARACTERS: &[char] = &['}', ';', '\n'];

/// Returns `true` if `ch` triggers on-type formatting.
pub fn is_on_type_trigger(ch: char) -> bool {
    ON_TYPE_TRIGGER_CHARACTERS.contains(&ch)
}

/// Describes a component that elements can bind to.
///
/// Components with generic type parameters may infer them from attribute values; the generated
/// code then wraps the component body in an extra lambda, which costs one indentation level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComponentDescriptor {
    /// Tag name the component binds to (case-sensitive, e.g. `Grid`).
    pub tag_name: String,
    /// Generic type parameter names (e.g. `TItem`).
    pub type_parameters: Vec<String>,
    /// Whether the component can infer its type parameters.
    pub supports_type_inference: bool,
}

impl ComponentDescriptor {
    /// Create a non-generic component descriptor.
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            type_parameters: Vec::new(),
            supports_type_inference: false,
        }
    }

    /// Create a generic component whose type parameters are inferred from attributes.
    pub fn generic<I, S>(tag_name: impl Into<String>, type_parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tag_name: tag_name.into(),
            type_parameters: type_parameters.into_iter().map(Into::into).collect(),
            supports_type_inference: true,
        }
    }

    /// Returns `true` if the component has at least one type parameter to infer.
    pub fn is_generic(&self) -> bool {
        self.supports_type_inference && !self.type_parameters.is_empty()
    }
}

/// A set of component descriptors, looked up by tag name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComponentCatalog {
    components: Vec<ComponentDescriptor>,
}

impl ComponentCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor (builder style).
    pub fn with(mut self, descriptor: ComponentDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    /// Add or replace a descriptor.
    pub fn insert(&mut self, descriptor: ComponentDescriptor) {
        if let Some(existing) = self
            .components
            .iter_mut()
            .find(|c| c.tag_name == descriptor.tag_name)
        {
            *existing = descriptor;
        } else {
            self.components.push(descriptor);
        }
    }

    /// Find the descriptor bound to `tag_name`.
    pub fn get(&self, tag_name: &str) -> Option<&ComponentDescriptor> {
        self.components.iter().find(|c| c.tag_name == tag_name)
    }

    /// Returns `true` if no components are registered.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_lookup() {
        assert_eq!(directive("code").map(|d| d.kind), Some(DirectiveKind::CodeBlock));
        assert_eq!(directive("inject").map(|d| d.kind), Some(DirectiveKind::SingleLine));
        assert_eq!(directive("section").map(|d| d.kind), Some(DirectiveKind::RazorBlock));
        assert!(directive("Code").is_none());
    }

    #[test]
    fn test_void_elements_ignore_case() {
        assert!(is_void_element("br"));
        assert!(is_void_element("IMG"));
        assert!(!is_void_element("div"));
    }

    #[test]
    fn test_catalog_insert_replaces() {
        let mut catalog = ComponentCatalog::new().with(ComponentDescriptor::new("Grid"));
        assert!(!catalog.get("Grid").is_some_and(ComponentDescriptor::is_generic));

        catalog.insert(ComponentDescriptor::generic("Grid", ["TItem"]));
        assert!(catalog.get("Grid").is_some_and(ComponentDescriptor::is_generic));
        assert!(catalog.get("grid").is_none());
    }
}
