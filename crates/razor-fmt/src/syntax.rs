//! Read-only Razor syntax tree.
//!
//! The tree is an arena of nodes addressed by [`NodeId`]. Node kinds form a closed enum so the
//! span classifier can visit the whole tree with a single `match`. Trees are built once by a
//! [`DocumentParser`](crate::DocumentParser) through [`TreeBuilder`] and never mutated afterwards.
//!
//! Every node covers a half-open range of **character offsets** in the host document. Inner node
//! spans are the union of their children; leaves carry the actual text ranges.

use razor_fmt_lang::DirectiveKind;
use std::fmt;
use std::ops::Range;

/// Markup element details.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementInfo {
    /// Tag name as written.
    pub name: String,
    /// HTML void element (`<br>`, `<input>`).
    pub is_void: bool,
    /// Written as `<tag ... />`.
    pub self_closing: bool,
    /// Attribute names as written (including `@bind-Value`, `TItem`, ...).
    pub attributes: Vec<String>,
    /// Component binding, when the tag binds to a known component.
    pub component: Option<ComponentBinding>,
}

impl ElementInfo {
    /// Create element info for a plain tag.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns `true` if the element has a body between its start and end tags.
    pub fn has_body(&self) -> bool {
        !self.is_void && !self.self_closing
    }

    /// Returns `true` if the generated code wraps this element's body in a type inference lambda.
    ///
    /// That is the case when the bound component infers type parameters and the attributes do not
    /// name every one of them explicitly.
    pub fn needs_type_inference(&self) -> bool {
        let Some(component) = &self.component else {
            return false;
        };
        component.infers_type_parameters
            && !component.type_parameters.is_empty()
            && !component
                .type_parameters
                .iter()
                .all(|param| self.attributes.iter().any(|attr| attr == param))
    }
}

/// A component bound to a markup element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComponentBinding {
    /// Generic type parameter names.
    pub type_parameters: Vec<String>,
    /// Whether the component infers type parameters that are not supplied explicitly.
    pub infers_type_parameters: bool,
}

/// Directive details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveInfo {
    /// Directive keyword without `@`.
    pub name: String,
    /// Body shape.
    pub kind: DirectiveKind,
}

impl DirectiveInfo {
    /// Create directive info.
    pub fn new(name: impl Into<String>, kind: DirectiveKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Closed set of syntax node kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Root node.
    Document,
    /// A run of markup content (elements, text, host comments).
    MarkupBlock,
    /// A markup element: start tag, body, end tag.
    MarkupElement(ElementInfo),
    /// `<tag ...>`.
    MarkupStartTag,
    /// `</tag>`.
    MarkupEndTag,
    /// `<!-- ... -->`.
    HostComment,
    /// `@{ ... }`.
    StatementBlock,
    /// Statement-level code inside a statement block or code statement.
    CodeBlock,
    /// Class-level code inside `@code { ... }` / `@functions { ... }`.
    MemberBlock,
    /// Markup body of `@section Name { ... }`.
    SectionBlock,
    /// `@if (...) { ... }`, `@foreach (...) { ... }`, ...
    CodeStatement,
    /// `@( ... )`.
    ExplicitExpression,
    /// `@name.member(args)`.
    ImplicitExpression,
    /// `@keyword body`.
    Directive(DirectiveInfo),
    /// Everything after a directive keyword.
    DirectiveBody,
    /// `@<tag>...</tag>` inside code.
    Template,
    /// `@* ... *@`.
    Comment,
    /// Leaf: the `@` transition.
    Transition,
    /// Leaf: Razor punctuation and keywords (`{`, `}`, `(`, `)`, `code`, `*@`).
    MetaCode,
    /// Leaf: embedded C# text.
    CodeText,
    /// Leaf: markup text.
    MarkupText,
    /// Leaf: Razor comment body.
    CommentText,
}

impl NodeKind {
    /// Returns `true` for token kinds that never have children.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            NodeKind::Transition
                | NodeKind::MetaCode
                | NodeKind::CodeText
                | NodeKind::MarkupText
                | NodeKind::CommentText
        )
    }
}

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    span: Range<usize>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    missing: bool,
}

/// An immutable syntax tree.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    /// The root node (always [`NodeKind::Document`]).
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            tree: self,
            id: NodeId(0),
        }
    }

    /// Resolve a node id.
    pub fn node(&self, id: NodeId) -> Option<SyntaxNode<'_>> {
        (id.index() < self.nodes.len()).then_some(SyntaxNode { tree: self, id })
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree holds only its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// The innermost leaf containing `offset`, or else the innermost node containing it.
    ///
    /// Containment is half-open, except that the root also owns the end of the document.
    pub fn locate_owner(&self, offset: usize) -> Option<SyntaxNode<'_>> {
        let root = self.root();
        if offset < root.span().start || offset > root.span().end {
            return None;
        }

        let mut current = root;
        'descend: loop {
            for child in current.children() {
                let span = child.span();
                if span.start <= offset && offset < span.end {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

/// A borrowed handle to a node.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'a> {
    tree: &'a SyntaxTree,
    id: NodeId,
}

impl<'a> SyntaxNode<'a> {
    /// Node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Node kind.
    pub fn kind(&self) -> &'a NodeKind {
        &self.tree.data(self.id).kind
    }

    /// Character range covered by the node.
    pub fn span(&self) -> Range<usize> {
        self.tree.data(self.id).span.clone()
    }

    /// Returns `true` for nodes the parser synthesized to recover from an error.
    pub fn is_missing(&self) -> bool {
        self.tree.data(self.id).missing
    }

    /// Parent node (`None` for the root).
    pub fn parent(&self) -> Option<SyntaxNode<'a>> {
        self.tree.data(self.id).parent.map(|id| SyntaxNode {
            tree: self.tree,
            id,
        })
    }

    /// Direct children in document order.
    pub fn children(&self) -> impl Iterator<Item = SyntaxNode<'a>> + 'a {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .iter()
            .map(move |&id| SyntaxNode { tree, id })
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode<'a>> + 'a {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    /// This node and all nodes below it, in document (pre-)order.
    pub fn descendants(&self) -> impl Iterator<Item = SyntaxNode<'a>> + 'a {
        let tree = self.tree;
        let mut stack = vec![self.id];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(tree.data(id).children.iter().rev().copied());
            Some(SyntaxNode { tree, id })
        })
    }

    /// Children that are not missing.
    pub fn present_children(&self) -> impl Iterator<Item = SyntaxNode<'a>> + 'a {
        self.children().filter(|child| !child.is_missing())
    }
}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxNode")
            .field("kind", self.kind())
            .field("span", &self.span())
            .field("missing", &self.is_missing())
            .finish()
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxNode<'_> {}

/// Builds a [`SyntaxTree`] top-down.
///
/// The builder starts with the [`NodeKind::Document`] root open. Leaves carry explicit ranges; an
/// inner node spans from its first child's start to its last child's end, or is empty at the end
/// of the last leaf when it has no children.
///
/// # Example
///
/// ```rust
/// use razor_fmt::{NodeKind, TreeBuilder};
///
/// let mut builder = TreeBuilder::new();
/// builder.start_node(NodeKind::StatementBlock);
/// builder.leaf(NodeKind::Transition, 0..1);
/// builder.leaf(NodeKind::MetaCode, 1..2);
/// builder.missing(NodeKind::MetaCode);
/// builder.finish_node();
/// let tree = builder.finish();
///
/// assert_eq!(tree.root().span(), 0..2);
/// ```
#[derive(Debug)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
    stack: Vec<NodeId>,
    cursor: usize,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    /// Create a builder with the document root open.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                span: 0..0,
                parent: None,
                children: Vec::new(),
                missing: false,
            }],
            stack: vec![NodeId(0)],
            cursor: 0,
        }
    }

    /// Open an inner node as the last child of the current node.
    pub fn start_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.push(kind, self.cursor..self.cursor, false);
        self.stack.push(id);
        id
    }

    /// Add a leaf covering `range`.
    pub fn leaf(&mut self, kind: NodeKind, range: Range<usize>) -> NodeId {
        self.cursor = self.cursor.max(range.end);
        self.push(kind, range, false)
    }

    /// Add a zero-length node marking a token the parser expected but did not find.
    pub fn missing(&mut self, kind: NodeKind) -> NodeId {
        self.push(kind, self.cursor..self.cursor, true)
    }

    /// Close the current node. The root is never closed by this call.
    pub fn finish_node(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(id) = self.stack.pop() {
            self.close(id);
        }
    }

    /// Close every open node and return the tree.
    pub fn finish(mut self) -> SyntaxTree {
        while self.stack.len() > 1 {
            self.finish_node();
        }
        self.close(NodeId(0));
        SyntaxTree { nodes: self.nodes }
    }

    fn push(&mut self, kind: NodeKind, span: Range<usize>, missing: bool) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let parent = self.stack.last().copied();
        self.nodes.push(NodeData {
            kind,
            span,
            parent,
            children: Vec::new(),
            missing,
        });
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        id
    }

    fn close(&mut self, id: NodeId) {
        let data = &self.nodes[id.index()];
        let span = match (data.children.first(), data.children.last()) {
            (Some(first), Some(last)) => {
                self.nodes[first.index()].span.start..self.nodes[last.index()].span.end
            }
            _ => data.span.start..self.cursor.max(data.span.start),
        };
        self.nodes[id.index()].span = span;
    }
}
