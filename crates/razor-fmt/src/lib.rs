#![warn(missing_docs)]
//! Razor Fmt - Formatting Reconciliation Engine for Razor Documents
//!
//! # Overview
//!
//! `razor-fmt` computes minimal whitespace edits for Razor documents: files that interleave
//! markup, directives, and embedded C#. It does not parse Razor or format C# itself. Both are
//! collaborators behind traits ([`DocumentParser`], [`EmbeddedFormatter`], [`MarkupFormatter`]);
//! the engine reconciles their opinions into one edit set that never changes non-whitespace
//! content.
//!
//! # Core Features
//!
//! - **Span Classification**: every leaf of the syntax tree tagged with its origin and nesting levels
//! - **Line Table**: per-line indentation facts, including the minimum embedded nesting
//! - **Embedded Bridge**: one batched embedded formatter call per request, with marker insertion
//! - **Reconciler**: host and embedded indentation opinions merged per line
//! - **Pass Pipeline**: ordered passes, re-parsing between them, validated at the end
//! - **Minimal Diff**: whitespace gaps aligned against the original text
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  RazorFormatter (document/range/on-type)    │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Pass Pipeline + Validation                 │  ← Composition
//! ├─────────────────────────────────────────────┤
//! │  Reconciler          │  Embedded Bridge     │  ← Indentation
//! ├─────────────────────────────────────────────┤
//! │  Span Classifier + Line Table               │  ← Analysis
//! ├─────────────────────────────────────────────┤
//! │  Syntax Tree, Embedded Document, SourceText │  ← Inputs
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use razor_fmt::{BlockKind, NodeKind, SpanKind, TreeBuilder, classify};
//!
//! // "@{\n x;\n}"
//! let mut builder = TreeBuilder::new();
//! builder.start_node(NodeKind::StatementBlock);
//! builder.leaf(NodeKind::Transition, 0..1);
//! builder.leaf(NodeKind::MetaCode, 1..2);
//! builder.start_node(NodeKind::CodeBlock);
//! builder.leaf(NodeKind::CodeText, 2..7);
//! builder.finish_node();
//! builder.leaf(NodeKind::MetaCode, 7..8);
//! builder.finish_node();
//!
//! let spans = classify(&builder.finish());
//! assert_eq!(spans[2].kind, SpanKind::Code);
//! assert_eq!(spans[2].block_kind, BlockKind::Statement);
//! assert_eq!(spans[2].embedded_indent_level, 1);
//! ```
//!
//! # Module Description
//!
//! - [`syntax`] - Read-only syntax tree and its builder
//! - [`classifier`] - Span classifier
//! - [`line_table`] - Per-line indentation table
//! - [`embedded`] - Generated embedded document and source mappings
//! - [`bridge`] - Embedded formatter seam and batched indentation queries
//! - [`reconciler`] - Indentation reconciliation
//! - [`passes`] - Pass pipeline
//! - [`diff`] / [`merge`] - Minimal diff and soundness checks
//! - [`formatter`] - Request-level API
//!
//! # Coordinates
//!
//! All offsets are **character offsets** (Unicode scalar values). Lines are zero-based and columns
//! count characters. Protocol layers convert to UTF-16 themselves (see `razor-fmt-lsp`).

pub mod bridge;
pub mod cancel;
pub mod classifier;
pub mod context;
pub mod diagnostics;
pub mod diff;
pub mod document;
pub mod edit;
pub mod embedded;
pub mod error;
pub mod formatter;
pub mod line_table;
pub mod markup;
pub mod merge;
pub mod options;
pub mod passes;
pub mod reconciler;
pub mod source_text;
pub mod syntax;
pub mod workspace;

pub use bridge::{
    EmbeddedFormatRequest, EmbeddedFormatResult, EmbeddedFormatter, EmbeddedIndentation,
    EmbeddedNode, EmbeddedNodeKind, MARKER, get_indentations,
};
pub use cancel::CancellationToken;
pub use classifier::{BlockKind, SpanKind, SyntaxSpan, VisitorState, classify};
pub use context::FormattingContext;
pub use diagnostics::{Diagnostic, DiagnosticSeverity};
pub use diff::diff_texts;
pub use document::{DocumentParser, ParsedDocument};
pub use edit::{Edit, Position, TextChange, TextRange, changes_from_edits, edits_from_changes};
pub use embedded::{EmbeddedDocument, SourceMapping};
pub use error::{EditError, EmbeddedFormatterError, FormatError, Interrupt};
pub use formatter::{FormatOutcome, RazorFormatter};
pub use line_table::{LineIndentationInfo, LineTable};
pub use markup::{MarkupFormatter, NoMarkupFormatter};
pub use options::FormattingOptions;
pub use passes::{
    CoordinateSpace, DEFAULT_PASSES, PassDescriptor, PassId, PassKind, PassOutput, Pipeline,
    RequestKind,
};
pub use reconciler::reconcile;
pub use source_text::SourceText;
pub use syntax::{
    ComponentBinding, DirectiveInfo, ElementInfo, NodeId, NodeKind, SyntaxNode, SyntaxTree,
    TreeBuilder,
};
pub use workspace::{EmbeddedWorkspace, WorkspacePool};
