#![warn(missing_docs)]
//! `razor-fmt-syntax` - a reference Razor parser for `razor-fmt`.
//!
//! # Overview
//!
//! `razor-fmt` takes its syntax tree and embedded document from a [`DocumentParser`]. This crate
//! provides one: [`RazorParser`] builds the tree with [`TreeBuilder`](razor_fmt::TreeBuilder), and
//! [`generate_embedded_document`] lays the document's C# out in a generated class with one
//! [`SourceMapping`](razor_fmt::SourceMapping) per copied code run.
//!
//! The parser recognizes:
//!
//! - elements, text and `<!-- -->` comments, with raw `<script>` / `<style>` content
//! - `@{ }`, `@( )`, implicit expressions and `@if` / `@foreach` / ... statements
//! - directives from [`razor_fmt_lang::BUILTIN_DIRECTIVES`]
//! - `@:` lines, `@<tag>` templates and `@* *@` comments inside code
//! - components from a [`ComponentCatalog`](razor_fmt_lang::ComponentCatalog), for type inference
//!
//! # Quick Start
//!
//! ```rust
//! use razor_fmt::{DocumentParser, SourceText};
//! use razor_fmt_syntax::RazorParser;
//!
//! let parsed = RazorParser::new().parse(&SourceText::new("<p>@name</p>"));
//! assert!(parsed.diagnostics.is_empty());
//! assert_eq!(parsed.embedded.mappings.len(), 1);
//! ```

pub mod generator;
pub mod parser;

pub use generator::generate_embedded_document;
pub use parser::{RazorParser, codes};

#[doc(no_inline)]
pub use razor_fmt::DocumentParser;
