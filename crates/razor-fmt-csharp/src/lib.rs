#![warn(missing_docs)]
//! `razor-fmt-csharp` - a lightweight C# formatter for `razor-fmt`.
//!
//! [`CSharpFormatter`] implements [`EmbeddedFormatter`](razor_fmt::EmbeddedFormatter) without a
//! C# compiler: it tokenizes the generated document and re-indents it by brace depth. It is the
//! formatter the LSP front end and the end-to-end tests run with; hosts that have a real C#
//! formatter can plug it in behind the same trait instead.
//!
//! # Quick Start
//!
//! ```rust
//! use razor_fmt::FormattingOptions;
//! use razor_fmt_csharp::format_text;
//!
//! let result = format_text("class C\n{\nint x;\n}", &[], &FormattingOptions::default());
//! assert_eq!(result.text, "class C\n{\n    int x;\n}");
//! ```

pub mod formatter;
pub mod lexer;

pub use formatter::{CSharpFormatter, format_text};
pub use lexer::{StringStyle, Token, TokenKind, tokenize};
