#![warn(missing_docs)]
//! Razor Fmt LSP - Language Server Protocol glue for `razor-fmt`
//!
//! Turns LSP formatting requests (JSON `params`, UTF-16 positions) into [`razor_fmt`] calls and
//! the results back into `TextEdit[]` JSON. Transport and document synchronization belong to the
//! hosting server.
//!
//! # Quick Start
//!
//! ```rust
//! use razor_fmt::CancellationToken;
//! use razor_fmt_lsp::{RazorFormattingService, apply_text_edits, text_edits_from_value};
//! use serde_json::json;
//!
//! let service = RazorFormattingService::new();
//! let text = "@inject   IFoo   Foo\n";
//! let params = json!({ "options": { "tabSize": 4, "insertSpaces": true } });
//!
//! let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let result = runtime
//!     .block_on(service.document_formatting(text, &params, &CancellationToken::new()))
//!     .unwrap();
//! let edits = text_edits_from_value(&result);
//! assert_eq!(apply_text_edits(text, &edits).unwrap(), "@inject IFoo Foo\n");
//! ```

pub mod error;
pub mod lsp_sync;
pub mod lsp_text_edits;
pub mod service;

pub use error::ServiceError;
pub use lsp_sync::{LspCoordinateConverter, LspPosition, LspRange};
pub use lsp_text_edits::{
    LspTextEdit, apply_text_edits, formatting_options_from_value, position_from_value,
    range_from_value, text_edits_from_value, text_edits_to_value,
};
pub use service::RazorFormattingService;
