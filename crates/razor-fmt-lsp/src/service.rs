//! JSON-facing formatting requests.
//!
//! Each method takes the request's `params` object as sent by the client and the current document
//! text (the params only name the document). Results are ready to be placed in the response's
//! `result` field.

use crate::error::ServiceError;
use crate::lsp_sync::LspCoordinateConverter;
use crate::lsp_text_edits::{
    formatting_options_from_value, position_from_value, range_from_value, text_edits_to_value,
};
use razor_fmt::{
    CancellationToken, DocumentParser, EmbeddedFormatter, FormatOutcome, MarkupFormatter,
    NoMarkupFormatter, RazorFormatter, SourceText,
};
use razor_fmt_csharp::CSharpFormatter;
use razor_fmt_syntax::RazorParser;
use serde_json::Value;

/// Answers `textDocument/formatting`, `textDocument/rangeFormatting` and
/// `textDocument/onTypeFormatting`.
#[derive(Debug)]
pub struct RazorFormattingService<P = RazorParser, E = CSharpFormatter, M = NoMarkupFormatter> {
    formatter: RazorFormatter<P, E, M>,
}

impl RazorFormattingService {
    /// A service using the bundled Razor parser and C# formatter.
    pub fn new() -> Self {
        Self::with_formatter(RazorFormatter::new(RazorParser::new(), CSharpFormatter::new()))
    }
}

impl Default for RazorFormattingService {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, E, M> RazorFormattingService<P, E, M> {
    /// Wrap a configured formatter.
    pub fn with_formatter(formatter: RazorFormatter<P, E, M>) -> Self {
        Self { formatter }
    }

    /// The underlying formatter.
    pub fn formatter(&self) -> &RazorFormatter<P, E, M> {
        &self.formatter
    }
}

impl<P, E, M> RazorFormattingService<P, E, M>
where
    P: DocumentParser,
    E: EmbeddedFormatter,
    M: MarkupFormatter,
{
    /// `textDocument/formatting`: returns a `TextEdit[]`.
    pub async fn document_formatting(
        &self,
        text: &str,
        params: &Value,
        cancel: &CancellationToken,
    ) -> Result<Value, ServiceError> {
        let options = formatting_options_from_value(&params["options"])?;
        let outcome = self
            .formatter
            .format_document(text, &options, cancel)
            .await?;
        respond(text, outcome)
    }

    /// `textDocument/rangeFormatting`: returns a `TextEdit[]`.
    pub async fn range_formatting(
        &self,
        text: &str,
        params: &Value,
        cancel: &CancellationToken,
    ) -> Result<Value, ServiceError> {
        let options = formatting_options_from_value(&params["options"])?;
        let range = range_from_value(&params["range"])
            .ok_or_else(|| ServiceError::InvalidParams("missing or malformed range".into()))?;
        let range = LspCoordinateConverter::lsp_to_range(&SourceText::new(text), range);
        let outcome = self
            .formatter
            .format_range(text, range, &options, cancel)
            .await?;
        respond(text, outcome)
    }

    /// `textDocument/onTypeFormatting`: returns a `TextEdit[]`, or `null` when the host editor's
    /// own formatter should handle the keystroke.
    pub async fn on_type_formatting(
        &self,
        text: &str,
        params: &Value,
        cancel: &CancellationToken,
    ) -> Result<Value, ServiceError> {
        let options = formatting_options_from_value(&params["options"])?;
        let position = position_from_value(&params["position"])
            .ok_or_else(|| ServiceError::InvalidParams("missing or malformed position".into()))?;
        let trigger = trigger_char(&params["ch"])?;
        let source = SourceText::new(text);
        let offset = LspCoordinateConverter::lsp_to_char_offset(&source, position);
        let outcome = self
            .formatter
            .format_on_type(text, offset, trigger, &options, cancel)
            .await?;
        respond(text, outcome)
    }
}

fn trigger_char(value: &Value) -> Result<char, ServiceError> {
    let mut chars = value
        .as_str()
        .ok_or_else(|| ServiceError::InvalidParams("missing trigger character".into()))?
        .chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(ServiceError::InvalidParams("trigger must be a single character".into())),
    }
}

fn respond(text: &str, outcome: FormatOutcome) -> Result<Value, ServiceError> {
    match outcome {
        FormatOutcome::Edits(edits) => {
            tracing::debug!(edits = edits.len(), "formatting response");
            Ok(text_edits_to_value(&SourceText::new(text), &edits))
        }
        FormatOutcome::DelegateToHost => Ok(Value::Null),
        FormatOutcome::Cancelled => Err(ServiceError::Cancelled),
    }
}
