//! Minimal helpers for LSP `TextEdit` and `FormattingOptions` JSON.
//!
//! This module intentionally avoids pulling in a full `lsp-types` dependency. It handles the
//! small subset formatting requests need.

use crate::error::ServiceError;
use crate::lsp_sync::{LspCoordinateConverter, LspPosition, LspRange};
use razor_fmt::{Edit, EditError, FormattingOptions, SourceText, changes_from_edits};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A minimal representation of an LSP `TextEdit`.
pub struct LspTextEdit {
    /// The range to replace (UTF-16 based line/character positions).
    pub range: LspRange,
    /// Replacement text (may contain newlines).
    pub new_text: String,
}

impl LspTextEdit {
    /// Parse a `TextEdit`-shaped JSON value.
    pub fn from_value(value: &Value) -> Option<Self> {
        let range = range_from_value(value.get("range")?)?;
        let new_text = value
            .get("newText")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        Some(Self { range, new_text })
    }

    /// Serialize as a `TextEdit`.
    pub fn to_value(&self) -> Value {
        json!({
            "range": range_to_value(&self.range),
            "newText": self.new_text,
        })
    }

    /// Convert a host-document edit, measuring columns against `text`.
    pub fn from_edit(text: &SourceText, edit: &Edit) -> Self {
        Self {
            range: LspCoordinateConverter::range_to_lsp(text, edit.range),
            new_text: edit.new_text.clone(),
        }
    }

    /// Convert to a host-document edit against `text`.
    pub fn to_edit(&self, text: &SourceText) -> Edit {
        Edit::new(
            LspCoordinateConverter::lsp_to_range(text, self.range),
            self.new_text.clone(),
        )
    }
}

/// Parse a `Position`-shaped JSON value.
pub fn position_from_value(value: &Value) -> Option<LspPosition> {
    Some(LspPosition {
        line: u32::try_from(value.get("line")?.as_u64()?).ok()?,
        character: u32::try_from(value.get("character")?.as_u64()?).ok()?,
    })
}

/// Parse a `Range`-shaped JSON value.
pub fn range_from_value(value: &Value) -> Option<LspRange> {
    Some(LspRange {
        start: position_from_value(value.get("start")?)?,
        end: position_from_value(value.get("end")?)?,
    })
}

fn position_to_value(position: &LspPosition) -> Value {
    json!({ "line": position.line, "character": position.character })
}

fn range_to_value(range: &LspRange) -> Value {
    json!({
        "start": position_to_value(&range.start),
        "end": position_to_value(&range.end),
    })
}

/// Parse a JSON array of `TextEdit` values.
pub fn text_edits_from_value(value: &Value) -> Vec<LspTextEdit> {
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(LspTextEdit::from_value)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default()
}

/// Serialize host-document edits as a JSON array of `TextEdit` values.
pub fn text_edits_to_value(text: &SourceText, edits: &[Edit]) -> Value {
    Value::Array(
        edits
            .iter()
            .map(|edit| LspTextEdit::from_edit(text, edit).to_value())
            .collect(),
    )
}

/// Parse LSP `FormattingOptions`.
///
/// `tabSize` and `insertSpaces` follow LSP; `codeBlockBraceOnNextLine` is a Razor extension.
/// Other properties are ignored and missing ones take their defaults.
pub fn formatting_options_from_value(value: &Value) -> Result<FormattingOptions, ServiceError> {
    if value.is_null() {
        return Ok(FormattingOptions::default());
    }
    let options: FormattingOptions = serde_json::from_value(value.clone())
        .map_err(|err| ServiceError::InvalidParams(format!("formatting options: {err}")))?;
    options.validate()?;
    Ok(options)
}

/// Apply LSP edits to `text` and return the new text.
///
/// Edits are applied "all at once": every range refers to `text`.
pub fn apply_text_edits(text: &str, edits: &[LspTextEdit]) -> Result<String, EditError> {
    let source = SourceText::new(text);
    let edits = edits
        .iter()
        .map(|edit| edit.to_edit(&source))
        .collect::<Vec<_>>();
    let changes = changes_from_edits(&source, &edits);
    Ok(source.apply_changes(&changes)?.as_str().to_string())
}
