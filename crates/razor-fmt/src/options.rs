//! Formatting options.

use crate::error::FormatError;
use serde::{Deserialize, Serialize};

/// Options that apply to one formatting request.
///
/// Field names follow the LSP `FormattingOptions` shape when (de)serialized; missing fields fall back
/// to [`Default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormattingOptions {
    /// Width of one indentation level in columns.
    pub tab_size: usize,
    /// Indent with spaces (`true`) or tabs (`false`).
    pub insert_spaces: bool,
    /// Put the `{` of `@code` / `@functions` blocks on its own line.
    #[serde(rename = "codeBlockBraceOnNextLine")]
    pub brace_on_next_line: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            tab_size: 4,
            insert_spaces: true,
            brace_on_next_line: false,
        }
    }
}

impl FormattingOptions {
    /// Set the indentation width.
    pub fn with_tab_size(mut self, tab_size: usize) -> Self {
        self.tab_size = tab_size;
        self
    }

    /// Indent with tabs instead of spaces.
    pub fn with_tabs(mut self) -> Self {
        self.insert_spaces = false;
        self
    }

    /// Set the brace placement of code block directives.
    pub fn with_brace_on_next_line(mut self, brace_on_next_line: bool) -> Self {
        self.brace_on_next_line = brace_on_next_line;
        self
    }

    /// Reject unusable options.
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.tab_size == 0 {
            return Err(FormatError::InvalidOptions("tab size must be positive"));
        }
        Ok(())
    }

    /// Columns per indentation level.
    pub fn indent_unit(&self) -> usize {
        self.tab_size
    }

    /// The indentation string that reaches `columns`.
    ///
    /// With tabs, whole tab stops are tabs and the remainder is spaces.
    pub fn indentation_string(&self, columns: usize) -> String {
        if self.insert_spaces || self.tab_size == 0 {
            return " ".repeat(columns);
        }
        let mut out = "\t".repeat(columns / self.tab_size);
        out.push_str(&" ".repeat(columns % self.tab_size));
        out
    }
}
