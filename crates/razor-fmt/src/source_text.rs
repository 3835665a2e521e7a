//! Immutable source text with a line index.
//!
//! Provides efficient offset/line conversion using the Rope data structure. All public inputs and
//! outputs are **character offsets** (Unicode scalar values), never byte offsets.

use crate::edit::{Position, TextChange};
use crate::error::EditError;
use ropey::Rope;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use unicode_width::UnicodeWidthChar;

/// Immutable document text.
///
/// Cloning is cheap: both the rope and the flat copy are reference counted.
#[derive(Clone)]
pub struct SourceText {
    text: Arc<str>,
    rope: Rope,
}

impl SourceText {
    /// Build a source text (and its line index) from a string.
    pub fn new(text: &str) -> Self {
        Self {
            text: Arc::from(text),
            rope: Rope::from_str(text),
        }
    }

    /// The full text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Total character count.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns `true` if the text is empty.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Total line count (`N` line breaks means `N + 1` lines).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// The character at `offset`, if any.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        (offset < self.rope.len_chars()).then(|| self.rope.char(offset))
    }

    /// The text of a character range, clamped to the document.
    pub fn slice(&self, range: Range<usize>) -> String {
        let len = self.rope.len_chars();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        self.rope.slice(start..end).to_string()
    }

    /// Iterate the characters of a range, clamped to the document.
    pub fn chars_in(&self, range: Range<usize>) -> impl Iterator<Item = char> + '_ {
        let len = self.rope.len_chars();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        self.rope.slice(start..end).chars()
    }

    /// Character offset of the first character of `line` (clamped).
    pub fn line_start(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        self.rope.line_to_char(line)
    }

    /// Content range of `line`, excluding its line break (`\n`, `\r\n`, ...).
    pub fn line_range(&self, line: usize) -> Range<usize> {
        let line_count = self.rope.len_lines();
        if line >= line_count {
            let len = self.rope.len_chars();
            return len..len;
        }

        let start = self.rope.line_to_char(line);
        if line + 1 >= line_count {
            return start..self.rope.len_chars();
        }

        let next = self.rope.line_to_char(line + 1);
        let mut end = next.saturating_sub(1);
        if end > start && self.rope.char(end) == '\n' && self.rope.char(end - 1) == '\r' {
            end -= 1;
        }
        start..end.max(start)
    }

    /// Text of `line` (excluding the line break).
    pub fn line_text(&self, line: usize) -> String {
        self.slice(self.line_range(line))
    }

    /// Line index containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.rope.len_chars()))
    }

    /// Convert a character offset into a `(line, column)` position.
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        Position::new(line, offset - self.rope.line_to_char(line))
    }

    /// Convert a position into a character offset (columns clamp to the line content).
    pub fn position_to_offset(&self, position: Position) -> usize {
        if position.line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        let range = self.line_range(position.line);
        range.start + position.column.min(range.end - range.start)
    }

    /// Range of leading whitespace on `line`.
    pub fn leading_whitespace(&self, line: usize) -> Range<usize> {
        let range = self.line_range(line);
        let count = self
            .chars_in(range.clone())
            .take_while(|ch| ch.is_whitespace())
            .count();
        range.start..range.start + count
    }

    /// Offset of the first non-whitespace character on `line`, if any.
    pub fn first_non_whitespace(&self, line: usize) -> Option<usize> {
        let range = self.line_range(line);
        let leading = self.leading_whitespace(line);
        (leading.end < range.end).then_some(leading.end)
    }

    /// Apply a set of non-overlapping changes and return the new text.
    pub fn apply_changes(&self, changes: &[TextChange]) -> Result<SourceText, EditError> {
        if changes.is_empty() {
            return Ok(self.clone());
        }

        let len = self.rope.len_chars();
        let mut sorted = changes.iter().collect::<Vec<_>>();
        sorted.sort_by_key(|change| (change.span.start, change.span.end));

        let mut prev_end = 0usize;
        for change in &sorted {
            if change.span.start > change.span.end || change.span.end > len {
                return Err(EditError::OutOfBounds {
                    start: change.span.start,
                    end: change.span.end,
                    len,
                });
            }
            if change.span.start < prev_end {
                return Err(EditError::Overlapping(change.span.start));
            }
            prev_end = change.span.end;
        }

        let mut rope = self.rope.clone();
        // Apply back to front so earlier offsets stay valid.
        for change in sorted.iter().rev() {
            if change.span.start < change.span.end {
                rope.remove(change.span.clone());
            }
            if !change.new_text.is_empty() {
                rope.insert(change.span.start, &change.new_text);
            }
        }

        let text = rope.to_string();
        Ok(SourceText {
            text: Arc::from(text.as_str()),
            rope,
        })
    }
}

impl fmt::Debug for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SourceText").field(&self.as_str()).finish()
    }
}

impl PartialEq for SourceText {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for SourceText {}

impl From<&str> for SourceText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Visual width (in columns) of a whitespace character at `column`.
///
/// `'\t'` advances to the next tab stop based on `tab_size`; other characters follow UAX #11.
pub fn cell_width_at(ch: char, column: usize, tab_size: usize) -> usize {
    if ch == '\t' {
        let tab_size = tab_size.max(1);
        tab_size - column % tab_size
    } else {
        UnicodeWidthChar::width(ch).unwrap_or(1)
    }
}

/// Width in columns of an indentation string.
pub fn indentation_columns(indentation: impl IntoIterator<Item = char>, tab_size: usize) -> usize {
    indentation.into_iter().fold(0usize, |column, ch| {
        column.saturating_add(cell_width_at(ch, column, tab_size))
    })
}
