//! LSP coordinates.
//!
//! LSP positions count UTF-16 code units; `razor-fmt` counts characters. This module converts
//! between the two against a [`SourceText`].

use razor_fmt::{Position, SourceText, TextRange};

/// LSP Position (based on UTF-16 code units)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LspPosition {
    /// Line number (0-based)
    pub line: u32,
    /// Character offset (UTF-16 code units, 0-based)
    pub character: u32,
}

impl LspPosition {
    /// Create a new LSP position (UTF-16 based).
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// LSP Range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LspRange {
    /// Range start position (inclusive).
    pub start: LspPosition,
    /// Range end position (exclusive).
    pub end: LspPosition,
}

impl LspRange {
    /// Create a new LSP range.
    pub fn new(start: LspPosition, end: LspPosition) -> Self {
        Self { start, end }
    }
}

/// LSP coordinate converter
///
/// Handles conversions between character offsets and LSP Position (UTF-16)
pub struct LspCoordinateConverter;

impl LspCoordinateConverter {
    /// UTF-16 code unit count of `text`
    pub fn utf16_len(text: &str) -> usize {
        text.encode_utf16().count()
    }

    /// Convert character offset to UTF-16 code unit offset
    pub fn char_offset_to_utf16(text: &str, char_offset: usize) -> usize {
        text.chars().take(char_offset).map(char::len_utf16).sum()
    }

    /// Convert UTF-16 code unit offset to character offset
    ///
    /// An offset that splits a surrogate pair resolves to the character after it.
    pub fn utf16_to_char_offset(text: &str, utf16_offset: usize) -> usize {
        let mut current_utf16 = 0;
        let mut char_count = 0;

        for ch in text.chars() {
            if current_utf16 >= utf16_offset {
                break;
            }
            current_utf16 += ch.len_utf16();
            char_count += 1;
        }

        char_count
    }

    /// Convert a character-based position in `text` to an LSP position.
    pub fn position_to_lsp(text: &SourceText, position: Position) -> LspPosition {
        let line_text = text.line_text(position.line);
        let utf16 = Self::char_offset_to_utf16(&line_text, position.column);
        LspPosition::new(to_u32(position.line), to_u32(utf16))
    }

    /// Convert an LSP position to a character-based position in `text`.
    ///
    /// The column clamps to the line content; the line is not clamped.
    pub fn lsp_to_position(text: &SourceText, position: LspPosition) -> Position {
        let line = position.line as usize;
        let line_text = text.line_text(line);
        let column = Self::utf16_to_char_offset(&line_text, position.character as usize);
        Position::new(line, column)
    }

    /// Convert an LSP position to a character offset in `text`.
    pub fn lsp_to_char_offset(text: &SourceText, position: LspPosition) -> usize {
        text.position_to_offset(Self::lsp_to_position(text, position))
    }

    /// Convert a character-based range to an LSP range.
    pub fn range_to_lsp(text: &SourceText, range: TextRange) -> LspRange {
        LspRange::new(
            Self::position_to_lsp(text, range.start),
            Self::position_to_lsp(text, range.end),
        )
    }

    /// Convert an LSP range to a character-based range.
    pub fn lsp_to_range(text: &SourceText, range: LspRange) -> TextRange {
        TextRange::new(
            Self::lsp_to_position(text, range.start),
            Self::lsp_to_position(text, range.end),
        )
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
