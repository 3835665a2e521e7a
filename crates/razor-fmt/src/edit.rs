//! Text edits in both coordinate forms.
//!
//! The request-level API speaks [`Edit`] (line/column ranges in host-document coordinates), while
//! the pipeline works with [`TextChange`] (half-open **character offset** ranges). Conversion goes
//! through a [`SourceText`](crate::SourceText).

use crate::source_text::SourceText;
use std::cmp::Ordering;
use std::ops::Range;

/// Position coordinates (line and column numbers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Zero-based logical line index.
    pub line: usize,
    /// Zero-based column in characters within the logical line.
    pub column: usize,
}

impl Position {
    /// Create a new logical position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A half-open range of positions (`start..end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    /// Range start (inclusive).
    pub start: Position,
    /// Range end (exclusive).
    pub end: Position,
}

impl TextRange {
    /// Create a new range.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A range covering whole lines `first..=last`.
    pub fn lines(first: usize, last: usize) -> Self {
        Self {
            start: Position::new(first, 0),
            end: Position::new(last, usize::MAX),
        }
    }

    /// Returns `true` if the line span of `self` intersects `first..=last`.
    pub fn overlaps_lines(&self, first: usize, last: usize) -> bool {
        self.start.line <= last && self.end.line >= first
    }
}

/// A single replacement in host-document coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edit {
    /// The replaced range.
    pub range: TextRange,
    /// Replacement text (may contain newlines).
    pub new_text: String,
}

impl Edit {
    /// Create a new edit.
    pub fn new(range: TextRange, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }

    /// Resolve this edit to a character-offset change against `text`.
    pub fn to_change(&self, text: &SourceText) -> TextChange {
        let start = text.position_to_offset(self.range.start);
        let end = text.position_to_offset(self.range.end);
        TextChange::new(start.min(end)..start.max(end), self.new_text.clone())
    }
}

/// A single replacement expressed in character offsets.
///
/// Semantics:
/// - `span` is a half-open range in the document the change is applied to.
/// - A set of changes is applied "all at once": every span refers to the same original text, so
///   the set must be non-overlapping once sorted by start.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextChange {
    /// Replaced range (character offsets).
    pub span: Range<usize>,
    /// Replacement text.
    pub new_text: String,
}

impl TextChange {
    /// Create a new change.
    pub fn new(span: Range<usize>, new_text: impl Into<String>) -> Self {
        Self {
            span,
            new_text: new_text.into(),
        }
    }

    /// An insertion at `offset`.
    pub fn insert(offset: usize, new_text: impl Into<String>) -> Self {
        Self::new(offset..offset, new_text)
    }

    /// Length of the replaced range in characters.
    pub fn deleted_len(&self) -> usize {
        self.span.end.saturating_sub(self.span.start)
    }

    /// Length of `new_text` in characters.
    pub fn inserted_len(&self) -> usize {
        self.new_text.chars().count()
    }

    /// Returns `true` if applying this change to `text` would not modify it.
    pub fn is_noop(&self, text: &SourceText) -> bool {
        text.slice(self.span.clone()) == self.new_text
    }

    /// Convert to an [`Edit`] against `text`.
    pub fn to_edit(&self, text: &SourceText) -> Edit {
        Edit::new(
            TextRange::new(
                text.offset_to_position(self.span.start),
                text.offset_to_position(self.span.end),
            ),
            self.new_text.clone(),
        )
    }
}

/// Resolve a list of edits against `text`, sorted by start offset.
pub fn changes_from_edits(text: &SourceText, edits: &[Edit]) -> Vec<TextChange> {
    let mut changes = edits
        .iter()
        .map(|edit| edit.to_change(text))
        .collect::<Vec<_>>();
    changes.sort_by_key(|change| (change.span.start, change.span.end));
    changes
}

/// Convert a list of changes against `text` into edits.
pub fn edits_from_changes(text: &SourceText, changes: &[TextChange]) -> Vec<Edit> {
    changes.iter().map(|change| change.to_edit(text)).collect()
}
