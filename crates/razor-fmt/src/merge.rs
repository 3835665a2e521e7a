//! Edit merging and soundness checks.

use crate::diagnostics::{Diagnostic, diagnostic_signature};
use crate::diff::diff_texts;
use crate::edit::TextChange;
use crate::error::EditError;
use crate::source_text::SourceText;

/// Collapse `changes` into the canonical minimal change set against `original`.
pub fn merge(original: &SourceText, changes: &[TextChange]) -> Result<Vec<TextChange>, EditError> {
    let changed = original.apply_changes(changes)?;
    Ok(diff_texts(original.as_str(), changed.as_str()))
}

/// `true` when both texts are equal once all whitespace is removed.
pub fn preserves_content(original: &str, changed: &str) -> bool {
    let mut a = original.chars().filter(|ch| !ch.is_whitespace());
    let mut b = changed.chars().filter(|ch| !ch.is_whitespace());
    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (x, y) if x == y => {}
            _ => return false,
        }
    }
}

/// `true` when both diagnostic lists have the same `(severity, id)` multiset.
pub fn preserves_diagnostics(before: &[Diagnostic], after: &[Diagnostic]) -> bool {
    diagnostic_signature(before) == diagnostic_signature(after)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_collapses_redundant_changes() {
        let original = SourceText::new("a  b");
        let changes = vec![TextChange::new(0..1, "a"), TextChange::new(1..3, " ")];
        let merged = merge(&original, &changes).unwrap();
        assert_eq!(merged, vec![TextChange::new(2..3, "")]);
    }

    #[test]
    fn test_merge_of_whole_document_replacement() {
        let original = SourceText::new("@{\n x;\n}");
        let replacement = TextChange::new(0..original.len_chars(), "@{\n    x;\n}");
        let merged = merge(&original, &[replacement]).unwrap();
        assert_eq!(merged, vec![TextChange::new(4..4, "   ")]);
    }

    #[test]
    fn test_merge_rejects_overlap() {
        let original = SourceText::new("abc");
        let changes = vec![TextChange::new(0..2, ""), TextChange::new(1..3, "")];
        assert!(merge(&original, &changes).is_err());
    }

    #[test]
    fn test_content_preservation() {
        assert!(preserves_content("@{\n x;\n}", "@{\n    x;\n}"));
        assert!(preserves_content("a b", "ab"));
        assert!(!preserves_content("a b", "a c"));
        assert!(!preserves_content("ab", "abc"));
    }

    #[test]
    fn test_diagnostic_preservation() {
        let before = vec![Diagnostic::error(0..1, "RZ1006", "")];
        let moved = vec![Diagnostic::error(7..8, "RZ1006", "")];
        assert!(preserves_diagnostics(&before, &moved));
        assert!(!preserves_diagnostics(&before, &[]));
    }
}
