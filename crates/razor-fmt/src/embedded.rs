//! The generated embedded-language document and its source mappings.

use crate::source_text::SourceText;
use std::ops::Range;

/// An anchor between a host-document range and a generated-document range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceMapping {
    /// Range in the host document (character offsets).
    pub original: Range<usize>,
    /// Range in the embedded document (character offsets).
    pub generated: Range<usize>,
}

impl SourceMapping {
    /// Create a mapping.
    pub fn new(original: Range<usize>, generated: Range<usize>) -> Self {
        Self {
            original,
            generated,
        }
    }

    /// Translate a host offset inside (or at the end of) this mapping.
    pub fn to_generated(&self, host_offset: usize) -> usize {
        let delta = host_offset.saturating_sub(self.original.start);
        (self.generated.start + delta).min(self.generated.end)
    }

    /// Translate an embedded offset inside (or at the end of) this mapping.
    pub fn to_original(&self, generated_offset: usize) -> usize {
        let delta = generated_offset.saturating_sub(self.generated.start);
        (self.original.start + delta).min(self.original.end)
    }
}

/// A synthetic compilation unit holding the embedded-language fragments of a host document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedDocument {
    /// Generated text.
    pub text: SourceText,
    /// Mappings sorted by `original.start`.
    pub mappings: Vec<SourceMapping>,
    /// `true` when the generated members live inside a namespace rather than the global one.
    pub namespace_scoped: bool,
}

impl EmbeddedDocument {
    /// Create a document. Mappings are sorted by host start offset.
    pub fn new(text: SourceText, mut mappings: Vec<SourceMapping>, namespace_scoped: bool) -> Self {
        mappings.sort_by_key(|m| (m.original.start, m.generated.start));
        let document = Self {
            text,
            mappings,
            namespace_scoped,
        };
        debug_assert!(document.is_monotonic(), "source mappings must be monotonic");
        document
    }

    /// An empty document with no mappings.
    pub fn empty() -> Self {
        Self {
            text: SourceText::new(""),
            mappings: Vec::new(),
            namespace_scoped: true,
        }
    }

    /// The mapping whose host range contains `host_offset` (half-open).
    pub fn mapping_at(&self, host_offset: usize) -> Option<&SourceMapping> {
        let idx = self
            .mappings
            .partition_point(|m| m.original.start <= host_offset);
        self.mappings[..idx]
            .iter()
            .rev()
            .find(|m| m.original.start <= host_offset && host_offset < m.original.end)
    }

    /// Map a host offset to the embedded document through a direct mapping.
    pub fn map_to_generated(&self, host_offset: usize) -> Option<usize> {
        self.mapping_at(host_offset)
            .map(|m| m.to_generated(host_offset))
    }

    /// Like [`map_to_generated`](Self::map_to_generated), but an unmapped `@` transition retries
    /// at the following character.
    pub fn map_to_generated_or_transition(
        &self,
        host_offset: usize,
        host_text: &SourceText,
    ) -> Option<usize> {
        self.map_to_generated(host_offset).or_else(|| {
            (host_text.char_at(host_offset) == Some('@'))
                .then(|| self.map_to_generated(host_offset + 1))
                .flatten()
        })
    }

    /// The last mapping that ends at or before `host_offset`.
    pub fn preceding_mapping(&self, host_offset: usize) -> Option<&SourceMapping> {
        // Ends are sorted whenever the mappings are monotonic and non-overlapping.
        let idx = self
            .mappings
            .partition_point(|m| m.original.end <= host_offset);
        idx.checked_sub(1).map(|idx| &self.mappings[idx])
    }

    /// Map a generated range back to the host document when it lies inside one mapping.
    pub fn map_to_original(&self, generated: Range<usize>) -> Option<Range<usize>> {
        self.mappings
            .iter()
            .find(|m| m.generated.start <= generated.start && generated.end <= m.generated.end)
            .map(|m| m.to_original(generated.start)..m.to_original(generated.end))
    }

    /// Returns `true` if host order and generated order agree for every pair of mappings.
    pub fn is_monotonic(&self) -> bool {
        self.mappings.windows(2).all(|pair| {
            pair[0].original.start == pair[1].original.start
                || pair[0].generated.start <= pair[1].generated.start
        })
    }
}

impl Default for EmbeddedDocument {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> EmbeddedDocument {
        // host: "<p>@x</p>@{ var y = 1; }"
        EmbeddedDocument::new(
            SourceText::new("__o = x;\n var y = 1; \n"),
            vec![
                SourceMapping::new(11..23, 9..21),
                SourceMapping::new(4..5, 6..7),
            ],
            true,
        )
    }

    #[test]
    fn test_direct_mapping() {
        let doc = document();
        assert_eq!(doc.mappings[0].original, 4..5);
        assert_eq!(doc.map_to_generated(4), Some(6));
        assert_eq!(doc.map_to_generated(5), None);
        assert_eq!(doc.map_to_generated(15), Some(13));
    }

    #[test]
    fn test_transition_retry() {
        let doc = document();
        let host = SourceText::new("<p>@x</p>@{ var y = 1; }");
        assert_eq!(doc.map_to_generated_or_transition(3, &host), Some(6));
        assert_eq!(doc.map_to_generated_or_transition(2, &host), None);
    }

    #[test]
    fn test_preceding_mapping() {
        let doc = document();
        assert!(doc.preceding_mapping(4).is_none());
        assert_eq!(doc.preceding_mapping(5).map(|m| m.original.clone()), Some(4..5));
        assert_eq!(doc.preceding_mapping(10).map(|m| m.original.clone()), Some(4..5));
        assert_eq!(doc.preceding_mapping(30).map(|m| m.original.clone()), Some(11..23));
    }

    #[test]
    fn test_map_to_original_requires_single_mapping() {
        let doc = document();
        assert_eq!(doc.map_to_original(10..12), Some(12..14));
        assert_eq!(doc.map_to_original(5..10), None);
    }

    #[test]
    fn test_monotonic_check() {
        let doc = document();
        assert!(doc.is_monotonic());

        let crossed = EmbeddedDocument {
            text: SourceText::new("ab"),
            mappings: vec![SourceMapping::new(0..1, 1..2), SourceMapping::new(1..2, 0..1)],
            namespace_scoped: true,
        };
        assert!(!crossed.is_monotonic());
    }
}
