//! Minimal whitespace-aware text diff.
//!
//! When both texts hold the same non-whitespace characters (every result that passed content
//! validation), the characters are aligned one to one and each differing whitespace gap becomes
//! one change. This is a single linear pass.
//!
//! Otherwise both texts are split into maximal runs of whitespace and non-whitespace characters.
//! A Myers diff over those runs finds the replaced regions, and each region is then trimmed to the
//! characters that actually differ.

use crate::edit::TextChange;
use crate::merge::preserves_content;
use std::ops::Range;

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    start: usize,
    text: &'a str,
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut run_start_byte = 0usize;
    let mut run_start_char = 0usize;
    let mut run_is_ws = None;

    for (char_index, (byte_index, ch)) in text.char_indices().enumerate() {
        let is_ws = ch.is_whitespace();
        match run_is_ws {
            Some(prev) if prev == is_ws => {}
            Some(_) => {
                tokens.push(Token {
                    start: run_start_char,
                    text: &text[run_start_byte..byte_index],
                });
                run_start_byte = byte_index;
                run_start_char = char_index;
                run_is_ws = Some(is_ws);
            }
            None => run_is_ws = Some(is_ws),
        }
    }
    if run_is_ws.is_some() {
        tokens.push(Token {
            start: run_start_char,
            text: &text[run_start_byte..],
        });
    }
    tokens
}

/// A replaced region in token indices.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Region {
    old: Range<usize>,
    new: Range<usize>,
}

/// Myers' O(ND) shortest edit script, grouped into replaced regions.
fn diff_regions<T: PartialEq>(a: &[T], b: &[T]) -> Vec<Region> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = n + m;
    if max == 0 {
        return Vec::new();
    }

    let offset = max;
    let mut v = vec![0isize; (2 * max + 2) as usize];
    // trace[d] holds V[k] for k in -d..=d after round d, at index k + d.
    let mut trace: Vec<Vec<isize>> = Vec::new();

    'rounds: for d in 0..=max {
        let mut done = false;
        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx] = x;
            if x >= n && y >= m {
                done = true;
                break;
            }
            k += 2;
        }
        trace.push(v[(offset - d) as usize..=(offset + d) as usize].to_vec());
        if done {
            break 'rounds;
        }
    }

    // Walk back from (n, m), collecting non-diagonal steps.
    let mut steps = Vec::<(isize, isize, bool)>::new(); // (x, y, is_delete) of each edit
    let (mut x, mut y) = (n, m);
    for d in (1..trace.len() as isize).rev() {
        let prev = &trace[(d - 1) as usize];
        let at = |k: isize| prev[(k + d - 1) as usize];
        let k = x - y;
        let prev_k = if k == -d || (k != d && at(k - 1) < at(k + 1)) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = at(prev_k);
        let prev_y = prev_x - prev_k;
        while x > prev_x && y > prev_y {
            x -= 1;
            y -= 1;
        }
        if x == prev_x {
            steps.push((prev_x, prev_y, false));
        } else {
            steps.push((prev_x, prev_y, true));
        }
        x = prev_x;
        y = prev_y;
    }
    steps.reverse();

    let mut regions: Vec<Region> = Vec::new();
    for (x, y, is_delete) in steps {
        let (x, y) = (x as usize, y as usize);
        let (old, new) = if is_delete {
            (x..x + 1, y..y)
        } else {
            (x..x, y..y + 1)
        };
        match regions.last_mut() {
            Some(last) if last.old.end == old.start && last.new.end == new.start => {
                last.old.end = old.end;
                last.new.end = new.end;
            }
            _ => regions.push(Region { old, new }),
        }
    }
    regions
}

/// The minimal changes that turn `original` into `changed`, in `original` character offsets.
///
/// No returned change is a no-op.
pub fn diff_texts(original: &str, changed: &str) -> Vec<TextChange> {
    if original == changed {
        return Vec::new();
    }
    if preserves_content(original, changed) {
        return diff_gaps(original, changed);
    }

    let old_tokens = tokenize(original);
    let new_tokens = tokenize(changed);
    let old_len = original.chars().count();

    let prefix = old_tokens
        .iter()
        .zip(&new_tokens)
        .take_while(|(a, b)| a.text == b.text)
        .count();
    let suffix = old_tokens[prefix..]
        .iter()
        .rev()
        .zip(new_tokens[prefix..].iter().rev())
        .take_while(|(a, b)| a.text == b.text)
        .count();

    let old_mid = old_tokens[prefix..old_tokens.len() - suffix]
        .iter()
        .map(|t| t.text)
        .collect::<Vec<_>>();
    let new_mid = new_tokens[prefix..new_tokens.len() - suffix]
        .iter()
        .map(|t| t.text)
        .collect::<Vec<_>>();

    diff_regions(&old_mid, &new_mid)
        .into_iter()
        .filter_map(|region| {
            let old = prefix + region.old.start..prefix + region.old.end;
            let new = prefix + region.new.start..prefix + region.new.end;
            let start = old_tokens.get(old.start).map_or(old_len, |t| t.start);
            let old_text = old_tokens[old].iter().map(|t| t.text).collect::<String>();
            let new_text = new_tokens[new].iter().map(|t| t.text).collect::<String>();
            trimmed_change(start, &old_text, &new_text)
        })
        .collect()
}

/// Whitespace gaps of `text`: the gap before each non-whitespace character, then the trailing
/// one. Each gap is its start offset (in chars) and its text.
fn gaps(text: &str) -> Vec<(usize, &str)> {
    let mut gaps = Vec::new();
    let mut gap_start_byte = 0usize;
    let mut gap_start_char = 0usize;
    for (char_index, (byte_index, ch)) in text.char_indices().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        gaps.push((gap_start_char, &text[gap_start_byte..byte_index]));
        gap_start_byte = byte_index + ch.len_utf8();
        gap_start_char = char_index + 1;
    }
    gaps.push((gap_start_char, &text[gap_start_byte..]));
    gaps
}

/// Diff two texts with identical non-whitespace content, gap by gap.
fn diff_gaps(original: &str, changed: &str) -> Vec<TextChange> {
    gaps(original)
        .into_iter()
        .zip(gaps(changed))
        .filter(|((_, old), (_, new))| old != new)
        .filter_map(|((start, old), (_, new))| trimmed_change(start, old, new))
        .collect()
}

fn trimmed_change(start: usize, old: &str, new: &str) -> Option<TextChange> {
    let old_chars = old.chars().collect::<Vec<_>>();
    let new_chars = new.chars().collect::<Vec<_>>();
    let prefix = old_chars
        .iter()
        .zip(&new_chars)
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old_chars[prefix..]
        .iter()
        .rev()
        .zip(new_chars[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let deleted = prefix..old_chars.len() - suffix;
    let inserted = new_chars[prefix..new_chars.len() - suffix]
        .iter()
        .collect::<String>();
    if deleted.is_empty() && inserted.is_empty() {
        return None;
    }
    Some(TextChange::new(
        start + deleted.start..start + deleted.end,
        inserted,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_text::SourceText;
    use pretty_assertions::assert_eq;

    fn apply(original: &str, changes: &[TextChange]) -> String {
        SourceText::new(original)
            .apply_changes(changes)
            .unwrap()
            .as_str()
            .to_string()
    }

    #[test]
    fn test_identical_texts() {
        assert!(diff_texts("a b\n c", "a b\n c").is_empty());
        assert!(diff_texts("", "").is_empty());
    }

    #[test]
    fn test_whitespace_runs_are_trimmed() {
        let changes = diff_texts("@inject   IFoo   Foo", "@inject IFoo Foo");
        assert_eq!(
            changes,
            vec![TextChange::new(8..10, ""), TextChange::new(15..17, "")]
        );
    }

    #[test]
    fn test_indentation_change() {
        let original = "@{\n public int x = 0;\n}";
        let changed = "@{\n    public int x = 0;\n}";
        let changes = diff_texts(original, changed);
        assert_eq!(changes, vec![TextChange::new(4..4, "   ")]);
        assert_eq!(apply(original, &changes), changed);
    }

    #[test]
    fn test_inserted_and_removed_tokens() {
        let original = "a b c";
        let changed = "a\nb\n\nc d";
        let changes = diff_texts(original, changed);
        assert_eq!(apply(original, &changes), changed);
        assert!(changes.iter().all(|c| !c.is_noop(&SourceText::new(original))));
    }

    #[test]
    fn test_unicode_offsets_are_chars() {
        let changes = diff_texts("你好  世界", "你好 世界");
        assert_eq!(changes, vec![TextChange::new(3..4, "")]);
    }

    #[test]
    fn test_joined_and_split_tokens() {
        assert_eq!(diff_texts("a b", "ab"), vec![TextChange::new(1..2, "")]);
        assert_eq!(diff_texts("ab", "a b"), vec![TextChange::new(1..1, " ")]);
        assert_eq!(diff_texts("x ", "x"), vec![TextChange::new(1..2, "")]);
    }

    #[test]
    fn test_whole_document_reindent_is_one_change_per_line() {
        let original = (0..20_000)
            .map(|i| format!(" x{i};"))
            .collect::<Vec<_>>()
            .join("\n");
        let changed = (0..20_000)
            .map(|i| format!("    x{i};"))
            .collect::<Vec<_>>()
            .join("\n");
        let changes = diff_texts(&original, &changed);
        assert_eq!(changes.len(), 20_000);
        assert!(changes.iter().all(|c| c.span.is_empty() && c.new_text == "   "));
        assert_eq!(apply(&original, &changes), changed);
    }

    #[test]
    fn test_many_lines_roundtrip() {
        let original = (0..200)
            .map(|i| format!("{}line{i}", " ".repeat(i % 7)))
            .collect::<Vec<_>>()
            .join("\n");
        let changed = (0..200)
            .map(|i| format!("{}line{i}", " ".repeat(i % 3)))
            .collect::<Vec<_>>()
            .join("\n");
        let changes = diff_texts(&original, &changed);
        assert_eq!(apply(&original, &changes), changed);
    }
}
