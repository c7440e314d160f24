//! Grapheme-cluster helpers for a single line of text.
//!
//! Pure functions; segmentation happens here, width lookup in [`crate::width`].

use unicode_segmentation::UnicodeSegmentation;

/// Iterate grapheme clusters in a line.
pub fn iter(line: &str) -> impl Iterator<Item = &str> {
    line.graphemes(true)
}

/// Iterate (byte offset, cluster) pairs.
pub fn iter_indices(line: &str) -> impl Iterator<Item = (usize, &str)> {
    line.grapheme_indices(true)
}

/// Previous grapheme boundary (0 if already at or before the first).
pub fn prev_boundary(line: &str, byte: usize) -> usize {
    if byte == 0 || byte > line.len() {
        return 0;
    }
    let mut last = 0;
    for (idx, _) in line.grapheme_indices(true) {
        if idx >= byte {
            break;
        }
        last = idx;
    }
    last
}

/// Next grapheme boundary (`line.len()` if at or beyond the end).
pub fn next_boundary(line: &str, byte: usize) -> usize {
    if byte >= line.len() {
        return line.len();
    }
    for (idx, _) in line.grapheme_indices(true) {
        if idx > byte {
            return idx;
        }
    }
    line.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_align() {
        let s = "a😀b";
        let after_a = next_boundary(s, 0);
        let after_emoji = next_boundary(s, after_a);
        assert_eq!(prev_boundary(s, after_emoji), after_a);
        assert_eq!(prev_boundary(s, after_a), 0);
    }

    #[test]
    fn combining_mark_is_one_cluster() {
        let s = "e\u{0301}x";
        assert_eq!(next_boundary(s, 0), "e\u{0301}".len());
    }

    #[test]
    fn end_of_line_saturates() {
        assert_eq!(next_boundary("ab", 2), 2);
        assert_eq!(next_boundary("ab", 9), 2);
    }
}
