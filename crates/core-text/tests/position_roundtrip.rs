//! Property tests for LineStore position translation and line tiling.

use core_text::{LineStore, TextError};
use proptest::prelude::*;

proptest! {
    // Every in-range character-boundary offset survives the round trip.
    #[test]
    fn offset_round_trips(content in "[a-zA-Z0-9äö😀\\n]{0,64}") {
        let store = LineStore::from_str(&content);
        for offset in 0..=store.len_bytes() {
            if !content.is_char_boundary(offset) {
                continue;
            }
            let pos = store.offset_to_position(offset).unwrap();
            prop_assert_eq!(store.position_to_offset(pos).unwrap(), offset);
        }
    }

    // Lines are contiguous and cover the whole input, terminators included.
    #[test]
    fn lines_cover_input(content in "(\r\n|[a-z0-9\\n]){0,48}") {
        let store = LineStore::from_str(&content);
        prop_assert!(store.line_count() >= 1);
        let mut covered = 0usize;
        for i in 0..store.line_count() {
            let line = store.line(i).unwrap();
            prop_assert_eq!(line.start_offset, covered);
            covered += line.len() + line.terminator.len();
        }
        prop_assert_eq!(covered, store.len_bytes());
    }

    // Mid-character offsets are rejected with OutOfRange, never clamped.
    #[test]
    fn mid_char_offsets_error(content in "[äö😀]{1,8}") {
        let store = LineStore::from_str(&content);
        for offset in 0..store.len_bytes() {
            if content.is_char_boundary(offset) {
                continue;
            }
            let is_out_of_range = matches!(
                store.offset_to_position(offset),
                Err(TextError::OutOfRange { .. })
            );
            prop_assert!(is_out_of_range);
        }
    }
}
