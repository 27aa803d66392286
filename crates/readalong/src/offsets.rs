use std::ops::Range;

use crate::blocks::BlockIndex;
use crate::normalize::{is_matchable, normalize, normalize_with_positions};
use crate::types::TimelineSegment;

/// Leaf blocks (by order index, document order) whose span overlaps the
/// char range `[begin, end)` of the flattened document text.
pub fn locate(index: &BlockIndex, range: Range<usize>) -> Vec<usize> {
    index
        .blocks()
        .iter()
        .filter(|b| b.span.start < range.end && b.span.end > range.start)
        .map(|b| b.order_index)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignStats {
    pub aligned: usize,
    pub cleared: usize,
}

/// Recomputes every segment's `text_begin`/`text_end` against the current
/// flattened document text.
///
/// Segments are searched in narration order, each starting where the previous
/// hit ended, so repeated sentences resolve to successive occurrences. A
/// segment not found ahead of the cursor is retried from the document start
/// without moving the cursor. Segments that cannot be found lose their
/// offsets and fall back to fuzzy matching.
pub fn align_offsets(
    index: &BlockIndex,
    segments: &mut [TimelineSegment],
    min_len: usize,
) -> AlignStats {
    let (haystack, positions) = normalize_with_positions(index.flat_text());
    let char_starts: Vec<usize> = haystack.char_indices().map(|(at, _)| at).collect();

    let mut stats = AlignStats::default();
    let mut cursor = 0usize;

    for segment in segments.iter_mut() {
        let needle = normalize(&segment.text);
        // An empty needle matches everywhere and has no last char to map back.
        let found = if !needle.is_empty() && is_matchable(&needle, min_len) {
            find_from(&haystack, &char_starts, &needle, cursor)
                .or_else(|| find_from(&haystack, &char_starts, &needle, 0))
        } else {
            None
        };

        match found {
            Some(start) => {
                let len = needle.chars().count();
                let begin = positions[start];
                let end = positions[start + len - 1] + 1;
                segment.text_begin = Some(begin as i64);
                segment.text_end = Some(end as i64);
                if start >= cursor {
                    cursor = start + len;
                }
                stats.aligned += 1;
            }
            None => {
                segment.text_begin = None;
                segment.text_end = None;
                stats.cleared += 1;
            }
        }
    }

    tracing::debug!(
        aligned = stats.aligned,
        cleared = stats.cleared,
        "segment_offsets_aligned"
    );
    stats
}

/// Char index of the first occurrence of `needle` at or after char `from`.
fn find_from(haystack: &str, char_starts: &[usize], needle: &str, from: usize) -> Option<usize> {
    let byte_from = *char_starts.get(from)?;
    let byte_hit = haystack[byte_from..].find(needle)? + byte_from;
    char_starts.binary_search(&byte_hit).ok()
}
