use crate::blocks::BlockIndex;
use crate::matcher::{Candidate, MatchSource};

const GAP_FILL_SCORE: f64 = 0.5;

/// Sorts `matched` into document order and, when the run from first to last
/// block spans at most `max_span` order indices, adds every non-blank leaf
/// in between that is not already present.
pub fn fill_gaps(matched: &mut Vec<Candidate>, index: &BlockIndex, max_span: usize) {
    matched.sort_by_key(|c| c.order_index);
    matched.dedup_by_key(|c| c.order_index);

    let (Some(first), Some(last)) = (matched.first(), matched.last()) else {
        return;
    };
    let (first, last) = (first.order_index, last.order_index);
    if matched.len() < 2 || last - first > max_span {
        return;
    }

    let missing: Vec<Candidate> = (first + 1..last)
        .filter(|i| !matched.iter().any(|c| c.order_index == *i))
        .filter(|i| index.get(*i).is_some_and(|b| !b.is_blank()))
        .map(|i| Candidate::new(i, GAP_FILL_SCORE, MatchSource::GapFill))
        .collect();

    if !missing.is_empty() {
        tracing::trace!(first, last, filled = missing.len(), "gap_filled");
        matched.extend(missing);
        matched.sort_by_key(|c| c.order_index);
    }
}
