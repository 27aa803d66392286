use crate::config::SyncConfig;
use crate::matcher::Candidate;

/// Where the narration currently is, used to choose among several candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Context {
    /// Order index of the last committed best block.
    pub anchor: Option<usize>,
    /// `segment_index / total_segments`.
    pub segment_fraction: f64,
    pub total_blocks: usize,
}

/// Picks the single best block among `candidates` (document order).
///
/// With an anchor, the best-scoring candidate after it wins, ties going to
/// the later block. Without one, or when nothing lies after it, the candidate
/// whose document position is closest to the segment's narration position
/// wins; positions within `ratio_tie_epsilon` of each other go to the later
/// block.
pub fn pick_best(
    candidates: &[Candidate],
    context: Context,
    config: &SyncConfig,
) -> Option<Candidate> {
    match candidates {
        [] => None,
        [only] => Some(*only),
        _ => continuity(candidates, context.anchor)
            .or_else(|| closest_position(candidates, context, config)),
    }
}

fn continuity(candidates: &[Candidate], anchor: Option<usize>) -> Option<Candidate> {
    let anchor = anchor?;
    candidates
        .iter()
        .filter(|c| c.order_index > anchor)
        .copied()
        .reduce(|best, c| {
            if c.score > best.score || (c.score == best.score && c.order_index > best.order_index) {
                c
            } else {
                best
            }
        })
}

fn closest_position(
    candidates: &[Candidate],
    context: Context,
    config: &SyncConfig,
) -> Option<Candidate> {
    let total = context.total_blocks.max(1) as f64;
    let distance = |c: &Candidate| (c.order_index as f64 / total - context.segment_fraction).abs();

    candidates.iter().copied().reduce(|best, c| {
        let (best_distance, distance) = (distance(&best), distance(&c));
        if (best_distance - distance).abs() < config.ratio_tie_epsilon {
            if c.order_index > best.order_index { c } else { best }
        } else if distance < best_distance {
            c
        } else {
            best
        }
    })
}
