use std::collections::HashSet;

use crate::blocks::BlockIndex;
use crate::config::SyncConfig;
use crate::normalize::{is_matchable, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Offset,
    Fuzzy,
    GapFill,
}

/// A block proposed for the active segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub order_index: usize,
    pub score: f64,
    pub source: MatchSource,
}

impl Candidate {
    pub fn new(order_index: usize, score: f64, source: MatchSource) -> Self {
        Self {
            order_index,
            score,
            source,
        }
    }
}

/// Scores every leaf block against `text`, returning candidates in document
/// order. An empty result means nothing matched this tick.
pub fn find_candidates(
    index: &BlockIndex,
    text: &str,
    min_target_len: usize,
    config: &SyncConfig,
) -> Vec<Candidate> {
    let target = normalize(text);
    if !is_matchable(&target, min_target_len) {
        tracing::trace!(len = target.chars().count(), "segment_too_short_to_match");
        return Vec::new();
    }

    index
        .blocks()
        .iter()
        .filter(|b| is_matchable(&b.normalized, config.min_match_len))
        .filter_map(|b| {
            score(&target, &b.normalized, config)
                .map(|s| Candidate::new(b.order_index, s, MatchSource::Fuzzy))
        })
        .collect()
}

/// Similarity of a normalized block (`candidate`) to a normalized segment
/// (`target`), or `None` when the block is not a candidate.
pub fn score(target: &str, candidate: &str, config: &SyncConfig) -> Option<f64> {
    let target_len = target.chars().count();
    let candidate_len = candidate.chars().count();
    if target_len == 0 || candidate_len == 0 {
        return None;
    }

    if let Some(at) = candidate.find(target) {
        let position = candidate[..at].chars().count() as f64 / candidate_len as f64;
        let bonus = if position > 0.5 {
            config.forward_bonus
        } else {
            0.0
        };
        return Some(1.0 + bonus);
    }

    if target.contains(candidate) {
        return Some(1.0);
    }

    let k = affix_len(target_len, config);
    let prefix: String = target.chars().take(k).collect();
    let suffix: String = target.chars().skip(target_len - k).collect();
    let has_prefix = candidate.contains(&prefix);
    let has_suffix = candidate.contains(&suffix);
    match (has_prefix, has_suffix) {
        (true, true) => return Some(0.8),
        (true, false) | (false, true) => return Some(0.5),
        (false, false) => {}
    }

    let ratio = overlap_ratio(target, candidate, target_len, candidate_len);
    (ratio > config.overlap_threshold).then(|| ratio * config.overlap_weight)
}

fn affix_len(target_len: usize, config: &SyncConfig) -> usize {
    let proportional = (target_len as f64 * config.affix_ratio).floor() as usize;
    proportional
        .min(config.affix_cap)
        .max(config.affix_floor)
        .min(target_len)
}

/// Target characters (counted with repetition) that occur anywhere in the
/// candidate, over the longer of the two lengths. Order-insensitive.
fn overlap_ratio(target: &str, candidate: &str, target_len: usize, candidate_len: usize) -> f64 {
    let present: HashSet<char> = candidate.chars().collect();
    let shared = target.chars().filter(|c| present.contains(c)).count();
    shared as f64 / target_len.max(candidate_len) as f64
}
