use crate::blocks::BlockIndex;
use crate::config::SyncConfig;
use crate::disambiguate::{self, Context};
use crate::gap::fill_gaps;
use crate::matcher::{self, Candidate, MatchSource};
use crate::offsets;
use crate::segments::SegmentIndex;
use crate::types::{HighlightRole, HighlightSet, HighlightedBlock};

/// Positional state of one playback session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverState {
    pub last_time_ms: f64,
    /// Segment whose highlight was last resolved.
    pub active_segment: Option<usize>,
    /// Order index of the last committed best block; the continuity anchor.
    pub anchor_block: Option<usize>,
}

impl Default for ResolverState {
    fn default() -> Self {
        Self {
            last_time_ms: 0.0,
            active_segment: None,
            anchor_block: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inactive {
    NoTranscript,
    NoDocument,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Inputs are unusable; nothing is resolved.
    Inactive(Inactive),
    /// No segment covers the current time; the highlight stays as it is.
    Gap,
    /// Same segment as last tick.
    Unchanged,
    Resolved(HighlightSet),
    /// The segment changed but no block matched it.
    NoMatch { segment_index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// A backward seek was detected and positional state was reset before
    /// resolving.
    pub seeked: bool,
    pub outcome: Outcome,
}

/// Maps playback time to highlight sets.
///
/// All heavy work happens only when the located segment differs from the
/// active one; every other tick is a segment lookup.
pub struct Resolver {
    config: SyncConfig,
    state: ResolverState,
}

impl Resolver {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            state: ResolverState::default(),
        }
    }

    pub fn state(&self) -> ResolverState {
        self.state
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Forgets the active segment and the anchor.
    pub fn reset(&mut self) {
        self.state.active_segment = None;
        self.state.anchor_block = None;
    }

    pub(crate) fn forget_active_segment(&mut self) {
        self.state.active_segment = None;
    }

    pub fn tick(
        &mut self,
        time_secs: f64,
        segments: &SegmentIndex,
        blocks: &BlockIndex,
    ) -> Resolution {
        let time_ms = time_secs * 1000.0;

        let seeked = time_ms < self.state.last_time_ms - self.config.seek_back_threshold_ms();
        if seeked {
            tracing::info!(
                from_ms = self.state.last_time_ms,
                to_ms = time_ms,
                anchor = ?self.state.anchor_block,
                "seek_back_reset"
            );
            self.reset();
        }
        self.state.last_time_ms = time_ms;

        let outcome = if segments.is_empty() {
            Outcome::Inactive(Inactive::NoTranscript)
        } else if blocks.is_empty() {
            Outcome::Inactive(Inactive::NoDocument)
        } else {
            match segments.locate(time_ms) {
                None => Outcome::Gap,
                Some(i) if Some(i) == self.state.active_segment => Outcome::Unchanged,
                Some(i) => {
                    self.state.active_segment = Some(i);
                    match self.resolve_segment(i, segments, blocks) {
                        Some(set) => Outcome::Resolved(set),
                        None => Outcome::NoMatch { segment_index: i },
                    }
                }
            }
        };

        Resolution { seeked, outcome }
    }

    /// Resolves one segment to a highlight set, committing the new anchor.
    fn resolve_segment(
        &mut self,
        segment_index: usize,
        segments: &SegmentIndex,
        blocks: &BlockIndex,
    ) -> Option<HighlightSet> {
        let segment = segments.get(segment_index)?;

        let mut matched: Vec<Candidate> = segment
            .offsets()
            .map(|range| offsets::locate(blocks, range))
            .unwrap_or_default()
            .into_iter()
            .map(|i| Candidate::new(i, 1.0, MatchSource::Offset))
            .collect();

        let primary = if let Some(first) = matched.first() {
            first.order_index
        } else {
            let min_len = if segment.has_offsets() {
                self.config.min_fallback_len
            } else {
                self.config.min_match_len
            };
            let candidates = matcher::find_candidates(blocks, &segment.text, min_len, &self.config);
            let context = Context {
                anchor: self.state.anchor_block,
                segment_fraction: segments.fraction(segment_index),
                total_blocks: blocks.len(),
            };
            let best = disambiguate::pick_best(&candidates, context, &self.config);

            tracing::debug!(
                segment = segment_index,
                candidates = candidates.len(),
                best = ?best.map(|b| b.order_index),
                "fuzzy_resolution"
            );

            let best = best?;
            matched.push(best);
            best.order_index
        };

        fill_gaps(&mut matched, blocks, self.config.gap_fill_span);
        self.commit_anchor(primary);

        let mut containers = Vec::new();
        let highlighted = matched
            .iter()
            .filter_map(|c| {
                let block = blocks.get(c.order_index)?;
                if let Some(parent) = block.parent {
                    if !containers.contains(&parent) {
                        containers.push(parent);
                    }
                }
                Some(HighlightedBlock {
                    id: block.id,
                    order_index: c.order_index as u32,
                    score: c.score,
                    role: if c.order_index == primary {
                        HighlightRole::Primary
                    } else {
                        HighlightRole::Secondary
                    },
                })
            })
            .collect();

        Some(HighlightSet {
            segment_index: segment_index as u32,
            blocks: highlighted,
            containers,
        })
    }

    /// The anchor only moves forward within a session; it goes back only
    /// through [`Resolver::reset`].
    fn commit_anchor(&mut self, order_index: usize) {
        match self.state.anchor_block {
            Some(anchor) if anchor > order_index => {
                tracing::trace!(anchor, order_index, "anchor_held");
            }
            _ => self.state.anchor_block = Some(order_index),
        }
    }
}
