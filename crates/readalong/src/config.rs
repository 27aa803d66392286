use serde::Deserialize;

use crate::error::Result;

const DEFAULT_MIN_MATCH_LEN: usize = 5;
const DEFAULT_MIN_FALLBACK_LEN: usize = 3;
const DEFAULT_AFFIX_FLOOR: usize = 5;
const DEFAULT_AFFIX_CAP: usize = 20;
const DEFAULT_AFFIX_RATIO: f64 = 0.3;
const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.4;
const DEFAULT_OVERLAP_WEIGHT: f64 = 0.6;
const DEFAULT_FORWARD_BONUS: f64 = 0.1;
const DEFAULT_RATIO_TIE_EPSILON: f64 = 0.05;
const DEFAULT_GAP_FILL_SPAN: usize = 5;
const DEFAULT_SEEK_BACK_THRESHOLD_SECS: f64 = 1.0;
const DEFAULT_ALIGNMENT_TOLERANCE_PX: f64 = 5.0;
const DEFAULT_HIGHLIGHT_PADDING_PX: f64 = 24.0;
const DEFAULT_SCROLL_VIEWPORT_FRACTION: f64 = 1.0 / 3.0;

/// What to do with the current highlight when the active segment matches
/// no block at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissPolicy {
    /// Drop the previous highlight, leaving nothing marked.
    #[default]
    Clear,
    /// Leave the previous highlight in place.
    Keep,
}

/// Heuristic thresholds for matching, disambiguation and rendering.
///
/// Every field has a default, so a partial JSON object or a partial set of
/// `READALONG_*` environment variables only overrides what it names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Normalized length below which a block or segment is unmatchable.
    pub min_match_len: usize,
    /// Relaxed segment floor used when offsets were present but located nothing.
    pub min_fallback_len: usize,
    pub affix_floor: usize,
    pub affix_cap: usize,
    pub affix_ratio: f64,
    pub overlap_threshold: f64,
    pub overlap_weight: f64,
    pub forward_bonus: f64,
    pub ratio_tie_epsilon: f64,
    /// Largest order-index span a match run may have and still be gap filled.
    pub gap_fill_span: usize,
    pub seek_back_threshold_secs: f64,
    pub alignment_tolerance_px: f64,
    pub highlight_padding_px: f64,
    pub scroll_viewport_fraction: f64,
    pub miss_policy: MissPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            min_match_len: DEFAULT_MIN_MATCH_LEN,
            min_fallback_len: DEFAULT_MIN_FALLBACK_LEN,
            affix_floor: DEFAULT_AFFIX_FLOOR,
            affix_cap: DEFAULT_AFFIX_CAP,
            affix_ratio: DEFAULT_AFFIX_RATIO,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            overlap_weight: DEFAULT_OVERLAP_WEIGHT,
            forward_bonus: DEFAULT_FORWARD_BONUS,
            ratio_tie_epsilon: DEFAULT_RATIO_TIE_EPSILON,
            gap_fill_span: DEFAULT_GAP_FILL_SPAN,
            seek_back_threshold_secs: DEFAULT_SEEK_BACK_THRESHOLD_SECS,
            alignment_tolerance_px: DEFAULT_ALIGNMENT_TOLERANCE_PX,
            highlight_padding_px: DEFAULT_HIGHLIGHT_PADDING_PX,
            scroll_viewport_fraction: DEFAULT_SCROLL_VIEWPORT_FRACTION,
            miss_policy: MissPolicy::default(),
        }
    }
}

impl SyncConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads overrides from `READALONG_*` variables, e.g. `READALONG_GAP_FILL_SPAN=3`.
    pub fn from_env() -> Result<Self> {
        Ok(envy::prefixed("READALONG_").from_env()?)
    }

    pub(crate) fn seek_back_threshold_ms(&self) -> f64 {
        self.seek_back_threshold_secs * 1000.0
    }
}
