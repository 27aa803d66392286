/// Stable identity of a node in the flattened document, usable across ticks
/// to mark and unmark the same rendered element.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
    specta::Type,
)]
pub struct BlockId(pub u32);

/// One time-coded unit of narrated transcript text.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct TimelineSegment {
    pub order_index: u32,
    pub text: String,
    pub time_begin_ms: i64,
    pub time_end_ms: i64,
    /// Character offset (Unicode scalar values) into the flattened document text.
    pub text_begin: Option<i64>,
    pub text_end: Option<i64>,
}

impl TimelineSegment {
    /// Offsets usable for exact location: both present and
    /// `text_end > text_begin > 0`.
    pub fn offsets(&self) -> Option<std::ops::Range<usize>> {
        match (self.text_begin, self.text_end) {
            (Some(begin), Some(end)) if begin > 0 && end > begin => {
                Some(begin as usize..end as usize)
            }
            _ => None,
        }
    }

    pub fn has_offsets(&self) -> bool {
        self.text_begin.is_some() || self.text_end.is_some()
    }

    pub fn contains_ms(&self, time_ms: f64) -> bool {
        time_ms >= self.time_begin_ms as f64 && time_ms <= self.time_end_ms as f64
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, specta::Type,
)]
#[serde(rename_all = "snake_case")]
pub enum HighlightRole {
    /// Carries the position indicator and is the scroll target.
    Primary,
    Secondary,
    /// Structural parent of a highlighted block (list, quote), styled so the
    /// highlight spans the container.
    Container,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct HighlightedBlock {
    pub id: BlockId,
    pub order_index: u32,
    pub score: f64,
    pub role: HighlightRole,
}

/// The blocks marked for one resolved segment.
///
/// `blocks` is in document order and, when produced by the resolver, holds
/// exactly one `Primary` entry.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct HighlightSet {
    pub segment_index: u32,
    pub blocks: Vec<HighlightedBlock>,
    pub containers: Vec<BlockId>,
}

impl HighlightSet {
    /// The `Primary` block, else the first one. `None` only for an empty set.
    pub fn primary(&self) -> Option<&HighlightedBlock> {
        self.blocks
            .iter()
            .find(|b| b.role == HighlightRole::Primary)
            .or_else(|| self.blocks.first())
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.iter().any(|b| b.id == id)
    }

    pub fn order_indices(&self) -> Vec<u32> {
        self.blocks.iter().map(|b| b.order_index).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct ScrollTarget {
    pub block: BlockId,
    /// Where the block's top should land, as a fraction of viewport height.
    pub viewport_fraction: f64,
}
