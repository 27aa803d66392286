use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::TimelineSegment;

/// One transcript entry as it arrives on the wire.
///
/// Accepts both the timeline shape (`time_begin`/`time_end` plus optional
/// character offsets) and the stored sentence shape
/// (`start_time`/`end_time`/`order`).
#[derive(Debug, Deserialize)]
struct WireSegment {
    text: String,
    #[serde(alias = "start_time")]
    time_begin: f64,
    #[serde(alias = "end_time")]
    time_end: f64,
    #[serde(default)]
    text_begin: Option<i64>,
    #[serde(default)]
    text_end: Option<i64>,
    #[serde(default)]
    order: Option<i64>,
}

/// Ordered transcript, answering "which segment is narrated at time t".
///
/// Lookup is a linear scan so unsorted or overlapping input still resolves
/// to the first covering segment in transcript order.
#[derive(Debug, Clone, Default)]
pub struct SegmentIndex {
    segments: Vec<TimelineSegment>,
}

impl SegmentIndex {
    pub fn new(mut segments: Vec<TimelineSegment>) -> Self {
        for (i, segment) in segments.iter_mut().enumerate() {
            segment.order_index = i as u32;
        }
        let index = Self { segments };
        index.warn_malformed();
        index
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut wire: Vec<WireSegment> = serde_json::from_str(json)?;
        if wire.is_empty() {
            return Err(Error::EmptyTranscript);
        }

        if wire.iter().all(|w| w.order.is_some()) {
            wire.sort_by_key(|w| w.order);
        }

        let segments = wire
            .into_iter()
            .map(|w| TimelineSegment {
                order_index: 0,
                text: collapse_whitespace(&w.text),
                time_begin_ms: w.time_begin.round() as i64,
                time_end_ms: w.time_end.round() as i64,
                text_begin: w.text_begin,
                text_end: w.text_end,
            })
            .collect();

        Ok(Self::new(segments))
    }

    /// First segment whose inclusive `[begin, end]` range covers `time_ms`.
    pub fn locate(&self, time_ms: f64) -> Option<usize> {
        self.segments.iter().position(|s| s.contains_ms(time_ms))
    }

    pub fn get(&self, index: usize) -> Option<&TimelineSegment> {
        self.segments.get(index)
    }

    pub fn segments(&self) -> &[TimelineSegment] {
        &self.segments
    }

    pub(crate) fn segments_mut(&mut self) -> &mut [TimelineSegment] {
        &mut self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Position of a segment within the narration, in `[0, 1)`.
    pub fn fraction(&self, index: usize) -> f64 {
        if self.segments.is_empty() {
            return 0.0;
        }
        index as f64 / self.segments.len() as f64
    }

    fn warn_malformed(&self) {
        let inverted = self
            .segments
            .iter()
            .filter(|s| s.time_end_ms < s.time_begin_ms)
            .count();
        if inverted > 0 {
            tracing::warn!(inverted, total = self.segments.len(), "segments_with_inverted_times");
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
