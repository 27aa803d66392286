use crate::blocks::{BlockIndex, Document};
use crate::config::{MissPolicy, SyncConfig};
use crate::error::{Error, Result};
use crate::offsets::{AlignStats, align_offsets};
use crate::render::{HighlightSurface, LayoutTicket, Renderer};
use crate::resolver::{Inactive, Outcome, Resolution, Resolver, ResolverState};
use crate::segments::SegmentIndex;
use crate::types::{HighlightSet, ScrollTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Inactive(Inactive),
    Gap,
    Unchanged,
    Highlighted { segment_index: usize },
    Missed { segment_index: usize },
}

/// What one time update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub seeked: bool,
    pub outcome: TickOutcome,
    /// Set when a new highlight was applied. Hand it to
    /// [`Session::after_layout`] after the next layout pass.
    pub layout: Option<LayoutTicket>,
}

/// One playback session: a transcript, a document snapshot and the state
/// that ties them together.
///
/// Drive it from the player's time-update callback with
/// [`Session::on_time_update`]; it resolves, renders and scrolls through the
/// given [`HighlightSurface`].
pub struct Session {
    segments: SegmentIndex,
    blocks: BlockIndex,
    resolver: Resolver,
    renderer: Renderer,
    reported_inactive: bool,
}

impl Session {
    pub fn new(segments: SegmentIndex, document: &Document, config: SyncConfig) -> Self {
        Self {
            segments,
            blocks: BlockIndex::build(document),
            renderer: Renderer::new(&config),
            resolver: Resolver::new(config),
            reported_inactive: false,
        }
    }

    /// Builds a session from a transcript JSON array and a markdown document.
    pub fn from_sources(transcript_json: &str, markdown: &str, config: SyncConfig) -> Result<Self> {
        let segments = SegmentIndex::from_json(transcript_json)?;
        let document = Document::from_markdown(markdown)?;
        let session = Self::new(segments, &document, config);
        if session.blocks.is_empty() {
            return Err(Error::EmptyDocument);
        }
        Ok(session)
    }

    pub fn on_time_update<S: HighlightSurface>(&mut self, time_secs: f64, surface: &mut S) -> Tick {
        let Resolution { seeked, outcome } =
            self.resolver.tick(time_secs, &self.segments, &self.blocks);
        if seeked {
            self.renderer.clear(surface);
        }

        let mut layout = None;
        let outcome = match outcome {
            Outcome::Inactive(reason) => {
                if !self.reported_inactive {
                    tracing::warn!(?reason, "sync_inactive");
                    self.reported_inactive = true;
                }
                TickOutcome::Inactive(reason)
            }
            Outcome::Gap => TickOutcome::Gap,
            Outcome::Unchanged => TickOutcome::Unchanged,
            Outcome::Resolved(set) => {
                let segment_index = set.segment_index as usize;
                layout = self.renderer.apply(set, surface);
                TickOutcome::Highlighted { segment_index }
            }
            Outcome::NoMatch { segment_index } => {
                if self.resolver.config().miss_policy == MissPolicy::Clear {
                    self.renderer.clear(surface);
                }
                TickOutcome::Missed { segment_index }
            }
        };

        Tick {
            seeked,
            outcome,
            layout,
        }
    }

    /// Post-layout callback for the alignment pass of a highlight.
    pub fn after_layout<S: HighlightSurface>(&mut self, ticket: LayoutTicket, surface: &mut S) {
        self.renderer.after_layout(ticket, surface);
    }

    pub fn on_playback_ended<S: HighlightSurface>(&mut self, surface: &mut S) {
        self.renderer.clear(surface);
        self.resolver.forget_active_segment();
    }

    /// Swaps in a re-rendered document. If its flattened text changed, every
    /// segment's offsets are recomputed against it so they never point into
    /// the old flattening.
    pub fn replace_document<S: HighlightSurface>(
        &mut self,
        document: &Document,
        surface: &mut S,
    ) -> Option<AlignStats> {
        self.renderer.clear(surface);
        self.resolver.reset();
        self.reported_inactive = false;

        let blocks = BlockIndex::build(document);
        let changed = blocks.flat_text() != self.blocks.flat_text();
        self.blocks = blocks;

        tracing::info!(blocks = self.blocks.len(), changed, "document_replaced");
        changed.then(|| self.realign_offsets())
    }

    /// Recomputes segment offsets against the current document.
    pub fn realign_offsets(&mut self) -> AlignStats {
        let min_len = self.resolver.config().min_fallback_len;
        align_offsets(&self.blocks, self.segments.segments_mut(), min_len)
    }

    pub fn segments(&self) -> &SegmentIndex {
        &self.segments
    }

    pub fn blocks(&self) -> &BlockIndex {
        &self.blocks
    }

    pub fn state(&self) -> ResolverState {
        self.resolver.state()
    }

    pub fn highlight(&self) -> Option<&HighlightSet> {
        self.renderer.current()
    }

    pub fn scroll_target(&self) -> Option<ScrollTarget> {
        self.renderer.scroll_target()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessSurface;
    use crate::types::{BlockId, HighlightRole};

    const TRANSCRIPT: &str = r#"[
        {"text": "帕特农神庙", "time_begin": 0, "time_end": 2000},
        {"text": "这句话在文中找不到", "time_begin": 2000, "time_end": 4000},
        {"text": "大理石之争", "time_begin": 4000, "time_end": 6000}
    ]"#;
    const MARKDOWN: &str = "帕特农神庙的历史\n\n大理石之争持续了两百年\n";

    #[test]
    fn missed_segment_clears_by_default() {
        let mut session =
            Session::from_sources(TRANSCRIPT, MARKDOWN, SyncConfig::default()).unwrap();
        let mut surface = HeadlessSurface::new();

        session.on_time_update(1.0, &mut surface);
        let tick = session.on_time_update(3.0, &mut surface);

        assert_eq!(tick.outcome, TickOutcome::Missed { segment_index: 1 });
        assert!(surface.marked().is_empty());
        assert!(session.highlight().is_none());
    }

    #[test]
    fn missed_segment_can_keep_previous_highlight() {
        let config = SyncConfig {
            miss_policy: MissPolicy::Keep,
            ..SyncConfig::default()
        };
        let mut session = Session::from_sources(TRANSCRIPT, MARKDOWN, config).unwrap();
        let mut surface = HeadlessSurface::new();

        session.on_time_update(1.0, &mut surface);
        session.on_time_update(3.0, &mut surface);

        assert_eq!(surface.role_of(BlockId(0)), Some(HighlightRole::Primary));
    }

    #[test]
    fn playback_end_clears_and_allows_replay_of_last_segment() {
        let mut session =
            Session::from_sources(TRANSCRIPT, MARKDOWN, SyncConfig::default()).unwrap();
        let mut surface = HeadlessSurface::new();

        session.on_time_update(5.0, &mut surface);
        session.on_playback_ended(&mut surface);
        assert!(surface.marked().is_empty());
        assert_eq!(session.state().active_segment, None);

        let tick = session.on_time_update(5.5, &mut surface);
        assert_eq!(tick.outcome, TickOutcome::Highlighted { segment_index: 2 });
    }

    #[test]
    fn empty_markdown_is_reported() {
        assert!(matches!(
            Session::from_sources(TRANSCRIPT, "---\n", SyncConfig::default()),
            Err(Error::EmptyDocument)
        ));
    }

    #[test]
    fn replacing_the_document_realigns_offsets() {
        let segments = SegmentIndex::from_json(
            r#"[{"text": "大理石之争", "time_begin": 0, "time_end": 2000, "text_begin": 8, "text_end": 13}]"#,
        )
        .unwrap();
        let original =
            Document::from_paragraphs(["帕特农神庙的历史", "大理石之争持续了两百年"]);
        let mut session = Session::new(segments, &original, SyncConfig::default());
        let mut surface = HeadlessSurface::new();

        let edited = Document::from_paragraphs([
            "新增的导言段落",
            "帕特农神庙的历史",
            "大理石之争持续了两百年",
        ]);
        let stats = session.replace_document(&edited, &mut surface).unwrap();
        assert_eq!(stats.aligned, 1);
        assert_eq!(session.segments().get(0).unwrap().offsets(), Some(15..20));

        session.on_time_update(1.0, &mut surface);
        assert_eq!(session.highlight().unwrap().order_indices(), [2]);
    }

    #[test]
    fn replacing_with_identical_text_keeps_offsets() {
        let segments = SegmentIndex::from_json(
            r#"[{"text": "x", "time_begin": 0, "time_end": 2000, "text_begin": 8, "text_end": 13}]"#,
        )
        .unwrap();
        let document =
            Document::from_paragraphs(["帕特农神庙的历史", "大理石之争持续了两百年"]);
        let mut session = Session::new(segments, &document, SyncConfig::default());

        assert!(session.replace_document(&document, &mut HeadlessSurface::new()).is_none());
        assert_eq!(session.segments().get(0).unwrap().offsets(), Some(8..13));
    }

    #[test]
    fn realigning_with_zero_floor_does_not_panic() {
        let segments = SegmentIndex::from_json(
            r#"[
                {"text": "，", "time_begin": 0, "time_end": 1000},
                {"text": "大理石之争", "time_begin": 1000, "time_end": 2000}
            ]"#,
        )
        .unwrap();
        let config = SyncConfig {
            min_fallback_len: 0,
            ..SyncConfig::default()
        };
        let document =
            Document::from_paragraphs(["帕特农神庙的历史", "大理石之争持续了两百年"]);
        let mut session = Session::new(segments, &document, config);

        let stats = session.realign_offsets();
        assert_eq!(stats.aligned, 1);
        assert_eq!(stats.cleared, 1);

        let mut surface = HeadlessSurface::new();
        let tick = session.on_time_update(0.5, &mut surface);
        assert_eq!(tick.outcome, TickOutcome::Missed { segment_index: 0 });
        session.on_time_update(1.5, &mut surface);
        assert_eq!(session.highlight().unwrap().order_indices(), [1]);
    }

    #[test]
    #[tracing_test::traced_test]
    fn inactive_session_warns_once() {
        let mut session = Session::new(
            SegmentIndex::default(),
            &Document::default(),
            SyncConfig::default(),
        );
        let mut surface = HeadlessSurface::new();

        for t in [0.0, 0.5, 1.0] {
            let tick = session.on_time_update(t, &mut surface);
            assert_eq!(tick.outcome, TickOutcome::Inactive(Inactive::NoTranscript));
        }
        assert!(surface.ops().is_empty());
        logs_assert(|lines: &[&str]| {
            match lines.iter().filter(|l| l.contains("sync_inactive")).count() {
                1 => Ok(()),
                n => Err(format!("expected one warning, saw {n}")),
            }
        });
    }
}
