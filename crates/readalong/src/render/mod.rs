//! Applying a resolved [`HighlightSet`] to whatever draws the document.
//!
//! The renderer never touches a view directly. It drives a
//! [`HighlightSurface`] (a DOM bridge, a virtual tree, a terminal, or the
//! [`HeadlessSurface`] used in tests), so the whole resolve-and-render path
//! can run without a layout engine.

mod headless;

pub use headless::{HeadlessSurface, SurfaceOp};

use crate::config::SyncConfig;
use crate::types::{BlockId, HighlightRole, HighlightSet, ScrollTarget};

/// Inline geometry applied to a highlighted block that is indented relative
/// to the document container, so the highlight spans the container's full
/// width while the text stays where it was.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment {
    pub margin_left_px: f64,
    pub extra_width_px: f64,
    pub padding_left_px: f64,
}

/// Mutation capability over a rendered document.
///
/// `mark` with [`HighlightRole::Primary`] also inserts the position indicator
/// at the start of the block's content; `unmark` removes marking, indicator
/// and any alignment.
pub trait HighlightSurface {
    fn mark(&mut self, block: BlockId, role: HighlightRole);
    fn unmark(&mut self, block: BlockId);
    fn scroll_to(&mut self, target: ScrollTarget);
    /// Left edge of the block relative to the document container, in px,
    /// read from the current layout. `None` when the block is not laid out.
    fn measure_offset(&mut self, block: BlockId) -> Option<f64>;
    fn set_alignment(&mut self, block: BlockId, alignment: Option<Alignment>);
}

/// Handle for the alignment pass scheduled by [`Renderer::apply`].
///
/// The caller's scheduler hands it back to [`Renderer::after_layout`] once
/// the next layout pass has happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutTicket {
    generation: u64,
}

#[derive(Debug)]
struct PendingAlignment {
    generation: u64,
    blocks: Vec<BlockId>,
}

pub struct Renderer {
    current: Option<HighlightSet>,
    pending: Option<PendingAlignment>,
    generation: u64,
    tolerance_px: f64,
    padding_px: f64,
    viewport_fraction: f64,
}

impl Renderer {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            current: None,
            pending: None,
            generation: 0,
            tolerance_px: config.alignment_tolerance_px,
            padding_px: config.highlight_padding_px,
            viewport_fraction: config.scroll_viewport_fraction,
        }
    }

    pub fn current(&self) -> Option<&HighlightSet> {
        self.current.as_ref()
    }

    pub fn scroll_target(&self) -> Option<ScrollTarget> {
        let primary = self.current.as_ref()?.primary()?;
        Some(ScrollTarget {
            block: primary.id,
            viewport_fraction: self.viewport_fraction,
        })
    }

    /// Replaces the current highlight with `set`: clears the old marking,
    /// marks every block (and its container), scrolls the primary block into
    /// view and schedules the alignment pass.
    ///
    /// Returns `None` without touching the surface when `set` is already
    /// the current highlight. A set with no blocks only clears.
    pub fn apply<S: HighlightSurface>(
        &mut self,
        set: HighlightSet,
        surface: &mut S,
    ) -> Option<LayoutTicket> {
        if self.current.as_ref() == Some(&set) {
            return None;
        }

        self.clear(surface);
        if set.blocks.is_empty() {
            tracing::trace!(segment = set.segment_index, "empty_highlight_skipped");
            return None;
        }

        for block in &set.blocks {
            surface.mark(block.id, block.role);
        }
        for container in &set.containers {
            surface.mark(*container, HighlightRole::Container);
        }

        self.generation += 1;
        self.pending = Some(PendingAlignment {
            generation: self.generation,
            blocks: set.blocks.iter().map(|b| b.id).collect(),
        });
        self.current = Some(set);

        if let Some(target) = self.scroll_target() {
            surface.scroll_to(target);
        }

        Some(LayoutTicket {
            generation: self.generation,
        })
    }

    /// Removes every mark this renderer placed and cancels any pending
    /// alignment pass.
    pub fn clear<S: HighlightSurface>(&mut self, surface: &mut S) {
        self.pending = None;
        self.generation += 1;

        let Some(set) = self.current.take() else {
            return;
        };
        for block in &set.blocks {
            surface.unmark(block.id);
        }
        for container in &set.containers {
            surface.unmark(*container);
        }
    }

    /// Runs the deferred alignment correction for `ticket`. A ticket from a
    /// highlight that has since been replaced or cleared does nothing.
    pub fn after_layout<S: HighlightSurface>(&mut self, ticket: LayoutTicket, surface: &mut S) {
        let is_current = self
            .pending
            .as_ref()
            .is_some_and(|p| p.generation == ticket.generation);
        if !is_current {
            tracing::trace!(generation = ticket.generation, "stale_layout_ticket");
            return;
        }
        let Some(pending) = self.pending.take() else {
            return;
        };

        for block in pending.blocks {
            if !self.current.as_ref().is_some_and(|set| set.contains(block)) {
                continue;
            }

            surface.set_alignment(block, None);
            let Some(offset) = surface.measure_offset(block) else {
                continue;
            };
            if offset > self.tolerance_px {
                tracing::trace!(block = block.0, offset, "highlight_realigned");
                surface.set_alignment(
                    block,
                    Some(Alignment {
                        margin_left_px: -offset,
                        extra_width_px: offset,
                        padding_left_px: offset + self.padding_px,
                    }),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HighlightedBlock;

    fn set(
        segment_index: u32,
        blocks: &[(u32, HighlightRole)],
        containers: &[u32],
    ) -> HighlightSet {
        HighlightSet {
            segment_index,
            blocks: blocks
                .iter()
                .map(|&(id, role)| HighlightedBlock {
                    id: BlockId(id),
                    order_index: id,
                    score: 1.0,
                    role,
                })
                .collect(),
            containers: containers.iter().map(|&id| BlockId(id)).collect(),
        }
    }

    #[test]
    fn apply_marks_scrolls_and_replaces() {
        let mut renderer = Renderer::new(&SyncConfig::default());
        let mut surface = HeadlessSurface::new();

        renderer.apply(set(0, &[(1, HighlightRole::Primary)], &[]), &mut surface);
        renderer.apply(
            set(1, &[(3, HighlightRole::Primary), (4, HighlightRole::Secondary)], &[2]),
            &mut surface,
        );

        insta::assert_snapshot!(surface.trace(), @r"
        mark 1 primary
        scroll 1 0.33
        unmark 1
        mark 3 primary
        mark 4 secondary
        mark 2 container
        scroll 3 0.33
        ");
        assert_eq!(surface.role_of(BlockId(3)), Some(HighlightRole::Primary));
        assert_eq!(surface.indicator(), Some(BlockId(3)));
        assert_eq!(surface.role_of(BlockId(1)), None);
    }

    #[test]
    fn reapplying_the_same_set_is_a_no_op() {
        let mut renderer = Renderer::new(&SyncConfig::default());
        let mut surface = HeadlessSurface::new();
        let highlight = set(0, &[(1, HighlightRole::Primary)], &[]);

        assert!(renderer.apply(highlight.clone(), &mut surface).is_some());
        let ops = surface.ops().len();
        assert!(renderer.apply(highlight, &mut surface).is_none());
        assert_eq!(surface.ops().len(), ops);
    }

    #[test]
    fn alignment_corrects_indented_blocks_only() {
        let mut renderer = Renderer::new(&SyncConfig::default());
        let mut surface = HeadlessSurface::new();
        surface.set_offset(BlockId(1), 32.0);
        surface.set_offset(BlockId(2), 3.0);

        let ticket = renderer
            .apply(
                set(0, &[(1, HighlightRole::Primary), (2, HighlightRole::Secondary)], &[]),
                &mut surface,
            )
            .unwrap();
        renderer.after_layout(ticket, &mut surface);

        assert_eq!(
            surface.alignment_of(BlockId(1)),
            Some(Alignment {
                margin_left_px: -32.0,
                extra_width_px: 32.0,
                padding_left_px: 56.0,
            })
        );
        assert_eq!(surface.alignment_of(BlockId(2)), None);
    }

    #[test]
    fn superseded_ticket_does_nothing() {
        let mut renderer = Renderer::new(&SyncConfig::default());
        let mut surface = HeadlessSurface::new();
        surface.set_offset(BlockId(1), 40.0);
        surface.set_offset(BlockId(5), 40.0);

        let stale = renderer
            .apply(set(0, &[(1, HighlightRole::Primary)], &[]), &mut surface)
            .unwrap();
        let fresh = renderer
            .apply(set(1, &[(5, HighlightRole::Primary)], &[]), &mut surface)
            .unwrap();

        renderer.after_layout(stale, &mut surface);
        assert_eq!(surface.alignment_of(BlockId(1)), None);
        assert_eq!(surface.alignment_of(BlockId(5)), None);

        renderer.after_layout(fresh, &mut surface);
        assert!(surface.alignment_of(BlockId(5)).is_some());

        let ops = surface.ops().len();
        renderer.after_layout(fresh, &mut surface);
        assert_eq!(surface.ops().len(), ops);
    }

    #[test]
    fn empty_set_clears_without_marking() {
        let mut renderer = Renderer::new(&SyncConfig::default());
        let mut surface = HeadlessSurface::new();

        renderer.apply(set(0, &[(1, HighlightRole::Primary)], &[4]), &mut surface);
        let ticket = renderer.apply(set(1, &[], &[4]), &mut surface);

        assert!(ticket.is_none());
        assert!(surface.marked().is_empty());
        assert!(renderer.current().is_none());
        assert!(renderer.scroll_target().is_none());
    }

    #[test]
    fn clear_cancels_pending_alignment() {
        let mut renderer = Renderer::new(&SyncConfig::default());
        let mut surface = HeadlessSurface::new();
        surface.set_offset(BlockId(1), 40.0);

        let ticket = renderer
            .apply(set(0, &[(1, HighlightRole::Primary)], &[]), &mut surface)
            .unwrap();
        renderer.clear(&mut surface);
        renderer.after_layout(ticket, &mut surface);

        assert!(surface.marked().is_empty());
        assert_eq!(surface.alignment_of(BlockId(1)), None);
        assert!(renderer.current().is_none());
    }
}
