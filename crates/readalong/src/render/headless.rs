use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::{Alignment, HighlightSurface};
use crate::types::{BlockId, HighlightRole, ScrollTarget};

/// Every call a [`HeadlessSurface`] received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Mark(BlockId, HighlightRole),
    Unmark(BlockId),
    Scroll(ScrollTarget),
    Align(BlockId, Option<Alignment>),
}

impl fmt::Display for SurfaceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mark(id, role) => {
                let role = match role {
                    HighlightRole::Primary => "primary",
                    HighlightRole::Secondary => "secondary",
                    HighlightRole::Container => "container",
                };
                write!(f, "mark {} {role}", id.0)
            }
            Self::Unmark(id) => write!(f, "unmark {}", id.0),
            Self::Scroll(target) => {
                write!(f, "scroll {} {:.2}", target.block.0, target.viewport_fraction)
            }
            Self::Align(id, None) => write!(f, "align {} reset", id.0),
            Self::Align(id, Some(a)) => write!(f, "align {} {:.0}", id.0, a.extra_width_px),
        }
    }
}

/// In-memory surface with no layout engine.
///
/// Keeps the current marking so callers can inspect or draw it. Offsets for
/// `measure_offset` are configured up front with [`HeadlessSurface::set_offset`].
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    marks: BTreeMap<BlockId, HighlightRole>,
    indicator: Option<BlockId>,
    offsets: HashMap<BlockId, f64>,
    alignments: HashMap<BlockId, Alignment>,
    scroll: Option<ScrollTarget>,
    ops: Vec<SurfaceOp>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Left offset `measure_offset` will report for `block`.
    pub fn set_offset(&mut self, block: BlockId, px: f64) {
        self.offsets.insert(block, px);
    }

    pub fn marked(&self) -> &BTreeMap<BlockId, HighlightRole> {
        &self.marks
    }

    pub fn role_of(&self, block: BlockId) -> Option<HighlightRole> {
        self.marks.get(&block).copied()
    }

    pub fn indicator(&self) -> Option<BlockId> {
        self.indicator
    }

    pub fn alignment_of(&self, block: BlockId) -> Option<Alignment> {
        self.alignments.get(&block).copied()
    }

    pub fn last_scroll(&self) -> Option<ScrollTarget> {
        self.scroll
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// One line per recorded op.
    pub fn trace(&self) -> String {
        self.ops
            .iter()
            .map(|op| op.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl HighlightSurface for HeadlessSurface {
    fn mark(&mut self, block: BlockId, role: HighlightRole) {
        self.marks.insert(block, role);
        if role == HighlightRole::Primary {
            self.indicator = Some(block);
        }
        self.ops.push(SurfaceOp::Mark(block, role));
    }

    fn unmark(&mut self, block: BlockId) {
        self.marks.remove(&block);
        self.alignments.remove(&block);
        if self.indicator == Some(block) {
            self.indicator = None;
        }
        self.ops.push(SurfaceOp::Unmark(block));
    }

    fn scroll_to(&mut self, target: ScrollTarget) {
        self.scroll = Some(target);
        self.ops.push(SurfaceOp::Scroll(target));
    }

    fn measure_offset(&mut self, block: BlockId) -> Option<f64> {
        self.offsets.get(&block).copied()
    }

    fn set_alignment(&mut self, block: BlockId, alignment: Option<Alignment>) {
        match alignment {
            Some(a) => self.alignments.insert(block, a),
            None => self.alignments.remove(&block),
        };
        self.ops.push(SurfaceOp::Align(block, alignment));
    }
}
