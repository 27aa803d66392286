pub mod blocks;
pub mod config;
pub mod disambiguate;
pub mod error;
pub mod gap;
pub mod markdown;
pub mod matcher;
pub mod normalize;
pub mod offsets;
pub mod render;
pub mod resolver;
pub mod segments;
pub mod session;
pub mod types;

pub use blocks::{BlockIndex, BlockKind, BlockNode, Document, DocumentBlock};
pub use config::{MissPolicy, SyncConfig};
pub use error::{Error, Result};
pub use render::{Alignment, HeadlessSurface, HighlightSurface, LayoutTicket, Renderer};
pub use resolver::{Inactive, Resolver, ResolverState};
pub use segments::SegmentIndex;
pub use session::{Session, Tick, TickOutcome};
pub use types::{
    BlockId, HighlightRole, HighlightSet, HighlightedBlock, ScrollTarget, TimelineSegment,
};
