#![forbid(unsafe_code)]

//! splitviz public facade crate.
//!
//! Re-exports the common types of the internal crates and provides
//! [`Session`], which drives statistics, point sets and layout together for
//! each ingested batch.

mod session;

pub use session::{Session, SessionUpdate};

// --- Core re-exports -------------------------------------------------------

pub use splitviz_core::{
    Bounds, ConfigError, Granularity, GroupingQuestion, Position, Question, RawValue, Respondent,
    ResponseGroup, ResponseQuestion, SessionConfig, VizConfig,
};

// --- Stats re-exports ------------------------------------------------------

pub use splitviz_stats::{
    GroupStats, Lattice, ResponseStats, Split, SplitDiff, Statistics, StatsError, StatsSummary,
    UpdateResult,
};

// --- Layout re-exports -----------------------------------------------------

pub use splitviz_layout::{
    BoundsChange, LayoutEngine, LayoutError, LayoutStage, LayoutStats, PlacedPoint, PointId,
    PointMode, PointMove, PointSetManager, PointsDelta, PointsUpdate, Segment, SegmentGroup,
    SegmentMetrics, ViewDiff, ViewKey, ViewLayout, VizDiff,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for splitviz sessions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl Error {
    /// Whether a batch was rejected for producing non-positive split weight.
    #[must_use]
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Stats(e) if e.is_integrity())
    }
}

/// Standard result type for splitviz APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Error, Granularity, Question, Respondent, Result, Session, SessionConfig, SessionUpdate,
        ViewKey, VizConfig, VizDiff,
    };

    pub use crate::{core, layout, stats};
}

pub use splitviz_core as core;
pub use splitviz_layout as layout;
pub use splitviz_stats as stats;
