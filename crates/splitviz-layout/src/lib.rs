#![forbid(unsafe_code)]

//! Point identities and dot-chart geometry for splitviz.
//!
//! # Role in splitviz
//! `splitviz-layout` turns split statistics into canvas geometry. It owns
//! no statistics itself: each pass reads the current [`Lattice`] and a
//! [`PointSetManager`] and produces a [`VizDiff`] against the previous pass.
//!
//! # Primary responsibilities
//! - **Points**: stable `(basis split, expanded group, sequence)` identities
//!   in real or synthetic mode.
//! - **Views**: power sets of the horizontal and vertical axis questions
//!   at both granularities.
//! - **Grid**: rows × columns of cells, each bound to one split.
//! - **Segments**: one per response group, packed column-major and
//!   shrunk to fit when a cell is crowded.
//! - **Diffs**: added, removed and moved points plus segment bounds
//!   changes.
//!
//! [`Lattice`]: splitviz_stats::Lattice

pub mod diff;
pub mod engine;
pub mod error;
pub mod grid;
pub mod points;
pub mod segment;
pub mod view;

pub use diff::{BoundsChange, PlacedPoint, PointMove, PointsDelta, ViewDiff, VizDiff};
pub use engine::{LayoutEngine, LayoutStage, LayoutStats};
pub use error::{LayoutError, Result};
pub use grid::{Grid, GridCell, Slot};
pub use points::{PointId, PointMode, PointSetManager, PointsUpdate};
pub use segment::{Segment, SegmentGroup, SegmentMetrics, ViewLayout};
pub use view::{AxisPlan, ViewKey};
