//! Layout diffs between consecutive passes.

use serde::{Deserialize, Serialize};
use splitviz_core::{Bounds, Position};

use crate::points::PointId;
use crate::view::ViewKey;

/// A point with its canvas position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedPoint {
    pub id: PointId,
    pub position: Position,
}

/// A point that survived a pass at a different position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointMove {
    pub id: PointId,
    pub from: Position,
    pub to: Position,
}

/// Bounds of one segment before and after a pass.
///
/// `before` is `None` on a view's first layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsChange {
    pub split_index: usize,
    /// Response-group index at the view's granularity.
    pub group: usize,
    pub before: Option<Bounds>,
    pub after: Bounds,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointsDelta {
    pub added: Vec<PlacedPoint>,
    pub removed: Vec<PlacedPoint>,
    pub moved: Vec<PointMove>,
}

impl PointsDelta {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.moved.is_empty()
    }
}

/// Changes to one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDiff {
    pub key: ViewKey,
    pub bounds_delta: Vec<BoundsChange>,
    pub points_delta: PointsDelta,
}

impl ViewDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bounds_delta.is_empty() && self.points_delta.is_empty()
    }
}

/// Changes to every view of one response question. Views with no change
/// are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VizDiff {
    pub views: Vec<ViewDiff>,
}

impl VizDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    #[must_use]
    pub fn view(&self, key: &ViewKey) -> Option<&ViewDiff> {
        self.views.iter().find(|v| &v.key == key)
    }

    /// Total moved points across views.
    #[must_use]
    pub fn moved_count(&self) -> usize {
        self.views.iter().map(|v| v.points_delta.moved.len()).sum()
    }
}
