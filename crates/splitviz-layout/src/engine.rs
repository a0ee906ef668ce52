//! Layout engine: lays out every view of one response question and diffs
//! each pass against the previous one.
//!
//! Every view runs the same stages on every pass:
//!
//! ```text
//! Uninitialized → GridComputed → SegmentsSized → PointsPlaced
//! ```
//!
//! Each stage's output is the next stage's input, and [`LayoutEngine::advance`]
//! runs one stage at a time. [`LayoutEngine::update`] restarts every view
//! and advances it to the end, so nothing is cached across passes. The
//! previous finished layout is kept only to compute the diff.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use splitviz_core::{Bounds, Position, Question, ResponseQuestion, SessionConfig, VizConfig};
use splitviz_stats::Lattice;

use crate::diff::{BoundsChange, PlacedPoint, PointMove, PointsDelta, ViewDiff, VizDiff};
use crate::error::{LayoutError, Result};
use crate::grid::Grid;
use crate::points::{PointId, PointSetManager};
use crate::segment::{SizedGroup, ViewLayout, size_segments};
use crate::view::{AxisPlan, ViewKey};

/// Progress of one view through a layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayoutStage {
    Uninitialized,
    GridComputed,
    SegmentsSized,
    PointsPlaced,
}

/// A view's in-progress pass. Each variant holds the output of its stage.
#[derive(Debug, Clone, Default)]
enum ViewPass {
    #[default]
    Uninitialized,
    GridComputed(Grid),
    SegmentsSized(Grid, Vec<SizedGroup>),
    PointsPlaced(ViewDiff),
}

impl ViewPass {
    fn stage(&self) -> LayoutStage {
        match self {
            Self::Uninitialized => LayoutStage::Uninitialized,
            Self::GridComputed(_) => LayoutStage::GridComputed,
            Self::SegmentsSized(..) => LayoutStage::SegmentsSized,
            Self::PointsPlaced(_) => LayoutStage::PointsPlaced,
        }
    }
}

/// Counters from the most recent pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutStats {
    pub passes: u64,
    pub views: usize,
    pub points_placed: usize,
    pub added: usize,
    pub removed: usize,
    pub moved: usize,
    pub bounds_changed: usize,
}

impl LayoutStats {
    /// Fraction of placed points that moved in the last pass.
    #[must_use]
    pub fn moved_ratio(&self) -> f64 {
        if self.points_placed == 0 {
            0.0
        } else {
            self.moved as f64 / self.points_placed as f64
        }
    }
}

/// Lays out all views of one response question.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    config: VizConfig,
    question: ResponseQuestion,
    response: usize,
    keys: Vec<ViewKey>,
    passes: FxHashMap<ViewKey, ViewPass>,
    views: BTreeMap<ViewKey, ViewLayout>,
    stats: LayoutStats,
}

impl LayoutEngine {
    /// Validate `viz` against `session` and prepare the views of `question`.
    pub fn new(session: &SessionConfig, viz: &VizConfig, question: &Question) -> Result<Self> {
        viz.validate(session)?;
        let response = session.response_position(question).ok_or_else(|| {
            LayoutError::UnknownResponseQuestion {
                question: question.clone(),
            }
        })?;
        let keys = AxisPlan::resolve(session, viz)?.views();
        let passes = keys.iter().map(|k| (k.clone(), ViewPass::default())).collect();
        Ok(Self {
            config: viz.clone(),
            question: session.response_questions[response].clone(),
            response,
            keys,
            passes,
            views: BTreeMap::new(),
            stats: LayoutStats::default(),
        })
    }

    #[must_use]
    pub fn question(&self) -> &ResponseQuestion {
        &self.question
    }

    #[must_use]
    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    /// Every view key, in enumeration order.
    #[must_use]
    pub fn view_keys(&self) -> &[ViewKey] {
        &self.keys
    }

    /// Latest finished layout of a view.
    #[must_use]
    pub fn view(&self, key: &ViewKey) -> Option<&ViewLayout> {
        self.views.get(key)
    }

    #[must_use]
    pub fn stage(&self, key: &ViewKey) -> Option<LayoutStage> {
        self.passes.get(key).map(ViewPass::stage)
    }

    #[must_use]
    pub fn stats(&self) -> &LayoutStats {
        &self.stats
    }

    /// Lay out every view from the current splits and point set.
    pub fn update(&mut self, lattice: &Lattice, points: &PointSetManager) -> VizDiff {
        let _span = tracing::debug_span!(
            "layout.update",
            question = %self.question.question,
            views = self.keys.len()
        )
        .entered();

        let mut stats = LayoutStats {
            passes: self.stats.passes + 1,
            views: self.keys.len(),
            ..LayoutStats::default()
        };
        let mut diff = VizDiff::default();

        for key in self.keys.clone() {
            if let Some(pass) = self.passes.get_mut(&key) {
                *pass = ViewPass::Uninitialized;
            }
            while self
                .advance(&key, lattice, points)
                .is_some_and(|stage| stage != LayoutStage::PointsPlaced)
            {}
            let Some(ViewPass::PointsPlaced(view_diff)) = self.passes.get(&key) else {
                continue;
            };

            stats.points_placed += self.views.get(&key).map_or(0, ViewLayout::point_count);
            stats.added += view_diff.points_delta.added.len();
            stats.removed += view_diff.points_delta.removed.len();
            stats.moved += view_diff.points_delta.moved.len();
            stats.bounds_changed += view_diff.bounds_delta.len();
            if !view_diff.is_empty() {
                diff.views.push(view_diff.clone());
            }
        }

        tracing::debug!(
            target: "splitviz.layout",
            views = stats.views,
            points = stats.points_placed,
            added = stats.added,
            removed = stats.removed,
            moved = stats.moved,
            bounds_changed = stats.bounds_changed,
            "layout pass complete"
        );
        self.stats = stats;
        diff
    }

    /// Run the next stage of one view and return the stage it reached.
    ///
    /// Placing points replaces the view's finished layout and records the
    /// diff against the one it replaced. Advancing a view that already
    /// reached [`LayoutStage::PointsPlaced`] starts a new pass. Returns
    /// `None` for a key this engine does not lay out.
    pub fn advance(
        &mut self,
        key: &ViewKey,
        lattice: &Lattice,
        points: &PointSetManager,
    ) -> Option<LayoutStage> {
        let pass = self.passes.get_mut(key)?;
        let next = match std::mem::take(pass) {
            ViewPass::Uninitialized | ViewPass::PointsPlaced(_) => {
                ViewPass::GridComputed(Grid::compute(key, lattice, &self.config))
            }
            ViewPass::GridComputed(grid) => {
                let sized = size_segments(
                    &grid,
                    key.granularity,
                    lattice,
                    (self.response, &self.question),
                    points,
                    &self.config,
                );
                ViewPass::SegmentsSized(grid, sized)
            }
            ViewPass::SegmentsSized(grid, sized) => {
                let layout = ViewLayout::place(key.clone(), &grid, sized, &self.question);
                let view_diff = diff_view(self.views.get(key), &layout);
                self.views.insert(key.clone(), layout);
                ViewPass::PointsPlaced(view_diff)
            }
        };
        let stage = next.stage();
        *pass = next;
        Some(stage)
    }
}

/// Diff a freshly placed view against its previous layout.
fn diff_view(previous: Option<&ViewLayout>, next: &ViewLayout) -> ViewDiff {
    let old_points: FxHashMap<PointId, Position> = previous
        .into_iter()
        .flat_map(ViewLayout::points)
        .map(|p| (p.id, p.position))
        .collect();
    let old_bounds: FxHashMap<(usize, usize), Bounds> = previous
        .into_iter()
        .flat_map(|v| v.groups.iter())
        .flat_map(|g| g.segments.iter().map(|s| ((g.split_index, s.group), s.bounds)))
        .collect();

    let mut points_delta = PointsDelta::default();
    let mut seen = FxHashSet::default();
    for placed in next.points() {
        seen.insert(placed.id);
        match old_points.get(&placed.id) {
            None => points_delta.added.push(*placed),
            Some(from) if !from.approx_eq(&placed.position) => {
                points_delta.moved.push(PointMove {
                    id: placed.id,
                    from: *from,
                    to: placed.position,
                });
            }
            Some(_) => {}
        }
    }
    points_delta.removed = old_points
        .iter()
        .filter(|(id, _)| !seen.contains(*id))
        .map(|(&id, &position)| PlacedPoint { id, position })
        .collect();
    points_delta.added.sort_by_key(|p| p.id);
    points_delta.removed.sort_by_key(|p| p.id);
    points_delta.moved.sort_by_key(|m| m.id);

    let mut bounds_delta = Vec::new();
    for group in &next.groups {
        for segment in &group.segments {
            let before = old_bounds.get(&(group.split_index, segment.group)).copied();
            if before.is_some_and(|b| b.approx_eq(&segment.bounds)) {
                continue;
            }
            bounds_delta.push(BoundsChange {
                split_index: group.split_index,
                group: segment.group,
                before,
                after: segment.bounds,
            });
        }
    }

    ViewDiff {
        key: next.key.clone(),
        bounds_delta,
        points_delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::PointMode;
    use splitviz_core::{Granularity, GroupingQuestion, Respondent, ResponseGroup};
    use splitviz_stats::Statistics;

    fn q(name: &str) -> Question {
        Question::new(name, "poll", "")
    }

    fn session() -> SessionConfig {
        SessionConfig::new(
            vec![
                GroupingQuestion::new(
                    q("age"),
                    vec![ResponseGroup::new("young", [1]), ResponseGroup::new("old", [2])],
                ),
                GroupingQuestion::new(
                    q("gender"),
                    vec![ResponseGroup::new("m", [1]), ResponseGroup::new("f", [2])],
                ),
            ],
            vec![
                ResponseQuestion::new(
                    q("party"),
                    vec![
                        ResponseGroup::new("strong left", [1]),
                        ResponseGroup::new("lean left", [2]),
                        ResponseGroup::new("lean right", [3]),
                    ],
                    vec![
                        ResponseGroup::new("left", [1, 2]),
                        ResponseGroup::new("right", [3]),
                    ],
                )
                .expect("valid"),
            ],
            None,
        )
        .expect("valid")
    }

    fn viz() -> VizConfig {
        VizConfig {
            grouping_questions_horizontal: vec![q("age")],
            grouping_questions_vertical: vec![q("gender")],
            ..VizConfig::default()
        }
    }

    fn r(age: i64, gender: i64, party: i64) -> Respondent {
        Respondent::with_id("r")
            .with_answer(q("age"), age)
            .with_answer(q("gender"), gender)
            .with_answer(q("party"), party)
    }

    struct Fixture {
        stats: Statistics,
        points: PointSetManager,
        engine: LayoutEngine,
    }

    impl Fixture {
        fn new() -> Self {
            let session = session();
            Self {
                engine: LayoutEngine::new(&session, &viz(), &q("party")).expect("valid"),
                stats: Statistics::new(session).expect("valid"),
                points: PointSetManager::new(PointMode::Real, 0),
            }
        }

        fn ingest(&mut self, batch: &[Respondent]) -> VizDiff {
            let result = self.stats.apply(batch).expect("ok");
            self.points.update(self.stats.splits(), &result.diffs);
            self.engine.update(self.stats.lattice(), &self.points)
        }
    }

    #[test]
    fn unknown_response_question_is_rejected() {
        let err = LayoutEngine::new(&session(), &viz(), &q("age")).expect_err("not a response");
        assert!(matches!(err, LayoutError::UnknownResponseQuestion { .. }));
    }

    #[test]
    fn invalid_viz_config_is_rejected() {
        let mut config = viz();
        config.point_size = 0.0;
        let err = LayoutEngine::new(&session(), &config, &q("party")).expect_err("bad size");
        assert!(matches!(err, LayoutError::Config(_)));
    }

    #[test]
    fn every_view_reaches_points_placed() {
        let mut fx = Fixture::new();
        assert_eq!(fx.engine.view_keys().len(), 2 * 2 * 2);
        for key in fx.engine.view_keys() {
            assert_eq!(fx.engine.stage(key), Some(LayoutStage::Uninitialized));
        }
        fx.ingest(&[r(1, 1, 1)]);
        for key in fx.engine.view_keys() {
            assert_eq!(fx.engine.stage(key), Some(LayoutStage::PointsPlaced));
            assert!(fx.engine.view(key).is_some());
        }
    }

    #[test]
    fn advance_exposes_each_stage_in_order() {
        let mut fx = Fixture::new();
        fx.stats.apply(&[r(1, 1, 1)]).expect("ok");
        let result = fx.stats.apply(&[r(2, 2, 3)]).expect("ok");
        fx.points.update(fx.stats.splits(), &result.diffs);

        let key = ViewKey::overall(Granularity::Expanded);
        let lattice = fx.stats.lattice();
        let stages: Vec<_> = (0..4)
            .map(|_| fx.engine.advance(&key, lattice, &fx.points))
            .collect();
        assert_eq!(
            stages,
            vec![
                Some(LayoutStage::GridComputed),
                Some(LayoutStage::SegmentsSized),
                Some(LayoutStage::PointsPlaced),
                Some(LayoutStage::GridComputed),
            ]
        );
        assert_eq!(fx.engine.stage(&key), Some(LayoutStage::GridComputed));
        // The finished layout survives a restarted pass.
        assert!(fx.engine.view(&key).is_some());

        let other = ViewKey::new(vec![0], Vec::new(), Granularity::Collapsed);
        assert_eq!(fx.engine.stage(&other), Some(LayoutStage::Uninitialized));
        assert!(fx.engine.view(&other).is_none());

        let unknown = ViewKey::new(vec![7], Vec::new(), Granularity::Expanded);
        assert_eq!(fx.engine.advance(&unknown, lattice, &fx.points), None);
    }

    #[test]
    fn update_finishes_views_left_mid_pass() {
        let mut fx = Fixture::new();
        let key = ViewKey::overall(Granularity::Expanded);
        fx.engine.advance(&key, fx.stats.lattice(), &fx.points);
        assert_eq!(fx.engine.stage(&key), Some(LayoutStage::GridComputed));

        let diff = fx.ingest(&[r(1, 2, 2)]);
        assert_eq!(fx.engine.stage(&key), Some(LayoutStage::PointsPlaced));
        let view = diff.view(&key).expect("changed");
        assert_eq!(view.points_delta.added.len(), 1);
    }

    #[test]
    fn first_pass_adds_every_point_in_every_view() {
        let mut fx = Fixture::new();
        let diff = fx.ingest(&[r(1, 1, 1), r(2, 2, 3), r(2, 1, 2)]);
        assert_eq!(diff.views.len(), fx.engine.view_keys().len());
        for view in &diff.views {
            assert_eq!(view.points_delta.added.len(), 3);
            assert!(view.points_delta.moved.is_empty());
            assert!(view.bounds_delta.iter().all(|b| b.before.is_none()));
        }
        assert_eq!(fx.engine.stats().points_placed, 3 * 8);
    }

    #[test]
    fn collapsed_view_merges_expanded_groups() {
        let mut fx = Fixture::new();
        fx.ingest(&[r(1, 1, 1), r(1, 1, 2), r(1, 1, 3)]);
        let layout = fx
            .engine
            .view(&ViewKey::overall(Granularity::Collapsed))
            .expect("laid out");
        let cell = &layout.groups[0];
        assert_eq!(cell.segments.len(), 2);
        assert_eq!(cell.segments[0].label, "left");
        assert_eq!(cell.segments[0].points.len(), 2);
        assert_eq!(cell.segments[1].points.len(), 1);
        assert!((cell.segments[0].proportion - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn segments_run_left_to_right_with_gap() {
        let mut fx = Fixture::new();
        fx.ingest(&[r(1, 1, 1), r(1, 1, 3)]);
        let layout = fx
            .engine
            .view(&ViewKey::overall(Granularity::Expanded))
            .expect("laid out");
        let segments = &layout.groups[0].segments;
        for pair in segments.windows(2) {
            let gap = pair[1].bounds.x - pair[0].bounds.right();
            assert!((gap - fx.engine.config().response_gap).abs() < 1e-9);
        }
        assert_eq!(segments[1].bounds.width, fx.engine.config().base_segment_width);
    }

    #[test]
    fn earlier_basis_point_shifts_later_ones() {
        let mut fx = Fixture::new();
        // old male, strong left
        fx.ingest(&[r(2, 1, 1)]);
        let before = fx
            .engine
            .view(&ViewKey::overall(Granularity::Expanded))
            .expect("laid out")
            .groups[0]
            .segments[0]
            .points[0];

        // young male sorts ahead of old male in the same segment
        let diff = fx.ingest(&[r(1, 1, 1)]);
        let view = diff
            .view(&ViewKey::overall(Granularity::Expanded))
            .expect("changed");
        assert_eq!(view.points_delta.added.len(), 1);
        assert_eq!(view.points_delta.moved.len(), 1);
        assert_eq!(view.points_delta.moved[0].id, before.id);
        assert_eq!(view.points_delta.moved[0].from, before.position);
        assert!(fx.engine.stats().moved > 0);
        assert!(fx.engine.stats().moved_ratio() > 0.0);
    }

    #[test]
    fn empty_batch_produces_empty_diff() {
        let mut fx = Fixture::new();
        fx.ingest(&[r(1, 1, 1), r(2, 2, 2)]);
        let diff = fx.ingest(&[]);
        assert!(diff.is_empty());
        assert_eq!(fx.engine.stats().moved_ratio(), 0.0);
    }

    #[test]
    fn removed_points_are_reported_in_synthetic_mode() {
        let session = session();
        let mut stats = Statistics::new(session.clone()).expect("valid");
        let mut points = PointSetManager::new(PointMode::Synthetic { sample_size: 4 }, 0);
        let mut engine = LayoutEngine::new(&session, &viz(), &q("party")).expect("valid");

        let result = stats.apply(&[r(1, 1, 1), r(1, 1, 3)]).expect("ok");
        points.update(stats.splits(), &result.diffs);
        engine.update(stats.lattice(), &points);

        let result = stats.apply(&[r(1, 1, 3), r(1, 1, 3)]).expect("ok");
        let update = points.update(stats.splits(), &result.diffs);
        let diff = engine.update(stats.lattice(), &points);
        let view = diff
            .view(&ViewKey::overall(Granularity::Expanded))
            .expect("changed");
        let removed: Vec<PointId> = view.points_delta.removed.iter().map(|p| p.id).collect();
        assert_eq!(removed, update.removed);
    }
}
