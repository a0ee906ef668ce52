//! Segment sizing and point packing within a grid cell.
//!
//! A segment holds the points of one response group. Points are packed
//! column-major from the bottom-left corner: fill a column bottom to top,
//! then move right by one point pitch.

use serde::{Deserialize, Serialize};
use splitviz_core::{Bounds, Granularity, Position, ResponseQuestion, VizConfig};
use splitviz_stats::Lattice;

use crate::diff::PlacedPoint;
use crate::grid::Grid;
use crate::points::{PointId, PointSetManager};
use crate::view::ViewKey;

/// Points stacked per column for a cell of `height`.
#[must_use]
pub fn rows_per_column(height: f64, point_size: f64) -> usize {
    if point_size <= 0.0 {
        return 1;
    }
    ((height / point_size).floor() as usize).max(1)
}

/// Number of halvings tried when shrinking a crowded cell.
const FIT_ITERATIONS: usize = 40;

/// Point pitch, base width and gap used inside one cell.
///
/// Normally these are the configured sizes. When the segments of a cell
/// would run past its right edge, all three are scaled down by the same
/// factor until they fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentMetrics {
    pub base_width: f64,
    pub pitch: f64,
    pub gap: f64,
    pub rows_per_column: usize,
    /// 1.0 when nothing was shrunk.
    pub scale: f64,
}

impl SegmentMetrics {
    /// Configured sizes for a cell of `height`.
    #[must_use]
    pub fn natural(height: f64, config: &VizConfig) -> Self {
        Self::scaled(height, config, 1.0)
    }

    fn scaled(height: f64, config: &VizConfig, scale: f64) -> Self {
        let pitch = config.point_size * scale;
        Self {
            base_width: config.base_segment_width * scale,
            pitch,
            gap: config.response_gap * scale,
            rows_per_column: rows_per_column(height, pitch),
            scale,
        }
    }

    /// Largest metrics whose segments fit inside `cell`.
    ///
    /// `counts` holds the number of points per segment, left to right.
    #[must_use]
    pub fn fit(cell: &Bounds, counts: &[usize], config: &VizConfig) -> Self {
        let has_points = counts.iter().any(|&n| n > 0);
        let fits = |m: &Self| {
            m.row_width(counts) <= cell.width && (!has_points || m.pitch <= cell.height)
        };
        let natural = Self::natural(cell.height, config);
        if fits(&natural) {
            return natural;
        }
        // Scale 0 always fits; bisect towards the largest scale that does.
        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        for _ in 0..FIT_ITERATIONS {
            let mid = (lo + hi) / 2.0;
            if fits(&Self::scaled(cell.height, config, mid)) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        tracing::trace!(
            target: "splitviz.layout",
            scale = lo,
            cell_width = cell.width,
            natural_width = natural.row_width(counts),
            "segments shrunk to fit cell"
        );
        Self::scaled(cell.height, config, lo)
    }

    /// Width of a segment holding `points` points.
    #[must_use]
    pub fn width(&self, points: usize) -> f64 {
        let columns = points.div_ceil(self.rows_per_column.max(1));
        self.base_width + columns as f64 * self.pitch
    }

    /// Total width of segments with `counts` points, gaps included.
    #[must_use]
    pub fn row_width(&self, counts: &[usize]) -> f64 {
        let gaps = counts.len().saturating_sub(1) as f64 * self.gap;
        counts.iter().map(|&n| self.width(n)).sum::<f64>() + gaps
    }

    /// Canvas position of the `k`-th point of a segment.
    #[must_use]
    pub fn position(&self, bounds: &Bounds, k: usize) -> Position {
        let rpc = self.rows_per_column.max(1);
        let (column, row) = (k / rpc, k % rpc);
        Position::new(
            bounds.x + self.base_width / 2.0 + (column as f64 + 0.5) * self.pitch,
            bounds.bottom() - (row as f64 + 0.5) * self.pitch,
        )
    }
}

/// A segment whose bounds are known but whose points are not yet placed.
#[derive(Debug, Clone, PartialEq)]
pub struct SizedSegment {
    pub group: usize,
    pub bounds: Bounds,
    pub proportion: f64,
    /// Point identities in packing order.
    pub ids: Vec<PointId>,
}

/// A cell with sized segments.
#[derive(Debug, Clone, PartialEq)]
pub struct SizedGroup {
    pub row: usize,
    pub column: usize,
    pub split_index: usize,
    pub bounds: Bounds,
    pub metrics: SegmentMetrics,
    pub segments: Vec<SizedSegment>,
}

/// Compute segment bounds for every cell of `grid`.
///
/// A cell's points are the points of every basis split it sums over,
/// visited in (basis index, expanded group, sequence) order and routed to
/// the segment of their group at `granularity`. Segments never extend
/// past the cell; see [`SegmentMetrics::fit`].
#[must_use]
pub fn size_segments(
    grid: &Grid,
    granularity: Granularity,
    lattice: &Lattice,
    response: (usize, &ResponseQuestion),
    points: &PointSetManager,
    config: &VizConfig,
) -> Vec<SizedGroup> {
    let (position, question) = response;
    let group_count = question.groups(granularity).len();
    let expanded_count = question.expanded().len();

    grid.cells
        .iter()
        .map(|cell| {
            let mut ids: Vec<Vec<PointId>> = vec![Vec::new(); group_count];
            let mut proportions = vec![0.0; group_count];
            if let Some(split) = lattice.split(cell.split_index) {
                for &basis in &split.basis_split_indices {
                    for g in 0..expanded_count {
                        let target = question.project(g, granularity);
                        if let Some(bucket) = ids.get_mut(target) {
                            bucket.extend(points.points_in(basis, g));
                        }
                    }
                }
                if let Some(stats) = split.responses.get(position) {
                    for (slot, group) in proportions.iter_mut().zip(stats.groups(granularity)) {
                        *slot = group.proportion;
                    }
                }
            }

            let counts: Vec<usize> = ids.iter().map(Vec::len).collect();
            let metrics = SegmentMetrics::fit(&cell.bounds, &counts, config);
            let mut cursor = cell.bounds.x;
            let segments = ids
                .into_iter()
                .zip(proportions)
                .enumerate()
                .map(|(group, (ids, proportion))| {
                    let width = metrics.width(ids.len());
                    let bounds = Bounds::new(cursor, cell.bounds.y, width, cell.bounds.height);
                    cursor += width + metrics.gap;
                    SizedSegment {
                        group,
                        bounds,
                        proportion,
                        ids,
                    }
                })
                .collect();

            SizedGroup {
                row: cell.row,
                column: cell.column,
                split_index: cell.split_index,
                bounds: cell.bounds,
                metrics,
                segments,
            }
        })
        .collect()
}

/// One response group's segment in a laid-out cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub group: usize,
    pub label: String,
    pub bounds: Bounds,
    pub proportion: f64,
    pub points: Vec<PlacedPoint>,
}

/// A laid-out cell: the segments of one split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentGroup {
    pub row: usize,
    pub column: usize,
    pub split_index: usize,
    pub bounds: Bounds,
    pub segments: Vec<Segment>,
}

/// The finished layout of one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewLayout {
    pub key: ViewKey,
    pub rows: usize,
    pub columns: usize,
    /// Row-major.
    pub groups: Vec<SegmentGroup>,
}

impl ViewLayout {
    /// Assign positions to every sized segment.
    #[must_use]
    pub fn place(
        key: ViewKey,
        grid: &Grid,
        sized: Vec<SizedGroup>,
        question: &ResponseQuestion,
    ) -> Self {
        let labels = question.groups(key.granularity);
        let groups = sized
            .into_iter()
            .map(|cell| SegmentGroup {
                row: cell.row,
                column: cell.column,
                split_index: cell.split_index,
                bounds: cell.bounds,
                segments: cell
                    .segments
                    .into_iter()
                    .map(|segment| Segment {
                        group: segment.group,
                        label: labels
                            .get(segment.group)
                            .map(|g| g.label.clone())
                            .unwrap_or_default(),
                        bounds: segment.bounds,
                        proportion: segment.proportion,
                        points: segment
                            .ids
                            .iter()
                            .enumerate()
                            .map(|(k, &id)| PlacedPoint {
                                id,
                                position: cell.metrics.position(&segment.bounds, k),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            key,
            rows: grid.rows,
            columns: grid.columns,
            groups,
        }
    }

    /// Every placed point in the view.
    pub fn points(&self) -> impl Iterator<Item = &PlacedPoint> {
        self.groups
            .iter()
            .flat_map(|g| g.segments.iter())
            .flat_map(|s| s.points.iter())
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| g.segments.iter())
            .map(|s| s.points.len())
            .sum()
    }

    #[must_use]
    pub fn group_at(&self, row: usize, column: usize) -> Option<&SegmentGroup> {
        self.groups.get(row * self.columns + column)
    }
}
