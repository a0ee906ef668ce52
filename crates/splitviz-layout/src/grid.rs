//! Grid solver: rows × columns of cells, each bound to one split.

use splitviz_core::{Bounds, VizConfig};
use splitviz_stats::Lattice;

use crate::view::ViewKey;

/// One slot along an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub offset: f64,
    pub size: f64,
}

/// Divide `extent` into `n` equal slots separated by `gap`.
///
/// Slot size is clamped at zero when the gaps alone exceed the extent.
/// `n == 0` is treated as one slot.
#[must_use]
pub fn divide(extent: f64, gap: f64, n: usize) -> Vec<Slot> {
    let n = n.max(1);
    let gaps = gap * (n - 1) as f64;
    let size = ((extent - gaps) / n as f64).max(0.0);
    (0..n)
        .map(|i| Slot {
            offset: i as f64 * (size + gap),
            size,
        })
        .collect()
}

/// Cartesian product of the groups of `positions`, first position most
/// significant. An empty axis yields one empty combination.
fn combinations(positions: &[usize], radices: &[usize]) -> Vec<Vec<(usize, usize)>> {
    let mut out: Vec<Vec<(usize, usize)>> = vec![Vec::new()];
    for &position in positions {
        let radix = radices.get(position).copied().unwrap_or(0);
        out = out
            .into_iter()
            .flat_map(|prefix| {
                (0..radix).map(move |g| {
                    let mut next = prefix.clone();
                    next.push((position, g));
                    next
                })
            })
            .collect();
    }
    out
}

/// A cell of the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub row: usize,
    pub column: usize,
    /// Split whose statistics this cell shows.
    pub split_index: usize,
    pub bounds: Bounds,
}

/// The cell grid of one view. Cells are stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub rows: usize,
    pub columns: usize,
    pub cells: Vec<GridCell>,
}

impl Grid {
    /// Lay out the cells of `key` on the canvas.
    #[must_use]
    pub fn compute(key: &ViewKey, lattice: &Lattice, config: &VizConfig) -> Self {
        let radices = lattice.radices();
        let row_combos = combinations(&key.vertical, radices);
        let column_combos = combinations(&key.horizontal, radices);
        let row_slots = divide(
            config.canvas_height,
            config.group_gap_vertical,
            row_combos.len(),
        );
        let column_slots = divide(
            config.canvas_width,
            config.group_gap_horizontal,
            column_combos.len(),
        );

        let mut cells = Vec::with_capacity(row_combos.len() * column_combos.len());
        let mut selection = vec![None; radices.len()];
        for (row, (rc, rs)) in row_combos.iter().zip(&row_slots).enumerate() {
            for (column, (cc, cs)) in column_combos.iter().zip(&column_slots).enumerate() {
                selection.fill(None);
                for &(position, group) in rc.iter().chain(cc) {
                    selection[position] = Some(group);
                }
                let Some(split_index) = lattice.index_of(&selection) else {
                    continue;
                };
                cells.push(GridCell {
                    row,
                    column,
                    split_index,
                    bounds: Bounds::new(cs.offset, rs.offset, cs.size, rs.size),
                });
            }
        }

        Self {
            rows: row_combos.len(),
            columns: column_combos.len(),
            cells,
        }
    }

    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&GridCell> {
        self.cells.get(row * self.columns + column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitviz_core::{Granularity, ResponseGroup, ResponseQuestion, Question};

    fn lattice() -> Lattice {
        let rq = ResponseQuestion::new(
            Question::new("vote", "poll", ""),
            vec![ResponseGroup::new("yes", [1])],
            Vec::new(),
        )
        .expect("valid");
        // age: 2 groups, gender: 2 groups, region: 3 groups
        Lattice::from_radices(vec![2, 2, 3], &[rq])
    }

    #[test]
    fn divide_evenly_with_gaps() {
        let slots = divide(100.0, 10.0, 3);
        assert_eq!(slots.len(), 3);
        for slot in &slots {
            assert!((slot.size - 80.0 / 3.0).abs() < 1e-9);
        }
        assert!((slots[2].offset + slots[2].size - 100.0).abs() < 1e-9);
    }

    #[test]
    fn divide_single_slot_spans_extent() {
        assert_eq!(
            divide(50.0, 8.0, 0),
            vec![Slot {
                offset: 0.0,
                size: 50.0
            }]
        );
    }

    #[test]
    fn divide_clamps_when_gaps_exceed_extent() {
        let slots = divide(10.0, 20.0, 3);
        assert!(slots.iter().all(|s| s.size == 0.0));
    }

    #[test]
    fn overall_view_is_one_cell_on_the_all_split() {
        let lattice = lattice();
        let grid = Grid::compute(
            &ViewKey::overall(Granularity::Expanded),
            &lattice,
            &VizConfig::default(),
        );
        assert_eq!((grid.rows, grid.columns), (1, 1));
        assert_eq!(
            grid.cells[0].split_index,
            lattice.index_of(&[None, None, None]).expect("in range")
        );
        assert_eq!(grid.cells[0].bounds, Bounds::from_size(960.0, 540.0));
    }

    #[test]
    fn cells_map_to_selected_splits() {
        let lattice = lattice();
        let key = ViewKey::new(vec![2], vec![0, 1], Granularity::Expanded);
        let grid = Grid::compute(&key, &lattice, &VizConfig::default());
        assert_eq!((grid.rows, grid.columns), (4, 3));
        assert_eq!(grid.cells.len(), 12);

        // row 2 = (age 1, gender 0), column 1 = region 1
        let cell = grid.cell(2, 1).expect("cell");
        assert_eq!(
            cell.split_index,
            lattice
                .index_of(&[Some(1), Some(0), Some(1)])
                .expect("in range")
        );
        assert!(lattice.splits()[cell.split_index].is_basis());
    }

    #[test]
    fn inactive_questions_are_unfiltered() {
        let lattice = lattice();
        let key = ViewKey::new(vec![1], Vec::new(), Granularity::Collapsed);
        let grid = Grid::compute(&key, &lattice, &VizConfig::default());
        let split = &lattice.splits()[grid.cells[1].split_index];
        assert_eq!(split.groups, vec![None, Some(1), None]);
    }
}
