//! Split lattice construction.
//!
//! # Design
//!
//! For `k` grouping questions with `n₁ … n_k` response groups, the lattice
//! holds every combination of "pinned to group g" or "no filter" per
//! question: `∏(nᵢ + 1)` splits, of which `∏nᵢ` are basis splits.
//!
//! ## Data Structure: Mixed-Radix Arena
//!
//! Splits live in one `Vec<Split>`. A split's index is a mixed-radix number
//! whose digit `i` lies in `0..=nᵢ`; digit `nᵢ` encodes "no filter". The
//! first grouping question is the most significant digit.
//!
//! ```text
//! age ∈ {young, old, *}, gender ∈ {male, female, *}
//!
//! index  age    gender   basis
//!   0    young  male     yes
//!   1    young  female   yes
//!   2    young  *
//!   3    old    male     yes
//!   ...
//!   8    *      *        (all respondents)
//! ```
//!
//! ### Complexity
//!
//! | Operation            | Time          |
//! |----------------------|---------------|
//! | Build                | O(S · B · k)  |
//! | `index_of`           | O(k)          |
//! | `covering_splits`    | O(2^k · k)    |
//!
//! Where S = all splits, B = basis splits, k = grouping questions.
//!
//! # Fan-out Table
//!
//! Every split records the basis splits that agree with it on each pinned
//! question. The table depends only on configuration, so an update touches
//! exactly the aggregates that cover a changed basis split and nothing else.

use splitviz_core::{ResponseQuestion, SessionConfig};

use crate::split::Split;

/// The full split space for one session configuration.
#[derive(Debug, Clone)]
pub struct Lattice {
    splits: Vec<Split>,
    basis_split_indices: Vec<usize>,
    /// Group count per grouping question.
    radices: Vec<usize>,
    /// Place value per grouping question.
    strides: Vec<usize>,
}

impl Lattice {
    /// Enumerate every split with zeroed statistics.
    #[must_use]
    pub fn build(config: &SessionConfig) -> Self {
        let radices: Vec<usize> = config
            .grouping_questions
            .iter()
            .map(|g| g.response_groups.len())
            .collect();
        Self::from_radices(radices, &config.response_questions)
    }

    /// Build from raw group counts.
    #[must_use]
    pub fn from_radices(radices: Vec<usize>, questions: &[ResponseQuestion]) -> Self {
        let mut strides = vec![1usize; radices.len()];
        for i in (0..radices.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * (radices[i + 1] + 1);
        }
        let total: usize = radices.iter().map(|n| n + 1).product();

        let mut splits: Vec<Split> = (0..total)
            .map(|index| {
                let groups = decode(index, &radices, &strides);
                Split::zeroed(index, groups, questions)
            })
            .collect();

        let basis_split_indices: Vec<usize> = splits
            .iter()
            .filter(|s| s.is_basis())
            .map(|s| s.index)
            .collect();

        for index in 0..splits.len() {
            let covered: Vec<usize> = basis_split_indices
                .iter()
                .copied()
                .filter(|&b| splits[index].covers(&splits[b].groups))
                .collect();
            splits[index].basis_split_indices = covered;
        }

        tracing::debug!(
            target: "splitviz.stats",
            splits = splits.len(),
            basis = basis_split_indices.len(),
            grouping_questions = radices.len(),
            "split lattice built"
        );

        Self {
            splits,
            basis_split_indices,
            radices,
            strides,
        }
    }

    #[must_use]
    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub(crate) fn splits_mut(&mut self) -> &mut [Split] {
        &mut self.splits
    }

    #[must_use]
    pub fn split(&self, index: usize) -> Option<&Split> {
        self.splits.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.splits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    /// Indices of all basis splits, ascending.
    #[must_use]
    pub fn basis_split_indices(&self) -> &[usize] {
        &self.basis_split_indices
    }

    /// Group count per grouping question.
    #[must_use]
    pub fn radices(&self) -> &[usize] {
        &self.radices
    }

    /// Lattice index for a per-question selection (`None` = no filter).
    ///
    /// Returns `None` if the selection has the wrong arity or names a group
    /// that does not exist.
    #[must_use]
    pub fn index_of(&self, selection: &[Option<usize>]) -> Option<usize> {
        if selection.len() != self.radices.len() {
            return None;
        }
        let mut index = 0;
        for ((choice, &radix), &stride) in selection.iter().zip(&self.radices).zip(&self.strides)
        {
            let digit = match *choice {
                Some(g) if g < radix => g,
                Some(_) => return None,
                None => radix,
            };
            index += digit * stride;
        }
        Some(index)
    }

    /// Lattice index of the basis split for a full assignment.
    #[must_use]
    pub fn basis_index_of(&self, assignment: &[usize]) -> Option<usize> {
        let selection: Vec<Option<usize>> = assignment.iter().copied().map(Some).collect();
        self.index_of(&selection)
    }

    /// Every split whose fan-out list contains `basis_index`, including the
    /// basis split itself. Ascending order.
    #[must_use]
    pub fn covering_splits(&self, basis_index: usize) -> Vec<usize> {
        let Some(basis) = self.splits.get(basis_index) else {
            return Vec::new();
        };
        let k = self.radices.len();
        let mut out = Vec::with_capacity(1 << k);
        let mut selection = vec![None; k];
        for mask in 0u64..(1u64 << k) {
            for (i, slot) in selection.iter_mut().enumerate() {
                *slot = if mask & (1 << i) == 0 {
                    basis.groups[i]
                } else {
                    None
                };
            }
            if let Some(index) = self.index_of(&selection) {
                out.push(index);
            }
        }
        out.sort_unstable();
        out
    }
}

fn decode(index: usize, radices: &[usize], strides: &[usize]) -> Vec<Option<usize>> {
    radices
        .iter()
        .zip(strides)
        .map(|(&radix, &stride)| {
            let digit = (index / stride) % (radix + 1);
            (digit < radix).then_some(digit)
        })
        .collect()
}
