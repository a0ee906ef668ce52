//! Split records and snapshot diffs.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use splitviz_core::{Granularity, ResponseGroup, ResponseQuestion};

/// Per-response-group statistics within one split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub label: String,
    /// Answer codes that fall in this group.
    pub values: BTreeSet<i64>,
    pub total_count: u64,
    pub total_weight: f64,
    /// `total_weight / split.total_weight`, or 0 for an empty split.
    pub proportion: f64,
}

impl GroupStats {
    fn zeroed(group: &ResponseGroup) -> Self {
        Self {
            label: group.label.clone(),
            values: group.values.clone(),
            total_count: 0,
            total_weight: 0.0,
            proportion: 0.0,
        }
    }
}

/// Statistics for one response question within one split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseStats {
    pub expanded: Vec<GroupStats>,
    pub collapsed: Vec<GroupStats>,
}

impl ResponseStats {
    pub(crate) fn zeroed(question: &ResponseQuestion) -> Self {
        Self {
            expanded: question
                .expanded()
                .iter()
                .map(GroupStats::zeroed)
                .collect(),
            collapsed: question
                .collapsed()
                .iter()
                .map(GroupStats::zeroed)
                .collect(),
        }
    }

    #[must_use]
    pub fn groups(&self, granularity: Granularity) -> &[GroupStats] {
        match granularity {
            Granularity::Expanded => &self.expanded,
            Granularity::Collapsed => &self.collapsed,
        }
    }

    /// Proportions at `granularity`, in group order.
    #[must_use]
    pub fn proportions(&self, granularity: Granularity) -> Vec<f64> {
        self.groups(granularity).iter().map(|g| g.proportion).collect()
    }

    pub(crate) fn groups_mut(&mut self) -> impl Iterator<Item = &mut GroupStats> {
        self.expanded.iter_mut().chain(self.collapsed.iter_mut())
    }
}

/// One cell of the grouping lattice.
///
/// `groups` and `basis_split_indices` are structural and fixed for the
/// lifetime of the lattice; only the counters change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    /// Position of this split in the lattice arena.
    pub index: usize,
    /// One entry per grouping question, in configuration order.
    /// `None` means "no filter" for that question.
    pub groups: Vec<Option<usize>>,
    pub total_count: u64,
    pub total_weight: f64,
    /// One entry per response question, in configuration order.
    pub responses: Vec<ResponseStats>,
    /// Lattice indices of the basis splits this split sums over.
    pub basis_split_indices: Vec<usize>,
}

impl Split {
    pub(crate) fn zeroed(
        index: usize,
        groups: Vec<Option<usize>>,
        questions: &[ResponseQuestion],
    ) -> Self {
        Self {
            index,
            groups,
            total_count: 0,
            total_weight: 0.0,
            responses: questions.iter().map(ResponseStats::zeroed).collect(),
            basis_split_indices: Vec::new(),
        }
    }

    /// Every grouping question is pinned to a concrete group.
    #[inline]
    #[must_use]
    pub fn is_basis(&self) -> bool {
        self.groups.iter().all(Option::is_some)
    }

    /// Does `basis` fall inside this split?
    #[must_use]
    pub fn covers(&self, basis: &[Option<usize>]) -> bool {
        self.groups
            .iter()
            .zip(basis)
            .all(|(mine, theirs)| mine.is_none() || mine == theirs)
    }

    /// Recompute every proportion from the current weights.
    pub(crate) fn refresh_proportions(&mut self) {
        let total = self.total_weight;
        for response in &mut self.responses {
            for group in response.groups_mut() {
                group.proportion = if total > 0.0 {
                    group.total_weight / total
                } else {
                    0.0
                };
            }
        }
    }
}

/// Change in one response group between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupDelta {
    pub count: i64,
    pub weight: f64,
    pub proportion: f64,
}

impl GroupDelta {
    fn between(before: &GroupStats, after: &GroupStats) -> Self {
        Self {
            count: after.total_count as i64 - before.total_count as i64,
            weight: after.total_weight - before.total_weight,
            proportion: after.proportion - before.proportion,
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.count == 0 && self.weight == 0.0 && self.proportion == 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDelta {
    pub expanded: Vec<GroupDelta>,
    pub collapsed: Vec<GroupDelta>,
}

impl ResponseDelta {
    fn between(before: &ResponseStats, after: &ResponseStats) -> Self {
        let zip = |b: &[GroupStats], a: &[GroupStats]| -> Vec<GroupDelta> {
            b.iter()
                .zip(a)
                .map(|(b, a)| GroupDelta::between(b, a))
                .collect()
        };
        Self {
            expanded: zip(&before.expanded, &after.expanded),
            collapsed: zip(&before.collapsed, &after.collapsed),
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.expanded
            .iter()
            .chain(&self.collapsed)
            .all(GroupDelta::is_zero)
    }
}

/// Before/after deltas for one split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitDiff {
    pub split_index: usize,
    pub total_count: i64,
    pub total_weight: f64,
    pub responses: Vec<ResponseDelta>,
}

impl SplitDiff {
    /// Diff two snapshots of the same split.
    #[must_use]
    pub fn between(before: &Split, after: &Split) -> Self {
        debug_assert_eq!(before.index, after.index);
        Self {
            split_index: after.index,
            total_count: after.total_count as i64 - before.total_count as i64,
            total_weight: after.total_weight - before.total_weight,
            responses: before
                .responses
                .iter()
                .zip(&after.responses)
                .map(|(b, a)| ResponseDelta::between(b, a))
                .collect(),
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.total_count == 0
            && self.total_weight == 0.0
            && self.responses.iter().all(ResponseDelta::is_zero)
    }
}
