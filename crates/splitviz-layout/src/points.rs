//! Stable point identities.
//!
//! A point is `(basis split, expanded group, sequence)`. Sequences for a
//! given `(split, group)` pair are always the contiguous range
//! `0..count`, so the whole point set is described by one counter per pair.
//!
//! # Modes
//!
//! - **Real**: one point per respondent. Counters only grow; an emitted ID
//!   is never removed or reused.
//! - **Synthetic**: every update resamples each basis split to a fixed size
//!   with [`sampler::allocate`]. Each pair is reconciled against its old
//!   counter: sequences below `min(old, new)` survive, `new..old` are
//!   removed, `old..new` are added.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use splitviz_core::VizConfig;
use splitviz_stats::{Split, SplitDiff, sampler};

/// Identity of one point.
///
/// Ordering is `(split_index, group, sequence)`; segment packing relies on
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PointId {
    /// Lattice index of a basis split.
    pub split_index: usize,
    /// Expanded response-group index.
    pub group: usize,
    pub sequence: u32,
}

impl PointId {
    #[must_use]
    pub const fn new(split_index: usize, group: usize, sequence: u32) -> Self {
        Self {
            split_index,
            group,
            sequence,
        }
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}.{}.{}", self.split_index, self.group, self.sequence)
    }
}

/// How points are synthesized from statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointMode {
    /// One point per valid respondent.
    Real,
    /// A resampled set of `sample_size` points per basis split.
    Synthetic { sample_size: u32 },
}

impl PointMode {
    #[must_use]
    pub fn from_config(config: &VizConfig) -> Self {
        match config.synthetic_sample_size {
            Some(sample_size) => Self::Synthetic { sample_size },
            None => Self::Real,
        }
    }
}

/// Points that appeared or disappeared in one update. Both lists ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointsUpdate {
    pub added: Vec<PointId>,
    pub removed: Vec<PointId>,
}

impl PointsUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Point identities for one response question.
#[derive(Debug, Clone)]
pub struct PointSetManager {
    mode: PointMode,
    /// Position of the tracked response question in the session config.
    response: usize,
    counts: BTreeMap<(usize, usize), u32>,
}

impl PointSetManager {
    #[must_use]
    pub fn new(mode: PointMode, response: usize) -> Self {
        Self {
            mode,
            response,
            counts: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> PointMode {
        self.mode
    }

    #[must_use]
    pub fn response(&self) -> usize {
        self.response
    }

    /// Number of live points for a pair.
    #[must_use]
    pub fn count(&self, split_index: usize, group: usize) -> u32 {
        self.counts.get(&(split_index, group)).copied().unwrap_or(0)
    }

    /// Live points for a pair, ascending.
    pub fn points_in(&self, split_index: usize, group: usize) -> impl Iterator<Item = PointId> {
        (0..self.count(split_index, group)).map(move |s| PointId::new(split_index, group, s))
    }

    /// Every live point, ascending.
    pub fn points(&self) -> impl Iterator<Item = PointId> + '_ {
        self.counts
            .iter()
            .flat_map(|(&(split, group), &n)| (0..n).map(move |s| PointId::new(split, group, s)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.values().map(|&n| n as usize).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reconcile against the current split statistics.
    ///
    /// In real mode only the basis splits named in `diffs` are visited. In
    /// synthetic mode every basis split is resampled.
    pub fn update(&mut self, splits: &[Split], diffs: &[SplitDiff]) -> PointsUpdate {
        let mut out = PointsUpdate::default();
        match self.mode {
            PointMode::Real => {
                for diff in diffs {
                    let Some(split) = splits.get(diff.split_index) else {
                        continue;
                    };
                    if !split.is_basis() {
                        continue;
                    }
                    let Some(stats) = split.responses.get(self.response) else {
                        continue;
                    };
                    for (group, g) in stats.expanded.iter().enumerate() {
                        let target = u32::try_from(g.total_count).unwrap_or(u32::MAX);
                        self.grow(split.index, group, target, &mut out);
                    }
                }
            }
            PointMode::Synthetic { sample_size } => {
                for split in splits.iter().filter(|s| s.is_basis()) {
                    let Some(stats) = split.responses.get(self.response) else {
                        continue;
                    };
                    for (group, target) in synthetic_targets(split, stats, sample_size)
                        .into_iter()
                        .enumerate()
                    {
                        self.reconcile(split.index, group, target, &mut out);
                    }
                }
            }
        }
        out.added.sort_unstable();
        out.removed.sort_unstable();
        tracing::debug!(
            target: "splitviz.points",
            response = self.response,
            added = out.added.len(),
            removed = out.removed.len(),
            live = self.len(),
            "point set reconciled"
        );
        out
    }

    fn grow(&mut self, split: usize, group: usize, target: u32, out: &mut PointsUpdate) {
        if target == 0 {
            return;
        }
        let current = self.counts.entry((split, group)).or_insert(0);
        if target < *current {
            tracing::warn!(
                target: "splitviz.points",
                split,
                group,
                current = *current,
                target,
                "real-mode count shrank; keeping existing points"
            );
            return;
        }
        out.added
            .extend((*current..target).map(|s| PointId::new(split, group, s)));
        *current = target;
    }

    fn reconcile(&mut self, split: usize, group: usize, target: u32, out: &mut PointsUpdate) {
        let current = self.count(split, group);
        if target > current {
            out.added
                .extend((current..target).map(|s| PointId::new(split, group, s)));
        } else {
            out.removed
                .extend((target..current).map(|s| PointId::new(split, group, s)));
        }
        if target == 0 {
            self.counts.remove(&(split, group));
        } else {
            self.counts.insert((split, group), target);
        }
    }
}

/// Sampler allocation for one basis split.
///
/// Proportions are renormalized over the respondents who answered this
/// question, so non-respondents do not inflate the rounding shortfall. A
/// split with nobody answering gets no points.
fn synthetic_targets(split: &Split, stats: &splitviz_stats::ResponseStats, n: u32) -> Vec<u32> {
    let answered: f64 = stats.expanded.iter().map(|g| g.total_weight).sum();
    if split.total_count == 0 || answered <= 0.0 {
        return vec![0; stats.expanded.len()];
    }
    let proportions: Vec<f64> = stats
        .expanded
        .iter()
        .map(|g| g.total_weight / answered)
        .collect();
    sampler::allocate(&proportions, n)
}
