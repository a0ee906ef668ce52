//! Batch entry point for incremental aggregation.
//!
//! [`Statistics::apply`] validates a batch, groups the valid respondents by
//! basis split, updates each touched basis split, and propagates to every
//! aggregate split that covers one of them. Untouched splits are never
//! visited.
//!
//! A batch is all-or-nothing: the new split values are staged, and they are
//! only committed once every update and propagation has passed the
//! integrity check.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;
use splitviz_core::{Respondent, SessionConfig};

use crate::aggregate::{self, RespondentDelta};
use crate::error::Result;
use crate::lattice::Lattice;
use crate::split::{Split, SplitDiff};
use crate::validate::{Validator, Verdict};

/// Outcome of one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResult {
    pub valid_count: usize,
    pub invalid_count: usize,
    pub total_processed: usize,
    /// Diffs for every touched split, ascending by split index.
    pub diffs: Vec<SplitDiff>,
}

impl UpdateResult {
    /// Diffs for basis splits only.
    pub fn basis_diffs<'a>(&'a self, lattice: &'a Lattice) -> impl Iterator<Item = &'a SplitDiff> {
        self.diffs
            .iter()
            .filter(move |d| lattice.splits()[d.split_index].is_basis())
    }

    /// True when the batch changed nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.diffs.iter().all(SplitDiff::is_zero)
    }
}

/// Cumulative counters across all batches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSummary {
    pub batches: u64,
    pub valid: u64,
    pub invalid: u64,
    pub processed: u64,
    /// Splits rewritten by the most recent batch.
    pub last_touched: usize,
}

impl StatsSummary {
    /// Fraction of processed respondents that were valid (0.0 – 1.0).
    pub fn valid_rate(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.valid as f64 / self.processed as f64
        }
    }
}

/// Owns the split arena for one session.
#[derive(Debug, Clone)]
pub struct Statistics {
    validator: Validator,
    lattice: Lattice,
    summary: StatsSummary,
}

impl Statistics {
    /// Validate `config` and build a zeroed lattice.
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let lattice = Lattice::build(&config);
        Ok(Self {
            validator: Validator::new(config),
            lattice,
            summary: StatsSummary::default(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        self.validator.config()
    }

    #[must_use]
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    #[must_use]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    #[must_use]
    pub fn splits(&self) -> &[Split] {
        self.lattice.splits()
    }

    #[must_use]
    pub fn split(&self, index: usize) -> Option<&Split> {
        self.lattice.split(index)
    }

    pub fn basis_splits(&self) -> impl Iterator<Item = &Split> {
        self.lattice
            .basis_split_indices()
            .iter()
            .map(|&b| &self.lattice.splits()[b])
    }

    #[must_use]
    pub fn summary(&self) -> &StatsSummary {
        &self.summary
    }

    /// Apply a batch of respondents.
    ///
    /// # Errors
    ///
    /// An integrity error ([`StatsError::is_integrity`](crate::StatsError::is_integrity))
    /// if a valid respondent carries a non-positive weight or any split
    /// ends with non-positive weight. The statistics are left unchanged.
    pub fn apply(&mut self, respondents: &[Respondent]) -> Result<UpdateResult> {
        let _span = tracing::debug_span!(
            "stats.apply",
            batch = respondents.len(),
            touched = tracing::field::Empty,
        )
        .entered();

        // Staged results and aggregates are kept sorted, so only the
        // grouping itself is unordered.
        let mut by_basis: FxHashMap<usize, Vec<RespondentDelta>> = FxHashMap::default();
        let mut valid_count = 0;
        let mut invalid_count = 0;
        for respondent in respondents {
            match self.validator.validate(respondent) {
                Verdict::Valid(valid) => {
                    let Some(basis) = self.lattice.basis_index_of(&valid.assignment) else {
                        invalid_count += 1;
                        continue;
                    };
                    valid_count += 1;
                    by_basis
                        .entry(basis)
                        .or_default()
                        .push(RespondentDelta::from(&valid));
                }
                Verdict::Invalid(reason) => {
                    invalid_count += 1;
                    tracing::trace!(
                        target: "splitviz.stats",
                        respondent = %respondent.respondent_id,
                        %reason,
                        "respondent skipped"
                    );
                }
            }
        }

        let questions = &self.config().response_questions;
        let splits = self.lattice.splits();
        let mut staged: BTreeMap<usize, (Split, SplitDiff)> = BTreeMap::new();
        for (&basis, deltas) in &by_basis {
            staged.insert(basis, aggregate::update(&splits[basis], deltas, questions)?);
        }

        let aggregates: BTreeSet<usize> = by_basis
            .keys()
            .flat_map(|&b| self.lattice.covering_splits(b))
            .filter(|&s| !splits[s].is_basis())
            .collect();
        for &index in &aggregates {
            let split = &splits[index];
            let basis: Vec<&Split> = split
                .basis_split_indices
                .iter()
                .map(|&b| staged.get(&b).map_or(&splits[b], |(s, _)| s))
                .collect();
            let result = aggregate::propagate(split, &basis)?;
            staged.insert(index, result);
        }

        let touched = staged.len();
        tracing::Span::current().record("touched", touched);

        let mut diffs = Vec::with_capacity(touched);
        let arena = self.lattice.splits_mut();
        for (index, (split, diff)) in staged {
            arena[index] = split;
            diffs.push(diff);
        }

        self.summary.batches += 1;
        self.summary.valid += valid_count as u64;
        self.summary.invalid += invalid_count as u64;
        self.summary.processed += respondents.len() as u64;
        self.summary.last_touched = touched;

        tracing::debug!(
            target: "splitviz.stats",
            valid = valid_count,
            invalid = invalid_count,
            touched,
            "batch applied"
        );

        Ok(UpdateResult {
            valid_count,
            invalid_count,
            total_processed: respondents.len(),
            diffs,
        })
    }
}
