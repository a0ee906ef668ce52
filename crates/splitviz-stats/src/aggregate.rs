//! Pure update and propagation steps.
//!
//! Neither function mutates its input. Each returns the new split together
//! with a [`SplitDiff`] against the old one, so callers can apply
//! incremental UI updates and tests can compare by structural equality.
//!
//! # Integrity
//!
//! Every respondent folded into a basis split must carry a positive weight,
//! and a split that holds respondents must have positive total weight. A
//! zero or negative weight means something slipped past validation; the
//! step fails with [`StatsError::is_integrity`] set instead of producing
//! proportions outside `[0, 1]`.

use splitviz_core::ResponseQuestion;

use crate::error::{Result, StatsError};
use crate::split::{Split, SplitDiff};
use crate::validate::ValidRespondent;

/// One respondent's contribution to a basis split.
#[derive(Debug, Clone, PartialEq)]
pub struct RespondentDelta {
    pub weight: f64,
    /// Expanded group index per response question, if answered.
    pub responses: Vec<Option<usize>>,
}

impl From<&ValidRespondent> for RespondentDelta {
    fn from(valid: &ValidRespondent) -> Self {
        Self {
            weight: valid.weight,
            responses: valid.responses.clone(),
        }
    }
}

fn check_weight(split: &Split, weight: f64) -> Result<()> {
    if weight > 0.0 {
        return Ok(());
    }
    tracing::error!(
        target: "splitviz.stats",
        split_index = split.index,
        weight,
        "non-positive respondent weight reached the aggregator"
    );
    Err(StatsError::RespondentWeight {
        split_index: split.index,
        weight,
    })
}

fn check_integrity(split: &Split) -> Result<()> {
    if split.total_count > 0 && (split.total_weight <= 0.0 || split.total_weight.is_nan()) {
        tracing::error!(
            target: "splitviz.stats",
            split_index = split.index,
            total_weight = split.total_weight,
            total_count = split.total_count,
            "non-positive split weight after aggregation"
        );
        return Err(StatsError::Integrity {
            split_index: split.index,
            total_weight: split.total_weight,
            total_count: split.total_count,
        });
    }
    Ok(())
}

/// Fold `deltas` into a basis split.
///
/// Each answered response increments its expanded group and the collapsed
/// group that contains it. Proportions are recomputed once all deltas are
/// applied.
pub fn update(
    split: &Split,
    deltas: &[RespondentDelta],
    questions: &[ResponseQuestion],
) -> Result<(Split, SplitDiff)> {
    let mut next = split.clone();
    for delta in deltas {
        check_weight(split, delta.weight)?;
        next.total_count += 1;
        next.total_weight += delta.weight;
        let answers = next.responses.iter_mut().zip(questions).zip(&delta.responses);
        for ((stats, question), answer) in answers {
            let Some(expanded) = *answer else {
                continue;
            };
            let collapsed = question.collapsed_of(expanded);
            for group in [&mut stats.expanded[expanded], &mut stats.collapsed[collapsed]] {
                group.total_count += 1;
                group.total_weight += delta.weight;
            }
        }
    }
    if !deltas.is_empty() {
        check_integrity(&next)?;
    }
    next.refresh_proportions();
    let diff = SplitDiff::between(split, &next);
    Ok((next, diff))
}

/// Rebuild an aggregate split from its basis splits.
///
/// `basis` must hold exactly the splits named by
/// `split.basis_split_indices`, already updated. Group proportions are
/// combined as `Σ (basis weight / aggregate weight) · basis proportion`,
/// which equals the aggregate group weight over the aggregate weight.
pub fn propagate(split: &Split, basis: &[&Split]) -> Result<(Split, SplitDiff)> {
    let mut next = split.clone();
    next.total_count = basis.iter().map(|b| b.total_count).sum();
    next.total_weight = basis.iter().map(|b| b.total_weight).sum();
    check_integrity(&next)?;

    let total = next.total_weight;
    for (r, stats) in next.responses.iter_mut().enumerate() {
        for (g, group) in stats.expanded.iter_mut().enumerate() {
            group.total_count = basis.iter().map(|b| b.responses[r].expanded[g].total_count).sum();
            group.total_weight = basis
                .iter()
                .map(|b| b.responses[r].expanded[g].total_weight)
                .sum();
            group.proportion = weighted_proportion(basis, total, |b| {
                b.responses[r].expanded[g].proportion
            });
        }
        for (g, group) in stats.collapsed.iter_mut().enumerate() {
            group.total_count = basis
                .iter()
                .map(|b| b.responses[r].collapsed[g].total_count)
                .sum();
            group.total_weight = basis
                .iter()
                .map(|b| b.responses[r].collapsed[g].total_weight)
                .sum();
            group.proportion = weighted_proportion(basis, total, |b| {
                b.responses[r].collapsed[g].proportion
            });
        }
    }
    let diff = SplitDiff::between(split, &next);
    Ok((next, diff))
}

fn weighted_proportion(basis: &[&Split], total: f64, proportion: impl Fn(&Split) -> f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    basis
        .iter()
        .filter(|b| b.total_weight != 0.0)
        .map(|b| (b.total_weight / total) * proportion(b))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::Lattice;
    use splitviz_core::{Question, ResponseGroup};

    fn questions() -> Vec<ResponseQuestion> {
        vec![
            ResponseQuestion::new(
                Question::new("party", "b", ""),
                vec![
                    ResponseGroup::new("strong left", [1]),
                    ResponseGroup::new("lean left", [2]),
                    ResponseGroup::new("lean right", [3]),
                    ResponseGroup::new("strong right", [4]),
                ],
                vec![
                    ResponseGroup::new("left", [1, 2]),
                    ResponseGroup::new("right", [3, 4]),
                ],
            )
            .expect("valid"),
        ]
    }

    fn delta(weight: f64, expanded: usize) -> RespondentDelta {
        RespondentDelta {
            weight,
            responses: vec![Some(expanded)],
        }
    }

    #[test]
    fn update_increments_expanded_and_containing_collapsed() {
        let qs = questions();
        let lattice = Lattice::from_radices(vec![2], &qs);
        let split = &lattice.splits()[0];

        let (next, diff) = update(split, &[delta(1.0, 1), delta(3.0, 2)], &qs).expect("ok");
        assert_eq!(next.total_count, 2);
        assert_eq!(next.total_weight, 4.0);
        let stats = &next.responses[0];
        assert_eq!(stats.expanded[1].total_count, 1);
        assert_eq!(stats.expanded[2].total_weight, 3.0);
        assert_eq!(stats.collapsed[0].total_weight, 1.0);
        assert_eq!(stats.collapsed[1].total_weight, 3.0);
        assert_eq!(stats.collapsed[1].proportion, 0.75);
        assert_eq!(diff.total_count, 2);
        assert_eq!(diff.responses[0].collapsed[1].proportion, 0.75);
    }

    #[test]
    fn update_does_not_mutate_input() {
        let qs = questions();
        let lattice = Lattice::from_radices(vec![1], &qs);
        let before = lattice.splits()[0].clone();
        let _ = update(&before, &[delta(1.0, 0)], &qs).expect("ok");
        assert_eq!(before, lattice.splits()[0]);
    }

    #[test]
    fn unanswered_response_counts_toward_split_total_only() {
        let qs = questions();
        let lattice = Lattice::from_radices(vec![1], &qs);
        let unanswered = RespondentDelta {
            weight: 1.0,
            responses: vec![None],
        };
        let (next, _) = update(&lattice.splits()[0], &[delta(1.0, 0), unanswered], &qs)
            .expect("ok");
        assert_eq!(next.total_count, 2);
        assert_eq!(next.responses[0].expanded[0].proportion, 0.5);
        let sum: f64 = next.responses[0]
            .proportions(splitviz_core::Granularity::Expanded)
            .iter()
            .sum();
        assert!(sum <= 1.0);
    }

    #[test]
    fn empty_update_is_zero_diff() {
        let qs = questions();
        let lattice = Lattice::from_radices(vec![2], &qs);
        let split = &lattice.splits()[0];
        let (next, diff) = update(split, &[], &qs).expect("ok");
        assert_eq!(&next, split);
        assert!(diff.is_zero());
    }

    #[test]
    fn negative_weight_is_an_integrity_error() {
        let qs = questions();
        let lattice = Lattice::from_radices(vec![1], &qs);
        let err = update(&lattice.splits()[0], &[delta(-1.0, 0)], &qs).unwrap_err();
        assert!(err.is_integrity());
    }

    #[test]
    fn zero_weight_is_an_integrity_error() {
        let qs = questions();
        let lattice = Lattice::from_radices(vec![1], &qs);
        let err = update(&lattice.splits()[0], &[delta(0.0, 0)], &qs).unwrap_err();
        assert!(matches!(
            err,
            StatsError::RespondentWeight {
                split_index: 0,
                weight: 0.0
            }
        ));
    }

    #[test]
    fn negative_weight_is_rejected_even_when_total_stays_positive() {
        let qs = questions();
        let lattice = Lattice::from_radices(vec![1], &qs);
        let err = update(&lattice.splits()[0], &[delta(3.0, 0), delta(-1.0, 3)], &qs)
            .unwrap_err();
        assert!(err.is_integrity());
        assert!(matches!(err, StatsError::RespondentWeight { weight, .. } if weight == -1.0));
    }

    #[test]
    fn nan_weight_is_rejected() {
        let qs = questions();
        let lattice = Lattice::from_radices(vec![1], &qs);
        let err = update(&lattice.splits()[0], &[delta(f64::NAN, 0)], &qs).unwrap_err();
        assert!(err.is_integrity());
    }

    #[test]
    fn propagate_matches_direct_weight_ratio() {
        let qs = questions();
        let lattice = Lattice::from_radices(vec![2], &qs);
        let (a, _) = update(&lattice.splits()[0], &[delta(1.0, 0), delta(1.0, 3)], &qs)
            .expect("ok");
        let (b, _) = update(
            &lattice.splits()[1],
            &[delta(2.0, 0), delta(0.5, 1), delta(0.5, 2)],
            &qs,
        )
        .expect("ok");

        let all = &lattice.splits()[2];
        assert_eq!(all.basis_split_indices, vec![0, 1]);
        let (agg, diff) = propagate(all, &[&a, &b]).expect("ok");

        assert_eq!(agg.total_count, 5);
        assert!((agg.total_weight - 5.0).abs() < 1e-12);
        for (g, group) in agg.responses[0].expanded.iter().enumerate() {
            let direct = (a.responses[0].expanded[g].total_weight
                + b.responses[0].expanded[g].total_weight)
                / agg.total_weight;
            assert!((group.proportion - direct).abs() < 1e-12);
        }
        assert!((agg.responses[0].collapsed[0].proportion - 3.5 / 5.0).abs() < 1e-12);
        assert_eq!(diff.total_count, 5);
    }

    #[test]
    fn propagate_with_empty_basis_is_zero_diff() {
        let qs = questions();
        let lattice = Lattice::from_radices(vec![2], &qs);
        let basis: Vec<&Split> = lattice.splits()[..2].iter().collect();
        let (agg, diff) = propagate(&lattice.splits()[2], &basis).expect("ok");
        assert!(diff.is_zero());
        assert_eq!(agg, lattice.splits()[2]);
    }
}
