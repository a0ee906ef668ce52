//! View enumeration.
//!
//! A view is one choice of active horizontal questions, active vertical
//! questions and a granularity. Questions are referenced by their position
//! in the session's grouping-question list.

use std::fmt;

use serde::{Deserialize, Serialize};
use splitviz_core::{ConfigError, Granularity, Question, SessionConfig, VizConfig};

/// Identifies one view of a response question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewKey {
    /// Active horizontal grouping questions (session positions), in axis
    /// order.
    pub horizontal: Vec<usize>,
    /// Active vertical grouping questions, in axis order.
    pub vertical: Vec<usize>,
    pub granularity: Granularity,
}

impl ViewKey {
    #[must_use]
    pub fn new(horizontal: Vec<usize>, vertical: Vec<usize>, granularity: Granularity) -> Self {
        Self {
            horizontal,
            vertical,
            granularity,
        }
    }

    /// The view with no active questions: a single cell over all
    /// respondents.
    #[must_use]
    pub fn overall(granularity: Granularity) -> Self {
        Self::new(Vec::new(), Vec::new(), granularity)
    }

    /// Whether `position` is active on either axis.
    #[must_use]
    pub fn is_active(&self, position: usize) -> bool {
        self.horizontal.contains(&position) || self.vertical.contains(&position)
    }
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "h{:?}×v{:?}/{:?}",
            self.horizontal, self.vertical, self.granularity
        )
    }
}

/// Axis assignment resolved to session positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisPlan {
    pub horizontal: Vec<usize>,
    pub vertical: Vec<usize>,
}

impl AxisPlan {
    /// Resolve the viz config's axis questions against `session`.
    pub fn resolve(session: &SessionConfig, viz: &VizConfig) -> Result<Self, ConfigError> {
        let lookup = |questions: &[Question]| {
            questions
                .iter()
                .map(|q| {
                    session
                        .grouping_position(q)
                        .ok_or_else(|| ConfigError::UnknownQuestion { question: q.clone() })
                })
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            horizontal: lookup(&viz.grouping_questions_horizontal)?,
            vertical: lookup(&viz.grouping_questions_vertical)?,
        })
    }

    /// Every view: power set of horizontal × power set of vertical ×
    /// granularity.
    ///
    /// Subsets keep axis order. Enumeration order is stable: horizontal
    /// mask, then vertical mask, then granularity.
    #[must_use]
    pub fn views(&self) -> Vec<ViewKey> {
        let hs = subsets(&self.horizontal);
        let vs = subsets(&self.vertical);
        let mut out = Vec::with_capacity(hs.len() * vs.len() * Granularity::ALL.len());
        for h in &hs {
            for v in &vs {
                for granularity in Granularity::ALL {
                    out.push(ViewKey::new(h.clone(), v.clone(), granularity));
                }
            }
        }
        out
    }
}

fn subsets(items: &[usize]) -> Vec<Vec<usize>> {
    (0u64..(1u64 << items.len()))
        .map(|mask| {
            items
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, &p)| p)
                .collect()
        })
        .collect()
}
