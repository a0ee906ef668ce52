#![forbid(unsafe_code)]

//! Question identities and response-group partitions.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Identity triple for a survey question.
///
/// Equality, hashing and ordering all use the full triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Question {
    pub variable_name: String,
    pub battery_name: String,
    #[serde(default)]
    pub sub_battery_name: String,
}

impl Question {
    pub fn new(
        variable_name: impl Into<String>,
        battery_name: impl Into<String>,
        sub_battery_name: impl Into<String>,
    ) -> Self {
        Self {
            variable_name: variable_name.into(),
            battery_name: battery_name.into(),
            sub_battery_name: sub_battery_name.into(),
        }
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.variable_name, self.battery_name, self.sub_battery_name
        )
    }
}

/// A named bucket of raw response codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseGroup {
    pub label: String,
    pub values: BTreeSet<i64>,
}

impl ResponseGroup {
    pub fn new(label: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            label: label.into(),
            values: values.into_iter().collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, code: i64) -> bool {
        self.values.contains(&code)
    }

    #[must_use]
    pub fn is_subset_of(&self, other: &ResponseGroup) -> bool {
        self.values.is_subset(&other.values)
    }

    #[must_use]
    pub fn overlaps(&self, other: &ResponseGroup) -> bool {
        !self.values.is_disjoint(&other.values)
    }
}

/// Which partition of a response question a view or statistic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Fine-grained groups.
    Expanded,
    /// Coarse groups, each a union of expanded groups.
    Collapsed,
}

impl Granularity {
    pub const ALL: [Granularity; 2] = [Granularity::Expanded, Granularity::Collapsed];
}

/// First pair of overlapping groups, if any.
fn find_overlap(groups: &[ResponseGroup]) -> Option<(&ResponseGroup, &ResponseGroup)> {
    for (i, first) in groups.iter().enumerate() {
        for second in &groups[i + 1..] {
            if first.overlaps(second) {
                return Some((first, second));
            }
        }
    }
    None
}

/// A question used to segment respondents into splits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupingQuestion {
    pub question: Question,
    pub response_groups: Vec<ResponseGroup>,
}

impl GroupingQuestion {
    pub fn new(question: Question, response_groups: Vec<ResponseGroup>) -> Self {
        Self {
            question,
            response_groups,
        }
    }

    /// Index of the group containing `code`.
    #[must_use]
    pub fn group_of(&self, code: i64) -> Option<usize> {
        self.response_groups.iter().position(|g| g.contains(code))
    }

    /// Check the groups are non-empty and mutually exclusive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.response_groups.is_empty() {
            return Err(ConfigError::EmptyGroupingQuestion {
                question: self.question.clone(),
            });
        }
        if let Some((first, second)) = find_overlap(&self.response_groups) {
            return Err(ConfigError::OverlappingGroups {
                question: self.question.clone(),
                first: first.label.clone(),
                second: second.label.clone(),
            });
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ResponseQuestionDef {
    question: Question,
    expanded: Vec<ResponseGroup>,
    #[serde(default)]
    collapsed: Vec<ResponseGroup>,
}

impl TryFrom<ResponseQuestionDef> for ResponseQuestion {
    type Error = ConfigError;

    fn try_from(def: ResponseQuestionDef) -> Result<Self, Self::Error> {
        ResponseQuestion::new(def.question, def.expanded, def.collapsed)
    }
}

/// A question whose answer distribution is measured within every split.
///
/// Carries two parallel partitions of the same value space. Each expanded
/// group maps to exactly one collapsed group by value-set containment; the
/// mapping is computed once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ResponseQuestionDef")]
pub struct ResponseQuestion {
    pub question: Question,
    expanded: Vec<ResponseGroup>,
    collapsed: Vec<ResponseGroup>,
    #[serde(skip_serializing)]
    collapsed_of: Vec<usize>,
}

impl ResponseQuestion {
    /// Build a response question and its expanded→collapsed table.
    ///
    /// An empty `collapsed` partition defaults to a copy of `expanded`.
    pub fn new(
        question: Question,
        expanded: Vec<ResponseGroup>,
        collapsed: Vec<ResponseGroup>,
    ) -> Result<Self, ConfigError> {
        if expanded.is_empty() {
            return Err(ConfigError::EmptyResponseQuestion { question });
        }
        let collapsed = if collapsed.is_empty() {
            expanded.clone()
        } else {
            collapsed
        };
        for groups in [&expanded, &collapsed] {
            if let Some((first, second)) = find_overlap(groups) {
                return Err(ConfigError::OverlappingGroups {
                    question: question.clone(),
                    first: first.label.clone(),
                    second: second.label.clone(),
                });
            }
        }

        let mut collapsed_of = Vec::with_capacity(expanded.len());
        for group in &expanded {
            let matches: Vec<usize> = collapsed
                .iter()
                .enumerate()
                .filter(|(_, c)| group.is_subset_of(c))
                .map(|(i, _)| i)
                .collect();
            match matches.as_slice() {
                [only] => collapsed_of.push(*only),
                _ => {
                    return Err(ConfigError::CollapsedMismatch {
                        question,
                        label: group.label.clone(),
                        matches: matches.len(),
                    });
                }
            }
        }

        // Every expanded group sits inside a collapsed one, so only extra
        // collapsed codes can break the shared value set.
        let known: BTreeSet<i64> = expanded
            .iter()
            .flat_map(|g| g.values.iter().copied())
            .collect();
        if let Some(group) = collapsed.iter().find(|c| !c.values.is_subset(&known)) {
            return Err(ConfigError::CollapsedExtraValues {
                question,
                label: group.label.clone(),
                values: group.values.difference(&known).copied().collect(),
            });
        }

        Ok(Self {
            question,
            expanded,
            collapsed,
            collapsed_of,
        })
    }

    #[must_use]
    pub fn expanded(&self) -> &[ResponseGroup] {
        &self.expanded
    }

    #[must_use]
    pub fn collapsed(&self) -> &[ResponseGroup] {
        &self.collapsed
    }

    #[must_use]
    pub fn groups(&self, granularity: Granularity) -> &[ResponseGroup] {
        match granularity {
            Granularity::Expanded => &self.expanded,
            Granularity::Collapsed => &self.collapsed,
        }
    }

    /// Collapsed group index for an expanded group index.
    #[inline]
    #[must_use]
    pub fn collapsed_of(&self, expanded_index: usize) -> usize {
        self.collapsed_of[expanded_index]
    }

    /// Group index at `granularity` for an expanded group index.
    #[inline]
    #[must_use]
    pub fn project(&self, expanded_index: usize, granularity: Granularity) -> usize {
        match granularity {
            Granularity::Expanded => expanded_index,
            Granularity::Collapsed => self.collapsed_of[expanded_index],
        }
    }

    /// Expanded group containing `code`.
    #[must_use]
    pub fn expanded_group_of(&self, code: i64) -> Option<usize> {
        self.expanded.iter().position(|g| g.contains(code))
    }
}
