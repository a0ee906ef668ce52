//! Respondent validation.
//!
//! A respondent counts iff:
//!
//! 1. every grouping question has an answer inside one of its groups;
//! 2. the weighting question (if configured) has a finite numeric answer;
//! 3. at least one response question has an answer inside one of its
//!    expanded groups.
//!
//! Rejection is not an error. Rejected respondents are tallied by the
//! caller and otherwise ignored.

use std::fmt;

use splitviz_core::{Respondent, SessionConfig};

/// Weight used when no weighting question is configured.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// A respondent that passed validation, reduced to what aggregation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRespondent {
    pub weight: f64,
    /// Group index per grouping question.
    pub assignment: Vec<usize>,
    /// Expanded group index per response question, if answered.
    pub responses: Vec<Option<usize>>,
}

/// Why a respondent was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No answer to the grouping question at this position.
    MissingGrouping { position: usize },
    /// Answer outside every group of the grouping question at this position.
    UngroupedAnswer { position: usize },
    /// Weighting question unanswered or not a finite number.
    MissingWeight,
    /// No response question answered inside an expanded group.
    NoTrackedResponse,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingGrouping { position } => {
                write!(f, "missing answer to grouping question #{position}")
            }
            Self::UngroupedAnswer { position } => {
                write!(f, "answer to grouping question #{position} is in no group")
            }
            Self::MissingWeight => write!(f, "missing or non-numeric weight"),
            Self::NoTrackedResponse => write!(f, "no tracked response question answered"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Valid(ValidRespondent),
    Invalid(Rejection),
}

impl Verdict {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The respondent's weight, if valid.
    #[must_use]
    pub fn weight(&self) -> Option<f64> {
        match self {
            Self::Valid(v) => Some(v.weight),
            Self::Invalid(_) => None,
        }
    }
}

/// Checks respondents against one session configuration.
#[derive(Debug, Clone)]
pub struct Validator {
    config: SessionConfig,
}

impl Validator {
    /// The configuration must already be validated.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn validate(&self, respondent: &Respondent) -> Verdict {
        let mut assignment = Vec::with_capacity(self.config.grouping_questions.len());
        for (position, grouping) in self.config.grouping_questions.iter().enumerate() {
            let Some(value) = respondent.answer(&grouping.question) else {
                return Verdict::Invalid(Rejection::MissingGrouping { position });
            };
            match value.as_code().and_then(|code| grouping.group_of(code)) {
                Some(group) => assignment.push(group),
                None => return Verdict::Invalid(Rejection::UngroupedAnswer { position }),
            }
        }

        let weight = match &self.config.weight_question {
            Some(question) => match respondent.answer(question).and_then(|v| v.as_number()) {
                Some(w) => w,
                None => return Verdict::Invalid(Rejection::MissingWeight),
            },
            None => DEFAULT_WEIGHT,
        };

        let responses: Vec<Option<usize>> = self
            .config
            .response_questions
            .iter()
            .map(|rq| {
                respondent
                    .answer(&rq.question)
                    .and_then(|v| v.as_code())
                    .and_then(|code| rq.expanded_group_of(code))
            })
            .collect();
        if responses.iter().all(Option::is_none) {
            return Verdict::Invalid(Rejection::NoTrackedResponse);
        }

        Verdict::Valid(ValidRespondent {
            weight,
            assignment,
            responses,
        })
    }
}
