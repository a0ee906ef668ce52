//! Respondent records as delivered by the upstream parser.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::question::Question;

/// A raw answer value.
///
/// Survey exports mix integer codes, decimal weights and stringly-typed
/// numbers; all three are accepted and interpreted on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Code(i64),
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Interpret as an integer response code.
    #[must_use]
    pub fn as_code(&self) -> Option<i64> {
        match self {
            Self::Code(code) => Some(*code),
            Self::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(*n as i64),
            Self::Number(_) => None,
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Interpret as a finite number.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Self::Code(code) => *code as f64,
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().ok()?,
        };
        n.is_finite().then_some(n)
    }
}

impl From<i64> for RawValue {
    fn from(code: i64) -> Self {
        Self::Code(code)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// One respondent's answers, keyed by question.
///
/// A question that is absent and a question answered with `None` are the
/// same thing: no answer.
#[derive(Debug, Clone, Default)]
pub struct Respondent {
    pub respondent_id: String,
    answers: FxHashMap<Question, RawValue>,
}

impl Respondent {
    pub fn new(
        respondent_id: impl Into<String>,
        responses: impl IntoIterator<Item = (Question, Option<RawValue>)>,
    ) -> Self {
        let answers = responses
            .into_iter()
            .filter_map(|(q, v)| v.map(|v| (q, v)))
            .collect();
        Self {
            respondent_id: respondent_id.into(),
            answers,
        }
    }

    /// A respondent with no answers yet.
    pub fn with_id(respondent_id: impl Into<String>) -> Self {
        Self {
            respondent_id: respondent_id.into(),
            answers: FxHashMap::default(),
        }
    }

    /// Builder-style answer insertion.
    #[must_use]
    pub fn with_answer(mut self, question: Question, value: impl Into<RawValue>) -> Self {
        self.answers.insert(question, value.into());
        self
    }

    #[must_use]
    pub fn answer(&self, question: &Question) -> Option<&RawValue> {
        self.answers.get(question)
    }

    #[must_use]
    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }
}
