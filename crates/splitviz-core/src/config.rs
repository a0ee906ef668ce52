//! Session and visualization configuration.
//!
//! Both documents deserialize from JSON and are validated at construction.
//! Misconfiguration is fatal: it surfaces as a [`ConfigError`] before any
//! respondent is processed.
//!
//! # Environment
//!
//! [`VizConfig::with_env_overrides`] reads `SPLITVIZ_SAMPLE_SIZE`. A positive
//! integer switches point synthesis to a resampled set of that size; `0`,
//! `off` or `real` forces one point per respondent.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::question::{GroupingQuestion, Question, ResponseQuestion};

/// Environment variable overriding [`VizConfig::synthetic_sample_size`].
pub const SAMPLE_SIZE_ENV: &str = "SPLITVIZ_SAMPLE_SIZE";

/// Which questions segment respondents, which are measured, and how
/// respondents are weighted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    pub grouping_questions: Vec<GroupingQuestion>,
    pub response_questions: Vec<ResponseQuestion>,
    #[serde(default)]
    pub weight_question: Option<Question>,
}

impl SessionConfig {
    /// Build and validate.
    pub fn new(
        grouping_questions: Vec<GroupingQuestion>,
        response_questions: Vec<ResponseQuestion>,
        weight_question: Option<Question>,
    ) -> Result<Self> {
        let config = Self {
            grouping_questions,
            response_questions,
            weight_question,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        let keys = self
            .grouping_questions
            .iter()
            .map(|g| &g.question)
            .chain(self.response_questions.iter().map(|r| &r.question))
            .chain(self.weight_question.iter());
        for question in keys {
            if !seen.insert(question) {
                return Err(ConfigError::DuplicateQuestion {
                    question: question.clone(),
                });
            }
        }
        for grouping in &self.grouping_questions {
            grouping.validate()?;
        }
        Ok(())
    }

    /// Position of a grouping question in configuration order.
    #[must_use]
    pub fn grouping_position(&self, question: &Question) -> Option<usize> {
        self.grouping_questions
            .iter()
            .position(|g| &g.question == question)
    }

    /// Position of a response question in configuration order.
    #[must_use]
    pub fn response_position(&self, question: &Question) -> Option<usize> {
        self.response_questions
            .iter()
            .position(|r| &r.question == question)
    }

    /// Grouping-question key → position, for hot lookups.
    #[must_use]
    pub fn grouping_index(&self) -> FxHashMap<Question, usize> {
        self.grouping_questions
            .iter()
            .enumerate()
            .map(|(i, g)| (g.question.clone(), i))
            .collect()
    }
}

fn default_canvas_width() -> f64 {
    960.0
}

fn default_canvas_height() -> f64 {
    540.0
}

fn default_base_segment_width() -> f64 {
    8.0
}

fn default_response_gap() -> f64 {
    4.0
}

fn default_group_gap() -> f64 {
    16.0
}

fn default_point_size() -> f64 {
    4.0
}

/// Canvas geometry and axis assignment for the dot-chart layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VizConfig {
    #[serde(default)]
    pub grouping_questions_horizontal: Vec<Question>,
    #[serde(default)]
    pub grouping_questions_vertical: Vec<Question>,
    #[serde(default = "default_canvas_width")]
    pub canvas_width: f64,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: f64,
    /// Width of a segment holding no points.
    #[serde(default = "default_base_segment_width")]
    pub base_segment_width: f64,
    /// Horizontal gap between adjacent segments in one cell.
    #[serde(default = "default_response_gap")]
    pub response_gap: f64,
    #[serde(default = "default_group_gap")]
    pub group_gap_horizontal: f64,
    #[serde(default = "default_group_gap")]
    pub group_gap_vertical: f64,
    /// Pitch of one point along both axes.
    #[serde(default = "default_point_size")]
    pub point_size: f64,
    /// `Some(n)` resamples each basis split to `n` points.
    #[serde(default)]
    pub synthetic_sample_size: Option<u32>,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            grouping_questions_horizontal: Vec::new(),
            grouping_questions_vertical: Vec::new(),
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            base_segment_width: default_base_segment_width(),
            response_gap: default_response_gap(),
            group_gap_horizontal: default_group_gap(),
            group_gap_vertical: default_group_gap(),
            point_size: default_point_size(),
            synthetic_sample_size: None,
        }
    }
}

impl VizConfig {
    /// Parse a JSON document. Validation against a session happens in
    /// [`VizConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply `SPLITVIZ_SAMPLE_SIZE` if set.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        let raw = std::env::var(SAMPLE_SIZE_ENV).ok();
        self.with_sample_size_override(raw.as_deref())
    }

    /// Apply a sample-size override string. Unparseable values are ignored.
    #[must_use]
    pub fn with_sample_size_override(mut self, raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return self;
        };
        let raw = raw.trim().to_ascii_lowercase();
        match raw.as_str() {
            "0" | "off" | "real" => self.synthetic_sample_size = None,
            other => match other.parse::<u32>() {
                Ok(n) => self.synthetic_sample_size = Some(n),
                Err(_) => {
                    tracing::warn!(
                        target: "splitviz.config",
                        value = %other,
                        "ignoring unparseable SPLITVIZ_SAMPLE_SIZE"
                    );
                }
            },
        }
        self
    }

    /// Check geometry parameters and axis assignment against `session`.
    pub fn validate(&self, session: &SessionConfig) -> Result<()> {
        for (name, value) in [
            ("canvas_width", self.canvas_width),
            ("canvas_height", self.canvas_height),
            ("point_size", self.point_size),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invalid(name, format!("{value} must be positive")));
            }
        }
        for (name, value) in [
            ("base_segment_width", self.base_segment_width),
            ("response_gap", self.response_gap),
            ("group_gap_horizontal", self.group_gap_horizontal),
            ("group_gap_vertical", self.group_gap_vertical),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::invalid(
                    name,
                    format!("{value} must be non-negative"),
                ));
            }
        }

        let mut seen = FxHashSet::default();
        for question in &self.grouping_questions_horizontal {
            if session.grouping_position(question).is_none() {
                return Err(ConfigError::UnknownQuestion {
                    question: question.clone(),
                });
            }
            if !seen.insert(question) {
                return Err(ConfigError::DuplicateQuestion {
                    question: question.clone(),
                });
            }
        }
        let mut seen_vertical = FxHashSet::default();
        for question in &self.grouping_questions_vertical {
            if session.grouping_position(question).is_none() {
                return Err(ConfigError::UnknownQuestion {
                    question: question.clone(),
                });
            }
            if seen.contains(question) {
                return Err(ConfigError::AxisOverlap {
                    question: question.clone(),
                });
            }
            if !seen_vertical.insert(question) {
                return Err(ConfigError::DuplicateQuestion {
                    question: question.clone(),
                });
            }
        }
        Ok(())
    }
}
