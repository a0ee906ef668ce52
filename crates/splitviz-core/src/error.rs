use thiserror::Error;

use crate::question::Question;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Misconfiguration detected before any data is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("question {question} is configured more than once")]
    DuplicateQuestion { question: Question },

    #[error("question {question} is not part of the session configuration")]
    UnknownQuestion { question: Question },

    #[error("question {question} is both a horizontal and a vertical grouping question")]
    AxisOverlap { question: Question },

    #[error("grouping question {question} has no response groups")]
    EmptyGroupingQuestion { question: Question },

    #[error("response question {question} has no expanded response groups")]
    EmptyResponseQuestion { question: Question },

    #[error(
        "expanded group {label:?} of {question} is contained in {matches} collapsed groups (expected exactly 1)"
    )]
    CollapsedMismatch {
        question: Question,
        label: String,
        matches: usize,
    },

    #[error("collapsed group {label:?} of {question} holds codes {values:?} that no expanded group has")]
    CollapsedExtraValues {
        question: Question,
        label: String,
        values: Vec<i64>,
    },

    #[error("response groups {first:?} and {second:?} of {question} overlap")]
    OverlappingGroups {
        question: Question,
        first: String,
        second: String,
    },

    #[error("invalid visualization parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },
}

impl ConfigError {
    #[must_use]
    pub fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ConfigError;
    use crate::question::Question;

    #[test]
    fn invalid_constructor_names_parameter() {
        let error = ConfigError::invalid("canvas_width", "must be positive");
        assert_eq!(
            error.to_string(),
            "invalid visualization parameter canvas_width: must be positive"
        );
    }

    #[test]
    fn axis_overlap_mentions_question_key() {
        let error = ConfigError::AxisOverlap {
            question: Question::new("age", "demo", ""),
        };
        assert!(error.to_string().contains("age/demo/"));
    }
}
