use splitviz_core::ConfigError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatsError>;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A split ended up with non-positive weight after valid respondents
    /// were aggregated into it. Upstream let a zero or negative weight
    /// through; the batch is rejected as a whole.
    #[error(
        "data integrity violation: split {split_index} has total weight {total_weight} after aggregating {total_count} respondents"
    )]
    Integrity {
        split_index: usize,
        total_weight: f64,
        total_count: u64,
    },

    /// A respondent with a zero, negative or NaN weight reached a basis
    /// split.
    #[error("data integrity violation: split {split_index} received respondent weight {weight}")]
    RespondentWeight { split_index: usize, weight: f64 },
}

impl StatsError {
    #[must_use]
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            Self::Integrity { .. } | Self::RespondentWeight { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::StatsError;

    #[test]
    fn integrity_error_is_labelled() {
        let error = StatsError::Integrity {
            split_index: 4,
            total_weight: -1.5,
            total_count: 2,
        };
        assert!(error.is_integrity());
        let message = error.to_string();
        assert!(message.starts_with("data integrity violation"));
        assert!(message.contains("split 4"));
    }

    #[test]
    fn respondent_weight_error_is_integrity() {
        let error = StatsError::RespondentWeight {
            split_index: 0,
            weight: -1.0,
        };
        assert!(error.is_integrity());
        assert!(error.to_string().contains("weight -1"));
    }
}
