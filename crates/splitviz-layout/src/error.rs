use splitviz_core::{ConfigError, Question};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LayoutError>;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{question} is not a response question of this session")]
    UnknownResponseQuestion { question: Question },
}
