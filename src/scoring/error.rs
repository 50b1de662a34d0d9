use thiserror::Error;

use crate::config::ConfigError;
use crate::model::ModelError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid scorer configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("model output shape {actual:?} does not match {expected} input pairs")]
    ShapeMismatch { expected: usize, actual: Vec<usize> },

    #[error("model produced non-finite logit {value} for pair {index}")]
    NonFiniteLogit { index: usize, value: f32 },
}

impl From<candle_core::Error> for ScoringError {
    fn from(err: candle_core::Error) -> Self {
        ScoringError::Model(ModelError::from(err))
    }
}
