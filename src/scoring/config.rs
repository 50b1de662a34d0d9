use std::path::PathBuf;

use crate::constants::{DEFAULT_MAX_SEQ_LEN, DEFAULT_THRESHOLD};

use super::types::ScoreActivation;

/// Scorer settings. `model_path: None` selects the model-free lexical backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ScorerConfig {
    pub model_path: Option<PathBuf>,

    pub threshold: f32,

    pub max_seq_len: usize,

    pub activation: ScoreActivation,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            threshold: DEFAULT_THRESHOLD,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            activation: ScoreActivation::Raw,
        }
    }
}

impl ScorerConfig {
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: Some(model_path.into()),
            ..Self::default()
        }
    }

    pub fn stub() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_seq_len(mut self, max_seq_len: usize) -> Self {
        self.max_seq_len = max_seq_len;
        self
    }

    pub fn with_activation(mut self, activation: ScoreActivation) -> Self {
        self.activation = activation;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.threshold.is_finite() {
            return Err(format!("threshold must be finite, got {}", self.threshold));
        }

        if self.activation == ScoreActivation::Sigmoid && !(0.0..=1.0).contains(&self.threshold) {
            return Err(format!(
                "threshold must be between 0.0 and 1.0 with sigmoid activation, got {}",
                self.threshold
            ));
        }

        if self.max_seq_len == 0 {
            return Err("max_seq_len must be greater than 0".to_string());
        }

        if let Some(ref path) = self.model_path
            && path.as_os_str().is_empty()
        {
            return Err("model_path cannot be empty when provided".to_string());
        }

        Ok(())
    }
}
