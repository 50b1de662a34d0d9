//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `CROSSRANK_*` environment variables.

pub mod catalog;
pub mod error;


pub use catalog::{ModelCatalog, ModelEntry, ModelKind};
pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::debug;

use crate::constants::{DEFAULT_MAX_SEQ_LEN, DEFAULT_THRESHOLD};
use crate::device::{DevicePreference, DeviceSelector};
use crate::scoring::{ScoreActivation, ScorerConfig};

/// Engine configuration loaded from environment variables.
///
/// Use [`EngineConfig::from_env`] to read `CROSSRANK_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Cross-encoder model directory. Unset means stub (lexical) mode.
    pub model_path: Option<PathBuf>,

    /// Model id to resolve through [`catalog_path`](Self::catalog_path).
    /// Takes precedence over `model_path`.
    pub model_id: Option<String>,

    /// JSON model catalog (see [`catalog`]).
    pub catalog_path: Option<PathBuf>,

    /// Device override. Default: `auto`.
    pub device: DevicePreference,

    /// Tokenizer truncation length. Default: `512`.
    pub max_seq_len: usize,

    /// Hit threshold. Default: `0.70`.
    pub threshold: f32,

    /// Logit post-processing. Default: `raw`.
    pub activation: ScoreActivation,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            model_id: None,
            catalog_path: None,
            device: DevicePreference::Auto,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            threshold: DEFAULT_THRESHOLD,
            activation: ScoreActivation::Raw,
        }
    }
}

impl EngineConfig {
    const ENV_MODEL_PATH: &'static str = "CROSSRANK_MODEL_PATH";
    const ENV_MODEL_ID: &'static str = "CROSSRANK_MODEL_ID";
    const ENV_MODEL_CATALOG: &'static str = "CROSSRANK_MODEL_CATALOG";
    const ENV_DEVICE: &'static str = "CROSSRANK_DEVICE";
    const ENV_MAX_SEQ_LEN: &'static str = "CROSSRANK_MAX_SEQ_LEN";
    const ENV_THRESHOLD: &'static str = "CROSSRANK_THRESHOLD";
    const ENV_ACTIVATION: &'static str = "CROSSRANK_ACTIVATION";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let model_path = Self::parse_optional_path_from_env(Self::ENV_MODEL_PATH);
        let model_id = Self::parse_optional_string_from_env(Self::ENV_MODEL_ID);
        let catalog_path = Self::parse_optional_path_from_env(Self::ENV_MODEL_CATALOG);
        let device = Self::parse_from_env(Self::ENV_DEVICE, defaults.device)?;
        let max_seq_len = Self::parse_from_env(Self::ENV_MAX_SEQ_LEN, defaults.max_seq_len)?;
        let threshold = Self::parse_from_env(Self::ENV_THRESHOLD, defaults.threshold)?;
        let activation = Self::parse_from_env(Self::ENV_ACTIVATION, defaults.activation)?;

        Ok(Self {
            model_path,
            model_id,
            catalog_path,
            device,
            max_seq_len,
            threshold,
            activation,
        })
    }

    /// Validates paths and basic invariants (does not load the catalog).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_id.is_some() && self.catalog_path.is_none() {
            return Err(ConfigError::MissingEnvVar {
                name: Self::ENV_MODEL_CATALOG,
            });
        }

        if let Some(ref path) = self.catalog_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        if let Some(ref path) = self.model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if self.max_seq_len == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_MAX_SEQ_LEN,
                value: self.max_seq_len.to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Resolves the model location and builds the scorer settings.
    ///
    /// A configured `model_id` must be declared as a `rerank` model in the
    /// catalog; its catalog path wins over `model_path`.
    pub fn scorer_config(&self) -> Result<ScorerConfig, ConfigError> {
        let model_path = match (&self.model_id, &self.catalog_path) {
            (Some(id), Some(catalog_path)) => {
                let catalog = ModelCatalog::load(catalog_path)?;
                let entry = catalog.resolve_rerank(id)?;
                debug!(model_id = %id, path = %entry.path.display(), "Resolved model from catalog");
                Some(entry.path.clone())
            }
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar {
                    name: Self::ENV_MODEL_CATALOG,
                });
            }
            (None, _) => self.model_path.clone(),
        };

        Ok(ScorerConfig {
            model_path,
            threshold: self.threshold,
            max_seq_len: self.max_seq_len,
            activation: self.activation,
        })
    }

    /// System-probing device selector honoring [`device`](Self::device).
    pub fn device_selector(&self) -> DeviceSelector {
        DeviceSelector::system().with_preference(self.device)
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    name: var_name,
                    value: value.clone(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        Self::parse_optional_string_from_env(var_name).map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
