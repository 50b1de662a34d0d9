//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use super::catalog::ModelKind;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A required environment variable was not set.
    ///
    /// Raised when `CROSSRANK_MODEL_ID` is set without `CROSSRANK_MODEL_CATALOG`.
    #[error("missing required environment variable: {name}")]
    MissingEnvVar { name: &'static str },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("failed to read model catalog {path}: {source}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model catalog: {source}")]
    CatalogParse {
        #[source]
        source: serde_json::Error,
    },

    /// The same model id appears twice with the same kind.
    #[error("model '{id}' is declared more than once")]
    DuplicateModel { id: String },

    /// The same model id is declared for two different tasks.
    #[error("model '{id}' is declared as both {first} and {second}")]
    ConflictingModelKind {
        id: String,
        first: ModelKind,
        second: ModelKind,
    },

    #[error("model '{id}' is not declared in the catalog")]
    UnknownModel { id: String },

    /// The model exists but is classified for a different task.
    #[error("model '{id}' is a {actual} model, expected {expected}")]
    WrongModelKind {
        id: String,
        expected: ModelKind,
        actual: ModelKind,
    },
}
