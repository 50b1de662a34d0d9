//! Model catalog: one task classification per model identity.
//!
//! ```json
//! {
//!   "models": [
//!     { "id": "bge-reranker-v2-m3", "kind": "rerank", "path": "/models/bge-reranker-v2-m3" },
//!     { "id": "bge-m3", "kind": "embedding", "path": "/models/bge-m3" }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ConfigError;

/// Task a model is declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Rerank,
    Embedding,
    Chat,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Rerank => write!(f, "rerank"),
            ModelKind::Embedding => write!(f, "embedding"),
            ModelKind::Chat => write!(f, "chat"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    pub kind: ModelKind,
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

/// Validated set of model declarations, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    entries: HashMap<String, ModelEntry>,
}

impl ModelCatalog {
    /// Builds a catalog, rejecting any id declared more than once.
    pub fn from_entries(entries: Vec<ModelEntry>) -> Result<Self, ConfigError> {
        let mut by_id: HashMap<String, ModelEntry> = HashMap::with_capacity(entries.len());

        for entry in entries {
            if let Some(existing) = by_id.get(&entry.id) {
                if existing.kind != entry.kind {
                    return Err(ConfigError::ConflictingModelKind {
                        id: entry.id,
                        first: existing.kind,
                        second: entry.kind,
                    });
                }
                return Err(ConfigError::DuplicateModel { id: entry.id });
            }
            by_id.insert(entry.id.clone(), entry);
        }

        debug!(models = by_id.len(), "Model catalog loaded");
        Ok(Self { entries: by_id })
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(|source| ConfigError::CatalogParse { source })?;
        Self::from_entries(file.models)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn get(&self, id: &str) -> Option<&ModelEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up `id` and requires it to be declared as [`ModelKind::Rerank`].
    pub fn resolve_rerank(&self, id: &str) -> Result<&ModelEntry, ConfigError> {
        let entry = self.get(id).ok_or_else(|| ConfigError::UnknownModel { id: id.to_string() })?;

        if entry.kind != ModelKind::Rerank {
            return Err(ConfigError::WrongModelKind {
                id: id.to_string(),
                expected: ModelKind::Rerank,
                actual: entry.kind,
            });
        }

        Ok(entry)
    }
}
