use std::sync::Arc;

use parking_lot::Mutex;

use crate::device::DeviceChoice;
use crate::model::ScoringPair;

use super::error::ScoringError;
use super::scorer::BatchScorer;
use super::types::{RankedDocument, RerankOutput, ScoreSequence};

/// Cloneable handle that serializes concurrent callers onto one scorer.
#[derive(Debug, Clone)]
pub struct SharedScorer {
    inner: Arc<Mutex<BatchScorer>>,
}

impl SharedScorer {
    pub fn new(scorer: BatchScorer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(scorer)),
        }
    }

    pub fn device_choice(&self) -> DeviceChoice {
        self.inner.lock().device_choice()
    }

    pub fn score(&self, pairs: &[ScoringPair<'_>]) -> Result<ScoreSequence, ScoringError> {
        self.inner.lock().score(pairs)
    }

    pub fn score_documents(
        &self,
        query: &str,
        documents: &[&str],
    ) -> Result<RerankOutput, ScoringError> {
        self.inner.lock().score_documents(query, documents)
    }

    pub fn rerank<'a>(
        &self,
        query: &str,
        documents: &[&'a str],
    ) -> Result<Vec<RankedDocument<'a>>, ScoringError> {
        self.inner.lock().rerank(query, documents)
    }

    /// Runs `f` while holding the scorer exclusively.
    pub fn with<R>(&self, f: impl FnOnce(&BatchScorer) -> R) -> R {
        f(&self.inner.lock())
    }
}
