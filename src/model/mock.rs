//! Scripted scoring backend for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use candle_core::{Device, Tensor};

use super::backend::{BatchLogits, ScoringBackend};
use super::encoding::ScoringPair;
use super::error::ModelError;

/// Output layout the mock produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockLayout {
    /// `[N]`.
    #[default]
    Flat,
    /// `[N, 1]`, like a single-label classifier head.
    Column,
    /// `[N]`, but a singleton batch is squeezed to a rank-0 scalar.
    SqueezeSingleton,
}

/// Backend whose score for a pair is the document's character count,
/// unless a fixed output has been scripted.
#[derive(Debug, Clone)]
pub struct MockBackend {
    device: Device,
    layout: MockLayout,
    fixed_output: Option<Vec<f32>>,
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
    pairs_seen: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            device: Device::Cpu,
            layout: MockLayout::Flat,
            fixed_output: None,
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
            pairs_seen: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_layout(mut self, layout: MockLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Returns `output` for every batch regardless of its size.
    pub fn with_fixed_output(mut self, output: Vec<f32>) -> Self {
        self.fixed_output = Some(output);
        self
    }

    /// Fails every call with an inference error.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Shared counter of `infer` invocations (survives moving the backend).
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Shared counter of pairs passed to `infer` across all calls.
    pub fn pair_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.pairs_seen)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ScoringBackend for MockBackend {
    fn infer(&self, pairs: &[ScoringPair<'_>]) -> Result<BatchLogits, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pairs_seen.fetch_add(pairs.len(), Ordering::SeqCst);

        if let Some(reason) = &self.failure {
            return Err(ModelError::InferenceFailed {
                reason: reason.clone(),
            });
        }

        let scores: Vec<f32> = match &self.fixed_output {
            Some(output) => output.clone(),
            None => pairs
                .iter()
                .map(|pair| pair.document.chars().count() as f32)
                .collect(),
        };
        let len = scores.len();

        let logits = match self.layout {
            MockLayout::Flat => Tensor::from_vec(scores, len, &self.device)?,
            MockLayout::Column => Tensor::from_vec(scores, (len, 1), &self.device)?,
            MockLayout::SqueezeSingleton if len == 1 => Tensor::new(scores[0], &self.device)?,
            MockLayout::SqueezeSingleton => Tensor::from_vec(scores, len, &self.device)?,
        };

        Ok(BatchLogits {
            logits,
            consumed_tokens: pairs.len(),
        })
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn is_model_loaded(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
