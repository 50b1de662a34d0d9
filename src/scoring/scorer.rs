use candle_core::{DType, Tensor};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::device::{DeviceChoice, DeviceSelector};
use crate::model::{CrossEncoderBackend, LexicalBackend, ScoringBackend, ScoringPair};

use super::config::ScorerConfig;
use super::error::ScoringError;
use super::types::{RankedDocument, RerankOutput, ScoreSequence};

/// Batched cross-encoder scorer bound to one device for its lifetime.
pub struct BatchScorer {
    backend: Box<dyn ScoringBackend>,
    device: DeviceChoice,
    config: ScorerConfig,
}

impl std::fmt::Debug for BatchScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScorer")
            .field("backend", &self.backend.name())
            .field("device", &self.device)
            .field("config", &self.config)
            .finish()
    }
}

impl BatchScorer {
    /// Selects a device once, then loads the backend onto it.
    ///
    /// If the runtime refuses the selected accelerator the scorer runs on the
    /// CPU and [`device_choice`](Self::device_choice) reports that.
    pub fn load(config: ScorerConfig, selector: &DeviceSelector) -> Result<Self, ScoringError> {
        config
            .validate()
            .map_err(|reason| ScoringError::InvalidConfig { reason })?;

        let (device, candle_device) = selector.select().open();
        debug!(%device, "Selected compute device for scorer");

        let backend: Box<dyn ScoringBackend> = match &config.model_path {
            Some(model_path) => Box::new(CrossEncoderBackend::load(
                model_path,
                config.max_seq_len,
                candle_device,
            )?),
            None => {
                info!("No cross-encoder model path configured, operating in stub mode");
                Box::new(LexicalBackend::new(candle_device))
            }
        };

        info!(
            backend = backend.name(),
            %device,
            activation = %config.activation,
            threshold = config.threshold,
            "Scorer ready"
        );

        Ok(Self {
            backend,
            device,
            config,
        })
    }

    /// Resolves the model from `config` and loads it with its device selector.
    pub fn from_engine_config(config: &EngineConfig) -> Result<Self, ScoringError> {
        let scorer_config = config.scorer_config()?;
        Self::load(scorer_config, &config.device_selector())
    }

    /// Lexical scorer on whatever device the system probe selects.
    pub fn stub() -> Result<Self, ScoringError> {
        Self::load(ScorerConfig::stub(), &DeviceSelector::system())
    }

    /// Wraps an already-constructed backend.
    pub fn with_backend<B: ScoringBackend + 'static>(
        backend: B,
        device: DeviceChoice,
        config: ScorerConfig,
    ) -> Result<Self, ScoringError> {
        config
            .validate()
            .map_err(|reason| ScoringError::InvalidConfig { reason })?;

        Ok(Self {
            backend: Box::new(backend),
            device,
            config,
        })
    }

    pub fn device_choice(&self) -> DeviceChoice {
        self.device
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    pub fn threshold(&self) -> f32 {
        self.config.threshold
    }

    pub fn is_model_loaded(&self) -> bool {
        self.backend.is_model_loaded()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn is_hit(&self, score: f32) -> bool {
        score > self.config.threshold
    }

    /// Scores every pair in one backend call; `result[i]` belongs to `pairs[i]`.
    pub fn score(&self, pairs: &[ScoringPair<'_>]) -> Result<ScoreSequence, ScoringError> {
        self.score_batch(pairs).map(|output| output.scores)
    }

    /// Scores `query` against each document, in document order.
    pub fn score_documents(
        &self,
        query: &str,
        documents: &[&str],
    ) -> Result<RerankOutput, ScoringError> {
        let pairs = ScoringPair::for_documents(query, documents);
        self.score_batch(&pairs)
    }

    /// Documents sorted by descending score; ties keep input order.
    pub fn rerank<'a>(
        &self,
        query: &str,
        documents: &[&'a str],
    ) -> Result<Vec<RankedDocument<'a>>, ScoringError> {
        let output = self.score_documents(query, documents)?;

        let mut ranked: Vec<RankedDocument<'a>> = documents
            .iter()
            .zip(output.scores.iter())
            .enumerate()
            .map(|(index, (&document, &score))| RankedDocument {
                index,
                document,
                score,
            })
            .collect();

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!(
            num_documents = documents.len(),
            top_score = ranked.first().map(|r| r.score),
            "Reranking complete"
        );

        Ok(ranked)
    }

    pub fn rerank_with_threshold<'a>(
        &self,
        query: &str,
        documents: &[&'a str],
    ) -> Result<Vec<RankedDocument<'a>>, ScoringError> {
        let ranked = self.rerank(query, documents)?;
        let threshold = self.config.threshold;

        let filtered: Vec<_> = ranked
            .into_iter()
            .filter(|r| r.exceeds_threshold(threshold))
            .collect();

        debug!(
            threshold,
            hits = filtered.len(),
            total = documents.len(),
            "Filtered by threshold"
        );

        Ok(filtered)
    }

    pub fn top_n<'a>(
        &self,
        query: &str,
        documents: &[&'a str],
        n: usize,
    ) -> Result<Vec<RankedDocument<'a>>, ScoringError> {
        let mut ranked = self.rerank(query, documents)?;
        ranked.truncate(n);
        Ok(ranked)
    }

    fn score_batch(&self, pairs: &[ScoringPair<'_>]) -> Result<RerankOutput, ScoringError> {
        if pairs.is_empty() {
            debug!("Empty batch, skipping inference");
            return Ok(RerankOutput {
                scores: ScoreSequence::empty(),
                consumed_tokens: 0,
            });
        }

        debug!(
            batch_size = pairs.len(),
            backend = self.backend.name(),
            device = %self.device,
            "Scoring batch"
        );

        let mut scores = ScoreSequence::zeroed(pairs.len());

        let output = self.backend.infer(pairs)?;
        let logits = normalize_logits(&output.logits, pairs.len())?;
        scores.fill(&logits)?;

        let activation = self.config.activation;
        scores.map_in_place(|logit| activation.apply(logit));

        Ok(RerankOutput {
            scores,
            consumed_tokens: output.consumed_tokens,
        })
    }
}

/// Flattens backend logits to exactly `expected` values.
///
/// A rank-0 result (a singleton batch squeezed by the backend) becomes `[1]`
/// and `[N, 1]` becomes `[N]`. Anything else is a shape error, and a NaN or
/// infinite logit fails the whole batch.
pub(crate) fn normalize_logits(logits: &Tensor, expected: usize) -> Result<Vec<f32>, ScoringError> {
    let shape_error = || ScoringError::ShapeMismatch {
        expected,
        actual: logits.dims().to_vec(),
    };

    let flat = match logits.dims() {
        [] => logits.reshape(1)?,
        [_] => logits.clone(),
        [_, 1] => logits.squeeze(1)?,
        _ => return Err(shape_error()),
    };

    let values = flat.to_dtype(DType::F32)?.to_vec1::<f32>()?;

    if values.len() != expected {
        return Err(shape_error());
    }

    if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(ScoringError::NonFiniteLogit { index, value });
    }

    Ok(values)
}
