use std::path::Path;

use candle_core::{Device, IndexOp, Tensor};
use tracing::{debug, info, warn};

use crate::constants::{MODEL_CONFIG_FILE, MODEL_WEIGHTS_FILE};

use super::bert::CrossEncoderModel;
use super::encoding::{PairEncoder, ScoringPair};
use super::error::ModelError;

/// Raw output of one batched forward call.
#[derive(Debug)]
pub struct BatchLogits {
    /// Relevance logits, one per pair. Expected shapes are `[N]` or `[N, 1]`;
    /// a singleton batch may arrive squeezed to a scalar.
    pub logits: Tensor,
    /// Input units consumed (tokens for model backends).
    pub consumed_tokens: usize,
}

/// Something that can score a batch of pairs in a single call.
///
/// Implementations must not be invoked per pair; the scorer hands them the
/// whole batch at once and never calls them for an empty batch.
pub trait ScoringBackend: Send + Sync {
    fn infer(&self, pairs: &[ScoringPair<'_>]) -> Result<BatchLogits, ModelError>;

    fn device(&self) -> &Device;

    /// `false` for backends that score without model weights.
    fn is_model_loaded(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str;
}

/// Cross-encoder backed by a BERT-family model directory.
pub struct CrossEncoderBackend {
    model: CrossEncoderModel,
    encoder: PairEncoder,
    device: Device,
}

impl std::fmt::Debug for CrossEncoderBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossEncoderBackend")
            .field("device", &format!("{:?}", self.device))
            .field("encoder", &self.encoder)
            .field("num_labels", &self.model.num_labels())
            .finish()
    }
}

impl CrossEncoderBackend {
    /// Loads model weights and tokenizer from `model_dir` onto `device`.
    pub fn load(model_dir: &Path, max_seq_len: usize, device: Device) -> Result<Self, ModelError> {
        if !model_dir.exists() {
            return Err(ModelError::ModelNotFound {
                path: model_dir.to_path_buf(),
            });
        }

        for required in [MODEL_CONFIG_FILE, MODEL_WEIGHTS_FILE] {
            if !model_dir.join(required).exists() {
                return Err(ModelError::ModelLoadFailed {
                    reason: format!("Missing {} in {}", required, model_dir.display()),
                });
            }
        }

        info!(
            model_path = %model_dir.display(),
            max_seq_len,
            ?device,
            "Loading cross-encoder model"
        );

        let model =
            CrossEncoderModel::load(model_dir, &device).map_err(|e| ModelError::ModelLoadFailed {
                reason: format!("Failed to load cross-encoder weights: {}", e),
            })?;
        let max_seq_len = clamp_seq_len(max_seq_len, model.max_sequence_length());
        if max_seq_len == 0 {
            return Err(ModelError::InvalidConfig {
                reason: "model config leaves no usable positions".to_string(),
            });
        }
        let encoder = PairEncoder::from_model_dir(model_dir, max_seq_len)?;

        info!(
            num_labels = model.num_labels(),
            xlm_roberta = model.is_xlm_roberta(),
            max_seq_len,
            "Cross-encoder model loaded successfully"
        );

        Ok(Self {
            model,
            encoder,
            device,
        })
    }

    /// Effective truncation length after clamping to the model's positions.
    pub fn max_seq_len(&self) -> usize {
        self.encoder.max_seq_len()
    }
}

/// Caps `requested` at what the position table can address.
fn clamp_seq_len(requested: usize, model_limit: usize) -> usize {
    if requested > model_limit {
        warn!(
            requested,
            model_limit, "max_seq_len exceeds model position embeddings, clamping"
        );
        model_limit
    } else {
        requested
    }
}

impl ScoringBackend for CrossEncoderBackend {
    fn infer(&self, pairs: &[ScoringPair<'_>]) -> Result<BatchLogits, ModelError> {
        let batch = self.encoder.encode(pairs, &self.device)?;

        debug!(
            batch_size = pairs.len(),
            tokens = batch.token_count,
            "Running cross-encoder forward pass"
        );

        let logits = self
            .model
            .forward(&batch.input_ids, &batch.type_ids, &batch.attention_mask)
            .map_err(|e| ModelError::InferenceFailed {
                reason: e.to_string(),
            })?;

        // Multi-label heads put the "relevant" logit in the last column.
        let labels = self.model.num_labels();
        let logits = if labels > 1 {
            logits.i((.., labels - 1))?
        } else {
            logits
        };

        Ok(BatchLogits {
            logits,
            consumed_tokens: batch.token_count,
        })
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn name(&self) -> &'static str {
        "cross-encoder"
    }
}
