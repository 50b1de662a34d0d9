//! Tokenizer loading and batched pair encoding.

use std::io;
use std::path::Path;

use candle_core::{Device, Tensor};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::constants::TOKENIZER_FILE;

use super::error::ModelError;

/// One (query, document) pair. Position in a batch is significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringPair<'a> {
    pub query: &'a str,
    pub document: &'a str,
}

impl<'a> ScoringPair<'a> {
    pub fn new(query: &'a str, document: &'a str) -> Self {
        Self { query, document }
    }

    /// Pairs `query` with each document, preserving document order.
    pub fn for_documents(query: &'a str, documents: &[&'a str]) -> Vec<Self> {
        documents
            .iter()
            .map(|&document| Self::new(query, document))
            .collect()
    }
}

/// Loads a tokenizer from a model directory or explicit tokenizer.json path.
pub fn load_tokenizer(model_path: &Path) -> io::Result<Tokenizer> {
    let tokenizer_path = if model_path
        .file_name()
        .is_some_and(|name| name == std::ffi::OsStr::new(TOKENIZER_FILE))
    {
        model_path.to_path_buf()
    } else if model_path.is_dir() {
        model_path.join(TOKENIZER_FILE)
    } else {
        model_path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Model path has no parent"))?
            .join(TOKENIZER_FILE)
    };

    Tokenizer::from_file(&tokenizer_path).map_err(io::Error::other)
}

/// Padded, truncated token tensors for one batch of pairs.
#[derive(Debug)]
pub struct EncodedBatch {
    pub input_ids: Tensor,
    pub type_ids: Tensor,
    pub attention_mask: Tensor,
    /// Non-padding tokens across the batch.
    pub token_count: usize,
}

/// Encodes a whole batch of pairs in one tokenizer call.
///
/// Truncation to `max_seq_len` and batch-longest padding are configured on
/// the tokenizer; callers never special-case text length.
pub struct PairEncoder {
    tokenizer: Tokenizer,
    max_seq_len: usize,
}

impl std::fmt::Debug for PairEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairEncoder")
            .field("max_seq_len", &self.max_seq_len)
            .finish()
    }
}

impl PairEncoder {
    pub fn from_model_dir(model_dir: &Path, max_seq_len: usize) -> Result<Self, ModelError> {
        let tokenizer = load_tokenizer(model_dir).map_err(|e| ModelError::ModelLoadFailed {
            reason: format!("Failed to load tokenizer: {}", e),
        })?;
        Self::new(tokenizer, max_seq_len)
    }

    pub fn new(mut tokenizer: Tokenizer, max_seq_len: usize) -> Result<Self, ModelError> {
        let truncation = TruncationParams {
            max_length: max_seq_len,
            ..Default::default()
        };
        tokenizer
            .with_truncation(Some(truncation))
            .map_err(|e| ModelError::InvalidConfig {
                reason: format!("Failed to configure truncation: {}", e),
            })?;

        let mut padding = tokenizer.get_padding().cloned().unwrap_or_else(|| {
            let mut params = PaddingParams::default();
            if let Some((token, id)) = ["[PAD]", "<pad>"]
                .iter()
                .find_map(|token| tokenizer.token_to_id(token).map(|id| (*token, id)))
            {
                params.pad_token = token.to_string();
                params.pad_id = id;
            }
            params
        });
        padding.strategy = PaddingStrategy::BatchLongest;
        tokenizer.with_padding(Some(padding));

        Ok(Self {
            tokenizer,
            max_seq_len,
        })
    }

    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    pub fn encode(
        &self,
        pairs: &[ScoringPair<'_>],
        device: &Device,
    ) -> Result<EncodedBatch, ModelError> {
        let inputs: Vec<(&str, &str)> = pairs.iter().map(|p| (p.query, p.document)).collect();

        let encodings = self.tokenizer.encode_batch(inputs, true).map_err(|e| {
            ModelError::TokenizationFailed {
                reason: e.to_string(),
            }
        })?;

        let batch = encodings.len();
        let seq_len = encodings.first().map(|e| e.len()).unwrap_or(0);

        let mut ids = Vec::with_capacity(batch * seq_len);
        let mut type_ids = Vec::with_capacity(batch * seq_len);
        let mut mask = Vec::with_capacity(batch * seq_len);

        for encoding in &encodings {
            if encoding.len() != seq_len {
                return Err(ModelError::TokenizationFailed {
                    reason: format!(
                        "ragged batch: expected {} tokens per pair, got {}",
                        seq_len,
                        encoding.len()
                    ),
                });
            }
            ids.extend_from_slice(encoding.get_ids());
            type_ids.extend_from_slice(encoding.get_type_ids());
            mask.extend_from_slice(encoding.get_attention_mask());
        }

        let token_count = mask.iter().filter(|&&m| m != 0).count();

        Ok(EncodedBatch {
            input_ids: Tensor::from_vec(ids, (batch, seq_len), device)?,
            type_ids: Tensor::from_vec(type_ids, (batch, seq_len), device)?,
            attention_mask: Tensor::from_vec(mask, (batch, seq_len), device)?,
            token_count,
        })
    }
}
