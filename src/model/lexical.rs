use candle_core::{Device, Tensor};

use super::backend::{BatchLogits, ScoringBackend};
use super::encoding::ScoringPair;
use super::error::ModelError;

/// Function words ignored on both sides of a pair. Sorted for `binary_search`.
pub(crate) const FUNCTION_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "how", "in", "is", "it", "of",
    "on", "or", "the", "this", "to", "was", "what", "when", "where", "which", "who", "why", "with",
];

const COVERAGE_WEIGHT: f32 = 4.0;
const DENSITY_WEIGHT: f32 = 2.0;

/// Logit of a pair with no shared content terms.
pub const NO_EVIDENCE_LOGIT: f32 = -2.0;

/// Model-free backend used when no model path is configured.
///
/// Emits a raw logit per pair from two overlap signals:
/// - coverage: share of distinct query content terms found in the document
/// - density: share of document content terms that are query terms
///
/// A pair with no overlap (including a query with no content terms) scores
/// [`NO_EVIDENCE_LOGIT`]. Squashing into `(0, 1)` is left to
/// [`ScoreActivation`](crate::scoring::ScoreActivation), as for model logits.
#[derive(Debug, Clone)]
pub struct LexicalBackend {
    device: Device,
}

impl Default for LexicalBackend {
    fn default() -> Self {
        Self::new(Device::Cpu)
    }
}

impl LexicalBackend {
    pub fn new(device: Device) -> Self {
        Self { device }
    }

    /// Lowercased alphanumeric runs, minus function words.
    fn content_terms(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .filter(|w| FUNCTION_WORDS.binary_search(&w.as_str()).is_err())
            .collect()
    }

    /// Raw relevance logit for a single pair.
    pub fn pair_logit(&self, query: &str, document: &str) -> f32 {
        let mut query_terms = Self::content_terms(query);
        query_terms.sort_unstable();
        query_terms.dedup();

        let document_terms = Self::content_terms(document);

        if query_terms.is_empty() || document_terms.is_empty() {
            return NO_EVIDENCE_LOGIT;
        }

        let is_query_term = |term: &String| query_terms.binary_search(term).is_ok();

        let covered = query_terms
            .iter()
            .filter(|&term| document_terms.contains(term))
            .count();
        let hits = document_terms.iter().filter(|&term| is_query_term(term)).count();

        let coverage = covered as f32 / query_terms.len() as f32;
        let density = hits as f32 / document_terms.len() as f32;

        NO_EVIDENCE_LOGIT + COVERAGE_WEIGHT * coverage + DENSITY_WEIGHT * density
    }
}

impl ScoringBackend for LexicalBackend {
    fn infer(&self, pairs: &[ScoringPair<'_>]) -> Result<BatchLogits, ModelError> {
        let logits: Vec<f32> = pairs
            .iter()
            .map(|pair| self.pair_logit(pair.query, pair.document))
            .collect();

        let consumed_tokens = pairs
            .iter()
            .map(|pair| pair.query.split_whitespace().count() + pair.document.split_whitespace().count())
            .sum();

        let len = logits.len();
        Ok(BatchLogits {
            logits: Tensor::from_vec(logits, len, &self.device)?,
            consumed_tokens,
        })
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn is_model_loaded(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "lexical"
    }
}
