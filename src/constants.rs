//! Cross-cutting, shared constants.
//!
//! Prefer deriving secondary values from these to avoid drift between the
//! config layer, the scorer and the CLI.

/// Default hit threshold used by [`is_hit`](crate::scoring::BatchScorer::is_hit).
///
/// Interpreted against post-activation scores, so it is only meaningful in
/// `[0, 1]` when [`ScoreActivation::Sigmoid`](crate::scoring::ScoreActivation) is active.
pub const DEFAULT_THRESHOLD: f32 = 0.70;

/// Default tokenizer truncation length for cross-encoder pairs.
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;

/// Files a cross-encoder model directory must contain.
pub const MODEL_CONFIG_FILE: &str = "config.json";
pub const MODEL_WEIGHTS_FILE: &str = "model.safetensors";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Tensor name prefix of a BERT trunk inside a sequence classifier.
pub const BERT_PREFIX: &str = "bert";

/// Tensor name prefix of an (XLM-)RoBERTa trunk; selects the XLM-R loader.
pub const ROBERTA_PREFIX: &str = "roberta";

/// Number of output labels assumed when `config.json` does not declare one.
pub const DEFAULT_NUM_LABELS: usize = 1;
