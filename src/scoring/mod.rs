//! Batched cross-encoder scoring.
//!
//! [`BatchScorer`] owns a [`ScoringBackend`](crate::model::ScoringBackend) and
//! the [`DeviceChoice`](crate::device::DeviceChoice) made when it was built.
//! Every call encodes the whole batch at once and returns a [`ScoreSequence`]
//! with exactly one score per input pair, in input order.
//!
//! # Shape contract
//!
//! Backends may return logits shaped `[N]`, `[N, 1]`, or (for a single pair)
//! a rank-0 scalar. The scorer normalizes all three to a length-`N`
//! sequence before returning and reports any other shape as
//! [`ScoringError::ShapeMismatch`] instead of returning partial scores.

pub mod config;
pub mod error;
pub mod scorer;
mod shared;
pub mod types;


pub use crate::model::ScoringPair;
pub use config::ScorerConfig;
pub use error::ScoringError;
pub use scorer::BatchScorer;
pub use shared::SharedScorer;
pub use types::{RankedDocument, RerankOutput, ScoreActivation, ScoreSequence};
