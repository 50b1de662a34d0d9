//! Cross-encoder models and the backends the scorer runs them through.
//!
//! - [`bert`] is the candle sequence-classification model.
//! - [`encoding`] turns a batch of [`ScoringPair`]s into padded tensors.
//! - [`ScoringBackend`] is the seam the scorer drives; [`CrossEncoderBackend`]
//!   runs real weights, [`LexicalBackend`] scores without them (stub mode).

/// BERT-family classifier used as the cross-encoder.
pub mod bert;
mod backend;
/// Tokenizer loading and batched pair encoding.
pub mod encoding;
mod error;
mod lexical;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(test)]
mod tests;

pub use backend::{BatchLogits, CrossEncoderBackend, ScoringBackend};
pub use bert::CrossEncoderModel;
pub use encoding::{EncodedBatch, PairEncoder, ScoringPair, load_tokenizer};
pub use error::ModelError;
pub use lexical::LexicalBackend;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockBackend, MockLayout};
