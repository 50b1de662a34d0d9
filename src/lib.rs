//! crossrank: cross-encoder reranking with accelerator-aware device selection.
//!
//! # Public API Surface
//!
//! ## Device selection
//! - [`DeviceSelector`], [`select_device`] - accelerator vs. CPU decision
//! - [`HardwareDescriptor`], [`ComputeTier`], [`CompatibilityPolicy`] - inputs to that decision
//! - [`HardwareProbe`], [`SystemProbe`], [`StaticProbe`] - where descriptors come from
//!
//! ## Scoring
//! - [`BatchScorer`], [`SharedScorer`] - batched scoring bound to one device
//! - [`ScoringPair`], [`ScoreSequence`], [`RankedDocument`] - inputs and outputs
//! - [`ScoringBackend`], [`CrossEncoderBackend`], [`LexicalBackend`] - what runs the batch
//!
//! ## Configuration
//! - [`EngineConfig`] - `CROSSRANK_*` environment settings
//! - [`ModelCatalog`] - one task classification per model id
//!
//! ## Test/Mock Support
//! [`MockBackend`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod device;
pub mod model;
pub mod scoring;

pub use config::{ConfigError, EngineConfig, ModelCatalog, ModelEntry, ModelKind};
pub use constants::{DEFAULT_MAX_SEQ_LEN, DEFAULT_THRESHOLD};
pub use device::{
    AcceleratorBackend, CompatibilityPolicy, ComputeTier, DeviceChoice, DevicePreference,
    DeviceSelector, HardwareDescriptor, HardwareProbe, ProbeError, StaticProbe, SystemProbe,
    select_device,
};
#[cfg(any(test, feature = "mock"))]
pub use model::{MockBackend, MockLayout};
pub use model::{
    BatchLogits, CrossEncoderBackend, LexicalBackend, ModelError, ScoringBackend, ScoringPair,
};
pub use scoring::{
    BatchScorer, RankedDocument, RerankOutput, ScoreActivation, ScoreSequence, ScorerConfig,
    ScoringError, SharedScorer,
};
