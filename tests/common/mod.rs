//! Shared fixtures for integration tests.

#![allow(dead_code)]

use crossrank::{
    BatchScorer, ComputeTier, DeviceChoice, DevicePreference, DeviceSelector, HardwareDescriptor,
    MockBackend, ScorerConfig, StaticProbe,
};

pub const ML_QUERY: &str = "What is machine learning?";

pub const ML_DOCUMENTS: [&str; 2] = [
    "Machine learning is a subset of artificial intelligence",
    "The weather is nice today",
];

pub fn gpu(major: u32, minor: u32) -> HardwareDescriptor {
    HardwareDescriptor::cuda(
        format!("Test GPU sm_{major}{minor}"),
        ComputeTier::new(major, minor),
        16 * 1024 * 1024 * 1024,
    )
}

pub fn cpu_selector() -> DeviceSelector {
    DeviceSelector::new(StaticProbe::none()).with_preference(DevicePreference::Cpu)
}

pub fn lexical_scorer() -> BatchScorer {
    BatchScorer::load(ScorerConfig::stub(), &cpu_selector()).expect("stub scorer should load")
}

pub fn mock_scorer(backend: MockBackend) -> BatchScorer {
    BatchScorer::with_backend(backend, DeviceChoice::GeneralPurpose, ScorerConfig::stub())
        .expect("mock scorer should build")
}
