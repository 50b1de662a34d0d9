use thiserror::Error;

/// Hardware probing failures.
///
/// These never escape [`DeviceSelector::select`](super::DeviceSelector::select);
/// they are logged and treated as "no accelerator present".
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe command '{command}' failed: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("unparseable probe output '{line}': {reason}")]
    Unparseable { line: String, reason: String },

    #[error("{backend} backend unavailable: {reason}")]
    BackendUnavailable { backend: String, reason: String },
}

impl From<candle_core::Error> for ProbeError {
    fn from(err: candle_core::Error) -> Self {
        ProbeError::BackendUnavailable {
            backend: "candle".to_string(),
            reason: err.to_string(),
        }
    }
}
