use thiserror::Error;

/// Errors surfaced by the tone engine.
///
/// A pitch-detection miss is not an error; detectors return `Option`.
#[derive(Debug, Error)]
pub enum ToneError {
    /// A parameter was rejected on ingestion (out-of-range beat, bad sweep, ...).
    #[error("Invalid parameter '{field}': {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    /// An input device or worker could not be acquired.
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// Offline rendering or encoding hit an internal inconsistency.
    #[error("Render failed: {0}")]
    RenderFailure(String),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToneError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ToneError::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}
