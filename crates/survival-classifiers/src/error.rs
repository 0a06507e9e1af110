use std::path::PathBuf;

/// Everything that can go wrong between a submitted form and a verdict.
///
/// Callers are expected to display the message and discard the request;
/// none of these variants is retried.
#[derive(thiserror::Error, Debug, Clone)]
pub enum PredictionFailure {
    #[error("model file not found: {}", path.display())]
    ModelNotFound { path: PathBuf },

    #[error("failed to load model {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("model columns {found:?} do not match encoder columns {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("encoded row has {found} features but the model expects {expected}")]
    FeatureCount { expected: usize, found: usize },

    #[error("label encoder error: {0}")]
    Encoder(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("inference failed: {0}")]
    Inference(String),
}

impl PredictionFailure {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        PredictionFailure::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// True when the failure came from the submitted values rather than the
    /// model or its artifacts.
    pub fn is_input_error(&self) -> bool {
        matches!(self, PredictionFailure::InvalidInput { .. })
    }
}

/// Convenience alias for `std::result::Result<T, PredictionFailure>`.
pub type Result<T> = std::result::Result<T, PredictionFailure>;
