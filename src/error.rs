//! Error types for the review pipeline.
//!
//! Only [`PipelineError::Classification`], the artifact variants and
//! [`PipelineError::ClassifierUnavailable`] can abort a run.
//! Service and configuration problems are absorbed by the insight generator and show up
//! as placeholder text in the report.

use std::sync::Arc;
use thiserror::Error;

/// A [`Result`](std::result::Result) alias using [`PipelineError`] as the error type.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The classifier could not score the batch. Fatal for the run.
    #[error("classification failed: {0}")]
    Classification(String),

    /// The classifier failed to load at startup. Keeps the original load error.
    #[error("classifier unavailable: {0}")]
    ClassifierUnavailable(#[source] Arc<PipelineError>),

    /// A fitted artifact (vocabulary, manifest) is missing or unreadable.
    #[error("failed to load artifact {path}: {reason}")]
    ArtifactLoad { path: String, reason: String },

    /// Vocabulary, manifest and serving settings disagree with each other.
    #[error("artifact mismatch: {0}")]
    ArtifactMismatch(String),

    /// Transient failure talking to the generative-text service.
    #[error("generative service error: {0}")]
    Service(String),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for PipelineError {
    fn from(value: reqwest::Error) -> Self {
        PipelineError::Service(value.to_string())
    }
}

impl PipelineError {
    /// True for errors that mean the classifier cannot label this batch.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            PipelineError::Classification(_)
                | PipelineError::ClassifierUnavailable(_)
                | PipelineError::ArtifactLoad { .. }
                | PipelineError::ArtifactMismatch(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_classification() {
        assert!(PipelineError::Classification("down".into()).is_unavailable());
        assert!(PipelineError::ArtifactMismatch("max_length".into()).is_unavailable());
        assert!(!PipelineError::Service("rate limited".into()).is_unavailable());
    }

    #[test]
    fn test_unavailable_keeps_load_cause() {
        let cause = Arc::new(PipelineError::ArtifactMismatch("vocab_size".into()));
        let err = PipelineError::ClassifierUnavailable(cause);
        assert!(err.is_unavailable());
        assert_eq!(
            err.to_string(),
            "classifier unavailable: artifact mismatch: vocab_size"
        );

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "artifact mismatch: vocab_size");
    }

    #[test]
    fn test_error_messages() {
        let err = PipelineError::ArtifactLoad {
            path: "models/tokenizer.json".into(),
            reason: "not found".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to load artifact models/tokenizer.json: not found"
        );
    }
}
