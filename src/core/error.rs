//! Errors surfaced at the service boundary.

use thiserror::Error;

use crate::domain::{BackendKind, UnknownBackend};

/// Every failure a caller of `NormalizationService` can see
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Blank or whitespace-only input; nothing was analyzed
    #[error("Input text is empty")]
    EmptyInput,

    /// Unknown backend identifier or missing adapter
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The engine failed to load or to run
    #[error("Analysis failed on {backend}: {message}")]
    AdapterFailure { backend: BackendKind, message: String },
}

impl AnalysisError {
    /// Wrap an engine/adapter error, keeping its whole cause chain
    pub fn adapter_failure(backend: BackendKind, error: &anyhow::Error) -> Self {
        AnalysisError::AdapterFailure {
            backend,
            message: format!("{:#}", error),
        }
    }

    pub fn is_empty_input(&self) -> bool {
        matches!(self, AnalysisError::EmptyInput)
    }
}

impl From<UnknownBackend> for AnalysisError {
    fn from(e: UnknownBackend) -> Self {
        AnalysisError::Configuration(e.to_string())
    }
}
