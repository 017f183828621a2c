use std::path::PathBuf;

use action_locator::LocatorError;
use thiserror::Error;

/// Errors emitted by the agent-core crate.
///
/// Step failures never surface here; they become [`crate::ActionOutcome`]s.
/// These variants cover collaborator failures and setup problems.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Raised when a request is malformed or missing required fields.
    #[error("invalid agent request: {0}")]
    InvalidRequest(String),

    /// The planning collaborator could not be reached or answered garbage.
    #[error("planning collaborator failed: {0}")]
    Planning(String),

    /// The screen capture collaborator failed.
    #[error("screen capture failed: {0}")]
    Capture(String),

    /// A collaborator call was abandoned because the task was cancelled.
    #[error("cancelled")]
    Cancelled,

    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigFormat(#[from] serde_yaml::Error),

    /// Element registry could not be built from the configuration.
    #[error("registry setup failed: {0}")]
    Locator(#[from] LocatorError),
}

impl AgentError {
    /// Helper for wrapping static string errors.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn planning(message: impl Into<String>) -> Self {
        Self::Planning(message.into())
    }

    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture(message.into())
    }

    /// Collaborator failures are worth retrying once the user says so.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AgentError::Planning(_) | AgentError::Capture(_))
    }
}
