//! Error types for document port operations

use pagepilot_core_types::NodeRef;
use thiserror::Error;

/// Document port error enumeration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    /// Node is no longer attached to the document
    #[error("node detached: {0}")]
    Detached(NodeRef),

    /// Selector could not be parsed
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Node does not accept the requested write
    #[error("node not editable: {0}")]
    NotEditable(NodeRef),

    /// Operation is not supported by this document implementation
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Host page raised while handling the operation
    #[error("script error: {0}")]
    Script(String),
}

/// Errors raised while loading fixture page descriptions
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read page file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML page description: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON page description: {0}")]
    Json(#[from] serde_json::Error),
}

impl DomError {
    pub fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }

    /// Detached nodes may reappear after a re-scan; everything else is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomError::Detached(_))
    }
}
