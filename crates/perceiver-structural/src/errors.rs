use pagepilot_dom::DomError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PerceiverError {
    #[error("invalid overlay selector '{selector}': {reason}")]
    InvalidCatalogue { selector: String, reason: String },
    #[error("document error: {0}")]
    Dom(#[from] DomError),
}

impl PerceiverError {
    pub fn invalid_catalogue(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCatalogue {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            PerceiverError::Dom(err) => err.is_retryable(),
            PerceiverError::InvalidCatalogue { .. } => false,
        }
    }
}
