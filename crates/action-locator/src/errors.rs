//! Error types for the element registry

use pagepilot_dom::DomError;
use perceiver_structural::PerceiverError;
use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// No registered or matching element
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Target string could not be used as a selector
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Document port failure
    #[error("Document error: {0}")]
    Dom(#[from] DomError),

    /// Overlay stack could not be configured
    #[error("Perceiver error: {0}")]
    Perceiver(#[from] PerceiverError),
}

impl LocatorError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            LocatorError::ElementNotFound(_) => true,
            LocatorError::Dom(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            LocatorError::Perceiver(_) => 3,
            LocatorError::Dom(_) => 2,
            LocatorError::ElementNotFound(_) => 1,
            LocatorError::InvalidTarget(_) => 0,
        }
    }
}
