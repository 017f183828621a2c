//! Error types for the input simulator

use pagepilot_dom::DomError;
use thiserror::Error;

/// Error types for simulator operations
///
/// A failed verification is not an error: it is reported through
/// [`crate::FillOutcome`] or [`crate::ActionReport`]. These variants cover
/// the cases where the action could not be carried out at all.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionError {
    /// Operation was cancelled between suspension points
    #[error("Operation interrupted: {0}")]
    Interrupted(String),

    /// Element refused pointer input (disabled or the page swallowed it)
    #[error("Element not clickable: {0}")]
    NotClickable(String),

    /// Element is not enabled for interaction
    #[error("Element not enabled: {0}")]
    NotEnabled(String),

    /// Select option was not found by value or text
    #[error("Option not found in dropdown: {0}")]
    OptionNotFound(String),

    /// Element cannot take the requested action
    #[error("Unsupported target: {0}")]
    UnsupportedTarget(String),

    /// Scroll target is invalid or unreachable
    #[error("Scroll target invalid: {0}")]
    ScrollTargetInvalid(String),

    /// Document port failure
    #[error("Document error: {0}")]
    Dom(#[from] DomError),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ActionError::NotClickable(_) => true,
            ActionError::Dom(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Get error severity level (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            ActionError::Internal(_) => 3,
            ActionError::Dom(_) => 2,
            ActionError::NotEnabled(_)
            | ActionError::OptionNotFound(_)
            | ActionError::UnsupportedTarget(_) => 1,
            _ => 0,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, ActionError::Interrupted(_))
    }
}
