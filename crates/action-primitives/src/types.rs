//! Core data types for the input simulator

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use pagepilot_core_types::ActionId;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::errors::ActionError;

/// Execution context for one simulator call
///
/// Carries the cancellation token checked at every suspension point and a
/// unique action id for tracing.
#[derive(Clone, Debug)]
pub struct ExecCtx {
    pub action_id: ActionId,
    pub cancel_token: CancellationToken,
}

impl ExecCtx {
    pub fn new(cancel_token: CancellationToken) -> Self {
        Self {
            action_id: ActionId::new(),
            cancel_token,
        }
    }

    /// Context that is never cancelled
    pub fn detached() -> Self {
        Self::new(CancellationToken::new())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub(crate) fn ensure_active(&self) -> Result<(), ActionError> {
        if self.is_cancelled() {
            return Err(ActionError::Interrupted("Context cancelled".to_string()));
        }
        Ok(())
    }

    /// Sleep unless cancelled first.
    pub(crate) async fn pause(&self, duration: Duration) -> Result<(), ActionError> {
        if duration.is_zero() {
            tokio::task::yield_now().await;
            return self.ensure_active();
        }
        tokio::select! {
            _ = self.cancel_token.cancelled() => {
                Err(ActionError::Interrupted("Context cancelled".to_string()))
            }
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

/// How a rich-text strategy writes its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertionMode {
    /// keydown, beforeinput, insert-text, input and keyup for each character
    PerCharacter,
    /// One content replacement followed by an `input` event
    ContentReplace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    /// `(dx, dy)` offsets for scrolling `amount` pixels this way.
    pub fn delta(&self, amount: f64) -> (f64, f64) {
        match self {
            ScrollDirection::Up => (0.0, -amount),
            ScrollDirection::Down => (0.0, amount),
            ScrollDirection::Left => (-amount, 0.0),
            ScrollDirection::Right => (amount, 0.0),
        }
    }
}

/// Result of writing a value into a control.
///
/// `success` is decided by containment after trimming, so editors that pad
/// or wrap the text still verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillOutcome {
    pub success: bool,
    pub expected: String,
    pub actual: String,
    /// Set when the write failed outright rather than failing verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FillOutcome {
    pub fn verify(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        let expected = expected.into();
        let actual = actual.into();
        Self {
            success: actual.trim().contains(expected.trim()),
            expected,
            actual,
            error: None,
        }
    }

    pub fn errored(expected: impl Into<String>, error: &ActionError) -> Self {
        Self {
            success: false,
            expected: expected.into(),
            actual: String::new(),
            error: Some(error.to_string()),
        }
    }
}

/// Report for non-fill element actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionReport {
    /// Whether the action verified
    pub ok: bool,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,

    pub latency_ms: u64,

    /// What was observed when verification failed
    pub detail: Option<String>,
}

impl ActionReport {
    pub fn success(started_at: DateTime<Utc>, timer: Instant) -> Self {
        Self {
            ok: true,
            started_at,
            finished_at: Utc::now(),
            latency_ms: timer.elapsed().as_millis() as u64,
            detail: None,
        }
    }

    pub fn unverified(started_at: DateTime<Utc>, timer: Instant, detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: Some(detail.into()),
            ..Self::success(started_at, timer)
        }
    }
}

/// Simulator tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Pause after an action that may change the page
    pub settle_ms: u64,
    /// Pause between a rich-text editor's activation and its first edit
    pub activation_delay_ms: u64,
    /// Yield to the runtime after this many typed characters
    pub yield_every: usize,
    /// Flash the target before acting on it
    pub highlight: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            settle_ms: 300,
            activation_delay_ms: 50,
            yield_every: 5,
            highlight: true,
        }
    }
}

impl SimulatorConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn activation_delay(&self) -> Duration {
        Duration::from_millis(self.activation_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_tolerates_padding() {
        assert!(FillOutcome::verify("hello", "  hello\n").success);
        assert!(FillOutcome::verify(" hello ", "say hello there").success);
        assert!(!FillOutcome::verify("hello", "help").success);
    }

    #[test]
    fn scroll_deltas() {
        assert_eq!(ScrollDirection::Down.delta(200.0), (0.0, 200.0));
        assert_eq!(ScrollDirection::Left.delta(50.0), (-50.0, 0.0));
    }

    #[test]
    fn direction_names_are_lowercase() {
        let dir: ScrollDirection = serde_json::from_str("\"up\"").unwrap();
        assert_eq!(dir, ScrollDirection::Up);
    }
}
