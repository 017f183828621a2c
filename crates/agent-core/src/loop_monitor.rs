//! Loop/failure monitor fed with every step outcome.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::plan::ActionOutcome;

/// Loop detection thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Number of recent step signatures kept
    pub window_size: usize,
    /// Identical trailing signatures that count as a loop
    pub repeat_threshold: usize,
    /// Consecutive failed steps that count as stuck
    pub failure_threshold: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            repeat_threshold: 3,
            failure_threshold: 3,
        }
    }
}

/// Why automatic continuation must stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StuckReason {
    RepeatedAction { signature: String, count: usize },
    ConsecutiveFailures { count: u32 },
}

impl std::fmt::Display for StuckReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StuckReason::RepeatedAction { signature, count } => {
                write!(f, "repeated {signature} {count} times")
            }
            StuckReason::ConsecutiveFailures { count } => {
                write!(f, "{count} consecutive failed steps")
            }
        }
    }
}

/// Sliding window of step signatures plus a consecutive-failure counter.
#[derive(Debug, Clone, Default)]
pub struct LoopMonitor {
    config: LoopConfig,
    window: VecDeque<String>,
    consecutive_failures: u32,
}

impl LoopMonitor {
    pub fn new(config: LoopConfig) -> Self {
        Self {
            window: VecDeque::with_capacity(config.window_size),
            config,
            consecutive_failures: 0,
        }
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Feed one outcome; returns the stuck verdict after recording it.
    pub fn record(&mut self, outcome: &ActionOutcome) -> Option<StuckReason> {
        self.record_signature(outcome.step.signature(), outcome.success)
    }

    pub fn record_signature(&mut self, signature: String, success: bool) -> Option<StuckReason> {
        if self.config.window_size > 0 {
            while self.window.len() >= self.config.window_size {
                self.window.pop_front();
            }
            self.window.push_back(signature);
        }
        if success {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures += 1;
        }
        let verdict = self.stuck_reason();
        if let Some(reason) = &verdict {
            info!(reason = %reason, "loop monitor reports stuck");
        }
        verdict
    }

    pub fn is_stuck(&self) -> bool {
        self.stuck_reason().is_some()
    }

    pub fn stuck_reason(&self) -> Option<StuckReason> {
        if self.config.failure_threshold > 0
            && self.consecutive_failures >= self.config.failure_threshold
        {
            return Some(StuckReason::ConsecutiveFailures {
                count: self.consecutive_failures,
            });
        }
        let last = self.window.back()?;
        let repeats = self.window.iter().rev().take_while(|s| *s == last).count();
        if self.config.repeat_threshold > 0 && repeats >= self.config.repeat_threshold {
            return Some(StuckReason::RepeatedAction {
                signature: last.clone(),
                count: repeats,
            });
        }
        None
    }

    pub fn window(&self) -> impl Iterator<Item = &str> {
        self.window.iter().map(String::as_str)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.consecutive_failures = 0;
    }
}
