use std::time::Duration;

use perceiver_structural::{JudgePolicy, DEFAULT_ENGINE_UI_PREFIX};
use serde::{Deserialize, Serialize};

/// Registry tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Minimum interval between non-forced scans
    pub throttle_ms: u64,
    /// Id/class prefix of the engine's own injected UI
    pub engine_ui_prefix: String,
    pub label_max_chars: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            throttle_ms: 500,
            engine_ui_prefix: DEFAULT_ENGINE_UI_PREFIX.to_string(),
            label_max_chars: 80,
        }
    }
}

impl RegistryConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn judge_policy(&self) -> JudgePolicy {
        JudgePolicy {
            engine_ui_prefix: self.engine_ui_prefix.clone(),
            ..JudgePolicy::default()
        }
    }

    /// No throttling; every scan hits the document.
    pub fn unthrottled() -> Self {
        Self {
            throttle_ms: 0,
            ..Self::default()
        }
    }
}
