//! Engine configuration loaded from YAML.

use std::path::Path;
use std::time::Duration;

use action_locator::RegistryConfig;
use action_primitives::SimulatorConfig;
use perceiver_structural::OverlayPolicy;
use serde::{Deserialize, Serialize};

use crate::context::ContextConfig;
use crate::errors::AgentError;
use crate::loop_monitor::LoopConfig;

/// Cycle driver limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Planning cycles one user message may trigger.
    /// Default: 10
    pub max_cycles: u32,

    /// Delay before a cancelled session accepts a new task.
    /// Default: 500
    pub cancel_cooldown_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_cycles: 10,
            cancel_cooldown_ms: 500,
        }
    }
}

impl SessionConfig {
    pub fn cancel_cooldown(&self) -> Duration {
        Duration::from_millis(self.cancel_cooldown_ms)
    }
}

/// Top-level configuration; every section falls back to its defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    pub registry: RegistryConfig,
    pub overlay: OverlayPolicy,
    pub simulator: SimulatorConfig,
    #[serde(rename = "loop")]
    pub loop_detection: LoopConfig,
    pub context: ContextConfig,
    pub session: SessionConfig,
}

impl PilotConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self, AgentError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| AgentError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn to_yaml(&self) -> Result<String, AgentError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
