//! Scripted collaborators for offline runs.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use agent_core::{
    AgentError, CaptureMode, CapturePort, PlanningPort, PlanningRequest, PlanningResponse,
    ScreenshotRef,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A recorded conversation: user messages and the planner's answers in
/// the order the session will ask for them.
///
/// ```yaml
/// messages:
///   - Sign me up as Ada
/// responses:
///   - message: Filling the form
///     actions:
///       - { action: fill, target: id-email, value: ada@example.com }
///       - { action: click, target: id-submit }
///     status: complete
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    pub messages: Vec<String>,
    pub responses: Vec<PlanningResponse>,
}

impl Script {
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context("invalid script")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("failed to parse script {}", path.display()))
    }
}

/// Planning collaborator that answers from a [`Script`].
#[derive(Debug, Default)]
pub struct ScriptedPlanner {
    responses: Mutex<VecDeque<PlanningResponse>>,
}

impl ScriptedPlanner {
    pub fn new(responses: impl IntoIterator<Item = PlanningResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl PlanningPort for ScriptedPlanner {
    async fn plan(&self, request: PlanningRequest) -> Result<PlanningResponse, AgentError> {
        debug!(
            cycle = request.cycle,
            elements = request.snapshot.total_elements,
            "scripted planner asked"
        );
        self.responses.lock().pop_front().ok_or_else(|| {
            AgentError::planning(format!("script has no response for cycle {}", request.cycle))
        })
    }
}

/// Capture collaborator that hands out numbered references.
#[derive(Debug, Default)]
pub struct StubCapture {
    taken: AtomicUsize,
}

impl StubCapture {
    pub fn taken(&self) -> usize {
        self.taken.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CapturePort for StubCapture {
    async fn request_capture(&self, mode: CaptureMode) -> Result<ScreenshotRef, AgentError> {
        let n = self.taken.fetch_add(1, Ordering::SeqCst) + 1;
        let mode_name = match mode {
            CaptureMode::Viewport => "viewport",
            CaptureMode::Full => "full",
        };
        Ok(ScreenshotRef {
            reference: format!("capture-{n}-{mode_name}"),
            mode,
        })
    }
}
