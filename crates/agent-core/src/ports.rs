//! Collaborator seams: planning, screen capture and the task-active flag.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::ContextSnapshot;
use crate::errors::AgentError;
use crate::plan::ActionStep;

/// Terminal or pausing status attached to a planning response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Complete,
    CannotComplete,
    WaitingForInput,
    Stuck,
    Failed,
}

/// What the session sends to the planning collaborator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningRequest {
    pub snapshot: ContextSnapshot,
    /// Line-oriented rendering of `snapshot`
    pub context_text: String,
    /// User message, only on the first cycle of a turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub cycle: u32,
}

/// Planning collaborator answer.
///
/// No status with a non-empty action list means the session keeps going
/// on its own after running the actions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub actions: Vec<ActionStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PlanStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
}

impl PlanningResponse {
    pub fn continues_automatically(&self) -> bool {
        self.status.is_none() && !self.actions.is_empty()
    }
}

/// Remote planner that turns a context snapshot into steps.
#[async_trait]
pub trait PlanningPort: Send + Sync {
    async fn plan(&self, request: PlanningRequest) -> Result<PlanningResponse, AgentError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    #[default]
    Viewport,
    Full,
}

/// Opaque reference to a captured image held by the capture collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotRef {
    pub reference: String,
    pub mode: CaptureMode,
}

#[async_trait]
pub trait CapturePort: Send + Sync {
    async fn request_capture(&self, mode: CaptureMode) -> Result<ScreenshotRef, AgentError>;
}

/// "Task active" marker owned by the session layer.
pub trait TaskFlagStore: Send + Sync {
    fn set_active(&self, active: bool);
    fn is_active(&self) -> bool;
}

#[derive(Debug, Default)]
pub struct InMemoryTaskFlag {
    active: AtomicBool,
}

impl InMemoryTaskFlag {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskFlagStore for InMemoryTaskFlag {
    fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_without_status_continues() {
        let response: PlanningResponse = serde_json::from_str(
            r#"{"message":"filling","actions":[{"action":"click","target":"id-go"}]}"#,
        )
        .unwrap();
        assert!(response.continues_automatically());

        let waiting: PlanningResponse = serde_json::from_str(
            r#"{"message":"which plan?","actions":[],"status":"waiting_for_input","nextStep":"ask"}"#,
        )
        .unwrap();
        assert_eq!(waiting.status, Some(PlanStatus::WaitingForInput));
        assert_eq!(waiting.next_step.as_deref(), Some("ask"));
        assert!(!waiting.continues_automatically());
    }

    #[test]
    fn task_flag_round_trip() {
        let flag = InMemoryTaskFlag::new();
        assert!(!flag.is_active());
        flag.set_active(true);
        assert!(flag.is_active());
    }
}
