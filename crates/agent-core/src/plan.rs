//! Execution plan model exchanged with the planning collaborator.

use std::fmt;

use action_primitives::ScrollDirection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action an [`ActionStep`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Fill,
    Click,
    Select,
    Check,
    ScrollPage,
    ScrollWithin,
    Wait,
    PressEnter,
    Observe,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Fill => "fill",
            ActionKind::Click => "click",
            ActionKind::Select => "select",
            ActionKind::Check => "check",
            ActionKind::ScrollPage => "scrollPage",
            ActionKind::ScrollWithin => "scrollWithin",
            ActionKind::Wait => "wait",
            ActionKind::PressEnter => "pressEnter",
            ActionKind::Observe => "observe",
        }
    }

    /// Steps that cannot run without a resolved element.
    pub fn requires_target(&self) -> bool {
        matches!(
            self,
            ActionKind::Fill
                | ActionKind::Click
                | ActionKind::Select
                | ActionKind::Check
                | ActionKind::ScrollWithin
        )
    }

    /// Steps followed by a settle delay so the page can react.
    pub fn settles(&self) -> bool {
        matches!(
            self,
            ActionKind::Fill
                | ActionKind::Click
                | ActionKind::Select
                | ActionKind::Check
                | ActionKind::PressEnter
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One instruction from the planning collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStep {
    pub action: ActionKind,
    /// Element id or selector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<ScrollDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ActionStep {
    pub fn new(action: ActionKind) -> Self {
        Self {
            action,
            target: None,
            value: None,
            checked: None,
            direction: None,
            amount: None,
            duration_ms: None,
        }
    }

    pub fn fill(target: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ActionKind::Fill).with_target(target).with_value(value)
    }

    pub fn click(target: impl Into<String>) -> Self {
        Self::new(ActionKind::Click).with_target(target)
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn with_direction(mut self, direction: ScrollDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// `action:target` key the loop monitor compares.
    pub fn signature(&self) -> String {
        format!("{}:{}", self.action, self.target.as_deref().unwrap_or(""))
    }
}

impl fmt::Display for ActionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{} {}", self.action, target),
            None => write!(f, "{}", self.action),
        }
    }
}

/// Why a step did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    ElementNotFound,
    VerificationFailed,
    ExecutionError,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::ElementNotFound => "element_not_found",
            FailureReason::VerificationFailed => "verification_failed",
            FailureReason::ExecutionError => "execution_error",
        }
    }
}

/// Result of executing one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub step: ActionStep,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
    pub message: String,
    pub page_state_changed: bool,
    /// Step was skipped or abandoned because the task was cancelled
    #[serde(default)]
    pub cancelled: bool,
    pub timestamp: DateTime<Utc>,
}

impl ActionOutcome {
    pub fn succeeded(step: &ActionStep, message: impl Into<String>, changed: bool) -> Self {
        Self {
            step: step.clone(),
            success: true,
            failure_reason: None,
            message: message.into(),
            page_state_changed: changed,
            cancelled: false,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(step: &ActionStep, reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            step: step.clone(),
            success: false,
            failure_reason: Some(reason),
            message: message.into(),
            page_state_changed: false,
            cancelled: false,
            timestamp: Utc::now(),
        }
    }

    pub fn cancelled(step: &ActionStep) -> Self {
        Self {
            step: step.clone(),
            success: false,
            failure_reason: None,
            message: "cancelled".to_string(),
            page_state_changed: false,
            cancelled: true,
            timestamp: Utc::now(),
        }
    }

    pub fn with_page_change(mut self, changed: bool) -> Self {
        self.page_state_changed = changed;
        self
    }
}

/// Plan progress reported in context snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub goal: String,
}

/// Ordered steps from one planning response.
///
/// Replaced wholesale by each new response; `cursor` never exceeds the
/// number of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    pub goal: String,
    pub steps: Vec<ActionStep>,
    pub cursor: usize,
    pub completed_log: Vec<ActionOutcome>,
    pub failed_log: Vec<ActionOutcome>,
}

impl ExecutionPlan {
    pub fn new(goal: impl Into<String>, steps: Vec<ActionStep>) -> Self {
        Self {
            goal: goal.into(),
            steps,
            cursor: 0,
            completed_log: Vec::new(),
            failed_log: Vec::new(),
        }
    }

    pub fn current(&self) -> Option<&ActionStep> {
        self.steps.get(self.cursor)
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    fn advance(&mut self) {
        self.cursor = (self.cursor + 1).min(self.steps.len());
    }

    pub(crate) fn record_success(&mut self, outcome: ActionOutcome) {
        self.completed_log.push(outcome);
        self.advance();
    }

    pub(crate) fn record_failure(&mut self, outcome: ActionOutcome) {
        self.failed_log.push(outcome);
        self.advance();
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.completed_log.len(),
            total: self.steps.len(),
            goal: self.goal.clone(),
        }
    }
}
