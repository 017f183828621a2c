//! Agent session - the one engine instance driving plan/act cycles.

use std::sync::Arc;

use action_locator::ElementRegistry;
use action_primitives::InputSimulator;
use pagepilot_core_types::{SessionId, TaskId};
use pagepilot_dom::PageDocument;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cancel::{CancelContext, Raced};
use crate::config::PilotConfig;
use crate::context::{format_for_llm, BuildInputs, BuildMode, ContextBuilder, ContextSnapshot};
use crate::errors::AgentError;
use crate::loop_monitor::StuckReason;
use crate::plan::{ActionOutcome, ExecutionPlan, Progress};
use crate::planner::{PlannerState, StepEnv, TaskPlanner};
use crate::ports::{
    CapturePort, InMemoryTaskFlag, PlanStatus, PlanningPort, PlanningRequest, TaskFlagStore,
};

/// How a user message's cycles ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// Planner reported the goal reached.
    Complete,
    /// Planner reported the goal unreachable.
    CannotComplete,
    /// Planner asked the user something; the plan is kept.
    WaitingForInput,
    /// Repeating or failing steps; automatic continuation stopped.
    Stuck,
    /// Planner reported failure.
    Failed,
    /// A collaborator call failed; the plan is kept.
    Paused,
    Cancelled,
    /// Cycle budget for one message exhausted; the plan is kept.
    MaxCycles,
    /// Planner answered with neither actions nor a status.
    Idle,
}

impl CycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleStatus::Complete => "complete",
            CycleStatus::CannotComplete => "cannot_complete",
            CycleStatus::WaitingForInput => "waiting_for_input",
            CycleStatus::Stuck => "stuck",
            CycleStatus::Failed => "failed",
            CycleStatus::Paused => "paused",
            CycleStatus::Cancelled => "cancelled",
            CycleStatus::MaxCycles => "max_cycles",
            CycleStatus::Idle => "idle",
        }
    }

    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            CycleStatus::WaitingForInput | CycleStatus::Paused | CycleStatus::MaxCycles
        )
    }
}

/// Result of [`AgentSession::handle_message`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleResult {
    pub status: CycleStatus,
    /// Last planner message, or a description of what stopped the cycles.
    pub message: String,
    /// Every step outcome across all cycles of this message.
    pub outcomes: Vec<ActionOutcome>,
    pub any_success: bool,
    /// Planning cycles that ran.
    pub cycles: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stuck_reason: Option<StuckReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
}

impl CycleResult {
    fn new(status: CycleStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            outcomes: Vec::new(),
            any_success: false,
            cycles: 0,
            stuck_reason: None,
            next_step: None,
            progress: None,
        }
    }

    fn finish(mut self, status: CycleStatus, progress: Option<Progress>) -> Self {
        self.status = status;
        self.any_success = self.outcomes.iter().any(|o| o.success);
        self.progress = progress;
        self
    }
}

/// Mutable per-task state; replaced wholesale on reset or cancellation.
struct SessionState {
    registry: ElementRegistry,
    planner: TaskPlanner,
    context_builder: ContextBuilder,
    task_id: TaskId,
    goal: String,
}

impl SessionState {
    fn fresh(blank: &ElementRegistry, config: &PilotConfig) -> Self {
        Self {
            registry: blank.clone(),
            planner: TaskPlanner::new(config.loop_detection.clone()),
            context_builder: ContextBuilder::new(config.context.clone()),
            task_id: TaskId::new(),
            goal: String::new(),
        }
    }
}

/// Owns the registry, planner, context builder and cancellation context
/// for one page.
pub struct AgentSession {
    id: SessionId,
    config: PilotConfig,
    simulator: InputSimulator,
    blank_registry: ElementRegistry,
    cancel: CancelContext,
    state: Mutex<SessionState>,
    planning: Arc<dyn PlanningPort>,
    capture: Option<Arc<dyn CapturePort>>,
    task_flag: Arc<dyn TaskFlagStore>,
}

impl AgentSession {
    pub fn new(config: PilotConfig, planning: Arc<dyn PlanningPort>) -> Result<Self, AgentError> {
        let blank_registry = ElementRegistry::new(config.registry.clone(), config.overlay.clone())?;
        let state = SessionState::fresh(&blank_registry, &config);
        Ok(Self {
            id: SessionId::new(),
            simulator: InputSimulator::new(config.simulator.clone()),
            cancel: CancelContext::new(config.session.cancel_cooldown()),
            blank_registry,
            state: Mutex::new(state),
            planning,
            capture: None,
            task_flag: Arc::new(InMemoryTaskFlag::new()),
            config,
        })
    }

    pub fn with_capture(mut self, capture: Arc<dyn CapturePort>) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn with_task_flag(mut self, task_flag: Arc<dyn TaskFlagStore>) -> Self {
        self.task_flag = task_flag;
        self
    }

    pub fn with_simulator(mut self, simulator: InputSimulator) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn config(&self) -> &PilotConfig {
        &self.config
    }

    pub fn cancel_context(&self) -> &CancelContext {
        &self.cancel
    }

    pub fn is_task_active(&self) -> bool {
        self.task_flag.is_active()
    }

    pub async fn planner_state(&self) -> PlannerState {
        self.state.lock().await.planner.state()
    }

    pub async fn progress(&self) -> Option<Progress> {
        self.state.lock().await.planner.progress()
    }

    /// Signatures currently held by the loop monitor, oldest first.
    pub async fn loop_window(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.planner.monitor().window().map(str::to_string).collect()
    }

    /// Run plan/act cycles for one user message.
    ///
    /// A paused task (waiting for input, collaborator failure, cycle budget)
    /// resumes with its plan progress and loop state; anything else starts
    /// a new task.
    pub async fn handle_message(&self, doc: &dyn PageDocument, message: &str) -> CycleResult {
        if self.cancel.is_cancelled() {
            return CycleResult::new(CycleStatus::Cancelled, "session is cancelling");
        }
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if state.planner.state() == PlannerState::Paused {
            info!(task = %state.task_id.0, "resuming paused task");
        } else {
            state.planner.begin_task();
            state.context_builder.reset();
            state.task_id = TaskId::new();
            state.goal = message.trim().to_string();
            info!(session = %self.id.0, task = %state.task_id.0, goal = %state.goal, "task started");
        }

        let mut result = CycleResult::new(CycleStatus::Idle, "");
        let mut mode = BuildMode::Plan;
        let mut user_message = Some(message.to_string());

        for cycle in 1..=self.config.session.max_cycles {
            if self.cancel.is_cancelled() {
                return self.abandon(state, result);
            }

            let snapshot = state
                .context_builder
                .build(
                    doc,
                    &mut state.registry,
                    mode,
                    BuildInputs {
                        progress: state.planner.progress(),
                        message: user_message.as_deref(),
                        capture: self.capture.as_deref(),
                        cancel: &self.cancel,
                    },
                )
                .await;
            if self.cancel.is_cancelled() {
                return self.abandon(state, result);
            }

            let request = PlanningRequest {
                context_text: format_for_llm(&snapshot),
                snapshot,
                message: user_message.take(),
                cycle,
            };
            let response = match self.cancel.race(self.planning.plan(request)).await {
                Raced::Cancelled => return self.abandon(state, result),
                Raced::Completed(Ok(response)) => response,
                Raced::Completed(Err(err)) => {
                    warn!(error = %err, cycle, "planning collaborator failed, pausing");
                    state.planner.pause();
                    result.message = err.to_string();
                    return result.finish(CycleStatus::Paused, state.planner.progress());
                }
            };
            result.cycles = cycle;
            result.message = response.message.clone();
            result.next_step = response.next_step.clone();

            match response.status {
                Some(PlanStatus::CannotComplete) => {
                    return self.end_task(state, result, CycleStatus::CannotComplete)
                }
                Some(PlanStatus::Failed) => return self.end_task(state, result, CycleStatus::Failed),
                Some(PlanStatus::Stuck) => return self.end_task(state, result, CycleStatus::Stuck),
                _ => {}
            }

            if !response.actions.is_empty() {
                state
                    .planner
                    .set_plan(ExecutionPlan::new(state.goal.clone(), response.actions.clone()));
                self.task_flag.set_active(true);

                let mut env = StepEnv {
                    doc,
                    registry: &mut state.registry,
                    simulator: &self.simulator,
                    cancel: &self.cancel,
                };
                let run = state.planner.run_plan(&mut env).await;
                result.outcomes.extend(run.outcomes);

                if run.cancelled || self.cancel.is_cancelled() {
                    return self.abandon(state, result);
                }
                if let Some(reason) = run.stuck {
                    result.message = format!("stopped: {reason}");
                    result.stuck_reason = Some(reason);
                    return self.end_task(state, result, CycleStatus::Stuck);
                }
            }

            match response.status {
                Some(PlanStatus::Complete) => {
                    state.planner.complete();
                    self.task_flag.set_active(false);
                    info!(task = %state.task_id.0, cycles = cycle, "task complete");
                    return result.finish(CycleStatus::Complete, state.planner.progress());
                }
                Some(PlanStatus::WaitingForInput) => {
                    state.planner.pause();
                    info!(task = %state.task_id.0, "waiting for user input");
                    return result.finish(CycleStatus::WaitingForInput, state.planner.progress());
                }
                _ if response.continues_automatically() => {
                    mode = BuildMode::Continuation;
                }
                _ => {
                    state.planner.complete();
                    self.task_flag.set_active(false);
                    return result.finish(CycleStatus::Idle, state.planner.progress());
                }
            }
        }

        warn!(
            task = %state.task_id.0,
            max_cycles = self.config.session.max_cycles,
            "cycle budget exhausted, pausing"
        );
        state.planner.pause();
        result.message = format!(
            "stopped after {} cycles without a final status",
            self.config.session.max_cycles
        );
        result.finish(CycleStatus::MaxCycles, state.planner.progress())
    }

    /// Abort the running task.
    ///
    /// Raises the cancel flag, waits for the in-flight message to stop,
    /// replaces the session state and clears the flag after the cooldown.
    pub async fn cancel(&self) {
        self.cancel.cancel();
        {
            let mut state = self.state.lock().await;
            *state = SessionState::fresh(&self.blank_registry, &self.config);
        }
        self.task_flag.set_active(false);
        info!(session = %self.id.0, "task cancelled");
        self.cancel.clear_after_cooldown().await;
    }

    /// Drop plan, loop state and cached elements without cancelling.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        *state = SessionState::fresh(&self.blank_registry, &self.config);
        self.task_flag.set_active(false);
    }

    /// Snapshot the page without consulting the planner or the capture port.
    pub async fn snapshot(&self, doc: &dyn PageDocument, mode: BuildMode) -> ContextSnapshot {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let progress = state.planner.progress();
        state
            .context_builder
            .build(
                doc,
                &mut state.registry,
                mode,
                BuildInputs {
                    progress,
                    message: None,
                    capture: None,
                    cancel: &self.cancel,
                },
            )
            .await
    }

    fn end_task(&self, state: &mut SessionState, result: CycleResult, status: CycleStatus) -> CycleResult {
        if status == CycleStatus::Stuck {
            state.planner.mark_stuck();
        } else {
            state.planner.complete();
        }
        self.task_flag.set_active(false);
        info!(task = %state.task_id.0, status = ?status, "task ended");
        result.finish(status, state.planner.progress())
    }

    fn abandon(&self, state: &mut SessionState, mut result: CycleResult) -> CycleResult {
        info!(task = %state.task_id.0, "cycle abandoned on cancellation");
        let progress = state.planner.progress();
        *state = SessionState::fresh(&self.blank_registry, &self.config);
        self.task_flag.set_active(false);
        result.message = "cancelled".to_string();
        result.finish(CycleStatus::Cancelled, progress)
    }
}
