//! Task planner - owns one execution plan and runs its steps in order.

use std::time::Duration;

use action_locator::{ElementHandle, ElementRegistry};
use action_primitives::{ExecCtx, InputSimulator, ScrollDirection};
use pagepilot_dom::PageDocument;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::cancel::{CancelContext, Raced};
use crate::fingerprint::PageFingerprint;
use crate::loop_monitor::{LoopConfig, LoopMonitor, StuckReason};
use crate::plan::{ActionKind, ActionOutcome, ActionStep, ExecutionPlan, FailureReason, Progress};

/// Planner lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerState {
    #[default]
    Idle,
    Running,
    /// Waiting on the user or a collaborator; resumable
    Paused,
    Complete,
    Stuck,
    Cancelled,
}

/// Everything a step needs to touch the page.
pub struct StepEnv<'a> {
    pub doc: &'a dyn PageDocument,
    pub registry: &'a mut ElementRegistry,
    pub simulator: &'a InputSimulator,
    pub cancel: &'a CancelContext,
}

/// Result of running the remaining steps of the current plan.
#[derive(Debug, Clone, Default)]
pub struct PlanRun {
    pub outcomes: Vec<ActionOutcome>,
    pub stuck: Option<StuckReason>,
    pub cancelled: bool,
}

impl PlanRun {
    pub fn any_success(&self) -> bool {
        self.outcomes.iter().any(|o| o.success)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskPlanner {
    state: PlannerState,
    plan: Option<ExecutionPlan>,
    monitor: LoopMonitor,
}

impl TaskPlanner {
    pub fn new(loop_config: LoopConfig) -> Self {
        Self {
            state: PlannerState::Idle,
            plan: None,
            monitor: LoopMonitor::new(loop_config),
        }
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    pub fn plan(&self) -> Option<&ExecutionPlan> {
        self.plan.as_ref()
    }

    pub fn monitor(&self) -> &LoopMonitor {
        &self.monitor
    }

    /// Start a new task: loop state is forgotten.
    pub fn begin_task(&mut self) {
        self.monitor.reset();
        self.state = PlannerState::Idle;
    }

    /// Replace the current plan wholesale and start running it.
    pub fn set_plan(&mut self, plan: ExecutionPlan) {
        info!(goal = %plan.goal, steps = plan.steps.len(), "plan set");
        self.plan = Some(plan);
        self.state = PlannerState::Running;
    }

    pub fn is_complete(&self) -> bool {
        self.plan.as_ref().map(ExecutionPlan::is_complete).unwrap_or(true)
    }

    pub fn progress(&self) -> Option<Progress> {
        self.plan.as_ref().map(ExecutionPlan::progress)
    }

    /// Record a successful step and feed the monitor.
    pub fn mark_step_complete(&mut self, outcome: ActionOutcome) -> Option<StuckReason> {
        let verdict = self.monitor.record(&outcome);
        if let Some(plan) = self.plan.as_mut() {
            plan.record_success(outcome);
        }
        verdict
    }

    /// Record a failed step and feed the monitor. The cursor still advances.
    pub fn mark_step_failed(&mut self, outcome: ActionOutcome) -> Option<StuckReason> {
        let verdict = self.monitor.record(&outcome);
        if let Some(plan) = self.plan.as_mut() {
            plan.record_failure(outcome);
        }
        verdict
    }

    pub fn pause(&mut self) {
        self.state = PlannerState::Paused;
    }

    /// Successful end of the task; loop state is reset.
    pub fn complete(&mut self) {
        self.state = PlannerState::Complete;
        self.monitor.reset();
    }

    pub fn mark_stuck(&mut self) {
        self.state = PlannerState::Stuck;
    }

    pub fn cancel(&mut self) {
        self.state = PlannerState::Cancelled;
        self.plan = None;
        self.monitor.reset();
    }

    /// Run every remaining step of the current plan.
    ///
    /// Stops early when the cancel flag is raised or the monitor reports
    /// stuck. Failed steps are recorded and execution continues.
    pub async fn run_plan(&mut self, env: &mut StepEnv<'_>) -> PlanRun {
        let mut run = PlanRun::default();
        loop {
            let Some(step) = self.plan.as_ref().and_then(|p| p.current().cloned()) else {
                break;
            };
            if env.cancel.is_cancelled() {
                info!(step = %step, "cancelled before step");
                run.cancelled = true;
                break;
            }

            let outcome = self.execute_step(&step, env).await;
            if outcome.cancelled {
                run.outcomes.push(outcome);
                run.cancelled = true;
                break;
            }

            run.outcomes.push(outcome.clone());
            let verdict = if outcome.success {
                self.mark_step_complete(outcome)
            } else {
                self.mark_step_failed(outcome)
            };
            if let Some(reason) = verdict {
                self.mark_stuck();
                run.stuck = Some(reason);
                break;
            }
        }
        run
    }

    /// Resolve, act, settle and compare fingerprints for one step.
    #[instrument(skip_all, fields(step = %step))]
    pub async fn execute_step(&self, step: &ActionStep, env: &mut StepEnv<'_>) -> ActionOutcome {
        if env.cancel.is_cancelled() {
            return ActionOutcome::cancelled(step);
        }

        let target = match resolve_target(step, env) {
            Ok(target) => target,
            Err(outcome) => return *outcome,
        };

        env.registry.scan(env.doc, true);
        let before = PageFingerprint::capture(env.doc, env.registry);

        let ctx = ExecCtx::new(env.cancel.token());
        let result = dispatch(step, target.as_ref(), env, &ctx).await;

        if env.cancel.is_cancelled() {
            return ActionOutcome::cancelled(step);
        }

        if step.action.settles() {
            let settle = env.simulator.config().settle();
            if let Raced::Cancelled = env.cancel.race(tokio::time::sleep(settle)).await {
                return ActionOutcome::cancelled(step);
            }
        }

        env.registry.scan(env.doc, true);
        let after = PageFingerprint::capture(env.doc, env.registry);
        let changed = after.differs_from(&before);

        match result {
            Ok(StepResult::Done(message)) => {
                debug!(changed, "step succeeded");
                ActionOutcome::succeeded(step, message, changed)
            }
            Ok(StepResult::Unverified(message)) => {
                debug!(changed, %message, "step not verified");
                ActionOutcome::failed(step, FailureReason::VerificationFailed, message)
                    .with_page_change(changed)
            }
            Ok(StepResult::Cancelled) => ActionOutcome::cancelled(step),
            Err(message) => {
                warn!(error = %message, "step failed");
                ActionOutcome::failed(step, FailureReason::ExecutionError, message)
                    .with_page_change(changed)
            }
        }
    }
}

enum StepResult {
    Done(String),
    Unverified(String),
    Cancelled,
}

fn resolve_target(
    step: &ActionStep,
    env: &mut StepEnv<'_>,
) -> Result<Option<ElementHandle>, Box<ActionOutcome>> {
    let requires = step.action.requires_target();
    let raw = step.target.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let Some(raw) = raw else {
        if requires {
            return Err(Box::new(ActionOutcome::failed(
                step,
                FailureReason::ElementNotFound,
                format!("{} needs a target", step.action),
            )));
        }
        return Ok(None);
    };
    if !requires && step.action != ActionKind::PressEnter {
        return Ok(None);
    }
    match env.registry.resolve(env.doc, raw) {
        Ok(handle) => Ok(Some(handle)),
        Err(err) => {
            debug!(target = raw, error = %err, "target not resolved");
            Err(Box::new(ActionOutcome::failed(
                step,
                FailureReason::ElementNotFound,
                format!("element not found: {raw}"),
            )))
        }
    }
}

async fn dispatch(
    step: &ActionStep,
    target: Option<&ElementHandle>,
    env: &StepEnv<'_>,
    ctx: &ExecCtx,
) -> Result<StepResult, String> {
    let doc = env.doc;
    let simulator = env.simulator;
    let report = match (step.action, target) {
        (ActionKind::Fill, Some(handle)) => {
            let text = step.value.as_deref().unwrap_or_default();
            let outcome = simulator.fill(doc, handle, text, ctx).await;
            if let Some(error) = outcome.error {
                if ctx.is_cancelled() {
                    return Ok(StepResult::Cancelled);
                }
                return Err(error);
            }
            return Ok(if outcome.success {
                StepResult::Done(format!("filled {} with \"{}\"", handle.id, outcome.actual))
            } else {
                StepResult::Unverified(format!(
                    "expected \"{}\" in {}, found \"{}\"",
                    outcome.expected, handle.id, outcome.actual
                ))
            });
        }
        (ActionKind::Click, Some(handle)) => simulator.click(doc, handle, ctx).await,
        (ActionKind::Select, Some(handle)) => {
            let item = step.value.as_deref().unwrap_or_default();
            simulator.select(doc, handle, item, ctx).await
        }
        (ActionKind::Check, Some(handle)) => {
            simulator
                .check(doc, handle, step.checked.unwrap_or(true), ctx)
                .await
        }
        (ActionKind::ScrollWithin, Some(handle)) => {
            let direction = step.direction.unwrap_or(ScrollDirection::Down);
            simulator
                .scroll_within(doc, handle, direction, step.amount, ctx)
                .await
        }
        (ActionKind::ScrollPage, _) => {
            let direction = step.direction.unwrap_or(ScrollDirection::Down);
            simulator.scroll_page(doc, direction, step.amount, ctx).await
        }
        (ActionKind::PressEnter, target) => simulator.press_enter(doc, target, ctx).await,
        (ActionKind::Wait, _) => {
            let duration = Duration::from_millis(step.duration_ms.unwrap_or(0));
            return Ok(match env.cancel.race(tokio::time::sleep(duration)).await {
                Raced::Completed(()) => StepResult::Done(format!("waited {}ms", duration.as_millis())),
                Raced::Cancelled => StepResult::Cancelled,
            });
        }
        (ActionKind::Observe, _) => return Ok(StepResult::Done("observed".to_string())),
        (action, None) => return Err(format!("{action} needs a target")),
    };

    match report {
        Ok(report) if report.ok => Ok(StepResult::Done(
            report.detail.unwrap_or_else(|| format!("{} done", step.action)),
        )),
        Ok(report) => Ok(StepResult::Unverified(
            report
                .detail
                .unwrap_or_else(|| format!("{} had no visible effect", step.action)),
        )),
        Err(err) if err.is_interrupted() => Ok(StepResult::Cancelled),
        Err(err) => Err(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(step: &ActionStep, success: bool) -> ActionOutcome {
        if success {
            ActionOutcome::succeeded(step, "ok", false)
        } else {
            ActionOutcome::failed(step, FailureReason::ExecutionError, "boom")
        }
    }

    #[test]
    fn set_plan_replaces_previous_plan() {
        let mut planner = TaskPlanner::default();
        assert_eq!(planner.state(), PlannerState::Idle);
        assert!(planner.is_complete());

        planner.set_plan(ExecutionPlan::new("one", vec![ActionStep::click("a")]));
        planner.mark_step_complete(outcome(&ActionStep::click("a"), true));
        planner.set_plan(ExecutionPlan::new(
            "two",
            vec![ActionStep::click("b"), ActionStep::click("c")],
        ));

        assert_eq!(planner.state(), PlannerState::Running);
        let progress = planner.progress().unwrap();
        assert_eq!((progress.completed, progress.total), (0, 2));
        assert_eq!(progress.goal, "two");
    }

    #[test]
    fn failed_steps_advance_and_feed_monitor() {
        let mut planner = TaskPlanner::default();
        let steps = vec![
            ActionStep::click("a"),
            ActionStep::click("b"),
            ActionStep::click("c"),
        ];
        planner.set_plan(ExecutionPlan::new("g", steps.clone()));

        assert!(planner.mark_step_failed(outcome(&steps[0], false)).is_none());
        assert!(planner.mark_step_failed(outcome(&steps[1], false)).is_none());
        assert_eq!(
            planner.mark_step_failed(outcome(&steps[2], false)),
            Some(StuckReason::ConsecutiveFailures { count: 3 })
        );
        assert!(planner.is_complete());
        assert_eq!(planner.plan().unwrap().failed_log.len(), 3);
    }

    #[test]
    fn cancel_drops_plan_and_loop_state() {
        let mut planner = TaskPlanner::default();
        let step = ActionStep::click("a");
        planner.set_plan(ExecutionPlan::new("g", vec![step.clone(), step.clone()]));
        planner.mark_step_failed(outcome(&step, false));
        planner.cancel();

        assert_eq!(planner.state(), PlannerState::Cancelled);
        assert!(planner.plan().is_none());
        assert_eq!(planner.monitor().consecutive_failures(), 0);
    }

    #[test]
    fn pause_keeps_plan_and_loop_state() {
        let mut planner = TaskPlanner::default();
        let step = ActionStep::click("a");
        planner.set_plan(ExecutionPlan::new("g", vec![step.clone()]));
        planner.mark_step_failed(outcome(&step, false));
        planner.pause();

        assert_eq!(planner.state(), PlannerState::Paused);
        assert!(planner.plan().is_some());
        assert_eq!(planner.monitor().consecutive_failures(), 1);
    }
}
