//! Agent core: task planning, loop detection, context snapshots and the
//! session that drives plan/act cycles against one page.
//!
//! The planning and screen capture services are collaborators reached
//! through [`PlanningPort`] and [`CapturePort`]; everything else runs
//! in-process against a [`pagepilot_dom::PageDocument`].

pub mod cancel;
pub mod config;
pub mod context;
pub mod errors;
pub mod fingerprint;
pub mod loop_monitor;
pub mod plan;
pub mod planner;
pub mod ports;
pub mod session;

pub use cancel::{CancelContext, Raced};
pub use config::{PilotConfig, SessionConfig};
pub use context::{
    format_for_llm, ActiveContextSummary, BuildInputs, BuildMode, ContextBuilder, ContextConfig,
    ContextSnapshot, ElementSummary, Heading,
};
pub use errors::AgentError;
pub use fingerprint::PageFingerprint;
pub use loop_monitor::{LoopConfig, LoopMonitor, StuckReason};
pub use plan::{
    ActionKind, ActionOutcome, ActionStep, ExecutionPlan, FailureReason, Progress,
};
pub use planner::{PlanRun, PlannerState, StepEnv, TaskPlanner};
pub use ports::{
    CaptureMode, CapturePort, InMemoryTaskFlag, PlanStatus, PlanningPort, PlanningRequest,
    PlanningResponse, ScreenshotRef, TaskFlagStore,
};
pub use session::{AgentSession, CycleResult, CycleStatus};
