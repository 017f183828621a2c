use std::path::PathBuf;
use std::sync::Arc;

use agent_core::{format_for_llm, AgentSession, BuildMode, PilotConfig};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use super::output::{emit_structured, OutputFormat};
use super::run::load_page;
use crate::script::ScriptedPlanner;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Every interactive element of the page
    Plan,
    /// Only elements of the active overlay
    Continuation,
}

impl From<ModeArg> for BuildMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Plan => BuildMode::Plan,
            ModeArg::Continuation => BuildMode::Continuation,
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Page description (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub page: PathBuf,

    #[arg(long, value_enum, default_value = "plan")]
    pub mode: ModeArg,
}

pub async fn cmd_inspect(args: InspectArgs, config: &PilotConfig, format: OutputFormat) -> Result<()> {
    let doc = load_page(&args.page)?;
    // snapshots never reach the planner
    let session = AgentSession::new(config.clone(), Arc::new(ScriptedPlanner::default()))
        .context("Failed to set up session")?;

    let snapshot = session.snapshot(&doc, args.mode.into()).await;
    if !emit_structured(&snapshot, format)? {
        print!("{}", format_for_llm(&snapshot));
    }
    Ok(())
}
