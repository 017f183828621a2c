use std::path::{Path, PathBuf};
use std::sync::Arc;

use agent_core::{format_for_llm, AgentSession, BuildMode, PilotConfig};
use anyhow::{Context, Result};
use clap::Args;
use pagepilot_dom::{FixtureDocument, PageSpec};
use tracing::{info, warn};

use super::output::{emit_structured, render_cycle, OutputFormat};
use crate::script::{Script, ScriptedPlanner, StubCapture};

/// Message used when neither the script nor the command line carries one.
const DEFAULT_MESSAGE: &str = "start";

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Page description (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub page: PathBuf,

    /// Scripted planner responses (YAML)
    #[arg(long, value_name = "FILE")]
    pub script: PathBuf,

    /// User message; replaces the messages listed in the script
    #[arg(long)]
    pub message: Option<String>,

    /// Answer screen capture requests with numbered stub references
    #[arg(long)]
    pub capture: bool,
}

pub(crate) fn load_page(path: &Path) -> Result<FixtureDocument> {
    let spec = PageSpec::from_path(path)
        .with_context(|| format!("Failed to load page {}", path.display()))?;
    Ok(spec.into_document())
}

pub async fn cmd_run(args: RunArgs, config: &PilotConfig, format: OutputFormat) -> Result<()> {
    let doc = load_page(&args.page)?;
    let script = Script::load(&args.script)?;
    let messages = match args.message {
        Some(message) => vec![message],
        None if script.messages.is_empty() => vec![DEFAULT_MESSAGE.to_string()],
        None => script.messages.clone(),
    };

    let planner = Arc::new(ScriptedPlanner::new(script.responses));
    let mut session =
        AgentSession::new(config.clone(), planner.clone()).context("Failed to set up session")?;
    if args.capture {
        session = session.with_capture(Arc::new(StubCapture::default()));
    }
    info!(
        session = %session.id().0,
        page = %args.page.display(),
        messages = messages.len(),
        "replaying script"
    );

    for message in &messages {
        let result = session.handle_message(&doc, message).await;
        if !emit_structured(&result, format)? {
            print!("{}", render_cycle(message, &result));
        }
    }

    let snapshot = session.snapshot(&doc, BuildMode::Plan).await;
    if !emit_structured(&snapshot, format)? {
        println!("--- context ---");
        print!("{}", format_for_llm(&snapshot));
    }

    let remaining = planner.remaining();
    if remaining > 0 {
        warn!(remaining, "script responses left unused");
    }
    Ok(())
}
