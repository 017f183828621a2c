use std::fmt::Write as _;

use agent_core::{ActionOutcome, CycleResult};
use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

/// Print a machine-readable rendering. Returns `false` for `Human`, which
/// the caller renders itself.
pub fn emit_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
        OutputFormat::Yaml => print!("---\n{}", serde_yaml::to_string(value)?),
        OutputFormat::Human => return Ok(false),
    }
    Ok(true)
}

pub fn render_cycle(message: &str, result: &CycleResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "> {message}");
    let _ = writeln!(
        out,
        "status: {}  cycles: {}  any_success: {}",
        result.status.as_str(),
        result.cycles,
        result.any_success
    );
    if !result.message.is_empty() {
        let _ = writeln!(out, "message: {}", result.message);
    }
    if let Some(next) = &result.next_step {
        let _ = writeln!(out, "next: {next}");
    }
    if let Some(reason) = &result.stuck_reason {
        let _ = writeln!(out, "stuck: {reason}");
    }
    for outcome in &result.outcomes {
        let _ = writeln!(out, "  {}", render_outcome(outcome));
    }
    out
}

fn render_outcome(outcome: &ActionOutcome) -> String {
    let verdict = if outcome.cancelled {
        "cancelled".to_string()
    } else if outcome.success {
        "ok".to_string()
    } else {
        match outcome.failure_reason {
            Some(reason) => format!("failed:{}", reason.as_str()),
            None => "failed".to_string(),
        }
    };
    let changed = if outcome.page_state_changed { " (page changed)" } else { "" };
    format!("{verdict:<10} {}  {}{changed}", outcome.step, outcome.message)
}
