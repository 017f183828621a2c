//! Enter key primitive

use std::time::Instant;

use action_locator::ElementHandle;
use chrono::Utc;
use pagepilot_dom::{DomEvent, PageDocument};
use tracing::info;

use crate::{
    errors::ActionError,
    types::{ActionReport, ExecCtx},
};

const ENTER: &str = "Enter";

/// Press Enter on `target`, or on whatever has focus (the document root
/// when nothing does).
pub async fn execute_press_enter(
    doc: &dyn PageDocument,
    target: Option<&ElementHandle>,
    ctx: &ExecCtx,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let timer = Instant::now();

    info!(
        action_id = %ctx.action_id.0,
        element = target.map(|h| h.id.as_str()).unwrap_or("<focused>"),
        "Executing press_enter primitive"
    );
    ctx.ensure_active()?;

    let node = match target {
        Some(handle) => {
            doc.focus(handle.node)?;
            handle.node
        }
        None => doc.focused().unwrap_or_else(|| doc.root()),
    };

    let accepted = doc.dispatch(node, DomEvent::key_down(ENTER))?;
    doc.dispatch(node, DomEvent::key_press(ENTER))?;
    doc.dispatch(node, DomEvent::key_up(ENTER))?;

    if accepted {
        Ok(ActionReport::success(started_at, timer))
    } else {
        Ok(ActionReport::unverified(started_at, timer, "keydown was cancelled"))
    }
}
