//! Click primitive - pointer sequence on an element

use std::time::Instant;

use action_locator::ElementHandle;
use chrono::Utc;
use pagepilot_dom::{DomEvent, NodeRef, PageDocument};
use tracing::{debug, info};

use crate::{
    errors::ActionError,
    types::{ActionReport, ExecCtx},
};

/// Execute click primitive
///
/// Steps:
/// 1. Check context
/// 2. Scroll the element into view
/// 3. Dispatch pointerdown, mousedown, pointerup, mouseup, click
/// 4. Report whether the page accepted the click
///
/// A click is verified when the element is still connected and the page
/// accepted the final `click` event, meaning the node was enabled and no
/// handler cancelled it. What the click caused on the page is not checked
/// here; callers that need a state change (check, select) verify it
/// themselves, and the planner sees navigation through the next snapshot.
pub async fn execute_click(
    doc: &dyn PageDocument,
    handle: &ElementHandle,
    ctx: &ExecCtx,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let timer = Instant::now();

    info!(
        action_id = %ctx.action_id.0,
        element = %handle.id,
        "Executing click primitive"
    );
    ctx.ensure_active()?;

    if !doc.is_connected(handle.node) {
        return Ok(ActionReport::unverified(started_at, timer, "element detached before click"));
    }
    doc.scroll_into_view(handle.node)?;

    if !pointer_click(doc, handle.node)? {
        debug!(element = %handle.id, "click not accepted");
        return Ok(ActionReport::unverified(
            started_at,
            timer,
            "click was not accepted (element disabled or event cancelled)",
        ));
    }

    Ok(ActionReport::success(started_at, timer))
}

/// Full pointer sequence; returns whether the final `click` was accepted.
pub(crate) fn pointer_click(doc: &dyn PageDocument, node: NodeRef) -> Result<bool, ActionError> {
    for event in [
        DomEvent::PointerDown,
        DomEvent::MouseDown,
        DomEvent::PointerUp,
        DomEvent::MouseUp,
    ] {
        doc.dispatch(node, event)?;
    }
    doc.dispatch(node, DomEvent::Click).map_err(ActionError::from)
}
