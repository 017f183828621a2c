//! Check primitive - put a checkbox or radio into a requested state

use std::time::Instant;

use action_locator::ElementHandle;
use chrono::{DateTime, Utc};
use pagepilot_dom::{DomEvent, PageDocument};
use tracing::{debug, info};

use super::click::pointer_click;
use crate::{
    errors::ActionError,
    types::{ActionReport, ExecCtx},
};

/// Execute check primitive
///
/// A control already in the requested state is left alone. Otherwise it is
/// clicked; when the page does not toggle it, the native `checked` setter is
/// used and `input`/`change` announce the change.
///
/// ARIA checkboxes, radios and switches have no native state: they are
/// clicked and verified by re-reading `aria-checked`.
pub async fn execute_check(
    doc: &dyn PageDocument,
    handle: &ElementHandle,
    checked: bool,
    ctx: &ExecCtx,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let timer = Instant::now();

    info!(
        action_id = %ctx.action_id.0,
        element = %handle.id,
        checked,
        "Executing check primitive"
    );
    ctx.ensure_active()?;

    let node = handle.node;
    let Some(current) = doc.checked(node) else {
        return check_aria(doc, handle, checked, started_at, timer);
    };
    if current == checked {
        debug!(element = %handle.id, "already in requested state");
        return Ok(ActionReport::success(started_at, timer));
    }
    if doc.disabled(node) {
        return Err(ActionError::NotEnabled(handle.id.clone()));
    }

    doc.scroll_into_view(node)?;
    pointer_click(doc, node)?;

    if doc.checked(node) != Some(checked) {
        debug!(element = %handle.id, "click did not toggle, using native setter");
        doc.set_checked_native(node, checked)?;
        doc.dispatch(node, DomEvent::input())?;
        doc.dispatch(node, DomEvent::Change)?;
    }

    match doc.checked(node) {
        Some(state) if state == checked => Ok(ActionReport::success(started_at, timer)),
        other => Ok(ActionReport::unverified(
            started_at,
            timer,
            format!("checked state is {other:?}, wanted {checked}"),
        )),
    }
}

const ARIA_CHECKABLE_ROLES: &[&str] = &["checkbox", "radio", "switch", "menuitemcheckbox", "menuitemradio"];

fn check_aria(
    doc: &dyn PageDocument,
    handle: &ElementHandle,
    checked: bool,
    started_at: DateTime<Utc>,
    timer: Instant,
) -> Result<ActionReport, ActionError> {
    let node = handle.node;
    let role = doc
        .attribute(node, "role")
        .map(|r| r.trim().to_ascii_lowercase())
        .unwrap_or_default();
    if !ARIA_CHECKABLE_ROLES.contains(&role.as_str()) {
        return Err(ActionError::UnsupportedTarget(format!(
            "{} has no checked state",
            handle.id
        )));
    }
    if aria_checked(doc, handle) == checked {
        debug!(element = %handle.id, "already in requested state");
        return Ok(ActionReport::success(started_at, timer));
    }
    if doc.disabled(node) || doc.attribute(node, "aria-disabled").as_deref() == Some("true") {
        return Err(ActionError::NotEnabled(handle.id.clone()));
    }

    doc.scroll_into_view(node)?;
    pointer_click(doc, node)?;

    if aria_checked(doc, handle) == checked {
        Ok(ActionReport::success(started_at, timer))
    } else {
        Ok(ActionReport::unverified(
            started_at,
            timer,
            format!("aria-checked did not become {checked}"),
        ))
    }
}

/// `mixed` and a missing attribute both read as unchecked.
fn aria_checked(doc: &dyn PageDocument, handle: &ElementHandle) -> bool {
    doc.attribute(handle.node, "aria-checked")
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
