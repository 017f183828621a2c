//! Scroll primitives - page and element scrolling

use std::time::Instant;

use action_locator::ElementHandle;
use chrono::Utc;
use pagepilot_dom::PageDocument;
use tracing::info;

use crate::{
    errors::ActionError,
    types::{ActionReport, ExecCtx, ScrollDirection},
};

/// Fraction of the visible extent scrolled when no amount is given
const DEFAULT_SCROLL_FRACTION: f64 = 0.8;

/// Scroll the document by `amount` pixels (80% of the viewport by default).
pub async fn execute_scroll_page(
    doc: &dyn PageDocument,
    direction: ScrollDirection,
    amount: Option<f64>,
    ctx: &ExecCtx,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let timer = Instant::now();
    ctx.ensure_active()?;

    let viewport = doc.viewport();
    let amount = resolve_amount(direction, amount, viewport.width, viewport.height)?;
    let (dx, dy) = direction.delta(amount);

    info!(
        action_id = %ctx.action_id.0,
        direction = ?direction,
        amount,
        "Executing scroll_page primitive"
    );
    doc.scroll_by(None, dx, dy)?;
    Ok(ActionReport::success(started_at, timer))
}

/// Scroll inside an element's own box (80% of its size by default).
pub async fn execute_scroll_within(
    doc: &dyn PageDocument,
    handle: &ElementHandle,
    direction: ScrollDirection,
    amount: Option<f64>,
    ctx: &ExecCtx,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let timer = Instant::now();
    ctx.ensure_active()?;

    let rect = doc.bounding_box(handle.node);
    if rect.is_empty() {
        return Err(ActionError::ScrollTargetInvalid(format!(
            "{} has no visible box",
            handle.id
        )));
    }
    let amount = resolve_amount(direction, amount, rect.width, rect.height)?;
    let (dx, dy) = direction.delta(amount);

    info!(
        action_id = %ctx.action_id.0,
        element = %handle.id,
        direction = ?direction,
        amount,
        "Executing scroll_within primitive"
    );
    doc.scroll_by(Some(handle.node), dx, dy)?;
    Ok(ActionReport::success(started_at, timer))
}

fn resolve_amount(
    direction: ScrollDirection,
    amount: Option<f64>,
    width: f64,
    height: f64,
) -> Result<f64, ActionError> {
    match amount {
        Some(value) if value.is_finite() && value > 0.0 => Ok(value),
        Some(value) => Err(ActionError::ScrollTargetInvalid(format!(
            "scroll amount must be positive, got {value}"
        ))),
        None => {
            let extent = match direction {
                ScrollDirection::Up | ScrollDirection::Down => height,
                ScrollDirection::Left | ScrollDirection::Right => width,
            };
            Ok((extent * DEFAULT_SCROLL_FRACTION).round())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_amount_follows_axis() {
        assert_eq!(resolve_amount(ScrollDirection::Down, None, 1000.0, 500.0).unwrap(), 400.0);
        assert_eq!(resolve_amount(ScrollDirection::Right, None, 1000.0, 500.0).unwrap(), 800.0);
        assert_eq!(resolve_amount(ScrollDirection::Up, Some(120.0), 1.0, 1.0).unwrap(), 120.0);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        assert!(matches!(
            resolve_amount(ScrollDirection::Down, Some(-5.0), 1.0, 1.0),
            Err(ActionError::ScrollTargetInvalid(_))
        ));
    }
}
