//! Native form controls, including inputs whose value a view framework owns

use action_locator::ElementHandle;
use async_trait::async_trait;
use pagepilot_dom::{DomEvent, PageDocument};
use tracing::debug;

use super::FillStrategy;
use crate::{
    errors::ActionError,
    types::{ExecCtx, FillOutcome},
};

/// Focus, write through the prototype value setter, then announce the
/// change with `input`, `change`, `keydown` and `keyup`.
///
/// Frameworks that track the last value they rendered ignore writes made
/// through their own property wrapper; the prototype setter bypasses it so
/// the following `input` event is seen as a real edit.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardStrategy;

impl StandardStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FillStrategy for StandardStrategy {
    fn name(&self) -> &'static str {
        "standard"
    }

    async fn fill(
        &self,
        doc: &dyn PageDocument,
        handle: &ElementHandle,
        text: &str,
        ctx: &ExecCtx,
    ) -> Result<FillOutcome, ActionError> {
        ctx.ensure_active()?;
        let node = handle.node;
        if doc.disabled(node) {
            return Err(ActionError::NotEnabled(handle.id.clone()));
        }

        doc.focus(node)?;
        doc.set_value_native(node, text)?;
        doc.dispatch(node, DomEvent::input())?;
        doc.dispatch(node, DomEvent::Change)?;

        let key = text
            .chars()
            .last()
            .map(|ch| ch.to_string())
            .unwrap_or_else(|| "Unidentified".to_string());
        doc.dispatch(node, DomEvent::key_down(key.clone()))?;
        doc.dispatch(node, DomEvent::key_up(key))?;

        let actual = doc.value(node).unwrap_or_default();
        debug!(element = %handle.id, actual_len = actual.len(), "standard fill written");
        Ok(FillOutcome::verify(text, actual))
    }
}
