use action_locator::ElementHandle;
use async_trait::async_trait;
use pagepilot_dom::{DomEvent, PageDocument};

use super::{FillStrategy, StandardStrategy};
use crate::{
    errors::ActionError,
    types::{ExecCtx, FillOutcome},
};

/// Fallback for kinds without a dedicated strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericStrategy {
    standard: StandardStrategy,
}

impl GenericStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FillStrategy for GenericStrategy {
    fn name(&self) -> &'static str {
        "generic"
    }

    async fn fill(
        &self,
        doc: &dyn PageDocument,
        handle: &ElementHandle,
        text: &str,
        ctx: &ExecCtx,
    ) -> Result<FillOutcome, ActionError> {
        if doc.value(handle.node).is_some() {
            return self.standard.fill(doc, handle, text, ctx).await;
        }
        ctx.ensure_active()?;
        let node = handle.node;
        doc.focus(node)?;
        doc.set_text_content(node, text)?;
        doc.dispatch(node, DomEvent::input())?;
        Ok(FillOutcome::verify(text, doc.text_content(node)))
    }
}
