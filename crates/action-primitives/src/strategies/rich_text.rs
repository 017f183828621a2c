//! Rich-text editors that keep their own document model

use std::time::Duration;

use action_locator::{EditorFamily, ElementHandle};
use async_trait::async_trait;
use pagepilot_dom::{DomEvent, NodeRef, PageDocument};
use tracing::debug;

use super::FillStrategy;
use crate::{
    errors::ActionError,
    types::{ExecCtx, FillOutcome, InsertionMode, SimulatorConfig},
};

/// One editor family.
///
/// The editor only routes commands to its model after a genuine pointer
/// activation, so every fill starts with `mousedown`, `mouseup`, `click`
/// and focus, then waits for the editor to arm itself.
#[derive(Debug, Clone)]
pub struct RichTextStrategy {
    family: EditorFamily,
    mode: InsertionMode,
    activation_delay: Duration,
    yield_every: usize,
}

impl RichTextStrategy {
    pub fn new(
        family: EditorFamily,
        mode: InsertionMode,
        activation_delay: Duration,
        yield_every: usize,
    ) -> Self {
        Self {
            family,
            mode,
            activation_delay,
            yield_every: yield_every.max(1),
        }
    }

    /// Quill rebuilds its model from the DOM on `input`, so it takes a
    /// single content replacement; the others need per-character commands.
    pub fn for_family(family: EditorFamily, config: &SimulatorConfig) -> Self {
        let mode = match family {
            EditorFamily::Quill => InsertionMode::ContentReplace,
            EditorFamily::ProseMirror | EditorFamily::Lexical | EditorFamily::Draft => {
                InsertionMode::PerCharacter
            }
        };
        Self::new(family, mode, config.activation_delay(), config.yield_every)
    }

    pub fn mode(&self) -> InsertionMode {
        self.mode
    }

    async fn activate(
        &self,
        doc: &dyn PageDocument,
        host: NodeRef,
        ctx: &ExecCtx,
    ) -> Result<(), ActionError> {
        for event in [DomEvent::MouseDown, DomEvent::MouseUp, DomEvent::Click] {
            doc.dispatch(host, event)?;
        }
        doc.focus(host)?;
        ctx.pause(self.activation_delay).await
    }

    fn clear(&self, doc: &dyn PageDocument, host: NodeRef) -> Result<(), ActionError> {
        doc.select_contents(host)?;
        if !doc.exec_delete()? {
            debug!(family = self.family.name(), "editor refused delete command");
        }
        Ok(())
    }

    async fn type_characters(
        &self,
        doc: &dyn PageDocument,
        host: NodeRef,
        text: &str,
        ctx: &ExecCtx,
    ) -> Result<(), ActionError> {
        for (index, ch) in text.chars().enumerate() {
            let key = ch.to_string();
            doc.dispatch(host, DomEvent::key_down(key.clone()))?;
            doc.dispatch(host, DomEvent::before_insert_text(key.clone()))?;
            doc.exec_insert_text(&key)?;
            doc.dispatch(host, DomEvent::insert_text(key.clone()))?;
            doc.dispatch(host, DomEvent::key_up(key))?;
            if (index + 1) % self.yield_every == 0 {
                ctx.pause(Duration::ZERO).await?;
            }
        }
        Ok(())
    }

    fn replace_content(
        &self,
        doc: &dyn PageDocument,
        host: NodeRef,
        text: &str,
    ) -> Result<(), ActionError> {
        doc.set_text_content(host, text)?;
        doc.collapse_to_end(host)?;
        doc.dispatch(host, DomEvent::input())?;
        Ok(())
    }
}

#[async_trait]
impl FillStrategy for RichTextStrategy {
    fn name(&self) -> &'static str {
        self.family.name()
    }

    async fn fill(
        &self,
        doc: &dyn PageDocument,
        handle: &ElementHandle,
        text: &str,
        ctx: &ExecCtx,
    ) -> Result<FillOutcome, ActionError> {
        ctx.ensure_active()?;
        let host = handle.node;
        debug!(
            element = %handle.id,
            family = self.family.name(),
            mode = ?self.mode,
            "rich-text fill"
        );

        self.activate(doc, host, ctx).await?;
        self.clear(doc, host)?;
        match self.mode {
            InsertionMode::PerCharacter => self.type_characters(doc, host, text, ctx).await?,
            InsertionMode::ContentReplace => self.replace_content(doc, host, text)?,
        }

        Ok(FillOutcome::verify(text, doc.text_content(host)))
    }
}
