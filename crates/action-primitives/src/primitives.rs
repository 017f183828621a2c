//! Action primitives and the simulator facade
//!
//! Element primitives:
//! 1. fill - write text through the kind's fill strategy
//! 2. click - pointer sequence
//! 3. select - choose an option by value or text
//! 4. check - set a checkbox/radio state
//! 5. press_enter - Enter key on a target or the focused element
//! 6. scroll_page / scroll_within

mod check;
mod click;
mod keyboard;
mod scroll;
mod select;

pub use check::*;
pub use click::execute_click;
pub use keyboard::*;
pub use scroll::*;
pub use select::*;

use action_locator::{ElementHandle, ElementKind};
use pagepilot_dom::{NodeRef, PageDocument};
use tracing::{debug, warn};

use crate::{
    errors::ActionError,
    strategies::StrategyRegistry,
    types::{ActionReport, ExecCtx, FillOutcome, ScrollDirection, SimulatorConfig},
};

/// Entry point for every write the engine makes to the page.
pub struct InputSimulator {
    config: SimulatorConfig,
    strategies: StrategyRegistry,
}

impl InputSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        let strategies = StrategyRegistry::with_defaults(&config);
        Self { config, strategies }
    }

    pub fn with_strategies(config: SimulatorConfig, strategies: StrategyRegistry) -> Self {
        Self { config, strategies }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Registry consulted by [`InputSimulator::fill`]; register a strategy
    /// here to support a new editor family.
    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    /// Replace the content of `handle` with `text`.
    ///
    /// Never fails: errors raised while writing come back as an
    /// unsuccessful outcome carrying the message.
    pub async fn fill(
        &self,
        doc: &dyn PageDocument,
        handle: &ElementHandle,
        text: &str,
        ctx: &ExecCtx,
    ) -> FillOutcome {
        self.flash(doc, handle.node, true);
        let result = match handle.kind {
            ElementKind::Select => execute_select(doc, handle, text, ctx)
                .await
                .map(|report| FillOutcome {
                    success: report.ok,
                    expected: text.to_string(),
                    actual: doc.value(handle.node).unwrap_or_default(),
                    error: None,
                }),
            kind if !kind.is_fillable() => Err(ActionError::UnsupportedTarget(format!(
                "{} ({kind}) does not take text",
                handle.id
            ))),
            kind => {
                let strategy = self.strategies.resolve(kind);
                debug!(element = %handle.id, strategy = strategy.name(), "fill strategy selected");
                strategy.fill(doc, handle, text, ctx).await
            }
        };
        self.flash(doc, handle.node, false);

        match result {
            Ok(outcome) => {
                if !outcome.success {
                    debug!(
                        element = %handle.id,
                        expected = %outcome.expected,
                        actual = %outcome.actual,
                        "fill did not verify"
                    );
                }
                outcome
            }
            Err(err) => {
                warn!(element = %handle.id, error = %err, "fill failed");
                FillOutcome::errored(text, &err)
            }
        }
    }

    pub async fn click(
        &self,
        doc: &dyn PageDocument,
        handle: &ElementHandle,
        ctx: &ExecCtx,
    ) -> Result<ActionReport, ActionError> {
        self.flash(doc, handle.node, true);
        let result = execute_click(doc, handle, ctx).await;
        self.flash(doc, handle.node, false);
        result
    }

    pub async fn select(
        &self,
        doc: &dyn PageDocument,
        handle: &ElementHandle,
        item: &str,
        ctx: &ExecCtx,
    ) -> Result<ActionReport, ActionError> {
        self.flash(doc, handle.node, true);
        let result = execute_select(doc, handle, item, ctx).await;
        self.flash(doc, handle.node, false);
        result
    }

    pub async fn check(
        &self,
        doc: &dyn PageDocument,
        handle: &ElementHandle,
        checked: bool,
        ctx: &ExecCtx,
    ) -> Result<ActionReport, ActionError> {
        self.flash(doc, handle.node, true);
        let result = execute_check(doc, handle, checked, ctx).await;
        self.flash(doc, handle.node, false);
        result
    }

    pub async fn press_enter(
        &self,
        doc: &dyn PageDocument,
        target: Option<&ElementHandle>,
        ctx: &ExecCtx,
    ) -> Result<ActionReport, ActionError> {
        if let Some(handle) = target {
            self.flash(doc, handle.node, true);
        }
        let result = execute_press_enter(doc, target, ctx).await;
        if let Some(handle) = target {
            self.flash(doc, handle.node, false);
        }
        result
    }

    pub async fn scroll_page(
        &self,
        doc: &dyn PageDocument,
        direction: ScrollDirection,
        amount: Option<f64>,
        ctx: &ExecCtx,
    ) -> Result<ActionReport, ActionError> {
        execute_scroll_page(doc, direction, amount, ctx).await
    }

    pub async fn scroll_within(
        &self,
        doc: &dyn PageDocument,
        handle: &ElementHandle,
        direction: ScrollDirection,
        amount: Option<f64>,
        ctx: &ExecCtx,
    ) -> Result<ActionReport, ActionError> {
        self.flash(doc, handle.node, true);
        let result = execute_scroll_within(doc, handle, direction, amount, ctx).await;
        self.flash(doc, handle.node, false);
        result
    }

    /// Visual marker around the target; failures are ignored.
    fn flash(&self, doc: &dyn PageDocument, node: NodeRef, on: bool) {
        if !self.config.highlight {
            return;
        }
        if let Err(err) = doc.set_highlight(node, on) {
            debug!(node = %node, error = %err, "highlight skipped");
        }
    }
}

impl Default for InputSimulator {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}
