//! Fill strategies
//!
//! Each editor implementation accepts text only through its own input
//! path. A [`FillStrategy`] encodes one such path and the registry picks
//! the strategy for an element's kind:
//! 1. standard - native value setter plus input/change/key events
//! 2. rich_text - activation, selection-based clear, per-character or
//!    content-replace insertion
//! 3. generic - standard when a value property exists, else text content

mod generic;
mod rich_text;
mod standard;

pub use generic::GenericStrategy;
pub use rich_text::RichTextStrategy;
pub use standard::StandardStrategy;

use std::sync::Arc;

use action_locator::{EditorFamily, ElementHandle, ElementKind};
use async_trait::async_trait;
use dashmap::DashMap;
use pagepilot_dom::PageDocument;
use tracing::debug;

use crate::{
    errors::ActionError,
    types::{ExecCtx, FillOutcome, SimulatorConfig},
};

/// Writes text into one family of controls.
#[async_trait]
pub trait FillStrategy: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Write `text` into `handle`, replacing its content, and verify it.
    ///
    /// `Err` means the write could not be carried out; a write that went
    /// through but did not stick is an unsuccessful `Ok` outcome.
    async fn fill(
        &self,
        doc: &dyn PageDocument,
        handle: &ElementHandle,
        text: &str,
        ctx: &ExecCtx,
    ) -> Result<FillOutcome, ActionError>;
}

/// Fill strategies keyed by element kind.
///
/// Kinds without a registered strategy use the fallback.
pub struct StrategyRegistry {
    strategies: DashMap<ElementKind, Arc<dyn FillStrategy>>,
    fallback: Arc<dyn FillStrategy>,
}

impl StrategyRegistry {
    /// Empty registry; every kind resolves to `fallback`.
    pub fn new(fallback: Arc<dyn FillStrategy>) -> Self {
        Self {
            strategies: DashMap::new(),
            fallback,
        }
    }

    /// Standard controls, the four editor families and the generic fallback.
    pub fn with_defaults(config: &SimulatorConfig) -> Self {
        let registry = Self::new(Arc::new(GenericStrategy::new()));
        registry.register(ElementKind::StandardInput, Arc::new(StandardStrategy::new()));
        for family in EditorFamily::all() {
            registry.register(
                ElementKind::RichText(family),
                Arc::new(RichTextStrategy::for_family(family, config)),
            );
        }
        registry
    }

    /// Register (or replace) the strategy for `kind`.
    pub fn register(&self, kind: ElementKind, strategy: Arc<dyn FillStrategy>) {
        debug!(kind = %kind, strategy = strategy.name(), "fill strategy registered");
        self.strategies.insert(kind, strategy);
    }

    pub fn resolve(&self, kind: ElementKind) -> Arc<dyn FillStrategy> {
        self.strategies
            .get(&kind)
            .map(|entry| Arc::clone(entry.value()))
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults(&SimulatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_family() {
        let registry = StrategyRegistry::default();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.resolve(ElementKind::StandardInput).name(), "standard");
        assert_eq!(
            registry.resolve(ElementKind::RichText(EditorFamily::Quill)).name(),
            "quill"
        );
        assert_eq!(registry.resolve(ElementKind::ContentEditable).name(), "generic");
        assert_eq!(registry.resolve(ElementKind::Unknown).name(), "generic");
    }

    #[test]
    fn registration_replaces_existing_entry() {
        let registry = StrategyRegistry::default();
        registry.register(ElementKind::ContentEditable, Arc::new(StandardStrategy::new()));
        assert_eq!(registry.resolve(ElementKind::ContentEditable).name(), "standard");
        assert_eq!(registry.len(), 6);
    }
}
