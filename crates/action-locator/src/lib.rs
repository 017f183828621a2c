//! Element registry - stable addressing for interactive page controls
//!
//! This crate implements element discovery and addressing with:
//! - interactive-control discovery scoped by visibility
//! - a stable-id cascade (test ids, static ids, names, labels, roles, placeholders, position)
//! - selector derivation validated for uniqueness, with an ancestor-path fallback
//! - kind detection, including rich-text editor families
//! - id and selector lookup with re-scan on stale entries

pub mod config;
pub mod errors;
pub mod kind;
pub mod registry;
pub mod strategies;
pub mod types;

pub use config::RegistryConfig;
pub use errors::LocatorError;
pub use kind::{detect_kind, editor_family, element_label};
pub use perceiver_structural::INTERACTIVE_SELECTOR;
pub use registry::ElementRegistry;
pub use strategies::{derive_id, derive_selector, looks_generated, slugify, ElementFacts};
pub use types::{EditorFamily, ElementHandle, ElementKind};
