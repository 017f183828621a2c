//! Structural perception: which parts of the page are visible, and which
//! overlay surface currently owns the user's attention.

pub mod errors;
pub mod judges;
pub mod model;
pub mod overlay;
pub mod policy;

pub use errors::PerceiverError;
pub use judges::{enabled, is_engine_ui, is_visible, visible};
pub use model::{JudgeReport, OverlayContext, OverlayKind};
pub use overlay::{labelled_by_text, OverlayStack, DEFAULT_CATALOGUE, INTERACTIVE_SELECTOR};
pub use policy::{JudgePolicy, OverlayPolicy, DEFAULT_ENGINE_UI_PREFIX};
