//! Document port for PagePilot
//!
//! The engine never touches page content directly. It holds [`NodeRef`]
//! handles and goes through [`PageDocument`] for every read and write. The
//! crate also ships [`FixtureDocument`], an in-memory page with enough host
//! behaviour to exercise the engine offline.

pub mod errors;
pub mod fixture;
pub mod model;
pub mod ports;
pub mod selector;

pub use errors::{DomError, FixtureError};
pub use fixture::{ClickEffect, ElementSpec, FixtureDocument, FixtureEditor, PageBuilder, PageSpec};
pub use model::{DomEvent, NodeStyle, SelectOption};
pub use pagepilot_core_types::{NodeRef, Rect, Viewport};
pub use ports::{DomInput, DomQuery, PageDocument};
pub use selector::{attr_selector, is_plain_ident, quote_attr_value, QueryTree, Selector, SelectorTree};
