//! Input simulator - writes into the page the way each control expects
//!
//! This crate provides:
//! - a fill-strategy registry keyed by element kind (standard controls,
//!   rich-text editor families, generic fallback)
//! - click, select, check, Enter and scroll primitives
//! - containment-based verification of every write

pub mod errors;
mod primitives;
pub mod strategies;
pub mod types;

pub use errors::*;
pub use primitives::*;
pub use strategies::{
    FillStrategy, GenericStrategy, RichTextStrategy, StandardStrategy, StrategyRegistry,
};
pub use types::*;
