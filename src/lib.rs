//! PagePilot command line.
//!
//! Replays scripted planning sessions against fixture pages and prints
//! context snapshots. Exposed as a library for integration testing.

pub mod cli;
pub mod script;

pub use script::{Script, ScriptedPlanner, StubCapture};
