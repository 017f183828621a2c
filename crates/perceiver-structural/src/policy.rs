use serde::{Deserialize, Serialize};

/// Prefix shared by every id/class the engine injects into the page.
pub const DEFAULT_ENGINE_UI_PREFIX: &str = "pagepilot-";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgePolicy {
    /// Elements whose id or class (or an ancestor's) starts with this prefix
    /// belong to the engine and are never reported.
    pub engine_ui_prefix: String,
    pub minimum_visible_area: Option<f64>,
}

impl Default for JudgePolicy {
    fn default() -> Self {
        Self {
            engine_ui_prefix: DEFAULT_ENGINE_UI_PREFIX.to_string(),
            minimum_visible_area: None,
        }
    }
}

/// Overlay discovery knobs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayPolicy {
    pub min_width: f64,
    pub min_height: f64,
    /// Appended to the built-in catalogue.
    pub extra_selectors: Vec<String>,
}

impl Default for OverlayPolicy {
    fn default() -> Self {
        Self {
            min_width: 50.0,
            min_height: 30.0,
            extra_selectors: Vec::new(),
        }
    }
}
