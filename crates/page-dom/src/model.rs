//! Plain data exchanged across the document port

use serde::{Deserialize, Serialize};

/// Subset of the computed style the engine reasons about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: f64,
    /// `None` stands for `z-index: auto`.
    pub z_index: Option<i32>,
    pub position: String,
    pub pointer_events: String,
    pub overflow_y: String,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: 1.0,
            z_index: None,
            position: "static".to_string(),
            pointer_events: "auto".to_string(),
            overflow_y: "visible".to_string(),
        }
    }
}

impl NodeStyle {
    pub fn hidden(&self) -> bool {
        self.display == "none" || self.visibility == "hidden" || self.visibility == "collapse"
    }

    pub fn transparent(&self) -> bool {
        self.opacity <= 0.0
    }

    pub fn positioned(&self) -> bool {
        matches!(self.position.as_str(), "fixed" | "absolute" | "relative" | "sticky")
    }

    pub fn scrollable(&self) -> bool {
        matches!(self.overflow_y.as_str(), "auto" | "scroll")
    }
}

/// Events the engine dispatches into the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DomEvent {
    Focus,
    Blur,
    PointerDown,
    PointerUp,
    MouseDown,
    MouseUp,
    Click,
    KeyDown { key: String },
    KeyPress { key: String },
    KeyUp { key: String },
    BeforeInput { data: Option<String>, input_type: String },
    Input { data: Option<String>, input_type: String },
    Change,
}

impl DomEvent {
    pub fn key_down(key: impl Into<String>) -> Self {
        Self::KeyDown { key: key.into() }
    }

    pub fn key_up(key: impl Into<String>) -> Self {
        Self::KeyUp { key: key.into() }
    }

    pub fn key_press(key: impl Into<String>) -> Self {
        Self::KeyPress { key: key.into() }
    }

    pub fn insert_text(data: impl Into<String>) -> Self {
        Self::Input {
            data: Some(data.into()),
            input_type: "insertText".to_string(),
        }
    }

    pub fn before_insert_text(data: impl Into<String>) -> Self {
        Self::BeforeInput {
            data: Some(data.into()),
            input_type: "insertText".to_string(),
        }
    }

    /// Generic `input` event with no payload.
    pub fn input() -> Self {
        Self::Input {
            data: None,
            input_type: "insertReplacementText".to_string(),
        }
    }

    /// DOM event name as the page would see it.
    pub fn name(&self) -> &'static str {
        match self {
            DomEvent::Focus => "focus",
            DomEvent::Blur => "blur",
            DomEvent::PointerDown => "pointerdown",
            DomEvent::PointerUp => "pointerup",
            DomEvent::MouseDown => "mousedown",
            DomEvent::MouseUp => "mouseup",
            DomEvent::Click => "click",
            DomEvent::KeyDown { .. } => "keydown",
            DomEvent::KeyPress { .. } => "keypress",
            DomEvent::KeyUp { .. } => "keyup",
            DomEvent::BeforeInput { .. } => "beforeinput",
            DomEvent::Input { .. } => "input",
            DomEvent::Change => "change",
        }
    }
}

/// One `<option>` of a select control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
    pub selected: bool,
    pub disabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_hidden_flags() {
        let mut style = NodeStyle::default();
        assert!(!style.hidden());
        style.visibility = "hidden".into();
        assert!(style.hidden());
        style.visibility = "visible".into();
        style.display = "none".into();
        assert!(style.hidden());
    }

    #[test]
    fn event_names_match_dom() {
        assert_eq!(DomEvent::key_down("a").name(), "keydown");
        assert_eq!(DomEvent::before_insert_text("a").name(), "beforeinput");
        assert_eq!(DomEvent::input().name(), "input");
    }
}
