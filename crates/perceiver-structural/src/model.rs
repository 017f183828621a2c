use std::fmt;

use pagepilot_core_types::NodeRef;
use pagepilot_dom::DomQuery;
use serde::{Deserialize, Serialize};

/// Outcome of a judge; `reason` reads like `not_visible(zero_area,hidden_ancestor)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeReport {
    pub ok: bool,
    pub reason: String,
    pub issues: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    Page,
    Modal,
    Dialog,
    Drawer,
    Popup,
    Menu,
    Dropdown,
    Overlay,
}

impl OverlayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayKind::Page => "page",
            OverlayKind::Modal => "modal",
            OverlayKind::Dialog => "dialog",
            OverlayKind::Drawer => "drawer",
            OverlayKind::Popup => "popup",
            OverlayKind::Menu => "menu",
            OverlayKind::Dropdown => "dropdown",
            OverlayKind::Overlay => "overlay",
        }
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected interaction surface.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayContext {
    pub kind: OverlayKind,
    /// `None` for the page context.
    pub root: Option<NodeRef>,
    /// Node holding the substantive content; equals `root` unless the root
    /// is a full-viewport backdrop.
    pub content: Option<NodeRef>,
    pub title: Option<String>,
    pub blocking: bool,
    pub z_order: i64,
}

impl OverlayContext {
    /// The implicit whole-page context.
    pub fn page() -> Self {
        Self {
            kind: OverlayKind::Page,
            root: None,
            content: None,
            title: None,
            blocking: false,
            z_order: 0,
        }
    }

    pub fn is_page(&self) -> bool {
        self.kind == OverlayKind::Page
    }

    /// True when `node` is the content node or lies beneath it. Every
    /// attached node belongs to the page context.
    pub fn contains<D>(&self, doc: &D, node: NodeRef) -> bool
    where
        D: DomQuery + ?Sized,
    {
        match self.content {
            Some(content) => doc.is_within(node, content),
            None => doc.is_connected(node),
        }
    }
}

impl Default for OverlayContext {
    fn default() -> Self {
        Self::page()
    }
}
