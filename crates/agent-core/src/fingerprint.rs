//! Coarse page-state fingerprint used for before/after change detection.

use action_locator::ElementRegistry;
use chrono::{DateTime, Utc};
use pagepilot_dom::DomQuery;
use serde::{Deserialize, Serialize};

const PREVIEW_CHARS: usize = 200;

/// Summary of what the page looks like at one instant.
///
/// This is an approximation: a reflow that changes nothing the fields
/// cover reads as unchanged, and a rotating banner reads as a change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFingerprint {
    pub url: String,
    pub title: String,
    pub content_length: usize,
    pub text_preview: String,
    pub interactive_count: usize,
    pub overlay_present: bool,
    pub timestamp: DateTime<Utc>,
}

impl PageFingerprint {
    /// Fingerprint the page as the registry last scanned it.
    pub fn capture<D>(doc: &D, registry: &ElementRegistry) -> Self
    where
        D: DomQuery + ?Sized,
    {
        let text = doc.text_content(doc.root());
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        Self {
            url: doc.url(),
            title: doc.title(),
            content_length: collapsed.chars().count(),
            text_preview: collapsed.chars().take(PREVIEW_CHARS).collect(),
            interactive_count: registry.len(),
            overlay_present: registry.overlays().get_top_overlay().is_some(),
            timestamp: Utc::now(),
        }
    }

    /// True when any observed field differs; the timestamp is ignored.
    pub fn differs_from(&self, other: &PageFingerprint) -> bool {
        self.url != other.url
            || self.title != other.title
            || self.content_length != other.content_length
            || self.text_preview != other.text_preview
            || self.interactive_count != other.interactive_count
            || self.overlay_present != other.overlay_present
    }
}
