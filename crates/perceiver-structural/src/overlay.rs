//! Overlay discovery and active-context selection

use std::collections::{HashMap, HashSet};

use pagepilot_core_types::NodeRef;
use pagepilot_dom::{DomQuery, Selector};
use tracing::{debug, warn};

use crate::errors::PerceiverError;
use crate::judges;
use crate::model::{OverlayContext, OverlayKind};
use crate::policy::{JudgePolicy, OverlayPolicy};

/// Selectors that reveal modal-like surfaces.
pub const DEFAULT_CATALOGUE: &[&str] = &[
    "dialog[open]",
    "[role=\"dialog\"]",
    "[role=\"alertdialog\"]",
    "[aria-modal=\"true\"]",
    "[role=\"menu\"]",
    "[role=\"listbox\"]",
    ".modal",
    "[class*=\"modal\"]",
    "[class*=\"dialog\"]",
    "[class*=\"drawer\"]",
    "[class*=\"popover\"]",
    "[class*=\"popup\"]",
    "[class*=\"dropdown-menu\"]",
    "[class*=\"overlay\"]",
    "[data-state=\"open\"]",
];

/// Everything the engine treats as an interactive control.
pub const INTERACTIVE_SELECTOR: &str = "input, textarea, select, button, a[href], [contenteditable], \
[role=\"button\"], [role=\"link\"], [role=\"checkbox\"], [role=\"radio\"], [role=\"textbox\"], \
[role=\"combobox\"], [role=\"menuitem\"], [role=\"tab\"], [role=\"switch\"], [role=\"option\"], \
.ProseMirror, [data-lexical-editor], .public-DraftEditor-content, .ql-editor";

const CONTENT_MARKERS: &str = "form, h1, h2, h3, h4, h5, h6";
const HEADINGS: &str = "h1, h2, h3, h4, h5, h6, [role=\"heading\"]";

/// Ordered view of the visible overlays, lowest z first.
#[derive(Debug, Clone)]
pub struct OverlayStack {
    catalogue: Vec<String>,
    policy: OverlayPolicy,
    judge: JudgePolicy,
    contexts: Vec<OverlayContext>,
}

struct Candidate {
    node: NodeRef,
    content: NodeRef,
    order: usize,
    z: i64,
}

impl OverlayStack {
    pub fn new(policy: OverlayPolicy, judge: JudgePolicy) -> Result<Self, PerceiverError> {
        let mut catalogue: Vec<String> = DEFAULT_CATALOGUE.iter().map(|s| s.to_string()).collect();
        for extra in &policy.extra_selectors {
            Selector::parse(extra)
                .map_err(|err| PerceiverError::invalid_catalogue(extra.clone(), err.to_string()))?;
            catalogue.push(extra.clone());
        }
        Ok(Self {
            catalogue,
            policy,
            judge,
            contexts: Vec::new(),
        })
    }

    /// Re-evaluate the catalogue against the live document.
    pub fn scan<D>(&mut self, doc: &D) -> &[OverlayContext]
    where
        D: DomQuery + ?Sized,
    {
        let order = document_order(doc);
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for selector in &self.catalogue {
            let matches = match doc.query_selector_all(None, selector) {
                Ok(matches) => matches,
                Err(err) => {
                    warn!(selector = %selector, error = %err, "overlay selector failed");
                    continue;
                }
            };
            for node in matches {
                if !seen.insert(node) {
                    continue;
                }
                if !judges::is_visible(doc, node, &self.judge) {
                    continue;
                }
                let rect = doc.bounding_box(node);
                if rect.width < self.policy.min_width || rect.height < self.policy.min_height {
                    continue;
                }
                let content = if rect.covers(&doc.viewport()) {
                    self.resolve_content(doc, node)
                } else {
                    node
                };
                if !content_bearing(doc, content) {
                    debug!(node = ?node, "skipping overlay candidate without content");
                    continue;
                }
                candidates.push(Candidate {
                    node,
                    content,
                    order: order.get(&node).copied().unwrap_or(usize::MAX),
                    z: effective_z(doc, node),
                });
            }
        }
        candidates.sort_by_key(|c| c.order);

        let mut accepted: Vec<Candidate> = Vec::new();
        for candidate in candidates {
            let nested = accepted
                .iter()
                .any(|outer| outer.z == candidate.z && doc.is_within(candidate.node, outer.node));
            if !nested {
                accepted.push(candidate);
            }
        }
        accepted.sort_by_key(|c| (c.z, c.order));

        self.contexts = accepted
            .into_iter()
            .map(|candidate| self.describe(doc, candidate))
            .collect();
        debug!(overlays = self.contexts.len(), "overlay scan complete");
        &self.contexts
    }

    pub fn contexts(&self) -> &[OverlayContext] {
        &self.contexts
    }

    pub fn get_top_overlay(&self) -> Option<&OverlayContext> {
        self.contexts.last()
    }

    pub fn get_active_context(&self) -> OverlayContext {
        self.get_top_overlay()
            .cloned()
            .unwrap_or_else(OverlayContext::page)
    }

    pub fn contains<D>(&self, doc: &D, context: &OverlayContext, node: NodeRef) -> bool
    where
        D: DomQuery + ?Sized,
    {
        context.contains(doc, node)
    }

    pub fn clear(&mut self) {
        self.contexts.clear();
    }

    fn describe<D>(&self, doc: &D, candidate: Candidate) -> OverlayContext
    where
        D: DomQuery + ?Sized,
    {
        let root = candidate.node;
        let content = candidate.content;
        let full_viewport = doc.bounding_box(root).covers(&doc.viewport());
        let kind = classify(doc, root);
        let role = doc.attribute(root, "role").unwrap_or_default();
        let blocking = doc
            .attribute(root, "aria-modal")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
            || matches!(role.as_str(), "dialog" | "alertdialog")
            || matches!(kind, OverlayKind::Modal | OverlayKind::Dialog)
            || full_viewport;
        OverlayContext {
            kind,
            root: Some(root),
            content: Some(content),
            title: overlay_title(doc, root, content),
            blocking,
            z_order: candidate.z,
        }
    }

    /// Backdrops wrap the real surface; find the descendant that holds it.
    fn resolve_content<D>(&self, doc: &D, root: NodeRef) -> NodeRef
    where
        D: DomQuery + ?Sized,
    {
        let viewport = doc.viewport();
        let descendants = doc.query_selector_all(Some(root), "*").unwrap_or_default();
        for node in &descendants {
            if doc.bounding_box(*node).covers(&viewport) || !judges::is_visible(doc, *node, &self.judge) {
                continue;
            }
            let is_marker = doc
                .tag_name(*node)
                .map(|tag| tag == "form" || is_heading_tag(&tag))
                .unwrap_or(false);
            let has_marker = is_marker
                || doc
                    .query_selector_all(Some(*node), CONTENT_MARKERS)
                    .map(|found| !found.is_empty())
                    .unwrap_or(false);
            if has_marker && !is_marker {
                return *node;
            }
        }
        doc.children(root)
            .into_iter()
            .filter(|child| {
                !doc.bounding_box(*child).covers(&viewport) && judges::is_visible(doc, *child, &self.judge)
            })
            .max_by(|a, b| {
                doc.bounding_box(*a)
                    .area()
                    .total_cmp(&doc.bounding_box(*b).area())
            })
            .unwrap_or(root)
    }
}

impl Default for OverlayStack {
    fn default() -> Self {
        Self {
            catalogue: DEFAULT_CATALOGUE.iter().map(|s| s.to_string()).collect(),
            policy: OverlayPolicy::default(),
            judge: JudgePolicy::default(),
            contexts: Vec::new(),
        }
    }
}

fn document_order<D>(doc: &D) -> HashMap<NodeRef, usize>
where
    D: DomQuery + ?Sized,
{
    doc.query_selector_all(None, "*")
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, node)| (node, index))
        .collect()
}

/// A surface counts only when it holds a control, a heading or a form.
fn content_bearing<D>(doc: &D, content: NodeRef) -> bool
where
    D: DomQuery + ?Sized,
{
    [INTERACTIVE_SELECTOR, CONTENT_MARKERS].iter().any(|selector| {
        doc.query_selector_all(Some(content), selector)
            .map(|found| !found.is_empty())
            .unwrap_or(false)
    })
}

/// Own z-index, else the nearest positioned ancestor's, else 0.
fn effective_z<D>(doc: &D, node: NodeRef) -> i64
where
    D: DomQuery + ?Sized,
{
    let mut current = Some(node);
    while let Some(candidate) = current {
        let style = doc.computed_style(candidate);
        if let Some(z) = style.z_index {
            if candidate == node || style.positioned() {
                return i64::from(z);
            }
        }
        current = doc.parent(candidate);
    }
    0
}

fn classify<D>(doc: &D, root: NodeRef) -> OverlayKind
where
    D: DomQuery + ?Sized,
{
    let role = doc.attribute(root, "role").unwrap_or_default().to_ascii_lowercase();
    match role.as_str() {
        "dialog" | "alertdialog" => return OverlayKind::Dialog,
        "menu" | "menubar" => return OverlayKind::Menu,
        "listbox" => return OverlayKind::Dropdown,
        _ => {}
    }
    if doc.tag_name(root).as_deref() == Some("dialog") {
        return OverlayKind::Dialog;
    }
    let class = doc.attribute(root, "class").unwrap_or_default().to_ascii_lowercase();
    const KEYWORDS: &[(&str, OverlayKind)] = &[
        ("modal", OverlayKind::Modal),
        ("drawer", OverlayKind::Drawer),
        ("offcanvas", OverlayKind::Drawer),
        ("dropdown", OverlayKind::Dropdown),
        ("menu", OverlayKind::Menu),
        ("popover", OverlayKind::Popup),
        ("popup", OverlayKind::Popup),
        ("dialog", OverlayKind::Dialog),
        ("overlay", OverlayKind::Overlay),
    ];
    KEYWORDS
        .iter()
        .find(|(keyword, _)| class.contains(keyword))
        .map(|(_, kind)| *kind)
        .unwrap_or(if doc.has_attribute(root, "aria-modal") {
            OverlayKind::Modal
        } else {
            OverlayKind::Overlay
        })
}

fn overlay_title<D>(doc: &D, root: NodeRef, content: NodeRef) -> Option<String>
where
    D: DomQuery + ?Sized,
{
    for node in [root, content] {
        if let Some(label) = doc.attribute(node, "aria-label").map(|s| s.trim().to_string()) {
            if !label.is_empty() {
                return Some(label);
            }
        }
        if let Some(ids) = doc.attribute(node, "aria-labelledby") {
            let text = labelled_by_text(doc, &ids);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    doc.query_selector_all(Some(content), HEADINGS)
        .ok()
        .and_then(|headings| headings.into_iter().next())
        .map(|heading| collapse_whitespace(&doc.text_content(heading)))
        .filter(|text| !text.is_empty())
}

/// Joined text of every element referenced by an `aria-labelledby` list.
pub fn labelled_by_text<D>(doc: &D, ids: &str) -> String
where
    D: DomQuery + ?Sized,
{
    ids.split_whitespace()
        .filter_map(|id| {
            let selector = pagepilot_dom::attr_selector(None, "id", id);
            doc.query_selector_all(None, &selector)
                .ok()
                .and_then(|found| found.into_iter().next())
        })
        .map(|node| collapse_whitespace(&doc.text_content(node)))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_heading_tag(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagepilot_dom::{ElementSpec, PageBuilder};

    #[test]
    fn classify_prefers_role_over_class() {
        let doc = PageBuilder::new("https://c.test", "C")
            .children([
                ElementSpec::new("div").attr("role", "dialog").attr("class", "drawer"),
                ElementSpec::new("div").attr("class", "side-drawer"),
                ElementSpec::new("ul").attr("class", "dropdown-menu"),
                ElementSpec::new("dialog").attr("open", ""),
            ])
            .build();
        let kinds: Vec<OverlayKind> = ["[role=\"dialog\"]", ".side-drawer", "ul", "dialog"]
            .iter()
            .map(|sel| classify(&doc, doc.find(sel).unwrap()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                OverlayKind::Dialog,
                OverlayKind::Drawer,
                OverlayKind::Dropdown,
                OverlayKind::Dialog
            ]
        );
    }

    #[test]
    fn effective_z_uses_positioned_ancestor() {
        let doc = PageBuilder::new("https://z.test", "Z")
            .child(
                ElementSpec::new("div")
                    .attr("id", "layer")
                    .layer("fixed", 40)
                    .child(ElementSpec::new("div").attr("id", "inner")),
            )
            .build();
        assert_eq!(effective_z(&doc, doc.find("#inner").unwrap()), 40);
        assert_eq!(effective_z(&doc, doc.body()), 0);
    }

    #[test]
    fn invalid_extra_selector_is_rejected() {
        let policy = OverlayPolicy {
            extra_selectors: vec!["div:hover".into()],
            ..OverlayPolicy::default()
        };
        let err = OverlayStack::new(policy, JudgePolicy::default()).unwrap_err();
        assert!(matches!(err, PerceiverError::InvalidCatalogue { .. }));
    }
}
