//! Element registry: discovery, stable addressing and lookup

use std::collections::HashMap;

use pagepilot_core_types::NodeRef;
use pagepilot_dom::DomQuery;
use perceiver_structural::{
    judges, JudgePolicy, OverlayContext, OverlayPolicy, OverlayStack, INTERACTIVE_SELECTOR,
};
use tokio::time::Instant;
use tracing::debug;

use crate::config::RegistryConfig;
use crate::errors::LocatorError;
use crate::kind::{self, detect_kind, element_label, is_content_editable};
use crate::strategies::{derive_id, derive_selector, ElementFacts};
use crate::types::{ElementHandle, ElementKind};

/// Map of interactive elements keyed by stable id.
///
/// The registry always enumerates the whole document so ids are the same
/// whichever overlay is on top; `in_active_overlay` marks the elements that
/// belong to the current interaction surface.
#[derive(Debug, Clone)]
pub struct ElementRegistry {
    config: RegistryConfig,
    judge: JudgePolicy,
    overlays: OverlayStack,
    handles: Vec<ElementHandle>,
    by_id: HashMap<String, usize>,
    by_node: HashMap<NodeRef, usize>,
    last_scan: Option<Instant>,
}

impl ElementRegistry {
    pub fn new(config: RegistryConfig, overlay: OverlayPolicy) -> Result<Self, LocatorError> {
        let judge = config.judge_policy();
        let overlays = OverlayStack::new(overlay, judge.clone())?;
        Ok(Self {
            config,
            judge,
            overlays,
            handles: Vec::new(),
            by_id: HashMap::new(),
            by_node: HashMap::new(),
            last_scan: None,
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Rebuild the map when forced or when the throttle interval elapsed;
    /// otherwise return the cached map.
    pub fn scan<D>(&mut self, doc: &D, force: bool) -> &[ElementHandle]
    where
        D: DomQuery + ?Sized,
    {
        if !force {
            if let Some(last) = self.last_scan {
                if last.elapsed() < self.config.throttle() {
                    return &self.handles;
                }
            }
        }
        self.rebuild(doc);
        &self.handles
    }

    fn rebuild<D>(&mut self, doc: &D)
    where
        D: DomQuery + ?Sized,
    {
        self.overlays.scan(doc);
        let active = self.overlays.get_active_context();

        let discovered = match doc.query_selector_all(None, INTERACTIVE_SELECTOR) {
            Ok(nodes) => nodes,
            Err(err) => {
                debug!(error = %err, "interactive discovery failed");
                Vec::new()
            }
        };

        let mut editing_hosts: Vec<NodeRef> = Vec::new();
        let mut handles = Vec::new();
        let mut seen_ids: HashMap<String, usize> = HashMap::new();
        for node in discovered {
            if editing_hosts.iter().any(|host| doc.is_within(node, *host)) {
                continue;
            }
            if !is_interactive(doc, node) || !judges::is_visible(doc, node, &self.judge) {
                continue;
            }
            let mut handle = self.build_handle(doc, node, handles.len(), &active);
            if matches!(handle.kind, ElementKind::RichText(_) | ElementKind::ContentEditable) {
                editing_hosts.push(node);
            }
            let count = seen_ids.entry(handle.id.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                handle.id = format!("{}-{}", handle.id, count);
            }
            handles.push(handle);
        }

        self.by_id = handles
            .iter()
            .enumerate()
            .map(|(index, handle)| (handle.id.clone(), index))
            .collect();
        self.by_node = handles
            .iter()
            .enumerate()
            .map(|(index, handle)| (handle.node, index))
            .collect();
        self.handles = handles;
        self.last_scan = Some(Instant::now());
        debug!(
            elements = self.handles.len(),
            context = %active.kind,
            "element scan complete"
        );
    }

    fn build_handle<D>(
        &self,
        doc: &D,
        node: NodeRef,
        scan_index: usize,
        active: &OverlayContext,
    ) -> ElementHandle
    where
        D: DomQuery + ?Sized,
    {
        let facts = ElementFacts::gather(doc, node, scan_index);
        let kind = detect_kind(doc, node);
        ElementHandle {
            id: derive_id(&facts),
            node,
            kind,
            tag: facts.tag.clone(),
            label: element_label(doc, node, kind, self.config.label_max_chars),
            selector: derive_selector(doc, node, &facts),
            enabled: judges::enabled(doc, node).ok,
            required: doc.has_attribute(node, "required")
                || doc
                    .attribute(node, "aria-required")
                    .map(|v| v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false),
            current_value: current_value(doc, node, kind),
            bounding_box: doc.bounding_box(node),
            in_active_overlay: active.contains(doc, node),
        }
    }

    /// Handles from the last scan, in document order.
    pub fn handles(&self) -> &[ElementHandle] {
        &self.handles
    }

    pub fn handles_in_active_overlay(&self) -> Vec<ElementHandle> {
        self.handles
            .iter()
            .filter(|handle| handle.in_active_overlay)
            .cloned()
            .collect()
    }

    pub fn overlays(&self) -> &OverlayStack {
        &self.overlays
    }

    pub fn active_context(&self) -> OverlayContext {
        self.overlays.get_active_context()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Look up by id, re-scanning once when the entry is missing or its
    /// node left the document.
    pub fn get<D>(&mut self, doc: &D, id: &str) -> Option<ElementHandle>
    where
        D: DomQuery + ?Sized,
    {
        if let Some(handle) = self.cached(doc, id) {
            return Some(handle);
        }
        debug!(id, "registry miss, forcing re-scan");
        self.rebuild(doc);
        self.cached(doc, id)
    }

    fn cached<D>(&mut self, doc: &D, id: &str) -> Option<ElementHandle>
    where
        D: DomQuery + ?Sized,
    {
        let index = *self.by_id.get(id)?;
        let node = self.handles.get(index)?.node;
        if !doc.is_connected(node) {
            self.by_id.remove(id);
            self.by_node.remove(&node);
            return None;
        }
        let handle = self.handles.get_mut(index)?;
        refresh(doc, handle);
        Some(handle.clone())
    }

    /// Resolve a raw selector against the live document: first visible
    /// match. A match the registry has not seen yet triggers one forced scan
    /// so the handle carries the id a scan gives it; nodes that are not
    /// interactive controls resolve to `None`.
    pub fn get_by_selector<D>(&mut self, doc: &D, selector: &str) -> Option<ElementHandle>
    where
        D: DomQuery + ?Sized,
    {
        let matches = match doc.query_selector_all(None, selector) {
            Ok(matches) => matches,
            Err(err) => {
                debug!(selector, error = %err, "selector lookup failed");
                return None;
            }
        };
        let node = matches
            .into_iter()
            .find(|node| judges::is_visible(doc, *node, &self.judge))?;
        if !self.by_node.contains_key(&node) {
            debug!(selector, "selector match not registered, rescanning");
            self.rebuild(doc);
        }
        let index = self.by_node.get(&node).copied()?;
        let handle = self.handles.get_mut(index)?;
        refresh(doc, handle);
        Some(handle.clone())
    }

    /// Id first, then selector.
    pub fn resolve<D>(&mut self, doc: &D, target: &str) -> Result<ElementHandle, LocatorError>
    where
        D: DomQuery + ?Sized,
    {
        let target = target.trim();
        if target.is_empty() {
            return Err(LocatorError::InvalidTarget("empty target".to_string()));
        }
        self.get(doc, target)
            .or_else(|| self.get_by_selector(doc, target))
            .ok_or_else(|| LocatorError::ElementNotFound(target.to_string()))
    }

    /// Forget the cached map; the next scan hits the document.
    pub fn invalidate(&mut self) {
        self.handles.clear();
        self.by_id.clear();
        self.by_node.clear();
        self.last_scan = None;
        self.overlays.clear();
    }
}

fn is_interactive<D>(doc: &D, node: NodeRef) -> bool
where
    D: DomQuery + ?Sized,
{
    let tag = doc.tag_name(node).unwrap_or_default();
    if tag == "input" && kind::input_type(doc, node) == "hidden" {
        return false;
    }
    if doc.has_attribute(node, "contenteditable")
        && !is_content_editable(doc, node)
        && detect_kind(doc, node) == ElementKind::Unknown
    {
        return false;
    }
    true
}

fn current_value<D>(doc: &D, node: NodeRef, kind: ElementKind) -> Option<String>
where
    D: DomQuery + ?Sized,
{
    match kind {
        ElementKind::StandardInput | ElementKind::Select => doc.value(node),
        ElementKind::Checkbox => doc
            .checked(node)
            .or_else(|| {
                doc.attribute(node, "aria-checked")
                    .map(|v| v.eq_ignore_ascii_case("true"))
            })
            .map(|checked| checked.to_string()),
        ElementKind::RichText(_) | ElementKind::ContentEditable => {
            Some(kind::visible_text(doc, node))
        }
        ElementKind::Unknown => doc.value(node),
        ElementKind::Button | ElementKind::Link => None,
    }
}

fn refresh<D>(doc: &D, handle: &mut ElementHandle)
where
    D: DomQuery + ?Sized,
{
    handle.current_value = current_value(doc, handle.node, handle.kind);
    handle.enabled = judges::enabled(doc, handle.node).ok;
    handle.bounding_box = doc.bounding_box(handle.node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagepilot_dom::{ElementSpec, PageBuilder};

    fn registry() -> ElementRegistry {
        ElementRegistry::new(RegistryConfig::unthrottled(), OverlayPolicy::default()).unwrap()
    }

    #[test]
    fn hidden_inputs_and_engine_ui_are_skipped() {
        let doc = PageBuilder::new("https://s.test", "S")
            .children([
                ElementSpec::new("input").attr("type", "hidden").attr("name", "csrf"),
                ElementSpec::new("input").attr("name", "visible"),
                ElementSpec::new("div")
                    .attr("id", "pagepilot-root")
                    .child(ElementSpec::new("button").text("Stop")),
                ElementSpec::new("div").attr("contenteditable", "false"),
            ])
            .build();
        let mut reg = registry();
        let ids: Vec<String> = reg.scan(&doc, true).iter().map(|h| h.id.clone()).collect();
        assert_eq!(ids, vec!["name-visible".to_string()]);
    }

    #[test]
    fn editor_descendants_are_folded_into_the_root() {
        let doc = PageBuilder::new("https://e.test", "E")
            .child(
                ElementSpec::new("div")
                    .attr("class", "ProseMirror")
                    .attr("contenteditable", "true")
                    .attr("aria-label", "Body")
                    .child(ElementSpec::new("a").attr("href", "#x").text("link")),
            )
            .build();
        let mut reg = registry();
        let handles = reg.scan(&doc, true).to_vec();
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].id, "label-body");
        assert!(matches!(handles[0].kind, ElementKind::RichText(_)));
    }

    #[test]
    fn colliding_ids_get_suffixes_in_document_order() {
        let doc = PageBuilder::new("https://c.test", "C")
            .children([
                ElementSpec::new("button").text("Edit"),
                ElementSpec::new("button").text("Edit"),
                ElementSpec::new("button").text("Edit"),
            ])
            .build();
        let mut reg = registry();
        let ids: Vec<String> = reg.scan(&doc, true).iter().map(|h| h.id.clone()).collect();
        assert_eq!(ids, vec!["role-button-edit", "role-button-edit-2", "role-button-edit-3"]);
        let selectors: Vec<String> = reg.handles().iter().map(|h| h.selector.clone()).collect();
        assert_eq!(selectors[1], "html > body:nth-of-type(1) > button:nth-of-type(2)");
    }

    #[test]
    fn resolve_reports_missing_targets() {
        let doc = PageBuilder::new("https://m.test", "M").build();
        let mut reg = registry();
        reg.scan(&doc, true);
        assert_eq!(
            reg.resolve(&doc, "name-ghost"),
            Err(LocatorError::ElementNotFound("name-ghost".into()))
        );
        assert!(reg.get_by_selector(&doc, "div:hover").is_none());
        assert!(matches!(reg.resolve(&doc, "  "), Err(LocatorError::InvalidTarget(_))));
    }
}
