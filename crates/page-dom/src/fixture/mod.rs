//! In-memory document implementing the document port
//!
//! The fixture keeps an arena of nodes behind a single lock and imitates the
//! host-page behaviours the engine has to cope with: framework-controlled
//! inputs, rich-text editors that insist on pointer activation, click
//! handlers that reveal or hide content, hidden ancestors and scroll offsets.

mod builder;
mod editor;
mod spec;

pub use builder::{ClickEffect, ElementSpec, PageBuilder};
pub use editor::FixtureEditor;
pub use spec::PageSpec;

use pagepilot_core_types::{NodeRef, Rect, Viewport};
use parking_lot::Mutex;
use tracing::debug;

use self::editor::EditorState;
use crate::errors::DomError;
use crate::model::{DomEvent, NodeStyle, SelectOption};
use crate::ports::{DomInput, DomQuery};
use crate::selector::{Selector, SelectorTree};

/// Attribute that makes a checkbox swallow clicks without toggling.
pub const INERT_ATTRIBUTE: &str = "data-fixture-inert";

/// React-style value tracking: the framework only notices writes that the
/// tracker did not see.
#[derive(Debug, Clone)]
struct Controlled {
    state: String,
    tracker: String,
}

#[derive(Debug, Clone)]
struct FixtureNode {
    tag: String,
    attrs: Vec<(String, String)>,
    parent: Option<NodeRef>,
    children: Vec<NodeRef>,
    text: String,
    style: NodeStyle,
    rect: Rect,
    value: Option<String>,
    controlled: Option<Controlled>,
    checked: Option<bool>,
    selected: bool,
    on_click: Vec<ClickEffect>,
    editor: Option<EditorState>,
    scroll: (f64, f64),
    highlighted: bool,
    connected: bool,
}

impl FixtureNode {
    fn element(tag: &str, rect: Rect) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            parent: None,
            children: Vec::new(),
            text: String::new(),
            style: NodeStyle::default(),
            rect,
            value: None,
            controlled: None,
            checked: None,
            selected: false,
            on_click: Vec::new(),
            editor: None,
            scroll: (0.0, 0.0),
            highlighted: false,
            connected: true,
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Selection {
    node: NodeRef,
    start: usize,
    end: usize,
}

#[derive(Debug)]
struct FixtureState {
    url: String,
    title: String,
    viewport: Viewport,
    nodes: Vec<FixtureNode>,
    focused: Option<NodeRef>,
    selection: Option<Selection>,
    events: Vec<(NodeRef, DomEvent)>,
    scroll: (f64, f64),
}

const DEFAULT_ELEMENT_SIZE: (f64, f64) = (120.0, 24.0);

impl FixtureState {
    fn get(&self, node: NodeRef) -> Option<&FixtureNode> {
        self.nodes.get(node.0 as usize).filter(|n| n.connected)
    }

    fn get_mut(&mut self, node: NodeRef) -> Option<&mut FixtureNode> {
        self.nodes.get_mut(node.0 as usize).filter(|n| n.connected)
    }

    fn attached(&self, node: NodeRef) -> Result<&FixtureNode, DomError> {
        self.get(node).ok_or(DomError::Detached(node))
    }

    fn attached_mut(&mut self, node: NodeRef) -> Result<&mut FixtureNode, DomError> {
        self.get_mut(node).ok_or(DomError::Detached(node))
    }

    fn text_content(&self, node: NodeRef) -> String {
        let Some(entry) = self.get(node) else {
            return String::new();
        };
        let mut out = entry.text.clone();
        for child in &entry.children {
            out.push_str(&self.text_content(*child));
        }
        out
    }

    /// Pre-order descendants of `scope`, excluding `scope` itself.
    fn descendants(&self, scope: NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeRef> = match self.get(scope) {
            Some(entry) => entry.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(node) = stack.pop() {
            if let Some(entry) = self.get(node) {
                out.push(node);
                stack.extend(entry.children.iter().rev().copied());
            }
        }
        out
    }

    fn ancestors_inclusive(&self, node: NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut current = Some(node);
        while let Some(candidate) = current {
            let Some(entry) = self.get(candidate) else {
                break;
            };
            out.push(candidate);
            current = entry.parent;
        }
        out
    }

    fn display_none_chain(&self, node: NodeRef) -> bool {
        self.ancestors_inclusive(node)
            .into_iter()
            .any(|n| self.get(n).map(|e| e.style.display == "none").unwrap_or(true))
    }

    fn editor_host(&self, node: NodeRef) -> Option<NodeRef> {
        self.ancestors_inclusive(node)
            .into_iter()
            .find(|n| self.get(*n).map(|e| e.editor.is_some()).unwrap_or(false))
    }

    fn disabled(&self, node: NodeRef) -> bool {
        self.get(node)
            .map(|e| e.attr("disabled").is_some())
            .unwrap_or(false)
    }

    fn query(&self, scope: Option<NodeRef>, selector: &str) -> Result<Vec<NodeRef>, DomError> {
        let parsed = Selector::parse(selector)?;
        let scope = scope.unwrap_or(NodeRef(0));
        Ok(self
            .descendants(scope)
            .into_iter()
            .filter(|node| parsed.matches(self, *node))
            .collect())
    }

    fn option_nodes(&self, select: NodeRef) -> Vec<NodeRef> {
        self.descendants(select)
            .into_iter()
            .filter(|n| self.get(*n).map(|e| e.tag == "option").unwrap_or(false))
            .collect()
    }

    fn selected_index(&self, select: NodeRef) -> Option<usize> {
        let options = self.option_nodes(select);
        if options.is_empty() {
            return None;
        }
        options
            .iter()
            .position(|n| self.get(*n).map(|e| e.selected).unwrap_or(false))
            .or(Some(0))
    }

    fn option_value(&self, option: NodeRef) -> String {
        match self.get(option).and_then(|e| e.attr("value")) {
            Some(value) => value.to_string(),
            None => self.text_content(option).trim().to_string(),
        }
    }

    fn insert(&mut self, parent: NodeRef, spec: &ElementSpec) -> NodeRef {
        let id = NodeRef(self.nodes.len() as u64);
        let tag = spec.tag.to_ascii_lowercase();
        let (width, height) = DEFAULT_ELEMENT_SIZE;
        let mut node = FixtureNode::element(&tag, spec.rect.unwrap_or(Rect::new(0.0, 0.0, width, height)));
        node.attrs = spec
            .attrs
            .iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), value.clone()))
            .collect();
        node.parent = Some(parent);
        node.text = spec.text.clone().unwrap_or_default();
        node.style = spec.style.clone().unwrap_or_default();
        node.on_click = spec.on_click.clone();
        node.selected = spec.selected || node.attr("selected").is_some();

        let input_type = node
            .attr("type")
            .map(|t| t.to_ascii_lowercase())
            .unwrap_or_else(|| "text".to_string());
        let toggles = tag == "input" && matches!(input_type.as_str(), "checkbox" | "radio");
        node.value = match tag.as_str() {
            "input" if toggles => Some(spec.value.clone().or_else(|| node.attr("value").map(str::to_string)).unwrap_or_else(|| "on".to_string())),
            "input" => Some(spec.value.clone().or_else(|| node.attr("value").map(str::to_string)).unwrap_or_default()),
            "textarea" => Some(spec.value.clone().or_else(|| spec.text.clone()).unwrap_or_default()),
            _ => None,
        };
        if toggles {
            node.checked = Some(spec.checked.unwrap_or_else(|| node.attr("checked").is_some()));
        }
        if spec.controlled {
            let initial = node.value.clone().unwrap_or_default();
            node.controlled = Some(Controlled {
                state: initial.clone(),
                tracker: initial,
            });
        }
        let editable = matches!(node.attr("contenteditable"), Some("" | "true" | "plaintext-only"));
        let family = if editable {
            FixtureEditor::detect(node.attr("class"), node.attr("data-lexical-editor").is_some())
        } else {
            None
        };

        self.nodes.push(node);
        if let Some(parent_node) = self.nodes.get_mut(parent.0 as usize) {
            parent_node.children.push(id);
        }
        for child in &spec.children {
            self.insert(id, child);
        }
        if editable {
            let text = self.text_content(id);
            if let Some(entry) = self.get_mut(id) {
                entry.editor = Some(EditorState::new(family, &text));
            }
        }
        id
    }

    fn detach(&mut self, node: NodeRef) {
        let parent = self.get(node).and_then(|e| e.parent);
        if let Some(parent) = parent.and_then(|p| self.get_mut(p)) {
            parent.children.retain(|child| *child != node);
        }
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.nodes.get_mut(current.0 as usize) {
                entry.connected = false;
                stack.extend(entry.children.iter().copied());
            }
        }
        if self.focused.map(|f| !self.is_attached(f)).unwrap_or(false) {
            self.focused = None;
        }
        if self.selection.map(|s| !self.is_attached(s.node)).unwrap_or(false) {
            self.selection = None;
        }
    }

    fn is_attached(&self, node: NodeRef) -> bool {
        self.get(node).is_some()
    }

    /// Replace the node's contents with a single run of text.
    fn replace_text(&mut self, node: NodeRef, text: &str) {
        let children = self.get(node).map(|e| e.children.clone()).unwrap_or_default();
        for child in children {
            self.detach(child);
        }
        if let Some(entry) = self.get_mut(node) {
            entry.text = text.to_string();
        }
    }

    fn apply_click_effects(&mut self, effects: &[ClickEffect]) {
        for effect in effects {
            match effect {
                ClickEffect::Show(selector) | ClickEffect::Hide(selector) => {
                    let display = if matches!(effect, ClickEffect::Show(_)) {
                        "block"
                    } else {
                        "none"
                    };
                    for node in self.query(None, selector).unwrap_or_default() {
                        if let Some(entry) = self.get_mut(node) {
                            entry.style.display = display.to_string();
                        }
                    }
                }
                ClickEffect::Remove(selector) => {
                    for node in self.query(None, selector).unwrap_or_default() {
                        self.detach(node);
                    }
                }
                ClickEffect::SetTitle(title) => self.title = title.clone(),
                ClickEffect::Navigate(url) => {
                    debug!(from = %self.url, to = %url, "fixture navigation");
                    self.url = url.clone();
                }
                ClickEffect::ToggleAriaChecked(selector) => {
                    for node in self.query(None, selector).unwrap_or_default() {
                        if let Some(entry) = self.get_mut(node) {
                            let next = if entry.attr("aria-checked") == Some("true") {
                                "false"
                            } else {
                                "true"
                            };
                            entry.set_attr("aria-checked", next);
                        }
                    }
                }
            }
        }
    }

    fn handle_click(&mut self, node: NodeRef) {
        if let Some(host) = self.editor_host(node) {
            if let Some(editor) = self.get_mut(host).and_then(|e| e.editor.as_mut()) {
                editor.on_click();
            }
        }
        let toggle = self
            .get(node)
            .filter(|e| e.attr(INERT_ATTRIBUTE).is_none())
            .and_then(|e| e.checked.map(|checked| (checked, e.attr("type") == Some("radio"))));
        if let Some((checked, radio)) = toggle {
            if let Some(entry) = self.get_mut(node) {
                entry.checked = Some(radio || !checked);
            }
        }
        let effects: Vec<ClickEffect> = self
            .ancestors_inclusive(node)
            .into_iter()
            .filter_map(|n| self.get(n).map(|e| e.on_click.clone()))
            .flatten()
            .collect();
        self.apply_click_effects(&effects);
    }

    fn handle_input(&mut self, node: NodeRef) {
        if let Some(entry) = self.get_mut(node) {
            if let (Some(controlled), Some(value)) = (entry.controlled.as_mut(), entry.value.as_mut()) {
                if *value != controlled.tracker {
                    controlled.state = value.clone();
                    controlled.tracker = value.clone();
                } else {
                    // re-render writes state back through the tracked setter
                    *value = controlled.state.clone();
                    controlled.tracker = controlled.state.clone();
                }
            }
        }
        let Some(host) = self.editor_host(node) else {
            return;
        };
        let owns_model = self
            .get(host)
            .and_then(|e| e.editor.as_ref())
            .map(EditorState::owns_model)
            .unwrap_or(false);
        if owns_model {
            let model = self
                .get(host)
                .and_then(|e| e.editor.as_ref())
                .map(|e| e.model.clone())
                .unwrap_or_default();
            if self.text_content(host) != model {
                self.replace_text(host, &model);
            }
        } else {
            let text = self.text_content(host);
            if let Some(editor) = self.get_mut(host).and_then(|e| e.editor.as_mut()) {
                editor.model = text;
            }
        }
    }

    /// Resolve the editing host for the current selection when it accepts
    /// commands.
    fn command_target(&self) -> Option<(NodeRef, Selection)> {
        let selection = self.selection?;
        let host = self.editor_host(selection.node)?;
        let focused = self.focused?;
        if !self.ancestors_inclusive(focused).contains(&host) {
            return None;
        }
        let ready = self
            .get(host)
            .and_then(|e| e.editor.as_ref())
            .map(EditorState::accepts_commands)
            .unwrap_or(false);
        ready.then_some((host, selection))
    }

    fn edit_host(&mut self, host: NodeRef, start: usize, end: usize, insert: &str) {
        let current: Vec<char> = self.text_content(host).chars().collect();
        let end = end.min(current.len());
        let start = start.min(end);
        let mut next: String = current[..start].iter().collect();
        next.push_str(insert);
        next.extend(current[end..].iter());
        self.replace_text(host, &next);
        if let Some(editor) = self.get_mut(host).and_then(|e| e.editor.as_mut()) {
            editor.model = next;
        }
        let caret = start + insert.chars().count();
        self.selection = Some(Selection {
            node: host,
            start: caret,
            end: caret,
        });
    }
}

impl SelectorTree for FixtureState {
    fn tag(&self, node: NodeRef) -> Option<String> {
        self.get(node).map(|e| e.tag.clone())
    }

    fn attr(&self, node: NodeRef, name: &str) -> Option<String> {
        self.get(node).and_then(|e| e.attr(name)).map(str::to_string)
    }

    fn parent_of(&self, node: NodeRef) -> Option<NodeRef> {
        self.get(node).and_then(|e| e.parent)
    }

    fn children_of(&self, node: NodeRef) -> Vec<NodeRef> {
        self.get(node).map(|e| e.children.clone()).unwrap_or_default()
    }
}

/// In-memory page used by tests and the offline CLI.
#[derive(Debug)]
pub struct FixtureDocument {
    state: Mutex<FixtureState>,
}

impl FixtureDocument {
    /// Empty `<html><body></body></html>` document.
    pub fn new(url: impl Into<String>, title: impl Into<String>, viewport: Viewport) -> Self {
        let page = Rect::new(0.0, 0.0, viewport.width, viewport.height);
        let html = FixtureNode::element("html", page);
        let mut body = FixtureNode::element("body", page);
        body.parent = Some(NodeRef(0));
        let mut nodes = vec![html, body];
        nodes[0].children.push(NodeRef(1));
        Self {
            state: Mutex::new(FixtureState {
                url: url.into(),
                title: title.into(),
                viewport,
                nodes,
                focused: None,
                selection: None,
                events: Vec::new(),
                scroll: (0.0, 0.0),
            }),
        }
    }

    pub fn body(&self) -> NodeRef {
        NodeRef(1)
    }

    /// Append `spec` (with its subtree) as the last child of `parent`.
    pub fn append(&self, parent: NodeRef, spec: &ElementSpec) -> NodeRef {
        self.state.lock().insert(parent, spec)
    }

    /// First match of `selector`; `None` when nothing matches or the
    /// selector is invalid.
    pub fn find(&self, selector: &str) -> Option<NodeRef> {
        self.state
            .lock()
            .query(None, selector)
            .ok()
            .and_then(|nodes| nodes.into_iter().next())
    }

    pub fn remove(&self, node: NodeRef) {
        self.state.lock().detach(node);
    }

    pub fn set_style(&self, node: NodeRef, style: NodeStyle) {
        if let Some(entry) = self.state.lock().get_mut(node) {
            entry.style = style;
        }
    }

    pub fn set_display(&self, node: NodeRef, display: &str) {
        if let Some(entry) = self.state.lock().get_mut(node) {
            entry.style.display = display.to_string();
        }
    }

    pub fn set_attribute(&self, node: NodeRef, name: &str, value: &str) {
        if let Some(entry) = self.state.lock().get_mut(node) {
            entry.set_attr(&name.to_ascii_lowercase(), value);
        }
    }

    pub fn remove_attribute(&self, node: NodeRef, name: &str) {
        if let Some(entry) = self.state.lock().get_mut(node) {
            entry.attrs.retain(|(key, _)| key != name);
        }
    }

    pub fn set_rect(&self, node: NodeRef, rect: Rect) {
        if let Some(entry) = self.state.lock().get_mut(node) {
            entry.rect = rect;
        }
    }

    pub fn navigate(&self, url: impl Into<String>) {
        self.state.lock().url = url.into();
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.state.lock().title = title.into();
    }

    /// Events dispatched to `node`, oldest first.
    pub fn events_for(&self, node: NodeRef) -> Vec<DomEvent> {
        self.state
            .lock()
            .events
            .iter()
            .filter(|(target, _)| *target == node)
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn event_names_for(&self, node: NodeRef) -> Vec<&'static str> {
        self.events_for(node).iter().map(DomEvent::name).collect()
    }

    pub fn clear_events(&self) {
        self.state.lock().events.clear();
    }

    /// Scroll offset of `node`, or of the document when `None`.
    pub fn scroll_position(&self, node: Option<NodeRef>) -> (f64, f64) {
        let state = self.state.lock();
        match node {
            None => state.scroll,
            Some(node) => state.get(node).map(|e| e.scroll).unwrap_or((0.0, 0.0)),
        }
    }

    pub fn is_highlighted(&self, node: NodeRef) -> bool {
        self.state
            .lock()
            .get(node)
            .map(|e| e.highlighted)
            .unwrap_or(false)
    }

    /// Model text of an editing host, as the editor library sees it.
    pub fn editor_model(&self, node: NodeRef) -> Option<String> {
        self.state
            .lock()
            .get(node)
            .and_then(|e| e.editor.as_ref())
            .map(|e| e.model.clone())
    }
}

impl DomQuery for FixtureDocument {
    fn url(&self) -> String {
        self.state.lock().url.clone()
    }

    fn title(&self) -> String {
        self.state.lock().title.clone()
    }

    fn viewport(&self) -> Viewport {
        self.state.lock().viewport
    }

    fn root(&self) -> NodeRef {
        NodeRef(0)
    }

    fn query_selector_all(
        &self,
        scope: Option<NodeRef>,
        selector: &str,
    ) -> Result<Vec<NodeRef>, DomError> {
        let state = self.state.lock();
        if let Some(scope) = scope {
            state.attached(scope)?;
        }
        state.query(scope, selector)
    }

    fn is_connected(&self, node: NodeRef) -> bool {
        self.state.lock().is_attached(node)
    }

    fn tag_name(&self, node: NodeRef) -> Option<String> {
        self.state.lock().get(node).map(|e| e.tag.clone())
    }

    fn attribute(&self, node: NodeRef, name: &str) -> Option<String> {
        self.state
            .lock()
            .get(node)
            .and_then(|e| e.attr(&name.to_ascii_lowercase()))
            .map(str::to_string)
    }

    fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.state.lock().get(node).and_then(|e| e.parent)
    }

    fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.state.lock().children_of(node)
    }

    fn text_content(&self, node: NodeRef) -> String {
        self.state.lock().text_content(node)
    }

    fn computed_style(&self, node: NodeRef) -> NodeStyle {
        self.state
            .lock()
            .get(node)
            .map(|e| e.style.clone())
            .unwrap_or_default()
    }

    fn bounding_box(&self, node: NodeRef) -> Rect {
        let state = self.state.lock();
        match state.get(node) {
            Some(entry) if !state.display_none_chain(node) => entry.rect,
            _ => Rect::default(),
        }
    }

    fn value(&self, node: NodeRef) -> Option<String> {
        let state = self.state.lock();
        let entry = state.get(node)?;
        if entry.tag == "select" {
            let index = state.selected_index(node)?;
            let option = *state.option_nodes(node).get(index)?;
            return Some(state.option_value(option));
        }
        entry.value.clone()
    }

    fn checked(&self, node: NodeRef) -> Option<bool> {
        self.state.lock().get(node).and_then(|e| e.checked)
    }

    fn disabled(&self, node: NodeRef) -> bool {
        self.state.lock().disabled(node)
    }

    fn options(&self, node: NodeRef) -> Vec<SelectOption> {
        let state = self.state.lock();
        let selected = state.selected_index(node);
        state
            .option_nodes(node)
            .into_iter()
            .enumerate()
            .map(|(index, option)| SelectOption {
                value: state.option_value(option),
                text: state.text_content(option).trim().to_string(),
                selected: selected == Some(index),
                disabled: state.disabled(option),
            })
            .collect()
    }

    fn focused(&self) -> Option<NodeRef> {
        let state = self.state.lock();
        state.focused.filter(|node| state.is_attached(*node))
    }
}

impl DomInput for FixtureDocument {
    fn focus(&self, node: NodeRef) -> Result<(), DomError> {
        let mut state = self.state.lock();
        state.attached(node)?;
        if state.disabled(node) || state.focused == Some(node) {
            return Ok(());
        }
        if let Some(previous) = state.focused.take() {
            state.events.push((previous, DomEvent::Blur));
            let previous_host = state.editor_host(previous);
            let next_host = state.editor_host(node);
            if let Some(host) = previous_host.filter(|h| Some(*h) != next_host) {
                if let Some(editor) = state.get_mut(host).and_then(|e| e.editor.as_mut()) {
                    editor.on_blur();
                }
            }
        }
        state.focused = Some(node);
        state.events.push((node, DomEvent::Focus));
        Ok(())
    }

    fn dispatch(&self, node: NodeRef, event: DomEvent) -> Result<bool, DomError> {
        let mut state = self.state.lock();
        state.attached(node)?;
        state.events.push((node, event.clone()));
        let disabled = state.disabled(node);
        match event {
            DomEvent::Click if disabled => Ok(false),
            DomEvent::PointerDown | DomEvent::PointerUp if disabled => Ok(false),
            DomEvent::MouseDown | DomEvent::MouseUp if disabled => Ok(false),
            DomEvent::Click => {
                state.handle_click(node);
                Ok(true)
            }
            DomEvent::MouseDown | DomEvent::MouseUp => {
                if let Some(host) = state.editor_host(node) {
                    if let Some(editor) = state.get_mut(host).and_then(|e| e.editor.as_mut()) {
                        if event == DomEvent::MouseDown {
                            editor.on_mouse_down();
                        } else {
                            editor.on_mouse_up();
                        }
                    }
                }
                Ok(true)
            }
            DomEvent::Input { .. } => {
                state.handle_input(node);
                Ok(true)
            }
            DomEvent::Blur => {
                if let Some(host) = state.editor_host(node) {
                    if let Some(editor) = state.get_mut(host).and_then(|e| e.editor.as_mut()) {
                        editor.on_blur();
                    }
                }
                if state.focused == Some(node) {
                    state.focused = None;
                }
                Ok(true)
            }
            _ => Ok(true),
        }
    }

    fn set_value_property(&self, node: NodeRef, value: &str) -> Result<(), DomError> {
        let mut state = self.state.lock();
        let entry = state.attached_mut(node)?;
        if entry.tag == "select" {
            return Err(DomError::Unsupported("select value is set by index".to_string()));
        }
        let Some(current) = entry.value.as_mut() else {
            return Err(DomError::NotEditable(node));
        };
        *current = value.to_string();
        if let Some(controlled) = entry.controlled.as_mut() {
            controlled.tracker = value.to_string();
        }
        Ok(())
    }

    fn set_value_native(&self, node: NodeRef, value: &str) -> Result<(), DomError> {
        let mut state = self.state.lock();
        let entry = state.attached_mut(node)?;
        if entry.tag == "select" {
            return Err(DomError::Unsupported("select value is set by index".to_string()));
        }
        match entry.value.as_mut() {
            Some(current) => {
                *current = value.to_string();
                Ok(())
            }
            None => Err(DomError::NotEditable(node)),
        }
    }

    fn set_checked_native(&self, node: NodeRef, checked: bool) -> Result<(), DomError> {
        let mut state = self.state.lock();
        let entry = state.attached_mut(node)?;
        match entry.checked.as_mut() {
            Some(current) => {
                *current = checked;
                Ok(())
            }
            None => Err(DomError::NotEditable(node)),
        }
    }

    fn set_selected_index(&self, node: NodeRef, index: usize) -> Result<(), DomError> {
        let mut state = self.state.lock();
        state.attached(node)?;
        let options = state.option_nodes(node);
        if index >= options.len() {
            return Err(DomError::Unsupported(format!(
                "option index {index} out of range ({} options)",
                options.len()
            )));
        }
        for (position, option) in options.into_iter().enumerate() {
            if let Some(entry) = state.get_mut(option) {
                entry.selected = position == index;
            }
        }
        Ok(())
    }

    fn select_contents(&self, node: NodeRef) -> Result<(), DomError> {
        let mut state = self.state.lock();
        state.attached(node)?;
        let end = state.text_content(node).chars().count();
        state.selection = Some(Selection {
            node,
            start: 0,
            end,
        });
        Ok(())
    }

    fn collapse_to_end(&self, node: NodeRef) -> Result<(), DomError> {
        let mut state = self.state.lock();
        state.attached(node)?;
        let end = state.text_content(node).chars().count();
        state.selection = Some(Selection {
            node,
            start: end,
            end,
        });
        Ok(())
    }

    fn exec_insert_text(&self, text: &str) -> Result<bool, DomError> {
        let mut state = self.state.lock();
        let Some((host, selection)) = state.command_target() else {
            return Ok(false);
        };
        state.edit_host(host, selection.start, selection.end, text);
        Ok(true)
    }

    fn exec_delete(&self) -> Result<bool, DomError> {
        let mut state = self.state.lock();
        let Some((host, selection)) = state.command_target() else {
            return Ok(false);
        };
        let (start, end) = if selection.start == selection.end {
            (selection.start.saturating_sub(1), selection.end)
        } else {
            (selection.start, selection.end)
        };
        state.edit_host(host, start, end, "");
        Ok(true)
    }

    fn set_text_content(&self, node: NodeRef, text: &str) -> Result<(), DomError> {
        let mut state = self.state.lock();
        state.attached(node)?;
        state.replace_text(node, text);
        Ok(())
    }

    fn scroll_by(&self, node: Option<NodeRef>, dx: f64, dy: f64) -> Result<(), DomError> {
        let mut state = self.state.lock();
        let offset = match node {
            None => &mut state.scroll,
            Some(node) => &mut state.attached_mut(node)?.scroll,
        };
        offset.0 = (offset.0 + dx).max(0.0);
        offset.1 = (offset.1 + dy).max(0.0);
        Ok(())
    }

    fn scroll_into_view(&self, node: NodeRef) -> Result<(), DomError> {
        self.state.lock().attached(node).map(|_| ())
    }

    fn set_highlight(&self, node: NodeRef, on: bool) -> Result<(), DomError> {
        self.state.lock().attached_mut(node)?.highlighted = on;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_page() -> FixtureDocument {
        PageBuilder::new("https://app.test/signup", "Sign up")
            .child(
                ElementSpec::new("form").attr("id", "signup").children([
                    ElementSpec::new("input").attr("name", "email").controlled(),
                    ElementSpec::new("input").attr("name", "plain"),
                    ElementSpec::new("input")
                        .attr("type", "checkbox")
                        .attr("name", "terms"),
                    ElementSpec::new("select").attr("name", "plan").children([
                        ElementSpec::new("option").attr("value", "free").text("Free"),
                        ElementSpec::new("option").attr("value", "pro").text("Pro"),
                    ]),
                    ElementSpec::new("button")
                        .text("Create")
                        .on_click(ClickEffect::SetTitle("Welcome".into())),
                ]),
            )
            .build()
    }

    #[test]
    fn controlled_input_rejects_plain_writes() {
        let doc = form_page();
        let email = doc.find("input[name=\"email\"]").unwrap();
        doc.set_value_property(email, "a@b.test").unwrap();
        doc.dispatch(email, DomEvent::input()).unwrap();
        assert_eq!(doc.value(email).as_deref(), Some(""));

        doc.set_value_native(email, "a@b.test").unwrap();
        doc.dispatch(email, DomEvent::input()).unwrap();
        assert_eq!(doc.value(email).as_deref(), Some("a@b.test"));
    }

    #[test]
    fn uncontrolled_input_keeps_plain_writes() {
        let doc = form_page();
        let plain = doc.find("input[name=\"plain\"]").unwrap();
        doc.set_value_property(plain, "x").unwrap();
        doc.dispatch(plain, DomEvent::input()).unwrap();
        assert_eq!(doc.value(plain).as_deref(), Some("x"));
    }

    #[test]
    fn click_toggles_checkbox_and_runs_effects() {
        let doc = form_page();
        let terms = doc.find("input[type=\"checkbox\"]").unwrap();
        assert_eq!(doc.checked(terms), Some(false));
        assert!(doc.dispatch(terms, DomEvent::Click).unwrap());
        assert_eq!(doc.checked(terms), Some(true));

        let button = doc.find("button").unwrap();
        doc.dispatch(button, DomEvent::Click).unwrap();
        assert_eq!(doc.title(), "Welcome");
    }

    #[test]
    fn aria_checked_toggle_effect_flips_attribute() {
        let doc = PageBuilder::new("https://prefs.test", "Prefs")
            .child(
                ElementSpec::new("div")
                    .attr("role", "switch")
                    .attr("aria-checked", "false")
                    .on_click(ClickEffect::ToggleAriaChecked("[role=\"switch\"]".into())),
            )
            .build();
        let switch = doc.find("[role=\"switch\"]").unwrap();
        assert_eq!(doc.checked(switch), None);
        doc.dispatch(switch, DomEvent::Click).unwrap();
        assert_eq!(doc.attribute(switch, "aria-checked").as_deref(), Some("true"));
        doc.dispatch(switch, DomEvent::Click).unwrap();
        assert_eq!(doc.attribute(switch, "aria-checked").as_deref(), Some("false"));
    }

    #[test]
    fn disabled_nodes_ignore_clicks() {
        let doc = form_page();
        let button = doc.find("button").unwrap();
        doc.set_attribute(button, "disabled", "");
        assert!(!doc.dispatch(button, DomEvent::Click).unwrap());
        assert_eq!(doc.title(), "Sign up");
    }

    #[test]
    fn select_reports_selected_option() {
        let doc = form_page();
        let select = doc.find("select").unwrap();
        assert_eq!(doc.value(select).as_deref(), Some("free"));
        doc.set_selected_index(select, 1).unwrap();
        assert_eq!(doc.value(select).as_deref(), Some("pro"));
        assert!(doc.options(select)[1].selected);
        assert!(doc.set_selected_index(select, 5).is_err());
    }

    #[test]
    fn hidden_ancestor_zeroes_geometry() {
        let doc = form_page();
        let form = doc.find("#signup").unwrap();
        let plain = doc.find("input[name=\"plain\"]").unwrap();
        assert!(!doc.bounding_box(plain).is_empty());
        doc.set_display(form, "none");
        assert!(doc.bounding_box(plain).is_empty());
    }

    #[test]
    fn removed_nodes_report_detached() {
        let doc = form_page();
        let plain = doc.find("input[name=\"plain\"]").unwrap();
        doc.remove(plain);
        assert!(!doc.is_connected(plain));
        assert_eq!(doc.focus(plain), Err(DomError::Detached(plain)));
        assert!(doc.find("input[name=\"plain\"]").is_none());
    }

    fn editor_page(class: &str) -> (FixtureDocument, NodeRef) {
        let (doc, nodes) = PageBuilder::new("https://docs.test", "Doc")
            .child(
                ElementSpec::new("div")
                    .attr("contenteditable", "true")
                    .attr("class", class)
                    .text("old"),
            )
            .build_with_nodes();
        (doc, nodes[0])
    }

    #[test]
    fn rich_editor_needs_activation_before_commands() {
        let (doc, editor) = editor_page("ProseMirror");
        doc.focus(editor).unwrap();
        doc.select_contents(editor).unwrap();
        assert!(!doc.exec_insert_text("new").unwrap());

        for event in [DomEvent::MouseDown, DomEvent::MouseUp, DomEvent::Click] {
            doc.dispatch(editor, event).unwrap();
        }
        doc.select_contents(editor).unwrap();
        assert!(doc.exec_delete().unwrap());
        assert!(doc.exec_insert_text("new").unwrap());
        assert_eq!(doc.text_content(editor), "new");
        assert_eq!(doc.editor_model(editor).as_deref(), Some("new"));
    }

    #[test]
    fn model_owning_editor_reverts_direct_text_writes() {
        let (doc, editor) = editor_page("ProseMirror");
        doc.set_text_content(editor, "hacked").unwrap();
        doc.dispatch(editor, DomEvent::input()).unwrap();
        assert_eq!(doc.text_content(editor), "old");

        let (quill, root) = editor_page("ql-editor");
        quill.set_text_content(root, "replaced").unwrap();
        quill.dispatch(root, DomEvent::input()).unwrap();
        assert_eq!(quill.text_content(root), "replaced");
        assert_eq!(quill.editor_model(root).as_deref(), Some("replaced"));
    }

    #[test]
    fn plain_contenteditable_accepts_after_focus() {
        let (doc, editor) = editor_page("notes");
        doc.focus(editor).unwrap();
        doc.collapse_to_end(editor).unwrap();
        assert!(doc.exec_insert_text("!").unwrap());
        assert_eq!(doc.text_content(editor), "old!");
    }

    #[test]
    fn scroll_offsets_clamp_at_zero() {
        let doc = form_page();
        doc.scroll_by(None, 0.0, 300.0).unwrap();
        doc.scroll_by(None, 0.0, -500.0).unwrap();
        assert_eq!(doc.scroll_position(None), (0.0, 0.0));
        let form = doc.find("form").unwrap();
        doc.scroll_by(Some(form), 0.0, 40.0).unwrap();
        assert_eq!(doc.scroll_position(Some(form)), (0.0, 40.0));
    }
}
