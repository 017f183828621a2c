//! Declarative element descriptions and the page builder

use std::collections::BTreeMap;

use pagepilot_core_types::{NodeRef, Rect, Viewport};
use serde::{Deserialize, Serialize};

use super::FixtureDocument;
use crate::model::NodeStyle;

/// Host-page reaction to a click on an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickEffect {
    /// Set `display: block` on every match.
    Show(String),
    /// Set `display: none` on every match.
    Hide(String),
    /// Detach every match.
    Remove(String),
    SetTitle(String),
    Navigate(String),
    /// Flip `aria-checked` between `"true"` and `"false"` on every match.
    ToggleAriaChecked(String),
}

/// One element (and its subtree) of a fixture page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ElementSpec {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub text: Option<String>,
    pub value: Option<String>,
    pub rect: Option<Rect>,
    pub style: Option<NodeStyle>,
    /// Imitate a view-framework controlled input.
    pub controlled: bool,
    pub checked: Option<bool>,
    /// For `<option>` children of a select.
    pub selected: bool,
    pub on_click: Vec<ClickEffect>,
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = Some(Rect::new(x, y, width, height));
        self
    }

    pub fn style(mut self, style: NodeStyle) -> Self {
        self.style = Some(style);
        self
    }

    fn style_mut(&mut self) -> &mut NodeStyle {
        self.style.get_or_insert_with(NodeStyle::default)
    }

    pub fn display(mut self, display: &str) -> Self {
        self.style_mut().display = display.to_string();
        self
    }

    pub fn visibility(mut self, visibility: &str) -> Self {
        self.style_mut().visibility = visibility.to_string();
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.style_mut().opacity = opacity;
        self
    }

    /// Positioned layer with an explicit stacking order.
    pub fn layer(mut self, position: &str, z_index: i32) -> Self {
        let style = self.style_mut();
        style.position = position.to_string();
        style.z_index = Some(z_index);
        self
    }

    pub fn controlled(mut self) -> Self {
        self.controlled = true;
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.on_click.push(effect);
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ElementSpec>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Builds a [`FixtureDocument`] whose `<body>` holds the given elements.
#[derive(Debug, Clone)]
pub struct PageBuilder {
    url: String,
    title: String,
    viewport: Viewport,
    body: Vec<ElementSpec>,
}

impl PageBuilder {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            viewport: Viewport::default(),
            body: Vec::new(),
        }
    }

    pub fn viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = Viewport { width, height };
        self
    }

    pub fn child(mut self, element: ElementSpec) -> Self {
        self.body.push(element);
        self
    }

    pub fn children(mut self, elements: impl IntoIterator<Item = ElementSpec>) -> Self {
        self.body.extend(elements);
        self
    }

    pub fn build(self) -> FixtureDocument {
        let doc = FixtureDocument::new(self.url, self.title, self.viewport);
        let body = doc.body();
        for element in &self.body {
            doc.append(body, element);
        }
        doc
    }

    /// Build and also return the node created for each top-level element.
    pub fn build_with_nodes(self) -> (FixtureDocument, Vec<NodeRef>) {
        let doc = FixtureDocument::new(self.url, self.title, self.viewport);
        let body = doc.body();
        let nodes = self
            .body
            .iter()
            .map(|element| doc.append(body, element))
            .collect();
        (doc, nodes)
    }
}
