use pagepilot_core_types::{NodeRef, Rect, Viewport};

use crate::errors::DomError;
use crate::model::{DomEvent, NodeStyle, SelectOption};

/// Read side of the live document.
///
/// Every method is a synchronous call into the document's own execution
/// context. Reads on a detached node return neutral values (`None`, empty
/// collections, a zero rect) rather than errors.
pub trait DomQuery: Send + Sync {
    fn url(&self) -> String;
    fn title(&self) -> String;
    fn viewport(&self) -> Viewport;

    /// The document element; every attached node descends from it.
    fn root(&self) -> NodeRef;

    /// `querySelectorAll` semantics: matches are descendants of `scope`
    /// (the whole document when `None`), in document order.
    fn query_selector_all(
        &self,
        scope: Option<NodeRef>,
        selector: &str,
    ) -> Result<Vec<NodeRef>, DomError>;

    fn is_connected(&self, node: NodeRef) -> bool;
    /// Lower-case tag name.
    fn tag_name(&self, node: NodeRef) -> Option<String>;
    fn attribute(&self, node: NodeRef, name: &str) -> Option<String>;
    fn parent(&self, node: NodeRef) -> Option<NodeRef>;
    fn children(&self, node: NodeRef) -> Vec<NodeRef>;
    fn text_content(&self, node: NodeRef) -> String;
    fn computed_style(&self, node: NodeRef) -> NodeStyle;
    fn bounding_box(&self, node: NodeRef) -> Rect;

    /// `None` when the node has no `value` property at all.
    fn value(&self, node: NodeRef) -> Option<String>;
    fn checked(&self, node: NodeRef) -> Option<bool>;
    fn disabled(&self, node: NodeRef) -> bool;
    fn options(&self, node: NodeRef) -> Vec<SelectOption>;
    fn focused(&self) -> Option<NodeRef>;

    fn has_attribute(&self, node: NodeRef, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// True when `node` is `ancestor` or lies beneath it.
    fn is_within(&self, node: NodeRef, ancestor: NodeRef) -> bool {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.parent(candidate);
        }
        false
    }

    fn class_list(&self, node: NodeRef) -> Vec<String> {
        self.attribute(node, "class")
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Write side of the live document.
pub trait DomInput: Send + Sync {
    fn focus(&self, node: NodeRef) -> Result<(), DomError>;

    /// Dispatch a trusted-looking event. Returns `false` when the page
    /// cancelled it (or ignored it, e.g. on a disabled control).
    fn dispatch(&self, node: NodeRef, event: DomEvent) -> Result<bool, DomError>;

    /// Assign `value` through whatever property accessor the page installed.
    fn set_value_property(&self, node: NodeRef, value: &str) -> Result<(), DomError>;

    /// Assign `value` through the element prototype's own setter, bypassing
    /// wrappers installed by view frameworks.
    fn set_value_native(&self, node: NodeRef, value: &str) -> Result<(), DomError>;

    fn set_checked_native(&self, node: NodeRef, checked: bool) -> Result<(), DomError>;
    fn set_selected_index(&self, node: NodeRef, index: usize) -> Result<(), DomError>;

    /// Selection API: select the full contents of `node`.
    fn select_contents(&self, node: NodeRef) -> Result<(), DomError>;
    /// Selection API: collapse the caret to the end of `node`.
    fn collapse_to_end(&self, node: NodeRef) -> Result<(), DomError>;

    /// `document.execCommand('insertText')` against the current selection.
    fn exec_insert_text(&self, text: &str) -> Result<bool, DomError>;
    /// `document.execCommand('delete')` against the current selection.
    fn exec_delete(&self) -> Result<bool, DomError>;

    fn set_text_content(&self, node: NodeRef, text: &str) -> Result<(), DomError>;

    /// Scroll the node's own box, or the document when `None`.
    fn scroll_by(&self, node: Option<NodeRef>, dx: f64, dy: f64) -> Result<(), DomError>;
    fn scroll_into_view(&self, node: NodeRef) -> Result<(), DomError>;

    /// Purely visual marker; never affects page behaviour.
    fn set_highlight(&self, node: NodeRef, on: bool) -> Result<(), DomError>;
}

/// Full document port used by the engine.
pub trait PageDocument: DomQuery + DomInput {}

impl<T> PageDocument for T where T: DomQuery + DomInput {}
