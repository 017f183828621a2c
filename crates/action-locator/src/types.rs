//! Core types for the element registry

use std::fmt;

use pagepilot_core_types::{NodeRef, Rect};
use serde::{Serialize, Serializer};

/// Rich-text editor libraries with their own insertion rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorFamily {
    ProseMirror,
    Lexical,
    Draft,
    Quill,
}

impl EditorFamily {
    pub fn name(&self) -> &'static str {
        match self {
            EditorFamily::ProseMirror => "prosemirror",
            EditorFamily::Lexical => "lexical",
            EditorFamily::Draft => "draft",
            EditorFamily::Quill => "quill",
        }
    }

    pub fn all() -> [EditorFamily; 4] {
        [
            EditorFamily::ProseMirror,
            EditorFamily::Lexical,
            EditorFamily::Draft,
            EditorFamily::Quill,
        ]
    }
}

/// Element kind enumeration
///
/// Decides which fill strategy the input simulator uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    StandardInput,
    RichText(EditorFamily),
    Select,
    Checkbox,
    Button,
    Link,
    ContentEditable,
    Unknown,
}

impl ElementKind {
    pub fn is_fillable(&self) -> bool {
        matches!(
            self,
            ElementKind::StandardInput
                | ElementKind::RichText(_)
                | ElementKind::ContentEditable
                | ElementKind::Unknown
        )
    }

    pub fn is_clickable(&self) -> bool {
        !matches!(self, ElementKind::Unknown)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::StandardInput => f.write_str("input"),
            ElementKind::RichText(family) => write!(f, "richtext-{}", family.name()),
            ElementKind::Select => f.write_str("select"),
            ElementKind::Checkbox => f.write_str("checkbox"),
            ElementKind::Button => f.write_str("button"),
            ElementKind::Link => f.write_str("link"),
            ElementKind::ContentEditable => f.write_str("editable"),
            ElementKind::Unknown => f.write_str("element"),
        }
    }
}

impl Serialize for ElementKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Registered interactive element
///
/// `node` is a weak reference: the page may drop the element at any time,
/// in which case the handle is discarded on the next access.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementHandle {
    /// Stable id, identical across scans of an unchanged document
    pub id: String,
    #[serde(skip)]
    pub node: NodeRef,
    pub kind: ElementKind,
    pub tag: String,
    pub label: String,
    /// Selector matching exactly this element at scan time
    pub selector: String,
    pub enabled: bool,
    pub required: bool,
    pub current_value: Option<String>,
    pub bounding_box: Rect,
    pub in_active_overlay: bool,
}
