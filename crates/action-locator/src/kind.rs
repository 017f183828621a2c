//! Kind detection, roles and human-readable labels

use pagepilot_core_types::NodeRef;
use pagepilot_dom::{attr_selector, DomQuery};
use perceiver_structural::labelled_by_text;

use crate::types::{EditorFamily, ElementKind};

/// Recognise a rich-text editor root by the markers its library leaves.
pub fn editor_family<D>(doc: &D, node: NodeRef) -> Option<EditorFamily>
where
    D: DomQuery + ?Sized,
{
    if doc.has_attribute(node, "data-lexical-editor") {
        return Some(EditorFamily::Lexical);
    }
    doc.class_list(node)
        .iter()
        .find_map(|class| match class.as_str() {
            "ProseMirror" => Some(EditorFamily::ProseMirror),
            "public-DraftEditor-content" => Some(EditorFamily::Draft),
            "ql-editor" => Some(EditorFamily::Quill),
            _ => None,
        })
}

pub fn is_content_editable<D>(doc: &D, node: NodeRef) -> bool
where
    D: DomQuery + ?Sized,
{
    matches!(
        doc.attribute(node, "contenteditable").as_deref(),
        Some("" | "true" | "plaintext-only")
    )
}

pub fn input_type<D>(doc: &D, node: NodeRef) -> String
where
    D: DomQuery + ?Sized,
{
    doc.attribute(node, "type")
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "text".to_string())
}

pub fn detect_kind<D>(doc: &D, node: NodeRef) -> ElementKind
where
    D: DomQuery + ?Sized,
{
    if let Some(family) = editor_family(doc, node) {
        return ElementKind::RichText(family);
    }
    let tag = doc.tag_name(node).unwrap_or_default();
    match tag.as_str() {
        "select" => return ElementKind::Select,
        "input" => {
            return match input_type(doc, node).as_str() {
                "checkbox" | "radio" => ElementKind::Checkbox,
                "button" | "submit" | "reset" | "image" => ElementKind::Button,
                _ => ElementKind::StandardInput,
            }
        }
        "textarea" => return ElementKind::StandardInput,
        "button" => return ElementKind::Button,
        "a" if doc.has_attribute(node, "href") => return ElementKind::Link,
        _ => {}
    }
    let role = doc.attribute(node, "role").unwrap_or_default().to_ascii_lowercase();
    match role.as_str() {
        "checkbox" | "radio" | "switch" => return ElementKind::Checkbox,
        "button" | "menuitem" | "tab" | "option" => return ElementKind::Button,
        "link" => return ElementKind::Link,
        _ => {}
    }
    if is_content_editable(doc, node) {
        ElementKind::ContentEditable
    } else {
        ElementKind::Unknown
    }
}

/// Explicit role, or the one the tag implies.
pub fn role_of<D>(doc: &D, node: NodeRef) -> Option<String>
where
    D: DomQuery + ?Sized,
{
    if let Some(role) = doc
        .attribute(node, "role")
        .map(|r| r.trim().to_ascii_lowercase())
        .filter(|r| !r.is_empty())
    {
        return Some(role);
    }
    let tag = doc.tag_name(node)?;
    let implied = match tag.as_str() {
        "button" => "button",
        "a" if doc.has_attribute(node, "href") => "link",
        "select" => "combobox",
        "textarea" => "textbox",
        "input" => match input_type(doc, node).as_str() {
            "checkbox" => "checkbox",
            "radio" => "radio",
            "button" | "submit" | "reset" | "image" => "button",
            "range" => "slider",
            _ => "textbox",
        },
        _ => return None,
    };
    Some(implied.to_string())
}

/// Collapsed, trimmed text content.
pub fn visible_text<D>(doc: &D, node: NodeRef) -> String
where
    D: DomQuery + ?Sized,
{
    collapse(&doc.text_content(node))
}

/// Text of the `<label for>` pointing at the node, or of a wrapping `<label>`.
pub fn associated_label<D>(doc: &D, node: NodeRef) -> Option<String>
where
    D: DomQuery + ?Sized,
{
    if let Some(id) = doc.attribute(node, "id").filter(|id| !id.is_empty()) {
        let selector = attr_selector(Some("label"), "for", &id);
        if let Some(label) = doc
            .query_selector_all(None, &selector)
            .ok()
            .and_then(|found| found.into_iter().next())
        {
            let text = visible_text(doc, label);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    let mut current = doc.parent(node);
    while let Some(ancestor) = current {
        if doc.tag_name(ancestor).as_deref() == Some("label") {
            let text = visible_text(doc, ancestor);
            return (!text.is_empty()).then_some(text);
        }
        current = doc.parent(ancestor);
    }
    None
}

/// Best human-readable label, capped at `max_chars`.
pub fn element_label<D>(doc: &D, node: NodeRef, kind: ElementKind, max_chars: usize) -> String
where
    D: DomQuery + ?Sized,
{
    let attr = |name: &str| {
        doc.attribute(node, name)
            .map(|v| collapse(&v))
            .filter(|v| !v.is_empty())
    };
    let label = attr("aria-label")
        .or_else(|| {
            doc.attribute(node, "aria-labelledby")
                .map(|ids| labelled_by_text(doc, &ids))
                .filter(|text| !text.is_empty())
        })
        .or_else(|| associated_label(doc, node))
        .or_else(|| attr("placeholder"))
        .or_else(|| attr("title"))
        .or_else(|| {
            let text = visible_text(doc, node);
            (!text.is_empty() && !kind.is_fillable()).then_some(text)
        })
        .or_else(|| match kind {
            ElementKind::Button => attr("value"),
            _ => None,
        })
        .or_else(|| attr("name"))
        .unwrap_or_default();
    truncate_chars(&label, max_chars)
}

pub(crate) fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].trim_end().to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagepilot_dom::{ElementSpec, PageBuilder};

    #[test]
    fn kinds_follow_detection_order() {
        let doc = PageBuilder::new("https://k.test", "K")
            .children([
                ElementSpec::new("div")
                    .attr("class", "ql-editor")
                    .attr("contenteditable", "true"),
                ElementSpec::new("input").attr("type", "radio"),
                ElementSpec::new("input").attr("type", "submit"),
                ElementSpec::new("textarea"),
                ElementSpec::new("a").attr("href", "/docs"),
                ElementSpec::new("a"),
                ElementSpec::new("div").attr("role", "switch"),
                ElementSpec::new("div").attr("contenteditable", ""),
            ])
            .build();
        let kinds: Vec<ElementKind> = doc
            .children(doc.body())
            .into_iter()
            .map(|node| detect_kind(&doc, node))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ElementKind::RichText(EditorFamily::Quill),
                ElementKind::Checkbox,
                ElementKind::Button,
                ElementKind::StandardInput,
                ElementKind::Link,
                ElementKind::Unknown,
                ElementKind::Checkbox,
                ElementKind::ContentEditable,
            ]
        );
    }

    #[test]
    fn labels_prefer_aria_then_label_elements() {
        let doc = PageBuilder::new("https://l.test", "L")
            .children([
                ElementSpec::new("label").attr("for", "mail").text("Work email"),
                ElementSpec::new("input").attr("id", "mail"),
                ElementSpec::new("label")
                    .text("Nickname ")
                    .child(ElementSpec::new("input").attr("name", "nick")),
                ElementSpec::new("input")
                    .attr("aria-label", "Search")
                    .attr("placeholder", "Type here"),
                ElementSpec::new("input")
                    .attr("type", "submit")
                    .attr("value", "Send"),
            ])
            .build();
        let label = |sel: &str| {
            let node = doc.find(sel).unwrap();
            element_label(&doc, node, detect_kind(&doc, node), 80)
        };
        assert_eq!(label("#mail"), "Work email");
        assert_eq!(label("input[name=\"nick\"]"), "Nickname");
        assert_eq!(label("input[aria-label]"), "Search");
        assert_eq!(label("input[type=\"submit\"]"), "Send");
    }

    #[test]
    fn implied_roles() {
        let doc = PageBuilder::new("https://r.test", "R")
            .children([
                ElementSpec::new("button").text("Go"),
                ElementSpec::new("select"),
                ElementSpec::new("div").attr("role", "Tab"),
                ElementSpec::new("div"),
            ])
            .build();
        let roles: Vec<Option<String>> = doc
            .children(doc.body())
            .into_iter()
            .map(|node| role_of(&doc, node))
            .collect();
        assert_eq!(
            roles,
            vec![
                Some("button".to_string()),
                Some("combobox".to_string()),
                Some("tab".to_string()),
                None
            ]
        );
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 80), "short");
    }
}
