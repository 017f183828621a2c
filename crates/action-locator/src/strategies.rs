//! Id and selector cascades
//!
//! Both cascades are ordered slices of pure functions over [`ElementFacts`].
//! The first strategy that yields a value wins; selector candidates are
//! additionally validated against the whole document.

use pagepilot_core_types::NodeRef;
use pagepilot_dom::{attr_selector, is_plain_ident, selector::nth_of_type, DomQuery, QueryTree};

use crate::kind::{self, collapse};

/// Attributes test suites conventionally use to pin elements.
pub const TEST_ID_ATTRIBUTES: &[&str] = &["data-testid", "data-test-id", "data-test", "data-cy", "data-qa"];

/// Framework prefixes that mark an id as generated.
const GENERATED_ID_PREFIXES: &[&str] = &[":r", "react-", "ember", "mui-", "radix-", "headlessui-", "__"];

pub const MAX_ID_LEN: usize = 48;
const LABEL_ID_MAX_CHARS: usize = 40;
const ROLE_TEXT_MAX_CHARS: usize = 30;

/// Attribute snapshot the cascades work from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementFacts {
    pub tag: String,
    /// `(attribute, value)` of the first test-id attribute present
    pub test_id: Option<(String, String)>,
    pub dom_id: Option<String>,
    pub name: Option<String>,
    pub aria_label: Option<String>,
    pub label_text: Option<String>,
    pub role: Option<String>,
    pub text: String,
    pub placeholder: Option<String>,
    /// Position in the scan list
    pub scan_index: usize,
}

impl ElementFacts {
    pub fn gather<D>(doc: &D, node: NodeRef, scan_index: usize) -> Self
    where
        D: DomQuery + ?Sized,
    {
        let non_empty = |name: &str| {
            doc.attribute(node, name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let test_id = TEST_ID_ATTRIBUTES
            .iter()
            .find_map(|attr| non_empty(attr).map(|value| (attr.to_string(), value)));
        Self {
            tag: doc.tag_name(node).unwrap_or_default(),
            test_id,
            dom_id: non_empty("id"),
            name: non_empty("name"),
            aria_label: non_empty("aria-label").map(|v| collapse(&v)),
            label_text: kind::associated_label(doc, node),
            role: kind::role_of(doc, node),
            text: kind::visible_text(doc, node),
            placeholder: non_empty("placeholder"),
            scan_index,
        }
    }

    fn static_id(&self) -> Option<&str> {
        self.dom_id.as_deref().filter(|id| !looks_generated(id))
    }
}

/// Pure id strategy: `None` means "not applicable, try the next one".
pub type IdStrategy = fn(&ElementFacts) -> Option<String>;

/// Id cascade in priority order.
pub const ID_CASCADE: &[(&str, IdStrategy)] = &[
    ("test-id", id_from_test_id),
    ("static-id", id_from_static_id),
    ("name", id_from_name),
    ("label", id_from_label),
    ("role-text", id_from_role_text),
    ("placeholder", id_from_placeholder),
    ("position", id_from_position),
];

fn id_from_test_id(facts: &ElementFacts) -> Option<String> {
    facts.test_id.as_ref().and_then(|(_, value)| prefixed("tid", value))
}

fn id_from_static_id(facts: &ElementFacts) -> Option<String> {
    facts.static_id().and_then(|id| prefixed("id", id))
}

fn id_from_name(facts: &ElementFacts) -> Option<String> {
    facts.name.as_deref().and_then(|name| prefixed("name", name))
}

/// `aria-label` first, then the associated `<label>`; each is length-checked
/// on its own so an over-long `aria-label` does not hide a usable label.
fn id_from_label(facts: &ElementFacts) -> Option<String> {
    [facts.aria_label.as_deref(), facts.label_text.as_deref()]
        .into_iter()
        .flatten()
        .filter(|label| label.chars().count() <= LABEL_ID_MAX_CHARS)
        .find_map(|label| prefixed("label", label))
}

fn id_from_role_text(facts: &ElementFacts) -> Option<String> {
    let role = facts.role.as_deref()?;
    if facts.text.is_empty() || facts.text.chars().count() > ROLE_TEXT_MAX_CHARS {
        return None;
    }
    prefixed("role", &format!("{role}-{}", facts.text))
}

fn id_from_placeholder(facts: &ElementFacts) -> Option<String> {
    facts.placeholder.as_deref().and_then(|ph| prefixed("ph", ph))
}

fn id_from_position(facts: &ElementFacts) -> Option<String> {
    let tag = if facts.tag.is_empty() { "el" } else { facts.tag.as_str() };
    prefixed("pos", &format!("{tag}-{}", facts.scan_index))
}

/// Run the id cascade; the positional strategy always answers.
pub fn derive_id(facts: &ElementFacts) -> String {
    ID_CASCADE
        .iter()
        .find_map(|(_, strategy)| strategy(facts))
        .unwrap_or_else(|| format!("pos-el-{}", facts.scan_index))
}

fn prefixed(prefix: &str, raw: &str) -> Option<String> {
    let slug = slugify(raw);
    if slug.is_empty() {
        return None;
    }
    let mut id = format!("{prefix}-{slug}");
    if id.len() > MAX_ID_LEN {
        id.truncate(MAX_ID_LEN);
        while id.ends_with('-') {
            id.pop();
        }
    }
    Some(id)
}

/// Lower-case, `[a-z0-9_-]` only, runs of other characters collapse to `-`.
pub fn slugify(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for c in raw.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Ids minted by frameworks change between renders and must not be used.
pub fn looks_generated(id: &str) -> bool {
    let lower = id.to_ascii_lowercase();
    if GENERATED_ID_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
        return true;
    }
    let mut run = 0;
    for c in lower.chars() {
        if c.is_ascii_digit() {
            run += 1;
            if run >= 4 {
                return true;
            }
        } else {
            run = 0;
        }
    }
    lower
        .split(|c: char| c == '-' || c == '_' || c == ':')
        .any(|segment| {
            segment.len() >= 8
                && segment.chars().all(|c| c.is_ascii_hexdigit())
                && segment.chars().any(|c| c.is_ascii_digit())
        })
}

/// Pure selector candidate generator.
pub type SelectorStrategy = fn(&ElementFacts) -> Option<String>;

/// Selector cascade in priority order; the ancestor path is the fallback.
pub const SELECTOR_CASCADE: &[(&str, SelectorStrategy)] = &[
    ("test-id", selector_from_test_id),
    ("static-id", selector_from_static_id),
    ("name", selector_from_name),
    ("aria-label", selector_from_aria_label),
    ("placeholder", selector_from_placeholder),
];

fn selector_from_test_id(facts: &ElementFacts) -> Option<String> {
    facts
        .test_id
        .as_ref()
        .map(|(attr, value)| attr_selector(None, attr, value))
}

fn selector_from_static_id(facts: &ElementFacts) -> Option<String> {
    facts.static_id().map(id_selector)
}

fn selector_from_name(facts: &ElementFacts) -> Option<String> {
    facts
        .name
        .as_deref()
        .map(|name| attr_selector(Some(&facts.tag), "name", name))
}

fn selector_from_aria_label(facts: &ElementFacts) -> Option<String> {
    facts
        .aria_label
        .as_deref()
        .map(|label| attr_selector(Some(&facts.tag), "aria-label", label))
}

fn selector_from_placeholder(facts: &ElementFacts) -> Option<String> {
    facts
        .placeholder
        .as_deref()
        .map(|ph| attr_selector(Some(&facts.tag), "placeholder", ph))
}

fn id_selector(id: &str) -> String {
    if is_plain_ident(id) {
        format!("#{id}")
    } else {
        attr_selector(None, "id", id)
    }
}

/// True when `selector` matches exactly `node` in the whole document.
pub fn is_unique<D>(doc: &D, selector: &str, node: NodeRef) -> bool
where
    D: DomQuery + ?Sized,
{
    matches!(doc.query_selector_all(None, selector).as_deref(), Ok([only]) if *only == node)
}

/// First cascade candidate that uniquely matches, else the ancestor path.
pub fn derive_selector<D>(doc: &D, node: NodeRef, facts: &ElementFacts) -> String
where
    D: DomQuery + ?Sized,
{
    SELECTOR_CASCADE
        .iter()
        .filter_map(|(_, strategy)| strategy(facts))
        .find(|candidate| is_unique(doc, candidate, node))
        .unwrap_or_else(|| path_selector(doc, node))
}

/// `anchor > tag:nth-of-type(n) > ...`, anchored at the nearest ancestor
/// with a unique stable selector, or at the document root.
pub fn path_selector<D>(doc: &D, node: NodeRef) -> String
where
    D: DomQuery + ?Sized,
{
    let tree = QueryTree(doc);
    let root = doc.root();
    let mut steps = Vec::new();
    let mut current = node;
    loop {
        let tag = doc.tag_name(current).unwrap_or_else(|| "*".to_string());
        if current == root {
            steps.push(tag);
            break;
        }
        let position = nth_of_type(&tree, current, &tag).unwrap_or(1);
        steps.push(format!("{tag}:nth-of-type({position})"));
        let Some(parent) = doc.parent(current) else {
            break;
        };
        if let Some(anchor) = stable_anchor(doc, parent) {
            steps.push(anchor);
            break;
        }
        current = parent;
    }
    steps.reverse();
    steps.join(" > ")
}

fn stable_anchor<D>(doc: &D, node: NodeRef) -> Option<String>
where
    D: DomQuery + ?Sized,
{
    if node == doc.root() {
        return None;
    }
    let test_id = TEST_ID_ATTRIBUTES.iter().find_map(|attr| {
        doc.attribute(node, attr)
            .filter(|v| !v.trim().is_empty())
            .map(|value| attr_selector(None, attr, &value))
    });
    let static_id = doc
        .attribute(node, "id")
        .filter(|id| !id.is_empty() && !looks_generated(id))
        .map(|id| id_selector(&id));
    [test_id, static_id]
        .into_iter()
        .flatten()
        .find(|candidate| is_unique(doc, candidate, node))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts() -> ElementFacts {
        ElementFacts {
            tag: "input".into(),
            scan_index: 3,
            ..ElementFacts::default()
        }
    }

    #[test]
    fn cascade_priority_order() {
        let mut f = facts();
        f.placeholder = Some("Your email".into());
        assert_eq!(derive_id(&f), "ph-your-email");
        f.name = Some("email".into());
        assert_eq!(derive_id(&f), "name-email");
        f.dom_id = Some("signup-email".into());
        assert_eq!(derive_id(&f), "id-signup-email");
        f.test_id = Some(("data-testid".into(), "EmailField".into()));
        assert_eq!(derive_id(&f), "tid-emailfield");
    }

    #[test]
    fn generated_ids_fall_through() {
        for generated in [":r1:", "react-select-3-input", "ember1234", "mui-42", "input-48213", "a3f9c2d1e7"] {
            assert!(looks_generated(generated), "{generated}");
        }
        for stable in ["email", "signup-email", "q", "step-2"] {
            assert!(!looks_generated(stable), "{stable}");
        }
        let mut f = facts();
        f.dom_id = Some(":r7:".into());
        assert_eq!(derive_id(&f), "pos-input-3");
    }

    #[test]
    fn label_and_role_length_limits() {
        let mut f = facts();
        f.aria_label = Some("x".repeat(41));
        f.role = Some("button".into());
        f.text = "Continue to payment".into();
        assert_eq!(derive_id(&f), "role-button-continue-to-payment");
        f.aria_label = Some("Billing address".into());
        assert_eq!(derive_id(&f), "label-billing-address");
    }

    #[test]
    fn long_aria_label_falls_back_to_label_text() {
        let mut f = facts();
        f.aria_label = Some("y".repeat(41));
        f.label_text = Some("Email".into());
        assert_eq!(derive_id(&f), "label-email");
        f.label_text = Some("z".repeat(41));
        assert_eq!(derive_id(&f), "pos-input-3");
    }

    #[test]
    fn slugs_are_bounded() {
        assert_eq!(slugify("  Hello,  World! "), "hello-world");
        assert_eq!(slugify("Ünïcode"), "n-code");
        let mut f = facts();
        f.name = Some("a".repeat(100));
        let id = derive_id(&f);
        assert_eq!(id.len(), MAX_ID_LEN);
        assert!(id.starts_with("name-"));
    }
}
