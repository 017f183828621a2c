use pagepilot_core_types::NodeRef;
use pagepilot_dom::{DomQuery, NodeStyle};

use crate::model::JudgeReport;
use crate::policy::JudgePolicy;

pub fn visible<D>(doc: &D, node: NodeRef, policy: &JudgePolicy) -> JudgeReport
where
    D: DomQuery + ?Sized,
{
    let mut issues = Vec::new();

    if !doc.is_connected(node) {
        issues.push("detached".to_string());
        return report("visible", "not_visible", issues);
    }

    let rect = doc.bounding_box(node);
    let area = rect.area().round();
    if area <= 1.0 {
        issues.push("zero_area".into());
    }
    if let Some(min_area) = policy.minimum_visible_area {
        if area < min_area {
            issues.push(format!("area<{:.0}", min_area));
        }
    }

    let hints = StyleHints::inspect(&doc.computed_style(node));
    if hints.hides {
        issues.push("style_hidden".into());
    }
    if hints.zero_opacity {
        issues.push("opacity_zero".into());
    }
    if doc.has_attribute(node, "hidden") {
        issues.push("hidden_attribute".into());
    }

    let mut current = doc.parent(node);
    while let Some(ancestor) = current {
        let ancestor_hints = StyleHints::inspect(&doc.computed_style(ancestor));
        if ancestor_hints.hides || ancestor_hints.zero_opacity {
            issues.push("hidden_ancestor".into());
            break;
        }
        current = doc.parent(ancestor);
    }

    if is_engine_ui(doc, node, &policy.engine_ui_prefix) {
        issues.push("engine_ui".into());
    }

    report("visible", "not_visible", issues)
}

pub fn is_visible<D>(doc: &D, node: NodeRef, policy: &JudgePolicy) -> bool
where
    D: DomQuery + ?Sized,
{
    visible(doc, node, policy).ok
}

pub fn enabled<D>(doc: &D, node: NodeRef) -> JudgeReport
where
    D: DomQuery + ?Sized,
{
    let mut issues = Vec::new();
    if doc.disabled(node) {
        issues.push("disabled".to_string());
    }
    if doc
        .attribute(node, "aria-disabled")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
    {
        issues.push("aria_disabled".into());
    }
    let mut current = doc.parent(node);
    while let Some(ancestor) = current {
        if doc.tag_name(ancestor).as_deref() == Some("fieldset") && doc.disabled(ancestor) {
            issues.push("disabled_fieldset".into());
            break;
        }
        current = doc.parent(ancestor);
    }
    report("enabled", "disabled", issues)
}

/// Node or one of its ancestors was injected by the engine itself.
pub fn is_engine_ui<D>(doc: &D, node: NodeRef, prefix: &str) -> bool
where
    D: DomQuery + ?Sized,
{
    if prefix.is_empty() {
        return false;
    }
    let mut current = Some(node);
    while let Some(candidate) = current {
        let id_match = doc
            .attribute(candidate, "id")
            .map(|id| id.starts_with(prefix))
            .unwrap_or(false);
        let class_match = doc
            .class_list(candidate)
            .iter()
            .any(|class| class.starts_with(prefix));
        if id_match || class_match {
            return true;
        }
        current = doc.parent(candidate);
    }
    false
}

fn report(ok_label: &str, failed_label: &str, issues: Vec<String>) -> JudgeReport {
    let ok = issues.is_empty();
    let reason = format_reason(if ok { ok_label } else { failed_label }, &issues);
    JudgeReport { ok, reason, issues }
}

fn format_reason(base: &str, issues: &[String]) -> String {
    if issues.is_empty() {
        base.to_string()
    } else {
        format!("{}({})", base, issues.join(","))
    }
}

#[derive(Default)]
struct StyleHints {
    hides: bool,
    zero_opacity: bool,
}

impl StyleHints {
    fn inspect(style: &NodeStyle) -> Self {
        Self {
            hides: style.hidden(),
            zero_opacity: style.transparent(),
        }
    }
}
