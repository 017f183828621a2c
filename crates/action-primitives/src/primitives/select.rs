//! Select primitive - choose an option of a select control

use std::time::Instant;

use action_locator::ElementHandle;
use chrono::Utc;
use pagepilot_dom::{DomEvent, PageDocument, SelectOption};
use tracing::{debug, info};

use super::click::pointer_click;
use crate::{
    errors::ActionError,
    types::{ActionReport, ExecCtx},
};

const CONFIRM_KEY: &str = "Enter";

/// Execute select primitive
///
/// Matches `item` against option values first, then against visible option
/// text ignoring case.
///
/// Steps:
/// 1. Pointer sequence on the select to open it
/// 2. Native index setter followed by `input` and `change`
/// 3. `keydown`/`keyup` Enter to confirm the choice
/// 4. Verify the select's value is the chosen option's value
pub async fn execute_select(
    doc: &dyn PageDocument,
    handle: &ElementHandle,
    item: &str,
    ctx: &ExecCtx,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let timer = Instant::now();

    info!(
        action_id = %ctx.action_id.0,
        element = %handle.id,
        item = %item,
        "Executing select primitive"
    );
    ctx.ensure_active()?;

    let node = handle.node;
    if doc.tag_name(node).as_deref() != Some("select") {
        return Err(ActionError::UnsupportedTarget(format!(
            "{} is not a select control",
            handle.id
        )));
    }
    if doc.disabled(node) {
        return Err(ActionError::NotEnabled(handle.id.clone()));
    }

    let options = doc.options(node);
    let index = find_option(&options, item)
        .ok_or_else(|| ActionError::OptionNotFound(item.to_string()))?;
    let expected = options[index].value.clone();
    debug!(index, value = %expected, "option matched");

    doc.scroll_into_view(node)?;
    pointer_click(doc, node)?;
    doc.focus(node)?;
    doc.set_selected_index(node, index)?;
    doc.dispatch(node, DomEvent::input())?;
    doc.dispatch(node, DomEvent::Change)?;
    doc.dispatch(node, DomEvent::key_down(CONFIRM_KEY))?;
    doc.dispatch(node, DomEvent::key_up(CONFIRM_KEY))?;

    let actual = doc.value(node).unwrap_or_default();
    if actual == expected {
        Ok(ActionReport::success(started_at, timer))
    } else {
        Ok(ActionReport::unverified(
            started_at,
            timer,
            format!("expected \"{expected}\", page shows \"{actual}\""),
        ))
    }
}

/// Index of the option whose value equals `item`, else whose trimmed text
/// matches it case-insensitively.
pub fn find_option(options: &[SelectOption], item: &str) -> Option<usize> {
    let wanted = item.trim();
    options
        .iter()
        .position(|option| option.value == wanted)
        .or_else(|| {
            let lowered = wanted.to_lowercase();
            options
                .iter()
                .position(|option| option.text.trim().to_lowercase() == lowered)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(value: &str, text: &str) -> SelectOption {
        SelectOption {
            value: value.to_string(),
            text: text.to_string(),
            selected: false,
            disabled: false,
        }
    }

    #[test]
    fn value_match_wins_over_text() {
        let options = vec![option("b", "A"), option("a", "B")];
        assert_eq!(find_option(&options, "a"), Some(1));
        assert_eq!(find_option(&options, "A"), Some(0));
    }

    #[test]
    fn text_match_ignores_case() {
        let options = vec![option("us", "United States"), option("ca", "Canada")];
        assert_eq!(find_option(&options, "canada"), Some(1));
        assert_eq!(find_option(&options, "Mexico"), None);
    }
}
