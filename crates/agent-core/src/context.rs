//! Context snapshots handed to the planning collaborator.

use std::fmt::Write as _;

use action_locator::{ElementHandle, ElementKind, ElementRegistry};
use pagepilot_dom::{DomQuery, PageDocument};
use perceiver_structural::{is_visible, OverlayContext};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cancel::{CancelContext, Raced};
use crate::fingerprint::PageFingerprint;
use crate::plan::Progress;
use crate::ports::{CaptureMode, CapturePort, ScreenshotRef};

const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";
const HEADING_MAX_CHARS: usize = 80;

/// Words in a user message that ask for a fresh look at the page.
const CAPTURE_KEYWORDS: &[&str] = &["look", "see", "show", "capture", "screen", "page", "view"];

/// Snapshot fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Every visible interactive element; page-wide screenshot allowed
    Plan,
    /// Elements of the active context only; viewport screenshot
    Continuation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub max_elements: usize,
    pub max_headings: usize,
    pub max_buttons: usize,
    /// Screenshot mode for plan builds; continuation builds use the viewport
    pub screenshot_mode: CaptureMode,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_elements: 20,
            max_headings: 10,
            max_buttons: 15,
            screenshot_mode: CaptureMode::Viewport,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveContextSummary {
    pub kind: String,
    pub title: Option<String>,
    pub blocking: bool,
}

impl From<&OverlayContext> for ActiveContextSummary {
    fn from(context: &OverlayContext) -> Self {
        Self {
            kind: context.kind.to_string(),
            title: context.title.clone(),
            blocking: context.blocking,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSummary {
    pub id: String,
    pub kind: String,
    pub label: String,
    pub selector: String,
    pub enabled: bool,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub in_active_overlay: bool,
}

impl From<&ElementHandle> for ElementSummary {
    fn from(handle: &ElementHandle) -> Self {
        Self {
            id: handle.id.clone(),
            kind: handle.kind.to_string(),
            label: handle.label.clone(),
            selector: handle.selector.clone(),
            enabled: handle.enabled,
            required: handle.required,
            value: handle.current_value.clone(),
            in_active_overlay: handle.in_active_overlay,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// What the planner sees of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub mode: BuildMode,
    pub url: String,
    pub title: String,
    pub active_context: ActiveContextSummary,
    pub elements: Vec<ElementSummary>,
    /// Element count before capping
    pub total_elements: usize,
    pub headings: Vec<Heading>,
    pub buttons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<ScreenshotRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_progress: Option<Progress>,
    pub fingerprint: PageFingerprint,
}

/// Per-build inputs that come from the session.
pub struct BuildInputs<'a> {
    pub progress: Option<Progress>,
    pub message: Option<&'a str>,
    pub capture: Option<&'a dyn CapturePort>,
    pub cancel: &'a CancelContext,
}

/// Builds snapshots and remembers what was captured during the task.
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    config: ContextConfig,
    last_capture_url: Option<String>,
}

impl ContextBuilder {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            last_capture_url: None,
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Screenshot policy: first capture of the task, a URL change since the
    /// last capture, or a message asking to look at the page.
    pub fn should_capture(&self, url: &str, message: Option<&str>) -> bool {
        match &self.last_capture_url {
            None => true,
            Some(last) if last != url => true,
            Some(_) => message.map(mentions_capture_keyword).unwrap_or(false),
        }
    }

    pub async fn build(
        &mut self,
        doc: &dyn PageDocument,
        registry: &mut ElementRegistry,
        mode: BuildMode,
        inputs: BuildInputs<'_>,
    ) -> ContextSnapshot {
        registry.scan(doc, true);
        let active = registry.active_context();

        let handles: Vec<ElementHandle> = match mode {
            BuildMode::Plan => registry.handles().to_vec(),
            BuildMode::Continuation => registry.handles_in_active_overlay(),
        };
        let total_elements = handles.len();
        let elements: Vec<ElementSummary> = handles
            .iter()
            .take(self.config.max_elements)
            .map(ElementSummary::from)
            .collect();
        let buttons: Vec<String> = handles
            .iter()
            .filter(|h| h.kind == ElementKind::Button && !h.label.is_empty())
            .take(self.config.max_buttons)
            .map(|h| h.label.clone())
            .collect();
        let headings = self.collect_headings(doc, registry, &active, mode);

        let url = doc.url();
        let screenshot = self.maybe_capture(&url, mode, &inputs).await;
        let fingerprint = PageFingerprint::capture(doc, registry);

        debug!(
            mode = ?mode,
            context = %active.kind,
            elements = total_elements,
            screenshot = screenshot.is_some(),
            "context snapshot built"
        );

        ContextSnapshot {
            mode,
            url,
            title: doc.title(),
            active_context: ActiveContextSummary::from(&active),
            elements,
            total_elements,
            headings,
            buttons,
            screenshot,
            task_progress: inputs.progress,
            fingerprint,
        }
    }

    /// Forget capture history; the next build captures again.
    pub fn reset(&mut self) {
        self.last_capture_url = None;
    }

    fn collect_headings(
        &self,
        doc: &dyn PageDocument,
        registry: &ElementRegistry,
        active: &OverlayContext,
        mode: BuildMode,
    ) -> Vec<Heading> {
        let policy = registry.config().judge_policy();
        let nodes = match doc.query_selector_all(None, HEADING_SELECTOR) {
            Ok(nodes) => nodes,
            Err(err) => {
                warn!(error = %err, "heading query failed");
                return Vec::new();
            }
        };
        nodes
            .into_iter()
            .filter(|node| mode == BuildMode::Plan || active.contains(doc, *node))
            .filter(|node| is_visible(doc, *node, &policy))
            .filter_map(|node| {
                let level = doc
                    .tag_name(node)?
                    .strip_prefix('h')?
                    .parse::<u8>()
                    .ok()?;
                let text = collapse(&doc.text_content(node), HEADING_MAX_CHARS);
                (!text.is_empty()).then_some(Heading { level, text })
            })
            .take(self.config.max_headings)
            .collect()
    }

    async fn maybe_capture(
        &mut self,
        url: &str,
        mode: BuildMode,
        inputs: &BuildInputs<'_>,
    ) -> Option<ScreenshotRef> {
        let capture = inputs.capture?;
        if !self.should_capture(url, inputs.message) {
            return None;
        }
        let capture_mode = match mode {
            BuildMode::Plan => self.config.screenshot_mode,
            BuildMode::Continuation => CaptureMode::Viewport,
        };
        match inputs.cancel.race(capture.request_capture(capture_mode)).await {
            Raced::Completed(Ok(shot)) => {
                self.last_capture_url = Some(url.to_string());
                Some(shot)
            }
            Raced::Completed(Err(err)) => {
                warn!(error = %err, "screen capture failed, continuing without screenshot");
                None
            }
            Raced::Cancelled => None,
        }
    }
}

fn mentions_capture_keyword(message: &str) -> bool {
    message
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .any(|word| CAPTURE_KEYWORDS.contains(&word.as_str()))
}

fn collapse(text: &str, max_chars: usize) -> String {
    let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
    joined.chars().take(max_chars).collect()
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "'"))
}

/// Compact line-oriented rendering of a snapshot.
///
/// ```text
/// PAGE <url> | <title>
/// CONTEXT <kind> "<title>" blocking=<bool>
/// PROGRESS <completed>/<total> goal="<goal>"
/// HEADINGS h1 text | ...
/// ELEMENTS (<shown>/<total>)
/// [<id>] <kind> "<label>" enabled=<bool> value="<value>" *overlay
/// ```
pub fn format_for_llm(snapshot: &ContextSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "PAGE {} | {}", snapshot.url, snapshot.title);
    let context = &snapshot.active_context;
    let _ = writeln!(
        out,
        "CONTEXT {} {} blocking={}",
        context.kind,
        quoted(context.title.as_deref().unwrap_or("")),
        context.blocking
    );
    if let Some(progress) = &snapshot.task_progress {
        let _ = writeln!(
            out,
            "PROGRESS {}/{} goal={}",
            progress.completed,
            progress.total,
            quoted(&progress.goal)
        );
    }
    if !snapshot.headings.is_empty() {
        let headings: Vec<String> = snapshot
            .headings
            .iter()
            .map(|h| format!("h{} {}", h.level, h.text))
            .collect();
        let _ = writeln!(out, "HEADINGS {}", headings.join(" | "));
    }
    if !snapshot.buttons.is_empty() {
        let _ = writeln!(out, "BUTTONS {}", snapshot.buttons.join(" | "));
    }
    if let Some(shot) = &snapshot.screenshot {
        let _ = writeln!(out, "SCREENSHOT {}", shot.reference);
    }

    let _ = writeln!(
        out,
        "ELEMENTS ({}/{})",
        snapshot.elements.len(),
        snapshot.total_elements
    );
    let mark_overlay = context.kind != "page";
    for element in &snapshot.elements {
        let _ = write!(
            out,
            "[{}] {} {} enabled={}",
            element.id,
            element.kind,
            quoted(&element.label),
            element.enabled
        );
        if let Some(value) = &element.value {
            let _ = write!(out, " value={}", quoted(value));
        }
        if mark_overlay && element.in_active_overlay {
            out.push_str(" *overlay");
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_keywords_match_whole_words() {
        assert!(mentions_capture_keyword("Can you LOOK at this?"));
        assert!(mentions_capture_keyword("show me the page"));
        assert!(!mentions_capture_keyword("overview of seesaw"));
    }

    #[test]
    fn capture_policy() {
        let mut builder = ContextBuilder::default();
        assert!(builder.should_capture("https://a.test", None));
        builder.last_capture_url = Some("https://a.test".into());
        assert!(!builder.should_capture("https://a.test", None));
        assert!(!builder.should_capture("https://a.test", Some("fill the form")));
        assert!(builder.should_capture("https://a.test", Some("what do you see?")));
        assert!(builder.should_capture("https://a.test/next", None));
        builder.reset();
        assert!(builder.should_capture("https://a.test", None));
    }
}
