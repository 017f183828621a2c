use action_locator::{EditorFamily, ElementHandle, ElementKind, ElementRegistry, RegistryConfig};
use action_primitives::{
    ActionError, ExecCtx, GenericStrategy, InputSimulator, ScrollDirection, SimulatorConfig,
};
use pagepilot_dom::{ClickEffect, DomEvent, DomInput, DomQuery, ElementSpec, FixtureDocument, PageBuilder};
use perceiver_structural::OverlayPolicy;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn handle(doc: &FixtureDocument, id: &str) -> ElementHandle {
    let mut registry =
        ElementRegistry::new(RegistryConfig::unthrottled(), OverlayPolicy::default()).unwrap();
    registry.scan(doc, true);
    registry
        .get(doc, id)
        .unwrap_or_else(|| panic!("no handle {id}: {:?}", registry.handles()))
}

fn form_page() -> FixtureDocument {
    PageBuilder::new("https://shop.test/checkout", "Checkout")
        .child(ElementSpec::new("form").attr("id", "checkout").children([
            ElementSpec::new("input").attr("id", "email").attr("type", "email"),
            ElementSpec::new("input").attr("id", "name").controlled(),
            ElementSpec::new("select").attr("name", "country").children([
                ElementSpec::new("option").attr("value", "us").text("United States"),
                ElementSpec::new("option").attr("value", "ca").text("Canada"),
            ]),
            ElementSpec::new("input").attr("type", "checkbox").attr("name", "news"),
            ElementSpec::new("input")
                .attr("type", "checkbox")
                .attr("name", "terms")
                .attr("data-fixture-inert", ""),
            ElementSpec::new("button")
                .attr("id", "pay")
                .text("Pay")
                .on_click(ClickEffect::SetTitle("Paid".to_string())),
            ElementSpec::new("button").attr("id", "later").attr("disabled", "").text("Later"),
        ]))
        .build()
}

fn editor_page(marker: ElementSpec) -> FixtureDocument {
    PageBuilder::new("https://docs.test/edit", "Editor")
        .child(marker.attr("id", "editor").attr("contenteditable", "true").text("Old draft"))
        .build()
}

fn editor(family: EditorFamily) -> ElementSpec {
    let spec = ElementSpec::new("div");
    match family {
        EditorFamily::ProseMirror => spec.attr("class", "ProseMirror"),
        EditorFamily::Lexical => spec.attr("data-lexical-editor", "true"),
        EditorFamily::Draft => spec.attr("class", "public-DraftEditor-content"),
        EditorFamily::Quill => spec.attr("class", "ql-editor"),
    }
}

#[tokio::test]
async fn standard_fill_writes_and_verifies() {
    let doc = form_page();
    let email = handle(&doc, "id-email");
    let sim = InputSimulator::default();

    let outcome = sim.fill(&doc, &email, "hello@example.com", &ExecCtx::detached()).await;
    assert!(outcome.success, "{outcome:?}");
    assert!(doc.value(email.node).unwrap().contains("hello@example.com"));
    assert_eq!(
        doc.event_names_for(email.node),
        vec!["focus", "input", "change", "keydown", "keyup"]
    );
    assert!(!doc.is_highlighted(email.node));
}

#[tokio::test]
async fn controlled_input_keeps_value_written_natively() {
    let doc = form_page();
    let name = handle(&doc, "id-name");
    let sim = InputSimulator::default();

    let outcome = sim.fill(&doc, &name, "Ada Lovelace", &ExecCtx::detached()).await;
    assert!(outcome.success);

    // a later re-render must not roll the value back
    doc.dispatch(name.node, DomEvent::input()).unwrap();
    assert_eq!(doc.value(name.node).as_deref(), Some("Ada Lovelace"));
}

#[tokio::test(start_paused = true)]
async fn every_editor_family_accepts_its_strategy() {
    for family in EditorFamily::all() {
        let doc = editor_page(editor(family));
        let target = handle(&doc, "id-editor");
        assert_eq!(target.kind, ElementKind::RichText(family));

        let sim = InputSimulator::default();
        let outcome = sim.fill(&doc, &target, "Hello world", &ExecCtx::detached()).await;
        assert!(outcome.success, "{family:?}: {outcome:?}");
        assert_eq!(doc.text_content(target.node).trim(), "Hello world", "{family:?}");
        assert_eq!(doc.editor_model(target.node).as_deref(), Some("Hello world"));

        let events = doc.event_names_for(target.node);
        assert_eq!(&events[..4], &["mousedown", "mouseup", "click", "focus"], "{family:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn per_character_families_type_each_character() {
    let doc = editor_page(editor(EditorFamily::ProseMirror));
    let target = handle(&doc, "id-editor");
    InputSimulator::default()
        .fill(&doc, &target, "abc", &ExecCtx::detached())
        .await;

    let events = doc.events_for(target.node);
    let keydowns: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, DomEvent::KeyDown { .. }))
        .collect();
    assert_eq!(keydowns.len(), 3);
    assert_eq!(
        &doc.event_names_for(target.node)[4..8],
        &["keydown", "beforeinput", "input", "keyup"]
    );
}

#[tokio::test(start_paused = true)]
async fn quill_takes_a_single_content_replacement() {
    let doc = editor_page(editor(EditorFamily::Quill));
    let target = handle(&doc, "id-editor");
    let outcome = InputSimulator::default()
        .fill(&doc, &target, "Release notes", &ExecCtx::detached())
        .await;
    assert!(outcome.success);

    let names = doc.event_names_for(target.node);
    assert!(!names.contains(&"keydown"));
    assert_eq!(names.iter().filter(|n| **n == "input").count(), 1);
    assert_eq!(doc.editor_model(target.node).as_deref(), Some("Release notes"));
}

#[tokio::test]
async fn model_owning_editor_rejects_plain_text_writes() {
    let doc = editor_page(editor(EditorFamily::Lexical));
    let target = handle(&doc, "id-editor");
    let sim = InputSimulator::default();
    sim.strategies()
        .register(target.kind, Arc::new(GenericStrategy::new()));

    let outcome = sim.fill(&doc, &target, "Overwritten", &ExecCtx::detached()).await;
    assert!(!outcome.success);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.actual.trim(), "Old draft");
}

#[tokio::test]
async fn plain_contenteditable_uses_generic_fallback() {
    let doc = editor_page(ElementSpec::new("div"));
    let target = handle(&doc, "id-editor");
    assert_eq!(target.kind, ElementKind::ContentEditable);

    let outcome = InputSimulator::default()
        .fill(&doc, &target, "Plain note", &ExecCtx::detached())
        .await;
    assert!(outcome.success);
    assert_eq!(doc.text_content(target.node), "Plain note");
}

#[tokio::test]
async fn fill_on_buttons_is_an_error_outcome() {
    let doc = form_page();
    let pay = handle(&doc, "id-pay");
    let outcome = InputSimulator::default()
        .fill(&doc, &pay, "text", &ExecCtx::detached())
        .await;
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("does not take text"));
    assert_eq!(doc.text_content(pay.node), "Pay");
}

#[tokio::test]
async fn fill_on_select_chooses_the_option() {
    let doc = form_page();
    let country = handle(&doc, "name-country");
    let outcome = InputSimulator::default()
        .fill(&doc, &country, "Canada", &ExecCtx::detached())
        .await;
    assert!(outcome.success);
    assert_eq!(outcome.actual, "ca");
}

#[tokio::test]
async fn select_matches_text_case_insensitively() {
    let doc = form_page();
    let country = handle(&doc, "name-country");
    let sim = InputSimulator::default();

    let report = sim
        .select(&doc, &country, "united states", &ExecCtx::detached())
        .await
        .unwrap();
    assert!(report.ok);
    assert_eq!(doc.value(country.node).as_deref(), Some("us"));

    let missing = sim.select(&doc, &country, "Mexico", &ExecCtx::detached()).await;
    assert!(matches!(missing, Err(ActionError::OptionNotFound(_))));
}

#[tokio::test]
async fn click_runs_pointer_sequence() {
    let doc = form_page();
    let pay = handle(&doc, "id-pay");
    let report = InputSimulator::default()
        .click(&doc, &pay, &ExecCtx::detached())
        .await
        .unwrap();
    assert!(report.ok);
    assert_eq!(doc.title(), "Paid");
    assert_eq!(
        doc.event_names_for(pay.node),
        vec!["pointerdown", "mousedown", "pointerup", "mouseup", "click"]
    );
}

#[tokio::test]
async fn disabled_click_does_not_verify() {
    let doc = form_page();
    let later = handle(&doc, "id-later");
    let report = InputSimulator::default()
        .click(&doc, &later, &ExecCtx::detached())
        .await
        .unwrap();
    assert!(!report.ok);
    assert!(report.detail.is_some());
}

#[tokio::test]
async fn check_toggles_and_skips_when_already_set() {
    let doc = form_page();
    let news = handle(&doc, "name-news");
    let sim = InputSimulator::default();

    assert!(sim.check(&doc, &news, true, &ExecCtx::detached()).await.unwrap().ok);
    assert_eq!(doc.checked(news.node), Some(true));

    doc.clear_events();
    assert!(sim.check(&doc, &news, true, &ExecCtx::detached()).await.unwrap().ok);
    assert!(doc.events_for(news.node).is_empty());
}

#[tokio::test]
async fn check_falls_back_to_native_setter() {
    let doc = form_page();
    let terms = handle(&doc, "name-terms");
    let report = InputSimulator::default()
        .check(&doc, &terms, true, &ExecCtx::detached())
        .await
        .unwrap();
    assert!(report.ok);
    assert_eq!(doc.checked(terms.node), Some(true));
    let names = doc.event_names_for(terms.node);
    assert_eq!(&names[names.len() - 3..], &["click", "input", "change"]);
}

#[tokio::test]
async fn select_runs_pointer_and_keyboard_sequence() {
    let doc = form_page();
    let country = handle(&doc, "name-country");
    let report = InputSimulator::default()
        .select(&doc, &country, "ca", &ExecCtx::detached())
        .await
        .unwrap();
    assert!(report.ok);
    assert_eq!(
        doc.event_names_for(country.node),
        vec![
            "pointerdown",
            "mousedown",
            "pointerup",
            "mouseup",
            "click",
            "focus",
            "input",
            "change",
            "keydown",
            "keyup"
        ]
    );
}

#[tokio::test]
async fn click_on_detached_element_does_not_verify() {
    let doc = form_page();
    let pay = handle(&doc, "id-pay");
    doc.remove(pay.node);
    let report = InputSimulator::default()
        .click(&doc, &pay, &ExecCtx::detached())
        .await
        .unwrap();
    assert!(!report.ok);
    assert_eq!(doc.title(), "Checkout");
}

fn preferences_page(toggles: bool) -> FixtureDocument {
    let mut accept = ElementSpec::new("div")
        .attr("role", "checkbox")
        .attr("id", "accept")
        .attr("aria-checked", "false")
        .text("Accept terms");
    if toggles {
        accept = accept.on_click(ClickEffect::ToggleAriaChecked("#accept".to_string()));
    }
    PageBuilder::new("https://app.test/prefs", "Preferences")
        .child(accept)
        .build()
}

#[tokio::test]
async fn aria_checkbox_toggles_through_pointer_click() {
    let doc = preferences_page(true);
    let accept = handle(&doc, "id-accept");
    assert_eq!(accept.kind, ElementKind::Checkbox);
    let sim = InputSimulator::default();

    let report = sim.check(&doc, &accept, true, &ExecCtx::detached()).await.unwrap();
    assert!(report.ok, "{report:?}");
    assert_eq!(doc.attribute(accept.node, "aria-checked").as_deref(), Some("true"));
    assert_eq!(
        doc.event_names_for(accept.node),
        vec!["pointerdown", "mousedown", "pointerup", "mouseup", "click"]
    );

    doc.clear_events();
    assert!(sim.check(&doc, &accept, true, &ExecCtx::detached()).await.unwrap().ok);
    assert!(doc.events_for(accept.node).is_empty());

    assert!(sim.check(&doc, &accept, false, &ExecCtx::detached()).await.unwrap().ok);
    assert_eq!(doc.attribute(accept.node, "aria-checked").as_deref(), Some("false"));
}

#[tokio::test]
async fn aria_checkbox_the_page_ignores_is_unverified() {
    let doc = preferences_page(false);
    let accept = handle(&doc, "id-accept");
    let report = InputSimulator::default()
        .check(&doc, &accept, true, &ExecCtx::detached())
        .await
        .unwrap();
    assert!(!report.ok);
    assert!(report.detail.unwrap().contains("aria-checked"));
    assert_eq!(doc.attribute(accept.node, "aria-checked").as_deref(), Some("false"));
}

#[tokio::test]
async fn press_enter_targets_focused_element() {
    let doc = form_page();
    let email = handle(&doc, "id-email");
    doc.focus(email.node).unwrap();
    doc.clear_events();

    let report = InputSimulator::default()
        .press_enter(&doc, None, &ExecCtx::detached())
        .await
        .unwrap();
    assert!(report.ok);
    assert_eq!(
        doc.events_for(email.node),
        vec![
            DomEvent::key_down("Enter"),
            DomEvent::key_press("Enter"),
            DomEvent::key_up("Enter"),
        ]
    );
}

#[tokio::test]
async fn scroll_page_moves_document_offset() {
    let doc = form_page();
    let sim = InputSimulator::default();
    sim.scroll_page(&doc, ScrollDirection::Down, Some(300.0), &ExecCtx::detached())
        .await
        .unwrap();
    sim.scroll_page(&doc, ScrollDirection::Up, Some(500.0), &ExecCtx::detached())
        .await
        .unwrap();
    assert_eq!(doc.scroll_position(None), (0.0, 0.0));

    sim.scroll_page(&doc, ScrollDirection::Down, None, &ExecCtx::detached())
        .await
        .unwrap();
    assert_eq!(doc.scroll_position(None), (0.0, 640.0));
}

#[tokio::test]
async fn cancelled_context_stops_before_touching_the_page() {
    let doc = form_page();
    let email = handle(&doc, "id-email");
    let token = CancellationToken::new();
    token.cancel();
    let ctx = ExecCtx::new(token);
    let sim = InputSimulator::new(SimulatorConfig::default());

    let outcome = sim.fill(&doc, &email, "x", &ctx).await;
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("interrupted"));
    assert!(matches!(
        sim.click(&doc, &email, &ctx).await,
        Err(ActionError::Interrupted(_))
    ));
    assert_eq!(doc.value(email.node).as_deref(), Some(""));
}
