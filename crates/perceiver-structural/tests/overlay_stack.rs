use pagepilot_dom::{DomQuery, ElementSpec, FixtureDocument, PageBuilder};
use perceiver_structural::{JudgePolicy, OverlayKind, OverlayPolicy, OverlayStack};

fn stack() -> OverlayStack {
    OverlayStack::new(OverlayPolicy::default(), JudgePolicy::default()).unwrap()
}

fn search_page_with_dialog() -> FixtureDocument {
    PageBuilder::new("https://search.test", "Search")
        .children([
            ElementSpec::new("input").attr("name", "q").attr("id", "page-q"),
            ElementSpec::new("div")
                .attr("role", "dialog")
                .attr("aria-label", "Advanced search")
                .rect(200.0, 100.0, 500.0, 300.0)
                .layer("fixed", 100)
                .child(ElementSpec::new("input").attr("name", "q").attr("id", "dialog-q")),
        ])
        .build()
}

#[test]
fn topmost_dialog_is_the_active_context() {
    let doc = search_page_with_dialog();
    let mut overlays = stack();
    overlays.scan(&doc);

    let active = overlays.get_active_context();
    assert_eq!(active.kind, OverlayKind::Dialog);
    assert!(active.blocking);
    assert_eq!(active.title.as_deref(), Some("Advanced search"));
    assert_eq!(active.z_order, 100);

    let page_q = doc.find("#page-q").unwrap();
    let dialog_q = doc.find("#dialog-q").unwrap();
    assert!(overlays.contains(&doc, &active, dialog_q));
    assert!(!overlays.contains(&doc, &active, page_q));
}

#[test]
fn page_context_when_nothing_is_open() {
    let doc = PageBuilder::new("https://plain.test", "Plain")
        .children([
            ElementSpec::new("div").attr("class", "popup-hint").rect(0.0, 0.0, 40.0, 20.0),
            ElementSpec::new("div")
                .attr("role", "dialog")
                .rect(0.0, 0.0, 400.0, 300.0)
                .display("none"),
        ])
        .build();
    let mut overlays = stack();
    assert!(overlays.scan(&doc).is_empty());
    let active = overlays.get_active_context();
    assert!(active.is_page());
    assert!(!active.blocking);
    assert!(overlays.get_top_overlay().is_none());
}

#[test]
fn backdrop_resolves_to_content_node() {
    let doc = PageBuilder::new("https://shop.test", "Shop")
        .child(
            ElementSpec::new("div")
                .attr("class", "modal-backdrop")
                .rect(0.0, 0.0, 1280.0, 800.0)
                .layer("fixed", 1000)
                .child(
                    ElementSpec::new("div")
                        .attr("class", "modal-content")
                        .attr("id", "content")
                        .rect(440.0, 250.0, 400.0, 300.0)
                        .children([
                            ElementSpec::new("h2").text("Confirm order"),
                            ElementSpec::new("form")
                                .child(ElementSpec::new("button").text("Confirm")),
                        ]),
                ),
        )
        .build();
    let mut overlays = stack();
    let contexts = overlays.scan(&doc).to_vec();
    assert_eq!(contexts.len(), 1, "nested candidate with equal z is merged");

    let active = overlays.get_active_context();
    let content = doc.find("#content").unwrap();
    assert_eq!(active.kind, OverlayKind::Modal);
    assert_eq!(active.content, Some(content));
    assert_ne!(active.root, active.content);
    assert!(active.blocking);
    assert_eq!(active.title.as_deref(), Some("Confirm order"));
}

#[test]
fn inner_dialog_over_drawer_wins() {
    let doc = PageBuilder::new("https://crm.test", "CRM")
        .child(
            ElementSpec::new("aside")
                .attr("class", "drawer")
                .attr("id", "drawer")
                .rect(980.0, 0.0, 300.0, 800.0)
                .layer("fixed", 10)
                .children([
                    ElementSpec::new("input").attr("name", "note"),
                    ElementSpec::new("div")
                        .attr("role", "dialog")
                        .attr("id", "confirm")
                        .rect(500.0, 300.0, 320.0, 160.0)
                        .layer("fixed", 20)
                        .child(ElementSpec::new("button").text("Delete")),
                ]),
        )
        .build();
    let mut overlays = stack();
    let kinds: Vec<OverlayKind> = overlays.scan(&doc).iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![OverlayKind::Drawer, OverlayKind::Dialog]);

    let top = overlays.get_top_overlay().unwrap();
    assert_eq!(top.root, doc.find("#confirm"));
    let note = doc.find("input[name=\"note\"]").unwrap();
    assert!(!top.contains(&doc, note));
    let drawer = &overlays.contexts()[0];
    assert!(!drawer.blocking);
}

#[test]
fn equal_z_ties_break_by_document_order() {
    let doc = PageBuilder::new("https://menu.test", "Menu")
        .children([
            ElementSpec::new("ul")
                .attr("role", "menu")
                .attr("id", "first")
                .rect(0.0, 40.0, 200.0, 200.0)
                .layer("absolute", 5)
                .child(ElementSpec::new("li").attr("role", "menuitem").text("Rename")),
            ElementSpec::new("ul")
                .attr("role", "listbox")
                .attr("id", "second")
                .rect(300.0, 40.0, 200.0, 200.0)
                .layer("absolute", 5)
                .child(ElementSpec::new("li").attr("role", "option").text("Madrid")),
        ])
        .build();
    let mut overlays = stack();
    overlays.scan(&doc);
    let top = overlays.get_top_overlay().unwrap();
    assert_eq!(top.kind, OverlayKind::Dropdown);
    assert_eq!(top.root, doc.find("#second"));
    assert!(!top.blocking);
}

#[test]
fn labelledby_title_and_rescans_follow_the_page() {
    let doc = PageBuilder::new("https://labels.test", "Labels")
        .child(
            ElementSpec::new("dialog")
                .attr("open", "")
                .attr("aria-labelledby", "dlg-title")
                .rect(100.0, 100.0, 400.0, 200.0)
                .child(ElementSpec::new("h3").attr("id", "dlg-title").text("  Share   file ")),
        )
        .build();
    let mut overlays = stack();
    overlays.scan(&doc);
    assert_eq!(
        overlays.get_active_context().title.as_deref(),
        Some("Share file")
    );

    let dialog = doc.find("dialog").unwrap();
    doc.remove(dialog);
    assert!(!doc.is_connected(dialog));
    overlays.scan(&doc);
    assert!(overlays.get_active_context().is_page());
}

#[test]
fn size_threshold_is_configurable() {
    let doc = PageBuilder::new("https://tip.test", "Tip")
        .child(
            ElementSpec::new("div")
                .attr("class", "popover")
                .rect(0.0, 0.0, 60.0, 40.0)
                .child(ElementSpec::new("a").attr("href", "/tips").text("More")),
        )
        .build();
    let mut strict = OverlayStack::new(
        OverlayPolicy {
            min_width: 100.0,
            ..OverlayPolicy::default()
        },
        JudgePolicy::default(),
    )
    .unwrap();
    assert!(strict.scan(&doc).is_empty());

    let mut lenient = stack();
    assert_eq!(lenient.scan(&doc).len(), 1);
    assert_eq!(lenient.get_active_context().kind, OverlayKind::Popup);
}

#[test]
fn decorative_overlay_without_controls_is_ignored() {
    let doc = PageBuilder::new("https://landing.test", "Landing")
        .children([
            ElementSpec::new("div")
                .attr("class", "hero-overlay")
                .rect(0.0, 0.0, 300.0, 200.0)
                .layer("absolute", 5),
            ElementSpec::new("form").children([
                ElementSpec::new("input").attr("id", "email").attr("type", "email"),
                ElementSpec::new("button").attr("id", "join").text("Join"),
            ]),
        ])
        .build();
    let mut overlays = stack();
    assert!(overlays.scan(&doc).is_empty());

    let active = overlays.get_active_context();
    assert!(active.is_page());
    let email = doc.find("#email").unwrap();
    let join = doc.find("#join").unwrap();
    assert!(overlays.contains(&doc, &active, email));
    assert!(overlays.contains(&doc, &active, join));

    let hero = doc.find(".hero-overlay").unwrap();
    doc.append(hero, &ElementSpec::new("h2").text("Spring sale"));
    assert_eq!(overlays.scan(&doc).len(), 1, "heading makes the surface content-bearing");
}
