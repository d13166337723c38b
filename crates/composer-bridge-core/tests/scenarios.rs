use composer_bridge_core::{
    Affinity, BridgeConfig, BridgeSession, BufferOffset, CanonicalOffset, DecorationBuilder,
    DecorationKind, DocNode, Generation, HeadlessSurface, HostSelection, InvalidOffset, ListType,
    MapError, ModelEvent, ModelUpdate, OffsetPair, Rendering, to_buffer, to_buffer_with_affinity,
    to_canonical, translate,
};
use insta::assert_snapshot;

fn builder(list_item_breaks: bool) -> DecorationBuilder {
    let mut config = BridgeConfig::default();
    config.decorations.list_item_breaks = list_item_breaks;
    DecorationBuilder::new(config)
}

fn ordered(items: &[&str]) -> DocNode {
    DocNode::document(vec![DocNode::list(
        ListType::Ordered,
        items
            .iter()
            .map(|item| DocNode::list_item(vec![DocNode::text(item)]))
            .collect(),
    )])
}

fn render(builder: &DecorationBuilder, doc: &DocNode) -> Rendering {
    builder.build(doc, Generation::INITIAL)
}

#[test]
fn two_item_ordered_list() {
    let rendering = render(&builder(false), &ordered(&["Item 1", "Item 2"]));
    assert_eq!(rendering.buffer.to_string(), "1. Item 1\n2. Item 2");
    assert_eq!(rendering.canonical_len(), "Item 1\nItem 2".len());

    let catalog = &rendering.catalog;
    // Start of "Item 2" sits right before the second marker.
    assert_eq!(to_buffer(CanonicalOffset(7), catalog), Ok(BufferOffset(10)));
    assert_eq!(
        to_buffer_with_affinity(CanonicalOffset(7), catalog, Affinity::After),
        Ok(BufferOffset(13))
    );
    assert_eq!(to_canonical(BufferOffset(13), catalog), Ok(CanonicalOffset(7)));
}

#[test]
fn two_item_ordered_list_with_item_breaks() {
    let rendering = render(&builder(true), &ordered(&["Item 1", "Item 2"]));
    assert_snapshot!(rendering.buffer.to_escaped_string(), @r"1. Item 1\u{a}2. \u{200b}Item 2");
    assert_eq!(
        to_buffer_with_affinity(CanonicalOffset(7), &rendering.catalog, Affinity::After),
        Ok(BufferOffset(14))
    );
}

#[test]
fn two_digit_item_numbers() {
    let items = ["x"; 10];
    let rendering = render(&builder(false), &ordered(&items));
    let catalog = &rendering.catalog;

    assert_eq!(catalog.spans()[8].length, 3);
    assert_eq!(catalog.spans()[9].length, 4);
    assert_eq!(rendering.canonical_len(), 19);
    assert_eq!(rendering.buffer_len(), 50);

    // Item 10 starts at canonical 18.
    assert_eq!(to_buffer(CanonicalOffset(18), catalog), Ok(BufferOffset(45)));
    assert_eq!(
        to_buffer_with_affinity(CanonicalOffset(18), catalog, Affinity::After),
        Ok(BufferOffset(49))
    );
    assert_eq!(to_buffer(CanonicalOffset(19), catalog), Ok(BufferOffset(50)));
    for b in 45..=49 {
        assert_eq!(to_canonical(BufferOffset(b), catalog), Ok(CanonicalOffset(18)));
    }
}

#[test]
fn empty_paragraph() {
    let doc = DocNode::document(vec![DocNode::paragraph(vec![])]);
    let rendering = render(&DecorationBuilder::default(), &doc);
    assert_eq!(rendering.buffer_len(), 1);
    assert_eq!(
        rendering.catalog.spans()[0].kind,
        DecorationKind::EmptyParagraphPlaceholder
    );
    assert_eq!(to_buffer(CanonicalOffset(0), &rendering.catalog), Ok(BufferOffset(0)));
    assert_eq!(to_canonical(BufferOffset(1), &rendering.catalog), Ok(CanonicalOffset(0)));
}

#[test]
fn surrogate_pairs_in_list_item() {
    let doc = DocNode::document(vec![DocNode::list(
        ListType::Ordered,
        vec![DocNode::list_item(vec![DocNode::text("😋😋")])],
    )]);
    let rendering = render(&DecorationBuilder::default(), &doc);
    let catalog = &rendering.catalog;

    assert_eq!(to_buffer(CanonicalOffset(0), catalog), Ok(BufferOffset(0)));
    assert_eq!(to_buffer(CanonicalOffset(2), catalog), Ok(BufferOffset(5)));
    assert_eq!(to_buffer(CanonicalOffset(4), catalog), Ok(BufferOffset(7)));
    for c in [1, 3] {
        assert!(matches!(
            to_buffer(CanonicalOffset(c), catalog),
            Err(InvalidOffset::SplitsSurrogatePair { .. })
        ));
    }
    // The marker never lands between the halves of a pair.
    assert!(catalog.spans().iter().all(|span| catalog.is_char_boundary(span.end())));
}

#[test]
fn backward_host_selection() {
    let doc = DocNode::document(vec![DocNode::paragraph(vec![DocNode::text("abcdefgh")])]);
    let rendering = render(&DecorationBuilder::default(), &doc);
    let translated = translate(
        OffsetPair::new(BufferOffset(6), BufferOffset(2)),
        &rendering.catalog,
    )
    .unwrap();
    assert_eq!(
        translated.normalized(),
        OffsetPair::new(CanonicalOffset(2), CanonicalOffset(6))
    );
    assert_eq!(
        translated.directed(),
        OffsetPair::new(CanonicalOffset(6), CanonicalOffset(2))
    );
}

#[test]
fn negative_host_offsets_are_rejected() {
    assert!(matches!(
        BufferOffset::try_from(-1i64),
        Err(InvalidOffset::Negative { .. })
    ));
}

#[test]
fn json_document() {
    let doc: DocNode = serde_json::from_str(
        r#"{
            "type": "container",
            "name": "",
            "children": [
                {"type": "container", "name": "p", "children": [
                    {"type": "text", "text": "Shopping "},
                    {"type": "container", "name": "strong", "children": [{"type": "text", "text": "list"}]}
                ]},
                {"type": "container", "name": "ul", "children": [
                    {"type": "container", "name": "li", "children": [{"type": "text", "text": "eggs"}]},
                    {"type": "container", "name": "li", "children": [{"type": "line_break"}]}
                ]}
            ]
        }"#,
    )
    .unwrap();
    let rendering = render(&DecorationBuilder::default(), &doc);
    assert_snapshot!(rendering.tree.to_string(), @r"<p>Shopping <strong>list</strong></p><ul><li>[• ]eggs</li><li>[• ][\u{200b}][\u{a0}]</li></ul>");
    assert_snapshot!(rendering.buffer.to_escaped_string(), @r"Shopping list\u{a}• eggs\u{a}• \u{200b}\u{a0}");
    assert_eq!(rendering.canonical_len(), "Shopping list\neggs\n".len());
    insta::assert_yaml_snapshot!("shopping_list_decorations", rendering.catalog.spans());
}

#[test]
fn session_round_trip_through_headless_host() {
    let mut session = BridgeSession::default();
    let mut host = HeadlessSurface::new();
    session
        .apply_update(
            &ModelUpdate::ReplaceAll {
                document: ordered(&["Item 1", "Item 2"]),
                selection: OffsetPair::collapsed(CanonicalOffset(9)),
            },
            &mut host,
        )
        .unwrap();
    let generation = host.generation().unwrap();
    let shown = host.selection().unwrap();
    assert_eq!(shown, OffsetPair::collapsed(BufferOffset(16)));

    // The user drags backwards from there to the middle of the first item.
    host.select(OffsetPair::new(shown.start, BufferOffset(5)));
    let event = session
        .report_selection(HostSelection {
            generation,
            selection: host.selection().unwrap(),
        })
        .unwrap();
    let ModelEvent::Selection(selection) = event else {
        panic!("expected a selection");
    };
    assert_eq!(
        selection.directed(),
        OffsetPair::new(CanonicalOffset(9), CanonicalOffset(2))
    );
}

#[test]
fn stale_generation_is_reported() {
    let mut config = BridgeConfig::default();
    config.mapping.stale_catalog = composer_bridge_core::StalePolicy::Reject;
    let mut session = BridgeSession::new(config);
    let first = session
        .replace_all(&ordered(&["a"]), OffsetPair::collapsed(CanonicalOffset(0)))
        .unwrap();
    session
        .replace_all(&ordered(&["a", "b"]), OffsetPair::collapsed(CanonicalOffset(0)))
        .unwrap();
    assert!(matches!(
        session.report_selection(HostSelection {
            generation: first.generation,
            selection: OffsetPair::collapsed(BufferOffset(0)),
        }),
        Err(MapError::StaleCatalog { .. })
    ));
}
