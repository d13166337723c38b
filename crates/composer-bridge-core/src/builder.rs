//! Decoration builder: model document in, rendered buffer and catalog out.
//!
//! The document is walked once into a [`HostNode`] tree with decorations
//! spliced in, then that tree is flattened. Tree hosts install the tree, flat
//! hosts install the buffer, and both agree on every offset because they are
//! the same rendering.
//!
//! Decoration rules:
//! - a list item in a list gets a marker as its first child (`1. `, `• `)
//! - every list item after the first in its list also gets a zero-width
//!   break between the marker and its content
//! - a block whose only content is one line break is a filler block and the
//!   break is dropped
//! - a block with no block children and no canonical content gets a
//!   placeholder as its last child

use std::convert::Infallible;

use crate::catalog::{DecorationCatalog, DecorationKind};
use crate::config::BridgeConfig;
use crate::document::{ContainerKind, ContainerNode, DocNode, ListType};
use crate::error::{BuildError, Malformed};
use crate::host::{self, Display, HostNode, NodePath};
use crate::types::Generation;
use crate::utf16::Utf16Text;

/// One buffer generation, in both shapes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendering {
    pub generation: Generation,
    pub tree: HostNode,
    pub buffer: Utf16Text,
    pub catalog: DecorationCatalog,
    /// Nodes skipped while building. Always empty from `build_strict`.
    pub warnings: Vec<BuildWarning>,
}

impl Rendering {
    pub fn canonical_len(&self) -> usize {
        self.catalog.canonical_len()
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}

/// A document node that was left out of the rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildWarning {
    /// Path in the model's document, not in the rendered tree.
    pub path: NodePath,
    pub reason: Malformed,
}

/// Decides what happens to a node the builder cannot render.
trait MalformedPolicy {
    type Error;

    fn malformed(&mut self, path: &NodePath, reason: Malformed) -> Result<(), Self::Error>;
}

/// Leave the node out and keep going.
#[derive(Default)]
struct Skip {
    warnings: Vec<BuildWarning>,
}

impl MalformedPolicy for Skip {
    type Error = Infallible;

    fn malformed(&mut self, path: &NodePath, reason: Malformed) -> Result<(), Infallible> {
        tracing::warn!(target: "composer::builder", path = %path, reason = %reason, "skipping malformed node");
        self.warnings.push(BuildWarning {
            path: path.clone(),
            reason,
        });
        Ok(())
    }
}

/// Fail on the first bad node.
struct Reject;

impl MalformedPolicy for Reject {
    type Error = BuildError;

    fn malformed(&mut self, path: &NodePath, reason: Malformed) -> Result<(), BuildError> {
        Err(BuildError::MalformedDocument {
            path: path.clone(),
            reason,
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct DecorationBuilder {
    config: BridgeConfig,
}

impl DecorationBuilder {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Render `doc`, skipping (and reporting) nodes that cannot be rendered.
    pub fn build(&self, doc: &DocNode, generation: Generation) -> Rendering {
        let mut policy = Skip::default();
        let tree = match self.render_root(doc, &mut policy) {
            Ok(tree) => tree,
            Err(never) => match never {},
        };
        self.finish(tree, generation, policy.warnings)
    }

    /// Render `doc`, failing with `MalformedDocument` on the first node that
    /// cannot be rendered.
    pub fn build_strict(
        &self,
        doc: &DocNode,
        generation: Generation,
    ) -> Result<Rendering, BuildError> {
        let tree = self.render_root(doc, &mut Reject)?;
        Ok(self.finish(tree, generation, Vec::new()))
    }

    fn finish(
        &self,
        tree: HostNode,
        generation: Generation,
        warnings: Vec<BuildWarning>,
    ) -> Rendering {
        let (buffer, catalog) = host::flatten(&tree, generation);
        tracing::debug!(
            target: "composer::builder",
            %generation,
            buffer_len = buffer.len(),
            canonical_len = catalog.canonical_len(),
            decorations = catalog.len(),
            skipped = warnings.len(),
            "rendered buffer"
        );
        Rendering {
            generation,
            tree,
            buffer,
            catalog,
            warnings,
        }
    }

    fn render_root<P: MalformedPolicy>(
        &self,
        doc: &DocNode,
        policy: &mut P,
    ) -> Result<HostNode, P::Error> {
        let path = NodePath::root();
        let wrapped;
        let root = match doc {
            DocNode::Container(node) => node,
            other => {
                wrapped = ContainerNode::new("", vec![other.clone()]);
                &wrapped
            }
        };
        match root.kind() {
            Some(kind) => self.render_container(root, kind, &path, Vec::new(), policy),
            None => {
                policy.malformed(
                    &path,
                    Malformed::UnrecognizedNode {
                        name: root.name.clone(),
                    },
                )?;
                let empty = ContainerNode::new("", Vec::new());
                self.render_container(&empty, ContainerKind::Generic, &path, Vec::new(), policy)
            }
        }
    }

    fn render_node<P: MalformedPolicy>(
        &self,
        node: &DocNode,
        path: &NodePath,
        policy: &mut P,
    ) -> Result<Option<HostNode>, P::Error> {
        match node {
            DocNode::Text(text) => {
                if let Some(index) = text.text.find_unpaired_surrogate() {
                    policy.malformed(path, Malformed::UnpairedSurrogate { index })?;
                    return Ok(None);
                }
                Ok(Some(HostNode::Text(text.text.clone())))
            }
            DocNode::LineBreak => Ok(Some(HostNode::LineBreak)),
            DocNode::Container(container) => {
                let Some(kind) = container.kind() else {
                    policy.malformed(
                        path,
                        Malformed::UnrecognizedNode {
                            name: container.name.clone(),
                        },
                    )?;
                    return Ok(None);
                };
                self.render_container(container, kind, path, Vec::new(), policy)
                    .map(Some)
            }
        }
    }

    /// Render a container. `lead` holds decorations that go before its
    /// content (a list item's marker and break).
    fn render_container<P: MalformedPolicy>(
        &self,
        node: &ContainerNode,
        kind: ContainerKind,
        path: &NodePath,
        lead: Vec<HostNode>,
        policy: &mut P,
    ) -> Result<HostNode, P::Error> {
        let mut children = lead;

        if let ContainerKind::List(list_type) = kind {
            let mut number = node.list_start();
            let mut first = true;
            for (index, child) in node.children.iter().enumerate() {
                let child_path = path.child(index);
                match child {
                    DocNode::Container(item) if item.kind() == Some(ContainerKind::ListItem) => {
                        let mut item_lead = Vec::new();
                        item_lead.extend(self.marker(list_type, number));
                        if !first && self.config.decorations.list_item_breaks {
                            item_lead.extend(self.zero_width_break());
                        }
                        children.push(self.render_container(
                            item,
                            ContainerKind::ListItem,
                            &child_path,
                            item_lead,
                            policy,
                        )?);
                        number = number.saturating_add(1);
                        first = false;
                    }
                    other => children.extend(self.render_node(other, &child_path, policy)?),
                }
            }
        } else {
            for (index, child) in node.children.iter().enumerate() {
                children.extend(self.render_node(child, &path.child(index), policy)?);
            }
        }

        let display = if kind.is_block() {
            drop_filler_break(&mut children);
            let has_block_child = children.iter().any(HostNode::is_block);
            if !has_block_child && host::content_len_before(&children, children.len()) == 0 {
                children.extend(self.placeholder());
            }
            Display::Block
        } else {
            Display::Inline
        };

        Ok(HostNode::Element {
            tag: node.name.clone(),
            display,
            children,
        })
    }

    fn marker(&self, list_type: ListType, number: i64) -> Option<HostNode> {
        let text = match list_type {
            ListType::Ordered => self.config.ordered_marker(number),
            ListType::Unordered => self.config.markers.bullet.clone(),
        };
        decoration(DecorationKind::ListMarker, Utf16Text::from(text))
    }

    fn zero_width_break(&self) -> Option<HostNode> {
        let mut text = Utf16Text::new();
        text.push_char(self.config.decorations.zero_width_break);
        decoration(DecorationKind::ZeroWidthBreak, text)
    }

    fn placeholder(&self) -> Option<HostNode> {
        let mut text = Utf16Text::new();
        text.push_char(self.config.decorations.placeholder);
        decoration(DecorationKind::EmptyParagraphPlaceholder, text)
    }
}

fn decoration(kind: DecorationKind, text: Utf16Text) -> Option<HostNode> {
    (!text.is_empty()).then_some(HostNode::Decoration { kind, text })
}

/// Drop the line break of a block whose only content is that break.
fn drop_filler_break(children: &mut Vec<HostNode>) {
    let mut content = children
        .iter()
        .enumerate()
        .filter(|(_, child)| !child.is_decoration());
    let Some((index, HostNode::LineBreak)) = content.next() else {
        return;
    };
    if content.next().is_none() {
        children.remove(index);
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;
    use crate::catalog::DecorationSpan;
    use crate::document::InlineFormat;
    use crate::types::BufferOffset;

    fn two_item_list() -> DocNode {
        DocNode::document(vec![DocNode::list(
            ListType::Ordered,
            vec![
                DocNode::list_item(vec![DocNode::text("Item 1")]),
                DocNode::list_item(vec![DocNode::text("Item 2")]),
            ],
        )])
    }

    fn without_item_breaks() -> DecorationBuilder {
        let mut config = BridgeConfig::default();
        config.decorations.list_item_breaks = false;
        DecorationBuilder::new(config)
    }

    #[test]
    fn test_ordered_list() {
        let rendering = DecorationBuilder::default().build(&two_item_list(), Generation::INITIAL);
        assert_snapshot!(rendering.tree.to_string(), @r"<ol><li>[1. ]Item 1</li><li>[2. ][\u{200b}]Item 2</li></ol>");
        assert_snapshot!(rendering.buffer.to_escaped_string(), @r"1. Item 1\u{a}2. \u{200b}Item 2");
        assert_eq!(rendering.canonical_len(), 13);
        assert_eq!(
            rendering.catalog.spans(),
            &[
                DecorationSpan {
                    start: BufferOffset(0),
                    length: 3,
                    kind: DecorationKind::ListMarker
                },
                DecorationSpan {
                    start: BufferOffset(10),
                    length: 3,
                    kind: DecorationKind::ListMarker
                },
                DecorationSpan {
                    start: BufferOffset(13),
                    length: 1,
                    kind: DecorationKind::ZeroWidthBreak
                },
            ]
        );
    }

    #[test]
    fn test_ordered_list_without_item_breaks() {
        let rendering = without_item_breaks().build(&two_item_list(), Generation::INITIAL);
        assert_eq!(rendering.buffer.to_string(), "1. Item 1\n2. Item 2");
        assert_eq!(rendering.catalog.len(), 2);
    }

    #[test]
    fn test_two_digit_markers_are_wider() {
        let items = (1..=10)
            .map(|i| DocNode::list_item(vec![DocNode::text(&format!("i{i}"))]))
            .collect();
        let doc = DocNode::document(vec![DocNode::list(ListType::Ordered, items)]);
        let rendering = without_item_breaks().build(&doc, Generation::INITIAL);

        let widths: Vec<_> = rendering.catalog.iter().map(|span| span.length).collect();
        assert_eq!(widths, vec![3, 3, 3, 3, 3, 3, 3, 3, 3, 4]);
        assert!(rendering.buffer.to_string().ends_with("\n10. i10"));
    }

    #[test]
    fn test_list_start_attribute() {
        let doc = DocNode::document(vec![
            DocNode::list(
                ListType::Ordered,
                vec![
                    DocNode::list_item(vec![DocNode::text("a")]),
                    DocNode::list_item(vec![DocNode::text("b")]),
                ],
            )
            .with_attr("start", "9"),
        ]);
        let rendering = without_item_breaks().build(&doc, Generation::INITIAL);
        assert_eq!(rendering.buffer.to_string(), "9. a\n10. b");
    }

    #[test]
    fn test_list_start_extremes() {
        let two_items = |start: &str| {
            DocNode::document(vec![
                DocNode::list(
                    ListType::Ordered,
                    vec![
                        DocNode::list_item(vec![DocNode::text("a")]),
                        DocNode::list_item(vec![DocNode::text("b")]),
                    ],
                )
                .with_attr("start", start),
            ])
        };
        let buffer = |start: &str| {
            without_item_breaks()
                .build(&two_items(start), Generation::INITIAL)
                .buffer
                .to_string()
        };

        assert_eq!(buffer("-3"), "-3. a\n-2. b");
        // The last number repeats instead of overflowing.
        assert_eq!(
            buffer("9223372036854775807"),
            "9223372036854775807. a\n9223372036854775807. b"
        );
        assert_eq!(buffer("18446744073709551615"), "1. a\n2. b");
    }

    #[test]
    fn test_bullet_list() {
        let doc = DocNode::document(vec![DocNode::list(
            ListType::Unordered,
            vec![
                DocNode::list_item(vec![DocNode::text("a")]),
                DocNode::list_item(vec![DocNode::text("b")]),
            ],
        )]);
        let rendering = DecorationBuilder::default().build(&doc, Generation::INITIAL);
        assert_snapshot!(rendering.tree.to_string(), @r"<ul><li>[• ]a</li><li>[• ][\u{200b}]b</li></ul>");
        assert_eq!(rendering.canonical_len(), 3);
    }

    #[test]
    fn test_empty_paragraph_gets_placeholder() {
        let doc = DocNode::document(vec![DocNode::paragraph(vec![])]);
        let rendering = DecorationBuilder::default().build(&doc, Generation::INITIAL);
        assert_snapshot!(rendering.tree.to_string(), @r"<p>[\u{a0}]</p>");
        assert_eq!(rendering.buffer_len(), 1);
        assert_eq!(rendering.canonical_len(), 0);
        assert_eq!(
            rendering.catalog.spans()[0].kind,
            DecorationKind::EmptyParagraphPlaceholder
        );
    }

    #[test]
    fn test_filler_break_becomes_placeholder() {
        let doc = DocNode::document(vec![
            DocNode::paragraph(vec![DocNode::text("a")]),
            DocNode::paragraph(vec![DocNode::line_break()]),
        ]);
        let rendering = DecorationBuilder::default().build(&doc, Generation::INITIAL);
        assert_snapshot!(rendering.tree.to_string(), @r"<p>a</p><p>[\u{a0}]</p>");
        assert_eq!(rendering.buffer.to_string(), "a\n\u{a0}");
        assert_eq!(rendering.canonical_len(), 2);
    }

    #[test]
    fn test_break_with_content_is_kept() {
        let doc = DocNode::document(vec![DocNode::paragraph(vec![
            DocNode::text("a"),
            DocNode::line_break(),
            DocNode::formatted(InlineFormat::Bold, vec![DocNode::text("b")]),
        ])]);
        let rendering = DecorationBuilder::default().build(&doc, Generation::INITIAL);
        assert_eq!(rendering.buffer.to_string(), "a\nb");
        assert!(rendering.catalog.is_empty());
    }

    #[test]
    fn test_empty_list_item_gets_marker_and_placeholder() {
        let doc = DocNode::document(vec![DocNode::list(
            ListType::Ordered,
            vec![
                DocNode::list_item(vec![DocNode::text("a")]),
                DocNode::list_item(vec![DocNode::line_break()]),
            ],
        )]);
        let rendering = DecorationBuilder::default().build(&doc, Generation::INITIAL);
        assert_snapshot!(rendering.tree.to_string(), @r"<ol><li>[1. ]a</li><li>[2. ][\u{200b}][\u{a0}]</li></ol>");
        assert_eq!(rendering.canonical_len(), 2);
    }

    #[test]
    fn test_empty_document() {
        let rendering =
            DecorationBuilder::default().build(&DocNode::document(vec![]), Generation::INITIAL);
        assert_eq!(rendering.buffer.to_string(), "\u{a0}");
        assert_eq!(rendering.canonical_len(), 0);
    }

    #[test]
    fn test_unrecognized_node_is_skipped() {
        let doc = DocNode::document(vec![DocNode::paragraph(vec![
            DocNode::text("a"),
            DocNode::container("marquee", vec![DocNode::text("zzz")]),
            DocNode::text("b"),
        ])]);
        let rendering = DecorationBuilder::default().build(&doc, Generation::INITIAL);
        assert_eq!(rendering.buffer.to_string(), "ab");
        assert_eq!(
            rendering.warnings,
            vec![BuildWarning {
                path: NodePath::new(vec![0, 1]),
                reason: Malformed::UnrecognizedNode {
                    name: "marquee".into()
                },
            }]
        );

        let err = DecorationBuilder::default()
            .build_strict(&doc, Generation::INITIAL)
            .unwrap_err();
        assert_eq!(err.to_string(), "malformed document at 0.1: unrecognised node `marquee`");
    }

    #[test]
    fn test_unpaired_surrogate_is_skipped() {
        let doc = DocNode::document(vec![DocNode::paragraph(vec![
            DocNode::text_units(vec![0x61, 0xD83D]),
        ])]);
        let rendering = DecorationBuilder::default().build(&doc, Generation::INITIAL);
        // With its only text gone the paragraph is empty.
        assert_eq!(rendering.buffer.to_string(), "\u{a0}");
        assert_eq!(
            rendering.warnings[0].reason,
            Malformed::UnpairedSurrogate { index: 1 }
        );
        assert!(matches!(
            DecorationBuilder::default().build_strict(&doc, Generation::INITIAL),
            Err(BuildError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_surrogate_pairs_pass_through() {
        let doc = DocNode::document(vec![DocNode::list(
            ListType::Unordered,
            vec![DocNode::list_item(vec![DocNode::text("😋😋")])],
        )]);
        let rendering = DecorationBuilder::default().build(&doc, Generation::INITIAL);
        assert_eq!(rendering.buffer.to_string(), "• 😋😋");
        assert_eq!(rendering.buffer_len(), 6);
        assert_eq!(rendering.canonical_len(), 4);
    }

    #[test]
    fn test_custom_markers() {
        let config = BridgeConfig::from_toml_str("[markers]\nordered = \"({n}) \"").unwrap();
        let rendering = DecorationBuilder::new(config).build(&two_item_list(), Generation::INITIAL);
        assert_eq!(rendering.catalog.spans()[0].length, 4);
        assert!(rendering.buffer.to_string().starts_with("(1) Item 1"));
    }
}
