//! Codeunit counting over a rendered tree.
//!
//! Tree hosts report positions as a node plus an offset within it: a code
//! unit offset for text, a child index for elements. These functions convert
//! between that and canonical offsets without a catalog; decorations and
//! block separators are found by looking at the tree itself.

use crate::error::{InvalidOffset, MapError, Space};
use crate::host::{HostNode, NodePath, content_len_before, separator_before};
use crate::types::CanonicalOffset;

/// A position inside a rendered tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreePosition {
    pub path: NodePath,
    /// Code units into a text node, or a child index into an element.
    pub offset: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Located {
    At(TreePosition),
    /// The offset is beyond the document; select the end of the buffer.
    PastEnd,
}

/// Canonical offset of `offset` within the node at `path`.
///
/// Text offsets past the end of the node are clamped to it. An offset into a
/// line break counts the break unless it is 0.
pub fn count_through(
    root: &HostNode,
    path: &NodePath,
    offset: usize,
) -> Result<CanonicalOffset, MapError> {
    let mut node = root;
    let mut count = 0;
    for &index in path.indices() {
        let children = node.children();
        let Some(child) = children.get(index) else {
            return Err(MapError::UnknownNode(path.clone()));
        };
        count += content_len_before(children, index);
        if separator_before(children, index) {
            count += 1;
        }
        node = child;
    }

    count += match node {
        HostNode::Text(text) => {
            let offset = offset.min(text.len());
            if !text.is_char_boundary(offset) {
                return Err(InvalidOffset::SplitsSurrogatePair {
                    space: Space::Buffer,
                    offset,
                }
                .into());
            }
            offset
        }
        HostNode::LineBreak => usize::from(offset > 0),
        HostNode::Decoration { .. } => 0,
        HostNode::Element { children, .. } => content_len_before(children, offset),
    };
    tracing::trace!(target: "composer::tree", path = %path, offset, canonical = count, "count through");
    Ok(CanonicalOffset(count))
}

/// Find the tree position for a canonical offset.
///
/// Ties go to the earliest position: the end of a text node wins over the
/// start of the next one, and a decoration at the offset wins over the
/// content after it. An offset between the halves of a surrogate pair fails.
pub fn locate(root: &HostNode, offset: CanonicalOffset) -> Result<Located, MapError> {
    if offset.0 > root.canonical_len() {
        return Ok(Located::PastEnd);
    }

    let mut path = NodePath::root();
    let mut node = root;
    let mut target = offset.0;
    loop {
        let HostNode::Element { children, .. } = node else {
            if let HostNode::Text(text) = node {
                if !text.is_char_boundary(target) {
                    return Err(InvalidOffset::SplitsSurrogatePair {
                        space: Space::Canonical,
                        offset: offset.0,
                    }
                    .into());
                }
            }
            let offset = if node.is_decoration() { 0 } else { target };
            return Ok(Located::At(TreePosition { path, offset }));
        };

        let mut acc = 0;
        let mut next = None;
        for (index, child) in children.iter().enumerate() {
            if child.is_decoration() {
                if target == acc {
                    return Ok(Located::At(TreePosition {
                        path: path.child(index),
                        offset: 0,
                    }));
                }
                continue;
            }
            if separator_before(children, index) {
                if target == acc {
                    return Ok(Located::At(TreePosition {
                        path,
                        offset: index,
                    }));
                }
                acc += 1;
            }
            let len = child.canonical_len();
            let claims = match child {
                HostNode::LineBreak => target == acc,
                _ => target <= acc + len,
            };
            if claims {
                next = Some((index, target - acc));
                break;
            }
            acc += len;
        }

        match next {
            Some((index, rest)) => {
                path = path.child(index);
                node = &children[index];
                target = rest;
            }
            None => {
                return Ok(Located::At(TreePosition {
                    path,
                    offset: children.len(),
                }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DecorationBuilder;
    use crate::document::{DocNode, InlineFormat, ListType};
    use crate::types::Generation;

    fn render(doc: DocNode) -> HostNode {
        DecorationBuilder::default()
            .build(&doc, Generation::INITIAL)
            .tree
    }

    fn at(path: &[usize], offset: usize) -> Result<Located, MapError> {
        Ok(Located::At(TreePosition {
            path: NodePath::new(path.to_vec()),
            offset,
        }))
    }

    fn paragraphs() -> HostNode {
        // "ab\nc<br>d"
        render(DocNode::document(vec![
            DocNode::paragraph(vec![DocNode::text("ab")]),
            DocNode::paragraph(vec![
                DocNode::text("c"),
                DocNode::line_break(),
                DocNode::formatted(InlineFormat::Italic, vec![DocNode::text("d")]),
            ]),
        ]))
    }

    #[test]
    fn test_count_text_positions() {
        let root = paragraphs();
        let count = |path: &[usize], offset| {
            count_through(&root, &NodePath::new(path.to_vec()), offset)
                .unwrap()
                .get()
        };
        assert_eq!(count(&[0, 0], 0), 0);
        assert_eq!(count(&[0, 0], 2), 2);
        assert_eq!(count(&[1, 0], 0), 3);
        assert_eq!(count(&[1, 0], 1), 4);
        assert_eq!(count(&[1, 2, 0], 1), 6);
        // Clamped to the text length.
        assert_eq!(count(&[0, 0], 9), 2);
    }

    #[test]
    fn test_count_line_break_and_elements() {
        let root = paragraphs();
        let count = |path: &[usize], offset| {
            count_through(&root, &NodePath::new(path.to_vec()), offset)
                .unwrap()
                .get()
        };
        assert_eq!(count(&[1, 1], 0), 4);
        assert_eq!(count(&[1, 1], 1), 5);
        // Child indices do not include the separator before that child.
        assert_eq!(count(&[], 0), 0);
        assert_eq!(count(&[], 1), 2);
        assert_eq!(count(&[], 2), 6);
        assert_eq!(count(&[1], 2), 5);
    }

    #[test]
    fn test_unknown_path() {
        let root = paragraphs();
        let path = NodePath::new(vec![3, 0]);
        assert_eq!(
            count_through(&root, &path, 0),
            Err(MapError::UnknownNode(path))
        );
    }

    #[test]
    fn test_count_rejects_surrogate_split() {
        let root = render(DocNode::document(vec![DocNode::paragraph(vec![DocNode::text("😋")])]));
        assert!(matches!(
            count_through(&root, &NodePath::new(vec![0, 0]), 1),
            Err(MapError::InvalidOffset(InvalidOffset::SplitsSurrogatePair { .. }))
        ));
    }

    #[test]
    fn test_locate_rejects_surrogate_split() {
        let root = render(DocNode::document(vec![DocNode::list(
            ListType::Unordered,
            vec![DocNode::list_item(vec![DocNode::text("😋😋")])],
        )]));
        assert_eq!(locate(&root, CanonicalOffset(0)), at(&[0, 0, 0], 0));
        assert_eq!(locate(&root, CanonicalOffset(2)), at(&[0, 0, 1], 2));
        assert_eq!(locate(&root, CanonicalOffset(4)), at(&[0, 0, 1], 4));
        for c in [1, 3] {
            assert_eq!(
                locate(&root, CanonicalOffset(c)),
                Err(MapError::InvalidOffset(InvalidOffset::SplitsSurrogatePair {
                    space: Space::Canonical,
                    offset: c
                }))
            );
        }
    }

    #[test]
    fn test_locate() {
        let root = paragraphs();
        assert_eq!(locate(&root, CanonicalOffset(0)), at(&[0, 0], 0));
        assert_eq!(locate(&root, CanonicalOffset(2)), at(&[0, 0], 2));
        assert_eq!(locate(&root, CanonicalOffset(3)), at(&[1, 0], 0));
        assert_eq!(locate(&root, CanonicalOffset(4)), at(&[1, 0], 1));
        assert_eq!(locate(&root, CanonicalOffset(5)), at(&[1, 2, 0], 0));
        assert_eq!(locate(&root, CanonicalOffset(6)), at(&[1, 2, 0], 1));
        assert_eq!(locate(&root, CanonicalOffset(7)), Ok(Located::PastEnd));
    }

    #[test]
    fn test_locate_lands_before_list_markers() {
        let root = render(DocNode::document(vec![DocNode::list(
            ListType::Ordered,
            vec![
                DocNode::list_item(vec![DocNode::text("Item 1")]),
                DocNode::list_item(vec![DocNode::text("Item 2")]),
            ],
        )]));
        assert_eq!(locate(&root, CanonicalOffset(0)), at(&[0, 0, 0], 0));
        assert_eq!(locate(&root, CanonicalOffset(6)), at(&[0, 0, 1], 6));
        assert_eq!(locate(&root, CanonicalOffset(7)), at(&[0, 1, 0], 0));
        assert_eq!(locate(&root, CanonicalOffset(8)), at(&[0, 1, 2], 1));
    }

    #[test]
    fn test_locate_empty_paragraph() {
        let root = render(DocNode::document(vec![DocNode::paragraph(vec![])]));
        assert_eq!(locate(&root, CanonicalOffset(0)), at(&[0, 0], 0));
        assert_eq!(locate(&root, CanonicalOffset(1)), Ok(Located::PastEnd));
    }

    #[test]
    fn test_locate_then_count_round_trips() {
        let root = paragraphs();
        for c in 0..=root.canonical_len() {
            let Ok(Located::At(position)) = locate(&root, CanonicalOffset(c)) else {
                panic!("{c} should be inside the tree");
            };
            assert_eq!(
                count_through(&root, &position.path, position.offset),
                Ok(CanonicalOffset(c))
            );
        }
    }
}
