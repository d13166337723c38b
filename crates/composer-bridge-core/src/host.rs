//! The rendered host tree.
//!
//! This is what a browser-style host puts on screen: the model's structure
//! with decorations spliced in as explicit nodes. Flat-buffer hosts never see
//! the tree; they get [`flatten`]ed text plus a catalog. Both shapes come out of
//! the same tree, so the canonical arithmetic here is shared by the catalog
//! mappers and the tree counter.
//!
//! Canonical text is derived structurally:
//! - text contributes its code units
//! - a line break contributes one `\n`
//! - decorations contribute nothing
//! - between two consecutive non-decoration siblings where either is a block,
//!   one `\n` separator is contributed.

use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;

use crate::catalog::{CatalogBuilder, DecorationCatalog, DecorationKind, DecorationSpan};
use crate::types::{BufferOffset, Generation};
use crate::utf16::Utf16Text;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Display {
    Block,
    Inline,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostNode {
    Element {
        tag: SmolStr,
        display: Display,
        children: Vec<HostNode>,
    },
    Text(Utf16Text),
    LineBreak,
    /// Synthetic content with no canonical counterpart.
    Decoration {
        kind: DecorationKind,
        text: Utf16Text,
    },
}

impl HostNode {
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            HostNode::Element {
                display: Display::Block,
                ..
            }
        )
    }

    pub fn is_decoration(&self) -> bool {
        matches!(self, HostNode::Decoration { .. })
    }

    pub fn children(&self) -> &[HostNode] {
        match self {
            HostNode::Element { children, .. } => children,
            _ => &[],
        }
    }

    /// Canonical code units this node accounts for, separators included.
    pub fn canonical_len(&self) -> usize {
        match self {
            HostNode::Text(text) => text.len(),
            HostNode::LineBreak => 1,
            HostNode::Decoration { .. } => 0,
            HostNode::Element { children, .. } => content_len_before(children, children.len()),
        }
    }

    /// Code units this node occupies in a flattened buffer.
    pub fn buffer_len(&self) -> usize {
        match self {
            HostNode::Text(text) => text.len(),
            HostNode::LineBreak => 1,
            HostNode::Decoration { text, .. } => text.len(),
            HostNode::Element { children, .. } => {
                let separators = (0..children.len())
                    .filter(|&i| separator_before(children, i))
                    .count();
                separators + children.iter().map(HostNode::buffer_len).sum::<usize>()
            }
        }
    }

    /// Follow `path` down from this node.
    pub fn get(&self, path: &NodePath) -> Option<&HostNode> {
        let mut node = self;
        for &index in path.indices() {
            node = node.children().get(index)?;
        }
        Some(node)
    }
}

/// Whether one canonical separator sits between two adjacent content siblings.
pub(crate) fn needs_separator(prev: &HostNode, next: &HostNode) -> bool {
    prev.is_block() || next.is_block()
}

/// Whether a separator is emitted right before `children[index]`.
///
/// Decorations are transparent: they neither take a separator nor stop the
/// previous content sibling from counting as adjacent.
pub(crate) fn separator_before(children: &[HostNode], index: usize) -> bool {
    let Some(child) = children.get(index) else {
        return false;
    };
    if child.is_decoration() {
        return false;
    }
    children[..index]
        .iter()
        .rev()
        .find(|prev| !prev.is_decoration())
        .is_some_and(|prev| needs_separator(prev, child))
}

/// Canonical length of `children[..end]`, counting the separators before each
/// of those children but not the one before `children[end]`.
pub(crate) fn content_len_before(children: &[HostNode], end: usize) -> usize {
    let end = end.min(children.len());
    let mut len = 0;
    let mut prev: Option<&HostNode> = None;
    for child in &children[..end] {
        if child.is_decoration() {
            continue;
        }
        if prev.is_some_and(|prev| needs_separator(prev, child)) {
            len += 1;
        }
        len += child.canonical_len();
        prev = Some(child);
    }
    len
}

/// Lay the tree out as one flat buffer and record where its decorations went.
pub fn flatten(root: &HostNode, generation: Generation) -> (Utf16Text, DecorationCatalog) {
    let mut buffer = Utf16Text::new();
    let mut catalog = CatalogBuilder::new(generation);
    flatten_into(root, &mut buffer, &mut catalog);
    let catalog = catalog.finish(&buffer);
    (buffer, catalog)
}

fn flatten_into(node: &HostNode, buffer: &mut Utf16Text, catalog: &mut CatalogBuilder) {
    match node {
        HostNode::Text(text) => buffer.push_units(text.units()),
        HostNode::LineBreak => buffer.push_char('\n'),
        HostNode::Decoration { kind, text } => {
            if text.is_empty() {
                return;
            }
            catalog.push_unchecked(DecorationSpan {
                start: BufferOffset(buffer.len()),
                length: text.len(),
                kind: *kind,
            });
            buffer.push_units(text.units());
        }
        HostNode::Element { children, .. } => {
            for (index, child) in children.iter().enumerate() {
                if separator_before(children, index) {
                    buffer.push_char('\n');
                }
                flatten_into(child, buffer, catalog);
            }
        }
    }
}

impl fmt::Display for HostNode {
    /// Markup-like rendering for logs and snapshots. Decorations show up in
    /// square brackets, invisible characters escaped.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostNode::Text(text) => f.write_str(&text.to_escaped_string()),
            HostNode::LineBreak => f.write_str("<br>"),
            HostNode::Decoration { text, .. } => write!(f, "[{}]", text.to_escaped_string()),
            HostNode::Element { tag, children, .. } => {
                if !tag.is_empty() {
                    write!(f, "<{tag}>")?;
                }
                for child in children {
                    write!(f, "{child}")?;
                }
                if !tag.is_empty() {
                    write!(f, "</{tag}>")?;
                }
                Ok(())
            }
        }
    }
}

/// Child-index path from the root to a node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Path to the `index`-th child of this node.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = std::num::ParseIntError;

    /// Parses `0.2.1`; an empty string or `(root)` is the root.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "(root)" {
            return Ok(Self::root());
        }
        s.split('.')
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}
