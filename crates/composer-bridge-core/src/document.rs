//! The canonical document tree, as handed over by the model.
//!
//! The model owns and versions this tree; nothing here mutates it. Containers
//! carry their tag name and the kind is derived from the name the same way the
//! model classifies its nodes, which is also how an unrecognised node shows up:
//! a tag no kind claims.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::utf16::Utf16Text;

/// A node in the model's document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocNode {
    Container(ContainerNode),
    Text(TextNode),
    LineBreak,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerNode {
    /// Tag name, e.g. `p`, `ol`, `strong`. Empty for the root.
    pub name: SmolStr,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<(SmolStr, SmolStr)>,
    #[serde(default)]
    pub children: Vec<DocNode>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: Utf16Text,
}

/// What a container means to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerKind {
    /// The document root or a `div`.
    Generic,
    Paragraph,
    List(ListType),
    ListItem,
    Quote,
    CodeBlock,
    Formatting(InlineFormat),
    Link,
    /// A `span` or similar inline wrapper with no semantics of its own.
    InlineGeneric,
}

impl ContainerKind {
    /// Classify a tag name. `None` means the renderer does not know the node.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "" | "div" => ContainerKind::Generic,
            "p" => ContainerKind::Paragraph,
            "ol" => ContainerKind::List(ListType::Ordered),
            "ul" => ContainerKind::List(ListType::Unordered),
            "li" => ContainerKind::ListItem,
            "blockquote" => ContainerKind::Quote,
            "pre" => ContainerKind::CodeBlock,
            "a" => ContainerKind::Link,
            "span" => ContainerKind::InlineGeneric,
            other => ContainerKind::Formatting(InlineFormat::from_tag(other)?),
        };
        Some(kind)
    }

    /// Block containers are separated from their content siblings by one
    /// canonical code unit.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            ContainerKind::Generic
                | ContainerKind::Paragraph
                | ContainerKind::List(_)
                | ContainerKind::ListItem
                | ContainerKind::Quote
                | ContainerKind::CodeBlock
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListType {
    Ordered,
    Unordered,
}

impl ListType {
    pub fn tag(&self) -> &'static str {
        match self {
            ListType::Ordered => "ol",
            ListType::Unordered => "ul",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InlineFormat {
    Bold,
    Italic,
    StrikeThrough,
    Underline,
    InlineCode,
}

impl InlineFormat {
    pub fn tag(&self) -> &'static str {
        match self {
            InlineFormat::Bold => "strong",
            InlineFormat::Italic => "em",
            InlineFormat::StrikeThrough => "del",
            InlineFormat::Underline => "u",
            InlineFormat::InlineCode => "code",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "b" | "strong" => Some(InlineFormat::Bold),
            "i" | "em" => Some(InlineFormat::Italic),
            "del" => Some(InlineFormat::StrikeThrough),
            "u" => Some(InlineFormat::Underline),
            "code" => Some(InlineFormat::InlineCode),
            _ => None,
        }
    }
}

impl ContainerNode {
    pub fn new(name: impl Into<SmolStr>, children: Vec<DocNode>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children,
        }
    }

    pub fn kind(&self) -> Option<ContainerKind> {
        ContainerKind::from_tag(&self.name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First number of an ordered list, from its `start` attribute. Negative
    /// starts are allowed; anything that is not an `i64` counts from 1.
    pub fn list_start(&self) -> i64 {
        self.attr("start")
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(1)
    }
}

impl DocNode {
    pub fn text(text: &str) -> Self {
        DocNode::Text(TextNode {
            text: Utf16Text::from(text),
        })
    }

    /// Text from raw code units, e.g. straight from a host binding.
    pub fn text_units(units: impl Into<Vec<u16>>) -> Self {
        DocNode::Text(TextNode {
            text: Utf16Text::from_units(units),
        })
    }

    pub fn line_break() -> Self {
        DocNode::LineBreak
    }

    pub fn container(name: &str, children: Vec<DocNode>) -> Self {
        DocNode::Container(ContainerNode::new(name, children))
    }

    /// The model's root node.
    pub fn document(children: Vec<DocNode>) -> Self {
        Self::container("", children)
    }

    pub fn paragraph(children: Vec<DocNode>) -> Self {
        Self::container("p", children)
    }

    pub fn list(list_type: ListType, items: Vec<DocNode>) -> Self {
        Self::container(list_type.tag(), items)
    }

    pub fn list_item(children: Vec<DocNode>) -> Self {
        Self::container("li", children)
    }

    pub fn formatted(format: InlineFormat, children: Vec<DocNode>) -> Self {
        Self::container(format.tag(), children)
    }

    pub fn link(url: &str, children: Vec<DocNode>) -> Self {
        let mut node = ContainerNode::new("a", children);
        node.attrs.push(("href".into(), url.into()));
        DocNode::Container(node)
    }

    /// Add an attribute. No-op for text and line breaks.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        if let DocNode::Container(node) = &mut self {
            node.attrs.push((name.into(), value.into()));
        }
        self
    }

    pub fn children(&self) -> &[DocNode] {
        match self {
            DocNode::Container(node) => &node.children,
            _ => &[],
        }
    }
}
