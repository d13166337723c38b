//! Error types for offset translation and rendering.

use std::fmt;

use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

use crate::host::NodePath;
use crate::types::Generation;

/// Which offset space a value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Space {
    Canonical,
    Buffer,
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Space::Canonical => "canonical",
            Space::Buffer => "buffer",
        })
    }
}

/// An offset that cannot be mapped. Fails the single call; the caller
/// clamps or drops the event.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum InvalidOffset {
    #[error("negative {space} offset {offset}")]
    #[diagnostic(code(composer::offset::negative))]
    Negative { space: Space, offset: i64 },

    #[error("{space} offset {offset} is past the end (length {len})")]
    #[diagnostic(
        code(composer::offset::out_of_range),
        help("clamp the offset to the current length or drop the event")
    )]
    OutOfRange {
        space: Space,
        offset: usize,
        len: usize,
    },

    #[error("{space} offset {offset} splits a surrogate pair")]
    #[diagnostic(code(composer::offset::splits_surrogate_pair))]
    SplitsSurrogatePair { space: Space, offset: usize },
}

/// Errors from the mappers, the tree counter and the session.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
#[non_exhaustive]
pub enum MapError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidOffset(#[from] InvalidOffset),

    /// A host event or catalog from an older buffer generation.
    #[error("generation {found} does not match the installed generation {current}")]
    #[diagnostic(
        code(composer::stale_catalog),
        help("discard catalogs and host events from before the last replace-all")
    )]
    StaleCatalog {
        current: Generation,
        found: Generation,
    },

    #[error("no node at path {0}")]
    #[diagnostic(code(composer::tree::unknown_node))]
    UnknownNode(NodePath),

    #[error("no buffer has been rendered yet")]
    #[diagnostic(code(composer::no_rendering))]
    NoRendering,
}

/// What is wrong with a skipped document node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Malformed {
    #[error("unpaired surrogate at code unit {index}")]
    UnpairedSurrogate { index: usize },

    #[error("unrecognised node `{name}`")]
    UnrecognizedNode { name: SmolStr },
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum BuildError {
    #[error("malformed document at {path}: {reason}")]
    #[diagnostic(code(composer::malformed_document))]
    MalformedDocument { path: NodePath, reason: Malformed },
}

/// Decoration spans that do not describe a buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum CatalogError {
    #[error("decoration at {start} overlaps or precedes the previous one ending at {previous_end}")]
    #[diagnostic(code(composer::catalog::out_of_order))]
    OutOfOrder { start: usize, previous_end: usize },

    #[error("decoration at {start} is empty")]
    #[diagnostic(code(composer::catalog::empty_span))]
    EmptySpan { start: usize },

    #[error("decoration ending at {end} runs past the buffer (length {len})")]
    #[diagnostic(code(composer::catalog::past_end))]
    PastEnd { end: usize, len: usize },
}

#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("failed to parse configuration")]
    #[diagnostic(code(composer::config::parse))]
    Parse(#[from] toml::de::Error),

    #[error("ordered marker template {0:?} has no `{{n}}` placeholder")]
    #[diagnostic(code(composer::config::marker_template))]
    MissingNumber(String),

    #[error("`{0}` must not be empty")]
    #[diagnostic(code(composer::config::empty_marker))]
    EmptyMarker(&'static str),

    #[error("`{field}` must be a single UTF-16 code unit, got {value:?}")]
    #[diagnostic(code(composer::config::not_single_unit))]
    NotSingleUnit { field: &'static str, value: char },
}
