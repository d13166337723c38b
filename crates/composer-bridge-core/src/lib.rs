//! Offset translation between a rich-text model and the buffers its hosts
//! render.
//!
//! The model addresses positions as UTF-16 offsets into its canonical text.
//! Hosts show a decorated version of that text: list markers, zero-width
//! breaks between list items and placeholders in empty blocks. This crate
//! renders the decorated buffer from the model's document, records where the
//! decorations are, and maps offsets and selections between the two spaces.
//!
//! - [`builder`] renders a [`DocNode`] into a [`Rendering`]: a host tree, the
//!   flat buffer and its [`DecorationCatalog`]
//! - [`mapping`] and [`selection`] translate flat offsets and pairs
//! - [`tree`] counts and locates positions in the host tree
//! - [`session`] ties it to model updates and host events, one generation
//!   at a time

pub mod builder;
pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod host;
pub mod mapping;
pub mod platform;
pub mod selection;
pub mod session;
pub mod tree;
pub mod types;
pub mod utf16;

pub use builder::{BuildWarning, DecorationBuilder, Rendering};
pub use catalog::{CatalogBuilder, DecorationCatalog, DecorationKind, DecorationSpan};
pub use config::{BridgeConfig, StalePolicy};
pub use document::{ContainerKind, ContainerNode, DocNode, InlineFormat, ListType, TextNode};
pub use error::{BuildError, CatalogError, ConfigError, InvalidOffset, MapError, Malformed, Space};
pub use host::{HostNode, NodePath, flatten};
pub use mapping::{clamp_to_buffer, to_buffer, to_buffer_with_affinity, to_canonical};
pub use platform::{HeadlessSurface, HostSurface};
pub use selection::{Direction, Translate, TranslatedPair, translate, translate_with_affinity};
pub use session::{
    BridgeSession, BufferSelection, HostEdit, HostEvent, HostSelection, ModelEvent, ModelUpdate,
    TreeSelection,
};
pub use tree::{Located, TreePosition, count_through, locate};
pub use types::{Affinity, BufferOffset, CanonicalOffset, Generation, OffsetPair};
pub use utf16::Utf16Text;
