//! The model/host bridge.
//!
//! A [`BridgeSession`] holds the one rendering that is current for a host.
//! Model updates replace or reselect it; host events are translated against
//! it. Every host event names the generation it was observed under, so a
//! selection change that raced a replace-all is caught instead of silently
//! mapped through the wrong catalog.

use crate::builder::{DecorationBuilder, Rendering};
use crate::config::{BridgeConfig, StalePolicy};
use crate::document::DocNode;
use crate::error::MapError;
use crate::mapping;
use crate::platform::HostSurface;
use crate::selection::{self, Direction, TranslatedPair};
use crate::tree::{self, Located, TreePosition};
use crate::types::{BufferOffset, CanonicalOffset, Generation, OffsetPair};
use crate::utf16::Utf16Text;

/// What the model asks the host to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelUpdate {
    /// New content and a selection in it.
    ReplaceAll {
        document: DocNode,
        selection: OffsetPair<CanonicalOffset>,
    },
    /// New selection in the current content.
    Select(OffsetPair<CanonicalOffset>),
    /// Nothing changed.
    Keep,
}

/// A model selection translated for the current buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferSelection {
    pub generation: Generation,
    pub selection: TranslatedPair<BufferOffset>,
}

/// A selection reported by a flat host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostSelection {
    pub generation: Generation,
    pub selection: OffsetPair<BufferOffset>,
}

/// A text change reported by a flat host: `range` was replaced by
/// `replacement`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostEdit {
    pub generation: Generation,
    pub range: OffsetPair<BufferOffset>,
    pub replacement: Utf16Text,
}

/// A selection reported by a tree host, as anchor and focus positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeSelection {
    pub generation: Generation,
    pub anchor: TreePosition,
    pub focus: TreePosition,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
    Selection(HostSelection),
    Edit(HostEdit),
    TreeSelection(TreeSelection),
}

/// What the host tells the model, in canonical space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelEvent {
    Selection(TranslatedPair<CanonicalOffset>),
    Edit {
        range: OffsetPair<CanonicalOffset>,
        replacement: Utf16Text,
    },
}

#[derive(Debug)]
pub struct BridgeSession {
    config: BridgeConfig,
    builder: DecorationBuilder,
    rendering: Option<Rendering>,
    generation: Generation,
}

impl BridgeSession {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            builder: DecorationBuilder::new(config.clone()),
            config,
            rendering: None,
            generation: Generation::INITIAL,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The current rendering, once the first replace-all has happened.
    pub fn rendering(&self) -> Option<&Rendering> {
        self.rendering.as_ref()
    }

    /// Generation of the last rendering, `Generation::INITIAL` before any.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Render `document` as a new generation and translate `selection` into
    /// it.
    ///
    /// The new rendering is installed even when the selection is invalid; the
    /// error then only concerns the selection.
    pub fn replace_all(
        &mut self,
        document: &DocNode,
        selection: OffsetPair<CanonicalOffset>,
    ) -> Result<BufferSelection, MapError> {
        let generation = self.generation.next();
        let rendering = self.builder.build(document, generation);
        tracing::debug!(
            target: "composer::session",
            %generation,
            buffer_len = rendering.buffer_len(),
            "replace all"
        );
        self.generation = generation;
        self.rendering = Some(rendering);
        self.select(selection)
    }

    /// Translate a model selection into the current buffer.
    pub fn select(
        &self,
        selection: OffsetPair<CanonicalOffset>,
    ) -> Result<BufferSelection, MapError> {
        let rendering = self.current()?;
        let translated = selection::translate_with_affinity(
            selection,
            &rendering.catalog,
            self.config.mapping.caret_affinity,
        )?;
        Ok(BufferSelection {
            generation: rendering.generation,
            selection: translated,
        })
    }

    /// Translate a host selection into model space.
    pub fn report_selection(&self, event: HostSelection) -> Result<ModelEvent, MapError> {
        let (rendering, stale) = self.checked(event.generation)?;
        let selection = if stale {
            event
                .selection
                .map(|offset| mapping::clamp_to_buffer(offset, &rendering.catalog))
        } else {
            event.selection
        };
        let translated = selection::translate(selection, &rendering.catalog)?;
        Ok(ModelEvent::Selection(translated))
    }

    /// Translate a host text change into model space. Zero-width breaks in
    /// the replacement are decoration residue and are dropped.
    pub fn report_edit(&self, event: HostEdit) -> Result<ModelEvent, MapError> {
        let (rendering, stale) = self.checked(event.generation)?;
        let range = if stale {
            event
                .range
                .map(|offset| mapping::clamp_to_buffer(offset, &rendering.catalog))
        } else {
            event.range
        };
        let covered = rendering.catalog.spans_in(range.lo()..range.hi());
        if !covered.is_empty() {
            tracing::debug!(
                target: "composer::session",
                decorations = covered.len(),
                "edit replaces decorations"
            );
        }
        let translated = selection::translate(range, &rendering.catalog)?;
        Ok(ModelEvent::Edit {
            range: translated.normalized(),
            replacement: event
                .replacement
                .without_char(self.config.decorations.zero_width_break),
        })
    }

    /// Translate a tree host's selection into model space.
    pub fn report_tree_selection(&self, event: &TreeSelection) -> Result<ModelEvent, MapError> {
        let (rendering, stale) = self.checked(event.generation)?;
        if stale {
            // Tree positions cannot be clamped into another tree.
            return Err(MapError::StaleCatalog {
                current: rendering.generation,
                found: event.generation,
            });
        }
        let anchor = tree::count_through(&rendering.tree, &event.anchor.path, event.anchor.offset)?;
        let focus = tree::count_through(&rendering.tree, &event.focus.path, event.focus.offset)?;
        Ok(ModelEvent::Selection(TranslatedPair::from_mapped(
            OffsetPair::new(anchor, focus),
            Direction::BufferToModel,
        )))
    }

    pub fn handle_host_event(&self, event: HostEvent) -> Result<ModelEvent, MapError> {
        match event {
            HostEvent::Selection(selection) => self.report_selection(selection),
            HostEvent::Edit(edit) => self.report_edit(edit),
            HostEvent::TreeSelection(selection) => self.report_tree_selection(&selection),
        }
    }

    /// Tree position of a canonical offset in the current rendering.
    pub fn locate(&self, offset: CanonicalOffset) -> Result<Located, MapError> {
        let rendering = self.current()?;
        tree::locate(&rendering.tree, offset)
    }

    /// Apply a model update to the session and push the result into `surface`.
    pub fn apply_update(
        &mut self,
        update: &ModelUpdate,
        surface: &mut impl HostSurface,
    ) -> Result<(), MapError> {
        let selection = match update {
            ModelUpdate::ReplaceAll {
                document,
                selection,
            } => {
                let result = self.replace_all(document, *selection);
                if let Some(rendering) = &self.rendering {
                    surface.install_buffer(rendering);
                }
                result?
            }
            ModelUpdate::Select(selection) => self.select(*selection)?,
            ModelUpdate::Keep => return Ok(()),
        };
        surface.apply_selection(selection.generation, selection.selection.directed());
        Ok(())
    }

    fn current(&self) -> Result<&Rendering, MapError> {
        self.rendering.as_ref().ok_or(MapError::NoRendering)
    }

    /// The current rendering, and whether `generation` is stale but the
    /// policy lets the event through clamped.
    fn checked(&self, generation: Generation) -> Result<(&Rendering, bool), MapError> {
        let rendering = self.current()?;
        let Err(err) = rendering.catalog.ensure_generation(generation) else {
            return Ok((rendering, false));
        };
        match self.config.mapping.stale_catalog {
            StalePolicy::Panic => panic!("host event from a stale buffer: {err}"),
            StalePolicy::Reject => Err(err),
            StalePolicy::Clamp => {
                tracing::warn!(
                    target: "composer::session",
                    current = %rendering.generation,
                    found = %generation,
                    "stale host event, clamping into the current buffer"
                );
                Ok((rendering, true))
            }
        }
    }
}

impl Default for BridgeSession {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}
