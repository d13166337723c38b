//! The seam between the bridge and a host text view.
//!
//! A host adapter (managed text view, native text view, editable DOM element)
//! implements [`HostSurface`] so the session can push buffers and selections
//! into it. Events flow the other way as plain values: the adapter builds a
//! `HostEvent` from whatever its UI reports and hands it to the session.

use crate::builder::Rendering;
use crate::types::{BufferOffset, Generation, OffsetPair};
use crate::utf16::Utf16Text;

/// Something that displays a rendered buffer and a selection in it.
pub trait HostSurface {
    /// Replace the whole buffer with a new generation.
    ///
    /// Flat hosts take `rendering.buffer`; tree hosts take `rendering.tree`.
    /// Either way the catalog of any earlier generation is dead after this.
    fn install_buffer(&mut self, rendering: &Rendering);

    /// Move the host selection. `selection` keeps the orientation the model
    /// asked for, so `start > end` is possible.
    fn apply_selection(&mut self, generation: Generation, selection: OffsetPair<BufferOffset>);
}

/// An in-memory flat host with no UI attached.
///
/// Tests and the command-line tool drive a session against it the way a real
/// text view would be driven.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeadlessSurface {
    generation: Option<Generation>,
    text: Utf16Text,
    selection: Option<OffsetPair<BufferOffset>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the installed buffer, if any.
    pub fn generation(&self) -> Option<Generation> {
        self.generation
    }

    pub fn text(&self) -> &Utf16Text {
        &self.text
    }

    pub fn selection(&self) -> Option<OffsetPair<BufferOffset>> {
        self.selection
    }

    /// Move the selection the way a user would. Offsets are not checked.
    pub fn select(&mut self, selection: OffsetPair<BufferOffset>) {
        self.selection = Some(selection);
    }
}

impl HostSurface for HeadlessSurface {
    fn install_buffer(&mut self, rendering: &Rendering) {
        self.generation = Some(rendering.generation);
        self.text = rendering.buffer.clone();
        self.selection = None;
    }

    fn apply_selection(&mut self, generation: Generation, selection: OffsetPair<BufferOffset>) {
        if self.generation != Some(generation) {
            tracing::debug!(
                target: "composer::platform",
                %generation,
                "selection for a buffer this surface does not hold"
            );
            return;
        }
        self.selection = Some(selection);
    }
}
