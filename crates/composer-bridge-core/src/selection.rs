//! Selection translation: both endpoints of a pair through the same mapper.

use crate::catalog::DecorationCatalog;
use crate::error::InvalidOffset;
use crate::mapping;
use crate::types::{Affinity, BufferOffset, CanonicalOffset, OffsetPair};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    ModelToBuffer,
    BufferToModel,
}

/// An offset that can be carried into the other space. The direction follows
/// from the input type.
pub trait Translate: Copy + Ord {
    type Output: Copy + Ord;

    const DIRECTION: Direction;

    fn translate(
        self,
        catalog: &DecorationCatalog,
        affinity: Affinity,
    ) -> Result<Self::Output, InvalidOffset>;
}

impl Translate for CanonicalOffset {
    type Output = BufferOffset;

    const DIRECTION: Direction = Direction::ModelToBuffer;

    fn translate(
        self,
        catalog: &DecorationCatalog,
        affinity: Affinity,
    ) -> Result<BufferOffset, InvalidOffset> {
        mapping::to_buffer_with_affinity(self, catalog, affinity)
    }
}

impl Translate for BufferOffset {
    type Output = CanonicalOffset;

    const DIRECTION: Direction = Direction::BufferToModel;

    /// Affinity has no meaning in this direction.
    fn translate(
        self,
        catalog: &DecorationCatalog,
        _affinity: Affinity,
    ) -> Result<CanonicalOffset, InvalidOffset> {
        mapping::to_canonical(self, catalog)
    }
}

/// A translated selection, ordered, remembering which way it was reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranslatedPair<O> {
    pair: OffsetPair<O>,
    backwards: bool,
    direction: Direction,
}

impl<O: Copy + Ord> TranslatedPair<O> {
    /// Wrap a pair whose ends were already mapped one at a time.
    pub(crate) fn from_mapped(pair: OffsetPair<O>, direction: Direction) -> Self {
        Self {
            pair: pair.normalized(),
            backwards: pair.is_backwards(),
            direction,
        }
    }

    /// Bounds with `start <= end`.
    pub fn normalized(&self) -> OffsetPair<O> {
        self.pair
    }

    /// Bounds in the orientation the input had, for echoing back to a host.
    pub fn directed(&self) -> OffsetPair<O> {
        if self.backwards {
            self.pair.reversed()
        } else {
            self.pair
        }
    }

    pub fn is_backwards(&self) -> bool {
        self.backwards
    }

    pub fn is_collapsed(&self) -> bool {
        self.pair.is_collapsed()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// Translate both ends of `pair` with the default caret affinity.
pub fn translate<I: Translate>(
    pair: OffsetPair<I>,
    catalog: &DecorationCatalog,
) -> Result<TranslatedPair<I::Output>, InvalidOffset> {
    translate_with_affinity(pair, catalog, Affinity::default())
}

pub fn translate_with_affinity<I: Translate>(
    pair: OffsetPair<I>,
    catalog: &DecorationCatalog,
    affinity: Affinity,
) -> Result<TranslatedPair<I::Output>, InvalidOffset> {
    let ordered = pair.normalized();
    let start = ordered.start.translate(catalog, affinity)?;
    let end = if ordered.is_collapsed() {
        start
    } else {
        ordered.end.translate(catalog, affinity)?
    };
    let mapped = OffsetPair::new(start, end);
    Ok(TranslatedPair::from_mapped(
        if pair.is_backwards() { mapped.reversed() } else { mapped },
        I::DIRECTION,
    ))
}
