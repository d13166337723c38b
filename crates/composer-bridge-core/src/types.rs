//! Offsets, selections and generations.
//!
//! Two offset spaces exist side by side: the model's canonical space and the
//! host's buffer space. Both count UTF-16 code units but are never
//! interchangeable, so each gets its own newtype.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{InvalidOffset, Space};

/// UTF-16 code-unit offset into the model's canonical text.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CanonicalOffset(pub usize);

/// UTF-16 code-unit offset into a host's rendered buffer.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BufferOffset(pub usize);

impl CanonicalOffset {
    pub const ZERO: Self = Self(0);

    pub fn get(self) -> usize {
        self.0
    }
}

impl BufferOffset {
    pub const ZERO: Self = Self(0);

    pub fn get(self) -> usize {
        self.0
    }
}

impl From<usize> for CanonicalOffset {
    fn from(offset: usize) -> Self {
        Self(offset)
    }
}

impl From<usize> for BufferOffset {
    fn from(offset: usize) -> Self {
        Self(offset)
    }
}

/// Host bindings deliver signed integers; negative values are rejected here.
impl TryFrom<i64> for CanonicalOffset {
    type Error = InvalidOffset;

    fn try_from(offset: i64) -> Result<Self, Self::Error> {
        usize::try_from(offset)
            .map(Self)
            .map_err(|_| InvalidOffset::Negative {
                space: Space::Canonical,
                offset,
            })
    }
}

impl TryFrom<i64> for BufferOffset {
    type Error = InvalidOffset;

    fn try_from(offset: i64) -> Result<Self, Self::Error> {
        usize::try_from(offset)
            .map(Self)
            .map_err(|_| InvalidOffset::Negative {
                space: Space::Buffer,
                offset,
            })
    }
}

impl fmt::Display for CanonicalOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BufferOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one buffer generation.
///
/// Every replace-all update produces a new generation. Offsets and catalogs
/// from different generations must never meet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(u64);

impl Generation {
    pub const INITIAL: Self = Self(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A `(start, end)` pair in either offset space.
///
/// Hosts report selections in whatever direction the user dragged, so
/// `start > end` is allowed. Use `normalized()` for ordered bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct OffsetPair<O> {
    pub start: O,
    pub end: O,
}

impl<O: Copy + Ord> OffsetPair<O> {
    pub fn new(start: O, end: O) -> Self {
        Self { start, end }
    }

    /// A caret: both ends at `offset`.
    pub fn collapsed(offset: O) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// True when the pair was reported end-first.
    pub fn is_backwards(&self) -> bool {
        self.end < self.start
    }

    /// The lower bound.
    pub fn lo(&self) -> O {
        self.start.min(self.end)
    }

    /// The upper bound.
    pub fn hi(&self) -> O {
        self.start.max(self.end)
    }

    /// Same bounds, ordered so that `start <= end`.
    pub fn normalized(&self) -> Self {
        Self {
            start: self.lo(),
            end: self.hi(),
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
        }
    }

    pub fn map<P>(self, mut f: impl FnMut(O) -> P) -> OffsetPair<P> {
        OffsetPair {
            start: f(self.start),
            end: f(self.end),
        }
    }
}

impl<O: fmt::Display> fmt::Display for OffsetPair<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.start, self.end)
    }
}

/// Which side of a decoration a canonical offset lands on.
///
/// A canonical offset sitting exactly where a decoration begins has two
/// buffer positions: before the synthetic run or after it. `Before` keeps
/// decorations from being selected into implicitly; `After` suits hosts that
/// want the caret past a list marker.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Affinity {
    #[default]
    Before,
    After,
}
