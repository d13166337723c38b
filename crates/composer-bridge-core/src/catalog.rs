//! The decoration catalog: where the synthetic runs of one buffer generation
//! sit.
//!
//! Spans are kept sorted and non-overlapping, alongside two prefix tables so
//! both mapping directions are a binary search:
//! - `decorated_before[i]`: total decoration length of `spans[..i]`
//! - `canonical_starts[i]`: canonical offset at which `spans[i]` begins

use std::ops::Range;

use serde::Serialize;

use crate::error::{CatalogError, MapError};
use crate::types::{BufferOffset, Generation};
use crate::utf16::Utf16Text;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorationKind {
    /// `1. ` or `• ` at the head of a list item.
    ListMarker,
    /// Zero-width break between list items.
    ZeroWidthBreak,
    /// Stand-in character for an otherwise-empty block.
    EmptyParagraphPlaceholder,
}

/// A run of buffer code units with no canonical counterpart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DecorationSpan {
    pub start: BufferOffset,
    pub length: usize,
    pub kind: DecorationKind,
}

impl DecorationSpan {
    pub fn end(&self) -> BufferOffset {
        BufferOffset(self.start.0 + self.length)
    }

    pub fn range(&self) -> Range<usize> {
        self.start.0..self.end().0
    }
}

/// Immutable catalog for one buffer generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecorationCatalog {
    generation: Generation,
    spans: Vec<DecorationSpan>,
    decorated_before: Vec<usize>,
    canonical_starts: Vec<usize>,
    buffer_len: usize,
    /// Buffer offsets between the halves of a surrogate pair, ascending.
    split_points: Vec<usize>,
}

impl DecorationCatalog {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn spans(&self) -> &[DecorationSpan] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecorationSpan> {
        self.spans.iter()
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    pub fn canonical_len(&self) -> usize {
        self.buffer_len - self.total_decorated()
    }

    /// Code units taken up by decorations across the whole buffer.
    pub fn total_decorated(&self) -> usize {
        self.decorated_before.last().copied().unwrap_or(0)
    }

    /// The span `offset` falls strictly inside of, if any. Offsets on either
    /// edge of a span are outside it.
    pub fn span_containing(&self, offset: BufferOffset) -> Option<&DecorationSpan> {
        let idx = self.spans.partition_point(|span| span.start < offset);
        let span = self.spans.get(idx.checked_sub(1)?)?;
        (offset < span.end()).then_some(span)
    }

    /// Spans overlapping the buffer range `range`.
    pub fn spans_in(&self, range: Range<BufferOffset>) -> &[DecorationSpan] {
        let lo = self.spans.partition_point(|span| span.end() <= range.start);
        let hi = self.spans.partition_point(|span| span.start < range.end);
        &self.spans[lo..hi.max(lo)]
    }

    /// Total length of every span starting before `offset`.
    pub fn decoration_len_before(&self, offset: BufferOffset) -> usize {
        let idx = self.spans.partition_point(|span| span.start < offset);
        self.decorated_before[idx]
    }

    /// Whether `offset` is inside the buffer and not mid surrogate pair.
    pub fn is_char_boundary(&self, offset: BufferOffset) -> bool {
        offset.0 <= self.buffer_len && self.split_points.binary_search(&offset.0).is_err()
    }

    /// Fails with `StaleCatalog` unless this catalog belongs to `generation`.
    pub fn ensure_generation(&self, generation: Generation) -> Result<(), MapError> {
        if self.generation == generation {
            Ok(())
        } else {
            Err(MapError::StaleCatalog {
                current: self.generation,
                found: generation,
            })
        }
    }

    pub(crate) fn decorated_before(&self) -> &[usize] {
        &self.decorated_before
    }

    pub(crate) fn canonical_starts(&self) -> &[usize] {
        &self.canonical_starts
    }
}

/// Collects spans in buffer order.
#[derive(Debug)]
pub struct CatalogBuilder {
    generation: Generation,
    spans: Vec<DecorationSpan>,
}

impl CatalogBuilder {
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            spans: Vec::new(),
        }
    }

    /// Append a span. It must be non-empty and start at or after the end of
    /// the previous one.
    pub fn push(&mut self, span: DecorationSpan) -> Result<&mut Self, CatalogError> {
        if span.length == 0 {
            return Err(CatalogError::EmptySpan {
                start: span.start.0,
            });
        }
        if let Some(prev) = self.spans.last() {
            if span.start < prev.end() {
                return Err(CatalogError::OutOfOrder {
                    start: span.start.0,
                    previous_end: prev.end().0,
                });
            }
        }
        self.spans.push(span);
        Ok(self)
    }

    /// Finish against the buffer the spans describe.
    pub fn build(self, buffer: &Utf16Text) -> Result<DecorationCatalog, CatalogError> {
        if let Some(last) = self.spans.last() {
            if last.end().0 > buffer.len() {
                return Err(CatalogError::PastEnd {
                    end: last.end().0,
                    len: buffer.len(),
                });
            }
        }
        Ok(self.finish(buffer))
    }

    /// Spans produced by flattening are ordered by construction.
    pub(crate) fn push_unchecked(&mut self, span: DecorationSpan) {
        debug_assert!(span.length > 0);
        debug_assert!(self.spans.last().is_none_or(|prev| prev.end() <= span.start));
        self.spans.push(span);
    }

    pub(crate) fn finish(self, buffer: &Utf16Text) -> DecorationCatalog {
        let mut decorated_before = Vec::with_capacity(self.spans.len() + 1);
        let mut canonical_starts = Vec::with_capacity(self.spans.len());
        let mut total = 0;
        decorated_before.push(0);
        for span in &self.spans {
            canonical_starts.push(span.start.0 - total);
            total += span.length;
            decorated_before.push(total);
        }
        DecorationCatalog {
            generation: self.generation,
            spans: self.spans,
            decorated_before,
            canonical_starts,
            buffer_len: buffer.len(),
            split_points: buffer.split_points(),
        }
    }
}
