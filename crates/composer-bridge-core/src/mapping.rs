//! Forward (model to buffer) and inverse (buffer to model) offset mapping.
//!
//! Both directions are pure functions of an offset and a catalog. Decorations
//! have no canonical width, so the inverse direction collapses every buffer
//! position inside or at the end of a decoration onto the canonical position
//! where the decoration starts.

use crate::catalog::DecorationCatalog;
use crate::error::{InvalidOffset, Space};
use crate::types::{Affinity, BufferOffset, CanonicalOffset};

/// Buffer offset for a canonical offset, landing before any decoration that
/// starts at the same place.
pub fn to_buffer(
    offset: CanonicalOffset,
    catalog: &DecorationCatalog,
) -> Result<BufferOffset, InvalidOffset> {
    to_buffer_with_affinity(offset, catalog, Affinity::Before)
}

/// Buffer offset for a canonical offset.
///
/// When decorations start exactly at `offset`, `Affinity::Before` returns the
/// position before the first of them and `Affinity::After` the position after
/// the last contiguous one.
pub fn to_buffer_with_affinity(
    offset: CanonicalOffset,
    catalog: &DecorationCatalog,
    affinity: Affinity,
) -> Result<BufferOffset, InvalidOffset> {
    let canonical_len = catalog.canonical_len();
    if offset.0 > canonical_len {
        return Err(InvalidOffset::OutOfRange {
            space: Space::Canonical,
            offset: offset.0,
            len: canonical_len,
        });
    }

    let starts = catalog.canonical_starts();
    let passed = match affinity {
        Affinity::Before => starts.partition_point(|&start| start < offset.0),
        Affinity::After => starts.partition_point(|&start| start <= offset.0),
    };
    let buffer = BufferOffset(offset.0 + catalog.decorated_before()[passed]);

    if !catalog.is_char_boundary(buffer) {
        return Err(InvalidOffset::SplitsSurrogatePair {
            space: Space::Canonical,
            offset: offset.0,
        });
    }
    tracing::trace!(target: "composer::mapping", canonical = offset.0, buffer = buffer.0, ?affinity, "to buffer");
    Ok(buffer)
}

/// Canonical offset for a buffer offset.
///
/// Offsets strictly inside a decoration are moved to its start first. Every
/// decoration starting before the (moved) offset is then subtracted whole.
pub fn to_canonical(
    offset: BufferOffset,
    catalog: &DecorationCatalog,
) -> Result<CanonicalOffset, InvalidOffset> {
    let buffer_len = catalog.buffer_len();
    if offset.0 > buffer_len {
        return Err(InvalidOffset::OutOfRange {
            space: Space::Buffer,
            offset: offset.0,
            len: buffer_len,
        });
    }

    let effective = match catalog.span_containing(offset) {
        Some(span) => span.start,
        None if catalog.is_char_boundary(offset) => offset,
        None => {
            return Err(InvalidOffset::SplitsSurrogatePair {
                space: Space::Buffer,
                offset: offset.0,
            });
        }
    };
    let canonical =
        CanonicalOffset(effective.0.saturating_sub(catalog.decoration_len_before(effective)));
    tracing::trace!(target: "composer::mapping", buffer = offset.0, canonical = canonical.0, "to canonical");
    Ok(canonical)
}

/// Pull a buffer offset into range and off any surrogate split. Used when an
/// event from a stale generation is translated on a best-effort basis.
pub fn clamp_to_buffer(offset: BufferOffset, catalog: &DecorationCatalog) -> BufferOffset {
    let mut offset = BufferOffset(offset.0.min(catalog.buffer_len()));
    while !catalog.is_char_boundary(offset) {
        offset.0 -= 1;
    }
    offset
}
