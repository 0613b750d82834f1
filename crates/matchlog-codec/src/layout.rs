//! Fixed-layout records ("structs").
//!
//! A struct has no field-presence descriptor: every field sits at a fixed
//! byte offset, padding included, and the whole record has a fixed size
//! and alignment. Structs are cheap to read but cannot evolve, so they are
//! reserved for small records whose shape is settled (per-turn action
//! payloads, for example).

use crate::DecodeError;

/// A record with a fixed byte layout.
///
/// Implementations write every field with [`put_field`](crate::put_field)
/// at its declared offset and read it back with
/// [`take_field`](crate::take_field). Padding bytes are left zero.
pub trait FixedLayout: Sized {
    /// Total size in bytes, trailing padding included.
    const SIZE: usize;

    /// Required alignment of the record's first byte.
    const ALIGN: usize;

    /// Encode into exactly [`Self::SIZE`] zeroed bytes.
    ///
    /// Returns `None` if `out` is too short for one of the fields.
    fn write_to(&self, out: &mut [u8]) -> Option<()>;

    /// Decode from exactly [`Self::SIZE`] bytes.
    ///
    /// Returns `None` if `bytes` is too short for one of the fields.
    fn read_from(bytes: &[u8]) -> Option<Self>;

    /// Decode the record starting at absolute position `loc` of `buf`.
    fn read_at(buf: &[u8], loc: usize) -> Result<Self, DecodeError> {
        let end = loc
            .checked_add(Self::SIZE)
            .ok_or(DecodeError::OffsetOverflow { loc })?;
        buf.get(loc..end)
            .and_then(Self::read_from)
            .ok_or(DecodeError::OutOfBounds {
                loc,
                len: Self::SIZE,
                buffer_len: buf.len(),
            })
    }
}
