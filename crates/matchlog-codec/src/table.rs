//! Reading tables through their field-presence descriptor (vtable).
//!
//! A table instance starts with a signed 32-bit offset to its vtable:
//!
//! ```text
//! vtable:  [vtable_len: u16][table_len: u16][slot 0: u16][slot 1: u16]...
//! table:   [soffset: i32][inline fields ...]
//!          vtable position = table position - soffset
//! ```
//!
//! Slot `i` lives at byte `4 + 2 * i` of the vtable and holds the byte
//! offset of the field from the table start, or 0 when the field is
//! absent. A vtable written by an older schema is simply shorter: slots
//! past its end read as absent, which is what lets old buffers open with
//! new readers and vice versa.
//!
//! [`Table::init`] validates the vtable header once and nothing more. Every
//! accessor then checks its own reads, so a corrupt field fails only that
//! accessor and a buffer cut short inside a table still yields the fields
//! that lie before the cut.

use std::borrow::Cow;

use crate::DecodeError;
use crate::follow::{Follow, ForwardsUOffset, Inline, LossyStr, resolve_uoffset};
use crate::scalar::{Scalar, read_scalar};
use crate::vector::Vector;

/// Byte position of slot `slot` inside a vtable.
fn slot_voffset(slot: u16) -> usize {
    usize::from(slot).saturating_mul(2).saturating_add(4)
}

/// Width of a reference field.
const UOFFSET_SIZE: usize = 4;

/// A borrowed view of one table instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table<'buf> {
    buf: &'buf [u8],
    /// Absolute position of the table (its soffset).
    loc: usize,
    /// Absolute position of its vtable.
    vtable: usize,
    /// Byte length of the vtable.
    vtable_len: u16,
    /// Inline byte length of the table.
    table_len: u16,
}

impl<'buf> Table<'buf> {
    /// Open the table at absolute position `loc` and validate its vtable
    /// header.
    pub fn init(buf: &'buf [u8], loc: usize) -> Result<Self, DecodeError> {
        let soffset = read_scalar::<i32>(buf, loc)?;
        let vtable_signed = isize::try_from(loc)
            .ok()
            .zip(isize::try_from(soffset).ok())
            .and_then(|(l, s)| l.checked_sub(s))
            .ok_or(DecodeError::OffsetOverflow { loc })?;
        let vtable = usize::try_from(vtable_signed)
            .ok()
            .ok_or(DecodeError::ImplausibleVtable {
                table: loc,
                vtable: vtable_signed,
                reason: "vtable position is negative",
            })?;

        let vtable_len = read_scalar::<u16>(buf, vtable)?;
        let table_len = read_scalar::<u16>(buf, vtable.saturating_add(2))?;

        if vtable_len < 4 || vtable_len & 1 != 0 {
            return Err(DecodeError::ImplausibleVtable {
                table: loc,
                vtable: vtable_signed,
                reason: "vtable length must be even and at least 4",
            });
        }
        if table_len < 4 {
            return Err(DecodeError::ImplausibleVtable {
                table: loc,
                vtable: vtable_signed,
                reason: "table length is shorter than its soffset",
            });
        }

        Ok(Self {
            buf,
            loc,
            vtable,
            vtable_len,
            table_len,
        })
    }

    /// Absolute position of the table.
    pub const fn loc(&self) -> usize {
        self.loc
    }

    /// The buffer this table borrows from.
    pub const fn buf(&self) -> &'buf [u8] {
        self.buf
    }

    /// Number of slots the vtable describes.
    pub const fn slot_count(&self) -> u16 {
        self.vtable_len.saturating_sub(4) / 2
    }

    /// Offset of the field in `slot` from the table start, or 0 if the
    /// field is absent or the vtable predates the slot.
    pub fn offset_of(&self, slot: u16) -> Result<u16, DecodeError> {
        let voffset = slot_voffset(slot);
        if voffset >= usize::from(self.vtable_len) {
            return Ok(0);
        }
        let field_offset = read_scalar::<u16>(self.buf, self.vtable.saturating_add(voffset))?;
        if field_offset != 0 && (field_offset < 4 || field_offset >= self.table_len) {
            return Err(DecodeError::FieldOutsideTable {
                slot,
                field_offset,
                table_len: self.table_len,
            });
        }
        Ok(field_offset)
    }

    /// Whether the field in `slot` was written.
    pub fn is_present(&self, slot: u16) -> Result<bool, DecodeError> {
        Ok(self.offset_of(slot)? != 0)
    }

    /// Absolute position of the `width`-byte field in `slot`, if present.
    ///
    /// The field must end inside the table's declared inline length.
    fn field_loc(&self, slot: u16, width: usize) -> Result<Option<usize>, DecodeError> {
        let field_offset = match self.offset_of(slot)? {
            0 => return Ok(None),
            off => off,
        };
        if usize::from(field_offset).saturating_add(width) > usize::from(self.table_len) {
            return Err(DecodeError::FieldOutsideTable {
                slot,
                field_offset,
                table_len: self.table_len,
            });
        }
        self.loc
            .checked_add(usize::from(field_offset))
            .map(Some)
            .ok_or(DecodeError::OffsetOverflow { loc: self.loc })
    }

    /// Read an inline scalar, substituting `default` when it is absent.
    pub fn get<T: Scalar>(&self, slot: u16, default: T) -> Result<T, DecodeError> {
        Ok(self.get_optional(slot)?.unwrap_or(default))
    }

    /// Read an inline scalar, or `None` when it is absent.
    pub fn get_optional<T: Scalar>(&self, slot: u16) -> Result<Option<T>, DecodeError> {
        self.field_loc(slot, T::SIZE)?
            .map(|loc| read_scalar::<T>(self.buf, loc))
            .transpose()
    }

    /// Follow the reference field in `slot`, or `None` when it is absent.
    ///
    /// Resolution is a two-step chase: the 4-byte offset stored in the
    /// field, then the target itself. Both reads are bounds-checked.
    pub fn get_ref<T: Follow<'buf>>(&self, slot: u16) -> Result<Option<T::Inner>, DecodeError> {
        self.field_loc(slot, UOFFSET_SIZE)?
            .map(|loc| ForwardsUOffset::<T>::follow(self.buf, loc))
            .transpose()
    }

    /// Read a UTF-8 string field. Invalid UTF-8 is an error.
    pub fn get_str(&self, slot: u16) -> Result<Option<&'buf str>, DecodeError> {
        self.get_ref::<&'buf str>(slot)
    }

    /// Read a string field, replacing invalid UTF-8 sequences.
    pub fn get_str_lossy(&self, slot: u16) -> Result<Option<Cow<'buf, str>>, DecodeError> {
        self.get_ref::<LossyStr>(slot)
    }

    /// Read a nested table field.
    pub fn get_table(&self, slot: u16) -> Result<Option<Self>, DecodeError> {
        self.get_ref::<Self>(slot)
    }

    /// Read a vector field.
    pub fn get_vector<T: Inline<'buf>>(
        &self,
        slot: u16,
    ) -> Result<Option<Vector<'buf, T>>, DecodeError> {
        self.get_ref::<Vector<'buf, T>>(slot)
    }
}

impl<'buf> Follow<'buf> for Table<'buf> {
    type Inner = Self;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        Self::init(buf, loc)
    }
}

// ---------------------------------------------------------------------------
// Root access
// ---------------------------------------------------------------------------

/// Open the root table named by the buffer's leading 4-byte offset.
pub fn root_table(buf: &[u8]) -> Result<Table<'_>, DecodeError> {
    let loc = resolve_uoffset(buf, 0)?;
    Table::init(buf, loc)
}

/// The 4-byte file identifier that follows the root offset.
pub fn buffer_identifier(buf: &[u8]) -> Result<[u8; 4], DecodeError> {
    buf.get(4..8)
        .and_then(|b| <[u8; 4]>::try_from(b).ok())
        .ok_or(DecodeError::OutOfBounds {
            loc: 4,
            len: 4,
            buffer_len: buf.len(),
        })
}

/// Whether the buffer carries `ident` as its file identifier.
pub fn buffer_has_identifier(buf: &[u8], ident: [u8; 4]) -> bool {
    buffer_identifier(buf).is_ok_and(|found| found == ident)
}

/// Open the root table after checking the file identifier.
pub fn root_table_with_identifier(buf: &[u8], ident: [u8; 4]) -> Result<Table<'_>, DecodeError> {
    let found = buffer_identifier(buf)?;
    if found != ident {
        return Err(DecodeError::IdentifierMismatch {
            expected: ident,
            found,
        });
    }
    root_table(buf)
}

/// Open the root table of a size-prefixed buffer.
///
/// The leading `u32` gives the byte length of everything after it; the
/// returned table borrows only that region, so positions inside it are
/// relative to the byte after the prefix.
pub fn size_prefixed_root_table(buf: &[u8]) -> Result<Table<'_>, DecodeError> {
    let declared = read_scalar::<u32>(buf, 0)?;
    let declared = usize::try_from(declared)
        .ok()
        .ok_or(DecodeError::OffsetOverflow { loc: 0 })?;
    let rest = buf.get(4..).unwrap_or_default();
    let inner = rest.get(..declared).ok_or(DecodeError::SizePrefixMismatch {
        declared,
        available: rest.len(),
    })?;
    root_table(inner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Hand-assembled buffer:
    ///
    /// ```text
    /// 0:  root uoffset = 12
    /// 4:  vtable [len 8][table_len 8][slot0 @4][slot1 absent]
    /// 12: table soffset = 8 (vtable at 4)
    /// 16: slot0 i32 = -7
    /// ```
    fn tiny_table() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend(12u32.to_le_bytes());
        buf.extend(8u16.to_le_bytes());
        buf.extend(8u16.to_le_bytes());
        buf.extend(4u16.to_le_bytes());
        buf.extend(0u16.to_le_bytes());
        buf.extend(8i32.to_le_bytes());
        buf.extend((-7i32).to_le_bytes());
        buf
    }

    #[test]
    fn reads_present_and_absent_fields() {
        let buf = tiny_table();
        let table = root_table(&buf).unwrap();
        assert_eq!(table.loc(), 12);
        assert_eq!(table.slot_count(), 2);
        assert_eq!(table.offset_of(0).ok(), Some(4));
        assert_eq!(table.get::<i32>(0, 0).ok(), Some(-7));
        assert_eq!(table.offset_of(1).ok(), Some(0));
        assert_eq!(table.get::<i32>(1, 99).ok(), Some(99));
        assert_eq!(table.get_optional::<i32>(1).ok(), Some(None));
    }

    #[test]
    fn slots_beyond_a_short_vtable_are_absent() {
        let buf = tiny_table();
        let table = root_table(&buf).unwrap();
        assert_eq!(table.offset_of(40).ok(), Some(0));
        assert_eq!(table.get::<u8>(40, 3).ok(), Some(3));
        assert_eq!(table.get_str(40).ok(), Some(None));
        assert!(table.get_vector::<u16>(40).unwrap().is_none());
    }

    #[test]
    fn repeated_reads_are_identical() {
        let buf = tiny_table();
        let table = root_table(&buf).unwrap();
        let first = table.get::<i32>(0, 0);
        let second = table.get::<i32>(0, 0);
        assert_eq!(first, second);
    }

    #[test]
    fn odd_vtable_length_is_implausible() {
        let mut buf = tiny_table();
        buf.splice(4..6, 7u16.to_le_bytes());
        assert!(matches!(
            root_table(&buf),
            Err(DecodeError::ImplausibleVtable { .. })
        ));
    }

    #[test]
    fn negative_vtable_position_is_implausible() {
        let mut buf = tiny_table();
        buf.splice(12..16, 100i32.to_le_bytes());
        assert!(matches!(
            root_table(&buf),
            Err(DecodeError::ImplausibleVtable { .. })
        ));
    }

    #[test]
    fn field_offset_outside_table() {
        let mut buf = tiny_table();
        buf.splice(8..10, 6u16.to_le_bytes());
        let table = root_table(&buf).unwrap();
        assert_eq!(
            table.get::<i32>(0, 0).err(),
            Some(DecodeError::FieldOutsideTable {
                slot: 0,
                field_offset: 6,
                table_len: 8
            })
        );
    }

    #[test]
    fn truncated_field_fails_at_access() {
        let mut buf = tiny_table();
        buf.truncate(18);
        let table = root_table(&buf).unwrap();
        assert_eq!(table.get_optional::<i32>(1).ok(), Some(None));
        assert!(matches!(
            table.get::<i32>(0, 0),
            Err(DecodeError::OutOfBounds { loc: 16, .. })
        ));
    }

    #[test]
    fn fields_before_a_cut_still_read() {
        let mut b = crate::Builder::new();
        b.start_table(2).unwrap();
        b.add_scalar::<i32>(0, 111, 0).unwrap();
        b.add_scalar::<i32>(1, 222, 0).unwrap();
        let root = b.end_table().unwrap();
        let full = b.finish(root).unwrap().to_vec();

        // Slot 0 was written first, so it sits at the very end.
        let cut = full.get(..full.len().saturating_sub(4)).unwrap();
        let table = root_table(cut).unwrap();
        assert_eq!(table.get::<i32>(1, 0).ok(), Some(222));
        assert!(matches!(
            table.get::<i32>(0, 0),
            Err(DecodeError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn wide_read_at_the_table_edge_is_outside() {
        let buf = tiny_table();
        let table = root_table(&buf).unwrap();
        assert_eq!(
            table.get::<i64>(0, 0).err(),
            Some(DecodeError::FieldOutsideTable {
                slot: 0,
                field_offset: 4,
                table_len: 8
            })
        );
    }

    #[test]
    fn identifier_helpers() {
        let buf = [8, 0, 0, 0, b'M', b'L', b'O', b'G'];
        assert!(buffer_has_identifier(&buf, *b"MLOG"));
        assert!(!buffer_has_identifier(&buf, *b"NOPE"));
        assert!(!buffer_has_identifier(buf.get(..6).unwrap(), *b"MLOG"));
        assert!(matches!(
            root_table_with_identifier(&buf, *b"NOPE"),
            Err(DecodeError::IdentifierMismatch { .. })
        ));
    }

    #[test]
    fn size_prefix_larger_than_buffer() {
        let buf = [50, 0, 0, 0, 4, 0, 0, 0];
        assert_eq!(
            size_prefixed_root_table(&buf).err(),
            Some(DecodeError::SizePrefixMismatch {
                declared: 50,
                available: 4
            })
        );
    }
}
