//! Back-to-front construction of finished buffers.
//!
//! The [`Builder`] writes children before parents: strings, vectors,
//! structs and nested tables are created first, and the [`Offset`]s they
//! return are then stored into the table that references them. Because
//! the buffer grows toward its front, every offset is measured from the
//! tail and stays valid across reallocation.
//!
//! Construction is a small state machine:
//!
//! ```text
//!            start_table                       end_table
//!   Idle ─────────────────► TableOpen ──add_*──────────► Idle
//!            start_vector                      end_vector
//!   Idle ─────────────────► VectorOpen ─push_*─────────► Idle
//!            finish*
//!   Idle ─────────────────► Finished
//! ```
//!
//! Only one object may be open at a time. Any call made in the wrong state
//! returns a [`BuildError`] instead of producing a corrupt buffer.
//!
//! Tables are described by a vtable written immediately before them. With
//! deduplication on, a table whose vtable is byte-identical to one already
//! written shares it instead, and its soffset is negative.

use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::BuildError;
use crate::buffer::ByteBuffer;
use crate::config::BuilderConfig;
use crate::layout::FixedLayout;
use crate::scalar::Scalar;

// ---------------------------------------------------------------------------
// Offsets
// ---------------------------------------------------------------------------

/// Position of a written object, measured from the buffer tail.
///
/// The type parameter records what kind of object it refers to so that a
/// string offset cannot be stored where a table is expected.
pub struct Offset<T> {
    value: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Offset<T> {
    /// Wrap a raw tail position.
    pub const fn new(value: u32) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// The raw tail position.
    pub const fn value(self) -> u32 {
        self.value
    }
}

impl<T> Clone for Offset<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Offset<T> {}

impl<T> PartialEq for Offset<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Offset<T> {}

impl<T> core::fmt::Debug for Offset<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Offset").field(&self.value).finish()
    }
}

/// Marker for offsets to tables.
#[derive(Debug)]
pub enum TableMark {}

/// Marker for offsets to strings.
#[derive(Debug)]
pub enum StringMark {}

/// Marker for offsets to vectors.
#[derive(Debug)]
pub enum VectorMark {}

// ---------------------------------------------------------------------------
// Builder state
// ---------------------------------------------------------------------------

/// A field written into the currently open table.
#[derive(Debug, Clone, Copy)]
struct FieldLoc {
    /// Tail position of the field.
    offset: u32,
    slot: u16,
}

#[derive(Debug, Clone, Copy)]
struct OpenTable {
    /// Tail position when the table was started.
    start: u32,
    field_count: u16,
}

#[derive(Debug, Clone, Copy)]
struct OpenVector {
    elem_size: usize,
    declared: usize,
    pushed: usize,
}

/// Incremental writer producing one finished buffer.
///
/// A builder is single-threaded. After [`finish`](Self::finish) the bytes
/// are immutable and may be shared freely; call [`reset`](Self::reset) to
/// build another buffer with the same allocation.
#[derive(Debug, Clone)]
pub struct Builder {
    buf: ByteBuffer,
    fields: Vec<FieldLoc>,
    table: Option<OpenTable>,
    vector: Option<OpenVector>,
    /// Tail positions of vtables written so far, for deduplication.
    vtables: Vec<u32>,
    min_align: usize,
    force_defaults: bool,
    dedup_vtables: bool,
    finished: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self::with_config(&BuilderConfig::default())
    }
}

impl Builder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(&BuilderConfig {
            initial_capacity: capacity,
            ..BuilderConfig::default()
        })
    }

    /// Create a builder from explicit configuration.
    pub fn with_config(config: &BuilderConfig) -> Self {
        let mut buf = ByteBuffer::with_capacity(config.initial_capacity);
        buf.set_max_size(config.max_buffer_size);
        Self {
            buf,
            fields: Vec::new(),
            table: None,
            vector: None,
            vtables: Vec::new(),
            min_align: 1,
            force_defaults: config.force_defaults,
            dedup_vtables: config.dedup_vtables,
            finished: false,
        }
    }

    /// Write scalar fields even when they equal their default.
    pub const fn force_defaults(&mut self, force: bool) {
        self.force_defaults = force;
    }

    /// Discard everything written and start a fresh buffer.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.fields.clear();
        self.table = None;
        self.vector = None;
        self.vtables.clear();
        self.min_align = 1;
        self.finished = false;
    }

    /// Number of bytes written so far.
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    // -----------------------------------------------------------------------
    // Low-level writes
    // -----------------------------------------------------------------------

    /// Current tail position.
    fn cursor(&self) -> Result<u32, BuildError> {
        u32::try_from(self.buf.len())
            .ok()
            .ok_or(BuildError::Internal("cursor exceeds u32"))
    }

    /// Pad so that after writing `additional` more bytes the next write
    /// starts on an `align`-byte boundary.
    fn prep(&mut self, align: usize, additional: usize) -> Result<(), BuildError> {
        if !align.is_power_of_two() {
            return Err(BuildError::Internal("alignment is not a power of two"));
        }
        self.min_align = self.min_align.max(align);
        let padding = self
            .buf
            .len()
            .wrapping_add(additional)
            .wrapping_neg()
            & align.saturating_sub(1);
        self.buf.pad(padding)
    }

    fn ensure_building(&self) -> Result<(), BuildError> {
        if self.finished {
            return Err(BuildError::AlreadyFinished);
        }
        Ok(())
    }

    /// Fail unless no table or vector is open.
    fn ensure_idle(&self) -> Result<(), BuildError> {
        self.ensure_building()?;
        if self.table.is_some() {
            return Err(BuildError::TableOpen);
        }
        if self.vector.is_some() {
            return Err(BuildError::VectorOpen);
        }
        Ok(())
    }

    /// Write a free-standing aligned scalar and return its tail position.
    ///
    /// Most callers want [`add_scalar`](Self::add_scalar) or
    /// [`push_vector_scalar`](Self::push_vector_scalar); this is for
    /// hand-laid records that sit outside any table.
    pub fn push_scalar<T: Scalar>(&mut self, value: T) -> Result<u32, BuildError> {
        self.ensure_idle()?;
        self.write_scalar(value)
    }

    fn write_scalar<T: Scalar>(&mut self, value: T) -> Result<u32, BuildError> {
        self.prep(T::SIZE, 0)?;
        value
            .write_le(self.buf.make_space(T::SIZE)?)
            .ok_or(BuildError::Internal("scalar wider than reserved space"))?;
        self.cursor()
    }

    /// Write a 4-byte forward offset to the object at tail position `target`.
    fn push_uoffset(&mut self, target: u32) -> Result<u32, BuildError> {
        self.prep(4, 0)?;
        let cursor = self.cursor()?;
        if target == 0 || target > cursor {
            return Err(BuildError::UnresolvedOffset {
                offset: target,
                cursor,
            });
        }
        let relative = cursor
            .checked_add(4)
            .and_then(|end| end.checked_sub(target))
            .ok_or(BuildError::Internal("offset arithmetic overflowed"))?;
        self.write_scalar(relative)
    }

    // -----------------------------------------------------------------------
    // Tables
    // -----------------------------------------------------------------------

    /// Open a table with room for `field_count` slots.
    pub fn start_table(&mut self, field_count: u16) -> Result<(), BuildError> {
        self.ensure_idle()?;
        // Aligned starts keep identical layouts at identical table lengths,
        // so their vtables can be shared.
        self.prep(4, 0)?;
        self.fields.clear();
        self.table = Some(OpenTable {
            start: self.cursor()?,
            field_count,
        });
        Ok(())
    }

    /// Check that `slot` can be written into the open table.
    fn check_slot(&self, slot: u16) -> Result<(), BuildError> {
        self.ensure_building()?;
        let table = self.table.ok_or(BuildError::NoOpenTable)?;
        if slot >= table.field_count {
            return Err(BuildError::SlotOutOfRange {
                slot,
                field_count: table.field_count,
            });
        }
        if self.fields.iter().any(|f| f.slot == slot) {
            return Err(BuildError::DuplicateSlot(slot));
        }
        Ok(())
    }

    /// Write a scalar field. A value equal to `default` is omitted unless
    /// defaults are forced.
    pub fn add_scalar<T: Scalar>(
        &mut self,
        slot: u16,
        value: T,
        default: T,
    ) -> Result<(), BuildError> {
        self.check_slot(slot)?;
        if value == default && !self.force_defaults {
            return Ok(());
        }
        let offset = self.write_scalar(value)?;
        self.fields.push(FieldLoc { offset, slot });
        Ok(())
    }

    /// Write a scalar field that has no default; `None` leaves it absent.
    pub fn add_optional_scalar<T: Scalar>(
        &mut self,
        slot: u16,
        value: Option<T>,
    ) -> Result<(), BuildError> {
        self.check_slot(slot)?;
        if let Some(value) = value {
            let offset = self.write_scalar(value)?;
            self.fields.push(FieldLoc { offset, slot });
        }
        Ok(())
    }

    /// Store a reference to an already-written object.
    pub fn add_offset<T>(&mut self, slot: u16, target: Offset<T>) -> Result<(), BuildError> {
        self.check_slot(slot)?;
        let offset = self.push_uoffset(target.value())?;
        self.fields.push(FieldLoc { offset, slot });
        Ok(())
    }

    /// Close the open table, writing (or sharing) its vtable.
    pub fn end_table(&mut self) -> Result<Offset<TableMark>, BuildError> {
        self.ensure_building()?;
        let table = self.table.take().ok_or(BuildError::NoOpenTable)?;

        // Placeholder soffset, patched once the vtable position is known.
        let object = self.write_scalar(0i32)?;
        let table_len = object
            .checked_sub(table.start)
            .ok_or(BuildError::Internal("table ends before it starts"))?;
        let table_len_u16 = u16::try_from(table_len)
            .ok()
            .ok_or(BuildError::TableTooLarge { len: table_len })?;

        let vtable = self.vtable_bytes(object, table_len_u16)?;
        let shared = if self.dedup_vtables {
            self.find_vtable(&vtable)
        } else {
            None
        };

        let vtable_offset = if let Some(existing) = shared {
            debug!(table = object, vtable = existing, "reusing identical vtable");
            existing
        } else {
            self.buf.push_bytes(&vtable)?;
            let written = self.cursor()?;
            if self.dedup_vtables {
                self.vtables.push(written);
            }
            written
        };

        let soffset = i64::from(vtable_offset)
            .checked_sub(i64::from(object))
            .and_then(|d| i32::try_from(d).ok())
            .ok_or(BuildError::Internal("soffset does not fit in i32"))?;
        self.buf.patch_at(usize_from(object)?, &soffset.to_le_bytes())?;
        self.fields.clear();
        Ok(Offset::new(object))
    }

    /// Serialize the vtable for the table whose soffset sits at `object`.
    ///
    /// Trailing absent slots are trimmed; readers treat slots past the end
    /// of a vtable as absent.
    fn vtable_bytes(&self, object: u32, table_len: u16) -> Result<Vec<u8>, BuildError> {
        let slots = self
            .fields
            .iter()
            .map(|f| usize::from(f.slot).saturating_add(1))
            .max()
            .unwrap_or(0);
        let mut entries = vec![0u16; slots];
        for field in &self.fields {
            let distance = object
                .checked_sub(field.offset)
                .ok_or(BuildError::Internal("field written after its table"))?;
            let distance_u16 = u16::try_from(distance).ok().ok_or(BuildError::FieldTooFar {
                slot: field.slot,
                distance,
            })?;
            let entry = entries
                .get_mut(usize::from(field.slot))
                .ok_or(BuildError::Internal("slot outside vtable"))?;
            *entry = distance_u16;
        }

        let vtable_len = slots
            .checked_mul(2)
            .and_then(|n| n.checked_add(4))
            .and_then(|n| u16::try_from(n).ok())
            .ok_or(BuildError::Internal("vtable exceeds 64 KiB"))?;

        let mut bytes = Vec::with_capacity(usize::from(vtable_len));
        bytes.extend_from_slice(&vtable_len.to_le_bytes());
        bytes.extend_from_slice(&table_len.to_le_bytes());
        for entry in entries {
            bytes.extend_from_slice(&entry.to_le_bytes());
        }
        Ok(bytes)
    }

    /// Tail position of a previously written vtable identical to `vtable`.
    fn find_vtable(&self, vtable: &[u8]) -> Option<u32> {
        self.vtables.iter().rev().copied().find(|&existing| {
            usize::try_from(existing)
                .ok()
                .and_then(|at| self.buf.bytes_at(at, vtable.len()))
                .is_some_and(|bytes| bytes == vtable)
        })
    }

    // -----------------------------------------------------------------------
    // Vectors
    // -----------------------------------------------------------------------

    /// Open a vector of `count` elements of `elem_size` bytes each.
    ///
    /// Elements are pushed last to first; [`create_vector`](Self::create_vector)
    /// does this for a slice.
    pub fn start_vector(
        &mut self,
        elem_size: usize,
        count: usize,
        alignment: usize,
    ) -> Result<(), BuildError> {
        self.ensure_idle()?;
        let body = elem_size
            .checked_mul(count)
            .ok_or(BuildError::BufferTooLarge {
                requested: usize::MAX,
                max: self.buf.max_size(),
            })?;
        self.prep(4, body)?;
        self.prep(alignment.max(1), body)?;
        self.vector = Some(OpenVector {
            elem_size,
            declared: count,
            pushed: 0,
        });
        Ok(())
    }

    /// Fail unless a vector of `width`-byte elements is open.
    fn check_element(&self, width: usize) -> Result<(), BuildError> {
        let vector = self.vector.as_ref().ok_or(BuildError::NoOpenVector)?;
        if vector.elem_size != width {
            return Err(BuildError::VectorElementSize {
                declared: vector.elem_size,
                pushed: width,
            });
        }
        Ok(())
    }

    fn count_pushed(&mut self) -> Result<(), BuildError> {
        let vector = self.vector.as_mut().ok_or(BuildError::NoOpenVector)?;
        vector.pushed = vector.pushed.saturating_add(1);
        Ok(())
    }

    /// Push one scalar element into the open vector.
    pub fn push_vector_scalar<T: Scalar>(&mut self, value: T) -> Result<(), BuildError> {
        self.ensure_building()?;
        self.check_element(T::SIZE)?;
        self.write_scalar(value)?;
        self.count_pushed()
    }

    /// Push one reference element into the open vector.
    pub fn push_vector_offset<T>(&mut self, target: Offset<T>) -> Result<(), BuildError> {
        self.ensure_building()?;
        self.check_element(4)?;
        self.push_uoffset(target.value())?;
        self.count_pushed()
    }

    /// Close the open vector by writing its length prefix.
    pub fn end_vector(&mut self) -> Result<Offset<VectorMark>, BuildError> {
        self.ensure_building()?;
        let vector = self.vector.take().ok_or(BuildError::NoOpenVector)?;
        if vector.pushed != vector.declared {
            return Err(BuildError::VectorCountMismatch {
                declared: vector.declared,
                written: vector.pushed,
            });
        }
        let len = u32::try_from(vector.declared)
            .ok()
            .ok_or(BuildError::Internal("vector length exceeds u32"))?;
        let offset = self.write_scalar(len)?;
        Ok(Offset::new(offset))
    }

    /// Write a vector of scalars.
    pub fn create_vector<T: Scalar>(
        &mut self,
        items: &[T],
    ) -> Result<Offset<VectorMark>, BuildError> {
        self.start_vector(T::SIZE, items.len(), T::SIZE)?;
        for &item in items.iter().rev() {
            self.push_vector_scalar(item)?;
        }
        self.end_vector()
    }

    /// Write a vector of references to already-written objects.
    pub fn create_vector_of_offsets<T>(
        &mut self,
        items: &[Offset<T>],
    ) -> Result<Offset<VectorMark>, BuildError> {
        self.start_vector(4, items.len(), 4)?;
        for &item in items.iter().rev() {
            self.push_vector_offset(item)?;
        }
        self.end_vector()
    }

    // -----------------------------------------------------------------------
    // Strings and structs
    // -----------------------------------------------------------------------

    /// Write a UTF-8 string.
    pub fn create_string(&mut self, s: &str) -> Result<Offset<StringMark>, BuildError> {
        self.create_string_bytes(s.as_bytes())
    }

    /// Write a length-prefixed, NUL-terminated byte string.
    pub fn create_string_bytes(
        &mut self,
        bytes: &[u8],
    ) -> Result<Offset<StringMark>, BuildError> {
        self.ensure_idle()?;
        let len = u32::try_from(bytes.len())
            .ok()
            .ok_or(BuildError::Internal("string length exceeds u32"))?;
        self.prep(4, bytes.len().saturating_add(1))?;
        self.buf.push_bytes(&[0])?;
        self.buf.push_bytes(bytes)?;
        let offset = self.write_scalar(len)?;
        Ok(Offset::new(offset))
    }

    /// Write a fixed-layout record out of line.
    pub fn create_struct<S: FixedLayout>(&mut self, value: &S) -> Result<Offset<S>, BuildError> {
        self.ensure_idle()?;
        self.prep(S::ALIGN, S::SIZE)?;
        value
            .write_to(self.buf.make_space(S::SIZE)?)
            .ok_or(BuildError::Internal("struct wider than its declared size"))?;
        Ok(Offset::new(self.cursor()?))
    }

    // -----------------------------------------------------------------------
    // Finishing
    // -----------------------------------------------------------------------

    /// Write the root reference and seal the buffer.
    pub fn finish<T>(&mut self, root: Offset<T>) -> Result<&[u8], BuildError> {
        self.finish_inner(root.value(), None, false)
    }

    /// Seal the buffer with a 4-byte file identifier after the root offset.
    pub fn finish_with_identifier<T>(
        &mut self,
        root: Offset<T>,
        ident: [u8; 4],
    ) -> Result<&[u8], BuildError> {
        self.finish_inner(root.value(), Some(ident), false)
    }

    /// Seal the buffer behind a leading `u32` byte count, for streaming
    /// several buffers back to back.
    pub fn finish_size_prefixed<T>(
        &mut self,
        root: Offset<T>,
        ident: Option<[u8; 4]>,
    ) -> Result<&[u8], BuildError> {
        self.finish_inner(root.value(), ident, true)
    }

    fn finish_inner(
        &mut self,
        root: u32,
        ident: Option<[u8; 4]>,
        size_prefixed: bool,
    ) -> Result<&[u8], BuildError> {
        self.ensure_idle()?;
        let mut trailer = 4usize;
        if ident.is_some() {
            trailer = trailer.saturating_add(4);
        }
        if size_prefixed {
            trailer = trailer.saturating_add(4);
        }
        self.prep(self.min_align.max(4), trailer)?;
        if let Some(ident) = ident {
            self.buf.push_bytes(&ident)?;
        }
        self.push_uoffset(root)?;
        if size_prefixed {
            let len = self.cursor()?;
            self.write_scalar(len)?;
        }
        self.finished = true;
        trace!(
            len = self.buf.len(),
            min_align = self.min_align,
            size_prefixed,
            "finished buffer"
        );
        Ok(self.buf.data())
    }

    /// The sealed bytes.
    pub fn finished_data(&self) -> Result<&[u8], BuildError> {
        if !self.finished {
            return Err(BuildError::NotFinished);
        }
        Ok(self.buf.data())
    }

    /// Consume the builder, returning the sealed bytes.
    pub fn into_finished(self) -> Result<Vec<u8>, BuildError> {
        if !self.finished {
            return Err(BuildError::NotFinished);
        }
        Ok(self.buf.into_vec())
    }
}

fn usize_from(value: u32) -> Result<usize, BuildError> {
    usize::try_from(value)
        .ok()
        .ok_or(BuildError::Internal("u32 does not fit in usize"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{Table, root_table, root_table_with_identifier, size_prefixed_root_table};

    fn one_field_table(value: i32) -> Vec<u8> {
        let mut b = Builder::new();
        b.start_table(2).unwrap();
        b.add_scalar::<i32>(0, value, 0).unwrap();
        let root = b.end_table().unwrap();
        b.finish(root).unwrap();
        b.into_finished().unwrap()
    }

    #[test]
    fn scalar_field_round_trips() {
        let bytes = one_field_table(42);
        let table = root_table(&bytes).unwrap();
        assert_eq!(table.get::<i32>(0, 0).ok(), Some(42));
        assert_eq!(table.get::<i32>(1, -1).ok(), Some(-1));
    }

    #[test]
    fn default_values_are_omitted() {
        let bytes = one_field_table(0);
        let table = root_table(&bytes).unwrap();
        assert_eq!(table.is_present(0).ok(), Some(false));
        assert_eq!(table.get::<i32>(0, 0).ok(), Some(0));
        assert!(bytes.len() < one_field_table(1).len());
    }

    #[test]
    fn forced_defaults_are_written() {
        let mut b = Builder::new();
        b.force_defaults(true);
        b.start_table(1).unwrap();
        b.add_scalar::<i32>(0, 0, 0).unwrap();
        let root = b.end_table().unwrap();
        let bytes = b.finish(root).unwrap().to_vec();
        let table = root_table(&bytes).unwrap();
        assert_eq!(table.is_present(0).ok(), Some(true));
    }

    #[test]
    fn strings_and_vectors() {
        let mut b = Builder::new();
        let name = b.create_string("red").unwrap();
        let xs = b.create_vector(&[1i32, 2, 3]).unwrap();
        b.start_table(2).unwrap();
        b.add_offset(0, name).unwrap();
        b.add_offset(1, xs).unwrap();
        let root = b.end_table().unwrap();
        let bytes = b.finish(root).unwrap().to_vec();

        let table = root_table(&bytes).unwrap();
        assert_eq!(table.get_str(0).ok(), Some(Some("red")));
        let xs = table.get_vector::<i32>(1).unwrap().unwrap();
        assert_eq!(xs.to_vec().ok(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn strings_are_nul_terminated() {
        let mut b = Builder::new();
        let s = b.create_string("ab").unwrap();
        let bytes = b.finish(s).unwrap().to_vec();
        let loc = crate::follow::resolve_uoffset(&bytes, 0).unwrap();
        assert_eq!(bytes.get(loc..loc + 7), Some(&[2, 0, 0, 0, b'a', b'b', 0][..]));
    }

    #[test]
    fn identical_vtables_are_shared() {
        let mut b = Builder::new();
        let mut children = Vec::new();
        for value in 1..=3i32 {
            b.start_table(1).unwrap();
            b.add_scalar(0, value, 0).unwrap();
            children.push(b.end_table().unwrap());
        }
        let list = b.create_vector_of_offsets(&children).unwrap();
        b.start_table(1).unwrap();
        b.add_offset(0, list).unwrap();
        let root = b.end_table().unwrap();
        let shared_size = b.finish(root).unwrap().len();
        let bytes = b.finished_data().unwrap().to_vec();

        let mut unshared = Builder::with_config(&BuilderConfig {
            dedup_vtables: false,
            ..BuilderConfig::default()
        });
        let mut children = Vec::new();
        for value in 1..=3i32 {
            unshared.start_table(1).unwrap();
            unshared.add_scalar(0, value, 0).unwrap();
            children.push(unshared.end_table().unwrap());
        }
        let list = unshared.create_vector_of_offsets(&children).unwrap();
        unshared.start_table(1).unwrap();
        unshared.add_offset(0, list).unwrap();
        let root = unshared.end_table().unwrap();
        assert!(shared_size < unshared.finish(root).unwrap().len());

        let table = root_table(&bytes).unwrap();
        let values: Vec<i32> = table
            .get_vector::<crate::ForwardsUOffset<Table<'_>>>(0)
            .unwrap()
            .unwrap()
            .iter()
            .map(|t| t.unwrap().get::<i32>(0, 0).unwrap())
            .collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn nested_tables_are_rejected() {
        let mut b = Builder::new();
        b.start_table(1).unwrap();
        assert_eq!(b.start_table(1).err(), Some(BuildError::TableOpen));
        assert_eq!(b.create_string("x").err(), Some(BuildError::TableOpen));
    }

    #[test]
    fn fields_outside_a_table_are_rejected() {
        let mut b = Builder::new();
        assert_eq!(b.add_scalar(0, 1u8, 0).err(), Some(BuildError::NoOpenTable));
        assert_eq!(b.end_table().err(), Some(BuildError::NoOpenTable));
    }

    #[test]
    fn slot_checks() {
        let mut b = Builder::new();
        b.start_table(2).unwrap();
        assert_eq!(
            b.add_scalar(2, 1u8, 0).err(),
            Some(BuildError::SlotOutOfRange {
                slot: 2,
                field_count: 2
            })
        );
        b.add_scalar(1, 1u8, 0).unwrap();
        assert_eq!(b.add_scalar(1, 2u8, 0).err(), Some(BuildError::DuplicateSlot(1)));
    }

    #[test]
    fn vector_count_must_match() {
        let mut b = Builder::new();
        b.start_vector(4, 2, 4).unwrap();
        b.push_vector_scalar(1i32).unwrap();
        assert_eq!(
            b.end_vector().err(),
            Some(BuildError::VectorCountMismatch {
                declared: 2,
                written: 1
            })
        );
    }

    #[test]
    fn vector_element_width_must_match() {
        let mut b = Builder::new();
        b.start_vector(4, 2, 4).unwrap();
        assert_eq!(
            b.push_vector_scalar(1u16).err(),
            Some(BuildError::VectorElementSize {
                declared: 4,
                pushed: 2
            })
        );
        b.push_vector_scalar(1u32).unwrap();
        b.push_vector_offset(Offset::<StringMark>::new(4)).unwrap();
        b.end_vector().unwrap();

        b.start_vector(2, 1, 2).unwrap();
        assert_eq!(
            b.push_vector_offset(Offset::<StringMark>::new(4)).err(),
            Some(BuildError::VectorElementSize {
                declared: 2,
                pushed: 4
            })
        );
    }

    #[test]
    fn oversized_vector_reports_configured_limit() {
        let mut b = Builder::with_config(&BuilderConfig {
            max_buffer_size: 1024,
            ..BuilderConfig::default()
        });
        assert_eq!(
            b.start_vector(usize::MAX, 2, 4).err(),
            Some(BuildError::BufferTooLarge {
                requested: usize::MAX,
                max: 1024
            })
        );
    }

    #[test]
    fn unwritten_offsets_are_rejected() {
        let mut b = Builder::new();
        b.start_table(1).unwrap();
        let bogus: Offset<StringMark> = Offset::new(500);
        assert!(matches!(
            b.add_offset(0, bogus),
            Err(BuildError::UnresolvedOffset { offset: 500, .. })
        ));
    }

    #[test]
    fn finish_is_terminal() {
        let mut b = Builder::new();
        let s = b.create_string("done").unwrap();
        assert_eq!(b.finished_data().err(), Some(BuildError::NotFinished));
        b.finish(s).unwrap();
        assert_eq!(b.create_string("more").err(), Some(BuildError::AlreadyFinished));
        assert!(b.finished_data().is_ok());

        b.reset();
        assert_eq!(b.size(), 0);
        assert!(b.create_string("again").is_ok());
    }

    #[test]
    fn identifier_and_size_prefix() {
        let mut b = Builder::new();
        b.start_table(1).unwrap();
        b.add_scalar(0, 9i32, 0).unwrap();
        let root = b.end_table().unwrap();
        let bytes = b.finish_with_identifier(root, *b"MLOG").unwrap().to_vec();
        let table = root_table_with_identifier(&bytes, *b"MLOG").unwrap();
        assert_eq!(table.get::<i32>(0, 0).ok(), Some(9));

        let mut b = Builder::new();
        b.start_table(1).unwrap();
        b.add_scalar(0, 9i32, 0).unwrap();
        let root = b.end_table().unwrap();
        let bytes = b.finish_size_prefixed(root, None).unwrap().to_vec();
        let declared = u32::from_le_bytes(bytes.get(..4).unwrap().try_into().unwrap());
        assert_eq!(usize::try_from(declared).unwrap(), bytes.len().saturating_sub(4));
        let table = size_prefixed_root_table(&bytes).unwrap();
        assert_eq!(table.get::<i32>(0, 0).ok(), Some(9));
    }

    #[test]
    fn finished_length_respects_alignment() {
        let mut b = Builder::new();
        b.start_table(1).unwrap();
        b.add_scalar(0, 7i64, 0).unwrap();
        let root = b.end_table().unwrap();
        let len = b.finish(root).unwrap().len();
        assert_eq!(len % 8, 0);
    }

    #[test]
    fn growth_keeps_offsets_valid() {
        let mut b = Builder::with_capacity(1);
        let long = "x".repeat(300);
        let s = b.create_string(&long).unwrap();
        b.start_table(1).unwrap();
        b.add_offset(0, s).unwrap();
        let root = b.end_table().unwrap();
        let bytes = b.finish(root).unwrap().to_vec();
        let table = root_table(&bytes).unwrap();
        assert_eq!(table.get_str(0).ok(), Some(Some(long.as_str())));
    }

    #[test]
    fn push_scalar_outside_tables_only() {
        let mut b = Builder::new();
        assert_eq!(b.push_scalar(0xabcdu16).ok(), Some(2));
        assert_eq!(b.push_scalar(1u32).ok(), Some(8));
        b.start_table(1).unwrap();
        assert_eq!(b.push_scalar(1u8).err(), Some(BuildError::TableOpen));
    }
}
