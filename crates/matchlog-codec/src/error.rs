//! Error types for the `matchlog-codec` crate.
//!
//! Reading and writing fail in very different ways, so they get separate
//! error types:
//!
//! - [`DecodeError`] -- a structural problem in a buffer being read. The
//!   buffer may come from an untrusted or truncated source, so every
//!   accessor reports this instead of reading out of bounds. The error is
//!   scoped to the single accessor call; callers can skip the corrupt
//!   record and keep reading the rest of the stream.
//! - [`BuildError`] -- misuse of the [`Builder`](crate::Builder) (objects
//!   finished out of dependency order, fields written outside a table,
//!   and so on). Returned at the offending call, never deferred.
//!
//! A missing optional field is not an error: accessors substitute the
//! default supplied by the schema.

/// Structural decode failure for a single accessor call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A read of `len` bytes at `loc` would cross the end of the buffer.
    #[error("read of {len} bytes at {loc} exceeds buffer of {buffer_len} bytes")]
    OutOfBounds {
        /// Absolute position of the attempted read.
        loc: usize,
        /// Number of bytes the read needed.
        len: usize,
        /// Total length of the buffer being read.
        buffer_len: usize,
    },

    /// A table's field-presence descriptor has an impossible shape.
    #[error("implausible vtable at {vtable} for table at {table}: {reason}")]
    ImplausibleVtable {
        /// Absolute position of the table.
        table: usize,
        /// Absolute position the table's soffset resolved to.
        vtable: isize,
        /// Which check failed.
        reason: &'static str,
    },

    /// A vtable entry points past the end of its own table.
    #[error("field slot {slot} at offset {field_offset} lies outside table of {table_len} bytes")]
    FieldOutsideTable {
        /// The slot being resolved.
        slot: u16,
        /// The offset stored in the vtable.
        field_offset: u16,
        /// Table length declared by the vtable.
        table_len: u16,
    },

    /// A vector element was requested past the vector's length.
    #[error("index {index} out of range for vector of length {len}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The authoritative vector length.
        len: usize,
    },

    /// A string's bytes are not valid UTF-8.
    #[error("string at {loc} is not valid UTF-8")]
    InvalidUtf8 {
        /// Absolute position of the string's length prefix.
        loc: usize,
    },

    /// Position arithmetic overflowed while following an offset.
    #[error("offset arithmetic overflowed at {loc}")]
    OffsetOverflow {
        /// Position at which the overflow occurred.
        loc: usize,
    },

    /// A size-prefixed buffer declares more bytes than are available.
    #[error("size prefix declares {declared} bytes but only {available} are available")]
    SizePrefixMismatch {
        /// Size stored in the prefix.
        declared: usize,
        /// Bytes actually present after the prefix.
        available: usize,
    },

    /// The buffer's file identifier does not match the expected one.
    #[error("file identifier mismatch: expected {expected:?}, found {found:?}")]
    IdentifierMismatch {
        /// Identifier the caller asked for.
        expected: [u8; 4],
        /// Identifier present in the buffer.
        found: [u8; 4],
    },
}

/// Builder misuse. The encoding session that produced it should be
/// considered broken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// An object was started while a table was still open. Tables cannot
    /// be nested during construction; children are built first.
    #[error("a table is open; finish it before starting another object")]
    TableOpen,

    /// A field write or `end_table` happened with no open table.
    #[error("no table is open")]
    NoOpenTable,

    /// An object was created while a vector was still open.
    #[error("a vector is open; finish it before creating other objects")]
    VectorOpen,

    /// A vector element was pushed or `end_vector` called with no open vector.
    #[error("no vector is open")]
    NoOpenVector,

    /// The number of elements pushed differs from the count declared at start.
    #[error("vector declared {declared} elements but {written} were pushed")]
    VectorCountMismatch {
        /// Count passed to `start_vector`.
        declared: usize,
        /// Count actually pushed.
        written: usize,
    },

    /// A vector element was pushed with a width other than the one declared.
    #[error("vector declared {declared}-byte elements but a {pushed}-byte element was pushed")]
    VectorElementSize {
        /// Element size passed to `start_vector`.
        declared: usize,
        /// Width of the pushed element.
        pushed: usize,
    },

    /// A field slot outside the table's declared field count.
    #[error("slot {slot} is out of range for a table of {field_count} fields")]
    SlotOutOfRange {
        /// The offending slot.
        slot: u16,
        /// Field count passed to `start_table`.
        field_count: u16,
    },

    /// The same slot was written twice in one table.
    #[error("slot {0} was already written in this table")]
    DuplicateSlot(u16),

    /// A referenced object has not been written yet (dependency order).
    #[error("offset {offset} refers to an object that has not been written (cursor at {cursor})")]
    UnresolvedOffset {
        /// The referenced offset, measured from the buffer tail.
        offset: u32,
        /// The current write cursor, measured from the buffer tail.
        cursor: u32,
    },

    /// A field sits too far from its table start to be described by a vtable.
    #[error("field in slot {slot} is {distance} bytes from its table start")]
    FieldTooFar {
        /// The offending slot.
        slot: u16,
        /// Distance that does not fit into 16 bits.
        distance: u32,
    },

    /// A table's inline data does not fit into the 16-bit length of a vtable.
    #[error("table of {len} bytes is too large to describe with a vtable")]
    TableTooLarge {
        /// Inline size of the table in bytes.
        len: u32,
    },

    /// The buffer would exceed its configured maximum size.
    #[error("buffer would grow to {requested} bytes, above the maximum of {max}")]
    BufferTooLarge {
        /// Size the buffer would need.
        requested: usize,
        /// Configured maximum size.
        max: usize,
    },

    /// An operation other than reading the result was attempted after `finish`.
    #[error("the buffer has already been finished")]
    AlreadyFinished,

    /// The finished bytes were requested before `finish`.
    #[error("the buffer has not been finished")]
    NotFinished,

    /// An internal invariant was broken. Should not occur in normal operation.
    #[error("internal builder error: {0}")]
    Internal(&'static str),
}
