//! The view/object pairing shared by every schema table.
//!
//! Each table has two Rust faces:
//!
//! - a **view** (`XxxView<'buf>`): a `Copy` wrapper over a
//!   [`Table`](matchlog_codec::Table) with one accessor per slot, reading
//!   lazily from the buffer;
//! - an **object** (`Xxx`): an owned, serde-serializable mirror used by
//!   producers to encode and by tools that want the whole record at once.
//!
//! [`TableObject`] ties the two together and gives generic helpers for
//! vectors of tables.

use matchlog_codec::{
    Builder, DecodeError, Follow, ForwardsUOffset, Offset, Table, TableMark, VectorMark,
};

use crate::SchemaError;

/// An owned schema object with a borrowed view type.
pub trait TableObject: Sized {
    /// The borrowed reader for this table.
    type View<'buf>: Follow<'buf, Inner = Self::View<'buf>>;

    /// Copy every field out of a view.
    ///
    /// # Errors
    ///
    /// Returns the first [`DecodeError`] met while reading any field.
    fn decode(view: Self::View<'_>) -> Result<Self, DecodeError>;

    /// Write this object (children first) and return the table's offset.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if the builder rejects a write or the object
    /// holds a value with no wire form.
    fn encode(&self, builder: &mut Builder) -> Result<Offset<TableMark>, SchemaError>;
}

/// Decode the vector of tables in `slot`. An absent vector is empty.
pub(crate) fn decode_table_vector<'buf, T: TableObject>(
    table: &Table<'buf>,
    slot: u16,
) -> Result<Vec<T>, DecodeError> {
    let Some(views) = table.get_vector::<ForwardsUOffset<T::View<'buf>>>(slot)? else {
        return Ok(Vec::new());
    };
    views.iter().map(|view| T::decode(view?)).collect()
}

/// Decode the scalar vector in `slot`. An absent vector is empty.
pub(crate) fn decode_scalar_vector(table: &Table<'_>, slot: u16) -> Result<Vec<i32>, DecodeError> {
    table
        .get_vector::<i32>(slot)?
        .map_or_else(|| Ok(Vec::new()), |v| v.to_vec())
}

/// Encode `items` and a vector referencing them, or nothing when empty.
pub(crate) fn encode_table_vector<T: TableObject>(
    builder: &mut Builder,
    items: &[T],
) -> Result<Option<Offset<VectorMark>>, SchemaError> {
    if items.is_empty() {
        return Ok(None);
    }
    let offsets = items
        .iter()
        .map(|item| item.encode(builder))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(builder.create_vector_of_offsets(&offsets)?))
}

/// Encode a scalar vector, or nothing when empty.
pub(crate) fn encode_scalar_vector(
    builder: &mut Builder,
    items: &[i32],
) -> Result<Option<Offset<VectorMark>>, SchemaError> {
    if items.is_empty() {
        return Ok(None);
    }
    Ok(Some(builder.create_vector(items)?))
}

/// Encode an optional string.
pub(crate) fn encode_string(
    builder: &mut Builder,
    value: Option<&str>,
) -> Result<Option<Offset<matchlog_codec::StringMark>>, SchemaError> {
    Ok(value.map(|s| builder.create_string(s)).transpose()?)
}

/// Store an offset into `slot` if one was written.
pub(crate) fn add_optional_offset<T>(
    builder: &mut Builder,
    slot: u16,
    offset: Option<Offset<T>>,
) -> Result<(), SchemaError> {
    if let Some(offset) = offset {
        builder.add_offset(slot, offset)?;
    }
    Ok(())
}

/// Declare a view type: a `Copy` wrapper over one [`Table`].
macro_rules! table_view {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name<'buf> {
            table: matchlog_codec::Table<'buf>,
        }

        impl<'buf> $name<'buf> {
            /// Open the table at absolute position `loc`.
            ///
            /// # Errors
            ///
            /// Returns a [`DecodeError`](matchlog_codec::DecodeError) if the
            /// table header or its vtable is malformed.
            pub fn init(
                buf: &'buf [u8],
                loc: usize,
            ) -> Result<Self, matchlog_codec::DecodeError> {
                matchlog_codec::Table::init(buf, loc).map(Self::from)
            }

            /// The underlying table.
            pub const fn table(&self) -> matchlog_codec::Table<'buf> {
                self.table
            }
        }

        impl<'buf> From<matchlog_codec::Table<'buf>> for $name<'buf> {
            fn from(table: matchlog_codec::Table<'buf>) -> Self {
                Self { table }
            }
        }

        impl<'buf> matchlog_codec::Follow<'buf> for $name<'buf> {
            type Inner = Self;

            fn follow(
                buf: &'buf [u8],
                loc: usize,
            ) -> Result<Self::Inner, matchlog_codec::DecodeError> {
                Self::init(buf, loc)
            }
        }
    };
}

pub(crate) use table_view;
