//! Zero-copy binary table codec for match replays.
//!
//! Replays are stored as finished buffers of schema-evolvable tables. A
//! reader opens a buffer and reads individual fields in place, without
//! parsing the whole thing; a writer assembles a buffer back to front,
//! children before parents.
//!
//! # Architecture
//!
//! - [`buffer`] -- [`ByteBuffer`]: the growable region the builder fills from the back.
//! - [`builder`] -- [`Builder`] and typed [`Offset`]s.
//! - [`table`] -- [`Table`]: field access through a vtable, plus root helpers.
//! - [`vector`] -- [`Vector`]: lazy length-prefixed runs.
//! - [`follow`] -- [`Follow`]: the resolve-a-value-at-a-position primitive.
//! - [`scalar`] -- little-endian [`Scalar`] reads and writes.
//! - [`layout`] -- [`FixedLayout`] records with no vtable.
//! - [`config`] -- [`BuilderConfig`] loaded from YAML.
//!
//! # Wire format
//!
//! ```text
//! buffer:  [root: u32 uoffset][file identifier: 4 bytes, optional] ...
//! table:   [soffset: i32 -> vtable][inline fields]
//! vtable:  [vtable_len: u16][table_len: u16][field offset: u16]*
//! string:  [len: u32][utf-8 bytes][0]
//! vector:  [len: u32][elements]
//! ```
//!
//! All integers are little-endian. A uoffset is relative to its own
//! position and points forward; an soffset is subtracted from the table
//! position to find the vtable.
//!
//! # Safety of reads
//!
//! Buffers may be truncated or hostile. Every read is bounds-checked and
//! every position computation is overflow-checked, so a malformed buffer
//! produces a [`DecodeError`] from the accessor that touched it and never
//! a panic or an out-of-bounds read.
//!
//! # Usage
//!
//! ```
//! use matchlog_codec::{Builder, root_table};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = Builder::new();
//! let name = builder.create_string("blue")?;
//! builder.start_table(2)?;
//! builder.add_offset(0, name)?;
//! builder.add_scalar::<i8>(1, 2, 0)?;
//! let root = builder.end_table()?;
//! let bytes = builder.finish(root)?.to_vec();
//!
//! let table = root_table(&bytes)?;
//! assert_eq!(table.get_str(0)?, Some("blue"));
//! assert_eq!(table.get::<i8>(1, 0)?, 2);
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod builder;
pub mod config;
pub mod error;
pub mod follow;
pub mod layout;
pub mod scalar;
pub mod table;
pub mod vector;

// Re-export primary types at crate root.
pub use buffer::{ByteBuffer, DEFAULT_MAX_BUFFER_SIZE};
pub use builder::{Builder, Offset, StringMark, TableMark, VectorMark};
pub use config::{BuilderConfig, ConfigError};
pub use error::{BuildError, DecodeError};
pub use follow::{Follow, ForwardsUOffset, Inline, LossyStr, Position, resolve_uoffset};
pub use layout::FixedLayout;
pub use scalar::{Scalar, put_field, read_scalar, take_field};
pub use table::{
    Table, buffer_has_identifier, buffer_identifier, root_table, root_table_with_identifier,
    size_prefixed_root_table,
};
pub use vector::{Vector, VectorIter};
