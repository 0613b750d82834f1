//! Byte-exact checks of the builder's output.
//!
//! Other tools read replays written by this crate, so the layout is
//! pinned down here byte for byte rather than only through round trips.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use matchlog_codec::{Builder, root_table};

#[test]
fn single_field_table_layout() {
    let mut b = Builder::new();
    b.start_table(1).unwrap();
    b.add_scalar::<i32>(0, 7, 0).unwrap();
    let root = b.end_table().unwrap();
    let bytes = b.finish(root).unwrap().to_vec();

    #[rustfmt::skip]
    let expected: [u8; 20] = [
        12, 0, 0, 0,        // root uoffset -> 12
        0, 0,               // padding
        6, 0, 8, 0, 4, 0,   // vtable: len 6, table len 8, slot 0 at +4
        6, 0, 0, 0,         // soffset: vtable at 12 - 6
        7, 0, 0, 0,         // slot 0
    ];
    assert_eq!(bytes, expected);
}

#[test]
fn shared_vtable_sits_after_the_table() {
    let mut b = Builder::new();
    b.start_table(1).unwrap();
    b.add_scalar::<i32>(0, 5, 0).unwrap();
    let child = b.end_table().unwrap();
    b.start_table(1).unwrap();
    b.add_offset(0, child).unwrap();
    let root = b.end_table().unwrap();
    let bytes = b.finish(root).unwrap().to_vec();

    assert_eq!(bytes.len(), 28);
    assert_eq!(bytes[..4], 4u32.to_le_bytes());
    // The root reuses the child's vtable, which lies further into the buffer.
    assert_eq!(bytes[4..8], (-10i32).to_le_bytes());

    let table = root_table(&bytes).unwrap();
    let child = table.get_table(0).unwrap().unwrap();
    assert_eq!(child.get::<i32>(0, 0).ok(), Some(5));
}

#[test]
fn absent_trailing_slots_are_trimmed() {
    let mut b = Builder::new();
    b.start_table(10).unwrap();
    b.add_scalar::<u8>(1, 3, 0).unwrap();
    let root = b.end_table().unwrap();
    let bytes = b.finish(root).unwrap().to_vec();

    let table = root_table(&bytes).unwrap();
    assert_eq!(table.slot_count(), 2);
    assert_eq!(table.get::<u8>(1, 0).ok(), Some(3));
    assert_eq!(table.get::<u8>(9, 0).ok(), Some(0));
}

#[test]
fn identifier_follows_root_offset() {
    let mut b = Builder::new();
    b.start_table(0).unwrap();
    let root = b.end_table().unwrap();
    let bytes = b.finish_with_identifier(root, *b"MLOG").unwrap().to_vec();
    assert_eq!(&bytes[4..8], b"MLOG");
    assert_eq!(bytes.len() % 4, 0);
}
