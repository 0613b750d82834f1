//! Reads of truncated and randomly corrupted buffers.
//!
//! A replay may be cut off mid-write or damaged on disk. Whatever the
//! damage, every accessor must either return the value a full read would
//! have returned or a `DecodeError`. It must never panic or read past the
//! end of the slice it was given.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::missing_panics_doc
)]

use matchlog_codec::{Builder, DecodeError, ForwardsUOffset, Table, root_table};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Everything a full read of the sample document extracts.
#[derive(Debug, PartialEq)]
struct Extracted {
    id: i32,
    label: Option<String>,
    values: Vec<i32>,
    children: Vec<(u8, Option<String>)>,
}

fn build_document(rng: &mut StdRng) -> Vec<u8> {
    let mut b = Builder::new();
    let mut children = Vec::new();
    for i in 0..rng.random_range(1..5u8) {
        let name = b.create_string(&format!("child-{i}")).unwrap();
        b.start_table(2).unwrap();
        b.add_scalar::<u8>(0, rng.random_range(1..=u8::MAX), 0).unwrap();
        b.add_offset(1, name).unwrap();
        children.push(b.end_table().unwrap());
    }
    let children = b.create_vector_of_offsets(&children).unwrap();
    let values: Vec<i32> = (0..rng.random_range(0..8)).map(|_| rng.random()).collect();
    let values = b.create_vector(&values).unwrap();
    let label = b.create_string("sample").unwrap();

    b.start_table(4).unwrap();
    b.add_scalar::<i32>(0, rng.random_range(1..1000), 0).unwrap();
    b.add_offset(1, label).unwrap();
    b.add_offset(2, values).unwrap();
    b.add_offset(3, children).unwrap();
    let root = b.end_table().unwrap();
    b.finish(root).unwrap();
    b.into_finished().unwrap()
}

fn extract(buf: &[u8]) -> Result<Extracted, DecodeError> {
    let root = root_table(buf)?;
    let values = root
        .get_vector::<i32>(2)?
        .map(|v| v.to_vec())
        .transpose()?
        .unwrap_or_default();
    let mut children = Vec::new();
    if let Some(list) = root.get_vector::<ForwardsUOffset<Table<'_>>>(3)? {
        for child in list {
            let child = child?;
            children.push((child.get::<u8>(0, 0)?, child.get_str(1)?.map(str::to_owned)));
        }
    }
    Ok(Extracted {
        id: root.get::<i32>(0, 0)?,
        label: root.get_str(1)?.map(str::to_owned),
        values,
        children,
    })
}

#[test]
fn truncation_fails_with_out_of_bounds() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for _ in 0..20 {
        let full = build_document(&mut rng);
        let expected = extract(&full).unwrap();
        for cut in 0..full.len() {
            match extract(&full[..cut]) {
                // Only the final string terminator is never read.
                Ok(partial) => {
                    assert_eq!(cut, full.len() - 1);
                    assert_eq!(partial, expected);
                }
                Err(err) => assert!(
                    matches!(err, DecodeError::OutOfBounds { .. }),
                    "prefix of {cut}/{} bytes gave {err:?}",
                    full.len()
                ),
            }
        }
    }
}

#[test]
fn inline_fields_before_the_cut_stay_readable() {
    let mut rng = StdRng::seed_from_u64(0xC0FF_EE);
    for _ in 0..20 {
        let full = build_document(&mut rng);
        let whole = root_table(&full).unwrap();
        for cut in 0..full.len() {
            let Ok(table) = root_table(&full[..cut]) else {
                continue;
            };
            for slot in 0..4u16 {
                let field_end = table.loc() + usize::from(table.offset_of(slot).unwrap()) + 4;
                let raw = table.get::<u32>(slot, 0);
                if field_end <= cut {
                    assert_eq!(raw, whole.get::<u32>(slot, 0), "slot {slot} at cut {cut}");
                } else {
                    assert!(
                        matches!(raw, Err(DecodeError::OutOfBounds { .. })),
                        "slot {slot} at cut {cut} gave {raw:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn corrupted_bytes_never_panic() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let mut buf = build_document(&mut rng);
        let flips = rng.random_range(1..4);
        for _ in 0..flips {
            let at = rng.random_range(0..buf.len());
            buf[at] = rng.random();
        }
        // Either outcome is acceptable; reaching this line is the test.
        let _ = extract(&buf);
    }
}

#[test]
fn random_noise_never_panics() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..500 {
        let len = rng.random_range(0..64);
        let noise: Vec<u8> = (0..len).map(|_| rng.random()).collect();
        let _ = extract(&noise);
    }
}
