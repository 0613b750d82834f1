//! Resolving a typed value at a buffer position.
//!
//! [`Follow`] is the one reading primitive every view is built on: given
//! the finished buffer and an absolute position, produce the value stored
//! there (a scalar, a string, a table, a vector, or a schema view). Values
//! that can sit inline in a vector also implement [`Inline`], which fixes
//! their stride.
//!
//! References are never native pointers. A reference is a position in a
//! borrowed buffer, and following a stored [`ForwardsUOffset`] is a
//! bounds-checked two-step chase: read the 4-byte relative offset, then
//! follow the target.

use std::borrow::Cow;
use std::marker::PhantomData;

use crate::DecodeError;
use crate::scalar::{Scalar, read_scalar};

/// Read a value of type [`Follow::Inner`] at an absolute position.
pub trait Follow<'buf> {
    /// The borrowed or copied value produced.
    type Inner;

    /// Resolve the value at `loc`.
    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError>;
}

/// A [`Follow`] type with a fixed inline width, usable as a vector element.
pub trait Inline<'buf>: Follow<'buf> {
    /// Stride of one element in bytes.
    const SIZE: usize;
}

macro_rules! follow_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'buf> Follow<'buf> for $ty {
                type Inner = $ty;

                fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
                    read_scalar::<$ty>(buf, loc)
                }
            }

            impl<'buf> Inline<'buf> for $ty {
                const SIZE: usize = <$ty as Scalar>::SIZE;
            }
        )*
    };
}

follow_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64, bool);

/// A stored 4-byte relative offset to a `T`.
#[derive(Debug)]
pub struct ForwardsUOffset<T>(PhantomData<fn() -> T>);

impl<'buf, T: Follow<'buf>> Follow<'buf> for ForwardsUOffset<T> {
    type Inner = T::Inner;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        let target = resolve_uoffset(buf, loc)?;
        T::follow(buf, target)
    }
}

impl<'buf, T: Follow<'buf>> Inline<'buf> for ForwardsUOffset<T> {
    const SIZE: usize = 4;
}

/// Read the relative offset stored at `loc` and return the absolute
/// position it points to.
///
/// The target is checked to lie inside the buffer; the caller's
/// subsequent read of the target is bounds-checked separately.
pub fn resolve_uoffset(buf: &[u8], loc: usize) -> Result<usize, DecodeError> {
    let relative = read_scalar::<u32>(buf, loc)?;
    let target = usize::try_from(relative)
        .ok()
        .and_then(|r| loc.checked_add(r))
        .ok_or(DecodeError::OffsetOverflow { loc })?;
    if target >= buf.len() {
        return Err(DecodeError::OutOfBounds {
            loc: target,
            len: 1,
            buffer_len: buf.len(),
        });
    }
    Ok(target)
}

/// The bytes of a length-prefixed string starting at `loc` (prefix excluded).
pub fn string_bytes(buf: &[u8], loc: usize) -> Result<&[u8], DecodeError> {
    let len = read_scalar::<u32>(buf, loc)?;
    let len = usize::try_from(len)
        .ok()
        .ok_or(DecodeError::OffsetOverflow { loc })?;
    let start = loc
        .checked_add(4)
        .ok_or(DecodeError::OffsetOverflow { loc })?;
    let end = start
        .checked_add(len)
        .ok_or(DecodeError::OffsetOverflow { loc: start })?;
    buf.get(start..end).ok_or(DecodeError::OutOfBounds {
        loc: start,
        len,
        buffer_len: buf.len(),
    })
}

impl<'buf> Follow<'buf> for &'buf str {
    type Inner = &'buf str;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        let bytes = string_bytes(buf, loc)?;
        core::str::from_utf8(bytes)
            .ok()
            .ok_or(DecodeError::InvalidUtf8 { loc })
    }
}

/// A string read with invalid UTF-8 sequences replaced by U+FFFD.
#[derive(Debug)]
pub struct LossyStr;

impl<'buf> Follow<'buf> for LossyStr {
    type Inner = Cow<'buf, str>;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        string_bytes(buf, loc).map(String::from_utf8_lossy)
    }
}

/// The absolute position itself.
///
/// Used for payloads whose type is only known after inspecting a separate
/// tag, such as action records.
#[derive(Debug)]
pub struct Position;

impl<'buf> Follow<'buf> for Position {
    type Inner = usize;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        if loc >= buf.len() {
            return Err(DecodeError::OutOfBounds {
                loc,
                len: 1,
                buffer_len: buf.len(),
            });
        }
        Ok(loc)
    }
}
