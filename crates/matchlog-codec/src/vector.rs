//! Lazy, bounds-checked views over length-prefixed runs.
//!
//! A [`Vector`] is validated once at construction: the length prefix is
//! read and the whole element region is checked to lie inside the buffer.
//! Elements are decoded only when asked for. Elements that are themselves
//! references ([`ForwardsUOffset`](crate::ForwardsUOffset)) are chased and
//! bounds-checked on access.
//!
//! "Absent" and "empty" are different things: a table accessor returns
//! `None` for a vector field that was never written and `Some(v)` with
//! `v.is_empty()` for one written with zero elements.

use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::DecodeError;
use crate::follow::{Follow, Inline};
use crate::scalar::read_scalar;

/// A view over a length-prefixed vector of `T` elements.
pub struct Vector<'buf, T> {
    buf: &'buf [u8],
    /// Absolute position of the first element.
    start: usize,
    /// Authoritative element count.
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Vector<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Vector<'_, T> {}

impl<T> core::fmt::Debug for Vector<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Vector")
            .field("start", &self.start)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl<'buf, T: Inline<'buf>> Vector<'buf, T> {
    /// Open the vector whose length prefix sits at `loc`.
    pub fn init(buf: &'buf [u8], loc: usize) -> Result<Self, DecodeError> {
        let len = read_scalar::<u32>(buf, loc)?;
        let len = usize::try_from(len)
            .ok()
            .ok_or(DecodeError::OffsetOverflow { loc })?;
        let start = loc
            .checked_add(4)
            .ok_or(DecodeError::OffsetOverflow { loc })?;
        let byte_len = len
            .checked_mul(T::SIZE)
            .ok_or(DecodeError::OffsetOverflow { loc })?;
        let end = start
            .checked_add(byte_len)
            .ok_or(DecodeError::OffsetOverflow { loc: start })?;
        if end > buf.len() {
            return Err(DecodeError::OutOfBounds {
                loc: start,
                len: byte_len,
                buffer_len: buf.len(),
            });
        }
        Ok(Self {
            buf,
            start,
            len,
            _marker: PhantomData,
        })
    }

    /// Number of elements.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector has no elements.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Decode element `index`.
    pub fn get(&self, index: usize) -> Result<T::Inner, DecodeError> {
        if index >= self.len {
            return Err(DecodeError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        let loc = index
            .checked_mul(T::SIZE)
            .and_then(|rel| self.start.checked_add(rel))
            .ok_or(DecodeError::OffsetOverflow { loc: self.start })?;
        T::follow(self.buf, loc)
    }

    /// Iterate over all elements, each decoded independently.
    pub const fn iter(&self) -> VectorIter<'buf, T> {
        VectorIter {
            vector: *self,
            front: 0,
            back: self.len,
        }
    }

    /// Decode every element, stopping at the first failure.
    pub fn to_vec(&self) -> Result<Vec<T::Inner>, DecodeError> {
        self.iter().collect()
    }
}

impl<'buf> Vector<'buf, u8> {
    /// The raw element bytes.
    pub fn as_bytes(&self) -> &'buf [u8] {
        let end = self.start.saturating_add(self.len);
        self.buf.get(self.start..end).unwrap_or_default()
    }
}

impl<'buf, T: Inline<'buf>> Follow<'buf> for Vector<'buf, T> {
    type Inner = Self;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        Self::init(buf, loc)
    }
}

/// Iterator over a [`Vector`]'s decoded elements.
pub struct VectorIter<'buf, T> {
    vector: Vector<'buf, T>,
    front: usize,
    back: usize,
}

impl<'buf, T: Inline<'buf>> Iterator for VectorIter<'buf, T> {
    type Item = Result<T::Inner, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.vector.get(self.front);
        self.front = self.front.saturating_add(1);
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back.saturating_sub(self.front);
        (remaining, Some(remaining))
    }
}

impl<'buf, T: Inline<'buf>> DoubleEndedIterator for VectorIter<'buf, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back = self.back.saturating_sub(1);
        Some(self.vector.get(self.back))
    }
}

impl<'buf, T: Inline<'buf>> ExactSizeIterator for VectorIter<'buf, T> {}

impl<'buf, T: Inline<'buf>> FusedIterator for VectorIter<'buf, T> {}

impl<'buf, T: Inline<'buf>> IntoIterator for Vector<'buf, T> {
    type Item = Result<T::Inner, DecodeError>;
    type IntoIter = VectorIter<'buf, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ForwardsUOffset;

    /// `[3u32 len][10u16][20u16][30u16]`
    fn u16_vector() -> Vec<u8> {
        vec![3, 0, 0, 0, 10, 0, 20, 0, 30, 0]
    }

    #[test]
    fn elements_and_length() {
        let buf = u16_vector();
        let v = Vector::<u16>::init(&buf, 0).unwrap();
        assert_eq!(v.len(), 3);
        assert!(!v.is_empty());
        assert_eq!(v.get(1).ok(), Some(20));
        assert_eq!(v.to_vec().ok(), Some(vec![10, 20, 30]));
        let reversed: Vec<u16> = v.iter().rev().map(Result::unwrap).collect();
        assert_eq!(reversed, vec![30, 20, 10]);
    }

    #[test]
    fn index_past_length_is_an_error() {
        let buf = u16_vector();
        let v = Vector::<u16>::init(&buf, 0).unwrap();
        assert_eq!(
            v.get(3).err(),
            Some(DecodeError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn length_prefix_larger_than_buffer() {
        let mut buf = u16_vector();
        buf.truncate(8);
        let err = Vector::<u16>::init(&buf, 0).err();
        assert_eq!(
            err,
            Some(DecodeError::OutOfBounds {
                loc: 4,
                len: 6,
                buffer_len: 8
            })
        );
    }

    #[test]
    fn huge_length_does_not_overflow() {
        let buf = [0xFF, 0xFF, 0xFF, 0xFF];
        assert!(Vector::<u64>::init(&buf, 0).is_err());
    }

    #[test]
    fn empty_vector() {
        let buf = [0u8, 0, 0, 0];
        let v = Vector::<i32>::init(&buf, 0).unwrap();
        assert!(v.is_empty());
        assert_eq!(v.iter().count(), 0);
    }

    #[test]
    fn byte_vector_as_slice() {
        let buf = [3, 0, 0, 0, 7, 8, 9];
        let v = Vector::<u8>::init(&buf, 0).unwrap();
        assert_eq!(v.as_bytes(), &[7, 8, 9]);
    }

    #[test]
    fn offset_elements_are_chased() {
        // [1u32 len][uoffset 4 -> 8]["ok" string at 8]
        let buf = [1, 0, 0, 0, 4, 0, 0, 0, 2, 0, 0, 0, b'o', b'k', 0];
        let v = Vector::<ForwardsUOffset<&str>>::init(&buf, 0).unwrap();
        assert_eq!(v.get(0).ok(), Some("ok"));
    }
}
