//! Fixed-width little-endian scalars.
//!
//! Every scalar stored in a buffer, whether inline in a table, as a vector
//! element, or as a member of a fixed-layout struct, goes through
//! [`Scalar`]. Reads never index directly: they slice with `get` and report
//! [`DecodeError::OutOfBounds`] when the slice would cross the buffer end.

use crate::DecodeError;

/// A fixed-width value with a little-endian wire representation.
///
/// Scalars are aligned to their own size when written by the
/// [`Builder`](crate::Builder).
pub trait Scalar: Copy + PartialEq + core::fmt::Debug + Send + Sync + 'static {
    /// Width in bytes. Also the natural alignment.
    const SIZE: usize;

    /// Decode from exactly [`Self::SIZE`] bytes.
    ///
    /// Returns `None` if `bytes` has the wrong length.
    fn from_le_slice(bytes: &[u8]) -> Option<Self>;

    /// Encode into exactly [`Self::SIZE`] bytes.
    ///
    /// Returns `None` if `out` has the wrong length.
    fn write_le(self, out: &mut [u8]) -> Option<()>;
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const SIZE: usize = core::mem::size_of::<$ty>();

                fn from_le_slice(bytes: &[u8]) -> Option<Self> {
                    bytes.try_into().ok().map(<$ty>::from_le_bytes)
                }

                fn write_le(self, out: &mut [u8]) -> Option<()> {
                    let dst: &mut [u8; core::mem::size_of::<$ty>()] = out.try_into().ok()?;
                    *dst = self.to_le_bytes();
                    Some(())
                }
            }
        )*
    };
}

impl_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Scalar for bool {
    const SIZE: usize = 1;

    fn from_le_slice(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [b] => Some(*b != 0),
            _ => None,
        }
    }

    fn write_le(self, out: &mut [u8]) -> Option<()> {
        match out {
            [b] => {
                *b = u8::from(self);
                Some(())
            }
            _ => None,
        }
    }
}

/// Read a scalar at absolute position `loc`, bounds-checked.
pub fn read_scalar<T: Scalar>(buf: &[u8], loc: usize) -> Result<T, DecodeError> {
    let end = loc
        .checked_add(T::SIZE)
        .ok_or(DecodeError::OffsetOverflow { loc })?;
    buf.get(loc..end)
        .and_then(T::from_le_slice)
        .ok_or(DecodeError::OutOfBounds {
            loc,
            len: T::SIZE,
            buffer_len: buf.len(),
        })
}

/// Write `value` at byte `at` of a fixed-layout record.
///
/// Returns `None` if the field does not fit in `out`.
pub fn put_field<T: Scalar>(out: &mut [u8], at: usize, value: T) -> Option<()> {
    let end = at.checked_add(T::SIZE)?;
    value.write_le(out.get_mut(at..end)?)
}

/// Read a field at byte `at` of a fixed-layout record.
///
/// Returns `None` if the field does not fit in `bytes`.
pub fn take_field<T: Scalar>(bytes: &[u8], at: usize) -> Option<T> {
    let end = at.checked_add(T::SIZE)?;
    T::from_le_slice(bytes.get(at..end)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_wire_widths() {
        assert_eq!(<u8 as Scalar>::SIZE, 1);
        assert_eq!(<i16 as Scalar>::SIZE, 2);
        assert_eq!(<u32 as Scalar>::SIZE, 4);
        assert_eq!(<i64 as Scalar>::SIZE, 8);
        assert_eq!(<f32 as Scalar>::SIZE, 4);
        assert_eq!(<bool as Scalar>::SIZE, 1);
    }

    #[test]
    fn little_endian_layout() {
        let mut out = [0u8; 4];
        assert!(0x0102_0304_u32.write_le(&mut out).is_some());
        assert_eq!(out, [0x04, 0x03, 0x02, 0x01]);
        assert_eq!(u32::from_le_slice(&out), Some(0x0102_0304));
    }

    #[test]
    fn wrong_width_is_rejected() {
        assert_eq!(u16::from_le_slice(&[1, 2, 3]), None);
        let mut out = [0u8; 3];
        assert!(7_i32.write_le(&mut out).is_none());
    }

    #[test]
    fn read_past_end_reports_bounds() {
        let buf = [1u8, 2, 3];
        let err = read_scalar::<u32>(&buf, 0).err();
        assert_eq!(
            err,
            Some(DecodeError::OutOfBounds {
                loc: 0,
                len: 4,
                buffer_len: 3
            })
        );
        assert_eq!(read_scalar::<u16>(&buf, 1).ok(), Some(0x0302));
    }

    #[test]
    fn read_at_overflowing_position() {
        let buf = [0u8; 4];
        let err = read_scalar::<u32>(&buf, usize::MAX).err();
        assert_eq!(err, Some(DecodeError::OffsetOverflow { loc: usize::MAX }));
    }

    #[test]
    fn field_helpers_respect_record_bounds() {
        let mut record = [0u8; 6];
        assert!(put_field(&mut record, 2, -5_i16).is_some());
        assert!(put_field(&mut record, 5, 1_u16).is_none());
        assert_eq!(take_field::<i16>(&record, 2), Some(-5));
        assert_eq!(take_field::<u32>(&record, 4), None);
    }

    #[test]
    fn bool_round_trip() {
        let mut out = [0u8; 1];
        assert!(true.write_le(&mut out).is_some());
        assert_eq!(out, [1]);
        assert!(bool::from_le_slice(&[2]).unwrap());
        assert!(!bool::from_le_slice(&[0]).unwrap());
    }
}
