//! Parallel coordinate arrays.
//!
//! A vec table stores a batch of points as two vectors, `xs` and `ys`,
//! co-indexed by convention. Nothing in the format forces the lengths to
//! agree. Each vector always reads back exactly as written, and paired
//! iteration stops at the shorter one, logging the mismatch.

use std::iter::FusedIterator;

use matchlog_codec::{Builder, DecodeError, Offset, TableMark, Vector};
use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use crate::SchemaError;
use crate::object::{
    TableObject, add_optional_offset, decode_scalar_vector, encode_scalar_vector, table_view,
};

table_view!(
    /// Borrowed reader for a vec table.
    VecTableView
);

impl<'buf> VecTableView<'buf> {
    /// Slot of `xs`.
    pub const XS: u16 = 0;
    /// Slot of `ys`.
    pub const YS: u16 = 1;
    /// Number of slots.
    pub const FIELD_COUNT: u16 = 2;

    /// The x coordinates, or `None` if never written.
    pub fn xs(&self) -> Result<Option<Vector<'buf, i32>>, DecodeError> {
        self.table.get_vector(Self::XS)
    }

    /// The y coordinates, or `None` if never written.
    pub fn ys(&self) -> Result<Option<Vector<'buf, i32>>, DecodeError> {
        self.table.get_vector(Self::YS)
    }

    /// Iterate over `(x, y)` pairs, clipped to the shorter vector.
    pub fn pairs(&self) -> Result<VecTablePairs<'buf>, DecodeError> {
        Ok(VecTablePairs::new(self.xs()?, self.ys()?))
    }
}

/// Iterator over the `(x, y)` pairs of a [`VecTableView`].
#[derive(Debug, Clone)]
pub struct VecTablePairs<'buf> {
    xs: Option<Vector<'buf, i32>>,
    ys: Option<Vector<'buf, i32>>,
    len: usize,
    next: usize,
}

impl<'buf> VecTablePairs<'buf> {
    fn new(xs: Option<Vector<'buf, i32>>, ys: Option<Vector<'buf, i32>>) -> Self {
        let x_len = xs.map_or(0, |v| v.len());
        let y_len = ys.map_or(0, |v| v.len());
        if x_len != y_len {
            warn!(
                xs = x_len,
                ys = y_len,
                "vec table coordinate vectors differ in length; clipping to the shorter"
            );
        }
        Self {
            xs,
            ys,
            len: x_len.min(y_len),
            next: 0,
        }
    }

    fn pair(&self, index: usize) -> Result<(i32, i32), DecodeError> {
        let (Some(xs), Some(ys)) = (self.xs, self.ys) else {
            return Err(DecodeError::IndexOutOfRange { index, len: 0 });
        };
        let x = xs.get(index)?;
        let y = ys.get(index)?;
        Ok((x, y))
    }
}

impl Iterator for VecTablePairs<'_> {
    type Item = Result<(i32, i32), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let item = self.pair(self.next);
        self.next = self.next.saturating_add(1);
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for VecTablePairs<'_> {}

impl FusedIterator for VecTablePairs<'_> {}

/// A batch of map points as parallel coordinate arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VecTable {
    /// X coordinates.
    pub xs: Vec<i32>,
    /// Y coordinates.
    pub ys: Vec<i32>,
}

impl VecTable {
    /// Build from a list of points.
    pub fn from_points(points: &[(i32, i32)]) -> Self {
        let (xs, ys) = points.iter().copied().unzip();
        Self { xs, ys }
    }

    /// The points, clipped to the shorter coordinate array.
    pub fn points(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }
}

impl TableObject for VecTable {
    type View<'buf> = VecTableView<'buf>;

    fn decode(view: VecTableView<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            xs: decode_scalar_vector(&view.table, VecTableView::XS)?,
            ys: decode_scalar_vector(&view.table, VecTableView::YS)?,
        })
    }

    fn encode(&self, builder: &mut Builder) -> Result<Offset<TableMark>, SchemaError> {
        let xs = encode_scalar_vector(builder, &self.xs)?;
        let ys = encode_scalar_vector(builder, &self.ys)?;
        builder.start_table(VecTableView::FIELD_COUNT)?;
        add_optional_offset(builder, VecTableView::XS, xs)?;
        add_optional_offset(builder, VecTableView::YS, ys)?;
        Ok(builder.end_table()?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use matchlog_codec::root_table;

    fn encode(table: &VecTable) -> Vec<u8> {
        let mut b = Builder::new();
        let root = table.encode(&mut b).unwrap();
        b.finish(root).unwrap();
        b.into_finished().unwrap()
    }

    #[test]
    fn paired_points() {
        let table = VecTable::from_points(&[(1, 2), (3, 4), (5, 6)]);
        let bytes = encode(&table);
        let view = VecTableView::from(root_table(&bytes).unwrap());
        let pairs: Vec<(i32, i32)> = view.pairs().unwrap().map(Result::unwrap).collect();
        assert_eq!(pairs, vec![(1, 2), (3, 4), (5, 6)]);
        assert_eq!(VecTable::decode(view).unwrap(), table);
    }

    #[test]
    fn mismatched_lengths_read_independently_and_clip() {
        let table = VecTable {
            xs: vec![1, 2, 3, 4],
            ys: vec![10, 20],
        };
        let bytes = encode(&table);
        let view = VecTableView::from(root_table(&bytes).unwrap());
        assert_eq!(view.xs().unwrap().unwrap().len(), 4);
        assert_eq!(view.ys().unwrap().unwrap().len(), 2);
        let pairs = view.pairs().unwrap();
        assert_eq!(pairs.len(), 2);
        let pairs: Vec<(i32, i32)> = pairs.map(Result::unwrap).collect();
        assert_eq!(pairs, vec![(1, 10), (2, 20)]);
        assert_eq!(VecTable::decode(view).unwrap(), table);
        assert_eq!(table.points().count(), 2);
    }

    #[test]
    fn absent_vectors() {
        let bytes = encode(&VecTable::default());
        let view = VecTableView::from(root_table(&bytes).unwrap());
        assert!(view.xs().unwrap().is_none());
        assert_eq!(view.pairs().unwrap().count(), 0);
        assert_eq!(VecTable::decode(view).unwrap(), VecTable::default());
    }

    #[test]
    fn one_vector_absent() {
        let table = VecTable {
            xs: vec![7],
            ys: Vec::new(),
        };
        let bytes = encode(&table);
        let view = VecTableView::from(root_table(&bytes).unwrap());
        assert_eq!(view.pairs().unwrap().count(), 0);
        assert_eq!(VecTable::decode(view).unwrap(), table);
    }
}
