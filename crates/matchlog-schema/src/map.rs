//! The static map a match is played on.
//!
//! Cell arrays are row-major, `width * height` entries long. A reader
//! should not assume that: a map with a short or missing `walls` vector
//! simply reports no walls for the missing cells.

use matchlog_codec::{Builder, DecodeError, Offset, TableMark, Vector};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::SchemaError;
use crate::object::{TableObject, add_optional_offset, encode_string, table_view};
use crate::vec_table::{VecTable, VecTableView};

table_view!(
    /// Borrowed reader for a game map.
    GameMapView
);

impl<'buf> GameMapView<'buf> {
    /// Slot of `name`.
    pub const NAME: u16 = 0;
    /// Slot of `width`.
    pub const WIDTH: u16 = 1;
    /// Slot of `height`.
    pub const HEIGHT: u16 = 2;
    /// Slot of `symmetry`.
    pub const SYMMETRY: u16 = 3;
    /// Slot of `random_seed`.
    pub const RANDOM_SEED: u16 = 4;
    /// Slot of `walls`.
    pub const WALLS: u16 = 5;
    /// Slot of `ruins`.
    pub const RUINS: u16 = 6;
    /// Number of slots.
    pub const FIELD_COUNT: u16 = 7;

    /// Map name, if any.
    pub fn name(&self) -> Result<Option<&'buf str>, DecodeError> {
        self.table.get_str(Self::NAME)
    }

    /// Width in cells. Defaults to 0.
    pub fn width(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::WIDTH, 0)
    }

    /// Height in cells. Defaults to 0.
    pub fn height(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::HEIGHT, 0)
    }

    /// Symmetry the map was generated with: 0 rotational, 1 horizontal,
    /// 2 vertical.
    pub fn symmetry(&self) -> Result<i8, DecodeError> {
        self.table.get(Self::SYMMETRY, 0)
    }

    /// Seed the engine used for this map.
    pub fn random_seed(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::RANDOM_SEED, 0)
    }

    /// One byte per cell, nonzero for a wall.
    pub fn walls(&self) -> Result<Option<Vector<'buf, u8>>, DecodeError> {
        self.table.get_vector(Self::WALLS)
    }

    /// Ruin locations.
    pub fn ruins(&self) -> Result<Option<VecTableView<'buf>>, DecodeError> {
        self.table.get_ref::<VecTableView<'buf>>(Self::RUINS)
    }

    /// Whether the cell at `(x, y)` is a wall. Cells outside the map or
    /// past the end of the wall vector are open.
    pub fn is_wall(&self, x: i32, y: i32) -> Result<bool, DecodeError> {
        let width = self.width()?;
        if x < 0 || y < 0 || x >= width || y >= self.height()? {
            return Ok(false);
        }
        let Some(walls) = self.walls()? else {
            return Ok(false);
        };
        let index = y
            .checked_mul(width)
            .and_then(|row| row.checked_add(x))
            .and_then(|i| usize::try_from(i).ok())
            .ok_or(DecodeError::OffsetOverflow {
                loc: self.table.loc(),
            })?;
        if index >= walls.len() {
            return Ok(false);
        }
        Ok(walls.get(index)? != 0)
    }
}

/// A match map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameMap {
    /// Map name.
    pub name: Option<String>,
    /// Width in cells.
    pub width: i32,
    /// Height in cells.
    pub height: i32,
    /// Symmetry the map was generated with.
    pub symmetry: i8,
    /// Seed the engine used for this map.
    pub random_seed: i32,
    /// One byte per cell, row-major, nonzero for a wall.
    pub walls: Vec<u8>,
    /// Ruin locations.
    pub ruins: Option<VecTable>,
}

impl TableObject for GameMap {
    type View<'buf> = GameMapView<'buf>;

    fn decode(view: GameMapView<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            name: view.name()?.map(str::to_owned),
            width: view.width()?,
            height: view.height()?,
            symmetry: view.symmetry()?,
            random_seed: view.random_seed()?,
            walls: view
                .walls()?
                .map_or_else(|| Ok(Vec::new()), |v| v.to_vec())?,
            ruins: view.ruins()?.map(VecTable::decode).transpose()?,
        })
    }

    fn encode(&self, builder: &mut Builder) -> Result<Offset<TableMark>, SchemaError> {
        type V<'a> = GameMapView<'a>;
        let name = encode_string(builder, self.name.as_deref())?;
        let walls = if self.walls.is_empty() {
            None
        } else {
            Some(builder.create_vector(&self.walls)?)
        };
        let ruins = self
            .ruins
            .as_ref()
            .map(|r| r.encode(builder))
            .transpose()?;

        builder.start_table(V::FIELD_COUNT)?;
        add_optional_offset(builder, V::NAME, name)?;
        builder.add_scalar(V::WIDTH, self.width, 0)?;
        builder.add_scalar(V::HEIGHT, self.height, 0)?;
        builder.add_scalar(V::SYMMETRY, self.symmetry, 0)?;
        builder.add_scalar(V::RANDOM_SEED, self.random_seed, 0)?;
        add_optional_offset(builder, V::WALLS, walls)?;
        add_optional_offset(builder, V::RUINS, ruins)?;
        Ok(builder.end_table()?)
    }
}
