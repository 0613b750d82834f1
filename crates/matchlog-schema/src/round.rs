//! One round of the match: every robot's turn plus team-level state.

use matchlog_codec::{Builder, DecodeError, ForwardsUOffset, Offset, TableMark, Vector};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::SchemaError;
use crate::object::{
    TableObject, add_optional_offset, decode_scalar_vector, decode_table_vector,
    encode_scalar_vector, encode_table_vector, table_view,
};
use crate::turn::{Turn, TurnView};
use crate::vec_table::{VecTable, VecTableView};

table_view!(
    /// Borrowed reader for a round.
    RoundView
);

impl<'buf> RoundView<'buf> {
    /// Slot of `team_ids`.
    pub const TEAM_IDS: u16 = 0;
    /// Slot of `team_resource_amounts`.
    pub const TEAM_RESOURCE_AMOUNTS: u16 = 1;
    /// Slot of `turns`.
    pub const TURNS: u16 = 2;
    /// Slot of `died_ids`.
    pub const DIED_IDS: u16 = 3;
    /// Slot of `round_id`.
    pub const ROUND_ID: u16 = 4;
    /// Slot of `died_locs`.
    pub const DIED_LOCS: u16 = 5;
    /// Number of slots.
    pub const FIELD_COUNT: u16 = 6;

    /// Teams whose resources are reported, co-indexed with
    /// [`team_resource_amounts`](Self::team_resource_amounts).
    pub fn team_ids(&self) -> Result<Option<Vector<'buf, i32>>, DecodeError> {
        self.table.get_vector(Self::TEAM_IDS)
    }

    /// Resources held by each team at the end of the round.
    pub fn team_resource_amounts(&self) -> Result<Option<Vector<'buf, i32>>, DecodeError> {
        self.table.get_vector(Self::TEAM_RESOURCE_AMOUNTS)
    }

    /// Every turn taken this round, in execution order.
    pub fn turns(
        &self,
    ) -> Result<Option<Vector<'buf, ForwardsUOffset<TurnView<'buf>>>>, DecodeError> {
        self.table.get_vector(Self::TURNS)
    }

    /// Robots that died this round.
    pub fn died_ids(&self) -> Result<Option<Vector<'buf, i32>>, DecodeError> {
        self.table.get_vector(Self::DIED_IDS)
    }

    /// Round number. Defaults to 0.
    pub fn round_id(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::ROUND_ID, 0)
    }

    /// Where the robots in [`died_ids`](Self::died_ids) died.
    pub fn died_locs(&self) -> Result<Option<VecTableView<'buf>>, DecodeError> {
        self.table.get_ref::<VecTableView<'buf>>(Self::DIED_LOCS)
    }
}

/// One round of the match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Round {
    /// Teams whose resources are reported.
    pub team_ids: Vec<i32>,
    /// Resources held by each team at the end of the round.
    pub team_resource_amounts: Vec<i32>,
    /// Every turn taken this round.
    pub turns: Vec<Turn>,
    /// Robots that died this round.
    pub died_ids: Vec<i32>,
    /// Round number.
    pub round_id: i32,
    /// Where the robots in `died_ids` died.
    pub died_locs: Option<VecTable>,
}

impl TableObject for Round {
    type View<'buf> = RoundView<'buf>;

    fn decode(view: RoundView<'_>) -> Result<Self, DecodeError> {
        type V<'a> = RoundView<'a>;
        Ok(Self {
            team_ids: decode_scalar_vector(&view.table, V::TEAM_IDS)?,
            team_resource_amounts: decode_scalar_vector(&view.table, V::TEAM_RESOURCE_AMOUNTS)?,
            turns: decode_table_vector(&view.table, V::TURNS)?,
            died_ids: decode_scalar_vector(&view.table, V::DIED_IDS)?,
            round_id: view.round_id()?,
            died_locs: view.died_locs()?.map(VecTable::decode).transpose()?,
        })
    }

    fn encode(&self, builder: &mut Builder) -> Result<Offset<TableMark>, SchemaError> {
        type V<'a> = RoundView<'a>;
        let team_ids = encode_scalar_vector(builder, &self.team_ids)?;
        let amounts = encode_scalar_vector(builder, &self.team_resource_amounts)?;
        let turns = encode_table_vector(builder, &self.turns)?;
        let died_ids = encode_scalar_vector(builder, &self.died_ids)?;
        let died_locs = self
            .died_locs
            .as_ref()
            .map(|locs| locs.encode(builder))
            .transpose()?;

        builder.start_table(V::FIELD_COUNT)?;
        add_optional_offset(builder, V::TEAM_IDS, team_ids)?;
        add_optional_offset(builder, V::TEAM_RESOURCE_AMOUNTS, amounts)?;
        add_optional_offset(builder, V::TURNS, turns)?;
        add_optional_offset(builder, V::DIED_IDS, died_ids)?;
        builder.add_scalar(V::ROUND_ID, self.round_id, 0)?;
        add_optional_offset(builder, V::DIED_LOCS, died_locs)?;
        Ok(builder.end_table()?)
    }
}
