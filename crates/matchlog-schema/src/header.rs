//! The game header: written once at the start of every match.
//!
//! ```text
//! GameHeader
//! ├── spec_version: string
//! ├── teams: [TeamData]
//! ├── robot_type_metadata: [RobotTypeMetadata]
//! └── constants: GameplayConstants
//! ```
//!
//! Every field is optional on read. An absent vector decodes to an empty
//! `Vec` and an absent nested table to `None`.

use matchlog_codec::{Builder, DecodeError, ForwardsUOffset, Offset, TableMark, Vector};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::SchemaError;
use crate::object::{
    TableObject, add_optional_offset, decode_table_vector, encode_string, encode_table_vector,
    table_view,
};

// ---------------------------------------------------------------------------
// TeamData
// ---------------------------------------------------------------------------

table_view!(
    /// Borrowed reader for a team entry.
    TeamDataView
);

impl<'buf> TeamDataView<'buf> {
    /// Slot of `name`.
    pub const NAME: u16 = 0;
    /// Slot of `package_name`.
    pub const PACKAGE_NAME: u16 = 1;
    /// Slot of `team_id`.
    pub const TEAM_ID: u16 = 2;
    /// Number of slots.
    pub const FIELD_COUNT: u16 = 3;

    /// Display name of the team.
    pub fn name(&self) -> Result<Option<&'buf str>, DecodeError> {
        self.table.get_str(Self::NAME)
    }

    /// Package the team's player code was loaded from.
    pub fn package_name(&self) -> Result<Option<&'buf str>, DecodeError> {
        self.table.get_str(Self::PACKAGE_NAME)
    }

    /// Numeric team id. Defaults to 0.
    pub fn team_id(&self) -> Result<i8, DecodeError> {
        self.table.get(Self::TEAM_ID, 0)
    }
}

/// One participating team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TeamData {
    /// Display name.
    pub name: Option<String>,
    /// Package the player code was loaded from.
    pub package_name: Option<String>,
    /// Numeric team id.
    pub team_id: i8,
}

impl TableObject for TeamData {
    type View<'buf> = TeamDataView<'buf>;

    fn decode(view: TeamDataView<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            name: view.name()?.map(str::to_owned),
            package_name: view.package_name()?.map(str::to_owned),
            team_id: view.team_id()?,
        })
    }

    fn encode(&self, builder: &mut Builder) -> Result<Offset<TableMark>, SchemaError> {
        let name = encode_string(builder, self.name.as_deref())?;
        let package_name = encode_string(builder, self.package_name.as_deref())?;
        builder.start_table(TeamDataView::FIELD_COUNT)?;
        add_optional_offset(builder, TeamDataView::NAME, name)?;
        add_optional_offset(builder, TeamDataView::PACKAGE_NAME, package_name)?;
        builder.add_scalar(TeamDataView::TEAM_ID, self.team_id, 0)?;
        Ok(builder.end_table()?)
    }
}

// ---------------------------------------------------------------------------
// RobotTypeMetadata
// ---------------------------------------------------------------------------

table_view!(
    /// Borrowed reader for one robot type's base statistics.
    RobotTypeMetadataView
);

impl RobotTypeMetadataView<'_> {
    /// Slot of `robot_type`.
    pub const ROBOT_TYPE: u16 = 0;
    /// Slot of `action_cooldown`.
    pub const ACTION_COOLDOWN: u16 = 1;
    /// Slot of `action_radius_squared`.
    pub const ACTION_RADIUS_SQUARED: u16 = 2;
    /// Slot of `base_health`.
    pub const BASE_HEALTH: u16 = 3;
    /// Slot of `base_paint`.
    pub const BASE_PAINT: u16 = 4;
    /// Slot of `bytecode_limit`.
    pub const BYTECODE_LIMIT: u16 = 5;
    /// Slot of `movement_cooldown`.
    pub const MOVEMENT_COOLDOWN: u16 = 6;
    /// Slot of `vision_radius_squared`.
    pub const VISION_RADIUS_SQUARED: u16 = 7;
    /// Slot of `message_radius_squared`.
    pub const MESSAGE_RADIUS_SQUARED: u16 = 8;
    /// Number of slots.
    pub const FIELD_COUNT: u16 = 9;

    /// Robot type tag.
    pub fn robot_type(&self) -> Result<i8, DecodeError> {
        self.table.get(Self::ROBOT_TYPE, 0)
    }

    /// Turns between actions.
    pub fn action_cooldown(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::ACTION_COOLDOWN, 0)
    }

    /// Squared action range.
    pub fn action_radius_squared(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::ACTION_RADIUS_SQUARED, 0)
    }

    /// Starting health.
    pub fn base_health(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::BASE_HEALTH, 0)
    }

    /// Starting paint.
    pub fn base_paint(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::BASE_PAINT, 0)
    }

    /// Bytecodes available per turn.
    pub fn bytecode_limit(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::BYTECODE_LIMIT, 0)
    }

    /// Turns between moves.
    pub fn movement_cooldown(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::MOVEMENT_COOLDOWN, 0)
    }

    /// Squared vision range.
    pub fn vision_radius_squared(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::VISION_RADIUS_SQUARED, 0)
    }

    /// Squared messaging range.
    pub fn message_radius_squared(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::MESSAGE_RADIUS_SQUARED, 0)
    }
}

/// Base statistics of one robot type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RobotTypeMetadata {
    /// Robot type tag.
    pub robot_type: i8,
    /// Turns between actions.
    pub action_cooldown: i32,
    /// Squared action range.
    pub action_radius_squared: i32,
    /// Starting health.
    pub base_health: i32,
    /// Starting paint.
    pub base_paint: i32,
    /// Bytecodes available per turn.
    pub bytecode_limit: i32,
    /// Turns between moves.
    pub movement_cooldown: i32,
    /// Squared vision range.
    pub vision_radius_squared: i32,
    /// Squared messaging range.
    pub message_radius_squared: i32,
}

impl TableObject for RobotTypeMetadata {
    type View<'buf> = RobotTypeMetadataView<'buf>;

    fn decode(view: RobotTypeMetadataView<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            robot_type: view.robot_type()?,
            action_cooldown: view.action_cooldown()?,
            action_radius_squared: view.action_radius_squared()?,
            base_health: view.base_health()?,
            base_paint: view.base_paint()?,
            bytecode_limit: view.bytecode_limit()?,
            movement_cooldown: view.movement_cooldown()?,
            vision_radius_squared: view.vision_radius_squared()?,
            message_radius_squared: view.message_radius_squared()?,
        })
    }

    fn encode(&self, builder: &mut Builder) -> Result<Offset<TableMark>, SchemaError> {
        type V<'a> = RobotTypeMetadataView<'a>;
        builder.start_table(V::FIELD_COUNT)?;
        builder.add_scalar(V::ROBOT_TYPE, self.robot_type, 0)?;
        builder.add_scalar(V::ACTION_COOLDOWN, self.action_cooldown, 0)?;
        builder.add_scalar(V::ACTION_RADIUS_SQUARED, self.action_radius_squared, 0)?;
        builder.add_scalar(V::BASE_HEALTH, self.base_health, 0)?;
        builder.add_scalar(V::BASE_PAINT, self.base_paint, 0)?;
        builder.add_scalar(V::BYTECODE_LIMIT, self.bytecode_limit, 0)?;
        builder.add_scalar(V::MOVEMENT_COOLDOWN, self.movement_cooldown, 0)?;
        builder.add_scalar(V::VISION_RADIUS_SQUARED, self.vision_radius_squared, 0)?;
        builder.add_scalar(V::MESSAGE_RADIUS_SQUARED, self.message_radius_squared, 0)?;
        Ok(builder.end_table()?)
    }
}

// ---------------------------------------------------------------------------
// GameplayConstants
// ---------------------------------------------------------------------------

table_view!(
    /// Borrowed reader for the match-wide constants.
    GameplayConstantsView
);

impl GameplayConstantsView<'_> {
    /// Slot of `max_rounds`.
    pub const MAX_ROUNDS: u16 = 0;
    /// Slot of `min_map_dimension`.
    pub const MIN_MAP_DIMENSION: u16 = 1;
    /// Slot of `max_map_dimension`.
    pub const MAX_MAP_DIMENSION: u16 = 2;
    /// Slot of `initial_team_resources`.
    pub const INITIAL_TEAM_RESOURCES: u16 = 3;
    /// Number of slots.
    pub const FIELD_COUNT: u16 = 4;

    /// Round limit of the match.
    pub fn max_rounds(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::MAX_ROUNDS, 0)
    }

    /// Smallest allowed map side.
    pub fn min_map_dimension(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::MIN_MAP_DIMENSION, 0)
    }

    /// Largest allowed map side.
    pub fn max_map_dimension(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::MAX_MAP_DIMENSION, 0)
    }

    /// Resources each team starts with.
    pub fn initial_team_resources(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::INITIAL_TEAM_RESOURCES, 0)
    }
}

/// Match-wide constants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameplayConstants {
    /// Round limit of the match.
    pub max_rounds: i32,
    /// Smallest allowed map side.
    pub min_map_dimension: i32,
    /// Largest allowed map side.
    pub max_map_dimension: i32,
    /// Resources each team starts with.
    pub initial_team_resources: i32,
}

impl TableObject for GameplayConstants {
    type View<'buf> = GameplayConstantsView<'buf>;

    fn decode(view: GameplayConstantsView<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            max_rounds: view.max_rounds()?,
            min_map_dimension: view.min_map_dimension()?,
            max_map_dimension: view.max_map_dimension()?,
            initial_team_resources: view.initial_team_resources()?,
        })
    }

    fn encode(&self, builder: &mut Builder) -> Result<Offset<TableMark>, SchemaError> {
        type V<'a> = GameplayConstantsView<'a>;
        builder.start_table(V::FIELD_COUNT)?;
        builder.add_scalar(V::MAX_ROUNDS, self.max_rounds, 0)?;
        builder.add_scalar(V::MIN_MAP_DIMENSION, self.min_map_dimension, 0)?;
        builder.add_scalar(V::MAX_MAP_DIMENSION, self.max_map_dimension, 0)?;
        builder.add_scalar(V::INITIAL_TEAM_RESOURCES, self.initial_team_resources, 0)?;
        Ok(builder.end_table()?)
    }
}

// ---------------------------------------------------------------------------
// GameHeader
// ---------------------------------------------------------------------------

table_view!(
    /// Borrowed reader for the game header.
    GameHeaderView
);

impl<'buf> GameHeaderView<'buf> {
    /// Slot of `spec_version`.
    pub const SPEC_VERSION: u16 = 0;
    /// Slot of `teams`.
    pub const TEAMS: u16 = 1;
    /// Slot of `robot_type_metadata`.
    pub const ROBOT_TYPE_METADATA: u16 = 2;
    /// Slot of `constants`.
    pub const CONSTANTS: u16 = 3;
    /// Number of slots.
    pub const FIELD_COUNT: u16 = 4;

    /// Version of the replay format the writer targeted.
    pub fn spec_version(&self) -> Result<Option<&'buf str>, DecodeError> {
        self.table.get_str(Self::SPEC_VERSION)
    }

    /// Participating teams.
    pub fn teams(
        &self,
    ) -> Result<Option<Vector<'buf, ForwardsUOffset<TeamDataView<'buf>>>>, DecodeError> {
        self.table.get_vector(Self::TEAMS)
    }

    /// Base statistics per robot type.
    pub fn robot_type_metadata(
        &self,
    ) -> Result<Option<Vector<'buf, ForwardsUOffset<RobotTypeMetadataView<'buf>>>>, DecodeError>
    {
        self.table.get_vector(Self::ROBOT_TYPE_METADATA)
    }

    /// Match-wide constants.
    pub fn constants(&self) -> Result<Option<GameplayConstantsView<'buf>>, DecodeError> {
        self.table.get_ref::<GameplayConstantsView<'buf>>(Self::CONSTANTS)
    }
}

/// Header written at the start of every match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameHeader {
    /// Version of the replay format the writer targeted.
    pub spec_version: Option<String>,
    /// Participating teams.
    pub teams: Vec<TeamData>,
    /// Base statistics per robot type.
    pub robot_type_metadata: Vec<RobotTypeMetadata>,
    /// Match-wide constants.
    pub constants: Option<GameplayConstants>,
}

impl TableObject for GameHeader {
    type View<'buf> = GameHeaderView<'buf>;

    fn decode(view: GameHeaderView<'_>) -> Result<Self, DecodeError> {
        type V<'a> = GameHeaderView<'a>;
        Ok(Self {
            spec_version: view.spec_version()?.map(str::to_owned),
            teams: decode_table_vector(&view.table, V::TEAMS)?,
            robot_type_metadata: decode_table_vector(&view.table, V::ROBOT_TYPE_METADATA)?,
            constants: view
                .constants()?
                .map(GameplayConstants::decode)
                .transpose()?,
        })
    }

    fn encode(&self, builder: &mut Builder) -> Result<Offset<TableMark>, SchemaError> {
        type V<'a> = GameHeaderView<'a>;
        let spec_version = encode_string(builder, self.spec_version.as_deref())?;
        let teams = encode_table_vector(builder, &self.teams)?;
        let robot_types = encode_table_vector(builder, &self.robot_type_metadata)?;
        let constants = self
            .constants
            .map(|c| c.encode(builder))
            .transpose()?;

        builder.start_table(V::FIELD_COUNT)?;
        add_optional_offset(builder, V::SPEC_VERSION, spec_version)?;
        add_optional_offset(builder, V::TEAMS, teams)?;
        add_optional_offset(builder, V::ROBOT_TYPE_METADATA, robot_types)?;
        add_optional_offset(builder, V::CONSTANTS, constants)?;
        Ok(builder.end_table()?)
    }
}
