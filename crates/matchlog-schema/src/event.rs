//! The replay event stream and its root.
//!
//! A replay is a [`GameWrapper`] holding an ordered list of event
//! wrappers. Each wrapper is a one-member union: a tag byte and an offset
//! to the event table it selects.
//!
//! | Tag | Event |
//! |-----|-------|
//! | 1 | [`GameHeader`] |
//! | 2 | [`GameFooter`] |
//! | 3 | [`Round`] |
//! | 4 | [`MatchHeader`] |
//! | 5 | [`MatchFooter`] |
//!
//! One game is a series of matches between the same teams:
//!
//! ```text
//! GameHeader (MatchHeader Round* MatchFooter)* GameFooter
//! ```
//!
//! Like actions, events with an unrecognized tag (or a missing payload)
//! decode to [`Event::Unknown`] instead of failing the stream.

use matchlog_codec::{
    Builder, BuilderConfig, DecodeError, ForwardsUOffset, Offset, Table, TableMark, Vector,
    root_table,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::SchemaError;
use crate::header::{GameHeader, GameHeaderView};
use crate::map::{GameMap, GameMapView};
use crate::object::{
    TableObject, add_optional_offset, decode_table_vector, encode_table_vector, table_view,
};
use crate::round::{Round, RoundView};

// ---------------------------------------------------------------------------
// GameFooter
// ---------------------------------------------------------------------------

table_view!(
    /// Borrowed reader for the game footer.
    GameFooterView
);

impl GameFooterView<'_> {
    /// Slot of `winner`.
    pub const WINNER: u16 = 0;
    /// Number of slots.
    pub const FIELD_COUNT: u16 = 1;

    /// Id of the team that won the game. Defaults to 0.
    pub fn winner(&self) -> Result<i8, DecodeError> {
        self.table.get(Self::WINNER, 0)
    }
}

/// Footer written once, after the last match of the game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameFooter {
    /// Id of the team that won the game.
    pub winner: i8,
}

impl TableObject for GameFooter {
    type View<'buf> = GameFooterView<'buf>;

    fn decode(view: GameFooterView<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            winner: view.winner()?,
        })
    }

    fn encode(&self, builder: &mut Builder) -> Result<Offset<TableMark>, SchemaError> {
        builder.start_table(GameFooterView::FIELD_COUNT)?;
        builder.add_scalar(GameFooterView::WINNER, self.winner, 0)?;
        Ok(builder.end_table()?)
    }
}

// ---------------------------------------------------------------------------
// MatchHeader / MatchFooter
// ---------------------------------------------------------------------------

table_view!(
    /// Borrowed reader for a match header.
    MatchHeaderView
);

impl<'buf> MatchHeaderView<'buf> {
    /// Slot of `map`.
    pub const MAP: u16 = 0;
    /// Slot of `max_rounds`.
    pub const MAX_ROUNDS: u16 = 1;
    /// Number of slots.
    pub const FIELD_COUNT: u16 = 2;

    /// The map this match is played on.
    pub fn map(&self) -> Result<Option<GameMapView<'buf>>, DecodeError> {
        self.table.get_ref::<GameMapView<'buf>>(Self::MAP)
    }

    /// Round limit for this match. Defaults to 0.
    pub fn max_rounds(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::MAX_ROUNDS, 0)
    }
}

/// Header written at the start of each match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MatchHeader {
    /// The map this match is played on.
    pub map: Option<GameMap>,
    /// Round limit for this match.
    pub max_rounds: i32,
}

impl TableObject for MatchHeader {
    type View<'buf> = MatchHeaderView<'buf>;

    fn decode(view: MatchHeaderView<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            map: view.map()?.map(GameMap::decode).transpose()?,
            max_rounds: view.max_rounds()?,
        })
    }

    fn encode(&self, builder: &mut Builder) -> Result<Offset<TableMark>, SchemaError> {
        let map = self.map.as_ref().map(|m| m.encode(builder)).transpose()?;
        builder.start_table(MatchHeaderView::FIELD_COUNT)?;
        add_optional_offset(builder, MatchHeaderView::MAP, map)?;
        builder.add_scalar(MatchHeaderView::MAX_ROUNDS, self.max_rounds, 0)?;
        Ok(builder.end_table()?)
    }
}

table_view!(
    /// Borrowed reader for a match footer.
    MatchFooterView
);

impl MatchFooterView<'_> {
    /// Slot of `winner`.
    pub const WINNER: u16 = 0;
    /// Slot of `total_rounds`.
    pub const TOTAL_ROUNDS: u16 = 1;
    /// Number of slots.
    pub const FIELD_COUNT: u16 = 2;

    /// Id of the team that won the match. Defaults to 0.
    pub fn winner(&self) -> Result<i8, DecodeError> {
        self.table.get(Self::WINNER, 0)
    }

    /// Rounds actually played. Defaults to 0.
    pub fn total_rounds(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::TOTAL_ROUNDS, 0)
    }
}

/// Footer written when a match ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MatchFooter {
    /// Id of the team that won the match.
    pub winner: i8,
    /// Rounds actually played.
    pub total_rounds: i32,
}

impl TableObject for MatchFooter {
    type View<'buf> = MatchFooterView<'buf>;

    fn decode(view: MatchFooterView<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            winner: view.winner()?,
            total_rounds: view.total_rounds()?,
        })
    }

    fn encode(&self, builder: &mut Builder) -> Result<Offset<TableMark>, SchemaError> {
        builder.start_table(MatchFooterView::FIELD_COUNT)?;
        builder.add_scalar(MatchFooterView::WINNER, self.winner, 0)?;
        builder.add_scalar(MatchFooterView::TOTAL_ROUNDS, self.total_rounds, 0)?;
        Ok(builder.end_table()?)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Tag of a [`GameHeader`] event.
pub const EVENT_GAME_HEADER: u8 = 1;
/// Tag of a [`GameFooter`] event.
pub const EVENT_GAME_FOOTER: u8 = 2;
/// Tag of a [`Round`] event.
pub const EVENT_ROUND: u8 = 3;
/// Tag of a [`MatchHeader`] event.
pub const EVENT_MATCH_HEADER: u8 = 4;
/// Tag of a [`MatchFooter`] event.
pub const EVENT_MATCH_FOOTER: u8 = 5;

/// The event selected by an event wrapper, still borrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventView<'buf> {
    /// Tag 1.
    GameHeader(GameHeaderView<'buf>),
    /// Tag 2.
    GameFooter(GameFooterView<'buf>),
    /// Tag 3.
    Round(RoundView<'buf>),
    /// Tag 4.
    MatchHeader(MatchHeaderView<'buf>),
    /// Tag 5.
    MatchFooter(MatchFooterView<'buf>),
    /// An unrecognized tag, or a wrapper with no payload.
    Unknown {
        /// The tag as stored.
        tag: u8,
    },
}

table_view!(
    /// Borrowed reader for an event wrapper.
    EventWrapperView
);

impl<'buf> EventWrapperView<'buf> {
    /// Slot of the event tag.
    pub const E_TYPE: u16 = 0;
    /// Slot of the event payload.
    pub const E: u16 = 1;
    /// Number of slots.
    pub const FIELD_COUNT: u16 = 2;

    /// The event tag. 0 when absent.
    pub fn e_type(&self) -> Result<u8, DecodeError> {
        self.table.get(Self::E_TYPE, 0)
    }

    /// Resolve the payload according to the tag.
    pub fn event(&self) -> Result<EventView<'buf>, DecodeError> {
        let tag = self.e_type()?;
        let Some(payload) = self.table.get_ref::<Table<'buf>>(Self::E)? else {
            debug!(tag, "event wrapper without payload");
            return Ok(EventView::Unknown { tag });
        };
        Ok(match tag {
            EVENT_GAME_HEADER => EventView::GameHeader(payload.into()),
            EVENT_GAME_FOOTER => EventView::GameFooter(payload.into()),
            EVENT_ROUND => EventView::Round(payload.into()),
            EVENT_MATCH_HEADER => EventView::MatchHeader(payload.into()),
            EVENT_MATCH_FOOTER => EventView::MatchFooter(payload.into()),
            _ => {
                debug!(tag, "unknown event tag");
                EventView::Unknown { tag }
            }
        })
    }
}

/// One entry of the replay event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Event {
    /// Game start.
    GameHeader(GameHeader),
    /// Game end.
    GameFooter(GameFooter),
    /// One round.
    Round(Round),
    /// Match start.
    MatchHeader(MatchHeader),
    /// Match end.
    MatchFooter(MatchFooter),
    /// An event this reader has no decoder for.
    Unknown {
        /// The tag as stored.
        tag: u8,
    },
}

impl Event {
    /// The tag stored in the event wrapper.
    pub const fn tag(&self) -> u8 {
        match self {
            Self::GameHeader(_) => EVENT_GAME_HEADER,
            Self::GameFooter(_) => EVENT_GAME_FOOTER,
            Self::Round(_) => EVENT_ROUND,
            Self::MatchHeader(_) => EVENT_MATCH_HEADER,
            Self::MatchFooter(_) => EVENT_MATCH_FOOTER,
            Self::Unknown { tag } => *tag,
        }
    }
}

impl TableObject for Event {
    type View<'buf> = EventWrapperView<'buf>;

    fn decode(view: EventWrapperView<'_>) -> Result<Self, DecodeError> {
        Ok(match view.event()? {
            EventView::GameHeader(v) => Self::GameHeader(GameHeader::decode(v)?),
            EventView::GameFooter(v) => Self::GameFooter(GameFooter::decode(v)?),
            EventView::Round(v) => Self::Round(Round::decode(v)?),
            EventView::MatchHeader(v) => Self::MatchHeader(MatchHeader::decode(v)?),
            EventView::MatchFooter(v) => Self::MatchFooter(MatchFooter::decode(v)?),
            EventView::Unknown { tag } => Self::Unknown { tag },
        })
    }

    /// Writes the event table, then the wrapper around it.
    fn encode(&self, builder: &mut Builder) -> Result<Offset<TableMark>, SchemaError> {
        let payload = match self {
            Self::GameHeader(e) => e.encode(builder)?,
            Self::GameFooter(e) => e.encode(builder)?,
            Self::Round(e) => e.encode(builder)?,
            Self::MatchHeader(e) => e.encode(builder)?,
            Self::MatchFooter(e) => e.encode(builder)?,
            Self::Unknown { tag } => return Err(SchemaError::UnencodableEvent { tag: *tag }),
        };
        builder.start_table(EventWrapperView::FIELD_COUNT)?;
        builder.add_scalar(EventWrapperView::E_TYPE, self.tag(), 0)?;
        builder.add_offset(EventWrapperView::E, payload)?;
        Ok(builder.end_table()?)
    }
}

// ---------------------------------------------------------------------------
// GameWrapper
// ---------------------------------------------------------------------------

table_view!(
    /// Borrowed reader for the replay root.
    GameWrapperView
);

impl<'buf> GameWrapperView<'buf> {
    /// Slot of `events`.
    pub const EVENTS: u16 = 0;
    /// Number of slots.
    pub const FIELD_COUNT: u16 = 1;

    /// Open the root table of a finished replay buffer.
    pub fn root(buf: &'buf [u8]) -> Result<Self, DecodeError> {
        root_table(buf).map(Self::from)
    }

    /// The event stream, in order.
    pub fn events(
        &self,
    ) -> Result<Option<Vector<'buf, ForwardsUOffset<EventWrapperView<'buf>>>>, DecodeError> {
        self.table.get_vector(Self::EVENTS)
    }
}

/// A whole replay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameWrapper {
    /// The event stream, in order.
    pub events: Vec<Event>,
}

impl GameWrapper {
    /// Encode into a finished buffer with the default builder settings.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if any event cannot be encoded.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SchemaError> {
        self.to_bytes_with(&BuilderConfig::default())
    }

    /// Encode into a finished buffer with explicit builder settings.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if any event cannot be encoded or the
    /// buffer would exceed the configured maximum size.
    pub fn to_bytes_with(&self, config: &BuilderConfig) -> Result<Vec<u8>, SchemaError> {
        let mut builder = Builder::with_config(config);
        let root = self.encode(&mut builder)?;
        builder.finish(root)?;
        Ok(builder.into_finished()?)
    }

    /// Decode a whole replay.
    ///
    /// # Errors
    ///
    /// Returns the first [`DecodeError`] met anywhere in the buffer.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, DecodeError> {
        Self::decode(GameWrapperView::root(buf)?)
    }
}

impl TableObject for GameWrapper {
    type View<'buf> = GameWrapperView<'buf>;

    fn decode(view: GameWrapperView<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            events: decode_table_vector(&view.table, GameWrapperView::EVENTS)?,
        })
    }

    fn encode(&self, builder: &mut Builder) -> Result<Offset<TableMark>, SchemaError> {
        let events = encode_table_vector(builder, &self.events)?;
        builder.start_table(GameWrapperView::FIELD_COUNT)?;
        if let Some(events) = events {
            builder.add_offset(GameWrapperView::EVENTS, events)?;
        }
        Ok(builder.end_table()?)
    }
}
