//! Replay schema for the match event stream.
//!
//! Builds the concrete tables of a replay on top of `matchlog-codec`:
//!
//! ```text
//! GameWrapper (root)
//! └── events: [EventWrapper]
//!     ├── GameHeader ── teams: [TeamData]
//!     │               ├── robot_type_metadata: [RobotTypeMetadata]
//!     │               └── constants: GameplayConstants
//!     ├── MatchHeader ─ map: GameMap ── ruins: VecTable
//!     ├── Round ─────── turns: [Turn] ── actions: [Action]
//!     │               └── died_locs: VecTable
//!     ├── MatchFooter
//!     └── GameFooter
//! ```
//!
//! # Architecture
//!
//! - [`object`] -- the [`TableObject`] trait pairing each view with its owned object.
//! - [`actions`] -- the [`Action`] union, its fixed-layout payloads and the decoder registry.
//! - [`marker`] -- [`TimelineMarker`], the one table-encoded action.
//! - [`vec_table`] -- [`VecTable`] parallel coordinate arrays.
//! - [`header`] -- [`GameHeader`] and its nested tables.
//! - [`map`] -- [`GameMap`], the static map of one match.
//! - [`turn`] / [`round`] -- per-turn and per-round state.
//! - [`event`] -- the [`Event`] union, match and game footers, and the
//!   [`GameWrapper`] root.
//!
//! # Compatibility
//!
//! Slot numbers never change once shipped and new fields only append.
//! Every field is optional on read, and unknown action or event tags
//! decode to an `Unknown` variant, so readers and writers of different
//! versions interoperate.
//!
//! # Usage
//!
//! ```
//! use matchlog_schema::{Action, DamageAction, Event, GameWrapper, Round, Turn};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let game = GameWrapper {
//!     events: vec![Event::Round(Round {
//!         round_id: 1,
//!         turns: vec![Turn {
//!             robot_id: 7,
//!             actions: vec![Action::Damage(DamageAction { id: 3, damage: 12 })],
//!             ..Turn::default()
//!         }],
//!         ..Round::default()
//!     })],
//! };
//! let bytes = game.to_bytes()?;
//! assert_eq!(GameWrapper::from_bytes(&bytes)?, game);
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod error;
pub mod event;
pub mod header;
pub mod map;
pub mod marker;
pub mod object;
pub mod round;
pub mod turn;
pub mod vec_table;

// Re-export primary types at crate root.
pub use actions::{
    ACTION_DECODERS, ACTION_NONE, Action, ActionDecoder, ActionIter, ActionList, ActionVectors,
    DamageAction, DieExceptionAction, MopAction, SpawnAction, SplashAction, UnpaintAction,
    UpgradeAction, decode_action, decoder_for, encode_actions,
};
pub use error::SchemaError;
pub use event::{
    EVENT_GAME_FOOTER, EVENT_GAME_HEADER, EVENT_MATCH_FOOTER, EVENT_MATCH_HEADER, EVENT_ROUND,
    Event, EventView, EventWrapperView, GameFooter, GameFooterView, GameWrapper, GameWrapperView,
    MatchFooter, MatchFooterView, MatchHeader, MatchHeaderView,
};
pub use header::{
    GameHeader, GameHeaderView, GameplayConstants, GameplayConstantsView, RobotTypeMetadata,
    RobotTypeMetadataView, TeamData, TeamDataView,
};
pub use map::{GameMap, GameMapView};
pub use marker::{TimelineMarker, TimelineMarkerView};
pub use object::TableObject;
pub use round::{Round, RoundView};
pub use turn::{Turn, TurnView};
pub use vec_table::{VecTable, VecTablePairs, VecTableView};
