//! The per-turn action union.
//!
//! A turn records what its robot did as two co-indexed vectors: one byte
//! tag per action and one offset per action pointing at its payload. The
//! tag picks the decoder for the payload:
//!
//! | Tag | Action | Payload |
//! |-----|--------|---------|
//! | 0 | none | never written |
//! | 1 | [`DamageAction`] | 4-byte struct |
//! | 2 | [`SplashAction`] | 2-byte struct |
//! | 3 | [`UnpaintAction`] | 2-byte struct |
//! | 4 | [`MopAction`] | 6-byte struct |
//! | 5 | [`SpawnAction`] | 6-byte struct |
//! | 6 | [`UpgradeAction`] | 20-byte struct |
//! | 7 | [`DieExceptionAction`] | 1-byte struct |
//! | 8 | [`TimelineMarker`] | table |
//!
//! The tag space is open. A tag with no registered decoder (including 0)
//! decodes to [`Action::Unknown`] so that a reader built before a new
//! action kind existed still reads the rest of the turn.

use std::iter::FusedIterator;

use matchlog_codec::{
    Builder, DecodeError, FixedLayout, ForwardsUOffset, Offset, Position, Vector, VectorMark,
    put_field, take_field,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::SchemaError;
use crate::marker::{TimelineMarker, TimelineMarkerView};
use crate::object::TableObject;

// ---------------------------------------------------------------------------
// Fixed-layout payloads
// ---------------------------------------------------------------------------

/// Damage dealt to a robot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DamageAction {
    /// Robot that took the damage.
    pub id: u16,
    /// Health lost.
    pub damage: u16,
}

impl FixedLayout for DamageAction {
    const SIZE: usize = 4;
    const ALIGN: usize = 2;

    fn write_to(&self, out: &mut [u8]) -> Option<()> {
        put_field(out, 0, self.id)?;
        put_field(out, 2, self.damage)
    }

    fn read_from(bytes: &[u8]) -> Option<Self> {
        Some(Self {
            id: take_field(bytes, 0)?,
            damage: take_field(bytes, 2)?,
        })
    }
}

/// Paint splashed around a map location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SplashAction {
    /// Encoded map location of the splash center.
    pub loc: u16,
}

impl FixedLayout for SplashAction {
    const SIZE: usize = 2;
    const ALIGN: usize = 2;

    fn write_to(&self, out: &mut [u8]) -> Option<()> {
        put_field(out, 0, self.loc)
    }

    fn read_from(bytes: &[u8]) -> Option<Self> {
        Some(Self {
            loc: take_field(bytes, 0)?,
        })
    }
}

/// Paint removed from a map location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UnpaintAction {
    /// Encoded map location that lost its paint.
    pub loc: u16,
}

impl FixedLayout for UnpaintAction {
    const SIZE: usize = 2;
    const ALIGN: usize = 2;

    fn write_to(&self, out: &mut [u8]) -> Option<()> {
        put_field(out, 0, self.loc)
    }

    fn read_from(bytes: &[u8]) -> Option<Self> {
        Some(Self {
            loc: take_field(bytes, 0)?,
        })
    }
}

/// A mop swing hitting up to three robots. Unused ids are 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MopAction {
    /// First robot hit.
    pub id0: u16,
    /// Second robot hit.
    pub id1: u16,
    /// Third robot hit.
    pub id2: u16,
}

impl FixedLayout for MopAction {
    const SIZE: usize = 6;
    const ALIGN: usize = 2;

    fn write_to(&self, out: &mut [u8]) -> Option<()> {
        put_field(out, 0, self.id0)?;
        put_field(out, 2, self.id1)?;
        put_field(out, 4, self.id2)
    }

    fn read_from(bytes: &[u8]) -> Option<Self> {
        Some(Self {
            id0: take_field(bytes, 0)?,
            id1: take_field(bytes, 2)?,
            id2: take_field(bytes, 4)?,
        })
    }
}

/// A robot spawned at a location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpawnAction {
    /// Spawn column.
    pub x: u16,
    /// Spawn row.
    pub y: u16,
    /// Owning team.
    pub team: i8,
    /// Robot type tag.
    pub robot_type: i8,
}

impl FixedLayout for SpawnAction {
    const SIZE: usize = 6;
    const ALIGN: usize = 2;

    fn write_to(&self, out: &mut [u8]) -> Option<()> {
        put_field(out, 0, self.x)?;
        put_field(out, 2, self.y)?;
        put_field(out, 4, self.team)?;
        put_field(out, 5, self.robot_type)
    }

    fn read_from(bytes: &[u8]) -> Option<Self> {
        Some(Self {
            x: take_field(bytes, 0)?,
            y: take_field(bytes, 2)?,
            team: take_field(bytes, 4)?,
            robot_type: take_field(bytes, 5)?,
        })
    }
}

/// A tower upgraded to new limits.
///
/// Two pad bytes after `id` keep the `i32` fields 4-byte aligned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UpgradeAction {
    /// Upgraded robot.
    pub id: u16,
    /// Health after the upgrade.
    pub new_health: i32,
    /// Maximum health after the upgrade.
    pub new_max_health: i32,
    /// Paint after the upgrade.
    pub new_paint: i32,
    /// Maximum paint after the upgrade.
    pub new_max_paint: i32,
}

impl FixedLayout for UpgradeAction {
    const SIZE: usize = 20;
    const ALIGN: usize = 4;

    fn write_to(&self, out: &mut [u8]) -> Option<()> {
        put_field(out, 0, self.id)?;
        put_field(out, 4, self.new_health)?;
        put_field(out, 8, self.new_max_health)?;
        put_field(out, 12, self.new_paint)?;
        put_field(out, 16, self.new_max_paint)
    }

    fn read_from(bytes: &[u8]) -> Option<Self> {
        Some(Self {
            id: take_field(bytes, 0)?,
            new_health: take_field(bytes, 4)?,
            new_max_health: take_field(bytes, 8)?,
            new_paint: take_field(bytes, 12)?,
            new_max_paint: take_field(bytes, 16)?,
        })
    }
}

/// A robot's code threw an exception and the robot died.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DieExceptionAction {
    /// Exception kind reported by the engine.
    pub value: i8,
}

impl FixedLayout for DieExceptionAction {
    const SIZE: usize = 1;
    const ALIGN: usize = 1;

    fn write_to(&self, out: &mut [u8]) -> Option<()> {
        put_field(out, 0, self.value)
    }

    fn read_from(bytes: &[u8]) -> Option<Self> {
        Some(Self {
            value: take_field(bytes, 0)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// One action a robot took during its turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Action {
    /// Tag 1.
    Damage(DamageAction),
    /// Tag 2.
    Splash(SplashAction),
    /// Tag 3.
    Unpaint(UnpaintAction),
    /// Tag 4.
    Mop(MopAction),
    /// Tag 5.
    Spawn(SpawnAction),
    /// Tag 6.
    Upgrade(UpgradeAction),
    /// Tag 7.
    DieException(DieExceptionAction),
    /// Tag 8.
    TimelineMarker(TimelineMarker),
    /// A tag this reader has no decoder for.
    Unknown {
        /// The tag as stored.
        tag: u8,
    },
}

/// Tag value that marks "no action". Never written.
pub const ACTION_NONE: u8 = 0;

impl Action {
    /// The tag stored alongside this action's payload.
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Damage(_) => 1,
            Self::Splash(_) => 2,
            Self::Unpaint(_) => 3,
            Self::Mop(_) => 4,
            Self::Spawn(_) => 5,
            Self::Upgrade(_) => 6,
            Self::DieException(_) => 7,
            Self::TimelineMarker(_) => 8,
            Self::Unknown { tag } => *tag,
        }
    }

    /// Human-readable name of the action kind.
    pub fn name(&self) -> &'static str {
        decoder_for(self.tag()).map_or("Unknown", |d| d.name)
    }

    /// Write this action's payload and return its offset.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnencodableAction`] for [`Action::Unknown`],
    /// or a build error if the builder rejects the write.
    pub fn encode(&self, builder: &mut Builder) -> Result<Offset<Self>, SchemaError> {
        let raw = match self {
            Self::Damage(a) => builder.create_struct(a)?.value(),
            Self::Splash(a) => builder.create_struct(a)?.value(),
            Self::Unpaint(a) => builder.create_struct(a)?.value(),
            Self::Mop(a) => builder.create_struct(a)?.value(),
            Self::Spawn(a) => builder.create_struct(a)?.value(),
            Self::Upgrade(a) => builder.create_struct(a)?.value(),
            Self::DieException(a) => builder.create_struct(a)?.value(),
            Self::TimelineMarker(m) => m.encode(builder)?.value(),
            Self::Unknown { tag } => return Err(SchemaError::UnencodableAction { tag: *tag }),
        };
        Ok(Offset::new(raw))
    }
}

macro_rules! action_from {
    ($($payload:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$payload> for Action {
                fn from(payload: $payload) -> Self {
                    Self::$variant(payload)
                }
            }
        )*
    };
}

action_from!(
    DamageAction => Damage,
    SplashAction => Splash,
    UnpaintAction => Unpaint,
    MopAction => Mop,
    SpawnAction => Spawn,
    UpgradeAction => Upgrade,
    DieExceptionAction => DieException,
    TimelineMarker => TimelineMarker,
);

// ---------------------------------------------------------------------------
// Decoder registry
// ---------------------------------------------------------------------------

/// A registered decoder for one action tag.
#[derive(Debug, Clone, Copy)]
pub struct ActionDecoder {
    /// Tag this decoder handles.
    pub tag: u8,
    /// Name of the action kind.
    pub name: &'static str,
    /// Decode the payload at an absolute position.
    pub decode: fn(&[u8], usize) -> Result<Action, DecodeError>,
}

fn decode_fixed<S>(buf: &[u8], loc: usize) -> Result<Action, DecodeError>
where
    S: FixedLayout + Into<Action>,
{
    S::read_at(buf, loc).map(Into::into)
}

fn decode_marker(buf: &[u8], loc: usize) -> Result<Action, DecodeError> {
    let view = TimelineMarkerView::init(buf, loc)?;
    TimelineMarker::decode(view).map(Action::TimelineMarker)
}

/// Every known action kind, by tag.
pub static ACTION_DECODERS: &[ActionDecoder] = &[
    ActionDecoder {
        tag: 1,
        name: "Damage",
        decode: decode_fixed::<DamageAction>,
    },
    ActionDecoder {
        tag: 2,
        name: "Splash",
        decode: decode_fixed::<SplashAction>,
    },
    ActionDecoder {
        tag: 3,
        name: "Unpaint",
        decode: decode_fixed::<UnpaintAction>,
    },
    ActionDecoder {
        tag: 4,
        name: "Mop",
        decode: decode_fixed::<MopAction>,
    },
    ActionDecoder {
        tag: 5,
        name: "Spawn",
        decode: decode_fixed::<SpawnAction>,
    },
    ActionDecoder {
        tag: 6,
        name: "Upgrade",
        decode: decode_fixed::<UpgradeAction>,
    },
    ActionDecoder {
        tag: 7,
        name: "DieException",
        decode: decode_fixed::<DieExceptionAction>,
    },
    ActionDecoder {
        tag: 8,
        name: "TimelineMarker",
        decode: decode_marker,
    },
];

/// The decoder registered for `tag`, if any.
pub fn decoder_for(tag: u8) -> Option<&'static ActionDecoder> {
    ACTION_DECODERS.iter().find(|d| d.tag == tag)
}

/// Decode the payload at `loc` according to `tag`.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the payload is malformed. An unknown tag
/// is not an error.
pub fn decode_action(buf: &[u8], tag: u8, loc: usize) -> Result<Action, DecodeError> {
    match decoder_for(tag) {
        Some(decoder) => (decoder.decode)(buf, loc),
        None => {
            debug!(tag, loc, "unknown action tag");
            Ok(Action::Unknown { tag })
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Offsets of the two co-indexed vectors written by [`encode_actions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionVectors {
    /// The `[u8]` tag vector.
    pub types: Offset<VectorMark>,
    /// The `[uoffset]` payload vector.
    pub payloads: Offset<VectorMark>,
}

/// Write every payload, then the tag and payload vectors.
///
/// # Errors
///
/// Returns [`SchemaError::UnencodableAction`] if any action is
/// [`Action::Unknown`]; nothing is written in that case.
pub fn encode_actions(
    builder: &mut Builder,
    actions: &[Action],
) -> Result<ActionVectors, SchemaError> {
    if let Some(tag) = actions.iter().find_map(|a| match a {
        Action::Unknown { tag } => Some(*tag),
        _ => None,
    }) {
        return Err(SchemaError::UnencodableAction { tag });
    }
    let payloads = actions
        .iter()
        .map(|a| a.encode(builder))
        .collect::<Result<Vec<_>, _>>()?;
    let tags: Vec<u8> = actions.iter().map(Action::tag).collect();
    Ok(ActionVectors {
        types: builder.create_vector(&tags)?,
        payloads: builder.create_vector_of_offsets(&payloads)?,
    })
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Payload positions, one per action.
pub type PayloadVector<'buf> = Vector<'buf, ForwardsUOffset<Position>>;

/// A view over a turn's co-indexed tag and payload vectors.
///
/// The list length is the shorter of the two vectors. A length mismatch
/// is logged once, when the list is built; the trailing unmatched
/// entries are never read.
#[derive(Debug, Clone, Copy)]
pub struct ActionList<'buf> {
    buf: &'buf [u8],
    tags: Option<Vector<'buf, u8>>,
    payloads: Option<PayloadVector<'buf>>,
    len: usize,
}

impl<'buf> ActionList<'buf> {
    /// Pair the two vectors. Either may be absent, which reads as empty.
    pub fn new(
        buf: &'buf [u8],
        tags: Option<Vector<'buf, u8>>,
        payloads: Option<PayloadVector<'buf>>,
    ) -> Self {
        let tag_count = tags.map_or(0, |v| v.len());
        let payload_count = payloads.map_or(0, |v| v.len());
        if tag_count != payload_count {
            warn!(
                tags = tag_count,
                payloads = payload_count,
                "action tag and payload vectors differ in length; clipping to the shorter"
            );
        }
        Self {
            buf,
            tags,
            payloads,
            len: tag_count.min(payload_count),
        }
    }

    /// Number of decodable actions.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the turn recorded no actions.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn check_index(&self, index: usize) -> Result<(), DecodeError> {
        if index >= self.len {
            return Err(DecodeError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(())
    }

    /// The tag of action `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::IndexOutOfRange`] past the end of the list.
    pub fn tag(&self, index: usize) -> Result<u8, DecodeError> {
        self.check_index(index)?;
        let tags = self.tags.ok_or(DecodeError::IndexOutOfRange { index, len: 0 })?;
        tags.get(index)
    }

    /// Decode action `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::IndexOutOfRange`] past the end of the list,
    /// or the payload decoder's error.
    pub fn decode(&self, index: usize) -> Result<Action, DecodeError> {
        let tag = self.tag(index)?;
        let payloads = self
            .payloads
            .ok_or(DecodeError::IndexOutOfRange { index, len: 0 })?;
        let loc = payloads.get(index)?;
        decode_action(self.buf, tag, loc)
    }

    /// Iterate over the decoded actions.
    pub const fn iter(&self) -> ActionIter<'buf> {
        ActionIter {
            list: *self,
            next: 0,
        }
    }

    /// Decode every action, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first payload decoder error.
    pub fn to_vec(&self) -> Result<Vec<Action>, DecodeError> {
        self.iter().collect()
    }
}

/// Iterator over an [`ActionList`].
#[derive(Debug, Clone)]
pub struct ActionIter<'buf> {
    list: ActionList<'buf>,
    next: usize,
}

impl Iterator for ActionIter<'_> {
    type Item = Result<Action, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.list.len() {
            return None;
        }
        let item = self.list.decode(self.next);
        self.next = self.next.saturating_add(1);
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.list.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ActionIter<'_> {}

impl FusedIterator for ActionIter<'_> {}

impl<'buf> IntoIterator for ActionList<'buf> {
    type Item = Result<Action, DecodeError>;
    type IntoIter = ActionIter<'buf>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use matchlog_codec::root_table;

    /// Encode `actions` into a two-slot table and read the list back.
    fn round_trip(actions: &[Action]) -> Vec<Action> {
        let mut b = Builder::new();
        let vectors = encode_actions(&mut b, actions).unwrap();
        b.start_table(2).unwrap();
        b.add_offset(0, vectors.types).unwrap();
        b.add_offset(1, vectors.payloads).unwrap();
        let root = b.end_table().unwrap();
        let bytes = b.finish(root).unwrap().to_vec();

        let table = root_table(&bytes).unwrap();
        let list = ActionList::new(
            &bytes,
            table.get_vector(0).unwrap(),
            table.get_vector(1).unwrap(),
        );
        list.to_vec().unwrap()
    }

    #[test]
    fn fixed_layout_sizes() {
        assert_eq!(DamageAction::SIZE, 4);
        assert_eq!(SpawnAction::SIZE, 6);
        assert_eq!(SplashAction::SIZE, 2);
        assert_eq!(UnpaintAction::SIZE, 2);
        assert_eq!(UpgradeAction::SIZE, 20);
        assert_eq!(MopAction::SIZE, 6);
        assert_eq!(DieExceptionAction::SIZE, 1);
    }

    #[test]
    fn upgrade_field_offsets_and_padding() {
        let upgrade = UpgradeAction {
            id: 0x0102,
            new_health: 3,
            new_max_health: 4,
            new_paint: 5,
            new_max_paint: 6,
        };
        let mut out = [0u8; 20];
        upgrade.write_to(&mut out).unwrap();
        assert_eq!(
            out,
            [2, 1, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0, 5, 0, 0, 0, 6, 0, 0, 0]
        );
        assert_eq!(UpgradeAction::read_from(&out), Some(upgrade));
    }

    #[test]
    fn spawn_field_offsets() {
        let spawn = SpawnAction {
            x: 3,
            y: 4,
            team: -1,
            robot_type: 2,
        };
        let mut out = [0u8; 6];
        spawn.write_to(&mut out).unwrap();
        assert_eq!(out, [3, 0, 4, 0, 0xFF, 2]);
    }

    #[test]
    fn short_payload_is_rejected() {
        assert_eq!(DamageAction::read_from(&[1, 0, 2]), None);
        assert!(matches!(
            DamageAction::read_at(&[0, 0, 1, 0, 2], 2),
            Err(DecodeError::OutOfBounds { loc: 2, len: 4, .. })
        ));
    }

    #[test]
    fn registry_covers_every_known_tag() {
        for tag in 1..=8u8 {
            assert_eq!(decoder_for(tag).map(|d| d.tag), Some(tag));
        }
        assert!(decoder_for(ACTION_NONE).is_none());
        assert!(decoder_for(9).is_none());
    }

    #[test]
    fn every_kind_round_trips() {
        let actions = vec![
            Action::Damage(DamageAction { id: 1, damage: 2 }),
            Action::Splash(SplashAction { loc: 77 }),
            Action::Unpaint(UnpaintAction { loc: 78 }),
            Action::Mop(MopAction {
                id0: 1,
                id1: 2,
                id2: 0,
            }),
            Action::Spawn(SpawnAction {
                x: 9,
                y: 10,
                team: 1,
                robot_type: 3,
            }),
            Action::Upgrade(UpgradeAction {
                id: 4,
                new_health: 100,
                new_max_health: 200,
                new_paint: -1,
                new_max_paint: 500,
            }),
            Action::DieException(DieExceptionAction { value: -3 }),
            Action::TimelineMarker(TimelineMarker {
                round: 12,
                color_hex: 0x00FF_00FF,
                label: Some("rush".to_owned()),
            }),
        ];
        assert_eq!(round_trip(&actions), actions);
    }

    #[test]
    fn empty_list() {
        assert!(round_trip(&[]).is_empty());
    }

    #[test]
    fn unknown_actions_are_not_encodable() {
        let mut b = Builder::new();
        let result = encode_actions(&mut b, &[Action::Unknown { tag: 42 }]);
        assert_eq!(result.err(), Some(SchemaError::UnencodableAction { tag: 42 }));
        assert_eq!(b.size(), 0);
    }

    #[test]
    fn names() {
        assert_eq!(Action::Spawn(SpawnAction::default()).name(), "Spawn");
        assert_eq!(Action::Unknown { tag: 200 }.name(), "Unknown");
    }

    #[test]
    fn index_past_list_end() {
        let list = ActionList::new(&[], None, None);
        assert!(list.is_empty());
        assert_eq!(
            list.decode(0).err(),
            Some(DecodeError::IndexOutOfRange { index: 0, len: 0 })
        );
    }
}
