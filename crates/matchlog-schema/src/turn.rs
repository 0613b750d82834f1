//! One robot's turn: its state after acting and the actions it took.

use matchlog_codec::{Builder, DecodeError, Offset, TableMark};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::SchemaError;
use crate::actions::{Action, ActionList, encode_actions};
use crate::object::{TableObject, table_view};

table_view!(
    /// Borrowed reader for a turn.
    TurnView
);

impl<'buf> TurnView<'buf> {
    /// Slot of `robot_id`.
    pub const ROBOT_ID: u16 = 0;
    /// Slot of `health`.
    pub const HEALTH: u16 = 1;
    /// Slot of `paint`.
    pub const PAINT: u16 = 2;
    /// Slot of `move_cooldown`.
    pub const MOVE_COOLDOWN: u16 = 3;
    /// Slot of `action_cooldown`.
    pub const ACTION_COOLDOWN: u16 = 4;
    /// Slot of `bytecodes_used`.
    pub const BYTECODES_USED: u16 = 5;
    /// Slot of `x`.
    pub const X: u16 = 6;
    /// Slot of `y`.
    pub const Y: u16 = 7;
    /// Slot of the action tag vector.
    pub const ACTIONS_TYPE: u16 = 8;
    /// Slot of the action payload vector.
    pub const ACTIONS: u16 = 9;
    /// Number of slots.
    pub const FIELD_COUNT: u16 = 10;

    /// The acting robot.
    pub fn robot_id(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::ROBOT_ID, 0)
    }

    /// Health at the end of the turn.
    pub fn health(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::HEALTH, 0)
    }

    /// Paint at the end of the turn.
    pub fn paint(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::PAINT, 0)
    }

    /// Movement cooldown at the end of the turn.
    pub fn move_cooldown(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::MOVE_COOLDOWN, 0)
    }

    /// Action cooldown at the end of the turn.
    pub fn action_cooldown(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::ACTION_COOLDOWN, 0)
    }

    /// Bytecodes spent this turn.
    pub fn bytecodes_used(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::BYTECODES_USED, 0)
    }

    /// Column at the end of the turn.
    pub fn x(&self) -> Result<u8, DecodeError> {
        self.table.get(Self::X, 0)
    }

    /// Row at the end of the turn.
    pub fn y(&self) -> Result<u8, DecodeError> {
        self.table.get(Self::Y, 0)
    }

    /// The actions taken, in order.
    pub fn actions(&self) -> Result<ActionList<'buf>, DecodeError> {
        Ok(ActionList::new(
            self.table.buf(),
            self.table.get_vector(Self::ACTIONS_TYPE)?,
            self.table.get_vector(Self::ACTIONS)?,
        ))
    }
}

/// One robot's turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Turn {
    /// The acting robot.
    pub robot_id: i32,
    /// Health at the end of the turn.
    pub health: i32,
    /// Paint at the end of the turn.
    pub paint: i32,
    /// Movement cooldown at the end of the turn.
    pub move_cooldown: i32,
    /// Action cooldown at the end of the turn.
    pub action_cooldown: i32,
    /// Bytecodes spent this turn.
    pub bytecodes_used: i32,
    /// Column at the end of the turn.
    pub x: u8,
    /// Row at the end of the turn.
    pub y: u8,
    /// The actions taken, in order.
    pub actions: Vec<Action>,
}

impl TableObject for Turn {
    type View<'buf> = TurnView<'buf>;

    fn decode(view: TurnView<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            robot_id: view.robot_id()?,
            health: view.health()?,
            paint: view.paint()?,
            move_cooldown: view.move_cooldown()?,
            action_cooldown: view.action_cooldown()?,
            bytecodes_used: view.bytecodes_used()?,
            x: view.x()?,
            y: view.y()?,
            actions: view.actions()?.to_vec()?,
        })
    }

    fn encode(&self, builder: &mut Builder) -> Result<Offset<TableMark>, SchemaError> {
        type V<'a> = TurnView<'a>;
        let actions = if self.actions.is_empty() {
            None
        } else {
            Some(encode_actions(builder, &self.actions)?)
        };

        builder.start_table(V::FIELD_COUNT)?;
        builder.add_scalar(V::ROBOT_ID, self.robot_id, 0)?;
        builder.add_scalar(V::HEALTH, self.health, 0)?;
        builder.add_scalar(V::PAINT, self.paint, 0)?;
        builder.add_scalar(V::MOVE_COOLDOWN, self.move_cooldown, 0)?;
        builder.add_scalar(V::ACTION_COOLDOWN, self.action_cooldown, 0)?;
        builder.add_scalar(V::BYTECODES_USED, self.bytecodes_used, 0)?;
        if let Some(actions) = actions {
            builder.add_offset(V::ACTIONS_TYPE, actions.types)?;
            builder.add_offset(V::ACTIONS, actions.payloads)?;
        }
        builder.add_scalar(V::X, self.x, 0)?;
        builder.add_scalar(V::Y, self.y, 0)?;
        Ok(builder.end_table()?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::actions::{DamageAction, SpawnAction};
    use matchlog_codec::root_table;

    #[test]
    fn spawn_then_damage() {
        let turn = Turn {
            robot_id: 7,
            health: 60,
            x: 3,
            y: 4,
            actions: vec![
                Action::Spawn(SpawnAction {
                    x: 3,
                    y: 4,
                    team: 0,
                    robot_type: 1,
                }),
                Action::Damage(DamageAction { id: 7, damage: 12 }),
            ],
            ..Turn::default()
        };
        let mut b = Builder::new();
        let root = turn.encode(&mut b).unwrap();
        let bytes = b.finish(root).unwrap().to_vec();

        let view = TurnView::from(root_table(&bytes).unwrap());
        let list = view.actions().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.tag(0).ok(), Some(5));
        assert_eq!(list.tag(1).ok(), Some(1));
        assert_eq!(list.to_vec().unwrap(), turn.actions);
        assert_eq!(Turn::decode(view).unwrap(), turn);
    }

    #[test]
    fn turn_without_actions() {
        let turn = Turn {
            robot_id: 1,
            bytecodes_used: 1234,
            ..Turn::default()
        };
        let mut b = Builder::new();
        let root = turn.encode(&mut b).unwrap();
        let bytes = b.finish(root).unwrap().to_vec();
        let view = TurnView::from(root_table(&bytes).unwrap());
        assert!(view.actions().unwrap().is_empty());
        assert_eq!(Turn::decode(view).unwrap(), turn);
    }

    #[test]
    fn unknown_action_fails_encoding() {
        let turn = Turn {
            actions: vec![Action::Unknown { tag: 99 }],
            ..Turn::default()
        };
        let mut b = Builder::new();
        assert_eq!(
            turn.encode(&mut b).err(),
            Some(SchemaError::UnencodableAction { tag: 99 })
        );
    }
}
