//! Sample replay generation.
//!
//! Produces a small but complete game of one match: a header for two
//! teams, a walled map, a handful of robots spawned in the first round,
//! random skirmishing afterwards and the match and game footers. The output is deterministic for a given seed, which makes it
//! useful as a fixture for viewers and for checking other decoders.

use std::ops::RangeInclusive;
use std::path::Path;

use matchlog_codec::BuilderConfig;
use matchlog_schema::{
    Action, DamageAction, DieExceptionAction, Event, GameFooter, GameHeader, GameMap,
    GameWrapper, GameplayConstants, MatchFooter, MatchHeader, MopAction, Round,
    RobotTypeMetadata, SpawnAction, SplashAction, TeamData, TimelineMarker, Turn, UnpaintAction,
    UpgradeAction, VecTable,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::InspectError;

/// Rounds written by `--sample`.
pub const SAMPLE_ROUNDS: i32 = 20;

/// Seed used by `--sample`.
pub const SAMPLE_SEED: u64 = 0x6d61_7463_686c_6f67;

/// Robots each team starts with.
const ROBOTS_PER_TEAM: i32 = 3;

/// Side length of the sample map.
const MAP_SIZE: u8 = 30;

fn team(name: &str, team_id: i8) -> TeamData {
    TeamData {
        name: Some(name.to_owned()),
        package_name: Some(format!("{name}player")),
        team_id,
    }
}

fn header() -> GameHeader {
    GameHeader {
        spec_version: Some(String::from("1")),
        teams: vec![team("red", 1), team("blue", 2)],
        robot_type_metadata: vec![RobotTypeMetadata {
            robot_type: 1,
            action_cooldown: 10,
            action_radius_squared: 9,
            base_health: 250,
            base_paint: 200,
            bytecode_limit: 15_000,
            movement_cooldown: 10,
            vision_radius_squared: 20,
            message_radius_squared: 20,
        }],
        constants: Some(GameplayConstants {
            max_rounds: 2000,
            min_map_dimension: 20,
            max_map_dimension: 60,
            initial_team_resources: 200,
        }),
    }
}

/// A square map with a wall border and two ruins.
fn sample_map(rng: &mut StdRng) -> GameMap {
    let side = i32::from(MAP_SIZE);
    let last = side.saturating_sub(1);
    let far = last.saturating_sub(5);
    let walls = (0..side)
        .flat_map(|y| (0..side).map(move |x| (x, y)))
        .map(|(x, y)| u8::from(x == 0 || y == 0 || x == last || y == last))
        .collect();
    GameMap {
        name: Some(String::from("sample")),
        width: side,
        height: side,
        symmetry: 0,
        random_seed: rng.random(),
        walls,
        ruins: Some(VecTable::from_points(&[(5, 5), (far, far)])),
    }
}

/// Robot ids in spawn order. Odd ids belong to team 1.
const fn robot_ids() -> RangeInclusive<i32> {
    1..=ROBOTS_PER_TEAM.saturating_mul(2)
}

const fn team_of(robot_id: i32) -> i8 {
    if robot_id.rem_euclid(2) == 1 { 1 } else { 2 }
}

fn short_id(robot_id: i32) -> u16 {
    u16::try_from(robot_id).unwrap_or_default()
}

fn opening_round(rng: &mut StdRng) -> Round {
    let turns = robot_ids()
        .map(|robot_id| {
            let x = rng.random_range(0..MAP_SIZE);
            let y = rng.random_range(0..MAP_SIZE);
            Turn {
                robot_id,
                health: 250,
                paint: 200,
                x,
                y,
                actions: vec![Action::Spawn(SpawnAction {
                    x: u16::from(x),
                    y: u16::from(y),
                    team: team_of(robot_id),
                    robot_type: 1,
                })],
                ..Turn::default()
            }
        })
        .collect();
    Round {
        team_ids: vec![1, 2],
        team_resource_amounts: vec![200, 200],
        turns,
        round_id: 1,
        ..Round::default()
    }
}

fn random_action(rng: &mut StdRng, robot_id: i32) -> Action {
    let target = rng.random_range(robot_ids());
    match rng.random_range(0..6u8) {
        0 => Action::Damage(DamageAction {
            id: short_id(target),
            damage: rng.random_range(1..40),
        }),
        1 => Action::Splash(SplashAction {
            loc: rng.random_range(0..900),
        }),
        2 => Action::Unpaint(UnpaintAction {
            loc: rng.random_range(0..900),
        }),
        3 => Action::Mop(MopAction {
            id0: short_id(target),
            id1: 0,
            id2: 0,
        }),
        4 => Action::Upgrade(UpgradeAction {
            id: short_id(robot_id),
            new_health: 300,
            new_max_health: 300,
            new_paint: 250,
            new_max_paint: 250,
        }),
        _ => Action::DieException(DieExceptionAction {
            value: rng.random_range(0..4),
        }),
    }
}

fn skirmish_round(rng: &mut StdRng, round_id: i32) -> Round {
    let turns: Vec<Turn> = robot_ids()
        .map(|robot_id| Turn {
            robot_id,
            health: rng.random_range(50..=250),
            paint: rng.random_range(0..=200),
            move_cooldown: rng.random_range(0..20),
            action_cooldown: rng.random_range(0..20),
            bytecodes_used: rng.random_range(500..15_000),
            x: rng.random_range(0..MAP_SIZE),
            y: rng.random_range(0..MAP_SIZE),
            actions: (0..rng.random_range(0..3))
                .map(|_| random_action(rng, robot_id))
                .collect(),
        })
        .collect();

    let mut round = Round {
        team_ids: vec![1, 2],
        team_resource_amounts: vec![
            rng.random_range(0..2000),
            rng.random_range(0..2000),
        ],
        turns,
        round_id,
        ..Round::default()
    };
    if rng.random_bool(0.2) {
        let dead = rng.random_range(robot_ids());
        round.died_ids.push(dead);
        round.died_locs = Some(VecTable::from_points(&[(
            rng.random_range(0..i32::from(MAP_SIZE)),
            rng.random_range(0..i32::from(MAP_SIZE)),
        )]));
    }
    if let Some(turn) = round
        .turns
        .first_mut()
        .filter(|_| round_id.rem_euclid(10) == 0)
    {
        turn.actions.push(Action::TimelineMarker(TimelineMarker {
            round: round_id,
            color_hex: 0x00ff_aa00,
            label: Some(format!("round {round_id}")),
        }));
    }
    round
}

/// Build a sample match with `rounds` rounds.
pub fn sample_game(rounds: i32, seed: u64) -> GameWrapper {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut events = vec![
        Event::GameHeader(header()),
        Event::MatchHeader(MatchHeader {
            map: Some(sample_map(&mut rng)),
            max_rounds: 2000,
        }),
    ];
    if rounds >= 1 {
        events.push(Event::Round(opening_round(&mut rng)));
    }
    events.extend((2..=rounds).map(|id| Event::Round(skirmish_round(&mut rng, id))));
    events.push(Event::MatchFooter(MatchFooter {
        winner: 1,
        total_rounds: rounds.max(0),
    }));
    events.push(Event::GameFooter(GameFooter { winner: 1 }));
    GameWrapper { events }
}

/// Encode the sample match and write it to `path`.
///
/// Returns the number of bytes written.
pub fn write_sample(path: &Path, config: &BuilderConfig) -> Result<usize, InspectError> {
    let bytes = sample_game(SAMPLE_ROUNDS, SAMPLE_SEED).to_bytes_with(config)?;
    std::fs::write(path, &bytes).map_err(|source| InspectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = bytes.len(), "sample replay written");
    Ok(bytes.len())
}
