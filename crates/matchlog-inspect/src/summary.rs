//! Replay summaries.
//!
//! The event stream is walked through the borrowed views. Header and
//! footer are read in place; round tables are collected and decoded in
//! parallel with rayon, since they make up nearly all of a replay.
//! A round that fails to decode is counted and skipped rather than
//! failing the whole summary.

use std::collections::BTreeMap;
use std::path::Path;

use matchlog_codec::DecodeError;
use matchlog_schema::{
    Action, EventView, GameHeader, GameWrapperView, MatchFooterView, MatchHeaderView, Round,
    RoundView, TableObject, TimelineMarker,
};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::InspectError;

// ---------------------------------------------------------------------------
// Summary types
// ---------------------------------------------------------------------------

/// What the header says about the match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeaderSummary {
    /// Schema version string written by the engine.
    pub spec_version: Option<String>,
    /// Team names, in header order.
    pub teams: Vec<String>,
    /// Configured round limit, if the header carries constants.
    pub max_rounds: Option<i32>,
}

impl From<GameHeader> for HeaderSummary {
    fn from(header: GameHeader) -> Self {
        Self {
            spec_version: header.spec_version,
            teams: header
                .teams
                .into_iter()
                .map(|team| team.name.unwrap_or_default())
                .collect(),
            max_rounds: header.constants.map(|c| c.max_rounds),
        }
    }
}

/// One match of the game, as far as its header and footer tell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    /// Name of the map.
    pub map: Option<String>,
    /// Map width in cells.
    pub width: i32,
    /// Map height in cells.
    pub height: i32,
    /// Round limit from the match header.
    pub max_rounds: i32,
    /// Winner from the match footer, once seen.
    pub winner: Option<i8>,
    /// Rounds played, from the match footer.
    pub total_rounds: Option<i32>,
}

impl MatchSummary {
    fn from_header(view: MatchHeaderView<'_>) -> Result<Self, DecodeError> {
        let mut summary = Self {
            max_rounds: view.max_rounds()?,
            ..Self::default()
        };
        if let Some(map) = view.map()? {
            summary.map = map.name()?.map(str::to_owned);
            summary.width = map.width()?;
            summary.height = map.height()?;
        }
        Ok(summary)
    }

    fn close(&mut self, view: MatchFooterView<'_>) -> Result<(), DecodeError> {
        self.winner = Some(view.winner()?);
        self.total_rounds = Some(view.total_rounds()?);
        Ok(())
    }
}

/// Aggregate view of a whole replay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    /// Size of the replay file.
    pub byte_len: usize,
    /// Entries in the event stream.
    pub events: usize,
    /// The game header, if present.
    pub header: Option<HeaderSummary>,
    /// Matches in stream order.
    pub matches: Vec<MatchSummary>,
    /// Rounds decoded successfully.
    pub rounds: usize,
    /// Highest round id seen.
    pub last_round: Option<i32>,
    /// Turns across all rounds.
    pub turns: usize,
    /// Action counts keyed by action kind.
    pub actions: BTreeMap<&'static str, usize>,
    /// Robots that died across all rounds.
    pub deaths: usize,
    /// Timeline markers, in stream order.
    pub markers: Vec<TimelineMarker>,
    /// Winning team from the game footer.
    pub winner: Option<i8>,
    /// Events with a tag this build does not know.
    pub unknown_events: usize,
    /// Events or rounds that could not be decoded.
    pub corrupt: usize,
}

/// Totals for a single round.
#[derive(Debug, Default)]
struct RoundStats {
    round_id: i32,
    turns: usize,
    deaths: usize,
    actions: BTreeMap<&'static str, usize>,
    markers: Vec<TimelineMarker>,
}

impl From<Round> for RoundStats {
    fn from(round: Round) -> Self {
        let mut stats = Self {
            round_id: round.round_id,
            turns: round.turns.len(),
            deaths: round.died_ids.len(),
            ..Self::default()
        };
        for action in round.turns.into_iter().flat_map(|turn| turn.actions) {
            bump(&mut stats.actions, action.name(), 1);
            if let Action::TimelineMarker(marker) = action {
                stats.markers.push(marker);
            }
        }
        stats
    }
}

fn bump(counts: &mut BTreeMap<&'static str, usize>, key: &'static str, by: usize) {
    let count = counts.entry(key).or_default();
    *count = count.saturating_add(by);
}

// ---------------------------------------------------------------------------
// Summarizing
// ---------------------------------------------------------------------------

/// Read a replay file and summarize it.
pub fn summarize_file(path: &Path) -> Result<ReplaySummary, InspectError> {
    let bytes = std::fs::read(path).map_err(|source| InspectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    summarize(&bytes)
}

/// Summarize a finished replay buffer.
///
/// Fails only when the root table or the event vector itself is
/// unreadable.
pub fn summarize(buf: &[u8]) -> Result<ReplaySummary, InspectError> {
    let root = GameWrapperView::root(buf)?;
    let mut summary = ReplaySummary {
        byte_len: buf.len(),
        ..ReplaySummary::default()
    };
    let Some(events) = root.events()? else {
        debug!("replay has no event stream");
        return Ok(summary);
    };
    summary.events = events.len();

    let mut rounds = Vec::new();
    for (index, wrapper) in events.iter().enumerate() {
        match wrapper.and_then(|w| w.event()) {
            Ok(EventView::Round(view)) => rounds.push(view),
            Ok(EventView::GameHeader(view)) => match GameHeader::decode(view) {
                Ok(header) => summary.header = Some(header.into()),
                Err(error) => {
                    warn!(index, %error, "skipping unreadable game header");
                    summary.corrupt = summary.corrupt.saturating_add(1);
                }
            },
            Ok(EventView::MatchHeader(view)) => match MatchSummary::from_header(view) {
                Ok(entry) => summary.matches.push(entry),
                Err(error) => {
                    warn!(index, %error, "skipping unreadable match header");
                    summary.corrupt = summary.corrupt.saturating_add(1);
                }
            },
            Ok(EventView::MatchFooter(view)) => {
                if let Err(error) = close_match(&mut summary.matches, view) {
                    warn!(index, %error, "skipping unreadable match footer");
                    summary.corrupt = summary.corrupt.saturating_add(1);
                }
            }
            Ok(EventView::GameFooter(view)) => match view.winner() {
                Ok(winner) => summary.winner = Some(winner),
                Err(error) => {
                    warn!(index, %error, "skipping unreadable game footer");
                    summary.corrupt = summary.corrupt.saturating_add(1);
                }
            },
            Ok(EventView::Unknown { .. }) => {
                summary.unknown_events = summary.unknown_events.saturating_add(1);
            }
            Err(error) => {
                warn!(index, %error, "skipping unreadable event");
                summary.corrupt = summary.corrupt.saturating_add(1);
            }
        }
    }

    for result in decode_rounds(&rounds) {
        match result {
            Ok(stats) => fold_round(&mut summary, stats),
            Err(error) => {
                warn!(%error, "skipping unreadable round");
                summary.corrupt = summary.corrupt.saturating_add(1);
            }
        }
    }
    Ok(summary)
}

/// Record a match footer against the most recent open match. A footer
/// with no open match gets an entry of its own.
fn close_match(
    matches: &mut Vec<MatchSummary>,
    view: MatchFooterView<'_>,
) -> Result<(), DecodeError> {
    if let Some(open) = matches.last_mut().filter(|m| m.winner.is_none()) {
        return open.close(view);
    }
    debug!("match footer without a match header");
    let mut entry = MatchSummary::default();
    entry.close(view)?;
    matches.push(entry);
    Ok(())
}

fn fold_round(summary: &mut ReplaySummary, stats: RoundStats) {
    summary.rounds = summary.rounds.saturating_add(1);
    summary.last_round = Some(summary.last_round.map_or(stats.round_id, |r| r.max(stats.round_id)));
    summary.turns = summary.turns.saturating_add(stats.turns);
    summary.deaths = summary.deaths.saturating_add(stats.deaths);
    for (kind, count) in stats.actions {
        bump(&mut summary.actions, kind, count);
    }
    summary.markers.extend(stats.markers);
}

/// Decode rounds on the rayon pool, preserving input order.
fn decode_rounds(rounds: &[RoundView<'_>]) -> Vec<Result<RoundStats, DecodeError>> {
    debug!(rounds = rounds.len(), "decoding rounds");
    rounds
        .par_iter()
        .map(|view| Round::decode(*view).map(RoundStats::from))
        .collect()
}

/// Render a summary as JSON.
pub fn render(summary: &ReplaySummary, pretty: bool) -> Result<String, InspectError> {
    let json = if pretty {
        serde_json::to_string_pretty(summary)?
    } else {
        serde_json::to_string(summary)?
    };
    Ok(json)
}
