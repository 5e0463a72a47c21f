use common::model::{
    game::{Coord, Ply},
    messages::MoveResponse,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const OPPONENT_LABEL: &str = "AI";

// Marker the engine puts in front of its reply move when it only reports it as text
const OPPONENT_MARKER: &str = "AI moved from ";

/// One logged ply.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub actor: String,
    pub notation: String,
}

impl MoveRecord {
    pub fn new(actor: impl ToString, ply: Ply) -> Self {
        MoveRecord {
            actor: actor.to_string(),
            notation: ply.to_string(),
        }
    }
}

/// Move log, most recent first.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct MoveHistory(Vec<MoveRecord>);

impl MoveHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `records` above everything already logged, keeping their relative order.
    pub fn prepend(&mut self, records: Vec<MoveRecord>) {
        self.0.splice(0..0, records);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn entries(&self) -> &[MoveRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What a successful move response adds to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    /// Opponent reply (if any) followed by the human move.
    pub records: Vec<MoveRecord>,
    pub last_move: Coord,
}

/// Turn a move response into log entries. Rejected moves produce nothing.
pub fn reconstruct(
    response: &MoveResponse,
    submitted: Ply,
    player_name: &str,
) -> Option<Reconstruction> {
    if !response.success {
        return None;
    }
    let mut records = Vec::with_capacity(2);
    let last_move = match opponent_move(response) {
        Some(reply) => {
            records.push(MoveRecord::new(OPPONENT_LABEL, reply));
            reply.to
        }
        None => submitted.to,
    };
    records.push(MoveRecord::new(player_name, submitted));
    Some(Reconstruction { records, last_move })
}

/// The engine's reply move, from the structured field if present, otherwise read out of the
/// message text.
pub fn opponent_move(response: &MoveResponse) -> Option<Ply> {
    response
        .opponent_move
        .or_else(|| parse_opponent_move(&response.message))
}

/// Find `AI moved from (r, c) to (r, c)` anywhere in `message`.
///
/// Anything that does not fit the pattern, including coordinates off the board, is treated as
/// "no reply move".
pub fn parse_opponent_move(message: &str) -> Option<Ply> {
    let found = message
        .match_indices(OPPONENT_MARKER)
        .find_map(|(start, _)| parse_ply(&message[start + OPPONENT_MARKER.len()..]));
    if found.is_none() {
        debug!("No opponent move in {:?}", message);
    }
    found
}

fn parse_ply(input: &str) -> Option<Ply> {
    let (from, rest) = parse_pair(input)?;
    let rest = rest.strip_prefix(" to ")?;
    let (to, _) = parse_pair(rest)?;
    Some(Ply::new(from, to))
}

// "(2, 3)..." -> (2, 3) and the remaining text
fn parse_pair(input: &str) -> Option<(Coord, &str)> {
    let inner = input.strip_prefix('(')?;
    let (row, rest) = inner.split_once(", ")?;
    let (col, rest) = rest.split_once(')')?;
    let coord = Coord::new(row.parse().ok()?, col.parse().ok()?)?;
    Some((coord, rest))
}
