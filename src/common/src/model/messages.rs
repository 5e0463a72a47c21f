use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::game::{Board, Ply, Winner};

/// Opaque game identifier issued by the engine.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Clone)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// POST /start
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StartResponse {
    pub game_id: SessionId,
    pub board: Board,
    #[serde(default)]
    pub winner: Winner,
}

// GET /board/{id}
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BoardResponse {
    pub board: Board,
    #[serde(default)]
    pub winner: Winner,
}

// POST /move/{id}, the request body is a Ply
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveResponse {
    pub success: bool,
    pub board: Board,
    #[serde(default)]
    pub winner: Winner,
    #[serde(default)]
    pub message: String,
    // Engines that know about it report their reply here instead of only in `message`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_move: Option<Ply>,
}

// Body of 4xx responses
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}
