use serde::{Deserialize, Serialize};

use super::types::{Move, Outcome};

/// Message client -> server.
///
/// Serialized as JSON text frames: `{"event": "...", "data": {...}}`.
/// Every message carries the sender's identity so the server can rebind a
/// session after a reconnect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientWsMessage {
    RegisterUser {
        username: String,
    },
    FindMatch {
        username: String,
    },
    AcceptMatch {
        username: String,
    },
    MakeMove {
        username: String,
        #[serde(rename = "move")]
        choice: Move,
    },
}

// Message server -> client
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerWsMessage {
    /// Echo of the registered identity. Informational only.
    UserRegistered {
        username: String,
    },
    /// Queued for matchmaking, no opponent yet.
    Waiting {
        message: String,
    },
    MatchFound {
        opponent: String,
    },
    WaitingAccept {
        message: String,
    },
    StartGame {
        message: String,
    },
    WaitingMove {
        message: String,
    },
    GameResult {
        your_move: Move,
        opponent_move: Move,
        result: Outcome,
        new_floor: u32,
    },
    MatchError {
        error: String,
    },
}

impl ClientWsMessage {
    pub fn register_user(username: &str) -> Self {
        Self::RegisterUser { username: username.to_string() }
    }
    pub fn find_match(username: &str) -> Self {
        Self::FindMatch { username: username.to_string() }
    }
    pub fn accept_match(username: &str) -> Self {
        Self::AcceptMatch { username: username.to_string() }
    }
    pub fn make_move(username: &str, choice: Move) -> Self {
        Self::MakeMove { username: username.to_string(), choice }
    }
}
