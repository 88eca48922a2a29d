use serde::{Deserialize, Serialize};
use std::fmt;

/// A move in a duel round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

impl Move {
    /// Parse a user-typed choice. Anything outside the three legal values
    /// is rejected before it reaches the transport.
    pub fn parse(input: &str) -> Option<Move> {
        match input.trim().to_ascii_lowercase().as_str() {
            "rock" => Some(Move::Rock),
            "paper" => Some(Move::Paper),
            "scissors" => Some(Move::Scissors),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round outcome from the local player's point of view.
///
/// The server computes this; the client only renders it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
    Draw,
}

impl Outcome {
    /// User-facing outcome label.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Win => "You win!",
            Outcome::Lose => "You lose!",
            Outcome::Draw => "Draw!",
        }
    }
}

/// One resolved round. Built when `game_result` arrives, rendered, then
/// dropped; no round history is retained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundResult {
    pub own_move: Move,
    pub opponent_move: Move,
    pub outcome: Outcome,
    pub new_floor: u32,
}

/// Per-round lifecycle of the duel state machine.
///
/// Resolution is not a stored state: `game_result` handling releases the
/// round and returns the machine straight to `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuelPhase {
    Idle,
    AwaitingAcceptance,
    AwaitingStart,
    Choosing,
    AwaitingOpponentChoice,
}

/// Identifies one opponent search.
///
/// Tokens come from a monotonically increasing counter, so a timer scheduled
/// for an old search can never be mistaken for the active one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchToken(pub(crate) u64);
