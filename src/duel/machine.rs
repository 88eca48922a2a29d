/// Duel client state machine.
///
/// Owns the whole per-session state trio (search, match session, duel phase)
/// plus identity, connection status and the displayed floor. All mutation
/// goes through explicit transitions: local commands return
/// `Result<Vec<Effect>, CommandError>`, transport events return
/// `Vec<Effect>`, and the caller executes the effects. The machine itself
/// never touches a socket, a timer or the screen, which is what makes it
/// testable without a live transport.
///
/// Transitions are serialized by the event loop that drives the machine, so
/// no synchronization primitives are needed; correctness rests on the
/// precondition checks below.
use std::time::Duration;

use crate::config::matchmaking::SEARCH_TIMEOUT_SECS;

use super::error::CommandError;
use super::messages::{ClientWsMessage, ServerWsMessage};
use super::types::{DuelPhase, Move, RoundResult, SearchToken};

/// Screen region a render effect targets. The presentation sink decides what
/// a region looks like; the machine only names it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    Status,
    Battle,
    FloorInfo,
    Leaderboard,
    ActiveCount,
}

/// Side effect requested by a transition.
///
/// The I/O layer runs these in order. An empty effect list means the
/// transition was a no-op.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Serialize and send a message on the event channel.
    Send(ClientWsMessage),
    /// Schedule the search timeout. The token identifies which search the
    /// timer belongs to; the firing callback must hand it back through
    /// `handle_search_timeout`.
    StartSearchTimer { token: SearchToken, duration: Duration },
    /// Cancel the scheduled search timeout. Only emitted when the logical
    /// cancellation won the race, so running it twice is impossible.
    CancelSearchTimer,
    /// Render text into a region. Empty text clears the region.
    Render { region: Region, text: String },
    /// Enable or disable the search trigger in the UI.
    SetSearchEnabled(bool),
}

impl Effect {
    fn render(region: Region, text: impl Into<String>) -> Self {
        Effect::Render { region, text: text.into() }
    }
}

/// Policy for the match session when the server pushes a `match_error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchErrorPolicy {
    /// Clear the session and return to Idle, search re-enabled.
    ClearSession,
    /// Keep the session; the server is expected to resume or end the round.
    RetainSession,
}

/// Transport lifecycle events fed into the machine by the session actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    Opened,
    Closed,
}

pub struct DuelClient {
    /// Identity established by the auth exchange; immutable until `reset`.
    identity: Option<String>,
    /// Last floor value the server told us. Display copy only.
    floor: u32,
    connected: bool,
    /// Active opponent search, if any.
    search: Option<SearchToken>,
    /// Current opponent (the match session). Non-empty iff `phase` is
    /// non-Idle.
    opponent: Option<String>,
    phase: DuelPhase,
    next_search_token: u64,
    error_policy: MatchErrorPolicy,
}

impl DuelClient {
    pub fn new(error_policy: MatchErrorPolicy) -> Self {
        Self {
            identity: None,
            floor: 1,
            connected: false,
            search: None,
            opponent: None,
            phase: DuelPhase::Idle,
            next_search_token: 0,
            error_policy,
        }
    }

    /// Bind the session to an authenticated identity and its initial floor.
    /// Called once after a successful register/login exchange.
    pub fn establish_identity(&mut self, username: &str, floor: u32) -> Vec<Effect> {
        self.identity = Some(username.to_string());
        self.floor = floor;
        vec![
            Effect::render(Region::FloorInfo, format!("Floor: {}", floor)),
            Effect::SetSearchEnabled(true),
        ]
    }

    /// Tear the session down (explicit logout). Everything goes back to the
    /// pre-auth state; the transport is the caller's problem.
    pub fn reset(&mut self) {
        self.identity = None;
        self.floor = 1;
        self.search = None;
        self.opponent = None;
        self.phase = DuelPhase::Idle;
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn floor(&self) -> u32 {
        self.floor
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    pub fn opponent(&self) -> Option<&str> {
        self.opponent.as_deref()
    }

    pub fn phase(&self) -> DuelPhase {
        self.phase
    }

    // --- Connection monitor ---

    /// Apply a transport lifecycle event.
    ///
    /// On open, an established identity is re-announced so the server can
    /// rebind the session. On close, in-flight search or match state is left
    /// untouched; the transport's own reconnection policy decides what
    /// happens next.
    pub fn handle_connection(&mut self, event: ConnectionEvent) -> Vec<Effect> {
        match event {
            ConnectionEvent::Opened => {
                self.connected = true;
                match &self.identity {
                    Some(username) => vec![Effect::Send(ClientWsMessage::register_user(username))],
                    None => Vec::new(),
                }
            }
            ConnectionEvent::Closed => {
                // A close frame and the stream ending both land here; the
                // notice renders once.
                if !self.connected {
                    return Vec::new();
                }
                self.connected = false;
                vec![Effect::render(Region::Status, "Connection to the server lost.")]
            }
        }
    }

    // --- Search controller ---

    /// Request an opponent. Preconditions are checked in order and each
    /// failure carries its own user-facing message; none of them schedules
    /// the timeout.
    pub fn request_match(&mut self) -> Result<Vec<Effect>, CommandError> {
        if !self.connected {
            return Err(CommandError::NotConnected);
        }
        if self.opponent.is_some() {
            return Err(CommandError::AlreadyInMatch);
        }
        // At most one active search timer exists at any time.
        if self.search.is_some() {
            return Err(CommandError::SearchPending);
        }
        let username = self.identity.clone().ok_or(CommandError::NotAuthenticated)?;

        let token = self.issue_search_token();
        self.search = Some(token);
        Ok(vec![
            Effect::render(Region::Battle, ""),
            Effect::SetSearchEnabled(false),
            Effect::StartSearchTimer {
                token,
                duration: Duration::from_secs(SEARCH_TIMEOUT_SECS),
            },
            Effect::Send(ClientWsMessage::find_match(&username)),
            Effect::render(Region::Status, "Searching for an opponent..."),
        ])
    }

    /// The search timeout fired. A stale or already-cancelled token does
    /// nothing: cancellation on the match-found path must win the race even
    /// if the runtime delivered the timer anyway.
    pub fn handle_search_timeout(&mut self, token: SearchToken) -> Vec<Effect> {
        match self.search {
            Some(active) if active == token => {
                self.search = None;
                vec![
                    Effect::SetSearchEnabled(true),
                    Effect::render(Region::Status, "No opponent found. Try again."),
                ]
            }
            _ => Vec::new(),
        }
    }

    /// Retire the active search, if any. Returns true when this call won the
    /// race against the timeout, i.e. the caller may emit the cancel effect.
    fn cancel_search(&mut self) -> bool {
        self.search.take().is_some()
    }

    fn issue_search_token(&mut self) -> SearchToken {
        self.next_search_token += 1;
        SearchToken(self.next_search_token)
    }

    // --- Duel state machine: local commands ---

    /// Accept the match the server proposed. Valid only while a proposal is
    /// pending; the server still waits for the opponent's acceptance.
    pub fn accept_match(&mut self) -> Result<Vec<Effect>, CommandError> {
        if self.phase != DuelPhase::AwaitingAcceptance {
            return Err(CommandError::OutOfTurn);
        }
        let username = self.identity.clone().ok_or(CommandError::NotAuthenticated)?;
        self.phase = DuelPhase::AwaitingStart;
        Ok(vec![Effect::Send(ClientWsMessage::accept_match(&username))])
    }

    /// Submit a move for the current round. The raw choice is validated
    /// against the three-value move set before anything is sent; outside the
    /// Choosing phase nothing reaches the transport.
    pub fn make_move(&mut self, choice: &str) -> Result<Vec<Effect>, CommandError> {
        if self.phase != DuelPhase::Choosing {
            return Err(CommandError::OutOfTurn);
        }
        let choice =
            Move::parse(choice).ok_or_else(|| CommandError::InvalidMove(choice.to_string()))?;
        let username = self.identity.clone().ok_or(CommandError::NotAuthenticated)?;
        self.phase = DuelPhase::AwaitingOpponentChoice;
        Ok(vec![
            Effect::Send(ClientWsMessage::make_move(&username, choice)),
            Effect::render(
                Region::Battle,
                format!("You chose {}. Waiting for your opponent...", choice),
            ),
        ])
    }

    // --- Duel state machine: server events ---

    /// Apply a server-pushed event.
    pub fn handle_server(&mut self, msg: ServerWsMessage) -> Vec<Effect> {
        use ServerWsMessage::*;
        match msg {
            UserRegistered { .. } => Vec::new(),
            Waiting { message } | WaitingAccept { message } | WaitingMove { message } => {
                vec![Effect::render(Region::Status, message)]
            }
            MatchFound { opponent } => self.on_match_found(opponent),
            StartGame { message } => self.on_start_game(message),
            GameResult { your_move, opponent_move, result, new_floor } => {
                self.on_game_result(RoundResult {
                    own_move: your_move,
                    opponent_move,
                    outcome: result,
                    new_floor,
                })
            }
            MatchError { error } => self.on_match_error(error),
        }
    }

    fn on_match_found(&mut self, opponent: String) -> Vec<Effect> {
        // A session is only ever populated when empty; an unsolicited
        // match_found while a round is live would break that invariant.
        if self.opponent.is_some() {
            return Vec::new();
        }
        let mut effects = Vec::new();
        if self.cancel_search() {
            effects.push(Effect::CancelSearchTimer);
        }
        self.phase = DuelPhase::AwaitingAcceptance;
        effects.push(Effect::render(
            Region::Battle,
            format!("Opponent found: {}. Accept to start the round.", opponent),
        ));
        effects.push(Effect::render(Region::Status, ""));
        self.opponent = Some(opponent);
        // Search stays disabled until the round concludes.
        effects
    }

    fn on_start_game(&mut self, message: String) -> Vec<Effect> {
        if self.phase != DuelPhase::AwaitingStart {
            return Vec::new();
        }
        self.phase = DuelPhase::Choosing;
        let opponent = self.opponent.as_deref().unwrap_or("your opponent");
        vec![
            Effect::render(Region::Status, message),
            Effect::render(
                Region::Battle,
                format!("Choose your move against {}: rock, paper or scissors.", opponent),
            ),
        ]
    }

    /// Single release point of a round. Runs its side effects at most once:
    /// a duplicate delivery finds the session already empty and does nothing.
    fn on_game_result(&mut self, round: RoundResult) -> Vec<Effect> {
        let Some(opponent) = self.opponent.take() else {
            return Vec::new();
        };
        self.phase = DuelPhase::Idle;
        self.floor = round.new_floor;
        vec![
            Effect::render(
                Region::Status,
                format!(
                    "You chose {}, {} chose {}. {} New floor: {}",
                    round.own_move,
                    opponent,
                    round.opponent_move,
                    round.outcome.label(),
                    round.new_floor
                ),
            ),
            Effect::render(Region::FloorInfo, format!("Floor: {}", round.new_floor)),
            Effect::render(Region::Battle, ""),
            Effect::SetSearchEnabled(true),
        ]
    }

    fn on_match_error(&mut self, error: String) -> Vec<Effect> {
        let mut effects = vec![Effect::render(Region::Status, format!("Error: {}", error))];
        if self.error_policy == MatchErrorPolicy::ClearSession && self.opponent.is_some() {
            self.opponent = None;
            self.phase = DuelPhase::Idle;
            effects.push(Effect::render(Region::Battle, ""));
            effects.push(Effect::SetSearchEnabled(true));
        }
        effects
    }
}
