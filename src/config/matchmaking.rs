/// Matchmaking configuration constants.
///
/// This module defines parameters for the opponent search and for the
/// handling of server-side match errors.
use crate::duel::machine::MatchErrorPolicy;

pub const SEARCH_TIMEOUT_SECS: u64 = 30; // Opponent search timeout (in seconds).

/// What to do with the match session when the server pushes a `match_error`.
///
/// `ClearSession` returns the client to an idle, search-ready state;
/// `RetainSession` keeps the session so the round can be retried.
pub const MATCH_ERROR_POLICY: MatchErrorPolicy = MatchErrorPolicy::ClearSession;
