/// Lobby polling configuration constants.
///
/// Both lists are public, read-only views; each tick fires a fresh request
/// regardless of whether the previous one completed.
pub const LEADERBOARD_POLL_SECS: u64 = 2; // Leaderboard refresh interval (in seconds).

/// Active-user-count refresh interval (in seconds).
pub const ACTIVE_COUNT_POLL_SECS: u64 = 2;
