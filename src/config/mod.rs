/// Main configuration module.
///
/// Re-exports submodules for client endpoints, matchmaking, and lobby polling.
pub mod client;
pub mod lobby;
pub mod matchmaking;
