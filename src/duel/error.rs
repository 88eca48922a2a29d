/// Local command error taxonomy.
///
/// Every variant is a precondition failure surfaced as user-facing text.
/// None of them is retried automatically; the user re-triggers the action.
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Not connected to the server. Wait for the connection to come back.")]
    NotConnected,

    #[error("You are already in a match!")]
    AlreadyInMatch,

    #[error("Already searching for an opponent.")]
    SearchPending,

    #[error("No user is logged in.")]
    NotAuthenticated,

    #[error("'{0}' is not a valid move. Play rock, paper or scissors.")]
    InvalidMove(String),

    #[error("No round is waiting for that action right now.")]
    OutOfTurn,
}
