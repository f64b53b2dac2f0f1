use crate::session::MatchStatus;
use thiserror::Error;

/// Errors surfaced by scoring operations.
///
/// Variants split into four classes: transition errors (the match or innings
/// status forbids the call), reference errors (an id names nothing in the
/// current innings), invariant breaches (the aggregate itself is in a state
/// the fold should never produce — always a bug, never clamped), and the
/// benign empty-ledger undo.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScoreError {
    /// A mutating call arrived while the match status forbids it.
    #[error("operation not valid while match is {status}")]
    InvalidTransition {
        /// Status the match was in when the call arrived.
        status: MatchStatus,
    },

    /// The requested status change is not a legal edge of the state machine.
    #[error("cannot move match from {from} to {to}")]
    IllegalStatusChange {
        /// Current status.
        from: MatchStatus,
        /// Requested status.
        to: MatchStatus,
    },

    /// A ball, dismissal, or assignment referenced a player id not present in
    /// the current innings' registry.
    #[error("unknown player id {id}")]
    UnknownPlayer {
        /// The id that failed to resolve.
        id: u32,
    },

    /// A dismissal or run assignment referenced a player who is not currently
    /// at the crease.
    #[error("player {id} is not at the crease")]
    NotAtCrease {
        /// The id that is registered but not batting.
        id: u32,
    },

    /// A required setup step has not run yet (batsmen, bowler, or the new
    /// batsman after a wicket / new bowler after a completed over).
    #[error("setup required before scoring: {0}")]
    SetupRequired(&'static str),

    /// A setup step ran when its result was already in place (e.g. naming
    /// openers after balls have been bowled).
    #[error("setup conflict: {0}")]
    SetupConflict(&'static str),

    /// Ball input failed validation before reaching the ledger.
    #[error("invalid ball input: {0}")]
    InvalidBall(String),

    /// An internal invariant was breached (11th wicket, a seventh legal ball
    /// in an over, a ledger entry out of sequence). Distinct from ordinary
    /// validation: this is fatal to the request and indicates a bug.
    #[error("scoring invariant breached: {0}")]
    InvariantBreach(String),

    /// Undo was requested on an empty ledger. Reported, never fatal.
    #[error("nothing to undo: ball ledger is empty")]
    NothingToUndo,

    /// No match with the given id is open in this engine.
    #[error("no open match with id {0:?}")]
    UnknownMatch(String),

    /// No pending proposal with the given id.
    #[error("no pending proposal {0}")]
    UnknownProposal(u64),

    /// Underlying storage failure. The in-memory aggregate is left in its
    /// pre-call state.
    #[error("store error: {0}")]
    Store(#[from] std::io::Error),

    /// A ledger line or snapshot failed to (de)serialize.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScoreError>;
