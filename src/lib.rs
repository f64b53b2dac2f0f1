//! Ball-by-ball cricket scoring engine.
//!
//! Match state is a fold over an append-only ball ledger: every total,
//! batting and bowling figure, and crease pointer derives from replaying
//! recorded balls, which is also how undo works — pop the last ball, replay
//! the rest. A [`Scorebook`] hosts one aggregate per match behind a
//! per-match lock and persists each ledger as JSON lines next to an
//! atomically-written snapshot checkpoint.

mod archive;
mod engine;
mod error;
mod event;
mod innings;
mod ledger;
mod player;
mod proposal;
pub mod render;
mod session;
pub mod snapshot;
mod store;

pub use engine::{Scorebook, ScorebookBuilder};
pub use error::{Result, ScoreError};
pub use event::{
    BallInput, BallRecord, BallSource, Delivery, DismissalKind, ExtraKind, ExtraRecord,
    NormalizedBall, PlayerId, Wicket,
};
pub use innings::{Extras, Innings};
pub use ledger::Ledger;
pub use player::{Batsman, Bowler, CreasePosition, Registry};
pub use proposal::{ProposalInbox, ProposedBall};
pub use session::{Fixture, InningsNumber, MatchSession, MatchStatus, PlayerSetup};
pub use snapshot::{BatsmanCard, InningsSnapshot, MatchSnapshot};
pub use store::{LedgerMark, MatchStore, StoredMatch, line_hash};
