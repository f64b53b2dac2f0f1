use crate::error::{Result, ScoreError};
use crate::event::BallRecord;

/// Append-only sequence of recorded balls for one innings.
///
/// The ledger is the source of truth for everything else in the innings:
/// totals, figures, and crease pointers are all folds over it. Appending is
/// the only mutation; removing the last entry (undo) is the only deletion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    entries: Vec<BallRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    /// Rebuild a ledger from entries read back from disk, re-checking the
    /// sequencing invariant on every entry.
    pub fn from_entries(entries: Vec<BallRecord>) -> Result<Self> {
        let mut ledger = Ledger::new();
        for (i, entry) in entries.into_iter().enumerate() {
            if entry.id != (i as u64) + 1 {
                return Err(ScoreError::InvariantBreach(format!(
                    "ledger entry {} carries id {}",
                    i + 1,
                    entry.id
                )));
            }
            ledger.entries.push(entry);
        }
        Ok(ledger)
    }

    /// Append a ball whose `(over, ballInOver)` must equal the innings'
    /// current position *before* the ball is applied.
    ///
    /// The caller (the innings aggregator) supplies its current position;
    /// a mismatch means the record was built against a stale state and is an
    /// invariant breach, not a validation failure.
    pub fn append(&mut self, entry: BallRecord, at_over: u8, at_ball: u8) -> Result<()> {
        if entry.over != at_over || entry.ball_in_over != at_ball {
            return Err(ScoreError::InvariantBreach(format!(
                "ball sequenced at over {}.{} but innings is at {}.{}",
                entry.over, entry.ball_in_over, at_over, at_ball
            )));
        }
        if entry.id != self.entries.len() as u64 + 1 {
            return Err(ScoreError::InvariantBreach(format!(
                "ball id {} does not follow {} entries",
                entry.id,
                self.entries.len()
            )));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Remove and return the last entry. `None` when empty — the caller
    /// turns that into the benign nothing-to-undo condition.
    pub fn truncate_last(&mut self) -> Option<BallRecord> {
        self.entries.pop()
    }

    pub fn entries(&self) -> &[BallRecord] {
        &self.entries
    }

    pub fn last(&self) -> Option<&BallRecord> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Id for the next entry to be appended.
    pub fn next_id(&self) -> u64 {
        self.entries.len() as u64 + 1
    }
}
