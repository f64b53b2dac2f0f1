use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};
use crate::event::{BallInput, BallSource};

/// A camera-detected ball awaiting human review.
///
/// Proposals never touch match state. The detection loop is an untrusted
/// producer: whatever it submits sits in this inbox until a human promotes
/// it (at which point it travels through the ordinary record-ball entry
/// point, marked [`BallSource::Camera`]) or discards it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedBall {
    pub id: u64,
    pub ts: u64,
    /// The suggested ball, exactly as it would be recorded.
    pub input: BallInput,
}

/// Per-match queue of pending proposals.
///
/// Not persisted: an unconfirmed detection has no standing, so losing the
/// queue on restart loses nothing the ledger cares about.
#[derive(Debug, Clone, Default)]
pub struct ProposalInbox {
    pending: Vec<ProposedBall>,
    next_id: u64,
}

impl ProposalInbox {
    /// Queue a detected ball and return its proposal id.
    pub fn propose(&mut self, mut input: BallInput, signal: Option<String>) -> u64 {
        self.next_id += 1;
        input.source = BallSource::Camera;
        if signal.is_some() {
            input.signal_detected = signal;
        }
        self.pending.push(ProposedBall {
            id: self.next_id,
            ts: crate::event::now_ts(),
            input,
        });
        self.next_id
    }

    pub fn pending(&self) -> &[ProposedBall] {
        &self.pending
    }

    /// Look a proposal up without consuming it.
    pub fn get(&self, id: u64) -> Result<&ProposedBall> {
        self.pending
            .iter()
            .find(|p| p.id == id)
            .ok_or(ScoreError::UnknownProposal(id))
    }

    /// Remove a proposal for promotion, returning the ball to record.
    pub fn accept(&mut self, id: u64) -> Result<BallInput> {
        let pos = self
            .pending
            .iter()
            .position(|p| p.id == id)
            .ok_or(ScoreError::UnknownProposal(id))?;
        Ok(self.pending.remove(pos).input)
    }

    /// Discard a proposal.
    pub fn reject(&mut self, id: u64) -> Result<()> {
        let pos = self
            .pending
            .iter()
            .position(|p| p.id == id)
            .ok_or(ScoreError::UnknownProposal(id))?;
        self.pending.remove(pos);
        Ok(())
    }
}
