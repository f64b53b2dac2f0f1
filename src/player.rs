use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};
use crate::event::{DismissalKind, PlayerId};

/// Which end of the pitch a batsman currently occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CreasePosition {
    Striker,
    NonStriker,
}

/// One batsman's innings record.
///
/// Created only by the batsmen-setup or new-batsman flows, never inferred
/// from a ball. Figures are maintained exclusively by the fold; a dismissed
/// batsman is marked out but the record is retained for the scorecard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batsman {
    pub id: PlayerId,
    pub name: String,
    pub shirt_number: u8,
    pub shirt_name: String,
    pub runs: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
    pub is_out: bool,
    pub dismissal_type: Option<DismissalKind>,
    /// Present while the batsman occupies a crease, `None` otherwise.
    pub position: Option<CreasePosition>,
}

impl Batsman {
    /// Strike rate: runs per hundred balls, one decimal, `0.0` before the
    /// first ball faced. Recomputed on read, never stored.
    pub fn strike_rate(&self) -> f64 {
        if self.balls_faced == 0 {
            return 0.0;
        }
        let rate = self.runs as f64 * 100.0 / self.balls_faced as f64;
        (rate * 10.0).round() / 10.0
    }
}

/// One bowler's innings figures. The current-over counters reset every
/// completed over; everything else accumulates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bowler {
    pub id: PlayerId,
    pub name: String,
    pub shirt_number: u8,
    pub overs: u8,
    pub maidens: u8,
    pub runs: u32,
    pub wickets: u8,
    pub current_over_balls: u8,
    pub current_over_runs: u32,
}

/// Per-innings collections of batsmen and bowlers.
///
/// Membership changes only through the explicit setup operations the match
/// controller gates; the fold mutates figures and nothing else. A ball
/// referencing an id that is not here is a contract violation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    pub batsmen: Vec<Batsman>,
    pub bowlers: Vec<Bowler>,
}

impl Registry {
    /// Add a batsman and return the new id.
    pub fn add_batsman(&mut self, name: &str, shirt_number: u8, shirt_name: &str) -> PlayerId {
        let id = self.batsmen.len() as PlayerId + 1;
        self.batsmen.push(Batsman {
            id,
            name: name.to_string(),
            shirt_number,
            shirt_name: shirt_name.to_string(),
            runs: 0,
            balls_faced: 0,
            fours: 0,
            sixes: 0,
            is_out: false,
            dismissal_type: None,
            position: None,
        });
        id
    }

    /// Add a bowler, or resume an existing one matching on name and shirt
    /// number (a bowler returning for a new spell keeps their figures).
    pub fn add_or_resume_bowler(&mut self, name: &str, shirt_number: u8) -> PlayerId {
        if let Some(existing) = self
            .bowlers
            .iter()
            .find(|b| b.name == name && b.shirt_number == shirt_number)
        {
            return existing.id;
        }
        let id = self.bowlers.len() as PlayerId + 1;
        self.bowlers.push(Bowler {
            id,
            name: name.to_string(),
            shirt_number,
            overs: 0,
            maidens: 0,
            runs: 0,
            wickets: 0,
            current_over_balls: 0,
            current_over_runs: 0,
        });
        id
    }

    pub fn batsman(&self, id: PlayerId) -> Result<&Batsman> {
        self.batsmen
            .iter()
            .find(|b| b.id == id)
            .ok_or(ScoreError::UnknownPlayer { id })
    }

    pub fn batsman_mut(&mut self, id: PlayerId) -> Result<&mut Batsman> {
        self.batsmen
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(ScoreError::UnknownPlayer { id })
    }

    pub fn bowler(&self, id: PlayerId) -> Result<&Bowler> {
        self.bowlers
            .iter()
            .find(|b| b.id == id)
            .ok_or(ScoreError::UnknownPlayer { id })
    }

    pub fn bowler_mut(&mut self, id: PlayerId) -> Result<&mut Bowler> {
        self.bowlers
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(ScoreError::UnknownPlayer { id })
    }

    /// Zero every figure while preserving membership, names and ids.
    /// The replay path runs this before re-folding the ledger.
    pub fn reset_figures(&mut self) {
        for b in &mut self.batsmen {
            b.runs = 0;
            b.balls_faced = 0;
            b.fours = 0;
            b.sixes = 0;
            b.is_out = false;
            b.dismissal_type = None;
            b.position = None;
        }
        for b in &mut self.bowlers {
            b.overs = 0;
            b.maidens = 0;
            b.runs = 0;
            b.wickets = 0;
            b.current_over_balls = 0;
            b.current_over_runs = 0;
        }
    }
}
