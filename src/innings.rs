use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};
use crate::event::{BallRecord, Delivery, PlayerId, Wicket};
use crate::ledger::Ledger;
use crate::player::{CreasePosition, Registry};

/// Extras breakdown for one innings.
///
/// `short_runs` is a deduction tally kept for display; it is excluded from
/// [`Extras::counted`] so that the innings total stays exactly
/// `Σ batsman runs + counted extras`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extras {
    pub wides: u32,
    pub no_balls: u32,
    pub byes: u32,
    pub leg_byes: u32,
    pub penalties: u32,
    pub short_runs: u32,
}

impl Extras {
    /// Extras that count toward the innings total.
    pub fn counted(&self) -> u32 {
        self.wides + self.no_balls + self.byes + self.leg_byes + self.penalties
    }
}

/// One innings: totals, extras, player registry, crease/bowler pointers and
/// the ball ledger that determines all of it.
///
/// Every derived field is a fold over the ledger. The scoring rules live in
/// [`Innings::apply`] — a reducer from `(state, ball)` to `state` — and
/// [`Innings::replay`] re-runs that reducer over the whole ledger from
/// zeroed figures, which is how undo stays correct under every branch of
/// the rules without inverse-mutation logic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Innings {
    pub batting_team: String,
    pub bowling_team: String,
    pub runs: u32,
    pub wickets: u8,
    /// Completed six-legal-ball groups.
    pub overs: u8,
    /// Legal balls bowled in the current over, always 0–5.
    pub balls: u8,
    pub extras: Extras,
    pub ledger: Ledger,
    pub registry: Registry,
    pub striker_id: Option<PlayerId>,
    pub non_striker_id: Option<PlayerId>,
    pub bowler_id: Option<PlayerId>,
    /// A wicket vacated this crease and no replacement has come in yet.
    pub pending_new_batsman: Option<CreasePosition>,
    /// The over just completed and no bowler has been named for the next.
    pub pending_new_bowler: bool,
}

impl Innings {
    pub fn new(batting_team: &str, bowling_team: &str) -> Self {
        Innings {
            batting_team: batting_team.to_string(),
            bowling_team: bowling_team.to_string(),
            ..Default::default()
        }
    }

    /// Current striker and non-striker, once both creases are occupied.
    pub fn current_pair(&self) -> Option<(PlayerId, PlayerId)> {
        Some((self.striker_id?, self.non_striker_id?))
    }

    /// Run rate over legal balls bowled: `runs / (overs + balls/6)`,
    /// two decimals, `0.00` before the first legal ball.
    pub fn run_rate(&self) -> f64 {
        let overs = self.overs as f64 + self.balls as f64 / 6.0;
        if overs == 0.0 {
            return 0.0;
        }
        let rate = self.runs as f64 / overs;
        (rate * 100.0).round() / 100.0
    }

    /// Swap which batsman faces the next ball.
    pub fn rotate_strike(&mut self) {
        std::mem::swap(&mut self.striker_id, &mut self.non_striker_id);
    }

    /// Re-derive the `position` field on every batsman from the pointers.
    /// Called once per operation, after all pointer changes have settled.
    pub fn sync_positions(&mut self) {
        for b in &mut self.registry.batsmen {
            b.position = if Some(b.id) == self.striker_id {
                Some(CreasePosition::Striker)
            } else if Some(b.id) == self.non_striker_id {
                Some(CreasePosition::NonStriker)
            } else {
                None
            };
        }
    }

    /// Fold one recorded ball into the innings.
    ///
    /// Attribution uses the ids stored *on the record*, never the live
    /// pointers, so the same function serves both the live path and replay.
    /// Rules apply in the §-order of the delivery variants; the wicket and
    /// the over boundary come after the delivery's own effects.
    pub fn apply(&mut self, record: &BallRecord) -> Result<()> {
        let delivery = record.delivery();
        let credit_id = record.assigned_to_batsman_id.unwrap_or(record.striker_id);

        match delivery {
            Delivery::Wide { runs } => {
                // Never a legal ball, never faced, never rotates strike.
                self.extras.wides += runs as u32;
                self.runs += runs as u32;
                let bowler = self.registry.bowler_mut(record.bowler_id)?;
                bowler.runs += runs as u32;
                bowler.current_over_runs += runs as u32;
            }
            Delivery::NoBall { bat_runs } => {
                self.extras.no_balls += 1;
                self.runs += 1 + bat_runs as u32;
                if bat_runs > 0 {
                    let batsman = self.registry.batsman_mut(credit_id)?;
                    batsman.runs += bat_runs as u32;
                    if bat_runs == 4 {
                        batsman.fours += 1;
                    }
                    if bat_runs == 6 {
                        batsman.sixes += 1;
                    }
                }
                let bowler = self.registry.bowler_mut(record.bowler_id)?;
                bowler.runs += 1 + bat_runs as u32;
                bowler.current_over_runs += 1 + bat_runs as u32;
                if bat_runs % 2 == 1 {
                    self.rotate_strike();
                }
            }
            Delivery::Bye { runs } => {
                self.extras.byes += runs as u32;
                self.runs += runs as u32;
                self.registry.batsman_mut(record.striker_id)?.balls_faced += 1;
                if runs % 2 == 1 {
                    self.rotate_strike();
                }
            }
            Delivery::LegBye { runs } => {
                self.extras.leg_byes += runs as u32;
                self.runs += runs as u32;
                self.registry.batsman_mut(record.striker_id)?.balls_faced += 1;
                if runs % 2 == 1 {
                    self.rotate_strike();
                }
            }
            Delivery::Plain { runs } => {
                let batsman = self.registry.batsman_mut(credit_id)?;
                batsman.runs += runs as u32;
                if runs == 4 {
                    batsman.fours += 1;
                }
                if runs == 6 {
                    batsman.sixes += 1;
                }
                self.registry.batsman_mut(record.striker_id)?.balls_faced += 1;
                let bowler = self.registry.bowler_mut(record.bowler_id)?;
                bowler.runs += runs as u32;
                bowler.current_over_runs += runs as u32;
                self.runs += runs as u32;
                if runs % 2 == 1 {
                    self.rotate_strike();
                }
            }
        }

        if record.short_run {
            self.extras.short_runs += 1;
        }

        if delivery.is_legal() {
            self.complete_legal_ball(record.bowler_id)?;
        }

        if let Some(wicket) = record.wicket {
            self.apply_wicket(wicket, record.bowler_id)?;
        }

        Ok(())
    }

    /// Advance the legal-ball count and fire the over boundary at six.
    fn complete_legal_ball(&mut self, bowler_id: PlayerId) -> Result<()> {
        if self.balls > 5 {
            return Err(ScoreError::InvariantBreach(format!(
                "{} legal balls in the current over before the boundary fired",
                self.balls
            )));
        }
        self.balls += 1;
        let bowler = self.registry.bowler_mut(bowler_id)?;
        bowler.current_over_balls += 1;

        if self.balls == 6 {
            self.balls = 0;
            self.overs += 1;
            let bowler = self.registry.bowler_mut(bowler_id)?;
            bowler.overs += 1;
            if bowler.current_over_runs == 0 {
                bowler.maidens += 1;
            }
            bowler.current_over_balls = 0;
            bowler.current_over_runs = 0;
            // End-of-over swap is independent of any odd-run swap this ball
            // already made; two swaps cancel, one holds.
            self.rotate_strike();
            self.pending_new_bowler = true;
        }
        Ok(())
    }

    fn apply_wicket(&mut self, wicket: Wicket, bowler_id: PlayerId) -> Result<()> {
        if self.wickets >= 10 {
            return Err(ScoreError::InvariantBreach(
                "eleventh wicket recorded".into(),
            ));
        }
        let batsman = self.registry.batsman_mut(wicket.out_batsman_id)?;
        batsman.is_out = true;
        batsman.dismissal_type = Some(wicket.kind);
        self.wickets += 1;
        if wicket.kind.credits_bowler() {
            self.registry.bowler_mut(bowler_id)?.wickets += 1;
        }

        // Vacate whichever crease the dismissed batsman holds after any
        // rotations this ball applied. During replay the pointers may be
        // stale; the caller restores them afterwards.
        if self.striker_id == Some(wicket.out_batsman_id) {
            self.striker_id = None;
            self.pending_new_batsman = Some(CreasePosition::Striker);
        } else if self.non_striker_id == Some(wicket.out_batsman_id) {
            self.non_striker_id = None;
            self.pending_new_batsman = Some(CreasePosition::NonStriker);
        }
        Ok(())
    }

    /// Rebuild every derived field by re-folding the full ledger from zeroed
    /// figures. Membership, team names and the ledger itself are preserved;
    /// pointers and pending gates are left for the caller to restore from
    /// its own authority (the undone record, or a persisted snapshot).
    pub fn replay(&mut self) -> Result<()> {
        self.runs = 0;
        self.wickets = 0;
        self.overs = 0;
        self.balls = 0;
        self.extras = Extras::default();
        self.registry.reset_figures();
        self.pending_new_batsman = None;
        self.pending_new_bowler = false;

        let records: Vec<BallRecord> = self.ledger.entries().to_vec();
        for record in &records {
            self.apply(record)?;
        }
        Ok(())
    }

    /// Check the arithmetic invariant the ledger guarantees:
    /// total runs equal batsmen runs plus counted extras.
    pub fn totals_consistent(&self) -> bool {
        let batsman_runs: u32 = self.registry.batsmen.iter().map(|b| b.runs).sum();
        self.runs == batsman_runs + self.extras.counted() && self.balls <= 5 && self.wickets <= 10
    }
}
