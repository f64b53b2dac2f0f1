use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};
use crate::event::{
    BallInput, BallRecord, Delivery, DismissalKind, ExtraKind, ExtraRecord, NormalizedBall,
    PlayerId, now_ts,
};
use crate::innings::Innings;
use crate::player::CreasePosition;
use crate::proposal::ProposalInbox;

/// Match lifecycle status.
///
/// `scheduled → live → {paused ⇄ live} → {completed | abandoned}`.
/// Pausing is advisory — scoring calls are still accepted — but a terminal
/// status rejects every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Paused,
    Completed,
    Abandoned,
}

impl MatchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Abandoned)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::Paused => "paused",
            MatchStatus::Completed => "completed",
            MatchStatus::Abandoned => "abandoned",
        };
        f.write_str(s)
    }
}

/// Which of the two innings is being scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InningsNumber {
    First,
    Second,
}

/// The fixture a scoring session is opened against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub venue: String,
    pub competition: String,
    pub overs_limit: Option<u8>,
    pub match_type: String,
}

/// Identity fields for a batsman entering the innings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSetup {
    pub name: String,
    pub shirt_number: u8,
    #[serde(default)]
    pub shirt_name: String,
}

/// One match's scoring session: the status machine, both innings, and the
/// setup gates that decide when a ball may legally be recorded.
///
/// All methods mutate `self` directly and assume the caller holds the
/// per-match boundary (see [`Scorebook`](crate::Scorebook)); the engine
/// clones the session, applies the operation to the clone, persists, and
/// only then swaps it in — so a failed call never leaves a half-applied
/// aggregate behind.
#[derive(Debug, Clone)]
pub struct MatchSession {
    pub id: String,
    pub fixture: Fixture,
    pub scorer: String,
    pub status: MatchStatus,
    pub current: InningsNumber,
    pub created_ts: u64,
    pub first: Innings,
    pub second: Innings,
    /// Runs credit the striker unless a ball names an explicit target.
    pub auto_assign: bool,
    pub proposals: ProposalInbox,
}

impl MatchSession {
    /// Create a session in `scheduled` status. The home side bats first;
    /// the second innings is created empty with the teams swapped and only
    /// populated once selected.
    pub fn new(fixture: Fixture, scorer: &str) -> Self {
        let first = Innings::new(&fixture.home_team, &fixture.away_team);
        let second = Innings::new(&fixture.away_team, &fixture.home_team);
        MatchSession {
            id: fixture.id.clone(),
            fixture,
            scorer: scorer.to_string(),
            status: MatchStatus::Scheduled,
            current: InningsNumber::First,
            created_ts: now_ts(),
            first,
            second,
            auto_assign: true,
            proposals: ProposalInbox::default(),
        }
    }

    pub fn innings(&self) -> &Innings {
        match self.current {
            InningsNumber::First => &self.first,
            InningsNumber::Second => &self.second,
        }
    }

    pub fn innings_mut(&mut self) -> &mut Innings {
        match self.current {
            InningsNumber::First => &mut self.first,
            InningsNumber::Second => &mut self.second,
        }
    }

    /// `scheduled → live`.
    pub fn start(&mut self) -> Result<()> {
        if self.status != MatchStatus::Scheduled {
            return Err(ScoreError::IllegalStatusChange {
                from: self.status,
                to: MatchStatus::Live,
            });
        }
        self.status = MatchStatus::Live;
        Ok(())
    }

    /// Walk one edge of the status machine.
    pub fn set_status(&mut self, to: MatchStatus) -> Result<()> {
        use MatchStatus::*;
        let ok = match (self.status, to) {
            (Scheduled, Live) => true,
            (Live, Paused) | (Paused, Live) => true,
            (from, Completed) | (from, Abandoned) if !from.is_terminal() => true,
            _ => false,
        };
        if !ok {
            return Err(ScoreError::IllegalStatusChange {
                from: self.status,
                to,
            });
        }
        debug!("match {}: status {} -> {}", self.id, self.status, to);
        self.status = to;
        Ok(())
    }

    /// Scoring calls are valid while live or (advisorily) paused; a match
    /// that was never started or has reached a terminal status rejects them.
    fn ensure_scorable(&self) -> Result<()> {
        match self.status {
            MatchStatus::Live | MatchStatus::Paused => Ok(()),
            status => Err(ScoreError::InvalidTransition { status }),
        }
    }

    /// Name the opening pair. Valid once per innings, before the first ball.
    pub fn set_batsmen(
        &mut self,
        striker: &PlayerSetup,
        non_striker: &PlayerSetup,
        auto_assign: bool,
    ) -> Result<()> {
        self.ensure_scorable()?;
        let innings = self.innings_mut();
        if !innings.ledger.is_empty() || innings.current_pair().is_some() {
            return Err(ScoreError::SetupConflict("batsmen already set"));
        }
        let s = innings
            .registry
            .add_batsman(&striker.name, striker.shirt_number, &striker.shirt_name);
        let ns = innings.registry.add_batsman(
            &non_striker.name,
            non_striker.shirt_number,
            &non_striker.shirt_name,
        );
        innings.striker_id = Some(s);
        innings.non_striker_id = Some(ns);
        innings.sync_positions();
        self.auto_assign = auto_assign;
        Ok(())
    }

    /// Name the bowler for the next over (also clears the end-of-over gate).
    pub fn set_bowler(&mut self, name: &str, shirt_number: u8) -> Result<()> {
        self.ensure_scorable()?;
        let innings = self.innings_mut();
        let id = innings.registry.add_or_resume_bowler(name, shirt_number);
        innings.bowler_id = Some(id);
        innings.pending_new_bowler = false;
        Ok(())
    }

    /// Bring in a replacement after a wicket. Must target the vacated slot.
    pub fn new_batsman(&mut self, incoming: &PlayerSetup, position: CreasePosition) -> Result<()> {
        self.ensure_scorable()?;
        let innings = self.innings_mut();
        if innings.wickets >= 10 {
            return Err(ScoreError::SetupConflict("all ten wickets have fallen"));
        }
        match innings.pending_new_batsman {
            None => return Err(ScoreError::SetupConflict("no crease is vacant")),
            Some(vacant) if vacant != position => {
                return Err(ScoreError::SetupConflict(
                    "incoming batsman must fill the vacated crease",
                ));
            }
            Some(_) => {}
        }
        let id = innings.registry.add_batsman(
            &incoming.name,
            incoming.shirt_number,
            &incoming.shirt_name,
        );
        match position {
            CreasePosition::Striker => innings.striker_id = Some(id),
            CreasePosition::NonStriker => innings.non_striker_id = Some(id),
        }
        innings.pending_new_batsman = None;
        innings.sync_positions();
        Ok(())
    }

    /// Validate a raw ball against the current state and freeze it into a
    /// ledger record carrying the as-bowled pointers. Nothing is mutated —
    /// the engine persists the record, then feeds it to [`commit_ball`].
    ///
    /// [`commit_ball`]: MatchSession::commit_ball
    pub fn prepare_ball(&self, input: &BallInput) -> Result<BallRecord> {
        self.ensure_scorable()?;
        let innings = self.innings();

        if innings.wickets >= 10 {
            return Err(ScoreError::InvalidBall("innings is all out".into()));
        }
        if innings.pending_new_batsman.is_some() {
            return Err(ScoreError::SetupRequired("new batsman after wicket"));
        }
        if innings.pending_new_bowler {
            return Err(ScoreError::SetupRequired("new bowler for the next over"));
        }
        let (striker_id, non_striker_id) = innings
            .current_pair()
            .ok_or(ScoreError::SetupRequired("opening batsmen"))?;
        let bowler_id = innings.bowler_id.ok_or(ScoreError::SetupRequired("bowler"))?;
        innings.registry.bowler(bowler_id)?;

        let norm = input.normalize()?;
        self.check_references(&norm, striker_id, non_striker_id)?;

        if innings.balls > 5 {
            return Err(ScoreError::InvariantBreach(format!(
                "{} legal balls before the over boundary fired",
                innings.balls
            )));
        }

        let assigned = if self.auto_assign {
            None
        } else {
            norm.assign_to_batsman_id
        };

        Ok(BallRecord {
            id: innings.ledger.next_id(),
            ts: now_ts(),
            over: innings.overs,
            ball_in_over: innings.balls,
            runs: norm.net_runs,
            original_runs: norm.original_runs,
            short_run: norm.short_run,
            extras: match norm.delivery {
                Delivery::Plain { .. } => None,
                Delivery::Wide { runs } => Some(ExtraRecord {
                    kind: ExtraKind::Wide,
                    runs,
                }),
                Delivery::NoBall { .. } => Some(ExtraRecord {
                    kind: ExtraKind::NoBall,
                    runs: 1,
                }),
                Delivery::Bye { runs } => Some(ExtraRecord {
                    kind: ExtraKind::Bye,
                    runs,
                }),
                Delivery::LegBye { runs } => Some(ExtraRecord {
                    kind: ExtraKind::LegBye,
                    runs,
                }),
            },
            wicket: norm.wicket,
            source: norm.source,
            signal_detected: norm.signal_detected,
            striker_id,
            non_striker_id,
            bowler_id,
            assigned_to_batsman_id: assigned,
        })
    }

    fn check_references(
        &self,
        norm: &NormalizedBall,
        striker_id: PlayerId,
        non_striker_id: PlayerId,
    ) -> Result<()> {
        let at_crease = |id: PlayerId| id == striker_id || id == non_striker_id;

        if let Some(wicket) = norm.wicket {
            self.innings().registry.batsman(wicket.out_batsman_id)?;
            if !at_crease(wicket.out_batsman_id) {
                return Err(ScoreError::NotAtCrease {
                    id: wicket.out_batsman_id,
                });
            }
            // Off a no-ball only a run-out can dismiss.
            if matches!(norm.delivery, Delivery::NoBall { .. })
                && wicket.kind != DismissalKind::RunOut
            {
                return Err(ScoreError::InvalidBall(
                    "only a run-out can dismiss off a no-ball".into(),
                ));
            }
        }

        if let Some(target) = norm.assign_to_batsman_id {
            self.innings().registry.batsman(target)?;
            if !at_crease(target) {
                return Err(ScoreError::NotAtCrease { id: target });
            }
        } else if !self.auto_assign && norm.delivery.ran_runs() > 0 {
            return Err(ScoreError::InvalidBall(
                "auto-assign is off: a batsman must be named for the runs".into(),
            ));
        }
        Ok(())
    }

    /// Append a prepared record to the ledger and fold it into the innings.
    pub fn commit_ball(&mut self, record: BallRecord) -> Result<()> {
        let innings = self.innings_mut();
        let (at_over, at_ball) = (innings.overs, innings.balls);
        innings.ledger.append(record.clone(), at_over, at_ball)?;
        innings.apply(&record)?;
        innings.sync_positions();
        debug!(
            "match {}: ball {} recorded at {}.{}",
            self.id, record.id, record.over, record.ball_in_over
        );
        Ok(())
    }

    /// Remove the last ball and rebuild the innings by replaying what
    /// remains. Pointers restore from the ids frozen on the undone record;
    /// both setup gates reopen as they stood just before that ball (always
    /// satisfied, or it could not have been recorded).
    ///
    /// Returns the undone record so the engine can truncate the store.
    pub fn undo(&mut self) -> Result<BallRecord> {
        self.ensure_scorable()?;
        let innings = self.innings_mut();
        let undone = innings
            .ledger
            .truncate_last()
            .ok_or(ScoreError::NothingToUndo)?;

        innings.replay()?;
        innings.striker_id = Some(undone.striker_id);
        innings.non_striker_id = Some(undone.non_striker_id);
        innings.bowler_id = Some(undone.bowler_id);
        innings.pending_new_batsman = None;
        innings.pending_new_bowler = false;
        innings.sync_positions();
        debug!("match {}: ball {} undone", self.id, undone.id);
        Ok(undone)
    }

    /// Manual strike swap.
    pub fn swap_strike(&mut self) -> Result<()> {
        self.ensure_scorable()?;
        let innings = self.innings_mut();
        if innings.current_pair().is_none() {
            return Err(ScoreError::SetupRequired("opening batsmen"));
        }
        innings.rotate_strike();
        innings.sync_positions();
        Ok(())
    }

    /// Queue a camera-detected ball for review. Proposals never touch the
    /// scored state; promotion goes through the ordinary ball path.
    pub fn propose_ball(&mut self, input: BallInput, signal: Option<String>) -> Result<u64> {
        self.ensure_scorable()?;
        Ok(self.proposals.propose(input, signal))
    }

    /// Freeze the first innings and activate the second. The batsmen and
    /// bowler setup flow must run again before balls are accepted.
    pub fn switch_innings(&mut self) -> Result<()> {
        self.ensure_scorable()?;
        if self.current == InningsNumber::Second {
            return Err(ScoreError::SetupConflict("already in the second innings"));
        }
        self.current = InningsNumber::Second;
        debug!("match {}: second innings begins", self.id);
        Ok(())
    }
}
