//! The full match snapshot returned by every operation, and its
//! persistence helpers.

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::Result;
use crate::event::{BallRecord, PlayerId};
use crate::innings::{Extras, Innings};
use crate::ledger::Ledger;
use crate::player::{Batsman, Bowler, CreasePosition};
use crate::proposal::ProposalInbox;
use crate::session::{Fixture, InningsNumber, MatchSession, MatchStatus};

/// A batsman's record plus the derived strike rate, so clients never
/// compute figures locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatsmanCard {
    #[serde(flatten)]
    pub batsman: Batsman,
    pub strike_rate: f64,
}

/// Serialized view of one innings: totals, figures, pointers, gates, and
/// the complete ball log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InningsSnapshot {
    pub batting_team: String,
    pub bowling_team: String,
    pub runs: u32,
    pub wickets: u8,
    pub overs: u8,
    pub balls: u8,
    pub run_rate: f64,
    pub extras: Extras,
    pub batsmen: Vec<BatsmanCard>,
    pub bowlers: Vec<Bowler>,
    pub striker_id: Option<PlayerId>,
    pub non_striker_id: Option<PlayerId>,
    pub bowler_id: Option<PlayerId>,
    /// Set while a wicket's replacement is still due — clients use it to
    /// raise the new-batsman dialog.
    pub pending_new_batsman: Option<CreasePosition>,
    /// Set between the end of an over and the next bowler being named.
    pub pending_new_bowler: bool,
    pub ball_log: Vec<BallRecord>,
}

impl InningsSnapshot {
    pub fn capture(innings: &Innings) -> Self {
        InningsSnapshot {
            batting_team: innings.batting_team.clone(),
            bowling_team: innings.bowling_team.clone(),
            runs: innings.runs,
            wickets: innings.wickets,
            overs: innings.overs,
            balls: innings.balls,
            run_rate: innings.run_rate(),
            extras: innings.extras,
            batsmen: innings
                .registry
                .batsmen
                .iter()
                .map(|b| BatsmanCard {
                    batsman: b.clone(),
                    strike_rate: b.strike_rate(),
                })
                .collect(),
            bowlers: innings.registry.bowlers.clone(),
            striker_id: innings.striker_id,
            non_striker_id: innings.non_striker_id,
            bowler_id: innings.bowler_id,
            pending_new_batsman: innings.pending_new_batsman,
            pending_new_bowler: innings.pending_new_bowler,
            ball_log: innings.ledger.entries().to_vec(),
        }
    }
}

/// The complete match state, serialized in its entirety on every call so
/// the client never derives anything locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub id: String,
    pub fixture: Fixture,
    pub scorer: String,
    pub status: MatchStatus,
    pub current_innings: InningsNumber,
    pub created_ts: u64,
    pub first_innings: InningsSnapshot,
    pub second_innings: InningsSnapshot,
    /// Camera proposals awaiting review. Informational; never part of the
    /// scored state.
    pub pending_proposals: usize,
    /// Whether runs auto-credit the striker.
    pub auto_assign: bool,
}

impl MatchSnapshot {
    pub fn capture(session: &MatchSession) -> Self {
        MatchSnapshot {
            id: session.id.clone(),
            fixture: session.fixture.clone(),
            scorer: session.scorer.clone(),
            status: session.status,
            current_innings: session.current,
            created_ts: session.created_ts,
            first_innings: InningsSnapshot::capture(&session.first),
            second_innings: InningsSnapshot::capture(&session.second),
            pending_proposals: session.proposals.pending().len(),
            auto_assign: session.auto_assign,
        }
    }

    /// Snapshot of whichever innings is being scored.
    pub fn current(&self) -> &InningsSnapshot {
        match self.current_innings {
            InningsNumber::First => &self.first_innings,
            InningsNumber::Second => &self.second_innings,
        }
    }

    /// Rebuild a live session from a persisted snapshot and the ledgers
    /// read back from disk.
    ///
    /// The ledger files are authoritative for balls: each innings replays
    /// its ledger over the snapshot's registry membership, and a mismatch
    /// against the snapshot's totals is logged and resolved in the
    /// replay's favor.
    pub fn restore(
        self,
        first_ledger: Vec<BallRecord>,
        second_ledger: Vec<BallRecord>,
    ) -> Result<MatchSession> {
        let first = restore_innings(&self.first_innings, first_ledger)?;
        let second = restore_innings(&self.second_innings, second_ledger)?;

        for (name, innings, snap) in [
            ("first", &first, &self.first_innings),
            ("second", &second, &self.second_innings),
        ] {
            if innings.runs != snap.runs || innings.wickets != snap.wickets {
                warn!(
                    "match {}: {} innings snapshot said {}/{}, replay produced {}/{}; \
                     trusting the replay",
                    self.id, name, snap.runs, snap.wickets, innings.runs, innings.wickets
                );
            }
        }

        Ok(MatchSession {
            id: self.id,
            fixture: self.fixture,
            scorer: self.scorer,
            status: self.status,
            current: self.current_innings,
            created_ts: self.created_ts,
            first,
            second,
            auto_assign: self.auto_assign,
            proposals: ProposalInbox::default(),
        })
    }
}

fn restore_innings(snap: &InningsSnapshot, ledger: Vec<BallRecord>) -> Result<Innings> {
    let mut innings = Innings::new(&snap.batting_team, &snap.bowling_team);
    innings.registry.batsmen = snap.batsmen.iter().map(|c| c.batsman.clone()).collect();
    innings.registry.bowlers = snap.bowlers.clone();
    innings.ledger = Ledger::from_entries(ledger)?;
    innings.replay()?;
    innings.striker_id = snap.striker_id;
    innings.non_striker_id = snap.non_striker_id;
    innings.bowler_id = snap.bowler_id;
    innings.pending_new_batsman = snap.pending_new_batsman;
    innings.pending_new_bowler = snap.pending_new_bowler;
    innings.sync_positions();
    Ok(innings)
}

/// Save a value as pretty JSON, atomically (`.tmp` write + sync + rename).
/// A crash mid-write leaves the previous file intact.
pub(crate) fn save<S: Serialize>(path: &Path, value: &S) -> io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");

    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(json.as_bytes())?;
    file.sync_data()?;
    drop(file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Load a persisted JSON value. `Ok(None)` when the file doesn't exist or
/// doesn't parse (a corrupt checkpoint is treated as missing).
pub(crate) fn load<S: DeserializeOwned>(path: &Path) -> io::Result<Option<S>> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    match serde_json::from_str(&contents) {
        Ok(value) => Ok(Some(value)),
        Err(_) => Ok(None),
    }
}
