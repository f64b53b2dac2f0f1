use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use log::info;

use crate::error::{Result, ScoreError};
use crate::event::BallInput;
use crate::player::CreasePosition;
use crate::proposal::ProposedBall;
use crate::session::{Fixture, InningsNumber, MatchSession, MatchStatus, PlayerSetup};
use crate::snapshot::MatchSnapshot;
use crate::store::{LedgerMark, MatchStore, StoredMatch};

/// Configuration for a [`Scorebook`], in the builder style.
///
/// # Examples
///
/// ```no_run
/// use scorebook::Scorebook;
///
/// let book = Scorebook::builder("/var/lib/scorebook")
///     .archive_on_finish(true)
///     .open()
///     .unwrap();
/// ```
pub struct ScorebookBuilder {
    data_dir: PathBuf,
    archive_on_finish: bool,
}

impl ScorebookBuilder {
    /// Compress a match's ledgers into its archive automatically when the
    /// match reaches a terminal status. Off by default.
    pub fn archive_on_finish(mut self, yes: bool) -> Self {
        self.archive_on_finish = yes;
        self
    }

    pub fn open(self) -> Result<Scorebook> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(Scorebook {
            data_dir: self.data_dir,
            archive_on_finish: self.archive_on_finish,
            matches: RwLock::new(HashMap::new()),
        })
    }
}

struct Entry {
    session: MatchSession,
    store: MatchStore,
}

/// The multi-match scoring engine.
///
/// One aggregate per match id, each behind its own mutex: every mutating
/// operation locks exactly one match, so concurrent scorers on *different*
/// matches never contend, while per-match calls serialize. The cross-process
/// half of the boundary is the store's exclusive file lock.
///
/// Every mutating operation follows the same commit discipline: clone the
/// session, apply to the clone, persist, then swap the clone in. A failure
/// anywhere leaves the published aggregate in its pre-call state.
pub struct Scorebook {
    data_dir: PathBuf,
    archive_on_finish: bool,
    matches: RwLock<HashMap<String, Arc<Mutex<Entry>>>>,
}

impl Scorebook {
    pub fn builder(data_dir: impl AsRef<Path>) -> ScorebookBuilder {
        ScorebookBuilder {
            data_dir: data_dir.as_ref().to_path_buf(),
            archive_on_finish: false,
        }
    }

    /// Open a scoring session against a fixture: the match goes
    /// `scheduled → live` with both innings initialized empty.
    pub fn start_session(&self, fixture: Fixture, scorer: &str) -> Result<MatchSnapshot> {
        let id = fixture.id.clone();
        {
            let matches = self.read_map();
            if matches.contains_key(&id) {
                return Err(ScoreError::SetupConflict("match is already open"));
            }
        }

        let store = MatchStore::open(self.data_dir.join(&id))?;
        let mut session = MatchSession::new(fixture, scorer);
        session.start()?;
        let stored = build_checkpoint(&session, &store)?;
        store.save_checkpoint(&stored)?;
        info!("match {id}: session started by {scorer}");

        self.write_map()
            .insert(id, Arc::new(Mutex::new(Entry { session, store })));
        Ok(stored.snapshot)
    }

    /// Reopen a match persisted by an earlier process. The ledger files are
    /// replayed over the checkpoint's registry; a finished, archived match
    /// rebuilds from the ball logs embedded in the checkpoint instead.
    pub fn resume_match(&self, match_id: &str) -> Result<MatchSnapshot> {
        {
            let matches = self.read_map();
            if matches.contains_key(match_id) {
                return Err(ScoreError::SetupConflict("match is already open"));
            }
        }

        let store = MatchStore::open(self.data_dir.join(match_id))?;
        let stored = store
            .load_checkpoint()?
            .ok_or_else(|| ScoreError::UnknownMatch(match_id.to_string()))?;

        let (first, second) = if stored.snapshot.status.is_terminal()
            && store.archive_path().exists()
        {
            (
                stored.snapshot.first_innings.ball_log.clone(),
                stored.snapshot.second_innings.ball_log.clone(),
            )
        } else {
            store.verify_marks(&stored)?;
            (
                store.read_ledger(InningsNumber::First)?,
                store.read_ledger(InningsNumber::Second)?,
            )
        };

        let session = stored.snapshot.restore(first, second)?;
        let snapshot = MatchSnapshot::capture(&session);
        info!("match {match_id}: resumed at status {}", session.status);

        self.write_map().insert(
            match_id.to_string(),
            Arc::new(Mutex::new(Entry { session, store })),
        );
        Ok(snapshot)
    }

    /// Full snapshot of a match. Read-only, valid in any status.
    pub fn get_state(&self, match_id: &str) -> Result<MatchSnapshot> {
        let entry = self.entry(match_id)?;
        let guard = lock(&entry);
        Ok(MatchSnapshot::capture(&guard.session))
    }

    /// Name the opening pair for the current innings.
    pub fn set_batsmen(
        &self,
        match_id: &str,
        striker: &PlayerSetup,
        non_striker: &PlayerSetup,
        auto_assign: bool,
    ) -> Result<MatchSnapshot> {
        self.mutate(match_id, |s| s.set_batsmen(striker, non_striker, auto_assign))
    }

    /// Name the bowler for the next over.
    pub fn set_bowler(&self, match_id: &str, name: &str, shirt_number: u8) -> Result<MatchSnapshot> {
        self.mutate(match_id, |s| s.set_bowler(name, shirt_number))
    }

    /// Record one ball. The record is appended durably before the fold runs;
    /// if the fold then refuses it, the append is rolled back.
    pub fn record_ball(&self, match_id: &str, input: &BallInput) -> Result<MatchSnapshot> {
        let entry = self.entry(match_id)?;
        let mut guard = lock(&entry);

        let record = guard.session.prepare_ball(input)?;
        let innings_no = guard.session.current;
        guard.store.append_ball(innings_no, &record)?;

        let mut next = guard.session.clone();
        let committed = next
            .commit_ball(record)
            .and_then(|()| build_checkpoint(&next, &guard.store))
            .and_then(|stored| {
                guard.store.save_checkpoint(&stored)?;
                Ok(stored)
            });
        match committed {
            Ok(stored) => {
                guard.session = next;
                Ok(stored.snapshot)
            }
            Err(e) => {
                let _ = guard.store.truncate_last(innings_no);
                Err(e)
            }
        }
    }

    /// Bring in the replacement batsman after a wicket.
    pub fn new_batsman(
        &self,
        match_id: &str,
        incoming: &PlayerSetup,
        position: CreasePosition,
    ) -> Result<MatchSnapshot> {
        self.mutate(match_id, |s| s.new_batsman(incoming, position))
    }

    /// Remove the last recorded ball and rebuild the innings by replay.
    /// The durable truncation is rolled back if the checkpoint then fails.
    pub fn undo(&self, match_id: &str) -> Result<MatchSnapshot> {
        let entry = self.entry(match_id)?;
        let mut guard = lock(&entry);

        let mut next = guard.session.clone();
        let innings_no = next.current;
        let undone = next.undo()?;
        guard.store.truncate_last(innings_no)?;

        let committed = build_checkpoint(&next, &guard.store).and_then(|stored| {
            guard.store.save_checkpoint(&stored)?;
            Ok(stored)
        });
        match committed {
            Ok(stored) => {
                guard.session = next;
                Ok(stored.snapshot)
            }
            Err(e) => {
                let _ = guard.store.append_ball(innings_no, &undone);
                Err(e)
            }
        }
    }

    /// Manual strike swap.
    pub fn swap_strike(&self, match_id: &str) -> Result<MatchSnapshot> {
        self.mutate(match_id, |s| s.swap_strike())
    }

    /// Freeze the first innings and activate the second.
    pub fn switch_innings(&self, match_id: &str) -> Result<MatchSnapshot> {
        self.mutate(match_id, |s| s.switch_innings())
    }

    /// Walk one edge of the status machine. Reaching a terminal status with
    /// `archive_on_finish` set also compresses the ledgers.
    pub fn set_status(&self, match_id: &str, to: MatchStatus) -> Result<MatchSnapshot> {
        let snapshot = self.mutate(match_id, |s| s.set_status(to))?;
        if to.is_terminal() && self.archive_on_finish {
            self.archive_match(match_id)?;
        }
        Ok(snapshot)
    }

    /// Compress a finished match's ledgers into its archive file.
    pub fn archive_match(&self, match_id: &str) -> Result<()> {
        let entry = self.entry(match_id)?;
        let mut guard = lock(&entry);
        if !guard.session.status.is_terminal() {
            return Err(ScoreError::InvalidTransition {
                status: guard.session.status,
            });
        }
        guard.store.archive()?;
        info!("match {match_id}: ledgers archived");
        Ok(())
    }

    /// Queue a camera-detected ball for human review. Nothing is scored.
    pub fn propose_ball(
        &self,
        match_id: &str,
        input: BallInput,
        signal: Option<String>,
    ) -> Result<u64> {
        let entry = self.entry(match_id)?;
        let mut guard = lock(&entry);
        guard.session.propose_ball(input, signal)
    }

    /// Proposals awaiting review for a match.
    pub fn pending_proposals(&self, match_id: &str) -> Result<Vec<ProposedBall>> {
        let entry = self.entry(match_id)?;
        let guard = lock(&entry);
        Ok(guard.session.proposals.pending().to_vec())
    }

    /// Promote a proposal: the ball travels through the ordinary record-ball
    /// path, and the proposal is only consumed if recording succeeds.
    pub fn accept_proposal(&self, match_id: &str, proposal_id: u64) -> Result<MatchSnapshot> {
        let input = {
            let entry = self.entry(match_id)?;
            let guard = lock(&entry);
            guard.session.proposals.get(proposal_id)?.input.clone()
        };
        let snapshot = self.record_ball(match_id, &input)?;
        let entry = self.entry(match_id)?;
        let mut guard = lock(&entry);
        let _ = guard.session.proposals.accept(proposal_id);
        Ok(snapshot)
    }

    /// Discard a proposal.
    pub fn reject_proposal(&self, match_id: &str, proposal_id: u64) -> Result<()> {
        let entry = self.entry(match_id)?;
        let mut guard = lock(&entry);
        guard.session.proposals.reject(proposal_id)
    }

    /// Ids of the matches currently open in this engine.
    pub fn open_matches(&self) -> Vec<String> {
        self.read_map().keys().cloned().collect()
    }

    /// Close a match's in-memory session, releasing its store lock. State
    /// stays on disk; [`Scorebook::resume_match`] reopens it.
    pub fn close_match(&self, match_id: &str) -> Result<()> {
        self.write_map()
            .remove(match_id)
            .map(|_| ())
            .ok_or_else(|| ScoreError::UnknownMatch(match_id.to_string()))
    }

    fn entry(&self, match_id: &str) -> Result<Arc<Mutex<Entry>>> {
        self.read_map()
            .get(match_id)
            .cloned()
            .ok_or_else(|| ScoreError::UnknownMatch(match_id.to_string()))
    }

    /// Clone-apply-persist-swap, the shared path for every mutation that
    /// touches no ledger file beyond the checkpoint.
    fn mutate<F>(&self, match_id: &str, op: F) -> Result<MatchSnapshot>
    where
        F: FnOnce(&mut MatchSession) -> Result<()>,
    {
        let entry = self.entry(match_id)?;
        let mut guard = lock(&entry);

        let mut next = guard.session.clone();
        op(&mut next)?;
        let stored = build_checkpoint(&next, &guard.store)?;
        guard.store.save_checkpoint(&stored)?;
        guard.session = next;
        Ok(stored.snapshot)
    }

    fn read_map(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<Mutex<Entry>>>> {
        self.matches.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write_map(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<Mutex<Entry>>>> {
        self.matches.write().unwrap_or_else(|p| p.into_inner())
    }
}

/// A poisoned lock means a thread panicked mid-call; the clone-then-swap
/// commit discipline keeps the published session consistent, so the lock is
/// safe to take regardless.
fn lock(entry: &Arc<Mutex<Entry>>) -> MutexGuard<'_, Entry> {
    entry.lock().unwrap_or_else(|p| p.into_inner())
}

fn build_checkpoint(session: &MatchSession, store: &MatchStore) -> Result<StoredMatch> {
    Ok(StoredMatch {
        snapshot: MatchSnapshot::capture(session),
        first_mark: LedgerMark {
            entries: session.first.ledger.len() as u64,
            last_hash: store.last_line_hash(InningsNumber::First)?,
        },
        second_mark: LedgerMark {
            entries: session.second.ledger.len() as u64,
            last_hash: store.last_line_hash(InningsNumber::Second)?,
        },
    })
}
