use fs2::FileExt;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::archive;
use crate::event::BallRecord;
use crate::session::InningsNumber;
use crate::snapshot::{self, MatchSnapshot};

/// Compute xxh64 hash of raw line bytes (without trailing newline), hex-encoded.
pub fn line_hash(line: &[u8]) -> String {
    let hash = xxhash_rust::xxh64::xxh64(line, 0);
    format!("{hash:016x}")
}

/// Where the ledgers stood when a checkpoint was written. Used to detect a
/// checkpoint that diverged from the files behind it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerMark {
    pub entries: u64,
    pub last_hash: Option<String>,
}

/// The on-disk checkpoint: the full match snapshot plus a mark per innings
/// ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMatch {
    pub snapshot: MatchSnapshot,
    pub first_mark: LedgerMark,
    pub second_mark: LedgerMark,
}

/// Durable storage for one match.
///
/// Layout under `<data_dir>/<match_id>/`:
///
/// ```text
/// match.lock           exclusive writer lock (held while the store is open)
/// innings1.jsonl       first-innings ball ledger, one JSON line per ball
/// innings2.jsonl       second-innings ball ledger
/// match.snapshot.json  checkpoint of the full aggregate, written atomically
/// archive.jsonl.zst    compressed ledgers of a finished match
/// ```
///
/// Appends are `sync_data`'d; a partial trailing line (crash mid-write) is
/// skipped on read. Undo truncates the ledger file at the byte where the
/// last complete line starts.
#[derive(Debug)]
pub struct MatchStore {
    dir: PathBuf,
    /// Held for the lifetime of the store; the OS releases it with the handle.
    _lock_file: File,
    ledger_paths: [PathBuf; 2],
    ledger_files: [File; 2],
    snapshot_path: PathBuf,
    archive_path: PathBuf,
}

impl MatchStore {
    /// Open or create the store for one match, taking the exclusive writer
    /// lock. A second open on the same directory fails with
    /// [`io::ErrorKind::AlreadyExists`] — this is the cross-process half of
    /// the one-writer-per-match boundary.
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let lock_path = dir.join("match.lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        lock_file.try_lock_exclusive().map_err(|_| {
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!(
                    "another writer holds the lock on {}",
                    lock_path.display()
                ),
            )
        })?;

        let ledger_paths = [dir.join("innings1.jsonl"), dir.join("innings2.jsonl")];
        // A crash mid-append can leave a partial last line; clear it before
        // taking append handles so the next ball starts on a clean line.
        for path in &ledger_paths {
            trim_partial_tail(path)?;
        }
        let open_ledger = |path: &Path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
        };
        let ledger_files = [open_ledger(&ledger_paths[0])?, open_ledger(&ledger_paths[1])?];

        Ok(MatchStore {
            snapshot_path: dir.join("match.snapshot.json"),
            archive_path: dir.join("archive.jsonl.zst"),
            _lock_file: lock_file,
            ledger_paths,
            ledger_files,
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    fn idx(innings: InningsNumber) -> usize {
        match innings {
            InningsNumber::First => 0,
            InningsNumber::Second => 1,
        }
    }

    /// Append a ball as a single JSON line and flush to disk. Returns the
    /// byte offset where the line starts.
    pub fn append_ball(&mut self, innings: InningsNumber, record: &BallRecord) -> io::Result<u64> {
        let file = &mut self.ledger_files[Self::idx(innings)];
        let offset = file.seek(SeekFrom::End(0))?;
        let json = serde_json::to_string(record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(file, "{json}")?;
        file.sync_data()?;
        Ok(offset)
    }

    /// Read an innings' complete ledger back. Empty lines are skipped; a
    /// partial trailing line (missing its newline) is skipped silently.
    pub fn read_ledger(&self, innings: InningsNumber) -> io::Result<Vec<BallRecord>> {
        let path = &self.ledger_paths[Self::idx(innings)];
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let reader = BufReader::new(file);

        let mut records = Vec::new();
        let mut pos = 0u64;
        for line in reader.lines() {
            let line = line?;
            let line_bytes = line.len() as u64;
            // Content reaching exactly EOF without a trailing newline is a
            // partial line from a crash mid-write.
            if pos + line_bytes >= file_len {
                break;
            }
            pos += line_bytes + 1;
            if line.is_empty() {
                continue;
            }
            let record: BallRecord = serde_json::from_str(&line)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            records.push(record);
        }
        Ok(records)
    }

    /// Remove the last complete line from an innings' ledger file (the
    /// durable half of undo). Any trailing partial line (crash residue) is
    /// dropped along with it — the read side never surfaced it as a ball.
    /// No-op on an empty ledger.
    pub fn truncate_last(&mut self, innings: InningsNumber) -> io::Result<()> {
        let i = Self::idx(innings);
        let path = &self.ledger_paths[i];
        let data = fs::read(path)?;

        // End of the complete region: just past the final newline.
        let complete_end = match data.iter().rposition(|&b| b == b'\n') {
            Some(pos) => pos + 1,
            None => 0,
        };
        if complete_end == 0 {
            // Nothing but partial content (or empty) — no recorded ball to
            // remove, but clear the residue.
            if !data.is_empty() {
                let file = OpenOptions::new().write(true).open(path)?;
                file.set_len(0)?;
                file.sync_data()?;
            }
            return Ok(());
        }

        // The last complete line starts after the newline before its own.
        let start = match data[..complete_end - 1].iter().rposition(|&b| b == b'\n') {
            Some(pos) => pos as u64 + 1,
            None => 0,
        };
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(start)?;
        file.sync_data()?;

        // The append handle's cursor may sit past the new end; reopen it.
        self.ledger_files[i] = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(())
    }

    /// Hash of the last complete line, for the checkpoint's ledger mark.
    pub fn last_line_hash(&self, innings: InningsNumber) -> io::Result<Option<String>> {
        let records = self.read_ledger(innings)?;
        let last = match records.last() {
            Some(last) => last,
            None => return Ok(None),
        };
        let json = serde_json::to_string(last)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Some(line_hash(json.as_bytes())))
    }

    /// Write the checkpoint atomically.
    pub fn save_checkpoint(&self, stored: &StoredMatch) -> io::Result<()> {
        snapshot::save(&self.snapshot_path, stored)
    }

    /// Load the checkpoint. `Ok(None)` when missing or corrupt — a corrupt
    /// checkpoint is treated as a missing one.
    pub fn load_checkpoint(&self) -> io::Result<Option<StoredMatch>> {
        snapshot::load(&self.snapshot_path)
    }

    /// Verify a loaded checkpoint's marks against the ledger files, warning
    /// on divergence. The caller replays the files regardless; this only
    /// surfaces that the checkpoint went stale.
    pub fn verify_marks(&self, stored: &StoredMatch) -> io::Result<()> {
        for (innings, mark) in [
            (InningsNumber::First, &stored.first_mark),
            (InningsNumber::Second, &stored.second_mark),
        ] {
            let records = self.read_ledger(innings)?;
            let hash = self.last_line_hash(innings)?;
            if records.len() as u64 != mark.entries || hash != mark.last_hash {
                warn!(
                    "match store {}: checkpoint mark out of step with ledger \
                     ({} entries on disk, {} marked); replaying the files",
                    self.dir.display(),
                    records.len(),
                    mark.entries
                );
            }
        }
        Ok(())
    }

    /// Compress both ledgers into the archive (one zstd frame per innings)
    /// and remove the live ledger files. Valid once a match is finished;
    /// the snapshot checkpoint stays behind for reads.
    pub fn archive(&mut self) -> io::Result<()> {
        for i in 0..2 {
            let data = fs::read(&self.ledger_paths[i])?;
            archive::append_compressed_frame(&self.archive_path, &data)?;
        }
        // The open append handles keep the unlinked inodes alive, which is
        // fine: a finished match takes no further appends.
        for path in &self.ledger_paths {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Stream the archived ledgers back as one decompressed byte stream.
    pub fn open_archive_reader(&self) -> io::Result<Option<Box<dyn BufRead>>> {
        archive::open_archive_reader(&self.archive_path)
    }
}

fn trim_partial_tail(path: &Path) -> io::Result<()> {
    let data = match fs::read(path) {
        Ok(d) => d,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if data.is_empty() {
        return Ok(());
    }
    let complete_end = data
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|pos| pos as u64 + 1)
        .unwrap_or(0);
    if complete_end < data.len() as u64 {
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(complete_end)?;
        file.sync_data()?;
    }
    Ok(())
}
