//! Cold storage for finished matches: each innings ledger is appended to
//! the archive as its own zstd frame, and reads stream back through all
//! frames as one continuous byte sequence.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

const COMPRESSION_LEVEL: i32 = 3;

/// Compress one ledger's bytes and append them as a new frame, creating
/// the archive file on first use.
pub fn append_compressed_frame(archive_path: &Path, ledger_bytes: &[u8]) -> io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(archive_path)?;
    let mut encoder = zstd::Encoder::new(file, COMPRESSION_LEVEL)?;
    encoder.write_all(ledger_bytes)?;
    let file = encoder.finish()?;
    file.sync_data()?;
    Ok(())
}

/// Open a streaming decompressor over every archived frame in order.
/// `Ok(None)` when the match has never been archived.
pub fn open_archive_reader(archive_path: &Path) -> io::Result<Option<Box<dyn BufRead>>> {
    if !archive_path.exists() {
        return Ok(None);
    }
    let file = File::open(archive_path)?;
    let decoder = zstd::Decoder::new(file)?;
    Ok(Some(Box::new(BufReader::new(decoder))))
}
