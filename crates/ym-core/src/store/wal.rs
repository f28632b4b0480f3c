//! Write-ahead log for durable pronunciation stores.
//!
//! Every committed mutation appends one frame instead of rewriting the whole
//! table. A checkpoint writes the full table and truncates the log.
//!
//! Frame layout: `u32 LE payload length | u32 LE crc32 | bincode payload`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{apply_remove, apply_upsert, PronunciationRecord, StoreError, Table};
use crate::tone::ToneContext;

const FRAME_HEADER: usize = 8;

/// One committed mutation.
#[derive(Debug, Serialize, Deserialize)]
pub enum WalEntry {
    Upsert(Vec<PronunciationRecord>),
    Remove(Vec<(String, ToneContext)>),
}

/// WAL state that lives alongside a checkpoint file.
pub struct StoreWal {
    checkpoint_path: PathBuf,
    /// `<checkpoint>.wal`
    wal_path: PathBuf,
    /// Kept open in append mode between entries.
    file: Option<File>,
    /// Entries since the last checkpoint.
    entry_count: usize,
}

impl StoreWal {
    pub fn new(checkpoint_path: &Path) -> Self {
        let mut wal_path = checkpoint_path.as_os_str().to_owned();
        wal_path.push(".wal");
        Self {
            checkpoint_path: checkpoint_path.to_path_buf(),
            wal_path: PathBuf::from(wal_path),
            file: None,
            entry_count: 0,
        }
    }

    /// Replay the log into `table`, stopping at the first truncated or
    /// corrupt frame and cutting the file back to the last good frame.
    /// Returns the number of entries applied.
    pub fn replay(&mut self, table: &mut Table) -> Result<usize, StoreError> {
        let data = match fs::read(&self.wal_path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.entry_count = 0;
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let mut count = 0;
        let mut pos = 0;
        while pos + FRAME_HEADER <= data.len() {
            let length = read_u32(&data[pos..pos + 4]) as usize;
            let expected_crc = read_u32(&data[pos + 4..pos + 8]);
            let end = pos + FRAME_HEADER + length;

            if length == 0 || end > data.len() {
                warn!(offset = pos, "truncated WAL frame, discarding tail");
                break;
            }

            let payload = &data[pos + FRAME_HEADER..end];
            if crc32fast::hash(payload) != expected_crc {
                warn!(offset = pos, "WAL frame checksum mismatch, discarding tail");
                break;
            }

            match bincode::deserialize::<WalEntry>(payload) {
                Ok(WalEntry::Upsert(records)) => apply_upsert(table, records),
                Ok(WalEntry::Remove(keys)) => apply_remove(table, keys),
                Err(e) => {
                    warn!(offset = pos, error = %e, "undecodable WAL frame, discarding tail");
                    break;
                }
            }
            count += 1;
            pos = end;
        }

        if pos < data.len() {
            // later appends must follow the last good frame
            OpenOptions::new()
                .write(true)
                .open(&self.wal_path)?
                .set_len(pos as u64)?;
            warn!(kept = pos, dropped = data.len() - pos, "trimmed damaged WAL tail");
        }

        self.entry_count = count;
        Ok(count)
    }

    pub fn append(&mut self, entry: &WalEntry) -> Result<(), StoreError> {
        let payload = bincode::serialize(entry).map_err(StoreError::Serialize)?;
        let length = payload.len() as u32;
        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(FRAME_HEADER + payload.len());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&payload);

        let file = self.open_file()?;
        file.write_all(&frame)?;
        file.flush()?;

        self.entry_count += 1;
        Ok(())
    }

    fn open_file(&mut self) -> io::Result<&mut File> {
        match &mut self.file {
            Some(f) => Ok(f),
            slot @ None => {
                if let Some(parent) = self.wal_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let f = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.wal_path)?;
                Ok(slot.insert(f))
            }
        }
    }

    /// Truncate the log after a checkpoint has been written.
    pub fn truncate(&mut self) -> io::Result<()> {
        self.file = None;
        File::create(&self.wal_path)?;
        self.entry_count = 0;
        Ok(())
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}
