use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{apply_upsert, records_of, PronunciationRecord, StoreError, Table};

const MAGIC: &[u8; 4] = b"YMPT";
const VERSION: u8 = 1;
const HEADER_LEN: usize = 5;

#[derive(Serialize, Deserialize)]
struct StoreData {
    records: Vec<PronunciationRecord>,
}

/// Serialize a table to the checkpoint format (YMPT).
pub(super) fn to_bytes(table: &Table) -> Result<Vec<u8>, StoreError> {
    let mut records: Vec<PronunciationRecord> = table
        .iter()
        .flat_map(|(syllable, inner)| records_of(syllable, inner))
        .collect();
    records.sort();
    let body = bincode::serialize(&StoreData { records }).map_err(StoreError::Serialize)?;

    let mut buf = Vec::with_capacity(HEADER_LEN + body.len());
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.extend_from_slice(&body);
    Ok(buf)
}

pub(super) fn from_bytes(bytes: &[u8]) -> Result<Table, StoreError> {
    if bytes.len() < HEADER_LEN {
        return Err(StoreError::InvalidHeader);
    }
    if &bytes[0..4] != MAGIC {
        return Err(StoreError::InvalidMagic);
    }
    if bytes[4] != VERSION {
        return Err(StoreError::UnsupportedVersion(bytes[4]));
    }
    let data: StoreData =
        bincode::deserialize(&bytes[HEADER_LEN..]).map_err(StoreError::Deserialize)?;

    let mut table = Table::new();
    apply_upsert(&mut table, data.records);
    Ok(table)
}

/// Atomic write: write to .tmp then rename.
pub(super) fn save(table: &Table, path: &Path) -> Result<(), StoreError> {
    let bytes = to_bytes(table)?;
    let tmp = path.with_extension("tmp");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load a checkpoint, returning an empty table if the file doesn't exist.
pub(super) fn open(path: &Path) -> Result<Table, StoreError> {
    match fs::read(path) {
        Ok(bytes) => from_bytes(&bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Table::new()),
        Err(e) => Err(e.into()),
    }
}
