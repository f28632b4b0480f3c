//! Context-sensitive pronunciation store.
//!
//! Maps `(syllable, tone context)` to a kana rendering. The table lives in
//! memory behind a `RwLock`: every mutation takes the write lock once and
//! either applies completely or not at all, so concurrent readers only ever
//! see whole batches. Durable stores persist through a checkpoint file plus a
//! write-ahead log (see [`wal`]).

mod persistence;
pub mod table;
#[cfg(test)]
mod tests;
pub mod wal;

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info, warn};

use crate::settings::settings;
use crate::tone::{ContextKey, FormatError, ToneContext, WildcardPattern};

use wal::{StoreWal, WalEntry};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// The handle was closed, or a writer panicked while holding the lock.
    #[error("pronunciation store is closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected YMPT)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("serialization error: {0}")]
    Serialize(bincode::Error),

    #[error("deserialization error: {0}")]
    Deserialize(bincode::Error),
}

/// One stored pronunciation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PronunciationRecord {
    pub syllable: String,
    pub context: ToneContext,
    pub kana: String,
}

impl PronunciationRecord {
    /// Build a record, validating that the context may carry an entry.
    ///
    /// Syllable and kana must stay on one line so every record survives a
    /// CSV export and re-import.
    pub fn parse(syllable: &str, context: &str, kana: &str) -> Result<Self, FormatError> {
        if let Some(field) = [syllable, kana].into_iter().find(|f| f.contains(['\n', '\r'])) {
            return Err(FormatError::LineBreak(field.to_string()));
        }
        Ok(Self {
            syllable: syllable.to_string(),
            context: ToneContext::parse_entry(context)?,
            kana: kana.to_string(),
        })
    }
}

/// What [`PronunciationStore::lookup_batch`] yields for a key with no entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    /// Echo the queried syllable.
    Keep,
    /// Use a fixed filler string.
    Literal(String),
}

impl Fallback {
    /// Filler for a missing `syllable`.
    pub fn resolve<'a>(&'a self, syllable: &'a str) -> &'a str {
        match self {
            Fallback::Keep => syllable,
            Fallback::Literal(s) => s,
        }
    }
}

impl From<&str> for Fallback {
    /// `"keep"` selects [`Fallback::Keep`]; any other string is a literal.
    fn from(policy: &str) -> Self {
        if policy == "keep" {
            Fallback::Keep
        } else {
            Fallback::Literal(policy.to_string())
        }
    }
}

pub(crate) type Table = HashMap<String, BTreeMap<ToneContext, String>>;

struct StoreState {
    table: Table,
    durable: Option<Durable>,
}

struct Durable {
    wal: StoreWal,
    compact_threshold: usize,
}

impl StoreState {
    fn record_count(&self) -> usize {
        self.table.values().map(BTreeMap::len).sum()
    }

    fn upsert(&mut self, records: Vec<PronunciationRecord>) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        if let Some(d) = self.durable.as_mut() {
            d.wal.append(&WalEntry::Upsert(records.clone()))?;
        }
        apply_upsert(&mut self.table, records);
        self.maybe_compact();
        Ok(())
    }

    fn remove(&mut self, syllable: &str, contexts: &[ToneContext]) -> Result<Vec<PronunciationRecord>, StoreError> {
        let Some(inner) = self.table.get(syllable) else {
            return Ok(Vec::new());
        };
        let hits: Vec<ToneContext> = contexts
            .iter()
            .copied()
            .filter(|ctx| inner.contains_key(ctx))
            .collect();
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(d) = self.durable.as_mut() {
            let keys = hits.iter().map(|&ctx| (syllable.to_string(), ctx)).collect();
            d.wal.append(&WalEntry::Remove(keys))?;
        }

        let mut removed = Vec::with_capacity(hits.len());
        if let Some(inner) = self.table.get_mut(syllable) {
            for ctx in hits {
                if let Some(kana) = inner.remove(&ctx) {
                    removed.push(PronunciationRecord {
                        syllable: syllable.to_string(),
                        context: ctx,
                        kana,
                    });
                }
            }
            if inner.is_empty() {
                self.table.remove(syllable);
            }
        }
        self.maybe_compact();
        Ok(removed)
    }

    /// Automatic checkpoint once the WAL reaches the threshold. The mutation
    /// that triggered it is already in the WAL, so a failure only leaves the
    /// log longer and the next write retries.
    fn maybe_compact(&mut self) {
        let needs = self
            .durable
            .as_ref()
            .is_some_and(|d| d.wal.entry_count() >= d.compact_threshold);
        if needs {
            if let Err(e) = self.checkpoint() {
                warn!(error = %e, "automatic checkpoint failed, keeping WAL");
            }
        }
    }

    fn checkpoint(&mut self) -> Result<(), StoreError> {
        let Some(d) = self.durable.as_mut() else {
            return Ok(());
        };
        persistence::save(&self.table, d.wal.checkpoint_path())?;
        d.wal.truncate()?;
        info!(
            path = %d.wal.checkpoint_path().display(),
            records = self.table.values().map(BTreeMap::len).sum::<usize>(),
            "pronunciation store checkpoint"
        );
        Ok(())
    }
}

pub(crate) fn apply_upsert(table: &mut Table, records: Vec<PronunciationRecord>) {
    for rec in records {
        table
            .entry(rec.syllable)
            .or_default()
            .insert(rec.context, rec.kana);
    }
}

pub(crate) fn apply_remove(table: &mut Table, keys: Vec<(String, ToneContext)>) {
    for (syllable, ctx) in keys {
        if let Some(inner) = table.get_mut(&syllable) {
            inner.remove(&ctx);
            if inner.is_empty() {
                table.remove(&syllable);
            }
        }
    }
}

fn records_of(syllable: &str, inner: &BTreeMap<ToneContext, String>) -> Vec<PronunciationRecord> {
    inner
        .iter()
        .map(|(&context, kana)| PronunciationRecord {
            syllable: syllable.to_string(),
            context,
            kana: kana.clone(),
        })
        .collect()
}

/// Shared handle to a pronunciation table.
///
/// Callers construct and inject a handle explicitly; there is no global
/// default instance. After [`close`](Self::close) every operation fails with
/// [`StoreError::Closed`].
pub struct PronunciationStore {
    inner: RwLock<Option<StoreState>>,
}

impl PronunciationStore {
    /// An empty, non-persistent store.
    pub fn in_memory() -> Self {
        Self::from_state(StoreState {
            table: Table::new(),
            durable: None,
        })
    }

    /// Open a durable store: load the checkpoint at `path` (empty if missing)
    /// and replay its write-ahead log.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::open_with_compact_threshold(path, settings().store.wal_compact_threshold)
    }

    /// [`open`](Self::open) with an explicit WAL frame count that triggers
    /// an automatic checkpoint.
    pub fn open_with_compact_threshold(path: &Path, compact_threshold: usize) -> Result<Self, StoreError> {
        let _span = debug_span!("store_open", path = %path.display()).entered();
        let mut table = persistence::open(path)?;
        let mut wal = StoreWal::new(path);
        let replayed = wal.replay(&mut table)?;
        debug!(replayed, syllables = table.len());
        Ok(Self::from_state(StoreState {
            table,
            durable: Some(Durable {
                wal,
                compact_threshold: compact_threshold.max(1),
            }),
        }))
    }

    fn from_state(state: StoreState) -> Self {
        Self {
            inner: RwLock::new(Some(state)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Option<StoreState>>, StoreError> {
        self.inner.read().map_err(|_| StoreError::Closed)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Option<StoreState>>, StoreError> {
        self.inner.write().map_err(|_| StoreError::Closed)
    }

    fn with_state<R>(&self, f: impl FnOnce(&StoreState) -> R) -> Result<R, StoreError> {
        let guard = self.read()?;
        let state = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(f(state))
    }

    fn with_state_mut<R>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut guard = self.write()?;
        let state = guard.as_mut().ok_or(StoreError::Closed)?;
        f(state)
    }

    /// Path of the checkpoint file, if this store is durable.
    pub fn path(&self) -> Result<Option<PathBuf>, StoreError> {
        self.with_state(|s| {
            s.durable
                .as_ref()
                .map(|d| d.wal.checkpoint_path().to_path_buf())
        })
    }

    /// Insert or replace one pronunciation.
    pub fn insert(&self, syllable: &str, context: &str, kana: &str) -> Result<(), StoreError> {
        let record = PronunciationRecord::parse(syllable, context, kana)?;
        self.insert_records(vec![record])
    }

    /// Insert or replace many pronunciations as one unit. Any malformed
    /// context aborts the whole batch before anything is written.
    pub fn insert_batch<S: AsRef<str>>(&self, entries: &[(S, S, S)]) -> Result<(), StoreError> {
        let records = entries
            .iter()
            .map(|(y, c, k)| PronunciationRecord::parse(y.as_ref(), c.as_ref(), k.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.insert_records(records)
    }

    /// Insert already-validated records as one unit.
    pub fn insert_records(&self, records: Vec<PronunciationRecord>) -> Result<(), StoreError> {
        for rec in &records {
            rec.context.validate_entry()?;
        }
        debug!(count = records.len(), "store upsert");
        self.with_state_mut(|s| s.upsert(records))
    }

    pub fn lookup_exact(&self, syllable: &str, context: &str) -> Result<Option<PronunciationRecord>, StoreError> {
        let ctx = ToneContext::parse_entry(context)?;
        self.with_state(|s| {
            s.table
                .get(syllable)
                .and_then(|inner| inner.get(&ctx))
                .map(|kana| PronunciationRecord {
                    syllable: syllable.to_string(),
                    context: ctx,
                    kana: kana.clone(),
                })
        })
    }

    /// All records whose context matches any expansion of `pattern`,
    /// ordered by context.
    pub fn lookup_wildcard(&self, syllable: &str, pattern: &str) -> Result<Vec<PronunciationRecord>, StoreError> {
        let pattern: WildcardPattern = pattern.parse()?;
        let contexts = pattern.expand();
        self.with_state(|s| {
            let Some(inner) = s.table.get(syllable) else {
                return Vec::new();
            };
            contexts
                .iter()
                .filter_map(|ctx| {
                    inner.get(ctx).map(|kana| PronunciationRecord {
                        syllable: syllable.to_string(),
                        context: *ctx,
                        kana: kana.clone(),
                    })
                })
                .collect()
        })
    }

    /// Every record stored for `syllable`.
    pub fn lookup_syllable(&self, syllable: &str) -> Result<Vec<PronunciationRecord>, StoreError> {
        self.with_state(|s| {
            s.table
                .get(syllable)
                .map(|inner| records_of(syllable, inner))
                .unwrap_or_default()
        })
    }

    /// Resolve an ordered batch of keys under a single read lock.
    ///
    /// The output has exactly one entry per key, in order. Keys may repeat
    /// or carry boundary digits; missing keys resolve through `fallback`.
    pub fn lookup_batch(&self, keys: &[ContextKey], fallback: &Fallback) -> Result<Vec<String>, StoreError> {
        let _span = debug_span!("lookup_batch", keys = keys.len()).entered();
        self.with_state(|s| {
            let mut misses = 0usize;
            let out: Vec<String> = keys
                .iter()
                .map(|key| {
                    match s.table.get(&key.syllable).and_then(|inner| inner.get(&key.context)) {
                        Some(kana) => kana.clone(),
                        None => {
                            misses += 1;
                            fallback.resolve(&key.syllable).to_string()
                        }
                    }
                })
                .collect();
            debug!(misses);
            out
        })
    }

    pub fn delete_exact(&self, syllable: &str, context: &str) -> Result<Option<PronunciationRecord>, StoreError> {
        let ctx = ToneContext::parse_entry(context)?;
        let mut removed = self.with_state_mut(|s| s.remove(syllable, &[ctx]))?;
        Ok(removed.pop())
    }

    /// Remove every record matching `pattern` and return what was removed.
    pub fn delete_wildcard(&self, syllable: &str, pattern: &str) -> Result<Vec<PronunciationRecord>, StoreError> {
        let pattern: WildcardPattern = pattern.parse()?;
        self.with_state_mut(|s| {
            let contexts: Vec<ToneContext> = s
                .table
                .get(syllable)
                .map(|inner| inner.keys().copied().filter(|&c| pattern.matches(c)).collect())
                .unwrap_or_default();
            s.remove(syllable, &contexts)
        })
    }

    pub fn delete_syllable(&self, syllable: &str) -> Result<Vec<PronunciationRecord>, StoreError> {
        self.with_state_mut(|s| {
            let contexts: Vec<ToneContext> = s
                .table
                .get(syllable)
                .map(|inner| inner.keys().copied().collect())
                .unwrap_or_default();
            s.remove(syllable, &contexts)
        })
    }

    /// All records, sorted by syllable then context.
    pub fn records(&self) -> Result<Vec<PronunciationRecord>, StoreError> {
        self.with_state(|s| {
            let mut all: Vec<PronunciationRecord> = s
                .table
                .iter()
                .flat_map(|(syllable, inner)| records_of(syllable, inner))
                .collect();
            all.sort();
            all
        })
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        self.with_state(StoreState::record_count)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        self.len().map(|n| n == 0)
    }

    /// Write the full table to the checkpoint file and truncate the WAL.
    /// No-op for in-memory stores.
    pub fn checkpoint(&self) -> Result<(), StoreError> {
        self.with_state_mut(StoreState::checkpoint)
    }

    /// Release the table. Durable stores checkpoint first. The handle is
    /// closed even if the final checkpoint fails.
    pub fn close(&self) -> Result<(), StoreError> {
        let mut guard = self.write()?;
        let mut state = guard.take().ok_or(StoreError::Closed)?;
        state.checkpoint()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.read().map_or(true, |g| g.is_none())
    }
}
