use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use yukkuri_engine::store::table::{TableError, TableImport};
use yukkuri_engine::{PronunciationRecord, PronunciationStore, StoreError};

use crate::report::{format_report, now};

#[derive(Debug, thiserror::Error)]
pub enum StoreOpError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub fn default_store_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    format!("{home}/.local/share/yukkuri/pronunciation.ymp")
}

fn open(path: &Path) -> PronunciationStore {
    if let Some(parent) = path.parent() {
        die!(fs::create_dir_all(parent), "Error creating {}: {}", parent.display());
    }
    die!(PronunciationStore::open(path), "Error opening store: {}")
}

fn print_report(operation: &str, records: &[PronunciationRecord]) {
    print!("{}", format_report(operation, &now(), records));
}

/// Read a CSV table from `file` and insert its valid rows as one batch.
pub fn import_file(store: &PronunciationStore, file: &Path) -> Result<TableImport, StoreOpError> {
    let text = fs::read_to_string(file).map_err(|source| StoreOpError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    Ok(store.import_table(&text)?)
}

/// Write every record as CSV to `file`; returns the record count.
pub fn export_file(store: &PronunciationStore, file: &Path) -> Result<usize, StoreOpError> {
    let records = store.records()?;
    let text = yukkuri_engine::store::table::format_table(&records);
    fs::write(file, text).map_err(|source| StoreOpError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    Ok(records.len())
}

pub fn store_add(path: &Path, syllable: &str, context: &str, kana: &str) {
    let store = open(path);
    die!(store.insert(syllable, context, kana), "Error: {}");
    let added = die!(store.lookup_exact(syllable, context), "Error: {}");
    die!(store.close(), "Error saving store: {}");
    print_report("add", added.as_slice());
}

pub fn store_search(path: &Path, syllable: &str, pattern: &str) {
    let store = open(path);
    let found = die!(store.lookup_wildcard(syllable, pattern), "Error: {}");
    print_report("search", &found);
}

/// Delete by pattern, or every context of `syllable` when no pattern is given.
pub fn store_delete(path: &Path, syllable: &str, pattern: Option<&str>) {
    let store = open(path);
    let removed = match pattern {
        Some(p) => die!(store.delete_wildcard(syllable, p), "Error: {}"),
        None => die!(store.delete_syllable(syllable), "Error: {}"),
    };
    die!(store.close(), "Error saving store: {}");
    print_report("delete", &removed);
}

pub fn store_list(path: &Path) {
    let store = open(path);
    let records = die!(store.records(), "Error: {}");
    print_report("list", &records);
}

pub fn store_import(path: &Path, file: &Path) {
    let store = open(path);
    let import = die!(import_file(&store, file), "Error importing: {}");
    die!(store.close(), "Error saving store: {}");
    for err in &import.errors {
        eprintln!("skipped {err}");
    }
    print_report("import", &import.records);
}

pub fn store_export(path: &Path, file: &Path) {
    let store = open(path);
    let n = die!(export_file(&store, file), "Error exporting: {}");
    println!("Exported {n} records to {}", file.display());
}
