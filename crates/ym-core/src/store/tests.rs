use std::fs;
use std::sync::Arc;
use std::thread;

use super::wal::{StoreWal, WalEntry};
use super::*;
use crate::tone::Tone;

fn key(syllable: &str, context: &str) -> ContextKey {
    ContextKey::new(syllable, context.parse().unwrap())
}

fn kana_of(records: &[PronunciationRecord]) -> Vec<&str> {
    records.iter().map(|r| r.kana.as_str()).collect()
}

#[test]
fn test_insert_and_lookup_exact() {
    let store = PronunciationStore::in_memory();
    store.insert("ni", "023", "に").unwrap();
    let rec = store.lookup_exact("ni", "023").unwrap().unwrap();
    assert_eq!(rec.kana, "に");
    assert_eq!(rec.context.own(), Tone::SECOND);
    assert!(store.lookup_exact("ni", "024").unwrap().is_none());
    assert!(store.lookup_exact("hao", "023").unwrap().is_none());
}

#[test]
fn test_replace_on_conflict() {
    let store = PronunciationStore::in_memory();
    store.insert("ma", "151", "ま").unwrap();
    store.insert("ma", "151", "まぁ").unwrap();
    assert_eq!(store.len().unwrap(), 1);
    assert_eq!(store.lookup_exact("ma", "151").unwrap().unwrap().kana, "まぁ");
}

#[test]
fn test_insert_rejects_malformed_context() {
    let store = PronunciationStore::in_memory();
    for bad in ["12", "1234", "1a3", "1*3", "103", ""] {
        let err = store.insert("ma", bad, "ま").unwrap_err();
        assert!(matches!(err, StoreError::Format(_)), "{bad}: {err}");
    }
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_insert_batch_is_all_or_nothing() {
    let store = PronunciationStore::in_memory();
    let err = store
        .insert_batch(&[("a", "111", "あ"), ("b", "222", "ば"), ("c", "303", "つぁ")])
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Format(FormatError::BoundaryMiddle(_))
    ));
    assert!(store.is_empty().unwrap());

    store
        .insert_batch(&[("a", "111", "あ"), ("b", "222", "ば"), ("a", "111", "ああ")])
        .unwrap();
    assert_eq!(store.len().unwrap(), 2);
    assert_eq!(store.lookup_exact("a", "111").unwrap().unwrap().kana, "ああ");
}

#[test]
fn test_wildcard_lookup() {
    let store = PronunciationStore::in_memory();
    store
        .insert_batch(&[
            ("shi", "041", "し1"),
            ("shi", "140", "し2"),
            ("shi", "142", "し3"),
            ("shi", "250", "し4"),
        ])
        .unwrap();

    let hits = store.lookup_wildcard("shi", "*4*").unwrap();
    assert_eq!(kana_of(&hits), vec!["し1", "し2", "し3"]);
    let hits = store.lookup_wildcard("shi", "14*").unwrap();
    assert_eq!(kana_of(&hits), vec!["し2", "し3"]);
    assert!(store.lookup_wildcard("shi", "*3*").unwrap().is_empty());
    assert!(store.lookup_wildcard("si", "***").unwrap().is_empty());
    assert!(matches!(
        store.lookup_wildcard("shi", "*0*"),
        Err(StoreError::Format(FormatError::BoundaryMiddle(_)))
    ));
}

#[test]
fn test_wildcard_superset_equals_exact_lookups() {
    let store = PronunciationStore::in_memory();
    let entries: Vec<(String, String, String)> = ToneContext::all_valid()
        .step_by(7)
        .map(|c| ("yu".to_string(), c.to_string(), format!("ゆ{c}")))
        .collect();
    store.insert_batch(&entries).unwrap();
    store.insert("wu", "111", "う").unwrap();

    let mut exact: Vec<PronunciationRecord> = ToneContext::all_valid()
        .filter_map(|c| store.lookup_exact("yu", &c.to_string()).unwrap())
        .collect();
    exact.sort();
    let mut wild = store.lookup_wildcard("yu", "***").unwrap();
    wild.sort();
    assert_eq!(wild, exact);
    assert_eq!(wild.len(), entries.len());
    assert_eq!(store.lookup_syllable("yu").unwrap(), exact);
}

#[test]
fn test_lookup_batch_fallbacks() {
    let store = PronunciationStore::in_memory();
    store.insert("ni", "023", "に").unwrap();
    let keys = [key("ni", "023"), key("hao", "230")];

    let blank = store.lookup_batch(&keys, &Fallback::from("")).unwrap();
    assert_eq!(blank, vec!["に", ""]);
    let keep = store.lookup_batch(&keys, &Fallback::from("keep")).unwrap();
    assert_eq!(keep, vec!["に", "hao"]);
    let literal = store.lookup_batch(&keys, &Fallback::from("?")).unwrap();
    assert_eq!(literal, vec!["に", "?"]);
}

#[test]
fn test_lookup_batch_preserves_order_and_duplicates() {
    let store = PronunciationStore::in_memory();
    store
        .insert_batch(&[("a", "010", "あ"), ("b", "121", "び")])
        .unwrap();
    let keys = [
        key("b", "121"),
        key("/", "404"),
        key("a", "010"),
        key("b", "121"),
        key("a", "010"),
    ];
    let out = store.lookup_batch(&keys, &Fallback::Keep).unwrap();
    assert_eq!(out, vec!["び", "/", "あ", "び", "あ"]);
    assert!(store.lookup_batch(&[], &Fallback::Keep).unwrap().is_empty());
}

#[test]
fn test_delete_exact_and_wildcard() {
    let store = PronunciationStore::in_memory();
    store
        .insert_batch(&[
            ("de", "050", "で"),
            ("de", "151", "で1"),
            ("de", "252", "で2"),
            ("le", "050", "れ"),
        ])
        .unwrap();

    let removed = store.delete_exact("de", "050").unwrap().unwrap();
    assert_eq!(removed.kana, "で");
    assert!(store.delete_exact("de", "050").unwrap().is_none());

    let removed = store.delete_wildcard("de", "*5*").unwrap();
    assert_eq!(kana_of(&removed), vec!["で1", "で2"]);
    assert!(store.lookup_syllable("de").unwrap().is_empty());
    assert_eq!(store.len().unwrap(), 1);

    assert!(store.delete_wildcard("le", "5").is_err());
    assert_eq!(store.delete_syllable("le").unwrap().len(), 1);
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_delete_wildcard_keeps_unmatched_contexts() {
    let store = PronunciationStore::in_memory();
    store
        .insert_batch(&[
            ("ma", "013", "ま"),
            ("ma", "213", "ま2"),
            ("ma", "214", "ま3"),
            ("ma", "023", "ま4"),
        ])
        .unwrap();

    let removed = store.delete_wildcard("ma", "*13").unwrap();
    assert_eq!(kana_of(&removed), vec!["ま", "ま2"]);
    let left = store.lookup_syllable("ma").unwrap();
    assert_eq!(kana_of(&left), vec!["ま4", "ま3"]);
    assert!(store.delete_wildcard("ma", "*13").unwrap().is_empty());
    assert!(store.delete_wildcard("absent", "***").unwrap().is_empty());
}

#[test]
fn test_records_sorted() {
    let store = PronunciationStore::in_memory();
    store
        .insert_batch(&[("b", "111", "1"), ("a", "222", "2"), ("a", "111", "3")])
        .unwrap();
    let all: Vec<String> = store
        .records()
        .unwrap()
        .iter()
        .map(|r| format!("{}{}", r.syllable, r.context))
        .collect();
    assert_eq!(all, vec!["a111", "a222", "b111"]);
}

#[test]
fn test_closed_store() {
    let store = PronunciationStore::in_memory();
    store.insert("a", "111", "あ").unwrap();
    store.close().unwrap();
    assert!(store.is_closed());
    assert!(matches!(store.insert("a", "111", "あ"), Err(StoreError::Closed)));
    assert!(matches!(store.lookup_exact("a", "111"), Err(StoreError::Closed)));
    assert!(matches!(
        store.lookup_batch(&[key("a", "111")], &Fallback::Keep),
        Err(StoreError::Closed)
    ));
    assert!(matches!(store.close(), Err(StoreError::Closed)));
}

#[test]
fn test_concurrent_readers_see_whole_batches() {
    let store = Arc::new(PronunciationStore::in_memory());
    let batch: Vec<(String, String, String)> = ToneContext::all_valid()
        .map(|c| ("zi".to_string(), c.to_string(), "ず".to_string()))
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..200 {
                    let n = store.lookup_syllable("zi").unwrap().len();
                    assert!(n == 0 || n == 180, "partial batch observed: {n}");
                }
            })
        })
        .collect();
    store.insert_batch(&batch).unwrap();
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(store.len().unwrap(), 180);
}

#[test]
fn test_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pinyin.ympt");

    let store = PronunciationStore::open(&path).unwrap();
    store.insert("ni", "023", "に").unwrap();
    store.insert("hao", "230", "はお").unwrap();
    store.close().unwrap();
    assert!(path.exists());

    let store = PronunciationStore::open(&path).unwrap();
    assert_eq!(store.len().unwrap(), 2);
    assert_eq!(store.lookup_exact("hao", "230").unwrap().unwrap().kana, "はお");
    assert_eq!(store.path().unwrap(), Some(path));
}

#[test]
fn test_open_nonexistent() {
    let dir = tempfile::tempdir().unwrap();
    let store = PronunciationStore::open(&dir.path().join("missing.ympt")).unwrap();
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_open_rejects_bad_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.ympt");
    fs::write(&path, b"YM").unwrap();
    assert!(matches!(
        PronunciationStore::open(&path),
        Err(StoreError::InvalidHeader)
    ));
    fs::write(&path, b"LXUD\x01").unwrap();
    assert!(matches!(
        PronunciationStore::open(&path),
        Err(StoreError::InvalidMagic)
    ));
    fs::write(&path, b"YMPT\x09").unwrap();
    assert!(matches!(
        PronunciationStore::open(&path),
        Err(StoreError::UnsupportedVersion(9))
    ));
}

#[test]
fn test_wal_replay_without_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pinyin.ympt");

    {
        let store = PronunciationStore::open(&path).unwrap();
        store.insert_batch(&[("a", "111", "あ"), ("b", "222", "ば")]).unwrap();
        store.delete_exact("a", "111").unwrap();
        // dropped without close: only the WAL holds the changes
    }
    assert!(!path.exists());

    let store = PronunciationStore::open(&path).unwrap();
    assert_eq!(store.len().unwrap(), 1);
    assert_eq!(store.lookup_exact("b", "222").unwrap().unwrap().kana, "ば");
}

#[test]
fn test_wal_truncated_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pinyin.ympt");

    let mut wal = StoreWal::new(&path);
    let first = PronunciationRecord::parse("a", "111", "あ").unwrap();
    let second = PronunciationRecord::parse("b", "222", "ば").unwrap();
    wal.append(&WalEntry::Upsert(vec![first])).unwrap();
    wal.append(&WalEntry::Upsert(vec![second])).unwrap();
    assert_eq!(wal.entry_count(), 2);

    let data = fs::read(wal.wal_path()).unwrap();
    fs::write(wal.wal_path(), &data[..data.len() - 3]).unwrap();

    let mut table = Table::new();
    let count = StoreWal::new(&path).replay(&mut table).unwrap();
    assert_eq!(count, 1);
    assert!(table.contains_key("a"));
    assert!(!table.contains_key("b"));
}

#[test]
fn test_wal_corrupt_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pinyin.ympt");

    let mut wal = StoreWal::new(&path);
    let rec = PronunciationRecord::parse("a", "111", "あ").unwrap();
    wal.append(&WalEntry::Upsert(vec![rec])).unwrap();

    let mut data = fs::read(wal.wal_path()).unwrap();
    let last = data.len() - 1;
    data[last] ^= 0xff;
    fs::write(wal.wal_path(), &data).unwrap();

    let mut table = Table::new();
    assert_eq!(StoreWal::new(&path).replay(&mut table).unwrap(), 0);
    assert!(table.is_empty());
}

#[test]
fn test_writes_after_damaged_tail_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pinyin.ympt");
    let mut wal_path = path.as_os_str().to_owned();
    wal_path.push(".wal");

    {
        let store = PronunciationStore::open(&path).unwrap();
        store.insert("a", "111", "あ").unwrap();
    }
    let good_len = fs::read(&wal_path).unwrap().len();
    // torn frame header from an interrupted append
    let mut data = fs::read(&wal_path).unwrap();
    data.extend_from_slice(&[0x10, 0x00, 0x00]);
    fs::write(&wal_path, &data).unwrap();

    {
        let store = PronunciationStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(fs::read(&wal_path).unwrap().len(), good_len);
        store.insert("b", "222", "ば").unwrap();
        // dropped without close: the new frame lives only in the WAL
    }

    let store = PronunciationStore::open(&path).unwrap();
    assert_eq!(store.len().unwrap(), 2);
    assert_eq!(store.lookup_exact("b", "222").unwrap().unwrap().kana, "ば");
}

#[test]
fn test_checkpoint_truncates_wal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pinyin.ympt");

    let store = PronunciationStore::open(&path).unwrap();
    store.insert("a", "111", "あ").unwrap();
    store.checkpoint().unwrap();

    let mut wal_path = path.as_os_str().to_owned();
    wal_path.push(".wal");
    assert_eq!(fs::read(&wal_path).unwrap().len(), 0, "WAL should be empty");
    assert!(path.exists(), "checkpoint should exist");

    let reopened = PronunciationStore::open(&path).unwrap();
    assert_eq!(reopened.len().unwrap(), 1);
}

#[test]
fn test_automatic_checkpoint_at_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pinyin.ympt");

    let store = PronunciationStore::open_with_compact_threshold(&path, 2).unwrap();
    store.insert("a", "111", "あ").unwrap();
    assert!(!path.exists());
    store.insert("b", "222", "ば").unwrap();
    assert!(path.exists());
}

#[test]
fn test_failed_automatic_checkpoint_keeps_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pinyin.ympt");
    // the checkpoint's temporary file cannot be created over a directory
    fs::create_dir(path.with_extension("tmp")).unwrap();

    {
        let store = PronunciationStore::open_with_compact_threshold(&path, 1).unwrap();
        store.insert("a", "111", "あ").unwrap();
        assert_eq!(store.delete_exact("a", "111").unwrap().unwrap().kana, "あ");
        store.insert("b", "222", "ば").unwrap();
        assert!(store.checkpoint().is_err());
    }
    assert!(!path.exists());

    let store = PronunciationStore::open(&path).unwrap();
    assert_eq!(store.len().unwrap(), 1);
    assert_eq!(store.lookup_exact("b", "222").unwrap().unwrap().kana, "ば");
}

#[test]
fn test_in_memory_checkpoint_is_noop() {
    let store = PronunciationStore::in_memory();
    store.insert("a", "111", "あ").unwrap();
    store.checkpoint().unwrap();
    assert_eq!(store.path().unwrap(), None);
}
