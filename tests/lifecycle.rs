//! # Slot Lifecycle Tests
//!
//! End-to-end coverage of the append / tombstone / recycle / scrub / compact
//! lifecycle through the public facade: slot ids, FIFO recycling, tombstone
//! skipping, purge compaction, free-queue rebuild across reopen, and the
//! file-length invariant `header_size + slots * slot_size == file_length`.

use fuziotdb::{Database, Error, FieldKind, Schema, Value};
use tempfile::{tempdir, TempDir};

fn int_schema() -> Schema {
    Schema::builder("Numbers")
        .field("a", FieldKind::I32)
        .build()
        .unwrap()
}

fn open_db() -> (Database, TempDir) {
    let dir = tempdir().unwrap();
    let db = Database::builder()
        .path(dir.path().join("db"))
        .worker_threads(0)
        .open()
        .unwrap();
    (db, dir)
}

fn int_db() -> (Database, TempDir) {
    let (db, dir) = open_db();
    db.register(int_schema(), false).unwrap();
    (db, dir)
}

fn push_ints(db: &Database, values: impl IntoIterator<Item = i32>) -> Vec<u64> {
    values
        .into_iter()
        .map(|v| db.push("Numbers", &[Value::I32(v)]).unwrap())
        .collect()
}

fn fetch_pairs(db: &Database) -> Vec<(u64, i32)> {
    db.fetch("Numbers", &["a"], |_| true)
        .unwrap()
        .into_iter()
        .map(|row| (row.id, row.values[0].as_i32().unwrap()))
        .collect()
}

fn file_len(db: &Database) -> u64 {
    let store = db.store("Numbers").unwrap();
    std::fs::metadata(store.path()).unwrap().len()
}

#[test]
fn push_then_fetch_returns_ids_in_file_order() {
    let (db, _dir) = int_db();
    let ids = push_ints(&db, [3, 7, 11]);
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(fetch_pairs(&db), vec![(0, 3), (1, 7), (2, 11)]);
}

#[test]
fn fetch_with_empty_projection_yields_bare_ids() {
    let (db, _dir) = int_db();
    push_ints(&db, [1, 2, 3]);
    let rows = db.fetch("Numbers", &[], |_| true).unwrap();
    let ids: Vec<u64> = rows.iter().map(|row| row.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert!(rows.iter().all(|row| row.values.is_empty()));
}

#[test]
fn freed_slots_are_skipped_and_recycled_fifo() {
    let (db, _dir) = int_db();
    push_ints(&db, 0..10);
    db.free("Numbers", 2).unwrap();
    db.free("Numbers", 5).unwrap();

    assert_eq!(db.instance_count("Numbers").unwrap(), 8);
    let ids: Vec<u64> = fetch_pairs(&db).iter().map(|&(id, _)| id).collect();
    assert!(!ids.contains(&2) && !ids.contains(&5));

    // Oldest tombstone first.
    assert_eq!(db.push("Numbers", &[Value::I32(99)]).unwrap(), 2);
    // Slot 5 is still tombstoned and still skipped.
    let pairs = fetch_pairs(&db);
    assert!(pairs.contains(&(2, 99)));
    assert!(!pairs.iter().any(|&(id, _)| id == 5));

    assert_eq!(db.push("Numbers", &[Value::I32(98)]).unwrap(), 5);
    assert_eq!(db.push("Numbers", &[Value::I32(97)]).unwrap(), 10);
}

#[test]
fn double_free_does_not_recycle_twice() {
    let (db, _dir) = int_db();
    push_ints(&db, [10, 20, 30]);
    db.free("Numbers", 1).unwrap();
    db.free("Numbers", 1).unwrap();

    assert_eq!(db.push("Numbers", &[Value::I32(40)]).unwrap(), 1);
    // The queue held id 1 only once; the next push must append.
    assert_eq!(db.push("Numbers", &[Value::I32(50)]).unwrap(), 3);
}

#[test]
fn free_many_tombstones_a_batch() {
    let (db, _dir) = int_db();
    push_ints(&db, 0..6);
    db.free_many("Numbers", &[1, 3, 5]).unwrap();
    assert_eq!(db.instance_count("Numbers").unwrap(), 3);
    let ids: Vec<u64> = fetch_pairs(&db).iter().map(|&(id, _)| id).collect();
    assert_eq!(ids, vec![0, 2, 4]);
}

#[test]
fn free_beyond_end_is_not_found() {
    let (db, _dir) = int_db();
    push_ints(&db, [1]);
    assert!(matches!(
        db.free("Numbers", 9).unwrap_err(),
        Error::NotFound { id: 9 }
    ));
}

#[test]
fn set_replaces_values_in_place() {
    let (db, _dir) = int_db();
    push_ints(&db, [1, 2, 3]);
    let len_before = file_len(&db);

    db.set("Numbers", 1, &[Value::I32(42)]).unwrap();
    assert_eq!(fetch_pairs(&db), vec![(0, 1), (1, 42), (2, 3)]);
    assert_eq!(file_len(&db), len_before);
}

#[test]
fn set_preserves_tombstone_state() {
    let (db, _dir) = int_db();
    push_ints(&db, [1, 2]);
    db.free("Numbers", 0).unwrap();

    db.set("Numbers", 0, &[Value::I32(7)]).unwrap();
    assert!(!db.contains("Numbers", 0).unwrap());
    let ids: Vec<u64> = fetch_pairs(&db).iter().map(|&(id, _)| id).collect();
    assert_eq!(ids, vec![1]);

    // The tombstone is still recyclable afterwards.
    assert_eq!(db.push("Numbers", &[Value::I32(8)]).unwrap(), 0);
    assert!(db.contains("Numbers", 0).unwrap());
}

#[test]
fn purge_compacts_survivors_in_relative_order() {
    let (db, _dir) = int_db();
    push_ints(&db, 0..10);
    db.free_many("Numbers", &[2, 5, 8]).unwrap();

    db.purge("Numbers").unwrap();

    let store = db.store("Numbers").unwrap();
    let header = store.schema().header_size() as u64;
    let slot = store.schema().slot_size() as u64;
    assert_eq!(file_len(&db), header + 7 * slot);
    assert_eq!(store.free_count(), 0);

    assert_eq!(
        fetch_pairs(&db),
        vec![(0, 0), (1, 1), (2, 3), (3, 4), (4, 6), (5, 7), (6, 9)]
    );
}

#[test]
fn purge_is_idempotent() {
    let (db, _dir) = int_db();
    push_ints(&db, 0..5);
    db.free("Numbers", 1).unwrap();

    db.purge("Numbers").unwrap();
    let first = std::fs::read(db.store("Numbers").unwrap().path()).unwrap();
    db.purge("Numbers").unwrap();
    let second = std::fs::read(db.store("Numbers").unwrap().path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn purge_keep_scrubs_payloads_without_moving_slots() {
    let (db, _dir) = int_db();
    push_ints(&db, [0x01010101, 0x02020202, 0x03030303]);
    db.free("Numbers", 1).unwrap();
    let len_before = file_len(&db);

    db.purge_keep("Numbers").unwrap();

    assert_eq!(file_len(&db), len_before);
    let store = db.store("Numbers").unwrap();
    let bytes = std::fs::read(store.path()).unwrap();
    let header = store.schema().header_size();
    let slot = store.schema().slot_size();

    let tombstoned = &bytes[header + slot..header + 2 * slot];
    assert_eq!(tombstoned[0] & 1, 1);
    assert!(tombstoned[1..].iter().all(|&b| b == 0));

    // Live neighbors untouched, tombstone still recyclable.
    assert_eq!(fetch_pairs(&db), vec![(0, 0x01010101), (2, 0x03030303)]);
    assert_eq!(db.push("Numbers", &[Value::I32(5)]).unwrap(), 1);
}

#[test]
fn file_length_always_holds_whole_slots() {
    let (db, _dir) = int_db();
    let store = db.store("Numbers").unwrap();
    let header = store.schema().header_size() as u64;
    let slot = store.schema().slot_size() as u64;

    for n in 1..=8u64 {
        db.push("Numbers", &[Value::I32(n as i32)]).unwrap();
        assert_eq!((file_len(&db) - header) % slot, 0);
        assert_eq!(file_len(&db), header + n * slot);
    }
}

#[test]
fn reopen_rebuilds_free_queue_from_tombstones() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db");
    {
        let db = Database::builder()
            .path(&path)
            .worker_threads(0)
            .open()
            .unwrap();
        db.register(int_schema(), false).unwrap();
        push_ints(&db, 0..6);
        db.free_many("Numbers", &[4, 1]).unwrap();
    }

    let db = Database::builder()
        .path(&path)
        .worker_threads(0)
        .open()
        .unwrap();
    db.register(int_schema(), false).unwrap();
    assert_eq!(db.store("Numbers").unwrap().free_count(), 2);
    assert_eq!(db.instance_count("Numbers").unwrap(), 4);

    // Rebuild order is file order, not historic free order.
    assert_eq!(db.push("Numbers", &[Value::I32(7)]).unwrap(), 1);
    assert_eq!(db.push("Numbers", &[Value::I32(8)]).unwrap(), 4);
}

#[test]
fn fetch_full_materializes_every_field() {
    let (db, _dir) = open_db();
    db.register(
        Schema::builder("PersonData")
            .field("age", FieldKind::U8)
            .flex_field("name", FieldKind::Ascii, 16)
            .build()
            .unwrap(),
        false,
    )
    .unwrap();

    db.push("PersonData", &[Value::U8(34), Value::Ascii("ada".into())])
        .unwrap();
    db.push("PersonData", &[Value::U8(9), Value::Ascii("tim".into())])
        .unwrap();

    let adults = db
        .fetch_full("PersonData", |record| {
            matches!(record.values[0], Value::U8(age) if age >= 18)
        })
        .unwrap();
    assert_eq!(adults.len(), 1);
    assert_eq!(adults[0].id, 0);
    assert_eq!(adults[0].values[1], Value::Ascii("ada".into()));
}

#[test]
fn count_matches_fetch() {
    let (db, _dir) = int_db();
    push_ints(&db, 0..20);
    let even = |row: &fuziotdb::Row| matches!(row.values[0], Value::I32(v) if v % 2 == 0);
    assert_eq!(db.count("Numbers", &["a"], even).unwrap(), 10);
}

#[test]
fn cancellation_stops_a_sync_scan_early() {
    let (db, _dir) = int_db();
    push_ints(&db, 0..100);

    let rows = db
        .fetch_cancellable("Numbers", &["a"], |row, token| {
            if row.values[0] == Value::I32(10) {
                token.cancel();
            }
            true
        })
        .unwrap();
    // Everything up to and including the cancelling slot, nothing after.
    assert_eq!(rows.len(), 11);
    assert_eq!(rows.last().unwrap().values[0], Value::I32(10));
}

#[test]
fn unknown_field_and_type_are_reported() {
    let (db, _dir) = int_db();
    assert!(matches!(
        db.fetch("Numbers", &["missing"], |_| true).unwrap_err(),
        Error::UnknownField(_)
    ));
    assert!(matches!(
        db.push("Ghost", &[Value::I32(1)]).unwrap_err(),
        Error::UnknownType(_)
    ));
}

#[test]
fn duplicate_registration_is_rejected() {
    let (db, _dir) = int_db();
    assert!(matches!(
        db.register(int_schema(), false).unwrap_err(),
        Error::InvalidSchema(_)
    ));
}

#[test]
fn mixed_codec_roundtrip_through_file() {
    let (db, _dir) = open_db();
    db.register(
        Schema::builder("Everything")
            .field("flag", FieldKind::Bool)
            .field("count", FieldKind::U64)
            .field("delta", FieldKind::I16)
            .field("ratio", FieldKind::F64)
            .field("tag", FieldKind::Uuid)
            .field("total", FieldKind::BigInt)
            .flex_field("label", FieldKind::Utf16, 10)
            .flex_field("blob", FieldKind::Bytes, 4)
            .build()
            .unwrap(),
        false,
    )
    .unwrap();

    let values = vec![
        Value::Bool(true),
        Value::U64(1 << 40),
        Value::I16(-5),
        Value::F64(2.75),
        Value::Uuid([9; 16]),
        Value::BigInt([3; 16]),
        Value::Utf16("héllo".into()),
        Value::Bytes(vec![1, 2, 3, 4]),
    ];
    db.push("Everything", &values).unwrap();

    let records = db.fetch_full("Everything", |_| true).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].values, values);
}
