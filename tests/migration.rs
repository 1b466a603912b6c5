//! # Header Migration Tests
//!
//! Registration against existing files: strict header matching, on-disk
//! field order taking precedence over declaration order, and the upgrade
//! path that rewrites the file for a changed schema.

use fuziotdb::{Database, Error, FieldKind, Schema, Value};
use tempfile::{tempdir, TempDir};

fn open_db(path: &std::path::Path) -> Database {
    Database::builder()
        .path(path)
        .worker_threads(0)
        .open()
        .unwrap()
}

fn two_int_schema(first: &str, second: &str) -> Schema {
    Schema::builder("Pairs")
        .field(first, FieldKind::I32)
        .field(second, FieldKind::I32)
        .build()
        .unwrap()
}

fn seeded_dir() -> (TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db");
    {
        let db = open_db(&path);
        db.register(two_int_schema("a", "b"), false).unwrap();
        db.push("Pairs", &[Value::I32(1), Value::I32(2)]).unwrap();
        db.push("Pairs", &[Value::I32(3), Value::I32(4)]).unwrap();
    }
    (dir, path)
}

#[test]
fn mismatched_header_without_upgrade_is_rejected() {
    let (_dir, path) = seeded_dir();
    let db = open_db(&path);
    let err = db.register(two_int_schema("a", "c"), false).unwrap_err();
    assert!(matches!(err, Error::HeaderMismatch(_)));
}

#[test]
fn declaration_order_yields_to_disk_order() {
    let (_dir, path) = seeded_dir();
    let db = open_db(&path);
    // Same field set, declared backwards: registration must succeed and
    // adopt the on-disk order.
    db.register(two_int_schema("b", "a"), false).unwrap();

    let schema = db.schema("Pairs").unwrap();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["a", "b"]);

    // Instances are consumed in disk order too.
    db.push("Pairs", &[Value::I32(5), Value::I32(6)]).unwrap();
    let records = db.fetch_full("Pairs", |_| true).unwrap();
    assert_eq!(records[2].values, vec![Value::I32(5), Value::I32(6)]);
}

#[test]
fn upgrade_replaces_dropped_field_with_zeros() {
    let (_dir, path) = seeded_dir();
    let db = open_db(&path);
    db.register(two_int_schema("a", "c"), true).unwrap();

    let records = db.fetch_full("Pairs", |_| true).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].values, vec![Value::I32(1), Value::I32(0)]);
    assert_eq!(records[1].values, vec![Value::I32(3), Value::I32(0)]);
}

#[test]
fn upgrade_with_identical_schema_preserves_the_file() {
    let (_dir, path) = seeded_dir();
    let before = {
        let store_path = path.join("pairs.dbobj");
        std::fs::read(&store_path).unwrap()
    };

    let db = open_db(&path);
    db.register(two_int_schema("a", "b"), true).unwrap();
    drop(db);

    let after = std::fs::read(path.join("pairs.dbobj")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn upgrade_drops_tombstoned_slots() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db");
    {
        let db = open_db(&path);
        db.register(two_int_schema("a", "b"), false).unwrap();
        for v in 0..5 {
            db.push("Pairs", &[Value::I32(v), Value::I32(v * 10)]).unwrap();
        }
        db.free_many("Pairs", &[1, 3]).unwrap();
    }

    let db = open_db(&path);
    db.register(two_int_schema("a", "c"), true).unwrap();

    let store = db.store("Pairs").unwrap();
    assert_eq!(store.free_count(), 0);
    assert_eq!(store.slot_count(), 3);

    let survivors: Vec<i32> = db
        .fetch_full("Pairs", |_| true)
        .unwrap()
        .into_iter()
        .map(|record| record.values[0].as_i32().unwrap())
        .collect();
    assert_eq!(survivors, vec![0, 2, 4]);
}

#[test]
fn upgrade_preserves_payloads_across_reordered_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db");
    {
        let db = open_db(&path);
        db.register(
            Schema::builder("Readings")
                .field("sensor", FieldKind::U32)
                .flex_field("site", FieldKind::Ascii, 8)
                .field("celsius", FieldKind::F32)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();
        db.push(
            "Readings",
            &[
                Value::U32(7),
                Value::Ascii("roof".into()),
                Value::F32(21.5),
            ],
        )
        .unwrap();
    }

    // New schema: "celsius" promoted to the front, "sensor" dropped, a new
    // "valid" flag appended.
    let db = open_db(&path);
    db.register(
        Schema::builder("Readings")
            .field("celsius", FieldKind::F32)
            .flex_field("site", FieldKind::Ascii, 8)
            .field("valid", FieldKind::Bool)
            .build()
            .unwrap(),
        true,
    )
    .unwrap();

    let records = db.fetch_full("Readings", |_| true).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].values,
        vec![
            Value::F32(21.5),
            Value::Ascii("roof".into()),
            // Zero-filled payload decodes as false.
            Value::Bool(false),
        ]
    );
}

#[test]
fn corrupt_trailing_bytes_are_detected_at_registration() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db");
    {
        let db = open_db(&path);
        db.register(two_int_schema("a", "b"), false).unwrap();
        db.push("Pairs", &[Value::I32(1), Value::I32(2)]).unwrap();
    }

    // Chop the file mid-slot.
    let file_path = path.join("pairs.dbobj");
    let bytes = std::fs::read(&file_path).unwrap();
    std::fs::write(&file_path, &bytes[..bytes.len() - 3]).unwrap();

    let db = open_db(&path);
    let err = db.register(two_int_schema("a", "b"), false).unwrap_err();
    assert!(matches!(err, Error::Corruption(_)));
}
