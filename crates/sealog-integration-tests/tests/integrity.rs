//! End-to-end integrity: hashing, tamper detection, and Merkle roots.

mod common;

use std::sync::Arc;

use common::{SessionFixture, rewrite_row_field, step};
use sealog_audit::{
    AuditError, EventLog, EventRecord, EventStorage, FileEventStorage, IntegrityIssue,
    IntegrityVerifier, MemoryEventStorage, UNATTRIBUTED,
};
use sealog_core::{EventFields, Map, SessionId, Timestamp, Value};
use sealog_crypto::canonical::MAX_CANONICAL_DEPTH;
use sealog_crypto::{EMPTY_MERKLE_ROOT, EventDigest, HashEngine, merkle_root};
use sealog_replay::ReplayEngine;

#[test]
fn test_key_order_does_not_change_hash() {
    let engine = HashEngine::generate();
    let timestamp = Timestamp::from_unix_millis(1_000_000).unwrap();

    let mut forward = Map::new();
    forward.insert("model", "m");
    forward.insert("latency_ms", 100.0);
    forward.insert("nested", {
        let mut inner = Map::new();
        inner.insert("a", 1_i64);
        inner.insert("b", 2_i64);
        inner
    });

    let mut reverse = Map::new();
    reverse.insert("nested", {
        let mut inner = Map::new();
        inner.insert("b", 2_i64);
        inner.insert("a", 1_i64);
        inner
    });
    reverse.insert("latency_ms", 100.0);
    reverse.insert("model", "m");

    let hash = |payload: Map| {
        engine
            .hash_event(&EventFields {
                event_id: "e-1",
                session_id: "s-1",
                timestamp: &timestamp,
                event_type: "llm_interaction",
                payload: &Value::Map(payload),
            })
            .unwrap()
    };
    assert_eq!(hash(forward), hash(reverse));
}

#[test]
fn test_merkle_root_edge_cases() {
    let leaf = EventDigest::hash(b"only");
    assert_eq!(merkle_root(&[leaf]), leaf);
    assert_eq!(merkle_root(&[]), EMPTY_MERKLE_ROOT);

    let report = IntegrityVerifier::new(Arc::new(HashEngine::generate())).verify(&[]);
    assert!(report.all_valid);
    assert_eq!(report.total_events, 0);
    assert_eq!(report.merkle_root, EMPTY_MERKLE_ROOT);
}

#[test]
fn test_stored_hash_round_trips() {
    let log = EventLog::in_memory(HashEngine::generate());
    for n in 0..5 {
        log.append("step", step(n)).unwrap();
    }

    for record in log.events().unwrap() {
        let payload = record.payload_value().unwrap();
        let recomputed = log.engine().hash_event(&record.fields(&payload)).unwrap();
        assert_eq!(recomputed.to_hex(), record.hash);
    }
}

#[test]
fn test_tampering_is_localized_to_one_event() {
    type Tamper = fn(&mut EventRecord);
    let tampers: [(&str, Tamper); 4] = [
        ("payload", |r| r.payload = r#"{"step":999}"#.to_owned()),
        ("timestamp", |r| {
            r.timestamp = Timestamp::from_unix_millis(42).unwrap();
        }),
        ("event_type", |r| r.event_type = "forged".to_owned()),
        ("session_id", |r| r.session_id = SessionId::new().to_string()),
    ];

    for (field, tamper) in tampers {
        let mut fixture = SessionFixture::new();
        for n in 0..4 {
            let payload = match step(n) {
                Value::Map(map) => map,
                _ => unreachable!(),
            };
            fixture.push(1_000_000 + n * 1_000, "step", payload);
        }
        let target = fixture.records[2].event_id.clone();
        tamper(&mut fixture.records[2]);

        let report = fixture.verifier().verify(&fixture.records);
        assert!(!report.all_valid, "{field} tampering undetected");
        assert_eq!(report.invalid_count, 1, "{field}");
        for check in &report.results {
            assert_eq!(check.valid, check.event_id != target, "{field}");
        }
    }
}

#[test]
fn test_corrupted_hash_changes_root() {
    let log = EventLog::in_memory(HashEngine::generate());
    for n in 0..10 {
        log.append("step", step(n)).unwrap();
    }
    let mut records = log.events().unwrap();
    let verifier = IntegrityVerifier::new(Arc::clone(log.engine()));

    let before = verifier.verify(&records);
    assert!(before.all_valid);
    assert_eq!(before.valid_count, 10);

    let digest = EventDigest::from_hex(&records[6].hash).unwrap();
    records[6].hash = EventDigest::hash(digest.as_bytes()).to_hex();

    let after = verifier.verify(&records);
    assert!(!after.all_valid);
    assert_eq!(after.invalid_count, 1);
    assert_eq!(after.valid_count, 9);
    assert_ne!(after.merkle_root, before.merkle_root);
    assert_eq!(
        after.failures().next().unwrap().issue,
        Some(IntegrityIssue::HashMismatch)
    );
}

#[test]
fn test_malformed_hash_and_payload_do_not_abort_verification() {
    let mut fixture = SessionFixture::new();
    for n in 0..3 {
        fixture.interaction(1_000_000 + n * 1_000, 100.0);
    }
    fixture.records[0].hash = "not-hex".to_owned();
    fixture.records[1].payload = "{broken".to_owned();

    let report = fixture.verifier().verify(&fixture.records);
    assert_eq!(report.total_events, 3);
    assert_eq!(report.invalid_count, 2);
    assert_eq!(report.results[0].issue, Some(IntegrityIssue::MalformedHash));
    assert!(matches!(
        report.results[1].issue,
        Some(IntegrityIssue::PayloadUnreadable { .. })
    ));
    assert!(report.results[2].valid);
}

#[test]
fn test_wrong_key_fails_every_event() {
    let log = EventLog::in_memory(HashEngine::generate());
    log.append("step", step(1)).unwrap();
    log.append("step", step(2)).unwrap();

    let other = IntegrityVerifier::new(Arc::new(HashEngine::generate()));
    let report = other.verify(&log.events().unwrap());
    assert_eq!(report.invalid_count, 2);
}

#[test]
fn test_file_log_survives_reopen_and_detects_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("events.jsonl");
    let key_path = dir.path().join("hmac.key");
    let session = SessionId::new();

    {
        let engine = Arc::new(HashEngine::load_or_generate(&key_path).unwrap());
        let log = EventLog::open(&path, engine, session.clone()).unwrap();
        for n in 0..3 {
            log.append("step", step(n)).unwrap();
        }
    }

    let engine = Arc::new(HashEngine::load_or_generate(&key_path).unwrap());
    let verifier = IntegrityVerifier::new(engine);
    let storage = FileEventStorage::open(&path).unwrap();
    assert_eq!(storage.count().unwrap(), 3);
    assert!(verifier.verify_session(&storage, &session).unwrap().all_valid);

    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, text.replacen(r#"\"step\":1"#, r#"\"step\":7"#, 1)).unwrap();

    let storage = FileEventStorage::open(&path).unwrap();
    let report = verifier.verify_session(&storage, &session).unwrap();
    assert_eq!(report.invalid_count, 1);
}

#[test]
fn test_verify_all_reports_each_session() {
    let storage = Arc::new(MemoryEventStorage::new());
    let engine = Arc::new(HashEngine::generate());
    let a = EventLog::new(storage.clone(), Arc::clone(&engine), SessionId::new());
    let b = EventLog::new(storage.clone(), Arc::clone(&engine), SessionId::new());
    a.append("step", step(1)).unwrap();
    b.append("step", step(1)).unwrap();
    b.append("step", step(2)).unwrap();

    let reports = IntegrityVerifier::new(engine).verify_all(storage.as_ref()).unwrap();
    assert_eq!(reports.len(), 2);
    for (session, report) in reports {
        let expected = if session == a.session_id().to_string() { 1 } else { 2 };
        assert_eq!(report.total_events, expected);
        assert!(report.all_valid);
    }
}

fn nested_lists(levels: usize) -> Value {
    let mut value = Value::from(0_i64);
    for _ in 0..levels {
        value = Value::from(vec![value]);
    }
    value
}

fn file_log(dir: &tempfile::TempDir, rows: i64) -> (std::path::PathBuf, EventLog) {
    let path = dir.path().join("events.jsonl");
    let log = EventLog::open(&path, Arc::new(HashEngine::generate()), SessionId::new()).unwrap();
    for n in 0..rows {
        log.append("step", step(n)).unwrap();
    }
    (path, log)
}

#[test]
fn test_deepest_accepted_payload_verifies_after_reload() {
    let dir = tempfile::tempdir().unwrap();
    let (path, log) = file_log(&dir, 0);

    // The payload map itself is the first level.
    let mut deepest = Map::new();
    deepest.insert("deep", nested_lists(MAX_CANONICAL_DEPTH - 1));
    log.append("step", Value::Map(deepest)).unwrap();

    let mut too_deep = Map::new();
    too_deep.insert("deep", nested_lists(MAX_CANONICAL_DEPTH));
    assert!(matches!(
        log.append("step", Value::Map(too_deep)),
        Err(AuditError::Serialization(_))
    ));

    let storage = FileEventStorage::open(&path).unwrap();
    assert_eq!(storage.count().unwrap(), 1);
    let report = IntegrityVerifier::new(Arc::clone(log.engine()))
        .verify_session(&storage, log.session_id())
        .unwrap();
    assert!(report.all_valid);
    assert_eq!(report.total_events, 1);
}

#[test]
fn test_unparseable_row_fails_alone() {
    let dir = tempfile::tempdir().unwrap();
    let (path, log) = file_log(&dir, 3);
    let target = log.events().unwrap()[1].event_id.clone();
    rewrite_row_field(&path, 1, "timestamp", "yesterday".into());

    let storage = FileEventStorage::open(&path).unwrap();
    assert_eq!(storage.count().unwrap(), 3);

    let verifier = IntegrityVerifier::new(Arc::clone(log.engine()));
    let report = verifier.verify_session(&storage, log.session_id()).unwrap();
    assert_eq!(report.total_events, 3);
    assert_eq!(report.valid_count, 2);
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].event_id, target);
    assert!(matches!(
        failures[0].issue,
        Some(IntegrityIssue::RowUnreadable { .. })
    ));

    let replay = ReplayEngine::from_storage(&storage, log.session_id(), verifier).unwrap();
    assert_eq!(replay.events().len(), 2);
    assert_eq!(replay.skipped_rows(), 1);
    assert!(!replay.session_metrics().summary().unwrap().all_hashes_valid);
}

#[test]
fn test_verify_all_counts_every_row() {
    let dir = tempfile::tempdir().unwrap();
    let (path, log) = file_log(&dir, 3);
    rewrite_row_field(&path, 1, "session_id", "tampered".into());
    {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"not json\n").unwrap();
    }

    let storage = FileEventStorage::open(&path).unwrap();
    let rows = std::fs::read_to_string(&path).unwrap().lines().count();
    assert_eq!(storage.count().unwrap(), rows);

    let reports = IntegrityVerifier::new(Arc::clone(log.engine()))
        .verify_all(&storage)
        .unwrap();
    let total: usize = reports.iter().map(|(_, r)| r.total_events).sum();
    let invalid: usize = reports.iter().map(|(_, r)| r.invalid_count).sum();
    assert_eq!(total, rows);
    assert_eq!(invalid, 2);

    let keys: Vec<&str> = reports.iter().map(|(key, _)| key.as_str()).collect();
    assert!(keys.contains(&"tampered"));
    assert!(keys.contains(&UNATTRIBUTED));
    let own = reports
        .iter()
        .find(|(key, _)| *key == log.session_id().to_string())
        .unwrap();
    assert!(own.1.all_valid);
    assert_eq!(own.1.total_events, 2);
}
