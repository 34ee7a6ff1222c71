//! Unit tests for `JsonlAuditWriter` and event-to-entry conversion.
//!
//! Validates directory creation, one JSON object per line, daily rotation
//! keyed on entry timestamps and the per-event optional fields.

use std::fs;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use task_stack::audit::{AuditEntry, AuditEventType, AuditLogger, JsonlAuditWriter};
use task_stack::models::event::StackEvent;
use task_stack::models::session::SessionOutcome;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0)
        .single()
        .expect("valid date")
}

fn began(id: &str) -> StackEvent {
    StackEvent::Began {
        session_id: id.into(),
        task: "essay".into(),
        depth: 0,
    }
}

fn read_lines(path: &std::path::Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .expect("read log")
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid json line"))
        .collect()
}

// ── Directory handling ───────────────────────────────────────

#[test]
fn new_creates_directory_if_missing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let log_dir = temp.path().join("nested").join("logs");
    assert!(!log_dir.exists());

    JsonlAuditWriter::new(log_dir.clone()).expect("writer");
    assert!(log_dir.is_dir());
}

// ── Writing ──────────────────────────────────────────────────

#[test]
fn entries_append_as_jsonl() {
    let temp = tempfile::tempdir().expect("tempdir");
    let writer = JsonlAuditWriter::new(temp.path().to_path_buf()).expect("writer");

    writer
        .log_entry(AuditEntry::from_event("default", &began("s-1"), at(1, 9)))
        .expect("log");
    writer
        .log_entry(AuditEntry::from_event(
            "default",
            &StackEvent::Pause {
                session_id: "s-1".into(),
                task: "essay".into(),
                phase: "drafting".into(),
            },
            at(1, 10),
        ))
        .expect("log");

    let lines = read_lines(&writer.path_for(at(1, 9).date_naive()));
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["event_type"], "session_begin");
    assert_eq!(lines[0]["depth"], 0);
    assert!(lines[0].get("phase").is_none());
    assert_eq!(lines[1]["event_type"], "session_pause");
    assert_eq!(lines[1]["phase"], "drafting");
    assert_eq!(lines[1]["scope"], "default");
}

#[test]
fn rotation_follows_entry_date() {
    let temp = tempfile::tempdir().expect("tempdir");
    let writer = JsonlAuditWriter::new(temp.path().to_path_buf()).expect("writer");

    writer
        .log_entry(AuditEntry::from_event("default", &began("s-1"), at(1, 23)))
        .expect("log day one");
    writer
        .log_entry(AuditEntry::from_event("default", &began("s-2"), at(2, 1)))
        .expect("log day two");

    let first = writer.path_for(at(1, 0).date_naive());
    let second = writer.path_for(at(2, 0).date_naive());
    assert!(first.ends_with("transitions-2026-03-01.jsonl"));
    assert_eq!(read_lines(&first).len(), 1);
    assert_eq!(read_lines(&second).len(), 1);
    assert_eq!(read_lines(&second)[0]["session_id"], "s-2");
}

#[test]
fn concurrent_writes_produce_valid_lines() {
    let temp = tempfile::tempdir().expect("tempdir");
    let writer = Arc::new(JsonlAuditWriter::new(temp.path().to_path_buf()).expect("writer"));

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let writer = Arc::clone(&writer);
            std::thread::spawn(move || {
                for i in 0..10 {
                    let id = format!("s-{n}-{i}");
                    writer
                        .log_entry(AuditEntry::from_event("default", &began(&id), at(1, 12)))
                        .expect("log");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread");
    }

    assert_eq!(read_lines(&writer.path_for(at(1, 12).date_naive())).len(), 80);
}

// ── Event mapping ────────────────────────────────────────────

#[test]
fn entry_fields_follow_event_kind() {
    let finished = AuditEntry::from_event(
        "default",
        &StackEvent::Finished {
            session_id: "s-1".into(),
            task: "lookup".into(),
            outcome: SessionOutcome::Completed,
        },
        at(1, 9),
    );
    assert_eq!(finished.event_type, AuditEventType::SessionFinish);
    assert_eq!(finished.outcome, Some(SessionOutcome::Completed));
    assert!(finished.depth.is_none());

    let orphaned = AuditEntry::from_event(
        "default",
        &StackEvent::Orphaned {
            session_id: "s-4".into(),
            task: "verify".into(),
            entries: 4,
        },
        at(1, 9),
    );
    assert_eq!(orphaned.event_type, AuditEventType::SessionOrphan);
    assert_eq!(orphaned.snapshot_entries, Some(4));

    let resumed = AuditEntry::from_event(
        "default",
        &StackEvent::Resume {
            session_id: "s-1".into(),
            task: "essay".into(),
            phase: "drafting".into(),
        },
        at(1, 9),
    );
    assert_eq!(resumed.event_type, AuditEventType::SessionResume);
    assert_eq!(resumed.phase.as_deref(), Some("drafting"));
}
