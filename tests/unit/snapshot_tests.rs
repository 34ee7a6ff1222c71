//! Unit tests for recovery snapshot and checkpoint integrity checks.

use chrono::{DateTime, TimeZone, Utc};

use task_stack::models::checkpoint::{Checkpoint, Payload};
use task_stack::models::session::{Session, SessionStatus};
use task_stack::models::snapshot::{RecoverySnapshot, SNAPSHOT_VERSION};
use task_stack::AppError;

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("valid date")
}

fn chain(len: usize) -> Vec<Session> {
    let mut sessions = vec![Session::root("task-0".into(), epoch())];
    for n in 1..len {
        let parent = sessions.last().expect("parent").clone();
        sessions.push(Session::nested(format!("task-{n}"), &parent, epoch()));
    }
    let top = sessions.len() - 1;
    for session in &mut sessions[..top] {
        session.status = SessionStatus::Paused;
    }
    sessions
}

// ── RecoverySnapshot ─────────────────────────────────────────

#[test]
fn captured_snapshot_validates() {
    let snapshot = RecoverySnapshot::capture("default", chain(4), epoch()).expect("capture");
    assert_eq!(snapshot.version, SNAPSHOT_VERSION);
    assert_eq!(snapshot.top().map(|s| s.name.as_str()), Some("task-3"));
    snapshot.validate(3).expect("valid");
}

#[test]
fn snapshot_survives_json_round_trip() {
    let snapshot = RecoverySnapshot::capture("default", chain(2), epoch()).expect("capture");
    let bytes = serde_json::to_vec_pretty(&snapshot).expect("encode");
    let parsed: RecoverySnapshot = serde_json::from_slice(&bytes).expect("decode");
    parsed.validate(3).expect("valid after round trip");
}

#[test]
fn empty_snapshot_is_corrupt() {
    let snapshot = RecoverySnapshot::capture("default", Vec::new(), epoch()).expect("capture");
    assert!(matches!(
        snapshot.validate(3),
        Err(AppError::CorruptSnapshot(_))
    ));
}

#[test]
fn unknown_version_is_corrupt() {
    let mut snapshot = RecoverySnapshot::capture("default", chain(1), epoch()).expect("capture");
    snapshot.version = SNAPSHOT_VERSION + 1;
    assert!(matches!(
        snapshot.validate(3),
        Err(AppError::CorruptSnapshot(_))
    ));
}

#[test]
fn edited_session_breaks_digest() {
    let mut snapshot = RecoverySnapshot::capture("default", chain(2), epoch()).expect("capture");
    snapshot.sessions[0].phase = "edited".into();
    let err = snapshot.validate(3).expect_err("must fail");
    assert!(err.to_string().contains("digest"), "got {err}");
}

#[test]
fn structurally_invalid_snapshot_is_corrupt_even_with_matching_digest() {
    let mut sessions = chain(3);
    sessions[0].status = SessionStatus::Active;
    let snapshot = RecoverySnapshot::capture("default", sessions, epoch()).expect("capture");
    assert!(matches!(
        snapshot.validate(3),
        Err(AppError::CorruptSnapshot(_))
    ));
}

#[test]
fn snapshot_deeper_than_limit_is_corrupt() {
    let snapshot = RecoverySnapshot::capture("default", chain(4), epoch()).expect("capture");
    assert!(snapshot.validate(2).is_err());
}

// ── Checkpoint ───────────────────────────────────────────────

#[test]
fn checkpoint_captures_session_position() {
    let mut session = Session::root("essay".into(), epoch());
    session.phase = "drafting".into();
    session.progress.step = 4;
    session.checkpoint_seq = 2;

    let checkpoint = Checkpoint::capture(&session, Payload::new("v1", b"abc".to_vec()), epoch());
    assert_eq!(checkpoint.sequence, 3);
    assert_eq!(checkpoint.phase, "drafting");
    assert_eq!(checkpoint.progress.step, 4);
    assert_eq!(checkpoint.session_id, session.id);
    assert_eq!(checkpoint.payload_digest.len(), 64);
    checkpoint.verify().expect("valid");
}

#[test]
fn tampered_checkpoint_payload_fails_verify() {
    let session = Session::root("essay".into(), epoch());
    let mut checkpoint =
        Checkpoint::capture(&session, Payload::new("v1", b"abc".to_vec()), epoch());
    checkpoint.payload.data.push(b'!');
    assert!(matches!(
        checkpoint.verify(),
        Err(AppError::CorruptSnapshot(_))
    ));
}

#[test]
fn empty_payload_is_allowed() {
    let session = Session::root("essay".into(), epoch());
    let checkpoint = Checkpoint::capture(&session, Payload::default(), epoch());
    checkpoint.verify().expect("empty payload is valid");
}
