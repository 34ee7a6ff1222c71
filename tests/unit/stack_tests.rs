//! Unit tests for `SessionStack` bookkeeping and `check_structure`.

use chrono::{DateTime, Duration, TimeZone, Utc};

use task_stack::models::session::{Session, SessionOutcome, SessionStatus};
use task_stack::orchestrator::stack::{check_structure, SessionStack};
use task_stack::AppError;

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("valid date")
}

fn stack_of(names: &[&str]) -> SessionStack {
    let mut stack = SessionStack::new(3);
    let mut iter = names.iter();
    if let Some(first) = iter.next() {
        stack.push_root((*first).into(), epoch()).expect("root");
    }
    for name in iter {
        stack.push_nested((*name).into(), epoch()).expect("nested");
    }
    stack
}

// ── Push ─────────────────────────────────────────────────────

#[test]
fn push_root_on_live_stack_is_already_running() {
    let mut stack = stack_of(&["A"]);
    let err = stack.push_root("B".into(), epoch()).expect_err("must fail");
    assert!(matches!(err, AppError::AlreadyRunning(_)));
}

#[test]
fn push_nested_pauses_parent() {
    let mut stack = stack_of(&["A"]);
    let (suspended, child) = stack.push_nested("B".into(), epoch()).expect("nested");
    assert_eq!(suspended.status, SessionStatus::Paused);
    assert_eq!(child.status, SessionStatus::Active);
    assert_eq!(stack.sessions()[0].status, SessionStatus::Paused);
    assert_eq!(stack.top().map(|s| s.name.as_str()), Some("B"));
}

#[test]
fn push_nested_beyond_max_depth_fails() {
    let mut stack = stack_of(&["A", "B", "C", "D"]);
    let err = stack.push_nested("E".into(), epoch()).expect_err("must fail");
    assert!(matches!(err, AppError::DepthLimitExceeded(_)));
    assert_eq!(stack.len(), 4);
    assert_eq!(stack.top().map(|s| s.status), Some(SessionStatus::Active));
}

#[test]
fn ensure_nestable_checks_without_mutating() {
    let full = stack_of(&["A", "B", "C", "D"]);
    assert!(matches!(
        full.ensure_nestable(),
        Err(AppError::DepthLimitExceeded(_))
    ));
    assert!(matches!(
        SessionStack::new(3).ensure_nestable(),
        Err(AppError::EmptyStack(_))
    ));

    let partial = stack_of(&["A", "B"]);
    partial.ensure_nestable().expect("room for one more");
    assert_eq!(partial.top().map(|s| s.status), Some(SessionStatus::Active));
}

#[test]
fn push_nested_on_empty_stack_fails() {
    let mut stack = SessionStack::new(3);
    let err = stack.push_nested("B".into(), epoch()).expect_err("must fail");
    assert!(matches!(err, AppError::EmptyStack(_)));
}

#[test]
fn zero_max_depth_allows_only_root() {
    let mut stack = SessionStack::new(0);
    stack.push_root("A".into(), epoch()).expect("root");
    assert!(matches!(
        stack.push_nested("B".into(), epoch()),
        Err(AppError::DepthLimitExceeded(_))
    ));
}

// ── Pop ──────────────────────────────────────────────────────

#[test]
fn pop_to_parent_reactivates_and_touches_parent() {
    let mut stack = stack_of(&["A", "B"]);
    let later = epoch() + Duration::seconds(120);

    let popped = stack
        .pop_to_parent(SessionOutcome::Completed, later)
        .expect("pop");
    assert_eq!(popped.finished.name, "B");
    assert_eq!(popped.finished.status, SessionStatus::Completed);
    assert_eq!(popped.resumed.name, "A");
    assert_eq!(popped.resumed.status, SessionStatus::Active);
    assert_eq!(popped.resumed.last_activity_at, later);
    assert_eq!(stack.len(), 1);
}

#[test]
fn pop_to_parent_at_root_fails_without_change() {
    let mut stack = stack_of(&["A"]);
    let err = stack
        .pop_to_parent(SessionOutcome::Completed, epoch())
        .expect_err("must fail");
    assert!(matches!(err, AppError::EmptyStack(_)));
    assert_eq!(stack.len(), 1);
}

#[test]
fn finish_root_follows_stack_height() {
    let mut empty = SessionStack::new(3);
    assert!(matches!(
        empty.finish_root(SessionOutcome::Completed),
        Err(AppError::EmptyStack(_))
    ));

    let mut nested = stack_of(&["A", "B"]);
    assert!(matches!(
        nested.finish_root(SessionOutcome::Completed),
        Err(AppError::Unresolved(_))
    ));

    let mut single = stack_of(&["A"]);
    let root = single
        .finish_root(SessionOutcome::Discarded)
        .expect("finish");
    assert_eq!(root.status, SessionStatus::Discarded);
    assert!(single.is_empty());
}

// ── Staleness marking ────────────────────────────────────────

#[test]
fn mark_stale_below_skips_top_and_fresh_sessions() {
    let mut stack = stack_of(&["A", "B", "C"]);
    let later = epoch() + Duration::seconds(2000);
    stack.top_mut().expect("top").touch(later);

    let marked = stack.mark_stale_below(later, 1800);
    assert_eq!(marked.len(), 2);
    let statuses: Vec<_> = stack.sessions().iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![SessionStatus::Stale, SessionStatus::Stale, SessionStatus::Active]
    );

    assert!(stack.mark_stale_below(later, 1800).is_empty());
}

#[test]
fn mark_stale_below_respects_threshold() {
    let mut stack = stack_of(&["A", "B"]);
    let marked = stack.mark_stale_below(epoch() + Duration::seconds(1800), 1800);
    assert!(marked.is_empty());
}

// ── Install and structure checks ─────────────────────────────

#[test]
fn install_accepts_valid_sessions() {
    let source = stack_of(&["A", "B", "C"]);
    let mut target = SessionStack::new(3);
    target
        .install(source.sessions().to_vec())
        .expect("install");
    assert_eq!(target.sessions(), source.sessions());
}

#[test]
fn install_over_live_stack_fails() {
    let source = stack_of(&["A"]);
    let mut target = stack_of(&["X"]);
    assert!(matches!(
        target.install(source.sessions().to_vec()),
        Err(AppError::AlreadyRunning(_))
    ));
}

#[test]
fn install_rejects_broken_structure() {
    let mut sessions = stack_of(&["A", "B"]).sessions().to_vec();
    sessions[1].parent_id = Some("someone-else".into());

    let mut target = SessionStack::new(3);
    assert!(matches!(
        target.install(sessions),
        Err(AppError::CorruptSnapshot(_))
    ));
    assert!(target.is_empty());
}

#[test]
fn check_structure_flags_each_violation() {
    let valid = stack_of(&["A", "B", "C"]).sessions().to_vec();
    assert!(check_structure(&valid, 3).is_ok());
    assert!(check_structure(&[], 3).is_ok());

    assert!(check_structure(&valid, 1).is_err(), "too many sessions");

    let mut duplicate = valid.clone();
    duplicate[2].id = duplicate[0].id.clone();
    assert!(check_structure(&duplicate, 3).is_err());

    let mut wrong_depth = valid.clone();
    wrong_depth[1].progress.depth = 2;
    assert!(check_structure(&wrong_depth, 3).is_err());

    let mut two_active = valid.clone();
    two_active[0].status = SessionStatus::Active;
    assert!(check_structure(&two_active, 3).is_err());

    let mut paused_top = valid.clone();
    paused_top[2].status = SessionStatus::Paused;
    assert!(check_structure(&paused_top, 3).is_err());

    let mut orphaned_top = valid;
    orphaned_top[2].status = SessionStatus::Orphaned;
    orphaned_top[0].status = SessionStatus::Stale;
    assert!(check_structure(&orphaned_top, 3).is_ok());
}

#[test]
fn root_with_parent_is_rejected() {
    let mut sessions = vec![Session::root("A".into(), epoch())];
    sessions[0].parent_id = Some("ghost".into());
    assert!(check_structure(&sessions, 3).is_err());
}
