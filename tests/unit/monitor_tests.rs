//! Unit tests for `StalenessMonitor` classification.

use std::time::Duration;

use chrono::{TimeZone, Utc};

use task_stack::models::session::Session;
use task_stack::orchestrator::monitor::{Recommendation, Staleness, StalenessMonitor};

fn monitor() -> StalenessMonitor {
    StalenessMonitor::new(Duration::from_secs(1800), Duration::from_secs(3600))
}

fn session_idle_for(seconds: i64) -> (Session, chrono::DateTime<Utc>) {
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("valid date");
    let session = Session::root("A".into(), start);
    (session, start + chrono::Duration::seconds(seconds))
}

#[test]
fn classification_uses_exclusive_thresholds() {
    let cases = [
        (0, Staleness::Fresh),
        (1700, Staleness::Fresh),
        (1800, Staleness::Fresh),
        (1801, Staleness::Stale),
        (1900, Staleness::Stale),
        (3600, Staleness::Stale),
        (3601, Staleness::Orphaned),
        (3700, Staleness::Orphaned),
    ];
    for (age, expected) in cases {
        let (session, now) = session_idle_for(age);
        assert_eq!(monitor().classify(&session, now), expected, "age {age}");
    }
}

#[test]
fn stale_report_recommends_asking_user() {
    let (session, now) = session_idle_for(1900);
    let report = monitor().report(&session, now);
    assert!(report.stale);
    assert_eq!(report.age_seconds, 1900);
    assert_eq!(report.recommendation, Recommendation::AskUser);
    assert_eq!(report.session_id, session.id);
    assert_eq!(report.task, "A");
}

#[test]
fn orphaned_report_is_also_stale() {
    let (session, now) = session_idle_for(4000);
    let report = monitor().report(&session, now);
    assert!(report.stale);
    assert_eq!(report.staleness, Staleness::Orphaned);
    assert_eq!(report.recommendation, Recommendation::AskUser);
}

#[test]
fn fresh_report_continues() {
    let (session, now) = session_idle_for(1700);
    let report = monitor().report(&session, now);
    assert!(!report.stale);
    assert_eq!(report.recommendation, Recommendation::Continue);
}

#[test]
fn report_serializes_snake_case() {
    let (session, now) = session_idle_for(1900);
    let value = serde_json::to_value(monitor().report(&session, now)).expect("serialize");
    assert_eq!(value["recommendation"], "ask_user");
    assert_eq!(value["staleness"], "stale");
}
