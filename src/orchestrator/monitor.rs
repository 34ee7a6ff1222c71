//! Staleness and orphan classification for the top of the stack.
//!
//! The monitor is pull-based: it owns no timer and never mutates the
//! stack. An external driver calls
//! [`stale_check`](super::stack_manager::SessionStackManager::stale_check)
//! or [`orphan_sweep`](super::stack_manager::SessionStackManager::orphan_sweep)
//! on its own cadence and the manager consults [`StalenessMonitor`] for the
//! verdict.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::session::Session;

/// Classification of a session's inactivity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Staleness {
    /// Within the stale threshold.
    Fresh,
    /// Past the stale threshold but not the orphan threshold.
    Stale,
    /// Past the orphan threshold.
    Orphaned,
}

/// What the caller should do about the reported session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Keep working; nothing to decide.
    Continue,
    /// Ask the user whether to resume or discard.
    AskUser,
}

/// Result of a stale check against the top session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct StaleReport {
    /// Session that was checked.
    pub session_id: String,
    /// Task name of the checked session.
    pub task: String,
    /// Whether inactivity exceeds the stale threshold.
    pub stale: bool,
    /// Seconds since last activity.
    pub age_seconds: i64,
    /// Finer classification including orphan status.
    pub staleness: Staleness,
    /// Always `AskUser` when stale.
    pub recommendation: Recommendation,
}

/// Threshold pair used to classify inactivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessMonitor {
    stale_threshold: Duration,
    orphan_threshold: Duration,
}

impl StalenessMonitor {
    /// Construct a monitor from the two thresholds.
    #[must_use]
    pub fn new(stale_threshold: Duration, orphan_threshold: Duration) -> Self {
        Self {
            stale_threshold,
            orphan_threshold,
        }
    }

    /// Stale threshold in whole seconds.
    #[must_use]
    pub fn stale_secs(&self) -> i64 {
        secs(self.stale_threshold)
    }

    /// Orphan threshold in whole seconds.
    #[must_use]
    pub fn orphan_secs(&self) -> i64 {
        secs(self.orphan_threshold)
    }

    /// Classify `session` as of `now`. Thresholds are exclusive.
    #[must_use]
    pub fn classify(&self, session: &Session, now: DateTime<Utc>) -> Staleness {
        let age = session.idle_seconds(now);
        if age > self.orphan_secs() {
            Staleness::Orphaned
        } else if age > self.stale_secs() {
            Staleness::Stale
        } else {
            Staleness::Fresh
        }
    }

    /// Build the stale-check report for `session`.
    #[must_use]
    pub fn report(&self, session: &Session, now: DateTime<Utc>) -> StaleReport {
        let staleness = self.classify(session, now);
        let stale = staleness != Staleness::Fresh;
        StaleReport {
            session_id: session.id.clone(),
            task: session.name.clone(),
            stale,
            age_seconds: session.idle_seconds(now),
            staleness,
            recommendation: if stale {
                Recommendation::AskUser
            } else {
                Recommendation::Continue
            },
        }
    }
}

fn secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}
