//! Session model and lifecycle helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::checkpoint::Payload;

/// Phase assigned to every freshly created session.
pub const INITIAL_PHASE: &str = "start";

/// Lifecycle status for a stacked session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Top of the stack, currently worked on.
    Active,
    /// Suspended below a nested interrupt.
    Paused,
    /// Suspended past the stale threshold; needs a human decision.
    Stale,
    /// Untouched past the orphan threshold; stack flushed for recovery.
    Orphaned,
    /// Finished successfully and removed from the stack.
    Completed,
    /// Abandoned by the caller and removed from the stack.
    Discarded,
}

impl SessionStatus {
    /// Whether a session in this status may sit below the top of the stack.
    #[must_use]
    pub fn is_suspended(self) -> bool {
        matches!(self, Self::Paused | Self::Stale)
    }

    /// Whether a session in this status may be the top of a live stack.
    #[must_use]
    pub fn is_live_top(self) -> bool {
        matches!(self, Self::Active | Self::Orphaned)
    }
}

/// Caller-supplied result for a session leaving the stack.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// The nested work finished.
    Completed,
    /// The nested work was abandoned.
    Discarded,
}

impl From<SessionOutcome> for SessionStatus {
    fn from(outcome: SessionOutcome) -> Self {
        match outcome {
            SessionOutcome::Completed => Self::Completed,
            SessionOutcome::Discarded => Self::Discarded,
        }
    }
}

/// Position of a session within its own workflow and the interrupt stack.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Progress {
    /// Non-decreasing counter within the current phase.
    pub step: u64,
    /// Nesting level; 0 is the root task.
    pub depth: usize,
}

/// One unit of tracked work, active or suspended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Session {
    /// Unique identifier; immutable after creation.
    pub id: String,
    /// Human-readable task label.
    pub name: String,
    /// Current stage within the task's own workflow.
    pub phase: String,
    /// Step counter and nesting depth.
    pub progress: Progress,
    /// Session interrupted to create this one; `None` at depth 0.
    pub parent_id: Option<String>,
    /// Latest opaque payload recorded via checkpoint.
    pub payload: Option<Payload>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last checkpoint, phase transition or reactivation.
    pub last_activity_at: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// Number of checkpoints written for this session.
    #[serde(default)]
    pub checkpoint_seq: u64,
}

impl Session {
    /// Construct a new active root session.
    #[must_use]
    pub fn root(name: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            phase: INITIAL_PHASE.to_owned(),
            progress: Progress::default(),
            parent_id: None,
            payload: None,
            created_at: now,
            last_activity_at: now,
            status: SessionStatus::Active,
            checkpoint_seq: 0,
        }
    }

    /// Construct an active session nested one level below `parent`.
    #[must_use]
    pub fn nested(name: String, parent: &Session, now: DateTime<Utc>) -> Self {
        let mut session = Self::root(name, now);
        session.parent_id = Some(parent.id.clone());
        session.progress.depth = parent.progress.depth + 1;
        session
    }

    /// Nesting depth shorthand.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.progress.depth
    }

    /// Record activity at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
    }

    /// Seconds since last activity, clamped at zero for clock skew.
    #[must_use]
    pub fn idle_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_activity_at).num_seconds().max(0)
    }
}
