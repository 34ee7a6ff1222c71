//! Structured audit logging for stack transitions.
//!
//! Provides the [`AuditLogger`] trait and associated types. The primary
//! implementation, [`JsonlAuditWriter`], appends JSONL records to
//! daily-rotating files.

pub mod writer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::event::StackEvent;
use crate::models::session::SessionOutcome;

/// Event type classification for audit log entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// A root or nested session started.
    SessionBegin,
    /// A session was suspended beneath an interrupt.
    SessionPause,
    /// A session became active again.
    SessionResume,
    /// A session left the stack.
    SessionFinish,
    /// The stack was flushed to the recovery store.
    SessionOrphan,
}

/// A structured record of one stack transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEntry {
    /// ISO 8601 timestamp with timezone.
    pub timestamp: DateTime<Utc>,
    /// Stack scope the transition happened in.
    pub scope: String,
    /// Event classification.
    pub event_type: AuditEventType,
    /// Session the transition concerns.
    pub session_id: String,
    /// Task name.
    pub task: String,
    /// Phase, for pause/resume transitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Depth, for begin transitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
    /// Outcome, for finish transitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SessionOutcome>,
    /// Recovery snapshot size, for orphan transitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_entries: Option<usize>,
}

impl AuditEntry {
    /// Convert a stack event observed in `scope` at `timestamp`.
    #[must_use]
    pub fn from_event(scope: &str, event: &StackEvent, timestamp: DateTime<Utc>) -> Self {
        let mut entry = Self {
            timestamp,
            scope: scope.to_owned(),
            event_type: AuditEventType::SessionBegin,
            session_id: event.session_id().to_owned(),
            task: event.task().to_owned(),
            phase: None,
            depth: None,
            outcome: None,
            snapshot_entries: None,
        };

        match event {
            StackEvent::Began { depth, .. } => {
                entry.depth = Some(*depth);
            }
            StackEvent::Pause { phase, .. } => {
                entry.event_type = AuditEventType::SessionPause;
                entry.phase = Some(phase.clone());
            }
            StackEvent::Resume { phase, .. } => {
                entry.event_type = AuditEventType::SessionResume;
                entry.phase = Some(phase.clone());
            }
            StackEvent::Finished { outcome, .. } => {
                entry.event_type = AuditEventType::SessionFinish;
                entry.outcome = Some(*outcome);
            }
            StackEvent::Orphaned { entries, .. } => {
                entry.event_type = AuditEventType::SessionOrphan;
                entry.snapshot_entries = Some(*entries);
            }
        }

        entry
    }
}

/// Writes structured audit entries to a persistent store.
///
/// Implementations must be [`Send`] and [`Sync`] to allow sharing across
/// async task boundaries via [`std::sync::Arc`].
pub trait AuditLogger: Send + Sync {
    /// Record a single audit entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write operation fails.
    fn log_entry(&self, entry: AuditEntry) -> crate::Result<()>;
}

pub use writer::JsonlAuditWriter;
