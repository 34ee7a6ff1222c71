//! Transition events emitted by the stack manager.

use serde::{Deserialize, Serialize};

use super::session::SessionOutcome;

/// Structured record emitted synchronously on every stack transition.
///
/// Events are delivered in commit order on a bounded channel so callers can
/// log them or assert exact sequences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StackEvent {
    /// A session became the active top, either as root or as an interrupt.
    Began {
        /// New session identifier.
        session_id: String,
        /// Task name.
        task: String,
        /// Nesting depth of the new session.
        depth: usize,
    },
    /// The active top was suspended beneath a new interrupt.
    Pause {
        /// Suspended session identifier.
        session_id: String,
        /// Task name.
        task: String,
        /// Phase at suspension.
        phase: String,
    },
    /// A suspended or recovered session became the active top again.
    Resume {
        /// Resumed session identifier.
        session_id: String,
        /// Task name.
        task: String,
        /// Phase the task resumes in.
        phase: String,
    },
    /// A session left the stack.
    Finished {
        /// Finished session identifier.
        session_id: String,
        /// Task name.
        task: String,
        /// Caller-supplied outcome.
        outcome: SessionOutcome,
    },
    /// The top was orphaned and the stack flushed to the recovery store.
    Orphaned {
        /// Orphaned session identifier.
        session_id: String,
        /// Task name.
        task: String,
        /// Number of sessions written to the recovery snapshot.
        entries: usize,
    },
}

impl StackEvent {
    /// Identifier of the session the event concerns.
    #[must_use]
    pub fn session_id(&self) -> &str {
        match self {
            Self::Began { session_id, .. }
            | Self::Pause { session_id, .. }
            | Self::Resume { session_id, .. }
            | Self::Finished { session_id, .. }
            | Self::Orphaned { session_id, .. } => session_id,
        }
    }

    /// Task name of the session the event concerns.
    #[must_use]
    pub fn task(&self) -> &str {
        match self {
            Self::Began { task, .. }
            | Self::Pause { task, .. }
            | Self::Resume { task, .. }
            | Self::Finished { task, .. }
            | Self::Orphaned { task, .. } => task,
        }
    }
}
