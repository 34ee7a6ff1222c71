//! In-memory session stack and its structural invariants.
//!
//! [`SessionStack`] is pure bookkeeping: no I/O, no clocks of its own and no
//! locking. The [`SessionStackManager`](super::stack_manager::SessionStackManager)
//! owns one behind a mutex and layers persistence and events on top.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::models::session::{Session, SessionOutcome, SessionStatus};
use crate::{AppError, Result};

/// Ordered sessions, root at index 0, active interrupt on top.
#[derive(Debug, Clone)]
pub struct SessionStack {
    sessions: Vec<Session>,
    max_depth: usize,
}

/// Result of popping the top session back to its parent.
#[derive(Debug, Clone)]
pub struct Popped {
    /// Session that left the stack with its final status.
    pub finished: Session,
    /// Parent session, now active again.
    pub resumed: Session,
}

impl SessionStack {
    /// Create an empty stack allowing `max_depth` nested interrupts.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            sessions: Vec::new(),
            max_depth,
        }
    }

    /// Maximum nesting depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of sessions on the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no stack is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessions bottom-up.
    #[must_use]
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Current top session.
    #[must_use]
    pub fn top(&self) -> Option<&Session> {
        self.sessions.last()
    }

    /// Current top session, mutably.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyStack` if no session exists.
    pub fn top_mut(&mut self) -> Result<&mut Session> {
        self.sessions
            .last_mut()
            .ok_or_else(|| AppError::EmptyStack("no active session".into()))
    }

    /// Push a depth-0 session onto an empty stack.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AlreadyRunning` if the stack is not empty.
    pub fn push_root(&mut self, name: String, now: DateTime<Utc>) -> Result<Session> {
        if let Some(top) = self.top() {
            return Err(AppError::AlreadyRunning(format!(
                "stack already running with {} session(s), top '{}'",
                self.sessions.len(),
                top.name
            )));
        }

        let session = Session::root(name, now);
        self.sessions.push(session.clone());
        Ok(session)
    }

    /// Suspend the top and push a nested session above it.
    ///
    /// Returns the suspended parent and the new active session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyStack` with no session to interrupt, or
    /// `AppError::DepthLimitExceeded` if the top is already at `max_depth`.
    pub fn push_nested(&mut self, name: String, now: DateTime<Utc>) -> Result<(Session, Session)> {
        self.ensure_nestable()?;
        let parent = self.top_mut()?;
        parent.status = SessionStatus::Paused;
        let suspended = parent.clone();
        let child = Session::nested(name, &suspended, now);
        self.sessions.push(child.clone());
        Ok((suspended, child))
    }

    /// Check that the top can be interrupted without changing anything.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyStack` with no session to interrupt, or
    /// `AppError::DepthLimitExceeded` if the top is already at `max_depth`.
    pub fn ensure_nestable(&self) -> Result<()> {
        let parent = self
            .top()
            .ok_or_else(|| AppError::EmptyStack("no session to interrupt".into()))?;

        if parent.depth() >= self.max_depth {
            return Err(AppError::DepthLimitExceeded(format!(
                "'{}' is at depth {}, maximum is {}; complete or discard a nested session first",
                parent.name,
                parent.depth(),
                self.max_depth
            )));
        }
        Ok(())
    }

    /// Pop the top with `outcome` and reactivate its parent.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyStack` if there is no parent to return to.
    pub fn pop_to_parent(&mut self, outcome: SessionOutcome, now: DateTime<Utc>) -> Result<Popped> {
        if self.sessions.len() < 2 {
            return Err(AppError::EmptyStack(
                "no interrupted session to return to".into(),
            ));
        }

        let mut finished = self
            .sessions
            .pop()
            .ok_or_else(|| AppError::EmptyStack("no active session".into()))?;
        finished.status = outcome.into();

        let parent = self.top_mut()?;
        parent.status = SessionStatus::Active;
        parent.touch(now);
        let resumed = parent.clone();

        Ok(Popped { finished, resumed })
    }

    /// Close the root session and empty the stack.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyStack` on an empty stack, or
    /// `AppError::Unresolved` while nested sessions remain.
    pub fn finish_root(&mut self, outcome: SessionOutcome) -> Result<Session> {
        match self.sessions.len() {
            0 => Err(AppError::EmptyStack("no session to finish".into())),
            1 => {
                let mut root = self
                    .sessions
                    .pop()
                    .ok_or_else(|| AppError::EmptyStack("no session to finish".into()))?;
                root.status = outcome.into();
                Ok(root)
            }
            n => Err(AppError::Unresolved(format!(
                "{} nested session(s) still open",
                n - 1
            ))),
        }
    }

    /// Mark suspended sessions idle past `threshold_secs` as stale.
    ///
    /// Returns the identifiers that changed.
    pub fn mark_stale_below(&mut self, now: DateTime<Utc>, threshold_secs: i64) -> Vec<String> {
        let below = self.sessions.len().saturating_sub(1);
        self.sessions[..below]
            .iter_mut()
            .filter(|s| s.status == SessionStatus::Paused && s.idle_seconds(now) > threshold_secs)
            .map(|s| {
                s.status = SessionStatus::Stale;
                s.id.clone()
            })
            .collect()
    }

    /// Replace the whole stack with a validated session list.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AlreadyRunning` if a stack is live, or
    /// `AppError::CorruptSnapshot` if `sessions` violates an invariant.
    pub fn install(&mut self, sessions: Vec<Session>) -> Result<()> {
        if !self.sessions.is_empty() {
            return Err(AppError::AlreadyRunning(
                "cannot install a stack over a live one".into(),
            ));
        }
        check_structure(&sessions, self.max_depth).map_err(AppError::CorruptSnapshot)?;
        self.sessions = sessions;
        Ok(())
    }
}

/// Verify ordering, depth, parent linkage and status invariants.
///
/// An empty slice is valid. Returns a description of the first violation.
///
/// # Errors
///
/// Returns the violated invariant as a message.
pub fn check_structure(sessions: &[Session], max_depth: usize) -> std::result::Result<(), String> {
    if sessions.len() > max_depth + 1 {
        return Err(format!(
            "stack holds {} sessions, at most {} allowed",
            sessions.len(),
            max_depth + 1
        ));
    }

    let mut seen = HashSet::new();
    let top_index = sessions.len().saturating_sub(1);

    for (index, session) in sessions.iter().enumerate() {
        if !seen.insert(session.id.as_str()) {
            return Err(format!("duplicate session id {}", session.id));
        }

        if session.depth() != index {
            return Err(format!(
                "session {} at index {index} has depth {}",
                session.id,
                session.depth()
            ));
        }

        let expected_parent = index.checked_sub(1).map(|i| sessions[i].id.as_str());
        if session.parent_id.as_deref() != expected_parent {
            return Err(format!("session {} has a broken parent link", session.id));
        }

        let status_ok = if index == top_index {
            session.status.is_live_top()
        } else {
            session.status.is_suspended()
        };
        if !status_ok {
            return Err(format!(
                "session {} at index {index} has status {:?}",
                session.id, session.status
            ));
        }
    }

    Ok(())
}
