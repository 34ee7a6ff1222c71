//! Recovery snapshot: the whole stack serialized for orphaned work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::Session;
use super::sha256_hex;
use crate::orchestrator::stack::check_structure;
use crate::{AppError, Result};

/// Current on-disk snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Full copy of a session stack, bottom (root) first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RecoverySnapshot {
    /// Snapshot format version.
    pub version: u32,
    /// Stack scope the snapshot was taken from.
    pub scope: String,
    /// Write timestamp.
    pub saved_at: DateTime<Utc>,
    /// Sessions in stack order.
    pub sessions: Vec<Session>,
    /// SHA-256 over the serialized session list.
    pub digest: String,
}

impl RecoverySnapshot {
    /// Capture `sessions` as a snapshot for `scope`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the session list cannot be serialized.
    pub fn capture(scope: &str, sessions: Vec<Session>, saved_at: DateTime<Utc>) -> Result<Self> {
        let digest = digest_sessions(&sessions)?;
        Ok(Self {
            version: SNAPSHOT_VERSION,
            scope: scope.to_owned(),
            saved_at,
            sessions,
            digest,
        })
    }

    /// Session on top of the captured stack.
    #[must_use]
    pub fn top(&self) -> Option<&Session> {
        self.sessions.last()
    }

    /// Re-check format, digest and stack invariants before installation.
    ///
    /// # Errors
    ///
    /// Returns `AppError::CorruptSnapshot` describing the first violation.
    pub fn validate(&self, max_depth: usize) -> Result<()> {
        if self.sessions.is_empty() {
            return Err(AppError::CorruptSnapshot("snapshot holds no sessions".into()));
        }

        if self.version != SNAPSHOT_VERSION {
            return Err(AppError::CorruptSnapshot(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }

        let actual = digest_sessions(&self.sessions)
            .map_err(|err| AppError::CorruptSnapshot(err.to_string()))?;
        if actual != self.digest {
            return Err(AppError::CorruptSnapshot("digest mismatch".into()));
        }

        check_structure(&self.sessions, max_depth).map_err(AppError::CorruptSnapshot)
    }
}

fn digest_sessions(sessions: &[Session]) -> Result<String> {
    let bytes = serde_json::to_vec(sessions)
        .map_err(|err| AppError::Persistence(format!("failed to serialize sessions: {err}")))?;
    Ok(sha256_hex(&bytes))
}
