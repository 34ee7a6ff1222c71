//! Checkpoint model for session state snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::{Progress, Session};
use super::sha256_hex;
use crate::{AppError, Result};

/// Opaque caller state; the stack never interprets `data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payload {
    /// Caller-chosen version or schema tag.
    pub schema: String,
    /// Raw payload bytes.
    pub data: Vec<u8>,
}

impl Payload {
    /// Construct a payload from a schema tag and raw bytes.
    #[must_use]
    pub fn new(schema: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            schema: schema.into(),
            data: data.into(),
        }
    }
}

/// Immutable snapshot of a session's position and payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Checkpoint {
    /// Unique record identifier.
    pub id: String,
    /// Owning session identifier.
    pub session_id: String,
    /// 1-based position in the session's checkpoint history.
    pub sequence: u64,
    /// Session phase at checkpoint time.
    pub phase: String,
    /// Session progress at checkpoint time.
    pub progress: Progress,
    /// Opaque caller payload.
    pub payload: Payload,
    /// SHA-256 of `payload.data`, checked on read-back.
    pub payload_digest: String,
    /// Write timestamp.
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Snapshot `session` with `payload` as the next entry in its history.
    #[must_use]
    pub fn capture(session: &Session, payload: Payload, saved_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session.id.clone(),
            sequence: session.checkpoint_seq + 1,
            phase: session.phase.clone(),
            progress: session.progress,
            payload_digest: sha256_hex(&payload.data),
            payload,
            saved_at,
        }
    }

    /// Confirm the payload still matches its recorded digest.
    ///
    /// # Errors
    ///
    /// Returns `AppError::CorruptSnapshot` on digest mismatch.
    pub fn verify(&self) -> Result<()> {
        if sha256_hex(&self.payload.data) == self.payload_digest {
            Ok(())
        } else {
            Err(AppError::CorruptSnapshot(format!(
                "checkpoint {} payload digest mismatch",
                self.id
            )))
        }
    }
}
