//! Checkpoint history and latest pointer on top of a [`KvStore`].

use std::sync::Arc;

use crate::models::checkpoint::Checkpoint;
use crate::{AppError, Result};

use super::KvStore;

/// Checkpoint repository keyed by session id.
#[derive(Clone)]
pub struct CheckpointStore {
    kv: Arc<dyn KvStore>,
}

impl CheckpointStore {
    /// Create a new repository over `kv`.
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Append `checkpoint` to its session's history and move the latest
    /// pointer to it.
    ///
    /// The history entry is written first; a failure between the two writes
    /// leaves `latest` on the previous checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if serialization or either write fails.
    pub async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let bytes = serde_json::to_vec(checkpoint)
            .map_err(|err| AppError::Persistence(format!("failed to serialize checkpoint: {err}")))?;

        let history_key = history_key(&checkpoint.session_id, checkpoint.sequence);
        self.kv.put(&history_key, bytes.clone()).await?;
        self.kv
            .put(&latest_key(&checkpoint.session_id), bytes)
            .await
    }

    /// Most recent checkpoint for `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the read fails, or
    /// `AppError::CorruptSnapshot` if the stored record does not parse or its
    /// payload digest does not match.
    pub async fn latest(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        self.read(&latest_key(session_id)).await
    }

    /// Every retained checkpoint for `session_id`, oldest first.
    ///
    /// `count` is the session's checkpoint sequence; missing entries (for
    /// example after a partial purge) are skipped.
    ///
    /// # Errors
    ///
    /// Same as [`latest`](Self::latest).
    pub async fn history(&self, session_id: &str, count: u64) -> Result<Vec<Checkpoint>> {
        let mut entries = Vec::new();
        for sequence in 1..=count {
            if let Some(checkpoint) = self.read(&history_key(session_id, sequence)).await? {
                entries.push(checkpoint);
            }
        }
        Ok(entries)
    }

    /// Delete every checkpoint recorded for `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` on the first failed delete.
    pub async fn purge(&self, session_id: &str, count: u64) -> Result<()> {
        for sequence in 1..=count {
            self.kv.delete(&history_key(session_id, sequence)).await?;
        }
        self.kv.delete(&latest_key(session_id)).await
    }

    async fn read(&self, key: &str) -> Result<Option<Checkpoint>> {
        let Some(bytes) = self.kv.get(key).await? else {
            return Ok(None);
        };

        let checkpoint: Checkpoint = serde_json::from_slice(&bytes).map_err(|err| {
            AppError::CorruptSnapshot(format!("checkpoint at {key} does not parse: {err}"))
        })?;
        checkpoint.verify()?;
        Ok(Some(checkpoint))
    }
}

fn history_key(session_id: &str, sequence: u64) -> String {
    format!("checkpoint/{session_id}/{sequence:08}")
}

fn latest_key(session_id: &str) -> String {
    format!("checkpoint/{session_id}/latest")
}
