//! Recovery snapshot slot on top of a [`KvStore`].

use std::sync::Arc;

use crate::models::snapshot::RecoverySnapshot;
use crate::{AppError, Result};

use super::KvStore;

/// One snapshot slot under a fixed key prefix.
///
/// The manager uses the `recovery` prefix for orphaned stacks; the CLI uses
/// a second instance under `live` to carry the stack between invocations.
#[derive(Clone)]
pub struct RecoveryStore {
    kv: Arc<dyn KvStore>,
    key: String,
}

impl RecoveryStore {
    /// Orphan recovery slot for `scope`.
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>, scope: &str) -> Self {
        Self::with_prefix(kv, "recovery", scope)
    }

    /// Snapshot slot at `<prefix>/<scope>`.
    #[must_use]
    pub fn with_prefix(kv: Arc<dyn KvStore>, prefix: &str, scope: &str) -> Self {
        Self {
            kv,
            key: format!("{prefix}/{scope}"),
        }
    }

    /// Store key of this slot.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Overwrite the slot with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if serialization or the write fails.
    pub async fn save(&self, snapshot: &RecoverySnapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot).map_err(|err| {
            AppError::Persistence(format!("failed to serialize recovery snapshot: {err}"))
        })?;
        self.kv.put(&self.key, bytes).await
    }

    /// Read the slot without validating stack invariants.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the read fails, or
    /// `AppError::CorruptSnapshot` if the stored bytes do not parse.
    pub async fn load(&self) -> Result<Option<RecoverySnapshot>> {
        let Some(bytes) = self.kv.get(&self.key).await? else {
            return Ok(None);
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|err| {
            AppError::CorruptSnapshot(format!("snapshot at {} does not parse: {err}", self.key))
        })
    }

    /// Remove the slot.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the delete fails.
    pub async fn discard(&self) -> Result<()> {
        self.kv.delete(&self.key).await
    }
}
