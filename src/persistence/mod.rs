//! Persistence layer: the key-value backend contract and its implementations.
//!
//! Every durable medium implements [`KvStore`]. The stack manager never
//! talks to a backend directly; it goes through [`CheckpointStore`] and
//! [`RecoveryStore`], which own the key layout and serialization.
//!
//! ```text
//! checkpoint/<session-id>/00000001   checkpoint history entries
//! checkpoint/<session-id>/latest     most recent checkpoint
//! recovery/<scope>                   orphan recovery snapshot
//! live/<scope>                       CLI hand-off of the live stack
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::Result;

pub mod checkpoint_store;
pub mod db;
pub mod file_store;
pub mod key_safety;
pub mod memory;
pub mod recovery_store;
pub mod schema;
pub mod sqlite_store;

pub use checkpoint_store::CheckpointStore;
pub use file_store::FileStore;
pub use memory::MemoryStore;
pub use recovery_store::RecoveryStore;
pub use sqlite_store::SqliteStore;

/// Boxed future returned by [`KvStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Minimal durable key-value contract.
///
/// Keys are `/`-separated segments of `[A-Za-z0-9._-]`. Values are opaque
/// bytes. Implementations must be [`Send`] and [`Sync`] so a single backend
/// can be shared by several stack managers via [`std::sync::Arc`].
pub trait KvStore: Send + Sync {
    /// Insert or overwrite the value stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Persistence`](crate::AppError::Persistence) if the
    /// write does not complete durably.
    fn put<'a>(&'a self, key: &'a str, value: Vec<u8>) -> StoreFuture<'a, ()>;

    /// Fetch the value stored at `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Persistence`](crate::AppError::Persistence) if the
    /// read fails for any reason other than absence.
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>>;

    /// Remove `key`. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Persistence`](crate::AppError::Persistence) if the
    /// delete fails.
    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;
}

/// Open the backend selected by `config`.
///
/// # Errors
///
/// Returns `AppError::Persistence` if the directory or database cannot be
/// opened.
pub async fn open_backend(config: &StorageConfig) -> Result<Arc<dyn KvStore>> {
    let store: Arc<dyn KvStore> = match config.backend {
        StorageBackend::File => Arc::new(FileStore::open(&config.root)?),
        StorageBackend::Sqlite => {
            let pool = db::connect(&config.root).await?;
            Arc::new(SqliteStore::new(Arc::new(pool)))
        }
    };
    info!(backend = ?config.backend, root = %config.root.display(), "storage backend opened");
    Ok(store)
}
