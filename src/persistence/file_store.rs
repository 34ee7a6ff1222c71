//! File-per-key backend with atomic replacement.
//!
//! Each key maps to one file under the store root. Writes go to a
//! temporary file in the same directory and are renamed into place via
//! `tempfile::NamedTempFile::persist()`, so readers never observe a partial
//! value. Blocking file I/O runs on the `spawn_blocking` pool.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::key_safety::resolve_key;
use super::{KvStore, StoreFuture};
use crate::{AppError, Result};

/// Durable store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store under `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|err| {
            AppError::Persistence(format!(
                "failed to create store directory {}: {err}",
                root.display()
            ))
        })?;
        Ok(Self { root })
    }

    /// Store root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl KvStore for FileStore {
    fn put<'a>(&'a self, key: &'a str, value: Vec<u8>) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let path = resolve_key(&self.root, key)?;
            debug!(key, bytes = value.len(), "file store put");
            run_blocking(move || write_atomic(&path, &value)).await
        })
    }

    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            let path = resolve_key(&self.root, key)?;
            run_blocking(move || match std::fs::read(&path) {
                Ok(bytes) => Ok(Some(bytes)),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
                Err(err) => Err(AppError::Persistence(format!(
                    "failed to read {}: {err}",
                    path.display()
                ))),
            })
            .await
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let path = resolve_key(&self.root, key)?;
            debug!(key, "file store delete");
            run_blocking(move || match std::fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                Err(err) => Err(AppError::Persistence(format!(
                    "failed to delete {}: {err}",
                    path.display()
                ))),
            })
            .await
        })
    }
}

/// Write `content` to `path` through a sibling temp file and rename.
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| AppError::Persistence("store path has no parent directory".into()))?;

    std::fs::create_dir_all(parent).map_err(|err| {
        AppError::Persistence(format!(
            "failed to create parent directories for {}: {err}",
            path.display()
        ))
    })?;

    let mut tmp = NamedTempFile::new_in(parent)
        .map_err(|err| AppError::Persistence(format!("failed to create temporary file: {err}")))?;

    tmp.write_all(content)
        .map_err(|err| AppError::Persistence(format!("failed to write temporary file: {err}")))?;
    tmp.as_file()
        .sync_all()
        .map_err(|err| AppError::Persistence(format!("failed to sync temporary file: {err}")))?;

    tmp.persist(path).map_err(|err| {
        AppError::Persistence(format!("failed to persist {}: {err}", path.display()))
    })?;

    Ok(())
}

async fn run_blocking<T, F>(job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| AppError::Persistence(format!("file store task panicked: {err}")))?
}
