//! In-process key-value backend.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::key_safety::validate_key;
use super::{KvStore, StoreFuture};

/// Volatile store backed by a shared `HashMap`.
///
/// Keys are validated exactly as the durable backends validate them.
///
/// Clones share the same map, so a test can keep a handle for inspection
/// while the manager owns another.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl KvStore for MemoryStore {
    fn put<'a>(&'a self, key: &'a str, value: Vec<u8>) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            validate_key(key)?;
            self.entries.lock().await.insert(key.to_owned(), value);
            Ok(())
        })
    }

    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            validate_key(key)?;
            Ok(self.entries.lock().await.get(key).cloned())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            validate_key(key)?;
            self.entries.lock().await.remove(key);
            Ok(())
        })
    }
}
