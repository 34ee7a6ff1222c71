//! `SQLite`-backed key-value store.

use std::sync::Arc;

use chrono::Utc;

use super::db::Database;
use super::key_safety::validate_key;
use super::{KvStore, StoreFuture};

/// Repository wrapper around the `kv_entry` table.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    /// Create a new store over an already bootstrapped pool.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl KvStore for SqliteStore {
    fn put<'a>(&'a self, key: &'a str, value: Vec<u8>) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            validate_key(key)?;
            let updated_at = Utc::now().to_rfc3339();

            sqlx::query(
                "INSERT INTO kv_entry (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(value)
            .bind(updated_at)
            .execute(self.db.as_ref())
            .await?;

            Ok(())
        })
    }

    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            validate_key(key)?;
            let row: Option<(Vec<u8>,)> =
                sqlx::query_as("SELECT value FROM kv_entry WHERE key = ?1")
                    .bind(key)
                    .fetch_optional(self.db.as_ref())
                    .await?;
            Ok(row.map(|(value,)| value))
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            validate_key(key)?;
            sqlx::query("DELETE FROM kv_entry WHERE key = ?1")
                .bind(key)
                .execute(self.db.as_ref())
                .await?;
            Ok(())
        })
    }
}
