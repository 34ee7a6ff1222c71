//! Shared helpers for stack manager integration tests.
//!
//! Provides a manager wired to an in-memory store, a manual clock and an
//! event channel, plus a store double whose writes can be made to fail.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tokio::sync::mpsc;

use task_stack::clock::ManualClock;
use task_stack::config::StackConfig;
use task_stack::models::event::StackEvent;
use task_stack::persistence::{KvStore, MemoryStore, StoreFuture};
use task_stack::{AppError, SessionStackManager};

/// Manager plus the handles tests use to drive and observe it.
pub struct Harness {
    pub manager: SessionStackManager,
    pub clock: Arc<ManualClock>,
    pub store: FlakyStore,
    pub events: mpsc::Receiver<StackEvent>,
}

/// Harness with default thresholds (depth 3, stale 1800s, orphan 3600s).
pub fn harness() -> Harness {
    harness_with(StackConfig::default())
}

/// Harness with an explicit stack configuration.
pub fn harness_with(config: StackConfig) -> Harness {
    harness_over(FlakyStore::default(), config)
}

/// Harness over an existing store, as a restarted process would see it.
pub fn harness_over(store: FlakyStore, config: StackConfig) -> Harness {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("valid date"),
    ));
    let (tx, events) = mpsc::channel(64);
    let manager = SessionStackManager::new(config, Arc::new(store.clone()))
        .with_clock(clock.clone())
        .with_events(tx);
    Harness {
        manager,
        clock,
        store,
        events,
    }
}

/// Drain every event emitted so far.
pub fn drain(events: &mut mpsc::Receiver<StackEvent>) -> Vec<StackEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

/// Names of the sessions on the stack, bottom-up.
pub fn names(manager: &SessionStackManager) -> Vec<String> {
    manager.sessions().into_iter().map(|s| s.name).collect()
}

/// In-memory store whose writes and deletes fail while `fail` is set.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    fn failing(&self) -> bool {
        self.fail.load(Ordering::SeqCst)
    }
}

impl KvStore for FlakyStore {
    fn put<'a>(&'a self, key: &'a str, value: Vec<u8>) -> StoreFuture<'a, ()> {
        if self.failing() {
            return Box::pin(async { Err(AppError::Persistence("disk full".into())) });
        }
        self.inner.put(key, value)
    }

    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        if self.failing() {
            return Box::pin(async { Err(AppError::Persistence("disk full".into())) });
        }
        self.inner.delete(key)
    }
}
