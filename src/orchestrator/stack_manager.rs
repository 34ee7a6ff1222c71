//! Session stack lifecycle: begin, interrupt, pause, resume, checkpoint,
//! stale checks, orphan sweeps and recovery.
//!
//! [`SessionStackManager`] is the only way to mutate a stack. Structural
//! operations are serialized by one `tokio::sync::Mutex`; any durable write
//! an operation needs completes before the in-memory change is committed,
//! so a failed write leaves the stack exactly as it was. After every commit
//! an immutable [`StackView`] is published on a `watch` channel, which is
//! what read-only introspection uses. Readers never wait behind a writer's
//! I/O.
//!
//! Transition events are pushed onto an optional bounded `mpsc` channel in
//! commit order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::clock::{Clock, SystemClock};
use crate::config::StackConfig;
use crate::models::checkpoint::{Checkpoint, Payload};
use crate::models::event::StackEvent;
use crate::models::session::{Progress, Session, SessionOutcome, SessionStatus};
use crate::models::snapshot::RecoverySnapshot;
use crate::persistence::{CheckpointStore, KvStore, RecoveryStore};
use crate::{AppError, Result};

use super::monitor::{StaleReport, Staleness, StalenessMonitor};
use super::stack::SessionStack;

/// Consistent copy of the stack published after every commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackView {
    /// Sessions bottom-up.
    pub sessions: Vec<Session>,
}

impl StackView {
    /// Current top session.
    #[must_use]
    pub fn top(&self) -> Option<&Session> {
        self.sessions.last()
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
}

/// What an orphan sweep did.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SweepAction {
    /// No stack is live.
    Idle,
    /// Top is within the orphan threshold; nothing written.
    Fresh,
    /// Top was already orphaned; nothing written.
    AlreadyOrphaned,
    /// Snapshot written and top marked orphaned.
    Orphaned,
}

/// Outcome of [`SessionStackManager::orphan_sweep`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SweepReport {
    /// What the sweep did.
    pub action: SweepAction,
    /// Top session inspected, if any.
    pub session_id: Option<String>,
    /// Seconds since the top's last activity.
    pub age_seconds: i64,
    /// Sessions written to the recovery snapshot (0 unless `Orphaned`).
    pub snapshot_entries: usize,
    /// Suspended sessions newly marked stale.
    pub marked_stale: Vec<String>,
}

impl SweepReport {
    fn idle() -> Self {
        Self {
            action: SweepAction::Idle,
            session_id: None,
            age_seconds: 0,
            snapshot_entries: 0,
            marked_stale: Vec::new(),
        }
    }
}

/// Facade owning one session stack and its persistence.
pub struct SessionStackManager {
    config: StackConfig,
    monitor: StalenessMonitor,
    stack: Mutex<SessionStack>,
    view: watch::Sender<StackView>,
    checkpoints: CheckpointStore,
    recovery: RecoveryStore,
    clock: Arc<dyn Clock>,
    events: Option<mpsc::Sender<StackEvent>>,
}

impl SessionStackManager {
    /// Construct a manager with an empty stack over `kv`.
    #[must_use]
    pub fn new(config: StackConfig, kv: Arc<dyn KvStore>) -> Self {
        let (view, _) = watch::channel(StackView::default());
        Self {
            monitor: config.monitor(),
            stack: Mutex::new(SessionStack::new(config.max_depth)),
            view,
            checkpoints: CheckpointStore::new(Arc::clone(&kv)),
            recovery: RecoveryStore::new(kv, &config.scope),
            clock: Arc::new(SystemClock),
            events: None,
            config,
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Deliver transition events to `tx`.
    ///
    /// Events are sent with `try_send` so a transition never waits on a slow
    /// consumer. While the channel is full, further events are dropped with
    /// a warning; size `event_buffer` for the longest burst between drains.
    #[must_use]
    pub fn with_events(mut self, tx: mpsc::Sender<StackEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Stack configuration in effect.
    #[must_use]
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    // ── Structural operations ───────────────────────────

    /// Start a root session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AlreadyRunning` if this manager already holds a stack.
    pub async fn begin(&self, name: &str) -> Result<Session> {
        let span = info_span!("begin", scope = %self.config.scope, task = name);
        async move {
            let now = self.clock.now();
            let mut stack = self.stack.lock().await;
            let session = stack.push_root(name.to_owned(), now)?;
            self.publish(&stack);
            self.emit(StackEvent::Began {
                session_id: session.id.clone(),
                task: session.name.clone(),
                depth: 0,
            });
            info!(session_id = %session.id, "root session started");
            Ok(session)
        }
        .instrument(span)
        .await
    }

    /// Suspend the active session and start a nested one above it.
    ///
    /// Emits `Pause` for the suspended session followed by `Began` for the
    /// new one. An orphaned top is revived first (`Resume`).
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyStack` with nothing to interrupt,
    /// `AppError::DepthLimitExceeded` at maximum depth, or
    /// `AppError::Persistence` if reviving an orphaned top fails. The stack
    /// is unchanged in every case.
    pub async fn interrupt(&self, name: &str) -> Result<Session> {
        let span = info_span!("interrupt", scope = %self.config.scope, task = name);
        async move {
            let now = self.clock.now();
            let mut stack = self.stack.lock().await;
            stack.ensure_nestable().map_err(|err| {
                warn!(%err, "interrupt rejected");
                err
            })?;
            self.revive_if_orphaned(&mut stack, now).await?;

            let (suspended, child) = stack.push_nested(name.to_owned(), now).map_err(|err| {
                warn!(%err, "interrupt rejected");
                err
            })?;
            self.publish(&stack);
            self.emit(StackEvent::Pause {
                session_id: suspended.id.clone(),
                task: suspended.name.clone(),
                phase: suspended.phase.clone(),
            });
            self.emit(StackEvent::Began {
                session_id: child.id.clone(),
                task: child.name.clone(),
                depth: child.depth(),
            });
            info!(
                paused = %suspended.id,
                session_id = %child.id,
                depth = child.depth(),
                "nested session started"
            );
            Ok(child)
        }
        .instrument(span)
        .await
    }

    /// Durably record the active session's state without changing its status.
    ///
    /// The checkpoint carries the session's latest payload (empty if none
    /// was ever recorded).
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyStack` with no session, or
    /// `AppError::Persistence` if the write fails (stack unchanged).
    pub async fn pause(&self) -> Result<Checkpoint> {
        let span = info_span!("pause", scope = %self.config.scope);
        async move {
            let now = self.clock.now();
            let mut stack = self.stack.lock().await;
            self.revive_if_orphaned(&mut stack, now).await?;
            let top = current_top(&stack)?;
            let payload = top.payload.clone().unwrap_or_default();
            let checkpoint = Checkpoint::capture(&top, payload, now);

            self.checkpoints.save(&checkpoint).await?;
            self.commit_activity(&mut stack, now, |session| {
                session.checkpoint_seq = checkpoint.sequence;
            })?;

            info!(
                session_id = %top.id,
                sequence = checkpoint.sequence,
                "session state recorded"
            );
            Ok(checkpoint)
        }
        .instrument(span)
        .await
    }

    /// Record `payload` against the active session.
    ///
    /// History is retained; the latest pointer moves to the new checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyStack` with no session, or
    /// `AppError::Persistence` if the write fails (stack unchanged).
    pub async fn checkpoint(&self, payload: Payload) -> Result<Checkpoint> {
        let span = info_span!("checkpoint", scope = %self.config.scope, schema = %payload.schema);
        async move {
            let now = self.clock.now();
            let mut stack = self.stack.lock().await;
            self.revive_if_orphaned(&mut stack, now).await?;
            let top = current_top(&stack)?;
            let checkpoint = Checkpoint::capture(&top, payload, now);

            self.checkpoints.save(&checkpoint).await?;
            self.commit_activity(&mut stack, now, |session| {
                session.checkpoint_seq = checkpoint.sequence;
                session.payload = Some(checkpoint.payload.clone());
            })?;

            debug!(
                session_id = %top.id,
                sequence = checkpoint.sequence,
                bytes = checkpoint.payload.data.len(),
                "checkpoint written"
            );
            Ok(checkpoint)
        }
        .instrument(span)
        .await
    }

    /// Enter `phase`, resetting the step counter.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyStack` with no session, or
    /// `AppError::Persistence` if reviving an orphaned top fails.
    pub async fn advance_phase(&self, phase: &str) -> Result<Session> {
        let span = info_span!("advance_phase", scope = %self.config.scope, phase);
        async move {
            let now = self.clock.now();
            let mut stack = self.stack.lock().await;
            self.revive_if_orphaned(&mut stack, now).await?;
            let session = self.commit_activity(&mut stack, now, |session| {
                session.phase = phase.to_owned();
                session.progress.step = 0;
            })?;
            info!(session_id = %session.id, "phase advanced");
            Ok(session)
        }
        .instrument(span)
        .await
    }

    /// Increment the active session's step counter.
    ///
    /// # Errors
    ///
    /// Same as [`advance_phase`](Self::advance_phase).
    pub async fn advance_step(&self) -> Result<Session> {
        let span = info_span!("advance_step", scope = %self.config.scope);
        async move {
            let now = self.clock.now();
            let mut stack = self.stack.lock().await;
            self.revive_if_orphaned(&mut stack, now).await?;
            let session = self.commit_activity(&mut stack, now, |session| {
                session.progress.step += 1;
            })?;
            debug!(session_id = %session.id, step = session.progress.step, "step advanced");
            Ok(session)
        }
        .instrument(span)
        .await
    }

    /// Pop the active nested session with `outcome` and reactivate its parent.
    ///
    /// Emits `Finished` for the popped session followed by `Resume` for the
    /// parent, which is returned.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyStack` at depth 0 (stack unchanged), or
    /// `AppError::Persistence` if clearing a superseded recovery snapshot
    /// fails.
    pub async fn resume(&self, outcome: SessionOutcome) -> Result<Session> {
        let span = info_span!("resume", scope = %self.config.scope, ?outcome);
        async move {
            let now = self.clock.now();
            let mut stack = self.stack.lock().await;
            if stack.len() < 2 {
                return Err(AppError::EmptyStack(
                    "no interrupted session to return to".into(),
                ));
            }
            self.clear_recovery_if_orphaned(&stack).await?;

            let popped = stack.pop_to_parent(outcome, now)?;
            self.publish(&stack);
            drop(stack);

            self.emit(StackEvent::Finished {
                session_id: popped.finished.id.clone(),
                task: popped.finished.name.clone(),
                outcome,
            });
            self.emit(StackEvent::Resume {
                session_id: popped.resumed.id.clone(),
                task: popped.resumed.name.clone(),
                phase: popped.resumed.phase.clone(),
            });
            info!(
                finished = %popped.finished.id,
                session_id = %popped.resumed.id,
                depth = popped.resumed.depth(),
                "returned to interrupted session"
            );

            self.collect_garbage(&popped.finished).await;
            Ok(popped.resumed)
        }
        .instrument(span)
        .await
    }

    /// Close the root session, leaving the manager free to `begin` again.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyStack` with no session, `AppError::Unresolved`
    /// while nested sessions remain, or `AppError::Persistence` if clearing
    /// a superseded recovery snapshot fails.
    pub async fn finish(&self, outcome: SessionOutcome) -> Result<Session> {
        let span = info_span!("finish", scope = %self.config.scope, ?outcome);
        async move {
            let mut stack = self.stack.lock().await;
            if stack.len() == 1 {
                self.clear_recovery_if_orphaned(&stack).await?;
            }

            let root = stack.finish_root(outcome)?;
            self.publish(&stack);
            drop(stack);

            self.emit(StackEvent::Finished {
                session_id: root.id.clone(),
                task: root.name.clone(),
                outcome,
            });
            info!(session_id = %root.id, "root session finished");

            self.collect_garbage(&root).await;
            Ok(root)
        }
        .instrument(span)
        .await
    }

    // ── Monitoring ──────────────────────────────────────

    /// Report the active session's inactivity.
    ///
    /// Returns `None` when no stack is live. Never mutates state.
    #[must_use]
    pub fn stale_check(&self) -> Option<StaleReport> {
        let top = self.view.borrow().top().cloned()?;
        let report = self.monitor.report(&top, self.clock.now());
        if report.stale {
            info!(
                session_id = %report.session_id,
                age_seconds = report.age_seconds,
                "session is stale; ask the user"
            );
        }
        Some(report)
    }

    /// Flush the stack to the recovery store if the top has been idle past
    /// the orphan threshold, then mark it orphaned.
    ///
    /// Suspended sessions idle past the stale threshold are marked stale on
    /// the way. Re-running against an orphaned top writes nothing.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the snapshot cannot be written
    /// (stack unchanged).
    pub async fn orphan_sweep(&self) -> Result<SweepReport> {
        let span = info_span!("orphan_sweep", scope = %self.config.scope);
        async move {
            let now = self.clock.now();
            let mut stack = self.stack.lock().await;
            let Some(top) = stack.top().cloned() else {
                return Ok(SweepReport::idle());
            };

            let mut next = stack.clone();
            let marked_stale = next.mark_stale_below(now, self.monitor.stale_secs());
            let mut report = SweepReport {
                action: SweepAction::Fresh,
                session_id: Some(top.id.clone()),
                age_seconds: top.idle_seconds(now),
                snapshot_entries: 0,
                marked_stale,
            };

            if top.status == SessionStatus::Orphaned {
                report.action = SweepAction::AlreadyOrphaned;
            } else if self.monitor.classify(&top, now) == Staleness::Orphaned {
                next.top_mut()?.status = SessionStatus::Orphaned;
                let snapshot =
                    RecoverySnapshot::capture(&self.config.scope, next.sessions().to_vec(), now)?;
                self.recovery.save(&snapshot).await?;
                report.action = SweepAction::Orphaned;
                report.snapshot_entries = snapshot.sessions.len();
            }

            *stack = next;
            self.publish(&stack);
            drop(stack);

            for id in &report.marked_stale {
                info!(session_id = %id, "suspended session marked stale");
            }
            if report.action == SweepAction::Orphaned {
                warn!(
                    session_id = %top.id,
                    age_seconds = report.age_seconds,
                    entries = report.snapshot_entries,
                    "session orphaned; stack written to recovery store"
                );
                self.emit(StackEvent::Orphaned {
                    session_id: top.id.clone(),
                    task: top.name.clone(),
                    entries: report.snapshot_entries,
                });
            }
            Ok(report)
        }
        .instrument(span)
        .await
    }

    // ── Recovery ────────────────────────────────────────

    /// Load and validate the recovery snapshot left by an earlier process.
    ///
    /// Never installs or deletes anything.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the read fails, or
    /// `AppError::CorruptSnapshot` if the snapshot fails validation; a
    /// corrupt snapshot stays in place for an explicit decision.
    pub async fn pending_recovery(&self) -> Result<Option<RecoverySnapshot>> {
        let Some(snapshot) = self.recovery.load().await? else {
            return Ok(None);
        };
        snapshot.validate(self.config.max_depth)?;
        self.check_scope(&snapshot)?;
        Ok(Some(snapshot))
    }

    /// Install `snapshot` as the live stack and delete it from the recovery
    /// store.
    ///
    /// The top becomes `Active` with fresh activity; a `Resume` event is
    /// emitted for it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::CorruptSnapshot` if validation fails,
    /// `AppError::AlreadyRunning` over a live stack, or
    /// `AppError::Persistence` if the snapshot cannot be deleted (stack
    /// unchanged).
    pub async fn restore_from_recovery(&self, snapshot: RecoverySnapshot) -> Result<Session> {
        let span = info_span!("restore_from_recovery", scope = %self.config.scope);
        async move {
            snapshot.validate(self.config.max_depth)?;
            self.check_scope(&snapshot)?;

            let now = self.clock.now();
            let mut sessions = snapshot.sessions;
            let top = sessions
                .last_mut()
                .ok_or_else(|| AppError::CorruptSnapshot("snapshot holds no sessions".into()))?;
            top.status = SessionStatus::Active;
            top.touch(now);
            let top = top.clone();

            let mut stack = self.stack.lock().await;
            if !stack.is_empty() {
                return Err(AppError::AlreadyRunning(
                    "cannot restore over a live stack".into(),
                ));
            }
            self.recovery.discard().await?;
            stack.install(sessions)?;
            self.publish(&stack);
            drop(stack);

            self.emit(StackEvent::Resume {
                session_id: top.id.clone(),
                task: top.name.clone(),
                phase: top.phase.clone(),
            });
            info!(session_id = %top.id, depth = top.depth(), "stack restored from recovery");
            Ok(top)
        }
        .instrument(span)
        .await
    }

    /// Delete the recovery snapshot without installing it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the delete fails.
    pub async fn discard_recovery(&self) -> Result<()> {
        self.recovery.discard().await?;
        info!(scope = %self.config.scope, "recovery snapshot discarded");
        Ok(())
    }

    /// Install a snapshot verbatim, without events or status changes.
    ///
    /// Used to carry a live stack across process boundaries.
    ///
    /// # Errors
    ///
    /// Returns `AppError::CorruptSnapshot` if validation fails, or
    /// `AppError::AlreadyRunning` over a live stack.
    pub async fn adopt(&self, snapshot: RecoverySnapshot) -> Result<()> {
        snapshot.validate(self.config.max_depth)?;
        self.check_scope(&snapshot)?;
        let mut stack = self.stack.lock().await;
        stack.install(snapshot.sessions)?;
        self.publish(&stack);
        debug!(depth = stack.len(), "live stack adopted");
        Ok(())
    }

    /// Install the stack carried in `live`, if it is still live.
    ///
    /// A carried stack whose top is orphaned belongs to the recovery store
    /// now: the slot is deleted and nothing is installed, leaving the
    /// manager free to restore or discard the recovery snapshot. Returns
    /// whether a stack was installed.
    ///
    /// # Errors
    ///
    /// Same as [`adopt`](Self::adopt), plus `AppError::Persistence` if the
    /// slot cannot be read or deleted.
    pub async fn load_live(&self, live: &RecoveryStore) -> Result<bool> {
        let Some(snapshot) = live.load().await? else {
            return Ok(false);
        };
        if snapshot
            .top()
            .is_some_and(|s| s.status == SessionStatus::Orphaned)
        {
            live.discard().await?;
            info!(key = live.key(), "carried stack is orphaned; left to recovery");
            return Ok(false);
        }
        self.adopt(snapshot).await?;
        Ok(true)
    }

    /// Write the stack to `live` for the next process, or clear the slot
    /// when there is nothing live to carry.
    ///
    /// An orphaned stack is evicted rather than carried; the recovery store
    /// holds it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if serialization, the write or the
    /// delete fails.
    pub async fn save_live(&self, live: &RecoveryStore) -> Result<()> {
        let orphaned = self
            .view
            .borrow()
            .top()
            .map(|s| s.status == SessionStatus::Orphaned);
        match orphaned {
            None | Some(true) => live.discard().await,
            Some(false) => live.save(&self.snapshot()?).await,
        }
    }

    /// Serialize the live stack.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if serialization fails.
    pub fn snapshot(&self) -> Result<RecoverySnapshot> {
        let sessions = self.view.borrow().sessions.clone();
        RecoverySnapshot::capture(&self.config.scope, sessions, self.clock.now())
    }

    // ── Introspection ───────────────────────────────────

    /// Step and depth of the active session, `None` when no stack is live.
    #[must_use]
    pub fn current_depth(&self) -> Option<Progress> {
        self.view.borrow().top().map(|s| s.progress)
    }

    /// Copy of the live stack, bottom-up.
    #[must_use]
    pub fn sessions(&self) -> Vec<Session> {
        self.view.borrow().sessions.clone()
    }

    /// Receiver observing every committed stack state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StackView> {
        self.view.subscribe()
    }

    /// Latest checkpoint of the active session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyStack` with no session, or a store error.
    pub async fn latest_checkpoint(&self) -> Result<Option<Checkpoint>> {
        let top = self
            .view
            .borrow()
            .top()
            .map(|s| s.id.clone())
            .ok_or_else(|| AppError::EmptyStack("no active session".into()))?;
        self.checkpoints.latest(&top).await
    }

    /// Full checkpoint history of the active session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyStack` with no session, or a store error.
    pub async fn checkpoint_history(&self) -> Result<Vec<Checkpoint>> {
        let (id, count) = self
            .view
            .borrow()
            .top()
            .map(|s| (s.id.clone(), s.checkpoint_seq))
            .ok_or_else(|| AppError::EmptyStack("no active session".into()))?;
        self.checkpoints.history(&id, count).await
    }

    // ── Internals ───────────────────────────────────────

    /// Bring an orphaned top back to `Active`.
    ///
    /// The recovery snapshot is deleted before any in-memory change, so a
    /// failed delete leaves the stack orphaned and the snapshot in place.
    /// Once the delete succeeds the revival is committed on its own, with a
    /// `Resume` event, ahead of whatever write the caller does next.
    async fn revive_if_orphaned(&self, stack: &mut SessionStack, now: DateTime<Utc>) -> Result<()> {
        if !stack
            .top()
            .is_some_and(|s| s.status == SessionStatus::Orphaned)
        {
            return Ok(());
        }
        self.recovery.discard().await?;

        let session = stack.top_mut()?;
        session.status = SessionStatus::Active;
        session.touch(now);
        let session = session.clone();
        self.publish(stack);

        info!(session_id = %session.id, "orphaned session revived by activity");
        self.emit(StackEvent::Resume {
            session_id: session.id,
            task: session.name,
            phase: session.phase,
        });
        Ok(())
    }

    /// Apply `update` to the top and bump its activity.
    fn commit_activity(
        &self,
        stack: &mut SessionStack,
        now: DateTime<Utc>,
        update: impl FnOnce(&mut Session),
    ) -> Result<Session> {
        let session = stack.top_mut()?;
        update(session);
        session.touch(now);
        let session = session.clone();
        self.publish(stack);
        Ok(session)
    }

    async fn clear_recovery_if_orphaned(&self, stack: &SessionStack) -> Result<()> {
        if stack
            .top()
            .is_some_and(|s| s.status == SessionStatus::Orphaned)
        {
            self.recovery.discard().await?;
        }
        Ok(())
    }

    /// Best-effort checkpoint purge for a session that left the stack.
    async fn collect_garbage(&self, finished: &Session) {
        if !self.config.gc_finished_checkpoints || finished.checkpoint_seq == 0 {
            return;
        }
        match self
            .checkpoints
            .purge(&finished.id, finished.checkpoint_seq)
            .await
        {
            Ok(()) => debug!(session_id = %finished.id, "finished session checkpoints purged"),
            Err(err) => {
                warn!(session_id = %finished.id, %err, "failed to purge finished session checkpoints");
            }
        }
    }

    fn check_scope(&self, snapshot: &RecoverySnapshot) -> Result<()> {
        if snapshot.scope == self.config.scope {
            Ok(())
        } else {
            Err(AppError::CorruptSnapshot(format!(
                "snapshot belongs to scope '{}', not '{}'",
                snapshot.scope, self.config.scope
            )))
        }
    }

    fn publish(&self, stack: &SessionStack) {
        self.view.send_replace(StackView {
            sessions: stack.sessions().to_vec(),
        });
    }

    fn emit(&self, event: StackEvent) {
        debug!(?event, "stack event");
        if let Some(tx) = &self.events {
            if let Err(err) = tx.try_send(event) {
                warn!(%err, "stack event dropped");
            }
        }
    }
}

fn current_top(stack: &SessionStack) -> Result<Session> {
    stack
        .top()
        .cloned()
        .ok_or_else(|| AppError::EmptyStack("no active session".into()))
}
