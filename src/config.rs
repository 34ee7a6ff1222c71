//! Global configuration parsing and validation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::orchestrator::monitor::StalenessMonitor;
use crate::{AppError, Result};

/// Stack depth, staleness thresholds and bookkeeping options.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct StackConfig {
    /// Maximum nested interrupts above the root.
    pub max_depth: usize,
    /// Inactivity before a session is reported stale.
    pub stale_threshold_seconds: u64,
    /// Inactivity before the stack is flushed for recovery.
    pub orphan_threshold_seconds: u64,
    /// Name separating independent stacks sharing one backend.
    pub scope: String,
    /// Delete checkpoints of sessions once they leave the stack.
    pub gc_finished_checkpoints: bool,
    /// Capacity of the transition event channel.
    pub event_buffer: usize,
}

fn default_max_depth() -> usize {
    3
}

fn default_stale_threshold() -> u64 {
    1800
}

fn default_orphan_threshold() -> u64 {
    3600
}

fn default_scope() -> String {
    "default".into()
}

fn default_event_buffer() -> usize {
    64
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            stale_threshold_seconds: default_stale_threshold(),
            orphan_threshold_seconds: default_orphan_threshold(),
            scope: default_scope(),
            gc_finished_checkpoints: true,
            event_buffer: default_event_buffer(),
        }
    }
}

impl StackConfig {
    /// Monitor configured with this stack's thresholds.
    #[must_use]
    pub fn monitor(&self) -> StalenessMonitor {
        StalenessMonitor::new(
            Duration::from_secs(self.stale_threshold_seconds),
            Duration::from_secs(self.orphan_threshold_seconds),
        )
    }

    /// Check threshold ordering and scope shape.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.stale_threshold_seconds == 0 {
            return Err(AppError::Config(
                "stale_threshold_seconds must be greater than zero".into(),
            ));
        }

        if self.orphan_threshold_seconds <= self.stale_threshold_seconds {
            return Err(AppError::Config(
                "orphan_threshold_seconds must exceed stale_threshold_seconds".into(),
            ));
        }

        if self.event_buffer == 0 {
            return Err(AppError::Config(
                "event_buffer must be greater than zero".into(),
            ));
        }

        crate::persistence::key_safety::validate_key(&self.scope)
            .map_err(|_| AppError::Config(format!("invalid scope '{}'", self.scope)))?;
        if self.scope.contains('/') {
            return Err(AppError::Config("scope must be a single key segment".into()));
        }

        Ok(())
    }
}

/// Durable backend selection.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// One file per key under `root`.
    File,
    /// `SQLite` database file at `root`.
    Sqlite,
}

/// Storage backend settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct StorageConfig {
    /// Backend kind.
    pub backend: StorageBackend,
    /// Store directory (`file`) or database path (`sqlite`).
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            root: PathBuf::from(".task-stack"),
        }
    }
}

/// Transition audit log settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct AuditConfig {
    /// Whether transitions are appended to the JSONL audit log.
    pub enabled: bool,
    /// Log directory; defaults to `logs` next to the storage root.
    pub log_dir: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_dir: None,
        }
    }
}

/// Global configuration parsed from `task-stack.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct GlobalConfig {
    /// Stack behavior.
    pub stack: StackConfig,
    /// Persistence backend.
    pub storage: StorageConfig,
    /// Audit logging.
    pub audit: AuditConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Directory the audit writer appends to.
    #[must_use]
    pub fn audit_dir(&self) -> PathBuf {
        if let Some(dir) = &self.audit.log_dir {
            return dir.clone();
        }
        match self.storage.backend {
            StorageBackend::File => self.storage.root.join("logs"),
            StorageBackend::Sqlite => self
                .storage
                .root
                .parent()
                .map_or_else(|| PathBuf::from("logs"), |p| p.join("logs")),
        }
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.stack.validate()?;
        if self.storage.root.as_os_str().is_empty() {
            return Err(AppError::Config("storage.root must not be empty".into()));
        }
        Ok(())
    }
}
