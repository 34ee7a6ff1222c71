//! JSONL audit log writer with daily file rotation.

use std::{
    fs::{self, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::NaiveDate;
use tracing::warn;

use super::{AuditEntry, AuditLogger};
use crate::{AppError, Result};

/// Open file for the day currently being written.
struct WriterState {
    current_date: NaiveDate,
    writer: BufWriter<fs::File>,
}

/// A daily-rotating JSONL transition log.
///
/// Appends one JSON object per line to `<log_dir>/transitions-YYYY-MM-DD.jsonl`,
/// choosing the file by each entry's own timestamp so replays with a manual
/// clock land in the right day.
pub struct JsonlAuditWriter {
    log_dir: PathBuf,
    state: Mutex<Option<WriterState>>,
}

impl JsonlAuditWriter {
    /// Construct a writer that stores logs in `log_dir`.
    ///
    /// Creates `log_dir` and all parent directories if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if the directory cannot be created.
    pub fn new(log_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&log_dir).map_err(|e| {
            AppError::Config(format!(
                "failed to create audit log directory {}: {e}",
                log_dir.display()
            ))
        })?;
        Ok(Self {
            log_dir,
            state: Mutex::new(None),
        })
    }

    /// Path of the log file for `date`.
    #[must_use]
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.log_dir.join(format!("transitions-{date}.jsonl"))
    }

    fn open(path: &Path) -> Result<BufWriter<fs::File>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                AppError::Persistence(format!("failed to open audit log {}: {e}", path.display()))
            })?;
        Ok(BufWriter::new(file))
    }
}

impl AuditLogger for JsonlAuditWriter {
    fn log_entry(&self, entry: AuditEntry) -> Result<()> {
        let date = entry.timestamp.date_naive();

        let mut guard = self
            .state
            .lock()
            .map_err(|_| AppError::Persistence("audit writer mutex poisoned".to_string()))?;

        if guard.as_ref().is_none_or(|s| s.current_date != date) {
            let writer = Self::open(&self.path_for(date))?;
            *guard = Some(WriterState {
                current_date: date,
                writer,
            });
        }

        let Some(state) = guard.as_mut() else {
            return Ok(());
        };

        let line = serde_json::to_string(&entry)
            .map_err(|e| AppError::Persistence(format!("failed to serialize audit entry: {e}")))?;
        if let Err(e) = writeln!(state.writer, "{line}") {
            warn!("failed to write audit log entry: {e}");
            return Err(AppError::Persistence(format!("audit write failed: {e}")));
        }
        if let Err(e) = state.writer.flush() {
            warn!("failed to flush audit log: {e}");
            return Err(AppError::Persistence(format!("audit flush failed: {e}")));
        }

        Ok(())
    }
}
