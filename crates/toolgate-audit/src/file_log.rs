// crates/toolgate-audit/src/file_log.rs
// ============================================================================
// Module: File Audit Log
// Description: Daily-rotated JSONL audit log.
// Purpose: Durable, queryable audit trail for the request path.
// Dependencies: flate2, serde_json, time, toolgate-core
// ============================================================================

//! ## Overview
//! Every event is serialized to a single line and written with one
//! `write_all` on an append-mode file, then flushed. The file is chosen by
//! the UTC day of the event timestamp, so a day boundary never splits an
//! event. Appends are serialized by a mutex around the open writer.
//!
//! When the writer rolls forward to a new day and a [`RetentionPolicy`] is
//! attached, a maintenance pass runs before the first write of that day.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use flate2::read::MultiGzDecoder;
use time::Date;
use time::OffsetDateTime;
use time::UtcOffset;
use toolgate_core::AuditError;
use toolgate_core::AuditEvent;
use toolgate_core::AuditFilter;
use toolgate_core::AuditLog;

use crate::partition::Partition;
use crate::partition::file_name;
use crate::partition::list_partitions;
use crate::retention::MaintenanceReport;
use crate::retention::RetentionPolicy;
use crate::retention::maintain;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Open plain partition for the current day.
struct DayWriter {
    /// UTC day of the open file.
    date: Date,
    /// Append-mode handle.
    file: File,
}

/// Audit log writing one JSONL file per UTC day.
pub struct FileAuditLog {
    /// Directory holding partitions.
    dir: PathBuf,
    /// Partition file prefix.
    prefix: String,
    /// Retention applied on day rollover and by [`FileAuditLog::maintain`].
    retention: Option<RetentionPolicy>,
    /// Writer for the most recently written day.
    writer: Mutex<Option<DayWriter>>,
}

impl FileAuditLog {
    /// Opens a log rooted at `dir`, creating the directory when missing.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Io`] when the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self, AuditError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|err| AuditError::Io(err.to_string()))?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
            retention: None,
            writer: Mutex::new(None),
        })
    }

    /// Attaches a retention policy.
    #[must_use]
    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Returns the partition directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lists partitions on disk, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Io`] when the directory cannot be read.
    pub fn partitions(&self) -> Result<Vec<Partition>, AuditError> {
        list_partitions(&self.dir, &self.prefix).map_err(|err| AuditError::Io(err.to_string()))
    }

    /// Runs retention as of `now`. Without a policy this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the writer lock is poisoned or a file
    /// operation fails.
    pub fn maintain(&self, now: OffsetDateTime) -> Result<MaintenanceReport, AuditError> {
        let Some(retention) = &self.retention else {
            return Ok(MaintenanceReport::default());
        };
        let mut guard = self.lock_writer()?;
        // Closing the writer lets a pass that touches the open day reopen cleanly.
        *guard = None;
        maintain(&self.dir, &self.prefix, retention, utc_date(now))
    }

    /// Acquires the writer lock.
    fn lock_writer(&self) -> Result<std::sync::MutexGuard<'_, Option<DayWriter>>, AuditError> {
        self.writer.lock().map_err(|_| AuditError::Lock("audit writer lock poisoned".to_string()))
    }

    /// Opens the plain partition for `date` in append mode.
    fn open_day(&self, date: Date) -> Result<DayWriter, AuditError> {
        let path = self.dir.join(file_name(&self.prefix, date, false));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| AuditError::Io(err.to_string()))?;
        Ok(DayWriter {
            date,
            file,
        })
    }

    /// Runs retention after the writer moved to `today`, logging failures.
    fn rollover_maintenance(&self, today: Date) {
        let Some(retention) = &self.retention else {
            return;
        };
        if let Err(err) = maintain(&self.dir, &self.prefix, retention, today) {
            tracing::warn!(error = %err, "audit retention failed on rollover");
        }
    }
}

impl AuditLog for FileAuditLog {
    fn try_append(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let mut line =
            serde_json::to_string(event).map_err(|err| AuditError::Serialization(err.to_string()))?;
        line.push('\n');
        let date = utc_date(event.timestamp);
        let mut guard = self.lock_writer()?;
        if guard.as_ref().is_none_or(|writer| writer.date != date) {
            let rolled_forward = guard.as_ref().is_some_and(|writer| writer.date < date);
            if rolled_forward {
                *guard = None;
                self.rollover_maintenance(date);
            }
            *guard = Some(self.open_day(date)?);
        }
        let Some(writer) = guard.as_mut() else {
            return Err(AuditError::Io("audit writer unavailable".to_string()));
        };
        writer
            .file
            .write_all(line.as_bytes())
            .and_then(|()| writer.file.flush())
            .map_err(|err| AuditError::Io(err.to_string()))
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        let first_day = filter.since.map(utc_date);
        let last_day = filter.until.map(utc_date);
        let mut events = Vec::new();
        for partition in self.partitions()? {
            if first_day.is_some_and(|day| partition.date < day)
                || last_day.is_some_and(|day| partition.date > day)
            {
                continue;
            }
            read_partition(&partition, &mut events)?;
        }
        Ok(filter.apply(events))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the UTC calendar day of `timestamp`.
fn utc_date(timestamp: OffsetDateTime) -> Date {
    timestamp.to_offset(UtcOffset::UTC).date()
}

/// Reads every event in `partition`, skipping malformed lines.
fn read_partition(partition: &Partition, events: &mut Vec<AuditEvent>) -> Result<(), AuditError> {
    let file = match File::open(&partition.path) {
        Ok(file) => file,
        // Maintenance may move a partition between listing and reading.
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(AuditError::Io(err.to_string())),
    };
    let reader: Box<dyn BufRead> = if partition.compressed {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| AuditError::Io(err.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditEvent>(&line) {
            Ok(event) => events.push(event),
            Err(err) => tracing::warn!(
                path = %partition.path.display(),
                line = index + 1,
                error = %err,
                "skipping malformed audit line"
            ),
        }
    }
    Ok(())
}
