// crates/toolgate-audit/src/retention.rs
// ============================================================================
// Module: Audit Retention
// Description: Compression and expiry of daily audit partitions.
// Purpose: Bound audit storage while keeping recent history queryable.
// Dependencies: flate2, time, toolgate-core
// ============================================================================

//! ## Overview
//! Partitions at least `compress_after_days` old are gzip-compressed in
//! place. Partitions more than `remove_after_days` old are moved to the
//! archive directory when one is configured, otherwise deleted.
//!
//! Compressing into an existing `.jsonl.gz` appends a new gzip member, so a
//! late plain file for an already compressed day is never lost.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use flate2::Compression;
use flate2::write::GzEncoder;
use time::Date;
use toolgate_core::AuditError;

use crate::partition::Partition;
use crate::partition::file_name;
use crate::partition::list_partitions;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Retention thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Age in days at which plain partitions are compressed.
    pub compress_after_days: u32,
    /// Age in days beyond which partitions are archived or removed.
    pub remove_after_days: u32,
    /// Destination for expired partitions; `None` deletes them.
    pub archive_dir: Option<PathBuf>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            compress_after_days: 7,
            remove_after_days: 30,
            archive_dir: None,
        }
    }
}

/// Files touched by one maintenance pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Plain partitions that were compressed (original paths).
    pub compressed: Vec<PathBuf>,
    /// Partitions moved into the archive directory (new paths).
    pub archived: Vec<PathBuf>,
    /// Partitions deleted.
    pub removed: Vec<PathBuf>,
}

impl MaintenanceReport {
    /// Returns true when the pass changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.compressed.is_empty() && self.archived.is_empty() && self.removed.is_empty()
    }
}

// ============================================================================
// SECTION: Maintenance
// ============================================================================

/// Applies `policy` to the partitions under `dir` as of the UTC day `today`.
///
/// # Errors
///
/// Returns [`AuditError::Io`] when a partition cannot be listed, compressed,
/// moved, or removed. Work completed before the failure stays applied.
pub fn maintain(
    dir: &Path,
    prefix: &str,
    policy: &RetentionPolicy,
    today: Date,
) -> Result<MaintenanceReport, AuditError> {
    let mut report = MaintenanceReport::default();
    let partitions = list_partitions(dir, prefix).map_err(io_error)?;
    for partition in partitions {
        let age_days = (today - partition.date).whole_days();
        if age_days > i64::from(policy.remove_after_days) {
            match &policy.archive_dir {
                Some(archive_dir) => {
                    report.archived.push(archive(&partition, archive_dir).map_err(io_error)?);
                }
                None => {
                    fs::remove_file(&partition.path).map_err(io_error)?;
                    report.removed.push(partition.path);
                }
            }
        } else if !partition.compressed && age_days >= i64::from(policy.compress_after_days) {
            compress(&partition, dir, prefix).map_err(io_error)?;
            report.compressed.push(partition.path);
        }
    }
    if !report.is_empty() {
        tracing::info!(
            compressed = report.compressed.len(),
            archived = report.archived.len(),
            removed = report.removed.len(),
            "audit retention applied"
        );
    }
    Ok(report)
}

/// Gzips a plain partition and removes the original.
fn compress(partition: &Partition, dir: &Path, prefix: &str) -> io::Result<()> {
    let target = dir.join(file_name(prefix, partition.date, true));
    let output = OpenOptions::new().create(true).append(true).open(&target)?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    let mut input = File::open(&partition.path)?;
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.sync_all()?;
    fs::remove_file(&partition.path)
}

/// Moves a partition into `archive_dir`, returning its new path.
fn archive(partition: &Partition, archive_dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(archive_dir)?;
    let name = partition
        .path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "partition has no file name"))?;
    let target = archive_dir.join(name);
    if fs::rename(&partition.path, &target).is_err() {
        fs::copy(&partition.path, &target)?;
        fs::remove_file(&partition.path)?;
    }
    Ok(target)
}

/// Maps I/O failures into audit errors.
fn io_error(err: io::Error) -> AuditError {
    AuditError::Io(err.to_string())
}
