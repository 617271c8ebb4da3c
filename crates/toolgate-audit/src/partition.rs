// crates/toolgate-audit/src/partition.rs
// ============================================================================
// Module: Audit Partitions
// Description: Daily partition naming and discovery.
// Purpose: Map UTC dates to `<prefix>-YYYY-MM-DD.jsonl[.gz]` files.
// Dependencies: time
// ============================================================================

//! ## Overview
//! A partition is the audit file for one UTC calendar day. Plain partitions
//! end in `.jsonl`; compressed ones in `.jsonl.gz`. Files that do not follow
//! the naming scheme are ignored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use time::Date;
use time::Month;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Extension of plain partitions.
pub const PLAIN_EXTENSION: &str = ".jsonl";
/// Extension of compressed partitions.
pub const COMPRESSED_EXTENSION: &str = ".jsonl.gz";

// ============================================================================
// SECTION: Types
// ============================================================================

/// One audit file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Full path of the file.
    pub path: PathBuf,
    /// UTC day the file covers.
    pub date: Date,
    /// Whether the file is gzip-compressed.
    pub compressed: bool,
}

// ============================================================================
// SECTION: Naming
// ============================================================================

/// Returns the file name for `date`.
#[must_use]
pub fn file_name(prefix: &str, date: Date, compressed: bool) -> String {
    let extension = if compressed { COMPRESSED_EXTENSION } else { PLAIN_EXTENSION };
    format!(
        "{prefix}-{:04}-{:02}-{:02}{extension}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Parses a partition file name. Returns `None` for unrelated files.
#[must_use]
pub fn parse_file_name(prefix: &str, name: &str) -> Option<(Date, bool)> {
    let rest = name.strip_prefix(prefix)?.strip_prefix('-')?;
    let (stem, compressed) = if let Some(stem) = rest.strip_suffix(COMPRESSED_EXTENSION) {
        (stem, true)
    } else {
        (rest.strip_suffix(PLAIN_EXTENSION)?, false)
    };
    let mut parts = stem.split('-');
    let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || year.len() != 4 || month.len() != 2 || day.len() != 2 {
        return None;
    }
    let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;
    let date = Date::from_calendar_date(year.parse().ok()?, month, day.parse().ok()?).ok()?;
    Some((date, compressed))
}

/// Lists partitions in `dir`, oldest first. A missing directory is empty.
///
/// When a day has both forms, the compressed file sorts first since it holds
/// the earlier lines.
///
/// # Errors
///
/// Returns an I/O error when the directory cannot be read.
pub fn list_partitions(dir: &Path, prefix: &str) -> io::Result<Vec<Partition>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };
    let mut partitions = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some((date, compressed)) = parse_file_name(prefix, name) {
            partitions.push(Partition {
                path: entry.path(),
                date,
                compressed,
            });
        }
    }
    partitions.sort_by(|a, b| a.date.cmp(&b.date).then(b.compressed.cmp(&a.compressed)));
    Ok(partitions)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
