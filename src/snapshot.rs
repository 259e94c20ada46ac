//! Snapshot files on disk.
//!
//! Each successful fetch becomes one pretty-printed JSON file named
//! `{prefix}_{timestamp}.json`. Files are only ever created, never read back.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::info;

use crate::error::{FetchError, FetchResult};

/// Filesystem-safe UTC timestamp, e.g. `2025-03-01T12-30-05-123Z`.
pub fn snapshot_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

pub fn snapshot_filename(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}.json", prefix, snapshot_timestamp(now))
}

/// Number of records in a snapshot whose top level is an array.
pub fn item_count(value: &Value) -> Option<usize> {
    value.as_array().map(Vec::len)
}

/// Writes snapshots for one endpoint into one directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
    prefix: String,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Write `value` stamped with the current time.
    pub fn write(&self, value: &Value) -> FetchResult<PathBuf> {
        self.write_at(value, Utc::now())
    }

    /// Write `value` stamped with `now`, creating the directory if needed.
    pub fn write_at(&self, value: &Value, now: DateTime<Utc>) -> FetchResult<PathBuf> {
        let path = self.dir.join(snapshot_filename(&self.prefix, now));
        let io_error = |source: std::io::Error| FetchError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(|source| FetchError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let text = serde_json::to_string_pretty(value).map_err(|e| io_error(e.into()))?;
        fs::write(&path, text).map_err(io_error)?;

        info!("Snapshot saved to {}", path.display());
        Ok(path)
    }
}
