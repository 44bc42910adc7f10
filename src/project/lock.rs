//! Project lock marker
//!
//! An open project holds `meta/nwProject.lock`. The marker only records who
//! opened the project; nothing stops another process from ignoring it. A
//! session that finds a marker it did not write treats the project as locked.
//!
//! ## Lock File Format
//! Path: `<project>/meta/nwProject.lock`
//! Contents: TOML with [`LockInfo`]

use crate::error::{ProjectError, ProjectResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the lock marker inside the meta folder
pub const LOCK_FILE: &str = "nwProject.lock";

/// Who holds a project lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname where the lock was taken
    pub host: String,
    /// Operating system of the lock holder
    pub os: String,
    /// Process ID of the lock holder
    pub pid: u32,
    /// When the lock was taken
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for LockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_summary())
    }
}

impl LockInfo {
    /// Lock details for the current process
    pub fn current() -> Self {
        Self {
            host: hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            os: std::env::consts::OS.to_string(),
            pid: std::process::id(),
            timestamp: Utc::now(),
        }
    }

    /// Stand-in for a marker whose content cannot be read
    fn unknown() -> Self {
        Self {
            host: "unknown".to_string(),
            os: "unknown".to_string(),
            pid: 0,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// One-line description for error messages
    pub fn display_summary(&self) -> String {
        format!(
            "host '{}' ({}), pid {}, since {}",
            self.host,
            self.os,
            self.pid,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// Path of the lock marker for a meta folder
pub fn lock_path(meta_path: &Path) -> PathBuf {
    meta_path.join(LOCK_FILE)
}

/// Read the lock marker, if one exists
///
/// A marker that cannot be parsed still counts as a lock.
pub fn read_lock(meta_path: &Path) -> Option<LockInfo> {
    let path = lock_path(meta_path);
    if !path.is_file() {
        return None;
    }
    let info = fs::read_to_string(&path)
        .ok()
        .and_then(|text| toml::from_str(&text).ok())
        .unwrap_or_else(|| {
            warn!("Unreadable lock file {}", path.display());
            LockInfo::unknown()
        });
    Some(info)
}

/// Write a lock marker for the current process
pub fn write_lock(meta_path: &Path) -> ProjectResult<LockInfo> {
    let path = lock_path(meta_path);
    let info = LockInfo::current();
    let content = toml::to_string(&info).map_err(|e| ProjectError::format(&path, e))?;
    fs::write(&path, content).map_err(|e| ProjectError::path(&path, e))?;
    debug!("Wrote lock file {}", path.display());
    Ok(info)
}

/// Remove the lock marker; a missing marker is not an error
pub fn remove_lock(meta_path: &Path) -> ProjectResult<()> {
    let path = lock_path(meta_path);
    if path.exists() {
        fs::remove_file(&path).map_err(|e| ProjectError::path(&path, e))?;
        debug!("Removed lock file {}", path.display());
    }
    Ok(())
}
