//! Migration module for project folder layouts
//!
//! This module upgrades project folders written by older versions to the
//! current layout. Migrations run when a project is opened and operate on the
//! folder in place. Every step is best-effort: a failure on one entry is
//! logged and the migration continues with the next.
//!
//! ## Migration Strategy
//!
//! When a new layout is introduced:
//! 1. Bump [`crate::storage::FORMAT_VERSION`]
//! 2. Add the detection to [`needs_migration`] and the steps to a new submodule
//! 3. Add tests for the new migration path
//!
//! ## Layout Versions
//!
//! - **Version 1**: documents stored as `data_X/<12 hex>_main.nwd`, one shard
//!   folder per first handle character, plus per-tool JSON option files in `meta`
//! - **Version 2**: documents stored as `content/<handle>.nwd`, options in
//!   `meta/guiOptions.toml`

mod legacy_layout;

pub use legacy_layout::{
    JUNK_DIR, OBSOLETE_FILES, RECOGNIZED_ROOT_ENTRIES, has_shard_folders, migrate_legacy_layout,
};

use crate::storage::FORMAT_VERSION;
use std::path::Path;

/// Counts of the actions taken by a migration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Documents moved into the content folder
    pub moved: usize,
    /// Obsolete files deleted
    pub deleted: usize,
    /// Files and folders moved to the junk folder
    pub junked: usize,
    /// Emptied shard folders removed
    pub removed_folders: usize,
}

impl MigrationReport {
    /// True if the migration changed nothing on disk
    pub fn is_empty(&self) -> bool {
        *self == MigrationReport::default()
    }
}

/// Check whether a project folder needs migrating
///
/// # Arguments
/// * `project_path` - The project folder
/// * `format_version` - Format version read from the index file
pub fn needs_migration(project_path: &Path, format_version: u32) -> bool {
    format_version < FORMAT_VERSION || has_shard_folders(project_path)
}
