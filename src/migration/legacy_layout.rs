//! Version 1 to version 2 folder layout migration

use super::MigrationReport;
use crate::document::DOC_EXT;
use crate::tree::is_valid_handle;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Folder receiving everything the migration does not recognize
pub const JUNK_DIR: &str = "junk";

/// Entries allowed in the root of a current project folder
pub const RECOGNIZED_ROOT_ENTRIES: &[&str] = &[
    "nwProject.toml",
    "nwProject.bak",
    "nwProject.tmp",
    "ToC.txt",
    "content",
    "meta",
    "cache",
    JUNK_DIR,
];

/// Files from older versions that are deleted by exact relative path
pub const OBSOLETE_FILES: &[&str] = &[
    "cache/nwProject.nwx.0",
    "cache/nwProject.nwx.1",
    "cache/nwProject.nwx.2",
    "cache/nwProject.nwx.3",
    "cache/nwProject.nwx.4",
    "cache/nwProject.nwx.5",
    "cache/nwProject.nwx.6",
    "cache/nwProject.nwx.7",
    "cache/nwProject.nwx.8",
    "cache/nwProject.nwx.9",
    "meta/mainOptions.json",
    "meta/exportOptions.json",
    "meta/outlineOptions.json",
    "meta/timelineOptions.json",
    "meta/docMergeOptions.json",
    "meta/sessionLogOptions.json",
];

const SHARD_PREFIX: &str = "data_";
const MAIN_SUFFIX: &str = "_main.nwd";
const BACKUP_SUFFIX: &str = "_main.bak";

/// Shard character of a `data_X` folder name
fn shard_char(name: &str) -> Option<char> {
    let rest = name.strip_prefix(SHARD_PREFIX)?;
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_hexdigit() && !c.is_ascii_uppercase() => Some(c),
        _ => None,
    }
}

/// True if the project folder still has any `data_X` shard folder
pub fn has_shard_folders(project_path: &Path) -> bool {
    !shard_folders(project_path).is_empty()
}

fn shard_folders(project_path: &Path) -> Vec<(char, PathBuf)> {
    let Ok(entries) = fs::read_dir(project_path) else {
        return Vec::new();
    };
    let mut shards: Vec<(char, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            shard_char(&name).map(|c| (c, entry.path()))
        })
        .collect();
    shards.sort();
    shards
}

/// Migrate a version 1 project folder to the current layout
///
/// The steps are:
/// 1. Move shard documents into `content`, deleting their `.bak` copies
/// 2. Move any other shard entry to `junk`
/// 3. Remove the emptied shard folders
/// 4. Delete obsolete files from `cache` and `meta`
/// 5. Move unrecognized root entries to `junk`
///
/// Running it on an already migrated folder changes nothing.
pub fn migrate_legacy_layout(project_path: &Path) -> MigrationReport {
    let mut report = MigrationReport::default();
    let content = project_path.join("content");
    let junk = project_path.join(JUNK_DIR);

    for (shard, folder) in shard_folders(project_path) {
        if !content.is_dir()
            && let Err(e) = fs::create_dir_all(&content)
        {
            warn!("Could not create content folder {}: {}", content.display(), e);
            return report;
        }
        migrate_shard(shard, &folder, &content, &junk, &mut report);
        match fs::remove_dir(&folder) {
            Ok(()) => {
                debug!("Removed folder {}", folder.display());
                report.removed_folders += 1;
            }
            Err(e) => warn!("Could not remove folder {}: {}", folder.display(), e),
        }
    }

    for rel in OBSOLETE_FILES {
        let path = project_path.join(rel);
        if !path.is_file() {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Deleted obsolete file {}", path.display());
                report.deleted += 1;
            }
            Err(e) => warn!("Could not delete {}: {}", path.display(), e),
        }
    }

    junk_unknown_root_entries(project_path, &junk, &mut report);

    if !report.is_empty() {
        info!(
            "Migrated project layout: {} moved, {} deleted, {} junked, {} folders removed",
            report.moved, report.deleted, report.junked, report.removed_folders
        );
    }
    report
}

fn migrate_shard(
    shard: char,
    folder: &Path,
    content: &Path,
    junk: &Path,
    report: &mut MigrationReport,
) {
    let Ok(entries) = fs::read_dir(folder) else {
        warn!("Could not read shard folder {}", folder.display());
        return;
    };
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if path.is_file()
            && let Some(stem) = name.strip_suffix(BACKUP_SUFFIX)
            && is_valid_handle(&format!("{}{}", shard, stem))
        {
            match fs::remove_file(&path) {
                Ok(()) => report.deleted += 1,
                Err(e) => warn!("Could not delete {}: {}", path.display(), e),
            }
            continue;
        }

        let handle = name
            .strip_suffix(MAIN_SUFFIX)
            .map(|stem| format!("{}{}", shard, stem))
            .filter(|h| is_valid_handle(h));

        match handle {
            Some(handle) if path.is_file() => {
                let target = content.join(format!("{}.{}", handle, DOC_EXT));
                if target.exists() {
                    warn!(
                        "Document {} already exists in content, moving {} to junk",
                        handle,
                        path.display()
                    );
                    move_to_junk(&path, junk, report);
                    continue;
                }
                match fs::rename(&path, &target) {
                    Ok(()) => report.moved += 1,
                    Err(e) => warn!("Could not move {}: {}", path.display(), e),
                }
            }
            _ => move_to_junk(&path, junk, report),
        }
    }
}

fn junk_unknown_root_entries(project_path: &Path, junk: &Path, report: &mut MigrationReport) {
    let Ok(entries) = fs::read_dir(project_path) else {
        return;
    };
    let mut unknown: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            !name.starts_with('.') && !RECOGNIZED_ROOT_ENTRIES.contains(&name.as_ref())
        })
        .map(|entry| entry.path())
        .collect();
    unknown.sort();

    for path in unknown {
        move_to_junk(&path, junk, report);
    }
}

fn move_to_junk(path: &Path, junk: &Path, report: &mut MigrationReport) {
    if let Err(e) = fs::create_dir_all(junk) {
        warn!("Could not create junk folder {}: {}", junk.display(), e);
        return;
    }
    let Some(target) = free_junk_name(path, junk) else {
        warn!("No free name in junk for {}", path.display());
        return;
    };
    match fs::rename(path, &target) {
        Ok(()) => {
            debug!("Moved {} to {}", path.display(), target.display());
            report.junked += 1;
        }
        Err(e) => warn!("Could not move {} to junk: {}", path.display(), e),
    }
}

/// First name in `junk` not already taken, adding `_N` before the extension on clashes
fn free_junk_name(path: &Path, junk: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;
    let target = junk.join(name);
    if !target.exists() {
        return Some(target);
    }

    let stem = path.file_stem()?.to_string_lossy().into_owned();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (1..10_000)
        .map(|n| junk.join(format!("{}_{}{}", stem, n, ext)))
        .find(|candidate| !candidate.exists())
}
