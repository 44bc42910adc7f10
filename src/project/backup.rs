//! Backup archives of a project folder

use crate::error::{ProjectError, ProjectResult};
use chrono::Local;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

/// Archive the whole project folder into `<backup_root>/<project name>/`
///
/// The destination must be configured, exist, and lie outside the project
/// folder. Validation failures write nothing. They are logged at warn level
/// when `notify` is set and at debug level otherwise.
///
/// # Arguments
/// * `project_path` - The project folder to archive
/// * `project_name` - Name of the sub-folder the archive goes into
/// * `backup_root` - Configured backup destination
/// * `notify` - Whether failures should be reported loudly
///
/// # Returns
/// Path of the written archive
pub fn write_backup(
    project_path: &Path,
    project_name: &str,
    backup_root: Option<&Path>,
    notify: bool,
) -> ProjectResult<PathBuf> {
    let result = validate(project_path, project_name, backup_root).and_then(|dest| {
        let archive = dest.join(format!(
            "Backup from {}.zip",
            Local::now().format("%Y-%m-%d %H.%M.%S")
        ));
        fs::create_dir_all(&dest).map_err(|e| ProjectError::path(&dest, e))?;
        zip_folder(project_path, &archive)?;
        Ok(archive)
    });

    match &result {
        Ok(archive) => info!("Backup written to {}", archive.display()),
        Err(e) if notify => warn!("Backup failed: {}", e),
        Err(e) => debug!("Backup failed: {}", e),
    }
    result
}

fn validate(
    project_path: &Path,
    project_name: &str,
    backup_root: Option<&Path>,
) -> ProjectResult<PathBuf> {
    let Some(root) = backup_root else {
        return Err(ProjectError::path(PathBuf::new(), "no backup folder is configured"));
    };
    let name = project_name.trim();
    if name.is_empty() {
        return Err(ProjectError::path(project_path, "the project has no name"));
    }
    if !root.is_dir() {
        return Err(ProjectError::path(root, "backup folder does not exist"));
    }

    let root_real = root.canonicalize()?;
    let project_real = project_path.canonicalize()?;
    if root_real.starts_with(&project_real) {
        return Err(ProjectError::path(
            root,
            "backup folder cannot be inside the project folder",
        ));
    }
    Ok(root.join(name))
}

/// Write every file and folder below `source` into a new zip archive
fn zip_folder(source: &Path, archive: &Path) -> ProjectResult<()> {
    let file = File::create(archive).map_err(|e| ProjectError::path(archive, e))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let zip_err = |e: zip::result::ZipError| ProjectError::path(archive, e);

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| ProjectError::path(source, e))?;
        let Ok(rel) = entry.path().strip_prefix(source) else {
            continue;
        };
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            zip.add_directory(name, options).map_err(zip_err)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options).map_err(zip_err)?;
            let mut input = File::open(entry.path())?;
            io::copy(&mut input, &mut zip)?;
        }
    }
    let mut file = zip.finish().map_err(zip_err)?;
    file.flush()?;
    Ok(())
}
