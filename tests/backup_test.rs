//! Project backups into the configured backup folder
mod common;

use common::{file_names, new_minimal_project};
use novelist::*;
use std::fs::{self, File};
use std::io::Read;
use tempfile::TempDir;

#[test]
fn test_backup_refused_without_destination() {
    let dir = TempDir::new().unwrap();
    let (project, _path) = new_minimal_project(&dir);
    assert!(project.config().backup_path.is_none());
    assert!(matches!(project.zip_it(false), Err(ProjectError::Path { .. })));
}

#[test]
fn test_backup_refused_for_missing_destination() {
    let dir = TempDir::new().unwrap();
    let (mut project, _path) = new_minimal_project(&dir);
    let missing = dir.path().join("no_such_folder");
    project.config_mut().backup_path = Some(missing.clone());
    assert!(project.zip_it(true).is_err());
    assert!(!missing.exists());
}

#[test]
fn test_backup_refused_without_project_name() {
    let dir = TempDir::new().unwrap();
    let (mut project, _path) = new_minimal_project(&dir);
    let backups = dir.path().join("backups");
    fs::create_dir(&backups).unwrap();
    project.config_mut().backup_path = Some(backups.clone());
    project.set_project_name("   ");

    assert!(project.zip_it(false).is_err());
    assert!(file_names(&backups).is_empty());
}

#[test]
fn test_backup_refused_inside_project() {
    let dir = TempDir::new().unwrap();
    let (mut project, path) = new_minimal_project(&dir);
    let inner = path.join("backups");
    fs::create_dir(&inner).unwrap();
    project.config_mut().backup_path = Some(inner.clone());

    assert!(project.zip_it(true).is_err());
    assert!(file_names(&inner).is_empty());
}

#[test]
fn test_backup_refused_when_closed() {
    let dir = TempDir::new().unwrap();
    let (mut project, _path) = new_minimal_project(&dir);
    project.close_project().unwrap();
    assert!(matches!(project.zip_it(false), Err(ProjectError::NoProject)));
}

#[test]
fn test_backup_archives_project_folder() {
    let dir = TempDir::new().unwrap();
    let (mut project, path) = new_minimal_project(&dir);
    let backups = dir.path().join("backups");
    fs::create_dir(&backups).unwrap();
    project.config_mut().backup_path = Some(backups.clone());

    let archive = project.zip_it(true).unwrap();
    assert_eq!(archive.parent(), Some(backups.join("Test Novel").as_path()));

    let written = file_names(&backups.join("Test Novel"));
    assert_eq!(written.len(), 1);
    assert!(written[0].starts_with("Backup from "));
    assert!(written[0].ends_with(".zip"));

    let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
    let mut index = String::new();
    zip.by_name("nwProject.toml")
        .unwrap()
        .read_to_string(&mut index)
        .unwrap();
    assert_eq!(index, fs::read_to_string(path.join("nwProject.toml")).unwrap());

    let names: Vec<&str> = zip.file_names().collect();
    assert!(names.iter().any(|n| n.starts_with("content/") && n.ends_with(".nwd")));
    assert!(names.iter().all(|n| !n.contains('\\')));
}
