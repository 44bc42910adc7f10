//! Common test utilities for integration tests

#![allow(dead_code)]

use novelist::{AppConfig, NewProjectData, NovelProject, Population};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Configuration with every folder inside `dir`
pub fn test_config(dir: &Path) -> AppConfig {
    AppConfig {
        app_root: dir.join("app"),
        asset_path: dir.join("assets"),
        backup_path: None,
        dict_path: dir.join("dict"),
        spell_language: "en".to_string(),
    }
}

/// Create and open a minimal project in `<dir>/novel`
pub fn new_minimal_project(dir: &TempDir) -> (NovelProject, PathBuf) {
    let path = dir.path().join("novel");
    let mut project = NovelProject::new(test_config(dir.path()));
    project.set_seed(42);
    project
        .new_project(NewProjectData {
            name: "Test Novel".to_string(),
            title: "A Test Novel".to_string(),
            authors: "Jane Smith\nJohn Smith".to_string(),
            path: Some(path.clone()),
            populate: Population::Minimal,
        })
        .unwrap();
    (project, path)
}

/// Index file text with the `[meta]` table removed
pub fn index_without_meta(project_path: &Path) -> String {
    let text = fs::read_to_string(project_path.join("nwProject.toml")).unwrap();
    let mut out = String::new();
    let mut in_meta = false;
    for line in text.lines() {
        if line.starts_with('[') {
            in_meta = line.trim() == "[meta]";
        }
        if !in_meta {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Write a raw document file into a project's content folder
pub fn write_raw_doc(project_path: &Path, handle: &str, text: &str) {
    fs::write(
        project_path.join("content").join(format!("{}.nwd", handle)),
        text,
    )
    .unwrap();
}

/// Sorted file names in a folder
pub fn file_names(folder: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(folder)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
