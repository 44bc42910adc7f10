//! Legacy folder layout migration
mod common;

use common::{file_names, new_minimal_project, test_config};
use novelist::migration::{MigrationReport, migrate_legacy_layout};
use novelist::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const OBSOLETE: &[&str] = &[
    "cache/nwProject.nwx.0",
    "cache/nwProject.nwx.5",
    "cache/nwProject.nwx.9",
    "meta/mainOptions.json",
    "meta/exportOptions.json",
    "meta/outlineOptions.json",
    "meta/timelineOptions.json",
    "meta/docMergeOptions.json",
    "meta/sessionLogOptions.json",
];

/// Turn a current project folder into the sharded version 1 layout
fn make_legacy(path: &Path) {
    let content = path.join("content");
    for name in file_names(&content) {
        let handle = name.trim_end_matches(".nwd");
        let shard = path.join(format!("data_{}", &handle[..1]));
        fs::create_dir_all(&shard).unwrap();
        fs::rename(
            content.join(&name),
            shard.join(format!("{}_main.nwd", &handle[1..])),
        )
        .unwrap();
        fs::write(shard.join(format!("{}_main.bak", &handle[1..])), "old").unwrap();
    }
    fs::remove_dir(&content).unwrap();

    for rel in OBSOLETE {
        fs::write(path.join(rel), "Hi").unwrap();
    }
    fs::write(path.join("meta").join("tagsIndex.json"), "{}").unwrap();

    let index = path.join("nwProject.toml");
    let text = fs::read_to_string(&index).unwrap();
    fs::write(&index, text.replace("format_version = 2", "format_version = 1")).unwrap();
}

#[test]
fn test_open_migrates_legacy_layout() {
    let dir = TempDir::new().unwrap();
    let (mut project, path) = new_minimal_project(&dir);
    let files: Vec<String> = project
        .tree()
        .walk()
        .iter()
        .filter(|i| i.is_file())
        .map(|i| i.handle().to_string())
        .collect();
    project.close_project().unwrap();
    make_legacy(&path);

    // Unknown entries inside shards and in the root
    let shard = path.join(format!("data_{}", &files[0][..1]));
    fs::write(shard.join("whatnow.nwd"), "Hi").unwrap();
    fs::write(shard.join("whatnow.txt"), "Hi").unwrap();
    fs::create_dir(shard.join("stuff")).unwrap();
    fs::create_dir(path.join("stuff")).unwrap();

    let mut project = NovelProject::new(test_config(dir.path()));
    project.open_project(&path, false).unwrap();

    for rel in OBSOLETE {
        assert!(!path.join(rel).exists(), "{} not deleted", rel);
    }
    let leftover_shards: Vec<String> = file_names(&path)
        .into_iter()
        .filter(|n| n.starts_with("data_"))
        .collect();
    assert!(leftover_shards.is_empty());

    let junk = path.join("junk");
    assert!(junk.join("whatnow.nwd").is_file());
    assert!(junk.join("whatnow.txt").is_file());
    assert!(junk.join("stuff").is_dir());
    assert!(junk.join("stuff_1").is_dir());

    for handle in &files {
        assert!(path.join("content").join(format!("{}.nwd", handle)).is_file());
    }
    assert!(path.join("meta").join("tagsIndex.json").is_file());
    assert_eq!(project.index_meta().format_version, 2);
    assert_eq!(project.tree().len(), 8);

    let title = project
        .tree()
        .walk()
        .iter()
        .find(|i| i.name() == "Title Page")
        .map(|i| i.handle().to_string())
        .unwrap();
    assert!(
        project
            .document_text(&title)
            .unwrap()
            .unwrap()
            .contains("A Test Novel")
    );
}

#[test]
fn test_migration_keeps_clashing_documents() {
    let dir = TempDir::new().unwrap();
    let path = dir.path();
    fs::create_dir_all(path.join("content")).unwrap();
    fs::create_dir_all(path.join("data_a")).unwrap();
    fs::write(path.join("content").join("a000000000001.nwd"), "new").unwrap();
    fs::write(path.join("data_a").join("000000000001_main.nwd"), "old").unwrap();
    fs::write(path.join("data_a").join("000000000002_main.nwd"), "moved").unwrap();

    let report = migrate_legacy_layout(path);
    assert_eq!(
        report,
        MigrationReport {
            moved: 1,
            deleted: 0,
            junked: 1,
            removed_folders: 1,
        }
    );
    assert_eq!(
        fs::read_to_string(path.join("content").join("a000000000001.nwd")).unwrap(),
        "new"
    );
    assert_eq!(
        fs::read_to_string(path.join("junk").join("000000000001_main.nwd")).unwrap(),
        "old"
    );
    assert_eq!(
        fs::read_to_string(path.join("content").join("a000000000002.nwd")).unwrap(),
        "moved"
    );

    // Idempotent
    assert!(migrate_legacy_layout(path).is_empty());
}
