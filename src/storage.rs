//! Index file storage
//!
//! The index file (`nwProject.toml`) records the project descriptor, the
//! project settings and every tree item. Items are written depth first in
//! sibling order, so loading and saving an unchanged tree reproduces the file
//! byte for byte outside of the `[meta]` table.

use crate::error::{ProjectError, ProjectResult};
use crate::tree::{Item, ItemClass, ItemLayout, ItemType, ProjectTree};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Current index format version
///
/// - **Version 1**: documents sharded into `data_0` … `data_f` folders
/// - **Version 2**: all documents in a single `content` folder
pub const FORMAT_VERSION: u32 = 2;

/// Bookkeeping written on every save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    #[serde(default)]
    pub format_version: u32,
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub save_count: u64,
    #[serde(default)]
    pub auto_count: u64,
    /// Accumulated editing time in seconds
    #[serde(default)]
    pub edit_time: u64,
}

impl Default for IndexMeta {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: String::new(),
            save_count: 0,
            auto_count: 0,
            edit_time: 0,
        }
    }
}

/// Project name, book title and authors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInfo {
    pub name: String,
    pub title: String,
    pub authors: Vec<String>,
}

/// A status or importance label with its display colour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLabel {
    pub label: String,
    pub color: [u8; 3],
}

impl StatusLabel {
    pub fn new(label: &str, color: [u8; 3]) -> Self {
        Self {
            label: label.to_string(),
            color,
        }
    }
}

/// Per-project settings stored in the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub spell_check: bool,
    pub spell_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_edited: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_viewed: Option<String>,
    pub status: Vec<StatusLabel>,
    pub importance: Vec<StatusLabel>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            spell_check: false,
            spell_lang: "en".to_string(),
            last_edited: None,
            last_viewed: None,
            status: vec![
                StatusLabel::new("New", [100, 100, 100]),
                StatusLabel::new("Note", [200, 50, 0]),
                StatusLabel::new("Draft", [200, 150, 0]),
                StatusLabel::new("Finished", [50, 200, 0]),
            ],
            importance: vec![
                StatusLabel::new("None", [100, 100, 100]),
                StatusLabel::new("Minor", [200, 50, 0]),
                StatusLabel::new("Major", [200, 150, 0]),
                StatusLabel::new("Main", [50, 200, 0]),
            ],
        }
    }
}

/// On-disk form of a tree item
///
/// Enum fields are kept as strings here so that one bad value only degrades
/// that field instead of failing the whole index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub order: usize,
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub layout: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub expanded: bool,
    #[serde(default = "default_exported")]
    pub exported: bool,
    #[serde(default)]
    pub char_count: usize,
    #[serde(default)]
    pub word_count: usize,
    #[serde(default)]
    pub para_count: usize,
    #[serde(default)]
    pub cursor_pos: usize,
}

fn default_exported() -> bool {
    true
}

impl From<&Item> for ItemRecord {
    fn from(item: &Item) -> Self {
        Self {
            handle: item.handle.clone(),
            parent: item.parent.clone(),
            order: item.order,
            item_type: item.item_type.to_string(),
            class: item.class.to_string(),
            layout: item.layout.to_string(),
            status: item.status.clone(),
            name: item.name().to_string(),
            expanded: item.expanded,
            exported: item.exported,
            char_count: item.char_count,
            word_count: item.word_count,
            para_count: item.para_count,
            cursor_pos: item.cursor_pos,
        }
    }
}

impl ItemRecord {
    /// Convert to a tree item, substituting defaults for unreadable enum values
    pub fn into_item(self) -> Item {
        let item_type = self.item_type.parse().unwrap_or_else(|e| {
            warn!("Item {}: {}", self.handle, e);
            ItemType::NoType
        });
        let class = self.class.parse().unwrap_or_else(|e| {
            warn!("Item {}: {}", self.handle, e);
            ItemClass::NoClass
        });
        let layout = self.layout.parse().unwrap_or_else(|e| {
            warn!("Item {}: {}", self.handle, e);
            ItemLayout::NoLayout
        });

        let mut item = Item::new(&self.name, item_type, class).with_handle(&self.handle);
        item.parent = self.parent;
        item.order = self.order;
        item.layout = layout;
        item.status = self.status;
        item.expanded = self.expanded;
        item.exported = self.exported;
        item.char_count = self.char_count;
        item.word_count = self.word_count;
        item.para_count = self.para_count;
        item.cursor_pos = self.cursor_pos;
        item
    }
}

/// Complete content of the index file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectIndex {
    #[serde(default)]
    pub meta: IndexMeta,
    #[serde(default)]
    pub project: ProjectInfo,
    #[serde(default)]
    pub settings: ProjectSettings,
    #[serde(default)]
    pub item: Vec<ItemRecord>,
}

impl ProjectIndex {
    /// Collect the records of a tree in serialization order
    pub fn records_from_tree(tree: &ProjectTree) -> Vec<ItemRecord> {
        tree.walk().into_iter().map(ItemRecord::from).collect()
    }

    /// Convert the records into items for [`ProjectTree::load_items`]
    pub fn into_items(self) -> Vec<Item> {
        self.item.into_iter().map(ItemRecord::into_item).collect()
    }
}

/// Reads and writes the index file
pub struct Storage {
    file_path: PathBuf,
}

impl Storage {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Path of the copy of the previous index kept on save
    pub fn backup_path(&self) -> PathBuf {
        self.file_path.with_extension("bak")
    }

    pub fn exists(&self) -> bool {
        self.file_path.is_file()
    }

    /// Read and parse the index file
    pub fn load(&self) -> ProjectResult<ProjectIndex> {
        if !self.file_path.is_file() {
            return Err(ProjectError::path(
                &self.file_path,
                "project file does not exist",
            ));
        }

        let content = fs::read_to_string(&self.file_path)
            .map_err(|e| ProjectError::format(&self.file_path, e))?;
        let index: ProjectIndex =
            toml::from_str(&content).map_err(|e| ProjectError::format(&self.file_path, e))?;
        debug!(
            "Loaded project index with {} item(s), format version {}",
            index.item.len(),
            index.meta.format_version
        );
        Ok(index)
    }

    /// Write the index file
    ///
    /// The new index is written to a temporary file first; the previous
    /// index is then kept as `.bak` and the temporary file takes its place.
    pub fn save(&self, index: &ProjectIndex) -> ProjectResult<()> {
        let content =
            toml::to_string_pretty(index).map_err(|e| ProjectError::format(&self.file_path, e))?;

        let temp = self.file_path.with_extension("tmp");
        fs::write(&temp, content).map_err(|e| ProjectError::path(&temp, e))?;
        if self.file_path.exists() {
            fs::rename(&self.file_path, self.backup_path())
                .map_err(|e| ProjectError::path(&self.file_path, e))?;
        }
        fs::rename(&temp, &self.file_path).map_err(|e| ProjectError::path(&self.file_path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_path_error() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("nwProject.toml"));
        assert!(matches!(storage.load(), Err(ProjectError::Path { .. })));
    }

    #[test]
    fn test_garbage_is_format_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nwProject.toml");
        fs::write(&path, "this is [not valid toml").unwrap();
        let storage = Storage::new(&path);
        assert!(matches!(storage.load(), Err(ProjectError::Format { .. })));
    }

    #[test]
    fn test_save_keeps_previous_index() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("nwProject.toml"));

        let mut index = ProjectIndex::default();
        index.project.name = "First".to_string();
        storage.save(&index).unwrap();
        index.project.name = "Second".to_string();
        storage.save(&index).unwrap();

        assert_eq!(storage.load().unwrap().project.name, "Second");
        let previous = fs::read_to_string(storage.backup_path()).unwrap();
        assert!(previous.contains("First"));
        assert!(!dir.path().join("nwProject.tmp").exists());
    }

    #[test]
    fn test_bad_enum_values_degrade_per_field() {
        let toml_str = r#"
[[item]]
handle = "0000000000001"
order = 0
type = "ROOT"
class = "SPACESHIP"
layout = "NO_LAYOUT"
name = "  Stuff  "
"#;
        let index: ProjectIndex = toml::from_str(toml_str).unwrap();
        let items = index.into_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_type, ItemType::Root);
        assert_eq!(items[0].class, ItemClass::NoClass);
        assert_eq!(items[0].name(), "Stuff");
        assert!(items[0].exported);
    }

    #[test]
    fn test_records_follow_tree_order() {
        let mut tree = ProjectTree::new();
        tree.set_seed(3);
        let novel = tree.insert(Item::root("Novel", ItemClass::Novel)).unwrap();
        let plot = tree.insert(Item::root("Plot", ItemClass::Plot)).unwrap();
        let scene = tree
            .insert(Item::file("Scene", ItemClass::Novel, ItemLayout::Scene, &novel))
            .unwrap();

        let records = ProjectIndex::records_from_tree(&tree);
        let handles: Vec<&str> = records.iter().map(|r| r.handle.as_str()).collect();
        assert_eq!(handles, vec![novel.as_str(), scene.as_str(), plot.as_str()]);
        assert_eq!(records[1].layout, "SCENE");
        assert_eq!(records[1].parent.as_deref(), Some(novel.as_str()));
    }
}
