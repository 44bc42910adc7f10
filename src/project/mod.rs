//! Project persistence engine
//!
//! [`NovelProject`] owns one open project: its descriptor, item tree,
//! options and lock. The lifecycle is Closed → Open → Closed, with
//! [`NovelProject::new_project`] as the alternative way in.
//!
//! Project folder layout:
//!
//! ```text
//! <project>/
//!   nwProject.toml      index file
//!   nwProject.bak       previous index
//!   ToC.txt             table of contents
//!   content/<handle>.nwd
//!   meta/guiOptions.toml
//!   meta/nwProject.lock
//!   meta/sessionStats.log
//!   cache/
//! ```

mod backup;
mod lock;
mod orphans;
mod session;
mod wizard;

pub use backup::write_backup;
pub use lock::{LOCK_FILE, LockInfo};
pub use orphans::recover_orphans;
pub use session::{STATS_FILE, TOC_FILE, word_totals};
pub use wizard::{CustomLayout, NewProjectData, Population};

use crate::config::{AppConfig, expand_home};
use crate::document::{DocMeta, DocumentStore, TextCounts};
use crate::error::{ProjectError, ProjectResult};
use crate::migration::{migrate_legacy_layout, needs_migration};
use crate::options::OptionsStore;
use crate::spellcheck::{SpellCheck, select_backend};
use crate::storage::{FORMAT_VERSION, IndexMeta, ProjectIndex, ProjectInfo, ProjectSettings, Storage};
use crate::tree::{Item, ItemClass, ItemLayout, ItemType, ProjectTree};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the index file
pub const INDEX_FILE: &str = "nwProject.toml";
/// Folder with the document files
pub const CONTENT_DIR: &str = "content";
/// Folder with options, lock and session log
pub const META_DIR: &str = "meta";
/// Folder for rebuildable data
pub const CACHE_DIR: &str = "cache";
/// Project word list inside the meta folder
pub const WORDLIST_FILE: &str = "wordlist.txt";

/// Lifecycle state of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectState {
    #[default]
    Closed,
    Open,
}

/// One writing project and its on-disk persistence
pub struct NovelProject {
    config: AppConfig,
    state: ProjectState,
    project_path: Option<PathBuf>,
    info: ProjectInfo,
    settings: ProjectSettings,
    meta: IndexMeta,
    tree: ProjectTree,
    options: OptionsStore,
    /// Edited document text not yet written, by handle
    pending_docs: BTreeMap<String, String>,
    locked_by: Option<LockInfo>,
    changed: bool,
    session_start: DateTime<Local>,
    edit_mark: DateTime<Local>,
}

impl NovelProject {
    /// Create a closed project engine
    pub fn new(config: AppConfig) -> Self {
        let now = Local::now();
        Self {
            config,
            state: ProjectState::Closed,
            project_path: None,
            info: ProjectInfo::default(),
            settings: ProjectSettings::default(),
            meta: IndexMeta::default(),
            tree: ProjectTree::new(),
            options: OptionsStore::new(),
            pending_docs: BTreeMap::new(),
            locked_by: None,
            changed: false,
            session_start: now,
            edit_mark: now,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub fn state(&self) -> ProjectState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ProjectState::Open
    }

    /// True if anything changed since the last save
    pub fn is_changed(&self) -> bool {
        self.changed || self.tree.is_changed() || !self.pending_docs.is_empty()
    }

    pub fn project_path(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }

    /// The project's meta folder, if a path is set
    pub fn meta_path(&self) -> Option<PathBuf> {
        self.project_path.as_ref().map(|p| p.join(META_DIR))
    }

    pub fn content_path(&self) -> Option<PathBuf> {
        self.project_path.as_ref().map(|p| p.join(CONTENT_DIR))
    }

    /// Details of the foreign lock found by the last refused open
    pub fn locked_by(&self) -> Option<&LockInfo> {
        self.locked_by.as_ref()
    }

    pub fn project_name(&self) -> &str {
        &self.info.name
    }

    pub fn book_title(&self) -> &str {
        &self.info.title
    }

    pub fn book_authors(&self) -> &[String] {
        &self.info.authors
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    /// Settings for modification; marks the project changed
    pub fn settings_mut(&mut self) -> &mut ProjectSettings {
        self.changed = true;
        &mut self.settings
    }

    pub fn index_meta(&self) -> &IndexMeta {
        &self.meta
    }

    pub fn tree(&self) -> &ProjectTree {
        &self.tree
    }

    /// Look up an item by handle
    pub fn item(&self, handle: &str) -> Option<&Item> {
        self.tree.get(handle)
    }

    pub fn options(&self) -> &OptionsStore {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut OptionsStore {
        &mut self.options
    }

    /// Make handle generation reproducible
    pub fn set_seed(&mut self, seed: u64) {
        self.tree.set_seed(seed);
    }

    // ------------------------------------------------------------------------
    // Descriptor
    // ------------------------------------------------------------------------

    /// Set or clear the project folder
    ///
    /// `None` or an empty string clears the path and `~` is expanded. With
    /// `new_project` the folder is created; if that fails the previous path
    /// is kept.
    pub fn set_project_path(&mut self, path: Option<&str>, new_project: bool) -> ProjectResult<()> {
        let path = path.map(str::trim).filter(|p| !p.is_empty());
        let Some(path) = path else {
            self.project_path = None;
            self.changed = true;
            return Ok(());
        };

        let folder = expand_home(path);
        if new_project && !folder.is_dir() {
            fs::create_dir_all(&folder).map_err(|e| ProjectError::path(&folder, e))?;
            info!("Created project folder {}", folder.display());
        }
        self.project_path = Some(folder);
        self.changed = true;
        Ok(())
    }

    pub fn set_project_name(&mut self, name: &str) -> bool {
        self.info.name = name.trim().to_string();
        self.changed = true;
        true
    }

    pub fn set_book_title(&mut self, title: &str) -> bool {
        self.info.title = title.trim().to_string();
        self.changed = true;
        true
    }

    /// Set the authors from a newline separated block
    ///
    /// # Returns
    /// `false`, leaving the authors unchanged, if the block has no names
    pub fn set_book_authors(&mut self, authors: &str) -> bool {
        let parsed = parse_authors(authors);
        if parsed.is_empty() {
            return false;
        }
        self.info.authors = parsed;
        self.changed = true;
        true
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Create a new project and open it
    ///
    /// Fails if no path is given, if the folder already holds a project, or
    /// if the sample project cannot be installed. Folders created before a
    /// failure are left behind. The descriptor in `data` is ignored for the
    /// sample project.
    pub fn new_project(&mut self, data: NewProjectData) -> ProjectResult<()> {
        let Some(folder) = data.path.clone() else {
            return Err(ProjectError::MissingPath);
        };
        let folder = expand_home(&folder.to_string_lossy());
        if folder.join(INDEX_FILE).exists() {
            return Err(ProjectError::path(&folder, "folder already contains a project"));
        }
        if self.is_open() {
            self.close_project()?;
        }

        if data.populate == Population::Sample {
            fs::create_dir_all(&folder).map_err(|e| ProjectError::path(&folder, e))?;
            wizard::install_sample(&self.config, &folder)?;
            if !folder.join(INDEX_FILE).is_file() {
                return Err(ProjectError::format(
                    folder.join(INDEX_FILE),
                    "sample project has no index file",
                ));
            }
            // The sample keeps its own name, title and authors
            self.open_project(&folder, true)?;
            return self.save_project();
        }

        self.set_project_path(Some(&*folder.to_string_lossy()), true)?;
        self.ensure_folders(&folder)?;
        self.reset_state();

        self.info.name = data.name.trim().to_string();
        self.info.title = data.title.trim().to_string();
        self.info.authors = parse_authors(&data.authors);

        let docs = match &data.populate {
            Population::Custom(layout) => {
                wizard::populate_custom(&mut self.tree, layout, &self.info.title, &self.info.authors)?
            }
            _ => wizard::populate_minimal(&mut self.tree, &self.info.title, &self.info.authors)?,
        };
        for (handle, text) in docs {
            self.set_document_text(&handle, &text);
        }

        self.activate(&folder);
        info!("Created new project in {}", folder.display());
        self.save_project()
    }

    /// Open the project at `path`, either the project folder or its index file
    ///
    /// An existing lock marker fails the open unless `override_lock` is set.
    /// This includes the marker of the project this engine already has open.
    /// A failed open leaves the currently open project untouched.
    pub fn open_project(&mut self, path: impl AsRef<Path>, override_lock: bool) -> ProjectResult<()> {
        let folder = resolve_project_folder(path.as_ref())?;
        let index_file = folder.join(INDEX_FILE);
        if !index_file.is_file() {
            return Err(ProjectError::path(&index_file, "no project file found"));
        }

        let meta_path = folder.join(META_DIR);
        if let Some(lock) = lock::read_lock(&meta_path) {
            if !override_lock {
                warn!("Project {} is locked by {}", folder.display(), lock);
                self.locked_by = Some(lock.clone());
                return Err(ProjectError::Locked(lock));
            }
            warn!("Overriding lock held by {}", lock);
        }

        let index = Storage::new(&index_file).load()?;
        if self.is_open() {
            self.close_project()?;
        }

        if needs_migration(&folder, index.meta.format_version) {
            let report = migrate_legacy_layout(&folder);
            debug!("Legacy migration report: {:?}", report);
        }
        self.ensure_folders(&folder)?;
        self.reset_state();

        let ProjectIndex {
            meta,
            project,
            settings,
            item,
        } = index;
        self.meta = meta;
        self.meta.format_version = FORMAT_VERSION;
        self.info = project;
        self.settings = settings;
        self.project_path = Some(folder.clone());

        let items = item.into_iter().map(|record| record.into_item()).collect();
        let anomalies = self.tree.load_items(items);
        if anomalies > 0 {
            warn!("Corrected {} problem(s) in the project index", anomalies);
        }
        let store = DocumentStore::new(folder.join(CONTENT_DIR));
        let recovered = recover_orphans(&mut self.tree, &store);
        if recovered > 0 {
            info!("Recovered {} orphaned document(s)", recovered);
        }

        self.activate(&folder);
        if let Err(e) = self.options.load_settings() {
            warn!("Could not load project options: {}", e);
        }
        self.tree.set_changed(false);
        self.changed = false;

        info!("Opened project {}", folder.display());
        Ok(())
    }

    /// Write the project to its folder
    pub fn save_project(&mut self) -> ProjectResult<()> {
        if !self.is_open() {
            return Err(ProjectError::NoProject);
        }
        let folder = self.project_path.clone().ok_or(ProjectError::MissingPath)?;
        self.save_to(&folder)
    }

    /// Write the project to a new folder and continue working there
    ///
    /// Document files are copied along; the lock moves to the new folder.
    pub fn save_project_as(&mut self, path: impl AsRef<Path>) -> ProjectResult<()> {
        if !self.is_open() {
            return Err(ProjectError::NoProject);
        }
        let target = expand_home(&path.as_ref().to_string_lossy());
        let old = self.project_path.clone().ok_or(ProjectError::MissingPath)?;
        if same_folder(&old, &target) {
            return self.save_to(&old);
        }
        if target.join(INDEX_FILE).exists() {
            return Err(ProjectError::path(&target, "folder already contains a project"));
        }
        fs::create_dir_all(&target).map_err(|e| ProjectError::path(&target, e))?;
        self.ensure_folders(&target)?;

        let old_store = DocumentStore::new(old.join(CONTENT_DIR));
        let new_store = DocumentStore::new(target.join(CONTENT_DIR));
        for handle in old_store.scan() {
            let dest = new_store.doc_path(&handle);
            fs::copy(old_store.doc_path(&handle), &dest).map_err(|e| ProjectError::path(&dest, e))?;
        }

        if let Err(e) = lock::remove_lock(&old.join(META_DIR)) {
            warn!("Could not release lock on {}: {}", old.display(), e);
        }
        self.activate(&target);
        info!("Saving project as {}", target.display());
        self.save_to(&target)
    }

    /// Close the open project
    ///
    /// Unsaved changes are discarded; callers save first if needed.
    pub fn close_project(&mut self) -> ProjectResult<()> {
        if !self.is_open() {
            return Err(ProjectError::NoProject);
        }

        if let Some(meta_path) = self.meta_path() {
            let (novel, notes) = word_totals(&self.tree);
            if let Err(e) =
                session::append_session_stats(&meta_path, self.session_start, Local::now(), novel, notes)
            {
                warn!("Could not write session statistics: {}", e);
            }
            if let Err(e) = self.options.save_settings() {
                warn!("Could not save project options: {}", e);
            }
            if let Err(e) = lock::remove_lock(&meta_path) {
                warn!("Could not release project lock: {}", e);
            }
        }

        if let Some(path) = &self.project_path {
            info!("Closed project {}", path.display());
        }
        self.reset_state();
        self.project_path = None;
        self.state = ProjectState::Closed;
        Ok(())
    }

    /// Archive the project folder into the configured backup folder
    ///
    /// # Returns
    /// Path of the written archive
    pub fn zip_it(&self, notify: bool) -> ProjectResult<PathBuf> {
        let folder = self.project_path.as_deref().ok_or(ProjectError::NoProject)?;
        write_backup(
            folder,
            &self.info.name,
            self.config.backup_path.as_deref(),
            notify,
        )
    }

    // ------------------------------------------------------------------------
    // Tree mutation
    // ------------------------------------------------------------------------

    /// Add a root folder
    ///
    /// Novel, plot, character and world roots are limited to one each; a
    /// second attempt returns `None`.
    pub fn new_root(&mut self, name: &str, class: ItemClass) -> Option<String> {
        if class.is_single_root() && self.tree.find_root(class).is_some() {
            debug!("Project already has a {} root", class);
            return None;
        }
        let item_type = if class == ItemClass::Trash {
            ItemType::Trash
        } else {
            ItemType::Root
        };
        self.insert_logged(Item::new(name, item_type, class))
    }

    /// Add a folder under an existing item
    pub fn new_folder(&mut self, name: &str, class: ItemClass, parent: &str) -> Option<String> {
        if !self.tree.contains(parent) {
            return None;
        }
        self.insert_logged(Item::folder(name, class, parent))
    }

    /// Add a file under an existing item, with an empty document
    ///
    /// Novel files get the scene layout, all others the note layout.
    pub fn new_file(&mut self, name: &str, class: ItemClass, parent: &str) -> Option<String> {
        if !self.tree.contains(parent) {
            return None;
        }
        let layout = if class == ItemClass::Novel {
            ItemLayout::Scene
        } else {
            ItemLayout::Note
        };
        let handle = self.insert_logged(Item::file(name, class, layout, parent))?;

        if let Some(store) = self.document_store()
            && store.content_path().is_dir()
            && let Some(item) = self.tree.get(&handle)
        {
            let meta = DocMeta::for_item(item, self.tree.ancestors(&handle));
            if let Err(e) = store.write(&meta, &handle, "") {
                warn!("Could not create document {}: {}", handle, e);
            }
        }
        Some(handle)
    }

    /// The trash root, created on first use
    pub fn trash_folder(&mut self) -> Option<String> {
        if let Some(trash) = self.tree.find_root(ItemClass::Trash) {
            return Some(trash.handle.clone());
        }
        self.new_root(ItemClass::Trash.default_label(), ItemClass::Trash)
    }

    /// Delete an item, its subtree and their document files
    ///
    /// Every document is attempted. If any of them cannot be deleted the
    /// tree is left unchanged and the first error is returned.
    ///
    /// # Returns
    /// Number of removed items
    pub fn delete_item(&mut self, handle: &str) -> ProjectResult<usize> {
        if !self.tree.contains(handle) {
            return Ok(0);
        }

        let mut first_error = None;
        if let Some(store) = self.document_store() {
            for sub in self.tree.subtree(handle) {
                if !self.tree.get(&sub).is_some_and(Item::is_file) {
                    continue;
                }
                if let Err(e) = store.delete(&sub) {
                    warn!("Could not delete document {}: {}", sub, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let removed = self.tree.remove(handle);
        for item in &removed {
            self.pending_docs.remove(&item.handle);
        }
        Ok(removed.len())
    }

    /// Replace the text of a file item; written on the next save
    ///
    /// # Returns
    /// `false` if the handle is not a file item
    pub fn set_document_text(&mut self, handle: &str, text: &str) -> bool {
        if !self.tree.get(handle).is_some_and(Item::is_file) {
            return false;
        }
        let counts = TextCounts::of(text);
        self.tree.update(handle, |item| {
            item.char_count = counts.chars;
            item.word_count = counts.words;
            item.para_count = counts.paras;
        });
        self.pending_docs.insert(handle.to_string(), text.to_string());
        true
    }

    /// Current text of a file item, including unsaved edits
    pub fn document_text(&self, handle: &str) -> ProjectResult<Option<String>> {
        if !self.tree.get(handle).is_some_and(Item::is_file) {
            return Ok(None);
        }
        if let Some(text) = self.pending_docs.get(handle) {
            return Ok(Some(text.clone()));
        }
        match self.document_store() {
            Some(store) => Ok(Some(store.read(handle)?.1)),
            None => Ok(Some(String::new())),
        }
    }

    /// A spell checker for the project's language and word list
    pub fn spell_checker(&self) -> Box<dyn SpellCheck> {
        let mut checker = select_backend(&self.config.dict_path);
        let lang = if self.settings.spell_lang.is_empty() {
            self.config.spell_language.clone()
        } else {
            self.settings.spell_lang.clone()
        };
        let wordlist = self.meta_path().map(|meta| meta.join(WORDLIST_FILE));
        checker.set_language(&lang, wordlist.as_deref());
        checker
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn document_store(&self) -> Option<DocumentStore> {
        self.content_path().map(DocumentStore::new)
    }

    fn insert_logged(&mut self, item: Item) -> Option<String> {
        match self.tree.insert(item) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Could not add item: {}", e);
                None
            }
        }
    }

    fn ensure_folders(&self, folder: &Path) -> ProjectResult<()> {
        for sub in [CONTENT_DIR, META_DIR, CACHE_DIR] {
            let path = folder.join(sub);
            fs::create_dir_all(&path).map_err(|e| ProjectError::path(&path, e))?;
        }
        Ok(())
    }

    /// Forget everything about the current project except the path
    fn reset_state(&mut self) {
        self.tree.clear();
        self.options.clear();
        self.options.set_meta_path(None);
        self.info = ProjectInfo::default();
        self.settings = ProjectSettings::default();
        self.meta = IndexMeta::default();
        self.pending_docs.clear();
        self.locked_by = None;
        self.changed = false;
    }

    /// Mark the project at `folder` as open and take its lock
    fn activate(&mut self, folder: &Path) {
        let meta_path = folder.join(META_DIR);
        self.project_path = Some(folder.to_path_buf());
        self.options.set_meta_path(Some(meta_path.clone()));
        self.state = ProjectState::Open;
        self.locked_by = None;
        let now = Local::now();
        self.session_start = now;
        self.edit_mark = now;
        if let Err(e) = lock::write_lock(&meta_path) {
            warn!("Could not write lock file: {}", e);
        }
    }

    fn save_to(&mut self, folder: &Path) -> ProjectResult<()> {
        self.ensure_folders(folder)?;

        let store = DocumentStore::new(folder.join(CONTENT_DIR));
        let pending = std::mem::take(&mut self.pending_docs);
        for (handle, text) in &pending {
            let Some(item) = self.tree.get(handle) else {
                continue;
            };
            let meta = DocMeta::for_item(item, self.tree.ancestors(handle));
            if let Err(e) = store.write(&meta, handle, text) {
                self.pending_docs = pending.clone();
                return Err(e);
            }
        }

        let now = Local::now();
        let elapsed = (now - self.edit_mark).num_seconds().max(0) as u64;
        let mut meta = self.meta.clone();
        meta.format_version = FORMAT_VERSION;
        meta.app_version = env!("CARGO_PKG_VERSION").to_string();
        meta.timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
        meta.save_count += 1;
        meta.edit_time += elapsed;

        let index = ProjectIndex {
            meta,
            project: self.info.clone(),
            settings: self.settings.clone(),
            item: ProjectIndex::records_from_tree(&self.tree),
        };
        Storage::new(folder.join(INDEX_FILE)).save(&index)?;
        self.meta = index.meta;
        self.edit_mark = now;

        if let Err(e) = session::write_toc(folder, &self.tree) {
            warn!("Could not write table of contents: {}", e);
        }
        if let Err(e) = self.options.save_settings() {
            warn!("Could not save project options: {}", e);
        }

        self.tree.set_changed(false);
        self.changed = false;
        info!("Saved project to {}", folder.display());
        Ok(())
    }
}

fn parse_authors(block: &str) -> Vec<String> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// The project folder for a path naming either the folder or its index file
fn resolve_project_folder(path: &Path) -> ProjectResult<PathBuf> {
    let path = expand_home(&path.to_string_lossy());
    if path.is_dir() {
        return Ok(path);
    }
    if path.is_file()
        && path.file_name().is_some_and(|name| name == INDEX_FILE)
        && let Some(parent) = path.parent()
    {
        return Ok(parent.to_path_buf());
    }
    Err(ProjectError::path(&path, "not a project folder or project file"))
}

fn same_folder(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
