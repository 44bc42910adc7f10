//! Initial content of new projects

use crate::config::AppConfig;
use crate::error::{ProjectError, ProjectResult};
use crate::tree::{Item, ItemClass, ItemLayout, ProjectTree};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// How a new project is populated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Population {
    /// Novel, plot, character and world roots with one chapter and one scene
    #[default]
    Minimal,
    /// A copy of the bundled sample project
    Sample,
    /// Roots and chapter/scene skeleton chosen by the user
    Custom(CustomLayout),
}

/// Options for a custom project layout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomLayout {
    /// Root folders to add besides the novel root
    pub add_roots: Vec<ItemClass>,
    pub num_chapters: usize,
    /// Scenes per chapter, or in total when there are no chapters
    pub num_scenes: usize,
    /// Put each chapter and its scenes in its own folder
    pub chapter_folders: bool,
}

/// Everything needed to create a project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProjectData {
    pub name: String,
    pub title: String,
    /// Newline separated author names
    pub authors: String,
    pub path: Option<PathBuf>,
    pub populate: Population,
}

/// Initial document text keyed by handle
pub type StarterDocs = Vec<(String, String)>;

fn title_page(title: &str, authors: &[String]) -> String {
    let mut text = format!("#! {}\n\n", title);
    if !authors.is_empty() {
        text.push_str(&format!(">> By {} <<\n\n", authors.join(", ")));
    }
    text
}

/// Minimal layout: the four standard roots, a title page and one chapter with a scene
pub fn populate_minimal(
    tree: &mut ProjectTree,
    title: &str,
    authors: &[String],
) -> ProjectResult<StarterDocs> {
    let mut docs = StarterDocs::new();
    let novel = tree.insert(Item::root(ItemClass::Novel.default_label(), ItemClass::Novel))?;
    for class in [ItemClass::Plot, ItemClass::Character, ItemClass::World] {
        tree.insert(Item::root(class.default_label(), class))?;
    }

    let title_handle = tree.insert(Item::file(
        "Title Page",
        ItemClass::Novel,
        ItemLayout::Title,
        &novel,
    ))?;
    docs.push((title_handle, title_page(title, authors)));

    let folder = tree.insert(Item::folder("New Chapter", ItemClass::Novel, &novel))?;
    let chapter = tree.insert(Item::file(
        "New Chapter",
        ItemClass::Novel,
        ItemLayout::Chapter,
        &folder,
    ))?;
    docs.push((chapter, "## New Chapter\n\n".to_string()));
    let scene = tree.insert(Item::file(
        "New Scene",
        ItemClass::Novel,
        ItemLayout::Scene,
        &folder,
    ))?;
    docs.push((scene, "### New Scene\n\n".to_string()));

    Ok(docs)
}

/// Custom layout: novel root, title page, extra roots and a chapter/scene skeleton
///
/// With chapters, scenes are named "Scene C.S"; without, "Scene S".
pub fn populate_custom(
    tree: &mut ProjectTree,
    layout: &CustomLayout,
    title: &str,
    authors: &[String],
) -> ProjectResult<StarterDocs> {
    let mut docs = StarterDocs::new();
    let novel = tree.insert(Item::root(ItemClass::Novel.default_label(), ItemClass::Novel))?;
    let title_handle = tree.insert(Item::file(
        "Title Page",
        ItemClass::Novel,
        ItemLayout::Title,
        &novel,
    ))?;
    docs.push((title_handle, title_page(title, authors)));

    for class in &layout.add_roots {
        if *class == ItemClass::Novel {
            continue;
        }
        if class.is_single_root() && tree.find_root(*class).is_some() {
            debug!("Skipping second {} root", class);
            continue;
        }
        tree.insert(Item::root(class.default_label(), *class))?;
    }

    if layout.num_chapters == 0 {
        for s in 1..=layout.num_scenes {
            let name = format!("Scene {}", s);
            let scene = tree.insert(Item::file(&name, ItemClass::Novel, ItemLayout::Scene, &novel))?;
            docs.push((scene, format!("### {}\n\n", name)));
        }
        return Ok(docs);
    }

    for c in 1..=layout.num_chapters {
        let name = format!("Chapter {}", c);
        let parent = if layout.chapter_folders {
            tree.insert(Item::folder(&name, ItemClass::Novel, &novel))?
        } else {
            novel.clone()
        };
        let chapter = tree.insert(Item::file(&name, ItemClass::Novel, ItemLayout::Chapter, &parent))?;
        docs.push((chapter, format!("## {}\n\n", name)));

        for s in 1..=layout.num_scenes {
            let name = format!("Scene {}.{}", c, s);
            let scene = tree.insert(Item::file(&name, ItemClass::Novel, ItemLayout::Scene, &parent))?;
            docs.push((scene, format!("### {}\n\n", name)));
        }
    }
    Ok(docs)
}

/// Copy the sample project into `target`
///
/// `<asset_path>/sample.zip` is preferred; otherwise the folder
/// `<app_root>/sample` is copied.
pub fn install_sample(config: &AppConfig, target: &Path) -> ProjectResult<()> {
    let archive = config.asset_path.join("sample.zip");
    if archive.is_file() {
        let file = File::open(&archive).map_err(|e| ProjectError::format(&archive, e))?;
        let mut zip = zip::ZipArchive::new(file).map_err(|e| ProjectError::format(&archive, e))?;
        zip.extract(target)
            .map_err(|e| ProjectError::format(&archive, e))?;
        info!("Extracted sample project from {}", archive.display());
        return Ok(());
    }

    let source = config.app_root.join("sample");
    if !source.is_dir() {
        return Err(ProjectError::path(
            &source,
            "sample project could not be found",
        ));
    }
    for entry in WalkDir::new(&source).min_depth(1) {
        let entry = entry.map_err(|e| ProjectError::path(&source, e))?;
        let Ok(rel) = entry.path().strip_prefix(&source) else {
            continue;
        };
        let dest = target.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(|e| ProjectError::path(&dest, e))?;
        } else {
            fs::copy(entry.path(), &dest).map_err(|e| ProjectError::path(&dest, e))?;
        }
    }
    info!("Copied sample project from {}", source.display());
    Ok(())
}
