//! Document store
//!
//! Every file item has a document in the content folder named
//! `<handle>.nwd`. A document starts with an optional metadata header:
//!
//! ```text
//! %%~name:Mars
//! %%~path:5eaea4e8cdee8/636b6aa9b697b
//! %%~kind:WORLD/NOTE
//!
//! Body text ...
//! ```
//!
//! The header is not needed by the tree, but it is what orphan recovery uses
//! to rebuild an item whose index entry has been lost.

use crate::error::{ProjectError, ProjectResult};
use crate::tree::{Item, ItemClass, ItemLayout, is_valid_handle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extension of document files
pub const DOC_EXT: &str = "nwd";

const META_MARKER: &str = "%%~";

/// Metadata parsed from a document header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocMeta {
    pub name: String,
    /// Breadcrumb of handles from the root down to the document itself
    pub path: Vec<String>,
    pub class: Option<ItemClass>,
    pub layout: Option<ItemLayout>,
}

impl DocMeta {
    /// Build the header metadata for an item
    pub fn for_item(item: &Item, path: Vec<String>) -> Self {
        Self {
            name: item.name().to_string(),
            path,
            class: Some(item.class),
            layout: Some(item.layout),
        }
    }

    /// Parent handle claimed by the breadcrumb
    pub fn parent(&self) -> Option<&str> {
        match self.path.len() {
            0 | 1 => None,
            n => Some(self.path[n - 2].as_str()),
        }
    }

    /// Split a document into its metadata and body text
    ///
    /// Header lines are consumed while they start with the marker, plus one
    /// blank separator line. Malformed or unknown header lines are skipped
    /// individually.
    pub fn parse(text: &str) -> (Self, &str) {
        let mut meta = DocMeta::default();
        let mut rest = text;

        while let Some(line) = rest.strip_prefix(META_MARKER) {
            let (line, remainder) = match line.find('\n') {
                Some(pos) => (&line[..pos], &line[pos + 1..]),
                None => (line, ""),
            };
            rest = remainder;
            meta.parse_line(line.trim_end_matches('\r'));
        }
        if rest.len() != text.len() {
            rest = rest
                .strip_prefix("\r\n")
                .or_else(|| rest.strip_prefix('\n'))
                .unwrap_or(rest);
        }

        (meta, rest)
    }

    fn parse_line(&mut self, line: &str) {
        let Some((key, value)) = line.split_once(':') else {
            debug!("Ignoring malformed document meta line '{}'", line);
            return;
        };
        let value = value.trim();
        match key.trim() {
            "name" => self.name = value.to_string(),
            "path" => {
                self.path = value
                    .split('/')
                    .map(str::trim)
                    .filter(|h| is_valid_handle(h))
                    .map(str::to_string)
                    .collect();
            }
            "kind" => {
                let (class, layout) = value.split_once('/').unwrap_or((value, ""));
                self.class = class.parse().ok();
                self.layout = layout.parse().ok();
            }
            other => debug!("Ignoring unknown document meta key '{}'", other),
        }
    }

    /// Render the header, including the trailing blank line
    pub fn render(&self) -> String {
        let mut header = String::new();
        header.push_str(&format!("{}name:{}\n", META_MARKER, self.name));
        header.push_str(&format!("{}path:{}\n", META_MARKER, self.path.join("/")));
        header.push_str(&format!(
            "{}kind:{}/{}\n",
            META_MARKER,
            self.class.unwrap_or_default(),
            self.layout.unwrap_or_default()
        ));
        header.push('\n');
        header
    }
}

/// Character, word and paragraph counts of a document body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextCounts {
    pub chars: usize,
    pub words: usize,
    pub paras: usize,
}

impl TextCounts {
    /// Count the body text, ignoring comment lines starting with `%`
    pub fn of(text: &str) -> Self {
        let mut counts = TextCounts::default();
        let mut in_para = false;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                in_para = false;
                continue;
            }
            if line.starts_with('%') {
                continue;
            }
            let text = if line.starts_with('#') {
                line.trim_start_matches('#').trim_start()
            } else {
                if !in_para {
                    counts.paras += 1;
                    in_para = true;
                }
                line
            };
            counts.chars += text.chars().count();
            counts.words += text.split_whitespace().count();
        }
        counts
    }
}

/// Reads and writes document files in one content folder
#[derive(Debug, Clone)]
pub struct DocumentStore {
    content_path: PathBuf,
}

impl DocumentStore {
    pub fn new(content_path: impl AsRef<Path>) -> Self {
        Self {
            content_path: content_path.as_ref().to_path_buf(),
        }
    }

    pub fn content_path(&self) -> &Path {
        &self.content_path
    }

    /// Path of the document file for a handle
    pub fn doc_path(&self, handle: &str) -> PathBuf {
        self.content_path.join(format!("{}.{}", handle, DOC_EXT))
    }

    pub fn exists(&self, handle: &str) -> bool {
        self.doc_path(handle).is_file()
    }

    /// Read a document, returning its header and body
    ///
    /// A missing document reads as empty.
    pub fn read(&self, handle: &str) -> ProjectResult<(DocMeta, String)> {
        let path = self.doc_path(handle);
        if !path.exists() {
            return Ok((DocMeta::default(), String::new()));
        }
        let text = fs::read_to_string(&path).map_err(|e| ProjectError::format(&path, e))?;
        let (meta, body) = DocMeta::parse(&text);
        Ok((meta, body.to_string()))
    }

    /// Read only the header of a document
    pub fn read_meta(&self, handle: &str) -> ProjectResult<DocMeta> {
        Ok(self.read(handle)?.0)
    }

    /// Write a document with a fresh header
    ///
    /// The new content goes to a temporary file which then replaces the old
    /// document, so a failed write never truncates an existing document.
    pub fn write(&self, meta: &DocMeta, handle: &str, body: &str) -> ProjectResult<TextCounts> {
        if !self.content_path.is_dir() {
            return Err(ProjectError::path(
                &self.content_path,
                "content folder does not exist",
            ));
        }
        let path = self.doc_path(handle);
        let temp = path.with_extension("tmp");
        let mut text = meta.render();
        text.push_str(body);

        fs::write(&temp, text)?;
        fs::rename(&temp, &path)?;
        debug!("Saved document {}", handle);
        Ok(TextCounts::of(body))
    }

    /// Delete a document file, ignoring documents that do not exist
    pub fn delete(&self, handle: &str) -> ProjectResult<()> {
        let path = self.doc_path(handle);
        if path.exists() {
            fs::remove_file(&path)?;
            debug!("Deleted document {}", handle);
        }
        Ok(())
    }

    /// Handles of all well-formed document files, sorted
    ///
    /// Files whose names are not `<handle>.nwd` are skipped.
    pub fn scan(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.content_path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Could not read content folder {}: {}",
                    self.content_path.display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut handles: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter_map(|name| handle_from_file_name(&name))
            .collect();
        handles.sort();
        handles
    }
}

/// Extract the handle from a document file name, if it is well-formed
pub fn handle_from_file_name(name: &str) -> Option<String> {
    let stem = name.strip_suffix(&format!(".{}", DOC_EXT))?;
    is_valid_handle(stem).then(|| stem.to_string())
}
