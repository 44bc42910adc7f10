//! Per-project GUI options
//!
//! Window sizes, column widths and similar state are kept per project in
//! `meta/guiOptions.toml`. Only the (group, key) pairs listed in [`SCHEMA`]
//! are accepted. Values are held as strings and coerced by the typed getters.

use crate::error::{ProjectError, ProjectResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// File name of the options file inside the meta folder
pub const OPTIONS_FILE: &str = "guiOptions.toml";

/// Value kind an option is stored as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Int,
    Float,
    Bool,
    Str,
}

impl OptionKind {
    /// Whether a stored string can be read as this kind
    fn accepts(self, value: &str) -> bool {
        match self {
            OptionKind::Int => value.trim().parse::<i64>().is_ok(),
            OptionKind::Float => value.trim().parse::<f64>().is_ok(),
            OptionKind::Bool => parse_bool(value).is_some(),
            OptionKind::Str => true,
        }
    }

    fn to_toml(self, value: &str) -> Option<toml::Value> {
        match self {
            OptionKind::Int => value.trim().parse().ok().map(toml::Value::Integer),
            OptionKind::Float => value.trim().parse().ok().map(toml::Value::Float),
            OptionKind::Bool => parse_bool(value).map(toml::Value::Boolean),
            OptionKind::Str => Some(toml::Value::String(value.to_string())),
        }
    }
}

use OptionKind::{Bool, Float, Int, Str};

/// Recognized options as (group, key, kind)
pub const SCHEMA: &[(&str, &str, OptionKind)] = &[
    ("GuiProjectSettings", "winWidth", Int),
    ("GuiProjectSettings", "winHeight", Int),
    ("GuiProjectSettings", "replaceColW", Int),
    ("GuiProjectSettings", "statusColW", Int),
    ("GuiProjectSettings", "importColW", Int),
    ("GuiProjectLoad", "winWidth", Int),
    ("GuiProjectLoad", "winHeight", Int),
    ("GuiProjectLoad", "nameColWidth", Int),
    ("GuiProjectLoad", "countColWidth", Int),
    ("GuiProjectLoad", "modeColWidth", Int),
    ("GuiDocSplit", "spLevel", Int),
    ("GuiBuildNovel", "winWidth", Int),
    ("GuiBuildNovel", "winHeight", Int),
    ("GuiBuildNovel", "boxWidth", Int),
    ("GuiBuildNovel", "docWidth", Int),
    ("GuiBuildNovel", "addNovel", Bool),
    ("GuiBuildNovel", "addNotes", Bool),
    ("GuiBuildNovel", "ignoreFlag", Bool),
    ("GuiBuildNovel", "includeSynopsis", Bool),
    ("GuiBuildNovel", "includeComments", Bool),
    ("GuiBuildNovel", "includeKeywords", Bool),
    ("GuiBuildNovel", "includeBody", Bool),
    ("GuiBuildNovel", "textFont", Str),
    ("GuiBuildNovel", "textSize", Int),
    ("GuiBuildNovel", "lineHeight", Float),
    ("GuiBuildNovel", "justifyText", Bool),
    ("GuiBuildNovel", "fmtTitle", Str),
    ("GuiBuildNovel", "fmtChapter", Str),
    ("GuiBuildNovel", "fmtScene", Str),
    ("GuiOutline", "headerOrder", Str),
    ("GuiOutline", "columnWidth", Str),
    ("GuiOutline", "columnHidden", Str),
    ("GuiOutline", "showSynopsis", Bool),
    ("GuiProjectDetails", "winWidth", Int),
    ("GuiProjectDetails", "winHeight", Int),
    ("GuiProjectDetails", "widthCol0", Int),
    ("GuiProjectDetails", "widthCol1", Int),
    ("GuiProjectDetails", "widthCol2", Int),
    ("GuiProjectDetails", "wordsPerPage", Int),
    ("GuiProjectDetails", "countFrom", Int),
    ("GuiProjectDetails", "clearDouble", Bool),
    ("GuiWritingStats", "winWidth", Int),
    ("GuiWritingStats", "winHeight", Int),
    ("GuiWritingStats", "widthCol0", Int),
    ("GuiWritingStats", "widthCol1", Int),
    ("GuiWritingStats", "widthCol2", Int),
    ("GuiWritingStats", "widthCol3", Int),
    ("GuiWritingStats", "sortCol", Int),
    ("GuiWritingStats", "sortOrder", Int),
    ("GuiWritingStats", "incNovel", Bool),
    ("GuiWritingStats", "incNotes", Bool),
    ("GuiWritingStats", "hideZeros", Bool),
    ("GuiWritingStats", "hideNegative", Bool),
    ("GuiWritingStats", "groupByDay", Bool),
    ("GuiWritingStats", "showIdleTime", Bool),
    ("GuiWritingStats", "histMax", Int),
];

/// Schema kind of an option, `None` if the pair is not recognized
pub fn option_kind(group: &str, key: &str) -> Option<OptionKind> {
    SCHEMA
        .iter()
        .find(|(g, k, _)| *g == group && *k == key)
        .map(|(_, _, kind)| *kind)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

type OptionState = BTreeMap<String, BTreeMap<String, String>>;

/// Options of the open project
#[derive(Debug, Default)]
pub struct OptionsStore {
    meta_path: Option<PathBuf>,
    state: OptionState,
}

impl OptionsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the store to a project's meta folder, or detach it with `None`
    pub fn set_meta_path(&mut self, meta_path: Option<PathBuf>) {
        self.meta_path = meta_path;
    }

    /// Path of the options file, if a project is attached
    pub fn file_path(&self) -> Option<PathBuf> {
        self.meta_path.as_ref().map(|meta| meta.join(OPTIONS_FILE))
    }

    /// Current state, group to key to value
    pub fn state(&self) -> &OptionState {
        &self.state
    }

    pub fn clear(&mut self) {
        self.state.clear();
    }

    /// Replace the state with the content of the options file
    ///
    /// A missing file gives an empty state. Unknown groups and keys, and
    /// values that do not fit the schema kind, are dropped.
    pub fn load_settings(&mut self) -> ProjectResult<()> {
        let path = self.file_path().ok_or(ProjectError::NoProject)?;
        self.state.clear();
        if !path.exists() {
            debug!("No options file found at {}", path.display());
            return Ok(());
        }

        let content = fs::read_to_string(&path)?;
        let table: toml::Table = match toml::from_str(&content) {
            Ok(table) => table,
            Err(e) => {
                warn!("Could not parse options file {}: {}", path.display(), e);
                return Ok(());
            }
        };

        for (group, values) in table {
            let Some(values) = values.as_table() else {
                debug!("Dropping non-table option group '{}'", group);
                continue;
            };
            for (key, value) in values {
                let Some(kind) = option_kind(&group, key) else {
                    debug!("Dropping unknown option {}.{}", group, key);
                    continue;
                };
                let text = match value {
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    toml::Value::Boolean(b) => b.to_string(),
                    _ => {
                        debug!("Dropping option {}.{} of unsupported type", group, key);
                        continue;
                    }
                };
                if !kind.accepts(&text) {
                    debug!("Dropping option {}.{} with invalid value '{}'", group, key, text);
                    continue;
                }
                self.state
                    .entry(group.clone())
                    .or_default()
                    .insert(key.clone(), text);
            }
        }
        Ok(())
    }

    /// Write the state to the options file
    ///
    /// Values that do not fit their schema kind are left out.
    pub fn save_settings(&self) -> ProjectResult<()> {
        let path = self.file_path().ok_or(ProjectError::NoProject)?;

        let mut table = toml::Table::new();
        for (group, values) in &self.state {
            let mut group_table = toml::Table::new();
            for (key, value) in values {
                let converted = option_kind(group, key).and_then(|kind| kind.to_toml(value));
                match converted {
                    Some(v) => {
                        group_table.insert(key.clone(), v);
                    }
                    None => debug!("Not saving option {}.{} = '{}'", group, key, value),
                }
            }
            if !group_table.is_empty() {
                table.insert(group.clone(), toml::Value::Table(group_table));
            }
        }

        let content = toml::to_string_pretty(&table).map_err(|e| ProjectError::format(&path, e))?;
        fs::write(&path, content).map_err(|e| ProjectError::path(&path, e))?;
        Ok(())
    }

    /// Store a value
    ///
    /// # Returns
    /// `false` if the group/key pair is not recognized
    pub fn set_value(&mut self, group: &str, key: &str, value: impl ToString) -> bool {
        if option_kind(group, key).is_none() {
            return false;
        }
        self.state
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        true
    }

    fn raw(&self, group: &str, key: &str) -> Option<&str> {
        self.state.get(group)?.get(key).map(String::as_str)
    }

    pub fn get_string(&self, group: &str, key: &str, default: &str) -> String {
        self.raw(group, key).unwrap_or(default).to_string()
    }

    pub fn get_int(&self, group: &str, key: &str, default: i64) -> i64 {
        self.raw(group, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn get_float(&self, group: &str, key: &str, default: f64) -> f64 {
        self.raw(group, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn get_bool(&self, group: &str, key: &str, default: bool) -> bool {
        self.raw(group, key).and_then(parse_bool).unwrap_or(default)
    }
}
