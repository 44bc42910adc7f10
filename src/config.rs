//! Application configuration
//!
//! The project engine never reads global state. Everything it needs from the
//! application is collected in [`AppConfig`] and handed to
//! [`crate::NovelProject::new`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "novelist";

/// Paths and defaults injected into the project engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Installation folder; the sample project may live in `<app_root>/sample`
    pub app_root: PathBuf,
    /// Folder holding `sample.zip`
    pub asset_path: PathBuf,
    /// Destination of backup archives; backups are disabled when unset
    pub backup_path: Option<PathBuf>,
    /// Folder with spell check dictionaries
    pub dict_path: PathBuf,
    /// Language used when a project has none set
    pub spell_language: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self {
            app_root: data_dir.clone(),
            asset_path: data_dir.join("assets"),
            backup_path: None,
            dict_path: data_dir.join("dict"),
            spell_language: "en".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    ///
    /// Keys absent from the file keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise from the default location if it
    /// exists, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_file() {
                Some(file) if file.is_file() => Self::load(file),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Default location of the configuration file
    pub fn default_file() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }
}

/// Expand a leading `~` to the user's home folder
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
