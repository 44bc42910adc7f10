//! Novelist Project Library
//!
//! This library manages a writing project: a tree of folders and text
//! documents, each identified by a stable handle, persisted as one document
//! file per item plus an index file describing tree shape and metadata.
//!
//! # Architecture
//!
//! The library is organised in layers:
//! - **Engine Layer**: [`NovelProject`] - open/save/close, locking, backups
//! - **Domain Layer**: `tree` module - items, handles and the project tree
//! - **Persistence Layer**: `storage`, `document` and `options` modules -
//!   index file, document files and per-project options
//! - **Maintenance**: `migration` module and orphan recovery - bring older or
//!   tampered project folders back into shape
//!
//! # Example
//!
//! ```no_run
//! use novelist::{AppConfig, NewProjectData, NovelProject};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut project = NovelProject::new(AppConfig::default());
//!     project.new_project(NewProjectData {
//!         name: "My Novel".to_string(),
//!         path: Some("/home/jane/Novels/my-novel".into()),
//!         ..Default::default()
//!     })?;
//!     project.save_project()?;
//!     project.close_project()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod migration;
pub mod options;
pub mod project;
pub mod spellcheck;
pub mod storage;
pub mod tree;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{ProjectError, ProjectResult};
pub use project::{CustomLayout, LockInfo, NewProjectData, NovelProject, Population, ProjectState};
pub use tree::{Item, ItemClass, ItemLayout, ItemType, ProjectTree};
