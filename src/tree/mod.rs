//! Project item tree
//!
//! This module contains the in-memory model of a project:
//! - `item`: the item node and its class/type/layout enums
//! - `handle`: seedable handle generation and validation
//! - `project_tree`: the tree container with lookup, insertion and removal

mod handle;
mod item;
mod project_tree;

pub use handle::{HANDLE_LEN, HandleGenerator, is_valid_handle};
pub use item::{Item, ItemClass, ItemLayout, ItemType};
pub use project_tree::ProjectTree;
