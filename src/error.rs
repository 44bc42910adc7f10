//! Error types for the project engine
//!
//! Every project-level operation reports failure through [`ProjectError`].
//! Recovery and migration code absorbs per-item problems and logs them
//! instead of returning these errors.

use crate::project::LockInfo;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library
pub type ProjectResult<T> = Result<T, ProjectError>;

/// The main error type for project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    // ========================================================================
    // Path Errors
    // ========================================================================
    /// A path is missing, unwritable or otherwise unusable
    #[error("Path error for '{path}': {message}")]
    Path { path: PathBuf, message: String },

    /// No path has been given where one is required
    #[error("No project path has been set")]
    MissingPath,

    // ========================================================================
    // Format Errors
    // ========================================================================
    /// The index file or an archive could not be read or parsed
    #[error("Invalid or unreadable file '{path}': {message}")]
    Format { path: PathBuf, message: String },

    // ========================================================================
    // Lock Errors
    // ========================================================================
    /// The project is locked by another session
    #[error("Project is locked by {0}")]
    Locked(LockInfo),

    // ========================================================================
    // Integrity Errors
    // ========================================================================
    /// Duplicate handle, cycle or dangling reference
    #[error("Integrity error: {0}")]
    Integrity(String),

    // ========================================================================
    // State Errors
    // ========================================================================
    /// The operation needs an open project
    #[error("No project is open")]
    NoProject,

    // ========================================================================
    // IO Errors
    // ========================================================================
    /// Underlying file system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProjectError {
    /// Build a path error from any displayable message
    pub fn path(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Path {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Build a format error from any displayable message
    pub fn format(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Format {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// True for errors caused by another session holding the lock
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ProjectError::path("/tmp/nowhere", "does not exist");
        assert_eq!(
            err.to_string(),
            "Path error for '/tmp/nowhere': does not exist"
        );

        let err = ProjectError::Integrity("duplicate handle 0123456789abc".to_string());
        assert!(err.to_string().contains("0123456789abc"));
        assert!(!err.is_locked());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ProjectError = io.into();
        assert!(matches!(err, ProjectError::Io(_)));
    }
}
