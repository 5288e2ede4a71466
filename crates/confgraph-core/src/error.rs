//! Error types for the configuration graph.
//!
//! There are three failure families. `BuildError` and `ScanError` abort a
//! refresh and leave the previous graph in place. `ContentFetchError` only
//! affects the preview of one file.

use std::io;
use thiserror::Error;

/// The scan input could not be turned into a graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Two environment declarations share a name.
    #[error("Duplicate environment name: {0}")]
    DuplicateEnvironment(String),

    /// An environment lists a member path that was not scanned.
    #[error("Environment '{environment}' references unknown path: {path}")]
    DanglingMember { environment: String, path: String },

    /// Two scanned files claim the same path.
    #[error("Duplicate source path: {0}")]
    DuplicateSource(String),
}

/// The external scan call failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid project configuration: {0}")]
    Config(String),

    #[error("Scan backend failed: {0}")]
    Backend(String),
}

impl ScanError {
    /// Wraps an I/O error with the path that caused it.
    pub fn io(path: impl Into<String>, error: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

/// Reading one file's content for preview failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentFetchError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unreadable file {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Content backend failed: {0}")]
    Backend(String),
}

impl ContentFetchError {
    /// Classifies an I/O error raised while reading `path`.
    pub fn io(path: impl Into<String>, error: io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            io::ErrorKind::InvalidData => Self::Unreadable {
                path,
                reason: "content is not valid UTF-8".to_string(),
            },
            _ => Self::Unreadable {
                path,
                reason: error.to_string(),
            },
        }
    }
}
