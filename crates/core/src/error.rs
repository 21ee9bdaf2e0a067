//! Error types for pbxgraft
//!
//! Every library operation returns [`PbxResult`]. Errors are split into
//! fatal ones (the project file cannot be located or parsed, IO failed) that
//! abort a hook before anything is written, and per-item ones such as
//! [`PbxError::MissingFile`] that a batch collects and reports.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for pbxgraft
#[derive(Debug, Error)]
pub enum PbxError {
    // ========================================================================
    // Project Location / Format Errors
    // ========================================================================
    /// No project file at the expected location
    #[error("Project not found at path: {0}")]
    ProjectNotFound(PathBuf),

    /// The project text is not a well-formed object graph
    #[error("Malformed project file: {0}")]
    Format(String),

    // ========================================================================
    // Graph Errors
    // ========================================================================
    /// A group was requested under a parent that does not exist
    #[error("Parent group '{parent}' not found while creating group '{group}'")]
    MissingParent { parent: String, group: String },

    /// A target id or name does not resolve
    #[error("Target not found: {0}")]
    TargetNotFound(String),

    /// A group id or name does not resolve
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    /// An invariant of the object graph does not hold
    #[error("Graph integrity violated: {0}")]
    Integrity(String),

    /// A file to register does not exist on disk
    #[error("File not found: {0}")]
    MissingFile(PathBuf),

    // ========================================================================
    // IO Errors
    // ========================================================================
    /// File read error
    #[error("Failed to read file '{path}': {message}")]
    FileRead { path: PathBuf, message: String },

    /// File write error
    #[error("Failed to write file '{path}': {message}")]
    FileWrite { path: PathBuf, message: String },

    /// Directory creation failed
    #[error("Failed to create directory '{path}': {message}")]
    DirectoryCreate { path: PathBuf, message: String },

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PbxError {
    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        PbxError::Format(msg.into())
    }

    /// Create a format error pointing at a line and column of the input
    pub fn format_at(line: usize, column: usize, msg: impl Into<String>) -> Self {
        PbxError::Format(format!("line {}, column {}: {}", line, column, msg.into()))
    }

    /// Create a missing-parent error
    pub fn missing_parent(parent: impl Into<String>, group: impl Into<String>) -> Self {
        PbxError::MissingParent {
            parent: parent.into(),
            group: group.into(),
        }
    }

    /// Create an integrity error
    pub fn integrity(msg: impl Into<String>) -> Self {
        PbxError::Integrity(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        PbxError::Internal(msg.into())
    }

    /// Errors that must abort a hook before anything is written
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PbxError::MissingFile(_))
    }
}

/// Result type alias using PbxError
pub type PbxResult<T> = Result<T, PbxError>;

// ============================================================================
// Tests
// ============================================================================
