//! Error types shared by the catalog, rotation, usage and transcoding layers.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library.
pub type ClipResult<T> = Result<T, ClipError>;

/// Everything that can go wrong while assembling a compilation.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error("{label} folder '{}' does not exist", .path.display())]
    DirectoryNotFound { label: String, path: PathBuf },

    #[error("{label} path '{}' is not a directory", .path.display())]
    NotADirectory { label: String, path: PathBuf },

    #[error("No files with extensions {} found in {}", format_extensions(.extensions), .directory.display())]
    NoMatchingFiles {
        directory: PathBuf,
        extensions: Vec<String>,
    },

    #[error("Specified file '{name}' not found in {}", .directory.display())]
    UnknownIdentifier { name: String, directory: PathBuf },

    #[error("Number of clips must be at least 1")]
    InvalidClipCount,

    #[error("Cannot select {requested} clip(s) from an empty candidate set")]
    EmptyCandidateSet { requested: usize },

    #[error("Could not {action} clip usage data at {}: {message}", .path.display())]
    Persistence {
        action: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("Transcoding failed: {message}")]
    Delegation {
        message: String,
        stderr: Option<String>,
    },
}

impl ClipError {
    /// Build a persistence error; `action` is "load" or "save".
    pub fn persistence(
        action: &'static str,
        path: impl Into<PathBuf>,
        message: impl ToString,
    ) -> Self {
        Self::Persistence {
            action,
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Build a delegation error without captured stderr.
    pub fn delegation(message: impl Into<String>) -> Self {
        Self::Delegation {
            message: message.into(),
            stderr: None,
        }
    }
}

fn format_extensions(extensions: &[String]) -> String {
    extensions
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(", ")
}
