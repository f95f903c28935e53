//! # Media Catalog
//!
//! Discovers the clip and audio files a run can choose from.
//!
//! Only regular files directly inside the folder are considered (no
//! recursion), matched on extension case-insensitively. Results are sorted by
//! file name so that rotation ties resolve the same way on every platform.

use crate::error::{ClipError, ClipResult};
use std::path::Path;
use walkdir::WalkDir;

/// Extensions accepted as video clips
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4"];

/// Extensions accepted as background audio
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3"];

/// Check that `path` exists and is a directory.
///
/// `label` names the folder in error messages ("Video", "Audio").
pub fn validate_directory(path: &Path, label: &str) -> ClipResult<()> {
    if !path.exists() {
        return Err(ClipError::DirectoryNotFound {
            label: label.to_string(),
            path: path.to_path_buf(),
        });
    }
    if !path.is_dir() {
        return Err(ClipError::NotADirectory {
            label: label.to_string(),
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// List file names in `directory` whose extension is one of `extensions`.
pub fn list(directory: &Path, extensions: &[&str]) -> ClipResult<Vec<String>> {
    validate_directory(directory, "Media")?;

    let files: Vec<String> = WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("Failed to read directory entry: {err}");
                None
            }
        })
        .filter(|entry| entry.path().is_file())
        .filter(|entry| has_extension(entry.path(), extensions))
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();

    if files.is_empty() {
        return Err(ClipError::NoMatchingFiles {
            directory: directory.to_path_buf(),
            extensions: extensions.iter().map(|ext| (*ext).to_string()).collect(),
        });
    }

    tracing::debug!("Found {} file(s) in {}", files.len(), directory.display());
    Ok(files)
}

/// Fail on the first `requested` name that is not in `available`.
pub fn validate_subset<S: AsRef<str>>(
    requested: &[S],
    available: &[String],
    directory: &Path,
) -> ClipResult<()> {
    for name in requested {
        let name: &str = name.as_ref();
        if !available.iter().any(|known| known == name) {
            return Err(ClipError::UnknownIdentifier {
                name: name.to_string(),
                directory: directory.to_path_buf(),
            });
        }
    }
    Ok(())
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| ext.eq_ignore_ascii_case(allowed)))
}
