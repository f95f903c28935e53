//! # Usage Storage
//!
//! Handles persistent storage of per-clip usage data.
//!
//! ## Storage Location
//!
//! ```text
//! ./clip_usage.json        (default, relative to the working directory)
//! ```
//!
//! The whole table is rewritten on every save. Writes go to a temporary file
//! next to the target which is then renamed over it, so a crash mid-write
//! leaves the previous table intact.

use crate::error::{ClipError, ClipResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default file name for the usage table
pub const DEFAULT_USAGE_FILE: &str = "clip_usage.json";

/// Usage statistics for a single clip
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipRecord {
    /// Seconds since the Unix epoch of the last run that used this clip (0 = never)
    pub last_used: f64,
    /// Number of times this clip has been used
    pub usage_count: u64,
}

/// Map of clip file name -> usage record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageTable {
    entries: BTreeMap<String, ClipRecord>,
}

impl UsageTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a clip; unknown clips read as never used.
    pub fn record(&self, clip: &str) -> ClipRecord {
        self.entries.get(clip).copied().unwrap_or_default()
    }

    /// Whether the table holds an explicit entry for `clip`
    pub fn contains(&self, clip: &str) -> bool {
        self.entries.contains_key(clip)
    }

    /// Overwrite the record for a clip
    pub fn insert(&mut self, clip: impl Into<String>, record: ClipRecord) {
        self.entries.insert(clip.into(), record);
    }

    /// Record one run: every occurrence bumps the count and stamps `last_used`.
    pub fn record_usage<S: AsRef<str>>(&mut self, clips: &[S], timestamp: f64) {
        for clip in clips {
            let entry = self.entries.entry(clip.as_ref().to_string()).or_default();
            entry.last_used = timestamp;
            entry.usage_count += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in clip name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClipRecord)> {
        self.entries.iter().map(|(name, record)| (name.as_str(), record))
    }
}

/// Durable home of the usage table.
///
/// The orchestrator receives a store explicitly instead of touching the
/// filesystem itself, so tests can swap in [`MemoryUsageStore`].
pub trait UsageStore {
    /// Read the persisted table, reporting why it could not be read.
    fn try_load(&self) -> ClipResult<UsageTable>;

    /// Replace the persisted table with `table`.
    fn save(&mut self, table: &UsageTable) -> ClipResult<()>;

    /// Read the persisted table. Missing or corrupt state reads as empty history.
    fn load(&self) -> UsageTable {
        self.try_load().unwrap_or_else(|err| {
            tracing::warn!("Ignoring unreadable usage history: {err}");
            UsageTable::new()
        })
    }
}

/// Usage table stored as pretty-printed JSON on disk
#[derive(Debug, Clone)]
pub struct JsonUsageStore {
    path: PathBuf,
}

impl JsonUsageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UsageStore for JsonUsageStore {
    fn try_load(&self) -> ClipResult<UsageTable> {
        if !self.path.exists() {
            return Ok(UsageTable::new());
        }
        load_table(&self.path)
    }

    fn save(&mut self, table: &UsageTable) -> ClipResult<()> {
        let json = serde_json::to_string_pretty(table)
            .map_err(|err| ClipError::persistence("save", &self.path, err))?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)
            .map_err(|err| ClipError::persistence("save", &self.path, err))?;

        let mut temp = tempfile::NamedTempFile::new_in(&parent)
            .map_err(|err| ClipError::persistence("save", &self.path, err))?;
        temp.write_all(json.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|err| ClipError::persistence("save", &self.path, err))?;
        temp.persist(&self.path)
            .map_err(|err| ClipError::persistence("save", &self.path, err.error))?;

        tracing::debug!(
            "Saved usage for {} clip(s) to {}",
            table.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// In-memory store, handy for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemoryUsageStore {
    table: Option<UsageTable>,
    fail_saves: bool,
    saves: usize,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing table
    pub fn with_table(table: UsageTable) -> Self {
        Self {
            table: Some(table),
            ..Self::default()
        }
    }

    /// Make every subsequent save fail with a persistence error
    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    /// The currently stored table, if anything has been stored
    pub fn table(&self) -> Option<&UsageTable> {
        self.table.as_ref()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl UsageStore for MemoryUsageStore {
    fn try_load(&self) -> ClipResult<UsageTable> {
        Ok(self.table.clone().unwrap_or_default())
    }

    fn save(&mut self, table: &UsageTable) -> ClipResult<()> {
        if self.fail_saves {
            return Err(ClipError::persistence(
                "save",
                "<memory>",
                "store is read-only",
            ));
        }
        self.table = Some(table.clone());
        self.saves += 1;
        Ok(())
    }
}

/// Load a usage table from a file
fn load_table(path: &Path) -> ClipResult<UsageTable> {
    let content =
        fs::read_to_string(path).map_err(|err| ClipError::persistence("load", path, err))?;

    serde_json::from_str(&content).map_err(|err| ClipError::persistence("load", path, err))
}
