//! # Configuration Persistence
//!
//! Manages user defaults stored in `~/.config/viral-clips/config.json`.
//!
//! ## Overview
//!
//! The [`Config`] struct is serialized to / deserialized from a JSON file in
//! the user's XDG config directory. Every field is optional in the file and
//! falls back to the built-in default; command-line flags override whatever
//! the file says.
//!
//! ```json
//! {
//!   "clips_dir": "clips",
//!   "audio_dir": "audio",
//!   "output_dir": "output",
//!   "usage_file": "clip_usage.json",
//!   "num_clips": 7,
//!   "audio_volume": 0.8,
//!   "ffmpeg": "ffmpeg",
//!   "ffprobe": "ffprobe"
//! }
//! ```

use crate::transcode::AUDIO_VOLUME;
use crate::usage::DEFAULT_USAGE_FILE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Number of clips picked by rotation when none is configured
pub const DEFAULT_NUM_CLIPS: usize = 7;

/// Persisted user configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Folder scanned for `.mp4` clips
    #[serde(default = "default_clips_dir")]
    pub clips_dir: PathBuf,

    /// Folder scanned for `.mp3` soundtracks
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,

    /// Folder that receives timestamped outputs
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Location of the usage history
    #[serde(default = "default_usage_file")]
    pub usage_file: PathBuf,

    #[serde(default = "default_num_clips")]
    pub num_clips: usize,

    #[serde(default = "default_audio_volume")]
    pub audio_volume: f64,

    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
}

fn default_clips_dir() -> PathBuf {
    PathBuf::from("clips")
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("audio")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_usage_file() -> PathBuf {
    PathBuf::from(DEFAULT_USAGE_FILE)
}

fn default_num_clips() -> usize {
    DEFAULT_NUM_CLIPS
}

fn default_audio_volume() -> f64 {
    AUDIO_VOLUME
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clips_dir: default_clips_dir(),
            audio_dir: default_audio_dir(),
            output_dir: default_output_dir(),
            usage_file: default_usage_file(),
            num_clips: default_num_clips(),
            audio_volume: default_audio_volume(),
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

impl Config {
    /// Load configuration from disk. Returns `Config::default()` if the file
    /// does not exist or cannot be parsed.
    pub fn load() -> Self {
        Self::try_load().unwrap_or_else(|err| {
            tracing::warn!("Using default configuration: {err:#}");
            Self::default()
        })
    }

    /// Try to load configuration, returning an error on failure.
    fn try_load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path. Returns `Config::default()` if
    /// the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        anyhow::ensure!(
            config.num_clips >= 1,
            "Invalid config file {}: num_clips must be at least 1",
            path.display()
        );
        Ok(config)
    }

    /// Save the current configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Return the path to the config file.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "viral-clips")
            .context("Could not determine config directory")?;
        Ok(dirs.config_dir().join("config.json"))
    }
}
