//! # Compilation Generator
//!
//! Drives one run from folder validation to the finished video.
//!
//! ## Run Stages
//!
//! ```text
//! Validating -> SelectingVideos -> SelectingAudio -> RecordingUsage -> Delegating -> Done
//! ```
//!
//! A failure in any stage aborts the run with a [`RunError`] naming that
//! stage. Usage history is saved during `RecordingUsage`, before the
//! transcoder is invoked, so a transcoding failure never loses rotation
//! state. Nothing is written before `RecordingUsage`.

use crate::catalog::{self, AUDIO_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::error::ClipError;
use crate::rotation;
use crate::transcode::{RenderJob, Transcoder, AUDIO_VOLUME};
use crate::usage::{UsageStore, UsageTable};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where a run is (or where it stopped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Validating,
    SelectingVideos,
    SelectingAudio,
    RecordingUsage,
    Delegating,
    Done,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::SelectingVideos => "selecting videos",
            Self::SelectingAudio => "selecting audio",
            Self::RecordingUsage => "recording usage",
            Self::Delegating => "delegating",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// A run that was aborted, and the stage it was aborted in.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct RunError {
    pub stage: RunStage,
    #[source]
    pub source: ClipError,
}

/// What the caller asked for
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub output: PathBuf,
    /// Clips to pick by rotation when `clips` is not given
    pub num_clips: usize,
    /// Explicit clips, used verbatim in this order
    pub clips: Option<Vec<String>>,
    /// Explicit soundtrack
    pub audio: Option<String>,
}

/// The choices a run made
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub videos: Vec<String>,
    pub audio: String,
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub selection: Selection,
    pub output: PathBuf,
    /// Seconds since the Unix epoch stamped on every selected clip
    pub timestamp: f64,
}

/// Combines catalog, rotation, usage store and transcoder into one run.
pub struct Generator<S, T, R = StdRng> {
    clips_dir: PathBuf,
    audio_dir: PathBuf,
    volume: f64,
    store: S,
    transcoder: T,
    rng: R,
}

impl<S: UsageStore, T: Transcoder> Generator<S, T, StdRng> {
    pub fn new(
        clips_dir: impl Into<PathBuf>,
        audio_dir: impl Into<PathBuf>,
        store: S,
        transcoder: T,
    ) -> Self {
        Self {
            clips_dir: clips_dir.into(),
            audio_dir: audio_dir.into(),
            volume: AUDIO_VOLUME,
            store,
            transcoder,
            rng: StdRng::from_entropy(),
        }
    }
}

impl<S: UsageStore, T: Transcoder, R: Rng> Generator<S, T, R> {
    /// Swap the random source used for audio picks and clip repeats.
    pub fn with_rng<R2: Rng>(self, rng: R2) -> Generator<S, T, R2> {
        Generator {
            clips_dir: self.clips_dir,
            audio_dir: self.audio_dir,
            volume: self.volume,
            store: self.store,
            transcoder: self.transcoder,
            rng,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transcoder(&self) -> &T {
        &self.transcoder
    }

    pub fn clips_dir(&self) -> &Path {
        &self.clips_dir
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// Select clips and audio without recording usage or rendering anything.
    pub fn preview(&mut self, request: &GenerateRequest) -> Result<Selection, RunError> {
        let table = self.store.load();
        self.select(request, &table)
    }

    /// Run every stage and produce the output video.
    pub fn generate(&mut self, request: &GenerateRequest) -> Result<RunReport, RunError> {
        let mut table = self.store.load();
        let selection = self.select(request, &table)?;

        enter(RunStage::RecordingUsage);
        tracing::info!("Selected videos: {:?}", selection.videos);
        tracing::info!("Selected audio: {}", selection.audio);

        let timestamp = run_timestamp();
        table.record_usage(&selection.videos, timestamp);
        self.store
            .save(&table)
            .map_err(abort(RunStage::RecordingUsage))?;

        enter(RunStage::Delegating);
        let job = RenderJob {
            clips: selection
                .videos
                .iter()
                .map(|clip| self.clips_dir.join(clip))
                .collect(),
            audio: self.audio_dir.join(&selection.audio),
            output: request.output.clone(),
            volume: self.volume,
        };
        self.transcoder
            .render(&job)
            .map_err(abort(RunStage::Delegating))?;

        enter(RunStage::Done);
        Ok(RunReport {
            selection,
            output: request.output.clone(),
            timestamp,
        })
    }

    /// Validating, `SelectingVideos` and `SelectingAudio`; never mutates state.
    fn select(
        &mut self,
        request: &GenerateRequest,
        table: &UsageTable,
    ) -> Result<Selection, RunError> {
        enter(RunStage::Validating);
        let stage = RunStage::Validating;
        catalog::validate_directory(&self.clips_dir, "Video").map_err(abort(stage))?;
        catalog::validate_directory(&self.audio_dir, "Audio").map_err(abort(stage))?;
        let video_files =
            catalog::list(&self.clips_dir, VIDEO_EXTENSIONS).map_err(abort(stage))?;
        let audio_files =
            catalog::list(&self.audio_dir, AUDIO_EXTENSIONS).map_err(abort(stage))?;

        enter(RunStage::SelectingVideos);
        let stage = RunStage::SelectingVideos;
        let videos = match request.clips.as_deref() {
            Some(clips) if !clips.is_empty() => {
                catalog::validate_subset(clips, &video_files, &self.clips_dir)
                    .map_err(abort(stage))?;
                clips.to_vec()
            }
            _ if request.num_clips == 0 => {
                return Err(abort(stage)(ClipError::InvalidClipCount));
            }
            _ => rotation::select(&video_files, table, request.num_clips, &mut self.rng)
                .map_err(abort(stage))?,
        };

        enter(RunStage::SelectingAudio);
        let stage = RunStage::SelectingAudio;
        let audio = match request.audio.as_deref() {
            Some(audio) if !audio.is_empty() => {
                catalog::validate_subset(&[audio], &audio_files, &self.audio_dir)
                    .map_err(abort(stage))?;
                audio.to_string()
            }
            _ => audio_files
                .choose(&mut self.rng)
                .cloned()
                .ok_or(ClipError::EmptyCandidateSet { requested: 1 })
                .map_err(abort(stage))?,
        };

        Ok(Selection { videos, audio })
    }
}

fn enter(stage: RunStage) {
    tracing::debug!("Run stage: {stage}");
}

fn abort(stage: RunStage) -> impl Fn(ClipError) -> RunError {
    move |source| {
        tracing::debug!("Run aborted while {stage}: {source}");
        RunError { stage, source }
    }
}

/// Current time as fractional seconds since the Unix epoch.
fn run_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
