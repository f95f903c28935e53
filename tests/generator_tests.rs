//! End-to-end runs against real folders and an on-disk usage file

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use viral_clips::transcode::{RenderJob, Transcoder};
use viral_clips::usage::{ClipRecord, JsonUsageStore, UsageStore, UsageTable};
use viral_clips::{ClipError, ClipResult, GenerateRequest, Generator, RunStage};

/// Transcoder that always fails, as if ffmpeg crashed
struct BrokenTranscoder;

impl Transcoder for BrokenTranscoder {
    fn render(&self, _job: &RenderJob) -> ClipResult<()> {
        Err(ClipError::delegation("ffmpeg exited with exit status: 1"))
    }
}

/// Transcoder that writes a placeholder output file
struct TouchTranscoder;

impl Transcoder for TouchTranscoder {
    fn render(&self, job: &RenderJob) -> ClipResult<()> {
        if let Some(parent) = job.output.parent() {
            fs::create_dir_all(parent).map_err(|e| ClipError::delegation(e.to_string()))?;
        }
        fs::write(&job.output, b"video").map_err(|e| ClipError::delegation(e.to_string()))
    }
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(videos: &[&str], audio: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("clips")).unwrap();
        fs::create_dir(dir.path().join("audio")).unwrap();
        for name in videos {
            fs::write(dir.path().join("clips").join(name), b"").unwrap();
        }
        for name in audio {
            fs::write(dir.path().join("audio").join(name), b"").unwrap();
        }
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn usage_file(&self) -> PathBuf {
        self.root().join("clip_usage.json")
    }

    fn generator<T: Transcoder>(&self, transcoder: T) -> Generator<JsonUsageStore, T> {
        Generator::new(
            self.root().join("clips"),
            self.root().join("audio"),
            JsonUsageStore::new(self.usage_file()),
            transcoder,
        )
        .with_rng(StdRng::seed_from_u64(2024))
    }

    fn request(&self, num_clips: usize) -> GenerateRequest {
        GenerateRequest {
            output: self.root().join("output").join("result.mp4"),
            num_clips,
            clips: None,
            audio: None,
        }
    }

    fn history(&self) -> UsageTable {
        JsonUsageStore::new(self.usage_file()).load()
    }
}

#[test]
fn test_run_persists_usage_and_writes_output() {
    let ws = Workspace::new(&["a.mp4", "b.mp4", "c.mp4"], &["song.mp3"]);
    let mut generator = ws.generator(TouchTranscoder);

    let report = generator.generate(&ws.request(2)).unwrap();

    assert_eq!(report.selection.videos, vec!["a.mp4", "b.mp4"]);
    assert!(report.output.exists());

    let history = ws.history();
    assert_eq!(history.len(), 2);
    assert_eq!(
        history.record("a.mp4"),
        ClipRecord {
            last_used: report.timestamp,
            usage_count: 1
        }
    );
    assert_eq!(history.record("b.mp4").usage_count, 1);
}

#[test]
fn test_history_steers_next_run_across_processes() {
    let ws = Workspace::new(&["a.mp4", "b.mp4"], &["song.mp3"]);

    let mut seeded = UsageTable::new();
    seeded.insert(
        "a.mp4",
        ClipRecord {
            last_used: 100.0,
            usage_count: 1,
        },
    );
    seeded.insert(
        "b.mp4",
        ClipRecord {
            last_used: 50.0,
            usage_count: 1,
        },
    );
    JsonUsageStore::new(ws.usage_file()).save(&seeded).unwrap();

    let mut generator = ws.generator(TouchTranscoder);
    let report = generator.generate(&ws.request(2)).unwrap();
    assert_eq!(report.selection.videos, vec!["b.mp4", "a.mp4"]);

    let history = ws.history();
    assert_eq!(history.record("a.mp4").usage_count, 2);
    assert_eq!(history.record("b.mp4").usage_count, 2);
}

#[test]
fn test_transcoding_failure_keeps_recorded_usage() {
    let ws = Workspace::new(&["a.mp4", "b.mp4"], &["song.mp3"]);
    let mut generator = ws.generator(BrokenTranscoder);

    let err = generator.generate(&ws.request(1)).unwrap_err();

    assert_eq!(err.stage, RunStage::Delegating);
    assert!(matches!(err.source, ClipError::Delegation { .. }));
    assert_eq!(ws.history().record("a.mp4").usage_count, 1);
}

#[test]
fn test_corrupt_history_is_treated_as_empty() {
    let ws = Workspace::new(&["a.mp4", "b.mp4"], &["song.mp3"]);
    fs::write(ws.usage_file(), "{{{ definitely not json").unwrap();

    let mut generator = ws.generator(TouchTranscoder);
    let report = generator.generate(&ws.request(2)).unwrap();

    assert_eq!(report.selection.videos, vec!["a.mp4", "b.mp4"]);
    // The corrupt file is replaced by a valid table
    assert_eq!(ws.history().len(), 2);
}

#[test]
fn test_unknown_clip_does_not_create_history() {
    let ws = Workspace::new(&["a.mp4"], &["song.mp3"]);
    let mut generator = ws.generator(TouchTranscoder);

    let request = GenerateRequest {
        clips: Some(vec!["a.mp4".to_string(), "ghost.mp4".to_string()]),
        ..ws.request(2)
    };
    let err = generator.generate(&request).unwrap_err();

    assert!(matches!(
        err.source,
        ClipError::UnknownIdentifier { ref name, .. } if name == "ghost.mp4"
    ));
    assert!(!ws.usage_file().exists());
}

#[test]
fn test_scarce_clips_are_repeated() {
    let ws = Workspace::new(&["only.mp4"], &["song.mp3"]);
    let mut generator = ws.generator(TouchTranscoder);

    let report = generator.generate(&ws.request(3)).unwrap();

    assert_eq!(report.selection.videos, vec!["only.mp4"; 3]);
    assert_eq!(ws.history().record("only.mp4").usage_count, 3);
}

#[test]
fn test_empty_clip_folder_fails_validation() {
    let ws = Workspace::new(&[], &["song.mp3"]);
    fs::write(ws.root().join("clips").join("notes.txt"), b"").unwrap();
    let mut generator = ws.generator(TouchTranscoder);

    let err = generator.generate(&ws.request(2)).unwrap_err();
    assert_eq!(err.stage, RunStage::Validating);
    assert!(matches!(err.source, ClipError::NoMatchingFiles { .. }));
    assert!(!ws.usage_file().exists());
}
