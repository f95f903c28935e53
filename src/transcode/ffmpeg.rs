//! FFmpeg-backed transcoder.
//!
//! Three external steps per job:
//!
//! 1. `ffmpeg -f concat` joins the clips without re-encoding
//! 2. `ffprobe` reads the joined duration
//! 3. `ffmpeg` muxes the soundtrack (volume + fade-out) and trims to that duration
//!
//! Intermediate files live in a temporary directory that is removed when the
//! job finishes, successfully or not.

use super::{fade_window, RenderJob, Transcoder};
use crate::error::{ClipError, ClipResult};
use serde::Deserialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Lines of stderr kept on failure
const STDERR_TAIL_LINES: usize = 20;

/// Builder for a single ffmpeg invocation.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    program: String,
    /// (arguments before -i, input path) per input
    inputs: Vec<(Vec<String>, PathBuf)>,
    output_args: Vec<String>,
    output: PathBuf,
    log_level: String,
}

impl FfmpegCommand {
    pub fn new(program: impl Into<String>, output: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            inputs: Vec::new(),
            output_args: Vec::new(),
            output: output.as_ref().to_path_buf(),
            log_level: "error".to_string(),
        }
    }

    /// Add an input with its own leading options.
    pub fn input<I, S>(mut self, path: impl AsRef<Path>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push((
            args.into_iter().map(Into::into).collect(),
            path.as_ref().to_path_buf(),
        ));
        self
    }

    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    pub fn map(self, stream: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(stream)
    }

    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Copy all streams without re-encoding.
    pub fn stream_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Limit output duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{seconds:.3}"))
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-v".to_string(),
            self.log_level.clone(),
        ];

        for (input_args, path) in &self.inputs {
            args.extend(input_args.iter().cloned());
            args.push("-i".to_string());
            args.push(path.to_string_lossy().to_string());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());
        args
    }

    /// Run to completion, mapping any failure to a delegation error.
    pub fn run(&self) -> ClipResult<()> {
        let args = self.build_args();
        tracing::debug!("Executing: {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|err| {
                ClipError::delegation(format!("failed to launch {}: {err}", self.program))
            })?;

        if !output.status.success() {
            return Err(exit_failure(&self.program, output.status, &output.stderr));
        }
        Ok(())
    }
}

/// Runs jobs through the `ffmpeg` / `ffprobe` executables.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg: String,
    ffprobe: String,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    fn concatenate(&self, list_file: &Path, output: &Path) -> ClipResult<()> {
        tracing::info!("Concatenating video clips...");
        FfmpegCommand::new(&self.ffmpeg, output)
            .input(list_file, ["-f", "concat", "-safe", "0"])
            .stream_copy()
            .run()
    }

    fn media_duration(&self, video: &Path) -> ClipResult<f64> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(video)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|err| {
                ClipError::delegation(format!("failed to launch {}: {err}", self.ffprobe))
            })?;

        if !output.status.success() {
            return Err(exit_failure(&self.ffprobe, output.status, &output.stderr));
        }

        let duration = parse_media_duration(&String::from_utf8_lossy(&output.stdout))?;
        tracing::info!("Total video duration: {duration:.2} seconds");
        Ok(duration)
    }

    fn add_audio(&self, video: &Path, job: &RenderJob, duration: f64) -> ClipResult<()> {
        tracing::info!("Adding background music...");
        let (fade_start, fade_length) = fade_window(duration);
        let filter = format!(
            "[1:a]volume={},afade=t=out:st={fade_start:.3}:d={fade_length:.3}[a]",
            job.volume
        );

        FfmpegCommand::new(&self.ffmpeg, &job.output)
            .input(video, Vec::<String>::new())
            .input(&job.audio, Vec::<String>::new())
            .filter_complex(filter)
            .map("0:v")
            .map("[a]")
            .duration(duration)
            .video_codec("libx264")
            .audio_codec("aac")
            .run()
    }
}

impl Transcoder for FfmpegTranscoder {
    fn render(&self, job: &RenderJob) -> ClipResult<()> {
        if job.clips.is_empty() {
            return Err(ClipError::delegation("no clips to concatenate"));
        }

        if let Some(parent) = job.output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| {
                    ClipError::delegation(format!(
                        "failed to create output directory {}: {err}",
                        parent.display()
                    ))
                })?;
            }
        }

        let scratch = tempfile::tempdir()
            .map_err(|err| ClipError::delegation(format!("failed to create temp dir: {err}")))?;

        let clips = job
            .clips
            .iter()
            .map(|clip| {
                fs::canonicalize(clip).map_err(|err| {
                    ClipError::delegation(format!("cannot resolve {}: {err}", clip.display()))
                })
            })
            .collect::<ClipResult<Vec<_>>>()?;

        let list_file = scratch.path().join("concat.txt");
        fs::write(&list_file, concat_list(&clips)).map_err(|err| {
            ClipError::delegation(format!("failed to write concat list: {err}"))
        })?;

        let joined = scratch.path().join("joined.mp4");
        self.concatenate(&list_file, &joined)?;
        let duration = self.media_duration(&joined)?;
        self.add_audio(&joined, job, duration)?;

        tracing::debug!("Rendered {}", job.output.display());
        Ok(())
    }
}

/// Render a concat-demuxer list file for `clips`.
///
/// Single quotes in paths are closed, escaped and reopened (`'\''`).
pub fn concat_list(clips: &[PathBuf]) -> String {
    let mut list = String::new();
    for clip in clips {
        let escaped = clip.to_string_lossy().replace('\'', r"'\''");
        let _ = writeln!(list, "file '{escaped}'");
    }
    list
}

#[derive(Debug, Deserialize)]
struct StreamInfo {
    #[serde(default)]
    streams: Vec<StreamEntry>,
    format: Option<FormatEntry>,
}

#[derive(Debug, Deserialize)]
struct StreamEntry {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FormatEntry {
    duration: Option<String>,
}

/// First stream duration, falling back to the container duration.
fn parse_media_duration(json: &str) -> ClipResult<f64> {
    let info: StreamInfo = serde_json::from_str(json)
        .map_err(|err| ClipError::delegation(format!("unreadable ffprobe output: {err}")))?;

    // ffprobe prints "N/A" for streams without a known length
    let usable = |raw: Option<&str>| {
        raw?.trim()
            .parse::<f64>()
            .ok()
            .filter(|duration| duration.is_finite() && *duration > 0.0)
    };

    usable(info.streams.first().and_then(|stream| stream.duration.as_deref()))
        .or_else(|| usable(info.format.as_ref().and_then(|f| f.duration.as_deref())))
        .ok_or_else(|| ClipError::delegation("ffprobe reported no usable duration"))
}

/// Build the error for a tool that exited unsuccessfully, logging its stderr.
fn exit_failure(program: &str, status: impl std::fmt::Display, stderr: &[u8]) -> ClipError {
    let stderr = stderr_tail(stderr);
    tracing::debug!("{program} stderr:\n{stderr}");
    ClipError::Delegation {
        message: format!("{program} exited with {status}"),
        stderr: Some(stderr),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
