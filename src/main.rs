//! # Viral Clips CLI Entry Point
//!
//! Combines video clips with background audio into a single compilation,
//! rotating through the clip folder so repeated runs spread usage evenly.
//!
//! ## Usage
//!
//! ```bash
//! # Rotation picks 7 clips, random soundtrack
//! viral-clips
//!
//! # Explicit clips and soundtrack
//! viral-clips --clips clip1.mp4 clip2.mp4 --audio music.mp3
//!
//! # Rotation with a fixed soundtrack and a custom count
//! viral-clips --audio music.mp3 --num-clips 10
//!
//! # Show what would be picked without touching history or ffmpeg
//! viral-clips --dry-run
//!
//! # Store the current folders and count as the new defaults
//! viral-clips --clips-dir /srv/clips --num-clips 5 --save-defaults
//! ```
//!
//! Defaults come from `~/.config/viral-clips/config.json` when present; flags
//! override them. Set `RUST_LOG` for finer-grained logging.

use viral_clips::config::Config;
use viral_clips::transcode::FfmpegTranscoder;
use viral_clips::usage::JsonUsageStore;
use viral_clips::{GenerateRequest, Generator};

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Viral Clips - generate compilation videos with fair clip rotation
#[derive(Parser, Debug)]
#[command(name = "viral-clips")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Generate viral clips by combining video clips with background audio",
    long_about = None
)]
struct Args {
    /// Specific video clips to use (file names from the clips folder)
    #[arg(long, value_name = "FILE", num_args = 1..)]
    clips: Option<Vec<String>>,

    /// Specific audio file to use (file name from the audio folder)
    #[arg(long, value_name = "FILE")]
    audio: Option<String>,

    /// Number of clips to select when --clips is not given [default: 7]
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    num_clips: Option<u32>,

    /// Output file (default: timestamped file in the output folder)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Folder containing .mp4 clips
    #[arg(long, value_name = "DIR")]
    clips_dir: Option<PathBuf>,

    /// Folder containing .mp3 soundtracks
    #[arg(long, value_name = "DIR")]
    audio_dir: Option<PathBuf>,

    /// Usage history file
    #[arg(long, value_name = "FILE")]
    usage_file: Option<PathBuf>,

    /// Print the selection and exit without recording usage or rendering
    #[arg(long)]
    dry_run: bool,

    /// Write the effective folders and clip count to the config file and exit
    #[arg(long, conflicts_with = "dry_run")]
    save_defaults: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run_application(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

fn run_application(args: Args) -> Result<()> {
    let config = effective_config(&args, Config::load());

    if args.save_defaults {
        let path = Config::config_path()?;
        config.save_to(&path)?;
        println!("Saved defaults to {}", path.display());
        return Ok(());
    }

    let request = build_request(&args, &config);
    let mut generator = Generator::new(
        config.clips_dir,
        config.audio_dir,
        JsonUsageStore::new(config.usage_file),
        FfmpegTranscoder::new(config.ffmpeg, config.ffprobe),
    )
    .with_volume(config.audio_volume);

    if args.dry_run {
        let selection = generator.preview(&request)?;
        println!("=== Dry Run ===");
        println!("Clips folder: {}", generator.clips_dir().display());
        for clip in &selection.videos {
            println!("  {clip}");
        }
        println!("Audio folder: {}", generator.audio_dir().display());
        println!("  {}", selection.audio);
        println!("Output: {}", request.output.display());
        return Ok(());
    }

    let report = generator.generate(&request)?;
    println!("Successfully created: {}", report.output.display());
    Ok(())
}

/// Apply folder, history and count flags on top of the loaded config.
fn effective_config(args: &Args, config: Config) -> Config {
    Config {
        clips_dir: args.clips_dir.clone().unwrap_or(config.clips_dir),
        audio_dir: args.audio_dir.clone().unwrap_or(config.audio_dir),
        usage_file: args.usage_file.clone().unwrap_or(config.usage_file),
        num_clips: args.num_clips.map_or(config.num_clips, |n| n as usize),
        ..config
    }
}

fn build_request(args: &Args, config: &Config) -> GenerateRequest {
    GenerateRequest {
        output: args
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&config.output_dir)),
        num_clips: args
            .num_clips
            .map_or(config.num_clips, |n| n as usize),
        clips: args.clips.clone(),
        audio: args.audio.clone(),
    }
}

/// `<output_dir>/viral-clip-<yy-mm-dd-HH-MM-SS>.mp4`
fn default_output_path(output_dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%y-%m-%d-%H-%M-%S");
    output_dir.join(format!("viral-clip-{timestamp}.mp4"))
}
