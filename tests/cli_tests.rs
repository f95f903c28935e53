//! Exit status and error reporting of the `viral-clips` binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run the binary inside `dir` with an isolated config home
fn run_cli(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_viral-clips"))
        .args(args)
        .current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch viral-clips")
}

fn setup_media(dir: &Path) {
    fs::create_dir(dir.join("clips")).unwrap();
    fs::create_dir(dir.join("audio")).unwrap();
    fs::write(dir.join("clips").join("a.mp4"), b"").unwrap();
    fs::write(dir.join("clips").join("b.mp4"), b"").unwrap();
    fs::write(dir.join("audio").join("song.mp3"), b"").unwrap();
}

#[test]
fn test_missing_clips_folder_reports_error() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_cli(temp_dir.path(), &[]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Video folder 'clips' does not exist"));
    assert!(!temp_dir.path().join("clip_usage.json").exists());
}

#[test]
fn test_clips_path_is_a_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("clips"), b"").unwrap();

    let output = run_cli(temp_dir.path(), &[]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Video path 'clips' is not a directory"));
}

#[test]
fn test_unknown_clip_exits_non_zero_without_history() {
    let temp_dir = TempDir::new().unwrap();
    setup_media(temp_dir.path());

    let output = run_cli(temp_dir.path(), &["--clips", "a.mp4", "nope.mp4"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Specified file 'nope.mp4' not found in clips"));
    assert!(!temp_dir.path().join("clip_usage.json").exists());
}

#[test]
fn test_dry_run_prints_selection_only() {
    let temp_dir = TempDir::new().unwrap();
    setup_media(temp_dir.path());

    let output = run_cli(
        temp_dir.path(),
        &["--dry-run", "--num-clips", "2", "--output", "out.mp4"],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== Dry Run ==="));
    assert!(stdout.contains("  a.mp4"));
    assert!(stdout.contains("  b.mp4"));
    assert!(stdout.contains("  song.mp3"));
    assert!(stdout.contains("Output: out.mp4"));
    assert!(!temp_dir.path().join("clip_usage.json").exists());
}

#[test]
fn test_custom_folders_and_usage_file() {
    let temp_dir = TempDir::new().unwrap();
    let media = temp_dir.path().join("media");
    fs::create_dir(&media).unwrap();
    setup_media(&media);

    let output = run_cli(
        temp_dir.path(),
        &[
            "--clips-dir",
            "media/clips",
            "--audio-dir",
            "media/audio",
            "--usage-file",
            "state/usage.json",
            "--dry-run",
        ],
    );

    assert!(output.status.success());
    assert!(!temp_dir.path().join("state").join("usage.json").exists());
}

#[test]
fn test_zero_clips_is_rejected_by_parser() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_cli(temp_dir.path(), &["--num-clips", "0"]);

    assert!(!output.status.success());
}

#[test]
fn test_zero_clips_in_config_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    setup_media(temp_dir.path());
    let config_dir = temp_dir.path().join(".config").join("viral-clips");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.json"), r#"{"num_clips": 0}"#).unwrap();

    let output = run_cli(temp_dir.path(), &["--dry-run"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("  a.mp4"));
    assert!(stdout.contains("  b.mp4"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("num_clips must be at least 1"));
}

#[test]
fn test_save_defaults_writes_config_file() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_cli(
        temp_dir.path(),
        &["--save-defaults", "--num-clips", "3", "--clips-dir", "footage"],
    );

    assert!(output.status.success());
    let config_file = temp_dir
        .path()
        .join(".config")
        .join("viral-clips")
        .join("config.json");
    let contents = fs::read_to_string(config_file).unwrap();
    assert!(contents.contains("\"num_clips\": 3"));
    assert!(contents.contains("\"clips_dir\": \"footage\""));
    assert!(!temp_dir.path().join("clip_usage.json").exists());
}

#[test]
fn test_piped_logs_have_no_color_codes() {
    let temp_dir = TempDir::new().unwrap();
    setup_media(temp_dir.path());

    let output = run_cli(temp_dir.path(), &["--verbose", "--dry-run"]);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.is_empty());
    assert!(!stderr.contains('\u{1b}'));
}
