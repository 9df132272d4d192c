use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Isolated environment: no user config, no network, no log files
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("userdata")).unwrap();
        fs::create_dir_all(dir.path().join("cache")).unwrap();
        fs::write(dir.path().join("config.toml"), "[exporter]\n").unwrap();
        Self { dir }
    }

    fn userdata(&self) -> PathBuf {
        self.dir.path().join("userdata")
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn add_clip(&self, owner: &str, folder: &str) -> PathBuf {
        let clip = self
            .userdata()
            .join(owner)
            .join("gamerecordings/clips")
            .join(folder);
        let session = clip.join("video").join(folder);
        fs::create_dir_all(&session).unwrap();
        for file in ["session.mpd", "init-stream0.m4s", "init-stream1.m4s", "chunk-stream0-00001.m4s"] {
            fs::write(session.join(file), b"data").unwrap();
        }
        clip
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("clip-exporter").unwrap();
        cmd.env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.dir.path().join("config.toml"))
            .arg("--cache-dir")
            .arg(self.dir.path().join("cache"))
            .arg("--output")
            .arg(self.output())
            .arg("--offline")
            .arg("--no-log-file")
            .arg("--log-level")
            .arg("error");
        cmd
    }

    fn cmd_with_userdata(&self, subcommand: &str) -> Command {
        let mut cmd = self.cmd();
        cmd.arg(subcommand).arg("--userdata-path").arg(self.userdata());
        cmd
    }
}

fn mp4_count(dir: &Path) -> usize {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "mp4"))
                .count()
        })
        .unwrap_or(0)
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("clip-exporter")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("cleanup"))
        .stdout(predicate::str::contains("detect-paths"));
}

#[test]
fn test_list_shows_newest_first() {
    let sandbox = Sandbox::new();
    sandbox.add_clip("42", "clip_570_20240101_153000");
    sandbox.add_clip("42", "clip_730_20240202_101010");

    sandbox
        .cmd_with_userdata("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 clips"))
        .stdout(predicate::str::is_match(r"(?s)Game_730 - 2024-02-02 10:10:10.*Game_570 - 2024-01-01 15:30:00").unwrap());
}

#[test]
fn test_list_json() {
    let sandbox = Sandbox::new();
    sandbox.add_clip("42", "clip_570_20240101_153000");

    let output = sandbox
        .cmd_with_userdata("list")
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries[0]["index"], 1);
    assert_eq!(entries[0]["game_id"], "570");
    assert_eq!(entries[0]["game_name"], "Game_570");
    assert_eq!(entries[0]["owner_id"], "42");
    assert_eq!(entries[0]["timestamp"], "2024-01-01 15:30:00");
}

#[test]
fn test_list_without_clips_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd_with_userdata("list")
        .assert()
        .failure()
        .stdout(predicate::str::contains("No clips found"));
}

#[test]
fn test_missing_userdata_path_is_reported() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("list")
        .arg("--userdata-path")
        .arg(sandbox.dir.path().join("nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("userdata folder not found"));
}

#[test]
fn test_convert_without_matching_clips_fails_without_ffmpeg() {
    let sandbox = Sandbox::new();
    sandbox.add_clip("42", "clip_570_20240101_153000");

    sandbox
        .cmd_with_userdata("convert")
        .arg("--game-id")
        .arg("999")
        .assert()
        .failure()
        .stdout(predicate::str::contains("No clips found"));
    assert_eq!(mp4_count(&sandbox.output()), 0);
}

#[test]
fn test_cleanup_deletes_only_converted_sources() {
    let sandbox = Sandbox::new();
    let converted = sandbox.add_clip("42", "clip_570_20240101_153000");
    let pending = sandbox.add_clip("42", "clip_570_20240102_153000");
    fs::create_dir_all(sandbox.output()).unwrap();
    fs::write(sandbox.output().join("Game_570_2024-01-01_15-30-00.mp4"), b"mp4").unwrap();

    sandbox
        .cmd_with_userdata("cleanup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted: 1/2"))
        .stdout(predicate::str::contains("No converted file found"));

    assert!(!converted.exists());
    assert!(pending.exists());
}

#[test]
fn test_invalid_log_level_is_rejected() {
    let sandbox = Sandbox::new();
    Command::cargo_bin("clip-exporter")
        .unwrap()
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(sandbox.dir.path().join("config.toml"))
        .arg("--no-log-file")
        .arg("--log-level")
        .arg("loud")
        .arg("detect-paths")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid log level"));
}
