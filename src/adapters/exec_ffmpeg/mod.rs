//! FFmpeg execution adapter
//!
//! Runs the `ffmpeg` binary as a subprocess for every transcoder operation.
//! All operations use stream copy; nothing is re-encoded.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::domain::errors::DomainError;
use crate::ports::TranscodePort;

/// FFmpeg-based transcoder
#[derive(Debug, Clone)]
pub struct FFmpegAdapter {
    ffmpeg_path: PathBuf,
}

impl FFmpegAdapter {
    /// Use an explicit binary
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Use the configured binary if it exists, otherwise search `PATH`
    pub fn locate(configured: Option<&Path>) -> Result<Self, DomainError> {
        if let Some(path) = configured {
            if path.is_file() {
                return Ok(Self::new(path));
            }
            tracing::warn!(
                "Configured ffmpeg not found at {}, searching PATH",
                path.display()
            );
        }

        which::which("ffmpeg").map(Self::new).map_err(|e| {
            DomainError::Transcoder(format!(
                "ffmpeg executable not found ({}). Install FFmpeg or set ffmpeg_path",
                e
            ))
        })
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }

    /// Run ffmpeg with the common flags prepended, surfacing stderr on failure
    fn run(&self, args: Vec<OsString>) -> Result<(), DomainError> {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(["-nostdin", "-hide_banner", "-loglevel", "error", "-y"])
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        debug!("FFmpeg command: {:?}", cmd);

        let output = cmd.output().map_err(|e| {
            DomainError::Transcoder(format!(
                "Failed to start {}: {}",
                self.ffmpeg_path.display(),
                e
            ))
        })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostic = if stderr.trim().is_empty() {
            format!("exited with {}", output.status)
        } else {
            stderr.trim().to_string()
        };
        Err(DomainError::Transcoder(format!("FFmpeg error: {}", diagnostic)))
    }

    /// Remux one or more staged streams into `output` with stream copy
    fn remux(&self, staged: &[PathBuf], output: &Path, faststart: bool) -> Result<(), DomainError> {
        let mut args: Vec<OsString> = Vec::new();

        // The list file must outlive the ffmpeg invocation
        let _list_file;
        match staged {
            [] => {
                return Err(DomainError::Transcoder(
                    "No staged streams to remux".to_string(),
                ))
            }
            [single] => {
                args.push("-i".into());
                args.push(single.into());
            }
            many => {
                let list_dir = output.parent().unwrap_or_else(|| Path::new("."));
                let list = write_concat_list(many, list_dir)?;
                args.extend(["-f", "concat", "-safe", "0", "-i"].map(OsString::from));
                args.push(list.path().into());
                _list_file = list;
            }
        }

        args.extend(["-c", "copy"].map(OsString::from));
        if faststart {
            args.extend(["-movflags", "+faststart"].map(OsString::from));
        }
        args.push(output.into());

        self.run(args)
    }
}

/// Write an ffmpeg concat-demuxer list naming every staged stream
fn write_concat_list(
    staged: &[PathBuf],
    dir: &Path,
) -> Result<tempfile::NamedTempFile, DomainError> {
    let mut list = tempfile::Builder::new()
        .prefix("concat-")
        .suffix(".txt")
        .tempfile_in(dir)
        .map_err(|e| DomainError::filesystem("Failed to create concat list", e))?;

    for path in staged {
        writeln!(list, "file '{}'", escape_concat_path(path))
            .map_err(|e| DomainError::filesystem("Failed to write concat list", e))?;
    }
    list.flush()
        .map_err(|e| DomainError::filesystem("Failed to write concat list", e))?;

    Ok(list)
}

/// Quote a path for the concat demuxer's single-quoted syntax
fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}

impl TranscodePort for FFmpegAdapter {
    fn remux_video(&self, staged: &[PathBuf], output: &Path) -> Result<(), DomainError> {
        self.remux(staged, output, true)
    }

    fn remux_audio(&self, staged: &[PathBuf], output: &Path) -> Result<(), DomainError> {
        self.remux(staged, output, false)
    }

    fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DomainError> {
        let args: Vec<OsString> = vec![
            "-i".into(),
            video.into(),
            "-i".into(),
            audio.into(),
            "-c".into(),
            "copy".into(),
            "-shortest".into(),
            output.into(),
        ];
        self.run(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_escape_concat_path() {
        assert_eq!(
            escape_concat_path(Path::new("/tmp/it's here.mp4")),
            r"/tmp/it'\''s here.mp4"
        );
    }

    #[test]
    fn test_concat_list_contents() {
        let dir = TempDir::new().unwrap();
        let staged = vec![dir.path().join("a.mp4"), dir.path().join("b.mp4")];
        let list = write_concat_list(&staged, dir.path()).unwrap();

        let contents = fs::read_to_string(list.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("file '"));
        assert!(lines[0].ends_with("a.mp4'"));
        assert!(lines[1].ends_with("b.mp4'"));
    }

    #[test]
    fn test_remux_requires_input() {
        let adapter = FFmpegAdapter::new("ffmpeg");
        let err = adapter
            .remux_video(&[], Path::new("/tmp/out.mp4"))
            .unwrap_err();
        assert!(matches!(err, DomainError::Transcoder(_)));
    }

    #[test]
    fn test_missing_binary_is_transcoder_error() {
        let adapter = FFmpegAdapter::new("/nonexistent/ffmpeg_xyz_12345");
        let err = adapter
            .mux(Path::new("v.mp4"), Path::new("a.mp4"), Path::new("out.mp4"))
            .unwrap_err();
        match err {
            DomainError::Transcoder(message) => assert!(message.contains("Failed to start")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
