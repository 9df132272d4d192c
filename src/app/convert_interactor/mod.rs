// Convert interactor - Rebuilds one clip's streams and muxes the final file

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::app::output_resolver::{OutputArbiter, OutputResolver};
use crate::domain::errors::DomainError;
use crate::domain::model::{ClipRecording, ConversionOutcome, SegmentManifest, StreamKind};
use crate::domain::rules::output_file_name;
use crate::ports::TranscodePort;

/// Prefix of the per-conversion scratch directory inside the output directory
pub const WORKSPACE_PREFIX: &str = ".clip-export-";

/// Idle time after which a workspace is treated as left behind by a killed run
pub const STALE_WORKSPACE_AGE: Duration = Duration::from_secs(60 * 60);

/// Converts single clips; safe to share between workers converting distinct clips
pub struct ConversionEngine {
    resolver: OutputResolver,
    transcoder: Arc<dyn TranscodePort>,
    arbiter: OutputArbiter,
}

impl ConversionEngine {
    pub fn new(resolver: OutputResolver, transcoder: Arc<dyn TranscodePort>) -> Self {
        Self {
            resolver,
            transcoder,
            arbiter: OutputArbiter::new(),
        }
    }

    pub fn resolver(&self) -> &OutputResolver {
        &self.resolver
    }

    /// Convert one clip into `output_dir`
    ///
    /// Never returns an error: every failure is captured in the outcome. The
    /// scratch workspace is removed before this returns, whatever happened.
    pub fn convert(&self, clip: &ClipRecording, output_dir: &Path) -> ConversionOutcome {
        if let Some(existing) = self.resolver.find_existing_output(clip, output_dir) {
            info!(clip = %clip.folder_path.display(), "Already converted: {}", existing.display());
            return ConversionOutcome::already_converted(existing);
        }

        match self.convert_clip(clip, output_dir) {
            Ok(output) => {
                info!(clip = %clip.folder_path.display(), "Converted to {}", output.display());
                ConversionOutcome::converted(output)
            }
            Err(e) => {
                error!(clip = %clip.folder_path.display(), "Conversion failed: {}", e);
                ConversionOutcome::failed(format!("Error processing {}: {}", clip.folder_name(), e))
            }
        }
    }

    fn convert_clip(&self, clip: &ClipRecording, output_dir: &Path) -> Result<PathBuf, DomainError> {
        if clip.manifests.is_empty() {
            return Err(DomainError::NoManifest(clip.folder_path.clone()));
        }
        if let Some(manifest) = clip.manifests.iter().find(|m| !m.has_init_segments()) {
            return Err(DomainError::Manifest {
                directory: manifest.directory.clone(),
            });
        }

        let workspace = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(output_dir)
            .map_err(|e| DomainError::filesystem("Failed to create temporary workspace", e))?;
        debug!("Workspace for {}: {}", clip.folder_name(), workspace.path().display());

        let staged_video = stage_streams(&clip.manifests, StreamKind::Video, &workspace)?;
        let staged_audio = stage_streams(&clip.manifests, StreamKind::Audio, &workspace)?;

        let video = workspace.path().join("video.mp4");
        let audio = workspace.path().join("audio.mp4");
        self.transcoder.remux_video(&staged_video, &video)?;
        self.transcoder.remux_audio(&staged_audio, &audio)?;

        let muxed = tempfile::Builder::new()
            .prefix("muxed-")
            .suffix(".mp4")
            .tempfile_in(workspace.path())
            .map_err(|e| DomainError::filesystem("Failed to create output file", e))?;
        self.transcoder.mux(&video, &audio, muxed.path())?;
        verify_output(muxed.path())?;

        let file_name = output_file_name(&self.resolver.base_name(clip));
        let reservation = self.arbiter.reserve(output_dir, &file_name);
        muxed.persist_noclobber(reservation.path()).map_err(|e| {
            DomainError::filesystem(
                &format!("Failed to move output to {}", reservation.path().display()),
                e.error,
            )
        })?;

        Ok(reservation.path().to_path_buf())
    }
}

/// Concatenate each manifest's init segment and chunks for one stream
///
/// Produces one staged file per manifest, in manifest order.
fn stage_streams(
    manifests: &[SegmentManifest],
    kind: StreamKind,
    workspace: &TempDir,
) -> Result<Vec<PathBuf>, DomainError> {
    manifests
        .iter()
        .enumerate()
        .map(|(i, manifest)| {
            let staged = workspace.path().join(format!("{}-{}.mp4", kind, i));
            let segments = manifest.stream_segments(kind).map_err(|e| {
                DomainError::filesystem(
                    &format!("Cannot list segments in {}", manifest.directory.display()),
                    e,
                )
            })?;
            concatenate(&segments, &staged).map_err(|e| {
                DomainError::filesystem(&format!("Failed to stage {} stream", kind), e)
            })?;
            debug!("Staged {} segments into {}", segments.len(), staged.display());
            Ok(staged)
        })
        .collect()
}

fn concatenate(segments: &[PathBuf], output: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(output)?);
    for segment in segments {
        let mut reader = File::open(segment)?;
        io::copy(&mut reader, &mut writer)?;
    }
    writer.flush()
}

fn verify_output(path: &Path) -> Result<(), DomainError> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(DomainError::Transcoder(
            "Output file was not created or is empty".to_string(),
        )),
    }
}

/// Remove workspaces in `output_dir` that have been idle for at least `max_age`
///
/// Idle time is measured from the newest entry inside the workspace, so a
/// conversion still writing into one keeps it. Returns how many were removed.
pub fn sweep_stale_workspaces(output_dir: &Path, max_age: Duration) -> usize {
    let Ok(entries) = fs::read_dir(output_dir) else {
        return 0;
    };

    let now = SystemTime::now();
    let mut removed = 0;
    for entry in entries.filter_map(Result::ok) {
        let is_workspace = entry.file_name().to_string_lossy().starts_with(WORKSPACE_PREFIX)
            && entry.file_type().is_ok_and(|kind| kind.is_dir());
        if !is_workspace {
            continue;
        }

        let path = entry.path();
        let idle = last_modified(&path)
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if idle < max_age {
            debug!("Keeping workspace {} (idle {:?})", path.display(), idle);
            continue;
        }

        match fs::remove_dir_all(&path) {
            Ok(()) => {
                info!("Removed stale workspace {}", path.display());
                removed += 1;
            }
            Err(e) => warn!("Failed to remove stale workspace {}: {}", path.display(), e),
        }
    }
    removed
}

fn last_modified(dir: &Path) -> Option<SystemTime> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter_map(|entry| entry.metadata().ok()?.modified().ok())
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::GameNamePort;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct EchoNames;

    impl GameNamePort for EchoNames {
        fn game_name(&self, game_id: &str) -> String {
            format!("Game_{}", game_id)
        }
    }

    /// Copies inputs into outputs so staged bytes can be inspected
    #[derive(Default)]
    struct CopyTranscoder {
        calls: AtomicUsize,
        staged: Mutex<Vec<Vec<u8>>>,
        empty_mux: bool,
    }

    impl CopyTranscoder {
        fn remux(&self, staged: &[PathBuf], output: &Path) -> Result<(), DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut bytes = Vec::new();
            for path in staged {
                bytes.extend(fs::read(path).unwrap());
            }
            self.staged.lock().unwrap().push(bytes.clone());
            fs::write(output, bytes).unwrap();
            Ok(())
        }
    }

    impl TranscodePort for CopyTranscoder {
        fn remux_video(&self, staged: &[PathBuf], output: &Path) -> Result<(), DomainError> {
            self.remux(staged, output)
        }

        fn remux_audio(&self, staged: &[PathBuf], output: &Path) -> Result<(), DomainError> {
            self.remux(staged, output)
        }

        fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.empty_mux {
                return Ok(());
            }
            let mut bytes = fs::read(video).unwrap();
            bytes.extend(fs::read(audio).unwrap());
            fs::write(output, bytes).unwrap();
            Ok(())
        }
    }

    fn write_manifest(dir: &Path, video_chunks: &[&str], audio_chunks: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("session.mpd"), b"<MPD/>").unwrap();
        fs::write(dir.join("init-stream0.m4s"), b"V").unwrap();
        fs::write(dir.join("init-stream1.m4s"), b"A").unwrap();
        for chunk in video_chunks {
            fs::write(dir.join(format!("chunk-stream0-{}.m4s", chunk)), chunk.as_bytes()).unwrap();
        }
        for chunk in audio_chunks {
            fs::write(dir.join(format!("chunk-stream1-{}.m4s", chunk)), chunk.as_bytes()).unwrap();
        }
    }

    fn engine(transcoder: Arc<CopyTranscoder>) -> ConversionEngine {
        ConversionEngine::new(OutputResolver::new(Arc::new(EchoNames)), transcoder)
    }

    fn workspaces_left(output_dir: &Path) -> usize {
        fs::read_dir(output_dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(WORKSPACE_PREFIX))
            .count()
    }

    #[test]
    fn test_stages_segments_in_name_order() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let folder = src.path().join("clip_42_20240101_120000");
        let session = folder.join("video").join("bg_42_20240101_120000");
        write_manifest(&session, &["00002", "00001"], &["00001"]);

        let transcoder = Arc::new(CopyTranscoder::default());
        let clip = ClipRecording::from_folder(&folder, "1", vec![SegmentManifest::new(&session)]);
        let outcome = engine(transcoder.clone()).convert(&clip, out.path());

        assert!(outcome.is_success(), "{}", outcome.message);
        let staged = transcoder.staged.lock().unwrap().clone();
        assert_eq!(staged, vec![b"V0000100002".to_vec(), b"A00001".to_vec()]);
        assert_eq!(transcoder.calls.load(Ordering::SeqCst), 3);

        let output = outcome.output_path.unwrap();
        assert_eq!(output, out.path().join("Game_42_2024-01-01_12-00-00.mp4"));
        assert_eq!(fs::read(&output).unwrap(), b"V0000100002A00001");
        assert_eq!(workspaces_left(out.path()), 0);
    }

    #[test]
    fn test_missing_init_fails_before_transcoding() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let folder = src.path().join("clip_42_20240101_120000");
        let session = folder.join("s");
        write_manifest(&session, &["00001"], &[]);
        fs::remove_file(session.join("init-stream1.m4s")).unwrap();

        let transcoder = Arc::new(CopyTranscoder::default());
        let clip = ClipRecording::from_folder(&folder, "1", vec![SegmentManifest::new(&session)]);
        let outcome = engine(transcoder.clone()).convert(&clip, out.path());

        assert!(!outcome.is_success());
        assert!(outcome.message.contains(&session.display().to_string()));
        assert_eq!(transcoder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(workspaces_left(out.path()), 0);
    }

    #[test]
    fn test_empty_mux_output_is_a_failure() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let folder = src.path().join("clip_42_20240101_120000");
        write_manifest(&folder.join("s"), &[], &[]);

        let transcoder = Arc::new(CopyTranscoder {
            empty_mux: true,
            ..CopyTranscoder::default()
        });
        let clip = ClipRecording::from_folder(&folder, "1", vec![SegmentManifest::new(folder.join("s"))]);
        let outcome = engine(transcoder).convert(&clip, out.path());

        assert!(!outcome.is_success());
        assert!(outcome.message.contains("empty"));
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_no_manifests_is_a_failure() {
        let out = tempfile::tempdir().unwrap();
        let clip = ClipRecording::from_folder("/nowhere/clip_42_20240101_120000", "1", vec![]);
        let outcome = engine(Arc::new(CopyTranscoder::default())).convert(&clip, out.path());
        assert!(outcome.message.contains("No session.mpd files found"));
    }

    #[test]
    fn test_sweep_removes_only_idle_workspaces() {
        let out = tempfile::tempdir().unwrap();
        let workspace = out.path().join(format!("{}abc", WORKSPACE_PREFIX));
        fs::create_dir_all(&workspace).unwrap();
        fs::write(workspace.join("video-0.mp4"), b"partial").unwrap();
        fs::create_dir(out.path().join("keep")).unwrap();
        fs::write(out.path().join(format!("{}file", WORKSPACE_PREFIX)), b"x").unwrap();

        assert_eq!(sweep_stale_workspaces(out.path(), STALE_WORKSPACE_AGE), 0);
        assert!(workspace.exists());

        assert_eq!(sweep_stale_workspaces(out.path(), Duration::ZERO), 1);
        assert!(!workspace.exists());
        assert!(out.path().join("keep").is_dir());
        assert!(out.path().join(format!("{}file", WORKSPACE_PREFIX)).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_sweep_removes_workspace_idle_for_hours() {
        let out = tempfile::tempdir().unwrap();
        let workspace = out.path().join(format!("{}old", WORKSPACE_PREFIX));
        fs::create_dir_all(&workspace).unwrap();
        fs::write(workspace.join("audio-0.mp4"), b"partial").unwrap();

        let old = SystemTime::now() - Duration::from_secs(3 * 60 * 60);
        File::options()
            .write(true)
            .open(workspace.join("audio-0.mp4"))
            .unwrap()
            .set_modified(old)
            .unwrap();
        File::open(&workspace).unwrap().set_modified(old).unwrap();

        assert_eq!(sweep_stale_workspaces(out.path(), STALE_WORKSPACE_AGE), 1);
        assert_eq!(workspaces_left(out.path()), 0);
    }

    #[test]
    fn test_sweep_tolerates_missing_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(sweep_stale_workspaces(&tmp.path().join("missing"), Duration::ZERO), 0);
    }
}
