// Domain models - Core types and data structures

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::errors::DomainError;
use crate::domain::rules::{parse_clip_folder_name, UNKNOWN_GAME_ID};


/// Marker file confirming a directory holds a recording session
pub const MANIFEST_FILE: &str = "session.mpd";

/// Extension shared by initialization and chunk segments
pub const SEGMENT_EXTENSION: &str = "m4s";

/// Container extension of exported files
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Which recording subtrees a scan should visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Manual clips and background recordings
    #[default]
    All,
    /// Clips saved explicitly by the player
    Manual,
    /// Background recording timeline
    Background,
}

impl MediaType {
    pub fn includes_manual(self) -> bool {
        matches!(self, MediaType::All | MediaType::Manual)
    }

    pub fn includes_background(self) -> bool {
        matches!(self, MediaType::All | MediaType::Background)
    }
}

impl FromStr for MediaType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(MediaType::All),
            "manual" => Ok(MediaType::Manual),
            "background" => Ok(MediaType::Background),
            other => Err(DomainError::Config(format!(
                "Invalid media type: {}. Valid types: all, manual, background",
                other
            ))),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaType::All => "all",
            MediaType::Manual => "manual",
            MediaType::Background => "background",
        };
        f.write_str(name)
    }
}

/// Elementary stream carried by a segment file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    /// Stream number used in segment file names
    pub fn index(self) -> u8 {
        match self {
            StreamKind::Video => 0,
            StreamKind::Audio => 1,
        }
    }

    pub fn init_file_name(self) -> String {
        format!("init-stream{}.{}", self.index(), SEGMENT_EXTENSION)
    }

    fn chunk_prefix(self) -> String {
        format!("chunk-stream{}-", self.index())
    }

    /// Whether `file_name` is a numbered chunk of this stream
    pub fn matches_chunk(self, file_name: &str) -> bool {
        file_name.starts_with(&self.chunk_prefix())
            && Path::new(file_name)
                .extension()
                .is_some_and(|ext| ext == SEGMENT_EXTENSION)
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Video => f.write_str("video"),
            StreamKind::Audio => f.write_str("audio"),
        }
    }
}

/// One recording session inside a clip folder
///
/// Segment paths are derived on demand from `directory`; nothing beyond the
/// directory itself is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentManifest {
    pub directory: PathBuf,
}

impl SegmentManifest {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn init_segment(&self, kind: StreamKind) -> PathBuf {
        self.directory.join(kind.init_file_name())
    }

    pub fn init_video(&self) -> PathBuf {
        self.init_segment(StreamKind::Video)
    }

    pub fn init_audio(&self) -> PathBuf {
        self.init_segment(StreamKind::Audio)
    }

    /// A manifest is usable only when both initialization segments exist
    pub fn has_init_segments(&self) -> bool {
        self.init_video().is_file() && self.init_audio().is_file()
    }

    /// Numbered chunks of one stream, sorted by file name
    pub fn chunk_segments(&self, kind: StreamKind) -> io::Result<Vec<PathBuf>> {
        let mut chunks = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if kind.matches_chunk(&entry.file_name().to_string_lossy()) {
                chunks.push(entry.path());
            }
        }
        chunks.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(chunks)
    }

    /// Initialization segment followed by every chunk, in concatenation order
    pub fn stream_segments(&self, kind: StreamKind) -> io::Result<Vec<PathBuf>> {
        let mut segments = vec![self.init_segment(kind)];
        segments.extend(self.chunk_segments(kind)?);
        Ok(segments)
    }
}

/// One logical recording discovered on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClipRecording {
    pub folder_path: PathBuf,
    pub owner_id: String,
    pub game_id: String,
    /// `None` when the folder name carries no parseable timestamp; sorts earliest
    pub timestamp: Option<NaiveDateTime>,
    pub manifests: Vec<SegmentManifest>,
}

impl ClipRecording {
    /// Build a record from a clip folder, tolerating malformed folder names
    pub fn from_folder(
        folder_path: impl Into<PathBuf>,
        owner_id: impl Into<String>,
        manifests: Vec<SegmentManifest>,
    ) -> Self {
        let folder_path = folder_path.into();
        let folder_name = folder_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (game_id, timestamp) = match parse_clip_folder_name(&folder_name) {
            Ok(parsed) => (parsed.game_id, Some(parsed.timestamp)),
            Err(_) => (UNKNOWN_GAME_ID.to_string(), None),
        };

        Self {
            folder_path,
            owner_id: owner_id.into(),
            game_id,
            timestamp,
            manifests,
        }
    }

    pub fn folder_name(&self) -> String {
        self.folder_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.folder_path.to_string_lossy().into_owned())
    }
}

/// Result category of one conversion attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConversionStatus {
    Converted,
    AlreadyConverted,
    Failed,
}

/// Result of attempting to convert one clip; never mutated after creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionOutcome {
    pub status: ConversionStatus,
    pub output_path: Option<PathBuf>,
    pub message: String,
}

impl ConversionOutcome {
    pub fn converted(output_path: PathBuf) -> Self {
        let message = format!("Successfully converted: {}", display_name(&output_path));
        Self {
            status: ConversionStatus::Converted,
            output_path: Some(output_path),
            message,
        }
    }

    pub fn already_converted(output_path: PathBuf) -> Self {
        let message = format!("Already converted: {}", display_name(&output_path));
        Self {
            status: ConversionStatus::AlreadyConverted,
            output_path: Some(output_path),
            message,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: ConversionStatus::Failed,
            output_path: None,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status != ConversionStatus::Failed
    }
}

impl From<DomainError> for ConversionOutcome {
    fn from(err: DomainError) -> Self {
        ConversionOutcome::failed(err.to_string())
    }
}

/// Aggregate over one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    /// Clip folders that converted or were already converted
    pub successful: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub total: usize,
    /// Output files of successful clips, new or pre-existing
    pub outputs: Vec<PathBuf>,
    /// Source folders removed after the batch settled
    pub deleted: Vec<PathBuf>,
}

impl BatchResult {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, folder: PathBuf, outcome: &ConversionOutcome) {
        if outcome.is_success() {
            self.successful.push(folder);
            self.outputs.extend(outcome.output_path.clone());
        } else {
            self.failed.push((folder, outcome.message.clone()));
        }
    }

    /// Every submitted clip has been accounted for
    pub fn is_settled(&self) -> bool {
        self.successful.len() + self.failed.len() == self.total
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Aggregate over one cleanup-only run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deleted: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, String)>,
    pub total: usize,
}

impl CleanupReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
