// Scan interactor - Discovers clip recordings under recording roots

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::domain::errors::DomainError;
use crate::domain::model::{ClipRecording, MediaType, SegmentManifest, MANIFEST_FILE};
use crate::domain::rules::is_owner_id;
use crate::ports::RecordPathPort;
use crate::utils::Utils;

/// Manual clips, relative to an owner directory
const DEFAULT_CLIPS_DIR: [&str; 2] = ["gamerecordings", "clips"];
/// Background recordings, relative to an owner directory
const DEFAULT_VIDEO_DIR: [&str; 2] = ["gamerecordings", "video"];

/// Which clips a scan should surface
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    pub owner_id: Option<String>,
    pub media_type: MediaType,
    pub game_id: Option<String>,
}

impl ScanFilter {
    fn accepts_folder_name(&self, name: &str) -> bool {
        match &self.game_id {
            Some(game_id) => name.contains(&format!("_{}_", game_id)),
            None => true,
        }
    }
}

/// Walks recording roots and groups segment files into clip records
pub struct ClipScanner {
    record_paths: Arc<dyn RecordPathPort>,
}

impl ClipScanner {
    pub fn new(record_paths: Arc<dyn RecordPathPort>) -> Self {
        Self { record_paths }
    }

    /// Scan every root, newest clips first
    ///
    /// An unreadable root or media directory is logged and skipped. Roots and
    /// media directories reached twice (symlinks, a custom path pointing at the
    /// default layout, a path shared by owners) are scanned once.
    pub fn scan(&self, roots: &[PathBuf], filter: &ScanFilter) -> Vec<ClipRecording> {
        let mut clips = Vec::new();
        let mut seen_roots = HashSet::new();
        let mut seen_media_dirs = HashSet::new();

        for root in roots {
            if !seen_roots.insert(Utils::canonical_path(root)) {
                debug!("Skipping {}: already scanned", root.display());
                continue;
            }

            let owners = match self.owner_ids(root, filter) {
                Ok(owners) => owners,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };

            for owner_id in owners {
                let owner_dir = root.join(&owner_id);
                for media_dir in self.media_dirs(&owner_dir, filter.media_type) {
                    if !seen_media_dirs.insert(Utils::canonical_path(&media_dir)) {
                        debug!("Skipping {}: already scanned", media_dir.display());
                        continue;
                    }
                    if let Err(e) = self.scan_media_dir(&media_dir, &owner_id, filter, &mut clips) {
                        warn!("{}", e);
                    }
                }
            }
        }

        let mut clips = dedup_by_folder(clips);

        // Stable sort keeps discovery order for equal (or unknown) timestamps
        clips.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        info!("Discovered {} clips", clips.len());
        clips
    }

    fn owner_ids(&self, root: &Path, filter: &ScanFilter) -> Result<Vec<String>, DomainError> {
        if let Some(owner_id) = &filter.owner_id {
            return Ok(vec![owner_id.clone()]);
        }

        let entries = fs::read_dir(root).map_err(|e| DomainError::discovery(root, e))?;
        let mut owners: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| is_owner_id(name))
            .collect();
        owners.sort();
        Ok(owners)
    }

    /// Existing media directories for one owner, default layout first
    fn media_dirs(&self, owner_dir: &Path, media_type: MediaType) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        let clips: PathBuf = DEFAULT_CLIPS_DIR.iter().collect();
        let video: PathBuf = DEFAULT_VIDEO_DIR.iter().collect();

        push_media_dirs(&mut dirs, &owner_dir.join(clips), &owner_dir.join(video), media_type);

        if let Some(custom) = self.record_paths.custom_record_path(owner_dir) {
            debug!("Custom record path for {}: {}", owner_dir.display(), custom.display());
            push_media_dirs(&mut dirs, &custom.join("clips"), &custom.join("video"), media_type);
        }

        dirs
    }

    fn scan_media_dir(
        &self,
        media_dir: &Path,
        owner_id: &str,
        filter: &ScanFilter,
        clips: &mut Vec<ClipRecording>,
    ) -> Result<(), DomainError> {
        let entries = fs::read_dir(media_dir).map_err(|e| DomainError::discovery(media_dir, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| DomainError::discovery(media_dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.contains('_') || !entry.path().is_dir() {
                continue;
            }
            if !filter.accepts_folder_name(&name) {
                continue;
            }

            let manifests = find_manifests(&entry.path());
            if manifests.is_empty() {
                debug!("Skipping {}: no {}", entry.path().display(), MANIFEST_FILE);
                continue;
            }

            clips.push(ClipRecording::from_folder(entry.path(), owner_id, manifests));
        }

        Ok(())
    }
}

fn push_media_dirs(dirs: &mut Vec<PathBuf>, clips: &Path, video: &Path, media_type: MediaType) {
    if media_type.includes_manual() && clips.is_dir() {
        dirs.push(clips.to_path_buf());
    }
    if media_type.includes_background() && video.is_dir() {
        dirs.push(video.to_path_buf());
    }
}

/// Drop clips whose folder resolves to one already listed, keeping the first
pub fn dedup_by_folder(clips: Vec<ClipRecording>) -> Vec<ClipRecording> {
    let mut seen = HashSet::with_capacity(clips.len());
    clips
        .into_iter()
        .filter(|clip| {
            let first = seen.insert(Utils::canonical_path(&clip.folder_path));
            if !first {
                debug!("Dropping duplicate clip {}", clip.folder_path.display());
            }
            first
        })
        .collect()
}

/// Every directory under `clip_folder` holding a manifest marker, sorted by path
pub fn find_manifests(clip_folder: &Path) -> Vec<SegmentManifest> {
    let mut directories: Vec<PathBuf> = WalkDir::new(clip_folder)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE)
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect();
    directories.sort();
    directories.into_iter().map(SegmentManifest::new).collect()
}
