// Cleanup interactor - Safety-checked source deletion and reconcile-only runs

use std::fs;
use std::io;
use std::path::Path;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::app::output_resolver::OutputResolver;
use crate::domain::errors::DomainError;
use crate::domain::model::{CleanupReport, ClipRecording, MANIFEST_FILE, SEGMENT_EXTENSION};

/// What happened to a source folder on a deletion request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Someone else removed it first
    AlreadyAbsent,
    /// The folder holds no recording files, so it was left alone
    Refused,
}

/// Whether `folder` still looks like a recording: a manifest or segment somewhere inside
pub fn contains_recording_files(folder: &Path) -> bool {
    WalkDir::new(folder)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .any(|entry| {
            entry.file_name() == MANIFEST_FILE
                || entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == SEGMENT_EXTENSION)
        })
}

/// Recursively delete a clip source folder after the safety check
pub fn delete_source_folder(folder: &Path) -> Result<DeleteOutcome, DomainError> {
    if !folder.exists() {
        return Ok(DeleteOutcome::AlreadyAbsent);
    }
    if !contains_recording_files(folder) {
        return Ok(DeleteOutcome::Refused);
    }

    match fs::remove_dir_all(folder) {
        Ok(()) => {
            info!("Deleted source folder {}", folder.display());
            Ok(DeleteOutcome::Deleted)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DeleteOutcome::AlreadyAbsent),
        Err(e) => Err(DomainError::filesystem(
            &format!("Cannot delete {}", folder.display()),
            e,
        )),
    }
}

/// Deletes sources whose converted output already exists; converts nothing
pub struct CleanupReconciler {
    resolver: OutputResolver,
}

impl CleanupReconciler {
    pub fn new(resolver: OutputResolver) -> Self {
        Self { resolver }
    }

    pub fn reconcile(&self, clips: &[ClipRecording], output_dir: &Path) -> CleanupReport {
        let mut report = CleanupReport::new(clips.len());

        for clip in clips {
            let folder = clip.folder_path.clone();
            if self.resolver.find_existing_output(clip, output_dir).is_none() {
                report.skipped.push((folder, "No converted file found".to_string()));
                continue;
            }

            match delete_source_folder(&folder) {
                Ok(DeleteOutcome::Deleted) | Ok(DeleteOutcome::AlreadyAbsent) => {
                    report.deleted.push(folder)
                }
                Ok(DeleteOutcome::Refused) => {
                    warn!("Refused to delete {}", folder.display());
                    report.skipped.push((
                        folder,
                        "Refused to delete: no recording files found".to_string(),
                    ));
                }
                Err(e) => {
                    warn!("{}", e);
                    report
                        .skipped
                        .push((folder, format!("Failed to delete source: {}", e)));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_refuses_folder_without_recording_files() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("clip_1_20240101_000000");
        fs::create_dir_all(folder.join("nested")).unwrap();
        fs::write(folder.join("nested/notes.txt"), b"keep me").unwrap();

        assert_eq!(delete_source_folder(&folder).unwrap(), DeleteOutcome::Refused);
        assert!(folder.join("nested/notes.txt").exists());
    }

    #[test]
    fn test_deletes_folder_with_segments() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("clip_1_20240101_000000");
        fs::create_dir_all(folder.join("s")).unwrap();
        fs::write(folder.join("s/chunk-stream0-00001.m4s"), b"x").unwrap();

        assert_eq!(delete_source_folder(&folder).unwrap(), DeleteOutcome::Deleted);
        assert!(!folder.exists());
    }

    #[test]
    fn test_absent_folder_counts_as_deleted() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            delete_source_folder(&dir.path().join("gone")).unwrap(),
            DeleteOutcome::AlreadyAbsent
        );
    }
}
