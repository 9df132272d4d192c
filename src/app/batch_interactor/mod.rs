// Batch interactor - Bounded parallel conversion with deferred source deletion

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::app::cleanup_interactor::{delete_source_folder, DeleteOutcome};
use crate::app::convert_interactor::{sweep_stale_workspaces, ConversionEngine, STALE_WORKSPACE_AGE};
use crate::domain::errors::DomainError;
use crate::domain::model::{BatchResult, ClipRecording, ConversionOutcome};

const MIN_DEFAULT_WORKERS: usize = 2;
const MAX_DEFAULT_WORKERS: usize = 6;

/// Half the logical CPUs, clamped to [2, 6]
pub fn default_worker_count() -> usize {
    (num_cpus::get() / 2).clamp(MIN_DEFAULT_WORKERS, MAX_DEFAULT_WORKERS)
}

/// Runs many conversions under a fixed worker limit
pub struct BatchCoordinator {
    engine: Arc<ConversionEngine>,
    workers: usize,
    stale_workspace_age: Duration,
}

impl BatchCoordinator {
    pub fn new(engine: Arc<ConversionEngine>, workers: usize) -> Self {
        Self {
            engine,
            workers: workers.max(1),
            stale_workspace_age: STALE_WORKSPACE_AGE,
        }
    }

    /// Idle time after which leftover workspaces in the output directory are removed
    pub fn with_stale_workspace_age(mut self, age: Duration) -> Self {
        self.stale_workspace_age = age;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Convert every clip, then delete sources of successful ones if asked
    ///
    /// Only an unusable output directory aborts the batch. Workspaces left by
    /// an interrupted earlier run are swept first. Deletion starts after every
    /// conversion has returned.
    pub async fn run_batch(
        &self,
        clips: Vec<ClipRecording>,
        output_dir: &Path,
        delete_source: bool,
    ) -> Result<BatchResult, DomainError> {
        fs::create_dir_all(output_dir).map_err(|e| {
            DomainError::filesystem(
                &format!("Cannot create output directory {}", output_dir.display()),
                e,
            )
        })?;

        let swept = sweep_stale_workspaces(output_dir, self.stale_workspace_age);
        if swept > 0 {
            info!("Removed {} stale workspaces from {}", swept, output_dir.display());
        }

        let mut result = BatchResult::new(clips.len());
        if clips.is_empty() {
            return Ok(result);
        }

        info!(
            "Converting {} clips with {} workers into {}",
            clips.len(),
            self.workers,
            output_dir.display()
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut pending: HashSet<PathBuf> = HashSet::with_capacity(clips.len());
        let mut tasks = JoinSet::new();

        for clip in clips {
            let folder = clip.folder_path.clone();
            pending.insert(folder.clone());

            let semaphore = semaphore.clone();
            let engine = self.engine.clone();
            let output_dir = output_dir.to_path_buf();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (folder, ConversionOutcome::failed("Unexpected error: worker pool closed"));
                };

                let outcome = tokio::task::spawn_blocking(move || engine.convert(&clip, &output_dir))
                    .await
                    .unwrap_or_else(|e| ConversionOutcome::failed(format!("Unexpected error: {}", e)));
                (folder, outcome)
            });
        }

        // Barrier: every task settles before any deletion is considered
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((folder, outcome)) => {
                    pending.remove(&folder);
                    result.record(folder, &outcome);
                }
                Err(e) => warn!("Worker task failed: {}", e),
            }
        }

        for folder in pending {
            result.record(folder, &ConversionOutcome::failed("Unexpected error: worker task lost"));
        }

        if delete_source {
            result.deleted = delete_successful_sources(&result.successful);
        }

        Ok(result)
    }
}

/// Remove source folders of successful clips; failures only warn
fn delete_successful_sources(successful: &[PathBuf]) -> Vec<PathBuf> {
    let mut deleted = Vec::new();
    for folder in successful {
        match delete_source_folder(folder) {
            Ok(DeleteOutcome::Deleted) | Ok(DeleteOutcome::AlreadyAbsent) => {
                deleted.push(folder.clone());
            }
            Ok(DeleteOutcome::Refused) => {
                warn!(
                    "Refused to delete {}: no recording files found",
                    folder.display()
                );
            }
            Err(e) => warn!("Failed to delete source {}: {}", folder.display(), e),
        }
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_worker_count_bounds() {
        let workers = default_worker_count();
        assert!((MIN_DEFAULT_WORKERS..=MAX_DEFAULT_WORKERS).contains(&workers));
    }
}
