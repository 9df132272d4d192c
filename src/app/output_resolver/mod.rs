// Output resolver - Canonical output names, prior-conversion detection and
// serialized allocation of final output paths

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::domain::model::ClipRecording;
use crate::domain::rules::{
    format_output_base_name, numbered_variant, output_file_name, sanitize_filename,
};
use crate::ports::GameNamePort;

/// Highest `_<n>` variant probed when looking for a previous conversion
pub const MAX_NUMBERED_VARIANTS: u32 = 100;

/// Maps clips to output file names using the current game name mapping
#[derive(Clone)]
pub struct OutputResolver {
    names: Arc<dyn GameNamePort>,
}

impl OutputResolver {
    pub fn new(names: Arc<dyn GameNamePort>) -> Self {
        Self { names }
    }

    pub fn game_name(&self, clip: &ClipRecording) -> String {
        self.names.game_name(&clip.game_id)
    }

    /// Sanitized `<game>_<timestamp>` base name, without extension
    pub fn base_name(&self, clip: &ClipRecording) -> String {
        let game_name = self.game_name(clip);
        sanitize_filename(&format_output_base_name(&game_name, clip.timestamp.as_ref()))
    }

    /// `output_dir/<base>.mp4`; changes if the name mapping changes
    pub fn expected_output_path(&self, clip: &ClipRecording, output_dir: &Path) -> PathBuf {
        output_dir.join(output_file_name(&self.base_name(clip)))
    }

    /// The expected path or its first existing `_1` to `_100` variant
    pub fn find_existing_output(&self, clip: &ClipRecording, output_dir: &Path) -> Option<PathBuf> {
        let expected = self.expected_output_path(clip, output_dir);
        if expected.exists() {
            return Some(expected);
        }

        (1..=MAX_NUMBERED_VARIANTS)
            .map(|n| numbered_variant(&expected, n))
            .find(|candidate| candidate.exists())
    }
}

/// First free path for `desired_name` in `dir`, suffixing `_1`, `_2`, ...
///
/// Nothing is reserved: the caller must re-check before writing.
pub fn unique_output_path(dir: &Path, desired_name: &str) -> PathBuf {
    unique_path_where(dir, desired_name, |path| path.exists())
}

fn unique_path_where(dir: &Path, desired_name: &str, taken: impl Fn(&Path) -> bool) -> PathBuf {
    let candidate = dir.join(sanitize_filename(desired_name));
    if !taken(&candidate) {
        return candidate;
    }

    (1..)
        .map(|n| numbered_variant(&candidate, n))
        .find(|path| !taken(path))
        .unwrap_or(candidate)
}

/// Serializes final output path allocation across workers
///
/// A path handed out stays reserved until its [`OutputReservation`] drops, so
/// two concurrent conversions never pick the same name.
#[derive(Debug, Default)]
pub struct OutputArbiter {
    reserved: Mutex<HashSet<PathBuf>>,
}

impl OutputArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the first path that neither exists nor is held by another worker
    pub fn reserve(&self, dir: &Path, desired_name: &str) -> OutputReservation<'_> {
        let mut reserved = self.reserved.lock().unwrap_or_else(|e| e.into_inner());
        let path = unique_path_where(dir, desired_name, |path| {
            reserved.contains(path) || path.exists()
        });
        reserved.insert(path.clone());
        debug!("Reserved output path {}", path.display());

        OutputReservation {
            arbiter: self,
            path,
        }
    }

    pub fn reserved_count(&self) -> usize {
        self.reserved.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// A reserved output path, released on drop
#[derive(Debug)]
pub struct OutputReservation<'a> {
    arbiter: &'a OutputArbiter,
    path: PathBuf,
}

impl OutputReservation<'_> {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for OutputReservation<'_> {
    fn drop(&mut self) {
        let mut reserved = self.arbiter.reserved.lock().unwrap_or_else(|e| e.into_inner());
        reserved.remove(&self.path);
    }
}
