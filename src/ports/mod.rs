// Ports - Interface definitions (contracts)
//
// All ports are synchronous: conversions run on blocking worker threads and
// call straight through to these capabilities.

use std::path::{Path, PathBuf};

use crate::domain::errors::DomainError;

/// Port for the external stream-copy transcoder
///
/// Every operation copies streams without re-encoding. A failure carries the
/// tool's diagnostic text as a [`DomainError::Transcoder`].
pub trait TranscodePort: Send + Sync {
    /// Join staged video streams (one per manifest) into a video-only container
    fn remux_video(&self, staged: &[PathBuf], output: &Path) -> Result<(), DomainError>;

    /// Join staged audio streams (one per manifest) into an audio-only container
    fn remux_audio(&self, staged: &[PathBuf], output: &Path) -> Result<(), DomainError>;

    /// Multiplex video and audio into `output`, trimmed to the shorter stream
    fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DomainError>;
}

/// Port for resolving a game id to a human-readable name
///
/// Implementations must tolerate concurrent calls from every worker.
pub trait GameNamePort: Send + Sync {
    /// Display name for `game_id`; never fails, falls back to a synthetic name
    fn game_name(&self, game_id: &str) -> String;
}

/// Port for locating recording roots on this machine
pub trait RootLocatorPort: Send + Sync {
    /// Candidate `userdata` roots, most likely first
    fn detect_roots(&self) -> Vec<PathBuf>;
}

/// Port for the vendor-configured custom recording location of an owner
pub trait RecordPathPort: Send + Sync {
    /// Custom recording root for `owner_dir`, if one is configured and exists
    fn custom_record_path(&self, owner_dir: &Path) -> Option<PathBuf>;
}
