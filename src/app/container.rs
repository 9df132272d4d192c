use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::adapters::steam_store::GAME_IDS_FILE;
use crate::adapters::{FFmpegAdapter, SteamPathsAdapter, SteamStoreResolver};
use crate::app::{
    batch_interactor::BatchCoordinator, cleanup_interactor::CleanupReconciler,
    convert_interactor::ConversionEngine, output_resolver::OutputResolver,
    scan_interactor::ClipScanner,
};
use crate::config_initialization::Settings;
use crate::domain::errors::DomainError;
use crate::ports::{GameNamePort, RecordPathPort, RootLocatorPort, TranscodePort};

pub trait AppContainer: Send + Sync {
    fn root_locator(&self) -> Arc<dyn RootLocatorPort>;
    fn scanner(&self) -> ClipScanner;
    fn output_resolver(&self) -> OutputResolver;
    fn cleanup_reconciler(&self) -> CleanupReconciler;
    /// Fails when no transcoder is available
    fn batch_coordinator(&self) -> Result<BatchCoordinator, DomainError>;
}

pub struct DefaultAppContainer {
    root_locator: Arc<dyn RootLocatorPort>,
    record_paths: Arc<dyn RecordPathPort>,
    names: Arc<dyn GameNamePort>,
    transcoder: OnceLock<Arc<dyn TranscodePort>>,
    ffmpeg_path: Option<PathBuf>,
    workers: usize,
}

impl DefaultAppContainer {
    /// Wire the production adapters; ffmpeg is located on first conversion
    pub fn new(settings: &Settings) -> Self {
        let steam_paths = Arc::new(SteamPathsAdapter::new());
        let names = Arc::new(SteamStoreResolver::new(
            Some(settings.cache_dir.join(GAME_IDS_FILE)),
            settings.offline,
        ));

        Self {
            root_locator: Arc::clone(&steam_paths) as Arc<dyn RootLocatorPort>,
            record_paths: steam_paths as Arc<dyn RecordPathPort>,
            names: names as Arc<dyn GameNamePort>,
            transcoder: OnceLock::new(),
            ffmpeg_path: settings.ffmpeg_path.clone(),
            workers: settings.workers,
        }
    }

    /// Wire explicit ports, for embedding and tests
    pub fn with_ports(
        root_locator: Arc<dyn RootLocatorPort>,
        record_paths: Arc<dyn RecordPathPort>,
        names: Arc<dyn GameNamePort>,
        transcoder: Arc<dyn TranscodePort>,
        workers: usize,
    ) -> Self {
        let slot = OnceLock::new();
        let _ = slot.set(transcoder);
        Self {
            root_locator,
            record_paths,
            names,
            transcoder: slot,
            ffmpeg_path: None,
            workers,
        }
    }

    fn transcoder(&self) -> Result<Arc<dyn TranscodePort>, DomainError> {
        if let Some(transcoder) = self.transcoder.get() {
            return Ok(Arc::clone(transcoder));
        }
        let located: Arc<dyn TranscodePort> =
            Arc::new(FFmpegAdapter::locate(self.ffmpeg_path.as_deref())?);
        Ok(Arc::clone(self.transcoder.get_or_init(|| located)))
    }
}

impl AppContainer for DefaultAppContainer {
    fn root_locator(&self) -> Arc<dyn RootLocatorPort> {
        Arc::clone(&self.root_locator)
    }

    fn scanner(&self) -> ClipScanner {
        ClipScanner::new(Arc::clone(&self.record_paths))
    }

    fn output_resolver(&self) -> OutputResolver {
        OutputResolver::new(Arc::clone(&self.names))
    }

    fn cleanup_reconciler(&self) -> CleanupReconciler {
        CleanupReconciler::new(self.output_resolver())
    }

    fn batch_coordinator(&self) -> Result<BatchCoordinator, DomainError> {
        let engine = ConversionEngine::new(self.output_resolver(), self.transcoder()?);
        Ok(BatchCoordinator::new(Arc::new(engine), self.workers))
    }
}
