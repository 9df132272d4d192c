//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

use crate::app::scan_interactor::ScanFilter;
use crate::domain::model::MediaType;

/// Which clips a command works on
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Steam userdata folder (skips auto-detection)
    #[arg(long, env = "CLIP_EXPORTER_USERDATA_PATH")]
    pub userdata_path: Option<PathBuf>,

    /// Only clips recorded by this Steam account id
    #[arg(long, visible_alias = "steam-id")]
    pub owner_id: Option<String>,

    /// Only clips of this game (Steam app id)
    #[arg(long)]
    pub game_id: Option<String>,

    /// Recording type: all, manual, background
    #[arg(long, default_value = "all")]
    pub media_type: MediaType,
}

impl SelectionArgs {
    pub fn scan_filter(&self) -> ScanFilter {
        ScanFilter {
            owner_id: self.owner_id.clone(),
            media_type: self.media_type,
            game_id: self.game_id.clone(),
        }
    }
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the convert command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Delete source folders after every conversion in the batch finished
    #[arg(long)]
    pub delete_source: bool,
}

/// Arguments for the cleanup command
#[derive(Args, Debug)]
pub struct CleanupArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
}
