//! Steam Clip Exporter Library
//!
//! Discovers Steam game recordings stored as fragmented `.m4s` segments,
//! rebuilds each clip's video and audio streams and muxes them into one MP4
//! per clip with FFmpeg stream copy.
//!
//! # Features
//!
//! - Idempotent exports: clips whose MP4 already exists are skipped
//! - Bounded parallel conversion with deferred, safety-checked source deletion
//! - Game names resolved through the Steam store and cached on disk
//!
//! # Usage
//!
//! ```bash
//! clip-exporter list --media-type manual
//! clip-exporter convert --game-id 570 --output ~/Videos/Steam
//! clip-exporter cleanup --steam-id 12345678
//! ```

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{BatchResult, ClipRecording, ConversionOutcome, SegmentManifest};
pub use error::{ExporterError, ExporterResult};
