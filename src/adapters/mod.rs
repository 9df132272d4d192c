// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod steam_paths;
pub mod steam_store;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use exec_ffmpeg::FFmpegAdapter;
pub use steam_paths::SteamPathsAdapter;
pub use steam_store::SteamStoreResolver;
pub use toml_config::TomlConfigAdapter;
