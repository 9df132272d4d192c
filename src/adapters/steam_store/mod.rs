// Steam store adapter - Game id to display name lookups with a persistent cache

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, RwLock};
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::ports::GameNamePort;

pub const STEAM_APP_DETAILS_URL: &str = "https://store.steampowered.com/api/appdetails";

/// File name of the persisted id to name cache
pub const GAME_IDS_FILE: &str = "GameIDs.json";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves Steam app ids through the store API, caching every answer
///
/// Reads take a shared lock; a new entry is inserted and persisted under the
/// write lock so only one writer touches the cache file at a time.
pub struct SteamStoreResolver {
    names: RwLock<HashMap<String, String>>,
    cache_file: Option<PathBuf>,
    offline: bool,
    client: OnceLock<Option<Client>>,
}

impl SteamStoreResolver {
    /// Create a resolver backed by `cache_file` (if any)
    pub fn new(cache_file: Option<PathBuf>, offline: bool) -> Self {
        let names = cache_file
            .as_deref()
            .map(load_cache)
            .unwrap_or_default();

        Self {
            names: RwLock::new(names),
            cache_file,
            offline,
            client: OnceLock::new(),
        }
    }

    /// Number of cached names
    pub fn cached_len(&self) -> usize {
        self.names.read().map(|names| names.len()).unwrap_or_else(|e| e.into_inner().len())
    }

    fn cached(&self, game_id: &str) -> Option<String> {
        let names = self.names.read().unwrap_or_else(|e| e.into_inner());
        names.get(game_id).cloned()
    }

    fn client(&self) -> Option<&Client> {
        self.client
            .get_or_init(|| {
                Client::builder()
                    .timeout(LOOKUP_TIMEOUT)
                    .user_agent(concat!("clip-exporter/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .map_err(|e| error!("Failed to build HTTP client: {}", e))
                    .ok()
            })
            .as_ref()
    }

    fn fetch_remote(&self, game_id: &str) -> Option<String> {
        let client = self.client()?;
        let response = client
            .get(STEAM_APP_DETAILS_URL)
            .query(&[("appids", game_id), ("filters", "basic")])
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<Value>());

        match response {
            Ok(body) => parse_app_details(game_id, &body),
            Err(e) => {
                warn!("Failed to fetch game name for {}: {}", game_id, e);
                None
            }
        }
    }

    fn remember(&self, game_id: &str, name: &str) {
        let mut names = self.names.write().unwrap_or_else(|e| e.into_inner());
        names.insert(game_id.to_string(), name.to_string());

        if let Some(path) = &self.cache_file {
            if let Err(e) = save_cache(path, &names) {
                warn!("Failed to save game name cache {}: {}", path.display(), e);
            }
        }
    }
}

impl GameNamePort for SteamStoreResolver {
    fn game_name(&self, game_id: &str) -> String {
        if let Some(name) = self.cached(game_id) {
            return name;
        }

        // Non-numeric ids are already names (non-Steam shortcuts, mods)
        if game_id.is_empty() || !game_id.bytes().all(|b| b.is_ascii_digit()) {
            return game_id.to_string();
        }

        let fetched = if self.offline {
            None
        } else {
            self.fetch_remote(game_id)
        };

        let name = match fetched {
            Some(name) => {
                info!("Resolved game {} as {}", game_id, name);
                name
            }
            None => format!("Game_{}", game_id),
        };

        self.remember(game_id, &name);
        name
    }
}

/// Extract `data.name` from an appdetails response for `game_id`
pub fn parse_app_details(game_id: &str, body: &Value) -> Option<String> {
    let entry = body.get(game_id)?;
    if !entry.get("success")?.as_bool()? {
        return None;
    }
    entry
        .get("data")?
        .get("name")?
        .as_str()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn load_cache(path: &Path) -> HashMap<String, String> {
    if !path.exists() {
        return HashMap::new();
    }

    let loaded = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));

    match loaded {
        Ok(names) => {
            debug!("Loaded game name cache from {}", path.display());
            names
        }
        Err(e) => {
            error!("Error loading game IDs from {}: {}", path.display(), e);
            HashMap::new()
        }
    }
}

fn save_cache(path: &Path, names: &HashMap<String, String>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(names)?;
    fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_parse_app_details() {
        let body = json!({"570": {"success": true, "data": {"name": "Dota 2"}}});
        assert_eq!(parse_app_details("570", &body).as_deref(), Some("Dota 2"));
    }

    #[test]
    fn test_parse_app_details_unsuccessful() {
        let body = json!({"570": {"success": false}});
        assert_eq!(parse_app_details("570", &body), None);
        assert_eq!(parse_app_details("730", &body), None);
    }

    #[test]
    fn test_offline_fallback_is_cached_and_persisted() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join(GAME_IDS_FILE);

        let resolver = SteamStoreResolver::new(Some(cache.clone()), true);
        assert_eq!(resolver.game_name("570"), "Game_570");
        assert_eq!(resolver.cached_len(), 1);

        let saved: HashMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&cache).unwrap()).unwrap();
        assert_eq!(saved.get("570").map(String::as_str), Some("Game_570"));
    }

    #[test]
    fn test_cached_names_are_loaded() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join(GAME_IDS_FILE);
        fs::write(&cache, r#"{"570": "Dota 2"}"#).unwrap();

        let resolver = SteamStoreResolver::new(Some(cache), true);
        assert_eq!(resolver.game_name("570"), "Dota 2");
    }

    #[test]
    fn test_corrupt_cache_is_ignored() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join(GAME_IDS_FILE);
        fs::write(&cache, "not json").unwrap();

        let resolver = SteamStoreResolver::new(Some(cache), true);
        assert_eq!(resolver.cached_len(), 0);
    }

    #[test]
    fn test_non_numeric_ids_resolve_to_themselves() {
        let resolver = SteamStoreResolver::new(None, true);
        assert_eq!(resolver.game_name("Unknown"), "Unknown");
        assert_eq!(resolver.cached_len(), 0);
    }
}
