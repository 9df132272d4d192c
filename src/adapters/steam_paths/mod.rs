// Steam paths adapter - Installation discovery and per-owner recording settings

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::domain::rules::is_owner_id;
use crate::ports::{RecordPathPort, RootLocatorPort};
use crate::utils::Utils;

const BACKGROUND_RECORD_KEY: &str = "\"BackgroundRecordPath\"";

/// Registry keys holding Steam's `InstallPath`, most specific first
#[cfg(windows)]
const STEAM_REGISTRY_KEYS: [(RegistryHive, &str); 3] = [
    (RegistryHive::LocalMachine, "SOFTWARE\\WOW6432Node\\Valve\\Steam"),
    (RegistryHive::LocalMachine, "SOFTWARE\\Valve\\Steam"),
    (RegistryHive::CurrentUser, "SOFTWARE\\Valve\\Steam"),
];

#[cfg(windows)]
#[derive(Clone, Copy)]
enum RegistryHive {
    LocalMachine,
    CurrentUser,
}

/// Locates Steam `userdata` roots and reads owners' custom recording paths
///
/// Custom paths are read from `localconfig.vdf` once per owner directory and
/// cached for the lifetime of the adapter.
pub struct SteamPathsAdapter {
    home: Option<PathBuf>,
    custom_paths: Mutex<HashMap<PathBuf, Option<PathBuf>>>,
}

impl SteamPathsAdapter {
    pub fn new() -> Self {
        Self::with_home(dirs::home_dir())
    }

    pub fn with_home(home: Option<PathBuf>) -> Self {
        Self {
            home,
            custom_paths: Mutex::new(HashMap::new()),
        }
    }

    /// Platform-specific places a Steam installation usually lives
    ///
    /// On Windows the registry's install paths come before the fixed list.
    pub fn candidate_install_dirs(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if cfg!(windows) {
            candidates.extend(registry_install_dirs());
            candidates.extend(
                [
                    "C:/Program Files (x86)/Steam",
                    "C:/Program Files/Steam",
                    "D:/Steam",
                    "E:/Steam",
                ]
                .map(PathBuf::from),
            );
        } else if cfg!(target_os = "macos") {
            if let Some(home) = &self.home {
                candidates.push(home.join("Library/Application Support/Steam"));
            }
            candidates.push(PathBuf::from("/Applications/Steam.app/Contents/MacOS"));
            if let Some(home) = &self.home {
                candidates.push(home.join("Applications/Steam.app/Contents/MacOS"));
            }
        } else {
            if let Some(home) = &self.home {
                candidates.push(home.join(".steam/steam"));
                candidates.push(home.join(".local/share/Steam"));
            }
            candidates.push(PathBuf::from("/usr/share/steam"));
            candidates.push(PathBuf::from("/opt/steam"));
        }

        merge_candidates(candidates)
    }

    fn read_custom_record_path(owner_dir: &Path) -> Option<PathBuf> {
        let localconfig = owner_dir.join("config").join("localconfig.vdf");
        if !localconfig.exists() {
            return None;
        }

        // The file is not guaranteed to be valid UTF-8
        let content = match fs::read(&localconfig) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!(
                    "Error reading custom record path from {}: {}",
                    localconfig.display(),
                    e
                );
                return None;
            }
        };

        parse_background_record_path(&content)
            .map(PathBuf::from)
            .filter(|path| path.is_dir())
    }
}

impl Default for SteamPathsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl RootLocatorPort for SteamPathsAdapter {
    /// Qualifying `userdata` folders, one per physical directory
    fn detect_roots(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.candidate_install_dirs()
            .into_iter()
            .map(|install| install.join("userdata"))
            .filter(|userdata| {
                let found = has_owner_dirs(userdata);
                debug!("Checked {} (owners found: {})", userdata.display(), found);
                found
            })
            .filter(|userdata| {
                let first = seen.insert(Utils::canonical_path(userdata));
                if !first {
                    debug!("{} is already covered by another root", userdata.display());
                }
                first
            })
            .collect()
    }
}

impl RecordPathPort for SteamPathsAdapter {
    fn custom_record_path(&self, owner_dir: &Path) -> Option<PathBuf> {
        let mut cache = self.custom_paths.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .entry(owner_dir.to_path_buf())
            .or_insert_with(|| Self::read_custom_record_path(owner_dir))
            .clone()
    }
}

/// Steam install paths recorded in the Windows registry
#[cfg(windows)]
fn registry_install_dirs() -> Vec<PathBuf> {
    use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE};
    use winreg::RegKey;

    STEAM_REGISTRY_KEYS
        .iter()
        .filter_map(|(hive, subkey)| {
            let hive = RegKey::predef(match hive {
                RegistryHive::LocalMachine => HKEY_LOCAL_MACHINE,
                RegistryHive::CurrentUser => HKEY_CURRENT_USER,
            });
            let install = hive
                .open_subkey(subkey)
                .and_then(|key| key.get_value::<String, _>("InstallPath"));
            match install {
                Ok(path) => {
                    debug!("Registry {} InstallPath: {}", subkey, path);
                    Some(PathBuf::from(path))
                }
                Err(e) => {
                    debug!("Registry {} not readable: {}", subkey, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(not(windows))]
fn registry_install_dirs() -> Vec<PathBuf> {
    Vec::new()
}

/// Drop repeated candidates, keeping the first occurrence
///
/// Windows paths compare without regard to case or separator style, so a
/// registry `C:\Program Files (x86)\Steam` matches the fixed entry.
fn merge_candidates(candidates: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|path| seen.insert(candidate_key(path, cfg!(windows))))
        .collect()
}

fn candidate_key(path: &Path, windows: bool) -> String {
    let text = path.to_string_lossy();
    if windows {
        text.to_lowercase().replace('\\', "/").trim_end_matches('/').to_string()
    } else {
        text.trim_end_matches('/').to_string()
    }
}

/// Whether `dir` contains at least one owner directory
pub fn has_owner_dirs(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries.filter_map(Result::ok).any(|entry| {
        entry.path().is_dir() && is_owner_id(&entry.file_name().to_string_lossy())
    })
}

/// Value of the first `"BackgroundRecordPath"` line in a VDF document
pub fn parse_background_record_path(content: &str) -> Option<String> {
    content
        .lines()
        .filter_map(|line| line.split_once(BACKGROUND_RECORD_KEY))
        .map(|(_, value)| value.trim().trim_matches('"').trim().replace("\\\\", "\\"))
        .find(|value| !value.is_empty())
}
