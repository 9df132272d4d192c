// Domain rules - On-disk naming conventions
//
// Pure parse/format functions for clip folder names and exported file names.
// Nothing in here touches the filesystem.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::domain::errors::DomainError;
use crate::domain::model::OUTPUT_EXTENSION;


/// Timestamp layout embedded in clip folder names (date and time tokens joined)
pub const CLIP_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Timestamp layout used in exported file names
pub const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Game id substituted when a folder name cannot be parsed
pub const UNKNOWN_GAME_ID: &str = "Unknown";

/// Date text substituted in output names when the timestamp is unknown
pub const UNKNOWN_DATE: &str = "UnknownDate";

const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*', '\\', '/', ' '];

/// Components recovered from `<prefix>_<gameId>_<YYYYMMDD>_<HHMMSS>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipFolderName {
    pub game_id: String,
    pub timestamp: NaiveDateTime,
}

/// Parse a clip folder name into its game id and timestamp
///
/// The game id is token 1; the last two tokens together must form a 14-digit
/// `YYYYMMDDHHMMSS` timestamp.
pub fn parse_clip_folder_name(name: &str) -> Result<ClipFolderName, DomainError> {
    let parts: Vec<&str> = name.split('_').collect();
    if parts.len() < 3 {
        return Err(DomainError::NameParse(name.to_string()));
    }

    let datetime_str = format!("{}{}", parts[parts.len() - 2], parts[parts.len() - 1]);
    if datetime_str.len() != 14 || !datetime_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DomainError::NameParse(name.to_string()));
    }

    let timestamp = NaiveDateTime::parse_from_str(&datetime_str, CLIP_TIMESTAMP_FORMAT)
        .map_err(|_| DomainError::NameParse(name.to_string()))?;

    Ok(ClipFolderName {
        game_id: parts[1].to_string(),
        timestamp,
    })
}

/// Inverse of [`parse_clip_folder_name`]
pub fn format_clip_folder_name(prefix: &str, game_id: &str, timestamp: &NaiveDateTime) -> String {
    format!(
        "{}_{}_{}_{}",
        prefix,
        game_id,
        timestamp.format("%Y%m%d"),
        timestamp.format("%H%M%S")
    )
}

/// `<gameName>_<YYYY-MM-DD_HH-MM-SS>`, before sanitization
pub fn format_output_base_name(game_name: &str, timestamp: Option<&NaiveDateTime>) -> String {
    match timestamp {
        Some(ts) => format!("{}_{}", game_name, ts.format(OUTPUT_TIMESTAMP_FORMAT)),
        None => format!("{}_{}", game_name, UNKNOWN_DATE),
    }
}

/// Make free text safe to use as a file name
///
/// Replaces `< > : " | ? * \ /` and spaces with `_`, collapses runs of `_`
/// and trims leading and trailing `_`.
pub fn sanitize_filename(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for ch in name.chars() {
        let ch = if INVALID_FILENAME_CHARS.contains(&ch) { '_' } else { ch };
        if ch == '_' && sanitized.ends_with('_') {
            continue;
        }
        sanitized.push(ch);
    }
    sanitized.trim_matches('_').to_string()
}

/// `<base>.mp4`
pub fn output_file_name(base_name: &str) -> String {
    format!("{}.{}", base_name, OUTPUT_EXTENSION)
}

/// Owner directories are named by a numeric account id
pub fn is_owner_id(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

/// Insert `_<n>` before the extension of `path`
pub fn numbered_variant(path: &Path, n: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    };
    path.with_file_name(file_name)
}
