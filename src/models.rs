//! Data structures and types for torrename
//!
//! Contains all shared models organized by domain:
//! - **Torrents**: qBittorrent torrent records, properties, and file entries
//! - **Rename**: FileBot suggestions, rename requests, and batch results

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Length of a v1 info hash in hex characters
pub const INFO_HASH_LEN: usize = 40;

// =============================================================================
// Torrent Models (qBittorrent)
// =============================================================================

/// Torrent record from `/torrents/info`
///
/// Fields not modelled here are kept in `extra` and passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Torrent {
    pub hash: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: String,
    /// Fraction in [0, 1]
    #[serde(default)]
    pub progress: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Display for Torrent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {:.1}%",
            self.name,
            self.state,
            self.progress * 100.0
        )
    }
}

/// Per-torrent properties from `/torrents/properties`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TorrentProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// File entry from `/torrents/files`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TorrentFile {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub progress: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Torrent record with best-effort enrichment
///
/// Serializes flat: the base torrent fields plus `properties` and `files`
/// when they could be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedTorrent {
    #[serde(flatten)]
    pub torrent: Torrent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<TorrentProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<TorrentFile>>,
}

impl EnrichedTorrent {
    /// Wrap a base record with no enrichment
    pub fn base(torrent: Torrent) -> Self {
        Self {
            torrent,
            properties: None,
            files: None,
        }
    }

    /// True if both properties and files were attached
    pub fn is_fully_enriched(&self) -> bool {
        self.properties.is_some() && self.files.is_some()
    }
}

// =============================================================================
// Rename Models (FileBot)
// =============================================================================

/// Media type used to pick the FileBot database and format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Tv,
    Movie,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Tv => "tv",
            MediaType::Movie => "movie",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tv" => Ok(MediaType::Tv),
            "movie" => Ok(MediaType::Movie),
            other => Err(format!(
                "\"type\" must be one of [tv, movie], got \"{}\"",
                other
            )),
        }
    }
}

/// A proposed rename produced by a FileBot dry run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameSuggestion {
    pub old_path: String,
    pub new_path: String,
}

impl fmt::Display for RenameSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.old_path, self.new_path)
    }
}

/// Suggestions plus the raw tool output they were parsed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestions {
    pub suggestions: Vec<RenameSuggestion>,
    pub output: String,
}

/// Outcome of a single rename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameResult {
    pub success: bool,
    pub old_path: String,
    pub new_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenameResult {
    pub fn succeeded(old_path: impl Into<String>, new_path: impl Into<String>) -> Self {
        Self {
            success: true,
            old_path: old_path.into(),
            new_path: new_path.into(),
            error: None,
        }
    }

    pub fn failed(
        old_path: impl Into<String>,
        new_path: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            old_path: old_path.into(),
            new_path: new_path.into(),
            error: Some(error.into()),
        }
    }
}

/// Report for a whole rename batch
///
/// `success` is the business outcome; a batch with failures is still a
/// successful request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub success: bool,
    pub message: String,
    pub results: Vec<RenameResult>,
}

impl BatchResult {
    /// Build the report from per-item outcomes
    pub fn from_results(results: Vec<RenameResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        let failed = results.len() - succeeded;

        let mut message = format!("{} files renamed successfully", succeeded);
        if failed > 0 {
            message.push_str(&format!(", {} failed", failed));
        }

        Self {
            success: failed == 0,
            message,
            results,
        }
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validate a torrent info hash (40 hex characters)
pub fn validate_torrent_hash(hash: &str) -> Result<&str, String> {
    if hash.len() == INFO_HASH_LEN && hash.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(hash)
    } else {
        Err(format!(
            "\"torrentHash\" must be {} hexadecimal characters",
            INFO_HASH_LEN
        ))
    }
}
