//! Configuration management for torrename
//!
//! Settings are layered: built-in defaults, then the config file
//! (~/.config/torrename/config.toml unless a path is given), then
//! environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub qbittorrent: QbittorrentConfig,
    pub filebot: FileBotConfig,
    pub limits: LimitsConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Maximum accepted request body
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

/// qBittorrent connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QbittorrentConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub auth_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// Consecutive failed logins before giving up
    pub max_auth_retries: u32,
    /// Re-authentications per request after a 403
    pub max_retries: u32,
}

impl Default for QbittorrentConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            username: "admin".to_string(),
            password: String::new(),
            auth_timeout_ms: 10_000,
            request_timeout_ms: 15_000,
            max_auth_retries: 3,
            max_retries: 2,
        }
    }
}

/// FileBot invocation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBotConfig {
    pub path: String,
    pub timeout_ms: u64,
    pub tv_database: String,
    pub movie_database: String,
    pub tv_format: String,
    pub movie_format: String,
}

impl Default for FileBotConfig {
    fn default() -> Self {
        Self {
            path: "filebot".to_string(),
            timeout_ms: 30_000,
            tv_database: "TheTVDB".to_string(),
            movie_database: "TheMovieDB".to_string(),
            tv_format: "{plex}".to_string(),
            movie_format: "{plex}".to_string(),
        }
    }
}

/// Request bounds, handler deadlines and per-client rate limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_rename_batch_size: usize,
    pub max_path_length: usize,
    pub suggest_timeout_ms: u64,
    pub rename_timeout_ms: u64,
    /// Length of one rate limit window
    pub rate_limit_window_ms: u64,
    /// Requests admitted per client and window on `/api`
    pub rate_limit_max_requests: u32,
    /// Error text sent with a 429
    pub rate_limit_message: String,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_rename_batch_size: 100,
            max_path_length: 1000,
            suggest_timeout_ms: 60_000,
            rename_timeout_ms: 30_000,
            rate_limit_window_ms: 15 * 60 * 1000,
            rate_limit_max_requests: 100,
            rate_limit_message: "Too many requests from this IP, please try again later."
                .to_string(),
        }
    }
}

impl Config {
    /// Get default config file path (~/.config/torrename/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("torrename").join("config.toml"))
    }

    /// Load config from `path` (or the default location), then apply the
    /// environment. A missing file means defaults; an unreadable one is an
    /// error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::path);

        let mut config = match path {
            Some(p) if p.exists() => {
                let content = std::fs::read_to_string(&p)
                    .with_context(|| format!("Failed to read config file {}", p.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file {}", p.display()))?
            }
            _ => Config::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override settings from environment-style lookups.
    ///
    /// Numeric values that fail to parse are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, target: &mut String| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *target = value;
            }
        };

        string("BIND_ADDRESS", &mut self.server.bind);
        string("QBITTORRENT_URL", &mut self.qbittorrent.url);
        string("QBITTORRENT_USERNAME", &mut self.qbittorrent.username);
        string("QBITTORRENT_PASSWORD", &mut self.qbittorrent.password);
        string("FILEBOT_PATH", &mut self.filebot.path);
        string("FILEBOT_TV_DATABASE", &mut self.filebot.tv_database);
        string("FILEBOT_MOVIE_DATABASE", &mut self.filebot.movie_database);
        string("FILEBOT_TV_FORMAT", &mut self.filebot.tv_format);
        string("FILEBOT_MOVIE_FORMAT", &mut self.filebot.movie_format);
        string("RATE_LIMIT_MESSAGE", &mut self.limits.rate_limit_message);

        set_parsed(&lookup, "PORT", &mut self.server.port);
        set_parsed(&lookup, "REQUEST_SIZE_LIMIT_BYTES", &mut self.server.body_limit_bytes);
        set_parsed(&lookup, "QB_AUTH_TIMEOUT_MS", &mut self.qbittorrent.auth_timeout_ms);
        set_parsed(&lookup, "QB_REQUEST_TIMEOUT_MS", &mut self.qbittorrent.request_timeout_ms);
        set_parsed(&lookup, "QB_MAX_AUTH_RETRIES", &mut self.qbittorrent.max_auth_retries);
        set_parsed(&lookup, "QB_MAX_RETRIES", &mut self.qbittorrent.max_retries);
        set_parsed(&lookup, "FILEBOT_TIMEOUT_MS", &mut self.filebot.timeout_ms);
        set_parsed(&lookup, "MAX_RENAME_BATCH_SIZE", &mut self.limits.max_rename_batch_size);
        set_parsed(&lookup, "MAX_PATH_LENGTH", &mut self.limits.max_path_length);
        set_parsed(&lookup, "SUGGEST_TIMEOUT_MS", &mut self.limits.suggest_timeout_ms);
        set_parsed(&lookup, "RENAME_TIMEOUT_MS", &mut self.limits.rename_timeout_ms);
        set_parsed(&lookup, "RATE_LIMIT_WINDOW_MS", &mut self.limits.rate_limit_window_ms);
        set_parsed(&lookup, "RATE_LIMIT_MAX_REQUESTS", &mut self.limits.rate_limit_max_requests);
    }
}

fn set_parsed<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(value) = lookup(key).and_then(|v| v.trim().parse().ok()) {
        *target = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.qbittorrent.max_auth_retries, 3);
        assert_eq!(config.qbittorrent.max_retries, 2);
        assert_eq!(config.filebot.timeout_ms, 30_000);
        assert_eq!(config.limits.suggest_timeout_ms, 60_000);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("QBITTORRENT_URL", "http://qb:8080"),
            ("PORT", "8000"),
            ("QB_MAX_RETRIES", "5"),
            ("FILEBOT_TV_FORMAT", "{n} - {s00e00}"),
        ]));
        assert_eq!(config.qbittorrent.url, "http://qb:8080");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.qbittorrent.max_retries, 5);
        assert_eq!(config.filebot.tv_format, "{n} - {s00e00}");
    }

    #[test]
    fn test_env_rate_limit() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("RATE_LIMIT_WINDOW_MS", "60000"),
            ("RATE_LIMIT_MAX_REQUESTS", "5"),
            ("RATE_LIMIT_MESSAGE", "Slow down"),
        ]));
        assert_eq!(config.limits.rate_limit_window_ms, 60_000);
        assert_eq!(config.limits.rate_limit_max_requests, 5);
        assert_eq!(config.limits.rate_limit_message, "Slow down");
    }

    #[test]
    fn test_env_ignores_unparseable_numbers() {
        let mut config = Config::default();
        config.apply_env(env(&[("PORT", "not-a-port"), ("MAX_PATH_LENGTH", "")]));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.limits.max_path_length, 1000);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [qbittorrent]
            url = "http://nas:8080"

            [filebot]
            movie_database = "OMDb"
            "#,
        )
        .unwrap();
        assert_eq!(config.qbittorrent.url, "http://nas:8080");
        assert_eq!(config.qbittorrent.username, "admin");
        assert_eq!(config.filebot.movie_database, "OMDb");
        assert_eq!(config.filebot.tv_database, "TheTVDB");
    }
}
