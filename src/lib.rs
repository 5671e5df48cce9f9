//! torrename - qBittorrent + FileBot rename helper
//!
//! Lists torrents from a qBittorrent daemon, asks FileBot what it would
//! rename their files to, and applies the chosen renames through the
//! qBittorrent API.
//!
//! # Modules
//!
//! - `api` - qBittorrent session client
//! - `torrents` - torrent listing with per-torrent enrichment
//! - `rename` - FileBot suggestions and batch rename application
//! - `sanitize` - path sanitization
//! - `server` - HTTP API
//! - `rate_limit` - per-client limiting for `/api` routes
//! - `config` - layered configuration
//! - `logging` - tracing subscriber setup

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod rate_limit;
pub mod rename;
pub mod sanitize;
pub mod server;
pub mod torrents;

// Re-export commonly used types
pub use models::{
    BatchResult, EnrichedTorrent, MediaType, RenameResult, RenameSuggestion, Suggestions,
    Torrent, TorrentFile, TorrentProperties,
};

pub use api::{QbClient, QbError};
pub use config::Config;
pub use error::AppError;
pub use rename::{FileBot, RenameLimits};
pub use sanitize::{sanitize, SanitizeError};
