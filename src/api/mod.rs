//! API clients for external services
//!
//! - qBittorrent: torrent listing, per-torrent detail, and file renames

pub mod qbittorrent;

pub use qbittorrent::{QbClient, QbError};
