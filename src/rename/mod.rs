//! FileBot-driven renaming
//!
//! - filebot: subprocess runner (dry runs only)
//! - parser: `old -> new` output parsing
//! - suggest: torrent files → suggestions
//! - apply: suggestions → qBittorrent renames

pub mod apply;
pub mod filebot;
pub mod parser;
pub mod suggest;

pub use apply::{apply_renames, RenameLimits};
pub use filebot::{FileBot, FileBotError};
pub use parser::parse_output;
pub use suggest::suggest;
