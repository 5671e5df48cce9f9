//! CLI - Command Line Interface for torrename
//!
//! Without a subcommand the HTTP server starts. Subcommands run a single
//! operation against qBittorrent and print JSON.
//!
//! # Examples
//!
//! ```bash
//! # Run the web API
//! torrename serve
//!
//! # One-off operations
//! torrename torrents --json
//! torrename suggest 0123456789abcdef0123456789abcdef01234567 --type tv
//! torrename rename 0123...4567 --from a.mkv --to "Show - S01E01.mkv"
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use torrename::logging::LogFormat;
use torrename::models::{BatchResult, EnrichedTorrent, MediaType, RenameSuggestion, Suggestions};

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network or daemon error
    NetworkError = 3,
    /// qBittorrent login failed
    AuthFailed = 4,
    /// FileBot failed or timed out
    ToolFailed = 5,
    /// Some renames in a batch failed
    PartialFailure = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// torrename - rename torrent files with FileBot through qBittorrent
///
/// Run without arguments to start the HTTP API.
#[derive(Parser, Debug)]
#[command(
    name = "torrename",
    version,
    about = "Rename torrent files with FileBot through qBittorrent",
    after_help = "EXAMPLES:\n\
                  torrename                               Start the HTTP API\n\
                  torrename torrents --json               List torrents\n\
                  torrename suggest <hash> --type movie   Preview renames\n\
                  torrename check                         Test qBittorrent login"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Subcommand to run (omit to start the server)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Check if the HTTP server should run
    pub fn is_server_mode(&self) -> bool {
        matches!(self.command, None | Some(Command::Serve(_)))
    }

    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API
    Serve(ServeCmd),

    /// List torrents with properties and files
    #[command(visible_alias = "ls")]
    Torrents(TorrentsCmd),

    /// Preview FileBot renames for a torrent
    Suggest(SuggestCmd),

    /// Apply renames to a torrent's files
    #[command(visible_alias = "mv")]
    Rename(RenameCmd),

    /// Log in to qBittorrent and print its version
    Check(CheckCmd),
}

/// Start the HTTP API
#[derive(Args, Debug)]
pub struct ServeCmd {
    /// Listen port (overrides config)
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Bind address (overrides config)
    #[arg(long, short = 'b')]
    pub bind: Option<String>,
}

/// List torrents
#[derive(Args, Debug)]
pub struct TorrentsCmd {
    /// Only show torrents in this category
    #[arg(long)]
    pub category: Option<String>,
}

/// Preview FileBot renames
#[derive(Args, Debug)]
pub struct SuggestCmd {
    /// Torrent info hash (40 hex characters)
    #[arg(required = true)]
    pub hash: String,

    /// Media type, selects the FileBot database and format
    #[arg(long = "type", short = 't', value_enum, default_value = "tv")]
    pub media_type: MediaTypeArg,
}

/// Apply renames
#[derive(Args, Debug)]
pub struct RenameCmd {
    /// Torrent info hash (40 hex characters)
    #[arg(required = true)]
    pub hash: String,

    /// Current path (repeat, paired with --to)
    #[arg(long = "from", short = 'f')]
    pub from: Vec<String>,

    /// New path (repeat, paired with --from)
    #[arg(long = "to", short = 't')]
    pub to: Vec<String>,

    /// JSON file with [{"oldPath", "newPath"}] or a `suggest` result
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,
}

impl RenameCmd {
    /// Pair up --from/--to values
    pub fn pairs(&self) -> Result<Vec<RenameSuggestion>, String> {
        if self.from.len() != self.to.len() {
            return Err(format!(
                "--from and --to must be given the same number of times ({} vs {})",
                self.from.len(),
                self.to.len()
            ));
        }
        Ok(self
            .from
            .iter()
            .zip(&self.to)
            .map(|(old, new)| RenameSuggestion {
                old_path: old.clone(),
                new_path: new.clone(),
            })
            .collect())
    }
}

/// Test qBittorrent login
#[derive(Args, Debug)]
pub struct CheckCmd {}

/// Media type argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaTypeArg {
    Tv,
    Movie,
}

impl MediaTypeArg {
    pub fn as_str(&self) -> &'static str {
        MediaType::from(*self).as_str()
    }
}

impl From<MediaTypeArg> for MediaType {
    fn from(arg: MediaTypeArg) -> Self {
        match arg {
            MediaTypeArg::Tv => MediaType::Tv,
            MediaTypeArg::Movie => MediaType::Movie,
        }
    }
}

/// Rename input file contents
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RenameInput {
    Pairs(Vec<RenameSuggestion>),
    Suggestions { suggestions: Vec<RenameSuggestion> },
}

impl RenameInput {
    pub fn into_pairs(self) -> Vec<RenameSuggestion> {
        match self {
            RenameInput::Pairs(pairs) => pairs,
            RenameInput::Suggestions { suggestions } => suggestions,
        }
    }
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Daemon check response
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub status: String,
    pub url: String,
    pub version: String,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data, as JSON or as plain text
    pub fn print<T: Serialize + Render>(&self, data: &T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", data.render());
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Plain-Text Rendering
// =============================================================================

/// Plain-text form of a command result, for terminals
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Vec<EnrichedTorrent> {
    fn render(&self) -> String {
        if self.is_empty() {
            return "No torrents".to_string();
        }
        self.iter()
            .map(|t| {
                let files = t
                    .files
                    .as_ref()
                    .map_or_else(|| "? files".to_string(), |f| format!("{} files", f.len()));
                format!("{}  {}  ({})", t.torrent.hash, t.torrent, files)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Render for Suggestions {
    fn render(&self) -> String {
        if self.suggestions.is_empty() {
            return "No renames suggested".to_string();
        }
        self.suggestions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Render for BatchResult {
    fn render(&self) -> String {
        let mut lines: Vec<String> = self
            .results
            .iter()
            .map(|r| match &r.error {
                None => format!("ok    {} -> {}", r.old_path, r.new_path),
                Some(e) => format!("FAIL  {} -> {}: {}", r.old_path, r.new_path, e),
            })
            .collect();
        lines.push(self.message.clone());
        lines.join("\n")
    }
}

impl Render for CheckResponse {
    fn render(&self) -> String {
        format!("qBittorrent {} at {}: {}", self.version, self.url, self.status)
    }
}

// =============================================================================
// Tests
// =============================================================================
