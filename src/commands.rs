//! CLI Command Handlers
//!
//! Each handler builds the backend services from config, runs one
//! operation, and returns an ExitCode.

use torrename::config::Config;
use torrename::error::AppError;
use torrename::models::RenameSuggestion;
use torrename::rename::{self, FileBot, RenameLimits};
use torrename::{torrents, QbClient};

use crate::cli::{
    CheckCmd, CheckResponse, ExitCode, Output, RenameCmd, RenameInput, SuggestCmd, TorrentsCmd,
};

/// Exit code for an application error
pub fn exit_code_for(err: &AppError) -> ExitCode {
    match err {
        AppError::Validation(_) | AppError::NotFound(_) | AppError::NoValidInput(_) => {
            ExitCode::InvalidArgs
        }
        AppError::Authentication => ExitCode::AuthFailed,
        AppError::ExternalTool(_) => ExitCode::ToolFailed,
        AppError::Timeout(_) | AppError::Daemon(_) => ExitCode::NetworkError,
    }
}

// =============================================================================
// Torrents Command
// =============================================================================

pub async fn torrents_cmd(cmd: TorrentsCmd, config: &Config, output: &Output) -> ExitCode {
    let client = QbClient::new(&config.qbittorrent);

    output.info(format!("Fetching torrents from {}", config.qbittorrent.url));

    match torrents::list_enriched_torrents(&client).await {
        Ok(mut list) => {
            if let Some(category) = &cmd.category {
                list.retain(|t| &t.torrent.category == category);
            }

            if let Err(e) = output.print(&list) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => output.error(format!("Failed to fetch torrents: {}", e), exit_code_for(&e)),
    }
}

// =============================================================================
// Suggest Command
// =============================================================================

pub async fn suggest_cmd(cmd: SuggestCmd, config: &Config, output: &Output) -> ExitCode {
    let client = QbClient::new(&config.qbittorrent);
    let filebot = FileBot::new(&config.filebot);

    output.info(format!("Asking FileBot about {} ({})", cmd.hash, cmd.media_type.as_str()));

    match rename::suggest(&client, &filebot, &cmd.hash, cmd.media_type.as_str()).await {
        Ok(suggestions) => {
            if let Err(e) = output.print(&suggestions) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => output.error(e.to_string(), exit_code_for(&e)),
    }
}

// =============================================================================
// Rename Command
// =============================================================================

pub async fn rename_cmd(cmd: RenameCmd, config: &Config, output: &Output) -> ExitCode {
    let renames = match collect_renames(&cmd) {
        Ok(renames) => renames,
        Err(msg) => return output.error(msg, ExitCode::InvalidArgs),
    };

    let client = QbClient::new(&config.qbittorrent);
    let limits = RenameLimits::from(&config.limits);

    output.info(format!("Renaming {} files in {}", renames.len(), cmd.hash));

    match rename::apply_renames(&client, limits, &cmd.hash, &renames).await {
        Ok(batch) => {
            if let Err(e) = output.print(&batch) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            if batch.success {
                ExitCode::Success
            } else {
                ExitCode::PartialFailure
            }
        }
        Err(e) => output.error(e.to_string(), exit_code_for(&e)),
    }
}

/// Gather pairs from --input and --from/--to
fn collect_renames(cmd: &RenameCmd) -> Result<Vec<RenameSuggestion>, String> {
    let mut renames = Vec::new();

    if let Some(path) = &cmd.input {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let input: RenameInput = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
        renames.extend(input.into_pairs());
    }

    renames.extend(cmd.pairs()?);
    Ok(renames)
}

// =============================================================================
// Check Command
// =============================================================================

pub async fn check_cmd(_cmd: CheckCmd, config: &Config, output: &Output) -> ExitCode {
    let client = QbClient::new(&config.qbittorrent);

    if !client.authenticate().await {
        return output.error(
            format!("Failed to authenticate with qBittorrent at {}", config.qbittorrent.url),
            ExitCode::AuthFailed,
        );
    }

    match client.app_version().await {
        Ok(version) => {
            let response = CheckResponse {
                status: "ok".to_string(),
                url: config.qbittorrent.url.clone(),
                version,
            };
            if let Err(e) = output.print(&response) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => {
            let err = AppError::from(e);
            output.error(err.to_string(), exit_code_for(&err))
        }
    }
}
