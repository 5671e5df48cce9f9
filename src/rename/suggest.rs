//! Rename suggestions for a torrent's files
//!
//! Looks up the torrent's files and save path, builds sanitized absolute
//! paths, runs FileBot in test mode, and parses what it would do.

use std::path::Path;

use crate::api::QbClient;
use crate::error::AppError;
use crate::models::{validate_torrent_hash, MediaType, Suggestions, TorrentFile};
use crate::rename::filebot::FileBot;
use crate::rename::parser::parse_output;
use crate::sanitize::sanitize;

/// Generate rename suggestions for every file of a torrent.
pub async fn suggest(
    client: &QbClient,
    filebot: &FileBot,
    torrent_hash: &str,
    media_type: &str,
) -> Result<Suggestions, AppError> {
    let hash = validate_torrent_hash(torrent_hash).map_err(AppError::Validation)?;
    let media_type: MediaType = media_type.parse().map_err(AppError::Validation)?;

    let files = client.files(hash).await?;
    if files.is_empty() {
        return Err(AppError::NotFound(
            "No files found for this torrent".to_string(),
        ));
    }

    let properties = client.properties(hash).await?;
    let save_path = properties
        .save_path
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::NotFound("Could not determine torrent save path".to_string()))?;

    let candidates = candidate_paths(&save_path, &files);
    if candidates.is_empty() {
        return Err(AppError::NoValidInput(
            "No valid files found after sanitization".to_string(),
        ));
    }

    let output = match filebot.dry_run(&candidates, media_type).await {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(hash, error = %e, detail = ?e, "FileBot dry run failed");
            return Err(e.into());
        }
    };

    let stderr = output.stderr.trim();
    if !stderr.is_empty() {
        tracing::debug!(hash, stderr, "FileBot wrote to stderr");
    }

    let suggestions = parse_output(&output.stdout);
    tracing::info!(
        hash,
        files = candidates.len(),
        suggestions = suggestions.len(),
        "generated rename suggestions"
    );

    Ok(Suggestions {
        suggestions,
        output: output.stdout,
    })
}

/// Join each sanitized file name onto the save path.
///
/// Names that fail sanitization are dropped.
pub fn candidate_paths(save_path: &str, files: &[TorrentFile]) -> Vec<String> {
    files
        .iter()
        .filter_map(|file| match sanitize(&file.name) {
            Ok(name) => {
                let relative = name.trim_start_matches('/');
                if relative.is_empty() {
                    tracing::warn!(file = %file.name, "skipping invalid file");
                    return None;
                }
                Some(Path::new(save_path).join(relative).to_string_lossy().into_owned())
            }
            Err(e) => {
                tracing::warn!(file = %file.name, error = %e, "skipping invalid file");
                None
            }
        })
        .collect()
}
