//! Batch rename application
//!
//! Renames go to qBittorrent one at a time. Each outcome is recorded on its
//! own; a failed item never stops the rest of the batch.

use serde::{Deserialize, Serialize};

use crate::api::QbClient;
use crate::config::LimitsConfig;
use crate::error::AppError;
use crate::models::{validate_torrent_hash, BatchResult, RenameResult, RenameSuggestion};
use crate::sanitize::{contains_traversal, sanitize};

/// Bounds on a rename batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameLimits {
    pub max_batch_size: usize,
    pub max_path_length: usize,
}

impl Default for RenameLimits {
    fn default() -> Self {
        Self::from(&LimitsConfig::default())
    }
}

impl From<&LimitsConfig> for RenameLimits {
    fn from(config: &LimitsConfig) -> Self {
        Self {
            max_batch_size: config.max_rename_batch_size,
            max_path_length: config.max_path_length,
        }
    }
}

/// Apply a batch of renames to a torrent's files.
///
/// Returns `Ok` with `success == false` when some items failed; `Err` only
/// for invalid input or when nothing survives sanitization.
pub async fn apply_renames(
    client: &QbClient,
    limits: RenameLimits,
    torrent_hash: &str,
    renames: &[RenameSuggestion],
) -> Result<BatchResult, AppError> {
    let hash = validate_torrent_hash(torrent_hash).map_err(AppError::Validation)?;
    validate_batch(limits, renames)?;

    let valid = sanitize_batch(renames);
    if valid.is_empty() {
        return Err(AppError::NoValidInput(
            "No valid renames after sanitization".to_string(),
        ));
    }

    let mut results = Vec::with_capacity(valid.len());
    for rename in valid {
        match client
            .rename_file(hash, &rename.old_path, &rename.new_path)
            .await
        {
            Ok(()) => results.push(RenameResult::succeeded(rename.old_path, rename.new_path)),
            Err(e) => {
                tracing::error!(old_path = %rename.old_path, error = %e, "failed to rename file");
                results.push(RenameResult::failed(
                    rename.old_path,
                    rename.new_path,
                    e.to_string(),
                ));
            }
        }
    }

    let batch = BatchResult::from_results(results);
    tracing::info!(hash, success = batch.success, "{}", batch.message);
    Ok(batch)
}

/// Check batch size and per-path length bounds
pub fn validate_batch(limits: RenameLimits, renames: &[RenameSuggestion]) -> Result<(), AppError> {
    if renames.is_empty() {
        return Err(AppError::Validation("No renames provided".to_string()));
    }
    if renames.len() > limits.max_batch_size {
        return Err(AppError::Validation(format!(
            "\"renames\" must contain less than or equal to {} items",
            limits.max_batch_size
        )));
    }

    for (i, rename) in renames.iter().enumerate() {
        for (field, path) in [("oldPath", &rename.old_path), ("newPath", &rename.new_path)] {
            if path.is_empty() {
                return Err(AppError::Validation(format!(
                    "\"renames[{}].{}\" is not allowed to be empty",
                    i, field
                )));
            }
            if path.chars().count() > limits.max_path_length {
                return Err(AppError::Validation(format!(
                    "\"renames[{}].{}\" length must be less than or equal to {} characters long",
                    i, field, limits.max_path_length
                )));
            }
        }
    }

    Ok(())
}

/// Sanitize both sides of every pair, dropping pairs that do not survive
pub fn sanitize_batch(renames: &[RenameSuggestion]) -> Vec<RenameSuggestion> {
    renames
        .iter()
        .filter_map(|rename| {
            let (old_path, new_path) =
                match (sanitize(&rename.old_path), sanitize(&rename.new_path)) {
                    (Ok(old), Ok(new)) => (old, new),
                    _ => {
                        tracing::warn!(
                            old_path = %rename.old_path,
                            new_path = %rename.new_path,
                            "skipping invalid rename"
                        );
                        return None;
                    }
                };

            if contains_traversal(&old_path) || contains_traversal(&new_path) {
                tracing::warn!(
                    old_path = %rename.old_path,
                    new_path = %rename.new_path,
                    "skipping potentially dangerous rename"
                );
                return None;
            }

            Some(RenameSuggestion { old_path, new_path })
        })
        .collect()
}
