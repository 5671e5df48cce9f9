//! Torrent listing with per-torrent enrichment
//!
//! The base list comes from one call; properties and file listings are then
//! fetched for every torrent at once. A torrent whose detail calls fail is
//! still returned with whatever could be fetched.

use futures::future::join_all;

use crate::api::QbClient;
use crate::error::AppError;
use crate::models::{EnrichedTorrent, Torrent};

/// List all torrents, each enriched with properties and files where possible.
///
/// Fails only if the base list cannot be fetched. Output order follows the
/// daemon's list order.
pub async fn list_enriched_torrents(client: &QbClient) -> Result<Vec<EnrichedTorrent>, AppError> {
    let torrents = client.torrents().await?;
    tracing::debug!(count = torrents.len(), "fetched torrent list");

    let enriched = join_all(torrents.into_iter().map(|t| enrich(client, t))).await;
    Ok(enriched)
}

/// Fetch properties and files for one torrent concurrently
async fn enrich(client: &QbClient, torrent: Torrent) -> EnrichedTorrent {
    let (properties, files) = tokio::join!(
        client.properties(&torrent.hash),
        client.files(&torrent.hash)
    );

    let mut enriched = EnrichedTorrent::base(torrent);

    match properties {
        Ok(properties) => enriched.properties = Some(properties),
        Err(e) => tracing::warn!(
            hash = %enriched.torrent.hash,
            error = %e,
            "failed to fetch torrent properties"
        ),
    }

    match files {
        Ok(files) => enriched.files = Some(files),
        Err(e) => tracing::warn!(
            hash = %enriched.torrent.hash,
            error = %e,
            "failed to fetch torrent files"
        ),
    }

    enriched
}
