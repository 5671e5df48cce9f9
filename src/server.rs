//! HTTP API for the presentation layer
//!
//! - `GET  /api/torrents`: enriched torrent list
//! - `POST /api/filebot/suggest`: rename suggestions for a torrent
//! - `POST /api/torrents/rename`: apply a rename batch
//!
//! Errors are `{"error": "..."}` with a 4xx or 5xx status. A rename batch
//! with failed items is still a 200; the body's `success` flag carries the
//! outcome.
//!
//! Every `/api` route is rate limited per client address, and every
//! response carries a fixed set of security headers.

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::QbClient;
use crate::config::Config;
use crate::error::AppError;
use crate::models::{BatchResult, EnrichedTorrent, RenameSuggestion, Suggestions};
use crate::rate_limit::{enforce_rate_limit, RateLimiter};
use crate::rename::{self, FileBot, RenameLimits};
use crate::torrents;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<QbClient>,
    pub filebot: Arc<FileBot>,
    pub limits: RenameLimits,
    /// Deadline for a whole suggestion request
    pub suggest_timeout: Duration,
    /// Deadline for a whole rename batch
    pub rename_timeout: Duration,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// State with default limits and deadlines
    pub fn new(client: QbClient, filebot: FileBot) -> Self {
        let config = Config::default();
        Self {
            client: Arc::new(client),
            filebot: Arc::new(filebot),
            limits: RenameLimits::from(&config.limits),
            suggest_timeout: Duration::from_millis(config.limits.suggest_timeout_ms),
            rename_timeout: Duration::from_millis(config.limits.rename_timeout_ms),
            rate_limiter: Arc::new(RateLimiter::from_config(&config.limits)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            client: Arc::new(QbClient::new(&config.qbittorrent)),
            filebot: Arc::new(FileBot::new(&config.filebot)),
            limits: RenameLimits::from(&config.limits),
            suggest_timeout: Duration::from_millis(config.limits.suggest_timeout_ms),
            rename_timeout: Duration::from_millis(config.limits.rename_timeout_ms),
            rate_limiter: Arc::new(RateLimiter::from_config(&config.limits)),
        }
    }

    pub fn with_limits(mut self, limits: RenameLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_timeouts(mut self, suggest: Duration, rename: Duration) -> Self {
        self.suggest_timeout = suggest;
        self.rename_timeout = rename;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Arc::new(limiter);
        self
    }
}

// =============================================================================
// Request / Response Bodies
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    #[serde(default)]
    pub torrent_hash: String,
    #[serde(rename = "type", default)]
    pub media_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    #[serde(default)]
    pub torrent_hash: String,
    pub renames: Vec<RenameSuggestion>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

// =============================================================================
// Errors
// =============================================================================

/// Error response sent to the client
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Map an application error to a response.
    ///
    /// Server-side failures are logged in full; the client only sees
    /// `fallback` or a fixed message.
    pub fn from_app(err: AppError, fallback: &str) -> Self {
        match err {
            AppError::Validation(_) | AppError::NotFound(_) | AppError::NoValidInput(_) => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string())
            }
            AppError::Authentication => {
                tracing::error!("qBittorrent authentication failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            AppError::Timeout(_) => {
                tracing::warn!(error = %err, "request timed out");
                Self::new(StatusCode::GATEWAY_TIMEOUT, err.to_string())
            }
            AppError::ExternalTool(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
                .with_details("FileBot process failed. Check server logs."),
            AppError::Daemon(_) => {
                tracing::error!(error = %err, "{}", fallback);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, fallback)
            }
        }
    }

    fn from_rejection(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::UNPROCESSABLE_ENTITY => StatusCode::BAD_REQUEST,
            other => other,
        };
        Self::new(status, format!("Validation error: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.error,
            details: self.details.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_torrents(
    State(state): State<AppState>,
) -> Result<Json<Vec<EnrichedTorrent>>, ApiError> {
    torrents::list_enriched_torrents(&state.client)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_app(e, "Failed to fetch torrents"))
}

async fn suggest_renames(
    State(state): State<AppState>,
    payload: Result<Json<SuggestRequest>, JsonRejection>,
) -> Result<Json<Suggestions>, ApiError> {
    let Json(request) = payload.map_err(ApiError::from_rejection)?;

    let work = rename::suggest(
        &state.client,
        &state.filebot,
        &request.torrent_hash,
        &request.media_type,
    );
    tokio::time::timeout(state.suggest_timeout, work)
        .await
        .unwrap_or_else(|_| Err(AppError::Timeout("Suggestion generation".to_string())))
        .map(Json)
        .map_err(|e| ApiError::from_app(e, "Failed to generate suggestions"))
}

async fn rename_files(
    State(state): State<AppState>,
    payload: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<BatchResult>, ApiError> {
    let Json(request) = payload.map_err(ApiError::from_rejection)?;

    let work = rename::apply_renames(
        &state.client,
        state.limits,
        &request.torrent_hash,
        &request.renames,
    );
    tokio::time::timeout(state.rename_timeout, work)
        .await
        .unwrap_or_else(|_| Err(AppError::Timeout("Rename".to_string())))
        .map(Json)
        .map_err(|e| ApiError::from_app(e, "Failed to rename files"))
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Not found")
}

// =============================================================================
// Server
// =============================================================================

/// Headers set on every response unless a handler already set them
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
    (
        "content-security-policy",
        "default-src 'self'; style-src 'self' 'unsafe-inline'; script-src 'self'; \
         img-src 'self' data:; base-uri 'self'; form-action 'self'; \
         frame-ancestors 'self'; object-src 'none'",
    ),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// Build the API router
pub fn router(state: AppState, body_limit: usize) -> Router {
    let rate_limit = middleware::from_fn_with_state(state.rate_limiter.clone(), enforce_rate_limit);

    let mut app = Router::new()
        .route("/api/health", get(health))
        .route("/api/torrents", get(list_torrents))
        .route("/api/torrents/rename", post(rename_files))
        .route("/api/filebot/suggest", post(suggest_renames))
        .route_layer(rate_limit)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    for &(name, value) in SECURITY_HEADERS {
        app = app.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }
    app
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: &Config) -> Result<()> {
    let app = router(AppState::from_config(config), config.server.body_limit_bytes);
    let addr = format!("{}:{}", config.server.bind, config.server.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(%addr, qbittorrent = %config.qbittorrent.url, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
