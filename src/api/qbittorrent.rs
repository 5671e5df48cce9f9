//! qBittorrent Web API client
//!
//! Cookie-session client for the qBittorrent v2 API.
//! API docs: https://github.com/qbittorrent/qBittorrent/wiki/WebUI-API-(qBittorrent-4.1)
//!
//! The session cookie and the login attempt counter are shared by every
//! handler using the client. Both live behind one async mutex, and the lock
//! is held for the whole login call so concurrent requests never race two
//! logins against each other.

use reqwest::{header, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::QbittorrentConfig;
use crate::models::{Torrent, TorrentFile, TorrentProperties};

/// qBittorrent API error types
#[derive(Error, Debug)]
pub enum QbError {
    #[error("Failed to authenticate with qBittorrent")]
    Authentication,

    #[error("Session rejected (403) after {0} attempts")]
    Forbidden(u32),

    #[error("qBittorrent returned HTTP {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// Session state shared across requests
#[derive(Debug, Default)]
struct Session {
    /// `SID=...` pair from the last successful login
    cookie: Option<String>,
    /// Login attempts since the last success
    auth_attempts: u32,
}

/// qBittorrent API client
pub struct QbClient {
    base_url: String,
    username: String,
    password: String,
    client: reqwest::Client,
    session: Mutex<Session>,
    auth_timeout: Duration,
    request_timeout: Duration,
    max_auth_retries: u32,
    max_retries: u32,
}

impl QbClient {
    /// Create a client from configuration
    pub fn new(config: &QbittorrentConfig) -> Self {
        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            client: reqwest::Client::new(),
            session: Mutex::new(Session::default()),
            auth_timeout: Duration::from_millis(config.auth_timeout_ms),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            max_auth_retries: config.max_auth_retries,
            max_retries: config.max_retries,
        }
    }

    /// Create a client with a custom base URL and default limits (for testing)
    pub fn with_base_url(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let config = QbittorrentConfig {
            url: base_url.into(),
            username: username.into(),
            password: password.into(),
            ..QbittorrentConfig::default()
        };
        Self::new(&config)
    }

    /// Override the login and per-request retry bounds
    pub fn with_retry_limits(mut self, max_auth_retries: u32, max_retries: u32) -> Self {
        self.max_auth_retries = max_auth_retries;
        self.max_retries = max_retries;
        self
    }

    /// Log in and cache the session cookie.
    ///
    /// Returns false on any failure, including when the login attempt bound
    /// has already been reached. Never errors.
    pub async fn authenticate(&self) -> bool {
        let mut session = self.session.lock().await;
        self.login(&mut session).await
    }

    /// True if a session cookie is cached
    pub async fn is_authenticated(&self) -> bool {
        self.session.lock().await.cookie.is_some()
    }

    async fn login(&self, session: &mut Session) -> bool {
        if session.auth_attempts >= self.max_auth_retries {
            tracing::error!(
                attempts = session.auth_attempts,
                "max qBittorrent authentication retries exceeded"
            );
            return false;
        }
        session.auth_attempts += 1;

        let url = format!("{}/api/v2/auth/login", self.base_url);
        let result = self
            .client
            .post(&url)
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .timeout(self.auth_timeout)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "qBittorrent authentication failed");
                return false;
            }
        };

        if !response.status().is_success() {
            tracing::error!(
                status = response.status().as_u16(),
                "qBittorrent authentication rejected"
            );
            return false;
        }

        // qBittorrent answers bad credentials with 200 "Fails." and no cookie
        match session_cookie(&response) {
            Some(cookie) => {
                session.cookie = Some(cookie);
                session.auth_attempts = 0;
                tracing::debug!("authenticated with qBittorrent");
                true
            }
            None => {
                tracing::error!("qBittorrent login returned no session cookie");
                false
            }
        }
    }

    /// Cached cookie, logging in first if there is none
    async fn current_cookie(&self) -> Result<String, QbError> {
        let mut session = self.session.lock().await;
        if let Some(cookie) = &session.cookie {
            return Ok(cookie.clone());
        }
        if !self.login(&mut session).await {
            return Err(QbError::Authentication);
        }
        session.cookie.clone().ok_or(QbError::Authentication)
    }

    /// Drop a rejected cookie unless another request already replaced it
    async fn invalidate(&self, rejected: &str) {
        let mut session = self.session.lock().await;
        if session.cookie.as_deref() == Some(rejected) {
            session.cookie = None;
        }
        session.auth_attempts = 0;
    }

    /// Send an authenticated request to `/api/v2{endpoint}`.
    ///
    /// A 403 clears the session and the request is retried with a fresh
    /// login, at most `max_retries` times. Any other non-success status or
    /// transport error is returned as is.
    pub async fn request(
        &self,
        endpoint: &str,
        method: Method,
        form: Option<&[(&str, &str)]>,
    ) -> Result<Response, QbError> {
        let url = format!("{}/api/v2{}", self.base_url, endpoint);
        let mut retries = 0;

        loop {
            let cookie = self.current_cookie().await?;

            let mut builder = self
                .client
                .request(method.clone(), &url)
                .header(header::COOKIE, &cookie)
                .timeout(self.request_timeout);
            if let Some(fields) = form {
                builder = builder.form(fields);
            }

            let response = builder.send().await?;

            match response.status() {
                StatusCode::FORBIDDEN if retries < self.max_retries => {
                    retries += 1;
                    tracing::warn!(endpoint, retries, "qBittorrent session expired, re-authenticating");
                    self.invalidate(&cookie).await;
                    continue;
                }
                StatusCode::FORBIDDEN => {
                    return Err(QbError::Forbidden(retries + 1));
                }
                status if !status.is_success() => {
                    return Err(QbError::Status(status.as_u16()));
                }
                _ => return Ok(response),
            }
        }
    }

    /// GET an endpoint and parse the JSON body
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, QbError> {
        let response = self.request(endpoint, Method::GET, None).await?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| QbError::InvalidResponse(format!("JSON parse error: {}", e)))
    }

    /// List all torrents
    pub async fn torrents(&self) -> Result<Vec<Torrent>, QbError> {
        self.get_json("/torrents/info").await
    }

    /// Get generic properties of a torrent
    pub async fn properties(&self, hash: &str) -> Result<TorrentProperties, QbError> {
        let endpoint = format!("/torrents/properties?hash={}", urlencoding::encode(hash));
        self.get_json(&endpoint).await
    }

    /// Get the file listing of a torrent
    pub async fn files(&self, hash: &str) -> Result<Vec<TorrentFile>, QbError> {
        let endpoint = format!("/torrents/files?hash={}", urlencoding::encode(hash));
        self.get_json(&endpoint).await
    }

    /// Rename a file inside a torrent
    pub async fn rename_file(
        &self,
        hash: &str,
        old_path: &str,
        new_path: &str,
    ) -> Result<(), QbError> {
        let form = [("hash", hash), ("oldPath", old_path), ("newPath", new_path)];
        self.request("/torrents/renameFile", Method::POST, Some(&form[..]))
            .await?;
        Ok(())
    }

    /// Daemon version string
    pub async fn app_version(&self) -> Result<String, QbError> {
        let response = self.request("/app/version", Method::GET, None).await?;
        Ok(response.text().await?.trim().to_string())
    }
}

/// Extract the `name=value` pair of the first `Set-Cookie` header
fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(str::to_string)
}
