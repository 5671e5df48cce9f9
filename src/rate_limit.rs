//! Per-client request rate limiting for `/api` routes
//!
//! Fixed window per client address: at most `max_requests` in each
//! `window`. The counter resets when the window that started with the
//! client's first request has elapsed.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::LimitsConfig;
use crate::server::ApiError;

pub const HEADER_RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Outcome of one admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the client's window resets
    pub reset_after: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Shared fixed-window limiter keyed by client address
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    message: String,
    clients: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32, message: impl Into<String>) -> Self {
        Self {
            window,
            max_requests,
            message: message.into(),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &LimitsConfig) -> Self {
        Self::new(
            Duration::from_millis(config.rate_limit_window_ms),
            config.rate_limit_max_requests,
            config.rate_limit_message.clone(),
        )
    }

    /// Message sent with a 429
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Count a request from `client` at `now` and decide whether to admit it.
    pub fn check(&self, client: IpAddr, now: Instant) -> RateLimitStatus {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        // Drop expired windows
        clients.retain(|_, w| now.saturating_duration_since(w.started) < self.window);

        let window = clients.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });
        let reset_after = self
            .window
            .saturating_sub(now.saturating_duration_since(window.started));

        if window.count >= self.max_requests {
            return RateLimitStatus {
                allowed: false,
                limit: self.max_requests,
                remaining: 0,
                reset_after,
            };
        }

        window.count += 1;
        RateLimitStatus {
            allowed: true,
            limit: self.max_requests,
            remaining: self.max_requests - window.count,
            reset_after,
        }
    }
}

/// Middleware admitting or rejecting a request against the shared limiter
pub async fn enforce_rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_addr(&request);
    let status = limiter.check(client, Instant::now());

    if !status.allowed {
        tracing::warn!(%client, "rate limit exceeded");
        let mut response =
            ApiError::new(StatusCode::TOO_MANY_REQUESTS, limiter.message()).into_response();
        insert_rate_limit_headers(response.headers_mut(), &status);
        if let Ok(value) = HeaderValue::from_str(&status.reset_after.as_secs().max(1).to_string()) {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        return response;
    }

    let mut response = next.run(request).await;
    insert_rate_limit_headers(response.headers_mut(), &status);
    response
}

/// Peer address from the connection, or a shared bucket when unknown
fn client_addr(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn insert_rate_limit_headers(headers: &mut HeaderMap, status: &RateLimitStatus) {
    let values = [
        (HEADER_RATE_LIMIT_LIMIT, status.limit.to_string()),
        (HEADER_RATE_LIMIT_REMAINING, status.remaining.to_string()),
        (
            HEADER_RATE_LIMIT_RESET,
            status.reset_after.as_secs().to_string(),
        ),
    ];
    for (name, value) in values {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    }
}
