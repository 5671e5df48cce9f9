//! Application error taxonomy
//!
//! Every operation exposed to the HTTP surface or the CLI returns
//! [`AppError`]. The variants decide the status code and how much detail the
//! caller gets to see.

use thiserror::Error;

use crate::api::qbittorrent::QbError;
use crate::rename::filebot::FileBotError;

#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or out-of-bounds input
    #[error("Validation error: {0}")]
    Validation(String),

    /// The daemon reported nothing usable for the request
    #[error("{0}")]
    NotFound(String),

    /// Input was well formed but nothing survived filtering
    #[error("{0}")]
    NoValidInput(String),

    /// Daemon credentials rejected, login attempts exhausted, or the
    /// session still refused after every re-authentication
    #[error("Failed to authenticate with qBittorrent")]
    Authentication,

    /// An external call exceeded its deadline
    #[error("{0} timed out")]
    Timeout(String),

    /// FileBot failed; detail stays in the server log
    #[error("FileBot execution failed")]
    ExternalTool(#[source] FileBotError),

    /// Any other daemon failure
    #[error("qBittorrent request failed: {0}")]
    Daemon(#[source] QbError),
}

impl From<QbError> for AppError {
    fn from(err: QbError) -> Self {
        match err {
            QbError::Authentication | QbError::Forbidden(_) => AppError::Authentication,
            QbError::RequestFailed(ref e) if e.is_timeout() => {
                AppError::Timeout("qBittorrent request".to_string())
            }
            other => AppError::Daemon(other),
        }
    }
}

impl From<FileBotError> for AppError {
    fn from(err: FileBotError) -> Self {
        match err {
            FileBotError::Timeout(_) => AppError::Timeout("FileBot".to_string()),
            other => AppError::ExternalTool(other),
        }
    }
}
