//! FileBot subprocess runner
//!
//! Runs `filebot -rename` in test mode. The argument vector is passed to the
//! process directly; nothing goes through a shell.

use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

use crate::config::FileBotConfig;
use crate::models::MediaType;

/// Errors from FileBot invocations
#[derive(Debug, Error)]
pub enum FileBotError {
    #[error("FileBot binary '{0}' not found. Install it first.")]
    NotFound(String),

    #[error("Failed to start FileBot: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("FileBot did not finish within {0:?}")]
    Timeout(Duration),

    #[error("FileBot exited with status {code:?}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("Failed to collect FileBot output: {0}")]
    Io(#[source] std::io::Error),
}

/// Captured output of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// FileBot runner
#[derive(Debug, Clone)]
pub struct FileBot {
    /// Path to filebot binary
    filebot_path: String,
    timeout: Duration,
    tv_database: String,
    movie_database: String,
    tv_format: String,
    movie_format: String,
}

impl FileBot {
    /// Create a runner from configuration
    pub fn new(config: &FileBotConfig) -> Self {
        Self {
            filebot_path: config.path.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            tv_database: config.tv_database.clone(),
            movie_database: config.movie_database.clone(),
            tv_format: config.tv_format.clone(),
            movie_format: config.movie_format.clone(),
        }
    }

    /// Create with custom filebot path and default settings
    pub fn with_path(path: impl Into<String>) -> Self {
        let config = FileBotConfig {
            path: path.into(),
            ..FileBotConfig::default()
        };
        Self::new(&config)
    }

    /// Override the wall-clock timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Metadata database for a media type
    pub fn database(&self, media_type: MediaType) -> &str {
        match media_type {
            MediaType::Tv => &self.tv_database,
            MediaType::Movie => &self.movie_database,
        }
    }

    /// Naming format for a media type
    pub fn format(&self, media_type: MediaType) -> &str {
        match media_type {
            MediaType::Tv => &self.tv_format,
            MediaType::Movie => &self.movie_format,
        }
    }

    /// Argument vector for a dry-run rename of `paths`
    pub fn dry_run_args(&self, paths: &[String], media_type: MediaType) -> Vec<String> {
        let mut args = Vec::with_capacity(paths.len() + 8);
        args.push("-rename".to_string());
        args.extend(paths.iter().cloned());
        args.extend([
            "--db".to_string(),
            self.database(media_type).to_string(),
            "--format".to_string(),
            self.format(media_type).to_string(),
            "--action".to_string(),
            "test".to_string(),
            "-non-strict".to_string(),
        ]);
        args
    }

    /// Run FileBot in test mode over `paths`.
    ///
    /// The process is killed if it outlives the timeout or if the returned
    /// future is dropped.
    pub async fn dry_run(
        &self,
        paths: &[String],
        media_type: MediaType,
    ) -> Result<ToolOutput, FileBotError> {
        let args = self.dry_run_args(paths, media_type);
        tracing::debug!(
            filebot = %self.filebot_path,
            files = paths.len(),
            media_type = %media_type,
            "running FileBot dry run"
        );

        let child = Command::new(&self.filebot_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FileBotError::NotFound(self.filebot_path.clone())
                } else {
                    FileBotError::SpawnFailed(e)
                }
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(FileBotError::Io)?,
            Err(_) => return Err(FileBotError::Timeout(self.timeout)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(FileBotError::Failed {
                code: output.status.code(),
                stderr,
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }
}

impl Default for FileBot {
    fn default() -> Self {
        Self::new(&FileBotConfig::default())
    }
}
