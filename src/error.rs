//! Error types

use std::time::Duration;

/// Why a fetch cycle produced no records.
///
/// Never fatal: the scheduler logs it (timer cycles) or shows it once (manual
/// cycles) and carries on.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("feed answered with HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed feed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no answer from feed after {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// Short text suitable for a user-facing notification.
    pub fn cause(&self) -> String {
        self.to_string()
    }
}

/// The feed client could not be built.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid feed URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("cannot build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("refresh scheduler has stopped")]
    Stopped,
}
