//! Error types shared by the widget core.
use thiserror::Error;

/// Failure of a single exchange with the chat backend.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to reach chat backend: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("chat backend did not answer in time")]
    Timeout,
    #[error("chat backend answered with status {0}")]
    Status(u16),
    #[error("chat backend sent an unusable reply: {0}")]
    MalformedReply(String),
}

impl ChatError {
    /// Short label used in logs and in `SendOutcome::Failed`.
    pub fn kind(&self) -> FailureKind {
        match self {
            ChatError::Transport(_) => FailureKind::Transport,
            ChatError::Timeout => FailureKind::Timeout,
            ChatError::Status(_) => FailureKind::Status,
            ChatError::MalformedReply(_) => FailureKind::MalformedReply,
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Timeout
        } else if err.is_decode() {
            ChatError::MalformedReply(err.to_string())
        } else if let Some(status) = err.status() {
            ChatError::Status(status.as_u16())
        } else {
            ChatError::Transport(err)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Timeout,
    Status,
    MalformedReply,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize transcript: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
    #[error("config I/O failed at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode config: {0}")]
    Parse(#[from] serde_json::Error),
}
