use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("{webhook} webhook url is not configured")]
    NotConfigured { webhook: &'static str },
    #[error("{webhook} webhook request failed: {source}")]
    Transport {
        webhook: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{webhook} webhook returned status {status}")]
    Status { webhook: &'static str, status: u16 },
    #[error("{webhook} webhook returned a body that is not JSON: {source}")]
    InvalidBody {
        webhook: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("could not read document `{path}`: {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WebhookError {
    /// Transport failures and 5xx responses are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { source, .. } => !source.is_builder(),
            Self::Status { status, .. } => *status >= 500,
            Self::NotConfigured { .. } | Self::InvalidBody { .. } | Self::ReadDocument { .. } => {
                false
            }
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            Self::NotConfigured { .. } => "not_configured",
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "status",
            Self::InvalidBody { .. } => "invalid_body",
            Self::ReadDocument { .. } => "read_document",
        }
    }
}
