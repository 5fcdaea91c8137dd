use reqwest::StatusCode;
use thiserror::Error;

use crate::retry::Retryable;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream resource not found")]
    NotFound,
    #[error("upstream responded with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected upstream payload: {0}")]
    Decode(String),
    #[error("upstream credential not configured")]
    NotConfigured,
}

impl UpstreamError {
    /// Short label used for the `kind` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Status { .. } => "status",
            Self::Transport(e) if e.is_timeout() => "timeout",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
            Self::NotConfigured => "not_configured",
        }
    }
}

impl Retryable for UpstreamError {
    /// Network failures and 5xx are transient; 4xx and bad payloads are not.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => status.is_server_error(),
            Self::Transport(e) => !e.is_builder() && !e.is_decode(),
            Self::NotFound | Self::Decode(_) | Self::NotConfigured => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> UpstreamError {
        UpstreamError::Status {
            status: StatusCode::from_u16(code).expect("status"),
            body: String::new(),
        }
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!status(401).is_retryable());
        assert!(!status(429).is_retryable());
        assert!(!UpstreamError::NotFound.is_retryable());
        assert!(!UpstreamError::Decode("missing field".into()).is_retryable());
    }
}
