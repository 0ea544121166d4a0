use reqwest::StatusCode;
use thiserror::Error;

/// Failures that abort the run before any VU starts.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("No valid preset refresh token; set --refresh-token or MEDICALL_REFRESH_TOKEN")]
    InvalidPresetToken,

    #[error("Token refresh request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Token refresh returned {status} without both an access and a refresh token")]
    MissingTokens { status: StatusCode },
}

/// A failed transaction. Recorded and logged; never stops the iteration.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected status {status}")]
    Status { status: StatusCode, body: String },
}

impl StepError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Request(err) => err.status(),
            Self::Status { status, .. } => Some(*status),
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Self::Request(_) => "",
            Self::Status { body, .. } => body,
        }
    }
}
