use thiserror::Error;

/// Failure talking to an upstream HTTP API
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn provider_error(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Whether retrying later can help
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::RateLimited | ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
