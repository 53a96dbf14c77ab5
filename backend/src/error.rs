use thiserror::Error;

/// Problems that stop a run before any request reaches the platform.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("YOUTUBE_API_KEY environment variable must be set")]
    MissingApiKey,

    #[error("Please add at least 1 keyword.")]
    NoKeywords,

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// A single failed call against the platform. Recoverable: the keyword or
/// batch it belonged to is skipped and the run carries on.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unreadable response: {0}")]
    Decode(String),

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for RequestError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RequestError::Decode(e.to_string())
        } else {
            RequestError::Transport(e.to_string())
        }
    }
}
