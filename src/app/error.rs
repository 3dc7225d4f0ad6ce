use thiserror::Error;

#[derive(Error, Debug)]
pub enum IslanderError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Server returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("{0}")]
    Site(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid URL: unsupported scheme {0}")]
    UnsupportedScheme(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cookie already imported: {0}")]
    IdentityExists(String),

    #[error("Cookie not found: {0}")]
    IdentityNotFound(String),

    #[error("Invalid cookie payload: {0}")]
    InvalidIdentityPayload(String),

    #[error("{0}")]
    Other(String),
}

impl IslanderError {
    /// Transport failures and non-2xx responses.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. })
    }

    /// Whether the request executor may try again after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for IslanderError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => IslanderError::Status {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None => IslanderError::Transport(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, IslanderError>;
