use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gave up on {url} after repeated HTTP {status}")]
    RetriesExhausted { url: String, status: u16 },

    #[error("blocked by {url} (HTTP {status})")]
    Blocked { url: String, status: u16 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed response for {context}: {reason}")]
    Malformed { context: String, reason: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Coarse failure classes the retry layers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection, timeout, or a status the HTTP client already retried.
    Transport,
    /// 403 / 412: automated-traffic detection.
    Blocked,
    /// Non-2xx status the client does not retry on its own.
    Status,
    /// Body undecodable or missing the expected shape.
    Malformed,
}

impl ScraperError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Http(_) | Self::RetriesExhausted { .. } | Self::InvalidUrl { .. } => {
                FailureKind::Transport
            }
            Self::Blocked { .. } => FailureKind::Blocked,
            Self::UnexpectedStatus { .. } => FailureKind::Status,
            Self::Deserialize { .. } | Self::Malformed { .. } => FailureKind::Malformed,
        }
    }
}
