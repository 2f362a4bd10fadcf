#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0} is not supported by this provider")]
    Unsupported(&'static str),

    #[error("query rejected: {0}")]
    QueryRejected(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Failures worth an inline error row and a manual retry, as opposed to
    /// answers the server gave on purpose.
    pub fn is_fetch_failure(&self) -> bool {
        match self {
            Self::Timeout | Self::Transport(_) | Self::Io(_) => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Decode(_) | Self::NotFound(_) | Self::Unsupported(_) | Self::QueryRejected(_) => {
                false
            }
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
