use thiserror::Error;

/// A failed page fetch, as reported by a [`FeedProvider`](crate::api::FeedProvider).
///
/// Cloneable because the controller both stores the last failure for the
/// presentation layer and hands it back to the caller of `load_next_page`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("provider responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode page: {0}")]
    Decode(String),

    #[error("page holds {len} posts, more than the page size of {max}")]
    OversizedPage { len: usize, max: usize },
}

impl ProviderError {
    /// Maps a non-success HTTP status to the matching variant.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Unauthorized(message),
            _ => Self::Status { status, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for ProviderError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => err.into(),
            reqwest_middleware::Error::Middleware(err) => Self::Network(err.to_string()),
        }
    }
}

/// Crate-level error for the binary and the fixture loader.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FeedError>;
