//! Error types for pipeline operations

use transport::{StatusCode, TransportError};

/// Errors surfaced to callers of the pipeline.
///
/// `Clone` because a single refresh failure is handed to every request that
/// was waiting on that refresh.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(#[from] TransportError),

    #[error("HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },

    /// 401 on a request that was already resent once, or with no refresh
    /// token to try.
    #[error("authentication exhausted ({status}): {body}")]
    AuthExhausted { status: StatusCode, body: String },

    #[error("token refresh failed: {0}")]
    RefreshFailed(Box<Error>),

    #[error("response decode error: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Http { status, .. } | Error::AuthExhausted { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
