//! Error types for gateway and session operations.

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed transport-level failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Client error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(#[source] BoxError),

    /// The server answered 401 or 404; the session has been torn down.
    #[error("Authentication failure (HTTP {status}), session cleared")]
    AuthFailure {
        /// HTTP status code.
        status: u16,
    },

    /// Any other non-2xx answer.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-supplied message, or the status text.
        message: String,
    },

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Session persistence failed.
    #[error("Session store error: {0}")]
    Session(#[from] crate::session::SessionStoreError),

    /// Login was rejected or returned nothing usable.
    #[error("Login failed: {0}")]
    Login(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Wraps any transport failure.
    pub fn network(err: impl Into<BoxError>) -> Self {
        Self::Network(err.into())
    }

    /// Returns true if this error tore down the session.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthFailure { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::network(err)
    }
}
