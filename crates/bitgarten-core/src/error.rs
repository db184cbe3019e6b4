//! Error types for the core library.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Gateway or session failure.
    #[error("Client error: {0}")]
    Client(#[from] bitgarten_client::Error),

    /// Media primitive failure.
    #[error("Media error: {0}")]
    Media(#[from] bitgarten_media::Error),

    /// The response does not have the expected record shape.
    #[error("Unexpected payload: {0}")]
    Payload(String),

    /// Album ISN 0 is never a real album.
    #[error("Invalid album id: {0}")]
    InvalidAlbumId(u64),

    /// One or more dispatched loads panicked.
    #[error("Task error: {0}")]
    Task(String),

    /// The media source was not opened by the playback element in time.
    #[error("Media source not opened within {0:?}")]
    StreamTimeout(Duration),
}

impl Error {
    /// Returns true if the underlying gateway call tore the session down.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Client(e) if e.is_auth_failure())
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
