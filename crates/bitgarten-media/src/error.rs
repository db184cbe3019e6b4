//! Error types for media operations.

/// Result type alias for media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Media error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error while reading a buffer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Content type cannot be used for the requested operation.
    #[error("Unsupported MIME type: {0}")]
    UnsupportedMime(String),

    /// Malformed data URL.
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Image header could not be decoded.
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// Media source or buffer used in the wrong ready state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}
