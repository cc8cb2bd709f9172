//! Error types for EmoRec.

use thiserror::Error;

/// Main error type for all EmoRec operations.
#[derive(Debug, Error)]
pub enum EmoRecError {
    /// The request was malformed or failed validation.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// An optional integration (Spotify, Genius) is not configured.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Spotify rejected our client credentials.
    #[error("Spotify authentication failed: {0}")]
    SpotifyAuth(String),

    /// The requested track or artist does not exist upstream.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Too many requests - rate limited upstream.
    #[error("Quota exceeded: too many requests")]
    QuotaExceeded,

    /// Upstream API returned an error.
    #[error("API error: {0}")]
    ApiError(String),

    /// Embedding backend failed or produced unusable vectors.
    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    /// HTTP request failed.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Collage rendering or PNG encoding failed.
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for EmoRec operations.
pub type Result<T> = std::result::Result<T, EmoRecError>;
