//! Fetch error types.

/// Errors that can occur while downloading an input.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed (network error, timeout, invalid header, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream rejected the credentials
    #[error("unauthorized: check the GitHub token")]
    Unauthorized,

    /// Upstream returned a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// A JSON contents envelope could not be decoded
    #[error("contents envelope error: {message}")]
    Envelope { message: String },
}
