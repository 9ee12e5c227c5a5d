//! Serialization error types.

/// Errors from rendering or packaging a document.
#[derive(Debug, thiserror::Error)]
pub enum KmlError {
    /// Writing the markup failed
    #[error("failed to write KML: {0}")]
    Write(String),

    /// Building the KMZ container failed
    #[error("failed to package KMZ: {0}")]
    Package(#[from] zip::result::ZipError),
}
