//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

/// Query string of `POST /generate-kmz`.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateQuery {
    /// `kmz` (default) or `kml`
    pub output_format: Option<String>,
}

/// Optional JSON body of `POST /generate-kmz`.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    /// Feed to convert; falls back to the configured `GTFS_URL`
    pub gtfs_url: Option<String>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
