//! End-to-end generation: fetch both inputs, assemble, merge, render.

use futures::TryFutureExt;
use futures::future::try_join;
use tracing::info;

use crate::assemble::assemble;
use crate::cache::CachedOverlayClient;
use crate::config::ConfigError;
use crate::fetch::{FeedClient, FetchError};
use crate::gtfs::{Feed, FeedError};
use crate::kml::{KmlError, OutputFormat, render};
use crate::overlay::{OverlayError, RailSegment, merge_rail_segments};

/// Anything that stops a document from being produced.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to fetch GTFS feed: {0}")]
    FeedFetch(#[source] FetchError),

    #[error("failed to fetch rail overlay: {0}")]
    OverlayFetch(#[source] FetchError),

    #[error("invalid GTFS feed: {0}")]
    Feed(#[from] FeedError),

    #[error("invalid rail overlay: {0}")]
    Overlay(#[from] OverlayError),

    #[error("failed to write document: {0}")]
    Kml(#[from] KmlError),

    /// The blocking build task panicked or was cancelled
    #[error("generation task failed: {0}")]
    Task(String),
}

/// A validated generation request.
#[derive(Debug, Clone)]
pub struct Job {
    pub gtfs_url: String,
    pub github_token: String,
    pub format: OutputFormat,
    /// Name of the root folder
    pub document_name: String,
}

impl Job {
    /// Blank or missing inputs are rejected before any network activity.
    pub fn new(
        gtfs_url: Option<String>,
        github_token: Option<String>,
        format: OutputFormat,
        document_name: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let github_token = present(github_token).ok_or(ConfigError::MissingToken)?;
        let gtfs_url = present(gtfs_url).ok_or(ConfigError::MissingFeedUrl)?;

        Ok(Self {
            gtfs_url,
            github_token,
            format,
            document_name: document_name.into(),
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build the document from already downloaded inputs.
///
/// The feed is laid out first; the rail overlay is appended after every
/// route.
pub fn build_overlay(
    feed_bytes: &[u8],
    overlay_bytes: &[u8],
    document_name: &str,
    format: OutputFormat,
) -> Result<Vec<u8>, GenerateError> {
    let feed = Feed::from_zip_bytes(feed_bytes)?;
    let mut layers = assemble(&feed, document_name);

    let segments = RailSegment::parse_kmz(overlay_bytes)?;
    merge_rail_segments(&mut layers, &segments);

    let document = layers.into_document();
    let bytes = render(&document, format)?;
    info!(
        %format,
        placemarks = document.root.placemark_count(),
        bytes = bytes.len(),
        "rendered document"
    );

    Ok(bytes)
}

/// Fetch both inputs concurrently and build the document.
///
/// Either fetch failing fails the whole job.
pub async fn generate(
    feed: &FeedClient,
    overlay: &CachedOverlayClient,
    job: &Job,
) -> Result<Vec<u8>, GenerateError> {
    let (feed_bytes, overlay_bytes) = try_join(
        feed.fetch(&job.gtfs_url).map_err(GenerateError::FeedFetch),
        overlay
            .fetch(&job.github_token)
            .map_err(GenerateError::OverlayFetch),
    )
    .await?;

    let document_name = job.document_name.clone();
    let format = job.format;
    tokio::task::spawn_blocking(move || {
        build_overlay(&feed_bytes, &overlay_bytes, &document_name, format)
    })
    .await
    .map_err(|e| GenerateError::Task(e.to_string()))?
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
