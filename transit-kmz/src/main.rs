use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transit_kmz::cache::CachedOverlayClient;
use transit_kmz::config::AppConfig;
use transit_kmz::fetch::{FeedClient, OverlayClient};
use transit_kmz::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");
    if config.gtfs_url.is_none() {
        warn!("GTFS_URL not set. Requests must supply gtfs_url.");
    }
    if config.github_token.is_none() {
        warn!("GITHUB_TOKEN not set. Requests must supply a github-token header.");
    }

    let feed = FeedClient::new(config.feed_client()).expect("Failed to create feed client");
    let overlay =
        OverlayClient::new(config.overlay_client()).expect("Failed to create overlay client");
    info!(url = overlay.url(), "rail overlay source");
    let overlay = CachedOverlayClient::new(overlay, &config.cache());

    let addr = config.bind_addr;
    let state = AppState::new(feed, overlay, config);
    let app = create_router(state);

    info!("transit-kmz listening on http://{addr}");
    info!("  GET  /health        - Health check");
    info!("  POST /generate-kmz  - Generate KMZ/KML (?output_format=kmz|kml)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
