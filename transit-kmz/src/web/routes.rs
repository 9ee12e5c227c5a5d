//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{error, info, warn};

use crate::config::{AppConfig, ConfigError};
use crate::kml::OutputFormat;
use crate::pipeline::{GenerateError, Job, generate};

use super::dto::*;
use super::state::AppState;

/// Header carrying a per-request GitHub token.
pub const TOKEN_HEADER: &str = "github-token";

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate-kmz", post(generate_kmz))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Convert a feed and return the document as an attachment.
async fn generate_kmz(
    State(state): State<AppState>,
    Query(query): Query<GenerateQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let job = resolve_job(&state.config, &query, &headers, &body)?;
    info!(url = %job.gtfs_url, format = %job.format, "generating document");

    let bytes = generate(&state.feed, &state.overlay, &job).await?;

    Ok(attachment(job.format, &state.config.output_name, bytes))
}

/// Combine request inputs with configured defaults.
///
/// The request wins over the environment for both the feed URL and the token.
fn resolve_job(
    config: &AppConfig,
    query: &GenerateQuery,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Job, AppError> {
    let request = parse_body(body)?;

    let token = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|v| !v.trim().is_empty())
        .or_else(|| config.github_token.clone());
    let gtfs_url = request
        .gtfs_url
        .filter(|v| !v.trim().is_empty())
        .or_else(|| config.gtfs_url.clone());

    let job_format = match query.output_format.as_deref() {
        Some(raw) => raw
            .parse::<OutputFormat>()
            .map_err(|e| AppError::BadRequest {
                message: e.to_string(),
            })?,
        None => OutputFormat::default(),
    };

    Ok(Job::new(
        gtfs_url,
        token,
        job_format,
        config.document_name.clone(),
    )?)
}

/// An empty body means "use the defaults".
fn parse_body(body: &[u8]) -> Result<GenerateRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenerateRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest {
        message: format!("Invalid request body: {e}"),
    })
}

fn attachment(format: OutputFormat, output_name: &str, bytes: Vec<u8>) -> Response {
    let disposition = format!(
        "attachment; filename={output_name}.{}",
        format.extension()
    );
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    BadGateway { message: String },
    Internal { message: String },
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<GenerateError> for AppError {
    fn from(e: GenerateError) -> Self {
        match e {
            GenerateError::Config(e) => e.into(),
            GenerateError::FeedFetch(_) | GenerateError::OverlayFetch(_) => AppError::BadGateway {
                message: e.to_string(),
            },
            GenerateError::Feed(_)
            | GenerateError::Overlay(_)
            | GenerateError::Kml(_)
            | GenerateError::Task(_) => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::BadGateway { message } => (StatusCode::BAD_GATEWAY, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    use crate::fetch::FetchError;
    use crate::gtfs::FeedError;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        AppConfig::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    fn query(format: Option<&str>) -> GenerateQuery {
        GenerateQuery {
            output_format: format.map(str::to_string),
        }
    }

    fn token_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_str(token).unwrap());
        headers
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(health().await, "ok");
    }

    #[test]
    fn defaults_fill_missing_inputs() {
        let config = config(&[("GTFS_URL", "https://env/gtfs.zip"), ("GITHUB_TOKEN", "env")]);
        let job = resolve_job(&config, &query(None), &HeaderMap::new(), b"").unwrap();
        assert_eq!(job.gtfs_url, "https://env/gtfs.zip");
        assert_eq!(job.github_token, "env");
        assert_eq!(job.format, OutputFormat::Kmz);
        assert_eq!(job.document_name, config.document_name);
    }

    #[test]
    fn request_inputs_win() {
        let config = config(&[("GTFS_URL", "https://env/gtfs.zip"), ("GITHUB_TOKEN", "env")]);
        let job = resolve_job(
            &config,
            &query(Some("KML")),
            &token_headers("header"),
            br#"{"gtfs_url":"https://body/gtfs.zip"}"#,
        )
        .unwrap();
        assert_eq!(job.gtfs_url, "https://body/gtfs.zip");
        assert_eq!(job.github_token, "header");
        assert_eq!(job.format, OutputFormat::Kml);
    }

    #[test]
    fn missing_token_is_bad_request() {
        let config = config(&[("GTFS_URL", "https://env/gtfs.zip")]);
        let err = resolve_job(&config, &query(None), &HeaderMap::new(), b"").unwrap_err();
        match err {
            AppError::BadRequest { message } => assert!(message.contains("GITHUB_TOKEN")),
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn missing_url_is_bad_request() {
        let config = config(&[]);
        let err = resolve_job(&config, &query(None), &token_headers("t"), b"{}").unwrap_err();
        match err {
            AppError::BadRequest { message } => assert!(message.contains("GTFS_URL")),
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn invalid_format_and_body_are_bad_requests() {
        let config = config(&[("GTFS_URL", "u"), ("GITHUB_TOKEN", "t")]);
        assert!(matches!(
            resolve_job(&config, &query(Some("pdf")), &HeaderMap::new(), b""),
            Err(AppError::BadRequest { .. })
        ));
        assert!(matches!(
            resolve_job(&config, &query(None), &HeaderMap::new(), b"not json"),
            Err(AppError::BadRequest { .. })
        ));
    }

    #[test]
    fn attachment_headers() {
        let response = attachment(OutputFormat::Kml, "Islamabad_Transit", b"<kml/>".to_vec());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/vnd.google-earth.kml+xml"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=Islamabad_Transit.kml"
        );
    }

    #[test]
    fn error_status_mapping() {
        let status = |e: GenerateError| AppError::from(e).into_response().status();

        assert_eq!(
            status(GenerateError::Config(ConfigError::MissingToken)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(GenerateError::FeedFetch(FetchError::Api {
                status: 404,
                message: "gone".into()
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(GenerateError::OverlayFetch(FetchError::Unauthorized)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(GenerateError::Feed(FeedError::MissingTable("trips.txt"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(GenerateError::Task("panicked".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_cause_is_reported() {
        let err = AppError::from(GenerateError::OverlayFetch(FetchError::Unauthorized));
        match err {
            AppError::BadGateway { message } => {
                assert!(message.contains("rail overlay"));
                assert!(message.contains("unauthorized"));
            }
            other => panic!("expected bad gateway, got {other:?}"),
        }
    }
}
