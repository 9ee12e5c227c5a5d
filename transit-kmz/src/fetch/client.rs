//! Feed and overlay download clients.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, info};

use super::error::FetchError;

/// Some operators reject requests without a browser user agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.36";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_OWNER: &str = "Mavi2902";
const DEFAULT_REPO: &str = "Islamabad-rawalpindi-metro-lines";
const DEFAULT_PATH: &str = "Metro%20Lines.kmz";
const DEFAULT_REF: &str = "main";

/// Media type asking the Contents API for the file bytes themselves.
const GITHUB_RAW: &str = "application/vnd.github.raw";

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// User agent sent with every request
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl FeedClientConfig {
    pub fn new() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for FeedClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Downloads GTFS archives.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
}

impl FeedClient {
    pub fn new(config: FeedClientConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent).map_err(|_| FetchError::Api {
            status: 0,
            message: "Invalid user agent format".to_string(),
        })?;
        headers.insert(USER_AGENT, agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http })
    }

    /// Download the archive at `url`.
    pub async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        debug!(url, "fetching GTFS feed");
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.bytes().await?;
        info!(bytes = body.len(), "fetched GTFS feed");
        Ok(body)
    }
}

/// Where the rail overlay lives on GitHub.
#[derive(Debug, Clone)]
pub struct OverlayClientConfig {
    /// Base URL of the GitHub API
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    /// Path of the KMZ inside the repository, already URL-encoded
    pub path: String,
    /// Branch, tag or commit
    pub git_ref: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OverlayClientConfig {
    pub fn new() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
            path: DEFAULT_PATH.to_string(),
            git_ref: DEFAULT_REF.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom API base URL (for GitHub Enterprise or testing).
    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    pub fn with_repository(mut self, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        self.owner = owner.into();
        self.repo = repo.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = git_ref.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Contents API URL of the overlay file.
    pub fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.path.trim_start_matches('/'),
            self.git_ref
        )
    }
}

impl Default for OverlayClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Downloads the rail overlay through the GitHub Contents API.
#[derive(Debug, Clone)]
pub struct OverlayClient {
    http: reqwest::Client,
    url: String,
}

impl OverlayClient {
    pub fn new(config: OverlayClientConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_RAW));
        // GitHub rejects requests without a user agent.
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            )),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: config.contents_url(),
        })
    }

    /// URL this client downloads from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download the overlay KMZ using `token` for authorization.
    pub async fn fetch(&self, token: &str) -> Result<Bytes, FetchError> {
        debug!(url = %self.url, "fetching rail overlay");
        let response = self.http.get(&self.url).bearer_auth(token).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        let overlay = decode_contents(content_type.as_deref(), body)?;
        info!(bytes = overlay.len(), "fetched rail overlay");
        Ok(overlay)
    }
}

/// The JSON form of a Contents API file response.
#[derive(Debug, Deserialize)]
struct ContentsEnvelope {
    content: String,
    encoding: String,
}

/// Unwrap a Contents API body.
///
/// Raw responses pass through untouched. A JSON envelope has its base64
/// `content` decoded, ignoring the line breaks GitHub inserts.
pub fn decode_contents(content_type: Option<&str>, body: Bytes) -> Result<Bytes, FetchError> {
    let is_json = content_type.is_some_and(|ct| ct.contains("json"));
    if !is_json {
        return Ok(body);
    }

    let envelope: ContentsEnvelope =
        serde_json::from_slice(&body).map_err(|e| FetchError::Envelope {
            message: e.to_string(),
        })?;

    if !envelope.encoding.eq_ignore_ascii_case("base64") {
        return Err(FetchError::Envelope {
            message: format!("unsupported encoding {:?}", envelope.encoding),
        });
    }

    let compact: String = envelope
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let decoded = STANDARD
        .decode(compact)
        .map_err(|e| FetchError::Envelope {
            message: e.to_string(),
        })?;

    Ok(Bytes::from(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_config_defaults() {
        let config = FeedClientConfig::new();
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.timeout_secs, 60);

        let config = config.with_timeout(5).with_user_agent("test");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.user_agent, "test");
    }

    #[test]
    fn overlay_config_defaults() {
        let config = OverlayClientConfig::new();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.git_ref, "main");
        assert_eq!(
            config.contents_url(),
            "https://api.github.com/repos/Mavi2902/Islamabad-rawalpindi-metro-lines/contents/Metro%20Lines.kmz?ref=main"
        );
    }

    #[test]
    fn overlay_config_overrides() {
        let config = OverlayClientConfig::new()
            .with_api_base("http://localhost:9000/")
            .with_repository("acme", "rails")
            .with_path("data/lines.kmz")
            .with_ref("v2");
        assert_eq!(
            config.contents_url(),
            "http://localhost:9000/repos/acme/rails/contents/data/lines.kmz?ref=v2"
        );
    }

    #[test]
    fn clients_build() {
        assert!(FeedClient::new(FeedClientConfig::new()).is_ok());
        let client = OverlayClient::new(OverlayClientConfig::new()).unwrap();
        assert!(client.url().ends_with("?ref=main"));
    }

    #[test]
    fn invalid_user_agent_is_rejected() {
        let config = FeedClientConfig::new().with_user_agent("bad\nagent");
        assert!(matches!(
            FeedClient::new(config),
            Err(FetchError::Api { status: 0, .. })
        ));
    }

    #[test]
    fn raw_body_passes_through() {
        let body = Bytes::from_static(b"PK\x03\x04rest");
        let decoded = decode_contents(Some(GITHUB_RAW), body.clone()).unwrap();
        assert_eq!(decoded, body);
        assert_eq!(decode_contents(None, body.clone()).unwrap(), body);
    }

    #[test]
    fn json_envelope_is_decoded() {
        let encoded = STANDARD.encode(b"PK\x03\x04metro");
        let (head, tail) = encoded.split_at(4);
        let json = format!(r#"{{"name":"x.kmz","content":"{head}\n{tail}\n","encoding":"base64"}}"#);
        let decoded =
            decode_contents(Some("application/json; charset=utf-8"), Bytes::from(json)).unwrap();
        assert_eq!(&decoded[..], b"PK\x03\x04metro");
    }

    #[test]
    fn envelope_errors() {
        let json = Bytes::from_static(br#"{"content":"","encoding":"none"}"#);
        assert!(matches!(
            decode_contents(Some("application/json"), json),
            Err(FetchError::Envelope { .. })
        ));

        let json = Bytes::from_static(br#"{"message":"Not Found"}"#);
        assert!(matches!(
            decode_contents(Some("application/json"), json),
            Err(FetchError::Envelope { .. })
        ));

        let json = Bytes::from_static(br#"{"content":"!!!","encoding":"base64"}"#);
        assert!(matches!(
            decode_contents(Some("application/json"), json),
            Err(FetchError::Envelope { .. })
        ));
    }
}
