//! Process configuration, read from the environment at start-up.
//!
//! | Variable | Default |
//! | --- | --- |
//! | `BIND_ADDR` | `0.0.0.0:8001` |
//! | `GTFS_URL` | none; requests must then supply one |
//! | `GITHUB_TOKEN` | none; requests must then supply one |
//! | `GITHUB_API_BASE` | `https://api.github.com` |
//! | `OVERLAY_OWNER`, `OVERLAY_REPO`, `OVERLAY_PATH`, `OVERLAY_REF` | the metro lines repository |
//! | `FETCH_TIMEOUT_SECS` | `60` |
//! | `OVERLAY_CACHE_TTL_SECS` | `3600`, `0` disables caching |
//! | `OUTPUT_NAME` | `Islamabad_Transit` |
//! | `DOCUMENT_NAME` | `EV Routes (GTFS + Metro)` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::fetch::{FeedClientConfig, OverlayClientConfig};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8001";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
const DEFAULT_OVERLAY_CACHE_TTL_SECS: u64 = 60 * 60;
const DEFAULT_OUTPUT_NAME: &str = "Islamabad_Transit";
pub const DEFAULT_DOCUMENT_NAME: &str = "EV Routes (GTFS + Metro)";

/// Configuration problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No feed URL in the request or the environment
    #[error("GTFS_URL not provided in request body or environment")]
    MissingFeedUrl,

    /// No token in the request header or the environment
    #[error("GITHUB_TOKEN not provided in header or environment")]
    MissingToken,

    /// A variable is set but cannot be parsed
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Settings for the whole service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Feed URL used when a request does not name one
    pub gtfs_url: Option<String>,
    /// Token used when a request does not carry one
    pub github_token: Option<String>,
    pub overlay: OverlayClientConfig,
    pub fetch_timeout_secs: u64,
    pub overlay_cache_ttl: Duration,
    /// File stem of the `Content-Disposition` filename
    pub output_name: String,
    /// Name of the root folder of generated documents
    pub document_name: String,
}

impl AppConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_addr = match parse_var("BIND_ADDR", get("BIND_ADDR"))? {
            Some(addr) => addr,
            None => parse_default(DEFAULT_BIND_ADDR)?,
        };
        let fetch_timeout_secs =
            parse_var("FETCH_TIMEOUT_SECS", get("FETCH_TIMEOUT_SECS"))?
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);
        let cache_ttl_secs = parse_var("OVERLAY_CACHE_TTL_SECS", get("OVERLAY_CACHE_TTL_SECS"))?
            .unwrap_or(DEFAULT_OVERLAY_CACHE_TTL_SECS);

        let mut overlay = OverlayClientConfig::new().with_timeout(fetch_timeout_secs);
        if let Some(api_base) = get("GITHUB_API_BASE") {
            overlay = overlay.with_api_base(api_base);
        }
        if let Some(owner) = get("OVERLAY_OWNER") {
            overlay.owner = owner;
        }
        if let Some(repo) = get("OVERLAY_REPO") {
            overlay.repo = repo;
        }
        if let Some(path) = get("OVERLAY_PATH") {
            overlay = overlay.with_path(path);
        }
        if let Some(git_ref) = get("OVERLAY_REF") {
            overlay = overlay.with_ref(git_ref);
        }

        Ok(Self {
            bind_addr,
            gtfs_url: get("GTFS_URL"),
            github_token: get("GITHUB_TOKEN"),
            overlay,
            fetch_timeout_secs,
            overlay_cache_ttl: Duration::from_secs(cache_ttl_secs),
            output_name: get("OUTPUT_NAME").unwrap_or_else(|| DEFAULT_OUTPUT_NAME.to_string()),
            document_name: get("DOCUMENT_NAME")
                .unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.to_string()),
        })
    }

    pub fn feed_client(&self) -> FeedClientConfig {
        FeedClientConfig::new().with_timeout(self.fetch_timeout_secs)
    }

    pub fn overlay_client(&self) -> OverlayClientConfig {
        self.overlay.clone()
    }

    /// A zero TTL keeps nothing.
    pub fn cache(&self) -> CacheConfig {
        if self.cache_enabled() {
            CacheConfig::default().with_ttl(self.overlay_cache_ttl)
        } else {
            CacheConfig::default().with_max_capacity(0)
        }
    }

    /// Whether overlay downloads should be cached at all.
    pub fn cache_enabled(&self) -> bool {
        !self.overlay_cache_ttl.is_zero()
    }
}

fn parse_var<T: FromStr>(key: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError> {
    raw.map(|value| {
        value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value })
    })
    .transpose()
}

fn parse_default(value: &str) -> Result<SocketAddr, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key: "BIND_ADDR",
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8001".parse::<SocketAddr>().unwrap());
        assert_eq!(config.gtfs_url, None);
        assert_eq!(config.github_token, None);
        assert_eq!(config.fetch_timeout_secs, 60);
        assert_eq!(config.overlay_cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.output_name, "Islamabad_Transit");
        assert_eq!(config.document_name, DEFAULT_DOCUMENT_NAME);
        assert_eq!(config.overlay.owner, "Mavi2902");
        assert!(config.cache_enabled());
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("BIND_ADDR", "127.0.0.1:3000"),
            ("GTFS_URL", "https://example.org/gtfs.zip"),
            ("GITHUB_TOKEN", " ghp_abc "),
            ("OVERLAY_OWNER", "acme"),
            ("OVERLAY_REPO", "rails"),
            ("OVERLAY_REF", "v1"),
            ("FETCH_TIMEOUT_SECS", "10"),
            ("OVERLAY_CACHE_TTL_SECS", "0"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.gtfs_url.as_deref(), Some("https://example.org/gtfs.zip"));
        assert_eq!(config.github_token.as_deref(), Some("ghp_abc"));
        assert_eq!(
            config.overlay.contents_url(),
            "https://api.github.com/repos/acme/rails/contents/Metro%20Lines.kmz?ref=v1"
        );
        assert_eq!(config.overlay.timeout_secs, 10);
        assert_eq!(config.feed_client().timeout_secs, 10);
        assert!(!config.cache_enabled());
        assert_eq!(config.cache().max_capacity, 0);
    }

    #[test]
    fn blank_values_are_unset() {
        let config = config(&[("GITHUB_TOKEN", "   "), ("OUTPUT_NAME", "")]).unwrap();
        assert_eq!(config.github_token, None);
        assert_eq!(config.output_name, "Islamabad_Transit");
    }

    #[test]
    fn invalid_values() {
        assert_eq!(
            config(&[("FETCH_TIMEOUT_SECS", "soon")]).unwrap_err(),
            ConfigError::Invalid {
                key: "FETCH_TIMEOUT_SECS",
                value: "soon".into()
            }
        );
        assert!(matches!(
            config(&[("BIND_ADDR", "localhost")]),
            Err(ConfigError::Invalid { key: "BIND_ADDR", .. })
        ));
    }

    #[test]
    fn error_messages_name_the_setting() {
        assert!(ConfigError::MissingFeedUrl.to_string().contains("GTFS_URL"));
        assert!(ConfigError::MissingToken.to_string().contains("GITHUB_TOKEN"));
    }
}
