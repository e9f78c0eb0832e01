//! Connection settings for the Elasticsearch client.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use curator_core::{defaults, Error, Result};

/// Configuration for [`crate::ElasticsearchClient`].
#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    /// Cluster base URL, e.g. `https://localhost:9200`.
    pub url: String,
    /// Basic-auth user name.
    pub username: Option<String>,
    /// Basic-auth password.
    pub password: Option<String>,
    /// Default index documents are read from.
    pub index: String,
    /// Documents per scroll page.
    pub fetch_size: usize,
    /// Scroll context keep-alive, e.g. `5m`.
    pub scroll_keep_alive: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            username: None,
            password: None,
            index: String::new(),
            fetch_size: defaults::ES_DATA_FETCH_SIZE,
            scroll_keep_alive: defaults::ES_SCROLL_KEEP_ALIVE.to_string(),
            timeout_seconds: defaults::ES_TIMEOUT_SECS,
        }
    }
}

impl ElasticsearchConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `ES_URL` | (none) | Cluster URL; takes precedence over `ES_CLOUD_ID` |
    /// | `ES_CLOUD_ID` | (none) | Elastic Cloud deployment id |
    /// | `ES_USERNAME` | (none) | Basic-auth user |
    /// | `ES_PASSWORD` | (none) | Basic-auth password |
    /// | `ES_INDEX` | (required) | Default index |
    /// | `ES_DATA_FETCH_SIZE` | `10000` | Documents per scroll page |
    /// | `ES_TIMEOUT` | `120` | Request timeout (seconds) |
    ///
    /// # Errors
    /// Returns `Error::Config` when neither `ES_URL` nor `ES_CLOUD_ID` is set,
    /// when the cloud id cannot be decoded, or when `ES_INDEX` is missing.
    pub fn from_env() -> Result<Self> {
        let url = match std::env::var("ES_URL").ok().filter(|v| !v.is_empty()) {
            Some(url) => url,
            None => {
                let cloud_id = std::env::var("ES_CLOUD_ID")
                    .map_err(|_| Error::Config("ES_URL or ES_CLOUD_ID must be set".to_string()))?;
                decode_cloud_id(&cloud_id)?
            }
        };
        let index = std::env::var("ES_INDEX")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config("ES_INDEX must be set".to_string()))?;

        Ok(Self {
            url,
            username: std::env::var("ES_USERNAME").ok(),
            password: std::env::var("ES_PASSWORD").ok(),
            index,
            fetch_size: std::env::var("ES_DATA_FETCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::ES_DATA_FETCH_SIZE),
            scroll_keep_alive: defaults::ES_SCROLL_KEEP_ALIVE.to_string(),
            timeout_seconds: std::env::var("ES_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::ES_TIMEOUT_SECS),
        })
    }
}

/// Decode an Elastic Cloud id (`name:base64(host$es_uuid$kibana_uuid)`)
/// into the HTTPS URL of its Elasticsearch endpoint.
pub fn decode_cloud_id(cloud_id: &str) -> Result<String> {
    let invalid = |reason: &str| Error::Config(format!("Invalid ES_CLOUD_ID: {}", reason));

    let encoded = cloud_id
        .split_once(':')
        .map(|(_, encoded)| encoded)
        .ok_or_else(|| invalid("missing ':' separator"))?;
    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|e| invalid(&e.to_string()))?;
    let decoded = String::from_utf8(decoded).map_err(|e| invalid(&e.to_string()))?;

    let mut parts = decoded.trim_end_matches('$').split('$');
    let host = parts.next().filter(|h| !h.is_empty()).ok_or_else(|| invalid("missing host"))?;
    let es_uuid = parts
        .next()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| invalid("missing Elasticsearch id"))?;

    Ok(match host.split_once(':') {
        Some((host, port)) => format!("https://{}.{}:{}", es_uuid, host, port),
        None => format!("https://{}.{}", es_uuid, host),
    })
}
