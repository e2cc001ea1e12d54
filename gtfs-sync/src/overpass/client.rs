//! Overpass HTTP client.
//!
//! Runs bounding-box node queries against a configurable list of Overpass
//! mirrors. A query that fails on one mirror moves to the next; only when
//! every mirror has failed does the error surface to the caller. A
//! semaphore bounds in-flight requests so per-stop fan-out respects the
//! public mirrors' rate limits.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::NodeQuery;
use super::error::OverpassError;
use super::types::{BoundingBox, GeoNode, OverpassResponse};

/// Public Overpass mirrors tried in order.
pub const DEFAULT_MIRRORS: [&str; 2] = [
    "https://overpass-api.de/api/interpreter",
    "https://overpass.kumi.systems/api/interpreter",
];

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 2;

/// Server-side evaluation time requested in each query, seconds.
const QUERY_TIMEOUT_SECS: u64 = 25;

/// Configuration for the Overpass client.
#[derive(Debug, Clone)]
pub struct OverpassConfig {
    /// Mirror endpoints, tried in order.
    pub mirrors: Vec<String>,
    /// Maximum concurrent requests.
    pub max_concurrent: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl OverpassConfig {
    /// Create a config using the default public mirrors.
    pub fn new() -> Self {
        Self {
            mirrors: DEFAULT_MIRRORS.iter().map(|m| m.to_string()).collect(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    /// Replace the mirror list (first entry is tried first).
    pub fn with_mirrors(mut self, mirrors: Vec<String>) -> Self {
        self.mirrors = mirrors;
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Overpass API client with mirror fallback.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    http: reqwest::Client,
    mirrors: Vec<String>,
    semaphore: Arc<Semaphore>,
}

impl OverpassClient {
    /// Create a new client with the given configuration.
    pub fn new(config: OverpassConfig) -> Result<Self, OverpassError> {
        if config.mirrors.is_empty() {
            return Err(OverpassError::NotConfigured(
                "at least one mirror endpoint is required".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            mirrors: config.mirrors,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    /// Query all nodes inside a bounding box, with provenance.
    ///
    /// Tries each mirror in order and returns the first successful,
    /// fully decoded response. Per-mirror failures are logged and
    /// collected into [`OverpassError::AllMirrorsFailed`] if nothing
    /// succeeds.
    pub async fn query_nodes(&self, bbox: &BoundingBox) -> Result<Vec<GeoNode>, OverpassError> {
        let _permit =
            self.semaphore
                .acquire()
                .await
                .map_err(|_| OverpassError::NotConfigured(
                    "client semaphore closed".to_string(),
                ))?;

        let query = format!(
            "[out:json][timeout:{QUERY_TIMEOUT_SECS}];node({});out meta;",
            bbox.to_query_fragment()
        );

        let mut attempts = Vec::new();
        for mirror in &self.mirrors {
            match self.query_mirror(mirror, &query).await {
                Ok(nodes) => {
                    debug!(mirror = %mirror, nodes = nodes.len(), "query succeeded");
                    return Ok(nodes);
                }
                Err(e) => {
                    warn!(mirror = %mirror, error = %e, "mirror failed, trying next");
                    attempts.push((mirror.clone(), e.to_string()));
                }
            }
        }

        Err(OverpassError::AllMirrorsFailed { attempts })
    }

    async fn query_mirror(
        &self,
        mirror: &str,
        query: &str,
    ) -> Result<Vec<GeoNode>, OverpassError> {
        let response = self
            .http
            .post(mirror)
            .form(&[("data", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OverpassError::ApiError {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let body = response.text().await?;
        let decoded: OverpassResponse =
            serde_json::from_str(&body).map_err(|e| OverpassError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            })?;

        decoded
            .elements
            .into_iter()
            .filter(|e| e.kind == "node")
            .map(|e| {
                let id = e.id;
                e.into_node().map_err(|field| OverpassError::BadElement {
                    id,
                    message: format!("missing {field}"),
                })
            })
            .collect()
    }
}

impl NodeQuery for OverpassClient {
    async fn nodes_in(&self, bbox: &BoundingBox) -> Result<Vec<GeoNode>, OverpassError> {
        self.query_nodes(bbox).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = OverpassConfig::new()
            .with_mirrors(vec!["http://localhost:8080/api".to_string()])
            .with_max_concurrent(4)
            .with_timeout(60);

        assert_eq!(config.mirrors, ["http://localhost:8080/api"]);
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn config_defaults() {
        let config = OverpassConfig::new();
        assert_eq!(config.mirrors.len(), DEFAULT_MIRRORS.len());
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn client_creation() {
        assert!(OverpassClient::new(OverpassConfig::new()).is_ok());
    }

    #[test]
    fn empty_mirror_list_is_rejected() {
        let config = OverpassConfig::new().with_mirrors(Vec::new());
        assert!(OverpassClient::new(config).is_err());
    }

    // Integration tests against a live mirror would hammer the public
    // endpoints; orchestrator-level behavior is covered with the static
    // mock instead.
}
