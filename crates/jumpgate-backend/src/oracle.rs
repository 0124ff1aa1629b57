//! ESI-style route oracle client.
//!
//! # Endpoint Format
//!
//! - GET `{base_url}/route/{origin}/{destination}/`
//! - Query: `datasource=..`, `flag=shortest|secure|insecure`,
//!   `connections=a|b,c|d,..` (extra directed connections)
//! - Response: JSON array of node ids, origin first
//! - Errors: non-2xx with an optional `{"error": "..."}` body

use std::time::Duration;

use async_trait::async_trait;
use jumpgate_config::OracleConfig;
use jumpgate_core::NodeId;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::OracleError;
use crate::traits::{OracleOptions, RouteOracle};

/// Default timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Error body returned by the oracle
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for an ESI-compatible route endpoint.
#[derive(Clone)]
pub struct EsiRouteClient {
    client: Client,
    base_url: String,
    datasource: String,
}

impl EsiRouteClient {
    /// Create a client for `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        datasource: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            datasource: datasource.into(),
        })
    }

    /// Create a client from the `[oracle]` config section.
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let timeout = if config.timeout_secs == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            config.timeout()
        };
        Self::new(&config.url, &config.datasource, timeout)
    }

    fn route_url(&self, from: NodeId, to: NodeId) -> String {
        format!(
            "{}/route/{}/{}/",
            self.base_url.trim_end_matches('/'),
            from,
            to
        )
    }
}

#[async_trait]
impl RouteOracle for EsiRouteClient {
    async fn find_route(
        &self,
        from: NodeId,
        to: NodeId,
        options: &OracleOptions,
    ) -> Result<Vec<NodeId>, OracleError> {
        let url = self.route_url(from, to);

        let mut query = vec![
            ("datasource", self.datasource.clone()),
            ("flag", options.security.as_str().to_string()),
        ];
        if !options.edges.is_empty() {
            query.push(("connections", encode_connections(&options.edges)));
        }

        trace!(
            "Route oracle request {} ({} extra connections)",
            url,
            options.edges.len()
        );

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout
                } else if e.is_connect() {
                    OracleError::Connection(e.to_string())
                } else {
                    OracleError::Connection(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ErrorBody>(&body) {
                Ok(err) => OracleError::Remote(err.error),
                Err(_) => OracleError::Status {
                    status: status.as_u16(),
                    message: body,
                },
            });
        }

        let route: Vec<NodeId> = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

        debug!("Route oracle returned {} nodes", route.len());
        Ok(route)
    }
}

/// Oracle stand-in that always fails, forcing local search.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledOracle;

#[async_trait]
impl RouteOracle for DisabledOracle {
    async fn find_route(
        &self,
        _from: NodeId,
        _to: NodeId,
        _options: &OracleOptions,
    ) -> Result<Vec<NodeId>, OracleError> {
        Err(OracleError::Disabled)
    }
}

fn encode_connections(edges: &[(NodeId, NodeId)]) -> String {
    edges
        .iter()
        .map(|(a, b)| format!("{}|{}", a, b))
        .collect::<Vec<_>>()
        .join(",")
}
