//! Reya REST API access
//!
//! `ExchangeFetcher` is the only seam the cache layer sees: `GET path` in,
//! JSON or an upstream error out.

use crate::config::PluginConfig;
use crate::error::PluginError;
use crate::models::ResourceKind;
use crate::Result;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

pub mod paths {
    pub const MARKETS: &str = "/api/trading/markets";
    pub const MARKETS_DATA: &str = "/api/trading/markets/data";
    pub const ASSETS: &str = "/api/trading/assets";
    pub const PRICES: &str = "/api/trading/prices";
    pub const FEE_TIER_PARAMETERS: &str = "/api/trading/feeTierParameters";
    pub const GLOBAL_FEE_PARAMETERS: &str = "/api/trading/globalFeeParameters";

    pub fn market_data(market_id: &str) -> String {
        format!("/api/trading/market/{}/data", market_id)
    }

    pub fn price(asset_pair_id: &str) -> String {
        format!("/api/trading/prices/{}", asset_pair_id)
    }
}

#[async_trait::async_trait]
pub trait ExchangeFetcher: Send + Sync {
    /// GET `path` and return the decoded JSON body. `kind` tags any failure.
    async fn get_json(&self, path: &str, kind: ResourceKind) -> Result<Value>;
}

/// HTTP fetcher backed by a long-lived, connection-pooled client.
#[derive(Clone)]
pub struct ReyaApiClient {
    client: Client,
    config: PluginConfig,
}

impl ReyaApiClient {
    pub fn new(config: PluginConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| PluginError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl ExchangeFetcher for ReyaApiClient {
    async fn get_json(&self, path: &str, kind: ResourceKind) -> Result<Value> {
        let url = self.config.endpoint(path);
        debug!(resource = %kind, %url, "GET");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                error!(resource = %kind, path, error = %e, "Reya API request failed");
                PluginError::upstream(kind, e.status().map(|s| s.as_u16()), e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(resource = %kind, path, status = status.as_u16(), body = %body, "Reya API error response");
            return Err(PluginError::upstream(
                kind,
                Some(status.as_u16()),
                format!("GET {} returned {}", path, status),
            ));
        }

        response.json::<Value>().await.map_err(|e| {
            error!(resource = %kind, path, error = %e, "Failed to decode Reya API response");
            PluginError::upstream(kind, Some(status.as_u16()), format!("invalid JSON body: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_paths() {
        assert_eq!(paths::market_data("3"), "/api/trading/market/3/data");
        assert_eq!(paths::price("ETHRUSD"), "/api/trading/prices/ETHRUSD");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_upstream_error() {
        let config = PluginConfig::new("http://127.0.0.1:9").unwrap();
        let client = ReyaApiClient::new(config).unwrap();

        let err = client
            .get_json(paths::MARKETS, ResourceKind::Markets)
            .await
            .unwrap_err();

        match err {
            PluginError::UpstreamFetch { resource, .. } => assert_eq!(resource, ResourceKind::Markets),
            other => panic!("expected upstream error, got {:?}", other),
        }
    }
}
