//! Typed, cached access to the Reya trading endpoints
//!
//! Every method is read-through: a fresh cache entry answers without a
//! network call, a miss fetches, decodes and stores under the kind's TTL.

use crate::api::{paths, ExchangeFetcher};
use crate::cache::{ResourceKey, TtlCache};
use crate::config::CacheTtls;
use crate::error::PluginError;
use crate::models::{
    Asset, FeeTier, GlobalFeeParameters, ItemResponse, ListResponse, Market, MarketData, Price,
    ResourceKind,
};
use crate::Result;
use serde::de::DeserializeOwned;
use std::sync::Arc;

#[derive(Clone)]
pub struct ReyaService {
    fetcher: Arc<dyn ExchangeFetcher>,
    cache: TtlCache,
    ttls: CacheTtls,
}

impl ReyaService {
    pub fn new(fetcher: Arc<dyn ExchangeFetcher>, ttls: CacheTtls) -> Self {
        Self {
            fetcher,
            cache: TtlCache::new(),
            ttls,
        }
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    pub async fn markets(&self) -> Result<Vec<Market>> {
        self.load_list(ResourceKey::singleton(ResourceKind::Markets), paths::MARKETS.to_string())
            .await
    }

    pub async fn all_market_data(&self) -> Result<Vec<MarketData>> {
        self.load_list(
            ResourceKey::singleton(ResourceKind::MarketData),
            paths::MARKETS_DATA.to_string(),
        )
        .await
    }

    pub async fn market_data(&self, market_id: &str) -> Result<MarketData> {
        self.load_item(
            ResourceKey::scoped(ResourceKind::MarketData, market_id),
            paths::market_data(market_id),
        )
        .await
    }

    pub async fn prices(&self) -> Result<Vec<Price>> {
        self.load_list(ResourceKey::singleton(ResourceKind::Prices), paths::PRICES.to_string())
            .await
    }

    /// One pair, cached under its own key. Actions answer from the full
    /// list instead, since a user's ticker rarely names the exact pair id.
    pub async fn price(&self, asset_pair_id: &str) -> Result<Price> {
        self.load_item(
            ResourceKey::scoped(ResourceKind::Prices, asset_pair_id),
            paths::price(asset_pair_id),
        )
        .await
    }

    pub async fn assets(&self) -> Result<Vec<Asset>> {
        self.load_list(ResourceKey::singleton(ResourceKind::Assets), paths::ASSETS.to_string())
            .await
    }

    pub async fn fee_tier_parameters(&self) -> Result<Vec<FeeTier>> {
        self.load_list(
            ResourceKey::scoped(ResourceKind::Fees, "tiers"),
            paths::FEE_TIER_PARAMETERS.to_string(),
        )
        .await
    }

    pub async fn global_fee_parameters(&self) -> Result<GlobalFeeParameters> {
        self.load_item(
            ResourceKey::scoped(ResourceKind::Fees, "global"),
            paths::GLOBAL_FEE_PARAMETERS.to_string(),
        )
        .await
    }

    /// First market whose symbol or underlying asset matches `symbol`
    /// (case-insensitive, prefix match on the ticker).
    pub async fn find_market(&self, symbol: &str) -> Result<Option<Market>> {
        let wanted = symbol.to_uppercase();
        let markets = self.markets().await?;

        Ok(markets.into_iter().find(|m| {
            m.symbol().to_uppercase().starts_with(&wanted)
                || m
                    .underlying_asset
                    .as_deref()
                    .map(|a| a.eq_ignore_ascii_case(symbol))
                    .unwrap_or(false)
        }))
    }

    async fn load_list<T>(&self, key: ResourceKey, path: String) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let kind = key.kind();
        let ttl = self.ttls.get(kind);
        let fetcher = Arc::clone(&self.fetcher);

        self.cache
            .fetch_or_load(&key, ttl, || async move {
                let body = fetcher.get_json(&path, kind).await?;
                decode::<ListResponse<T>>(body, kind, &path).map(ListResponse::into_vec)
            })
            .await
    }

    async fn load_item<T>(&self, key: ResourceKey, path: String) -> Result<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let kind = key.kind();
        let ttl = self.ttls.get(kind);
        let fetcher = Arc::clone(&self.fetcher);

        self.cache
            .fetch_or_load(&key, ttl, || async move {
                let body = fetcher.get_json(&path, kind).await?;
                decode::<ItemResponse<T>>(body, kind, &path).map(ItemResponse::into_inner)
            })
            .await
    }
}

/// Shape mismatches count as upstream failures: the API answered, but not
/// with anything usable.
fn decode<T: DeserializeOwned>(body: serde_json::Value, kind: ResourceKind, path: &str) -> Result<T> {
    serde_json::from_value(body).map_err(|e| {
        PluginError::upstream(kind, None, format!("unexpected response shape from {}: {}", path, e))
    })
}
