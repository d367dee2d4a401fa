//! Plugin configuration
//!
//! Base URL and per-resource cache TTLs, read from the environment
//! (and `.env` when present). An unusable base URL is fatal.

use crate::error::PluginError;
use crate::models::ResourceKind;
use crate::Result;
use reqwest::Url;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.reya.xyz";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Default TTL in seconds for each resource kind.
pub fn default_ttl_secs(kind: ResourceKind) -> u64 {
    match kind {
        ResourceKind::Markets => 300,
        ResourceKind::MarketData => 30,
        ResourceKind::Prices => 10,
        ResourceKind::Assets => 600,
        ResourceKind::Fees => 600,
    }
}

fn ttl_env_var(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Markets => "REYA_CACHE_TTL_MARKETS_SECS",
        ResourceKind::MarketData => "REYA_CACHE_TTL_MARKET_DATA_SECS",
        ResourceKind::Prices => "REYA_CACHE_TTL_PRICES_SECS",
        ResourceKind::Assets => "REYA_CACHE_TTL_ASSETS_SECS",
        ResourceKind::Fees => "REYA_CACHE_TTL_FEES_SECS",
    }
}

/// One independent TTL per resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTtls {
    ttls: HashMap<ResourceKind, Duration>,
}

impl CacheTtls {
    pub fn get(&self, kind: ResourceKind) -> Duration {
        self.ttls
            .get(&kind)
            .copied()
            .unwrap_or_else(|| Duration::from_secs(default_ttl_secs(kind)))
    }

    pub fn set(&mut self, kind: ResourceKind, ttl: Duration) {
        self.ttls.insert(kind, ttl);
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        let ttls = ResourceKind::ALL
            .iter()
            .map(|kind| (*kind, Duration::from_secs(default_ttl_secs(*kind))))
            .collect();
        Self { ttls }
    }
}

#[derive(Debug, Clone)]
pub struct PluginConfig {
    pub base_url: Url,
    pub ttls: CacheTtls,
    pub http_timeout: Duration,
    pub gemini_api_key: Option<String>,
}

impl PluginConfig {
    /// Build a config for `base_url` with default TTLs.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: validate_base_url(base_url)?,
            ttls: CacheTtls::default(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            gemini_api_key: None,
        })
    }

    pub fn with_ttl(mut self, kind: ResourceKind, secs: u64) -> Self {
        self.ttls.set(kind, Duration::from_secs(secs));
        self
    }

    /// Load from process environment, reading `.env` first if it exists.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("REYA_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut config = Self::new(&base_url)?;

        for kind in ResourceKind::ALL {
            if let Some(secs) = parse_secs(&lookup, ttl_env_var(kind))? {
                config.ttls.set(kind, Duration::from_secs(secs));
            }
        }

        if let Some(secs) = parse_secs(&lookup, "REYA_HTTP_TIMEOUT_SECS")? {
            config.http_timeout = Duration::from_secs(secs);
        }

        config.gemini_api_key = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());

        Ok(config)
    }

    /// Absolute URL for an API path such as `/api/trading/markets`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn parse_secs<F>(lookup: &F, name: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<u64>().map(Some).map_err(|_| {
            PluginError::Configuration(format!("{} must be a whole number of seconds, got '{}'", name, raw))
        }),
    }
}

fn validate_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| PluginError::Configuration(format!("Invalid REYA_API_BASE_URL '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(PluginError::Configuration(format!(
                "REYA_API_BASE_URL must use http or https, got '{}'",
                other
            )))
        }
    }

    if url.host_str().is_none() {
        return Err(PluginError::Configuration(format!(
            "REYA_API_BASE_URL has no host: '{}'",
            raw
        )));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = PluginConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config.base_url.as_str(), "https://api.reya.xyz/");
        assert_eq!(config.ttls.get(ResourceKind::Prices), Duration::from_secs(10));
        assert_eq!(config.ttls.get(ResourceKind::Markets), Duration::from_secs(300));
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let err = PluginConfig::from_lookup(lookup_from(&[("REYA_API_BASE_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, PluginError::Configuration(_)));

        let err = PluginConfig::new("ftp://api.reya.xyz").unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_ttl_overrides_are_independent() {
        let config = PluginConfig::from_lookup(lookup_from(&[("REYA_CACHE_TTL_PRICES_SECS", "3")]))
            .unwrap();

        assert_eq!(config.ttls.get(ResourceKind::Prices), Duration::from_secs(3));
        assert_eq!(config.ttls.get(ResourceKind::MarketData), Duration::from_secs(30));
        assert_eq!(config.ttls.get(ResourceKind::Assets), Duration::from_secs(600));

        let tweaked = PluginConfig::new(DEFAULT_BASE_URL)
            .unwrap()
            .with_ttl(ResourceKind::Assets, 1);
        assert_eq!(tweaked.ttls.get(ResourceKind::Assets), Duration::from_secs(1));
        assert_eq!(tweaked.ttls.get(ResourceKind::Markets), Duration::from_secs(300));
    }

    #[test]
    fn test_non_numeric_ttl_is_configuration_error() {
        let err = PluginConfig::from_lookup(lookup_from(&[("REYA_CACHE_TTL_ASSETS_SECS", "ten")]))
            .unwrap_err();
        assert!(matches!(err, PluginError::Configuration(_)));
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = PluginConfig::new("https://api.reya.xyz/").unwrap();
        assert_eq!(
            config.endpoint("/api/trading/markets"),
            "https://api.reya.xyz/api/trading/markets"
        );
    }
}
