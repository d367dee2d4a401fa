//! Core data models for the Reya plugin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

//
// ================= Resource kinds =================
//

/// Kinds of remote resource fronted by the cache. Each kind has its own TTL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Markets,
    MarketData,
    Prices,
    Assets,
    Fees,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Markets,
        ResourceKind::MarketData,
        ResourceKind::Prices,
        ResourceKind::Assets,
        ResourceKind::Fees,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Markets => "markets",
            ResourceKind::MarketData => "market-data",
            ResourceKind::Prices => "prices",
            ResourceKind::Assets => "assets",
            ResourceKind::Fees => "fees",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ================= Exchange records =================
//

/// A market listed on the exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub underlying_asset: Option<String>,
    #[serde(default)]
    pub quote_token: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "opt_number")]
    pub max_leverage: Option<f64>,
}

impl Market {
    /// Display symbol, falling back to the underlying asset and then the id.
    pub fn symbol(&self) -> &str {
        self.ticker
            .as_deref()
            .or(self.underlying_asset.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Live trading data for one market.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    #[serde(deserialize_with = "string_or_number")]
    pub market_id: String,
    #[serde(default, deserialize_with = "opt_number")]
    pub mark_price: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub oracle_price: Option<f64>,
    #[serde(default, rename = "volume24h", deserialize_with = "opt_number")]
    pub volume_24h: Option<f64>,
    #[serde(default, rename = "priceChange24h", deserialize_with = "opt_number")]
    pub price_change_24h: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub open_interest: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub funding_rate: Option<f64>,
}

/// Oracle price for an asset pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub asset_pair_id: String,
    #[serde(default, deserialize_with = "opt_number")]
    pub oracle_price: Option<f64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

/// A collateral or settlement asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeTier {
    #[serde(deserialize_with = "string_or_number")]
    pub tier_id: String,
    #[serde(default, deserialize_with = "opt_number")]
    pub taker_fee: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub maker_fee: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub volume_threshold: Option<f64>,
}

/// Exchange-wide fee settings. Shape varies between deployments, so unknown
/// keys are kept verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GlobalFeeParameters {
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// List endpoints answer either with a bare array or `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListResponse<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Bare(items) => items,
            ListResponse::Wrapped { data } => data,
        }
    }
}

/// Single-record endpoints answer either bare or `{ "data": {...} }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ItemResponse<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> ItemResponse<T> {
    pub fn into_inner(self) -> T {
        match self {
            ItemResponse::Wrapped { data } => data,
            ItemResponse::Bare(item) => item,
        }
    }
}

//
// ================= Intent =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentKind {
    KnowledgeQuery,
    PriceQuery,
    MarketQuery,
    AssetQuery,
    ComparisonQuery,
    HistoricalDataQuery,
    GeneralChat,
}

/// Default lookup sources for an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFlags {
    pub use_api: bool,
    pub use_knowledge: bool,
}

impl IntentKind {
    pub const ALL: [IntentKind; 7] = [
        IntentKind::KnowledgeQuery,
        IntentKind::PriceQuery,
        IntentKind::MarketQuery,
        IntentKind::AssetQuery,
        IntentKind::ComparisonQuery,
        IntentKind::HistoricalDataQuery,
        IntentKind::GeneralChat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::KnowledgeQuery => "KNOWLEDGE_QUERY",
            IntentKind::PriceQuery => "PRICE_QUERY",
            IntentKind::MarketQuery => "MARKET_QUERY",
            IntentKind::AssetQuery => "ASSET_QUERY",
            IntentKind::ComparisonQuery => "COMPARISON_QUERY",
            IntentKind::HistoricalDataQuery => "HISTORICAL_DATA_QUERY",
            IntentKind::GeneralChat => "GENERAL_CHAT",
        }
    }

    /// Which sources an intent should consult. Both the model path and the
    /// keyword fallback derive their flags from this table.
    pub fn default_sources(&self) -> SourceFlags {
        let (use_api, use_knowledge) = match self {
            IntentKind::KnowledgeQuery => (false, true),
            IntentKind::PriceQuery => (true, false),
            IntentKind::MarketQuery => (true, false),
            IntentKind::AssetQuery => (true, false),
            IntentKind::ComparisonQuery => (true, false),
            IntentKind::HistoricalDataQuery => (true, false),
            IntentKind::GeneralChat => (false, false),
        };
        SourceFlags {
            use_api,
            use_knowledge,
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace([' ', '-'], "_");
        IntentKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown intent: {}", s))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEntities {
    #[serde(default)]
    pub assets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntentAnalysis {
    pub intent: IntentKind,
    /// Clamped to `[0, 1]`.
    pub confidence: f32,
    pub reasoning: String,
    #[serde(rename = "shouldUseAPI")]
    pub should_use_api: bool,
    pub should_use_knowledge: bool,
    pub extracted_entities: ExtractedEntities,
}

//
// ================= Dispatch =================
//

/// Routing decision for one turn. Written once by the dispatch gate,
/// read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchFlags {
    pub intent: IntentKind,
    #[serde(rename = "allowAPIActions")]
    pub allow_api_actions: bool,
    pub block_other_actions: bool,
    pub used_source: String,
    pub extracted_entities: ExtractedEntities,
    pub timestamp: DateTime<Utc>,
}

//
// ================= Serde helpers =================
//

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Str(String),
    Int(i64),
    Float(f64),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Str(s) => s,
        StringOrNumber::Int(i) => i.to_string(),
        StringOrNumber::Float(f) => f.to_string(),
    })
}

/// Numeric fields arrive as JSON numbers or decimal strings.
fn opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
        Some(StringOrNumber::Str(s)) => s.trim().parse::<f64>().ok(),
        Some(StringOrNumber::Int(i)) => Some(i as f64),
        Some(StringOrNumber::Float(f)) => Some(f),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_intent_has_default_sources() {
        for kind in IntentKind::ALL {
            let flags = kind.default_sources();
            assert!(!(flags.use_api && flags.use_knowledge), "{} uses both", kind);
        }
        assert!(IntentKind::KnowledgeQuery.default_sources().use_knowledge);
        assert!(IntentKind::PriceQuery.default_sources().use_api);
        assert_eq!(
            IntentKind::GeneralChat.default_sources(),
            SourceFlags { use_api: false, use_knowledge: false }
        );
    }

    #[test]
    fn test_intent_parsing_is_lenient() {
        assert_eq!("price_query".parse::<IntentKind>(), Ok(IntentKind::PriceQuery));
        assert_eq!(" Historical Data Query ".parse::<IntentKind>(), Ok(IntentKind::HistoricalDataQuery));
        assert!("WEATHER_QUERY".parse::<IntentKind>().is_err());
    }

    #[test]
    fn test_market_data_accepts_string_numbers() {
        let data: MarketData = serde_json::from_value(json!({
            "marketId": 1,
            "markPrice": "64250.5",
            "volume24h": 1200000,
            "fundingRate": null
        }))
        .unwrap();

        assert_eq!(data.market_id, "1");
        assert_eq!(data.mark_price, Some(64250.5));
        assert_eq!(data.volume_24h, Some(1_200_000.0));
        assert_eq!(data.funding_rate, None);
        assert_eq!(data.open_interest, None);
    }

    #[test]
    fn test_list_response_shapes() {
        let bare: ListResponse<Asset> =
            serde_json::from_value(json!([{ "symbol": "RUSD" }])).unwrap();
        let wrapped: ListResponse<Asset> =
            serde_json::from_value(json!({ "data": [{ "symbol": "WETH" }] })).unwrap();

        assert_eq!(bare.into_vec()[0].symbol, "RUSD");
        assert_eq!(wrapped.into_vec()[0].symbol, "WETH");
    }

    #[test]
    fn test_analysis_uses_wire_field_names() {
        let analysis = IntentAnalysis {
            intent: IntentKind::PriceQuery,
            confidence: 0.9,
            reasoning: "asks for price".into(),
            should_use_api: true,
            should_use_knowledge: false,
            extracted_entities: ExtractedEntities::default(),
        };
        let value = serde_json::to_value(&analysis).unwrap();

        assert_eq!(value["intent"], "PRICE_QUERY");
        assert_eq!(value["shouldUseAPI"], true);
        assert_eq!(value["shouldUseKnowledge"], false);
    }
}
