//! Exchange context provider
//!
//! Adds a compact market snapshot on turns the gate routed to the API.
//! Fetch failures only cost the snapshot, never the turn.

use super::{Provider, RESOURCE_PROVIDER_PRIORITY};
use crate::runtime::{Message, ProviderResult, TurnState};
use crate::service::ReyaService;
use crate::Result;
use serde_json::{json, Map};
use tracing::{debug, warn};

pub struct ExchangeContextProvider {
    service: ReyaService,
}

impl ExchangeContextProvider {
    pub fn new(service: ReyaService) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl Provider for ExchangeContextProvider {
    fn name(&self) -> &'static str {
        "REYA_EXCHANGE_CONTEXT"
    }

    fn priority(&self) -> i32 {
        RESOURCE_PROVIDER_PRIORITY
    }

    async fn get(&self, _message: &Message, state: &TurnState) -> Result<ProviderResult> {
        if !state.dispatch().is_some_and(|f| f.allow_api_actions) {
            debug!("API not allowed this turn, skipping exchange context");
            return Ok(ProviderResult::default());
        }

        let markets = match self.service.markets().await {
            Ok(markets) => markets,
            Err(e) => {
                warn!(error = %e, "Exchange context unavailable");
                return Ok(ProviderResult::default());
            }
        };

        let active: Vec<&str> = markets
            .iter()
            .filter(|m| m.is_active != Some(false))
            .map(|m| m.symbol())
            .collect();

        let mut values = Map::new();
        values.insert("reyaMarketCount".into(), json!(active.len()));

        Ok(ProviderResult {
            values,
            data: json!({ "markets": active }),
            text: Some(format!(
                "Reya lists {} active markets: {}.",
                active.len(),
                active.join(", ")
            )),
            dispatch: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::paths;
    use crate::config::CacheTtls;
    use crate::gate;
    use crate::models::{ExtractedEntities, IntentAnalysis, IntentKind};
    use crate::test_support::StubFetcher;
    use std::sync::Arc;
    use uuid::Uuid;

    fn state(intent: IntentKind) -> TurnState {
        TurnState::with_dispatch(gate::decide(&IntentAnalysis {
            intent,
            confidence: 0.9,
            reasoning: String::new(),
            should_use_api: false,
            should_use_knowledge: false,
            extracted_entities: ExtractedEntities::default(),
        }))
    }

    #[tokio::test]
    async fn test_skips_fetch_when_gate_blocks() {
        let stub = Arc::new(StubFetcher::new());
        let provider = ExchangeContextProvider::new(ReyaService::new(stub.clone(), CacheTtls::default()));

        let result = provider
            .get(&Message::new(Uuid::new_v4(), "explain margin"), &state(IntentKind::KnowledgeQuery))
            .await
            .unwrap();

        assert!(result.text.is_none());
        assert_eq!(stub.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_on_api_turn() {
        let stub = Arc::new(StubFetcher::new());
        stub.respond(paths::MARKETS, serde_json::json!([{ "id": 1, "ticker": "BTC-rUSD" }]));
        let provider = ExchangeContextProvider::new(ReyaService::new(stub.clone(), CacheTtls::default()));

        let result = provider
            .get(&Message::new(Uuid::new_v4(), "btc price"), &state(IntentKind::PriceQuery))
            .await
            .unwrap();

        assert_eq!(result.values["reyaMarketCount"], 1);
        assert!(result.text.unwrap().contains("BTC-rUSD"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_swallowed() {
        let stub = Arc::new(StubFetcher::new());
        stub.fail(paths::MARKETS, 500);
        let provider = ExchangeContextProvider::new(ReyaService::new(stub.clone(), CacheTtls::default()));

        let result = provider
            .get(&Message::new(Uuid::new_v4(), "btc price"), &state(IntentKind::PriceQuery))
            .await
            .unwrap();

        assert!(result.values.is_empty());
    }
}
