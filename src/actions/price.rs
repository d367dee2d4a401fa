//! Oracle price lookups

use super::{apologize, reply, should_run, Action};
use crate::classifier::extract_assets;
use crate::format;
use crate::models::{Price, ResourceKind};
use crate::runtime::{ActionResult, Message, ReplySink, TurnState};
use crate::service::ReyaService;
use crate::Result;
use tracing::info;

const MAX_UNFILTERED_PRICES: usize = 5;

pub struct PriceAction {
    service: ReyaService,
}

impl PriceAction {
    pub fn new(service: ReyaService) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl Action for PriceAction {
    fn name(&self) -> &'static str {
        "GET_REYA_PRICE"
    }

    fn description(&self) -> &'static str {
        "Current oracle prices for Reya asset pairs"
    }

    async fn validate(&self, message: &Message, state: &TurnState) -> bool {
        should_run(ResourceKind::Prices, message, state)
    }

    async fn handler(
        &self,
        message: &Message,
        state: &TurnState,
        sink: &mut dyn ReplySink,
    ) -> Result<ActionResult> {
        let wanted = requested_assets(message, state);

        let prices = match self.service.prices().await {
            Ok(prices) => prices,
            Err(e) => return Ok(apologize(self.name(), &e, sink)),
        };

        info!(assets = ?wanted, available = prices.len(), "Answering price query");
        Ok(reply(self.name(), render(&prices, &wanted), sink))
    }
}

/// Assets named by the gate's entities, else found in the message.
pub(crate) fn requested_assets(message: &Message, state: &TurnState) -> Vec<String> {
    state
        .dispatch()
        .map(|f| f.extracted_entities.assets.clone())
        .filter(|assets| !assets.is_empty())
        .unwrap_or_else(|| extract_assets(&message.text))
}

fn render(prices: &[Price], wanted: &[String]) -> String {
    if wanted.is_empty() {
        let mut sorted: Vec<&Price> = prices.iter().collect();
        sorted.sort_by(|a, b| a.asset_pair_id.cmp(&b.asset_pair_id));

        if sorted.is_empty() {
            return "Reya isn't reporting any prices right now.".to_string();
        }

        let lines: Vec<String> = sorted
            .iter()
            .take(MAX_UNFILTERED_PRICES)
            .map(|p| format!("• {}: {}", p.asset_pair_id, format::usd(p.oracle_price)))
            .collect();
        return format!("Current Reya oracle prices:\n{}", lines.join("\n"));
    }

    let mut lines = Vec::new();
    for asset in wanted {
        match prices
            .iter()
            .find(|p| p.asset_pair_id.to_uppercase().starts_with(asset.as_str()))
        {
            Some(p) => lines.push(format!("• {}: {}", p.asset_pair_id, format::usd(p.oracle_price))),
            None => lines.push(format!("• {}: no price listed on Reya", asset)),
        }
    }
    format!("Current Reya oracle prices:\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::paths;
    use crate::config::CacheTtls;
    use crate::format::UPSTREAM_APOLOGY;
    use crate::gate;
    use crate::models::{ExtractedEntities, IntentAnalysis, IntentKind};
    use crate::runtime::CollectedReplies;
    use crate::test_support::StubFetcher;
    use serde_json::json;
    use std::sync::Arc;
    use uuid::Uuid;

    fn price_state(assets: Vec<&str>) -> TurnState {
        TurnState::with_dispatch(gate::decide(&IntentAnalysis {
            intent: IntentKind::PriceQuery,
            confidence: 0.9,
            reasoning: String::new(),
            should_use_api: true,
            should_use_knowledge: false,
            extracted_entities: ExtractedEntities {
                assets: assets.into_iter().map(String::from).collect(),
                ..Default::default()
            },
        }))
    }

    #[tokio::test]
    async fn test_reports_requested_asset() {
        let stub = Arc::new(StubFetcher::new());
        stub.respond(
            paths::PRICES,
            json!([
                { "assetPairId": "BTCRUSD", "oraclePrice": "64250.5" },
                { "assetPairId": "ETHRUSD", "oraclePrice": 3120.4 }
            ]),
        );
        let action = PriceAction::new(ReyaService::new(stub.clone(), CacheTtls::default()));
        let mut sink = CollectedReplies::default();

        let result = action
            .handler(&Message::new(Uuid::new_v4(), "eth price?"), &price_state(vec!["ETH"]), &mut sink)
            .await
            .unwrap();

        assert!(matches!(result, ActionResult::Replied { success: true, .. }));
        assert_eq!(sink.replies.len(), 1);
        assert!(sink.replies[0].contains("ETHRUSD: $3,120.40"));
        assert!(!sink.replies[0].contains("BTCRUSD"));
    }

    #[tokio::test]
    async fn test_upstream_failure_emits_apology_only() {
        let stub = Arc::new(StubFetcher::new());
        stub.fail(paths::PRICES, 503);
        let action = PriceAction::new(ReyaService::new(stub.clone(), CacheTtls::default()));
        let mut sink = CollectedReplies::default();

        let result = action
            .handler(&Message::new(Uuid::new_v4(), "btc price"), &price_state(vec![]), &mut sink)
            .await
            .unwrap();

        assert!(matches!(result, ActionResult::Replied { success: false, .. }));
        assert_eq!(sink.replies, vec![UPSTREAM_APOLOGY.to_string()]);
        assert!(!sink.replies[0].contains("503"));
    }

    #[test]
    fn test_render_unknown_and_unfiltered() {
        let prices = vec![Price {
            asset_pair_id: "SOLRUSD".into(),
            oracle_price: None,
            updated_at: None,
        }];

        assert!(render(&prices, &["DOGE".to_string()]).contains("DOGE: no price listed"));
        assert!(render(&prices, &[]).contains("SOLRUSD: N/A"));
    }
}
