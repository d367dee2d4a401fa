//! Supported asset listing

use super::{apologize, reply, should_run, Action};
use crate::models::{Asset, ResourceKind};
use crate::runtime::{ActionResult, Message, ReplySink, TurnState};
use crate::service::ReyaService;
use crate::Result;
use tracing::info;

pub struct AssetAction {
    service: ReyaService,
}

impl AssetAction {
    pub fn new(service: ReyaService) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl Action for AssetAction {
    fn name(&self) -> &'static str {
        "GET_REYA_ASSETS"
    }

    fn description(&self) -> &'static str {
        "Assets supported on Reya"
    }

    async fn validate(&self, message: &Message, state: &TurnState) -> bool {
        should_run(ResourceKind::Assets, message, state)
    }

    async fn handler(
        &self,
        _message: &Message,
        _state: &TurnState,
        sink: &mut dyn ReplySink,
    ) -> Result<ActionResult> {
        let assets = match self.service.assets().await {
            Ok(assets) => assets,
            Err(e) => return Ok(apologize(self.name(), &e, sink)),
        };

        info!(count = assets.len(), "Answering asset query");
        Ok(reply(self.name(), render(&assets), sink))
    }
}

fn render(assets: &[Asset]) -> String {
    if assets.is_empty() {
        return "Reya isn't listing any assets right now.".to_string();
    }

    let lines: Vec<String> = assets
        .iter()
        .map(|a| match (&a.name, a.decimals) {
            (Some(name), Some(d)) => format!("• {} ({}, {} decimals)", a.symbol, name, d),
            (Some(name), None) => format!("• {} ({})", a.symbol, name),
            (None, Some(d)) => format!("• {} ({} decimals)", a.symbol, d),
            (None, None) => format!("• {}", a.symbol),
        })
        .collect();

    format!("Reya supports {} assets:\n{}", assets.len(), lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::paths;
    use crate::config::CacheTtls;
    use crate::runtime::CollectedReplies;
    use crate::test_support::StubFetcher;
    use serde_json::json;
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_lists_assets_and_reuses_cache() {
        let stub = Arc::new(StubFetcher::new());
        stub.respond(
            paths::ASSETS,
            json!([
                { "symbol": "RUSD", "name": "Reya USD", "decimals": 6 },
                { "symbol": "WETH" }
            ]),
        );
        let action = AssetAction::new(ReyaService::new(stub.clone(), CacheTtls::default()));
        let message = Message::new(Uuid::new_v4(), "which assets are supported?");

        for _ in 0..2 {
            let mut sink = CollectedReplies::default();
            action.handler(&message, &TurnState::new(), &mut sink).await.unwrap();
            assert!(sink.replies[0].contains("• RUSD (Reya USD, 6 decimals)"));
            assert!(sink.replies[0].contains("• WETH"));
        }

        assert_eq!(stub.calls(paths::ASSETS), 1);
    }
}
