//! Plugin wiring
//!
//! Builds the providers and actions over one shared service, composes the
//! per-turn state and routes a message to at most one action.
//!
//! TURN:
//! MESSAGE → PROVIDERS (gate first) → TURN STATE → VALIDATE → HANDLER → REPLY

use crate::actions::{ActionRegistry, AssetAction, MarketAction, PriceAction};
use crate::api::{ExchangeFetcher, ReyaApiClient};
use crate::classifier::IntentClassifier;
use crate::completion::TextCompletion;
use crate::config::{CacheTtls, PluginConfig};
use crate::providers::{ExchangeContextProvider, IntentGateProvider, Provider};
use crate::runtime::{ActionResult, Message, ReplySink, TurnState};
use crate::service::ReyaService;
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ReyaPlugin {
    providers: Vec<Arc<dyn Provider>>,
    actions: ActionRegistry,
    service: ReyaService,
}

impl ReyaPlugin {
    /// Plugin over the live Reya API.
    pub fn new(config: PluginConfig, model: Arc<dyn TextCompletion>) -> Result<Self> {
        let ttls = config.ttls.clone();
        let client = ReyaApiClient::new(config)?;
        Ok(Self::with_fetcher(Arc::new(client), ttls, model))
    }

    pub fn with_fetcher(
        fetcher: Arc<dyn ExchangeFetcher>,
        ttls: CacheTtls,
        model: Arc<dyn TextCompletion>,
    ) -> Self {
        let service = ReyaService::new(fetcher, ttls);

        let mut providers: Vec<Arc<dyn Provider>> = vec![
            Arc::new(IntentGateProvider::new(IntentClassifier::new(model))),
            Arc::new(ExchangeContextProvider::new(service.clone())),
        ];
        providers.sort_by_key(|p| p.priority());

        let mut actions = ActionRegistry::new();
        actions.register(Arc::new(PriceAction::new(service.clone())));
        actions.register(Arc::new(MarketAction::new(service.clone())));
        actions.register(Arc::new(AssetAction::new(service.clone())));

        Self {
            providers,
            actions,
            service,
        }
    }

    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub fn service(&self) -> &ReyaService {
        &self.service
    }

    /// Run every provider in priority order and merge their output.
    /// A failing provider is logged and skipped.
    pub async fn compose_state(&self, message: &Message) -> TurnState {
        let mut state = TurnState::new();

        for provider in &self.providers {
            match provider.get(message, &state).await {
                Ok(result) => state.absorb(provider.name(), result),
                Err(e) => warn!(provider = provider.name(), error = %e, "Provider failed"),
            }
        }

        state
    }

    /// Handle one turn end to end.
    pub async fn handle_message(&self, message: &Message, sink: &mut dyn ReplySink) -> Result<ActionResult> {
        let state = self.compose_state(message).await;

        if let Some(flags) = state.dispatch() {
            if flags.block_other_actions {
                info!(source = %flags.used_source, "Turn owned by external responder");
                return Ok(ActionResult::Unhandled);
            }
        }

        for action in self.actions.iter() {
            if action.validate(message, &state).await {
                info!(action = action.name(), "Action selected");
                return action.handler(message, &state, sink).await;
            }
            debug!(action = action.name(), "Action declined");
        }

        Ok(ActionResult::Unhandled)
    }
}
