//! Action trait and registry
//!
//! Actions are the API-backed responders. The host calls `validate` to
//! decide eligibility, then `handler` to produce the reply.

use crate::error::PluginError;
use crate::format::UPSTREAM_APOLOGY;
use crate::models::ResourceKind;
use crate::runtime::{ActionResult, Message, ReplySink, TurnState};
use crate::topics;
use crate::Result;
use std::sync::Arc;
use tracing::{debug, error};

pub mod asset;
pub mod market;
pub mod price;

pub use asset::AssetAction;
pub use market::MarketAction;
pub use price::PriceAction;

#[async_trait::async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn validate(&self, message: &Message, state: &TurnState) -> bool;
    async fn handler(
        &self,
        message: &Message,
        state: &TurnState,
        sink: &mut dyn ReplySink,
    ) -> Result<ActionResult>;
}

/// Shared admission check for API-backed actions.
///
/// Runs only when the turn's dispatch flags exist and allow API actions,
/// and the message mentions the action's topic.
pub fn should_run(kind: ResourceKind, message: &Message, state: &TurnState) -> bool {
    let Some(flags) = state.dispatch() else {
        debug!(resource = %kind, "No dispatch flags for this turn, declining");
        return false;
    };

    if !flags.allow_api_actions {
        debug!(resource = %kind, source = %flags.used_source, "Gate disallows API actions");
        return false;
    }

    topics::mentions(kind, &message.text)
}

/// Log an upstream failure and emit the generic apology.
pub(crate) fn apologize(action: &'static str, err: &PluginError, sink: &mut dyn ReplySink) -> ActionResult {
    error!(action, error = %err, "Action failed");
    sink.emit(UPSTREAM_APOLOGY.to_string());
    ActionResult::Replied {
        action: action.to_string(),
        text: UPSTREAM_APOLOGY.to_string(),
        success: false,
    }
}

/// Emit a successful reply.
pub(crate) fn reply(action: &'static str, text: String, sink: &mut dyn ReplySink) -> ActionResult {
    sink.emit(text.clone());
    ActionResult::Replied {
        action: action.to_string(),
        text,
        success: true,
    }
}

/// Ordered action list; the first action that validates owns the turn.
#[derive(Default)]
pub struct ActionRegistry {
    actions: Vec<Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, action: Arc<dyn Action>) {
        debug!(action = action.name(), description = action.description(), "Action registered");
        self.actions.push(action);
    }

    pub fn list(&self) -> Vec<&'static str> {
        self.actions.iter().map(|a| a.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Action>> {
        self.actions.iter()
    }
}
