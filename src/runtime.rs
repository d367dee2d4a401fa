//! Host-runtime boundary
//!
//! Message and per-turn state as the host hands them to providers and
//! actions. `TurnState` is built once per message by the compose step and
//! only read afterwards.

use crate::models::DispatchFlags;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub room_id: Uuid,
    pub text: String,
}

impl Message {
    pub fn new(room_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            text: text.into(),
        }
    }
}

/// What a provider contributes before reply generation.
#[derive(Debug, Clone, Default)]
pub struct ProviderResult {
    pub values: Map<String, Value>,
    pub data: Value,
    pub text: Option<String>,
    /// Routing decision, set only by the dispatch gate provider.
    pub dispatch: Option<DispatchFlags>,
}

#[derive(Debug, Clone, Default)]
pub struct TurnState {
    values: Map<String, Value>,
    data: Map<String, Value>,
    texts: Vec<String>,
    dispatch: Option<DispatchFlags>,
}

impl TurnState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State carrying only a routing decision.
    pub fn with_dispatch(flags: DispatchFlags) -> Self {
        Self {
            dispatch: Some(flags),
            ..Self::default()
        }
    }

    pub fn dispatch(&self) -> Option<&DispatchFlags> {
        self.dispatch.as_ref()
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn data(&self, provider: &str) -> Option<&Value> {
        self.data.get(provider)
    }

    /// Provider texts joined for prompt injection.
    pub fn text(&self) -> String {
        self.texts.join("\n")
    }

    /// Merge one provider's output. The first routing decision wins.
    pub(crate) fn absorb(&mut self, provider: &str, result: ProviderResult) {
        self.values.extend(result.values);

        if !result.data.is_null() {
            self.data.insert(provider.to_string(), result.data);
        }

        if let Some(text) = result.text.filter(|t| !t.is_empty()) {
            self.texts.push(text);
        }

        if let Some(flags) = result.dispatch {
            if self.dispatch.is_some() {
                warn!(provider, "Ignoring second routing decision for this turn");
            } else {
                self.dispatch = Some(flags);
            }
        }
    }
}

/// Stand-in for the host's reply callback.
pub trait ReplySink: Send {
    fn emit(&mut self, text: String);
}

/// Collects emitted replies in order.
#[derive(Debug, Default)]
pub struct CollectedReplies {
    pub replies: Vec<String>,
}

impl ReplySink for CollectedReplies {
    fn emit(&mut self, text: String) {
        self.replies.push(text);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// An action produced the reply. `success` is false when it emitted an
    /// apology instead of data.
    Replied {
        action: String,
        text: String,
        success: bool,
    },
    /// No action claimed the turn; the host lets others try.
    Unhandled,
}
