//! Provider trait
//!
//! Providers run before reply generation, in ascending `priority`, and
//! contribute values, data and text to the turn state.

use crate::runtime::{Message, ProviderResult, TurnState};
use crate::Result;

pub mod exchange;
pub mod intent;

pub use exchange::ExchangeContextProvider;
pub use intent::IntentGateProvider;

/// Runs first; everything else reads its routing decision.
pub const INTENT_GATE_PRIORITY: i32 = -100;
pub const RESOURCE_PROVIDER_PRIORITY: i32 = 10;

#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;
    fn priority(&self) -> i32;
    async fn get(&self, message: &Message, state: &TurnState) -> Result<ProviderResult>;
}
