//! Text-completion capability supplied by the host runtime

use crate::error::PluginError;
use crate::Result;

#[async_trait::async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Backend for hosts with no model configured. Always fails, which sends
/// the classifier down its keyword fallback.
pub struct UnavailableCompletion;

#[async_trait::async_trait]
impl TextCompletion for UnavailableCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(PluginError::Completion("no completion model configured".to_string()))
    }
}
