//! Intent gate provider
//!
//! Classifies the message and publishes the dispatch decision for the turn.

use super::{Provider, INTENT_GATE_PRIORITY};
use crate::classifier::IntentClassifier;
use crate::gate;
use crate::runtime::{Message, ProviderResult, TurnState};
use crate::Result;
use serde_json::{json, Map, Value};
use tracing::info;

pub struct IntentGateProvider {
    classifier: IntentClassifier,
}

impl IntentGateProvider {
    pub fn new(classifier: IntentClassifier) -> Self {
        Self { classifier }
    }
}

#[async_trait::async_trait]
impl Provider for IntentGateProvider {
    fn name(&self) -> &'static str {
        "REYA_INTENT_GATE"
    }

    fn priority(&self) -> i32 {
        INTENT_GATE_PRIORITY
    }

    async fn get(&self, message: &Message, _state: &TurnState) -> Result<ProviderResult> {
        let analysis = self.classifier.analyze(&message.text).await;
        let flags = gate::decide(&analysis);

        info!(
            message_id = %message.id,
            intent = %flags.intent,
            allow_api = flags.allow_api_actions,
            block_others = flags.block_other_actions,
            source = %flags.used_source,
            "Dispatch decided"
        );

        let mut values = Map::new();
        values.insert("intent".into(), json!(flags.intent));
        values.insert("allowAPIActions".into(), Value::Bool(flags.allow_api_actions));
        values.insert("blockOtherActions".into(), Value::Bool(flags.block_other_actions));
        values.insert("usedSource".into(), Value::String(flags.used_source.clone()));

        let text = format!(
            "Detected intent {} ({:.0}% confidence); answering via {}.",
            flags.intent,
            analysis.confidence * 100.0,
            flags.used_source
        );

        Ok(ProviderResult {
            values,
            data: json!({ "analysis": analysis, "dispatch": flags }),
            text: Some(text),
            dispatch: Some(flags),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IntentKind;
    use crate::test_support::ScriptedCompletion;
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_publishes_dispatch_flags() {
        let provider = IntentGateProvider::new(IntentClassifier::new(Arc::new(
            ScriptedCompletion::replying(vec![r#"{"intent":"KNOWLEDGE_QUERY","confidence":0.95}"#]),
        )));

        let result = provider
            .get(&Message::new(Uuid::new_v4(), "how does Reya work?"), &TurnState::new())
            .await
            .unwrap();

        let flags = result.dispatch.expect("gate must publish flags");
        assert_eq!(flags.intent, IntentKind::KnowledgeQuery);
        assert!(flags.block_other_actions);
        assert_eq!(result.values["usedSource"], "knowledge_base");
        assert_eq!(result.data["dispatch"]["allowAPIActions"], false);
        assert!(result.text.unwrap().contains("KNOWLEDGE_QUERY"));
    }
}
