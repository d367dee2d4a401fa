//! Intent Classifier
//!
//! Assigns one `IntentKind` to a user message. The model path asks the
//! completion capability for a JSON verdict; any failure there (transport,
//! empty reply, unparseable reply) drops to deterministic keyword matching.
//! Source flags always come from `IntentKind::default_sources`.

use crate::completion::TextCompletion;
use crate::models::{ExtractedEntities, IntentAnalysis, IntentKind};
use crate::error::PluginError;
use crate::topics::contains_term;
use crate::Result;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

const FALLBACK_KNOWLEDGE_CONFIDENCE: f32 = 0.6;
const FALLBACK_PRICE_CONFIDENCE: f32 = 0.6;
const FALLBACK_CHAT_CONFIDENCE: f32 = 0.5;
const DEFAULT_MODEL_CONFIDENCE: f32 = 0.8;

/// Static keyword lists, English and Spanish, matched lowercase
const KNOWLEDGE_KEYWORDS: &[&str] = &[
    // English
    "what is reya", "what's reya", "how does", "how do i", "explain", "tell me about",
    "documentation", "docs", "tutorial", "guide", "learn about", "difference between",
    // Spanish
    "qué es reya", "que es reya", "cómo funciona", "como funciona", "explica",
    "documentación", "documentacion", "guía", "guia", "diferencia entre",
];

const PRICE_KEYWORDS: &[&str] = &[
    // English
    "price", "cost", "worth", "how much", "trading at", "quote",
    // Spanish
    "precio", "cuánto", "cuanto", "cotización", "cotizacion", "vale",
];

const KNOWN_ASSETS: &[&str] = &[
    "BTC", "ETH", "SOL", "RUSD", "USDC", "USDT", "WETH", "WBTC", "ARB", "OP", "DOGE", "AVAX",
    "LINK", "SUI", "BNB", "XRP", "WSTETH", "SRUSD",
];

const ASSET_ALIASES: &[(&str, &str)] = &[
    ("bitcoin", "BTC"),
    ("ethereum", "ETH"),
    ("ether", "ETH"),
    ("solana", "SOL"),
    ("dogecoin", "DOGE"),
];

const TIMEFRAMES: &[(&[&str], &str)] = &[
    (&["24h", "today", "hoy"], "24h"),
    (&["week", "weekly", "semana", "semanal"], "7d"),
    (&["month", "monthly", "mes", "mensual"], "30d"),
];

/// Outcome of parsing a model reply. Callers must handle `Unparseable`.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelVerdict {
    Parsed(IntentAnalysis),
    Unparseable { raw: String, reason: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVerdict {
    intent: String,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default, rename = "shouldUseAPI")]
    should_use_api: Option<bool>,
    #[serde(default)]
    should_use_knowledge: Option<bool>,
    #[serde(default)]
    extracted_entities: Option<ExtractedEntities>,
}

pub struct IntentClassifier {
    model: Arc<dyn TextCompletion>,
}

impl IntentClassifier {
    pub fn new(model: Arc<dyn TextCompletion>) -> Self {
        Self { model }
    }

    /// Always yields an analysis; model errors are recovered locally.
    pub async fn analyze(&self, message: &str) -> IntentAnalysis {
        match self.classify_with_model(message).await {
            Ok(analysis) => {
                info!(intent = %analysis.intent, confidence = analysis.confidence, "Intent classified by model");
                analysis
            }
            Err(e) => {
                warn!(error = %e, "Model classification failed, using keyword fallback");
                keyword_fallback(message)
            }
        }
    }

    async fn classify_with_model(&self, message: &str) -> Result<IntentAnalysis> {
        let prompt = build_prompt(message);
        let raw = self.model.complete(&prompt).await?;

        match parse_model_response(&raw) {
            ModelVerdict::Parsed(analysis) => Ok(analysis),
            ModelVerdict::Unparseable { raw, reason } => {
                debug!(raw = %raw, "Unparseable classifier reply");
                Err(PluginError::Classification(reason))
            }
        }
    }
}

/// Build the structured classification prompt
pub fn build_prompt(message: &str) -> String {
    format!(
        r#"You are the intent router for a Reya DEX assistant.

Classify the user message into exactly ONE intent:

- KNOWLEDGE_QUERY – how Reya works, concepts, documentation
  e.g. "How does Reya's margin system work?" / "¿Cómo funciona el margen en Reya?"
- PRICE_QUERY – current price of an asset or pair
  e.g. "What is the ETH price?" / "¿Cuál es el precio de BTC?"
- MARKET_QUERY – markets, volume, open interest, funding
  e.g. "Show me the BTC market stats" / "Muéstrame los mercados disponibles"
- ASSET_QUERY – supported assets and collateral
  e.g. "Which assets can I deposit?" / "¿Qué activos soporta Reya?"
- COMPARISON_QUERY – comparing two or more assets or markets
  e.g. "Compare BTC and ETH volume" / "Compara SOL con ETH"
- HISTORICAL_DATA_QUERY – past prices or trends over time
  e.g. "How did ETH perform last week?" / "¿Cómo le fue a BTC el mes pasado?"
- GENERAL_CHAT – greetings and anything else
  e.g. "Hi there!" / "¡Hola, qué tal?"

USER MESSAGE:
{}

Rules:
- Return ONLY valid JSON
- No explanation text outside the JSON
- confidence is a number between 0 and 1
- JSON format:

{{
  "intent": "PRICE_QUERY",
  "confidence": 0.9,
  "reasoning": "...",
  "shouldUseAPI": true,
  "shouldUseKnowledge": false,
  "extractedEntities": {{ "assets": ["ETH"], "timeframe": null, "queryType": "spot_price" }}
}}
"#,
        message
    )
}

/// Parse a model reply into a verdict.
pub fn parse_model_response(raw: &str) -> ModelVerdict {
    let unparseable = |reason: String| ModelVerdict::Unparseable {
        raw: raw.to_string(),
        reason,
    };

    let Some(json_str) = extract_json_object(raw) else {
        return unparseable("no JSON object in classifier reply".to_string());
    };

    let verdict: RawVerdict = match serde_json::from_str(json_str) {
        Ok(v) => v,
        Err(e) => return unparseable(format!("invalid classifier JSON: {}", e)),
    };

    let intent = match verdict.intent.parse::<IntentKind>() {
        Ok(intent) => intent,
        Err(e) => return unparseable(e),
    };

    let entities = verdict.extracted_entities.unwrap_or_default();
    let sources = intent.default_sources();
    if verdict.should_use_api.is_some_and(|v| v != sources.use_api)
        || verdict.should_use_knowledge.is_some_and(|v| v != sources.use_knowledge)
    {
        debug!(intent = %intent, "Model source flags differ from intent table, using table");
    }

    ModelVerdict::Parsed(IntentAnalysis {
        intent,
        confidence: verdict
            .confidence
            .filter(|c| c.is_finite())
            .unwrap_or(DEFAULT_MODEL_CONFIDENCE)
            .clamp(0.0, 1.0),
        reasoning: verdict.reasoning.unwrap_or_default(),
        should_use_api: sources.use_api,
        should_use_knowledge: sources.use_knowledge,
        extracted_entities: ExtractedEntities {
            assets: normalize_assets(entities.assets),
            ..entities
        },
    })
}

/// Locate a JSON object: a ```json fence first, else the outermost braces.
fn extract_json_object(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let after = &text[start + 7..];
        if let Some(end) = after.find("```") {
            return Some(after[..end].trim());
        }
    }

    let brace_start = text.find('{')?;
    let brace_end = text.rfind('}')?;
    (brace_end > brace_start).then(|| &text[brace_start..=brace_end])
}

/// Deterministic classification by whole-word keyword matching.
pub fn keyword_fallback(message: &str) -> IntentAnalysis {
    let lowered = message.to_lowercase();
    let has_any = |keywords: &[&str]| keywords.iter().any(|k| contains_term(&lowered, k));

    let (intent, confidence, reasoning) = if has_any(KNOWLEDGE_KEYWORDS) {
        (
            IntentKind::KnowledgeQuery,
            FALLBACK_KNOWLEDGE_CONFIDENCE,
            "keyword fallback: knowledge marker",
        )
    } else if has_any(PRICE_KEYWORDS) {
        (
            IntentKind::PriceQuery,
            FALLBACK_PRICE_CONFIDENCE,
            "keyword fallback: price marker",
        )
    } else {
        (
            IntentKind::GeneralChat,
            FALLBACK_CHAT_CONFIDENCE,
            "keyword fallback: no marker",
        )
    };

    let sources = intent.default_sources();

    IntentAnalysis {
        intent,
        confidence,
        reasoning: reasoning.to_string(),
        should_use_api: sources.use_api,
        should_use_knowledge: sources.use_knowledge,
        extracted_entities: ExtractedEntities {
            assets: extract_assets(message),
            timeframe: extract_timeframe(&lowered),
            query_type: None,
        },
    }
}

/// Known tickers and aliases mentioned in the message, in order, deduplicated.
pub fn extract_assets(message: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    for token in message.split(|c: char| !c.is_ascii_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        let upper = token.to_ascii_uppercase();

        let symbol = if KNOWN_ASSETS.contains(&upper.as_str()) {
            Some(upper)
        } else {
            alias_symbol(&token.to_ascii_lowercase()).map(str::to_string)
        };

        if let Some(symbol) = symbol {
            if !found.contains(&symbol) {
                found.push(symbol);
            }
        }
    }

    found
}

/// Canonical ticker for a model-supplied asset name. Aliases map to their
/// symbol, anything else is uppercased; blanks are dropped.
pub fn normalize_asset(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }

    let symbol = alias_symbol(&trimmed.to_lowercase())
        .map(str::to_string)
        .unwrap_or_else(|| trimmed.to_uppercase());
    Some(symbol)
}

fn normalize_assets(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for symbol in names.iter().filter_map(|n| normalize_asset(n)) {
        if !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}

fn alias_symbol(lower: &str) -> Option<&'static str> {
    ASSET_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, symbol)| *symbol)
}

fn extract_timeframe(lowered: &str) -> Option<String> {
    TIMEFRAMES
        .iter()
        .find(|(terms, _)| terms.iter().any(|t| contains_term(lowered, t)))
        .map(|(_, window)| window.to_string())
}
