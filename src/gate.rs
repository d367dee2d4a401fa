//! Dispatch Gate
//!
//! Turns one `IntentAnalysis` into the `DispatchFlags` every handler trusts
//! for the rest of the turn. No I/O, no model calls. The gate never invokes
//! handlers; the flags reach them through the composed turn state.

use crate::models::{DispatchFlags, IntentAnalysis, IntentKind};
use chrono::{DateTime, Utc};

pub const SOURCE_KNOWLEDGE_BASE: &str = "knowledge_base";
pub const SOURCE_REYA_API: &str = "reya_api";

/// One row of the routing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub allow_api_actions: bool,
    pub block_other_actions: bool,
    pub used_source: &'static str,
}

/// Routing table. Every intent needs its own row.
pub fn route(intent: IntentKind) -> Route {
    match intent {
        IntentKind::KnowledgeQuery => Route {
            allow_api_actions: false,
            block_other_actions: true,
            used_source: SOURCE_KNOWLEDGE_BASE,
        },
        IntentKind::PriceQuery | IntentKind::MarketQuery | IntentKind::AssetQuery => Route {
            allow_api_actions: true,
            block_other_actions: false,
            used_source: SOURCE_REYA_API,
        },
        IntentKind::ComparisonQuery => no_opinion("comparison_query"),
        IntentKind::HistoricalDataQuery => no_opinion("historical_data_query"),
        IntentKind::GeneralChat => no_opinion("general_chat"),
    }
}

fn no_opinion(source: &'static str) -> Route {
    Route {
        allow_api_actions: false,
        block_other_actions: false,
        used_source: source,
    }
}

pub fn decide(analysis: &IntentAnalysis) -> DispatchFlags {
    decide_at(analysis, Utc::now())
}

/// `decide` with an explicit timestamp.
pub fn decide_at(analysis: &IntentAnalysis, timestamp: DateTime<Utc>) -> DispatchFlags {
    let route = route(analysis.intent);

    DispatchFlags {
        intent: analysis.intent,
        allow_api_actions: route.allow_api_actions,
        block_other_actions: route.block_other_actions,
        used_source: route.used_source.to_string(),
        extracted_entities: analysis.extracted_entities.clone(),
        timestamp,
    }
}
