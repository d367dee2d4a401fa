//! Market overview: mark price, volume, open interest, funding, fees

use super::price::requested_assets;
use super::{apologize, reply, should_run, Action};
use crate::format;
use crate::models::{FeeTier, Market, MarketData, ResourceKind};
use crate::runtime::{ActionResult, Message, ReplySink, TurnState};
use crate::service::ReyaService;
use crate::topics;
use crate::Result;
use std::collections::HashMap;
use tracing::info;

const MAX_UNFILTERED_MARKETS: usize = 5;

pub struct MarketAction {
    service: ReyaService,
}

impl MarketAction {
    pub fn new(service: ReyaService) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl Action for MarketAction {
    fn name(&self) -> &'static str {
        "GET_REYA_MARKETS"
    }

    fn description(&self) -> &'static str {
        "Reya perpetual markets with live trading stats"
    }

    async fn validate(&self, message: &Message, state: &TurnState) -> bool {
        should_run(ResourceKind::Markets, message, state)
    }

    async fn handler(
        &self,
        message: &Message,
        state: &TurnState,
        sink: &mut dyn ReplySink,
    ) -> Result<ActionResult> {
        let wanted = requested_assets(message, state);

        let markets = match self.service.markets().await {
            Ok(markets) => markets,
            Err(e) => return Ok(apologize(self.name(), &e, sink)),
        };
        let data = match self.service.all_market_data().await {
            Ok(data) => data,
            Err(e) => return Ok(apologize(self.name(), &e, sink)),
        };

        let mut text = render_markets(&markets, &data, &wanted);

        if topics::mentions(ResourceKind::Fees, &message.text) {
            match self.service.fee_tier_parameters().await {
                Ok(tiers) => {
                    text.push_str("\n\n");
                    text.push_str(&render_fees(&tiers));
                }
                Err(e) => return Ok(apologize(self.name(), &e, sink)),
            }
        }

        info!(assets = ?wanted, markets = markets.len(), "Answering market query");
        Ok(reply(self.name(), text, sink))
    }
}

fn matches_asset(market: &Market, asset: &str) -> bool {
    market.symbol().to_uppercase().starts_with(asset)
        || market
            .underlying_asset
            .as_deref()
            .map(|a| a.eq_ignore_ascii_case(asset))
            .unwrap_or(false)
}

fn render_markets(markets: &[Market], data: &[MarketData], wanted: &[String]) -> String {
    let by_id: HashMap<&str, &MarketData> = data.iter().map(|d| (d.market_id.as_str(), d)).collect();

    let mut selected: Vec<&Market> = if wanted.is_empty() {
        markets.iter().filter(|m| m.is_active != Some(false)).collect()
    } else {
        markets
            .iter()
            .filter(|m| wanted.iter().any(|a| matches_asset(m, a)))
            .collect()
    };

    if selected.is_empty() {
        return if wanted.is_empty() {
            "Reya has no active markets listed right now.".to_string()
        } else {
            format!("I couldn't find a Reya market for {}.", wanted.join(", "))
        };
    }

    if wanted.is_empty() {
        let volume = |m: &Market| by_id.get(m.id.as_str()).and_then(|d| d.volume_24h).unwrap_or(0.0);
        selected.sort_by(|a, b| volume(*b).total_cmp(&volume(*a)));
        selected.truncate(MAX_UNFILTERED_MARKETS);
    }

    let mut out = String::from("Reya markets:");
    for market in selected {
        let stats = by_id.get(market.id.as_str());
        out.push_str(&format!(
            "\n• {} | mark {} | 24h {} | vol {} | OI {} | funding {}",
            market.symbol(),
            format::usd(stats.and_then(|d| d.mark_price)),
            format::percent(stats.and_then(|d| d.price_change_24h)),
            format::usd_compact(stats.and_then(|d| d.volume_24h)),
            format::usd_compact(stats.and_then(|d| d.open_interest)),
            stats
                .and_then(|d| d.funding_rate)
                .map(|r| format!("{:.4}%", r * 100.0))
                .unwrap_or_else(|| format::NOT_AVAILABLE.to_string()),
        ));
    }
    out
}

fn render_fees(tiers: &[FeeTier]) -> String {
    if tiers.is_empty() {
        return "No fee tiers published.".to_string();
    }

    let mut out = String::from("Fee tiers:");
    for tier in tiers {
        let pct = |fee: Option<f64>| {
            fee.map(|f| format!("{:.3}%", f * 100.0))
                .unwrap_or_else(|| format::NOT_AVAILABLE.to_string())
        };
        out.push_str(&format!(
            "\n• tier {} | taker {} | maker {} | from {} volume",
            tier.tier_id,
            pct(tier.taker_fee),
            pct(tier.maker_fee),
            format::usd_compact(tier.volume_threshold),
        ));
    }
    out
}
