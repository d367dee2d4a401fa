//! Topic keywords per resource kind
//!
//! One table shared by every API-backed action's admission check.
//! English and Spanish, matched lowercase on word boundaries.

use crate::models::ResourceKind;

const PRICE_TOPIC: &[&str] = &[
    "price", "cost", "worth", "how much", "trading at", "oracle",
    "precio", "cuánto", "cuanto", "cotización", "cotizacion", "vale",
];

const MARKET_TOPIC: &[&str] = &[
    "market", "volume", "open interest", "funding", "leverage", "perp", "perpetual", "fee",
    "mercado", "volumen", "interés abierto", "interes abierto", "apalancamiento",
    "financiación", "comisión", "comision",
];

const ASSET_TOPIC: &[&str] = &[
    "asset", "token", "collateral", "deposit", "supported",
    "activo", "colateral", "depósito", "deposito", "soporta",
];

const FEE_TOPIC: &[&str] = &["fee", "comisión", "comision"];

pub fn keywords(kind: ResourceKind) -> &'static [&'static str] {
    match kind {
        ResourceKind::Prices => PRICE_TOPIC,
        ResourceKind::Markets | ResourceKind::MarketData => MARKET_TOPIC,
        ResourceKind::Assets => ASSET_TOPIC,
        ResourceKind::Fees => FEE_TOPIC,
    }
}

pub fn mentions(kind: ResourceKind, text: &str) -> bool {
    let lowered = text.to_lowercase();
    keywords(kind).iter().any(|k| contains_term(&lowered, k))
}

/// `term` occurs in `text` as whole words. A trailing plural `s` or `es`
/// still counts, so "prices" matches "price" but "equivalent" never
/// matches "vale". Both inputs must already be lowercase.
pub fn contains_term(text: &str, term: &str) -> bool {
    let is_boundary = |c: Option<char>| c.map_or(true, |c| !c.is_alphanumeric());

    text.match_indices(term).any(|(start, _)| {
        let after = &text[start + term.len()..];
        is_boundary(text[..start].chars().next_back())
            && ["", "s", "es"]
                .iter()
                .any(|suffix| after.strip_prefix(suffix).is_some_and(|rest| is_boundary(rest.chars().next())))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_keywords() {
        for kind in ResourceKind::ALL {
            assert!(!keywords(kind).is_empty(), "{} has no keywords", kind);
        }
    }

    #[test]
    fn test_mentions_is_case_insensitive_and_bilingual() {
        assert!(mentions(ResourceKind::Prices, "What is the BTC PRICE?"));
        assert!(mentions(ResourceKind::Prices, "¿Cuánto vale ETH?"));
        assert!(mentions(ResourceKind::Markets, "show funding rates"));
        assert!(mentions(ResourceKind::Assets, "¿Qué activos hay?"));
        assert!(!mentions(ResourceKind::Assets, "hello"));
    }

    #[test]
    fn test_terms_match_whole_words_only() {
        assert!(contains_term("show me prices", "price"));
        assert!(contains_term("¿cuánto vale?", "vale"));
        assert!(contains_term("hace dos meses", "mes"));
        assert!(contains_term("how much is it", "how much"));
        assert!(!contains_term("is that equivalent", "vale"));
        assert!(!contains_term("valence electrons", "vale"));
        assert!(!contains_term("read my messages", "mes"));

        assert!(!mentions(ResourceKind::Prices, "Is rUSD equivalent to USDC?"));
    }
}
