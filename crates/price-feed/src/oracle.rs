//! Client-side USD price discovery
//!
//! Prices a token from a cached pair snapshot by walking direct pairs
//! against the stable anchor, or one bridge asset and then the anchor.
//! Every contributing path is weighted by its pair's liquidity.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

use kong_core::{PricingConfig, Side, Token, TradingPair};

/// One route that contributed to a price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePath {
    /// Pair the target token was found in
    pub pair: String,
    /// Bridge asset walked through, if any
    pub via: Option<String>,
    pub price: f64,
    pub weight: f64,
}

/// Pure price oracle over a pair snapshot
#[derive(Debug, Clone)]
pub struct PriceOracle {
    config: PricingConfig,
}

impl PriceOracle {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    /// Best-effort USD price of `token` (a canister id).
    ///
    /// `None` means no usable path exists. It is not an error, and it is
    /// distinct from a token genuinely priced at zero.
    pub fn usd_price(&self, token: &str, pairs: &[TradingPair]) -> Option<f64> {
        if self.is_anchor(token, pairs) {
            return Some(1.0);
        }
        self.resolve(token, pairs, self.config.max_bridge_hops)
    }

    /// Same as `usd_price` with `0.0` standing in for "could not price"
    pub fn usd_price_or_zero(&self, token: &str, pairs: &[TradingPair]) -> f64 {
        self.usd_price(token, pairs).unwrap_or(0.0)
    }

    /// Every path that contributes to the price of `token`
    pub fn paths(&self, token: &str, pairs: &[TradingPair]) -> Vec<PricePath> {
        self.collect_paths(token, pairs, self.config.max_bridge_hops)
    }

    /// Price every token; unpriceable tokens map to `0.0`
    pub fn price_all(&self, tokens: &[Token], pairs: &[TradingPair]) -> HashMap<String, f64> {
        tokens
            .iter()
            .map(|token| {
                let price = if self.config.is_stable(&token.symbol) {
                    1.0
                } else {
                    match self.usd_price(&token.canister_id, pairs) {
                        Some(price) => price,
                        None => {
                            warn!("Unable to determine USD price for token: {}", token.symbol);
                            0.0
                        }
                    }
                };
                (token.canister_id.clone(), price)
            })
            .collect()
    }

    fn is_anchor(&self, token: &str, pairs: &[TradingPair]) -> bool {
        pairs.iter().any(|pair| {
            pair.side_of(token)
                .map(|side| self.config.is_stable(pair.symbol_at(side)))
                .unwrap_or(false)
        })
    }

    fn resolve(&self, token: &str, pairs: &[TradingPair], hops_left: u8) -> Option<f64> {
        weighted_average(&self.collect_paths(token, pairs, hops_left))
    }

    fn collect_paths(&self, token: &str, pairs: &[TradingPair], hops_left: u8) -> Vec<PricePath> {
        let mut paths = Vec::new();

        for pair in pairs {
            let Some(side) = pair.side_of(token) else {
                continue;
            };
            let Some(path) = self.path_price(pair, side, pairs, hops_left) else {
                continue;
            };
            if path.weight > 0.0 && path.price > 0.0 && path.price.is_finite() {
                paths.push(path);
            }
        }

        debug!("{} usable price paths for {}", paths.len(), token);
        paths
    }

    fn path_price(
        &self,
        pair: &TradingPair,
        side: Side,
        pairs: &[TradingPair],
        hops_left: u8,
    ) -> Option<PricePath> {
        let ratio = pair.price_for(side)?;
        let paired = side.other();
        let paired_symbol = pair.symbol_at(paired);

        if self.config.is_stable(paired_symbol) {
            return Some(PricePath {
                pair: pair.symbol.clone(),
                via: None,
                price: ratio,
                weight: pair.liquidity_weight(),
            });
        }

        if self.config.is_bridge(paired_symbol) {
            if hops_left == 0 {
                trace!("Hop limit reached at {} in {}", paired_symbol, pair.symbol);
                return None;
            }
            let bridge = pair.address_at(paired);
            let bridge_price = self.resolve(bridge, pairs, hops_left - 1)?;
            return Some(PricePath {
                pair: pair.symbol.clone(),
                via: Some(paired_symbol.to_string()),
                price: ratio * bridge_price,
                weight: pair.liquidity_weight(),
            });
        }

        None
    }
}

/// (Σ weight·price) / (Σ weight), `None` when nothing carries weight
pub fn weighted_average(paths: &[PricePath]) -> Option<f64> {
    let (weighted, total) = paths
        .iter()
        .filter(|p| p.weight > 0.0 && p.price > 0.0)
        .fold((0.0, 0.0), |(w, t), p| (w + p.weight * p.price, t + p.weight));

    if total > 0.0 {
        Some(weighted / total)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kong_core::U256;
    use proptest::prelude::*;

    const USDT: &str = "cngnf-vqaaa-aaaar-qag4q-cai";
    const ICP: &str = "ryjl3-tyaaa-aaaaa-aaaba-cai";
    const CKBTC: &str = "mxzaz-hqaaa-aaaar-qaada-cai";
    const DKP: &str = "zfcdd-tqaaa-aaaaq-aaaga-cai";

    fn pair(
        (symbol_0, address_0, balance_0): (&str, &str, u64),
        (symbol_1, address_1, balance_1): (&str, &str, u64),
        price: f64,
    ) -> TradingPair {
        TradingPair {
            symbol: format!("{}_{}", symbol_0, symbol_1),
            symbol_0: symbol_0.to_string(),
            address_0: address_0.to_string(),
            balance_0: U256::from(balance_0),
            symbol_1: symbol_1.to_string(),
            address_1: address_1.to_string(),
            balance_1: U256::from(balance_1),
            price,
            rolling_24h_volume: U256::ZERO,
            lp_fee_bps: 30,
        }
    }

    fn oracle() -> PriceOracle {
        PriceOracle::new(PricingConfig::default())
    }

    #[test]
    fn test_no_pairs_is_unpriceable() {
        let pairs = vec![pair(("ICP", ICP, 100), ("ckUSDT", USDT, 800), 8.0)];
        assert_eq!(oracle().usd_price(CKBTC, &pairs), None);
        assert_eq!(oracle().usd_price_or_zero(CKBTC, &pairs), 0.0);
        assert_eq!(oracle().usd_price(CKBTC, &[]), None);
    }

    #[test]
    fn test_direct_stable_pair_as_asset_0() {
        let pairs = vec![pair(("ICP", ICP, 100), ("ckUSDT", USDT, 800), 8.0)];
        assert_eq!(oracle().usd_price(ICP, &pairs), Some(8.0));
    }

    #[test]
    fn test_direct_stable_pair_as_asset_1() {
        let pairs = vec![pair(("ckUSDT", USDT, 800), ("ICP", ICP, 100), 0.125)];
        assert_eq!(oracle().usd_price(ICP, &pairs), Some(8.0));
    }

    #[test]
    fn test_anchor_prices_at_one() {
        let pairs = vec![pair(("ICP", ICP, 100), ("ckUSDT", USDT, 800), 8.0)];
        assert_eq!(oracle().usd_price(USDT, &pairs), Some(1.0));
    }

    #[test]
    fn test_bridge_path_multiplies() {
        let pairs = vec![
            pair(("ICP", ICP, 100), ("ckUSDT", USDT, 800), 8.0),
            pair(("DKP", DKP, 1_000), ("ICP", ICP, 10), 0.01),
        ];
        let price = oracle().usd_price(DKP, &pairs).unwrap();
        assert!((price - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_two_paths_weighted_not_averaged() {
        // direct: price 0.10, weight 1_000 + 100
        // via ICP: 0.01 * 8 = 0.08, weight 9_000 + 90
        let pairs = vec![
            pair(("ICP", ICP, 100), ("ckUSDT", USDT, 800), 8.0),
            pair(("DKP", DKP, 1_000), ("ckUSDT", USDT, 100), 0.10),
            pair(("DKP", DKP, 9_000), ("ICP", ICP, 90), 0.01),
        ];
        let (w1, p1) = (1_100.0, 0.10);
        let (w2, p2) = (9_090.0, 0.08);
        let expected = (w1 * p1 + w2 * p2) / (w1 + w2);

        let price = oracle().usd_price(DKP, &pairs).unwrap();
        assert!((price - expected).abs() < 1e-12);
        assert!((price - (p1 + p2) / 2.0).abs() > 1e-6);
        assert_eq!(oracle().paths(DKP, &pairs).len(), 2);
    }

    #[test]
    fn test_unpriceable_bridge_excluded() {
        // ICP has no stable pair, so the bridge path drops out
        // and only the direct path remains.
        let pairs = vec![
            pair(("DKP", DKP, 1_000), ("ckUSDT", USDT, 100), 0.10),
            pair(("DKP", DKP, 9_000), ("ICP", ICP, 90), 0.01),
        ];
        let price = oracle().usd_price(DKP, &pairs).unwrap();
        assert!((price - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_unrelated_counterpart_contributes_nothing() {
        let pairs = vec![pair(("DKP", DKP, 1_000), ("ckBTC", CKBTC, 1), 0.000001)];
        assert_eq!(oracle().usd_price(DKP, &pairs), None);
    }

    #[test]
    fn test_zero_weight_pair_excluded() {
        let pairs = vec![
            pair(("ICP", ICP, 0), ("ckUSDT", USDT, 0), 50.0),
            pair(("ICP", ICP, 100), ("ckUSDT", USDT, 800), 8.0),
        ];
        assert_eq!(oracle().usd_price(ICP, &pairs), Some(8.0));
    }

    #[test]
    fn test_bridge_cycle_terminates() {
        let mut config = PricingConfig::default();
        config.bridge_symbols = vec!["ICP".to_string(), "DKP".to_string()];
        config.max_bridge_hops = 4;
        let oracle = PriceOracle::new(config);

        // ICP bridges via DKP which bridges via ICP; no stable anywhere
        let pairs = vec![pair(("DKP", DKP, 1_000), ("ICP", ICP, 10), 0.01)];
        assert_eq!(oracle.usd_price(DKP, &pairs), None);
        assert_eq!(oracle.usd_price(ICP, &pairs), None);
    }

    #[test]
    fn test_hop_limit_zero_disables_bridges() {
        let mut config = PricingConfig::default();
        config.max_bridge_hops = 0;
        let oracle = PriceOracle::new(config);
        let pairs = vec![
            pair(("ICP", ICP, 100), ("ckUSDT", USDT, 800), 8.0),
            pair(("DKP", DKP, 1_000), ("ICP", ICP, 10), 0.01),
        ];
        assert_eq!(oracle.usd_price(DKP, &pairs), None);
    }

    #[test]
    fn test_price_all() {
        let pairs = vec![pair(("ICP", ICP, 100), ("ckUSDT", USDT, 800), 8.0)];
        let tokens = vec![
            Token::new(USDT, "ckUSDT", "ckUSDT", 6),
            Token::new(ICP, "ICP", "Internet Computer", 8),
            Token::new(CKBTC, "ckBTC", "ckBTC", 8),
        ];
        let prices = oracle().price_all(&tokens, &pairs);
        assert_eq!(prices[USDT], 1.0);
        assert_eq!(prices[ICP], 8.0);
        assert_eq!(prices[CKBTC], 0.0);
    }

    proptest! {
        #[test]
        fn prop_weighted_price_between_paths(
            b0 in 1u64..1_000_000_000,
            b1 in 1u64..1_000_000_000,
            b2 in 1u64..1_000_000_000,
            b3 in 1u64..1_000_000_000,
            p1 in 0.0001f64..10_000.0,
            p2 in 0.0001f64..10_000.0,
        ) {
            let pairs = vec![
                pair(("ICP", ICP, b0), ("ckUSDT", USDT, b1), p1),
                pair(("ckUSDT", USDT, b2), ("ICP", ICP, b3), 1.0 / p2),
            ];
            let price = oracle().usd_price(ICP, &pairs).unwrap();
            let lo = p1.min(p2) * (1.0 - 1e-9);
            let hi = p1.max(p2) * (1.0 + 1e-9);
            prop_assert!(price >= lo && price <= hi);
        }
    }
}
