//! Trading pair snapshot records

use serde::{Deserialize, Serialize};

use crate::{raw_to_f64, PoolReply, Side, U256};

/// Read-only view of one pool, as cached by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingPair {
    pub symbol: String,
    pub symbol_0: String,
    pub address_0: String,
    pub balance_0: U256,
    pub symbol_1: String,
    pub address_1: String,
    pub balance_1: U256,
    /// Price of asset-0 expressed in asset-1
    pub price: f64,
    pub rolling_24h_volume: U256,
    pub lp_fee_bps: u8,
}

impl TradingPair {
    /// Which side `address` is on, if any
    pub fn side_of(&self, address: &str) -> Option<Side> {
        if self.address_0 == address {
            Some(Side::Zero)
        } else if self.address_1 == address {
            Some(Side::One)
        } else {
            None
        }
    }

    pub fn contains(&self, address: &str) -> bool {
        self.side_of(address).is_some()
    }

    pub fn symbol_at(&self, side: Side) -> &str {
        match side {
            Side::Zero => &self.symbol_0,
            Side::One => &self.symbol_1,
        }
    }

    pub fn address_at(&self, side: Side) -> &str {
        match side {
            Side::Zero => &self.address_0,
            Side::One => &self.address_1,
        }
    }

    /// Sum of both raw reserves.
    ///
    /// No decimal normalization: this is a relative weight between paths,
    /// not a value.
    pub fn liquidity_weight(&self) -> f64 {
        raw_to_f64(self.balance_0) + raw_to_f64(self.balance_1)
    }

    /// Price of the token on `side` expressed in the other token.
    ///
    /// The backend ratio is asset-0 in asset-1, so asset-1 gets the inverse.
    pub fn price_for(&self, side: Side) -> Option<f64> {
        if !self.price.is_finite() || self.price <= 0.0 {
            return None;
        }
        match side {
            Side::Zero => Some(self.price),
            Side::One => Some(1.0 / self.price),
        }
    }
}

impl From<PoolReply> for TradingPair {
    fn from(pool: PoolReply) -> Self {
        Self {
            symbol: pool.symbol,
            symbol_0: pool.symbol_0,
            address_0: pool.address_0,
            balance_0: pool.balance_0,
            symbol_1: pool.symbol_1,
            address_1: pool.address_1,
            balance_1: pool.balance_1,
            price: pool.price,
            rolling_24h_volume: pool.rolling_24h_volume,
            lp_fee_bps: pool.lp_fee_bps,
        }
    }
}
