//! Client-side price discovery
//!
//! Features:
//! - Liquidity-weighted USD prices from a pair snapshot
//! - One-hop bridge resolution with an explicit hop limit
//! - TTL price cache
//! - Periodic pair snapshot refresh

pub mod cache;
pub mod oracle;
pub mod service;
pub mod state;

pub use cache::PriceCache;
pub use oracle::{PriceOracle, PricePath};
pub use service::PriceService;
pub use state::{PairSnapshot, PairState};
