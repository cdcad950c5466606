//! Trading pair snapshot state
//!
//! Readers get an `Arc` of the current snapshot and never see it change
//! underneath them; refreshes swap in a whole new snapshot.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use kong_core::{PoolReply, TradingPair};

/// An immutable set of pairs and when it was fetched
#[derive(Debug, Clone)]
pub struct PairSnapshot {
    pub pairs: Arc<Vec<TradingPair>>,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Assigned by `PairState::replace`; 0 until installed
    pub generation: u64,
}

impl PairSnapshot {
    pub fn empty() -> Self {
        Self {
            pairs: Arc::new(Vec::new()),
            fetched_at: None,
            generation: 0,
        }
    }

    pub fn from_pools(pools: Vec<PoolReply>) -> Self {
        Self {
            pairs: Arc::new(pools.into_iter().map(TradingPair::from).collect()),
            fetched_at: Some(Utc::now()),
            generation: 0,
        }
    }

    /// Pairs containing `address`
    pub fn pairs_for(&self, address: &str) -> Vec<TradingPair> {
        self.pairs
            .iter()
            .filter(|p| p.contains(address))
            .cloned()
            .collect()
    }
}

/// Holder of the current snapshot
#[derive(Debug)]
pub struct PairState {
    current: RwLock<PairSnapshot>,
    refresh_count: AtomicU64,
}

impl PairState {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(PairSnapshot::empty()),
            refresh_count: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> PairSnapshot {
        self.current.read().clone()
    }

    pub fn replace(&self, mut snapshot: PairSnapshot) {
        let mut current = self.current.write();
        snapshot.generation = self.refresh_count.fetch_add(1, Ordering::Relaxed) + 1;
        *current = snapshot;
    }

    pub fn stats(&self) -> PairStateStats {
        let snapshot = self.current.read();
        PairStateStats {
            pair_count: snapshot.pairs.len(),
            refresh_count: self.refresh_count.load(Ordering::Relaxed),
            fetched_at: snapshot.fetched_at,
        }
    }
}

impl Default for PairState {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about pair state
#[derive(Debug, Clone)]
pub struct PairStateStats {
    pub pair_count: usize,
    pub refresh_count: u64,
    pub fetched_at: Option<DateTime<Utc>>,
}
