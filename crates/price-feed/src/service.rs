//! Price service - keeps the pair snapshot fresh and answers price lookups

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

use kong_core::{BackendResult, KongBackend, PricingConfig, Token};

use crate::cache::{PriceCache, PriceCacheStats};
use crate::oracle::{PriceOracle, PricePath};
use crate::state::{PairSnapshot, PairState, PairStateStats};

/// Cached, periodically refreshed front of the price oracle
pub struct PriceService {
    backend: Arc<dyn KongBackend>,
    oracle: PriceOracle,
    state: Arc<PairState>,
    cache: Arc<PriceCache>,
    refresh_interval: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PriceService {
    pub fn new(backend: Arc<dyn KongBackend>, config: PricingConfig) -> Self {
        Self {
            backend,
            state: Arc::new(PairState::new()),
            cache: Arc::new(PriceCache::new(config.cache_ttl())),
            refresh_interval: config.refresh_interval(),
            oracle: PriceOracle::new(config),
            handle: Mutex::new(None),
        }
    }

    /// Get shared state reference
    pub fn state(&self) -> Arc<PairState> {
        Arc::clone(&self.state)
    }

    /// Pull the pool listing and swap in a new snapshot
    pub async fn refresh(&self) -> BackendResult<usize> {
        refresh_snapshot(self.backend.as_ref(), &self.state, &self.cache).await
    }

    /// USD price of `token`, `None` when it cannot be priced
    pub fn price(&self, token: &str) -> Option<f64> {
        let snapshot = self.state.snapshot();
        self.cache.get_or_insert_with(token, snapshot.generation, || {
            self.oracle.usd_price(token, &snapshot.pairs)
        })
    }

    /// Like `price`, after making sure a snapshot exists
    pub async fn refetch_price(&self, token: &str) -> BackendResult<Option<f64>> {
        if self.state.snapshot().fetched_at.is_none() {
            self.refresh().await?;
        }
        Ok(self.price(token))
    }

    pub fn prices(&self, tokens: &[Token]) -> HashMap<String, f64> {
        let snapshot = self.state.snapshot();
        self.oracle.price_all(tokens, &snapshot.pairs)
    }

    pub fn paths(&self, token: &str) -> Vec<PricePath> {
        let snapshot = self.state.snapshot();
        self.oracle.paths(token, &snapshot.pairs)
    }

    /// Start periodic refreshing; a running refresher is replaced
    pub fn start(&self) {
        self.stop();
        info!("Starting pair refresher every {:?}", self.refresh_interval);

        let backend = Arc::clone(&self.backend);
        let state = Arc::clone(&self.state);
        let cache = Arc::clone(&self.cache);
        let refresh_interval = self.refresh_interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(refresh_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                if let Err(e) = refresh_snapshot(backend.as_ref(), &state, &cache).await {
                    error!("Pair refresh failed, keeping previous snapshot: {}", e);
                    continue;
                }

                cache.purge_expired();
                let stats = state.stats();
                info!(
                    "Pair state: {} pairs, {} refreshes",
                    stats.pair_count, stats.refresh_count
                );
            }
        });

        *self.handle.lock() = Some(handle);
    }

    /// Stop periodic refreshing
    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().take() {
            info!("Stopping pair refresher");
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Get statistics
    pub fn stats(&self) -> PriceServiceStats {
        PriceServiceStats {
            pairs: self.state.stats(),
            cache: self.cache.stats(),
        }
    }
}

impl Drop for PriceService {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn refresh_snapshot(
    backend: &dyn KongBackend,
    state: &PairState,
    cache: &PriceCache,
) -> BackendResult<usize> {
    let reply = backend.pools().await?;
    let snapshot = PairSnapshot::from_pools(reply.pools);
    let count = snapshot.pairs.len();

    state.replace(snapshot);
    cache.clear();
    Ok(count)
}

/// Price service statistics
#[derive(Debug, Clone)]
pub struct PriceServiceStats {
    pub pairs: PairStateStats,
    pub cache: PriceCacheStats,
}
