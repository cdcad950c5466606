//! Configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{CoreError, CoreResult};

/// Floor for timer periods; tokio timers reject a zero period
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Backend gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:4943/kong_backend".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Price discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Anchor asset, priced at exactly 1 USD
    pub stable_symbol: String,
    /// Liquid reference assets that may be walked through
    pub bridge_symbols: Vec<String>,
    pub max_bridge_hops: u8,
    pub cache_ttl_ms: u64,
    pub refresh_interval_ms: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            stable_symbol: "ckUSDT".to_string(),
            bridge_symbols: vec!["ICP".to_string()],
            max_bridge_hops: 1,
            cache_ttl_ms: 5 * 60 * 1000,  // 5 minutes
            refresh_interval_ms: 30_000,
        }
    }
}

impl PricingConfig {
    pub fn is_stable(&self, symbol: &str) -> bool {
        self.stable_symbol == symbol
    }

    pub fn is_bridge(&self, symbol: &str) -> bool {
        self.bridge_symbols.iter().any(|b| b == symbol)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Never zero, even for unvalidated configs
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms).max(MIN_PERIOD)
    }
}

/// Swap status polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
    pub confirm_toast_ms: u64,
    pub error_toast_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            max_attempts: 30,  // ~15s of polling
            confirm_toast_ms: 10_000,
            error_toast_ms: 8_000,
        }
    }
}

impl MonitorConfig {
    /// Never zero, even for unvalidated configs
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms).max(MIN_PERIOD)
    }
}

/// Complete client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub backend: BackendConfig,
    pub pricing: PricingConfig,
    pub monitor: MonitorConfig,
}

impl ClientConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.backend.url.is_empty() {
            return Err(CoreError::InvalidConfig("backend.url is empty".to_string()));
        }
        if self.pricing.stable_symbol.is_empty() {
            return Err(CoreError::InvalidConfig("pricing.stable_symbol is empty".to_string()));
        }
        if self.pricing.bridge_symbols.contains(&self.pricing.stable_symbol) {
            return Err(CoreError::InvalidConfig(
                "the stable asset cannot also be a bridge asset".to_string(),
            ));
        }
        if self.pricing.refresh_interval_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "pricing.refresh_interval_ms must be > 0".to_string(),
            ));
        }
        if self.monitor.poll_interval_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "monitor.poll_interval_ms must be > 0".to_string(),
            ));
        }
        if self.monitor.max_attempts == 0 {
            return Err(CoreError::InvalidConfig("monitor.max_attempts must be > 0".to_string()));
        }
        Ok(())
    }
}
