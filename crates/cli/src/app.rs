//! Wiring of backend, price service and swap flow

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use kong_core::{parse_tokens, ClientConfig, KongBackend, TokenRegistry};
use kong_executor::{
    LogNotifier, Notifier, SwapEvent, SwapMonitor, SwapService, SwapStatusStore,
};
use kong_price_feed::PriceService;

const EVENT_CAPACITY: usize = 64;

/// Everything a command needs
pub struct App {
    pub config: ClientConfig,
    pub backend: Arc<dyn KongBackend>,
    pub registry: Arc<TokenRegistry>,
    pub prices: Arc<PriceService>,
    pub store: Arc<SwapStatusStore>,
    pub swaps: SwapService,
    pub events: broadcast::Sender<SwapEvent>,
}

impl App {
    pub fn new(config: ClientConfig, backend: Arc<dyn KongBackend>) -> Self {
        let registry = Arc::new(TokenRegistry::default());
        let store = Arc::new(SwapStatusStore::new());
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier::new());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let prices = Arc::new(PriceService::new(backend.clone(), config.pricing.clone()));

        let monitor = Arc::new(SwapMonitor::new(
            backend.clone(),
            store.clone(),
            registry.clone(),
            notifier.clone(),
            events.clone(),
            config.monitor.clone(),
        ));
        let swaps = SwapService::new(
            backend.clone(),
            registry.clone(),
            store.clone(),
            notifier,
            monitor,
        )
        .with_prices(prices.clone());

        Self {
            config,
            backend,
            registry,
            prices,
            store,
            swaps,
            events,
        }
    }

    /// Fill the token registry from the backend
    pub async fn load_tokens(&self) -> Result<usize> {
        let tokens = parse_tokens(self.backend.tokens().await?);
        if tokens.is_empty() {
            warn!("Backend returned no tokens");
        }
        let count = tokens.len();
        self.registry.replace(tokens);
        info!("Loaded {} tokens", count);
        Ok(count)
    }

    /// Load tokens and the first pair snapshot
    pub async fn bootstrap(&self) -> Result<()> {
        self.load_tokens().await?;
        let pairs = self.prices.refresh().await?;
        info!("Loaded {} trading pairs", pairs);
        Ok(())
    }

    pub fn token_symbol(&self, symbol_or_id: &str) -> Result<String> {
        self.registry
            .find(symbol_or_id)
            .map(|t| t.symbol)
            .ok_or_else(|| anyhow!("Unknown token {}", symbol_or_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kong_core::{
        BackendError, BackendResult, IcTokenReply, PoolReply, PoolsReply, RequestId,
        RequestsReply, SwapAmountsReply, SwapArgs, TokenReply, U256,
    };

    const USDT: &str = "cngnf-vqaaa-aaaar-qag4q-cai";
    const ICP: &str = "ryjl3-tyaaa-aaaaa-aaaba-cai";

    struct ListingBackend;

    fn ic_token(canister_id: &str, symbol: &str, decimals: u8) -> TokenReply {
        TokenReply::IC(IcTokenReply {
            canister_id: canister_id.to_string(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            decimals,
            fee: U256::from(10_000u64),
            chain: "IC".to_string(),
            icrc1: true,
            icrc2: true,
        })
    }

    #[async_trait]
    impl KongBackend for ListingBackend {
        async fn pools(&self) -> BackendResult<PoolsReply> {
            Ok(PoolsReply {
                pools: vec![PoolReply {
                    symbol: "ICP_ckUSDT".to_string(),
                    symbol_0: "ICP".to_string(),
                    address_0: ICP.to_string(),
                    balance_0: U256::from(1_000_000_000u64),
                    symbol_1: "ckUSDT".to_string(),
                    address_1: USDT.to_string(),
                    balance_1: U256::from(80_000_000u64),
                    price: 8.0,
                    ..Default::default()
                }],
                ..Default::default()
            })
        }

        async fn tokens(&self) -> BackendResult<Vec<TokenReply>> {
            Ok(vec![
                ic_token(USDT, "ckUSDT", 6),
                ic_token(ICP, "ICP", 8),
                TokenReply::LP(serde_json::json!({"symbol": "ICP_ckUSDT"})),
            ])
        }

        async fn swap_amounts(&self, _: &str, _: U256, _: &str) -> BackendResult<SwapAmountsReply> {
            Err(BackendError::Rejected("not quoted".to_string()))
        }

        async fn swap_async(&self, _: SwapArgs) -> BackendResult<RequestId> {
            Err(BackendError::Rejected("not accepted".to_string()))
        }

        async fn requests(&self, _: &[RequestId]) -> BackendResult<Vec<RequestsReply>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_bootstrap_loads_tokens_and_pairs() {
        let app = App::new(ClientConfig::default(), Arc::new(ListingBackend));
        app.bootstrap().await.unwrap();

        assert_eq!(app.registry.len(), 2);
        assert_eq!(app.token_symbol(ICP).unwrap(), "ICP");
        assert!(app.token_symbol("ckDOGE").is_err());
        assert_eq!(app.prices.price(ICP), Some(8.0));
    }

    #[tokio::test]
    async fn test_unknown_request_status() {
        let app = App::new(ClientConfig::default(), Arc::new(ListingBackend));
        assert!(app.swaps.request_status(9).await.is_err());
    }
}
