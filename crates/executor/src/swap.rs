//! Swap quoting and submission

use rust_decimal::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use kong_core::{
    from_raw, raw_to_f64, to_raw, KongBackend, RequestId, RequestsReply, SwapAmountsReply,
    SwapArgs, SwapError, SwapResult, Token, TokenRegistry, TxId, U256,
};
use kong_price_feed::PriceService;

use crate::monitor::SwapMonitor;
use crate::notify::Notifier;
use crate::status::{SwapStatus, SwapStatusStore, SwapUpdate};

/// A swap as entered by the user
#[derive(Debug, Clone)]
pub struct SwapExecuteParams {
    pub swap_id: String,
    pub pay_token: String,
    pub pay_amount: String,
    pub receive_token: String,
    pub receive_amount: String,
    pub max_slippage: Option<f64>,
    /// Proof of the transfer already made to the backend, if any
    pub pay_tx_id: Option<TxId>,
}

/// Quote reshaped for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteDetails {
    pub receive_amount: String,
    pub price: f64,
    /// Two decimals; `None` without a price service
    pub usd_value: Option<String>,
    pub lp_fee: String,
    pub gas_fee: String,
    pub token_fee: String,
    pub slippage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapQuote {
    pub receive_amount: String,
    pub slippage: f64,
    pub usd_value: f64,
}

impl SwapQuote {
    fn zero() -> Self {
        Self {
            receive_amount: "0".to_string(),
            slippage: 0.0,
            usd_value: 0.0,
        }
    }
}

/// Client side of the swap flow
pub struct SwapService {
    backend: Arc<dyn KongBackend>,
    registry: Arc<TokenRegistry>,
    store: Arc<SwapStatusStore>,
    notifier: Arc<dyn Notifier>,
    monitor: Arc<SwapMonitor>,
    prices: Option<Arc<PriceService>>,
}

impl SwapService {
    pub fn new(
        backend: Arc<dyn KongBackend>,
        registry: Arc<TokenRegistry>,
        store: Arc<SwapStatusStore>,
        notifier: Arc<dyn Notifier>,
        monitor: Arc<SwapMonitor>,
    ) -> Self {
        Self {
            backend,
            registry,
            store,
            notifier,
            monitor,
            prices: None,
        }
    }

    pub fn with_prices(mut self, prices: Arc<PriceService>) -> Self {
        self.prices = Some(prices);
        self
    }

    pub fn monitor(&self) -> &Arc<SwapMonitor> {
        &self.monitor
    }

    /// Raw backend quote
    pub async fn quote(
        &self,
        pay_token: &Token,
        pay_amount: U256,
        receive_token: &Token,
    ) -> SwapResult<SwapAmountsReply> {
        if pay_token.symbol.is_empty() || receive_token.symbol.is_empty() {
            return Err(SwapError::InvalidTokens);
        }
        let quote = self
            .backend
            .swap_amounts(&pay_token.symbol, pay_amount, &receive_token.symbol)
            .await
            .map_err(|e| {
                error!("Error getting swap amounts: {}", e);
                e
            })?;
        Ok(quote)
    }

    /// Quote with amounts and fees rendered in token units
    pub async fn quote_details(
        &self,
        pay: &str,
        pay_amount: U256,
        receive: &str,
    ) -> SwapResult<QuoteDetails> {
        let pay_token = self.registry.require(pay)?;
        let receive_token = self.registry.require(receive)?;
        let quote = self.quote(&pay_token, pay_amount, &receive_token).await?;

        let receive_amount = from_raw(quote.receive_amount, receive_token.decimals);
        let (lp_fee, gas_fee, token_fee) = match quote.txs.first() {
            Some(tx) => (
                from_raw(tx.lp_fee, receive_token.decimals),
                from_raw(tx.gas_fee, receive_token.decimals),
                from_raw(pay_token.fee, pay_token.decimals),
            ),
            None => ("0".to_string(), "0".to_string(), "0".to_string()),
        };

        let usd_value = self.prices.as_ref().map(|prices| {
            let price = prices.price(&receive_token.canister_id).unwrap_or(0.0);
            format!("{:.2}", usd_worth(&receive_amount, price).round_dp(2))
        });

        Ok(QuoteDetails {
            receive_amount,
            price: quote.price,
            usd_value,
            lp_fee,
            gas_fee,
            token_fee,
            slippage: quote.slippage,
        })
    }

    /// Quote for a human-entered amount; empty or non-positive input
    /// short-circuits to zeros
    pub async fn swap_quote(
        &self,
        pay: &str,
        receive: &str,
        amount: &str,
    ) -> SwapResult<SwapQuote> {
        match Decimal::from_str(amount.trim()) {
            Ok(value) if value > Decimal::ZERO => {}
            _ => return Ok(SwapQuote::zero()),
        }

        let pay_token = self.registry.require(pay)?;
        let receive_token = self.registry.require(receive)?;
        let pay_amount = to_raw(amount, pay_token.decimals);
        let quote = self.quote(&pay_token, pay_amount, &receive_token).await?;
        let receive_amount = from_raw(quote.receive_amount, receive_token.decimals);

        let price = match &self.prices {
            Some(prices) => prices
                .refetch_price(&receive_token.canister_id)
                .await?
                .unwrap_or(0.0),
            None => 0.0,
        };

        Ok(SwapQuote {
            usd_value: raw_to_f64(quote.receive_amount) / 10f64.powi(receive_token.decimals as i32)
                * price,
            receive_amount,
            slippage: quote.slippage,
        })
    }

    /// Submit a swap and start watching it.
    ///
    /// Failures are recorded on the session and surfaced as a notification
    /// before being returned.
    pub async fn execute_swap(&self, params: SwapExecuteParams) -> SwapResult<RequestId> {
        self.store.create(
            &params.swap_id,
            &params.pay_token,
            &params.pay_amount,
            &params.receive_token,
            &params.receive_amount,
        );

        let toast = self.notifier.info(
            &format!(
                "Swapping {} {} to {} {}...",
                params.pay_amount, params.pay_token, params.receive_amount, params.receive_token
            ),
            None,
        );

        let result = self.submit(&params).await;
        self.notifier.dismiss(toast);

        match result {
            Ok(request_id) => {
                self.store
                    .update(&params.swap_id, SwapUpdate::default().request(request_id));
                self.monitor.start(request_id, &params.swap_id);
                Ok(request_id)
            }
            Err(e) => {
                error!("Swap execution failed: {}", e);
                let message = e.to_string();
                self.store.update(
                    &params.swap_id,
                    SwapUpdate::status(SwapStatus::Failed).with_error(message.as_str()),
                );
                self.notifier.error(&message, None);
                Err(e)
            }
        }
    }

    async fn submit(&self, params: &SwapExecuteParams) -> SwapResult<RequestId> {
        let pay_token = self.registry.require(&params.pay_token)?;
        let receive_token = self.registry.require(&params.receive_token)?;

        let pay_amount = to_raw(&params.pay_amount, pay_token.decimals);
        if pay_amount.is_zero() {
            return Err(kong_core::CoreError::InvalidAmount(params.pay_amount.clone()).into());
        }
        let receive_amount = to_raw(&params.receive_amount, receive_token.decimals);

        let args = SwapArgs {
            pay_token: pay_token.symbol.clone(),
            pay_amount,
            pay_tx_id: params.pay_tx_id.clone(),
            receive_token: receive_token.symbol.clone(),
            receive_amount: Some(receive_amount),
            receive_address: None,
            max_slippage: params.max_slippage,
            referred_by: None,
        };

        info!(
            "Submitting swap {} {} -> {} (raw {})",
            params.pay_amount, pay_token.symbol, receive_token.symbol, pay_amount
        );
        let request_id = self.backend.swap_async(args).await?;
        info!("Swap {} accepted as request {}", params.swap_id, request_id);
        Ok(request_id)
    }

    /// One-off status lookup
    pub async fn request_status(&self, request_id: RequestId) -> SwapResult<RequestsReply> {
        self.backend
            .requests(&[request_id])
            .await?
            .into_iter()
            .find(|r| r.request_id == request_id)
            .ok_or(SwapError::UnknownRequest(request_id))
    }

    /// Largest amount of `token` that can be paid from `balance`.
    ///
    /// ICRC-2 pays the fee twice (approve + transfer_from), ICRC-1 once.
    pub fn max_amount(token: &Token, balance: &str) -> Decimal {
        let balance = Decimal::from_str(balance.trim()).unwrap_or(Decimal::ZERO);
        let fee = Decimal::from_str(&from_raw(token.fee, token.decimals)).unwrap_or(Decimal::ZERO);
        let gas = if token.icrc2 { fee * Decimal::TWO } else { fee };
        (balance - gas).max(Decimal::ZERO)
    }
}

fn usd_worth(amount: &str, price: f64) -> Decimal {
    let amount = Decimal::from_str(amount).unwrap_or(Decimal::ZERO);
    let price = Decimal::from_f64(price).unwrap_or(Decimal::ZERO);
    amount * price
}
