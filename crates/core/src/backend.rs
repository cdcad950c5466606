//! Backend wire records and the backend trait
//!
//! These mirror the exchange backend's interface description. Only the
//! fields this client consumes are typed; everything else is defaulted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{BackendError, BackendResult, RequestId, U256};

/// `Nat` values go over the wire as decimal strings
mod nat {
    use serde::{Serialize, Serializer};

    use crate::U256;

    struct Decimal<'a>(&'a U256);

    impl Serialize for Decimal<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self.0)
        }
    }

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        Decimal(value).serialize(serializer)
    }

    pub fn serialize_opt<S: Serializer>(
        value: &Option<U256>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&Decimal(value)),
            None => serializer.serialize_none(),
        }
    }
}

/// Result wrapper used by every backend call (`{"Ok": ..}` / `{"Err": ".."}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Reply<T> {
    Ok(T),
    Err(String),
}

impl<T> Reply<T> {
    /// Backend rejections become `BackendError::Rejected`
    pub fn into_result(self) -> BackendResult<T> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Err(reason) => Err(BackendError::Rejected(reason)),
        }
    }
}

/// One liquidity pool as listed by the backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolReply {
    pub pool_id: u32,
    pub symbol: String,
    pub symbol_0: String,
    pub address_0: String,
    #[serde(serialize_with = "nat::serialize")]
    pub balance_0: U256,
    pub symbol_1: String,
    pub address_1: String,
    #[serde(serialize_with = "nat::serialize")]
    pub balance_1: U256,
    /// Price of asset-0 expressed in asset-1
    pub price: f64,
    #[serde(default)]
    #[serde(serialize_with = "nat::serialize")]
    pub rolling_24h_volume: U256,
    #[serde(default)]
    pub lp_fee_bps: u8,
    #[serde(default)]
    pub chain_0: String,
    #[serde(default)]
    pub chain_1: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolsReply {
    pub pools: Vec<PoolReply>,
    #[serde(default)]
    #[serde(serialize_with = "nat::serialize")]
    pub total_tvl: U256,
    #[serde(default)]
    #[serde(serialize_with = "nat::serialize")]
    pub total_24h_volume: U256,
}

/// IC token metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcTokenReply {
    pub canister_id: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(serialize_with = "nat::serialize")]
    pub fee: U256,
    #[serde(default)]
    pub chain: String,
    #[serde(default)]
    pub icrc1: bool,
    #[serde(default)]
    pub icrc2: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TokenReply {
    IC(IcTokenReply),
    LP(serde_json::Value),
}

/// One leg of a quoted swap
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwapAmountsTxReply {
    pub pool_symbol: String,
    pub pay_symbol: String,
    #[serde(serialize_with = "nat::serialize")]
    pub pay_amount: U256,
    pub receive_symbol: String,
    #[serde(serialize_with = "nat::serialize")]
    pub receive_amount: U256,
    pub price: f64,
    #[serde(serialize_with = "nat::serialize")]
    pub lp_fee: U256,
    #[serde(serialize_with = "nat::serialize")]
    pub gas_fee: U256,
}

/// Swap quote
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwapAmountsReply {
    pub pay_symbol: String,
    #[serde(serialize_with = "nat::serialize")]
    pub pay_amount: U256,
    pub receive_symbol: String,
    #[serde(serialize_with = "nat::serialize")]
    pub receive_amount: U256,
    pub price: f64,
    pub mid_price: f64,
    pub slippage: f64,
    pub txs: Vec<SwapAmountsTxReply>,
}

/// Proof of a transfer made to the backend before submitting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxId {
    BlockIndex(#[serde(serialize_with = "nat::serialize")] U256),
    TransactionId(String),
}

/// Swap submission arguments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwapArgs {
    pub pay_token: String,
    #[serde(serialize_with = "nat::serialize")]
    pub pay_amount: U256,
    pub pay_tx_id: Option<TxId>,
    pub receive_token: String,
    #[serde(serialize_with = "nat::serialize_opt")]
    pub receive_amount: Option<U256>,
    pub receive_address: Option<String>,
    pub max_slippage: Option<f64>,
    pub referred_by: Option<String>,
}

/// Swap-specific part of a request status reply
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwapReply {
    pub request_id: RequestId,
    pub status: String,
    pub pay_symbol: String,
    #[serde(serialize_with = "nat::serialize")]
    pub pay_amount: U256,
    pub receive_symbol: String,
    #[serde(serialize_with = "nat::serialize")]
    pub receive_amount: U256,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub mid_price: f64,
    #[serde(default)]
    pub slippage: f64,
    #[serde(default)]
    pub ts: u64,
}

impl SwapReply {
    pub const SUCCESS: &'static str = "Success";
    pub const FAILED: &'static str = "Failed";
}

/// Structured reply, tagged by operation kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RequestReply {
    Pending,
    Swap(SwapReply),
    AddLiquidity(serde_json::Value),
    AddPool(serde_json::Value),
    RemoveLiquidity(serde_json::Value),
}

/// Status of one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestsReply {
    pub request_id: RequestId,
    pub statuses: Vec<String>,
    pub reply: RequestReply,
    #[serde(default)]
    pub ts: u64,
}

impl RequestsReply {
    /// First status line reporting a failure, if any
    pub fn failure(&self) -> Option<&str> {
        self.statuses
            .iter()
            .find(|s| s.contains("Failed"))
            .map(String::as_str)
    }

    pub fn swap(&self) -> Option<&SwapReply> {
        match &self.reply {
            RequestReply::Swap(swap) => Some(swap),
            _ => None,
        }
    }
}

/// The exchange backend as seen from the client
#[async_trait]
pub trait KongBackend: Send + Sync {
    /// List all pools
    async fn pools(&self) -> BackendResult<PoolsReply>;

    /// List all tokens
    async fn tokens(&self) -> BackendResult<Vec<TokenReply>>;

    /// Quote a swap without executing it
    async fn swap_amounts(
        &self,
        pay_token: &str,
        pay_amount: U256,
        receive_token: &str,
    ) -> BackendResult<SwapAmountsReply>;

    /// Submit a swap, returning the request id to poll
    async fn swap_async(&self, args: SwapArgs) -> BackendResult<RequestId>;

    /// Look up the status of one or more requests
    async fn requests(&self, request_ids: &[RequestId]) -> BackendResult<Vec<RequestsReply>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_err_becomes_rejection() {
        let reply: Reply<u64> = Reply::Err("Insufficient balance".to_string());
        match reply.into_result() {
            Err(BackendError::Rejected(reason)) => assert_eq!(reason, "Insufficient balance"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_pending_reply_from_json() {
        let json = r#"{
            "request_id": 7,
            "statuses": ["Started", "Receive token sent"],
            "reply": {"Pending": null}
        }"#;
        let reply: RequestsReply = serde_json::from_str(json).unwrap();
        assert_eq!(reply.request_id, 7);
        assert!(matches!(reply.reply, RequestReply::Pending));
        assert!(reply.failure().is_none());
        assert!(reply.swap().is_none());
    }

    #[test]
    fn test_failure_status_detection() {
        let reply = RequestsReply {
            request_id: 1,
            statuses: vec![
                "Started".to_string(),
                "Failed: slippage exceeded".to_string(),
            ],
            reply: RequestReply::Pending,
            ts: 0,
        };
        assert_eq!(reply.failure(), Some("Failed: slippage exceeded"));
    }

    #[test]
    fn test_amounts_serialize_as_decimal() {
        let args = SwapArgs {
            pay_token: "ICP".to_string(),
            pay_amount: U256::from(150_000_000u64),
            pay_tx_id: Some(TxId::BlockIndex(U256::from(991u64))),
            receive_token: "ckUSDT".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(json["pay_amount"], "150000000");
        assert_eq!(json["pay_tx_id"]["BlockIndex"], "991");
        assert!(json["receive_amount"].is_null());

        let parsed: SwapArgs = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.pay_amount, U256::from(150_000_000u64));
        assert_eq!(parsed.pay_tx_id, Some(TxId::BlockIndex(U256::from(991u64))));
    }
}
