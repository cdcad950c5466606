//! Scripted backend and fixtures shared by executor tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use kong_core::{
    BackendError, BackendResult, KongBackend, PoolReply, PoolsReply, RequestId, RequestReply,
    RequestsReply, SwapAmountsReply, SwapArgs, SwapReply, Token, TokenReply, TokenRegistry, U256,
};

pub const USDT: &str = "cngnf-vqaaa-aaaar-qag4q-cai";
pub const ICP: &str = "ryjl3-tyaaa-aaaaa-aaaba-cai";

pub fn registry() -> Arc<TokenRegistry> {
    Arc::new(TokenRegistry::new(vec![
        Token::new(USDT, "ckUSDT", "ckUSDT", 6).with_fee(U256::from(10_000u64)),
        Token::new(ICP, "ICP", "Internet Computer", 8)
            .with_fee(U256::from(10_000u64))
            .with_icrc2(true),
    ]))
}

pub fn icp_usdt_pool() -> PoolsReply {
    PoolsReply {
        pools: vec![PoolReply {
            pool_id: 1,
            symbol: "ICP_ckUSDT".to_string(),
            symbol_0: "ICP".to_string(),
            address_0: ICP.to_string(),
            balance_0: U256::from(1_000_000_000_000u64),
            symbol_1: "ckUSDT".to_string(),
            address_1: USDT.to_string(),
            balance_1: U256::from(80_000_000_000u64),
            price: 8.0,
            ..Default::default()
        }],
        ..Default::default()
    }
}

pub fn pending(request_id: RequestId) -> BackendResult<Vec<RequestsReply>> {
    Ok(vec![RequestsReply {
        request_id,
        statuses: vec!["Started".to_string()],
        reply: RequestReply::Pending,
        ts: 0,
    }])
}

pub fn swap_status(request_id: RequestId, status: &str) -> BackendResult<Vec<RequestsReply>> {
    Ok(vec![RequestsReply {
        request_id,
        statuses: vec!["Started".to_string(), status.to_string()],
        reply: RequestReply::Swap(SwapReply {
            request_id,
            status: status.to_string(),
            pay_symbol: "ICP".to_string(),
            pay_amount: U256::from(150_000_000u64),
            receive_symbol: "ckUSDT".to_string(),
            receive_amount: U256::from(12_000_000u64),
            ..Default::default()
        }),
        ts: 0,
    }])
}

pub fn failed_statuses(request_id: RequestId, reason: &str) -> BackendResult<Vec<RequestsReply>> {
    Ok(vec![RequestsReply {
        request_id,
        statuses: vec!["Started".to_string(), reason.to_string()],
        reply: RequestReply::Pending,
        ts: 0,
    }])
}

pub fn transport_error() -> BackendResult<Vec<RequestsReply>> {
    Err(BackendError::Transport("connection reset".to_string()))
}

/// Backend whose replies are queued per request id.
///
/// Once a queue runs dry every poll answers `Pending`.
#[derive(Default)]
pub struct ScriptedBackend {
    statuses: Mutex<HashMap<RequestId, VecDeque<BackendResult<Vec<RequestsReply>>>>>,
    polls: Mutex<HashMap<RequestId, usize>>,
    pub pools: Mutex<PoolsReply>,
    pub quote: Mutex<Option<BackendResult<SwapAmountsReply>>>,
    pub submit: Mutex<Option<BackendResult<RequestId>>>,
    pub submitted: Mutex<Vec<SwapArgs>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, request_id: RequestId, replies: Vec<BackendResult<Vec<RequestsReply>>>) {
        self.statuses
            .lock()
            .entry(request_id)
            .or_default()
            .extend(replies);
    }

    pub fn polls(&self, request_id: RequestId) -> usize {
        self.polls.lock().get(&request_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl KongBackend for ScriptedBackend {
    async fn pools(&self) -> BackendResult<PoolsReply> {
        Ok(self.pools.lock().clone())
    }

    async fn tokens(&self) -> BackendResult<Vec<TokenReply>> {
        Ok(vec![])
    }

    async fn swap_amounts(&self, _: &str, _: U256, _: &str) -> BackendResult<SwapAmountsReply> {
        self.quote
            .lock()
            .clone()
            .unwrap_or_else(|| Err(BackendError::Rejected("no quote".to_string())))
    }

    async fn swap_async(&self, args: SwapArgs) -> BackendResult<RequestId> {
        self.submitted.lock().push(args);
        self.submit
            .lock()
            .clone()
            .unwrap_or_else(|| Err(BackendError::Rejected("no submit".to_string())))
    }

    async fn requests(&self, request_ids: &[RequestId]) -> BackendResult<Vec<RequestsReply>> {
        let request_id = request_ids[0];
        *self.polls.lock().entry(request_id).or_default() += 1;
        let next = self
            .statuses
            .lock()
            .get_mut(&request_id)
            .and_then(|queue| queue.pop_front());
        next.unwrap_or_else(|| pending(request_id))
    }
}
