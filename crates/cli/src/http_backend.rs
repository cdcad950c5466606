//! JSON gateway transport for the exchange backend
//!
//! Each backend method is a `POST <url>/<method>` whose body is the JSON
//! array of call arguments and whose answer is the backend's `Ok`/`Err`
//! envelope.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use kong_core::{
    BackendConfig, BackendError, BackendResult, KongBackend, PoolsReply, Reply, RequestId,
    RequestsReply, SwapAmountsReply, SwapArgs, TokenReply, U256,
};

pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn call<A, T>(&self, method: &str, args: &A) -> BackendResult<T>
    where
        A: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("Calling backend method {}", method);
        let response = self
            .client
            .post(self.endpoint(method))
            .json(args)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Transport(format!(
                "{} returned status {}",
                method,
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        decode(method, &body)
    }
}

fn quote_args(pay_token: &str, pay_amount: U256, receive_token: &str) -> serde_json::Value {
    json!([pay_token, pay_amount.to_string(), receive_token])
}

fn decode<T: DeserializeOwned>(method: &str, body: &[u8]) -> BackendResult<T> {
    let reply: Reply<T> = serde_json::from_slice(body)
        .map_err(|e| BackendError::Decode(format!("{}: {}", method, e)))?;
    reply.into_result()
}

#[async_trait]
impl KongBackend for HttpBackend {
    async fn pools(&self) -> BackendResult<PoolsReply> {
        self.call("pools", &json!([])).await
    }

    async fn tokens(&self) -> BackendResult<Vec<TokenReply>> {
        self.call("tokens", &json!([])).await
    }

    async fn swap_amounts(
        &self,
        pay_token: &str,
        pay_amount: U256,
        receive_token: &str,
    ) -> BackendResult<SwapAmountsReply> {
        self.call("swap_amounts", &quote_args(pay_token, pay_amount, receive_token))
            .await
    }

    async fn swap_async(&self, args: SwapArgs) -> BackendResult<RequestId> {
        self.call("swap_async", &(args,)).await
    }

    async fn requests(&self, request_ids: &[RequestId]) -> BackendResult<Vec<RequestsReply>> {
        self.call("requests", &(request_ids,)).await
    }
}
