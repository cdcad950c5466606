//! Swap status monitor
//!
//! Polls the backend for a submitted request until it reaches a terminal
//! state or the attempt budget runs out. At most one polling loop exists
//! per monitor: starting a new one aborts the previous loop.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use kong_core::{
    format_amount, from_raw, KongBackend, MonitorConfig, RequestId, RequestReply, RequestsReply,
    SwapReply, TokenRegistry,
};

use crate::notify::{NotificationId, Notifier, SwapEvent};
use crate::status::{SwapStatus, SwapStatusStore, SwapUpdate};

/// How a monitor run ended
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MonitorOutcome {
    Success {
        pay_amount: String,
        receive_amount: String,
    },
    Failed,
    Error(String),
    Timeout,
}

impl MonitorOutcome {
    pub fn status(&self) -> SwapStatus {
        match self {
            MonitorOutcome::Success { .. } => SwapStatus::Success,
            MonitorOutcome::Failed => SwapStatus::Failed,
            MonitorOutcome::Error(_) => SwapStatus::Error,
            MonitorOutcome::Timeout => SwapStatus::Timeout,
        }
    }
}

/// Everything a polling loop needs, cheap to clone into the task
#[derive(Clone)]
struct MonitorContext {
    backend: Arc<dyn KongBackend>,
    store: Arc<SwapStatusStore>,
    registry: Arc<TokenRegistry>,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<SwapEvent>,
    config: MonitorConfig,
}

struct ActiveRun {
    request_id: RequestId,
    toast: NotificationId,
    handle: JoinHandle<()>,
    outcome: watch::Receiver<Option<MonitorOutcome>>,
}

/// Single-flight swap status monitor
pub struct SwapMonitor {
    ctx: MonitorContext,
    active: Mutex<Option<ActiveRun>>,
}

impl SwapMonitor {
    pub fn new(
        backend: Arc<dyn KongBackend>,
        store: Arc<SwapStatusStore>,
        registry: Arc<TokenRegistry>,
        notifier: Arc<dyn Notifier>,
        events: broadcast::Sender<SwapEvent>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            ctx: MonitorContext {
                backend,
                store,
                registry,
                notifier,
                events,
                config,
            },
            active: Mutex::new(None),
        }
    }

    /// Start watching `request_id` on behalf of the session `swap_id`.
    ///
    /// Any loop already running is stopped first, whatever request it was
    /// watching.
    pub fn start(&self, request_id: RequestId, swap_id: &str) {
        let mut active = self.active.lock();
        if let Some(previous) = active.take() {
            info!(
                "Replacing monitor for request {} with request {}",
                previous.request_id, request_id
            );
            self.cancel(previous);
        }

        let (pay, receive) = self
            .ctx
            .store
            .get(swap_id)
            .map(|s| (s.pay_token, s.receive_token))
            .unwrap_or_default();
        let toast = self.ctx.notifier.info(
            &format!("Confirming swap of {} to {}...", pay, receive),
            Some(Duration::from_millis(self.ctx.config.confirm_toast_ms)),
        );

        info!("Monitoring request {} for swap {}", request_id, swap_id);
        let (outcome_tx, outcome_rx) = watch::channel(None);
        let ctx = self.ctx.clone();
        let swap_id = swap_id.to_string();
        let handle = tokio::spawn(async move {
            let outcome = ctx.poll(request_id, &swap_id, toast).await;
            let _ = outcome_tx.send(Some(outcome));
        });

        *active = Some(ActiveRun {
            request_id,
            toast,
            handle,
            outcome: outcome_rx,
        });
    }

    /// Stop the active loop, if any. Returns whether one was stopped.
    pub fn stop(&self) -> bool {
        match self.active.lock().take() {
            Some(run) => {
                debug!("Stopping monitor for request {}", run.request_id);
                self.cancel(run);
                true
            }
            None => false,
        }
    }

    /// Abort a run; a run cut short also takes its confirmation toast down
    fn cancel(&self, run: ActiveRun) {
        if !run.handle.is_finished() {
            self.ctx.notifier.dismiss(run.toast);
        }
        run.handle.abort();
    }

    /// Teardown hook
    pub fn cleanup(&self) {
        self.stop();
    }

    pub fn is_active(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .map(|run| !run.handle.is_finished())
            .unwrap_or(false)
    }

    pub fn active_request(&self) -> Option<RequestId> {
        self.active.lock().as_ref().map(|run| run.request_id)
    }

    /// Wait for the current run to finish.
    ///
    /// `None` when nothing is running or the run was stopped first.
    pub async fn wait(&self) -> Option<MonitorOutcome> {
        let mut outcome = self.active.lock().as_ref()?.outcome.clone();
        let result = (*outcome.wait_for(Option::is_some).await.ok()?).clone();
        result
    }
}

impl Drop for SwapMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl MonitorContext {
    async fn poll(
        &self,
        request_id: RequestId,
        swap_id: &str,
        toast: NotificationId,
    ) -> MonitorOutcome {
        let period = self.config.poll_interval();
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for attempt in 1..=self.config.max_attempts {
            interval.tick().await;
            debug!(request_id, attempt, "Polling swap status");

            let replies = match self.backend.requests(&[request_id]).await {
                Ok(replies) => replies,
                Err(e) => {
                    error!("Error monitoring swap {}: {}", request_id, e);
                    return self.finish(
                        swap_id,
                        toast,
                        MonitorOutcome::Error(e.to_string()),
                        "Failed to monitor swap status",
                    );
                }
            };

            let reply = replies.iter().find(|r| r.request_id == request_id).or(replies.first());
            if let Some(outcome) = reply.and_then(|r| self.inspect(request_id, swap_id, r, toast)) {
                return outcome;
            }
        }

        warn!(
            "Request {} still pending after {} attempts",
            request_id, self.config.max_attempts
        );
        self.finish(swap_id, toast, MonitorOutcome::Timeout, "Swap timed out")
    }

    /// Apply one status reply; `Some` once the request is terminal
    fn inspect(
        &self,
        request_id: RequestId,
        swap_id: &str,
        reply: &RequestsReply,
        toast: NotificationId,
    ) -> Option<MonitorOutcome> {
        if let Some(reason) = reply.failure() {
            let outcome = MonitorOutcome::Error(reason.to_string());
            return Some(self.finish(swap_id, toast, outcome, reason));
        }

        match &reply.reply {
            RequestReply::Swap(swap) if swap.status == SwapReply::SUCCESS => {
                Some(self.succeed(request_id, swap_id, swap, toast))
            }
            RequestReply::Swap(swap) if swap.status == SwapReply::FAILED => {
                Some(self.finish(swap_id, toast, MonitorOutcome::Failed, "Swap failed"))
            }
            RequestReply::Swap(swap) => {
                self.mark_in_progress(swap_id, &swap.status);
                None
            }
            _ => {
                let status = reply.statuses.last().map(String::as_str).unwrap_or("Pending");
                self.mark_in_progress(swap_id, status);
                None
            }
        }
    }

    fn mark_in_progress(&self, swap_id: &str, status: &str) {
        self.store.update(
            swap_id,
            SwapUpdate::status(SwapStatus::InProgress(status.to_string())).clear_error(),
        );
    }

    fn succeed(
        &self,
        request_id: RequestId,
        swap_id: &str,
        swap: &SwapReply,
        toast: NotificationId,
    ) -> MonitorOutcome {
        let pay_decimals = self.registry.decimals_of(&swap.pay_symbol);
        let receive_decimals = self.registry.decimals_of(&swap.receive_symbol);
        let pay_amount = from_raw(swap.pay_amount, pay_decimals);
        let receive_amount = from_raw(swap.receive_amount, receive_decimals);

        self.store.update(
            swap_id,
            SwapUpdate::status(SwapStatus::Success).clear_error().refresh_quote(),
        );
        self.notifier.success(&format!(
            "Successfully swapped {} {} to {} {}!",
            format_amount(&pay_amount, pay_decimals),
            swap.pay_symbol,
            format_amount(&receive_amount, receive_decimals),
            swap.receive_symbol,
        ));
        let _ = self.events.send(SwapEvent::Completed {
            request_id,
            pay_amount: pay_amount.clone(),
            pay_token: swap.pay_symbol.clone(),
            receive_amount: receive_amount.clone(),
            receive_token: swap.receive_symbol.clone(),
        });
        self.notifier.dismiss(toast);

        info!("Swap {} (request {}) succeeded", swap_id, request_id);
        MonitorOutcome::Success {
            pay_amount,
            receive_amount,
        }
    }

    fn finish(
        &self,
        swap_id: &str,
        toast: NotificationId,
        outcome: MonitorOutcome,
        message: &str,
    ) -> MonitorOutcome {
        self.store
            .update(swap_id, SwapUpdate::status(outcome.status()).with_error(message));
        self.notifier.error(
            message,
            Some(Duration::from_millis(self.config.error_toast_ms)),
        );
        self.notifier.dismiss(toast);

        info!("Swap {} ended as {}", swap_id, outcome.status());
        outcome
    }
}
