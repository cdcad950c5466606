//! Swap session status store

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::fmt;

use kong_core::RequestId;

/// Where a swap session stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SwapStatus {
    Pending,
    /// Intermediate status reported by the backend
    InProgress(String),
    Success,
    Failed,
    Timeout,
    Error,
}

impl SwapStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SwapStatus::Success | SwapStatus::Failed | SwapStatus::Timeout | SwapStatus::Error
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            SwapStatus::Pending => "Pending",
            SwapStatus::InProgress(status) => status,
            SwapStatus::Success => "Success",
            SwapStatus::Failed => "Failed",
            SwapStatus::Timeout => "Timeout",
            SwapStatus::Error => "Error",
        }
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local view of one swap, used for display only
#[derive(Debug, Clone, Serialize)]
pub struct SwapSession {
    pub swap_id: String,
    pub pay_token: String,
    pub pay_amount: String,
    pub receive_token: String,
    pub receive_amount: String,
    pub request_id: Option<RequestId>,
    pub status: SwapStatus,
    pub is_processing: bool,
    pub error: Option<String>,
    pub should_refresh_quote: bool,
    pub updated_at: DateTime<Utc>,
}

/// Partial update applied to a session
#[derive(Debug, Clone, Default)]
pub struct SwapUpdate {
    pub status: Option<SwapStatus>,
    pub is_processing: Option<bool>,
    pub error: Option<Option<String>>,
    pub should_refresh_quote: Option<bool>,
    pub request_id: Option<RequestId>,
}

impl SwapUpdate {
    pub fn status(status: SwapStatus) -> Self {
        Self {
            is_processing: Some(!status.is_terminal()),
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(Some(error.into()));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.error = Some(None);
        self
    }

    pub fn refresh_quote(mut self) -> Self {
        self.should_refresh_quote = Some(true);
        self
    }

    pub fn request(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }
}

/// All known swap sessions, keyed by local swap id
#[derive(Debug, Default)]
pub struct SwapStatusStore {
    sessions: DashMap<String, SwapSession>,
}

impl SwapStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        swap_id: &str,
        pay_token: &str,
        pay_amount: &str,
        receive_token: &str,
        receive_amount: &str,
    ) -> SwapSession {
        let session = SwapSession {
            swap_id: swap_id.to_string(),
            pay_token: pay_token.to_string(),
            pay_amount: pay_amount.to_string(),
            receive_token: receive_token.to_string(),
            receive_amount: receive_amount.to_string(),
            request_id: None,
            status: SwapStatus::Pending,
            is_processing: true,
            error: None,
            should_refresh_quote: false,
            updated_at: Utc::now(),
        };
        self.sessions.insert(swap_id.to_string(), session.clone());
        session
    }

    pub fn get(&self, swap_id: &str) -> Option<SwapSession> {
        self.sessions.get(swap_id).map(|s| s.value().clone())
    }

    /// Apply `update`; unknown swap ids are ignored
    pub fn update(&self, swap_id: &str, update: SwapUpdate) -> Option<SwapSession> {
        let mut session = self.sessions.get_mut(swap_id)?;
        if let Some(status) = update.status {
            session.status = status;
        }
        if let Some(is_processing) = update.is_processing {
            session.is_processing = is_processing;
        }
        if let Some(error) = update.error {
            session.error = error;
        }
        if let Some(refresh) = update.should_refresh_quote {
            session.should_refresh_quote = refresh;
        }
        if let Some(request_id) = update.request_id {
            session.request_id = Some(request_id);
        }
        session.updated_at = Utc::now();
        Some(session.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!SwapStatus::Pending.is_terminal());
        assert!(!SwapStatus::InProgress("Receive token sent".to_string()).is_terminal());
        assert!(SwapStatus::Success.is_terminal());
        assert!(SwapStatus::Failed.is_terminal());
        assert!(SwapStatus::Timeout.is_terminal());
        assert!(SwapStatus::Error.is_terminal());
    }

    #[test]
    fn test_partial_update() {
        let store = SwapStatusStore::new();
        store.create("swap-1", "ICP", "1", "ckUSDT", "8");

        let session = store
            .update("swap-1", SwapUpdate::status(SwapStatus::Failed).with_error("Swap failed"))
            .unwrap();
        assert_eq!(session.status, SwapStatus::Failed);
        assert!(!session.is_processing);
        assert_eq!(session.error.as_deref(), Some("Swap failed"));
        assert_eq!(session.pay_amount, "1");

        let session = store.update("swap-1", SwapUpdate::default().clear_error()).unwrap();
        assert_eq!(session.error, None);
        assert_eq!(session.status, SwapStatus::Failed);
    }

    #[test]
    fn test_update_unknown_is_ignored() {
        let store = SwapStatusStore::new();
        assert!(store.update("missing", SwapUpdate::status(SwapStatus::Success)).is_none());
        assert!(store.is_empty());
    }
}
