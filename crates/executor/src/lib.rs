//! Swap execution and status tracking
//!
//! Features:
//! - Backend quotes rendered in token units
//! - Swap submission with local session state
//! - Single-flight status polling with bounded attempts
//! - User notifications and completion events

pub mod monitor;
pub mod notify;
pub mod status;
pub mod swap;

#[cfg(test)]
mod testing;

pub use monitor::{MonitorOutcome, SwapMonitor};
pub use notify::{Level, LogNotifier, NotificationId, Notifier, SwapEvent};
pub use status::{SwapSession, SwapStatus, SwapStatusStore, SwapUpdate};
pub use swap::{QuoteDetails, SwapExecuteParams, SwapQuote, SwapService};
