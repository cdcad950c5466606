//! Command line client for the Kong exchange
//!
//! Bridges the price oracle and swap flow to a JSON backend gateway.

pub mod app;
pub mod commands;
pub mod http_backend;
pub mod settings;

pub use app::App;
pub use commands::{Cli, Commands};
pub use http_backend::HttpBackend;
