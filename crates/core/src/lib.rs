//! Core types and utilities for the Kong exchange client
//!
//! This crate provides shared types used across all components:
//! - Token and trading pair definitions
//! - Raw amount conversions
//! - Backend wire records and the backend trait
//! - Client configuration

pub mod types;
pub mod amounts;
pub mod tokens;
pub mod pairs;
pub mod backend;
pub mod config;
pub mod errors;

pub use types::*;
pub use amounts::*;
pub use tokens::*;
pub use pairs::*;
pub use backend::*;
pub use config::*;
pub use errors::*;

pub use ruint::aliases::U256;
