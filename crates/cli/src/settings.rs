//! Layered client configuration
//!
//! Defaults, then an optional TOML file, then `KONG_*` environment
//! variables (`KONG_BACKEND__URL`, `KONG_PRICING__BRIDGE_SYMBOLS=ICP,ckBTC`).

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

use kong_core::ClientConfig;

const DEFAULT_FILE: &str = "kong";

fn environment() -> Environment {
    Environment::with_prefix("KONG")
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("pricing.bridge_symbols")
        .try_parsing(true)
}

/// Load and validate the client configuration
pub fn load(path: Option<&Path>) -> Result<ClientConfig> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_FILE).required(false),
    };

    let config: ClientConfig = Config::builder()
        .add_source(file)
        .add_source(environment())
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;

    config.validate()?;
    Ok(config)
}

/// Parse a TOML document on top of the defaults
pub fn from_toml(source: &str) -> Result<ClientConfig> {
    let config: ClientConfig = Config::builder()
        .add_source(File::from_str(source, FileFormat::Toml))
        .build()?
        .try_deserialize()?;
    config.validate()?;
    Ok(config)
}
