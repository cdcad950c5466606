//! Kong exchange client
//!
//! Main entry point for the `kong` command

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kong_cli::{commands, settings, App, Cli, HttpBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Starting Kong client v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = settings::load(cli.config.as_deref())?;
    info!("Using backend {}", config.backend.url);

    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let app = App::new(config, backend);
    app.bootstrap().await?;

    if let Err(e) = commands::run(&app, cli.command, cli.json).await {
        error!("Command failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}
