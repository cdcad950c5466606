//! CLI commands and handlers

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};

use kong_core::{to_raw, RequestId, TxId, U256};
use kong_executor::{MonitorOutcome, SwapEvent, SwapExecuteParams};

use crate::app::App;

#[derive(Parser, Debug)]
#[command(name = "kong")]
#[command(version, about = "Kong exchange client - prices, quotes and swaps")]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true, env = "KONG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List tokens known to the backend
    Tokens,

    /// List trading pairs
    Pairs {
        /// Only pairs containing this token
        #[arg(short, long)]
        token: Option<String>,
    },

    /// USD price of one token
    Price {
        token: String,

        /// Show every contributing path
        #[arg(long)]
        paths: bool,
    },

    /// USD prices of all tokens
    Prices {
        /// Keep refreshing until interrupted
        #[arg(long)]
        follow: bool,
    },

    /// Quote a swap without executing it
    Quote {
        pay: String,
        amount: String,
        receive: String,
    },

    /// Submit a swap and wait for it to settle
    Swap {
        pay: String,
        amount: String,
        receive: String,

        /// Maximum slippage in percent
        #[arg(long, default_value_t = 2.0)]
        slippage: f64,

        /// Block index of the transfer already made to the backend
        #[arg(long, conflicts_with = "pay_tx")]
        pay_block_index: Option<u64>,

        /// Transaction id of the transfer already made to the backend
        #[arg(long)]
        pay_tx: Option<String>,
    },

    /// One-off status of a submitted request
    Status { request_id: RequestId },

    /// Poll a submitted request until it settles
    Watch { request_id: RequestId },
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        }
        _ = terminate => {
            info!("Received termination signal");
        }
    }
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

pub async fn run(app: &App, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Tokens => tokens(app, json),
        Commands::Pairs { token } => pairs(app, token.as_deref(), json),
        Commands::Price { token, paths } => price(app, &token, paths, json),
        Commands::Prices { follow } => prices(app, follow, json).await,
        Commands::Quote {
            pay,
            amount,
            receive,
        } => quote(app, &pay, &amount, &receive, json).await,
        Commands::Swap {
            pay,
            amount,
            receive,
            slippage,
            pay_block_index,
            pay_tx,
        } => {
            let pay_tx_id = match (pay_block_index, pay_tx) {
                (Some(index), _) => Some(TxId::BlockIndex(U256::from(index))),
                (None, Some(tx)) => Some(TxId::TransactionId(tx)),
                (None, None) => None,
            };
            swap(app, &pay, &amount, &receive, slippage, pay_tx_id, json).await
        }
        Commands::Status { request_id } => status(app, request_id, json).await,
        Commands::Watch { request_id } => watch(app, request_id, json).await,
    }
}

fn tokens(app: &App, json: bool) -> Result<()> {
    let tokens = app.registry.all();
    emit(json, &tokens, || {
        tokens
            .iter()
            .map(|t| {
                format!(
                    "{:<10} {:>2} dec  {}{}",
                    t.symbol,
                    t.decimals,
                    t.canister_id,
                    if t.icrc2 { "  icrc2" } else { "" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn pairs(app: &App, token: Option<&str>, json: bool) -> Result<()> {
    let snapshot = app.prices.state().snapshot();
    let pairs = match token {
        Some(token) => {
            let address = app
                .registry
                .find(token)
                .map(|t| t.canister_id)
                .ok_or_else(|| anyhow!("Unknown token {}", token))?;
            snapshot.pairs_for(&address)
        }
        None => snapshot.pairs.as_ref().clone(),
    };

    emit(json, &pairs, || {
        pairs
            .iter()
            .map(|p| {
                format!(
                    "{:<20} price {:>14.8}  weight {:.0}",
                    p.symbol,
                    p.price,
                    p.liquidity_weight()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn price(app: &App, token: &str, with_paths: bool, json: bool) -> Result<()> {
    let address = app
        .registry
        .find(token)
        .map(|t| t.canister_id)
        .unwrap_or_else(|| token.to_string());
    let price = app.prices.price(&address);
    let paths = if with_paths {
        app.prices.paths(&address)
    } else {
        Vec::new()
    };

    #[derive(Serialize)]
    struct PriceOutput<'a> {
        token: &'a str,
        usd_price: Option<f64>,
        paths: &'a [kong_price_feed::PricePath],
    }

    let output = PriceOutput {
        token,
        usd_price: price,
        paths: &paths,
    };
    emit(json, &output, || {
        let mut lines = vec![match price {
            Some(p) => format!("{} = ${:.6}", token, p),
            None => format!("{} cannot be priced", token),
        }];
        for path in &paths {
            lines.push(format!(
                "  {:<20} {:>14.8}  weight {:.0}{}",
                path.pair,
                path.price,
                path.weight,
                path.via
                    .as_ref()
                    .map(|v| format!("  via {}", v))
                    .unwrap_or_default()
            ));
        }
        lines.join("\n")
    })
}

fn print_prices(app: &App, json: bool) -> Result<()> {
    let tokens = app.registry.all();
    let prices = app.prices.prices(&tokens);
    emit(json, &prices, || {
        tokens
            .iter()
            .map(|t| {
                let price = prices.get(&t.canister_id).copied().unwrap_or(0.0);
                format!("{:<10} ${:.6}", t.symbol, price)
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

async fn prices(app: &App, follow: bool, json: bool) -> Result<()> {
    print_prices(app, json)?;
    if !follow {
        return Ok(());
    }

    app.prices.start();
    let mut ticker = tokio::time::interval(app.config.pricing.refresh_interval());
    ticker.tick().await;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let stats = app.prices.stats();
                info!(refreshes = stats.pairs.refresh_count, "Prices refreshed");
                print_prices(app, json)?;
            }
            _ = &mut shutdown => break,
        }
    }

    app.prices.stop();
    Ok(())
}

async fn quote(app: &App, pay: &str, amount: &str, receive: &str, json: bool) -> Result<()> {
    let pay_token = app.registry.require(pay)?;
    let pay_amount = to_raw(amount, pay_token.decimals);
    if pay_amount.is_zero() {
        return Err(anyhow!("Invalid amount {}", amount));
    }

    let details = app.swaps.quote_details(pay, pay_amount, receive).await?;
    let receive_symbol = app.token_symbol(receive)?;
    emit(json, &details, || {
        format!(
            concat!(
                "{} {} -> {} {}\n",
                "  price     {}\n",
                "  slippage  {:.2}%\n",
                "  lp fee    {}\n",
                "  gas fee   {}\n",
                "  token fee {}{}"
            ),
            amount,
            pay_token.symbol,
            details.receive_amount,
            receive_symbol,
            details.price,
            details.slippage,
            details.lp_fee,
            details.gas_fee,
            details.token_fee,
            details
                .usd_value
                .as_ref()
                .map(|v| format!("\n  value     ${}", v))
                .unwrap_or_default()
        )
    })
}

#[derive(Serialize)]
struct SwapOutput {
    swap_id: String,
    request_id: RequestId,
    outcome: Option<MonitorOutcome>,
}

async fn swap(
    app: &App,
    pay: &str,
    amount: &str,
    receive: &str,
    slippage: f64,
    pay_tx_id: Option<TxId>,
    json: bool,
) -> Result<()> {
    if pay_tx_id.is_none() {
        warn!("No pay transfer given; the backend must already hold an approval");
    }

    let quote = app.swaps.swap_quote(pay, receive, amount).await?;
    if quote.receive_amount == "0" {
        return Err(anyhow!("Nothing to receive for {} {}", amount, pay));
    }

    let swap_id = uuid::Uuid::new_v4().to_string();
    let mut events = app.events.subscribe();
    let request_id = app
        .swaps
        .execute_swap(SwapExecuteParams {
            swap_id: swap_id.clone(),
            pay_token: app.token_symbol(pay)?,
            pay_amount: amount.to_string(),
            receive_token: app.token_symbol(receive)?,
            receive_amount: quote.receive_amount,
            max_slippage: Some(slippage),
            pay_tx_id,
        })
        .await?;

    let outcome = wait(app).await;
    while let Ok(SwapEvent::Completed { request_id, .. }) = events.try_recv() {
        info!("Swap request {} completed", request_id);
    }
    report(
        json,
        SwapOutput {
            swap_id,
            request_id,
            outcome,
        },
    )
}

async fn status(app: &App, request_id: RequestId, json: bool) -> Result<()> {
    let reply = app.swaps.request_status(request_id).await?;
    emit(json, &reply, || {
        let mut lines = vec![format!("Request {}", reply.request_id)];
        lines.extend(reply.statuses.iter().map(|s| format!("  {}", s)));
        if let Some(swap) = reply.swap() {
            lines.push(format!("  swap: {}", swap.status));
        }
        lines.join("\n")
    })
}

async fn watch(app: &App, request_id: RequestId, json: bool) -> Result<()> {
    let reply = app.swaps.request_status(request_id).await?;
    let (pay, receive) = reply
        .swap()
        .map(|s| (s.pay_symbol.clone(), s.receive_symbol.clone()))
        .unwrap_or_default();

    let swap_id = uuid::Uuid::new_v4().to_string();
    app.store.create(&swap_id, &pay, "", &receive, "");
    app.swaps.monitor().start(request_id, &swap_id);

    let outcome = wait(app).await;
    report(
        json,
        SwapOutput {
            swap_id,
            request_id,
            outcome,
        },
    )
}

/// Wait for the monitor, stopping it on shutdown
async fn wait(app: &App) -> Option<MonitorOutcome> {
    let monitor = app.swaps.monitor();
    tokio::select! {
        outcome = monitor.wait() => outcome,
        _ = shutdown_signal() => {
            monitor.cleanup();
            None
        }
    }
}

fn report(json: bool, output: SwapOutput) -> Result<()> {
    emit(json, &output, || match &output.outcome {
        Some(MonitorOutcome::Success {
            pay_amount,
            receive_amount,
        }) => format!(
            "Request {} succeeded: paid {}, received {}",
            output.request_id, pay_amount, receive_amount
        ),
        Some(other) => format!("Request {} ended: {}", output.request_id, other.status()),
        None => format!("Stopped watching request {}", output.request_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_swap() {
        let cli = Cli::try_parse_from([
            "kong",
            "swap",
            "ICP",
            "1.5",
            "ckUSDT",
            "--slippage",
            "0.5",
            "--pay-block-index",
            "991",
        ])
        .unwrap();

        match cli.command {
            Commands::Swap {
                pay,
                amount,
                slippage,
                pay_block_index,
                pay_tx,
                ..
            } => {
                assert_eq!(pay, "ICP");
                assert_eq!(amount, "1.5");
                assert_eq!(slippage, 0.5);
                assert_eq!(pay_block_index, Some(991));
                assert_eq!(pay_tx, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_pay_references_conflict() {
        let result = Cli::try_parse_from([
            "kong",
            "swap",
            "ICP",
            "1",
            "ckUSDT",
            "--pay-block-index",
            "1",
            "--pay-tx",
            "abc",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["kong", "price", "ICP", "--json", "--paths"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Price { paths: true, .. }));
    }
}
