//! FlashLoan Arbitrage Console
//!
//! Terminal console for an external arbitrage bot engine. Prints the
//! dashboard on every state change and reads line commands from stdin:
//!   connect | deploy | start | stop | trades | price <TOKEN> | help | quit
//!
//! Usage:
//!   cargo run -- --api-url http://127.0.0.1:8001/api
//!   cargo run -- --config console.toml --wallet-rpc http://127.0.0.1:1248
//!
//! Created: 2026-10-19

use anyhow::Result;
use clap::Parser;
use flashloan_console::config::{load_config, ConsoleConfig};
use flashloan_console::error::WalletError;
use flashloan_console::view::project;
use flashloan_console::Session;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// FlashLoan arbitrage bot console
#[derive(Parser)]
#[command(name = "flashloan-console")]
struct Args {
    /// TOML config file (otherwise .env / environment)
    #[arg(short, long, env = "CONSOLE_CONFIG")]
    config: Option<PathBuf>,

    /// Bot engine API base URL
    #[arg(long, env = "CONSOLE_API_URL")]
    api_url: Option<String>,

    /// Wallet JSON-RPC endpoint (http, ws or ipc)
    #[arg(long, env = "WALLET_RPC_URL")]
    wallet_rpc: Option<String>,
}

const HELP: &str = "Commands: connect | deploy | start | stop | trades | price <TOKEN> | help | quit";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => {
            info!("Config file: {}", path.display());
            ConsoleConfig::from_toml_file(path)?
        }
        None => load_config()?,
    };
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }
    if let Some(url) = args.wallet_rpc {
        config.wallet_rpc_url = Some(url);
    }

    info!("===========================================");
    info!("   FlashLoan Arbitrage Console");
    info!("===========================================");
    info!("API: {}", config.api_base_url);
    info!("Poll interval: {}s", config.poll_interval_secs);
    info!("USD rate: {}", config.usd_rate);

    let mut session = Session::from_config(&config).await;
    match session.health().await {
        Ok(api) => info!("Backend reachable: {}", api.message),
        Err(e) => warn!("Backend not reachable yet ({}), showing stale state until it answers", e),
    }
    session.start().await;

    // Dashboard printer: one render per published snapshot
    let view_config = session.view_config().clone();
    let mut snapshots = WatchStream::new(session.subscribe());
    let printer = tokio::spawn(async move {
        while let Some(state) = snapshots.next().await {
            println!("\n{}", project(&state, &view_config));
        }
    });

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !handle_command(&session, line.trim()).await {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("stdin read failed: {}", e);
                    break;
                }
            },
        }
    }

    printer.abort();
    session.shutdown().await;
    Ok(())
}

fn notice(message: &str) {
    println!("NOTICE: {}", message);
}

/// Run one console command. Returns false to quit.
async fn handle_command(session: &Session, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None => {}
        Some("connect") => match session.connect_wallet().await {
            Ok(_) => println!("Wallet connected"),
            Err(WalletError::ProviderUnavailable) => {
                notice("No wallet provider found. Set WALLET_RPC_URL or pass --wallet-rpc.")
            }
            // Rejections are logged by the connector and left retriable
            Err(WalletError::ConnectionRejected(_)) => {}
        },
        Some("deploy") => match session.deploy_contract().await {
            Ok(receipt) => println!(
                "Contract deployed successfully! {} ({}/tx/{})",
                receipt.address,
                session.view_config().explorer_url,
                receipt.tx_hash
            ),
            Err(e) => notice(&format!("Deployment failed: {}", e)),
        },
        Some("start") => match session.start_bot().await {
            Ok(()) => println!("Bot started"),
            Err(e) => notice(&format!("Failed to start bot: {}", e)),
        },
        Some("stop") => match session.stop_bot().await {
            Ok(()) => println!("Bot stopped"),
            Err(e) => notice(&format!("Failed to stop bot: {}", e)),
        },
        Some("trades") => match session.trades().await {
            Ok(trades) if trades.is_empty() => println!("No trades yet"),
            Ok(trades) => {
                for t in trades {
                    println!(
                        "  {:<12} {:>12} ETH  ${:>10}  gas {:>10}  {}",
                        t.token_pair, t.profit_eth, t.profit_usd, t.gas_cost, t.status
                    );
                }
            }
            Err(e) => notice(&format!("Failed to fetch trades: {}", e)),
        },
        Some("price") => match parts.next() {
            Some(token) => match session.token_price(token).await {
                Ok(p) => println!("{}: ${} ({}% 24h)", p.token, p.price, p.change_24h),
                Err(e) => notice(&format!("Failed to fetch price: {}", e)),
            },
            None => println!("Usage: price <TOKEN>"),
        },
        Some("help") => println!("{}", HELP),
        Some("quit") | Some("exit") => return false,
        Some(other) => println!("Unknown command '{}'. {}", other, HELP),
    }
    true
}
