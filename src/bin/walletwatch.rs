use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use solana_walletwatch::analyzer::AlternatingWins;
use solana_walletwatch::config::{AppConfig, CONFIG_PATH};
use solana_walletwatch::gate::RateGate;
use solana_walletwatch::markets::MarketClient;
use solana_walletwatch::rpc::RpcClient;
use solana_walletwatch::state::MonitorState;
use solana_walletwatch::{finder, monitor, reporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Discover and evaluate wallets, write a research snapshot, exit.
    Research,
    /// Run research, then watch the tracked-wallet list for swaps.
    Monitor,
}

#[derive(Parser)]
#[command(name = "walletwatch", about = "Solana wallet discovery and swap monitor")]
struct Args {
    /// Operating mode
    #[arg(long, value_enum)]
    mode: Mode,

    /// Config file path
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = if args.config.exists() {
        let config = AppConfig::load(&args.config)?;
        info!("loaded config from {}", args.config.display());
        config
    } else if args.config == PathBuf::from(CONFIG_PATH) {
        info!("no config file found, using defaults");
        AppConfig::default()
    } else {
        anyhow::bail!("config file {} does not exist", args.config.display());
    };

    url::Url::parse(&config.rpc.url)
        .map_err(|e| anyhow::anyhow!("invalid rpc.url {}: {e}", config.rpc.url))?;
    if config.monitor.processed_keep > config.monitor.processed_cap {
        anyhow::bail!("monitor.processed_keep must not exceed monitor.processed_cap");
    }
    if config.rate.max_retries == 0 {
        anyhow::bail!("rate.max_retries must be at least 1");
    }

    info!(
        "starting walletwatch ({:?}) — rpc={} interval={:.1}s retries={} backoff={}..{}s",
        args.mode,
        config.rpc.url,
        config.rate.min_interval_secs,
        config.rate.max_retries,
        config.rate.initial_backoff_secs,
        config.rate.max_backoff_secs,
    );

    let http = reqwest::Client::builder()
        .user_agent("solana-walletwatch/0.1")
        .build()?;
    let rpc = RpcClient::new(http.clone(), &config.rpc);
    let markets_client = MarketClient::new(http);
    let mut gate = RateGate::from_config(&config.rate);
    let profit_model = AlternatingWins;

    // Research pass runs in both modes.
    let report =
        finder::run_research(&rpc, &markets_client, &mut gate, &config, &profit_model).await;
    reporter::save_research_report(&report)?;

    if args.mode == Mode::Research {
        info!("research complete");
        return Ok(());
    }

    // Merge discovered wallets with the configured tracked list.
    let mut wallets = config.wallets.tracked.clone();
    let mut known: HashSet<String> = wallets.iter().map(|w| w.address.clone()).collect();
    for wallet in finder::accepted_wallets(&report) {
        if known.insert(wallet.address.clone()) {
            wallets.push(wallet);
        }
    }
    if wallets.is_empty() {
        anyhow::bail!("no wallets to monitor: research accepted none and none are configured");
    }

    info!(
        "monitoring {} wallet(s), cycle interval {}s, per-wallet delay {}s",
        wallets.len(),
        config.monitor.cycle_interval_secs,
        config.monitor.wallet_delay_secs,
    );
    for wallet in &wallets {
        info!("  {} ({})", wallet.display_name(), wallet.address);
    }

    let mut state = MonitorState::new(&config.monitor);
    let cycle_delay = Duration::from_secs(config.monitor.cycle_interval_secs);
    let error_delay = Duration::from_secs(config.monitor.error_delay_secs);

    info!("entering monitoring loop. Press Ctrl+C to stop.");
    loop {
        // Cancellation lands between cycles, never mid-call.
        if let Err(e) = monitor::run_cycle(
            &rpc,
            &markets_client,
            &mut gate,
            &config,
            &wallets,
            &report.trending_pairs,
            &mut state,
        )
        .await
        {
            warn!("monitoring cycle failed: {e}");
            tokio::time::sleep(error_delay).await;
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
            _ = tokio::time::sleep(cycle_delay) => {}
        }
    }

    let monitoring_report = state.report(&wallets, &config.monitor);
    reporter::save_monitoring_report(&monitoring_report)?;
    info!(
        "shutdown complete: {} cycle(s), {} trade(s) detected",
        monitoring_report.cycles_completed, monitoring_report.trades_detected,
    );

    Ok(())
}
