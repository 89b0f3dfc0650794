use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AnalysisConfig;

/// Outcome taxonomy for a single external call.
///
/// Every RPC/REST call site returns `Result<T, CallError>` instead of relying
/// on catch-all exception handling. `RateLimited` is the only variant the
/// retry wrapper will retry; everything else is terminal for the current item
/// but never for the process.
#[derive(Debug, Error)]
pub enum CallError {
    /// The endpoint rejected the request for quota reasons (HTTP 429 or an
    /// equivalent RPC throttling error).
    #[error("rate limited by remote endpoint")]
    RateLimited,

    /// Network, HTTP or decode failure on a single item. Logged and skipped.
    #[error("transient error: {0}")]
    Transient(String),

    /// Unexpected failure escaping a loop iteration. Logged, the loop
    /// continues after a short delay.
    #[error("fatal error: {0}")]
    Fatal(String),
}

impl CallError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CallError::RateLimited)
    }
}

/// A wallet on the tracked-wallet list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedWallet {
    pub address: String,
    /// Display name; defaults to `Wallet_<first 6 chars>` when absent.
    #[serde(default)]
    pub nickname: Option<String>,
}

impl TrackedWallet {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            nickname: None,
        }
    }

    /// Display nickname, derived from the address when none was configured.
    pub fn display_name(&self) -> String {
        match &self.nickname {
            Some(n) => n.clone(),
            None => format!("Wallet_{}", &self.address[..self.address.len().min(6)]),
        }
    }
}

/// Per-wallet metrics produced by the analyzer. All derived from a single
/// pass over the fetched transaction history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletMetrics {
    pub balance_sol: f64,
    pub trade_count: usize,
    pub successful_trades: usize,
    pub trades_per_day: f64,
    pub success_rate: f64,
    /// Output of the configured profitability model — a heuristic score in
    /// [0, 1], NOT reconstructed P&L.
    pub profitability: f64,
}

/// Accept/reject decision for a candidate wallet, with the metrics that
/// produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletEvaluation {
    pub address: String,
    pub accepted: bool,
    pub metrics: WalletMetrics,
}

/// One detected swap, emitted as a JSON line by the reporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    pub timestamp: String,
    pub wallet: String,
    pub nickname: String,
    pub dex: String,
    pub signature: String,
    /// Absolute SOL balance change across the transaction, when non-zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_sol: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
    pub trending: bool,
    pub explorer_url: String,
}

/// A trending pair that passed the market-quality filter, kept for research
/// snapshots and trending-membership checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingPair {
    pub token_address: String,
    pub dex: String,
    pub base_symbol: String,
    pub quote_symbol: String,
    pub quote_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
    pub liquidity_usd: f64,
    pub volume_24h_usd: f64,
    pub price_change_24h: f64,
}

/// Research-mode snapshot written to `logs/research_<ts>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchReport {
    pub timestamp: String,
    pub trending_pairs: Vec<TrendingPair>,
    pub wallets: Vec<WalletEvaluation>,
    pub analysis_parameters: AnalysisConfig,
}

/// Monitoring snapshot written on shutdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringReport {
    pub timestamp: String,
    pub monitored_wallets: Vec<TrackedWallet>,
    pub processed_signatures: usize,
    pub cycles_completed: u64,
    pub trades_detected: u64,
    pub monitoring_interval_secs: u64,
}
