use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::TrackedWallet;

/// Default config file path.
pub const CONFIG_PATH: &str = "config.toml";

/// Top-level application config deserialized from `config.toml`.
///
/// Every section has sensible defaults so an empty file is a valid config;
/// the RPC URL can additionally be overridden via the `SOLANA_RPC_URL`
/// environment variable (loaded through dotenvy in `main`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub rate: RateConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub markets: MarketConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub wallets: WalletsConfig,
}

/// RPC endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_url")]
    pub url: String,
    /// Commitment level for transaction fetches.
    #[serde(default = "default_commitment")]
    pub commitment: String,
}

fn default_rpc_url() -> String {
    crate::DEFAULT_RPC_URL.to_string()
}

fn default_commitment() -> String {
    "finalized".to_string()
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            commitment: default_commitment(),
        }
    }
}

/// Rate gate and retry tunables. Ultra-conservative defaults sized for the
/// public mainnet RPC quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConfig {
    /// Minimum spacing between any two outbound requests, in seconds.
    #[serde(default = "default_min_interval")]
    pub min_interval_secs: f64,
    /// Attempts per call before a rate-limited item is skipped.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff applied after the first rate-limit rejection, in seconds.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_secs: u64,
    /// Backoff ceiling, in seconds.
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

fn default_min_interval() -> f64 {
    10.0
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    5
}

fn default_max_backoff() -> u64 {
    60
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval(),
            max_retries: default_max_retries(),
            initial_backoff_secs: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

impl RateConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs_f64(self.min_interval_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_secs(self.initial_backoff_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }
}

/// Wallet-acceptance thresholds used by the analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_min_sol_balance")]
    pub min_sol_balance: f64,
    #[serde(default = "default_min_trades_per_day")]
    pub min_trades_per_day: f64,
    #[serde(default = "default_min_success_rate")]
    pub min_success_rate: f64,
    /// Minimum profitability score from the configured profit model.
    #[serde(default = "default_min_profitability")]
    pub min_profitability: f64,
    /// Analysis window in days; trade frequency is averaged over this span.
    #[serde(default = "default_period_days")]
    pub period_days: u32,
}

fn default_min_sol_balance() -> f64 {
    10.0
}

fn default_min_trades_per_day() -> f64 {
    5.0
}

fn default_min_success_rate() -> f64 {
    0.7
}

fn default_min_profitability() -> f64 {
    0.02
}

fn default_period_days() -> u32 {
    7
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_sol_balance: default_min_sol_balance(),
            min_trades_per_day: default_min_trades_per_day(),
            min_success_rate: default_min_success_rate(),
            min_profitability: default_min_profitability(),
            period_days: default_period_days(),
        }
    }
}

/// Quality filter for trending pairs plus price lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    #[serde(default = "default_min_liquidity")]
    pub min_liquidity_usd: f64,
    #[serde(default = "default_min_volume")]
    pub min_volume_24h_usd: f64,
    /// Minimum absolute 24h price change (percent) for a pair to count as
    /// actively moving.
    #[serde(default = "default_min_price_change")]
    pub min_price_change_24h: f64,
    /// Maximum tolerated price impact (percent) — pairs with thinner books
    /// are dropped.
    #[serde(default = "default_max_price_impact")]
    pub max_price_impact: f64,
    /// Whether to look up token prices through the Jupiter price API when
    /// logging detected trades.
    #[serde(default = "default_use_jupiter_price")]
    pub use_jupiter_price: bool,
    /// Quote tokens a trending pair must settle against (e.g. SOL, USDC
    /// mints). Empty means any quote is acceptable.
    #[serde(default)]
    pub quote_whitelist: Vec<String>,
}

fn default_min_liquidity() -> f64 {
    50_000.0
}

fn default_min_volume() -> f64 {
    100_000.0
}

fn default_min_price_change() -> f64 {
    5.0
}

fn default_max_price_impact() -> f64 {
    2.0
}

fn default_use_jupiter_price() -> bool {
    true
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            min_liquidity_usd: default_min_liquidity(),
            min_volume_24h_usd: default_min_volume(),
            min_price_change_24h: default_min_price_change(),
            max_price_impact: default_max_price_impact(),
            use_jupiter_price: default_use_jupiter_price(),
            quote_whitelist: Vec::new(),
        }
    }
}

/// Monitoring loop tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Delay after a full pass over the tracked list, in seconds.
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_secs: u64,
    /// Delay between consecutive wallets within a pass, in seconds.
    #[serde(default = "default_wallet_delay")]
    pub wallet_delay_secs: u64,
    /// Recovery delay after an unexpected cycle failure, in seconds.
    #[serde(default = "default_error_delay")]
    pub error_delay_secs: u64,
    /// Signatures fetched per wallet per pass.
    #[serde(default = "default_batch_size")]
    pub signature_batch_size: usize,
    /// Processed-signature set is trimmed once it grows past this size...
    #[serde(default = "default_processed_cap")]
    pub processed_cap: usize,
    /// ...down to the most recent this-many entries.
    #[serde(default = "default_processed_keep")]
    pub processed_keep: usize,
}

fn default_cycle_interval() -> u64 {
    60
}

fn default_wallet_delay() -> u64 {
    15
}

fn default_error_delay() -> u64 {
    5
}

fn default_batch_size() -> usize {
    1
}

fn default_processed_cap() -> usize {
    1000
}

fn default_processed_keep() -> usize {
    500
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: default_cycle_interval(),
            wallet_delay_secs: default_wallet_delay(),
            error_delay_secs: default_error_delay(),
            signature_batch_size: default_batch_size(),
            processed_cap: default_processed_cap(),
            processed_keep: default_processed_keep(),
        }
    }
}

/// Tracked and candidate wallet lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletsConfig {
    /// Wallets monitored in monitor mode (merged with research output).
    #[serde(default)]
    pub tracked: Vec<TrackedWallet>,
    /// Wallets evaluated in research mode.
    #[serde(default)]
    pub candidates: Vec<String>,
}

impl AppConfig {
    /// Load config from the given TOML file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if let Ok(url) = std::env::var("SOLANA_RPC_URL") {
            config.rpc.url = url;
        }
        Ok(config)
    }

    /// Write config to the given TOML file path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").expect("empty config is valid");
        assert_eq!(config.rpc.url, crate::DEFAULT_RPC_URL);
        assert_eq!(config.rate.max_retries, 3);
        assert_eq!(config.rate.initial_backoff_secs, 5);
        assert_eq!(config.rate.max_backoff_secs, 60);
        assert_eq!(config.monitor.processed_cap, 1000);
        assert_eq!(config.monitor.processed_keep, 500);
        assert!(config.wallets.tracked.is_empty());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [rate]
            min_interval_secs = 2.5

            [[wallets.tracked]]
            address = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU"
            nickname = "whale"
            "#,
        )
        .expect("valid config");
        assert!((config.rate.min_interval_secs - 2.5).abs() < 1e-9);
        assert_eq!(config.rate.max_retries, 3);
        assert_eq!(config.wallets.tracked.len(), 1);
        assert_eq!(config.wallets.tracked[0].display_name(), "whale");
    }

    #[test]
    fn nickname_derived_from_address() {
        let w = TrackedWallet::new("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU");
        assert_eq!(w.display_name(), "Wallet_7xKXtg");
    }
}
