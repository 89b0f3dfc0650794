use tracing::{info, warn};

use crate::analyzer::{self, ProfitModel};
use crate::config::AppConfig;
use crate::gate::RateGate;
use crate::markets::{self, MarketClient};
use crate::rpc::{RpcClient, TransactionRecord};
use crate::types::{ResearchReport, TrackedWallet, TrendingPair, WalletEvaluation};

/// Trending tokens inspected per research pass. Each costs one pair-detail
/// request, so this bounds the request budget of a pass.
const MAX_TRENDING_TOKENS: usize = 10;

/// Pairs kept per token (DexScreener lists them by liquidity).
const MAX_PAIRS_PER_TOKEN: usize = 3;

/// Signatures of history fetched per candidate wallet.
const ANALYSIS_SIGNATURE_LIMIT: usize = 50;

/// Fetch trending Solana pairs and keep those passing the market filter.
pub async fn fetch_trending_pairs(
    markets_client: &MarketClient,
    gate: &mut RateGate,
    config: &AppConfig,
) -> Vec<TrendingPair> {
    info!("fetching trending pairs from DexScreener");
    let profiles = match gate
        .call(config.rate.max_retries, || {
            markets_client.fetch_trending_profiles()
        })
        .await
    {
        Ok(profiles) => profiles,
        Err(e) => {
            warn!("failed to fetch trending profiles: {e}");
            return Vec::new();
        }
    };
    info!("found {} trending Solana tokens", profiles.len());

    let mut pairs = Vec::new();
    for profile in profiles.iter().take(MAX_TRENDING_TOKENS) {
        let details = match gate
            .call(config.rate.max_retries, || {
                markets_client.fetch_token_pairs(&profile.token_address)
            })
            .await
        {
            Ok(details) => details,
            Err(e) => {
                warn!("skipping token {}: {e}", profile.token_address);
                continue;
            }
        };
        for detail in details.iter().take(MAX_PAIRS_PER_TOKEN) {
            if markets::pair_passes_filter(detail, &config.markets) {
                pairs.push(markets::to_trending_pair(&profile.token_address, detail));
            }
        }
    }
    info!("{} trending pairs passed the market filter", pairs.len());
    pairs
}

/// Fetch a candidate wallet's recent history through the gate.
///
/// Individual transaction failures are logged and skipped; the evaluation
/// proceeds on whatever history was retrievable.
async fn fetch_wallet_history(
    rpc: &RpcClient,
    gate: &mut RateGate,
    config: &AppConfig,
    address: &str,
) -> Vec<TransactionRecord> {
    let signatures = match gate
        .call(config.rate.max_retries, || {
            rpc.get_signatures_for_address(address, ANALYSIS_SIGNATURE_LIMIT)
        })
        .await
    {
        Ok(sigs) => sigs,
        Err(e) => {
            warn!("failed to fetch signatures for {address}: {e}");
            return Vec::new();
        }
    };

    let mut transactions = Vec::new();
    for sig in &signatures {
        match gate
            .call(config.rate.max_retries, || {
                rpc.get_transaction(&sig.signature)
            })
            .await
        {
            Ok(Some(tx)) => transactions.push(tx),
            Ok(None) => {}
            Err(e) => {
                warn!("skipping transaction {}: {e}", sig.signature);
            }
        }
    }
    transactions
}

/// Evaluate every configured candidate wallet.
pub async fn evaluate_candidates(
    rpc: &RpcClient,
    gate: &mut RateGate,
    config: &AppConfig,
    model: &dyn ProfitModel,
) -> Vec<WalletEvaluation> {
    let mut evaluations = Vec::new();
    for address in &config.wallets.candidates {
        info!("analyzing candidate wallet {address}");
        let balance = match gate
            .call(config.rate.max_retries, || rpc.get_balance(address))
            .await
        {
            Ok(balance) => balance,
            Err(e) => {
                warn!("skipping candidate {address}: balance fetch failed: {e}");
                continue;
            }
        };
        let history = fetch_wallet_history(rpc, gate, config, address).await;
        let eval = analyzer::evaluate_wallet(address, balance, &history, &config.analysis, model);
        info!(
            "candidate {address}: accepted={} trades/day={:.2} success={:.2} score={:.3}",
            eval.accepted,
            eval.metrics.trades_per_day,
            eval.metrics.success_rate,
            eval.metrics.profitability,
        );
        evaluations.push(eval);
    }
    evaluations
}

/// One full research pass: trending pairs + candidate evaluation.
pub async fn run_research(
    rpc: &RpcClient,
    markets_client: &MarketClient,
    gate: &mut RateGate,
    config: &AppConfig,
    model: &dyn ProfitModel,
) -> ResearchReport {
    let trending_pairs = fetch_trending_pairs(markets_client, gate, config).await;
    let wallets = evaluate_candidates(rpc, gate, config, model).await;
    let accepted = wallets.iter().filter(|w| w.accepted).count();
    info!(
        "research pass complete: {} wallet(s) evaluated, {accepted} accepted",
        wallets.len()
    );
    ResearchReport {
        timestamp: chrono::Utc::now().to_rfc3339(),
        trending_pairs,
        wallets,
        analysis_parameters: config.analysis.clone(),
    }
}

/// Accepted wallets from a research report, as a tracked-wallet list.
pub fn accepted_wallets(report: &ResearchReport) -> Vec<TrackedWallet> {
    report
        .wallets
        .iter()
        .filter(|w| w.accepted)
        .map(|w| TrackedWallet::new(w.address.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WalletMetrics;

    fn eval(address: &str, accepted: bool) -> WalletEvaluation {
        WalletEvaluation {
            address: address.to_string(),
            accepted,
            metrics: WalletMetrics {
                balance_sol: 20.0,
                trade_count: 10,
                successful_trades: 8,
                trades_per_day: 1.4,
                success_rate: 0.8,
                profitability: 0.4,
            },
        }
    }

    #[test]
    fn accepted_wallets_filters_rejections() {
        let report = ResearchReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            trending_pairs: Vec::new(),
            wallets: vec![eval("W1", true), eval("W2", false), eval("W3", true)],
            analysis_parameters: crate::config::AnalysisConfig::default(),
        };
        let tracked = accepted_wallets(&report);
        assert_eq!(tracked.len(), 2);
        assert_eq!(tracked[0].address, "W1");
        assert_eq!(tracked[1].address, "W3");
        assert_eq!(tracked[0].display_name(), "Wallet_W1");
    }
}
