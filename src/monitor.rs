use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::gate::RateGate;
use crate::markets::{self, MarketClient};
use crate::reporter;
use crate::rpc::{RpcClient, TransactionRecord};
use crate::state::MonitorState;
use crate::types::{TrackedWallet, TradeEvent, TrendingPair};

/// DEX names referenced by swap instructions in the transaction, in
/// instruction order.
pub fn swap_dexes(tx: &TransactionRecord) -> Vec<&'static str> {
    tx.transaction
        .message
        .instructions
        .iter()
        .filter_map(|ix| ix.program_id.as_deref())
        .filter_map(crate::dex_name)
        .collect()
}

/// First token mint surfaced by the parsed instruction payloads, if any.
pub fn swap_token_mint(tx: &TransactionRecord) -> Option<&str> {
    tx.transaction
        .message
        .instructions
        .iter()
        .find_map(|ix| ix.token_mint())
}

/// Solscan link for a signature.
pub fn explorer_url(signature: &str) -> String {
    format!("https://solscan.io/tx/{signature}")
}

/// Check one tracked wallet for new swap transactions.
///
/// Every failure path is terminal for the current item only: rate-limit
/// exhaustion or a transient error skips the wallet (or transaction) and the
/// pass continues.
pub async fn monitor_wallet(
    rpc: &RpcClient,
    markets_client: &MarketClient,
    gate: &mut RateGate,
    config: &AppConfig,
    wallet: &TrackedWallet,
    trending: &[TrendingPair],
    state: &mut MonitorState,
) {
    let nickname = wallet.display_name();
    let signatures = match gate
        .call(config.rate.max_retries, || {
            rpc.get_signatures_for_address(&wallet.address, config.monitor.signature_batch_size)
        })
        .await
    {
        Ok(sigs) => sigs,
        Err(e) => {
            warn!("[{nickname}] signature fetch failed: {e}");
            return;
        }
    };

    for sig_info in &signatures {
        // Mark before fetching so a failed fetch is not retried forever.
        if !state.seen.insert(&sig_info.signature) {
            continue;
        }

        let tx = match gate
            .call(config.rate.max_retries, || {
                rpc.get_transaction(&sig_info.signature)
            })
            .await
        {
            Ok(Some(tx)) => tx,
            Ok(None) => {
                debug!("[{nickname}] no record for {}", sig_info.signature);
                continue;
            }
            Err(e) => {
                warn!("[{nickname}] transaction fetch failed for {}: {e}", sig_info.signature);
                continue;
            }
        };

        let dexes = swap_dexes(&tx);
        if dexes.is_empty() {
            continue;
        }

        let amount = tx.sol_amount();
        let token_mint = swap_token_mint(&tx).map(str::to_owned);

        let price_usd = match &token_mint {
            Some(mint) if config.markets.use_jupiter_price => {
                match gate
                    .call(config.rate.max_retries, || markets_client.fetch_price(mint))
                    .await
                {
                    Ok(price) => price,
                    Err(e) => {
                        debug!("[{nickname}] price lookup failed for {mint}: {e}");
                        None
                    }
                }
            }
            _ => None,
        };
        let is_trending = token_mint
            .as_deref()
            .map(|mint| markets::is_trending(mint, trending))
            .unwrap_or(false);

        for dex in dexes {
            let event = TradeEvent {
                timestamp: chrono::Utc::now().to_rfc3339(),
                wallet: wallet.address.clone(),
                nickname: nickname.clone(),
                dex: dex.to_string(),
                signature: sig_info.signature.clone(),
                amount_sol: (amount > 0.0).then_some(amount),
                price_usd,
                trending: is_trending,
                explorer_url: explorer_url(&sig_info.signature),
            };
            info!(
                wallet = %nickname,
                dex,
                signature = %sig_info.signature,
                amount_sol = amount,
                trending = is_trending,
                "trade detected"
            );
            reporter::report_trade(&event);
            state.trades_detected += 1;
        }
    }
}

/// One full pass over the tracked-wallet list, with the configured per-wallet
/// delay between wallets.
pub async fn run_cycle(
    rpc: &RpcClient,
    markets_client: &MarketClient,
    gate: &mut RateGate,
    config: &AppConfig,
    wallets: &[TrackedWallet],
    trending: &[TrendingPair],
    state: &mut MonitorState,
) -> Result<()> {
    if wallets.is_empty() {
        warn!("no wallets to monitor");
        return Ok(());
    }

    let wallet_delay = Duration::from_secs(config.monitor.wallet_delay_secs);
    for wallet in wallets {
        monitor_wallet(rpc, markets_client, gate, config, wallet, trending, state).await;
        tokio::time::sleep(wallet_delay).await;
    }

    state.cycles_completed += 1;
    debug!(
        "cycle {} complete ({} signatures tracked)",
        state.cycles_completed,
        state.seen.len()
    );
    Ok(())
}
