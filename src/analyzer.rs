use crate::config::AnalysisConfig;
use crate::rpc::TransactionRecord;
use crate::types::{WalletEvaluation, WalletMetrics};

/// Facts about one classified trade, fed to the profit model.
#[derive(Debug, Clone)]
pub struct TradeRecord {
    pub succeeded: bool,
    pub amount_sol: f64,
}

/// Scores a wallet's trade history in [0, 1].
///
/// The score is a heuristic ranking signal, not reconstructed P&L; swap in a
/// different model to change how "profitable" is approximated.
pub trait ProfitModel {
    fn score(&self, trades: &[TradeRecord]) -> f64;
}

/// Default model: every second successful trade is counted as profitable.
/// A placeholder until a model backed by actual fill prices exists.
pub struct AlternatingWins;

impl ProfitModel for AlternatingWins {
    fn score(&self, trades: &[TradeRecord]) -> f64 {
        if trades.is_empty() {
            return 0.0;
        }
        let successful = trades.iter().filter(|t| t.succeeded).count();
        let profitable = successful / 2;
        profitable as f64 / trades.len() as f64
    }
}

/// Whether any instruction in the transaction targets a known DEX program.
pub fn is_swap_transaction(tx: &TransactionRecord) -> bool {
    tx.transaction
        .message
        .instructions
        .iter()
        .any(|ix| {
            ix.program_id
                .as_deref()
                .is_some_and(|id| crate::dex_name(id).is_some())
        })
}

/// Reduce a transaction history to its trades.
pub fn extract_trades(transactions: &[TransactionRecord]) -> Vec<TradeRecord> {
    transactions
        .iter()
        .filter(|tx| is_swap_transaction(tx))
        .map(|tx| TradeRecord {
            succeeded: tx.succeeded(),
            amount_sol: tx.sol_amount(),
        })
        .collect()
}

/// Evaluate a candidate wallet against the acceptance thresholds.
///
/// Pure and deterministic: the decision is a function of the fetched balance,
/// the transaction list, the four thresholds and the profit model. No state
/// survives the call.
pub fn evaluate_wallet(
    address: &str,
    balance_sol: f64,
    transactions: &[TransactionRecord],
    config: &AnalysisConfig,
    model: &dyn ProfitModel,
) -> WalletEvaluation {
    let trades = extract_trades(transactions);
    let trade_count = trades.len();
    let successful_trades = trades.iter().filter(|t| t.succeeded).count();

    let trades_per_day = trade_count as f64 / config.period_days.max(1) as f64;
    let success_rate = if trade_count > 0 {
        successful_trades as f64 / trade_count as f64
    } else {
        0.0
    };
    let profitability = model.score(&trades);

    let accepted = balance_sol >= config.min_sol_balance
        && trades_per_day >= config.min_trades_per_day
        && success_rate >= config.min_success_rate
        && profitability >= config.min_profitability;

    WalletEvaluation {
        address: address.to_string(),
        accepted,
        metrics: WalletMetrics {
            balance_sol,
            trade_count,
            successful_trades,
            trades_per_day,
            success_rate,
            profitability,
        },
    }
}
