use std::collections::HashMap;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::config::MarketConfig;
use crate::types::{CallError, TrendingPair};
use crate::{DEXSCREENER_PROFILES_URL, DEXSCREENER_TOKENS_BASE, JUPITER_PRICE_BASE};

/// Entry from the DexScreener token-profiles feed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenProfile {
    pub chain_id: String,
    pub token_address: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenPairsResponse {
    #[serde(default)]
    pairs: Option<Vec<PairDetail>>,
}

/// One trading pair from the DexScreener token listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairDetail {
    #[serde(default)]
    pub dex_id: Option<String>,
    #[serde(default)]
    pub base_token: TokenSide,
    #[serde(default)]
    pub quote_token: TokenSide,
    /// DexScreener serializes prices as strings.
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub volume: VolumeWindow,
    #[serde(default)]
    pub liquidity: Option<LiquidityInfo>,
    #[serde(default)]
    pub price_change: ChangeWindow,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenSide {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VolumeWindow {
    #[serde(default)]
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiquidityInfo {
    #[serde(default)]
    pub usd: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeWindow {
    #[serde(default)]
    pub h24: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct JupiterPriceResponse {
    #[serde(default)]
    data: HashMap<String, JupiterPrice>,
}

#[derive(Debug, Deserialize)]
struct JupiterPrice {
    price: f64,
}

impl PairDetail {
    pub fn price_usd_f64(&self) -> Option<f64> {
        self.price_usd.as_deref().and_then(|p| p.parse().ok())
    }

    pub fn liquidity_usd(&self) -> f64 {
        self.liquidity
            .as_ref()
            .and_then(|l| l.usd)
            .unwrap_or(0.0)
    }

    pub fn volume_24h_usd(&self) -> f64 {
        self.volume.h24.unwrap_or(0.0)
    }

    pub fn price_change_24h(&self) -> f64 {
        self.price_change.h24.unwrap_or(0.0)
    }
}

/// Reference notional for the price-impact estimate.
const IMPACT_NOTIONAL_USD: f64 = 1_000.0;

/// Rough constant-product price-impact estimate (percent) for a reference
/// notional against the pair's pooled liquidity.
pub fn estimated_price_impact(pair: &PairDetail) -> f64 {
    let liquidity = pair.liquidity_usd();
    if liquidity <= 0.0 {
        return f64::INFINITY;
    }
    100.0 * IMPACT_NOTIONAL_USD / liquidity
}

/// Apply the market-quality thresholds to a pair: minimum liquidity and 24h
/// volume, minimum absolute 24h movement, tolerable price impact, and quote
/// token whitelist membership (empty whitelist accepts any quote).
pub fn pair_passes_filter(pair: &PairDetail, config: &MarketConfig) -> bool {
    if pair.liquidity_usd() < config.min_liquidity_usd {
        return false;
    }
    if pair.volume_24h_usd() < config.min_volume_24h_usd {
        return false;
    }
    if pair.price_change_24h().abs() < config.min_price_change_24h {
        return false;
    }
    if estimated_price_impact(pair) > config.max_price_impact {
        return false;
    }
    if !config.quote_whitelist.is_empty()
        && !config.quote_whitelist.contains(&pair.quote_token.address)
    {
        return false;
    }
    true
}

/// Flatten a filtered pair into the snapshot/report form.
pub fn to_trending_pair(token_address: &str, pair: &PairDetail) -> TrendingPair {
    TrendingPair {
        token_address: token_address.to_string(),
        dex: pair.dex_id.clone().unwrap_or_else(|| "unknown".to_string()),
        base_symbol: pair.base_token.symbol.clone(),
        quote_symbol: pair.quote_token.symbol.clone(),
        quote_address: pair.quote_token.address.clone(),
        price_usd: pair.price_usd_f64(),
        liquidity_usd: pair.liquidity_usd(),
        volume_24h_usd: pair.volume_24h_usd(),
        price_change_24h: pair.price_change_24h(),
    }
}

/// Whether a token participates in any known trending pair.
pub fn is_trending(token_address: &str, pairs: &[TrendingPair]) -> bool {
    pairs
        .iter()
        .any(|p| p.token_address == token_address || p.quote_address == token_address)
}

/// REST client for the market-data collaborators (DexScreener + Jupiter).
///
/// Like `RpcClient`, every method is a single attempt with a typed outcome;
/// retry policy lives in the rate gate.
pub struct MarketClient {
    http: reqwest::Client,
}

impl MarketClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, CallError> {
        let resp = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| CallError::Transient(format!("GET {url}: {e}")))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CallError::RateLimited);
        }
        if !status.is_success() {
            return Err(CallError::Transient(format!("GET {url}: HTTP {status}")));
        }
        resp.json()
            .await
            .map_err(|e| CallError::Transient(format!("GET {url}: decode: {e}")))
    }

    /// Fetch the latest trending token profiles, filtered to Solana.
    pub async fn fetch_trending_profiles(&self) -> Result<Vec<TokenProfile>, CallError> {
        let profiles: Vec<TokenProfile> = self.get_json(DEXSCREENER_PROFILES_URL).await?;
        let solana: Vec<TokenProfile> = profiles
            .into_iter()
            .filter(|p| p.chain_id == "solana")
            .collect();
        debug!("fetched {} trending Solana token profiles", solana.len());
        Ok(solana)
    }

    /// Fetch trading pairs for a token address.
    pub async fn fetch_token_pairs(&self, token_address: &str) -> Result<Vec<PairDetail>, CallError> {
        let url = format!("{DEXSCREENER_TOKENS_BASE}/{token_address}");
        let resp: TokenPairsResponse = self.get_json(&url).await?;
        Ok(resp.pairs.unwrap_or_default())
    }

    /// Look up a token price through the Jupiter price API.
    pub async fn fetch_price(&self, token_address: &str) -> Result<Option<f64>, CallError> {
        let url = format!("{JUPITER_PRICE_BASE}/price?ids={token_address}");
        let resp: JupiterPriceResponse = self.get_json(&url).await?;
        Ok(resp.data.get(token_address).map(|p| p.price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_json(liquidity: f64, volume: f64, change: f64, quote: &str) -> PairDetail {
        serde_json::from_value(serde_json::json!({
            "dexId": "raydium",
            "baseToken": { "address": "BaseMint111", "symbol": "TKN" },
            "quoteToken": { "address": quote, "symbol": "SOL" },
            "priceUsd": "0.0042",
            "volume": { "h24": volume },
            "liquidity": { "usd": liquidity },
            "priceChange": { "h24": change }
        }))
        .expect("valid pair JSON")
    }

    fn config() -> MarketConfig {
        MarketConfig {
            min_liquidity_usd: 50_000.0,
            min_volume_24h_usd: 100_000.0,
            min_price_change_24h: 5.0,
            max_price_impact: 2.0,
            use_jupiter_price: true,
            quote_whitelist: Vec::new(),
        }
    }

    #[test]
    fn pair_passing_all_thresholds_is_kept() {
        let pair = pair_json(200_000.0, 500_000.0, 12.0, "So11111111111111111111111111111111111111112");
        assert!(pair_passes_filter(&pair, &config()));
    }

    #[test]
    fn thin_liquidity_is_rejected() {
        let pair = pair_json(10_000.0, 500_000.0, 12.0, "sol");
        assert!(!pair_passes_filter(&pair, &config()));
    }

    #[test]
    fn low_volume_is_rejected() {
        let pair = pair_json(200_000.0, 40_000.0, 12.0, "sol");
        assert!(!pair_passes_filter(&pair, &config()));
    }

    #[test]
    fn flat_price_is_rejected_and_negative_movement_counts() {
        let flat = pair_json(200_000.0, 500_000.0, 1.0, "sol");
        assert!(!pair_passes_filter(&flat, &config()));
        let falling = pair_json(200_000.0, 500_000.0, -9.0, "sol");
        assert!(pair_passes_filter(&falling, &config()));
    }

    #[test]
    fn price_impact_rejects_shallow_pools() {
        // $49k pool clears liquidity minimum in this config but not impact.
        let mut cfg = config();
        cfg.min_liquidity_usd = 10_000.0;
        let pair = pair_json(49_000.0, 500_000.0, 12.0, "sol");
        assert!(estimated_price_impact(&pair) > cfg.max_price_impact);
        assert!(!pair_passes_filter(&pair, &cfg));
    }

    #[test]
    fn quote_whitelist_is_enforced() {
        let mut cfg = config();
        cfg.quote_whitelist = vec!["UsdcMint111".to_string()];
        let wrong_quote = pair_json(200_000.0, 500_000.0, 12.0, "SolMint111");
        assert!(!pair_passes_filter(&wrong_quote, &cfg));
        let right_quote = pair_json(200_000.0, 500_000.0, 12.0, "UsdcMint111");
        assert!(pair_passes_filter(&right_quote, &cfg));
    }

    #[test]
    fn price_string_parses() {
        let pair = pair_json(1.0, 1.0, 1.0, "sol");
        assert_eq!(pair.price_usd_f64(), Some(0.0042));
    }

    #[test]
    fn trending_membership_checks_both_sides() {
        let pair = to_trending_pair("TokenMint111", &pair_json(1.0, 1.0, 1.0, "QuoteMint111"));
        let pairs = vec![pair];
        assert!(is_trending("TokenMint111", &pairs));
        assert!(is_trending("QuoteMint111", &pairs));
        assert!(!is_trending("OtherMint111", &pairs));
    }

    #[test]
    fn jupiter_price_decodes() {
        let raw = serde_json::json!({
            "data": { "TokenMint111": { "id": "TokenMint111", "price": 0.137 } },
            "timeTaken": 0.002
        });
        let resp: JupiterPriceResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(resp.data["TokenMint111"].price, 0.137);
    }
}
