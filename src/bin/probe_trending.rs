//! Probe: DexScreener trending endpoints
//!
//! Hits GET https://api.dexscreener.com/token-profiles/latest/v1 and the
//! per-token pair listing, and documents:
//! - Response shape and fields
//! - Solana share of the trending feed
//! - Liquidity/volume distribution of the listed pairs

use anyhow::Result;
use serde_json::Value;
use solana_walletwatch::{DEXSCREENER_PROFILES_URL, DEXSCREENER_TOKENS_BASE};
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<()> {
    let client = reqwest::Client::new();

    println!("=== Probe: DexScreener trending ===");
    println!();

    // 1. Token profiles feed
    println!("--- 1. Token profiles (latest) ---");
    let start = Instant::now();
    let resp = client.get(DEXSCREENER_PROFILES_URL).send().await?;
    let latency = start.elapsed();
    let status = resp.status();
    let body: Value = resp.json().await?;
    println!("Status: {status}");
    println!("Latency: {latency:?}");

    let profiles = body.as_array().cloned().unwrap_or_default();
    println!("Profile count: {}", profiles.len());
    let solana: Vec<&Value> = profiles
        .iter()
        .filter(|p| p.get("chainId").and_then(Value::as_str) == Some("solana"))
        .collect();
    println!("Solana profiles: {}", solana.len());
    if let Some(first) = solana.first() {
        println!("\nSample profile:");
        println!("{}", serde_json::to_string_pretty(first)?);
    }
    println!();

    // 2. Pair detail for the first Solana token
    let Some(token) = solana
        .first()
        .and_then(|p| p.get("tokenAddress"))
        .and_then(Value::as_str)
    else {
        println!("No Solana token to probe pairs for");
        return Ok(());
    };

    println!("--- 2. Pair detail for {token} ---");
    let url = format!("{DEXSCREENER_TOKENS_BASE}/{token}");
    let start = Instant::now();
    let resp = client.get(&url).send().await?;
    let latency = start.elapsed();
    println!("Status: {}", resp.status());
    println!("Latency: {latency:?}");
    let body: Value = resp.json().await?;

    let pairs = body
        .get("pairs")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    println!("Pair count: {}", pairs.len());
    for pair in pairs.iter().take(3) {
        let dex = pair.get("dexId").and_then(Value::as_str).unwrap_or("?");
        let base = pair
            .pointer("/baseToken/symbol")
            .and_then(Value::as_str)
            .unwrap_or("?");
        let quote = pair
            .pointer("/quoteToken/symbol")
            .and_then(Value::as_str)
            .unwrap_or("?");
        let price = pair.get("priceUsd").and_then(Value::as_str).unwrap_or("?");
        let liquidity = pair
            .pointer("/liquidity/usd")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let volume = pair
            .pointer("/volume/h24")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        println!("  {dex}: {base}/{quote} price=${price} liquidity=${liquidity:.0} vol24h=${volume:.0}");
    }

    Ok(())
}
