use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::LAMPORTS_PER_SOL;
use crate::config::RpcConfig;
use crate::types::CallError;

/// Signature listing entry from `getSignaturesForAddress`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
    /// Present when the transaction failed on-chain.
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub block_time: Option<i64>,
}

/// Full transaction record from `getTransaction` (jsonParsed encoding).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub slot: u64,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    pub transaction: TransactionPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub pre_balances: Vec<u64>,
    #[serde(default)]
    pub post_balances: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionPayload {
    pub message: TransactionMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionMessage {
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

/// Parsed instruction. The program id drives swap detection; the parsed
/// payload, when the node provides one, may carry a token mint for price
/// lookups.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub parsed: Option<Value>,
}

impl Instruction {
    /// Token mint referenced by the parsed payload, if any.
    pub fn token_mint(&self) -> Option<&str> {
        self.parsed
            .as_ref()?
            .get("info")?
            .get("mint")?
            .as_str()
    }
}

impl TransactionRecord {
    /// Whether the transaction succeeded on-chain (no `meta.err`).
    pub fn succeeded(&self) -> bool {
        self.meta.as_ref().is_none_or(|m| m.err.is_none())
    }

    /// Absolute net SOL balance change across all accounts.
    pub fn sol_amount(&self) -> f64 {
        let Some(meta) = &self.meta else {
            return 0.0;
        };
        let delta: i128 = meta
            .post_balances
            .iter()
            .zip(meta.pre_balances.iter())
            .map(|(post, pre)| *post as i128 - *pre as i128)
            .sum();
        delta.unsigned_abs() as f64 / LAMPORTS_PER_SOL
    }
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResult {
    value: u64,
}

/// Classify a JSON-RPC error body. Public RPC nodes surface throttling either
/// as HTTP 429 or as an in-band error, so both paths map to `RateLimited`.
fn classify_rpc_error(code: i64, message: &str) -> CallError {
    let lower = message.to_lowercase();
    if code == -32429 || lower.contains("429") || lower.contains("too many requests") {
        CallError::RateLimited
    } else {
        CallError::Transient(format!("rpc error {code}: {message}"))
    }
}

/// Minimal Solana JSON-RPC client.
///
/// Each method performs exactly one attempt and reports a typed outcome; the
/// rate gate's call wrapper owns all throttling and retry policy.
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    commitment: String,
}

impl RpcClient {
    pub fn new(http: reqwest::Client, config: &RpcConfig) -> Self {
        Self {
            http,
            url: config.url.clone(),
            commitment: config.commitment.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, CallError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CallError::Transient(format!("{method}: {e}")))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CallError::RateLimited);
        }
        if !status.is_success() {
            return Err(CallError::Transient(format!("{method}: HTTP {status}")));
        }

        let envelope: RpcEnvelope = resp
            .json()
            .await
            .map_err(|e| CallError::Transient(format!("{method}: decode: {e}")))?;
        if let Some(err) = envelope.error {
            return Err(classify_rpc_error(err.code, &err.message));
        }
        Ok(envelope.result)
    }

    /// Fetch the most recent transaction signatures for a wallet address.
    pub async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, CallError> {
        let result = self
            .request(
                "getSignaturesForAddress",
                json!([address, { "limit": limit, "commitment": self.commitment }]),
            )
            .await?;
        let signatures: Vec<SignatureInfo> = serde_json::from_value(result)
            .map_err(|e| CallError::Transient(format!("getSignaturesForAddress: {e}")))?;
        debug!("fetched {} signatures for {address}", signatures.len());
        Ok(signatures)
    }

    /// Fetch a full transaction record. `None` when the node has no record
    /// for the signature (pruned or not yet finalized).
    pub async fn get_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<TransactionRecord>, CallError> {
        let result = self
            .request(
                "getTransaction",
                json!([signature, {
                    "encoding": "jsonParsed",
                    "commitment": self.commitment,
                    "maxSupportedTransactionVersion": 0,
                }]),
            )
            .await?;
        serde_json::from_value(result)
            .map_err(|e| CallError::Transient(format!("getTransaction: {e}")))
    }

    /// Fetch a wallet's SOL balance.
    pub async fn get_balance(&self, address: &str) -> Result<f64, CallError> {
        let result = self
            .request(
                "getBalance",
                json!([address, { "commitment": self.commitment }]),
            )
            .await?;
        let balance: BalanceResult = serde_json::from_value(result)
            .map_err(|e| CallError::Transient(format!("getBalance: {e}")))?;
        Ok(balance.value as f64 / LAMPORTS_PER_SOL)
    }
}
