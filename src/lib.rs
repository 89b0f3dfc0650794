pub mod analyzer;
pub mod config;
pub mod finder;
pub mod gate;
pub mod markets;
pub mod monitor;
pub mod reporter;
pub mod rpc;
pub mod state;
pub mod types;

/// Default Solana JSON-RPC endpoint (public mainnet, unauthenticated quota)
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// DexScreener trending token profiles (public, no auth required)
pub const DEXSCREENER_PROFILES_URL: &str =
    "https://api.dexscreener.com/token-profiles/latest/v1";

/// DexScreener per-token pair listings
pub const DEXSCREENER_TOKENS_BASE: &str = "https://api.dexscreener.com/latest/dex/tokens";

/// Jupiter price API base URL
pub const JUPITER_PRICE_BASE: &str = "https://price.jup.ag/v4";

/// Raydium AMM program
pub const RAYDIUM_PROGRAM_ID: &str = "9W959DqEETiGZocYWCQPaJ6sBmUzgfxXfqGeTEdp3aQP";

/// Jupiter aggregator program
pub const JUPITER_PROGRAM_ID: &str = "JUP4Fb2cqiRUcaTHdrPC8h2gNsA2ETXiPDD33WcGuJB";

/// Orca Whirlpool program
pub const ORCA_PROGRAM_ID: &str = "whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc";

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// DEX programs whose instructions count as swaps, as (name, program id) pairs.
pub const DEX_PROGRAMS: &[(&str, &str)] = &[
    ("Raydium", RAYDIUM_PROGRAM_ID),
    ("Jupiter", JUPITER_PROGRAM_ID),
    ("Orca", ORCA_PROGRAM_ID),
];

/// Look up the DEX name for a program id, if it is a known swap program.
pub fn dex_name(program_id: &str) -> Option<&'static str> {
    DEX_PROGRAMS
        .iter()
        .find(|(_, id)| *id == program_id)
        .map(|(name, _)| *name)
}
