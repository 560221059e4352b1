// src/resolver.rs

/// Maps a ticker symbol to the price provider's coin id. `None` means the
/// row is never enriched.
pub fn resolve(symbol: &str) -> Option<&'static str> {
    match symbol.trim().to_lowercase().as_str() {
        "btc" => Some("bitcoin"),
        "eth" => Some("ethereum"),
        "sol" => Some("solana"),
        "ada" => Some("cardano"),
        "xrp" => Some("ripple"),
        "doge" => Some("dogecoin"),
        _ => None,
    }
}
