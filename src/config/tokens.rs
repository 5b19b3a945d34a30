use std::collections::HashMap;
use std::sync::LazyLock;
use serde::{Deserialize, Serialize};

/// Display metadata for a mint the app recognises.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownToken {
    #[serde(rename = "id")]
    pub mint: String,
    pub name: String,
    pub symbol: String,
    #[serde(rename = "icon")]
    pub logo_uri: Option<String>,
    pub decimals: u8,
}

// Embed the catalog at compile time so lookups work offline.
static TOKENS_JSON: &str = include_str!("../../assets/tokens.json");

static KNOWN_TOKENS: LazyLock<HashMap<String, KnownToken>> =
    LazyLock::new(|| parse_tokens_from_json(TOKENS_JSON));

/// Parse the catalog, falling back to a minimal built-in set when the
/// embedded JSON is malformed.
fn parse_tokens_from_json(json_str: &str) -> HashMap<String, KnownToken> {
    match serde_json::from_str::<Vec<KnownToken>>(json_str) {
        Ok(tokens) => {
            let mut map = HashMap::with_capacity(tokens.len());
            for token in tokens {
                map.insert(token.mint.clone(), token);
            }
            println!("Loaded {} known tokens from catalog", map.len());
            map
        }
        Err(e) => {
            eprintln!("Failed to parse token catalog: {}", e);

            let mut fallback = HashMap::new();
            fallback.insert(
                "So11111111111111111111111111111111111111112".to_string(),
                KnownToken {
                    mint: "So11111111111111111111111111111111111111112".to_string(),
                    name: "Wrapped SOL".to_string(),
                    symbol: "SOL".to_string(),
                    logo_uri: Some("https://raw.githubusercontent.com/solana-labs/token-list/main/assets/mainnet/So11111111111111111111111111111111111111112/logo.png".to_string()),
                    decimals: 9,
                },
            );
            fallback.insert(
                "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
                KnownToken {
                    mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
                    name: "USD Coin".to_string(),
                    symbol: "USDC".to_string(),
                    logo_uri: Some("https://raw.githubusercontent.com/solana-labs/token-list/main/assets/mainnet/EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v/logo.png".to_string()),
                    decimals: 6,
                },
            );

            println!("Using fallback token catalog");
            fallback
        }
    }
}

/// The wrapped-SOL mint, used for the native balance row.
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Look up catalog metadata for one mint.
pub fn lookup(mint: &str) -> Option<&'static KnownToken> {
    KNOWN_TOKENS.get(mint)
}

/// Display symbol for a mint: catalog symbol, or a truncated mint address
/// for tokens the catalog doesn't know.
pub fn symbol_or_short_mint(mint: &str) -> String {
    match lookup(mint) {
        Some(token) => token.symbol.clone(),
        None if mint.len() >= 8 => format!("{}...{}", &mint[..4], &mint[mint.len() - 4..]),
        None => mint.to_string(),
    }
}
