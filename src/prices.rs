use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

// API Constants
const JUPITER_PRICE_API_URL: &str = "https://lite-api.jup.ag/price/v3";
const PRICE_CACHE_TIMEOUT: u64 = 120; // 2 minutes

const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";

/// Current price and 24h change for one mint.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPrice {
    pub usd: f64,
    pub change_24h: Option<f64>,
}

// Jupiter API V3 response structure
#[derive(Debug, Deserialize)]
struct JupiterTokenPrice {
    #[serde(rename = "usdPrice")]
    usd_price: f64,
    #[serde(rename = "priceChange24h")]
    price_change_24h: Option<f64>,
}

// Cache for price data
static PRICE_CACHE: OnceLock<Mutex<(HashMap<String, TokenPrice>, Instant)>> = OnceLock::new();

fn get_price_cache() -> &'static Mutex<(HashMap<String, TokenPrice>, Instant)> {
    PRICE_CACHE.get_or_init(|| Mutex::new((HashMap::new(), Instant::now())))
}

fn convert_response(response: HashMap<String, JupiterTokenPrice>) -> HashMap<String, TokenPrice> {
    response
        .into_iter()
        .map(|(mint, data)| {
            (
                mint,
                TokenPrice {
                    usd: data.usd_price,
                    change_24h: data.price_change_24h,
                },
            )
        })
        .collect()
}

/// Stablecoins trade so close to $1 that a missing quote is better filled
/// in than left unknown.
fn apply_stablecoin_fallback(prices: &mut HashMap<String, TokenPrice>) {
    for mint in [USDC_MINT, USDT_MINT] {
        prices.entry(mint.to_string()).or_insert(TokenPrice {
            usd: 1.0,
            change_24h: Some(0.0),
        });
    }
}

/// Fetch prices from the Jupiter API for specific mint addresses.
pub async fn get_prices_for_mints(
    mint_addresses: &[String],
) -> Result<HashMap<String, TokenPrice>, Box<dyn Error>> {
    if mint_addresses.is_empty() {
        return Ok(HashMap::new());
    }

    println!(
        "Fetching prices from Jupiter API for {} mints...",
        mint_addresses.len()
    );

    let client = Client::new();
    let ids_param = mint_addresses.join(",");

    let response = client
        .get(JUPITER_PRICE_API_URL)
        .query(&[("ids", &ids_param)])
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| format!("Jupiter API request failed: {}", e))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(format!("Jupiter API error {}: {}", status, error_text).into());
    }

    let response_text = response.text().await?;
    let jupiter_response: HashMap<String, JupiterTokenPrice> =
        serde_json::from_str(&response_text)
            .map_err(|e| format!("Failed to parse Jupiter response: {}", e))?;

    let mut prices = convert_response(jupiter_response);
    apply_stablecoin_fallback(&mut prices);

    println!("Jupiter API returned {} prices", prices.len());
    Ok(prices)
}

/// Get prices for the requested mints, served from the process-wide cache
/// while it is fresh.
pub async fn get_cached_prices(
    mint_addresses: &[String],
) -> Result<HashMap<String, TokenPrice>, Box<dyn Error>> {
    // Check cache first
    {
        let cache = get_price_cache().lock().unwrap();
        let (prices, timestamp) = &*cache;

        let fresh = timestamp.elapsed() < Duration::from_secs(PRICE_CACHE_TIMEOUT);
        let complete = mint_addresses.iter().all(|m| prices.contains_key(m));
        if fresh && complete && !prices.is_empty() {
            println!("Using cached price data (age: {:?})", timestamp.elapsed());
            return Ok(prices.clone());
        }
    }

    let fresh_prices = get_prices_for_mints(mint_addresses).await?;

    // Update cache
    {
        let mut cache = get_price_cache().lock().unwrap();
        *cache = (fresh_prices.clone(), Instant::now());
    }

    Ok(fresh_prices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jupiter_response_parses() {
        let raw = r#"{
            "So11111111111111111111111111111111111111112": {
                "usdPrice": 148.32,
                "blockId": 298765432,
                "decimals": 9,
                "priceChange24h": -2.17
            },
            "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263": {
                "usdPrice": 0.0000214,
                "priceChange24h": null
            }
        }"#;

        let parsed: HashMap<String, JupiterTokenPrice> = serde_json::from_str(raw).unwrap();
        let prices = convert_response(parsed);

        let sol = &prices["So11111111111111111111111111111111111111112"];
        assert_eq!(sol.usd, 148.32);
        assert_eq!(sol.change_24h, Some(-2.17));

        let bonk = &prices["DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263"];
        assert_eq!(bonk.change_24h, None);
    }

    #[test]
    fn test_stablecoin_fallback_fills_missing_only() {
        let mut prices = HashMap::new();
        prices.insert(
            USDC_MINT.to_string(),
            TokenPrice {
                usd: 0.9997,
                change_24h: Some(-0.01),
            },
        );

        apply_stablecoin_fallback(&mut prices);

        // Existing quote untouched, missing USDT filled in at parity.
        assert_eq!(prices[USDC_MINT].usd, 0.9997);
        assert_eq!(prices[USDT_MINT].usd, 1.0);
    }
}
