// src/store.rs
use dioxus::prelude::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::watch;

use crate::config::tokens::{self, SOL_MINT};
use crate::config::EndpointConfig;
use crate::live::{AccountUpdate, LiveUpdateClient};
use crate::portfolio::{compute_portfolio_stats, PortfolioStats, TokenHolding, Wallet};
use crate::prices::{self, TokenPrice};
use crate::rpc;
use crate::storage;

/// Global portfolio state using Dioxus GlobalSignal
pub static WALLETS: GlobalSignal<Vec<Wallet>> = Signal::global(Vec::new);
pub static PORTFOLIO_STATS: GlobalSignal<Option<PortfolioStats>> = Signal::global(|| None);
pub static CONNECTED: GlobalSignal<bool> = Signal::global(|| false);
pub static LOADING: GlobalSignal<bool> = Signal::global(|| false);

/// The data backend the store fetches portfolio snapshots from.
///
/// The aggregation and rendering layers only ever see `Wallet` values, so
/// tests drive them with a stub source instead of the network.
#[async_trait]
pub trait PortfolioSource: Send + Sync {
    async fn fetch_wallets(&self) -> Result<Vec<Wallet>, String>;
}

/// Production source: watchlist from storage, balances and token accounts
/// over RPC, prices from Jupiter.
#[derive(Default)]
pub struct LiveSource;

#[async_trait]
impl PortfolioSource for LiveSource {
    async fn fetch_wallets(&self) -> Result<Vec<Wallet>, String> {
        let watchlist = storage::load_watchlist();
        if watchlist.is_empty() {
            return Ok(Vec::new());
        }

        let custom_rpc = storage::load_rpc_from_storage();
        let endpoints = EndpointConfig::resolve(custom_rpc.as_deref());
        let rpc_url = Some(endpoints.rpc_url.as_str());

        let mut fetched = Vec::new();
        let mut mints = vec![SOL_MINT.to_string()];

        for entry in &watchlist {
            let balance = match rpc::get_balance(&entry.address, rpc_url).await {
                Ok(sol_balance) => sol_balance,
                Err(e) => {
                    println!("Failed to fetch balance for {}: {}", entry.address, e);
                    0.0
                }
            };

            let filter = Some(rpc::TokenAccountFilter::ProgramId(
                rpc::TOKEN_PROGRAM_ID.to_string(),
            ));
            let accounts =
                match rpc::get_token_accounts_by_owner(&entry.address, filter, rpc_url).await {
                    Ok(accounts) => accounts,
                    Err(e) => {
                        println!("Failed to fetch token accounts for {}: {}", entry.address, e);
                        Vec::new()
                    }
                };

            for account in &accounts {
                if !mints.contains(&account.mint) {
                    mints.push(account.mint.clone());
                }
            }

            fetched.push((entry.clone(), balance, accounts));
        }

        let price_map = match prices::get_cached_prices(&mints).await {
            Ok(price_map) => price_map,
            Err(e) => {
                println!("Failed to fetch prices: {}", e);
                HashMap::new()
            }
        };

        Ok(fetched
            .into_iter()
            .map(|(entry, balance, accounts)| {
                assemble_wallet(&entry.name, &entry.address, balance, accounts, &price_map)
            })
            .collect())
    }
}

static SOURCE: OnceLock<Arc<dyn PortfolioSource>> = OnceLock::new();

fn active_source() -> Arc<dyn PortfolioSource> {
    SOURCE
        .get_or_init(|| Arc::new(LiveSource::default()) as Arc<dyn PortfolioSource>)
        .clone()
}

/// Build one `Wallet` snapshot from raw RPC data plus the price map.
///
/// The native SOL position leads the token list; zero-balance accounts are
/// dropped, but accounts whose amount the node couldn't render stay in with
/// unknown amounts so the view can show a placeholder.
fn assemble_wallet(
    name: &str,
    address: &str,
    sol_balance: f64,
    accounts: Vec<rpc::TokenAccountInfo>,
    price_map: &HashMap<String, TokenPrice>,
) -> Wallet {
    let mut holdings = Vec::new();

    let sol_price = price_map.get(SOL_MINT);
    holdings.push(TokenHolding {
        mint: SOL_MINT.to_string(),
        symbol: "SOL".to_string(),
        name: "Solana".to_string(),
        logo_uri: tokens::lookup(SOL_MINT).and_then(|t| t.logo_uri.clone()),
        ui_amount: Some(sol_balance),
        price_usd: sol_price.map(|p| p.usd),
        value_usd: sol_price.map(|p| p.usd * sol_balance),
        change_24h: sol_price.and_then(|p| p.change_24h),
    });

    for account in accounts {
        if account.amount == Some(0.0) {
            continue;
        }

        let price = price_map.get(&account.mint);
        let (token_name, logo_uri) = match tokens::lookup(&account.mint) {
            Some(known) => (known.name.clone(), known.logo_uri.clone()),
            None => (account.mint.clone(), None),
        };

        holdings.push(TokenHolding {
            symbol: tokens::symbol_or_short_mint(&account.mint),
            name: token_name,
            logo_uri,
            ui_amount: account.amount,
            price_usd: price.map(|p| p.usd),
            value_usd: match (account.amount, price) {
                (Some(amount), Some(price)) => Some(amount * price.usd),
                _ => None,
            },
            change_24h: price.and_then(|p| p.change_24h),
            mint: account.mint,
        });
    }

    let total_value_usd = holdings.iter().map(|t| t.value_or_zero()).sum();

    Wallet {
        id: address.to_string(),
        name: name.to_string(),
        balance: sol_balance,
        total_value_usd,
        tokens: holdings,
    }
}

/// Refresh the wallet snapshots from the active source.
///
/// Safe to call concurrently with itself; failures keep the previous
/// snapshot and only surface through the loading flag resetting.
pub async fn fetch_wallets() {
    *LOADING.write() = true;

    match active_source().fetch_wallets().await {
        Ok(wallets) => {
            let stats = compute_portfolio_stats(&wallets);
            *WALLETS.write() = wallets;
            // Keep the stats strip consistent with what was just published.
            *PORTFOLIO_STATS.write() = Some(stats);
        }
        Err(e) => {
            println!("Failed to refresh wallets: {}", e);
        }
    }

    *LOADING.write() = false;
}

/// Recompute portfolio stats from the current wallet snapshot.
pub async fn fetch_portfolio_stats() {
    let snapshot = WALLETS.read().clone();
    *PORTFOLIO_STATS.write() = Some(compute_portfolio_stats(&snapshot));
}

struct WsControl {
    generation: u64,
    shutdown: Option<watch::Sender<bool>>,
}

static WS_CONTROL: Mutex<WsControl> = Mutex::new(WsControl {
    generation: 0,
    shutdown: None,
});

/// Open the live update subscription. A no-op while one is already open.
pub fn connect_websocket() {
    let receiver;
    let generation;
    {
        let mut control = WS_CONTROL.lock().unwrap();
        if control.shutdown.is_some() {
            return;
        }
        let (tx, rx) = watch::channel(false);
        control.generation += 1;
        control.shutdown = Some(tx);
        generation = control.generation;
        receiver = rx;
    }

    spawn(async move {
        run_live_updates(receiver, generation).await;
    });
}

/// Close the live update subscription. A no-op while already closed.
/// Updates that race the close are dropped, never applied.
pub fn disconnect_websocket() {
    let mut control = WS_CONTROL.lock().unwrap();
    if let Some(tx) = control.shutdown.take() {
        let _ = tx.send(true);
        println!("Live updates: disconnect requested");
    }
}

async fn run_live_updates(mut shutdown: watch::Receiver<bool>, generation: u64) {
    let custom_rpc = storage::load_rpc_from_storage();
    let endpoints = EndpointConfig::resolve(custom_rpc.as_deref());
    let client = LiveUpdateClient::new(endpoints.ws_url);

    if let Err(e) = client.connect().await {
        println!("Live updates unavailable: {}", e);
        finish_live_updates(generation);
        return;
    }

    for entry in storage::load_watchlist() {
        if let Err(e) = client.subscribe_account(&entry.address).await {
            println!("Failed to subscribe {}: {}", entry.address, e);
        }
    }

    *CONNECTED.write() = true;

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            update = client.next_update() => match update {
                Ok(Some(update)) => {
                    if *shutdown.borrow() {
                        break;
                    }
                    apply_account_update(&update);
                }
                Ok(None) => {
                    println!("Live update stream ended");
                    break;
                }
                Err(e) => {
                    println!("Live update error: {}", e);
                    break;
                }
            },
        }
    }

    let _ = client.close().await;
    finish_live_updates(generation);
}

/// Tear down connection state, unless a newer connection has already
/// replaced this one.
fn finish_live_updates(generation: u64) {
    let mut control = WS_CONTROL.lock().unwrap();
    if control.generation != generation {
        return;
    }
    control.shutdown = None;
    drop(control);
    *CONNECTED.write() = false;
}

fn apply_account_update(update: &AccountUpdate) {
    let sol_balance = update.lamports as f64 / 1_000_000_000.0;
    let mut wallets = WALLETS.write();
    apply_balance_change(wallets.as_mut_slice(), &update.address, sol_balance);
}

/// Fold a live SOL-balance change into the wallet snapshot. Updates for
/// addresses we no longer track are ignored.
fn apply_balance_change(wallets: &mut [Wallet], address: &str, sol_balance: f64) {
    let wallet = match wallets.iter_mut().find(|w| w.id == address) {
        Some(wallet) => wallet,
        None => return,
    };

    wallet.balance = sol_balance;
    if let Some(token) = wallet.tokens.iter_mut().find(|t| t.mint == SOL_MINT) {
        token.ui_amount = Some(sol_balance);
        token.value_usd = token.price_usd.map(|p| p * sol_balance);
    }
    wallet.total_value_usd = wallet.tokens.iter().map(|t| t.value_or_zero()).sum();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(usd: f64, change: Option<f64>) -> TokenPrice {
        TokenPrice {
            usd,
            change_24h: change,
        }
    }

    fn account(mint: &str, amount: Option<f64>) -> rpc::TokenAccountInfo {
        rpc::TokenAccountInfo {
            pubkey: format!("{}-account", mint),
            mint: mint.to_string(),
            owner: "owner".to_string(),
            amount,
            decimals: 6,
            state: "initialized".to_string(),
        }
    }

    #[test]
    fn test_assemble_wallet_builds_holdings() {
        let usdc = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
        let mut price_map = HashMap::new();
        price_map.insert(SOL_MINT.to_string(), price(100.0, Some(-1.5)));
        price_map.insert(usdc.to_string(), price(1.0, Some(0.0)));

        let wallet = assemble_wallet(
            "Main",
            "Addr111",
            2.0,
            vec![account(usdc, Some(250.0)), account("UnknownMint11111", Some(0.0))],
            &price_map,
        );

        assert_eq!(wallet.id, "Addr111");
        assert_eq!(wallet.balance, 2.0);
        // SOL row leads, zero-balance account dropped.
        assert_eq!(wallet.tokens.len(), 2);
        assert_eq!(wallet.tokens[0].symbol, "SOL");
        assert_eq!(wallet.tokens[0].value_usd, Some(200.0));
        assert_eq!(wallet.tokens[0].change_24h, Some(-1.5));
        assert_eq!(wallet.tokens[1].symbol, "USDC");
        assert_eq!(wallet.tokens[1].value_usd, Some(250.0));
        assert_eq!(wallet.total_value_usd, 450.0);
    }

    #[test]
    fn test_assemble_wallet_keeps_unknowns_as_placeholders() {
        let wallet = assemble_wallet(
            "Main",
            "Addr111",
            1.0,
            vec![account("9qWmXrB6BDXmEjwzDmF3pMZkSuJGCBS97sEzbCWrYkDq", None)],
            &HashMap::new(),
        );

        // No prices at all: values stay unknown, not zero.
        assert_eq!(wallet.tokens[0].value_usd, None);
        let unknown = &wallet.tokens[1];
        assert_eq!(unknown.symbol, "9qWm...YkDq");
        assert_eq!(unknown.ui_amount, None);
        assert_eq!(unknown.value_usd, None);
        assert_eq!(wallet.total_value_usd, 0.0);
    }

    #[test]
    fn test_apply_balance_change_updates_sol_row() {
        let mut price_map = HashMap::new();
        price_map.insert(SOL_MINT.to_string(), price(100.0, None));
        let mut wallets = vec![assemble_wallet("Main", "Addr111", 2.0, vec![], &price_map)];

        apply_balance_change(&mut wallets, "Addr111", 3.5);

        assert_eq!(wallets[0].balance, 3.5);
        assert_eq!(wallets[0].tokens[0].ui_amount, Some(3.5));
        assert_eq!(wallets[0].tokens[0].value_usd, Some(350.0));
        assert_eq!(wallets[0].total_value_usd, 350.0);
    }

    #[test]
    fn test_apply_balance_change_ignores_unknown_address() {
        let mut wallets = vec![assemble_wallet("Main", "Addr111", 2.0, vec![], &HashMap::new())];
        let before = wallets.clone();

        apply_balance_change(&mut wallets, "SomebodyElse", 9.9);

        assert_eq!(wallets, before);
    }

    struct StubSource {
        wallets: Vec<Wallet>,
    }

    #[async_trait]
    impl PortfolioSource for StubSource {
        async fn fetch_wallets(&self) -> Result<Vec<Wallet>, String> {
            Ok(self.wallets.clone())
        }
    }

    #[tokio::test]
    async fn test_stub_source_drives_the_contract() {
        let source: Arc<dyn PortfolioSource> = Arc::new(StubSource {
            wallets: vec![assemble_wallet("Main", "Addr111", 1.0, vec![], &HashMap::new())],
        });

        let wallets = source.fetch_wallets().await.unwrap();
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0].name, "Main");
    }
}
