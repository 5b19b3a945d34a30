// src/portfolio.rs
use serde::{Deserialize, Serialize};

/// A tracked wallet with its native balance and token holdings.
///
/// Snapshots published by the store are read-only as far as the view is
/// concerned: the view filters, annotates and sorts but never writes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: String,
    pub name: String,
    /// Native SOL balance.
    pub balance: f64,
    pub total_value_usd: f64,
    pub tokens: Vec<TokenHolding>,
}

/// A single token position inside one wallet.
///
/// Numeric fields stay `None` when the backing API had no data. They
/// aggregate as zero but render as a placeholder, never as "0".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenHolding {
    pub mint: String,
    pub symbol: String,
    pub name: String,
    pub logo_uri: Option<String>,
    pub ui_amount: Option<f64>,
    pub price_usd: Option<f64>,
    pub value_usd: Option<f64>,
    pub change_24h: Option<f64>,
}

impl TokenHolding {
    /// USD value used for aggregation and ordering. Unknown counts as zero.
    pub fn value_or_zero(&self) -> f64 {
        self.value_usd.unwrap_or(0.0)
    }
}

/// The strongest 24h mover among held tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct TopMover {
    pub symbol: String,
    pub change_24h: f64,
}

/// Portfolio-level summary shown in the stats strip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioStats {
    pub day_change_percent: Option<f64>,
    pub total_pnl: Option<f64>,
    pub total_pnl_percent: Option<f64>,
    pub top_gainer: Option<TopMover>,
    pub top_loser: Option<TopMover>,
}

/// Which wallets the view aggregates over.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WalletSelector {
    #[default]
    All,
    Wallet(String),
}

/// A holding annotated with the wallet that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRow {
    pub wallet_id: String,
    pub wallet_name: String,
    pub token: TokenHolding,
}

/// Result of [`derive_view`]: totals plus the sorted, annotated rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedView {
    pub total_sol: f64,
    pub total_value_usd: f64,
    pub tokens: Vec<TokenRow>,
}

/// Aggregate wallet holdings for display.
///
/// With `WalletSelector::All` every wallet's tokens are flattened into one
/// list and totals sum across wallets. With a specific id only that wallet
/// contributes; an id that matches nothing degrades to an empty view rather
/// than an error. Rows are sorted descending by USD value (unknown value
/// sorts as zero); ties keep their original relative order.
pub fn derive_view(wallets: &[Wallet], selector: &WalletSelector) -> AggregatedView {
    let mut view = AggregatedView::default();

    match selector {
        WalletSelector::All => {
            for wallet in wallets {
                view.total_sol += wallet.balance;
                view.total_value_usd += wallet.total_value_usd;
                for token in &wallet.tokens {
                    view.tokens.push(TokenRow {
                        wallet_id: wallet.id.clone(),
                        wallet_name: wallet.name.clone(),
                        token: token.clone(),
                    });
                }
            }
        }
        WalletSelector::Wallet(id) => {
            if let Some(wallet) = wallets.iter().find(|w| &w.id == id) {
                view.total_sol = wallet.balance;
                view.total_value_usd = wallet.total_value_usd;
                for token in &wallet.tokens {
                    view.tokens.push(TokenRow {
                        wallet_id: wallet.id.clone(),
                        wallet_name: wallet.name.clone(),
                        token: token.clone(),
                    });
                }
            }
        }
    }

    // Vec::sort_by is stable, so equal values keep their insertion order.
    view.tokens.sort_by(|a, b| {
        b.token
            .value_or_zero()
            .partial_cmp(&a.token.value_or_zero())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    view
}

/// Compute the portfolio-level stats from the current wallet snapshot.
///
/// Only tokens with a known `change_24h` participate: the day change is the
/// value-weighted mean of per-token changes, the PnL figures are the implied
/// 24h USD move, and the movers are the extremes. Everything is `None` when
/// no token qualifies.
pub fn compute_portfolio_stats(wallets: &[Wallet]) -> PortfolioStats {
    let mut stats = PortfolioStats::default();

    let mut weighted_change = 0.0;
    let mut weight = 0.0;
    let mut pnl = 0.0;
    let mut prev_total = 0.0;

    for wallet in wallets {
        for token in &wallet.tokens {
            let change = match token.change_24h {
                Some(c) => c,
                None => continue,
            };
            let value = token.value_or_zero();

            weighted_change += value * change;
            weight += value;

            // Back out yesterday's value from today's; a -100% move would
            // divide by zero, so anything at or below it contributes the
            // full value as loss.
            let denom = 1.0 + change / 100.0;
            if denom > f64::EPSILON {
                let previous = value / denom;
                pnl += value - previous;
                prev_total += previous;
            } else {
                pnl -= value;
                prev_total += value;
            }

            let is_better = stats
                .top_gainer
                .as_ref()
                .map_or(true, |best| change > best.change_24h);
            if is_better {
                stats.top_gainer = Some(TopMover {
                    symbol: token.symbol.clone(),
                    change_24h: change,
                });
            }
            let is_worse = stats
                .top_loser
                .as_ref()
                .map_or(true, |worst| change < worst.change_24h);
            if is_worse {
                stats.top_loser = Some(TopMover {
                    symbol: token.symbol.clone(),
                    change_24h: change,
                });
            }
        }
    }

    if weight > 0.0 {
        stats.day_change_percent = Some(weighted_change / weight);
    }
    if prev_total > 0.0 {
        stats.total_pnl = Some(pnl);
        stats.total_pnl_percent = Some(pnl / prev_total * 100.0);
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(mint: &str, value: Option<f64>) -> TokenHolding {
        TokenHolding {
            mint: mint.to_string(),
            symbol: mint.to_uppercase(),
            name: format!("{} token", mint),
            logo_uri: None,
            ui_amount: Some(1.0),
            price_usd: value,
            value_usd: value,
            change_24h: None,
        }
    }

    fn sample_wallets() -> Vec<Wallet> {
        vec![
            Wallet {
                id: "a".to_string(),
                name: "Main".to_string(),
                balance: 1.5,
                total_value_usd: 300.0,
                tokens: vec![holding("m1", Some(200.0)), holding("m2", Some(100.0))],
            },
            Wallet {
                id: "b".to_string(),
                name: "Cold".to_string(),
                balance: 0.5,
                total_value_usd: 50.0,
                tokens: vec![holding("m3", Some(50.0))],
            },
        ]
    }

    #[test]
    fn all_wallets_sums_and_sorts() {
        let wallets = sample_wallets();
        let view = derive_view(&wallets, &WalletSelector::All);

        assert_eq!(view.total_sol, 2.0);
        assert_eq!(view.total_value_usd, 350.0);

        let mints: Vec<&str> = view.tokens.iter().map(|r| r.token.mint.as_str()).collect();
        assert_eq!(mints, vec!["m1", "m2", "m3"]);

        // Every row carries the owning wallet.
        assert_eq!(view.tokens[0].wallet_name, "Main");
        assert_eq!(view.tokens[2].wallet_id, "b");
    }

    #[test]
    fn single_wallet_selects_only_its_tokens() {
        let wallets = sample_wallets();
        let view = derive_view(&wallets, &WalletSelector::Wallet("b".to_string()));

        assert_eq!(view.total_sol, 0.5);
        assert_eq!(view.total_value_usd, 50.0);
        assert_eq!(view.tokens.len(), 1);
        assert_eq!(view.tokens[0].token.mint, "m3");
        assert_eq!(view.tokens[0].wallet_name, "Cold");
    }

    #[test]
    fn unknown_wallet_degrades_to_empty() {
        let wallets = sample_wallets();
        let view = derive_view(&wallets, &WalletSelector::Wallet("nope".to_string()));

        assert_eq!(view.total_sol, 0.0);
        assert_eq!(view.total_value_usd, 0.0);
        assert!(view.tokens.is_empty());
    }

    #[test]
    fn missing_value_sorts_as_zero_and_ties_are_stable() {
        let wallets = vec![Wallet {
            id: "a".to_string(),
            name: "Main".to_string(),
            balance: 0.0,
            total_value_usd: 0.0,
            tokens: vec![
                holding("first", Some(10.0)),
                holding("second", Some(10.0)),
                holding("unknown", None),
                holding("third", Some(25.0)),
            ],
        }];
        let view = derive_view(&wallets, &WalletSelector::All);

        let mints: Vec<&str> = view.tokens.iter().map(|r| r.token.mint.as_str()).collect();
        assert_eq!(mints, vec!["third", "first", "second", "unknown"]);
        // Unknown stays unknown for display even though it sorted as zero.
        assert_eq!(view.tokens[3].token.value_usd, None);
    }

    #[test]
    fn same_mint_across_wallets_stays_independent() {
        let mut wallets = sample_wallets();
        wallets[1].tokens.push(holding("m1", Some(5.0)));
        let view = derive_view(&wallets, &WalletSelector::All);

        let m1_rows: Vec<&TokenRow> = view
            .tokens
            .iter()
            .filter(|r| r.token.mint == "m1")
            .collect();
        assert_eq!(m1_rows.len(), 2);
        assert_ne!(m1_rows[0].wallet_id, m1_rows[1].wallet_id);
    }

    #[test]
    fn empty_input_yields_empty_view() {
        let view = derive_view(&[], &WalletSelector::All);
        assert_eq!(view, AggregatedView::default());
    }

    #[test]
    fn stats_pick_movers_and_weight_day_change() {
        let mut wallets = sample_wallets();
        wallets[0].tokens[0].change_24h = Some(10.0); // value 200
        wallets[0].tokens[1].change_24h = Some(-4.0); // value 100
        wallets[1].tokens[0].change_24h = None; // excluded

        let stats = compute_portfolio_stats(&wallets);

        assert_eq!(stats.top_gainer.as_ref().unwrap().symbol, "M1");
        assert_eq!(stats.top_loser.as_ref().unwrap().symbol, "M2");

        let day = stats.day_change_percent.unwrap();
        assert!((day - (200.0 * 10.0 - 100.0 * 4.0) / 300.0).abs() < 1e-9);

        // 200 was ~181.82 yesterday, 100 was ~104.17: pnl is the difference.
        let pnl = stats.total_pnl.unwrap();
        let expected = (200.0 - 200.0 / 1.1) + (100.0 - 100.0 / 0.96);
        assert!((pnl - expected).abs() < 1e-9);
        assert!(stats.total_pnl_percent.unwrap() > 0.0);
    }

    #[test]
    fn stats_without_changes_are_empty() {
        let stats = compute_portfolio_stats(&sample_wallets());
        assert_eq!(stats, PortfolioStats::default());
    }

    #[test]
    fn single_mover_is_both_gainer_and_loser() {
        let mut wallets = sample_wallets();
        wallets[1].tokens[0].change_24h = Some(2.5);

        let stats = compute_portfolio_stats(&wallets);
        assert_eq!(stats.top_gainer.as_ref().unwrap().symbol, "M3");
        assert_eq!(stats.top_loser.as_ref().unwrap().symbol, "M3");
    }
}
