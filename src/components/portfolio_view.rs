use dioxus::prelude::*;
use crate::currency_utils::{
    format_percent,
    format_price,
    format_sol,
    format_token_amount,
    format_usd,
};
use crate::portfolio::{derive_view, WalletSelector};
use crate::store::{self, CONNECTED, LOADING, PORTFOLIO_STATS, WALLETS};

/// Single-letter stand-in for tokens without a logo.
fn symbol_initial(symbol: &str) -> String {
    symbol
        .chars()
        .next()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// Main portfolio component
#[component]
pub fn PortfolioView() -> Element {
    // Local UI state: which wallet is selected, whether values are hidden,
    // and whether a manual refresh is in flight.
    let mut selector = use_signal(WalletSelector::default);
    let mut hide_values = use_signal(|| false);
    let mut refreshing = use_signal(|| false);
    let mut show_wallet_menu = use_signal(|| false);
    let mut last_refreshed = use_signal(|| None as Option<String>);

    // Initial data load plus the live subscription, once on mount.
    use_effect(move || {
        spawn(async move {
            tokio::join!(store::fetch_wallets(), store::fetch_portfolio_stats());
            last_refreshed.set(Some(chrono::Local::now().format("%H:%M:%S").to_string()));
        });
        store::connect_websocket();
    });

    // Close the live subscription when the component unmounts.
    use_drop(move || {
        store::disconnect_websocket();
    });

    // Re-derive the aggregated view whenever the store or the filter moves.
    let view = use_memo(move || derive_view(&WALLETS.read(), &selector.read()));

    let aggregated = view();
    let masked = hide_values();
    let connected = *CONNECTED.read();
    let loading = *LOADING.read();
    let show_wallet_badges = *selector.read() == WalletSelector::All;
    let stats = PORTFOLIO_STATS.read().clone().unwrap_or_default();

    let wallet_options: Vec<(String, String)> = WALLETS
        .read()
        .iter()
        .map(|w| (w.id.clone(), w.name.clone()))
        .collect();

    let wallet_label = match &*selector.read() {
        WalletSelector::All => "All Wallets".to_string(),
        WalletSelector::Wallet(id) => wallet_options
            .iter()
            .find(|(wallet_id, _)| wallet_id == id)
            .map(|(_, name)| name.clone())
            .unwrap_or_else(|| "Unknown Wallet".to_string()),
    };

    let day_change = stats.day_change_percent;
    let pnl_positive = stats.total_pnl.map_or(true, |v| v >= 0.0);

    rsx! {
        div {
            class: "portfolio-container",
            onclick: move |_| {
                if show_wallet_menu() {
                    show_wallet_menu.set(false);
                }
            },

            // Header
            div {
                class: "portfolio-header",
                div {
                    class: "header-title",
                    h2 { "Portfolio" }
                    div {
                        class: if connected { "connection-dot connected" } else { "connection-dot" },
                        title: if connected { "Live updates connected" } else { "Live updates offline" },
                    }
                }

                div {
                    class: "header-controls",
                    if let Some(ref stamp) = last_refreshed() {
                        span {
                            class: "last-refreshed",
                            "Updated {stamp}"
                        }
                    }

                    // Wallet filter dropdown
                    div {
                        class: "wallet-filter",
                        button {
                            class: "wallet-filter-button",
                            onclick: move |e| {
                                e.stop_propagation();
                                show_wallet_menu.set(!show_wallet_menu());
                            },
                            "{wallet_label} ▾"
                        }
                        if show_wallet_menu() {
                            div {
                                class: "wallet-menu",
                                onclick: move |e| e.stop_propagation(),
                                button {
                                    class: if show_wallet_badges {
                                        "wallet-menu-item active"
                                    } else {
                                        "wallet-menu-item"
                                    },
                                    onclick: move |_| {
                                        selector.set(WalletSelector::All);
                                        show_wallet_menu.set(false);
                                    },
                                    "All Wallets"
                                }
                                for (wallet_id, wallet_name) in wallet_options.clone() {
                                    button {
                                        key: "{wallet_id}",
                                        class: {
                                            let active = *selector.read()
                                                == WalletSelector::Wallet(wallet_id.clone());
                                            if active { "wallet-menu-item active" } else { "wallet-menu-item" }
                                        },
                                        onclick: {
                                            let wallet_id = wallet_id.clone();
                                            move |_| {
                                                selector.set(WalletSelector::Wallet(wallet_id.clone()));
                                                show_wallet_menu.set(false);
                                            }
                                        },
                                        "{wallet_name}"
                                    }
                                }
                            }
                        }
                    }

                    // Privacy toggle: hides every monetary value, data untouched.
                    button {
                        class: "icon-button",
                        title: if masked { "Show values" } else { "Hide values" },
                        onclick: move |_| hide_values.set(!hide_values()),
                        if masked { "🙈" } else { "👁" }
                    }

                    button {
                        class: if refreshing() { "icon-button refresh spinning" } else { "icon-button refresh" },
                        title: "Refresh",
                        disabled: refreshing(),
                        onclick: move |_| {
                            // A second trigger while one is in flight is ignored.
                            if refreshing() {
                                return;
                            }
                            refreshing.set(true);
                            spawn(async move {
                                tokio::join!(store::fetch_wallets(), store::fetch_portfolio_stats());
                                last_refreshed.set(Some(
                                    chrono::Local::now().format("%H:%M:%S").to_string(),
                                ));
                                refreshing.set(false);
                            });
                        },
                        "⟳"
                    }
                }
            }

            // Balance section
            div {
                class: "balance-section",
                div {
                    class: "balance-total",
                    if loading && aggregated.tokens.is_empty() {
                        "Loading..."
                    } else {
                        "{format_usd(Some(aggregated.total_value_usd), masked)}"
                    }
                }
                div {
                    class: "balance-sol",
                    "{format_sol(aggregated.total_sol, masked)}"
                }
                div {
                    class: if day_change.unwrap_or(0.0) >= 0.0 {
                        "balance-change positive"
                    } else {
                        "balance-change negative"
                    },
                    "{format_percent(day_change)} today"
                }
            }

            // Stats strip
            div {
                class: "stats-strip",
                div {
                    class: "stat-card",
                    div { class: "stat-label", "24h PnL" }
                    div {
                        class: if pnl_positive { "stat-value positive" } else { "stat-value negative" },
                        "{format_usd(stats.total_pnl, masked)}"
                    }
                    div {
                        class: "stat-sub",
                        "{format_percent(stats.total_pnl_percent)}"
                    }
                }
                div {
                    class: "stat-card",
                    div { class: "stat-label", "Top Gainer" }
                    if let Some(ref gainer) = stats.top_gainer {
                        div { class: "stat-value", "{gainer.symbol}" }
                        div {
                            class: "stat-sub positive",
                            "{format_percent(Some(gainer.change_24h))}"
                        }
                    } else {
                        div { class: "stat-value", "-" }
                    }
                }
                div {
                    class: "stat-card",
                    div { class: "stat-label", "Top Loser" }
                    if let Some(ref loser) = stats.top_loser {
                        div { class: "stat-value", "{loser.symbol}" }
                        div {
                            class: "stat-sub negative",
                            "{format_percent(Some(loser.change_24h))}"
                        }
                    } else {
                        div { class: "stat-value", "-" }
                    }
                }
            }

            div {
                class: "action-buttons",
                button {
                    class: "action-button",
                    onclick: move |_| {
                        // Trade flow is not wired up yet.
                        println!("Trade action is a stub");
                    },
                    span { class: "action-label", "Trade" }
                }
            }

            // Holdings list
            div {
                class: "tokens-section",
                h3 {
                    class: "tokens-header",
                    "Holdings"
                }
                div {
                    class: "token-list",
                    if loading && aggregated.tokens.is_empty() {
                        div {
                            class: "token-empty",
                            "Loading holdings..."
                        }
                    } else if aggregated.tokens.is_empty() {
                        div {
                            class: "token-empty",
                            "No token holdings yet. Add wallet addresses to storage/watchlist.json to start tracking."
                        }
                    } else {
                        for row in aggregated.tokens.clone() {
                            div {
                                key: "{row.wallet_id}-{row.token.mint}",
                                class: "token-item",
                                div {
                                    class: "token-info",
                                    if let Some(ref logo) = row.token.logo_uri {
                                        img {
                                            class: "token-icon",
                                            src: "{logo}",
                                            alt: "{row.token.symbol}",
                                            width: "32",
                                            height: "32",
                                        }
                                    } else {
                                        div {
                                            class: "token-icon-fallback",
                                            "{symbol_initial(&row.token.symbol)}"
                                        }
                                    }
                                    div {
                                        class: "token-details",
                                        div {
                                            class: "token-name",
                                            "{row.token.name} ({row.token.symbol})"
                                            if show_wallet_badges {
                                                span {
                                                    class: "wallet-badge",
                                                    "{row.wallet_name}"
                                                }
                                            }
                                        }
                                        div {
                                            class: "token-price-info",
                                            span {
                                                class: "token-price",
                                                "{format_price(row.token.price_usd)}"
                                            }
                                            span {
                                                class: if row.token.change_24h.unwrap_or(0.0) >= 0.0 {
                                                    "token-change positive"
                                                } else {
                                                    "token-change negative"
                                                },
                                                "{format_percent(row.token.change_24h)}"
                                            }
                                        }
                                    }
                                }
                                div {
                                    class: "token-values",
                                    div {
                                        class: "token-value-usd",
                                        "{format_usd(row.token.value_usd, masked)}"
                                    }
                                    div {
                                        class: "token-amount",
                                        "{format_token_amount(row.token.ui_amount, &row.token.symbol)}"
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
