use dioxus::prelude::*;

mod components;
mod config;
mod currency_utils;
mod live;
mod portfolio;
mod prices;
mod rpc;
mod storage;
mod store;

use components::PortfolioView;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[route("/")]
    PortfolioView {},
}

const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    if let Err(e) = storage::ensure_watchlist_file() {
        log::warn!("Failed to prepare storage: {}", e);
    }
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }
        Router::<Route> {}
    }
}
