pub mod portfolio_view;

pub use portfolio_view::*;
