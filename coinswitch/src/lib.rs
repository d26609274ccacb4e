//! Profit-switching coin selection for miners.
//!
//! Given a set of coins, each with a pool statistics API and a price ticker,
//! coinswitch keeps their readings fresh and picks the coin most profitable
//! to mine, discounting coins whose algorithm differs from the one being
//! mined.
//!
//! The entry point is [`selector::select_best`]; [`switcher::Switcher`]
//! wraps it in a periodic loop for the daemon.

pub mod coin;
pub mod config;
pub mod dialect;
pub mod error;
pub mod http;
pub mod payload;
pub mod refresh;
mod resolver;
pub mod selector;
pub mod switcher;
mod ticker;
pub mod tracing;
