//! Periodic coin selection.
//!
//! The [`Switcher`] owns the coin set and the currently active coin. Each
//! round it runs a selection and, when a different coin wins, makes it the
//! active one. Acting on the switch (reconfiguring the miner) is left to
//! whoever consumes the log or polls [`Switcher::active`].

use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::coin::Coin;
use crate::http::JsonFetcher;
use crate::selector::select_best;
use crate::tracing::prelude::*;

pub struct Switcher<F> {
    coins: Vec<Coin>,
    /// Index into `coins`
    active: Option<usize>,
    algo_switch_multiplier: f64,
    fetcher: F,
}

impl<F: JsonFetcher> Switcher<F> {
    pub fn new(coins: Vec<Coin>, algo_switch_multiplier: f64, fetcher: F) -> Self {
        Self {
            coins,
            active: None,
            algo_switch_multiplier,
            fetcher,
        }
    }

    /// Start with `symbol` as the active coin. Unknown symbols are ignored.
    pub fn with_active(mut self, symbol: &str) -> Self {
        self.active = self.coins.iter().position(|c| c.symbol == symbol);
        self
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    pub fn active(&self) -> Option<&Coin> {
        self.active.map(|i| &self.coins[i])
    }

    /// Run one selection round. Returns the active coin afterwards.
    ///
    /// If no coin is selectable the active coin is kept.
    pub async fn tick(&mut self) -> Option<&Coin> {
        let active_algo = self.active().map(|c| c.algo.clone());
        let best = select_best(
            &mut self.coins,
            active_algo.as_deref(),
            self.algo_switch_multiplier,
            &self.fetcher,
        )
        .await
        .map(|coin| coin.symbol.clone());

        match best {
            Some(symbol) => {
                let index = self.coins.iter().position(|c| c.symbol == symbol);
                if index != self.active {
                    let from = self.active().map(|c| c.symbol.as_str()).unwrap_or("none");
                    info!(from, to = %symbol, "Switching coin.");
                    self.active = index;
                }
            }
            None => warn!("No coin currently has usable network and ticker data."),
        }

        self.active()
    }

    /// Run selection rounds every `interval` until `running` is cancelled.
    pub async fn run(mut self, interval: Duration, running: CancellationToken) {
        trace!("Task started.");
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = running.cancelled() => break,
                _ = ticker.tick() => {
                    if let Some(coin) = self.tick().await {
                        debug!(
                            coin = %coin.symbol,
                            rewardperday = coin.rewardperday,
                            marketvalue = coin.marketvalue,
                            "Mining"
                        );
                    }
                }
            }
        }

        trace!("Task stopped.");
    }
}
