//! Profitability comparison.
//!
//! Coins are compared on `rewardperday * marketvalue`, i.e. expected daily
//! income at the reference hashrate in the ticker's quote currency.
//!
//! # Algorithm switch penalty
//!
//! Switching to a coin on a different mining algorithm has a cost
//! (reconfiguration, lost shares, warm-up). When an active coin is known,
//! every coin on a different algorithm has its score divided by the switch
//! multiplier; coins sharing the active algorithm compete at full score. A
//! multiplier of 2 means a foreign-algorithm coin must earn more than twice
//! as much to win.
//!
//! # Hashrate weighting
//!
//! A challenger's score is scaled by the ratio of the miner's hashrate on the
//! challenger to its hashrate on the current best. Hashrates that are not
//! positive count as 1.
//!
//! # Ties
//!
//! A challenger must strictly beat the current best, so among equal scores
//! the coin listed first wins.

use crate::coin::Coin;
use crate::http::JsonFetcher;
use crate::refresh::ensure_fresh;
use crate::tracing::prelude::*;

/// Refresh stale readings, then pick the most profitable healthy coin.
///
/// `active_algo` is the algorithm of the coin currently being mined, if
/// any. Returns `None` when every coin has a failing reading.
pub async fn select_best<'a>(
    coins: &'a mut [Coin],
    active_algo: Option<&str>,
    algo_switch_multiplier: f64,
    fetcher: &dyn JsonFetcher,
) -> Option<&'a Coin> {
    ensure_fresh(coins, fetcher).await;
    let coins: &'a [Coin] = coins;
    let best = pick_best(coins, active_algo, algo_switch_multiplier);
    match best {
        Some(coin) => debug!(coin = %coin.symbol, score = coin.score(), "Most profitable coin"),
        None => debug!(candidates = coins.len(), "No healthy coin to select"),
    }
    best
}

/// Pick the most profitable healthy coin from already refreshed readings.
///
/// A multiplier of zero, or no active algorithm, disables the switch
/// penalty.
pub fn pick_best<'a>(
    coins: &'a [Coin],
    active_algo: Option<&str>,
    algo_switch_multiplier: f64,
) -> Option<&'a Coin> {
    let penalty = match active_algo {
        Some(_) if algo_switch_multiplier != 0.0 => algo_switch_multiplier,
        _ => 1.0,
    };
    let handicap = |coin: &Coin| {
        if active_algo == Some(coin.algo.as_str()) {
            1.0
        } else {
            1.0 / penalty
        }
    };

    coins
        .iter()
        .filter(|coin| !coin.has_error())
        .fold(None, |best: Option<&Coin>, coin| match best {
            None => Some(coin),
            Some(best) => {
                let ratio = coin.hashrate_weight() / best.hashrate_weight();
                let challenger = coin.score() * handicap(coin) * ratio;
                let incumbent = best.score() * handicap(best);
                if challenger > incumbent {
                    Some(coin)
                } else {
                    Some(best)
                }
            }
        })
}

impl Coin {
    /// Raw profitability score: daily reward times market value.
    pub fn score(&self) -> f64 {
        self.rewardperday * self.marketvalue
    }

    fn hashrate_weight(&self) -> f64 {
        if self.hashrate > 0.0 {
            self.hashrate
        } else {
            1.0
        }
    }
}
