//! Staleness-driven refresh of coin readings.
//!
//! Before coins can be compared, every reading older than
//! [`STALE_AFTER_SECS`](crate::coin::STALE_AFTER_SECS) is refreshed. All
//! refreshes are launched together and awaited as a group, interleaving on
//! one task: nothing runs in parallel, and the caller resumes only once
//! every refresh has settled, successfully or not.

use futures::future::{join, join_all};

use crate::coin::{unix_now, ApiType, Coin, NetworkSlot};
use crate::http::JsonFetcher;
use crate::tracing::prelude::*;

/// How many refreshes [`ensure_fresh`] launched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub network: usize,
    pub ticker: usize,
}

impl NetworkSlot<'_> {
    /// Refresh the network reading with the coin's dialect.
    ///
    /// An unresolved coin is detected first; the winning dialect attempt already
    /// filled in the reading, so no second request is made. Coins with no
    /// API or no usable dialect are left alone.
    pub(crate) async fn refresh(&mut self, fetcher: &dyn JsonFetcher) {
        let was_unresolved = self.network.api_type() == ApiType::Unresolved;
        match self.resolve_api_type(fetcher).await {
            ApiType::Resolved(dialect) if !was_unresolved => {
                self.try_dialect(dialect, fetcher).await;
            }
            _ => {}
        }
    }
}

/// Refresh every stale reading in `coins`.
pub async fn ensure_fresh(coins: &mut [Coin], fetcher: &dyn JsonFetcher) -> RefreshSummary {
    ensure_fresh_at(coins, fetcher, unix_now()).await
}

/// Refresh every reading in `coins` that is stale as of `now`.
///
/// Each coin gets at most one network refresh and one ticker refresh. The
/// two touch disjoint parts of the coin, so they may be in flight together.
pub async fn ensure_fresh_at(
    coins: &mut [Coin],
    fetcher: &dyn JsonFetcher,
    now: f64,
) -> RefreshSummary {
    let mut network_jobs = Vec::new();
    let mut ticker_jobs = Vec::new();

    for coin in coins.iter_mut() {
        let network_stale = coin.network.is_stale(now);
        // An unconfigured ticker never updates, so it would look stale forever.
        let ticker_stale = coin.ticker.is_configured() && coin.ticker.is_stale(now);
        let (mut network, mut ticker) = coin.split_mut();

        if network_stale {
            network_jobs.push(async move { network.refresh(fetcher).await });
        }
        if ticker_stale {
            ticker_jobs.push(async move { ticker.refresh(fetcher).await });
        }
    }

    let summary = RefreshSummary {
        network: network_jobs.len(),
        ticker: ticker_jobs.len(),
    };
    if summary != RefreshSummary::default() {
        debug!(
            network = summary.network,
            ticker = summary.ticker,
            "Refreshing stale readings"
        );
    }

    join(join_all(network_jobs), join_all(ticker_jobs)).await;
    summary
}
