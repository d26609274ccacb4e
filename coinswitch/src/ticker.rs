//! Market price fetching.
//!
//! Unlike a network failure, a failed price fetch zeroes the coin's market
//! value: a coin with no known price must not win a comparison on a stale
//! one.

use crate::coin::{unix_now, TickerSlot};
use crate::error::{Error, Result};
use crate::http::{join_url, JsonFetcher};
use crate::payload::{as_number, lookup, reject_error_field};
use crate::tracing::prelude::*;

impl TickerSlot<'_> {
    /// Fetch the current price into the coin's market value.
    ///
    /// Returns false without any request when the ticker is unconfigured,
    /// and false after a failed fetch.
    pub(crate) async fn refresh(&mut self, fetcher: &dyn JsonFetcher) -> bool {
        if !self.ticker.is_configured() {
            return false;
        }
        let (Some(base), Some(market)) = (
            self.ticker.apibaseurl.as_deref(),
            self.ticker.marketname.as_deref(),
        ) else {
            return false;
        };
        let url = join_url(base, market);

        self.ticker.error = None;
        match fetch_price(fetcher, &url, &self.ticker.jsonpath).await {
            Ok(price) => {
                *self.marketvalue = price;
                self.ticker.updatetime = Some(unix_now());
                trace!(coin = %self.symbol, price, "Market value updated");
                true
            }
            Err(e) => {
                warn!(coin = %self.symbol, error = %e, "Ticker API response failed");
                self.ticker.error = Some(e.to_string());
                *self.marketvalue = 0.0;
                false
            }
        }
    }
}

async fn fetch_price(fetcher: &dyn JsonFetcher, url: &str, jsonpath: &str) -> Result<f64> {
    let body = fetcher.get_json(url).await?;
    reject_error_field(&body)?;
    lookup(&body, jsonpath)
        .and_then(as_number)
        .ok_or_else(|| Error::MalformedResponse(format!("no numeric field {:?}", jsonpath)))
}
