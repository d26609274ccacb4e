//! Pool statistics API dialects.
//!
//! Pool software families expose network statistics in incompatible JSON
//! shapes. Each [`Dialect`] knows how to fetch and parse one of them into a
//! normalized [`NetworkStats`]. The variant order is the detection order used
//! when a coin's dialect is unknown (see `resolver`).
//!
//! # Reward normalization
//!
//! Every dialect reports the block reward in atomic units. The normalized
//! reward is `(reward - devfee - coinbase) / coinunit`, and the comparable
//! daily figure is
//!
//! ```text
//! rewardperday = REFERENCE_HASHRATE * 86400 / difficulty * reward
//! ```
//!
//! The coin's own hashrate is deliberately absent here; it is only applied
//! as a relative weight when coins are compared.

mod cryptonote;
mod fairpool;

use serde::Deserialize;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::coin::{unix_now, ApiType, NetworkSlot};
use crate::error::{Error, Result};
use crate::http::JsonFetcher;
use crate::payload::lenient_f64;
use crate::tracing::prelude::*;

/// Hashrate, in H/s, at which `rewardperday` is expressed.
pub const REFERENCE_HASHRATE: f64 = 1000.0;

pub const SECONDS_PER_DAY: f64 = 86400.0;

/// A known pool statistics API dialect.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum Dialect {
    /// cryptonote-nodejs-pool style: everything in `/stats`.
    #[strum(serialize = "genericCryptonote")]
    GenericCryptonote,

    /// fairpool style: pool state in `/stats`, chain tip in `/network`.
    #[strum(serialize = "fairpool")]
    Fairpool,
}

impl Dialect {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Fetch and parse the coin's statistics in this dialect.
    ///
    /// `coinunit` is the divisor to use when the API does not announce one.
    pub async fn fetch(
        self,
        fetcher: &dyn JsonFetcher,
        api: &str,
        coinunit: f64,
    ) -> Result<NetworkStats> {
        match self {
            Dialect::GenericCryptonote => cryptonote::fetch(fetcher, api, coinunit).await,
            Dialect::Fairpool => fairpool::fetch(fetcher, api, coinunit).await,
        }
    }
}

/// Normalized network statistics, as parsed from any dialect.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkStats {
    pub difficulty: f64,
    pub blockheight: u64,
    pub lastblockdatetime: Option<f64>,
    pub coinunit: f64,
    pub coindifficultytarget: Option<f64>,
    /// Per-block reward in whole coins.
    pub reward: f64,
}

impl NetworkStats {
    /// Expected daily yield at [`REFERENCE_HASHRATE`].
    pub fn reward_per_day(&self) -> f64 {
        (REFERENCE_HASHRATE * SECONDS_PER_DAY / self.difficulty) * self.reward
    }
}

// The `config` block cryptonote-derived pools publish alongside their stats.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolConfigSection {
    #[serde(default, deserialize_with = "lenient_f64")]
    coin_units: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    coin_difficulty_target: Option<f64>,
}

impl PoolConfigSection {
    fn coinunit_or(&self, fallback: f64) -> f64 {
        self.coin_units.filter(|u| *u > 0.0).unwrap_or(fallback)
    }
}

impl NetworkSlot<'_> {
    /// Run one dialect adapter against this coin.
    ///
    /// On success the parsed statistics replace the reading wholesale. On
    /// failure the error is recorded and earlier values are kept. Either way
    /// `updatetime` is stamped. Returns whether the adapter succeeded.
    pub(crate) async fn try_dialect(&mut self, dialect: Dialect, fetcher: &dyn JsonFetcher) -> bool {
        self.network.error = None;
        let result = match self.api {
            Some(api) => dialect.fetch(fetcher, api, *self.coinunit).await,
            None => Err(Error::Config("no statistics API configured".into())),
        };
        self.network.updatetime = Some(unix_now());

        match result {
            Ok(stats) => {
                *self.coinunit = stats.coinunit;
                *self.rewardperday = stats.reward_per_day();
                self.network.difficulty = stats.difficulty;
                self.network.blockheight = stats.blockheight;
                self.network.lastblockdatetime = stats.lastblockdatetime;
                self.network.coindifficultytarget = stats.coindifficultytarget;
                self.network.reward = stats.reward;
                trace!(
                    coin = %self.symbol,
                    dialect = %dialect,
                    height = stats.blockheight,
                    rewardperday = *self.rewardperday,
                    "Network stats updated"
                );
                true
            }
            Err(e) => {
                if self.network.api_type() == ApiType::Detecting {
                    debug!(coin = %self.symbol, dialect = %dialect, error = %e, "Dialect rejected");
                } else {
                    warn!(coin = %self.symbol, error = %e, "Network API response error");
                }
                self.network.error = Some(e.to_string());
                false
            }
        }
    }
}
