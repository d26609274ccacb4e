//! Coin model and its cached network/ticker readings.
//!
//! A [`Coin`] is built once from static configuration. Its [`NetworkReading`]
//! and [`TickerReading`] are then mutated in place by refresh operations for
//! the lifetime of the coin. Both readings carry an `updatetime` used for
//! staleness tracking (see [`is_stale`]).

use std::fmt;
use std::str::FromStr;

use time::OffsetDateTime;

use crate::config::{CoinConfig, TickerConfig};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::http::JsonFetcher;

/// Age, in seconds, after which a cached reading must be refreshed.
pub const STALE_AFTER_SECS: f64 = 8.0;

/// Default smallest-unit divisor (atomic units per coin).
pub const DEFAULT_COIN_UNIT: f64 = 1e9;

/// Current wall-clock time as fractional epoch seconds.
pub fn unix_now() -> f64 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() as f64 / 1e9
}

/// Whether a reading last updated at `updatetime` must be refreshed at `now`.
///
/// A reading that was never updated is always stale. Exactly
/// [`STALE_AFTER_SECS`] old still counts as fresh.
pub fn is_stale(updatetime: Option<f64>, now: f64) -> bool {
    match updatetime {
        None => true,
        Some(t) => now - t > STALE_AFTER_SECS,
    }
}

/// Statistics API dialect resolution state.
///
/// Moves only forward: `Unresolved -> Detecting -> Resolved | Failed`, or
/// `Unresolved -> NotSet`. Everything but `Unresolved` and `Detecting` is
/// terminal and never re-detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiType {
    #[default]
    Unresolved,
    /// Detection is in progress; adapter failures are expected and not logged.
    Detecting,
    Resolved(Dialect),
    /// The coin has no statistics API configured.
    NotSet,
    /// No known dialect accepted the coin's statistics API.
    Failed,
}

impl ApiType {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ApiType::Unresolved | ApiType::Detecting)
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiType::Unresolved => write!(f, "__unresolved"),
            ApiType::Detecting => write!(f, "__detecting"),
            ApiType::Resolved(dialect) => write!(f, "{}", dialect),
            ApiType::NotSet => write!(f, "__notset"),
            ApiType::Failed => write!(f, "__failed"),
        }
    }
}

/// Last-known state of a coin's network, as reported by its pool API.
#[derive(Debug, Clone, Default)]
pub struct NetworkReading {
    pub difficulty: f64,
    pub blockheight: u64,
    /// Epoch seconds of the last block (or last pool block, per dialect).
    pub lastblockdatetime: Option<f64>,
    /// Target block time in seconds.
    pub coindifficultytarget: Option<f64>,
    /// Per-block reward in whole coins, net of dev and coinbase fees.
    pub reward: f64,
    /// Description of the last refresh failure, cleared on success.
    pub error: Option<String>,
    /// Epoch seconds of the last refresh attempt.
    pub updatetime: Option<f64>,
    api_type: ApiType,
}

impl NetworkReading {
    pub fn api_type(&self) -> ApiType {
        self.api_type
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_stale(&self, now: f64) -> bool {
        is_stale(self.updatetime, now)
    }

    /// Advance the resolution state.
    ///
    /// Transitions out of a terminal state are refused so a resolved dialect
    /// stays put for the coin's lifetime.
    pub(crate) fn set_api_type(&mut self, next: ApiType) {
        let allowed = match (self.api_type, next) {
            (ApiType::Unresolved, ApiType::Detecting | ApiType::NotSet) => true,
            (ApiType::Unresolved | ApiType::Detecting, ApiType::Resolved(_)) => true,
            (ApiType::Detecting, ApiType::Failed) => true,
            _ => false,
        };
        debug_assert!(
            allowed,
            "invalid api type transition {} -> {}",
            self.api_type, next
        );
        if allowed {
            self.api_type = next;
        }
    }
}

/// Price-source configuration and the outcome of the last price fetch.
#[derive(Debug, Clone, Default)]
pub struct TickerReading {
    pub apibaseurl: Option<String>,
    /// Dotted path of the price field in the response; empty means the
    /// response body itself is the price.
    pub jsonpath: String,
    pub marketname: Option<String>,
    pub error: Option<String>,
    /// Epoch seconds of the last successful fetch.
    pub updatetime: Option<f64>,
}

impl TickerReading {
    pub fn new(apibaseurl: &str, jsonpath: &str, marketname: &str) -> Self {
        Self {
            apibaseurl: Some(apibaseurl.to_string()),
            jsonpath: jsonpath.to_string(),
            marketname: Some(marketname.to_string()),
            ..Default::default()
        }
    }

    /// A ticker without a base URL or market name is never fetched.
    pub fn is_configured(&self) -> bool {
        let set = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.is_empty());
        set(&self.apibaseurl) && set(&self.marketname)
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_stale(&self, now: f64) -> bool {
        is_stale(self.updatetime, now)
    }
}

impl From<TickerConfig> for TickerReading {
    fn from(config: TickerConfig) -> Self {
        Self {
            apibaseurl: config.apibaseurl,
            jsonpath: config.jsonpath,
            marketname: config.marketname,
            ..Default::default()
        }
    }
}

/// One mineable currency.
#[derive(Debug, Clone)]
pub struct Coin {
    pub symbol: String,
    pub name: String,
    pub algo: String,
    /// Wallet address or pool login; opaque here.
    pub login: String,
    pub url: Option<String>,
    /// Base URL of the pool statistics API.
    pub api: Option<String>,
    /// This miner's hashrate on the coin's algorithm; relative weight only.
    pub hashrate: f64,
    pub coinunit: f64,
    pub marketvalue: f64,
    /// Expected daily yield at the reference hashrate, in whole coins.
    pub rewardperday: f64,
    pub network: NetworkReading,
    pub ticker: TickerReading,
}

impl Coin {
    pub fn new(symbol: &str, algo: &str, login: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            algo: algo.to_string(),
            login: login.to_string(),
            url: None,
            api: None,
            hashrate: 0.0,
            coinunit: DEFAULT_COIN_UNIT,
            marketvalue: 0.0,
            rewardperday: 0.0,
            network: NetworkReading::default(),
            ticker: TickerReading::default(),
        }
    }

    pub fn with_api(mut self, api: &str) -> Self {
        self.api = Some(api.to_string());
        self
    }

    pub fn with_ticker(mut self, ticker: TickerReading) -> Self {
        self.ticker = ticker;
        self
    }

    pub fn with_hashrate(mut self, hashrate: f64) -> Self {
        self.hashrate = hashrate;
        self
    }

    /// Build a coin from its configuration entry.
    pub fn from_config(config: CoinConfig) -> Result<Self> {
        let mut network = NetworkReading::default();
        if let Some(name) = config.api_type.as_deref() {
            let dialect = Dialect::from_str(name).map_err(|_| {
                Error::Config(format!(
                    "coin {}: unknown api_type {:?}",
                    config.symbol, name
                ))
            })?;
            network.set_api_type(ApiType::Resolved(dialect));
        }

        Ok(Self {
            name: config.name.unwrap_or_else(|| config.symbol.clone()),
            symbol: config.symbol,
            algo: config.algo,
            login: config.login,
            url: config.url,
            api: config.api.filter(|api| !api.is_empty()),
            hashrate: config.hashrate,
            coinunit: config.coinunit.unwrap_or(DEFAULT_COIN_UNIT),
            marketvalue: 0.0,
            rewardperday: 0.0,
            network,
            ticker: config.ticker.map(TickerReading::from).unwrap_or_default(),
        })
    }

    /// Whether either reading currently records a failure.
    pub fn has_error(&self) -> bool {
        self.network.has_error() || self.ticker.has_error()
    }

    /// Resolve (and cache) the dialect of this coin's statistics API.
    pub async fn resolve_api_type(&mut self, fetcher: &dyn JsonFetcher) -> ApiType {
        self.split_mut().0.resolve_api_type(fetcher).await
    }

    /// Refresh the network reading, resolving the dialect first if needed.
    pub async fn fetch_network_details(&mut self, fetcher: &dyn JsonFetcher) {
        self.split_mut().0.refresh(fetcher).await
    }

    /// Refresh the market value. Returns false if the ticker is not
    /// configured or the fetch failed.
    pub async fn fetch_market_value(&mut self, fetcher: &dyn JsonFetcher) -> bool {
        self.split_mut().1.refresh(fetcher).await
    }

    /// Borrow the network side and the ticker side of the coin separately,
    /// so both can be refreshed concurrently.
    pub(crate) fn split_mut(&mut self) -> (NetworkSlot<'_>, TickerSlot<'_>) {
        let network = NetworkSlot {
            symbol: &self.symbol,
            api: self.api.as_deref(),
            network: &mut self.network,
            coinunit: &mut self.coinunit,
            rewardperday: &mut self.rewardperday,
        };
        let ticker = TickerSlot {
            symbol: &self.symbol,
            ticker: &mut self.ticker,
            marketvalue: &mut self.marketvalue,
        };
        (network, ticker)
    }
}

/// The parts of a [`Coin`] touched by a network refresh.
pub(crate) struct NetworkSlot<'a> {
    pub symbol: &'a str,
    pub api: Option<&'a str>,
    pub network: &'a mut NetworkReading,
    pub coinunit: &'a mut f64,
    pub rewardperday: &'a mut f64,
}

/// The parts of a [`Coin`] touched by a ticker refresh.
pub(crate) struct TickerSlot<'a> {
    pub symbol: &'a str,
    pub ticker: &'a mut TickerReading,
    pub marketvalue: &'a mut f64,
}
