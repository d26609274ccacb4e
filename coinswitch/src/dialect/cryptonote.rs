//! cryptonote-nodejs-pool `/stats` dialect.

use serde::Deserialize;

use super::{NetworkStats, PoolConfigSection};
use crate::error::{Error, Result};
use crate::http::{join_url, JsonFetcher};
use crate::payload::{decode, lenient_f64, reject_error_field, required};

#[derive(Debug, Deserialize)]
struct StatsResponse {
    network: Option<NetworkSection>,
    #[serde(default)]
    config: PoolConfigSection,
}

#[derive(Debug, Deserialize)]
struct NetworkSection {
    #[serde(default, deserialize_with = "lenient_f64")]
    difficulty: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    height: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    timestamp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    reward: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    devfee: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    coinbase: Option<f64>,
}

pub(super) async fn fetch(
    fetcher: &dyn JsonFetcher,
    api: &str,
    coinunit: f64,
) -> Result<NetworkStats> {
    let body = fetcher.get_json(&join_url(api, "stats")).await?;
    reject_error_field(&body)?;
    let stats: StatsResponse = decode(body)?;

    let network = stats
        .network
        .ok_or_else(|| Error::MalformedResponse("Wrong api type: no network section".into()))?;
    let blockheight = network
        .height
        .filter(|h| *h > 0.0)
        .ok_or_else(|| Error::MalformedResponse("Wrong api type: no network.height".into()))?;
    let difficulty = required(network.difficulty, "network.difficulty")?;
    let gross = network
        .reward
        .ok_or_else(|| Error::MalformedResponse("missing network.reward".into()))?;

    let coinunit = stats.config.coinunit_or(coinunit);
    let net = gross - network.devfee.unwrap_or(0.0) - network.coinbase.unwrap_or(0.0);

    Ok(NetworkStats {
        difficulty,
        blockheight: blockheight as u64,
        lastblockdatetime: network.timestamp,
        coinunit,
        coindifficultytarget: stats.config.coin_difficulty_target,
        reward: net / coinunit,
    })
}
