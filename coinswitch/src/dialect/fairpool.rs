//! fairpool dialect: pool state in `/stats`, chain tip in `/network`.
//!
//! `/stats` has no block height or reward, so a second request is needed.
//! `lastBlockFound` is the pool's last found block (in milliseconds), not
//! the network's. No dev or coinbase fee is declared by this API.

use serde::Deserialize;

use super::{NetworkStats, PoolConfigSection};
use crate::error::{Error, Result};
use crate::http::{join_url, JsonFetcher};
use crate::payload::{decode, lenient_f64, reject_error_field, required};

#[derive(Debug, Deserialize)]
struct StatsResponse {
    network: Option<StatsNetwork>,
    pool: Option<StatsPool>,
    #[serde(default)]
    config: PoolConfigSection,
}

#[derive(Debug, Deserialize)]
struct StatsNetwork {
    #[serde(default, deserialize_with = "lenient_f64")]
    difficulty: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StatsPool {
    stats: Option<PoolStats>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolStats {
    #[serde(default, deserialize_with = "lenient_f64")]
    last_block_found: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkResponse {
    #[serde(default, deserialize_with = "lenient_f64")]
    blockchain_height: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    reward: Option<f64>,
}

pub(super) async fn fetch(
    fetcher: &dyn JsonFetcher,
    api: &str,
    coinunit: f64,
) -> Result<NetworkStats> {
    let body = fetcher.get_json(&join_url(api, "stats")).await?;
    reject_error_field(&body)?;
    let stats: StatsResponse = decode(body)?;

    let difficulty = required(
        stats.network.and_then(|n| n.difficulty),
        "network.difficulty",
    )?;
    let lastblockdatetime = stats
        .pool
        .and_then(|p| p.stats)
        .and_then(|s| s.last_block_found)
        .map(|ms| ms / 1000.0);
    let coinunit = stats.config.coinunit_or(coinunit);

    let body = fetcher.get_json(&join_url(api, "network")).await?;
    reject_error_field(&body)?;
    let network: NetworkResponse = decode(body)?;

    let blockheight = network
        .blockchain_height
        .filter(|h| *h > 0.0)
        .ok_or_else(|| Error::MalformedResponse("Wrong api type: no blockchainHeight".into()))?;
    let gross = network
        .reward
        .ok_or_else(|| Error::MalformedResponse("missing reward".into()))?;

    Ok(NetworkStats {
        difficulty,
        blockheight: blockheight as u64,
        lastblockdatetime,
        coinunit,
        coindifficultytarget: stats.config.coin_difficulty_target,
        reward: gross / coinunit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::MockFetcher;
    use serde_json::json;

    const API: &str = "http://fair.example/api/";
    const STATS: &str = "http://fair.example/api/stats";
    const NETWORK: &str = "http://fair.example/api/network";

    fn stats_body() -> serde_json::Value {
        json!({
            "config": {"coinUnits": 1000000000, "coinDifficultyTarget": 60},
            "network": {"difficulty": 5000000},
            "pool": {"stats": {"lastBlockFound": "1600000000000"}}
        })
    }

    #[tokio::test]
    async fn test_parse_two_endpoints() {
        let fetcher = MockFetcher::new()
            .with(STATS, stats_body())
            .with(NETWORK, json!({"blockchainHeight": 812345, "reward": 7500000000u64}));

        let stats = fetch(&fetcher, API, 1e12).await.unwrap();

        assert_eq!(stats.difficulty, 5_000_000.0);
        assert_eq!(stats.blockheight, 812_345);
        assert_eq!(stats.lastblockdatetime, Some(1_600_000_000.0));
        assert_eq!(stats.coinunit, 1e9);
        assert_eq!(stats.coindifficultytarget, Some(60.0));
        assert!((stats.reward - 7.5).abs() < 1e-12);
        assert_eq!(fetcher.requests(), vec![STATS.to_string(), NETWORK.to_string()]);
    }

    #[tokio::test]
    async fn test_network_endpoint_unreachable() {
        let fetcher = MockFetcher::new().with(STATS, stats_body());

        let err = fetch(&fetcher, API, 1e9).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_missing_difficulty_skips_second_request() {
        let fetcher = MockFetcher::new()
            .with(STATS, json!({"pool": {"stats": {}}}))
            .with(NETWORK, json!({"blockchainHeight": 1, "reward": 1}));

        assert!(fetch(&fetcher, API, 1e9).await.is_err());
        assert_eq!(fetcher.request_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_height() {
        let fetcher = MockFetcher::new()
            .with(STATS, stats_body())
            .with(NETWORK, json!({"reward": 7500000000u64}));

        let err = fetch(&fetcher, API, 1e9).await.unwrap_err();
        assert!(err.to_string().contains("blockchainHeight"));
    }
}
