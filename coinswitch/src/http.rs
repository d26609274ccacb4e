//! JSON-over-HTTP transport.
//!
//! The refresh machinery only ever needs one capability from the network:
//! GET a URL and hand back the decoded JSON body, failing on connection
//! errors and non-2xx statuses. [`JsonFetcher`] is that capability;
//! [`ReqwestFetcher`] is the production implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::tracing::prelude::*;

/// Fetch a JSON document by URL.
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    /// GET `url` and decode the body as JSON.
    async fn get_json(&self, url: &str) -> Result<Value>;
}

/// [`JsonFetcher`] backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    http: HttpClient,
}

impl ReqwestFetcher {
    /// Create a fetcher with no request timeout.
    pub fn new() -> Self {
        Self {
            http: HttpClient::new(),
        }
    }

    /// Create a fetcher whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JsonFetcher for ReqwestFetcher {
    async fn get_json(&self, url: &str) -> Result<Value> {
        trace!(url, "GET");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json().await?)
    }
}

/// Join a base URL and a path segment with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Canned-response fetcher for unit tests.

    use std::collections::HashMap;

    use parking_lot::Mutex;

    use super::*;

    /// Serves canned JSON by exact URL and records every request.
    ///
    /// URLs with no canned response fail as if unreachable.
    #[derive(Default)]
    pub struct MockFetcher {
        responses: HashMap<String, Value>,
        requests: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, url: &str, body: Value) -> Self {
            self.responses.insert(url.to_string(), body);
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().len()
        }

        pub fn clear_requests(&self) {
            self.requests.lock().clear();
        }
    }

    #[async_trait]
    impl JsonFetcher for MockFetcher {
        async fn get_json(&self, url: &str) -> Result<Value> {
            self.requests.lock().push(url.to_string());
            // Yield so concurrently joined refreshes actually interleave.
            tokio::task::yield_now().await;
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| Error::Transport(format!("no route to {}", url)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://a/api", "stats"), "http://a/api/stats");
        assert_eq!(join_url("http://a/api/", "stats"), "http://a/api/stats");
        assert_eq!(join_url("http://a/api/", "/stats"), "http://a/api/stats");
        assert_eq!(join_url("http://a/api", ""), "http://a/api");
    }

    #[tokio::test]
    async fn test_mock_fetcher_unknown_url_fails() {
        let fetcher = mock::MockFetcher::new()
            .with("http://a/stats", serde_json::json!({"ok": 1}));

        assert!(fetcher.get_json("http://a/stats").await.is_ok());
        let err = fetcher.get_json("http://a/missing").await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(fetcher.request_count(), 2);
    }
}
