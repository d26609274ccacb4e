//! Common error types for coinswitch.
//!
//! This module provides a centralized Error enum using thiserror,
//! with conversions from underlying error types used throughout the crate.
//! None of these errors are fatal: refresh operations record them on the
//! affected coin and the coin drops out of selection until it recovers.

use thiserror::Error;

/// Main error type for coinswitch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Endpoint unreachable, connection reset, timeout
    #[error("URL failed to load: {0}")]
    Transport(String),

    /// Endpoint answered with a non-2xx status
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Payload carried an explicit error field, or lacked a required field
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No known dialect accepted the coin's statistics endpoint
    #[error("No known API dialect for coin {0}")]
    DialectUnknown(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Error::Http {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None if e.is_decode() => Error::MalformedResponse(e.to_string()),
            None => Error::Transport(e.to_string()),
        }
    }
}

/// Convenience type alias for Results using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
