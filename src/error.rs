//! Market-data errors
//!
//! The engine itself never fails; everything that can go wrong happens
//! while talking to the exchange.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketDataError {
    /// Caller asked for quotes on zero pairs
    #[error("`pairs` must not be empty")]
    EmptyPairRequest,

    /// Exchange returned no tradable pairs
    #[error("exchange returned an empty pair list")]
    NoPairs,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} responded with HTTP {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
