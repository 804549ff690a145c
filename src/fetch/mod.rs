//! Fetching of raw tracking snapshots.
//!
//! The tracking core only sees the [`Fetcher`] trait; [`HttpFetcher`] is
//! the production implementation, tests inject deterministic queues.

mod http;

pub use self::http::{CookieSource, HttpFetcher, StaticCookieSource};

use async_trait::async_trait;
use thiserror::Error;

/// Fetch errors. All variants are transient from the worker's point of
/// view and count against its failure cap.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("HTTP status {0} after cookie refresh")]
    StatusAfterRefresh(u16),

    #[error("cookie refresh failed: {0}")]
    CookieRefresh(String),

    #[error("{0}")]
    Other(String),
}

/// Producer of raw snapshot bytes for an order uuid.
///
/// Cancellation is applied by the caller racing the returned future against
/// its token; dropping the future aborts the transfer.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, uuid: &str) -> Result<Vec<u8>, FetchError>;
}
