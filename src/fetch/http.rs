//! HTTP fetcher for the remote tracking endpoint.
//!
//! Session cookies are shared by every worker. A `401`/`403` response
//! triggers a refresh through the configured [`CookieSource`] and a single
//! retry; concurrent workers hitting the same expiry trigger at most one
//! refresh (the generation counter lets late arrivals reuse the cookies a
//! faster worker already obtained).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;

use super::{FetchError, Fetcher};
use crate::core::Config;

/// Request payload expected by the tracking endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackingPayload<'a> {
    order_uuid: &'a str,
    timezone: &'a str,
    show_app_upsell_illustration: bool,
    is_direct_tracking: bool,
}

/// Source of fresh session cookies.
///
/// The production refresh mechanism (headless browser against the public
/// order page) lives outside this crate; its failure modes are opaque here.
#[async_trait]
pub trait CookieSource: Send + Sync {
    async fn fresh_cookies(&self) -> Result<String, FetchError>;
}

/// Cookie source returning a fixed string, typically from configuration.
pub struct StaticCookieSource {
    cookies: String,
}

impl StaticCookieSource {
    pub fn new(cookies: impl Into<String>) -> Self {
        Self {
            cookies: cookies.into(),
        }
    }
}

#[async_trait]
impl CookieSource for StaticCookieSource {
    async fn fresh_cookies(&self) -> Result<String, FetchError> {
        Ok(self.cookies.clone())
    }
}

/// Production fetcher: POSTs the tracking payload with a browser-like
/// header set.
pub struct HttpFetcher {
    client: reqwest::Client,
    api_url: String,
    timezone: String,
    user_agent: String,
    cookies: RwLock<String>,
    /// Bumped on every successful refresh; concurrent 401s observe the bump
    /// and skip their own refresh.
    cookie_generation: AtomicU64,
    refresh_lock: Mutex<()>,
    cookie_source: Arc<dyn CookieSource>,
}

impl HttpFetcher {
    /// Build the fetcher with the static cookie source from configuration.
    pub fn new(config: &Config) -> Self {
        let source = Arc::new(StaticCookieSource::new(config.tracking_cookies.clone()));
        Self::with_cookie_source(config, source)
    }

    pub fn with_cookie_source(config: &Config, cookie_source: Arc<dyn CookieSource>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.tracking_api_url.clone(),
            timezone: config.tracking_timezone.clone(),
            user_agent: config.user_agent.clone(),
            cookies: RwLock::new(config.tracking_cookies.clone()),
            cookie_generation: AtomicU64::new(0),
            refresh_lock: Mutex::new(()),
            cookie_source,
        }
    }

    async fn perform_request(
        &self,
        uuid: &str,
        cookies: &str,
    ) -> Result<(Vec<u8>, u16), FetchError> {
        let payload = TrackingPayload {
            order_uuid: uuid,
            timezone: &self.timezone,
            show_app_upsell_illustration: true,
            is_direct_tracking: false,
        };

        let response = self
            .client
            .post(&self.api_url)
            .timeout(Duration::from_secs(30))
            .header("accept", "*/*")
            .header("accept-language", "fr-FR,fr;q=0.9,en-US;q=0.8,en;q=0.7")
            .header("x-csrf-token", "x")
            .header("cookie", cookies)
            .header("user-agent", &self.user_agent)
            .json(&payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok((body, status))
    }

    /// Refresh the shared cookies, deduplicating concurrent callers.
    async fn refresh_cookies(&self, seen_generation: u64) -> Result<String, FetchError> {
        let _guard = self.refresh_lock.lock().await;

        // another worker may have refreshed while we waited for the lock
        if self.cookie_generation.load(Ordering::Acquire) != seen_generation {
            return Ok(self.cookies.read().unwrap().clone());
        }

        let fresh = self.cookie_source.fresh_cookies().await?;
        *self.cookies.write().unwrap() = fresh.clone();
        self.cookie_generation.fetch_add(1, Ordering::Release);
        tracing::info!("session cookies refreshed, retrying");
        Ok(fresh)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, uuid: &str) -> Result<Vec<u8>, FetchError> {
        let (cookies, generation) = {
            let cookies = self.cookies.read().unwrap().clone();
            (cookies, self.cookie_generation.load(Ordering::Acquire))
        };

        let (body, status) = self.perform_request(uuid, &cookies).await?;

        match status {
            200 => Ok(body),
            401 | 403 => {
                let fresh = self.refresh_cookies(generation).await?;
                let (body, status) = self.perform_request(uuid, &fresh).await?;
                if status != 200 {
                    return Err(FetchError::StatusAfterRefresh(status));
                }
                Ok(body)
            }
            other => Err(FetchError::Status(other)),
        }
    }
}
