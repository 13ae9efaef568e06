//! Page fetcher capability
//!
//! The pipeline only sees [`PageFetcher`]: load a URL, wait (bounded) for a
//! CSS anchor to appear, read the content. Each worker gets its own fetcher
//! from a [`FetcherFactory`] and closes it when its unit of work ends.
//!
//! [`HttpPageFetcher`] is the shipped implementation: plain HTTP GETs,
//! re-polling the current URL until the anchor shows up or the wait expires.

use crate::config::FetchConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use scraper::{Html, Selector};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Browser-like page access used by the resolution pipeline
#[async_trait]
pub trait PageFetcher: Send {
    /// Navigate to `url` and return the content as first loaded
    async fn fetch(&mut self, url: &str) -> Result<String, FetchError>;

    /// Wait up to `timeout` for `selector` to match the current page
    ///
    /// `Ok(false)` is a timeout, not an error.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool, FetchError>;

    /// Content of the current page as last observed
    fn content(&self) -> Result<&str, FetchError>;

    /// Release the fetcher's resources
    async fn close(&mut self);
}

/// Builds one independent fetcher per unit of work
pub trait FetcherFactory: Send + Sync {
    type Fetcher: PageFetcher;

    fn create(&self) -> Result<Self::Fetcher, FetchError>;
}

/// Whether `css` matches anything in `html`
pub fn selector_present(html: &str, css: &str) -> Result<bool, FetchError> {
    let selector = parse_selector(css)?;
    let document = Html::parse_document(html);
    let found = document.select(&selector).next().is_some();
    Ok(found)
}

fn parse_selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::InvalidSelector(format!("{}: {}", css, e)))
}

#[derive(Debug)]
struct LoadedPage {
    url: String,
    body: String,
}

/// HTTP implementation of [`PageFetcher`]
pub struct HttpPageFetcher {
    client: reqwest::Client,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    poll_interval: Duration,
    current: Option<LoadedPage>,
}

impl HttpPageFetcher {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.rate_limiter.until_ready().await;

        tracing::trace!(url = %url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        let body = self.get(url).await?;
        self.current = Some(LoadedPage {
            url: url.to_string(),
            body: body.clone(),
        });
        Ok(body)
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool, FetchError> {
        // Fail fast on a bad selector instead of polling until the deadline
        parse_selector(selector)?;

        let deadline = Instant::now() + timeout;

        loop {
            let page = self.current.as_ref().ok_or(FetchError::NoPage)?;
            if selector_present(&page.body, selector)? {
                return Ok(true);
            }
            let url = page.url.clone();

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            tokio::time::sleep(self.poll_interval.min(remaining)).await;

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }

            match tokio::time::timeout(remaining, self.get(&url)).await {
                Ok(result) => {
                    let body = result?;
                    self.current = Some(LoadedPage { url, body });
                }
                Err(_) => return Ok(false),
            }
        }
    }

    fn content(&self) -> Result<&str, FetchError> {
        self.current
            .as_ref()
            .map(|page| page.body.as_str())
            .ok_or(FetchError::NoPage)
    }

    async fn close(&mut self) {
        self.current = None;
    }
}

/// Factory for [`HttpPageFetcher`]s sharing one request-rate limiter
pub struct HttpFetcherFactory {
    user_agent: String,
    request_timeout: Duration,
    poll_interval: Duration,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl HttpFetcherFactory {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let per_second = NonZeroU32::new(config.requests_per_second).ok_or_else(|| {
            FetchError::Setup("requests_per_second must be greater than zero".to_string())
        })?;

        Ok(Self {
            user_agent: config.user_agent.clone(),
            request_timeout: config.request_timeout(),
            poll_interval: config.poll_interval(),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
        })
    }
}

impl FetcherFactory for HttpFetcherFactory {
    type Fetcher = HttpPageFetcher;

    fn create(&self) -> Result<HttpPageFetcher, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.request_timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| FetchError::Setup(e.to_string()))?;

        Ok(HttpPageFetcher {
            client,
            rate_limiter: Arc::clone(&self.rate_limiter),
            poll_interval: self.poll_interval,
            current: None,
        })
    }
}
