use crate::config::ScraperConfig;
use crate::scrapers::rate_limit::RequestLimiter;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a remote page could not be retrieved
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Retrieves raw HTML or XML from a URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher with a browser user agent, sharing one rate limit
pub struct HttpFetcher {
    client: Client,
    limiter: RequestLimiter,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig, limiter: RequestLimiter) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, limiter })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if !self.limiter.try_acquire() {
            debug!("Rate limit reached, waiting before {}", url);
            self.limiter.until_ready().await;
        }

        debug!("Fetching URL: {}", url);

        let network = |source| FetchError::Network {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "remote source returned an error status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(network)?;
        debug!("Downloaded {} bytes from {}", body.len(), url);

        Ok(body)
    }
}
