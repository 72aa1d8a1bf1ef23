use crate::models::{DataSource, RawListing, SourceType};
use crate::scrapers::fetcher::Fetcher;
use crate::scrapers::html::parse_listing_cards;
use crate::scrapers::rss::parse_feed;
use crate::scrapers::types::ListingSelectors;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Common trait for all listing scrapers
/// Turns one configured source into raw listings ready for extraction
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Fetch the source and split it into listings
    async fn scrape(&self, source: &DataSource) -> Result<Vec<RawListing>>;
}

/// Scraper for every `SourceType`, on top of any fetcher
pub struct SourceScraper {
    fetcher: Arc<dyn Fetcher>,
}

impl SourceScraper {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

/// Public web preview of a channel: `https://t.me/name` -> `https://t.me/s/name`
pub fn telegram_preview_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.contains("/s/") {
        return trimmed.to_string();
    }
    let name = trimmed
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("t.me/")
        .trim_start_matches('@');
    format!("https://t.me/s/{}", name)
}

#[async_trait]
impl ScraperTrait for SourceScraper {
    async fn scrape(&self, source: &DataSource) -> Result<Vec<RawListing>> {
        let listings = match source.source_type {
            SourceType::Website => {
                let html = self.fetcher.fetch(&source.url).await?;
                let selectors = ListingSelectors::default().with_overrides(source.config.as_ref());
                parse_listing_cards(&html, &source.url, &selectors)?
            }
            SourceType::TelegramChannel => {
                let url = telegram_preview_url(&source.url);
                let html = self.fetcher.fetch(&url).await?;
                let selectors =
                    ListingSelectors::telegram_channel().with_overrides(source.config.as_ref());
                parse_listing_cards(&html, &url, &selectors)?
            }
            SourceType::Rss => {
                let xml = self.fetcher.fetch(&source.url).await?;
                parse_feed(&xml)
                    .into_iter()
                    .map(|item| RawListing {
                        text: format!("{}\n{}", item.title, item.description),
                        url: Some(item.link),
                        external_id: None,
                        images: item.image_url.into_iter().collect(),
                    })
                    .collect()
            }
        };

        info!(source = %source.name, count = listings.len(), "scraped raw listings");
        Ok(listings)
    }
}
