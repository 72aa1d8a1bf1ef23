//! Real-estate news: RSS fetch, translation, and channel publishing.

use super::dedupe::Deduplicator;
use super::persist::Persister;
use crate::enrich::{Enricher, Enrichment};
use crate::models::{ChannelPost, NewsArticle, NewsSource};
use crate::scrapers::rss::{parse_feed, RssItem};
use crate::scrapers::Fetcher;
use crate::store::{insert_as, select_as, Query, Store, Table};
use crate::telegram::{format, recipient_label, Messenger};
use anyhow::{bail, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, Recipient};
use tracing::{info, warn};
use url::Url;

/// VnExpress real-estate section, used when no news source is configured
pub const DEFAULT_FEED_URL: &str = "https://vnexpress.net/rss/bat-dong-san.rss";

pub const DEFAULT_TARGET_LANGUAGE: &str = "English";

/// Keyword buckets for the relevance heuristic: (weight, keywords)
const RELEVANCE_BUCKETS: &[(u32, &[&str])] = &[
    (
        25,
        &["bất động sản", "căn hộ", "chung cư", "nhà ở", "real estate", "apartment"],
    ),
    (
        15,
        &["giá", "thị trường", "dự án", "đầu tư", "price", "market", "project", "investment"],
    ),
    (
        10,
        &["tp hcm", "tp.hcm", "hồ chí minh", "sài gòn", "quận", "dubai", "district"],
    ),
];

/// Keyword-bucket relevance, 0-100. Informational only; nothing is filtered on it.
pub fn relevance_score(title: &str, content: &str) -> u8 {
    let text = format!("{} {}", title, content).to_lowercase();
    let score: u32 = RELEVANCE_BUCKETS
        .iter()
        .flat_map(|(weight, words)| words.iter().map(move |word| (weight, word)))
        .filter(|(_, word)| text.contains(*word))
        .map(|(weight, _)| *weight)
        .sum();
    score.min(100) as u8
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchSummary {
    /// Feed items considered, duplicates included
    pub fetched: usize,
    pub saved: usize,
    pub articles: Vec<NewsArticle>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishSummary {
    pub published: usize,
    pub failed: usize,
    pub posts: Vec<ChannelPost>,
}

pub struct NewsDesk {
    store: Arc<dyn Store>,
    fetcher: Arc<dyn Fetcher>,
    translator: Arc<dyn Enricher>,
    dedupe: Deduplicator,
    persister: Persister,
    channel: Option<(Arc<dyn Messenger>, Recipient)>,
    target_language: String,
}

impl NewsDesk {
    pub fn new(store: Arc<dyn Store>, fetcher: Arc<dyn Fetcher>, translator: Arc<dyn Enricher>) -> Self {
        Self {
            dedupe: Deduplicator::new(store.clone()),
            persister: Persister::new(store.clone()),
            store,
            fetcher,
            translator,
            channel: None,
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
        }
    }

    /// Channel that `publish` posts to
    pub fn with_channel(mut self, messenger: Arc<dyn Messenger>, channel: Recipient) -> Self {
        self.channel = Some((messenger, channel));
        self
    }

    async fn feeds(&self) -> Result<Vec<(Option<String>, String)>> {
        let sources: Vec<NewsSource> = select_as(
            self.store.as_ref(),
            Table::NewsSources,
            &Query::new().eq("is_active", true),
        )
        .await?;
        if sources.is_empty() {
            return Ok(vec![(None, DEFAULT_FEED_URL.to_string())]);
        }
        Ok(sources
            .into_iter()
            .map(|source| (Some(source.id), source.url))
            .collect())
    }

    /// Fetch up to `limit` feed items, translate the new ones and store them.
    ///
    /// Items whose link is already stored count toward `fetched` but not `saved`.
    /// An unreachable feed is skipped; store errors end the call.
    pub async fn fetch_and_translate(&self, limit: usize) -> Result<FetchSummary> {
        let mut summary = FetchSummary {
            fetched: 0,
            saved: 0,
            articles: Vec::new(),
        };

        'feeds: for (source_id, url) in self.feeds().await? {
            let xml = match self.fetcher.fetch(&url).await {
                Ok(xml) => xml,
                Err(e) => {
                    warn!("Skipping news feed: {}", e);
                    continue;
                }
            };

            for item in parse_feed(&xml) {
                if summary.fetched >= limit {
                    break 'feeds;
                }
                summary.fetched += 1;

                if self
                    .dedupe
                    .is_duplicate(Table::NewsArticles, "original_url", &item.link)
                    .await?
                {
                    continue;
                }

                let article = self.translate(source_id.clone(), item).await;
                let stored = self.persister.save_article(&article).await?;
                summary.saved += 1;
                summary.articles.push(stored);
            }
        }

        info!("📰 News: {} fetched, {} saved", summary.fetched, summary.saved);
        Ok(summary)
    }

    async fn translate(&self, source_id: Option<String>, item: RssItem) -> NewsArticle {
        let task = Enrichment::translate_to(&self.target_language);
        let translated_title = self.translator.enrich(&item.title, &task).await;
        let translated_content = if item.description.is_empty() {
            None
        } else {
            Some(self.translator.enrich(&item.description, &task).await)
        };

        NewsArticle {
            id: None,
            source_id,
            relevance_score: relevance_score(&item.title, &item.description),
            original_title: item.title,
            original_content: item.description,
            original_url: item.link,
            translated_title: Some(translated_title),
            translated_content,
            image_url: item.image_url,
            published_at: item.pub_date,
            is_processed: true,
            is_posted: false,
            posted_at: None,
        }
    }

    /// Post up to `limit` processed, unposted articles to the channel.
    ///
    /// A rejected post is counted as failed and left unposted for the next call.
    /// Once a post is accepted the article is marked posted before anything
    /// else is written, so a bookkeeping failure never causes a repost.
    pub async fn publish(&self, limit: usize) -> Result<PublishSummary> {
        let Some((messenger, channel)) = &self.channel else {
            bail!("Telegram channel is not configured");
        };

        let articles: Vec<NewsArticle> = select_as(
            self.store.as_ref(),
            Table::NewsArticles,
            &Query::new()
                .eq("is_processed", true)
                .eq("is_posted", false)
                .order_desc("created_at")
                .limit(limit),
        )
        .await?;

        let mut summary = PublishSummary::default();
        for article in articles {
            let Some(article_id) = article.id.clone() else {
                continue;
            };
            let content = format::article_post(&article);
            let markup = Url::parse(&article.original_url)
                .ok()
                .map(|url| InlineKeyboardMarkup::new([[InlineKeyboardButton::url("Read more", url)]]));

            let sent = match &article.image_url {
                Some(photo) => messenger.send_photo(channel, photo, &content, markup).await,
                None => messenger.send_message(channel, &content, markup).await,
            };
            let message_id = match sent {
                Ok(id) => id,
                Err(e) => {
                    warn!(article = %article_id, "Failed to post article: {}", e);
                    summary.failed += 1;
                    continue;
                }
            };

            let now = Utc::now();
            self.store
                .update(
                    Table::NewsArticles,
                    &article_id,
                    json!({ "is_posted": true, "posted_at": now }),
                )
                .await?;
            summary.published += 1;

            let post = ChannelPost {
                article_id: Some(article_id.clone()),
                channel_id: recipient_label(channel),
                message_id: message_id.0 as i64,
                content,
                posted_at: now,
            };
            let post = match insert_as(self.store.as_ref(), Table::ChannelPosts, &post).await {
                Ok(stored) => stored,
                Err(e) => {
                    warn!(article = %article_id, "Posted, but failed to record channel post: {}", e);
                    post
                }
            };
            let scheduled = self
                .store
                .insert(
                    Table::ContentSchedule,
                    json!({
                        "article_id": article_id,
                        "content_type": "news",
                        "channel_id": post.channel_id,
                        "scheduled_for": now,
                        "status": "posted",
                        "posted_at": now,
                    }),
                )
                .await;
            if let Err(e) = scheduled {
                warn!(article = %article_id, "Posted, but failed to record schedule entry: {}", e);
            }

            summary.posts.push(post);
        }

        info!("📣 Published {} article(s), {} failed", summary.published, summary.failed);
        Ok(summary)
    }
}
