use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news article fetched from an RSS feed, translated, and later posted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source_id: Option<String>,
    pub original_title: String,
    pub original_content: String,
    pub original_url: String,
    #[serde(default)]
    pub translated_title: Option<String>,
    #[serde(default)]
    pub translated_content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Keyword-bucket relevance heuristic, 0-100. Informational only.
    pub relevance_score: u8,
    pub is_processed: bool,
    pub is_posted: bool,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
}

impl NewsArticle {
    /// Title to show readers, preferring the translation
    pub fn display_title(&self) -> &str {
        self.translated_title
            .as_deref()
            .unwrap_or(&self.original_title)
    }

    pub fn display_content(&self) -> &str {
        self.translated_content
            .as_deref()
            .unwrap_or(&self.original_content)
    }
}

/// Configured RSS feed (`news_sources`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsSource {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Record of an article published to the Telegram channel (`channel_posts`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelPost {
    pub article_id: Option<String>,
    pub channel_id: String,
    pub message_id: i64,
    pub content: String,
    pub posted_at: DateTime<Utc>,
}
