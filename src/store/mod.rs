//! Access to the hosted database tables.
//!
//! The hosted database owns every entity; this module only issues inserts,
//! selects, updates and RPC calls against it.

#[cfg(test)]
mod memory;
mod supabase;

#[cfg(test)]
pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Hosted tables used by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    PropertyListings,
    ScrapedProperties,
    NewsArticles,
    NewsSources,
    ChannelPosts,
    ContentSchedule,
    DistrictReviews,
    SearchHistory,
    UserPreferences,
    ScrapingJobs,
    DataSources,
    ApiUsageLogs,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::PropertyListings => "property_listings",
            Table::ScrapedProperties => "scraped_properties",
            Table::NewsArticles => "news_articles",
            Table::NewsSources => "news_sources",
            Table::ChannelPosts => "channel_posts",
            Table::ContentSchedule => "content_schedule",
            Table::DistrictReviews => "district_reviews",
            Table::SearchHistory => "search_history",
            Table::UserPreferences => "user_preferences",
            Table::ScrapingJobs => "scraping_jobs",
            Table::DataSources => "data_sources",
            Table::ApiUsageLogs => "api_usage_logs",
        }
    }
}

/// Errors from the hosted store, passed through without reinterpretation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("store returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected row format: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unknown rpc function: {0}")]
    UnknownRpc(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Equality filters, newest-first ordering and limit for a select
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub eq: Vec<(String, String)>,
    /// Column to sort on, descending
    pub order_desc: Option<String>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.eq.push((column.to_string(), value.to_string()));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order_desc = Some(column.to_string());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert one row and return it as stored (with generated columns)
    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value>;

    /// Whether any row has `column == value`
    async fn exists(&self, table: Table, column: &str, value: &str) -> StoreResult<bool>;

    async fn select(&self, table: Table, query: &Query) -> StoreResult<Vec<Value>>;

    /// Patch the row with primary key `id`
    async fn update(&self, table: Table, id: &str, patch: Value) -> StoreResult<()>;

    /// Call a database function
    async fn rpc(&self, function: &str, args: Value) -> StoreResult<Value>;
}

/// Typed helpers over the JSON row interface
pub async fn insert_as<T, R>(store: &dyn Store, table: Table, row: &T) -> StoreResult<R>
where
    T: Serialize + Sync,
    R: DeserializeOwned,
{
    let stored = store.insert(table, serde_json::to_value(row)?).await?;
    Ok(serde_json::from_value(stored)?)
}

pub async fn select_as<R>(store: &dyn Store, table: Table, query: &Query) -> StoreResult<Vec<R>>
where
    R: DeserializeOwned,
{
    store
        .select(table, query)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(StoreError::from))
        .collect()
}

pub async fn find_by_id<R>(store: &dyn Store, table: Table, id: &str) -> StoreResult<Option<R>>
where
    R: DeserializeOwned,
{
    let mut rows = select_as(store, table, &Query::new().eq("id", id).limit(1)).await?;
    Ok(rows.pop())
}
