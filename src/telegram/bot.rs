use super::client::Messenger;
use super::format;
use crate::enrich::{Enricher, Enrichment};
use crate::models::{DistrictReview, NewsArticle, PropertyListing};
use crate::store::{find_by_id, select_as, Query, Store, StoreResult, Table};
use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use teloxide::types::{CallbackQuery, ChatId, Message, Recipient, Update, UpdateKind, User};
use tracing::{debug, info, warn};

const SEARCH_RESULTS: usize = 5;
const LATEST_LISTINGS: usize = 5;
const NEWS_ITEMS: usize = 5;

/// Prefix of inline-button callback data that opens a listing by primary key
pub const LISTING_CALLBACK: &str = "prop:";

#[derive(Debug, PartialEq)]
enum Command<'a> {
    Start,
    Help,
    Search(&'a str),
    Latest,
    News,
    District(&'a str),
    Unknown,
}

/// Split `/cmd@botname args` into a command. Plain text yields `None`.
fn parse_command(text: &str) -> Option<Command<'_>> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }
    let (head, args) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let name = head.split('@').next().unwrap_or(head);
    let args = args.trim();
    Some(match name {
        "/start" => Command::Start,
        "/help" => Command::Help,
        "/search" => Command::Search(args),
        "/latest" => Command::Latest,
        "/news" => Command::News,
        "/district" => Command::District(args),
        _ => Command::Unknown,
    })
}

/// Webhook update handler
pub struct Bot {
    store: Arc<dyn Store>,
    messenger: Arc<dyn Messenger>,
    assistant: Arc<dyn Enricher>,
}

impl Bot {
    pub fn new(store: Arc<dyn Store>, messenger: Arc<dyn Messenger>, assistant: Arc<dyn Enricher>) -> Self {
        Self {
            store,
            messenger,
            assistant,
        }
    }

    pub async fn handle_update(&self, update: &Update) -> Result<()> {
        match &update.kind {
            UpdateKind::Message(message) => self.handle_message(message).await,
            UpdateKind::CallbackQuery(query) => self.handle_callback(query).await,
            _ => {
                debug!(update = ?update.id, "ignoring update without message or callback");
                Ok(())
            }
        }
    }

    async fn handle_message(&self, message: &Message) -> Result<()> {
        let Some(text) = message.text() else {
            return Ok(());
        };
        let chat = Recipient::Id(message.chat.id);
        let user = message.from();

        match parse_command(text) {
            Some(Command::Start) => {
                if let Some(user) = user {
                    self.remember_user(user).await;
                }
                let name = user.map_or("there", |u| u.first_name.as_str());
                self.messenger.send_message(&chat, &format::welcome(name), None).await?;
            }
            Some(Command::Help) | Some(Command::Unknown) => {
                self.messenger.send_message(&chat, &format::help(), None).await?;
            }
            Some(Command::Search("")) => {
                self.messenger
                    .send_message(&chat, "Usage: /search &lt;query&gt;, e.g. <code>/search villa Palm Jumeirah</code>", None)
                    .await?;
            }
            Some(Command::Search(query)) => self.search(&chat, user, query).await?,
            Some(Command::Latest) => self.latest(&chat).await?,
            Some(Command::News) => self.news(&chat).await?,
            Some(Command::District("")) => {
                self.messenger
                    .send_message(&chat, "Usage: /district &lt;name&gt;, e.g. <code>/district Dubai Marina</code>", None)
                    .await?;
            }
            Some(Command::District(name)) => self.district(&chat, name).await?,
            None => self.ask_assistant(&chat, text).await?,
        }
        Ok(())
    }

    /// Record the user once; later `/start`s leave the row alone
    async fn remember_user(&self, user: &User) {
        let telegram_id = user.id.0.to_string();
        let result: StoreResult<()> = async {
            if self
                .store
                .exists(Table::UserPreferences, "telegram_user_id", &telegram_id)
                .await?
            {
                return Ok(());
            }
            self.store
                .insert(
                    Table::UserPreferences,
                    json!({
                        "telegram_user_id": telegram_id,
                        "username": user.username,
                        "language": user.language_code.as_deref().unwrap_or("en"),
                        "created_at": Utc::now(),
                    }),
                )
                .await
                .map(|_| ())
        }
        .await;

        if let Err(e) = result {
            warn!(user = user.id.0, "Failed to record user preferences: {}", e);
        }
    }

    async fn search(&self, chat: &Recipient, user: Option<&User>, query: &str) -> Result<()> {
        let placeholder = self
            .messenger
            .send_message(chat, &format!("🔎 Searching for <b>{}</b>…", format::escape(query)), None)
            .await?;

        let rows = self
            .store
            .rpc(
                "search_properties",
                json!({ "search_query": query, "max_results": SEARCH_RESULTS }),
            )
            .await
            .context("Property search failed")?;
        let listings: Vec<PropertyListing> =
            serde_json::from_value(rows).context("Unexpected search result format")?;

        let history = self
            .store
            .insert(
                Table::SearchHistory,
                json!({
                    "telegram_user_id": user.map(|u| u.id.0.to_string()),
                    "query": query,
                    "results_count": listings.len(),
                    "created_at": Utc::now(),
                }),
            )
            .await;
        if let Err(e) = history {
            warn!("Failed to record search history: {}", e);
        }

        if let Err(e) = self.messenger.delete_message(chat, placeholder).await {
            warn!("Failed to delete search placeholder: {}", e);
        }

        info!(query, results = listings.len(), "🔎 search");
        self.send_listings(chat, &format::search_results(query, &listings), &listings)
            .await
    }

    async fn latest(&self, chat: &Recipient) -> Result<()> {
        let listings: Vec<PropertyListing> = select_as(
            self.store.as_ref(),
            Table::PropertyListings,
            &Query::new().order_desc("created_at").limit(LATEST_LISTINGS),
        )
        .await?;
        let header = if listings.is_empty() {
            "No listings yet.".to_string()
        } else {
            "🆕 Newest listings:".to_string()
        };
        self.send_listings(chat, &header, &listings).await
    }

    async fn send_listings(&self, chat: &Recipient, header: &str, listings: &[PropertyListing]) -> Result<()> {
        let markup = (!listings.is_empty()).then(|| format::listing_buttons(listings));
        self.messenger.send_message(chat, header, markup).await?;
        Ok(())
    }

    async fn news(&self, chat: &Recipient) -> Result<()> {
        let articles: Vec<NewsArticle> = select_as(
            self.store.as_ref(),
            Table::NewsArticles,
            &Query::new()
                .eq("is_processed", true)
                .order_desc("created_at")
                .limit(NEWS_ITEMS),
        )
        .await?;
        self.messenger
            .send_message(chat, &format::news_digest(&articles), None)
            .await?;
        Ok(())
    }

    async fn district(&self, chat: &Recipient, name: &str) -> Result<()> {
        let reviews: Vec<DistrictReview> = select_as(
            self.store.as_ref(),
            Table::DistrictReviews,
            &Query::new().eq("district_name", name).limit(1),
        )
        .await?;
        let text = match reviews.first() {
            Some(review) => format::district_review(review),
            None => format!("No review for <b>{}</b> yet.", format::escape(name)),
        };
        self.messenger.send_message(chat, &text, None).await?;
        Ok(())
    }

    async fn ask_assistant(&self, chat: &Recipient, text: &str) -> Result<()> {
        let reply = match self.assistant.try_enrich(text, &Enrichment::Answer).await {
            Some(answer) => format::escape(&answer),
            None => format::assistant_fallback(),
        };
        self.messenger.send_message(chat, &reply, None).await?;
        Ok(())
    }

    async fn handle_callback(&self, query: &CallbackQuery) -> Result<()> {
        if let Err(e) = self.messenger.answer_callback_query(&query.id).await {
            warn!("Failed to answer callback query: {}", e);
        }

        let Some(listing_id) = query
            .data
            .as_deref()
            .and_then(|data| data.strip_prefix(LISTING_CALLBACK))
        else {
            return Ok(());
        };
        // without the originating message, answer in the user's private chat
        let chat = Recipient::Id(
            query
                .message
                .as_ref()
                .map(|m| m.chat.id)
                .unwrap_or(ChatId(query.from.id.0 as i64)),
        );

        let listing: Option<PropertyListing> =
            find_by_id(self.store.as_ref(), Table::PropertyListings, listing_id).await?;
        let Some(listing) = listing else {
            self.messenger
                .send_message(&chat, "This listing is no longer available.", None)
                .await?;
            return Ok(());
        };

        let card = format::listing_card(&listing);
        match listing.cover_image() {
            Some(photo) => self.messenger.send_photo(&chat, photo, &card, None).await?,
            None => self.messenger.send_message(&chat, &card, None).await?,
        };
        Ok(())
    }
}
