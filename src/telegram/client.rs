use async_trait::async_trait;
use teloxide::payloads::{SendMessageSetters, SendPhotoSetters};
use teloxide::prelude::*;
use teloxide::types::{BotCommand, InlineKeyboardMarkup, InputFile, MessageId, ParseMode, Recipient};
use teloxide::RequestError;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] RequestError),

    #[error("invalid photo URL {url}: {source}")]
    PhotoUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Outgoing bot traffic used by the webhook handler and the news publisher
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send an HTML message, returning its message id
    async fn send_message(
        &self,
        chat: &Recipient,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, TelegramError>;

    /// Send a photo by URL with an HTML caption
    async fn send_photo(
        &self,
        chat: &Recipient,
        photo: &str,
        caption: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, TelegramError>;

    async fn delete_message(&self, chat: &Recipient, message_id: MessageId) -> Result<(), TelegramError>;

    async fn answer_callback_query(&self, id: &str) -> Result<(), TelegramError>;
}

/// Bot API access through teloxide
#[derive(Clone)]
pub struct BotApi {
    bot: Bot,
}

impl BotApi {
    pub fn new(token: &str) -> Self {
        Self { bot: Bot::new(token) }
    }

    /// Point the client at another Bot API server
    #[cfg(test)]
    pub fn with_api_url(self, url: Url) -> Self {
        Self {
            bot: self.bot.set_api_url(url),
        }
    }

    pub async fn set_my_commands(&self, commands: Vec<BotCommand>) -> Result<(), TelegramError> {
        debug!(count = commands.len(), "registering bot commands");
        self.bot.set_my_commands(commands).await?;
        Ok(())
    }
}

#[async_trait]
impl Messenger for BotApi {
    async fn send_message(
        &self,
        chat: &Recipient,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, TelegramError> {
        let mut request = self
            .bot
            .send_message(chat.clone(), text)
            .parse_mode(ParseMode::Html)
            .disable_web_page_preview(true);
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        let sent = request.await?;
        Ok(sent.id)
    }

    async fn send_photo(
        &self,
        chat: &Recipient,
        photo: &str,
        caption: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, TelegramError> {
        let url = Url::parse(photo).map_err(|source| TelegramError::PhotoUrl {
            url: photo.to_string(),
            source,
        })?;
        let mut request = self
            .bot
            .send_photo(chat.clone(), InputFile::url(url))
            .caption(caption)
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        let sent = request.await?;
        Ok(sent.id)
    }

    async fn delete_message(&self, chat: &Recipient, message_id: MessageId) -> Result<(), TelegramError> {
        self.bot.delete_message(chat.clone(), message_id).await?;
        Ok(())
    }

    async fn answer_callback_query(&self, id: &str) -> Result<(), TelegramError> {
        self.bot.answer_callback_query(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve;
    use axum::{http::Uri, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use teloxide::types::ChatId;
    use teloxide::ApiError;

    /// Bot API stand-in that records request paths and answers every call with `reply`
    async fn bot_api(reply: Value) -> (BotApi, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = calls.clone();
        let router = Router::new().fallback(move |uri: Uri| {
            let seen = seen.clone();
            let reply = reply.clone();
            async move {
                seen.lock().unwrap().push(uri.path().to_string());
                Json(reply)
            }
        });
        let base = serve(router).await;
        let api = BotApi::new("123:abc").with_api_url(Url::parse(&base).unwrap());
        (api, calls)
    }

    #[tokio::test]
    async fn sent_message_id_is_returned() {
        let (api, calls) = bot_api(json!({
            "ok": true,
            "result": {
                "message_id": 77,
                "date": 1714550400,
                "chat": {"id": 42, "type": "private", "first_name": "Amir"},
                "text": "hi"
            }
        }))
        .await;

        let id = api
            .send_message(&Recipient::Id(ChatId(42)), "<b>hi</b>", None)
            .await
            .unwrap();

        assert_eq!(id, MessageId(77));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("/bot123:abc/"));
        assert!(calls[0].to_lowercase().ends_with("sendmessage"));
    }

    #[tokio::test]
    async fn api_errors_are_typed() {
        let (api, _) = bot_api(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        }))
        .await;

        let err = api
            .send_message(&Recipient::ChannelUsername("@missing".to_string()), "hi", None)
            .await
            .unwrap_err();

        assert!(matches!(err, TelegramError::Request(RequestError::Api(ApiError::ChatNotFound))));
    }

    #[tokio::test]
    async fn bad_photo_url_is_rejected_before_sending() {
        let (api, calls) = bot_api(json!({"ok": true, "result": true})).await;

        let err = api
            .send_photo(&Recipient::Id(ChatId(1)), "not a url", "caption", None)
            .await
            .unwrap_err();

        assert!(matches!(err, TelegramError::PhotoUrl { .. }));
        assert!(calls.lock().unwrap().is_empty());
    }
}
