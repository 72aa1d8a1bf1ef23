//! Test doubles shared by unit tests across modules.

use crate::enrich::{Enricher, Enrichment};
use crate::scrapers::{FetchError, Fetcher};
use crate::telegram::{Messenger, TelegramError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Mutex;
use teloxide::types::{InlineKeyboardMarkup, MessageId, Recipient};
use teloxide::{ApiError, RequestError};

/// Serve `router` on an ephemeral local port, returning its base URL
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Serves canned bodies by URL; anything else is a 404
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Behaves like a gateway that errors on every call
#[derive(Default)]
pub struct FailingEnricher {
    calls: AtomicUsize,
}

impl FailingEnricher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Enricher for FailingEnricher {
    async fn try_enrich(&self, _text: &str, _task: &Enrichment) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        None
    }
}

/// Tags text with the task name, e.g. `"Hello [translate]"`
#[derive(Default)]
pub struct TaggingEnricher;

#[async_trait]
impl Enricher for TaggingEnricher {
    async fn try_enrich(&self, text: &str, task: &Enrichment) -> Option<String> {
        Some(format!("{} [{}]", text, task.name()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Message { chat: Recipient, text: String, buttons: usize },
    Photo { chat: Recipient, photo: String, caption: String },
    Deleted { chat: Recipient, message_id: MessageId },
    CallbackAnswered { id: String },
}

/// Records outgoing bot traffic and hands out increasing message ids
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    next_id: AtomicI32,
    fail_sends: bool,
}

impl Default for RecordingMessenger {
    fn default() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(100),
            fail_sends: false,
        }
    }
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails as if the Bot API rejected it
    pub fn failing() -> Self {
        Self {
            fail_sends: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Message { text, .. } => Some(text),
                Sent::Photo { caption, .. } => Some(caption),
                _ => None,
            })
            .collect()
    }

    fn record(&self, sent: Sent) -> Result<MessageId, TelegramError> {
        if self.fail_sends {
            return Err(RequestError::Api(ApiError::ChatNotFound).into());
        }
        self.sent.lock().unwrap().push(sent);
        Ok(MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(
        &self,
        chat: &Recipient,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, TelegramError> {
        self.record(Sent::Message {
            chat: chat.clone(),
            text: text.to_string(),
            buttons: markup.map_or(0, |m| m.inline_keyboard.iter().map(Vec::len).sum()),
        })
    }

    async fn send_photo(
        &self,
        chat: &Recipient,
        photo: &str,
        caption: &str,
        _markup: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, TelegramError> {
        self.record(Sent::Photo {
            chat: chat.clone(),
            photo: photo.to_string(),
            caption: caption.to_string(),
        })
    }

    async fn delete_message(&self, chat: &Recipient, message_id: MessageId) -> Result<(), TelegramError> {
        self.record(Sent::Deleted {
            chat: chat.clone(),
            message_id,
        })
        .map(|_| ())
    }

    async fn answer_callback_query(&self, id: &str) -> Result<(), TelegramError> {
        self.record(Sent::CallbackAnswered { id: id.to_string() })
            .map(|_| ())
    }
}
