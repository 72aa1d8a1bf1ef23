//! Inbound HTTP: one JSON POST endpoint per function plus a health check.

mod routes;

use crate::config::Config;
use crate::enrich::{Enricher, LlmClient, LlmEnricher};
use crate::pipeline::{NewsDesk, Orchestrator};
use crate::scrapers::{Fetcher, HttpFetcher, RequestLimiter, SourceScraper};
use crate::store::{Store, SupabaseStore};
use crate::telegram::{parse_recipient, Bot, BotApi, Messenger};
use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared services for every request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub fetcher: Arc<dyn Fetcher>,
    pub enricher: Arc<dyn Enricher>,
    pub orchestrator: Arc<Orchestrator>,
    pub news: Arc<NewsDesk>,
    pub bot: Option<Arc<Bot>>,
    pub bot_api: Option<BotApi>,
}

impl AppState {
    /// Production wiring: hosted store, rate-limited HTTP fetcher, AI gateway, Bot API
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn Store> = Arc::new(SupabaseStore::new(&config.supabase_url, &config.supabase_key));
        let limiter = RequestLimiter::per_minute(config.scraper.requests_per_minute);
        info!("Outbound scraping limited to {} requests/minute", limiter.requests_per_minute());
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.scraper, limiter)?);

        let llm = LlmEnricher::new(LlmClient::from_config(&config.ai)).with_usage_log(store.clone());
        let ai_enabled = llm.is_enabled();
        if ai_enabled {
            info!("🤖 AI enrichment enabled ({})", config.ai.model);
        } else {
            info!("AI_GATEWAY_API_KEY not set, enrichment disabled");
        }

        let bot_api = config.telegram.bot_token.as_deref().map(BotApi::new);
        let messenger = bot_api
            .clone()
            .map(|api| Arc::new(api) as Arc<dyn Messenger>);

        let mut state = Self::assemble(
            store,
            fetcher,
            Arc::new(llm),
            ai_enabled,
            messenger,
            config.telegram.channel_id.as_deref(),
        );
        state.bot_api = bot_api;
        Ok(state)
    }

    /// Wire services from parts. Descriptions are generated only when `describe` is set.
    pub fn assemble(
        store: Arc<dyn Store>,
        fetcher: Arc<dyn Fetcher>,
        enricher: Arc<dyn Enricher>,
        describe: bool,
        messenger: Option<Arc<dyn Messenger>>,
        channel_id: Option<&str>,
    ) -> Self {
        let mut orchestrator = Orchestrator::new(store.clone(), Arc::new(SourceScraper::new(fetcher.clone())));
        if describe {
            orchestrator = orchestrator.with_enricher(enricher.clone());
        }

        let mut news = NewsDesk::new(store.clone(), fetcher.clone(), enricher.clone());
        if let (Some(messenger), Some(channel)) = (&messenger, channel_id) {
            news = news.with_channel(messenger.clone(), parse_recipient(channel));
        }

        let bot = messenger.map(|messenger| Arc::new(Bot::new(store.clone(), messenger, enricher.clone())));

        Self {
            store,
            fetcher,
            enricher,
            orchestrator: Arc::new(orchestrator),
            news: Arc::new(news),
            bot,
            bot_api: None,
        }
    }
}

/// Error response: `{"success": false, "error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{:#}", err.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(status = %self.status, "request failed: {}", self.message);
        (
            self.status,
            Json(json!({ "success": false, "error": self.message })),
        )
            .into_response()
    }
}

pub type ApiResult = std::result::Result<Json<Value>, ApiError>;

/// `Json` body whose rejections (bad JSON, missing fields, wrong content
/// type) are reported as 400 `{"success": false, "error": ...}`
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Add `"success": true` to a JSON object
pub fn success(mut body: Value) -> Json<Value> {
    if let Some(object) = body.as_object_mut() {
        object.insert("success".to_string(), Value::Bool(true));
    }
    Json(body)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_handler))
        .route("/functions/web-scraper", post(routes::web_scraper_handler))
        .route("/functions/property-scraper", post(routes::property_scraper_handler))
        .route("/functions/parse-vnexpress", post(routes::parse_vnexpress_handler))
        .route("/functions/ai-assistant", post(routes::ai_assistant_handler))
        .route("/functions/telegram-bot", post(routes::telegram_bot_handler))
        .route("/functions/telegram-setup", post(routes::telegram_setup_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests;
