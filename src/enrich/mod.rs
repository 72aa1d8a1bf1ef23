//! Text enrichment through the AI gateway: translation, summaries,
//! listing descriptions and assistant answers.
//!
//! Enrichment never fails the caller. Without a gateway key, or when a call
//! fails, the original text is kept.

mod client;

pub use client::{Completion, LlmClient, LlmError, Usage};

use crate::store::{Store, Table};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// What to do with a piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    Translate { to: String },
    Summarize,
    Describe,
    Answer,
}

impl Enrichment {
    pub fn translate_to(language: &str) -> Self {
        Enrichment::Translate {
            to: language.to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Enrichment::Translate { .. } => "translate",
            Enrichment::Summarize => "summarize",
            Enrichment::Describe => "describe",
            Enrichment::Answer => "answer",
        }
    }

    pub fn system_prompt(&self) -> String {
        match self {
            Enrichment::Translate { to } => format!(
                "You are a professional translator for a real-estate news portal. \
                 Translate the user's text into {to}. Keep names, numbers and currencies unchanged. \
                 Reply with the translation only."
            ),
            Enrichment::Summarize => "Summarize the following real-estate text in 2-3 sentences in English. \
                 Reply with the summary only."
                .to_string(),
            Enrichment::Describe => "You write concise, factual property listing descriptions for a \
                 Dubai and Ho Chi Minh City property portal. From the listing details given, write a \
                 2-3 sentence description in English. Do not invent facts. Reply with the description only."
                .to_string(),
            Enrichment::Answer => "You are a helpful real-estate assistant for a property portal covering \
                 Dubai and Ho Chi Minh City. Answer briefly and practically, in the language of the question. \
                 If you do not know something, say so."
                .to_string(),
        }
    }
}

#[async_trait]
pub trait Enricher: Send + Sync {
    /// The transformed text, or `None` when enrichment is unavailable or failed
    async fn try_enrich(&self, text: &str, task: &Enrichment) -> Option<String>;

    /// The transformed text, falling back to the input unchanged
    async fn enrich(&self, text: &str, task: &Enrichment) -> String {
        self.try_enrich(text, task)
            .await
            .unwrap_or_else(|| text.to_string())
    }
}

/// Gateway-backed enricher. Logs one `api_usage_logs` row per call when a store is attached.
pub struct LlmEnricher {
    client: Option<LlmClient>,
    usage_log: Option<Arc<dyn Store>>,
}

impl LlmEnricher {
    pub fn new(client: Option<LlmClient>) -> Self {
        Self {
            client,
            usage_log: None,
        }
    }

    pub fn with_usage_log(mut self, store: Arc<dyn Store>) -> Self {
        self.usage_log = Some(store);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    async fn log_usage(&self, task: &Enrichment, model: &str, result: &Result<Completion, LlmError>) {
        let Some(store) = &self.usage_log else {
            return;
        };
        let (tokens, error) = match result {
            Ok(completion) => (completion.usage.total_tokens, None),
            Err(e) => (0, Some(e.to_string())),
        };
        let row = json!({
            "service": "ai_gateway",
            "operation": task.name(),
            "model": model,
            "tokens_used": tokens,
            "success": result.is_ok(),
            "error_message": error,
            "created_at": Utc::now(),
        });
        if let Err(e) = store.insert(Table::ApiUsageLogs, row).await {
            debug!("Failed to record API usage: {}", e);
        }
    }
}

#[async_trait]
impl Enricher for LlmEnricher {
    async fn try_enrich(&self, text: &str, task: &Enrichment) -> Option<String> {
        let client = self.client.as_ref()?;
        if text.trim().is_empty() {
            return None;
        }

        let result = client.chat(&task.system_prompt(), text).await;
        self.log_usage(task, client.model(), &result).await;

        match result {
            Ok(completion) => Some(completion.text),
            Err(e) => {
                warn!(task = task.name(), "enrichment failed, keeping original text: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiConfig;
    use crate::store::MemoryStore;
    use crate::testing::{serve, FailingEnricher};
    use axum::{http::StatusCode, routing::post, Json, Router};

    async fn gateway(router: Router) -> LlmClient {
        let config = AiConfig {
            api_key: Some("secret".to_string()),
            base_url: serve(router).await,
            model: "test-model".to_string(),
        };
        LlmClient::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn disabled_enricher_returns_input() {
        let enricher = LlmEnricher::new(None);
        assert!(!enricher.is_enabled());
        assert_eq!(
            enricher.enrich("Căn hộ Quận 2", &Enrichment::translate_to("English")).await,
            "Căn hộ Quận 2"
        );
        assert_eq!(enricher.try_enrich("hi", &Enrichment::Answer).await, None);
    }

    #[tokio::test]
    async fn failed_call_degrades_to_original() {
        let enricher = FailingEnricher::default();
        assert_eq!(enricher.enrich("original", &Enrichment::Summarize).await, "original");
        assert_eq!(enricher.calls(), 1);
    }

    #[tokio::test]
    async fn gateway_error_keeps_text_and_logs_failure() {
        let client = gateway(Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream down") }),
        ))
        .await;
        let store = Arc::new(MemoryStore::new());
        let enricher = LlmEnricher::new(Some(client)).with_usage_log(store.clone());

        let text = enricher.enrich("Căn hộ Quận 2", &Enrichment::Summarize).await;

        assert_eq!(text, "Căn hộ Quận 2");
        let rows = store.rows(Table::ApiUsageLogs);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["success"], false);
        assert_eq!(rows[0]["operation"], Enrichment::Summarize.name());
        assert_eq!(rows[0]["tokens_used"], 0);
        assert!(rows[0]["error_message"].as_str().unwrap().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn gateway_reply_is_trimmed_and_counted() {
        let client = gateway(Router::new().route(
            "/chat/completions",
            post(|| async {
                Json(serde_json::json!({
                    "choices": [{"message": {"role": "assistant", "content": " Apartment in District 2 "}}],
                    "usage": {"prompt_tokens": 20, "completion_tokens": 5, "total_tokens": 25}
                }))
            }),
        ))
        .await;
        let store = Arc::new(MemoryStore::new());
        let enricher = LlmEnricher::new(Some(client)).with_usage_log(store.clone());

        let text = enricher
            .enrich("Căn hộ Quận 2", &Enrichment::translate_to("English"))
            .await;

        assert_eq!(text, "Apartment in District 2");
        let rows = store.rows(Table::ApiUsageLogs);
        assert_eq!(rows[0]["success"], true);
        assert_eq!(rows[0]["tokens_used"], 25);
        assert_eq!(rows[0]["model"], "test-model");
    }

    #[test]
    fn translate_prompt_names_the_language() {
        let prompt = Enrichment::translate_to("Russian").system_prompt();
        assert!(prompt.contains("into Russian"));
    }
}
